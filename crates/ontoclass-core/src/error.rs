//! Error types for the ontoclass classification pipeline.
//!
//! Errors are grouped by the collaborator that produced them so callers can
//! decide per class whether to retry, degrade, or abort.

use thiserror::Error;

/// Top-level error type for ontoclass operations.
#[derive(Error, Debug)]
pub enum OntoclassError {
    /// Configuration-related errors
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    /// LLM provider errors
    #[error("LLM error: {0}")]
    Llm(#[from] LlmError),

    /// Ontology service errors
    #[error("Ontology error: {0}")]
    Ontology(#[from] OntologyError),

    /// Input table errors
    #[error("Input error: {0}")]
    Input(#[from] InputError),

    /// General I/O errors
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// CSV serialization errors on the output table
    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    /// JSON serialization/deserialization errors
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Configuration-specific errors.
#[derive(Error, Debug)]
pub enum ConfigError {
    /// Failed to read the config file from disk
    #[error("Failed to read config file: {0}")]
    ReadError(#[from] std::io::Error),

    /// Failed to parse TOML configuration
    #[error("Failed to parse config: {0}")]
    ParseError(#[from] toml::de::Error),

    /// Configuration values are invalid
    #[error("Invalid configuration: {0}")]
    ValidationError(String),
}

/// Failure of a single LLM provider call.
///
/// Carries the HTTP status when the provider answered, so the retry loop can
/// tell rate limits and outages apart from auth or request errors.
#[derive(Error, Debug, Clone)]
#[error("{message}")]
pub struct LlmError {
    pub message: String,
    pub status_code: Option<u16>,
    pub timed_out: bool,
    /// The request never produced a usable response (connect, send or body failure)
    pub transient: bool,
}

impl LlmError {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            status_code: None,
            timed_out: false,
            transient: false,
        }
    }

    pub fn http(status_code: u16, message: impl Into<String>) -> Self {
        Self {
            status_code: Some(status_code),
            ..Self::new(message)
        }
    }

    pub fn timeout(timeout_ms: u64) -> Self {
        Self {
            timed_out: true,
            ..Self::new(format!("LLM request timed out after {timeout_ms}ms"))
        }
    }

    /// Wrap a transport failure, classified by its kind rather than its text.
    pub fn transport(context: &str, error: reqwest::Error) -> Self {
        let transient = error.is_connect()
            || error.is_request()
            || error.is_body()
            || error.is_decode();
        Self {
            status_code: error.status().map(|s| s.as_u16()),
            timed_out: error.is_timeout(),
            transient,
            ..Self::new(format!("{context}: {error}"))
        }
    }
}

/// Ontology service errors. Never fatal: the batch degrades to an empty context.
#[derive(Error, Debug)]
pub enum OntologyError {
    /// Request could not be sent or the connection failed
    #[error("Ontology request failed: {0}")]
    Request(String),

    /// Service answered with a non-success status
    #[error("Ontology service HTTP {status}: {body}")]
    Status { status: u16, body: String },

    /// Response body was not the expected JSON
    #[error("Ontology response is not valid JSON: {0}")]
    Decode(String),

    /// Query rejected before sending
    #[error("Invalid ontology query: {0}")]
    InvalidQuery(String),
}

/// Why a parsed model answer was rejected. Always retryable.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum SchemaError {
    /// No JSON object could be extracted from the response text
    #[error("no JSON object found in model response")]
    NoObject,

    /// The object lacks one or more required keys
    #[error("missing required keys: {}", .0.join(", "))]
    MissingKeys(Vec<String>),

    /// Keys are present but values have the wrong shape
    #[error("response has invalid shape: {0}")]
    InvalidShape(String),
}

/// Input table errors.
#[derive(Error, Debug)]
pub enum InputError {
    /// The input file could not be opened or read
    #[error("Failed to read input table {path}: {source}")]
    Read {
        path: std::path::PathBuf,
        #[source]
        source: csv::Error,
    },

    /// A required column is absent from the header row
    #[error("Input table is missing column '{0}'")]
    MissingColumn(String),

    /// An embedded skill list could not be parsed
    #[error("Row {row}: invalid skill list: {message}")]
    SkillList { row: usize, message: String },
}

/// Convenience type alias for ontoclass results.
pub type Result<T> = std::result::Result<T, OntoclassError>;
