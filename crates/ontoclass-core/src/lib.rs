//! Ontoclass Core - zero-shot ontology classification library.
//!
//! Classifies textual records (software applications, job skills) against a
//! hierarchical action ontology using an LLM as the classifier.
//!
//! # Architecture
//!
//! Every record goes through the same sequential pipeline:
//!
//! ```text
//! Record → Sub-ontology query → Prompt → LLM (bounded retries) → Validated answer → Row
//! ```
//!
//! # Usage
//!
//! ```rust,ignore
//! use ontoclass_core::{
//!     AppActivityTask, BatchOptions, BatchRunner, Classifier, ClassifyOptions, Config,
//!     LlmProviderFactory, OntologyClient, OutputFormat, RequestClient, TableWriter,
//! };
//!
//! #[tokio::main]
//! async fn main() -> ontoclass_core::Result<()> {
//!     let config = Config::load()?;
//!     let task = AppActivityTask;
//!     let provider = LlmProviderFactory::create("openai", &config.llm, None)?;
//!     let pricing = LlmProviderFactory::pricing("openai", &config.llm)?;
//!     let client = RequestClient::new(provider, pricing, config.limits.llm_timeout_ms);
//!     let classifier = Classifier::new(client, ClassifyOptions::from_config(&config.classify));
//!     let ontology = OntologyClient::from_config(&config.ontology, &config.limits);
//!     let runner = BatchRunner::new(
//!         task,
//!         classifier,
//!         Box::new(ontology),
//!         BatchOptions::from_config(&config, &task),
//!     );
//!
//!     let records = ontoclass_core::input::read_app_records("apps.csv".as_ref())?;
//!     let mut writer = TableWriter::create(
//!         "out.csv".as_ref(),
//!         OutputFormat::Csv,
//!         runner.task().headers(),
//!         false,
//!     )?;
//!     let stats = runner.run(&records, &mut writer, |_| {}).await?;
//!     println!("Wrote {} rows", stats.written);
//!     Ok(())
//! }
//! ```

pub mod batch;
pub mod classify;
pub mod config;
pub mod error;
pub mod input;
pub mod llm;
pub mod ontology;
pub mod output;
pub mod task;

pub use batch::{BatchEvent, BatchOptions, BatchRunner, BatchStats};
pub use classify::{ClassificationResult, Classifier, ClassifyOptions, ClassifyOutcome};
pub use config::Config;
pub use error::{
    ConfigError, InputError, LlmError, OntoclassError, OntologyError, Result, SchemaError,
};
pub use input::{AppRecord, SkillRecord};
pub use llm::{
    extract_object, CostEstimate, LlmProviderFactory, Money, PricingTable, ReasoningEffort,
    RequestClient, UsageTokens,
};
pub use ontology::{OntologyClient, OntologySource, SubOntology, SubOntologyQuery};
pub use output::{load_existing_keys, OutputFormat, TableWriter};
pub use task::{AppActivityTask, ClassificationTask, SkillGeneralizationTask};

/// Library version.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_version() {
        assert!(!VERSION.is_empty());
    }
}
