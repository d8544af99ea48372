//! Classification tasks.
//!
//! A task owns everything that differs between record kinds: the prompt, the
//! answer schema, and how an answer becomes an output row. The classifier
//! and batch driver are generic over it.

mod app_activity;
mod skill_generalization;

pub use app_activity::{AppActivityAnswer, AppActivityTask, NodeChoice};
pub use skill_generalization::{SkillGeneralizationAnswer, SkillGeneralizationTask};

use crate::classify::ClassificationResult;
use crate::ontology::SubOntology;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Deserializer};
use serde_json::Value;

/// Shared description of what an ontology node is, used in every prompt.
pub(crate) const NODE_SCHEMA: &str = "\
Each node in our ontology represents a type of action and has these properties:
- **title** (String) - a unique, concise title.
- **description** (String) - a detailed explanation of the node, its purpose, scope, and context.
- **specializations** (Array of Objects) - collections of more specific types of this node, organized along common dimensions. Each collection contains:
  - **collectionName** (String) - the dimension along which specializations vary.
  - **nodes** (Array) - the nodes that are specializations along this dimension.";

pub trait ClassificationTask: Send + Sync {
    /// Input record type.
    type Record: Send + Sync;
    /// Typed answer the model must produce.
    type Answer: DeserializeOwned + Send;

    /// Short name used on the command line and in logs.
    fn name(&self) -> &'static str;

    /// Output table header.
    fn headers(&self) -> &'static [&'static str];

    /// Leading columns that identify a record in the output table.
    fn key_columns(&self) -> usize;

    /// Keys the answer object must contain.
    fn required_keys(&self) -> &'static [&'static str];

    /// Provider used when neither config nor CLI picks one.
    fn default_provider(&self) -> &'static str;

    /// Ontology hits requested when config does not set a limit.
    fn default_search_limit(&self) -> u32;

    /// Primary and secondary text for the ontology search.
    fn search_text<'a>(&self, record: &'a Self::Record) -> (&'a str, &'a str);

    /// Human-readable label for logs and progress output.
    fn label<'a>(&self, record: &'a Self::Record) -> &'a str;

    /// Record fields as they appear in the leading output columns.
    fn record_cells(&self, record: &Self::Record) -> Vec<String>;

    /// Full prompt for one record.
    fn build_prompt(&self, record: &Self::Record, ontology: &SubOntology) -> String;

    /// Answer-specific columns between the record cells and `InOntology`.
    fn answer_cells(&self, answer: &Self::Answer) -> Vec<String>;

    /// Title of the ontology node the answer picked, if any.
    fn chosen_node<'a>(&self, answer: &'a Self::Answer) -> Option<&'a str>;

    /// Complete output row: record cells, answer cells, then
    /// `InOntology`, `Tokens` and `Cost`.
    fn to_row(
        &self,
        record: &Self::Record,
        result: &ClassificationResult<Self::Answer>,
        ontology: &SubOntology,
    ) -> Vec<String> {
        let mut row = self.record_cells(record);
        row.extend(self.answer_cells(&result.answer));
        row.push(match self.chosen_node(&result.answer) {
            Some(title) if ontology.contains_title(title) => "yes".to_string(),
            Some(_) => "no".to_string(),
            None => String::new(),
        });
        row.push(result.usage.summary());
        row.push(result.cost.total_cost.to_string());
        row
    }
}

/// Cell text for an answer value: strings verbatim, `null` empty, anything
/// else as compact JSON.
pub(crate) fn value_text(value: &Value) -> String {
    match value {
        Value::String(text) => text.clone(),
        Value::Null => String::new(),
        other => other.to_string(),
    }
}

/// Title of a node the model named, either as an object or a bare string.
/// Empty values mean no node.
pub(crate) fn node_title(value: &Value) -> Option<String> {
    let title = match value {
        Value::Object(map) => map.get("title").map(value_text)?,
        Value::String(text) => text.clone(),
        _ => return None,
    };
    let title = title.trim();
    (!title.is_empty()).then(|| title.to_string())
}

/// `deserialize_with` adapter accepting any JSON value as text.
pub(crate) fn lenient_text<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    Value::deserialize(deserializer).map(|value| value_text(&value))
}
