//! Classify a software application by the substantive activity it performs.

use super::{lenient_text, node_title, value_text, ClassificationTask, NODE_SCHEMA};
use crate::input::AppRecord;
use crate::ontology::SubOntology;
use serde::{Deserialize, Deserializer};
use serde_json::Value;

const HEADERS: &[&str] = &[
    "Name",
    "Tagline",
    "Description",
    "MA",
    "SA",
    "SAClassification",
    "InOntology",
    "Tokens",
    "Cost",
];

const REQUIRED_KEYS: &[&str] = &[
    "does_it_perform_the_activity_or_help_a_human_perform_it",
    "reasoning_for_does_it_perform_the_activity_or_help_a_human_perform_it",
    "substantive_activity",
    "reasoning_substantive_activity",
    "most_appropriate_node",
    "most_appropriate_node_rationale",
];

/// The ontology node the model picked.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NodeChoice {
    pub title: String,
    pub description: String,
}

/// Any empty value (`null`, `{}`, `""`) means the model picked no node.
fn lenient_node<'de, D>(deserializer: D) -> Result<Option<NodeChoice>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Value::deserialize(deserializer)?;
    Ok(node_title(&value).map(|title| NodeChoice {
        title,
        description: value.get("description").map(value_text).unwrap_or_default(),
    }))
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct AppActivityAnswer {
    /// "perform" or "help", kept as the model wrote it
    #[serde(
        rename = "does_it_perform_the_activity_or_help_a_human_perform_it",
        deserialize_with = "lenient_text"
    )]
    pub mode: String,
    #[serde(
        rename = "reasoning_for_does_it_perform_the_activity_or_help_a_human_perform_it",
        deserialize_with = "lenient_text"
    )]
    pub mode_reasoning: String,
    #[serde(deserialize_with = "lenient_text")]
    pub substantive_activity: String,
    #[serde(deserialize_with = "lenient_text")]
    pub reasoning_substantive_activity: String,
    #[serde(deserialize_with = "lenient_node")]
    pub most_appropriate_node: Option<NodeChoice>,
    #[serde(deserialize_with = "lenient_text")]
    pub most_appropriate_node_rationale: String,
}

/// Task for the `apps` input table.
#[derive(Debug, Clone, Copy, Default)]
pub struct AppActivityTask;

impl ClassificationTask for AppActivityTask {
    type Record = AppRecord;
    type Answer = AppActivityAnswer;

    fn name(&self) -> &'static str {
        "apps"
    }

    fn headers(&self) -> &'static [&'static str] {
        HEADERS
    }

    fn key_columns(&self) -> usize {
        3
    }

    fn required_keys(&self) -> &'static [&'static str] {
        REQUIRED_KEYS
    }

    fn default_provider(&self) -> &'static str {
        "openai"
    }

    fn default_search_limit(&self) -> u32 {
        10
    }

    fn search_text<'a>(&self, record: &'a AppRecord) -> (&'a str, &'a str) {
        (&record.tagline, &record.description)
    }

    fn label<'a>(&self, record: &'a AppRecord) -> &'a str {
        &record.name
    }

    fn record_cells(&self, record: &AppRecord) -> Vec<String> {
        vec![
            record.name.clone(),
            record.tagline.clone(),
            record.description.clone(),
        ]
    }

    fn build_prompt(&self, record: &AppRecord, ontology: &SubOntology) -> String {
        format!(
            r#"## Role:
You are an analyst that classifies a software application according to: (a) what main substantive activity it performs or helps perform, represented as a "verb + object" phrase, (b) whether it performs the whole activity itself or helps a human perform the activity, and (c) which of the nodes in the ontology (provided as a JSON structure in the input) is the best classification for the main substantive activity. Work only with the supplied nodes and their fields; do not infer or invent nodes or properties.

## Ontology Definition:
{NODE_SCHEMA}

## Input:
- Application Title: "{name}"
- Application Tagline: "{tagline}"
- Application Description: '''{description}'''
- Ontology Nodes: {ontology}

## Output:
Return a single JSON object only (no prose), exactly with these keys and value types:
{{
  "does_it_perform_the_activity_or_help_a_human_perform_it": "perform" or "help",
  "reasoning_for_does_it_perform_the_activity_or_help_a_human_perform_it": "Explain why you think the app performs the activity, or helps a human perform it.",
  "substantive_activity": "The single 'base-form verb + object' describing the substantive activity",
  "reasoning_substantive_activity": "Explain your reasoning for substantive_activity. If info is sparse/ambiguous, make the best-supported choice and note low confidence in 'reasoning' fields.",
  "most_appropriate_node": {{
    "title": "title of the ontology node",
    "description": "description of the ontology node"
  }} or null if none of the supplied nodes fits,
  "most_appropriate_node_rationale": "your reasoning for choosing this ontology node"
}}
"#,
            name = record.name,
            tagline = record.tagline,
            description = record.description,
            ontology = ontology.pretty_json(),
        )
    }

    fn answer_cells(&self, answer: &AppActivityAnswer) -> Vec<String> {
        let classification = answer
            .most_appropriate_node
            .as_ref()
            .map(|node| format!("{}: \n{}", node.title, answer.most_appropriate_node_rationale))
            .unwrap_or_default();
        vec![
            format!("{}: \n{}", answer.mode.trim(), answer.mode_reasoning),
            format!(
                "{}: \n{}",
                answer.substantive_activity, answer.reasoning_substantive_activity
            ),
            classification,
        ]
    }

    fn chosen_node<'a>(&self, answer: &'a AppActivityAnswer) -> Option<&'a str> {
        answer.most_appropriate_node.as_ref().map(|n| n.title.as_str())
    }
}
