//! Find the closest generalizing ontology node for a job skill.

use super::{lenient_text, node_title, value_text, ClassificationTask, NODE_SCHEMA};
use crate::input::SkillRecord;
use crate::ontology::SubOntology;
use serde::{Deserialize, Deserializer};
use serde_json::Value;

const HEADERS: &[&str] = &[
    "Skill name",
    "Skill Description",
    "Generalization (the appropriate node of the ontology)",
    "Rationale",
    "InOntology",
    "Tokens",
    "Cost",
];

const REQUIRED_KEYS: &[&str] = &[
    "closest_generalization_node",
    "closest_generalization_node_rationale",
];

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct SkillGeneralizationAnswer {
    #[serde(deserialize_with = "generalization_node")]
    pub closest_generalization_node: String,
    #[serde(deserialize_with = "lenient_text")]
    pub closest_generalization_node_rationale: String,
}

/// The node is asked for as a title string; a node object yields its title.
fn generalization_node<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Value::deserialize(deserializer)?;
    Ok(match &value {
        Value::Object(_) => node_title(&value).unwrap_or_default(),
        other => value_text(other),
    })
}

/// Task for the `skills` input table.
#[derive(Debug, Clone, Copy, Default)]
pub struct SkillGeneralizationTask;

impl ClassificationTask for SkillGeneralizationTask {
    type Record = SkillRecord;
    type Answer = SkillGeneralizationAnswer;

    fn name(&self) -> &'static str {
        "skills"
    }

    fn headers(&self) -> &'static [&'static str] {
        HEADERS
    }

    fn key_columns(&self) -> usize {
        2
    }

    fn required_keys(&self) -> &'static [&'static str] {
        REQUIRED_KEYS
    }

    fn default_provider(&self) -> &'static str {
        "gemini"
    }

    fn default_search_limit(&self) -> u32 {
        100
    }

    fn search_text<'a>(&self, record: &'a SkillRecord) -> (&'a str, &'a str) {
        (&record.name, &record.description)
    }

    fn label<'a>(&self, record: &'a SkillRecord) -> &'a str {
        &record.name
    }

    fn record_cells(&self, record: &SkillRecord) -> Vec<String> {
        vec![record.name.clone(), record.description.clone()]
    }

    fn build_prompt(&self, record: &SkillRecord, ontology: &SubOntology) -> String {
        format!(
            r#"## Role:
You are an analyst that classifies an activity, specifying which of the nodes in the ontology (provided as a JSON structure in the input) is the best generalization for the given activity. Work only with the supplied nodes and their fields; do not infer or invent nodes or properties.

## Ontology Definition:
{NODE_SCHEMA}

## Input:
- Activity Title: "{name}"
- Activity description: "{description}"
- Ontology Nodes: {ontology}

## Output:
Return a single JSON object only (no prose), exactly with these keys and value types:
{{
  "closest_generalization_node": "the ontology node title that is the closest generalization of this activity, it should be a string",
  "closest_generalization_node_rationale": "your reasoning for choosing this ontology node"
}}
"#,
            name = record.name,
            description = record.description,
            ontology = ontology.pretty_json(),
        )
    }

    fn answer_cells(&self, answer: &SkillGeneralizationAnswer) -> Vec<String> {
        vec![
            answer.closest_generalization_node.clone(),
            answer.closest_generalization_node_rationale.clone(),
        ]
    }

    fn chosen_node<'a>(&self, answer: &'a SkillGeneralizationAnswer) -> Option<&'a str> {
        let node = answer.closest_generalization_node.trim();
        (!node.is_empty()).then_some(node)
    }
}
