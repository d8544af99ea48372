//! Wire and domain types for the sub-ontology service.

use serde::{Deserialize, Deserializer, Serialize};
use serde_json::{Map, Value};

/// Body of a `load-sub-ontology` request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SubOntologyQuery {
    pub search_query: String,
    pub application_name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub node_type: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub search_limit: Option<u32>,
}

impl SubOntologyQuery {
    /// Build a query from a record's primary and secondary text.
    pub fn new(primary: &str, secondary: &str, application_name: &str) -> Self {
        Self {
            search_query: format!("{primary} \n\n {secondary}"),
            application_name: application_name.to_string(),
            node_type: None,
            search_limit: None,
        }
    }

    pub fn with_node_type(mut self, node_type: Option<String>) -> Self {
        self.node_type = node_type;
        self
    }

    pub fn with_search_limit(mut self, search_limit: Option<u32>) -> Self {
        self.search_limit = search_limit;
        self
    }
}

/// Relevance-filtered subset of the ontology for one query.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SubOntology {
    /// Root node with nested specializations, as returned by the service
    #[serde(default = "empty_object")]
    pub ontology_object: Value,
    /// Similarity hits with whatever metadata the vector store attached
    #[serde(rename = "topResults", default, deserialize_with = "hit_list")]
    pub top_results: Vec<Value>,
}

fn empty_object() -> Value {
    Value::Object(Map::new())
}

/// Hits are informational; anything but an array reads as none.
fn hit_list<'de, D>(deserializer: D) -> Result<Vec<Value>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(match Value::deserialize(deserializer)? {
        Value::Array(hits) => hits,
        _ => Vec::new(),
    })
}

impl Default for SubOntology {
    fn default() -> Self {
        Self::empty()
    }
}

impl SubOntology {
    /// The context used when the service is unavailable.
    pub fn empty() -> Self {
        Self {
            ontology_object: empty_object(),
            top_results: Vec::new(),
        }
    }

    pub fn is_empty(&self) -> bool {
        match &self.ontology_object {
            Value::Object(map) => map.is_empty(),
            Value::Null => true,
            _ => false,
        }
    }

    /// Pretty-printed `ontology_object`, as embedded in prompts.
    pub fn pretty_json(&self) -> String {
        serde_json::to_string_pretty(&self.ontology_object).unwrap_or_else(|_| "{}".to_string())
    }

    /// Typed view of the root node, if the object has that shape.
    pub fn root_node(&self) -> Option<OntologyNode> {
        if self.is_empty() {
            return None;
        }
        match serde_json::from_value(self.ontology_object.clone()) {
            Ok(node) => Some(node),
            Err(e) => {
                tracing::debug!("ontology_object is not a node tree: {e}");
                None
            }
        }
    }

    /// Whether a node with this title (trimmed, ASCII case-insensitive)
    /// appears anywhere in the supplied tree.
    pub fn contains_title(&self, title: &str) -> bool {
        let wanted = title.trim();
        if wanted.is_empty() {
            return false;
        }
        self.root_node()
            .map(|root| {
                root.titles()
                    .iter()
                    .any(|t| t.trim().eq_ignore_ascii_case(wanted))
            })
            .unwrap_or(false)
    }
}

/// A titled, described action type with grouped specializations.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OntologyNode {
    pub title: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub specializations: Vec<SpecializationGroup>,
}

/// Specializations that vary along one dimension.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SpecializationGroup {
    #[serde(rename = "collectionName", alias = "collection_name", default)]
    pub collection_name: String,
    #[serde(default)]
    pub nodes: Vec<NodeEntry>,
}

/// A specialization is either just a title or a fully nested node.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum NodeEntry {
    Title(String),
    Node(OntologyNode),
}

impl NodeEntry {
    pub fn title(&self) -> &str {
        match self {
            NodeEntry::Title(title) => title,
            NodeEntry::Node(node) => &node.title,
        }
    }
}

impl OntologyNode {
    /// Every title in this subtree, depth-first, starting with this node.
    pub fn titles(&self) -> Vec<&str> {
        let mut out = vec![self.title.as_str()];
        for group in &self.specializations {
            for entry in &group.nodes {
                match entry {
                    NodeEntry::Title(title) => out.push(title),
                    NodeEntry::Node(node) => out.extend(node.titles()),
                }
            }
        }
        out
    }
}
