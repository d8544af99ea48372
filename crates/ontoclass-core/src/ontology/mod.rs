//! Sub-ontology retrieval.
//!
//! The service embeds the search query, finds the closest activity nodes and
//! returns them together with all their ancestors as one nested tree. The
//! tree goes into the classification prompt verbatim.

mod client;
mod types;

pub use client::{load_or_empty, OntologyClient, OntologySource};
pub use types::{NodeEntry, OntologyNode, SpecializationGroup, SubOntology, SubOntologyQuery};
