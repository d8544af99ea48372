//! Sequential batch driver: ontology lookup, classification, one row per record.

use crate::classify::{Classifier, ClassifyOutcome};
use crate::config::Config;
use crate::error::Result;
use crate::llm::{Money, UsageTokens};
use crate::ontology::{load_or_empty, OntologySource, SubOntologyQuery};
use crate::output::TableWriter;
use crate::task::ClassificationTask;
use std::collections::HashSet;
use std::io::Write;

/// Per-run query settings and resume state.
#[derive(Debug, Clone, Default)]
pub struct BatchOptions {
    pub application_name: String,
    pub node_type: Option<String>,
    pub search_limit: Option<u32>,
    /// Record keys already present in the output table
    pub existing_keys: HashSet<Vec<String>>,
}

impl BatchOptions {
    /// Query settings from config, with the task's default search limit.
    pub fn from_config<T: ClassificationTask>(config: &Config, task: &T) -> Self {
        Self {
            application_name: config.ontology.application_name.clone(),
            node_type: config.ontology.node_type.clone(),
            search_limit: Some(
                config
                    .ontology
                    .search_limit
                    .unwrap_or_else(|| task.default_search_limit()),
            ),
            existing_keys: HashSet::new(),
        }
    }
}

/// Progress notifications, in record order.
#[derive(Debug, Clone, PartialEq)]
pub enum BatchEvent {
    /// Work on a record began
    Started {
        index: usize,
        total: usize,
        label: String,
    },
    /// A row was appended
    Written {
        label: String,
        attempts: u32,
        cost: Money,
    },
    /// No valid answer; the record was left out
    Skipped {
        label: String,
        attempts: u32,
        reason: String,
    },
    /// The record was already in the output table
    AlreadyDone { label: String },
}

/// Totals for one run.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct BatchStats {
    pub total: usize,
    pub written: usize,
    pub skipped: usize,
    pub already_done: usize,
    /// Tokens across every LLM call, rejected attempts included
    pub usage: UsageTokens,
    pub total_cost: Money,
}

/// Runs a task over a list of records, strictly one at a time.
pub struct BatchRunner<T: ClassificationTask> {
    task: T,
    classifier: Classifier,
    ontology: Box<dyn OntologySource>,
    options: BatchOptions,
}

impl<T: ClassificationTask> BatchRunner<T> {
    pub fn new(
        task: T,
        classifier: Classifier,
        ontology: Box<dyn OntologySource>,
        options: BatchOptions,
    ) -> Self {
        Self {
            task,
            classifier,
            ontology,
            options,
        }
    }

    pub fn task(&self) -> &T {
        &self.task
    }

    fn query_for(&self, record: &T::Record) -> SubOntologyQuery {
        let (primary, secondary) = self.task.search_text(record);
        SubOntologyQuery::new(primary, secondary, &self.options.application_name)
            .with_node_type(self.options.node_type.clone())
            .with_search_limit(self.options.search_limit)
    }

    /// Classify every record and append one row per success.
    ///
    /// Only output write failures abort the run.
    pub async fn run<W, F>(
        &self,
        records: &[T::Record],
        writer: &mut TableWriter<W>,
        mut on_event: F,
    ) -> Result<BatchStats>
    where
        W: Write,
        F: FnMut(BatchEvent),
    {
        let mut stats = BatchStats {
            total: records.len(),
            ..BatchStats::default()
        };
        let key_columns = self.task.key_columns();

        for (index, record) in records.iter().enumerate() {
            let label = self.task.label(record).to_string();

            if !self.options.existing_keys.is_empty() {
                let mut key = self.task.record_cells(record);
                key.truncate(key_columns);
                if self.options.existing_keys.contains(&key) {
                    stats.already_done += 1;
                    on_event(BatchEvent::AlreadyDone { label });
                    continue;
                }
            }

            on_event(BatchEvent::Started {
                index,
                total: records.len(),
                label: label.clone(),
            });
            tracing::info!("Processing {}/{}: {label}", index + 1, records.len());

            let ontology = load_or_empty(self.ontology.as_ref(), &self.query_for(record)).await;

            match self.classifier.classify(&self.task, record, &ontology).await {
                ClassifyOutcome::Classified(result) => {
                    writer.write_row(&self.task.to_row(record, &result, &ontology))?;
                    stats.written += 1;
                    stats.usage = stats.usage + result.total_usage;
                    stats.total_cost = stats.total_cost + result.total_cost;
                    on_event(BatchEvent::Written {
                        label,
                        attempts: result.attempts,
                        cost: result.cost.total_cost,
                    });
                }
                ClassifyOutcome::Exhausted {
                    attempts,
                    last_error,
                    total_usage,
                    total_cost,
                } => {
                    tracing::warn!("Could not classify '{label}', skipping: {last_error}");
                    stats.skipped += 1;
                    stats.usage = stats.usage + total_usage;
                    stats.total_cost = stats.total_cost + total_cost;
                    on_event(BatchEvent::Skipped {
                        label,
                        attempts,
                        reason: last_error,
                    });
                }
            }
        }

        writer.flush()?;
        Ok(stats)
    }
}
