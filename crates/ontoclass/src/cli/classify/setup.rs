//! Run setup: config overrides, provider resolution, runner assembly.

use ontoclass_core::{
    BatchOptions, BatchRunner, ClassificationTask, Classifier, ClassifyOptions, Config,
    LlmProviderFactory, OntologyClient, OutputFormat as CoreOutputFormat, RequestClient,
};

use std::collections::HashSet;

use super::ClassifyArgs;

/// Fold command-line overrides into the loaded config.
pub fn apply_overrides(config: &mut Config, args: &ClassifyArgs) {
    if let Some(attempts) = args.max_attempts {
        config.classify.max_attempts = attempts;
    }
    if let Some(effort) = args.reasoning_effort {
        config.classify.reasoning_effort = effort.into();
    }
    if let Some(limit) = args.search_limit {
        config.ontology.search_limit = Some(limit);
    }
    if let Some(name) = &args.application_name {
        config.ontology.application_name = name.clone();
    }
    if let Some(node_type) = &args.node_type {
        config.ontology.node_type = (!node_type.is_empty()).then(|| node_type.clone());
    }
    if let Some(format) = args.format {
        config.output.format = format.to_string();
    }
    if let Some(provider) = args.llm {
        config.llm.provider = Some(provider.to_string());
    }
}

/// Provider for this run: explicit choice, then config, then the task default.
pub fn resolve_provider<T: ClassificationTask>(config: &Config, task: &T) -> String {
    config
        .llm
        .provider
        .clone()
        .unwrap_or_else(|| task.default_provider().to_string())
}

pub fn output_format(config: &Config) -> anyhow::Result<CoreOutputFormat> {
    CoreOutputFormat::parse(&config.output.format)
        .ok_or_else(|| anyhow::anyhow!("Unsupported output format: {}", config.output.format))
}

/// Assemble the classifier, ontology client and runner for a task.
pub fn build_runner<T: ClassificationTask>(
    task: T,
    config: &Config,
    model_override: Option<&str>,
    existing_keys: HashSet<Vec<String>>,
) -> anyhow::Result<BatchRunner<T>> {
    let provider_name = resolve_provider(config, &task);
    let provider = LlmProviderFactory::create(&provider_name, &config.llm, model_override)?;
    let pricing = LlmProviderFactory::pricing(&provider_name, &config.llm)?;
    tracing::info!("Using LLM provider: {}", provider.name());

    let client = RequestClient::new(provider, pricing, config.limits.llm_timeout_ms);
    let classifier = Classifier::new(client, ClassifyOptions::from_config(&config.classify));
    let ontology = OntologyClient::from_config(&config.ontology, &config.limits);
    let options = BatchOptions {
        existing_keys,
        ..BatchOptions::from_config(config, &task)
    };

    Ok(BatchRunner::new(task, classifier, Box::new(ontology), options))
}
