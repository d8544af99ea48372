//! Bounded retry loop that turns a record into a validated answer.
//!
//! Each attempt is one LLM call. An attempt succeeds only when the response
//! holds a JSON object with every required key that also deserializes into
//! the task's answer type. Malformed answers are retried immediately;
//! transient provider errors back off first; permanent provider errors end
//! the loop.

use crate::config::ClassifyConfig;
use crate::error::SchemaError;
use crate::llm::{retry, CostEstimate, LlmRequest, Money, ReasoningEffort, RequestClient, UsageTokens};
use crate::ontology::SubOntology;
use crate::task::ClassificationTask;
use serde_json::{Map, Value};

/// Retry loop settings.
#[derive(Debug, Clone)]
pub struct ClassifyOptions {
    /// LLM calls per record before giving up (at least 1)
    pub max_attempts: u32,
    /// Base backoff delay for transient provider errors
    pub retry_delay_ms: u64,
    pub reasoning_effort: Option<ReasoningEffort>,
    pub max_output_tokens: Option<u32>,
}

impl Default for ClassifyOptions {
    fn default() -> Self {
        Self::from_config(&ClassifyConfig::default())
    }
}

impl ClassifyOptions {
    pub fn from_config(config: &ClassifyConfig) -> Self {
        Self {
            max_attempts: config.max_attempts,
            retry_delay_ms: config.retry_delay_ms,
            reasoning_effort: Some(config.reasoning_effort),
            max_output_tokens: config.max_output_tokens,
        }
    }
}

/// A validated answer and what it cost.
#[derive(Debug, Clone)]
pub struct ClassificationResult<A> {
    pub answer: A,
    /// Usage of the accepted call
    pub usage: UsageTokens,
    /// Cost of the accepted call
    pub cost: CostEstimate,
    pub model: String,
    /// Attempts used, including the accepted one
    pub attempts: u32,
    pub latency_ms: u64,
    /// Usage across every attempt, rejected ones included
    pub total_usage: UsageTokens,
    pub total_cost: Money,
}

/// Result of classifying one record.
#[derive(Debug, Clone)]
pub enum ClassifyOutcome<A> {
    Classified(ClassificationResult<A>),
    /// No valid answer within the attempt budget
    Exhausted {
        attempts: u32,
        last_error: String,
        total_usage: UsageTokens,
        total_cost: Money,
    },
}

impl<A> ClassifyOutcome<A> {
    pub fn is_classified(&self) -> bool {
        matches!(self, ClassifyOutcome::Classified(_))
    }
}

/// Drives the retry loop against one configured provider.
pub struct Classifier {
    client: RequestClient,
    options: ClassifyOptions,
}

impl Classifier {
    pub fn new(client: RequestClient, mut options: ClassifyOptions) -> Self {
        options.max_attempts = options.max_attempts.max(1);
        Self { client, options }
    }

    pub fn client(&self) -> &RequestClient {
        &self.client
    }

    pub fn options(&self) -> &ClassifyOptions {
        &self.options
    }

    /// Classify one record against the supplied ontology context.
    pub async fn classify<T: ClassificationTask>(
        &self,
        task: &T,
        record: &T::Record,
        ontology: &SubOntology,
    ) -> ClassifyOutcome<T::Answer> {
        let max_attempts = self.options.max_attempts;
        let label = task.label(record);
        let mut request = LlmRequest::new(task.build_prompt(record, ontology))
            .with_reasoning_effort(self.options.reasoning_effort);
        request.max_output_tokens = self.options.max_output_tokens;

        let mut last_error = String::new();
        let mut total_usage = UsageTokens::default();
        let mut total_cost = Money::default();

        for attempt in 1..=max_attempts {
            match self.client.send_request(&request).await {
                Ok(envelope) => {
                    total_usage = total_usage + envelope.usage;
                    total_cost = total_cost + envelope.cost.total_cost;

                    match check_answer(task, envelope.parsed_object) {
                        Ok(answer) => {
                            tracing::debug!("Classified '{label}' on attempt {attempt}/{max_attempts}");
                            return ClassifyOutcome::Classified(ClassificationResult {
                                answer,
                                usage: envelope.usage,
                                cost: envelope.cost,
                                model: envelope.model,
                                attempts: attempt,
                                latency_ms: envelope.execution_time_ms,
                                total_usage,
                                total_cost,
                            });
                        }
                        Err(e) => {
                            tracing::warn!(
                                "Invalid response for '{label}' (attempt {attempt}/{max_attempts}): {e}"
                            );
                            last_error = e.to_string();
                        }
                    }
                }
                Err(e) => {
                    last_error = e.to_string();
                    if !retry::is_retryable(&e) {
                        tracing::warn!("Giving up on '{label}' after non-retryable error: {e}");
                        return ClassifyOutcome::Exhausted {
                            attempts: attempt,
                            last_error,
                            total_usage,
                            total_cost,
                        };
                    }
                    tracing::warn!("LLM call for '{label}' failed (attempt {attempt}/{max_attempts}): {e}");
                    if attempt < max_attempts {
                        let delay = retry::backoff_duration(attempt - 1, self.options.retry_delay_ms);
                        tracing::debug!("Retrying '{label}' after {delay:?}");
                        tokio::time::sleep(delay).await;
                    }
                }
            }
        }

        tracing::warn!("No valid answer for '{label}' after {max_attempts} attempts");
        ClassifyOutcome::Exhausted {
            attempts: max_attempts,
            last_error,
            total_usage,
            total_cost,
        }
    }
}

/// Validate a parsed object against the task's contract.
fn check_answer<T: ClassificationTask>(
    task: &T,
    parsed: Option<Map<String, Value>>,
) -> Result<T::Answer, SchemaError> {
    let object = parsed.ok_or(SchemaError::NoObject)?;

    let missing: Vec<String> = task
        .required_keys()
        .iter()
        .filter(|key| !object.contains_key(**key))
        .map(|key| key.to_string())
        .collect();
    if !missing.is_empty() {
        return Err(SchemaError::MissingKeys(missing));
    }

    serde_json::from_value(Value::Object(object))
        .map_err(|e| SchemaError::InvalidShape(e.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::LlmError;
    use crate::input::{AppRecord, SkillRecord};
    use crate::llm::mock::MockProvider;
    use crate::llm::openai::OpenAiProvider;
    use crate::llm::{LlmProvider, PricingTable};
    use crate::task::{AppActivityTask, SkillGeneralizationTask};
    use std::sync::atomic::Ordering;

    const VALID: &str = r#"Here you go: {"closest_generalization_node": "Gather information", "closest_generalization_node_rationale": "fits"}"#;
    const PARTIAL: &str = r#"{"closest_generalization_node": "Gather information"}"#;

    fn classifier(provider: MockProvider, max_attempts: u32) -> Classifier {
        classifier_for(Box::new(provider), max_attempts)
    }

    fn classifier_for(provider: Box<dyn LlmProvider>, max_attempts: u32) -> Classifier {
        let client = RequestClient::new(provider, PricingTable::flat(1.0, 10.0), 5_000);
        Classifier::new(
            client,
            ClassifyOptions {
                max_attempts,
                retry_delay_ms: 1,
                reasoning_effort: Some(ReasoningEffort::High),
                max_output_tokens: None,
            },
        )
    }

    fn skill() -> SkillRecord {
        SkillRecord {
            name: "Patient intake".into(),
            description: "Collect history".into(),
            source_row: 1,
        }
    }

    #[tokio::test]
    async fn test_valid_on_third_attempt_uses_three_calls() {
        let provider = MockProvider::sequence(&["no json at all", PARTIAL, VALID, VALID]);
        let calls = provider.call_count_handle();
        let classifier = classifier(provider, 5);

        let outcome = classifier
            .classify(&SkillGeneralizationTask, &skill(), &SubOntology::empty())
            .await;

        assert_eq!(calls.load(Ordering::SeqCst), 3);
        match outcome {
            ClassifyOutcome::Classified(result) => {
                assert_eq!(result.attempts, 3);
                assert_eq!(result.answer.closest_generalization_node, "Gather information");
                assert_eq!(result.model, "mock-v1");
                // 1000 input at 1.0 + 300 billable output at 10.0
                assert_eq!(result.cost.total_cost, Money(4_000));
                assert_eq!(result.total_cost, Money(12_000));
                assert_eq!(result.total_usage.input, 3_000);
            }
            other => panic!("expected Classified, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_two_missing_key_answers_then_valid_within_three() {
        let provider = MockProvider::sequence(&[PARTIAL, PARTIAL, VALID])
            .with_usage(UsageTokens::new(500, 0, 50));
        let calls = provider.call_count_handle();

        let outcome = classifier(provider, 3)
            .classify(&SkillGeneralizationTask, &skill(), &SubOntology::empty())
            .await;

        assert_eq!(calls.load(Ordering::SeqCst), 3);
        match outcome {
            ClassifyOutcome::Classified(result) => {
                assert_eq!(result.attempts, 3);
                assert_eq!(result.usage, UsageTokens::new(500, 0, 50));
                assert_eq!(result.total_usage.input, 1_500);
                assert_eq!(result.total_usage.output, 150);
            }
            other => panic!("expected Classified, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_never_valid_uses_exactly_bound_calls() {
        let provider = MockProvider::always(PARTIAL);
        let calls = provider.call_count_handle();
        let classifier = classifier(provider, 4);

        let outcome = classifier
            .classify(&SkillGeneralizationTask, &skill(), &SubOntology::empty())
            .await;

        assert_eq!(calls.load(Ordering::SeqCst), 4);
        match outcome {
            ClassifyOutcome::Exhausted {
                attempts,
                last_error,
                total_usage,
                ..
            } => {
                assert_eq!(attempts, 4);
                assert!(last_error.contains("closest_generalization_node_rationale"));
                assert_eq!(total_usage.input, 4_000);
            }
            other => panic!("expected Exhausted, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_first_valid_answer_stops_the_loop() {
        let provider = MockProvider::always(VALID);
        let calls = provider.call_count_handle();
        let outcome = classifier(provider, 3)
            .classify(&SkillGeneralizationTask, &skill(), &SubOntology::empty())
            .await;
        assert!(outcome.is_classified());
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_non_retryable_error_ends_loop_early() {
        let provider = MockProvider::failing(LlmError::http(401, "unauthorized"));
        let calls = provider.call_count_handle();
        let outcome = classifier(provider, 3)
            .classify(&SkillGeneralizationTask, &skill(), &SubOntology::empty())
            .await;

        assert_eq!(calls.load(Ordering::SeqCst), 1);
        assert!(matches!(outcome, ClassifyOutcome::Exhausted { attempts: 1, .. }));
    }

    #[tokio::test]
    async fn test_transient_error_then_success() {
        let provider = MockProvider::new(|idx, _| {
            if idx == 0 {
                Err(LlmError::http(429, "rate limited"))
            } else {
                Ok(VALID.to_string())
            }
        });
        let calls = provider.call_count_handle();
        let outcome = classifier(provider, 3)
            .classify(&SkillGeneralizationTask, &skill(), &SubOntology::empty())
            .await;

        assert_eq!(calls.load(Ordering::SeqCst), 2);
        match outcome {
            ClassifyOutcome::Classified(result) => assert_eq!(result.attempts, 2),
            other => panic!("expected Classified, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_refused_connection_uses_every_attempt() {
        // nothing listens on the discard port
        let provider =
            OpenAiProvider::with_endpoint("k", "gpt-5", "http://127.0.0.1:9/v1/chat/completions");
        let outcome = classifier_for(Box::new(provider), 3)
            .classify(&SkillGeneralizationTask, &skill(), &SubOntology::empty())
            .await;

        match outcome {
            ClassifyOutcome::Exhausted { attempts, .. } => assert_eq!(attempts, 3),
            other => panic!("expected Exhausted, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_transport_failure_then_success() {
        let provider = MockProvider::new(|idx, _| match idx {
            0 => Err(LlmError {
                transient: true,
                ..LlmError::new("error sending request")
            }),
            _ => Ok(VALID.to_string()),
        });
        let calls = provider.call_count_handle();
        let outcome = classifier(provider, 3)
            .classify(&SkillGeneralizationTask, &skill(), &SubOntology::empty())
            .await;

        assert_eq!(calls.load(Ordering::SeqCst), 2);
        assert!(outcome.is_classified());
    }

    #[tokio::test]
    async fn test_empty_model_output_is_retried() {
        let provider = MockProvider::sequence(&["", VALID]);
        let calls = provider.call_count_handle();
        let outcome = classifier(provider, 3)
            .classify(&SkillGeneralizationTask, &skill(), &SubOntology::empty())
            .await;

        assert_eq!(calls.load(Ordering::SeqCst), 2);
        assert!(outcome.is_classified());
    }

    fn acme_answer(mode: &str, node: Value) -> String {
        serde_json::json!({
            "does_it_perform_the_activity_or_help_a_human_perform_it": mode,
            "reasoning_for_does_it_perform_the_activity_or_help_a_human_perform_it": "Runs unattended",
            "substantive_activity": "schedule appointments",
            "reasoning_substantive_activity": "Core feature",
            "most_appropriate_node": node,
            "most_appropriate_node_rationale": "Nothing fits"
        })
        .to_string()
    }

    #[tokio::test]
    async fn test_loose_app_answers_classify_on_first_call() {
        let acme = AppRecord {
            name: "Acme".into(),
            tagline: "Books meetings".into(),
            description: "AI calendar assistant".into(),
        };
        let answers = [
            acme_answer("performs", Value::Null),
            acme_answer("perform", serde_json::json!({})),
            acme_answer("help", serde_json::json!("")),
        ];

        for text in answers {
            let provider = MockProvider::always(&text);
            let calls = provider.call_count_handle();
            let outcome = classifier(provider, 3)
                .classify(&AppActivityTask, &acme, &SubOntology::empty())
                .await;

            assert_eq!(calls.load(Ordering::SeqCst), 1, "answer {text}");
            match outcome {
                ClassifyOutcome::Classified(result) => {
                    assert!(result.answer.most_appropriate_node.is_none());
                }
                other => panic!("expected Classified for {text}, got {other:?}"),
            }
        }
    }

    #[tokio::test]
    async fn test_prompt_is_built_once_and_reused() {
        let provider = MockProvider::sequence(&["nope", VALID]);
        let prompts = provider.prompts_handle();
        classifier(provider, 3)
            .classify(&SkillGeneralizationTask, &skill(), &SubOntology::empty())
            .await;

        let prompts = prompts.lock().unwrap();
        assert_eq!(prompts.len(), 2);
        assert_eq!(prompts[0], prompts[1]);
        assert!(prompts[0].contains("Patient intake"));
    }

    #[tokio::test]
    async fn test_zero_attempts_is_clamped_to_one() {
        let provider = MockProvider::always("nothing");
        let calls = provider.call_count_handle();
        let outcome = classifier(provider, 0)
            .classify(&SkillGeneralizationTask, &skill(), &SubOntology::empty())
            .await;
        assert_eq!(calls.load(Ordering::SeqCst), 1);
        assert!(matches!(outcome, ClassifyOutcome::Exhausted { attempts: 1, .. }));
    }

    #[test]
    fn test_check_answer_reports_missing_keys() {
        let task = SkillGeneralizationTask;
        assert_eq!(check_answer(&task, None).unwrap_err(), SchemaError::NoObject);

        let object = crate::llm::extract_object(PARTIAL);
        assert_eq!(
            check_answer(&task, object).unwrap_err(),
            SchemaError::MissingKeys(vec!["closest_generalization_node_rationale".to_string()])
        );

        let object = crate::llm::extract_object(
            r#"{"closest_generalization_node": 5, "closest_generalization_node_rationale": "x"}"#,
        );
        assert_eq!(check_answer(&task, object).unwrap().closest_generalization_node, "5");
    }
}
