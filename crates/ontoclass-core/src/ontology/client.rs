//! HTTP client for the `load-sub-ontology` service.

use super::types::{SubOntology, SubOntologyQuery};
use crate::config::{LimitsConfig, OntologyConfig};
use crate::error::OntologyError;
use crate::llm::provider::resolve_env_var;
use async_trait::async_trait;
use std::time::Duration;

/// Anything that can answer a sub-ontology query.
#[async_trait]
pub trait OntologySource: Send + Sync {
    async fn load_sub_ontology(
        &self,
        query: &SubOntologyQuery,
    ) -> Result<SubOntology, OntologyError>;
}

/// Client for the remote ontology service.
pub struct OntologyClient {
    http: reqwest::Client,
    endpoint: String,
    api_key: Option<String>,
    timeout: Duration,
}

impl OntologyClient {
    pub fn new(endpoint: &str, timeout_ms: u64) -> Self {
        Self {
            http: reqwest::Client::new(),
            endpoint: endpoint.to_string(),
            api_key: None,
            timeout: Duration::from_millis(timeout_ms),
        }
    }

    pub fn with_api_key(mut self, api_key: Option<String>) -> Self {
        self.api_key = api_key;
        self
    }

    pub fn from_config(ontology: &OntologyConfig, limits: &LimitsConfig) -> Self {
        let api_key = ontology.api_key.as_deref().and_then(resolve_env_var);
        Self::new(&ontology.endpoint, limits.ontology_timeout_ms).with_api_key(api_key)
    }
}

#[async_trait]
impl OntologySource for OntologyClient {
    async fn load_sub_ontology(
        &self,
        query: &SubOntologyQuery,
    ) -> Result<SubOntology, OntologyError> {
        if query.search_query.trim().is_empty() {
            return Err(OntologyError::InvalidQuery("searchQuery is empty".into()));
        }
        if query.application_name.trim().is_empty() {
            return Err(OntologyError::InvalidQuery("applicationName is empty".into()));
        }

        let mut request = self
            .http
            .post(&self.endpoint)
            .timeout(self.timeout)
            .json(query);
        if let Some(key) = &self.api_key {
            request = request.bearer_auth(key);
        }

        let response = request
            .send()
            .await
            .map_err(|e| OntologyError::Request(e.to_string()))?;

        let status = response.status();
        let body = response
            .text()
            .await
            .map_err(|e| OntologyError::Request(e.to_string()))?;
        if !status.is_success() {
            return Err(OntologyError::Status {
                status: status.as_u16(),
                body,
            });
        }

        serde_json::from_str(&body).map_err(|e| OntologyError::Decode(e.to_string()))
    }
}

/// Fetch a sub-ontology, degrading to an empty context on any failure.
pub async fn load_or_empty(source: &dyn OntologySource, query: &SubOntologyQuery) -> SubOntology {
    match source.load_sub_ontology(query).await {
        Ok(sub) => {
            tracing::debug!(hits = sub.top_results.len(), "Loaded sub-ontology");
            sub
        }
        Err(e) => {
            tracing::warn!("{e}; using empty ontology context");
            SubOntology::empty()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use wiremock::matchers::{body_json, header, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn query() -> SubOntologyQuery {
        SubOntologyQuery::new("Books meetings", "AI calendar", "final-hierarchy-with-o*net")
            .with_node_type(Some("activity".to_string()))
            .with_search_limit(Some(10))
    }

    #[tokio::test]
    async fn test_posts_query_and_parses_response() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/api/load-sub-ontology"))
            .and(header("Authorization", "Bearer secret"))
            .and(body_json(json!({
                "searchQuery": "Books meetings \n\n AI calendar",
                "applicationName": "final-hierarchy-with-o*net",
                "nodeType": "activity",
                "searchLimit": 10
            })))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "ontology_object": {"title": "Act", "specializations": []},
                "topResults": [{"id": "1", "similarity": 0.5}]
            })))
            .expect(1)
            .mount(&server)
            .await;

        let client = OntologyClient::new(&format!("{}/api/load-sub-ontology", server.uri()), 5_000)
            .with_api_key(Some("secret".to_string()));
        let sub = client.load_sub_ontology(&query()).await.unwrap();
        assert!(sub.contains_title("Act"));
        assert_eq!(sub.top_results.len(), 1);
    }

    #[tokio::test]
    async fn test_server_error_maps_to_status() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(500).set_body_string("{}"))
            .mount(&server)
            .await;

        let client = OntologyClient::new(&server.uri(), 5_000);
        let err = client.load_sub_ontology(&query()).await.unwrap_err();
        assert!(matches!(err, OntologyError::Status { status: 500, .. }));
    }

    #[tokio::test]
    async fn test_non_json_body_maps_to_decode() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(200).set_body_string("<html>oops</html>"))
            .mount(&server)
            .await;

        let client = OntologyClient::new(&server.uri(), 5_000);
        let err = client.load_sub_ontology(&query()).await.unwrap_err();
        assert!(matches!(err, OntologyError::Decode(_)));
    }

    #[tokio::test]
    async fn test_empty_query_rejected_without_request() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(200))
            .expect(0)
            .mount(&server)
            .await;

        let client = OntologyClient::new(&server.uri(), 5_000);
        let mut q = query();
        q.search_query = "   ".to_string();
        let err = client.load_sub_ontology(&q).await.unwrap_err();
        assert!(matches!(err, OntologyError::InvalidQuery(_)));
    }

    #[tokio::test]
    async fn test_load_or_empty_degrades() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(200).set_body_string("not json"))
            .mount(&server)
            .await;

        let client = OntologyClient::new(&server.uri(), 5_000);
        let sub = load_or_empty(&client, &query()).await;
        assert!(sub.is_empty());
        assert_eq!(sub.pretty_json(), "{}");
    }
}
