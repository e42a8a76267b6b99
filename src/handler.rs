use lambda_runtime::LambdaEvent;
use serde_json::Value;
use tracing::{Instrument, debug, error, info, info_span};

use crate::backend::{RequestSigner, SearchClient, SearchError};
use crate::event::{EventError, parse_query_params, unknown_fields};
use crate::query::QueryTranslator;

#[derive(Debug, thiserror::Error)]
pub enum InvocationError {
    #[error("invalid input: {0}")]
    Input(#[from] EventError),

    #[error(transparent)]
    Search(#[from] SearchError),
}

/// Turns one invocation event into one signed search and returns the body.
pub struct SearchHandler<S> {
    translator: QueryTranslator,
    client: SearchClient<S>,
}

impl<S: RequestSigner> SearchHandler<S> {
    pub fn new(translator: QueryTranslator, client: SearchClient<S>) -> Self {
        Self { translator, client }
    }

    pub async fn handle(
        &self,
        event: LambdaEvent<Value>,
    ) -> Result<String, lambda_runtime::Error> {
        let span = info_span!("search_invocation", request_id = %event.context.request_id);
        self.invoke(&event.payload)
            .instrument(span)
            .await
            .inspect_err(|e| error!(error = %e, "invocation failed"))
            .map_err(Into::into)
    }

    pub async fn invoke(&self, payload: &Value) -> Result<String, InvocationError> {
        debug!(payload = %payload, "received event");
        let params = parse_query_params(payload)?;

        let unknown = unknown_fields(&params);
        if !unknown.is_empty() {
            debug!(fields = ?unknown, "forwarding unrecognized fields as-is");
        }

        let query = self.translator.translate(&params);
        info!(
            params = params.len(),
            clauses = query.clauses().len(),
            match_all = query.is_match_all(),
            "searching"
        );

        Ok(self.client.search(&query).await?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backend::signing::SigningError;
    use crate::config::SearchConfig;
    use serde_json::json;
    use std::time::Duration;
    use url::Url;
    use wiremock::matchers::{body_json, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    struct NoopSigner;

    impl RequestSigner for NoopSigner {
        async fn sign(&self, _request: &mut reqwest::Request) -> Result<(), SigningError> {
            Ok(())
        }
    }

    fn handler(server: &MockServer) -> SearchHandler<NoopSigner> {
        let config = SearchConfig {
            endpoint: Url::parse(&server.uri()).unwrap(),
            index: "gbif".into(),
            signing_service: "es".into(),
            region: None,
            exact_fields: vec!["sex".into()],
            pretty: true,
            timeout: Duration::from_secs(2),
        };
        let client = SearchClient::new(&config, NoopSigner).unwrap();
        SearchHandler::new(QueryTranslator::new(config.exact_fields.clone()), client)
    }

    #[tokio::test]
    async fn translates_and_returns_body() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/gbif/_search"))
            .and(body_json(json!({
                "query": {"bool": {"should": [
                    {"term": {"sex": "male"}},
                    {"match": {"kingdom": "Animalia"}}
                ]}}
            })))
            .respond_with(ResponseTemplate::new(200).set_body_string(r#"{"hits":{}}"#))
            .expect(1)
            .mount(&server)
            .await;

        let event = json!({"params": {"querystring": {"sex": "male", "kingdom": "Animalia"}}});
        let body = handler(&server).invoke(&event).await.unwrap();
        assert_eq!(body, r#"{"hits":{}}"#);
    }

    #[tokio::test]
    async fn empty_query_string_searches_everything() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(body_json(json!({"query": {"match_all": {}}})))
            .respond_with(ResponseTemplate::new(200).set_body_string("all"))
            .expect(1)
            .mount(&server)
            .await;

        let event = json!({"params": {"querystring": {}}});
        assert_eq!(handler(&server).invoke(&event).await.unwrap(), "all");
    }

    #[tokio::test]
    async fn malformed_event_is_input_error() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(200))
            .expect(0)
            .mount(&server)
            .await;

        let err = handler(&server).invoke(&json!([1, 2, 3])).await.unwrap_err();
        assert!(matches!(err, InvocationError::Input(EventError::NotAnObject("array"))));
    }

    #[tokio::test]
    async fn upstream_error_propagates() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(400))
            .mount(&server)
            .await;

        let event = json!({"queryStringParameters": {"genus": "Puma"}});
        let err = handler(&server).invoke(&event).await.unwrap_err();
        assert!(matches!(
            err,
            InvocationError::Search(SearchError::Upstream { code: 400, .. })
        ));
        assert_eq!(err.to_string(), "search backend returned 400 Bad Request");
    }

    #[tokio::test]
    async fn handle_maps_error_for_runtime() {
        let server = MockServer::start().await;
        let event = LambdaEvent::new(json!("not an object"), lambda_runtime::Context::default());
        let err = handler(&server).handle(event).await.unwrap_err();
        assert!(err.to_string().contains("invalid input"), "got: {err}");
    }
}
