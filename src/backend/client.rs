use std::time::Duration;

use reqwest::header::CONTENT_TYPE;
use reqwest::{Client, Method, StatusCode};
use tracing::{debug, warn};
use url::Url;

use super::signing::{RequestSigner, SigningError};
use crate::config::SearchConfig;
use crate::query::SearchQuery;

/// TCP connection establishment timeout.
const CONNECT_TIMEOUT: Duration = Duration::from_secs(5);

#[derive(Debug, thiserror::Error)]
pub enum SearchError {
    #[error("search backend returned {code} {reason}")]
    Upstream { code: u16, reason: String },

    #[error("failed to encode query: {0}")]
    Encode(#[from] serde_json::Error),

    #[error("{0}")]
    Signing(#[from] SigningError),

    #[error("network error: {0}")]
    Network(#[from] reqwest::Error),
}

/// Sends signed `_search` requests to a single index.
///
/// Each call is one attempt bounded by the configured timeout. Callers that
/// want retries apply them around `search`.
#[derive(Clone, Debug)]
pub struct SearchClient<S> {
    http: Client,
    signer: S,
    url: Url,
    timeout: Duration,
}

impl<S: RequestSigner> SearchClient<S> {
    pub fn new(config: &SearchConfig, signer: S) -> Result<Self, reqwest::Error> {
        let http = Client::builder()
            .connect_timeout(CONNECT_TIMEOUT)
            .user_agent(crate::USER_AGENT)
            .build()?;
        Ok(Self::with_http(http, config, signer))
    }

    pub fn with_http(http: Client, config: &SearchConfig, signer: S) -> Self {
        Self {
            http,
            signer,
            url: config.search_url(),
            timeout: config.timeout,
        }
    }

    pub fn url(&self) -> &Url {
        &self.url
    }

    /// Runs `query` and returns the raw response body.
    pub async fn search(&self, query: &SearchQuery) -> Result<String, SearchError> {
        let body = query.to_json()?;
        debug!(url = %self.url, body = %body, "sending search request");

        let mut request = self
            .http
            .request(Method::GET, self.url.clone())
            .header(CONTENT_TYPE, "application/json")
            .body(body)
            .timeout(self.timeout)
            .build()?;
        self.signer.sign(&mut request).await?;

        let response = self.http.execute(request).await?;
        let status = response.status();
        if !status.is_success() {
            let reason = status_text(status);
            warn!(status = status.as_u16(), %reason, "search backend error");
            return Err(SearchError::Upstream {
                code: status.as_u16(),
                reason,
            });
        }

        let text = response.text().await?;
        debug!(bytes = text.len(), "search complete");
        Ok(text)
    }
}

/// Standard reason phrase, or the status class for codes without one.
fn status_text(status: StatusCode) -> String {
    if let Some(reason) = status.canonical_reason() {
        return reason.to_string();
    }
    match status.as_u16() {
        400..=499 => "Client Error",
        500..=599 => "Server Error",
        _ => "Unexpected Status",
    }
    .to_string()
}
