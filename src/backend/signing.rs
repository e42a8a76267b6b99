use std::time::SystemTime;

use aws_config::BehaviorVersion;
use aws_credential_types::provider::{ProvideCredentials, SharedCredentialsProvider};
use aws_sigv4::http_request::{SignableBody, SignableRequest, SigningSettings, sign};
use aws_sigv4::sign::v4;
use reqwest::header::{HeaderName, HeaderValue};
use tracing::debug;

#[derive(Debug, thiserror::Error)]
pub enum SigningError {
    #[error("no AWS credentials provider configured")]
    NoCredentialsProvider,

    #[error("no AWS region configured (set SEARCH_REGION or AWS_REGION)")]
    NoRegion,

    #[error("failed to resolve AWS credentials: {0}")]
    Credentials(String),

    #[error("failed to sign request: {0}")]
    Sign(String),
}

/// Attaches authentication to an outbound request before it is sent.
/// Implemented by `SigV4Signer` for production; tests may substitute their own.
pub trait RequestSigner {
    async fn sign(&self, request: &mut reqwest::Request) -> Result<(), SigningError>;
}

/// AWS Signature Version 4 signer using the ambient credential chain.
#[derive(Clone)]
pub struct SigV4Signer {
    credentials: SharedCredentialsProvider,
    region: String,
    service: String,
}

impl std::fmt::Debug for SigV4Signer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SigV4Signer")
            .field("region", &self.region)
            .field("service", &self.service)
            .finish_non_exhaustive()
    }
}

impl SigV4Signer {
    pub fn new(credentials: SharedCredentialsProvider, region: &str, service: &str) -> Self {
        Self {
            credentials,
            region: region.to_string(),
            service: service.to_string(),
        }
    }

    /// Resolves credentials and region the way the AWS SDKs do (environment,
    /// profile, container and instance metadata). `region` overrides the
    /// ambient region when set.
    pub async fn from_env(service: &str, region: Option<&str>) -> Result<Self, SigningError> {
        let sdk_config = aws_config::defaults(BehaviorVersion::latest()).load().await;
        let credentials = sdk_config
            .credentials_provider()
            .ok_or(SigningError::NoCredentialsProvider)?;
        let region = region
            .map(str::to_string)
            .or_else(|| sdk_config.region().map(|r| r.to_string()))
            .ok_or(SigningError::NoRegion)?;
        debug!(%region, service, "request signer configured");
        Ok(Self::new(credentials, &region, service))
    }
}

impl RequestSigner for SigV4Signer {
    async fn sign(&self, request: &mut reqwest::Request) -> Result<(), SigningError> {
        let credentials = self
            .credentials
            .provide_credentials()
            .await
            .map_err(|e| SigningError::Credentials(e.to_string()))?;
        let identity = credentials.into();

        let params = v4::SigningParams::builder()
            .identity(&identity)
            .region(&self.region)
            .name(&self.service)
            .time(SystemTime::now())
            .settings(SigningSettings::default())
            .build()
            .map_err(|e| SigningError::Sign(e.to_string()))?
            .into();

        let signed_headers: Vec<(String, String)> = {
            let headers: Vec<(&str, &str)> = request
                .headers()
                .iter()
                .filter_map(|(name, value)| Some((name.as_str(), value.to_str().ok()?)))
                .collect();
            let body = request
                .body()
                .and_then(reqwest::Body::as_bytes)
                .unwrap_or_default();
            let signable = SignableRequest::new(
                request.method().as_str(),
                request.url().as_str(),
                headers.into_iter(),
                SignableBody::Bytes(body),
            )
            .map_err(|e| SigningError::Sign(e.to_string()))?;

            let (instructions, _signature) = sign(signable, &params)
                .map_err(|e| SigningError::Sign(e.to_string()))?
                .into_parts();
            instructions
                .headers()
                .map(|(name, value)| (name.to_string(), value.to_string()))
                .collect()
        };

        for (name, value) in signed_headers {
            let name = HeaderName::from_bytes(name.as_bytes())
                .map_err(|e| SigningError::Sign(e.to_string()))?;
            let value =
                HeaderValue::from_str(&value).map_err(|e| SigningError::Sign(e.to_string()))?;
            request.headers_mut().insert(name, value);
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use aws_credential_types::Credentials;

    fn test_signer() -> SigV4Signer {
        let creds = Credentials::new("AKIDEXAMPLE", "secret", None, None, "test");
        SigV4Signer::new(SharedCredentialsProvider::new(creds), "us-east-2", "es")
    }

    fn search_request(body: &str) -> reqwest::Request {
        reqwest::Client::new()
            .get("https://search.example.com/gbif/_search?pretty=true")
            .header("Content-Type", "application/json")
            .body(body.to_string())
            .build()
            .unwrap()
    }

    #[tokio::test]
    async fn adds_sigv4_headers() {
        let mut request = search_request(r#"{"query":{"match_all":{}}}"#);
        test_signer().sign(&mut request).await.unwrap();

        let auth = request
            .headers()
            .get("authorization")
            .expect("authorization header")
            .to_str()
            .unwrap();
        assert!(auth.starts_with("AWS4-HMAC-SHA256 Credential=AKIDEXAMPLE/"));
        assert!(auth.contains("/us-east-2/es/aws4_request"));
        assert!(auth.contains("content-type"), "content-type should be signed: {auth}");
        assert!(request.headers().contains_key("x-amz-date"));
    }

    #[tokio::test]
    async fn session_token_is_forwarded() {
        let creds = Credentials::new("AKIDEXAMPLE", "secret", Some("token".into()), None, "test");
        let signer = SigV4Signer::new(SharedCredentialsProvider::new(creds), "us-east-2", "es");
        let mut request = search_request("{}");
        signer.sign(&mut request).await.unwrap();
        assert_eq!(
            request.headers().get("x-amz-security-token").unwrap(),
            "token"
        );
    }

    #[tokio::test]
    async fn preserves_existing_headers() {
        let mut request = search_request("{}");
        test_signer().sign(&mut request).await.unwrap();
        assert_eq!(
            request.headers().get("content-type").unwrap(),
            "application/json"
        );
    }

    #[test]
    fn debug_hides_credentials() {
        let rendered = format!("{:?}", test_signer());
        assert!(!rendered.contains("secret"));
        assert!(rendered.contains("us-east-2"));
    }
}
