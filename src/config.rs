use std::env;
use std::time::Duration;

use url::Url;

use crate::query::DEFAULT_EXACT_FIELDS;

const DEFAULT_INDEX: &str = "gbif";
const DEFAULT_SIGNING_SERVICE: &str = "es";
const DEFAULT_TIMEOUT: Duration = Duration::from_secs(10);

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("SEARCH_ENDPOINT not set")]
    EndpointNotSet,

    #[error("invalid SEARCH_ENDPOINT: {0}")]
    InvalidEndpoint(#[from] url::ParseError),

    #[error("SEARCH_ENDPOINT must use https, got '{0}'")]
    InsecureEndpoint(String),

    #[error("{name} must not be empty")]
    Empty { name: &'static str },

    #[error("invalid value for {name}: '{value}'")]
    InvalidValue { name: &'static str, value: String },
}

/// Per-deployment settings for one search index.
///
/// Read from the environment:
/// - `SEARCH_ENDPOINT`: https base URL of the domain (required)
/// - `SEARCH_INDEX`: target index (default `gbif`)
/// - `SEARCH_SIGNING_SERVICE`: SigV4 service name (default `es`)
/// - `SEARCH_REGION`: SigV4 region (default: ambient AWS region)
/// - `SEARCH_EXACT_FIELDS`: comma-separated fields matched with `term` (default `sex`;
///   set but empty means every field uses `match`)
/// - `SEARCH_PRETTY`: `pretty` flag sent to the backend (default `true`)
/// - `SEARCH_TIMEOUT_SECS`: outbound request timeout (default 10)
#[derive(Debug, Clone)]
pub struct SearchConfig {
    pub endpoint: Url,
    pub index: String,
    pub signing_service: String,
    pub region: Option<String>,
    pub exact_fields: Vec<String>,
    pub pretty: bool,
    pub timeout: Duration,
}

impl SearchConfig {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let get = |key: &str| {
            lookup(key)
                .map(|v| v.trim().to_string())
                .filter(|v| !v.is_empty())
        };

        let raw_endpoint = get("SEARCH_ENDPOINT").ok_or(ConfigError::EndpointNotSet)?;
        let endpoint = Url::parse(&raw_endpoint)?;
        if endpoint.scheme() != "https" {
            return Err(ConfigError::InsecureEndpoint(raw_endpoint));
        }

        let index = match lookup("SEARCH_INDEX") {
            Some(v) if v.trim().is_empty() => {
                return Err(ConfigError::Empty {
                    name: "SEARCH_INDEX",
                });
            }
            Some(v) => v.trim().to_string(),
            None => DEFAULT_INDEX.to_string(),
        };

        let signing_service =
            get("SEARCH_SIGNING_SERVICE").unwrap_or_else(|| DEFAULT_SIGNING_SERVICE.to_string());

        let exact_fields = match lookup("SEARCH_EXACT_FIELDS") {
            Some(v) => v
                .split(',')
                .map(str::trim)
                .filter(|f| !f.is_empty())
                .map(str::to_string)
                .collect(),
            None => DEFAULT_EXACT_FIELDS.iter().map(|f| f.to_string()).collect(),
        };

        let pretty = match get("SEARCH_PRETTY") {
            Some(v) => parse_bool("SEARCH_PRETTY", &v)?,
            None => true,
        };

        let timeout = match get("SEARCH_TIMEOUT_SECS") {
            Some(v) => match v.parse::<u64>() {
                Ok(secs) if secs > 0 => Duration::from_secs(secs),
                _ => {
                    return Err(ConfigError::InvalidValue {
                        name: "SEARCH_TIMEOUT_SECS",
                        value: v,
                    });
                }
            },
            None => DEFAULT_TIMEOUT,
        };

        Ok(Self {
            endpoint,
            index,
            signing_service,
            region: get("SEARCH_REGION"),
            exact_fields,
            pretty,
            timeout,
        })
    }

    /// `{endpoint}/{index}/_search?pretty=...`
    pub fn search_url(&self) -> Url {
        let mut url = self.endpoint.clone();
        if let Ok(mut segments) = url.path_segments_mut() {
            segments.pop_if_empty().push(&self.index).push("_search");
        }
        url.set_query(None);
        url.query_pairs_mut()
            .append_pair("pretty", if self.pretty { "true" } else { "false" });
        url
    }
}

fn parse_bool(name: &'static str, value: &str) -> Result<bool, ConfigError> {
    match value.to_ascii_lowercase().as_str() {
        "true" | "1" | "yes" => Ok(true),
        "false" | "0" | "no" => Ok(false),
        _ => Err(ConfigError::InvalidValue {
            name,
            value: value.to_string(),
        }),
    }
}
