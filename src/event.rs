use serde_json::{Map, Value};

use crate::query::{ParamValue, QueryParams};

/// Query-string parameters understood by the GBIF occurrence index.
pub const OCCURRENCE_FIELDS: &[&str] = &[
    "key",
    "sex",
    "sciName",
    "kingdom",
    "phylum",
    "class",
    "order",
    "family",
    "genus",
    "species",
    "country",
    "vernacularName",
    "year",
    "rightsHolder",
];

#[derive(Debug, thiserror::Error, PartialEq)]
pub enum EventError {
    #[error("event must be a JSON object, got {0}")]
    NotAnObject(&'static str),

    #[error("event has no query string (expected `params.querystring` or `queryStringParameters`)")]
    MissingQueryString,

    #[error("query string must be an object, got {0}")]
    InvalidQueryString(&'static str),

    #[error("parameter '{name}' must be a scalar, got {kind}")]
    InvalidValue { name: String, kind: &'static str },
}

/// Extracts the query-string parameters from an invocation payload.
///
/// Accepts the API Gateway mapping-template shape (`params.querystring`) and the
/// proxy-integration shape (`queryStringParameters`). A missing, null, or empty
/// query string yields an empty parameter set, as does the string `"{}"` that
/// mapping templates render for a request without parameters.
pub fn parse_query_params(event: &Value) -> Result<QueryParams, EventError> {
    let obj = event
        .as_object()
        .ok_or_else(|| EventError::NotAnObject(kind_of(event)))?;

    let querystring = if let Some(params) = obj.get("params") {
        match params {
            Value::Object(p) => p.get("querystring").unwrap_or(&Value::Null),
            Value::Null => &Value::Null,
            other => return Err(EventError::InvalidQueryString(kind_of(other))),
        }
    } else if let Some(qs) = obj.get("queryStringParameters") {
        qs
    } else {
        return Err(EventError::MissingQueryString);
    };

    match querystring {
        Value::Null => Ok(QueryParams::new()),
        Value::String(s) if matches!(s.trim(), "" | "{}") => Ok(QueryParams::new()),
        Value::Object(map) => params_from_map(map),
        other => Err(EventError::InvalidQueryString(kind_of(other))),
    }
}

fn params_from_map(map: &Map<String, Value>) -> Result<QueryParams, EventError> {
    let mut params = QueryParams::new();
    for (name, value) in map {
        let value = match value {
            Value::String(s) => ParamValue::Text(s.clone()),
            Value::Number(n) => ParamValue::Number(n.clone()),
            Value::Bool(b) => ParamValue::Bool(*b),
            Value::Null => ParamValue::Text(String::new()),
            other => {
                return Err(EventError::InvalidValue {
                    name: name.clone(),
                    kind: kind_of(other),
                });
            }
        };
        params.push(name.as_str(), value);
    }
    Ok(params)
}

/// Names in `params` that are not part of the occurrence vocabulary.
pub fn unknown_fields(params: &QueryParams) -> Vec<&str> {
    params
        .iter()
        .map(|(name, _)| name)
        .filter(|name| !OCCURRENCE_FIELDS.contains(name))
        .collect()
}

fn kind_of(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}
