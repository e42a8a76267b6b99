use serde::ser::SerializeMap;
use serde::{Serialize, Serializer};

/// Scalar value of a query-string parameter, kept in the form it was received.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum ParamValue {
    Text(String),
    Number(serde_json::Number),
    Bool(bool),
}

impl From<&str> for ParamValue {
    fn from(s: &str) -> Self {
        ParamValue::Text(s.to_string())
    }
}

impl From<String> for ParamValue {
    fn from(s: String) -> Self {
        ParamValue::Text(s)
    }
}

impl From<i64> for ParamValue {
    fn from(n: i64) -> Self {
        ParamValue::Number(n.into())
    }
}

/// Ordered set of query-string parameters for one invocation.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct QueryParams(Vec<(String, ParamValue)>);

impl QueryParams {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, name: impl Into<String>, value: impl Into<ParamValue>) {
        self.0.push((name.into(), value.into()));
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &ParamValue)> {
        self.0.iter().map(|(name, value)| (name.as_str(), value))
    }
}

impl<K: Into<String>, V: Into<ParamValue>> FromIterator<(K, V)> for QueryParams {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        Self(
            iter.into_iter()
                .map(|(name, value)| (name.into(), value.into()))
                .collect(),
        )
    }
}

/// A single `field: value` constraint, serialized as a one-entry object.
#[derive(Debug, Clone, PartialEq)]
pub struct FieldValue {
    pub field: String,
    pub value: ParamValue,
}

impl Serialize for FieldValue {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(1))?;
        map.serialize_entry(&self.field, &self.value)?;
        map.end()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SearchClause {
    /// Exact match on the raw, unanalyzed value.
    Term(FieldValue),
    /// Analyzed (tokenized, case-folded) match.
    Match(FieldValue),
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BoolQuery {
    pub should: Vec<SearchClause>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MatchAll {}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum QueryKind {
    MatchAll(MatchAll),
    Bool(BoolQuery),
}

/// Request body sent to the `_search` endpoint.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SearchQuery {
    pub query: QueryKind,
}

impl SearchQuery {
    pub fn match_all() -> Self {
        Self {
            query: QueryKind::MatchAll(MatchAll {}),
        }
    }

    pub fn should(clauses: Vec<SearchClause>) -> Self {
        Self {
            query: QueryKind::Bool(BoolQuery { should: clauses }),
        }
    }

    pub fn clauses(&self) -> &[SearchClause] {
        match &self.query {
            QueryKind::MatchAll(_) => &[],
            QueryKind::Bool(b) => &b.should,
        }
    }

    pub fn is_match_all(&self) -> bool {
        matches!(self.query, QueryKind::MatchAll(_))
    }

    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(self)
    }
}
