use super::types::{FieldValue, QueryParams, SearchClause, SearchQuery};

/// Fields matched with `term` instead of `match` unless configured otherwise.
///
/// `sex` is analyzed as free text in the GBIF mapping, so a `match` on "male"
/// also hits "female".
pub const DEFAULT_EXACT_FIELDS: &[&str] = &["sex"];

/// Maps query-string parameters onto an Elasticsearch query document.
#[derive(Debug, Clone)]
pub struct QueryTranslator {
    exact_fields: Vec<String>,
}

impl Default for QueryTranslator {
    fn default() -> Self {
        Self::new(DEFAULT_EXACT_FIELDS.iter().map(|f| f.to_string()))
    }
}

impl QueryTranslator {
    pub fn new(exact_fields: impl IntoIterator<Item = String>) -> Self {
        Self {
            exact_fields: exact_fields.into_iter().collect(),
        }
    }

    /// Builds one clause per parameter, in order, joined under `bool.should`.
    /// An empty parameter set becomes `match_all`.
    pub fn translate(&self, params: &QueryParams) -> SearchQuery {
        if params.is_empty() {
            return SearchQuery::match_all();
        }

        let clauses = params
            .iter()
            .map(|(name, value)| {
                let fv = FieldValue {
                    field: name.to_string(),
                    value: value.clone(),
                };
                if self.is_exact(name) {
                    SearchClause::Term(fv)
                } else {
                    SearchClause::Match(fv)
                }
            })
            .collect();

        SearchQuery::should(clauses)
    }

    fn is_exact(&self, field: &str) -> bool {
        self.exact_fields.iter().any(|f| f == field)
    }
}
