//! Translation of query-string parameters into Elasticsearch query documents.

mod translator;
pub mod types;

pub use translator::{DEFAULT_EXACT_FIELDS, QueryTranslator};
pub use types::{ParamValue, QueryParams, SearchQuery};
