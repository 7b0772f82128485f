//! Query bodies sent to the source index.

use serde_json::{json, Value};

use super::filter::Filter;
use super::record::SourceRecord;

/// A match-all query with an optional filter clause.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct SearchQuery {
    pub filter: Option<Filter>,
}

impl SearchQuery {
    /// Select every record.
    pub fn match_all() -> Self {
        Self::default()
    }

    /// Add a filter clause.
    pub fn with_filter(mut self, filter: Filter) -> Self {
        self.filter = Some(filter);
        self
    }

    /// Select every record whose identifier is not in `ids`.
    ///
    /// An empty id list yields a plain match-all query.
    pub fn excluding_ids<I, S>(ids: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let ids: Vec<String> = ids.into_iter().map(Into::into).collect();
        if ids.is_empty() {
            Self::match_all()
        } else {
            Self::match_all().with_filter(Filter::not_in("_id", ids))
        }
    }

    /// The `query` clause of a request body.
    pub fn to_query_clause(&self) -> Value {
        let mut bool_query = json!({ "must": [{ "match_all": {} }] });
        if let Some(filter) = &self.filter {
            bool_query["filter"] = filter.to_query_dsl();
        }
        json!({ "bool": bool_query })
    }

    /// Full request body (`{"query": ...}`).
    pub fn to_body(&self) -> Value {
        json!({ "query": self.to_query_clause() })
    }

    /// Whether a record is selected, for sources that filter locally.
    pub fn matches(&self, record: &SourceRecord) -> bool {
        self.filter.as_ref().map_or(true, |f| f.matches(record))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_match_all_body() {
        assert_eq!(
            SearchQuery::match_all().to_body(),
            json!({"query": {"bool": {"must": [{"match_all": {}}]}}})
        );
    }

    #[test]
    fn test_excluding_ids_body() {
        let body = SearchQuery::excluding_ids(["x", "y"]).to_body();
        assert_eq!(
            body["query"]["bool"]["filter"],
            json!({"bool": {"must_not": [{"terms": {"_id": ["x", "y"]}}]}})
        );
    }

    #[test]
    fn test_excluding_no_ids_is_match_all() {
        let empty: Vec<String> = Vec::new();
        assert_eq!(SearchQuery::excluding_ids(empty), SearchQuery::match_all());
    }

    #[test]
    fn test_local_matching() {
        let query = SearchQuery::excluding_ids(["a"]);
        assert!(!query.matches(&SourceRecord::from_json("a", json!({}))));
        assert!(query.matches(&SourceRecord::from_json("b", json!({}))));
        assert!(SearchQuery::match_all().matches(&SourceRecord::from_json("a", json!({}))));
    }
}
