//! Property-based tests for id exclusion filters

use std::collections::BTreeSet;

use proptest::prelude::*;
use serde_json::{json, Value};

use crate::core::source::filter::MAX_TERMS_PER_CLAUSE;
use crate::core::source::{Filter, SearchQuery, SourceRecord};

fn arb_ids() -> impl Strategy<Value = BTreeSet<String>> {
    proptest::collection::btree_set("[a-z0-9]{1,6}", 0..40)
}

proptest! {
    /// Property: A record is selected iff its id is not excluded
    #[test]
    fn prop_exclusion_matches_id_set(excluded in arb_ids(), probe in "[a-z0-9]{1,6}") {
        let query = SearchQuery::excluding_ids(excluded.iter().cloned());
        let record = SourceRecord::from_json(probe.clone(), json!({}));
        prop_assert_eq!(query.matches(&record), !excluded.contains(&probe));
    }

    /// Property: The `$nin` mapping parses to the constructed filter
    #[test]
    fn prop_parsed_nin_equals_constructed(excluded in arb_ids()) {
        let ids: Vec<String> = excluded.into_iter().collect();
        let parsed = Filter::parse(&json!({"_id": {"$nin": ids.clone()}})).unwrap();
        prop_assert_eq!(parsed, Filter::not_in("_id", ids));
    }
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(16))]

    /// Property: `terms` clauses stay under the per-clause limit and keep every id
    #[test]
    fn prop_terms_chunks_bounded(count in 0usize..(2 * MAX_TERMS_PER_CLAUSE + 2)) {
        let ids: Vec<Value> = (0..count).map(|i| Value::from(i.to_string())).collect();
        let dsl = Filter::not_in("_id", ids).to_query_dsl();

        let clauses = dsl["bool"]["must_not"].as_array().cloned().unwrap_or_default();
        let mut total = 0;
        for clause in &clauses {
            let terms = clause["terms"]["_id"].as_array().unwrap();
            prop_assert!(terms.len() <= MAX_TERMS_PER_CLAUSE);
            total += terms.len();
        }
        prop_assert_eq!(total, count);
    }
}
