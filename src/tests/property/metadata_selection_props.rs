//! Property-based tests for metadata field selection

use std::collections::BTreeSet;

use proptest::prelude::*;
use serde_json::{Map, Value};

use crate::core::converter::MetadataSelection;

fn arb_fields() -> impl Strategy<Value = Map<String, Value>> {
    proptest::collection::btree_map("[a-e]{1,2}", any::<i64>(), 0..10).prop_map(|m| {
        m.into_iter()
            .map(|(k, v)| (k, Value::from(v)))
            .collect::<Map<String, Value>>()
    })
}

fn arb_names() -> impl Strategy<Value = Vec<String>> {
    proptest::collection::vec("[a-e]{1,2}", 0..6)
}

proptest! {
    /// Property: Include only ever yields listed fields, with their original values
    #[test]
    fn prop_include_is_subset(fields in arb_fields(), names in arb_names()) {
        let selected = MetadataSelection::Include(names.clone()).select(fields.clone());
        for (key, value) in &selected {
            prop_assert!(names.contains(key));
            prop_assert_eq!(Some(value), fields.get(key));
        }
        for name in &names {
            prop_assert_eq!(selected.contains_key(name), fields.contains_key(name));
        }
    }

    /// Property: Exclude removes exactly the listed fields
    #[test]
    fn prop_exclude_removes_listed(fields in arb_fields(), names in arb_names()) {
        let selected = MetadataSelection::Exclude(names.clone()).select(fields.clone());
        for name in &names {
            prop_assert!(!selected.contains_key(name));
        }
        for (key, value) in &fields {
            if !names.contains(key) {
                prop_assert_eq!(selected.get(key), Some(value));
            }
        }
    }

    /// Property: Include and exclude over the same list partition the fields
    #[test]
    fn prop_include_exclude_partition(fields in arb_fields(), names in arb_names()) {
        let included = MetadataSelection::Include(names.clone()).select(fields.clone());
        let excluded = MetadataSelection::Exclude(names).select(fields.clone());

        let inc: BTreeSet<_> = included.keys().cloned().collect();
        let exc: BTreeSet<_> = excluded.keys().cloned().collect();
        let all: BTreeSet<_> = fields.keys().cloned().collect();

        prop_assert!(inc.is_disjoint(&exc));
        prop_assert_eq!(inc.union(&exc).cloned().collect::<BTreeSet<_>>(), all);
    }

    /// Property: Supplying both lists is always rejected
    #[test]
    fn prop_both_lists_rejected(include in arb_names(), exclude in arb_names()) {
        prop_assert!(MetadataSelection::from_lists(Some(include), Some(exclude)).is_err());
    }
}
