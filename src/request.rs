//! Canonical search request construction.
//!
//! Pure projection of [`SearchState`]: same state always yields a
//! structurally identical payload. Filters that carry no constraint are
//! dropped here, not at the call sites.

use std::collections::BTreeMap;

use serde::Serialize;

use crate::model::{FilterValue, SearchState};

/// Body of `POST /api/search`.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RequestPayload {
    pub query: String,
    pub collection_type: String,
    pub schema_type: String,
    pub page: u32,
    pub per_page: u32,
    pub filters: BTreeMap<String, FilterValue>,
}

/// Build the canonical request for the current state.
pub fn build_search_request(state: &SearchState, per_page: u32) -> RequestPayload {
    RequestPayload {
        query: state.query_text(),
        collection_type: state.category().as_str().to_string(),
        schema_type: state.category().schema_type().to_string(),
        page: state.page(),
        per_page,
        filters: pruned_filters(state.filters()),
    }
}

/// Drop empty filter values; inside a range, min and max are each
/// independently droppable.
fn pruned_filters(filters: &BTreeMap<String, FilterValue>) -> BTreeMap<String, FilterValue> {
    filters
        .iter()
        .filter(|(_, value)| !value.is_empty())
        .map(|(key, value)| {
            let value = match value {
                FilterValue::Range { min, max } => FilterValue::Range {
                    min: min.clone().filter(|s| !s.is_empty()),
                    max: max.clone().filter(|s| !s.is_empty()),
                },
                FilterValue::Many(items) => {
                    FilterValue::Many(items.iter().filter(|s| !s.is_empty()).cloned().collect())
                }
                other => other.clone(),
            };
            (key.clone(), value)
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{Category, SearchState};

    #[test]
    fn empty_terms_yield_empty_query() {
        let state = SearchState::default();
        let payload = build_search_request(&state, 10);
        assert_eq!(payload.query, "");
    }

    #[test]
    fn single_term_clinical_study_payload() {
        let mut state = SearchState::new(Category::ClinicalStudy);
        state.add_term("cancer");
        let payload = build_search_request(&state, 10);

        assert_eq!(payload.query, "cancer");
        assert_eq!(payload.collection_type, "clinical_study");
        assert_eq!(payload.schema_type, "clinical_study_custom");
        assert_eq!(payload.page, 1);
        assert_eq!(payload.per_page, 10);
        assert!(payload.filters.is_empty());
    }

    #[test]
    fn terms_join_with_or() {
        let mut state = SearchState::default();
        state.add_term("cancer");
        state.add_term("melanoma");
        let payload = build_search_request(&state, 10);
        assert_eq!(payload.query, "cancer OR melanoma");
    }

    #[test]
    fn empty_filters_are_dropped() {
        let mut state = SearchState::default();
        state.set_filter("phase", FilterValue::Text(String::new()));
        state.set_filter("status", FilterValue::Many(vec![]));
        state.set_filter("drug", FilterValue::Text("aspirin".into()));
        let payload = build_search_request(&state, 10);

        assert!(!payload.filters.contains_key("phase"));
        assert!(!payload.filters.contains_key("status"));
        assert_eq!(
            payload.filters.get("drug"),
            Some(&FilterValue::Text("aspirin".into()))
        );
    }

    #[test]
    fn range_bounds_are_independently_droppable() {
        let mut state = SearchState::default();
        state.set_filter(
            "duration",
            FilterValue::Range {
                min: Some(String::new()),
                max: Some("90".into()),
            },
        );
        let payload = build_search_request(&state, 10);
        assert_eq!(
            payload.filters.get("duration"),
            Some(&FilterValue::Range {
                min: None,
                max: Some("90".into()),
            })
        );

        state.set_filter(
            "duration",
            FilterValue::Range {
                min: Some(String::new()),
                max: None,
            },
        );
        let payload = build_search_request(&state, 10);
        assert!(!payload.filters.contains_key("duration"));
    }

    #[test]
    fn payload_is_deterministic() {
        let mut state = SearchState::default();
        state.add_term("cancer");
        state.set_filter("status", FilterValue::Many(vec!["active".into()]));
        let a = build_search_request(&state, 10);
        let b = build_search_request(&state, 10);
        assert_eq!(a, b);
        assert_eq!(
            serde_json::to_string(&a).unwrap(),
            serde_json::to_string(&b).unwrap()
        );
    }
}
