//! Editable, flattened view of a [`Route`](crate::config::models::Route).
//!
//! Differences from the persisted shape:
//! * `services` is the single selected service name.
//! * `pathPredicates.ignoreCase` is a list toggle: `["ignore"]` means the
//!   path match is case-sensitive, `[]` means case is ignored.
//! * header/query rows carry a [`RowUid`].
use serde::{Deserialize, Serialize};

use crate::{
    config::models::{KeyValuePredicate, MatchType},
    core::identity::RowUid,
};

/// Value the case toggle holds when the path match is case-sensitive.
pub const CASE_SENSITIVE: &str = "ignore";

/// Persisted `ignoreCase` flag to its toggle representation.
pub fn case_toggle(ignore_case: bool) -> Vec<String> {
    if ignore_case {
        Vec::new()
    } else {
        vec![CASE_SENSITIVE.to_string()]
    }
}

/// Toggle representation back to the persisted `ignoreCase` flag.
pub fn ignore_case_from_toggle(toggle: &[String]) -> bool {
    !toggle.iter().any(|v| v == CASE_SENSITIVE)
}

/// Path predicate while it is being edited; `type` may still be unset.
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Eq, Default)]
#[serde(rename_all = "camelCase")]
pub struct PathPredicateForm {
    #[serde(rename = "type", default)]
    pub match_type: Option<MatchType>,
    #[serde(default)]
    pub path: String,
    #[serde(default)]
    pub ignore_case: Vec<String>,
}

/// A header or query predicate row as exchanged with the row editor widget.
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Eq)]
pub struct PredicateRow {
    #[serde(default)]
    pub uid: RowUid,
    #[serde(flatten)]
    pub predicate: KeyValuePredicate,
}

/// Which dynamic predicate list an operation targets.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PredicateKind {
    Header,
    Query,
}

impl PredicateKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            PredicateKind::Header => "headerPredicates",
            PredicateKind::Query => "queryPredicates",
        }
    }
}

/// Flattened, editable route fields.
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Eq, Default)]
#[serde(rename_all = "camelCase")]
pub struct RouteFormState {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub domain_list: Vec<String>,
    #[serde(default)]
    pub path_predicates: PathPredicateForm,
    /// Raw method tokens as selected; checked against the allowed set on submit.
    #[serde(default)]
    pub method_predicates: Vec<String>,
    #[serde(default)]
    pub header_predicates: Vec<PredicateRow>,
    #[serde(default)]
    pub query_predicates: Vec<PredicateRow>,
    #[serde(default)]
    pub services: Option<String>,
}

impl RouteFormState {
    pub fn rows(&self, kind: PredicateKind) -> &[PredicateRow] {
        match kind {
            PredicateKind::Header => &self.header_predicates,
            PredicateKind::Query => &self.query_predicates,
        }
    }

    pub fn rows_mut(&mut self, kind: PredicateKind) -> &mut Vec<PredicateRow> {
        match kind {
            PredicateKind::Header => &mut self.header_predicates,
            PredicateKind::Query => &mut self.query_predicates,
        }
    }

    /// Index of the row carrying `uid` in the given list.
    pub fn position(&self, kind: PredicateKind, uid: &RowUid) -> Option<usize> {
        self.rows(kind).iter().position(|row| &row.uid == uid)
    }
}

/// Lifecycle of the form state within one edit session.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FormPhase {
    /// Nothing hydrated yet.
    Uninitialized,
    /// Create mode defaults.
    Blank,
    /// Populated from an existing route.
    Hydrated,
    /// Edited by the user since the last hydrate/reset.
    Dirty,
    /// Validated and handed off; terminal until reset.
    Submitted,
}

impl std::fmt::Display for FormPhase {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            FormPhase::Uninitialized => write!(f, "uninitialized"),
            FormPhase::Blank => write!(f, "blank"),
            FormPhase::Hydrated => write!(f, "hydrated"),
            FormPhase::Dirty => write!(f, "dirty"),
            FormPhase::Submitted => write!(f, "submitted"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn case_toggle_mapping_is_total() {
        assert_eq!(case_toggle(true), Vec::<String>::new());
        assert_eq!(case_toggle(false), vec!["ignore".to_string()]);
        assert!(ignore_case_from_toggle(&case_toggle(true)));
        assert!(!ignore_case_from_toggle(&case_toggle(false)));
    }

    #[test]
    fn predicate_row_serializes_flat() {
        let row = PredicateRow {
            uid: RowUid::new("7"),
            predicate: KeyValuePredicate::new("x-env", "gray").with_match_type(MatchType::Equal),
        };

        let value = serde_json::to_value(&row).unwrap();
        assert_eq!(value["uid"], "7");
        assert_eq!(value["key"], "x-env");
        assert_eq!(value["matchType"], "EQUAL");

        let back: PredicateRow = serde_json::from_value(value).unwrap();
        assert_eq!(back, row);
        assert!(back.predicate.extra.is_empty());
    }

    #[test]
    fn blank_state_has_no_selection() {
        let state = RouteFormState::default();
        assert!(state.name.is_empty());
        assert!(state.path_predicates.match_type.is_none());
        assert!(state.services.is_none());
        assert!(state.rows(PredicateKind::Query).is_empty());
    }
}
