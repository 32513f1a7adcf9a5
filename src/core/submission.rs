//! Validated form values and their conversion back to a persisted route.
use serde::{Deserialize, Serialize};

use crate::{
    config::models::{HttpMethod, MatchType, PathPredicate, Route, RoutePredicates, UpstreamService},
    core::{
        form_state::{PredicateRow, ignore_case_from_toggle},
        identity::strip_uids,
    },
};

/// Path predicate after validation: the match type is known.
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct PathValues {
    #[serde(rename = "type")]
    pub match_type: MatchType,
    pub path: String,
    pub ignore_case: Vec<String>,
}

/// Form values that passed every submit rule.
///
/// Still in form shape: rows keep their uids and the case flag is still the
/// toggle list. [`FormValues::into_route`] produces the persisted shape.
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct FormValues {
    pub name: String,
    pub domain_list: Vec<String>,
    pub path_predicates: PathValues,
    pub method_predicates: Vec<HttpMethod>,
    pub header_predicates: Vec<PredicateRow>,
    pub query_predicates: Vec<PredicateRow>,
    pub services: String,
}

impl FormValues {
    /// Build the route payload for the persistence layer.
    ///
    /// The form edits a single service, so `services` always comes out with
    /// exactly one entry. When `previous` carries a matching first service its
    /// port/weight are kept; any further entries of `previous` are not.
    pub fn into_route(self, previous: Option<&Route>) -> Route {
        let service = previous
            .and_then(|route| route.services.first())
            .filter(|s| s.name == self.services)
            .cloned()
            .unwrap_or_else(|| UpstreamService::named(&self.services));

        Route {
            name: self.name,
            domain_list: self.domain_list,
            route_predicates: RoutePredicates {
                path_predicates: PathPredicate {
                    match_type: self.path_predicates.match_type,
                    path: self.path_predicates.path,
                    ignore_case: ignore_case_from_toggle(&self.path_predicates.ignore_case),
                },
                method_predicates: self.method_predicates,
                header_predicates: strip_uids(&self.header_predicates),
                query_predicates: strip_uids(&self.query_predicates),
            },
            services: vec![service],
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{config::models::KeyValuePredicate, core::identity::RowUid};

    fn values() -> FormValues {
        FormValues {
            name: "user-default".to_string(),
            domain_list: vec!["example.com".to_string()],
            path_predicates: PathValues {
                match_type: MatchType::Regular,
                path: "^/user/.*".to_string(),
                ignore_case: vec!["ignore".to_string()],
            },
            method_predicates: vec![HttpMethod::Get],
            header_predicates: vec![PredicateRow {
                uid: RowUid::new("4"),
                predicate: KeyValuePredicate::new("x-env", "gray"),
            }],
            query_predicates: vec![],
            services: "svc-a".to_string(),
        }
    }

    #[test]
    fn into_route_inverts_toggle_and_strips_uids() {
        let route = values().into_route(None);

        assert!(!route.route_predicates.path_predicates.ignore_case);
        assert_eq!(
            route.route_predicates.header_predicates,
            vec![KeyValuePredicate::new("x-env", "gray")]
        );
        let json = serde_json::to_value(&route).unwrap();
        assert!(json["routePredicates"]["headerPredicates"][0].get("uid").is_none());
        assert_eq!(json["routePredicates"]["pathPredicates"]["type"], "ERGULAR");
        assert_eq!(route.services, vec![UpstreamService::named("svc-a")]);
    }

    #[test]
    fn into_route_keeps_first_service_details_when_unchanged() {
        let mut previous = values().into_route(None);
        previous.services = vec![
            UpstreamService {
                name: "svc-a".to_string(),
                port: Some(8080),
                weight: Some(100),
            },
            UpstreamService::named("svc-b"),
        ];

        let route = values().into_route(Some(&previous));
        assert_eq!(route.services.len(), 1);
        assert_eq!(route.services[0].port, Some(8080));
    }
}
