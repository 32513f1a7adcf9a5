// Integration tests for hydrating, editing and submitting a route form
#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use route_editor::{
        config::models::{
            Domain, DomainResponse, HttpMethod, KeyValuePredicate, MatchType, PathPredicate, Route,
            RoutePredicates, Service, UpstreamService,
        },
        core::{
            FormField, FormHandle, FormPhase, PredicateKind, RouteForm, RowUid,
            SequentialUidGenerator,
        },
    };

    fn services() -> Vec<Service> {
        vec![Service::named("svc-a"), Service::named("svc-b")]
    }

    fn domains() -> DomainResponse {
        vec![Domain::named("example.com")].into()
    }

    fn user_route() -> Route {
        Route {
            name: "user-default".to_string(),
            domain_list: vec!["example.com".to_string()],
            route_predicates: RoutePredicates {
                path_predicates: PathPredicate {
                    match_type: MatchType::Prefix,
                    path: "/user".to_string(),
                    ignore_case: true,
                },
                method_predicates: vec![HttpMethod::Get, HttpMethod::Post],
                header_predicates: vec![
                    KeyValuePredicate::new("x-env", "gray").with_match_type(MatchType::Equal),
                    KeyValuePredicate::new("x-user", "^u-").with_match_type(MatchType::Regular),
                ],
                query_predicates: vec![KeyValuePredicate::new("debug", "1")],
            },
            services: vec![UpstreamService {
                name: "svc-a".to_string(),
                port: Some(8080),
                weight: Some(100),
            }],
        }
    }

    fn form() -> RouteForm {
        RouteForm::new(Arc::new(SequentialUidGenerator::new()))
    }

    fn row_uids(form: &RouteForm) -> Vec<RowUid> {
        form.state()
            .header_predicates
            .iter()
            .chain(&form.state().query_predicates)
            .map(|r| r.uid.clone())
            .collect()
    }

    #[test]
    fn test_hydrate_twice_differs_only_in_uids() {
        let mut form = form();
        form.hydrate(Some(user_route()), services(), domains());
        let first = form.state().clone();
        let first_uids = row_uids(&form);

        form.set_directories(services(), domains());
        let mut second = form.state().clone();
        for (row, uid) in second
            .header_predicates
            .iter_mut()
            .chain(second.query_predicates.iter_mut())
            .zip(first_uids.iter())
        {
            row.uid = uid.clone();
        }
        assert_eq!(second, first);
        assert!(row_uids(&form).iter().all(|uid| !first_uids.contains(uid)));
        assert_eq!(form.phase(), FormPhase::Hydrated);
    }

    #[test]
    fn test_ignore_case_maps_to_inverted_toggle() {
        let mut form = form();
        form.hydrate(Some(user_route()), services(), domains());
        assert!(form.state().path_predicates.ignore_case.is_empty());

        let mut sensitive = user_route();
        sensitive.route_predicates.path_predicates.ignore_case = false;
        form.set_target(Some(sensitive));
        assert_eq!(form.state().path_predicates.ignore_case, vec!["ignore".to_string()]);

        let route = form.validate_and_extract().unwrap().into_route(form.target());
        assert!(!route.route_predicates.path_predicates.ignore_case);
    }

    #[test]
    fn test_blank_submit_reports_every_required_field() {
        let mut form = form();
        form.hydrate(None, services(), domains());

        let err = form.validate_and_extract().unwrap_err();
        for field in [
            FormField::Name,
            FormField::DomainList,
            FormField::PathType,
            FormField::Path,
            FormField::Services,
        ] {
            assert!(err.contains(field), "missing error for {field}");
        }
        assert_eq!(form.phase(), FormPhase::Blank);
    }

    #[test]
    fn test_route_name_rules() {
        let cases = [
            ("user-default", true),
            ("a", true),
            ("user.v1", true),
            ("User", false),
            ("-user", false),
            ("user-", false),
            ("user_default", false),
        ];

        for (name, valid) in cases {
            let mut form = form();
            form.hydrate(None, services(), domains());
            form.edit(|state| state.name = name.to_string()).unwrap();
            let err = form.validate_and_extract().unwrap_err();
            assert_eq!(!err.contains(FormField::Name), valid, "name {name:?}");
        }

        let mut form = form();
        form.hydrate(None, services(), domains());
        form.edit(|state| state.name = "a".repeat(64)).unwrap();
        assert!(form.validate_and_extract().unwrap_err().contains(FormField::Name));
    }

    #[test]
    fn test_only_first_service_is_hydrated() {
        let mut route = user_route();
        route.services.push(UpstreamService::named("svc-b"));

        let mut form = form();
        form.hydrate(Some(route), services(), domains());
        assert_eq!(form.state().services.as_deref(), Some("svc-a"));

        let submitted = form.validate_and_extract().unwrap().into_route(form.target());
        assert_eq!(submitted.services.len(), 1);
        assert_eq!(submitted.services[0].port, Some(8080));
    }

    #[test]
    fn test_empty_methods_are_accepted() {
        let mut form = form();
        form.hydrate(Some(user_route()), services(), domains());
        form.edit(|state| state.method_predicates.clear()).unwrap();

        let values = form.validate_and_extract().unwrap();
        assert!(values.method_predicates.is_empty());
    }

    #[test]
    fn test_row_identity_survives_remove_and_insert() {
        let mut form = form();
        form.hydrate(Some(user_route()), services(), domains());
        let uids: Vec<_> = form
            .state()
            .header_predicates
            .iter()
            .map(|r| r.uid.clone())
            .collect();
        assert_ne!(uids[0], uids[1]);

        form.remove_predicate(PredicateKind::Header, &uids[0]).unwrap();
        let added = form
            .insert_predicate(PredicateKind::Header, 0, KeyValuePredicate::new("x-new", ""))
            .unwrap();

        let rows = &form.state().header_predicates;
        assert_eq!(rows[0].uid, added);
        assert_eq!(rows[1].uid, uids[1]);
        assert_eq!(rows[1].predicate.key, "x-user");
        assert!(!uids.contains(&added));
        assert_eq!(form.phase(), FormPhase::Dirty);

        form.set_directories(services(), domains());
        assert_eq!(form.state().header_predicates.len(), 2);
        assert!(!row_uids(&form).contains(&uids[0]));
    }

    #[test]
    fn test_submitted_rows_carry_no_uid() {
        let mut form = form();
        form.hydrate(Some(user_route()), services(), domains());

        let route = form.validate_and_extract().unwrap().into_route(form.target());
        assert_eq!(route, user_route());

        let json = serde_json::to_value(&route).unwrap();
        let header = &json["routePredicates"]["headerPredicates"][0];
        assert!(header.get("uid").is_none());
        assert_eq!(header["matchType"], "EQUAL");
    }

    #[test]
    fn test_reset_after_submit_reopens_form() {
        let mut form = form();
        form.hydrate(Some(user_route()), services(), domains());
        form.validate_and_extract().unwrap();
        assert_eq!(form.phase(), FormPhase::Submitted);

        FormHandle::reset(&mut form);
        assert_eq!(form.phase(), FormPhase::Hydrated);
        assert!(form.edit(|state| state.path_predicates.path = "/u".to_string()).is_ok());
    }
}
