//! Route ⇄ form state transformer.
//!
//! [`RouteForm`] owns one edit session: the form state, the option collections
//! built from the directories, and the uid generator for predicate rows.
//! Hydration is re-run from scratch whenever the edit target or either
//! directory result changes; with the same three inputs it yields the same
//! form state up to row uids, which are minted fresh on every run.
use std::{
    collections::{HashMap, HashSet},
    sync::Arc,
};

use thiserror::Error;

use crate::{
    config::models::{
        DomainResponse, HttpMethod, KeyValuePredicate, MatchType, OptionItem, Route, Service,
    },
    core::{
        form_state::{
            FormPhase, PathPredicateForm, PredicateKind, PredicateRow, RouteFormState, case_toggle,
        },
        identity::{RowUid, UidGenerator, attach_uids, mint_row},
        submission::FormValues,
        validation::{RouteFormValidator, ValidationContext, ValidationResult},
    },
};

/// Errors raised by edit operations on a [`RouteForm`].
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum SessionError {
    /// Edits before the first hydrate
    #[error("Form has not been hydrated yet")]
    NotHydrated,

    /// Edits after a successful submit
    #[error("Form was already submitted; reset it before editing")]
    AlreadySubmitted,

    /// The name of an existing route is its identity key
    #[error("Route name '{0}' cannot be changed after creation")]
    NameImmutable(String),

    #[error("No row with uid '{uid}' in {kind}")]
    UnknownRow { kind: &'static str, uid: RowUid },
}

/// Result type for edit operations
pub type SessionResult<T> = Result<T, SessionError>;

/// The two commands an embedding host drives the form with.
pub trait FormHandle {
    /// Discard all edits and re-apply the hydrated (or blank) state.
    fn reset(&mut self);

    /// Run every submit rule; return the validated values or all failures.
    fn validate_and_extract(&mut self) -> ValidationResult<FormValues>;
}

/// One route edit session.
#[derive(Debug)]
pub struct RouteForm {
    uids: Arc<dyn UidGenerator>,
    state: RouteFormState,
    phase: FormPhase,
    target: Option<Route>,
    services: Vec<Service>,
    domains: DomainResponse,
    service_options: Vec<OptionItem>,
    domain_options: Vec<OptionItem>,
    services_by_name: HashMap<String, Service>,
}

impl RouteForm {
    pub fn new(uids: Arc<dyn UidGenerator>) -> Self {
        Self {
            uids,
            state: RouteFormState::default(),
            phase: FormPhase::Uninitialized,
            target: None,
            services: Vec::new(),
            domains: DomainResponse::default(),
            service_options: Vec::new(),
            domain_options: Vec::new(),
            services_by_name: HashMap::new(),
        }
    }

    /// Replace all three hydrate inputs and re-run the hydrate sequence.
    pub fn hydrate(&mut self, target: Option<Route>, services: Vec<Service>, domains: DomainResponse) {
        self.target = target;
        self.services = services;
        self.domains = domains;
        self.apply_hydrate();
    }

    /// Switch the edit target (`None` for create mode).
    pub fn set_target(&mut self, target: Option<Route>) {
        self.target = target;
        self.apply_hydrate();
    }

    /// New results from both directories, applied with a single hydrate.
    pub fn set_directories(&mut self, services: Vec<Service>, domains: DomainResponse) {
        self.services = services;
        self.domains = domains;
        self.apply_hydrate();
    }

    /// New service directory result.
    pub fn set_services(&mut self, services: Vec<Service>) {
        self.services = services;
        self.apply_hydrate();
    }

    /// New domain directory result.
    pub fn set_domains(&mut self, domains: DomainResponse) {
        self.domains = domains;
        self.apply_hydrate();
    }

    fn apply_hydrate(&mut self) {
        self.state = RouteFormState::default();

        self.service_options.clear();
        self.services_by_name.clear();
        for service in &self.services {
            self.service_options
                .push(OptionItem::new(&service.name, &service.name));
            self.services_by_name
                .insert(service.name.clone(), service.clone());
        }

        self.domain_options = self
            .domains
            .list
            .iter()
            .map(|domain| OptionItem::new(&domain.name, &domain.name))
            .collect();

        match self.target.clone() {
            Some(route) => {
                self.state = self.form_from_route(route);
                self.phase = FormPhase::Hydrated;
            }
            None => self.phase = FormPhase::Blank,
        }

        tracing::debug!(
            route = self.target.as_ref().map(|r| r.name.as_str()).unwrap_or(""),
            phase = %self.phase,
            services = self.service_options.len(),
            domains = self.domain_options.len(),
            "Route form hydrated"
        );
    }

    fn form_from_route(&self, route: Route) -> RouteFormState {
        let Route {
            name,
            domain_list,
            route_predicates,
            services,
        } = route;
        let path = route_predicates.path_predicates;

        if services.len() > 1 {
            tracing::warn!(
                route = %name,
                dropped = services.len() - 1,
                "Only the first target service is editable; the others are not carried by the form"
            );
        }
        let selected = services.into_iter().next().map(|s| s.name);

        // Header and query rows are numbered independently, in that order
        let header_predicates =
            attach_uids(route_predicates.header_predicates, self.uids.as_ref());
        let query_predicates = attach_uids(route_predicates.query_predicates, self.uids.as_ref());

        RouteFormState {
            name,
            domain_list,
            path_predicates: PathPredicateForm {
                match_type: Some(path.match_type),
                path: path.path,
                ignore_case: case_toggle(path.ignore_case),
            },
            method_predicates: route_predicates
                .method_predicates
                .iter()
                .map(|m| m.as_str().to_string())
                .collect(),
            header_predicates,
            query_predicates,
            services: selected,
        }
    }

    pub fn state(&self) -> &RouteFormState {
        &self.state
    }

    pub fn phase(&self) -> FormPhase {
        self.phase
    }

    pub fn target(&self) -> Option<&Route> {
        self.target.as_ref()
    }

    /// The name field is only editable when creating a route.
    pub fn name_editable(&self) -> bool {
        self.target.is_none()
    }

    pub fn service_options(&self) -> &[OptionItem] {
        &self.service_options
    }

    pub fn domain_options(&self) -> &[OptionItem] {
        &self.domain_options
    }

    /// Raw directory entry for a service option, for showing its metadata.
    pub fn service(&self, name: &str) -> Option<&Service> {
        self.services_by_name.get(name)
    }

    pub fn method_options(&self) -> Vec<OptionItem> {
        HttpMethod::options()
    }

    pub fn match_type_options(&self) -> Vec<OptionItem> {
        MatchType::ALL
            .iter()
            .map(|t| OptionItem::new(t.label(), t.as_str()))
            .collect()
    }

    /// Generator the row editor must use to mint uids for rows it creates.
    pub fn uid_generator(&self) -> Arc<dyn UidGenerator> {
        self.uids.clone()
    }

    fn ensure_editable(&self) -> SessionResult<()> {
        match self.phase {
            FormPhase::Uninitialized => Err(SessionError::NotHydrated),
            FormPhase::Submitted => Err(SessionError::AlreadySubmitted),
            _ => Ok(()),
        }
    }

    /// Apply a user edit. The edit is rolled back if it renames an existing route.
    pub fn edit<F>(&mut self, f: F) -> SessionResult<()>
    where
        F: FnOnce(&mut RouteFormState),
    {
        self.ensure_editable()?;

        let mut next = self.state.clone();
        f(&mut next);

        if let Some(route) = &self.target {
            if next.name != route.name {
                return Err(SessionError::NameImmutable(route.name.clone()));
            }
        }

        for kind in [PredicateKind::Header, PredicateKind::Query] {
            let rows = std::mem::take(next.rows_mut(kind));
            *next.rows_mut(kind) = self.assign_missing_uids(kind, rows);
        }

        if next != self.state {
            self.state = next;
            self.phase = FormPhase::Dirty;
        }
        Ok(())
    }

    /// Append a row with a freshly minted uid.
    pub fn add_predicate(
        &mut self,
        kind: PredicateKind,
        predicate: KeyValuePredicate,
    ) -> SessionResult<RowUid> {
        let len = self.state.rows(kind).len();
        self.insert_predicate(kind, len, predicate)
    }

    /// Insert a row at `index` (clamped to the list length).
    pub fn insert_predicate(
        &mut self,
        kind: PredicateKind,
        index: usize,
        predicate: KeyValuePredicate,
    ) -> SessionResult<RowUid> {
        self.ensure_editable()?;

        let row = mint_row(predicate, self.uids.as_ref());
        let uid = row.uid.clone();
        let rows = self.state.rows_mut(kind);
        let index = index.min(rows.len());
        rows.insert(index, row);
        self.phase = FormPhase::Dirty;
        Ok(uid)
    }

    /// Remove the row carrying `uid`; other rows keep their uids.
    pub fn remove_predicate(&mut self, kind: PredicateKind, uid: &RowUid) -> SessionResult<PredicateRow> {
        self.ensure_editable()?;

        let index = self.find_row(kind, uid)?;
        let removed = self.state.rows_mut(kind).remove(index);
        self.phase = FormPhase::Dirty;
        Ok(removed)
    }

    /// Move the row carrying `uid` to position `to` (clamped).
    pub fn move_predicate(&mut self, kind: PredicateKind, uid: &RowUid, to: usize) -> SessionResult<()> {
        self.ensure_editable()?;

        let from = self.find_row(kind, uid)?;
        let rows = self.state.rows_mut(kind);
        let row = rows.remove(from);
        let to = to.min(rows.len());
        rows.insert(to, row);
        if from != to {
            self.phase = FormPhase::Dirty;
        }
        Ok(())
    }

    /// Replace the content of one row, keeping its uid.
    pub fn update_predicate(
        &mut self,
        kind: PredicateKind,
        uid: &RowUid,
        predicate: KeyValuePredicate,
    ) -> SessionResult<()> {
        self.ensure_editable()?;

        let index = self.find_row(kind, uid)?;
        let row = &mut self.state.rows_mut(kind)[index];
        if row.predicate != predicate {
            row.predicate = predicate;
            self.phase = FormPhase::Dirty;
        }
        Ok(())
    }

    /// Accept the full row list back from the row editor widget.
    ///
    /// Rows without a uid, or repeating one already seen in the list, are given
    /// a freshly minted uid.
    pub fn replace_predicates(&mut self, kind: PredicateKind, rows: Vec<PredicateRow>) -> SessionResult<()> {
        self.ensure_editable()?;

        let accepted = self.assign_missing_uids(kind, rows);
        if accepted.as_slice() != self.state.rows(kind) {
            *self.state.rows_mut(kind) = accepted;
            self.phase = FormPhase::Dirty;
        }
        Ok(())
    }

    /// Mint a uid for every row that has none or repeats an earlier one.
    fn assign_missing_uids(&self, kind: PredicateKind, rows: Vec<PredicateRow>) -> Vec<PredicateRow> {
        let mut seen = HashSet::new();
        rows.into_iter()
            .map(|mut row| {
                if row.uid.is_empty() || seen.contains(&row.uid) {
                    if !row.uid.is_empty() {
                        tracing::warn!(list = kind.as_str(), uid = %row.uid, "Duplicate row uid; minting a new one");
                    }
                    row.uid = self.uids.next_uid();
                }
                seen.insert(row.uid.clone());
                row
            })
            .collect()
    }

    fn find_row(&self, kind: PredicateKind, uid: &RowUid) -> SessionResult<usize> {
        self.state
            .position(kind, uid)
            .ok_or_else(|| SessionError::UnknownRow {
                kind: kind.as_str(),
                uid: uid.clone(),
            })
    }

    /// Discard all edits and hydrate again, with fresh row uids.
    pub fn reset(&mut self) {
        self.apply_hydrate();
    }

    /// Validate the current state against the option collections.
    pub fn validate_and_extract(&mut self) -> ValidationResult<FormValues> {
        let result = RouteFormValidator::validate(
            &self.state,
            ValidationContext {
                service_options: &self.service_options,
                domain_options: &self.domain_options,
            },
        );

        match &result {
            Ok(values) => {
                tracing::info!(route = %values.name, "Route form validated");
                self.phase = FormPhase::Submitted;
            }
            Err(e) => {
                tracing::debug!(errors = e.errors().len(), "Route form rejected");
            }
        }
        result
    }
}

impl FormHandle for RouteForm {
    fn reset(&mut self) {
        RouteForm::reset(self)
    }

    fn validate_and_extract(&mut self) -> ValidationResult<FormValues> {
        RouteForm::validate_and_extract(self)
    }
}
