//! Submission-time field rules for the route form.
//!
//! Every rule runs on every submit; failures are collected so the host can
//! mark all offending fields at once.
use std::{collections::HashSet, fmt};

use once_cell::sync::Lazy;
use regex::Regex;

use crate::{
    config::models::{HttpMethod, MatchType, OptionItem},
    core::{
        form_state::{PredicateKind, PredicateRow, RouteFormState},
        submission::{FormValues, PathValues},
    },
};

/// Longest accepted route name.
pub const MAX_NAME_LEN: usize = 63;

static ROUTE_NAME: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[a-z0-9]([a-z0-9\-.]*[a-z0-9])?$").expect("invalid route name regex"));

const NAME_HINT: &str = "Use lowercase letters, digits and the special characters '-' and '.', \
                         without a special character at the start or end";

/// Form field a validation message is attached to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FormField {
    Name,
    DomainList,
    PathType,
    Path,
    MethodPredicates,
    HeaderPredicates,
    QueryPredicates,
    Services,
}

impl FormField {
    /// Dotted field path as the host form addresses it.
    pub fn as_str(&self) -> &'static str {
        match self {
            FormField::Name => "name",
            FormField::DomainList => "domainList",
            FormField::PathType => "pathPredicates.type",
            FormField::Path => "pathPredicates.path",
            FormField::MethodPredicates => "methodPredicates",
            FormField::HeaderPredicates => "headerPredicates",
            FormField::QueryPredicates => "queryPredicates",
            FormField::Services => "services",
        }
    }
}

impl From<PredicateKind> for FormField {
    fn from(kind: PredicateKind) -> Self {
        match kind {
            PredicateKind::Header => FormField::HeaderPredicates,
            PredicateKind::Query => FormField::QueryPredicates,
        }
    }
}

impl fmt::Display for FormField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A single failing field.
#[derive(Debug, thiserror::Error, Clone, PartialEq, Eq)]
pub enum FieldError {
    #[error("Missing required field '{field}': {message}")]
    Missing { field: FormField, message: String },

    #[error("Invalid field '{field}': {message}")]
    Invalid { field: FormField, message: String },
}

impl FieldError {
    fn missing(field: FormField, message: impl Into<String>) -> Self {
        FieldError::Missing {
            field,
            message: message.into(),
        }
    }

    fn invalid(field: FormField, message: impl Into<String>) -> Self {
        FieldError::Invalid {
            field,
            message: message.into(),
        }
    }

    pub fn field(&self) -> FormField {
        match self {
            FieldError::Missing { field, .. } | FieldError::Invalid { field, .. } => *field,
        }
    }

    pub fn message(&self) -> &str {
        match self {
            FieldError::Missing { message, .. } | FieldError::Invalid { message, .. } => message,
        }
    }
}

/// Every field that failed on a submit attempt.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidationError {
    errors: Vec<FieldError>,
}

impl fmt::Display for ValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&format_multiple_errors(&self.errors))
    }
}

impl std::error::Error for ValidationError {}

impl ValidationError {
    pub fn errors(&self) -> &[FieldError] {
        &self.errors
    }

    pub fn into_errors(self) -> Vec<FieldError> {
        self.errors
    }

    /// Distinct failing fields, in the order they were first reported.
    pub fn fields(&self) -> Vec<FormField> {
        let mut seen = HashSet::new();
        self.errors
            .iter()
            .map(FieldError::field)
            .filter(|f| seen.insert(*f))
            .collect()
    }

    pub fn contains(&self, field: FormField) -> bool {
        self.errors.iter().any(|e| e.field() == field)
    }
}

/// Validation result type alias
pub type ValidationResult<T> = Result<T, ValidationError>;

fn format_multiple_errors(errors: &[FieldError]) -> String {
    if errors.is_empty() {
        return "No errors".to_string();
    }

    if errors.len() == 1 {
        return errors[0].to_string();
    }

    let mut message = format!("Found {} validation errors:\n", errors.len());
    for (i, error) in errors.iter().enumerate() {
        message.push_str(&format!("  {}. {}\n", i + 1, error));
    }
    message
}

/// Option collections the submit-time rules check membership against.
#[derive(Debug, Clone, Copy)]
pub struct ValidationContext<'a> {
    pub service_options: &'a [OptionItem],
    pub domain_options: &'a [OptionItem],
}

/// Route form validator
pub struct RouteFormValidator;

impl RouteFormValidator {
    /// Validate the whole form, returning the typed submission values.
    pub fn validate(
        state: &RouteFormState,
        ctx: ValidationContext<'_>,
    ) -> ValidationResult<FormValues> {
        let mut errors = Vec::new();

        if let Err(e) = Self::validate_name(&state.name) {
            errors.push(e);
        }

        let domain_list = match Self::validate_domains(&state.domain_list, ctx.domain_options) {
            Ok(domains) => domains,
            Err(e) => {
                errors.push(e);
                Vec::new()
            }
        };

        let path = match Self::validate_path(state) {
            Ok(path) => Some(path),
            Err(mut path_errors) => {
                errors.append(&mut path_errors);
                None
            }
        };

        let methods = match Self::validate_methods(&state.method_predicates) {
            Ok(methods) => methods,
            Err(mut method_errors) => {
                errors.append(&mut method_errors);
                Vec::new()
            }
        };

        for kind in [PredicateKind::Header, PredicateKind::Query] {
            if let Err(mut row_errors) = Self::validate_rows(kind, state.rows(kind)) {
                errors.append(&mut row_errors);
            }
        }

        let service = match Self::validate_service(state.services.as_deref(), ctx.service_options)
        {
            Ok(service) => Some(service),
            Err(e) => {
                errors.push(e);
                None
            }
        };

        match (path, service) {
            (Some(path), Some(service)) if errors.is_empty() => Ok(FormValues {
                name: state.name.clone(),
                domain_list,
                path_predicates: path,
                method_predicates: methods,
                header_predicates: state.header_predicates.clone(),
                query_predicates: state.query_predicates.clone(),
                services: service,
            }),
            _ => Err(ValidationError { errors }),
        }
    }

    /// Check a route name against the naming rule.
    pub fn validate_name(name: &str) -> Result<(), FieldError> {
        if name.is_empty() {
            return Err(FieldError::missing(FormField::Name, NAME_HINT));
        }

        if name.len() > MAX_NAME_LEN {
            return Err(FieldError::invalid(
                FormField::Name,
                format!("Route name must be at most {MAX_NAME_LEN} characters"),
            ));
        }

        if !ROUTE_NAME.is_match(name) {
            return Err(FieldError::invalid(FormField::Name, NAME_HINT));
        }

        Ok(())
    }

    fn validate_domains(
        domains: &[String],
        options: &[OptionItem],
    ) -> Result<Vec<String>, FieldError> {
        if domains.is_empty() {
            return Err(FieldError::missing(
                FormField::DomainList,
                "Please select a domain",
            ));
        }

        let mut seen = HashSet::new();
        let unique: Vec<String> = domains
            .iter()
            .filter(|d| seen.insert(d.as_str()))
            .cloned()
            .collect();

        // Membership is advisory: the directory may simply be stale.
        for domain in &unique {
            if !options.iter().any(|o| &o.value == domain) {
                tracing::warn!(domain = %domain, "Selected domain is not in the domain directory");
            }
        }

        Ok(unique)
    }

    fn validate_path(state: &RouteFormState) -> Result<PathValues, Vec<FieldError>> {
        let mut errors = Vec::new();
        let form = &state.path_predicates;

        if form.match_type.is_none() {
            errors.push(FieldError::missing(
                FormField::PathType,
                "Please select a path match rule",
            ));
        }

        if form.path.is_empty() {
            errors.push(FieldError::missing(
                FormField::Path,
                "Please enter a path match value",
            ));
        }

        match form.match_type {
            Some(match_type) if errors.is_empty() => Ok(PathValues {
                match_type,
                path: form.path.clone(),
                ignore_case: form.ignore_case.clone(),
            }),
            _ => Err(errors),
        }
    }

    fn validate_methods(tokens: &[String]) -> Result<Vec<HttpMethod>, Vec<FieldError>> {
        let mut errors = Vec::new();
        let mut methods = Vec::new();

        for token in tokens {
            match token.parse::<HttpMethod>() {
                Ok(method) => {
                    if !methods.contains(&method) {
                        methods.push(method);
                    }
                }
                Err(message) => errors.push(FieldError::invalid(FormField::MethodPredicates, message)),
            }
        }

        if errors.is_empty() {
            Ok(methods)
        } else {
            Err(errors)
        }
    }

    fn validate_rows(kind: PredicateKind, rows: &[PredicateRow]) -> Result<(), Vec<FieldError>> {
        let mut errors = Vec::new();
        let mut uids = HashSet::new();
        let field = FormField::from(kind);

        for (i, row) in rows.iter().enumerate() {
            let n = i + 1;

            if row.uid.is_empty() {
                errors.push(FieldError::invalid(field, format!("Row {n} has no identity")));
            } else if !uids.insert(&row.uid) {
                errors.push(FieldError::invalid(
                    field,
                    format!("Row {n} reuses identity '{}'", row.uid),
                ));
            }

            if row.predicate.key.trim().is_empty() {
                errors.push(FieldError::invalid(field, format!("Row {n}: key is required")));
            }

            // An empty prefix or pattern would match everything.
            if row.predicate.value.is_empty() {
                if let Some(match_type @ (MatchType::Prefix | MatchType::Regular)) =
                    row.predicate.match_type
                {
                    errors.push(FieldError::invalid(
                        field,
                        format!("Row {n}: value is required for {} matching", match_type.label()),
                    ));
                }
            }
        }

        if errors.is_empty() {
            Ok(())
        } else {
            Err(errors)
        }
    }

    fn validate_service(
        selected: Option<&str>,
        options: &[OptionItem],
    ) -> Result<String, FieldError> {
        let Some(name) = selected.filter(|s| !s.is_empty()) else {
            return Err(FieldError::missing(
                FormField::Services,
                "Please select a target service",
            ));
        };

        if !options.iter().any(|o| o.value == name) {
            return Err(FieldError::invalid(
                FormField::Services,
                format!("Unknown service '{name}'"),
            ));
        }

        Ok(name.to_string())
    }
}
