//! Route record and editor configuration data structures.
//!
//! The route types mirror the JSON shape owned by the gateway's persistence
//! layer (camelCase keys). They are serde-friendly and tolerant of fields the
//! editor does not understand: extra keys on predicate rows, services and
//! domains are carried through untouched.
use std::{collections::BTreeMap, fmt, str::FromStr};

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Matching strategy for the path predicate and for header/query rows.
///
/// The wire tokens are the ones the persistence layer stores, including the
/// historical `ERGULAR` spelling for regular-expression matching. The readable
/// `PREFIX` / `REGEX` spellings are accepted on input.
#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MatchType {
    #[serde(rename = "PRE", alias = "PREFIX")]
    Prefix,
    #[serde(rename = "EQUAL")]
    Equal,
    #[serde(rename = "ERGULAR", alias = "REGEX")]
    Regular,
}

impl MatchType {
    pub const ALL: [MatchType; 3] = [MatchType::Prefix, MatchType::Equal, MatchType::Regular];

    /// Token written to the persisted record.
    pub fn as_str(&self) -> &'static str {
        match self {
            MatchType::Prefix => "PRE",
            MatchType::Equal => "EQUAL",
            MatchType::Regular => "ERGULAR",
        }
    }

    /// Human readable label used by selection controls.
    pub fn label(&self) -> &'static str {
        match self {
            MatchType::Prefix => "Prefix match",
            MatchType::Equal => "Exact match",
            MatchType::Regular => "Regex match",
        }
    }
}

impl fmt::Display for MatchType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for MatchType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "PRE" | "PREFIX" => Ok(MatchType::Prefix),
            "EQUAL" => Ok(MatchType::Equal),
            "ERGULAR" | "REGEX" => Ok(MatchType::Regular),
            other => Err(format!("unknown match type '{other}'")),
        }
    }
}

/// HTTP method tokens accepted by the method predicate.
#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[serde(rename_all = "UPPERCASE")]
pub enum HttpMethod {
    Get,
    Post,
    Put,
    Delete,
    Options,
    Head,
    Patch,
    Trace,
    Connect,
}

impl HttpMethod {
    pub const ALL: [HttpMethod; 9] = [
        HttpMethod::Get,
        HttpMethod::Post,
        HttpMethod::Put,
        HttpMethod::Delete,
        HttpMethod::Options,
        HttpMethod::Head,
        HttpMethod::Patch,
        HttpMethod::Trace,
        HttpMethod::Connect,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            HttpMethod::Get => "GET",
            HttpMethod::Post => "POST",
            HttpMethod::Put => "PUT",
            HttpMethod::Delete => "DELETE",
            HttpMethod::Options => "OPTIONS",
            HttpMethod::Head => "HEAD",
            HttpMethod::Patch => "PATCH",
            HttpMethod::Trace => "TRACE",
            HttpMethod::Connect => "CONNECT",
        }
    }

    /// Selection options for the method control, in display order.
    pub fn options() -> Vec<OptionItem> {
        Self::ALL
            .iter()
            .map(|m| OptionItem::new(m.as_str(), m.as_str()))
            .collect()
    }
}

impl fmt::Display for HttpMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for HttpMethod {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .iter()
            .copied()
            .find(|m| m.as_str() == s)
            .ok_or_else(|| format!("unsupported HTTP method '{s}'"))
    }
}

/// Path predicate as persisted.
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct PathPredicate {
    #[serde(rename = "type")]
    pub match_type: MatchType,
    pub path: String,
    #[serde(default)]
    pub ignore_case: bool,
}

/// One header or query predicate row as persisted.
///
/// Keys other than `key`, `value` and `matchType` are preserved in `extra`.
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Eq, Default)]
#[serde(rename_all = "camelCase")]
pub struct KeyValuePredicate {
    pub key: String,
    #[serde(default)]
    pub value: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub match_type: Option<MatchType>,
    #[serde(flatten)]
    pub extra: BTreeMap<String, Value>,
}

impl KeyValuePredicate {
    pub fn new(key: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            key: key.into(),
            value: value.into(),
            match_type: None,
            extra: BTreeMap::new(),
        }
    }

    pub fn with_match_type(mut self, match_type: MatchType) -> Self {
        self.match_type = Some(match_type);
        self
    }
}

/// Conjunction of predicates gating a route.
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct RoutePredicates {
    pub path_predicates: PathPredicate,
    /// Empty means any method.
    #[serde(default)]
    pub method_predicates: Vec<HttpMethod>,
    #[serde(default)]
    pub header_predicates: Vec<KeyValuePredicate>,
    #[serde(default)]
    pub query_predicates: Vec<KeyValuePredicate>,
}

/// Reference from a route to a backend service.
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct UpstreamService {
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub port: Option<u16>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub weight: Option<u32>,
}

impl UpstreamService {
    pub fn named(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            port: None,
            weight: None,
        }
    }
}

/// Persisted gateway route.
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct Route {
    pub name: String,
    #[serde(default)]
    pub domain_list: Vec<String>,
    pub route_predicates: RoutePredicates,
    #[serde(default)]
    pub services: Vec<UpstreamService>,
}

/// Backend service entry returned by the service directory.
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Eq)]
pub struct Service {
    pub name: String,
    #[serde(flatten)]
    pub metadata: BTreeMap<String, Value>,
}

impl Service {
    pub fn named(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            metadata: BTreeMap::new(),
        }
    }
}

/// Domain entry returned by the domain directory.
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Eq)]
pub struct Domain {
    pub name: String,
    #[serde(flatten)]
    pub metadata: BTreeMap<String, Value>,
}

impl Domain {
    pub fn named(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            metadata: BTreeMap::new(),
        }
    }
}

/// Envelope the domain directory answers with.
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Eq, Default)]
pub struct DomainResponse {
    #[serde(default)]
    pub list: Vec<Domain>,
}

impl From<Vec<Domain>> for DomainResponse {
    fn from(list: Vec<Domain>) -> Self {
        Self { list }
    }
}

/// `{label, value}` pair feeding a selection control.
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Eq)]
pub struct OptionItem {
    pub label: String,
    pub value: String,
}

impl OptionItem {
    pub fn new(label: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            label: label.into(),
            value: value.into(),
        }
    }
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_timeout() -> String {
    "10s".to_string()
}

fn default_poll_interval() -> String {
    "30s".to_string()
}

/// How row uids are minted for an edit session.
#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq, Default)]
#[serde(rename_all = "snake_case")]
pub enum UidStrategy {
    /// Monotonic counter ("1", "2", ...).
    #[default]
    Sequential,
    /// Random v4 uuid tokens.
    Random,
}

/// Where the option lists come from.
#[derive(Debug, Serialize, Deserialize, Clone)]
#[serde(default)]
pub struct DirectoryConfig {
    /// Services source: a JSON file path or an http(s) URL.
    pub services: Option<String>,
    /// Domains source: a JSON file path or an http(s) URL.
    pub domains: Option<String>,
    /// Request timeout for HTTP sources, parsed by humantime (e.g. "10s").
    pub timeout: String,
    /// Polling interval for HTTP change detection, parsed by humantime.
    pub poll_interval: String,
}

impl Default for DirectoryConfig {
    fn default() -> Self {
        Self {
            services: None,
            domains: None,
            timeout: default_timeout(),
            poll_interval: default_poll_interval(),
        }
    }
}

/// Editor settings loaded by [`crate::config::loader::load_config`].
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct EditorConfig {
    #[serde(default = "default_log_level")]
    pub log_level: String,
    #[serde(default)]
    pub json_logs: bool,
    #[serde(default)]
    pub directories: DirectoryConfig,
    #[serde(default)]
    pub uid_strategy: UidStrategy,
}

impl Default for EditorConfig {
    fn default() -> Self {
        Self {
            log_level: default_log_level(),
            json_logs: false,
            directories: DirectoryConfig::default(),
            uid_strategy: UidStrategy::default(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn route_deserializes_from_persisted_shape() {
        let json = r#"{
            "name": "user-default",
            "domainList": ["example.com"],
            "routePredicates": {
                "pathPredicates": { "type": "PRE", "path": "/user", "ignoreCase": true },
                "methodPredicates": ["GET", "POST"],
                "headerPredicates": [{ "key": "x-env", "value": "gray", "matchType": "EQUAL" }]
            },
            "services": [{ "name": "svc-a", "port": 8080 }]
        }"#;

        let route: Route = serde_json::from_str(json).unwrap();
        assert_eq!(route.route_predicates.path_predicates.match_type, MatchType::Prefix);
        assert_eq!(
            route.route_predicates.method_predicates,
            vec![HttpMethod::Get, HttpMethod::Post]
        );
        assert!(route.route_predicates.query_predicates.is_empty());
        assert_eq!(route.services[0].port, Some(8080));
    }

    #[test]
    fn regex_match_type_keeps_wire_token() {
        let parsed: MatchType = serde_json::from_str("\"REGEX\"").unwrap();
        assert_eq!(parsed, MatchType::Regular);
        assert_eq!(serde_json::to_string(&parsed).unwrap(), "\"ERGULAR\"");
    }

    #[test]
    fn predicate_row_preserves_unknown_fields() {
        let row: KeyValuePredicate =
            serde_json::from_str(r#"{"key":"k","value":"v","note":"keep"}"#).unwrap();
        assert_eq!(row.extra.get("note"), Some(&Value::from("keep")));
        let back = serde_json::to_value(&row).unwrap();
        assert_eq!(back["note"], "keep");
    }

    #[test]
    fn unknown_method_token_is_rejected() {
        assert!("FETCH".parse::<HttpMethod>().is_err());
        assert_eq!("PATCH".parse::<HttpMethod>(), Ok(HttpMethod::Patch));
    }
}
