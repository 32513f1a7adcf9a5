//! Row identity for header/query predicate lists.
//!
//! Every predicate row shown in the editor carries a [`RowUid`] so that adding,
//! removing or reordering rows never moves per-row edit state onto a different
//! row. Uids are minted by a [`UidGenerator`] owned by the edit session; the
//! generator never resets and never hands out the same value twice. Uids are
//! never derived from row content: two identical rows still get different uids.
use std::{
    fmt,
    sync::{
        Arc,
        atomic::{AtomicU64, Ordering},
    },
};

use once_cell::sync::Lazy;
use serde::{Deserialize, Serialize};

use crate::{config::models::KeyValuePredicate, core::form_state::PredicateRow};

/// Opaque identity of a predicate row. Never persisted.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize, Default)]
#[serde(transparent)]
pub struct RowUid(String);

impl RowUid {
    pub fn new(value: impl Into<String>) -> Self {
        Self(value.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl fmt::Display for RowUid {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Source of row identities for one or more edit sessions.
pub trait UidGenerator: Send + Sync + fmt::Debug {
    /// Mint a uid that this generator has never returned before.
    fn next_uid(&self) -> RowUid;
}

/// Monotonic counter generator: "1", "2", "3", ... (optionally prefixed).
#[derive(Debug)]
pub struct SequentialUidGenerator {
    prefix: String,
    next: AtomicU64,
}

impl SequentialUidGenerator {
    pub fn new() -> Self {
        Self::with_prefix("")
    }

    pub fn with_prefix(prefix: impl Into<String>) -> Self {
        Self {
            prefix: prefix.into(),
            next: AtomicU64::new(1),
        }
    }
}

impl Default for SequentialUidGenerator {
    fn default() -> Self {
        Self::new()
    }
}

impl UidGenerator for SequentialUidGenerator {
    fn next_uid(&self) -> RowUid {
        let n = self.next.fetch_add(1, Ordering::Relaxed);
        RowUid(format!("{}{}", self.prefix, n))
    }
}

/// Random token generator backed by v4 uuids.
#[derive(Debug, Default, Clone, Copy)]
pub struct RandomUidGenerator;

impl UidGenerator for RandomUidGenerator {
    fn next_uid(&self) -> RowUid {
        RowUid(uuid::Uuid::new_v4().simple().to_string())
    }
}

static SHARED_GENERATOR: Lazy<Arc<SequentialUidGenerator>> =
    Lazy::new(|| Arc::new(SequentialUidGenerator::new()));

/// Process-wide sequential generator, for hosts that want a single counter
/// across every edit session.
pub fn shared_generator() -> Arc<dyn UidGenerator> {
    SHARED_GENERATOR.clone()
}

/// Attach a fresh uid to every row, keeping order and all other fields.
///
/// A `uid` key smuggled in through the row's extra fields is dropped.
pub fn attach_uids<I>(rows: I, uids: &dyn UidGenerator) -> Vec<PredicateRow>
where
    I: IntoIterator<Item = KeyValuePredicate>,
{
    rows.into_iter().map(|row| mint_row(row, uids)).collect()
}

/// Wrap a single predicate into a row with a newly minted uid.
pub fn mint_row(mut predicate: KeyValuePredicate, uids: &dyn UidGenerator) -> PredicateRow {
    predicate.extra.remove("uid");
    PredicateRow {
        uid: uids.next_uid(),
        predicate,
    }
}

/// Drop row identities, returning the persisted predicate shape.
pub fn strip_uids<'a, I>(rows: I) -> Vec<KeyValuePredicate>
where
    I: IntoIterator<Item = &'a PredicateRow>,
{
    rows.into_iter().map(|row| row.predicate.clone()).collect()
}
