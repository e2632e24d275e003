use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};

/// Micros scale (1e-6) used for host inventory amounts (fixed-point).
pub const MICROS_SCALE: i64 = 1_000_000;

/// Minimum value that marks a catalog entry as untracked.
///
/// Any negative minimum disables the entry; this is the canonical one.
pub const DISABLED_MINIMUM: i64 = -1;

/// Identity of a trackable resource: `(category, subtype)`.
///
/// Ordering is structural (category first, then subtype) and is the order
/// every report is emitted in.
#[derive(Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct ItemKind {
    pub category: String,
    pub subtype: String,
}

impl ItemKind {
    pub fn new(category: impl Into<String>, subtype: impl Into<String>) -> Self {
        Self {
            category: category.into(),
            subtype: subtype.into(),
        }
    }
}

impl fmt::Display for ItemKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.category, self.subtype)
    }
}

/// Configured minimums per item kind.
///
/// The set of keys is fixed once the catalog is built; snapshots never add
/// kinds to it.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Catalog {
    minimums: BTreeMap<ItemKind, i64>,
}

impl Catalog {
    pub fn empty() -> Self {
        Self::default()
    }

    /// Insert or replace the minimum for `kind`. Negative disables it.
    pub fn set_minimum(&mut self, kind: ItemKind, minimum: i64) {
        self.minimums.insert(kind, minimum);
    }

    pub fn with_minimum(mut self, kind: ItemKind, minimum: i64) -> Self {
        self.set_minimum(kind, minimum);
        self
    }

    /// Raw configured minimum, including disabled (negative) values.
    pub fn minimum(&self, kind: &ItemKind) -> Option<i64> {
        self.minimums.get(kind).copied()
    }

    pub fn contains(&self, kind: &ItemKind) -> bool {
        self.minimums.contains_key(kind)
    }

    pub fn is_tracked(&self, kind: &ItemKind) -> bool {
        matches!(self.minimum(kind), Some(m) if m >= 0)
    }

    /// All catalog kinds (tracked or not) in deterministic order.
    pub fn kinds(&self) -> impl Iterator<Item = &ItemKind> {
        self.minimums.keys()
    }

    /// Tracked kinds with their minimums, in deterministic order.
    pub fn tracked(&self) -> impl Iterator<Item = (&ItemKind, i64)> {
        self.minimums
            .iter()
            .filter(|(_, m)| **m >= 0)
            .map(|(k, m)| (k, *m))
    }

    pub fn len(&self) -> usize {
        self.minimums.len()
    }

    pub fn is_empty(&self) -> bool {
        self.minimums.is_empty()
    }
}

/// Per-kind whole-unit quantities observed during one cycle.
///
/// Absent kinds read as zero.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct QuantitySnapshot {
    quantities: BTreeMap<ItemKind, i64>,
}

impl QuantitySnapshot {
    pub fn empty() -> Self {
        Self::default()
    }

    /// Add `qty` to the running total for `kind` (saturating).
    pub fn add(&mut self, kind: ItemKind, qty: i64) {
        let slot = self.quantities.entry(kind).or_insert(0);
        *slot = slot.saturating_add(qty);
    }

    pub fn with(mut self, kind: ItemKind, qty: i64) -> Self {
        self.add(kind, qty);
        self
    }

    pub fn get(&self, kind: &ItemKind) -> i64 {
        self.quantities.get(kind).copied().unwrap_or(0)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&ItemKind, i64)> {
        self.quantities.iter().map(|(k, q)| (k, *q))
    }

    pub fn is_empty(&self) -> bool {
        self.quantities.is_empty()
    }
}

/// One reconciled row: `deficit = minimum - (available + queued)`.
#[derive(Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub struct QuotaLine {
    pub kind: ItemKind,
    pub minimum: i64,
    pub available: i64,
    pub queued: i64,
    /// Signed: negative means surplus.
    pub deficit: i64,
}

impl QuotaLine {
    /// Underfilled: production should be requested for `deficit` units.
    pub fn is_production_candidate(&self) -> bool {
        self.deficit > 0
    }

    pub fn surplus(&self) -> i64 {
        if self.deficit < 0 {
            self.deficit.saturating_neg()
        } else {
            0
        }
    }
}

/// Full reconciliation output. Lines are ordered by [`ItemKind`].
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReconcileReport {
    pub lines: Vec<QuotaLine>,
}

impl ReconcileReport {
    pub fn candidates(&self) -> impl Iterator<Item = &QuotaLine> {
        self.lines.iter().filter(|l| l.is_production_candidate())
    }

    pub fn line(&self, kind: &ItemKind) -> Option<&QuotaLine> {
        self.lines.iter().find(|l| &l.kind == kind)
    }

    /// `true` when no tracked kind is underfilled.
    pub fn is_fully_stocked(&self) -> bool {
        self.candidates().next().is_none()
    }
}
