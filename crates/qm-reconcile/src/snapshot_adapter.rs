//! Snapshot adapter: build per-cycle quantity snapshots from the grid.
//!
//! # Purpose
//! The host exposes inventories (item identity + fixed-point amount) and
//! assembler queues (blueprint + amount, plus the assembler's operating mode).
//! This module defines the source traits the runtime reads through, the raw
//! wire structs for a serialized grid state, and the two aggregation
//! functions that turn sources into [`QuantitySnapshot`]s for the engine.
//!
//! # Design constraints
//! - Pure, deterministic aggregation. No IO.
//! - Only catalog kinds are ever inserted into a snapshot.
//! - Available amounts are summed in micros and truncated to whole units
//!   once per kind; queued amounts are truncated per entry, then summed.
//! - Only assemblers in [`AssemblerMode::Assembly`] contribute queued units.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::{Catalog, ItemKind, QuantitySnapshot, QueueEntryNormalizer, MICROS_SCALE};

// ---------------------------------------------------------------------------
// Errors
// ---------------------------------------------------------------------------

/// Errors while normalizing a raw grid state.
#[derive(Debug, Clone, PartialEq)]
pub enum SnapshotAdapterError {
    /// An inventory item had an empty category or subtype.
    MissingItemIdentity { source: String },
    /// An amount was NaN or infinite.
    NonFiniteAmount { source: String, amount: f64 },
    /// An amount does not fit the micros range.
    AmountOutOfRange { source: String, amount: f64 },
    /// An assembler mode string could not be mapped.
    UnknownMode { source: String, raw: String },
}

impl std::fmt::Display for SnapshotAdapterError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::MissingItemIdentity { source } => {
                write!(f, "'{source}' holds an item with empty category or subtype")
            }
            Self::NonFiniteAmount { source, amount } => {
                write!(f, "'{source}' reports non-finite amount {amount}")
            }
            Self::AmountOutOfRange { source, amount } => {
                write!(f, "'{source}' reports amount {amount} outside the supported range")
            }
            Self::UnknownMode { source, raw } => {
                write!(f, "assembler '{source}' has unrecognised mode '{raw}'")
            }
        }
    }
}

impl std::error::Error for SnapshotAdapterError {}

// ---------------------------------------------------------------------------
// Source model
// ---------------------------------------------------------------------------

/// One stack of items inside an inventory.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct InventoryItem {
    pub kind: ItemKind,
    /// Fixed-point amount, [`MICROS_SCALE`] per unit.
    pub amount_micros: i64,
}

impl InventoryItem {
    pub fn units(kind: ItemKind, units: i64) -> Self {
        Self {
            kind,
            amount_micros: units.saturating_mul(MICROS_SCALE),
        }
    }
}

/// Anything holding items (cargo container, assembler output, connector...).
pub trait InventorySource {
    fn inventory_items(&self) -> Vec<InventoryItem>;
}

/// Assembler operating mode.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AssemblerMode {
    Assembly,
    Disassembly,
}

/// One production-queue entry as declared by the assembler.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct QueueEntry {
    pub blueprint_subtype: String,
    pub amount_micros: i64,
}

impl QueueEntry {
    pub fn units(blueprint_subtype: impl Into<String>, units: i64) -> Self {
        Self {
            blueprint_subtype: blueprint_subtype.into(),
            amount_micros: units.saturating_mul(MICROS_SCALE),
        }
    }
}

/// An assembler's production queue.
pub trait ProductionQueueSource {
    fn mode(&self) -> AssemblerMode;
    fn queue_entries(&self) -> Vec<QueueEntry>;
}

// ---------------------------------------------------------------------------
// Aggregation
// ---------------------------------------------------------------------------

/// Sum on-hand quantities per catalog kind across `sources`.
///
/// Non-catalog kinds and negative amounts are ignored.
pub fn available_snapshot(
    catalog: &Catalog,
    sources: &[&dyn InventorySource],
) -> QuantitySnapshot {
    let mut micros: BTreeMap<ItemKind, i64> = BTreeMap::new();
    for source in sources {
        for item in source.inventory_items() {
            if item.amount_micros < 0 || !catalog.contains(&item.kind) {
                continue;
            }
            let slot = micros.entry(item.kind).or_insert(0);
            *slot = slot.saturating_add(item.amount_micros);
        }
    }

    let mut snap = QuantitySnapshot::empty();
    for (kind, total) in micros {
        snap.add(kind, total / MICROS_SCALE);
    }
    snap
}

/// Sum quantities already queued for production per catalog kind.
///
/// Queues not in [`AssemblerMode::Assembly`] are skipped. Entries whose
/// blueprint does not normalize to a catalog kind are ignored.
pub fn queued_snapshot(
    catalog: &Catalog,
    queues: &[&dyn ProductionQueueSource],
    normalizer: &dyn QueueEntryNormalizer,
) -> QuantitySnapshot {
    let mut snap = QuantitySnapshot::empty();
    for queue in queues {
        if queue.mode() != AssemblerMode::Assembly {
            continue;
        }
        for entry in queue.queue_entries() {
            if entry.amount_micros < 0 {
                continue;
            }
            let Some(kind) = normalizer.normalize(&entry.blueprint_subtype) else {
                continue;
            };
            if !catalog.contains(&kind) {
                continue;
            }
            snap.add(kind, entry.amount_micros / MICROS_SCALE);
        }
    }
    snap
}

// ---------------------------------------------------------------------------
// Raw wire-level structs  (grid-state JSON → these → sources)
// ---------------------------------------------------------------------------

/// Wire-level item stack.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct RawInventoryItem {
    pub category: String,
    pub subtype: String,
    /// Decimal amount; fractional for ores and ingots.
    pub amount: f64,
}

/// Wire-level inventory block.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct RawInventory {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub items: Vec<RawInventoryItem>,
}

/// Wire-level queue entry.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct RawQueueEntry {
    pub blueprint: String,
    pub amount: f64,
}

/// Wire-level assembler.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct RawAssembler {
    #[serde(default)]
    pub name: String,
    /// `"assembly"` | `"disassembly"` (case-insensitive).
    pub mode: String,
    #[serde(default)]
    pub queue: Vec<RawQueueEntry>,
}

/// Serialized grid state: every inventory and assembler visible to the script.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct RawGridState {
    #[serde(default)]
    pub inventories: Vec<RawInventory>,
    #[serde(default)]
    pub assemblers: Vec<RawAssembler>,
}

/// Normalized inventory, usable as an [`InventorySource`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Inventory {
    pub name: String,
    pub items: Vec<InventoryItem>,
}

impl InventorySource for Inventory {
    fn inventory_items(&self) -> Vec<InventoryItem> {
        self.items.clone()
    }
}

/// Normalized assembler, usable as a [`ProductionQueueSource`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Assembler {
    pub name: String,
    pub mode: AssemblerMode,
    pub queue: Vec<QueueEntry>,
}

impl ProductionQueueSource for Assembler {
    fn mode(&self) -> AssemblerMode {
        self.mode
    }

    fn queue_entries(&self) -> Vec<QueueEntry> {
        self.queue.clone()
    }
}

/// Normalized grid state.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct GridState {
    pub inventories: Vec<Inventory>,
    pub assemblers: Vec<Assembler>,
}

impl GridState {
    pub fn inventory_sources(&self) -> Vec<&dyn InventorySource> {
        self.inventories
            .iter()
            .map(|i| i as &dyn InventorySource)
            .collect()
    }

    pub fn queue_sources(&self) -> Vec<&dyn ProductionQueueSource> {
        self.assemblers
            .iter()
            .map(|a| a as &dyn ProductionQueueSource)
            .collect()
    }
}

// ---------------------------------------------------------------------------
// Normalization helpers
// ---------------------------------------------------------------------------

/// Convert a decimal amount to micros, rounding to the nearest micro.
pub fn amount_to_micros(source: &str, amount: f64) -> Result<i64, SnapshotAdapterError> {
    if !amount.is_finite() {
        return Err(SnapshotAdapterError::NonFiniteAmount {
            source: source.to_string(),
            amount,
        });
    }
    let scaled = (amount * MICROS_SCALE as f64).round();
    if scaled.abs() >= i64::MAX as f64 {
        return Err(SnapshotAdapterError::AmountOutOfRange {
            source: source.to_string(),
            amount,
        });
    }
    Ok(scaled as i64)
}

fn normalize_mode(source: &str, raw: &str) -> Result<AssemblerMode, SnapshotAdapterError> {
    match raw.trim().to_ascii_lowercase().as_str() {
        "assembly" | "assemble" => Ok(AssemblerMode::Assembly),
        "disassembly" | "disassemble" => Ok(AssemblerMode::Disassembly),
        _ => Err(SnapshotAdapterError::UnknownMode {
            source: source.to_string(),
            raw: raw.to_string(),
        }),
    }
}

fn normalize_inventory(raw: RawInventory) -> Result<Inventory, SnapshotAdapterError> {
    let mut items = Vec::with_capacity(raw.items.len());
    for item in raw.items {
        let category = item.category.trim();
        let subtype = item.subtype.trim();
        if category.is_empty() || subtype.is_empty() {
            return Err(SnapshotAdapterError::MissingItemIdentity { source: raw.name });
        }
        items.push(InventoryItem {
            kind: ItemKind::new(category, subtype),
            amount_micros: amount_to_micros(&raw.name, item.amount)?,
        });
    }
    Ok(Inventory {
        name: raw.name,
        items,
    })
}

fn normalize_assembler(raw: RawAssembler) -> Result<Assembler, SnapshotAdapterError> {
    let mode = normalize_mode(&raw.name, &raw.mode)?;
    let mut queue = Vec::with_capacity(raw.queue.len());
    for entry in raw.queue {
        queue.push(QueueEntry {
            blueprint_subtype: entry.blueprint.trim().to_string(),
            amount_micros: amount_to_micros(&raw.name, entry.amount)?,
        });
    }
    Ok(Assembler {
        name: raw.name,
        mode,
        queue,
    })
}

// ---------------------------------------------------------------------------
// Public API
// ---------------------------------------------------------------------------

/// Normalize a raw grid state.
///
/// # Errors
/// Returns the first [`SnapshotAdapterError`] encountered, inventories first,
/// then assemblers, each in input order.
pub fn normalize_grid(raw: RawGridState) -> Result<GridState, SnapshotAdapterError> {
    let inventories = raw
        .inventories
        .into_iter()
        .map(normalize_inventory)
        .collect::<Result<Vec<_>, _>>()?;
    let assemblers = raw
        .assemblers
        .into_iter()
        .map(normalize_assembler)
        .collect::<Result<Vec<_>, _>>()?;
    Ok(GridState {
        inventories,
        assemblers,
    })
}
