//! In-memory stand-ins for every external collaborator of a quota cycle.
//!
//! Used ONLY by tests.

use anyhow::{bail, Result};
use qm_config::{BlueprintSection, CatalogDefinition, ItemDefinition};
use qm_reconcile::{
    AssemblerMode, DispatchError, EnqueueRequest, InventoryItem, InventorySource,
    ItemKind, ProductionDispatcher, ProductionQueueSource, QueueEntry,
};
use qm_runtime::ConfigStore;

pub const COMPONENT: &str = "Component";

pub fn component(subtype: &str) -> ItemKind {
    ItemKind::new(COMPONENT, subtype)
}

// ---------------------------------------------------------------------------
// Grid sources
// ---------------------------------------------------------------------------

/// Cargo container with fixed contents.
#[derive(Clone, Debug, Default)]
pub struct FakeInventory {
    items: Vec<InventoryItem>,
}

impl FakeInventory {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_units(mut self, subtype: &str, units: i64) -> Self {
        self.items.push(InventoryItem::units(component(subtype), units));
        self
    }

    pub fn with_item(mut self, item: InventoryItem) -> Self {
        self.items.push(item);
        self
    }
}

impl InventorySource for FakeInventory {
    fn inventory_items(&self) -> Vec<InventoryItem> {
        self.items.clone()
    }
}

/// Assembler with a fixed queue.
#[derive(Clone, Debug)]
pub struct FakeAssembler {
    mode: AssemblerMode,
    queue: Vec<QueueEntry>,
}

impl FakeAssembler {
    pub fn assembling() -> Self {
        Self {
            mode: AssemblerMode::Assembly,
            queue: Vec::new(),
        }
    }

    pub fn disassembling() -> Self {
        Self {
            mode: AssemblerMode::Disassembly,
            queue: Vec::new(),
        }
    }

    pub fn queued(mut self, blueprint: &str, units: i64) -> Self {
        self.queue.push(QueueEntry::units(blueprint, units));
        self
    }
}

impl ProductionQueueSource for FakeAssembler {
    fn mode(&self) -> AssemblerMode {
        self.mode
    }

    fn queue_entries(&self) -> Vec<QueueEntry> {
        self.queue.clone()
    }
}

// ---------------------------------------------------------------------------
// Dispatcher
// ---------------------------------------------------------------------------

/// Records every request; optionally rejects one blueprint subtype.
#[derive(Clone, Debug, Default)]
pub struct RecordingDispatcher {
    pub requests: Vec<EnqueueRequest>,
    pub reject_blueprint: Option<String>,
    calls: usize,
}

impl RecordingDispatcher {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn rejecting(blueprint_subtype: &str) -> Self {
        Self {
            reject_blueprint: Some(blueprint_subtype.to_string()),
            ..Self::default()
        }
    }

    /// Every call, accepted or not.
    pub fn calls(&self) -> usize {
        self.calls
    }
}

impl ProductionDispatcher for RecordingDispatcher {
    fn enqueue(&mut self, request: &EnqueueRequest) -> Result<(), DispatchError> {
        self.calls += 1;
        if self.reject_blueprint.as_deref() == Some(request.blueprint.subtype.as_str()) {
            return Err(DispatchError::new("assembler rejected blueprint"));
        }
        self.requests.push(request.clone());
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Config store
// ---------------------------------------------------------------------------

/// Custom data held in memory. Load/store failures can be switched on.
#[derive(Clone, Debug, Default)]
pub struct MemoryConfigStore {
    pub blob: String,
    pub fail_load: bool,
    pub fail_store: bool,
    pub stores: usize,
}

impl MemoryConfigStore {
    pub fn new(blob: &str) -> Self {
        Self {
            blob: blob.to_string(),
            ..Self::default()
        }
    }
}

impl ConfigStore for MemoryConfigStore {
    fn load(&mut self) -> Result<String> {
        if self.fail_load {
            bail!("custom data not readable");
        }
        Ok(self.blob.clone())
    }

    fn store(&mut self, blob: &str) -> Result<()> {
        if self.fail_store {
            bail!("custom data is read-only");
        }
        self.blob = blob.to_string();
        self.stores += 1;
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Fixtures
// ---------------------------------------------------------------------------

/// Small component catalog: `(subtype, default_minimum)`; `Computer` and
/// `Motor` take the `Component` blueprint suffix.
pub fn definition(items: &[(&str, i64)]) -> CatalogDefinition {
    CatalogDefinition {
        blueprints: BlueprintSection {
            type_id: qm_reconcile::DEFAULT_BLUEPRINT_TYPE.to_string(),
            suffix: COMPONENT.to_string(),
            queue_category: COMPONENT.to_string(),
            suffixed: vec!["Computer".to_string(), "Motor".to_string()],
        },
        items: items
            .iter()
            .map(|(subtype, default_minimum)| ItemDefinition {
                category: COMPONENT.to_string(),
                subtype: subtype.to_string(),
                default_minimum: *default_minimum,
            })
            .collect(),
    }
}

/// Custom data with `should_run` and the given quotas.
pub fn custom_data(should_run: bool, quotas: &[(&str, i64)]) -> String {
    let mut s = format!("[general]\nshould_run={should_run}\n\n[quotas]\n");
    for (k, v) in quotas {
        s.push_str(&format!("{k}={v}\n"));
    }
    s
}
