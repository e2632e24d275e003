//! qm-reconcile
//!
//! Quota reconciliation core.
//!
//! Per cycle: catalog minimums + available snapshot + queued snapshot
//! -> per-kind deficit -> production plan -> gated dispatch.
//!
//! - Disabled (negative minimum) kinds never appear in output
//! - Missing snapshot entries count as zero
//! - Unresolvable blueprints are flagged, never fatal
//! - Dry-run is the default; the dispatcher is only called when enabled
//!
//! Deterministic, pure logic. No IO. No host calls.

mod blueprint;
mod dispatch;
mod engine;
pub mod snapshot_adapter;
mod types;

pub use blueprint::{
    BlueprintId, BlueprintResolver, BlueprintRules, BlueprintTable, QueueEntryNormalizer,
    DEFAULT_BLUEPRINT_TYPE,
};
pub use dispatch::{
    dispatch_plan, plan_production, DispatchError, DispatchMode, DispatchOutcome,
    EnqueueRequest, FailedRequest, ProductionDispatcher, ProductionPlan,
};
pub use engine::{deficit, reconcile};
pub use snapshot_adapter::{
    available_snapshot, queued_snapshot, AssemblerMode, InventoryItem, InventorySource,
    ProductionQueueSource, QueueEntry,
};
pub use types::*;
