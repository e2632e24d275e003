//! qm-runtime
//!
//! Per-tick driver around the pure reconciliation core: config loading with
//! last-known-good fallback, snapshot building, dispatch, status readout.

mod monitor;
mod status;

pub use monitor::{ConfigStore, CycleOutcome, QuotaMonitor, SettingsSource};
pub use status::render_status;
