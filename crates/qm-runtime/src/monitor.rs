//! Quota monitor: one reconciliation cycle per host tick.
//!
//! Cycle order:
//! 1. load custom data through the [`ConfigStore`]; heal it and write it
//!    back when keys were missing
//! 2. on a load or parse failure, fall back to the last-known-good settings
//!    (or catalog defaults) and force dry-run for this cycle
//! 3. build the available / queued snapshots from the grid sources
//! 4. reconcile, plan, dispatch
//!
//! Nothing escapes a cycle: every failure ends up in the [`CycleOutcome`].

use anyhow::Result;
use qm_config::{heal, parse_custom_data, CatalogDefinition, QuotaSettings};
use qm_reconcile::{
    available_snapshot, dispatch_plan, plan_production, queued_snapshot, reconcile,
    BlueprintTable, DispatchMode, DispatchOutcome, InventorySource, ProductionDispatcher,
    ProductionPlan, ProductionQueueSource, ReconcileReport,
};
use serde::Serialize;
use tracing::{debug, info, warn};

/// External home of the custom-data blob (the programmable block's
/// custom data in-game, a file for the CLI).
pub trait ConfigStore {
    fn load(&mut self) -> Result<String>;
    fn store(&mut self, blob: &str) -> Result<()>;
}

/// Where the settings of a cycle came from.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SettingsSource {
    /// Freshly parsed custom data.
    Loaded,
    /// Custom data was unusable; the previous good settings were reused.
    LastKnownGood,
    /// Custom data was unusable and no cycle had succeeded yet.
    Defaults,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct CycleOutcome {
    pub report: ReconcileReport,
    pub plan: ProductionPlan,
    pub dispatch: DispatchOutcome,
    pub settings_source: SettingsSource,
    /// Set when custom data could not be loaded or parsed.
    pub config_error: Option<String>,
    /// Custom data was missing keys and a healed copy was written back.
    pub config_healed: bool,
    pub warnings: Vec<String>,
}

impl CycleOutcome {
    pub fn mode(&self) -> DispatchMode {
        self.dispatch.mode
    }

    pub fn has_config_error(&self) -> bool {
        self.config_error.is_some()
    }
}

struct CycleSettings {
    settings: QuotaSettings,
    source: SettingsSource,
    error: Option<String>,
    healed: bool,
    warnings: Vec<String>,
}

pub struct QuotaMonitor {
    definition: CatalogDefinition,
    blueprints: BlueprintTable,
    last_good: Option<QuotaSettings>,
}

impl QuotaMonitor {
    /// Monitor using the blueprint table derived from `definition`.
    pub fn new(definition: CatalogDefinition) -> Self {
        let blueprints = definition.blueprint_table();
        Self::with_blueprints(definition, blueprints)
    }

    /// Monitor with an explicitly supplied blueprint table.
    pub fn with_blueprints(definition: CatalogDefinition, blueprints: BlueprintTable) -> Self {
        Self {
            definition,
            blueprints,
            last_good: None,
        }
    }

    pub fn definition(&self) -> &CatalogDefinition {
        &self.definition
    }

    pub fn blueprints(&self) -> &BlueprintTable {
        &self.blueprints
    }

    pub fn last_known_good(&self) -> Option<&QuotaSettings> {
        self.last_good.as_ref()
    }

    /// Run one cycle. Takes `&mut self`: cycles never overlap.
    pub fn run_cycle(
        &mut self,
        store: &mut dyn ConfigStore,
        inventories: &[&dyn InventorySource],
        queues: &[&dyn ProductionQueueSource],
        dispatcher: &mut dyn ProductionDispatcher,
    ) -> CycleOutcome {
        let cycle = self.load_settings(store);

        // A broken config never arms dispatch, even if the last good one did.
        let mode = if cycle.error.is_some() {
            DispatchMode::DryRun
        } else {
            cycle.settings.dispatch_mode()
        };

        let catalog = &cycle.settings.catalog;
        let available = available_snapshot(catalog, inventories);
        let queued = queued_snapshot(catalog, queues, &self.blueprints);
        let report = reconcile(catalog, &available, &queued);

        for line in &report.lines {
            debug!(
                item = %line.kind,
                minimum = line.minimum,
                available = line.available,
                queued = line.queued,
                deficit = line.deficit,
                "quota line"
            );
        }

        let plan = plan_production(&report, &self.blueprints);
        for kind in &plan.unqueueable {
            warn!(item = %kind, "no blueprint for production candidate; skipped");
        }

        let dispatch = dispatch_plan(&plan, mode, dispatcher);
        for failed in &dispatch.failed {
            warn!(
                item = %failed.request.kind,
                blueprint = %failed.request.blueprint,
                quantity = failed.request.quantity,
                error = %failed.error,
                "enqueue request rejected"
            );
        }

        info!(
            mode = mode.as_str(),
            tracked = report.lines.len(),
            candidates = report.candidates().count(),
            dispatched = dispatch.dispatched.len(),
            withheld = dispatch.withheld.len(),
            failed = dispatch.failed.len(),
            unqueueable = plan.unqueueable.len(),
            "quota cycle complete"
        );

        CycleOutcome {
            report,
            plan,
            dispatch,
            settings_source: cycle.source,
            config_error: cycle.error,
            config_healed: cycle.healed,
            warnings: cycle.warnings,
        }
    }

    fn fallback_settings(&self) -> (QuotaSettings, SettingsSource) {
        match &self.last_good {
            Some(s) => (s.clone(), SettingsSource::LastKnownGood),
            None => (
                QuotaSettings::defaults(&self.definition),
                SettingsSource::Defaults,
            ),
        }
    }

    fn load_settings(&mut self, store: &mut dyn ConfigStore) -> CycleSettings {
        let parsed = store
            .load()
            .map_err(|e| format!("custom data unavailable: {e:#}"))
            .and_then(|blob| parse_custom_data(&blob).map_err(|e| e.to_string()));

        let data = match parsed {
            Ok(data) => data,
            Err(error) => {
                let (settings, source) = self.fallback_settings();
                warn!(
                    error = %error,
                    fallback = ?source,
                    "custom data rejected; reusing previous quotas in dry-run"
                );
                return CycleSettings {
                    settings,
                    source,
                    error: Some(error),
                    healed: false,
                    warnings: Vec::new(),
                };
            }
        };

        let healed = heal(&data, &self.definition);
        let mut warnings = Vec::new();

        if !healed.unknown_quota_keys.is_empty() {
            let msg = format!(
                "quota keys without a catalog item: {}",
                healed.unknown_quota_keys.join(", ")
            );
            warn!("{msg}");
            warnings.push(msg);
        }

        let mut written = false;
        if healed.changed() {
            match store.store(&healed.rendered) {
                Ok(()) => {
                    info!(added = ?healed.added_keys, "custom data healed and written back");
                    written = true;
                }
                Err(e) => {
                    let msg = format!("could not write healed custom data: {e:#}");
                    warn!("{msg}");
                    warnings.push(msg);
                }
            }
        }

        self.last_good = Some(healed.settings.clone());

        CycleSettings {
            settings: healed.settings,
            source: SettingsSource::Loaded,
            error: None,
            healed: written,
            warnings,
        }
    }
}
