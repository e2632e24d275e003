//! Production planning and the dispatch gate.
//!
//! Two steps, kept apart so the plan can be inspected (and rendered) even
//! when nothing is sent:
//!
//! 1. [`plan_production`] turns every production candidate into an
//!    [`EnqueueRequest`], or flags it unqueueable when its blueprint does not
//!    resolve.
//! 2. [`dispatch_plan`] sends the requests to a [`ProductionDispatcher`], but
//!    only in [`DispatchMode::Enabled`]. [`DispatchMode::DryRun`] is the
//!    default and never touches the dispatcher.

use serde::{Deserialize, Serialize};

use crate::{BlueprintId, BlueprintResolver, ItemKind, ReconcileReport};

// ---------------------------------------------------------------------------
// Plan
// ---------------------------------------------------------------------------

/// Request to enqueue `quantity` units of `blueprint`.
#[derive(Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub struct EnqueueRequest {
    pub kind: ItemKind,
    pub blueprint: BlueprintId,
    pub quantity: i64,
}

/// What one cycle would ask the production system for.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProductionPlan {
    /// In report order.
    pub requests: Vec<EnqueueRequest>,
    /// Candidates whose blueprint did not resolve; skipped, not fatal.
    pub unqueueable: Vec<ItemKind>,
}

impl ProductionPlan {
    pub fn is_empty(&self) -> bool {
        self.requests.is_empty() && self.unqueueable.is_empty()
    }
}

/// Build the production plan for a report.
pub fn plan_production(report: &ReconcileReport, resolver: &dyn BlueprintResolver) -> ProductionPlan {
    let mut plan = ProductionPlan::default();
    for line in report.candidates() {
        match resolver.resolve(&line.kind) {
            Some(blueprint) => plan.requests.push(EnqueueRequest {
                kind: line.kind.clone(),
                blueprint,
                quantity: line.deficit,
            }),
            None => plan.unqueueable.push(line.kind.clone()),
        }
    }
    plan
}

// ---------------------------------------------------------------------------
// Dispatch gate
// ---------------------------------------------------------------------------

/// Whether enqueue requests actually leave the process.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum DispatchMode {
    #[default]
    DryRun,
    Enabled,
}

impl DispatchMode {
    /// Maps the `should_run` configuration flag.
    pub fn from_should_run(should_run: bool) -> Self {
        if should_run {
            DispatchMode::Enabled
        } else {
            DispatchMode::DryRun
        }
    }

    pub fn is_enabled(&self) -> bool {
        matches!(self, DispatchMode::Enabled)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            DispatchMode::DryRun => "DRY_RUN",
            DispatchMode::Enabled => "ENABLED",
        }
    }
}

/// Error reported by an external production dispatcher.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct DispatchError {
    pub reason: String,
}

impl DispatchError {
    pub fn new(reason: impl Into<String>) -> Self {
        Self {
            reason: reason.into(),
        }
    }
}

impl std::fmt::Display for DispatchError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "production dispatch failed: {}", self.reason)
    }
}

impl std::error::Error for DispatchError {}

/// External production system (assembler queue).
pub trait ProductionDispatcher {
    fn enqueue(&mut self, request: &EnqueueRequest) -> Result<(), DispatchError>;
}

/// A request the dispatcher rejected.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct FailedRequest {
    pub request: EnqueueRequest,
    pub error: DispatchError,
}

/// Result of passing a plan through the gate.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DispatchOutcome {
    pub mode: DispatchMode,
    pub dispatched: Vec<EnqueueRequest>,
    /// Requests held back because the mode is dry-run.
    pub withheld: Vec<EnqueueRequest>,
    pub failed: Vec<FailedRequest>,
}

impl DispatchOutcome {
    pub fn has_failures(&self) -> bool {
        !self.failed.is_empty()
    }
}

/// Send `plan` through the dispatch gate.
///
/// - `DryRun`: every request is withheld; the dispatcher is never called.
/// - `Enabled`: requests go out in plan order; a failure is recorded and the
///   rest are still sent.
pub fn dispatch_plan(
    plan: &ProductionPlan,
    mode: DispatchMode,
    dispatcher: &mut dyn ProductionDispatcher,
) -> DispatchOutcome {
    let mut outcome = DispatchOutcome {
        mode,
        ..DispatchOutcome::default()
    };

    if !mode.is_enabled() {
        outcome.withheld = plan.requests.clone();
        return outcome;
    }

    for request in &plan.requests {
        match dispatcher.enqueue(request) {
            Ok(()) => outcome.dispatched.push(request.clone()),
            Err(error) => outcome.failed.push(FailedRequest {
                request: request.clone(),
                error,
            }),
        }
    }
    outcome
}
