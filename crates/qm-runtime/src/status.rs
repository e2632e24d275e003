//! Plain-text status readout for an in-game text panel.

use std::fmt::Write;

use crate::CycleOutcome;

/// One line per production candidate, then warnings.
///
/// ```text
/// SteelPlate: 50 min/20 avai/10 q'd->20 to add
/// ```
pub fn render_status(outcome: &CycleOutcome) -> String {
    let mut out = String::new();

    if let Some(err) = &outcome.config_error {
        let _ = writeln!(out, "CONFIG ERROR: {err}");
    }

    for line in outcome.report.candidates() {
        let _ = writeln!(
            out,
            "{}: {} min/{} avai/{} q'd->{} to add",
            line.kind.subtype, line.minimum, line.available, line.queued, line.deficit
        );
    }
    if outcome.report.is_fully_stocked() {
        let _ = writeln!(out, "All quotas met ({} tracked)", outcome.report.lines.len());
    }

    for kind in &outcome.plan.unqueueable {
        let _ = writeln!(out, "UNQUEUEABLE: {} (no blueprint)", kind.subtype);
    }
    for failed in &outcome.dispatch.failed {
        let _ = writeln!(
            out,
            "ENQUEUE FAILED: {} x{}: {}",
            failed.request.kind.subtype, failed.request.quantity, failed.error.reason
        );
    }
    for w in &outcome.warnings {
        let _ = writeln!(out, "WARNING: {w}");
    }

    if !outcome.mode().is_enabled() && !outcome.plan.requests.is_empty() {
        let _ = writeln!(
            out,
            "Dry run: {} request(s) not sent",
            outcome.dispatch.withheld.len()
        );
    }

    out
}
