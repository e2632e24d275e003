use crate::{Catalog, QuantitySnapshot, QuotaLine, ReconcileReport};

/// Deficit for one kind: `minimum - (available + queued)`.
///
/// Saturating so a hostile snapshot cannot wrap the sign.
pub fn deficit(minimum: i64, available: i64, queued: i64) -> i64 {
    minimum.saturating_sub(available.saturating_add(queued))
}

/// Deterministic reconciliation:
/// - only tracked kinds (minimum >= 0) are reported
/// - kinds missing from a snapshot count as zero
/// - observed kinds outside the catalog are ignored
/// - output order follows [`crate::ItemKind`] ordering
pub fn reconcile(
    catalog: &Catalog,
    available: &QuantitySnapshot,
    queued: &QuantitySnapshot,
) -> ReconcileReport {
    // Catalog iteration is already ordered by kind (BTreeMap).
    let lines = catalog
        .tracked()
        .map(|(kind, minimum)| {
            let a = available.get(kind);
            let q = queued.get(kind);
            QuotaLine {
                kind: kind.clone(),
                minimum,
                available: a,
                queued: q,
                deficit: deficit(minimum, a, q),
            }
        })
        .collect();

    ReconcileReport { lines }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ItemKind;

    fn plate() -> ItemKind {
        ItemKind::new("Component", "SteelPlate")
    }

    #[test]
    fn deficit_is_minimum_minus_available_plus_queued() {
        assert_eq!(deficit(50, 20, 10), 20);
        assert_eq!(deficit(50, 60, 0), -10);
        assert_eq!(deficit(0, 0, 0), 0);
    }

    #[test]
    fn deficit_saturates_instead_of_wrapping() {
        assert_eq!(deficit(0, i64::MAX, i64::MAX), -i64::MAX);
        assert_eq!(deficit(i64::MAX, 0, 0), i64::MAX);
    }

    #[test]
    fn disabled_entry_is_not_reported() {
        let catalog = Catalog::empty()
            .with_minimum(plate(), -1)
            .with_minimum(ItemKind::new("Component", "Motor"), 3);
        let r = reconcile(&catalog, &QuantitySnapshot::empty(), &QuantitySnapshot::empty());
        assert_eq!(r.lines.len(), 1);
        assert_eq!(r.lines[0].kind.subtype, "Motor");
        assert_eq!(r.lines[0].deficit, 3);
    }

    #[test]
    fn unknown_observed_kind_is_ignored() {
        let catalog = Catalog::empty().with_minimum(plate(), 5);
        let available = QuantitySnapshot::empty().with(ItemKind::new("Ore", "Stone"), 900);
        let r = reconcile(&catalog, &available, &QuantitySnapshot::empty());
        assert_eq!(r.lines.len(), 1);
        assert_eq!(r.lines[0].available, 0);
    }
}
