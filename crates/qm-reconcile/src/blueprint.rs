//! Blueprint identity resolution.
//!
//! Production requests are addressed by blueprint, not by item. Most
//! component blueprints share the item's subtype name; a fixed set needs a
//! suffix (e.g. `Computer` -> `ComputerComponent`). The set is configuration
//! data, carried here as [`BlueprintRules`].
//!
//! Two directions are needed:
//! - item kind -> blueprint, when a deficit is turned into an enqueue request
//! - queue entry blueprint -> item kind, when queued quantities are counted

use std::collections::{BTreeMap, BTreeSet};
use std::fmt;

use serde::{Deserialize, Serialize};

use crate::{Catalog, ItemKind};

/// Host type id for assembler blueprints.
pub const DEFAULT_BLUEPRINT_TYPE: &str = "MyObjectBuilder_BlueprintDefinition";

/// Fully qualified blueprint identity.
#[derive(Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct BlueprintId {
    pub type_id: String,
    pub subtype: String,
}

impl BlueprintId {
    pub fn new(type_id: impl Into<String>, subtype: impl Into<String>) -> Self {
        Self {
            type_id: type_id.into(),
            subtype: subtype.into(),
        }
    }
}

impl fmt::Display for BlueprintId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.type_id, self.subtype)
    }
}

/// Strategy: item kind -> blueprint. `None` means the kind is unqueueable.
pub trait BlueprintResolver {
    fn resolve(&self, kind: &ItemKind) -> Option<BlueprintId>;
}

/// Strategy: production-queue entry blueprint subtype -> item kind.
pub trait QueueEntryNormalizer {
    fn normalize(&self, blueprint_subtype: &str) -> Option<ItemKind>;
}

/// Name-normalization rules, supplied by configuration.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct BlueprintRules {
    pub type_id: String,
    /// Suffix appended for subtypes listed in `suffixed`.
    pub suffix: String,
    /// Category assumed for queue entries that match no catalog blueprint.
    pub queue_category: String,
    pub suffixed: BTreeSet<String>,
}

impl Default for BlueprintRules {
    fn default() -> Self {
        Self {
            type_id: DEFAULT_BLUEPRINT_TYPE.to_string(),
            suffix: String::new(),
            queue_category: String::new(),
            suffixed: BTreeSet::new(),
        }
    }
}

impl BlueprintRules {
    fn blueprint_subtype(&self, subtype: &str) -> String {
        if self.suffixed.contains(subtype) {
            format!("{subtype}{}", self.suffix)
        } else {
            subtype.to_string()
        }
    }
}

/// Static two-way lookup table built from [`BlueprintRules`] and a set of
/// item kinds. Kinds that were never registered do not resolve.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct BlueprintTable {
    rules: BlueprintRules,
    forward: BTreeMap<ItemKind, BlueprintId>,
    reverse: BTreeMap<String, ItemKind>,
}

impl BlueprintTable {
    pub fn new(rules: BlueprintRules) -> Self {
        Self {
            rules,
            forward: BTreeMap::new(),
            reverse: BTreeMap::new(),
        }
    }

    /// Table covering every kind in `catalog` (tracked or not).
    pub fn for_catalog(rules: BlueprintRules, catalog: &Catalog) -> Self {
        let mut table = Self::new(rules);
        for kind in catalog.kinds() {
            table.register(kind.clone());
        }
        table
    }

    /// Register `kind` under the blueprint the rules derive for it.
    pub fn register(&mut self, kind: ItemKind) {
        let subtype = self.rules.blueprint_subtype(&kind.subtype);
        let id = BlueprintId::new(self.rules.type_id.clone(), subtype.clone());
        self.reverse.insert(subtype, kind.clone());
        self.forward.insert(kind, id);
    }

    /// Register `kind` under an explicit blueprint, bypassing the rules.
    pub fn register_explicit(&mut self, kind: ItemKind, blueprint: BlueprintId) {
        self.reverse.insert(blueprint.subtype.clone(), kind.clone());
        self.forward.insert(kind, blueprint);
    }

    pub fn rules(&self) -> &BlueprintRules {
        &self.rules
    }

    pub fn len(&self) -> usize {
        self.forward.len()
    }

    pub fn is_empty(&self) -> bool {
        self.forward.is_empty()
    }
}

impl BlueprintResolver for BlueprintTable {
    fn resolve(&self, kind: &ItemKind) -> Option<BlueprintId> {
        self.forward.get(kind).cloned()
    }
}

impl QueueEntryNormalizer for BlueprintTable {
    fn normalize(&self, blueprint_subtype: &str) -> Option<ItemKind> {
        let name = blueprint_subtype.trim();
        if name.is_empty() {
            return None;
        }
        if let Some(kind) = self.reverse.get(name) {
            return Some(kind.clone());
        }

        // Unregistered blueprint: strip the suffix and assume the queue category.
        let stripped = if self.rules.suffix.is_empty() {
            name
        } else {
            name.strip_suffix(self.rules.suffix.as_str()).unwrap_or(name)
        };
        if stripped.is_empty() || self.rules.queue_category.is_empty() {
            return None;
        }
        Some(ItemKind::new(self.rules.queue_category.clone(), stripped))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn rules() -> BlueprintRules {
        BlueprintRules {
            type_id: DEFAULT_BLUEPRINT_TYPE.to_string(),
            suffix: "Component".to_string(),
            queue_category: "Component".to_string(),
            suffixed: ["Computer", "Motor"].iter().map(|s| s.to_string()).collect(),
        }
    }

    fn table() -> BlueprintTable {
        let catalog = Catalog::empty()
            .with_minimum(ItemKind::new("Component", "Computer"), 10)
            .with_minimum(ItemKind::new("Component", "SteelPlate"), 10)
            .with_minimum(ItemKind::new("Component", "Motor"), -1);
        BlueprintTable::for_catalog(rules(), &catalog)
    }

    #[test]
    fn suffixed_subtype_gets_suffix() {
        let id = table()
            .resolve(&ItemKind::new("Component", "Computer"))
            .unwrap();
        assert_eq!(id.subtype, "ComputerComponent");
        assert_eq!(
            id.to_string(),
            "MyObjectBuilder_BlueprintDefinition/ComputerComponent"
        );
    }

    #[test]
    fn plain_subtype_maps_to_itself() {
        let id = table()
            .resolve(&ItemKind::new("Component", "SteelPlate"))
            .unwrap();
        assert_eq!(id.subtype, "SteelPlate");
    }

    #[test]
    fn unregistered_kind_does_not_resolve() {
        assert!(table()
            .resolve(&ItemKind::new("Component", "Superconductor"))
            .is_none());
    }

    #[test]
    fn queue_entry_reverse_lookup() {
        let t = table();
        assert_eq!(
            t.normalize("ComputerComponent"),
            Some(ItemKind::new("Component", "Computer"))
        );
        assert_eq!(
            t.normalize("SteelPlate"),
            Some(ItemKind::new("Component", "SteelPlate"))
        );
    }

    #[test]
    fn unregistered_queue_entry_strips_suffix() {
        assert_eq!(
            table().normalize("ThrustComponent"),
            Some(ItemKind::new("Component", "Thrust"))
        );
        assert_eq!(table().normalize("   "), None);
    }

    #[test]
    fn explicit_registration_overrides_rules() {
        let mut t = table();
        let kind = ItemKind::new("Ingot", "Iron");
        t.register_explicit(kind.clone(), BlueprintId::new("Custom", "IronIngotBp"));
        assert_eq!(t.resolve(&kind).unwrap().subtype, "IronIngotBp");
        assert_eq!(t.normalize("IronIngotBp"), Some(kind));
        assert_eq!(t.rules(), &rules(), "explicit entries leave the rules alone");
    }
}
