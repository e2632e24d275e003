//! qm-config
//!
//! Two configuration surfaces:
//! - the catalog definition: layered YAML (tracked items + blueprint rules),
//!   merged, canonicalized and hashed so a running monitor can log exactly
//!   which catalog it was built from
//! - the custom-data blob: the per-block `[general]` / `[quotas]` text the
//!   operator edits in-game (see [`custom_data`])

use anyhow::{bail, Context, Result};
use qm_reconcile::{BlueprintRules, BlueprintTable, Catalog, ItemKind};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use sha2::{Digest, Sha256};
use std::collections::{BTreeMap, BTreeSet};
use std::fs;

pub mod custom_data;

pub use custom_data::{
    heal, parse_custom_data, render_custom_data, ConfigParseError, CustomData, HealedConfig,
    QuotaSettings, GENERAL_SECTION, QUOTAS_SECTION, SHOULD_RUN_KEY,
};

/// Built-in component catalog (the table the in-game script shipped with).
pub const DEFAULT_CATALOG_YAML: &str = include_str!("../defaults/catalog.yaml");

// ---------------------------------------------------------------------------
// Layered YAML
// ---------------------------------------------------------------------------

#[derive(Debug, Clone)]
pub struct LoadedConfig {
    pub config_hash: String,
    pub canonical_json: String,
    pub config_json: Value,
}

pub fn load_layered_yaml(paths: &[&str]) -> Result<LoadedConfig> {
    let mut docs: Vec<String> = Vec::new();
    for p in paths {
        let raw =
            fs::read_to_string(p).with_context(|| format!("failed to read yaml path: {p}"))?;
        docs.push(raw);
    }

    let doc_refs: Vec<&str> = docs.iter().map(|s| s.as_str()).collect();
    load_layered_yaml_from_strings(&doc_refs)
}

pub fn load_layered_yaml_from_strings(yaml_docs: &[&str]) -> Result<LoadedConfig> {
    // Earlier docs are base, later docs override.
    let mut merged = serde_json::json!({});
    for raw in yaml_docs {
        let v_yaml: serde_yaml::Value = serde_yaml::from_str(raw).context("invalid yaml")?;
        let v_json = serde_json::to_value(v_yaml).context("yaml->json conversion failed")?;
        merged = deep_merge(merged, v_json);
    }

    let canonical_json = canonicalize_json(&merged)?;
    let config_hash = sha256_hex(canonical_json.as_bytes());
    Ok(LoadedConfig {
        config_hash,
        canonical_json,
        config_json: merged,
    })
}

fn deep_merge(a: Value, b: Value) -> Value {
    match (a, b) {
        (Value::Object(mut a_map), Value::Object(b_map)) => {
            for (k, b_val) in b_map {
                let a_val = a_map.remove(&k).unwrap_or(Value::Null);
                a_map.insert(k, deep_merge(a_val, b_val));
            }
            Value::Object(a_map)
        }
        (_, b_other) => b_other,
    }
}

/// Serialize with object keys sorted at every level, so key order in the
/// source YAML never changes the hash.
fn canonicalize_json(v: &Value) -> Result<String> {
    let sorted = sort_keys(v);
    serde_json::to_string(&sorted).context("canonical json serialize failed")
}

fn sort_keys(v: &Value) -> Value {
    match v {
        Value::Object(map) => {
            let ordered: BTreeMap<&String, Value> =
                map.iter().map(|(k, vv)| (k, sort_keys(vv))).collect();
            let mut out = serde_json::Map::new();
            for (k, vv) in ordered {
                out.insert(k.clone(), vv);
            }
            Value::Object(out)
        }
        Value::Array(arr) => Value::Array(arr.iter().map(sort_keys).collect()),
        other => other.clone(),
    }
}

fn sha256_hex(bytes: &[u8]) -> String {
    let mut hasher = Sha256::new();
    hasher.update(bytes);
    hex::encode(hasher.finalize())
}

// ---------------------------------------------------------------------------
// Catalog definition
// ---------------------------------------------------------------------------

fn default_type_id() -> String {
    qm_reconcile::DEFAULT_BLUEPRINT_TYPE.to_string()
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BlueprintSection {
    #[serde(default = "default_type_id")]
    pub type_id: String,
    #[serde(default)]
    pub suffix: String,
    #[serde(default)]
    pub queue_category: String,
    #[serde(default)]
    pub suffixed: Vec<String>,
}

impl Default for BlueprintSection {
    fn default() -> Self {
        Self {
            type_id: default_type_id(),
            suffix: String::new(),
            queue_category: String::new(),
            suffixed: Vec::new(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ItemDefinition {
    pub category: String,
    pub subtype: String,
    /// Written into custom data when the quota key is missing.
    #[serde(default)]
    pub default_minimum: i64,
}

impl ItemDefinition {
    pub fn kind(&self) -> ItemKind {
        ItemKind::new(self.category.clone(), self.subtype.clone())
    }
}

/// Tracked items and blueprint rules, as loaded from the catalog YAML.
///
/// Items keep their YAML order; that order is the order quotas are written
/// back into custom data.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CatalogDefinition {
    #[serde(default)]
    pub blueprints: BlueprintSection,
    #[serde(default)]
    pub items: Vec<ItemDefinition>,
}

impl CatalogDefinition {
    /// Build from the merged config JSON (produced by the layered loader).
    pub fn from_loaded(loaded: &LoadedConfig) -> Result<Self> {
        let def: CatalogDefinition = serde_json::from_value(loaded.config_json.clone())
            .context("catalog config does not match the expected shape")?;
        def.validate()?;
        Ok(def)
    }

    /// The built-in catalog.
    pub fn builtin() -> Result<Self> {
        let loaded = load_layered_yaml_from_strings(&[DEFAULT_CATALOG_YAML])?;
        Self::from_loaded(&loaded)
    }

    /// Rejects empty identities and duplicate subtypes (custom data keys
    /// quotas by subtype name, so subtypes must be unique).
    pub fn validate(&self) -> Result<()> {
        let mut seen: BTreeSet<&str> = BTreeSet::new();
        for (i, item) in self.items.iter().enumerate() {
            if item.category.trim().is_empty() || item.subtype.trim().is_empty() {
                bail!("CATALOG_INVALID: item #{i} has empty category or subtype");
            }
            if item.subtype.contains(&['=', '[', ']'][..]) {
                bail!(
                    "CATALOG_INVALID: item subtype '{}' cannot be used as a custom data key",
                    item.subtype
                );
            }
            if !seen.insert(item.subtype.as_str()) {
                bail!("CATALOG_INVALID: duplicate subtype '{}'", item.subtype);
            }
        }
        Ok(())
    }

    pub fn item_by_subtype(&self, subtype: &str) -> Option<&ItemDefinition> {
        self.items.iter().find(|i| i.subtype == subtype)
    }

    pub fn blueprint_rules(&self) -> BlueprintRules {
        BlueprintRules {
            type_id: self.blueprints.type_id.clone(),
            suffix: self.blueprints.suffix.clone(),
            queue_category: self.blueprints.queue_category.clone(),
            suffixed: self.blueprints.suffixed.iter().cloned().collect(),
        }
    }

    /// Catalog seeded with every item's `default_minimum`.
    pub fn default_catalog(&self) -> Catalog {
        let mut catalog = Catalog::empty();
        for item in &self.items {
            catalog.set_minimum(item.kind(), item.default_minimum);
        }
        catalog
    }

    /// Blueprint table covering every defined item.
    pub fn blueprint_table(&self) -> BlueprintTable {
        BlueprintTable::for_catalog(self.blueprint_rules(), &self.default_catalog())
    }
}
