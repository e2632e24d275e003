//! Command handler modules for the `qm` binary.
//!
//! Shared file-backed plumbing lives here; command logic lives in the
//! submodules.

pub mod cycle;
pub mod heal;

use anyhow::{Context, Result};
use qm_config::{CatalogDefinition, LoadedConfig, DEFAULT_CATALOG_YAML};
use qm_reconcile::snapshot_adapter::{normalize_grid, GridState, RawGridState};
use qm_runtime::ConfigStore;
use std::fs;
use std::path::PathBuf;

// ---------------------------------------------------------------------------
// Catalog
// ---------------------------------------------------------------------------

/// Layered catalog YAML; the built-in catalog when `paths` is empty.
pub fn load_catalog_config(paths: &[String]) -> Result<LoadedConfig> {
    if paths.is_empty() {
        return qm_config::load_layered_yaml_from_strings(&[DEFAULT_CATALOG_YAML]);
    }
    let path_refs: Vec<&str> = paths.iter().map(|s| s.as_str()).collect();
    qm_config::load_layered_yaml(&path_refs)
}

pub fn load_definition(paths: &[String]) -> Result<CatalogDefinition> {
    let loaded = load_catalog_config(paths)?;
    let def = CatalogDefinition::from_loaded(&loaded)?;
    tracing::info!(
        config_hash = %loaded.config_hash,
        items = def.items.len(),
        "catalog loaded"
    );
    Ok(def)
}

// ---------------------------------------------------------------------------
// Grid state
// ---------------------------------------------------------------------------

pub fn read_grid(path: &str) -> Result<GridState> {
    let bytes = fs::read(path).with_context(|| format!("read grid failed: {path}"))?;
    let bytes = bytes.strip_prefix(&[0xEF, 0xBB, 0xBF]).unwrap_or(&bytes);
    let raw: RawGridState =
        serde_json::from_slice(bytes).context("grid file must contain valid grid-state JSON")?;
    let grid = normalize_grid(raw).context("grid state rejected")?;
    Ok(grid)
}

// ---------------------------------------------------------------------------
// Custom data file
// ---------------------------------------------------------------------------

/// Custom data kept in a plain text file. A missing file reads as empty so
/// the first cycle heals it into existence.
pub struct FileConfigStore {
    path: PathBuf,
}

impl FileConfigStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }
}

impl ConfigStore for FileConfigStore {
    fn load(&mut self) -> Result<String> {
        if !self.path.exists() {
            return Ok(String::new());
        }
        fs::read_to_string(&self.path)
            .with_context(|| format!("read custom data failed: {}", self.path.display()))
    }

    fn store(&mut self, blob: &str) -> Result<()> {
        fs::write(&self.path, blob)
            .with_context(|| format!("write custom data failed: {}", self.path.display()))
    }
}
