//! `qm heal-config`: fill in missing custom-data keys.

use anyhow::{bail, Result};
use qm_config::{heal, parse_custom_data};
use qm_runtime::ConfigStore;

use super::{load_definition, FileConfigStore};

pub fn heal_config(path: &str, catalog_paths: &[String], check: bool) -> Result<()> {
    let definition = load_definition(catalog_paths)?;
    let mut store = FileConfigStore::new(path);

    let blob = store.load()?;
    let data = match parse_custom_data(&blob) {
        Ok(d) => d,
        Err(e) => bail!("CONFIG_INVALID: {e}"),
    };
    let healed = heal(&data, &definition);

    for key in &healed.unknown_quota_keys {
        println!("unknown_quota_key={key}");
    }

    if !healed.changed() {
        println!("custom_data_ok=true");
        return Ok(());
    }

    if check {
        bail!(
            "CONFIG_INCOMPLETE: missing keys: {}",
            healed.added_keys.join(", ")
        );
    }

    store.store(&healed.rendered)?;
    for key in &healed.added_keys {
        println!("added={key}");
    }
    println!("custom_data_healed=true");
    Ok(())
}
