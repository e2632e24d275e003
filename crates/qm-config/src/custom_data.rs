//! Custom-data blob: the operator-editable quota configuration.
//!
//! ```text
//! [general]
//! should_run=false
//!
//! [quotas]
//! SteelPlate=50
//! Computer=-1
//! ```
//!
//! Parsing is strict for the two known sections (a malformed line is a
//! [`ConfigParseError`] carrying its 1-based line number). Sections owned by
//! other scripts are kept verbatim and written back untouched.
//!
//! [`heal`] fills in every key the catalog expects but the blob lacks, and
//! renders the result so the caller can write it back. It never performs
//! the write itself.

use std::collections::BTreeSet;

use qm_reconcile::{Catalog, DispatchMode};
use serde::{Deserialize, Serialize};

use crate::CatalogDefinition;

pub const GENERAL_SECTION: &str = "general";
pub const QUOTAS_SECTION: &str = "quotas";
pub const SHOULD_RUN_KEY: &str = "should_run";

// ---------------------------------------------------------------------------
// Errors
// ---------------------------------------------------------------------------

/// Malformed custom data.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConfigParseError {
    /// 1-based line number.
    pub line: usize,
    pub reason: String,
}

impl ConfigParseError {
    fn at(line: usize, reason: impl Into<String>) -> Self {
        Self {
            line,
            reason: reason.into(),
        }
    }
}

impl std::fmt::Display for ConfigParseError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "custom data line {}: {}", self.line, self.reason)
    }
}

impl std::error::Error for ConfigParseError {}

// ---------------------------------------------------------------------------
// Parsed form
// ---------------------------------------------------------------------------

/// A section this module does not own, kept line for line.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct RawSection {
    pub name: String,
    pub lines: Vec<String>,
}

#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct CustomData {
    pub should_run: Option<bool>,
    /// `(subtype, minimum)` in file order.
    pub quotas: Vec<(String, i64)>,
    /// Other `[general]` keys, in file order.
    pub general_extra: Vec<(String, String)>,
    pub other_sections: Vec<RawSection>,
}

impl CustomData {
    pub fn quota(&self, subtype: &str) -> Option<i64> {
        self.quotas
            .iter()
            .find(|(k, _)| k == subtype)
            .map(|(_, v)| *v)
    }
}

enum Section {
    None,
    General,
    Quotas,
    Other(usize),
}

fn is_comment_or_blank(line: &str) -> bool {
    line.is_empty() || line.starts_with(';') || line.starts_with('#')
}

fn parse_bool(raw: &str) -> Option<bool> {
    match raw.trim().to_ascii_lowercase().as_str() {
        "true" | "yes" | "on" | "1" => Some(true),
        "false" | "no" | "off" | "0" => Some(false),
        _ => None,
    }
}

fn split_key_value(line_no: usize, line: &str) -> Result<(String, String), ConfigParseError> {
    let (k, v) = line
        .split_once('=')
        .ok_or_else(|| ConfigParseError::at(line_no, format!("expected key=value, got '{line}'")))?;
    let key = k.trim();
    if key.is_empty() {
        return Err(ConfigParseError::at(line_no, "empty key"));
    }
    Ok((key.to_string(), v.trim().to_string()))
}

/// Parse a custom-data blob.
pub fn parse_custom_data(text: &str) -> Result<CustomData, ConfigParseError> {
    let mut data = CustomData::default();
    let mut section = Section::None;
    let mut general_keys: BTreeSet<String> = BTreeSet::new();
    let mut quota_keys: BTreeSet<String> = BTreeSet::new();

    for (idx, raw_line) in text.lines().enumerate() {
        let line_no = idx + 1;
        let line = raw_line.trim();

        if line.starts_with('[') {
            let header = line
                .strip_prefix('[')
                .and_then(|l| l.strip_suffix(']'))
                .map(str::trim);
            let name = match (header, &section) {
                (Some(name), _) => name,
                // Foreign sections are not ours to validate.
                (None, Section::Other(pos)) => {
                    data.other_sections[*pos].lines.push(raw_line.to_string());
                    continue;
                }
                (None, _) => {
                    return Err(ConfigParseError::at(line_no, "unterminated section header"))
                }
            };
            if name.is_empty() {
                return Err(ConfigParseError::at(line_no, "empty section name"));
            }
            section = if name.eq_ignore_ascii_case(GENERAL_SECTION) {
                Section::General
            } else if name.eq_ignore_ascii_case(QUOTAS_SECTION) {
                Section::Quotas
            } else {
                let pos = data
                    .other_sections
                    .iter()
                    .position(|s| s.name == name)
                    .unwrap_or_else(|| {
                        data.other_sections.push(RawSection {
                            name: name.to_string(),
                            lines: Vec::new(),
                        });
                        data.other_sections.len() - 1
                    });
                Section::Other(pos)
            };
            continue;
        }

        if let Section::Other(pos) = section {
            if !line.is_empty() {
                data.other_sections[pos].lines.push(raw_line.to_string());
            }
            continue;
        }

        if is_comment_or_blank(line) {
            continue;
        }

        match section {
            Section::None => {
                return Err(ConfigParseError::at(line_no, "key outside of a section"));
            }
            Section::General => {
                let (key, value) = split_key_value(line_no, line)?;
                if !general_keys.insert(key.clone()) {
                    return Err(ConfigParseError::at(
                        line_no,
                        format!("duplicate key '{key}' in [{GENERAL_SECTION}]"),
                    ));
                }
                if key == SHOULD_RUN_KEY {
                    let flag = parse_bool(&value).ok_or_else(|| {
                        ConfigParseError::at(
                            line_no,
                            format!("{SHOULD_RUN_KEY} must be true or false, got '{value}'"),
                        )
                    })?;
                    data.should_run = Some(flag);
                } else {
                    data.general_extra.push((key, value));
                }
            }
            Section::Quotas => {
                let (key, value) = split_key_value(line_no, line)?;
                if !quota_keys.insert(key.clone()) {
                    return Err(ConfigParseError::at(
                        line_no,
                        format!("duplicate key '{key}' in [{QUOTAS_SECTION}]"),
                    ));
                }
                let minimum: i64 = value.parse().map_err(|_| {
                    ConfigParseError::at(
                        line_no,
                        format!("quota for '{key}' must be an integer, got '{value}'"),
                    )
                })?;
                data.quotas.push((key, minimum));
            }
            Section::Other(_) => {}
        }
    }

    Ok(data)
}

/// Render custom data in canonical layout: `[general]`, `[quotas]`, then any
/// foreign sections.
pub fn render_custom_data(data: &CustomData) -> String {
    let mut out = String::new();

    out.push_str(&format!("[{GENERAL_SECTION}]\n"));
    out.push_str(&format!(
        "{SHOULD_RUN_KEY}={}\n",
        data.should_run.unwrap_or(false)
    ));
    for (k, v) in &data.general_extra {
        out.push_str(&format!("{k}={v}\n"));
    }

    out.push_str(&format!("\n[{QUOTAS_SECTION}]\n"));
    for (k, v) in &data.quotas {
        out.push_str(&format!("{k}={v}\n"));
    }

    for section in &data.other_sections {
        out.push_str(&format!("\n[{}]\n", section.name));
        for line in &section.lines {
            out.push_str(line);
            out.push('\n');
        }
    }

    out
}

// ---------------------------------------------------------------------------
// Healing
// ---------------------------------------------------------------------------

/// Settings one reconciliation cycle runs with.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct QuotaSettings {
    pub should_run: bool,
    pub catalog: Catalog,
}

impl QuotaSettings {
    /// Dry-run with every item at its `default_minimum`.
    pub fn defaults(definition: &CatalogDefinition) -> Self {
        Self {
            should_run: false,
            catalog: definition.default_catalog(),
        }
    }

    pub fn dispatch_mode(&self) -> DispatchMode {
        DispatchMode::from_should_run(self.should_run)
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct HealedConfig {
    pub settings: QuotaSettings,
    pub data: CustomData,
    /// Canonical text for `data`.
    pub rendered: String,
    /// Keys that were missing and got defaulted (`[general]` keys are
    /// prefixed with the section name).
    pub added_keys: Vec<String>,
    /// Quota keys with no catalog item; kept in the blob, ignored otherwise.
    pub unknown_quota_keys: Vec<String>,
}

impl HealedConfig {
    /// `true` when the blob needs to be written back.
    pub fn changed(&self) -> bool {
        !self.added_keys.is_empty()
    }
}

/// Default every missing key and build the cycle settings.
///
/// Quotas are reordered to catalog order, unknown quota keys follow in
/// their original order.
pub fn heal(data: &CustomData, definition: &CatalogDefinition) -> HealedConfig {
    let mut healed = data.clone();
    let mut added_keys = Vec::new();

    if healed.should_run.is_none() {
        healed.should_run = Some(false);
        added_keys.push(format!("{GENERAL_SECTION}.{SHOULD_RUN_KEY}"));
    }

    let mut catalog = Catalog::empty();
    let mut quotas: Vec<(String, i64)> = Vec::with_capacity(definition.items.len());
    for item in &definition.items {
        let minimum = match data.quota(&item.subtype) {
            Some(m) => m,
            None => {
                added_keys.push(item.subtype.clone());
                item.default_minimum
            }
        };
        catalog.set_minimum(item.kind(), minimum);
        quotas.push((item.subtype.clone(), minimum));
    }

    let mut unknown_quota_keys = Vec::new();
    for (k, v) in &data.quotas {
        if definition.item_by_subtype(k).is_none() {
            unknown_quota_keys.push(k.clone());
            quotas.push((k.clone(), *v));
        }
    }
    healed.quotas = quotas;

    let rendered = render_custom_data(&healed);
    HealedConfig {
        settings: QuotaSettings {
            should_run: healed.should_run.unwrap_or(false),
            catalog,
        },
        data: healed,
        rendered,
        added_keys,
        unknown_quota_keys,
    }
}
