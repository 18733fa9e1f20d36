//! Node configuration: layered YAML loading with a canonical hash, the
//! settlement account binding, and validator name / node-id resolution.

use std::collections::BTreeMap;
use std::fs;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use serde_json::map::Entry;
use serde_json::Value;
use sha2::{Digest, Sha256};

use setl_schemas::AccountId;

// ---------------------------------------------------------------------------
// Config
// ---------------------------------------------------------------------------

/// Typed view of the merged configuration document.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Config {
    /// The only account allowed to originate settlement operations.
    #[serde(rename = "SETTLEMENT_ACC_ID", default)]
    pub settlement_acc_id: Option<AccountId>,

    /// Known validator keys mapped to their human aliases; drives `$name`
    /// and `@prefix` resolution.
    #[serde(rename = "VALIDATOR_NAMES", default)]
    pub validator_names: BTreeMap<String, String>,
}

impl Config {
    /// Resolve a node-id reference to a concrete account key.
    ///
    /// Accepted forms:
    /// - `@PREFIX` — unique upper-case prefix of a known validator key.
    ///   Ambiguous or unknown prefixes resolve to nothing.
    /// - `$alias` — exact, case-sensitive alias lookup.
    /// - a bare 56-character upper-case node key, accepted when
    ///   syntactically valid even if unknown.
    ///
    /// Everything else, including lower-case input and signer-type keys,
    /// resolves to nothing.
    pub fn resolve_node_id(&self, input: &str) -> Option<AccountId> {
        if let Some(prefix) = input.strip_prefix('@') {
            if prefix.is_empty() {
                return None;
            }
            let mut matches = self
                .validator_names
                .keys()
                .filter(|key| key.starts_with(prefix));
            let first = matches.next()?;
            if matches.next().is_some() {
                return None;
            }
            return Some(AccountId::new(first.clone()));
        }

        if let Some(alias) = input.strip_prefix('$') {
            return self
                .validator_names
                .iter()
                .find(|(_, name)| name.as_str() == alias)
                .map(|(key, _)| AccountId::new(key.clone()));
        }

        if input.is_empty() {
            return None;
        }
        let id = AccountId::new(input);
        if id.is_well_formed() {
            Some(id)
        } else {
            None
        }
    }
}

// ---------------------------------------------------------------------------
// Layered loading
// ---------------------------------------------------------------------------

/// The merged document, its canonical rendering, and the typed view.
#[derive(Debug, Clone)]
pub struct LoadedConfig {
    pub config: Config,
    pub config_json: Value,
    pub canonical_json: String,
    pub config_hash: String,
}

/// Assemble the node configuration from YAML layers, first file to last.
///
/// Each layer folds into the document with [`overlay`] semantics, the
/// result is rendered canonically and hashed, and the document is checked
/// against the typed [`Config`] schema.
pub fn load_layered_config(paths: &[&str]) -> Result<LoadedConfig> {
    let mut document = Value::Object(serde_json::Map::new());
    for path in paths {
        overlay(&mut document, read_layer(path)?);
    }

    let canonical = canonical_text(&document);
    let config_hash = hex::encode(Sha256::digest(canonical.as_bytes()));
    let config: Config =
        serde_json::from_value(document.clone()).context("config does not match schema")?;

    Ok(LoadedConfig {
        config,
        config_json: document,
        canonical_json: canonical,
        config_hash,
    })
}

/// One YAML layer, parsed into the document value model.
fn read_layer(path: &str) -> Result<Value> {
    let raw = fs::read_to_string(path).with_context(|| format!("read config layer: {path}"))?;
    let parsed: serde_yaml::Value =
        serde_yaml::from_str(&raw).with_context(|| format!("parse config layer: {path}"))?;
    serde_json::to_value(parsed).with_context(|| format!("unsupported value in layer: {path}"))
}

/// Fold a later layer into the document.
///
/// Table sections merge entry by entry, so an overlay file can add
/// validator names without restating the whole `VALIDATOR_NAMES` table.
/// Scalar bindings such as `SETTLEMENT_ACC_ID` are replaced outright, and
/// lists are replaced whole, never merged element-wise.
fn overlay(document: &mut Value, layer: Value) {
    match (document, layer) {
        (Value::Object(section), Value::Object(incoming)) => {
            for (key, value) in incoming {
                match section.entry(key) {
                    Entry::Occupied(mut existing) => overlay(existing.get_mut(), value),
                    Entry::Vacant(slot) => {
                        slot.insert(value);
                    }
                }
            }
        }
        (binding, value) => *binding = value,
    }
}

/// Canonical rendering of the merged document: compact JSON with object
/// keys in lexicographic order at every depth. The config hash is taken
/// over exactly these bytes, so two files spelling the same settlement
/// configuration in different key order hash identically.
fn canonical_text(document: &Value) -> String {
    let mut out = String::new();
    write_canonical(document, &mut out);
    out
}

fn write_canonical(value: &Value, out: &mut String) {
    match value {
        Value::Object(section) => {
            let mut entries: Vec<(&String, &Value)> = section.iter().collect();
            entries.sort_by(|a, b| a.0.cmp(b.0));
            out.push('{');
            for (i, (key, child)) in entries.into_iter().enumerate() {
                if i > 0 {
                    out.push(',');
                }
                let rendered_key =
                    serde_json::to_string(key).expect("string keys render as json");
                out.push_str(&rendered_key);
                out.push(':');
                write_canonical(child, out);
            }
            out.push('}');
        }
        Value::Array(items) => {
            out.push('[');
            for (i, item) in items.iter().enumerate() {
                if i > 0 {
                    out.push(',');
                }
                write_canonical(item, out);
            }
            out.push(']');
        }
        scalar => {
            let rendered =
                serde_json::to_string(scalar).expect("scalar json rendering is infallible");
            out.push_str(&rendered);
        }
    }
}

// ---------------------------------------------------------------------------
// Unit tests
// ---------------------------------------------------------------------------
