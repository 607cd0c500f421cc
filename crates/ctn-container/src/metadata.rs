//! Service metadata side table.
//!
//! Metadata is orthogonal to resolution: it is keyed by the name it was
//! attached under, so an alias and its target keep separate entries.

use std::collections::BTreeMap;

use ctn_common::error::{CtnError, Result};
use ctn_common::types::Value;

/// Name → key → ordered list of data arrays.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct MetaData {
    entries: BTreeMap<String, BTreeMap<String, Vec<Value>>>,
}

impl MetaData {
    /// Creates an empty table.
    #[must_use]
    pub const fn new() -> Self {
        Self {
            entries: BTreeMap::new(),
        }
    }

    /// Appends a data array under `name`/`key`.
    ///
    /// # Errors
    ///
    /// Returns an error if `data` is not an array.
    pub fn add(&mut self, name: &str, key: &str, data: Value) -> Result<()> {
        ensure_array(name, key, &data)?;
        self.entries
            .entry(name.to_string())
            .or_default()
            .entry(key.to_string())
            .or_default()
            .push(data);
        Ok(())
    }

    /// Replaces the whole list of data arrays under `name`/`key`.
    ///
    /// # Errors
    ///
    /// Returns an error if any item is not an array; the table is left
    /// untouched in that case.
    pub fn set(&mut self, name: &str, key: &str, data: Vec<Value>) -> Result<()> {
        for item in &data {
            ensure_array(name, key, item)?;
        }
        let _ = self
            .entries
            .entry(name.to_string())
            .or_default()
            .insert(key.to_string(), data);
        Ok(())
    }

    /// All metadata attached to `name`.
    #[must_use]
    pub fn for_name(&self, name: &str) -> BTreeMap<String, Vec<Value>> {
        self.entries.get(name).cloned().unwrap_or_default()
    }

    /// Data arrays attached to `name` under `key`.
    #[must_use]
    pub fn get(&self, name: &str, key: &str) -> Vec<Value> {
        self.entries
            .get(name)
            .and_then(|keys| keys.get(key))
            .cloned()
            .unwrap_or_default()
    }

    /// Every name carrying `key`, with its data arrays, sorted by name.
    #[must_use]
    pub fn names_with(&self, key: &str) -> Vec<(String, Vec<Value>)> {
        self.entries
            .iter()
            .filter_map(|(name, keys)| keys.get(key).map(|data| (name.clone(), data.clone())))
            .collect()
    }
}

fn ensure_array(name: &str, key: &str, data: &Value) -> Result<()> {
    if matches!(data, Value::Array(_)) {
        Ok(())
    } else {
        Err(CtnError::semantic(format!(
            "metadata \"{key}\" of \"{name}\" must be an array, got {}",
            data.type_name()
        )))
    }
}
