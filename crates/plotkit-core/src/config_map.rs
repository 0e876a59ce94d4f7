//! Nested configuration mappings.
//!
//! Driver defaults are stored as a TOML table so they can be written by hand
//! in manifests and sliced by key at runtime. Every helper here returns an
//! owned copy; the source table is never modified.

use toml::Value;

/// String-keyed configuration mapping.
pub type ConfigMap = toml::Table;

/// Returns a copy of the table stored under `key`.
///
/// Missing keys and non-table values both yield an empty map.
pub fn sub_table(map: &ConfigMap, key: &str) -> ConfigMap {
    match map.get(key) {
        Some(Value::Table(table)) => table.clone(),
        Some(other) => {
            tracing::debug!(
                key,
                kind = other.type_str(),
                "config key is not a table, using empty mapping"
            );
            ConfigMap::new()
        }
        None => ConfigMap::new(),
    }
}

/// Returns a copy of the table at `section.id`.
pub fn nested_table(map: &ConfigMap, section: &str, id: &str) -> ConfigMap {
    match map.get(section) {
        Some(Value::Table(table)) => sub_table(table, id),
        _ => ConfigMap::new(),
    }
}

/// Returns a copy of `map` with `keys` removed.
pub fn without_keys(map: &ConfigMap, keys: &[&str]) -> ConfigMap {
    map.iter()
        .filter(|(k, _)| !keys.contains(&k.as_str()))
        .map(|(k, v)| (k.clone(), v.clone()))
        .collect()
}
