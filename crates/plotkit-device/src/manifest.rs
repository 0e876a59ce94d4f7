//! Driver manifests loaded from TOML or YAML files.
//!
//! A manifest carries the serialisable half of a [`DeviceDriver`]. Factories
//! cannot be expressed in a file, so drivers loaded this way use the default
//! device and config-view factories.
//!
//! # Example Manifest
//!
//! ```toml
//! id = "acme.x1"
//! name = "Acme X1"
//! manufacturer = "Acme"
//! model = "X1"
//! width = "610mm"
//! protocols = ["hpgl", "dmpl"]
//! connections = ["serial", "printer"]
//!
//! [default_config]
//! speed = 10
//!
//! [default_config.connection.serial]
//! baudrate = 9600
//! ```
//!
//! # Search Path Priority
//!
//! Search paths are scanned in the order they were added. When the same
//! driver ID appears in several paths the earlier (higher-priority) path wins.
//! Convention: add user directories before builtin directories.

use crate::driver::DeviceDriver;
use crate::registry::ExtensionRegistry;
use figment::{
    providers::{Format, Toml},
    Figment,
};
use plotkit_core::{ConfigMap, DeclarationError, DeviceError, DeviceResult};
use serde::{Deserialize, Deserializer, Serialize};
use std::collections::HashMap;
use std::fmt;
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

/// Serialisable form of a driver declaration.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct DriverManifest {
    #[serde(default)]
    pub id: String,
    #[serde(default)]
    pub name: String,
    #[serde(default, deserialize_with = "text_or_number")]
    pub model: String,
    #[serde(default)]
    pub manufacturer: String,
    #[serde(default, deserialize_with = "text_or_number")]
    pub width: String,
    #[serde(default, deserialize_with = "text_or_number")]
    pub length: String,
    #[serde(default)]
    pub protocols: Vec<String>,
    #[serde(default)]
    pub connections: Vec<String>,
    #[serde(default)]
    pub default_config: ConfigMap,
}

/// Accepts `width = 610` as well as `width = "610mm"`. Blank means empty.
fn text_or_number<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Text {
        Str(String),
        Int(i64),
        Float(f64),
    }

    // A blank YAML value (`length:`) arrives as null
    Ok(match Option::<Text>::deserialize(deserializer)? {
        Some(Text::Str(s)) => s,
        Some(Text::Int(i)) => i.to_string(),
        Some(Text::Float(f)) => f.to_string(),
        None => String::new(),
    })
}

impl DriverManifest {
    /// Convert into a driver with default factories.
    pub fn into_driver(self) -> DeviceDriver {
        DeviceDriver::new(self.id)
            .with_name(self.name)
            .with_model(self.model)
            .with_manufacturer(self.manufacturer)
            .with_width(self.width)
            .with_length(self.length)
            .with_protocols(self.protocols)
            .with_connections(self.connections)
            .with_default_config(self.default_config)
    }

    /// Same checks as registration performs.
    pub fn validate(&self) -> Vec<DeclarationError> {
        self.clone().into_driver().validate()
    }

    /// The ID this manifest registers under.
    pub fn resolved_id(&self) -> Option<String> {
        self.clone().into_driver().resolved_id()
    }
}

impl From<&DeviceDriver> for DriverManifest {
    fn from(driver: &DeviceDriver) -> Self {
        Self {
            id: driver.id.clone(),
            name: driver.name.clone(),
            model: driver.model.clone(),
            manufacturer: driver.manufacturer.clone(),
            width: driver.width.clone(),
            length: driver.length.clone(),
            protocols: driver.protocols.clone(),
            connections: driver.connections.clone(),
            default_config: driver.default_config.clone(),
        }
    }
}

/// File formats a manifest can be written in.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ManifestFormat {
    Toml,
    Yaml,
}

impl ManifestFormat {
    /// Format for a path, based on its extension.
    pub fn from_path(path: &Path) -> Option<Self> {
        match path.extension().and_then(|e| e.to_str()) {
            Some("toml") => Some(Self::Toml),
            Some("yaml") | Some("yml") => Some(Self::Yaml),
            _ => None,
        }
    }
}

// =============================================================================
// Single-file loading
// =============================================================================

/// Parse and validate a manifest from a string.
pub fn load_driver_manifest_from_str(
    content: &str,
    format: ManifestFormat,
) -> DeviceResult<DriverManifest> {
    let manifest: DriverManifest = match format {
        ManifestFormat::Toml => Figment::new()
            .merge(Toml::string(content))
            .extract()
            .map_err(|e| DeviceError::Manifest(format!("Failed to parse TOML: {e}")))?,
        ManifestFormat::Yaml => parse_yaml(content)
            .map_err(|e| DeviceError::Manifest(format!("Failed to parse YAML: {e}")))?,
    };
    check_manifest(&manifest)?;
    Ok(manifest)
}

/// Load and validate a manifest file. The format follows the extension.
pub fn load_driver_manifest(path: &Path) -> DeviceResult<DriverManifest> {
    if !path.exists() {
        return Err(DeviceError::Manifest(format!(
            "Manifest file not found: {}",
            path.display()
        )));
    }
    let format = ManifestFormat::from_path(path).ok_or_else(|| {
        DeviceError::Manifest(format!("Unsupported manifest format: {}", path.display()))
    })?;

    debug!("Loading driver manifest from: {}", path.display());

    let manifest: DriverManifest = match format {
        ManifestFormat::Toml => Figment::new()
            .merge(Toml::file(path))
            .extract()
            .map_err(|e| DeviceError::Manifest(format!("{}: {e}", path.display())))?,
        ManifestFormat::Yaml => {
            let content = std::fs::read_to_string(path)?;
            parse_yaml(&content)
                .map_err(|e| DeviceError::Manifest(format!("{}: {e}", path.display())))?
        }
    };
    check_manifest(&manifest)?;
    Ok(manifest)
}

/// Parses YAML, dropping blank (null) values first.
///
/// TOML has no null, so a blank key is treated as unset: top-level fields
/// fall back to their defaults and blank `default_config` entries are left
/// out of the config.
fn parse_yaml(content: &str) -> Result<DriverManifest, serde_yaml::Error> {
    let mut value: serde_yaml::Value = serde_yaml::from_str(content)?;
    strip_nulls(&mut value, "");
    serde_yaml::from_value(value)
}

fn strip_nulls(value: &mut serde_yaml::Value, path: &str) {
    match value {
        serde_yaml::Value::Mapping(map) => {
            map.retain(|key, v| {
                if v.is_null() {
                    debug!(key = ?key, parent = path, "dropping blank manifest value");
                    false
                } else {
                    true
                }
            });
            for (key, v) in map.iter_mut() {
                let key = key.as_str().map(str::to_owned).unwrap_or_default();
                let child = if path.is_empty() {
                    key
                } else {
                    format!("{path}.{key}")
                };
                strip_nulls(v, &child);
            }
        }
        serde_yaml::Value::Sequence(items) => {
            items.retain(|v| !v.is_null());
            for v in items.iter_mut() {
                strip_nulls(v, path);
            }
        }
        _ => {}
    }
}

fn check_manifest(manifest: &DriverManifest) -> DeviceResult<()> {
    let errors = manifest.validate();
    if errors.is_empty() {
        return Ok(());
    }
    Err(DeviceError::InvalidDeclaration {
        point: crate::extension::DEVICE_DRIVER_POINT,
        id: manifest.resolved_id().unwrap_or_default(),
        errors,
    })
}

// =============================================================================
// Directory scanning
// =============================================================================

/// Error that occurred while loading one manifest file.
#[derive(Debug, Clone)]
pub struct ManifestLoadError {
    pub file_path: PathBuf,
    pub message: String,
    pub validation_errors: Vec<DeclarationError>,
}

impl fmt::Display for ManifestLoadError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.file_path.display(), self.message)?;
        for err in &self.validation_errors {
            write!(f, "\n  - {}", err)?;
        }
        Ok(())
    }
}

impl std::error::Error for ManifestLoadError {}

impl ManifestLoadError {
    fn new(path: &Path, message: impl Into<String>) -> Self {
        Self {
            file_path: path.to_path_buf(),
            message: message.into(),
            validation_errors: Vec::new(),
        }
    }

    fn from_device_error(path: &Path, err: DeviceError) -> Self {
        match err {
            DeviceError::InvalidDeclaration { errors, .. } => Self {
                file_path: path.to_path_buf(),
                message: format!("Validation failed with {} error(s)", errors.len()),
                validation_errors: errors,
            },
            other => Self::new(path, other.to_string()),
        }
    }
}

/// A loaded manifest with its source information.
#[derive(Debug, Clone)]
pub struct ManifestEntry {
    pub manifest: DriverManifest,
    pub source_path: PathBuf,
    /// Lower is higher priority; equals the index of the search path
    pub priority: u32,
    /// Set once [`ManifestLoader::register_all`] registered this driver
    pub registered: bool,
}

/// Scans search paths for driver manifests.
#[derive(Debug, Default)]
pub struct ManifestLoader {
    entries: HashMap<String, ManifestEntry>,
    search_paths: Vec<PathBuf>,
}

impl ManifestLoader {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a search path. Paths added first have higher priority.
    pub fn add_search_path<P: Into<PathBuf>>(&mut self, path: P) {
        self.search_paths.push(path.into());
    }

    pub fn search_paths(&self) -> &[PathBuf] {
        &self.search_paths
    }

    /// Scans every search path and loads manifests.
    ///
    /// Returns the per-file errors; valid manifests are still loaded.
    pub fn scan(&mut self) -> Vec<ManifestLoadError> {
        let mut errors = Vec::new();
        let paths: Vec<_> = self.search_paths.iter().cloned().enumerate().collect();
        for (priority, path) in paths {
            errors.extend(self.scan_directory(&path, priority as u32));
        }
        errors
    }

    /// Clears loaded manifests and scans again.
    pub fn reload(&mut self) -> Vec<ManifestLoadError> {
        self.entries.clear();
        self.scan()
    }

    fn scan_directory(&mut self, path: &Path, priority: u32) -> Vec<ManifestLoadError> {
        let mut errors = Vec::new();

        if !path.exists() {
            // Missing search paths are not an error
            debug!("Manifest path does not exist: {}", path.display());
            return errors;
        }

        if !path.is_dir() {
            errors.push(ManifestLoadError::new(path, "Not a directory"));
            return errors;
        }

        let entries = match std::fs::read_dir(path) {
            Ok(entries) => entries,
            Err(e) => {
                errors.push(ManifestLoadError::new(
                    path,
                    format!("Failed to read directory: {e}"),
                ));
                return errors;
            }
        };

        // Sorted so that duplicate IDs inside one directory resolve the same way every run
        let mut files: Vec<PathBuf> = entries
            .filter_map(|entry| entry.ok().map(|e| e.path()))
            .filter(|p| p.is_file() && ManifestFormat::from_path(p).is_some())
            .collect();
        files.sort();

        for file in files {
            if let Err(e) = self.load_single(&file, priority) {
                warn!("Skipping manifest: {}", e);
                errors.push(e);
            }
        }

        errors
    }

    fn load_single(&mut self, path: &Path, priority: u32) -> Result<(), ManifestLoadError> {
        let manifest = load_driver_manifest(path)
            .map_err(|e| ManifestLoadError::from_device_error(path, e))?;
        let id = manifest
            .resolved_id()
            .ok_or_else(|| ManifestLoadError::new(path, "Manifest has no id"))?;

        if let Some(existing) = self.entries.get(&id) {
            if existing.priority <= priority {
                debug!(
                    "Skipping driver '{}' from {} (already loaded from {})",
                    id,
                    path.display(),
                    existing.source_path.display()
                );
                return Ok(());
            }
            info!(
                "Overriding driver '{}' from {} with version from {}",
                id,
                existing.source_path.display(),
                path.display()
            );
        }

        info!("Loaded driver manifest: {} ({})", id, path.display());
        self.entries.insert(
            id,
            ManifestEntry {
                manifest,
                source_path: path.to_path_buf(),
                priority,
                registered: false,
            },
        );
        Ok(())
    }

    /// Loaded entries, sorted by driver ID.
    pub fn list(&self) -> Vec<&ManifestEntry> {
        let mut entries: Vec<(&String, &ManifestEntry)> = self.entries.iter().collect();
        entries.sort_by(|a, b| a.0.cmp(b.0));
        entries.into_iter().map(|(_, e)| e).collect()
    }

    pub fn get(&self, id: &str) -> Option<&ManifestEntry> {
        self.entries.get(id)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Registers every loaded manifest as a driver.
    ///
    /// Registration failures (e.g. an ID already registered in code) are
    /// logged and returned; the remaining manifests are still registered.
    pub fn register_all(&mut self, registry: &mut ExtensionRegistry) -> Vec<DeviceError> {
        let mut errors = Vec::new();
        let mut ids: Vec<String> = self.entries.keys().cloned().collect();
        ids.sort();

        for id in ids {
            let Some(entry) = self.entries.get_mut(&id) else {
                continue;
            };
            match registry.register_driver(entry.manifest.clone().into_driver()) {
                Ok(_) => entry.registered = true,
                Err(e) => {
                    warn!(
                        "Failed to register driver from {}: {}",
                        entry.source_path.display(),
                        e
                    );
                    errors.push(e);
                }
            }
        }
        errors
    }

    /// Source file of a driver that was registered from a manifest.
    pub fn registered_source(&self, id: &str) -> Option<&Path> {
        self.entries
            .get(id)
            .filter(|e| e.registered)
            .map(|e| e.source_path.as_path())
    }
}
