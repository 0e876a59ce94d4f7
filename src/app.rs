//! Assembles an extension registry from the application configuration.

use crate::config::AppConfig;
use plotkit_core::{DeviceError, DeviceResult};
use plotkit_device::builtin::register_builtins;
use plotkit_device::{ExtensionRegistry, ManifestLoadError, ManifestLoader};
use tracing::{info, warn};

/// Registry plus the loader that fed it.
#[derive(Debug, Default)]
pub struct Host {
    /// All registered declarations
    pub registry: ExtensionRegistry,
    /// Manifests discovered on the configured search paths
    pub loader: ManifestLoader,
}

/// Problems met while building a [`Host`]. None of them are fatal.
#[derive(Debug, Default)]
pub struct LoadReport {
    /// Files that could not be parsed or validated
    pub manifest_errors: Vec<ManifestLoadError>,
    /// Manifests the registry refused
    pub registration_errors: Vec<DeviceError>,
}

impl LoadReport {
    /// True when every manifest loaded and registered.
    #[must_use]
    pub fn is_clean(&self) -> bool {
        self.manifest_errors.is_empty() && self.registration_errors.is_empty()
    }
}

impl Host {
    /// Build a host from `config`.
    ///
    /// Built-ins are registered first, so a manifest reusing a built-in
    /// driver ID is reported as a duplicate rather than replacing it.
    pub fn from_config(config: &AppConfig) -> DeviceResult<(Self, LoadReport)> {
        let mut host = Host::default();
        let mut report = LoadReport::default();

        if config.builtins {
            register_builtins(&mut host.registry)?;
        }

        for path in &config.manifests.search_paths {
            host.loader.add_search_path(path.clone());
        }
        report.manifest_errors = host.loader.scan();
        for error in &report.manifest_errors {
            warn!(file = %error.file_path.display(), "{}", error.message);
        }

        report.registration_errors = host.loader.register_all(&mut host.registry);
        for error in &report.registration_errors {
            warn!(error = %error, "manifest not registered");
        }

        info!(
            drivers = host.registry.drivers().len(),
            protocols = host.registry.protocols().len(),
            transports = host.registry.transports().len(),
            "registry ready"
        );
        Ok((host, report))
    }
}
