//! Device driver declarations.
//!
//! A [`DeviceDriver`] describes a device family: who makes it, how big the
//! cutting area is, which protocols and transports it can talk over, and
//! the default configuration for the device, its jobs and each protocol and
//! transport it supports.
//!
//! # Default configuration layout
//!
//! ```toml
//! speed = 10              # device-level keys
//! force = 80
//!
//! [job]                   # job defaults
//! copies = 1
//!
//! [connection.serial]     # keyed by transport id
//! baudrate = 9600
//!
//! [protocol.hpgl]         # keyed by protocol id
//! scale = 40
//! ```
//!
//! # Example
//!
//! ```rust,ignore
//! use plotkit_device::DeviceDriver;
//!
//! let driver = DeviceDriver::new("acme.x1")
//!     .with_manufacturer("Acme")
//!     .with_width("610mm")
//!     .with_protocols(["hpgl"])
//!     .with_connections(["serial"]);
//!
//! let serial = driver.get_connection_config("serial");
//! ```

use crate::extension::DEVICE_DRIVER_POINT;
use crate::runtime::{Device, GenericDevice};
use crate::view::{default_config_view_factory, ConfigView, ConfigViewFactory};
use plotkit_core::config_map::{nested_table, sub_table, without_keys};
use plotkit_core::{ConfigMap, DeclarationError, DeviceError, DeviceResult};
use std::fmt;
use std::sync::Arc;

/// Section of the default config holding per-transport mappings.
pub const CONNECTION_KEY: &str = "connection";
/// Section of the default config holding per-protocol mappings.
pub const PROTOCOL_KEY: &str = "protocol";
/// Section of the default config holding job defaults.
pub const JOB_KEY: &str = "job";

/// Factory that builds the runtime device for a driver.
pub type DeviceFactory = Arc<dyn Fn(&DeviceDriver) -> DeviceResult<Box<dyn Device>> + Send + Sync>;

/// Factory used when a driver does not supply its own.
pub fn default_device_factory() -> DeviceFactory {
    Arc::new(|driver: &DeviceDriver| -> DeviceResult<Box<dyn Device>> {
        Ok(Box::new(GenericDevice::new(driver.id.clone())))
    })
}

/// Meta information about a device family.
#[derive(Clone)]
pub struct DeviceDriver {
    /// ID of the device. When empty, derived as `manufacturer.model`.
    pub id: String,
    pub name: String,
    pub model: String,
    pub manufacturer: String,
    /// Width of the cutting area (required)
    pub width: String,
    /// Length of the cutting area; empty for roll-fed devices
    pub length: String,
    /// Builds the runtime device
    pub factory: DeviceFactory,
    /// Supported protocol IDs
    pub protocols: Vec<String>,
    /// Supported transport IDs
    pub connections: Vec<String>,
    /// Builds the configuration editor view
    pub config_view: ConfigViewFactory,
    /// Nested defaults, see the module docs for the layout
    pub default_config: ConfigMap,
}

impl DeviceDriver {
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            ..Self::default()
        }
    }

    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }

    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        self.model = model.into();
        self
    }

    pub fn with_manufacturer(mut self, manufacturer: impl Into<String>) -> Self {
        self.manufacturer = manufacturer.into();
        self
    }

    pub fn with_width(mut self, width: impl Into<String>) -> Self {
        self.width = width.into();
        self
    }

    pub fn with_length(mut self, length: impl Into<String>) -> Self {
        self.length = length.into();
        self
    }

    pub fn with_factory(mut self, factory: DeviceFactory) -> Self {
        self.factory = factory;
        self
    }

    pub fn with_protocols<I, S>(mut self, protocols: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.protocols = protocols.into_iter().map(Into::into).collect();
        self
    }

    pub fn with_connections<I, S>(mut self, connections: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.connections = connections.into_iter().map(Into::into).collect();
        self
    }

    pub fn with_config_view(mut self, config_view: ConfigViewFactory) -> Self {
        self.config_view = config_view;
        self
    }

    pub fn with_default_config(mut self, default_config: ConfigMap) -> Self {
        self.default_config = default_config;
        self
    }

    // =========================================================================
    // Config accessors
    // =========================================================================

    /// Device-level defaults: the default config without the `connection`,
    /// `protocol` and `job` sections.
    pub fn get_device_config(&self) -> ConfigMap {
        without_keys(
            &self.default_config,
            &[CONNECTION_KEY, PROTOCOL_KEY, JOB_KEY],
        )
    }

    /// Copy of the `job` section, or an empty map.
    pub fn get_job_config(&self) -> ConfigMap {
        sub_table(&self.default_config, JOB_KEY)
    }

    /// Defaults for the transport `id`, or an empty map.
    pub fn get_connection_config(&self, id: &str) -> ConfigMap {
        nested_table(&self.default_config, CONNECTION_KEY, id)
    }

    /// Defaults for the protocol `id`, or an empty map.
    pub fn get_protocol_config(&self, id: &str) -> ConfigMap {
        nested_table(&self.default_config, PROTOCOL_KEY, id)
    }

    // =========================================================================
    // Identity and validation
    // =========================================================================

    /// The ID this driver registers under.
    ///
    /// Returns the explicit `id` when set, otherwise `manufacturer.model`
    /// built from whichever of the two are non-empty.
    pub fn resolved_id(&self) -> Option<String> {
        let id = self.id.trim();
        if !id.is_empty() {
            return Some(id.to_string());
        }
        let parts: Vec<&str> = [self.manufacturer.trim(), self.model.trim()]
            .into_iter()
            .filter(|p| !p.is_empty())
            .collect();
        if parts.is_empty() {
            None
        } else {
            Some(parts.join("."))
        }
    }

    /// Display name, falling back to the resolved ID.
    pub fn display_name(&self) -> String {
        if !self.name.is_empty() {
            return self.name.clone();
        }
        self.resolved_id().unwrap_or_default()
    }

    /// Checks the declaration and returns every problem found.
    pub fn validate(&self) -> Vec<DeclarationError> {
        let mut errors = Vec::new();

        if self.resolved_id().is_none() {
            errors.push(DeclarationError::new(
                "id",
                "id is empty and cannot be derived from manufacturer/model",
            ));
        }

        if self.width.trim().is_empty() {
            errors.push(DeclarationError::new("width", "width is required"));
        }

        validate_id_list(&self.protocols, "protocols", &mut errors);
        validate_id_list(&self.connections, "connections", &mut errors);

        for section in [CONNECTION_KEY, PROTOCOL_KEY, JOB_KEY] {
            if let Some(value) = self.default_config.get(section) {
                if !value.is_table() {
                    errors.push(DeclarationError::new(
                        format!("default_config.{section}"),
                        format!("expected a table, found {}", value.type_str()),
                    ));
                }
            }
        }

        errors
    }

    /// Validates and returns a copy with `id` filled in.
    pub fn finalize(mut self) -> DeviceResult<Self> {
        let errors = self.validate();
        let Some(id) = self.resolved_id() else {
            return Err(DeviceError::MissingId {
                point: DEVICE_DRIVER_POINT,
            });
        };
        if !errors.is_empty() {
            return Err(DeviceError::InvalidDeclaration {
                point: DEVICE_DRIVER_POINT,
                id,
                errors,
            });
        }
        self.id = id;
        Ok(self)
    }

    pub fn supports_protocol(&self, id: &str) -> bool {
        self.protocols.iter().any(|p| p == id)
    }

    pub fn supports_connection(&self, id: &str) -> bool {
        self.connections.iter().any(|c| c == id)
    }

    // =========================================================================
    // Factories
    // =========================================================================

    /// Invoke the device factory. The device is not configured yet.
    pub fn create_device(&self) -> DeviceResult<Box<dyn Device>> {
        (self.factory)(self)
    }

    /// Invoke the config view factory.
    pub fn config_view(&self) -> Box<dyn ConfigView> {
        (self.config_view)()
    }
}

impl Default for DeviceDriver {
    fn default() -> Self {
        Self {
            id: String::new(),
            name: String::new(),
            model: String::new(),
            manufacturer: String::new(),
            width: String::new(),
            length: String::new(),
            factory: default_device_factory(),
            protocols: Vec::new(),
            connections: Vec::new(),
            config_view: default_config_view_factory(),
            default_config: ConfigMap::new(),
        }
    }
}

impl fmt::Debug for DeviceDriver {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DeviceDriver")
            .field("id", &self.id)
            .field("name", &self.name)
            .field("model", &self.model)
            .field("manufacturer", &self.manufacturer)
            .field("width", &self.width)
            .field("length", &self.length)
            .field("protocols", &self.protocols)
            .field("connections", &self.connections)
            .field("default_config", &self.default_config)
            .finish_non_exhaustive()
    }
}

fn validate_id_list(ids: &[String], field: &str, errors: &mut Vec<DeclarationError>) {
    for (i, id) in ids.iter().enumerate() {
        let id = id.trim();
        if id.is_empty() {
            errors.push(DeclarationError::new(
                format!("{field}[{i}]"),
                "id cannot be empty",
            ));
        } else if ids[..i].iter().any(|prev| prev.trim() == id) {
            errors.push(DeclarationError::new(
                format!("{field}[{i}]"),
                format!("'{id}' is listed more than once"),
            ));
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::runtime::Configurable;

    fn driver_with(src: &str) -> DeviceDriver {
        DeviceDriver::new("acme.x1")
            .with_width("610mm")
            .with_default_config(toml::from_str(src).unwrap())
    }

    fn full_driver() -> DeviceDriver {
        driver_with(
            r#"
            speed = 10
            force = 80

            [job]
            copies = 2

            [connection.serial]
            baudrate = 9600

            [protocol.hpgl]
            scale = 40
            "#,
        )
    }

    #[test]
    fn test_device_config_strips_sections() {
        let config = full_driver().get_device_config();
        assert_eq!(config.len(), 2);
        assert_eq!(config["speed"].as_integer(), Some(10));
        for key in [CONNECTION_KEY, PROTOCOL_KEY, JOB_KEY] {
            assert!(!config.contains_key(key));
        }
    }

    #[test]
    fn test_device_config_without_sections() {
        let driver = driver_with("speed = 1");
        assert_eq!(driver.get_device_config().len(), 1);
        assert!(DeviceDriver::default().get_device_config().is_empty());
    }

    #[test]
    fn test_job_config() {
        assert_eq!(full_driver().get_job_config()["copies"].as_integer(), Some(2));
        assert!(driver_with("speed = 1").get_job_config().is_empty());
    }

    #[test]
    fn test_connection_and_protocol_config() {
        let driver = full_driver();
        assert_eq!(
            driver.get_connection_config("serial")["baudrate"].as_integer(),
            Some(9600)
        );
        assert_eq!(
            driver.get_protocol_config("hpgl")["scale"].as_integer(),
            Some(40)
        );
        assert!(driver.get_connection_config("tcp").is_empty());
        assert!(driver.get_protocol_config("dmpl").is_empty());
        assert!(driver_with("").get_protocol_config("hpgl").is_empty());
    }

    #[test]
    fn test_accessors_return_independent_copies() {
        let driver = full_driver();
        let before = driver.default_config.clone();

        let mut job = driver.get_job_config();
        job.insert("copies".into(), toml::Value::Integer(99));
        let mut serial = driver.get_connection_config("serial");
        serial.clear();
        let mut device = driver.get_device_config();
        device.insert("job".into(), toml::Value::Boolean(true));

        assert_eq!(driver.default_config, before);
        assert_eq!(driver.get_job_config()["copies"].as_integer(), Some(2));
    }

    #[test]
    fn test_resolved_id_derivation() {
        let explicit = DeviceDriver::new("x");
        assert_eq!(explicit.resolved_id().as_deref(), Some("x"));

        let derived = DeviceDriver::new("")
            .with_manufacturer("Acme")
            .with_model("X1");
        assert_eq!(derived.resolved_id().as_deref(), Some("Acme.X1"));

        let model_only = DeviceDriver::new("").with_model("X1");
        assert_eq!(model_only.resolved_id().as_deref(), Some("X1"));

        assert_eq!(DeviceDriver::default().resolved_id(), None);
    }

    #[test]
    fn test_validate_reports_all_problems() {
        let driver = DeviceDriver::new("acme.x1")
            .with_protocols(["hpgl", "", "hpgl"])
            .with_default_config(toml::from_str("job = 3").unwrap());
        let errors = driver.validate();
        let paths: Vec<&str> = errors.iter().map(|e| e.path.as_str()).collect();
        assert_eq!(
            paths,
            vec!["width", "protocols[1]", "protocols[2]", "default_config.job"]
        );
    }

    #[test]
    fn test_validate_duplicate_ids_ignore_whitespace() {
        let driver = DeviceDriver::new("acme.x1")
            .with_width("610mm")
            .with_protocols(["hpgl", " hpgl"])
            .with_connections(["serial ", "serial"]);
        let errors = driver.validate();
        let paths: Vec<&str> = errors.iter().map(|e| e.path.as_str()).collect();
        assert_eq!(paths, vec!["protocols[1]", "connections[1]"]);
        assert!(errors[0].message.contains("'hpgl' is listed more than once"));
    }

    #[test]
    fn test_finalize_fills_id() {
        let driver = DeviceDriver::new("")
            .with_manufacturer("Acme")
            .with_model("X1")
            .with_width("610mm")
            .finalize()
            .unwrap();
        assert_eq!(driver.id, "Acme.X1");

        let err = DeviceDriver::default().with_width("1m").finalize().unwrap_err();
        assert!(matches!(err, DeviceError::MissingId { .. }));
    }

    #[test]
    fn test_default_factory_builds_generic_device() {
        let device = full_driver().create_device().unwrap();
        assert_eq!(device.driver_id(), "acme.x1");
        assert!(device.config().is_empty());
    }

    #[test]
    fn test_custom_factory_is_used() {
        let factory: DeviceFactory = Arc::new(|driver: &DeviceDriver| -> DeviceResult<Box<dyn Device>> {
            let mut device = GenericDevice::new(format!("custom-{}", driver.id));
            device.configure(driver.get_job_config());
            Ok(Box::new(device))
        });
        let device = full_driver().with_factory(factory).create_device().unwrap();
        assert_eq!(device.driver_id(), "custom-acme.x1");
        assert_eq!(device.config()["copies"].as_integer(), Some(2));
    }

    #[test]
    fn test_display_name_fallback() {
        assert_eq!(DeviceDriver::new("acme.x1").display_name(), "acme.x1");
        assert_eq!(
            DeviceDriver::new("acme.x1").with_name("X1").display_name(),
            "X1"
        );
    }
}
