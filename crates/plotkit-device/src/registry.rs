//! Host-side registry for device extensions.
//!
//! The registry owns every registered declaration. Declarations refer to
//! each other only by ID (a driver lists the protocol and transport IDs it
//! supports); the registry resolves those IDs and wires the factories
//! together with the matching slice of the driver's default config.
//!
//! # Example
//!
//! ```rust,ignore
//! let mut registry = ExtensionRegistry::new();
//! builtin::register_builtins(&mut registry)?;
//!
//! registry.register_driver(
//!     DeviceDriver::new("acme.x1")
//!         .with_width("610mm")
//!         .with_protocols(["hpgl"])
//!         .with_connections(["serial"]),
//! )?;
//!
//! let device = registry.create_device("acme.x1")?;
//! let protocol = registry.create_protocol("acme.x1", "hpgl")?;
//! ```

use crate::driver::DeviceDriver;
use crate::extension::{
    ExtensionPoint, DEVICE_DRIVER_POINT, DEVICE_PROTOCOL_POINT, DEVICE_TRANSPORT_POINT,
};
use crate::protocol::DeviceProtocol;
use crate::runtime::{Configurable, Device, Protocol, Transport};
use crate::transport::DeviceTransport;
use plotkit_core::{DeviceError, DeviceResult};
use std::collections::HashMap;
use std::sync::Arc;
use tracing::{debug, info, warn};

/// Stores driver, protocol and transport declarations by ID.
#[derive(Debug, Default)]
pub struct ExtensionRegistry {
    drivers: HashMap<String, Arc<DeviceDriver>>,
    protocols: HashMap<String, Arc<DeviceProtocol>>,
    transports: HashMap<String, Arc<DeviceTransport>>,
}

impl ExtensionRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    // =========================================================================
    // Registration
    // =========================================================================

    /// Registers a driver.
    ///
    /// An empty `id` is derived from manufacturer/model before storing. Protocol
    /// and transport IDs the driver lists do not have to be registered yet.
    pub fn register_driver(&mut self, driver: DeviceDriver) -> DeviceResult<Arc<DeviceDriver>> {
        let driver = driver.finalize()?;
        if self.drivers.contains_key(&driver.id) {
            return Err(DeviceError::DuplicateId {
                point: DEVICE_DRIVER_POINT,
                id: driver.id,
            });
        }

        for id in unlisted_config_ids(&driver, crate::driver::PROTOCOL_KEY, &driver.protocols) {
            warn!(driver = %driver.id, protocol = %id, "protocol config present but protocol not listed");
        }
        for id in unlisted_config_ids(&driver, crate::driver::CONNECTION_KEY, &driver.connections) {
            warn!(driver = %driver.id, transport = %id, "connection config present but transport not listed");
        }

        info!(
            "Registered driver: {} ({})",
            driver.display_name(),
            driver.id
        );
        let driver = Arc::new(driver);
        self.drivers.insert(driver.id.clone(), driver.clone());
        Ok(driver)
    }

    pub fn register_protocol(
        &mut self,
        protocol: DeviceProtocol,
    ) -> DeviceResult<Arc<DeviceProtocol>> {
        let errors = protocol.validate();
        if !errors.is_empty() {
            return Err(DeviceError::InvalidDeclaration {
                point: DEVICE_PROTOCOL_POINT,
                id: protocol.id,
                errors,
            });
        }
        if self.protocols.contains_key(&protocol.id) {
            return Err(DeviceError::DuplicateId {
                point: DEVICE_PROTOCOL_POINT,
                id: protocol.id,
            });
        }
        info!("Registered protocol: {} ({})", protocol.name, protocol.id);
        let protocol = Arc::new(protocol);
        self.protocols
            .insert(protocol.id.clone(), protocol.clone());
        Ok(protocol)
    }

    pub fn register_transport(
        &mut self,
        transport: DeviceTransport,
    ) -> DeviceResult<Arc<DeviceTransport>> {
        let errors = transport.validate();
        if !errors.is_empty() {
            return Err(DeviceError::InvalidDeclaration {
                point: DEVICE_TRANSPORT_POINT,
                id: transport.id,
                errors,
            });
        }
        if self.transports.contains_key(&transport.id) {
            return Err(DeviceError::DuplicateId {
                point: DEVICE_TRANSPORT_POINT,
                id: transport.id,
            });
        }
        info!("Registered transport: {} ({})", transport.name, transport.id);
        let transport = Arc::new(transport);
        self.transports
            .insert(transport.id.clone(), transport.clone());
        Ok(transport)
    }

    pub fn unregister_driver(&mut self, id: &str) -> Option<Arc<DeviceDriver>> {
        let removed = self.drivers.remove(id);
        if removed.is_some() {
            info!("Unregistered driver: {}", id);
        }
        removed
    }

    pub fn unregister_protocol(&mut self, id: &str) -> Option<Arc<DeviceProtocol>> {
        let removed = self.protocols.remove(id);
        if removed.is_some() {
            info!("Unregistered protocol: {}", id);
        }
        removed
    }

    pub fn unregister_transport(&mut self, id: &str) -> Option<Arc<DeviceTransport>> {
        let removed = self.transports.remove(id);
        if removed.is_some() {
            info!("Unregistered transport: {}", id);
        }
        removed
    }

    // =========================================================================
    // Lookup
    // =========================================================================

    pub fn driver(&self, id: &str) -> Option<Arc<DeviceDriver>> {
        self.drivers.get(id).cloned()
    }

    pub fn protocol(&self, id: &str) -> Option<Arc<DeviceProtocol>> {
        self.protocols.get(id).cloned()
    }

    pub fn transport(&self, id: &str) -> Option<Arc<DeviceTransport>> {
        self.transports.get(id).cloned()
    }

    /// All drivers, sorted by ID.
    pub fn drivers(&self) -> Vec<Arc<DeviceDriver>> {
        sorted_values(&self.drivers)
    }

    /// All protocols, sorted by ID.
    pub fn protocols(&self) -> Vec<Arc<DeviceProtocol>> {
        sorted_values(&self.protocols)
    }

    /// All transports, sorted by ID.
    pub fn transports(&self) -> Vec<Arc<DeviceTransport>> {
        sorted_values(&self.transports)
    }

    /// Sorted IDs registered on `point`.
    pub fn extension_point_ids(&self, point: ExtensionPoint) -> Vec<String> {
        let mut ids: Vec<String> = match point {
            ExtensionPoint::Driver => self.drivers.keys().cloned().collect(),
            ExtensionPoint::Protocol => self.protocols.keys().cloned().collect(),
            ExtensionPoint::Transport => self.transports.keys().cloned().collect(),
        };
        ids.sort();
        ids
    }

    pub fn is_empty(&self) -> bool {
        self.drivers.is_empty() && self.protocols.is_empty() && self.transports.is_empty()
    }

    // =========================================================================
    // Resolution
    // =========================================================================

    fn require_driver(&self, id: &str) -> DeviceResult<Arc<DeviceDriver>> {
        self.driver(id).ok_or_else(|| DeviceError::NotFound {
            point: DEVICE_DRIVER_POINT,
            id: id.to_string(),
        })
    }

    /// Registered protocols the driver lists, in the driver's order.
    ///
    /// IDs with no registered declaration are skipped.
    pub fn supported_protocols(&self, driver_id: &str) -> DeviceResult<Vec<Arc<DeviceProtocol>>> {
        let driver = self.require_driver(driver_id)?;
        Ok(driver
            .protocols
            .iter()
            .filter_map(|id| {
                let found = self.protocol(id);
                if found.is_none() {
                    warn!(driver = %driver_id, protocol = %id, "driver lists unregistered protocol");
                }
                found
            })
            .collect())
    }

    /// Registered transports the driver lists, in the driver's order.
    pub fn supported_transports(
        &self,
        driver_id: &str,
    ) -> DeviceResult<Vec<Arc<DeviceTransport>>> {
        let driver = self.require_driver(driver_id)?;
        Ok(driver
            .connections
            .iter()
            .filter_map(|id| {
                let found = self.transport(id);
                if found.is_none() {
                    warn!(driver = %driver_id, transport = %id, "driver lists unregistered transport");
                }
                found
            })
            .collect())
    }

    // =========================================================================
    // Instantiation
    // =========================================================================

    /// Builds the device and configures it with the device-level defaults.
    pub fn create_device(&self, driver_id: &str) -> DeviceResult<Box<dyn Device>> {
        let driver = self.require_driver(driver_id)?;
        let mut device = driver.create_device()?;
        device.configure(driver.get_device_config());
        debug!(driver = %driver_id, "created device");
        Ok(device)
    }

    /// Builds `protocol_id` for the driver, configured with the driver's
    /// `[protocol.<id>]` defaults.
    pub fn create_protocol(
        &self,
        driver_id: &str,
        protocol_id: &str,
    ) -> DeviceResult<Box<dyn Protocol>> {
        let driver = self.require_driver(driver_id)?;
        if !driver.supports_protocol(protocol_id) {
            return Err(DeviceError::Unsupported {
                driver: driver_id.to_string(),
                point: DEVICE_PROTOCOL_POINT,
                id: protocol_id.to_string(),
            });
        }
        let declaration = self
            .protocol(protocol_id)
            .ok_or_else(|| DeviceError::NotFound {
                point: DEVICE_PROTOCOL_POINT,
                id: protocol_id.to_string(),
            })?;
        let mut protocol = declaration.create(&driver)?;
        protocol.configure(driver.get_protocol_config(protocol_id));
        debug!(driver = %driver_id, protocol = %protocol_id, "created protocol");
        Ok(protocol)
    }

    /// Builds `transport_id` for the driver, configured with the driver's
    /// `[connection.<id>]` defaults.
    pub fn create_transport(
        &self,
        driver_id: &str,
        transport_id: &str,
    ) -> DeviceResult<Box<dyn Transport>> {
        let driver = self.require_driver(driver_id)?;
        if !driver.supports_connection(transport_id) {
            return Err(DeviceError::Unsupported {
                driver: driver_id.to_string(),
                point: DEVICE_TRANSPORT_POINT,
                id: transport_id.to_string(),
            });
        }
        let declaration = self
            .transport(transport_id)
            .ok_or_else(|| DeviceError::NotFound {
                point: DEVICE_TRANSPORT_POINT,
                id: transport_id.to_string(),
            })?;
        let mut transport = declaration.create(&driver)?;
        transport.configure(driver.get_connection_config(transport_id));
        debug!(driver = %driver_id, transport = %transport_id, "created transport");
        Ok(transport)
    }
}

fn sorted_values<T>(map: &HashMap<String, Arc<T>>) -> Vec<Arc<T>> {
    let mut entries: Vec<(&String, &Arc<T>)> = map.iter().collect();
    entries.sort_by(|a, b| a.0.cmp(b.0));
    entries.into_iter().map(|(_, v)| v.clone()).collect()
}

/// Keys under `[section]` of the default config that the driver does not list.
fn unlisted_config_ids(driver: &DeviceDriver, section: &str, listed: &[String]) -> Vec<String> {
    match driver.default_config.get(section) {
        Some(toml::Value::Table(table)) => table
            .keys()
            .filter(|k| !listed.contains(k))
            .cloned()
            .collect(),
        _ => Vec::new(),
    }
}
