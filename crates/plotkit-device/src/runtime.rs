//! Runtime objects built by declaration factories.
//!
//! The real device, protocol encoders and connection handling live in the
//! host application. These traits are the contract the factories fulfil:
//! every object knows which declaration produced it and accepts the config
//! slice the host hands it.
//!
//! The `Generic*` types are the default implementations. They store their
//! configuration and nothing else; no I/O happens here.

use plotkit_core::ConfigMap;

/// Anything that can receive a configuration mapping.
pub trait Configurable {
    /// Replace the current configuration.
    fn configure(&mut self, config: ConfigMap);

    /// Current configuration.
    fn config(&self) -> &ConfigMap;
}

/// A device instance created from a [`crate::DeviceDriver`].
pub trait Device: Configurable + Send + Sync {
    /// ID of the driver declaration this device was built from
    fn driver_id(&self) -> &str;
}

/// A protocol instance created from a [`crate::DeviceProtocol`].
pub trait Protocol: Configurable + Send + Sync {
    fn protocol_id(&self) -> &str;

    /// ID of the driver this protocol was created for
    fn driver_id(&self) -> &str;
}

/// A transport instance created from a [`crate::DeviceTransport`].
pub trait Transport: Configurable + Send + Sync {
    fn transport_id(&self) -> &str;

    /// ID of the driver this transport was created for
    fn driver_id(&self) -> &str;
}

/// Default device produced when a driver declares no factory of its own.
#[derive(Debug, Clone, Default)]
pub struct GenericDevice {
    driver_id: String,
    config: ConfigMap,
}

impl GenericDevice {
    pub fn new(driver_id: impl Into<String>) -> Self {
        Self {
            driver_id: driver_id.into(),
            config: ConfigMap::new(),
        }
    }
}

impl Configurable for GenericDevice {
    fn configure(&mut self, config: ConfigMap) {
        self.config = config;
    }

    fn config(&self) -> &ConfigMap {
        &self.config
    }
}

impl Device for GenericDevice {
    fn driver_id(&self) -> &str {
        &self.driver_id
    }
}

/// Protocol placeholder that records its configuration.
#[derive(Debug, Clone)]
pub struct GenericProtocol {
    id: String,
    driver_id: String,
    config: ConfigMap,
}

impl GenericProtocol {
    pub fn new(id: impl Into<String>, driver_id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            driver_id: driver_id.into(),
            config: ConfigMap::new(),
        }
    }
}

impl Configurable for GenericProtocol {
    fn configure(&mut self, config: ConfigMap) {
        self.config = config;
    }

    fn config(&self) -> &ConfigMap {
        &self.config
    }
}

impl Protocol for GenericProtocol {
    fn protocol_id(&self) -> &str {
        &self.id
    }

    fn driver_id(&self) -> &str {
        &self.driver_id
    }
}

/// Transport placeholder that records its configuration.
#[derive(Debug, Clone)]
pub struct GenericTransport {
    id: String,
    driver_id: String,
    config: ConfigMap,
}

impl GenericTransport {
    pub fn new(id: impl Into<String>, driver_id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            driver_id: driver_id.into(),
            config: ConfigMap::new(),
        }
    }
}

impl Configurable for GenericTransport {
    fn configure(&mut self, config: ConfigMap) {
        self.config = config;
    }

    fn config(&self) -> &ConfigMap {
        &self.config
    }
}

impl Transport for GenericTransport {
    fn transport_id(&self) -> &str {
        &self.id
    }

    fn driver_id(&self) -> &str {
        &self.driver_id
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_generic_device_configure_replaces() {
        let mut device = GenericDevice::new("acme.x1");
        assert!(device.config().is_empty());

        let mut config = ConfigMap::new();
        config.insert("speed".into(), toml::Value::Integer(5));
        device.configure(config);
        assert_eq!(device.config()["speed"].as_integer(), Some(5));

        device.configure(ConfigMap::new());
        assert!(device.config().is_empty());
        assert_eq!(device.driver_id(), "acme.x1");
    }

    #[test]
    fn test_generic_protocol_and_transport_ids() {
        let protocol = GenericProtocol::new("hpgl", "acme.x1");
        assert_eq!(protocol.protocol_id(), "hpgl");
        assert_eq!(Protocol::driver_id(&protocol), "acme.x1");

        let transport = GenericTransport::new("serial", "acme.x1");
        assert_eq!(transport.transport_id(), "serial");
        assert_eq!(Transport::driver_id(&transport), "acme.x1");
    }
}
