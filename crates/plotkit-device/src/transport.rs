//! Transport declarations (serial, network, file, ...).
//!
//! Same shape as [`crate::DeviceProtocol`]; drivers list transport IDs in
//! `connections` and keep their defaults under `[connection.<id>]`.

use crate::driver::DeviceDriver;
use crate::extension::DEVICE_TRANSPORT_POINT;
use crate::runtime::Transport;
use crate::view::{default_config_view_factory, ConfigView, ConfigViewFactory};
use plotkit_core::{DeclarationError, DeviceError, DeviceResult};
use std::fmt;
use std::sync::Arc;

/// Builds a transport for a driver from its declaration.
pub type TransportFactory =
    Arc<dyn Fn(&DeviceDriver, &DeviceTransport) -> DeviceResult<Box<dyn Transport>> + Send + Sync>;

#[derive(Clone)]
pub struct DeviceTransport {
    pub id: String,
    pub name: String,
    pub factory: Option<TransportFactory>,
    pub config_view: ConfigViewFactory,
}

impl DeviceTransport {
    pub fn new(id: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            factory: None,
            config_view: default_config_view_factory(),
        }
    }

    pub fn with_factory(mut self, factory: TransportFactory) -> Self {
        self.factory = Some(factory);
        self
    }

    pub fn with_config_view(mut self, config_view: ConfigViewFactory) -> Self {
        self.config_view = config_view;
        self
    }

    pub fn validate(&self) -> Vec<DeclarationError> {
        let mut errors = Vec::new();
        if self.id.trim().is_empty() {
            errors.push(DeclarationError::new("id", "transport id cannot be empty"));
        }
        errors
    }

    /// Build the transport for `driver`. The result is not configured yet.
    pub fn create(&self, driver: &DeviceDriver) -> DeviceResult<Box<dyn Transport>> {
        let factory = self
            .factory
            .as_ref()
            .ok_or_else(|| DeviceError::MissingFactory {
                point: DEVICE_TRANSPORT_POINT,
                id: self.id.clone(),
            })?;
        factory(driver, self)
    }

    pub fn config_view(&self) -> Box<dyn ConfigView> {
        (self.config_view)()
    }
}

impl fmt::Debug for DeviceTransport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DeviceTransport")
            .field("id", &self.id)
            .field("name", &self.name)
            .field("has_factory", &self.factory.is_some())
            .finish_non_exhaustive()
    }
}
