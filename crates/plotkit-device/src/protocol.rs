//! Communication protocol declarations (HPGL, DMPL, ...).

use crate::driver::DeviceDriver;
use crate::extension::DEVICE_PROTOCOL_POINT;
use crate::runtime::Protocol;
use crate::view::{default_config_view_factory, ConfigView, ConfigViewFactory};
use plotkit_core::{DeclarationError, DeviceError, DeviceResult};
use std::fmt;
use std::sync::Arc;

/// Builds a protocol for a driver from its declaration.
pub type ProtocolFactory =
    Arc<dyn Fn(&DeviceDriver, &DeviceProtocol) -> DeviceResult<Box<dyn Protocol>> + Send + Sync>;

/// Declares a protocol that drivers can list in `protocols`.
#[derive(Clone)]
pub struct DeviceProtocol {
    pub id: String,
    pub name: String,
    /// Has no default; a protocol without one cannot be instantiated.
    pub factory: Option<ProtocolFactory>,
    pub config_view: ConfigViewFactory,
}

impl DeviceProtocol {
    pub fn new(id: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            factory: None,
            config_view: default_config_view_factory(),
        }
    }

    pub fn with_factory(mut self, factory: ProtocolFactory) -> Self {
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
            errors.push(DeclarationError::new("id", "protocol id cannot be empty"));
        }
        errors
    }

    /// Build the protocol for `driver`. The result is not configured yet.
    pub fn create(&self, driver: &DeviceDriver) -> DeviceResult<Box<dyn Protocol>> {
        let factory = self
            .factory
            .as_ref()
            .ok_or_else(|| DeviceError::MissingFactory {
                point: DEVICE_PROTOCOL_POINT,
                id: self.id.clone(),
            })?;
        factory(driver, self)
    }

    pub fn config_view(&self) -> Box<dyn ConfigView> {
        (self.config_view)()
    }
}

impl fmt::Debug for DeviceProtocol {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DeviceProtocol")
            .field("id", &self.id)
            .field("name", &self.name)
            .field("has_factory", &self.factory.is_some())
            .finish_non_exhaustive()
    }
}
