//! Device extension points for plotkit.
//!
//! Plugins describe device families, communication protocols and transports
//! with three declarative records. The host registers them against named
//! extension points and later reads their fields, slices their default
//! configuration and calls their factories.
//!
//! # Architecture
//!
//! - `extension` - Extension point IDs
//! - `driver` - [`DeviceDriver`] and its config accessors
//! - `protocol` / `transport` - [`DeviceProtocol`] and [`DeviceTransport`]
//! - `runtime` - Traits for the objects factories build
//! - `view` - Configuration editor views
//! - `registry` - [`ExtensionRegistry`], resolution by ID
//! - `manifest` - Drivers declared in TOML/YAML files
//! - `builtin` - Built-in declarations

pub mod builtin;
pub mod driver;
pub mod extension;
pub mod manifest;
pub mod protocol;
pub mod registry;
pub mod runtime;
pub mod transport;
pub mod view;

pub use driver::{default_device_factory, DeviceDriver, DeviceFactory};
pub use extension::{
    ExtensionPoint, DEVICE_DRIVER_POINT, DEVICE_PROTOCOL_POINT, DEVICE_TRANSPORT_POINT,
};
pub use manifest::{
    load_driver_manifest, load_driver_manifest_from_str, DriverManifest, ManifestFormat,
    ManifestLoadError, ManifestLoader,
};
pub use protocol::{DeviceProtocol, ProtocolFactory};
pub use registry::ExtensionRegistry;
pub use runtime::{Configurable, Device, GenericDevice, Protocol, Transport};
pub use transport::{DeviceTransport, TransportFactory};
pub use view::{default_config_view_factory, ConfigView, ConfigViewFactory, UiElement};

pub use plotkit_core::{ConfigMap, DeviceError, DeviceResult};
