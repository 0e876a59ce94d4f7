//! `plotkit-core`
//!
//! Shared building blocks for the plotkit device extension crates: the
//! [`DeviceError`] taxonomy and the [`ConfigMap`] type used for nested
//! driver defaults.

pub mod config_map;
pub mod error;

pub use config_map::ConfigMap;
pub use error::{DeclarationError, DeviceError, DeviceResult};
