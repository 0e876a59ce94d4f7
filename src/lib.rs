//! plotkit - plug-in device support for plotters and vinyl cutters.
//!
//! The extension points themselves live in the `plotkit-device` crate and
//! are re-exported here. This crate adds the pieces an application needs
//! around them: configuration, tracing setup and registry assembly.

pub mod app;
pub mod commands;
pub mod config;
pub mod tracing_setup;

pub use app::{Host, LoadReport};
pub use config::AppConfig;
pub use plotkit_core::{ConfigMap, DeviceError, DeviceResult};
pub use plotkit_device as device;
