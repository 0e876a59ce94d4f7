//! Command implementations behind the `plotkit` binary.
//!
//! Each command reads from a [`Host`] and returns a JSON value; printing is
//! left to the caller.

use crate::app::Host;
use anyhow::{Context, Result};
use plotkit_core::{ConfigMap, DeviceError};
use plotkit_device::{DeviceDriver, DriverManifest, ExtensionPoint};
use serde_json::{json, Value};
use std::sync::Arc;

/// Which slice of a driver's default config to show.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConfigSlice {
    /// Device-level settings
    Device,
    /// The `job` section
    Job,
    /// Defaults for one protocol
    Protocol(String),
    /// Defaults for one transport
    Connection(String),
}

fn driver(host: &Host, id: &str) -> Result<Arc<DeviceDriver>> {
    host.registry
        .driver(id)
        .ok_or_else(|| DeviceError::NotFound {
            point: ExtensionPoint::Driver.id(),
            id: id.to_string(),
        })
        .with_context(|| format!("looking up driver '{id}'"))
}

fn to_json(map: &ConfigMap) -> Result<Value> {
    serde_json::to_value(map).context("serializing config")
}

/// IDs registered at each extension point.
pub fn list(host: &Host, point: Option<ExtensionPoint>) -> Value {
    let points: Vec<ExtensionPoint> = match point {
        Some(point) => vec![point],
        None => ExtensionPoint::ALL.to_vec(),
    };
    let mut out = serde_json::Map::new();
    for point in points {
        out.insert(
            point.id().to_string(),
            json!(host.registry.extension_point_ids(point)),
        );
    }
    Value::Object(out)
}

/// Full description of a driver, with its resolved protocols and transports.
pub fn show(host: &Host, id: &str) -> Result<Value> {
    let driver = driver(host, id)?;
    let manifest = DriverManifest::from(driver.as_ref());

    let protocols: Vec<Value> = host
        .registry
        .supported_protocols(id)?
        .iter()
        .map(|p| json!({ "id": p.id, "name": p.name }))
        .collect();
    let transports: Vec<Value> = host
        .registry
        .supported_transports(id)?
        .iter()
        .map(|t| json!({ "id": t.id, "name": t.name }))
        .collect();

    let mut value = serde_json::to_value(&manifest).context("serializing driver")?;
    if let Value::Object(obj) = &mut value {
        obj.insert("display_name".into(), json!(driver.display_name()));
        obj.insert("resolved_protocols".into(), Value::Array(protocols));
        obj.insert("resolved_transports".into(), Value::Array(transports));
        if let Some(source) = host.loader.registered_source(id) {
            obj.insert("source".into(), json!(source.display().to_string()));
        }
    }
    Ok(value)
}

/// One slice of a driver's default config.
pub fn config(host: &Host, id: &str, slice: &ConfigSlice) -> Result<Value> {
    let driver = driver(host, id)?;
    let map = match slice {
        ConfigSlice::Device => driver.get_device_config(),
        ConfigSlice::Job => driver.get_job_config(),
        ConfigSlice::Protocol(protocol) => driver.get_protocol_config(protocol),
        ConfigSlice::Connection(transport) => driver.get_connection_config(transport),
    };
    to_json(&map)
}

/// Layout of the driver's config view over its device-level settings.
pub fn view(host: &Host, id: &str) -> Result<Value> {
    let driver = driver(host, id)?;
    let view = driver.config_view();
    let layout = view.layout(&driver.get_device_config());
    Ok(json!({
        "title": view.title(),
        "layout": serde_json::to_value(layout).context("serializing layout")?,
    }))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::AppConfig;

    fn host() -> Host {
        Host::from_config(&AppConfig::default()).unwrap().0
    }

    #[test]
    fn test_list_all_points() {
        let value = list(&host(), None);
        assert_eq!(value["plotkit.device.driver"], json!(["generic.cutter"]));
        assert!(value["plotkit.device.protocols"]
            .as_array()
            .unwrap()
            .contains(&json!("hpgl")));
    }

    #[test]
    fn test_list_one_point() {
        let value = list(&host(), Some(ExtensionPoint::Transport));
        assert_eq!(value.as_object().unwrap().len(), 1);
    }

    #[test]
    fn test_config_slices() {
        let host = host();
        let device = config(&host, "generic.cutter", &ConfigSlice::Device).unwrap();
        assert!(device.get("connection").is_none());

        let serial = config(
            &host,
            "generic.cutter",
            &ConfigSlice::Connection("serial".into()),
        )
        .unwrap();
        assert_eq!(serial["baudrate"], json!(9600));

        let unknown = config(&host, "generic.cutter", &ConfigSlice::Protocol("nope".into()))
            .unwrap();
        assert_eq!(unknown, json!({}));
    }

    #[test]
    fn test_unknown_driver_is_an_error() {
        let err = show(&host(), "acme.none").unwrap_err();
        assert!(format!("{err:#}").contains("acme.none"));
    }
}
