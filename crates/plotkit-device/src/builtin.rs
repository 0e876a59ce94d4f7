//! Built-in protocol, transport and driver declarations.
//!
//! The protocol encoders and connection handling are provided by the host;
//! these declarations make the common IDs resolvable and build the generic
//! runtime objects until the host swaps in its own factories.

use crate::driver::DeviceDriver;
use crate::protocol::{DeviceProtocol, ProtocolFactory};
use crate::registry::ExtensionRegistry;
use crate::runtime::{GenericProtocol, GenericTransport, Protocol, Transport};
use crate::transport::{DeviceTransport, TransportFactory};
use plotkit_core::{ConfigMap, DeviceError, DeviceResult};
use std::sync::Arc;

/// (id, name) of every built-in protocol.
pub const PROTOCOLS: &[(&str, &str)] = &[
    ("hpgl", "HPGL"),
    ("dmpl", "DMPL"),
    ("gpgl", "GPGL"),
    ("camm", "CAMM-GL"),
    ("debug", "Debug"),
];

/// (id, name) of every built-in transport.
pub const TRANSPORTS: &[(&str, &str)] = &[
    ("serial", "Serial Port"),
    ("printer", "Printer"),
    ("tcp", "Network (TCP)"),
    ("disk", "Disk"),
];

/// ID of the built-in driver.
pub const GENERIC_DRIVER_ID: &str = "generic.cutter";

const GENERIC_DRIVER_DEFAULTS: &str = r#"
speed = 10
force = 80
area = "auto"

[job]
copies = 1
spacing = [10, 10]

[connection.serial]
port = ""
baudrate = 9600
bytesize = 8
parity = "N"
stopbits = 1

[connection.tcp]
host = "127.0.0.1"
port = 9100

[connection.disk]
path = "output.plt"

[protocol.hpgl]
scale = 40

[protocol.dmpl]
scale = 1000
"#;

pub fn generic_protocol_factory() -> ProtocolFactory {
    Arc::new(
        |driver: &DeviceDriver, decl: &DeviceProtocol| -> DeviceResult<Box<dyn Protocol>> {
            Ok(Box::new(GenericProtocol::new(decl.id.clone(), driver.id.clone())))
        },
    )
}

pub fn generic_transport_factory() -> TransportFactory {
    Arc::new(
        |driver: &DeviceDriver, decl: &DeviceTransport| -> DeviceResult<Box<dyn Transport>> {
            Ok(Box::new(GenericTransport::new(decl.id.clone(), driver.id.clone())))
        },
    )
}

/// The built-in driver declaration: every built-in protocol and transport.
pub fn generic_driver() -> DeviceResult<DeviceDriver> {
    let defaults: ConfigMap = toml::from_str(GENERIC_DRIVER_DEFAULTS)
        .map_err(|e| DeviceError::Config(format!("built-in driver defaults: {e}")))?;
    Ok(DeviceDriver::new(GENERIC_DRIVER_ID)
        .with_name("Generic Cutter")
        .with_manufacturer("Generic")
        .with_model("Cutter")
        .with_width("900mm")
        .with_protocols(PROTOCOLS.iter().map(|(id, _)| *id))
        .with_connections(TRANSPORTS.iter().map(|(id, _)| *id))
        .with_default_config(defaults))
}

/// Registers the built-in protocols, transports and driver.
pub fn register_builtins(registry: &mut ExtensionRegistry) -> DeviceResult<()> {
    for (id, name) in PROTOCOLS {
        registry.register_protocol(
            DeviceProtocol::new(*id, *name).with_factory(generic_protocol_factory()),
        )?;
    }
    for (id, name) in TRANSPORTS {
        registry.register_transport(
            DeviceTransport::new(*id, *name).with_factory(generic_transport_factory()),
        )?;
    }
    registry.register_driver(generic_driver()?)?;
    Ok(())
}
