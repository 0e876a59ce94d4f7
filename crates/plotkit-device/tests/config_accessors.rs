//! Config slicing over a range of default-config shapes.

use plotkit_device::driver::{CONNECTION_KEY, JOB_KEY, PROTOCOL_KEY};
use plotkit_device::{ConfigMap, DeviceDriver};

const SHAPES: &[&str] = &[
    "",
    "speed = 1",
    "job = 5\nconnection = \"serial\"\nprotocol = [1, 2]",
    "[job]\n[connection]\n[protocol]",
    r#"
    speed = 10
    [job]
    copies = 2
    [connection.serial]
    baudrate = 9600
    [connection.tcp]
    port = 9100
    [protocol.hpgl]
    scale = 40
    "#,
    r#"
    [connection]
    serial = "not a table"
    [protocol.hpgl.nested]
    deep = true
    "#,
];

fn drivers() -> Vec<DeviceDriver> {
    SHAPES
        .iter()
        .map(|src| {
            let config: ConfigMap = toml::from_str(src).unwrap();
            DeviceDriver::new("acme.x1")
                .with_width("610mm")
                .with_default_config(config)
        })
        .collect()
}

#[test]
fn test_device_config_never_contains_sections() {
    for driver in drivers() {
        let device = driver.get_device_config();
        for key in [CONNECTION_KEY, PROTOCOL_KEY, JOB_KEY] {
            assert!(!device.contains_key(key), "{key} leaked from {driver:?}");
        }
        // Every other key survives
        assert_eq!(
            device.len(),
            driver
                .default_config
                .keys()
                .filter(|k| ![CONNECTION_KEY, PROTOCOL_KEY, JOB_KEY].contains(&k.as_str()))
                .count()
        );
    }
}

#[test]
fn test_unknown_ids_yield_empty_maps() {
    for driver in drivers() {
        assert!(driver.get_connection_config("no-such-transport").is_empty());
        assert!(driver.get_protocol_config("no-such-protocol").is_empty());
    }
}

#[test]
fn test_non_table_values_yield_empty_maps() {
    let all = drivers();
    assert!(all[2].get_job_config().is_empty());
    assert!(all[2].get_connection_config("serial").is_empty());
    assert!(all[5].get_connection_config("serial").is_empty());
}

#[test]
fn test_nested_values_are_kept_whole() {
    let driver = &drivers()[5];
    let hpgl = driver.get_protocol_config("hpgl");
    assert_eq!(
        hpgl["nested"]["deep"].as_bool(),
        Some(true),
        "nested tables under a protocol id are returned intact"
    );
}

#[test]
fn test_accessors_never_mutate_the_source() {
    for driver in drivers() {
        let before = driver.default_config.clone();

        let mut slices = vec![
            driver.get_device_config(),
            driver.get_job_config(),
            driver.get_connection_config("serial"),
            driver.get_protocol_config("hpgl"),
        ];
        for slice in &mut slices {
            slice.insert("injected".into(), toml::Value::Boolean(true));
            slice.remove("speed");
        }

        assert_eq!(driver.default_config, before);
        assert!(!driver.get_device_config().contains_key("injected"));
    }
}
