use std::fs;
use std::path::Path;

use plotkit_device::builtin::register_builtins;
use plotkit_device::{Configurable, ExtensionRegistry, ManifestLoader};
use tempfile::TempDir;

fn write(dir: &Path, name: &str, content: &str) {
    fs::write(dir.join(name), content).unwrap();
}

const USER_X1: &str = r#"
id = "acme.x1"
name = "Acme X1 (user)"
width = "610mm"
protocols = ["hpgl"]
connections = ["serial"]

[default_config.connection.serial]
baudrate = 19200
"#;

const BUILTIN_X1: &str = r#"
id = "acme.x1"
name = "Acme X1"
width = "610mm"
protocols = ["hpgl"]
connections = ["serial"]

[default_config.connection.serial]
baudrate = 9600
"#;

const BUILTIN_X2_YAML: &str = r#"
manufacturer: Acme
model: X2
width: 1200mm
protocols: [dmpl]
connections: [printer]
"#;

#[test]
fn test_user_path_overrides_builtin_path() {
    let user = TempDir::new().unwrap();
    let builtin = TempDir::new().unwrap();
    write(user.path(), "x1.toml", USER_X1);
    write(builtin.path(), "x1.toml", BUILTIN_X1);
    write(builtin.path(), "x2.yaml", BUILTIN_X2_YAML);

    let mut loader = ManifestLoader::new();
    loader.add_search_path(user.path());
    loader.add_search_path(builtin.path());
    let errors = loader.scan();

    assert!(errors.is_empty(), "unexpected errors: {errors:?}");
    assert_eq!(loader.len(), 2);

    let x1 = loader.get("acme.x1").unwrap();
    assert_eq!(x1.priority, 0);
    assert_eq!(x1.manifest.name, "Acme X1 (user)");
    assert!(loader.get("Acme.X2").is_some());
}

#[test]
fn test_earlier_search_path_wins() {
    // Reversed priority: whichever path was added first wins
    let first = TempDir::new().unwrap();
    let second = TempDir::new().unwrap();
    write(first.path(), "x1.toml", BUILTIN_X1);
    write(second.path(), "x1.toml", USER_X1);

    let mut loader = ManifestLoader::new();
    loader.add_search_path(first.path());
    loader.add_search_path(second.path());
    loader.scan();

    assert_eq!(loader.get("acme.x1").unwrap().manifest.name, "Acme X1");
}

#[test]
fn test_broken_files_do_not_stop_the_scan() {
    let dir = TempDir::new().unwrap();
    write(dir.path(), "good.toml", BUILTIN_X1);
    write(dir.path(), "bad.toml", "id = [unclosed");
    write(dir.path(), "no_width.yaml", "id: acme.x9\n");
    write(dir.path(), "notes.txt", "ignored");

    let mut loader = ManifestLoader::new();
    loader.add_search_path(dir.path());
    let errors = loader.scan();

    assert_eq!(errors.len(), 2);
    assert!(errors.iter().any(|e| e.file_path.ends_with("bad.toml")));
    let no_width = errors
        .iter()
        .find(|e| e.file_path.ends_with("no_width.yaml"))
        .unwrap();
    assert_eq!(no_width.validation_errors[0].path, "width");
    assert_eq!(loader.len(), 1);
}

#[test]
fn test_missing_search_path_is_ignored() {
    let dir = TempDir::new().unwrap();
    let mut loader = ManifestLoader::new();
    loader.add_search_path(dir.path().join("does-not-exist"));
    assert!(loader.scan().is_empty());
    assert!(loader.is_empty());
}

#[test]
fn test_file_as_search_path_is_an_error() {
    let dir = TempDir::new().unwrap();
    write(dir.path(), "x1.toml", BUILTIN_X1);
    let mut loader = ManifestLoader::new();
    loader.add_search_path(dir.path().join("x1.toml"));
    let errors = loader.scan();
    assert_eq!(errors.len(), 1);
    assert_eq!(errors[0].message, "Not a directory");
}

#[test]
fn test_reload_picks_up_changes() {
    let dir = TempDir::new().unwrap();
    write(dir.path(), "x1.toml", BUILTIN_X1);
    let mut loader = ManifestLoader::new();
    loader.add_search_path(dir.path());
    loader.scan();
    assert_eq!(loader.len(), 1);

    fs::remove_file(dir.path().join("x1.toml")).unwrap();
    write(dir.path(), "x2.yml", BUILTIN_X2_YAML);
    assert!(loader.reload().is_empty());
    assert!(loader.get("acme.x1").is_none());
    assert!(loader.get("Acme.X2").is_some());
}

#[test]
fn test_loaded_drivers_resolve_against_builtins() {
    let dir = TempDir::new().unwrap();
    write(dir.path(), "x1.toml", USER_X1);

    let mut loader = ManifestLoader::new();
    loader.add_search_path(dir.path());
    loader.scan();

    let mut registry = ExtensionRegistry::new();
    register_builtins(&mut registry).unwrap();
    assert!(loader.register_all(&mut registry).is_empty());

    let serial = registry.create_transport("acme.x1", "serial").unwrap();
    assert_eq!(serial.config()["baudrate"].as_integer(), Some(19200));

    let protocols = registry.supported_protocols("acme.x1").unwrap();
    assert_eq!(protocols.len(), 1);
    assert_eq!(protocols[0].name, "HPGL");
}

#[test]
fn test_register_all_reports_conflicts() {
    let dir = TempDir::new().unwrap();
    write(
        dir.path(),
        "generic.toml",
        "id = \"generic.cutter\"\nwidth = \"1m\"\n",
    );
    write(dir.path(), "x1.toml", BUILTIN_X1);

    let mut loader = ManifestLoader::new();
    loader.add_search_path(dir.path());
    loader.scan();

    let mut registry = ExtensionRegistry::new();
    register_builtins(&mut registry).unwrap();
    let errors = loader.register_all(&mut registry);

    assert_eq!(errors.len(), 1);
    assert!(registry.driver("acme.x1").is_some());

    // Only the manifest that made it into the registry counts as a source
    assert!(loader
        .registered_source("acme.x1")
        .unwrap()
        .ends_with("x1.toml"));
    assert!(loader.get("generic.cutter").is_some());
    assert!(loader.registered_source("generic.cutter").is_none());
}
