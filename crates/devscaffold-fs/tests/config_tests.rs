use assert_fs::prelude::*;
use devscaffold_fs::{ConfigStore, Error, NormalizedPath};
use predicates::prelude::*;
use serde::Deserialize;

#[derive(Debug, Deserialize, PartialEq)]
struct Settings {
    mode: String,
    #[serde(default)]
    retries: u32,
}

#[test]
fn test_load_toml() {
    let temp = assert_fs::TempDir::new().unwrap();
    let file = temp.child("settings.toml");
    file.write_str("mode = \"auto\"\nretries = 2\n").unwrap();

    let settings: Settings = ConfigStore::new().load(&NormalizedPath::new(file.path())).unwrap();
    assert_eq!(
        settings,
        Settings {
            mode: "auto".into(),
            retries: 2
        }
    );
}

#[test]
fn test_load_yaml() {
    let temp = assert_fs::TempDir::new().unwrap();
    let file = temp.child("settings.yaml");
    file.write_str("mode: advisory\n").unwrap();

    let settings: Settings = ConfigStore::new().load(&NormalizedPath::new(file.path())).unwrap();
    assert_eq!(settings.mode, "advisory");
    assert_eq!(settings.retries, 0);
}

#[test]
fn test_load_optional_missing_file() {
    let temp = assert_fs::TempDir::new().unwrap();
    let missing = temp.child("absent.toml");
    missing.assert(predicate::path::missing());

    let settings: Option<Settings> = ConfigStore::new()
        .load_optional(&NormalizedPath::new(missing.path()))
        .unwrap();
    assert!(settings.is_none());
}

#[test]
fn test_load_reports_parse_error_with_path() {
    let temp = assert_fs::TempDir::new().unwrap();
    let file = temp.child("settings.toml");
    file.write_str("mode = [").unwrap();

    let err = ConfigStore::new()
        .load::<Settings>(&NormalizedPath::new(file.path()))
        .unwrap_err();
    assert!(matches!(err, Error::ConfigParse { .. }));
    assert!(err.to_string().contains("settings.toml"));
}
