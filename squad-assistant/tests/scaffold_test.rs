// Integration tests for the squad assistant scaffold: bundled defaults and
// data assets.

use std::path::Path;

use squad_assistant::config::{self, Config};
use squad_assistant::reference;

/// Verify that defaults/squad.toml is valid TOML with every section present.
#[test]
fn squad_toml_is_valid() {
    let content =
        std::fs::read_to_string("defaults/squad.toml").expect("defaults/squad.toml should exist");
    let parsed: Result<toml::Value, _> = toml::from_str(&content);
    assert!(parsed.is_ok(), "defaults/squad.toml is not valid TOML: {:?}", parsed.err());

    let value = parsed.unwrap();
    for section in ["llm", "session", "data", "filters"] {
        assert!(value.get(section).is_some(), "missing [{section}] section");
    }
}

/// Verify that defaults/credentials.toml.example is valid TOML.
#[test]
fn credentials_example_is_valid_toml() {
    let content = std::fs::read_to_string("defaults/credentials.toml.example")
        .expect("defaults/credentials.toml.example should exist");
    let parsed: Result<toml::Value, _> = toml::from_str(&content);
    assert!(
        parsed.is_ok(),
        "defaults/credentials.toml.example is not valid TOML: {:?}",
        parsed.err()
    );
}

/// The shipped defaults load and validate as a full config.
#[test]
fn defaults_load_as_config() {
    let dir = std::env::temp_dir().join(format!("squad_scaffold_{}", std::process::id()));
    let _ = std::fs::remove_dir_all(&dir);
    std::fs::create_dir_all(dir.join("defaults")).unwrap();
    for name in ["squad.toml", "credentials.toml.example"] {
        std::fs::copy(Path::new("defaults").join(name), dir.join("defaults").join(name)).unwrap();
    }

    let copied = config::ensure_config_files(&dir).expect("defaults should copy");
    assert_eq!(copied.len(), 1);
    let config: Config = config::load_config_from(&dir).expect("defaults should load");
    assert_eq!(config.session.default_coins, 50_000);
    assert_eq!(config.filters.max_price, 20_000_000);
    assert!(!config.credentials.has_api_key());
    assert!(dir.join("config/squad.toml").exists());
    assert!(!dir.join("config/credentials.toml.example").exists());

    let _ = std::fs::remove_dir_all(&dir);
}

/// The bundled reference asset parses and carries the well-known card.
#[test]
fn reference_asset_loads() {
    let map = reference::load(Path::new("data/reference/players.json"))
        .expect("bundled reference asset should load");
    assert!(map.len() >= 10, "expected a populated asset, got {}", map.len());

    let entry = map.get("189596").expect("189596 should be present");
    assert_eq!(entry.pace, 92);
    assert!(entry.detailed_stats().tactical_intelligence.is_some());

    // Stats written as text load the same as numbers.
    assert_eq!(map.get("235243").unwrap().defending, 86);
}

/// Verify that all expected directories exist.
#[test]
fn directory_structure_exists() {
    let expected_dirs = [
        "src",
        "src/roster",
        "src/view",
        "src/llm",
        "defaults",
        "data/reference",
        "tests/fixtures",
    ];
    for dir in expected_dirs {
        assert!(Path::new(dir).is_dir(), "directory {dir} should exist");
    }
}
