use std::path::PathBuf;

use dompet_config::{Config, ConfigManager};
use tempfile::tempdir;

#[test]
fn load_without_file_yields_defaults() {
    let temp = tempdir().expect("create temp dir");
    let manager =
        ConfigManager::with_base_dir(temp.path().to_path_buf()).expect("create manager");
    let config = manager.load().expect("load defaults");
    assert_eq!(config, Config::default());
    assert!(!manager.config_path().exists());
}

#[test]
fn save_and_reload_round_trips() {
    let temp = tempdir().expect("create temp dir");
    let manager =
        ConfigManager::with_base_dir(temp.path().to_path_buf()).expect("create manager");

    let config = Config {
        data_dir: Some(PathBuf::from("/var/lib/dompet")),
        backup_retention: 9,
    };
    manager.save(&config).expect("save config");
    assert!(manager.config_path().exists());

    let loaded = manager.load().expect("reload config");
    assert_eq!(loaded, config);
    assert_eq!(loaded.ledgers_dir(), PathBuf::from("/var/lib/dompet/ledgers"));
}

#[test]
fn save_overwrites_previous_content() {
    let temp = tempdir().expect("create temp dir");
    let manager =
        ConfigManager::with_base_dir(temp.path().to_path_buf()).expect("create manager");

    manager.save(&Config::default()).expect("first save");
    let updated = Config {
        backup_retention: 2,
        ..Config::default()
    };
    manager.save(&updated).expect("second save");
    assert_eq!(manager.load().expect("reload").backup_retention, 2);
}
