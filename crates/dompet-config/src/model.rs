use std::path::PathBuf;

use serde::{Deserialize, Serialize};

const DEFAULT_BACKUP_RETENTION: usize = 5;
const APP_DIR: &str = "dompet";

/// User-adjustable application settings.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Config {
    /// Overrides the platform data directory when set.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data_dir: Option<PathBuf>,
    /// How many timestamped ledger backups to keep per user.
    #[serde(default = "Config::default_backup_retention")]
    pub backup_retention: usize,
}

impl Config {
    /// Root directory holding ledgers and backups.
    pub fn base_dir(&self) -> PathBuf {
        self.data_dir.clone().unwrap_or_else(|| {
            dirs::data_dir()
                .unwrap_or_else(|| PathBuf::from("."))
                .join(APP_DIR)
        })
    }

    pub fn ledgers_dir(&self) -> PathBuf {
        self.base_dir().join("ledgers")
    }

    pub fn backups_dir(&self) -> PathBuf {
        self.base_dir().join("backups")
    }

    pub fn default_backup_retention() -> usize {
        DEFAULT_BACKUP_RETENTION
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            data_dir: None,
            backup_retention: DEFAULT_BACKUP_RETENTION,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn data_dir_override_wins() {
        let config = Config {
            data_dir: Some(PathBuf::from("/tmp/custom")),
            ..Config::default()
        };
        assert_eq!(config.ledgers_dir(), PathBuf::from("/tmp/custom/ledgers"));
        assert_eq!(config.backups_dir(), PathBuf::from("/tmp/custom/backups"));
    }

    #[test]
    fn missing_retention_falls_back_to_default() {
        let config: Config = serde_json::from_str("{}").unwrap();
        assert_eq!(config.backup_retention, DEFAULT_BACKUP_RETENTION);
    }
}
