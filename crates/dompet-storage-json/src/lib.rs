//! Filesystem-backed JSON persistence for per-user ledgers.
//!
//! Each user's ledger is one JSON document, written atomically via a
//! temp-file-then-rename so a crashed save can never expose a transaction
//! row without its wallet balance update. Overwriting an existing ledger
//! first copies it into a timestamped backup, pruned to a retention limit.

use std::{
    cmp::Reverse,
    fs::{self, File},
    io::Write,
    path::{Path, PathBuf},
};

use chrono::{DateTime, NaiveDateTime, Utc};
use dompet_config::Config;
use dompet_core::{CoreError, LedgerStore, Result};
use dompet_domain::Ledger;

const LEDGER_EXTENSION: &str = "json";
const BACKUP_TIMESTAMP_FORMAT: &str = "%Y%m%d_%H%M%S";
const TMP_SUFFIX: &str = "tmp";
const DEFAULT_RETENTION: usize = 5;

/// Root directories for ledgers and their backups.
#[derive(Debug, Clone)]
pub struct StoragePaths {
    pub ledger_root: PathBuf,
    pub backup_root: PathBuf,
}

impl StoragePaths {
    pub fn under(base: &Path) -> Self {
        Self {
            ledger_root: base.join("ledgers"),
            backup_root: base.join("backups"),
        }
    }
}

/// Describes a persisted backup artifact for one user's ledger.
#[derive(Debug, Clone)]
pub struct BackupInfo {
    pub user: String,
    pub file_name: String,
    pub created_at: Option<DateTime<Utc>>,
    pub path: PathBuf,
}

/// Durable [`LedgerStore`] implementation over JSON files.
#[derive(Clone)]
pub struct JsonLedgerStore {
    paths: StoragePaths,
    retention: usize,
}

impl JsonLedgerStore {
    pub fn new(paths: StoragePaths) -> Result<Self> {
        Self::with_retention(paths, DEFAULT_RETENTION)
    }

    pub fn with_retention(paths: StoragePaths, retention: usize) -> Result<Self> {
        fs::create_dir_all(&paths.ledger_root)?;
        fs::create_dir_all(&paths.backup_root)?;
        Ok(Self {
            paths,
            retention: retention.max(1),
        })
    }

    /// Builds a store from the application configuration.
    pub fn from_config(config: &Config) -> Result<Self> {
        let paths = StoragePaths {
            ledger_root: config.ledgers_dir(),
            backup_root: config.backups_dir(),
        };
        Self::with_retention(paths, config.backup_retention)
    }

    pub fn ledger_path(&self, user_id: &str) -> PathBuf {
        self.paths
            .ledger_root
            .join(format!("{}.{}", user_slug(user_id), LEDGER_EXTENSION))
    }

    /// Backups for the given user, newest first.
    pub fn list_backups(&self, user_id: &str) -> Result<Vec<BackupInfo>> {
        let dir = self.backup_dir(user_id);
        if !dir.exists() {
            return Ok(Vec::new());
        }
        let slug = user_slug(user_id);
        let mut entries = Vec::new();
        for entry in fs::read_dir(dir)? {
            let entry = entry?;
            let path = entry.path();
            if path.extension().and_then(|ext| ext.to_str()) != Some(LEDGER_EXTENSION) {
                continue;
            }
            if let Some(file_name) = path.file_name().and_then(|name| name.to_str()) {
                entries.push(BackupInfo {
                    user: slug.clone(),
                    file_name: file_name.to_string(),
                    created_at: parse_backup_timestamp(file_name),
                    path: path.clone(),
                });
            }
        }
        entries.sort_by_key(|info| Reverse(info.created_at));
        Ok(entries)
    }

    /// Copies a backup over the user's current ledger file and loads it.
    pub fn restore_backup(&self, backup: &BackupInfo) -> Result<Ledger> {
        if !backup.path.exists() {
            return Err(CoreError::Storage(format!(
                "backup `{}` not found",
                backup.file_name
            )));
        }
        let target = self.ledger_path(&backup.user);
        if let Some(parent) = target.parent() {
            fs::create_dir_all(parent)?;
        }
        fs::copy(&backup.path, &target)?;
        load_ledger_file(&target, &backup.user)
    }

    fn backup_dir(&self, user_id: &str) -> PathBuf {
        self.paths.backup_root.join(user_slug(user_id))
    }

    fn backup_existing_file(&self, user_id: &str, path: &Path) -> Result<()> {
        if !path.exists() {
            return Ok(());
        }
        let dir = self.backup_dir(user_id);
        fs::create_dir_all(&dir)?;
        let timestamp = Utc::now().format(BACKUP_TIMESTAMP_FORMAT).to_string();
        let file_name = format!("{}_{}.{}", user_slug(user_id), timestamp, LEDGER_EXTENSION);
        fs::copy(path, dir.join(file_name))?;
        self.prune_backups(user_id)?;
        Ok(())
    }

    fn prune_backups(&self, user_id: &str) -> Result<()> {
        let entries = self.list_backups(user_id)?;
        for stale in entries.into_iter().skip(self.retention) {
            let _ = fs::remove_file(stale.path);
        }
        Ok(())
    }
}

impl LedgerStore for JsonLedgerStore {
    fn save_ledger(&self, ledger: &Ledger) -> Result<()> {
        let path = self.ledger_path(&ledger.user_id);
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        self.backup_existing_file(&ledger.user_id, &path)?;
        let json = serde_json::to_string_pretty(ledger)?;
        let tmp = tmp_path(&path);
        write_atomic(&tmp, &json)?;
        fs::rename(&tmp, &path)?;
        Ok(())
    }

    fn load_ledger(&self, user_id: &str) -> Result<Ledger> {
        load_ledger_file(&self.ledger_path(user_id), user_id)
    }

    fn list_users(&self) -> Result<Vec<String>> {
        if !self.paths.ledger_root.exists() {
            return Ok(Vec::new());
        }
        let mut users = Vec::new();
        for entry in fs::read_dir(&self.paths.ledger_root)? {
            let entry = entry?;
            let path = entry.path();
            if !path.is_file() {
                continue;
            }
            if path.extension().and_then(|ext| ext.to_str()) != Some(LEDGER_EXTENSION) {
                continue;
            }
            if let Some(stem) = path.file_stem().and_then(|stem| stem.to_str()) {
                users.push(stem.to_string());
            }
        }
        users.sort();
        Ok(users)
    }

    fn delete_ledger(&self, user_id: &str) -> Result<()> {
        let path = self.ledger_path(user_id);
        if path.exists() {
            fs::remove_file(path)?;
        }
        Ok(())
    }
}

fn load_ledger_file(path: &Path, user_id: &str) -> Result<Ledger> {
    if !path.exists() {
        return Err(CoreError::LedgerNotFound(user_id.to_string()));
    }
    let data = fs::read_to_string(path)?;
    Ok(serde_json::from_str(&data)?)
}

fn user_slug(user_id: &str) -> String {
    let sanitized: String = user_id
        .trim()
        .to_lowercase()
        .chars()
        .map(|c| match c {
            'a'..='z' | '0'..='9' => c,
            _ => '_',
        })
        .collect();
    if sanitized.trim_matches('_').is_empty() {
        "user".into()
    } else {
        sanitized
    }
}

fn parse_backup_timestamp(name: &str) -> Option<DateTime<Utc>> {
    let trimmed = name.strip_suffix(&format!(".{}", LEDGER_EXTENSION))?;
    let mut segments = trimmed.split('_').collect::<Vec<_>>();
    if segments.len() < 2 {
        return None;
    }
    let time = segments.pop()?;
    let date = segments.pop()?;
    if !is_digits(date, 8) || !is_digits(time, 6) {
        return None;
    }
    let raw = format!("{}{}", date, time);
    NaiveDateTime::parse_from_str(&raw, "%Y%m%d%H%M%S")
        .ok()
        .map(|naive| DateTime::from_naive_utc_and_offset(naive, Utc))
}

fn is_digits(value: &str, len: usize) -> bool {
    value.len() == len && value.chars().all(|c| c.is_ascii_digit())
}

fn tmp_path(path: &Path) -> PathBuf {
    let mut tmp = path.to_path_buf();
    let ext = match path.extension().and_then(|ext| ext.to_str()) {
        Some(existing) => format!("{}.{}", existing, TMP_SUFFIX),
        None => TMP_SUFFIX.to_string(),
    };
    tmp.set_extension(ext);
    tmp
}

fn write_atomic(path: &Path, data: &str) -> Result<()> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)?;
    }
    let mut file = File::create(path)?;
    file.write_all(data.as_bytes())?;
    file.flush()?;
    Ok(())
}
