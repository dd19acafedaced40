use chrono::{DateTime, NaiveDateTime, Utc};
use std::{
    fs,
    path::{Path, PathBuf},
};
use tracing::{debug, info};

use crate::{
    core::state::{AppState, CURRENT_SCHEMA_VERSION},
    errors::{BudgetError, Result},
    utils::paths::{backups_dir_in, ensure_dir, resolve_base, snapshots_dir_in, write_atomic},
};

use super::StorageBackend;

const SNAPSHOT_EXTENSION: &str = "json";
const BACKUP_TIMESTAMP_FORMAT: &str = "%Y%m%d_%H%M%S";
const DEFAULT_RETENTION: usize = 5;

/// Stores snapshots as pretty-printed JSON files, keeping rolling backups of older versions.
#[derive(Clone)]
pub struct JsonStorage {
    snapshots_dir: PathBuf,
    backups_dir: PathBuf,
    retention: usize,
}

impl JsonStorage {
    pub fn new(root: Option<PathBuf>, retention: Option<usize>) -> Result<Self> {
        let app_root = resolve_base(root);
        ensure_dir(&app_root)?;
        let snapshots_dir = snapshots_dir_in(&app_root);
        let backups_dir = backups_dir_in(&app_root);
        ensure_dir(&snapshots_dir)?;
        ensure_dir(&backups_dir)?;
        Ok(Self {
            snapshots_dir,
            backups_dir,
            retention: retention.unwrap_or(DEFAULT_RETENTION).max(1),
        })
    }

    pub fn snapshot_path(&self, name: &str) -> PathBuf {
        self.snapshots_dir
            .join(format!("{}.{}", canonical_name(name), SNAPSHOT_EXTENSION))
    }

    pub fn backup_path(&self, name: &str, backup_name: &str) -> PathBuf {
        self.backup_dir(name).join(backup_name)
    }

    fn backup_dir(&self, name: &str) -> PathBuf {
        self.backups_dir.join(canonical_name(name))
    }

    fn write_backup_file(&self, state: &AppState, name: &str, note: Option<&str>) -> Result<()> {
        let dir = self.backup_dir(name);
        ensure_dir(&dir)?;
        let timestamp = Utc::now().format(BACKUP_TIMESTAMP_FORMAT).to_string();
        let mut file_stem = format!("{}_{}", canonical_name(name), timestamp);
        if let Some(label) = sanitize_backup_note(note) {
            file_stem.push('_');
            file_stem.push_str(&label);
        }
        let path = dir.join(format!("{}.{}", file_stem, SNAPSHOT_EXTENSION));
        let json = serde_json::to_string_pretty(state)?;
        write_atomic(&path, &json)?;
        info!(path = %path.display(), "wrote state backup");
        self.prune_backups(name)
    }

    fn backup_existing_file(&self, name: &str, path: &Path) -> Result<()> {
        if !path.exists() {
            return Ok(());
        }
        let dir = self.backup_dir(name);
        ensure_dir(&dir)?;
        let timestamp = Utc::now().format(BACKUP_TIMESTAMP_FORMAT).to_string();
        let backup_name = format!(
            "{}_{}.{}",
            canonical_name(name),
            timestamp,
            SNAPSHOT_EXTENSION
        );
        fs::copy(path, dir.join(&backup_name))?;
        self.prune_backups(name)
    }

    fn prune_backups(&self, name: &str) -> Result<()> {
        let backups = self.list_backups(name)?;
        for entry in backups.iter().skip(self.retention) {
            debug!(backup = %entry, "pruning old backup");
            let _ = fs::remove_file(self.backup_path(name, entry));
        }
        Ok(())
    }
}

impl StorageBackend for JsonStorage {
    fn save(&self, state: &AppState, name: &str) -> Result<()> {
        let path = self.snapshot_path(name);
        self.backup_existing_file(name, &path)?;
        save_state_to_path(state, &path)?;
        debug!(
            path = %path.display(),
            accounts = state.accounts.len(),
            "saved state snapshot"
        );
        Ok(())
    }

    fn load(&self, name: &str) -> Result<AppState> {
        load_state_from_path(&self.snapshot_path(name))
    }

    fn list_backups(&self, name: &str) -> Result<Vec<String>> {
        let dir = self.backup_dir(name);
        if !dir.exists() {
            return Ok(Vec::new());
        }
        let mut entries = Vec::new();
        for entry in fs::read_dir(dir)? {
            let path = entry?.path();
            if path.extension().and_then(|ext| ext.to_str()) != Some(SNAPSHOT_EXTENSION) {
                continue;
            }
            if let Some(file_name) = path.file_name().and_then(|name| name.to_str()) {
                entries.push(file_name.to_string());
            }
        }
        entries.sort_by(|a, b| {
            parse_backup_timestamp(b)
                .cmp(&parse_backup_timestamp(a))
                .then_with(|| b.cmp(a))
        });
        Ok(entries)
    }

    fn backup(&self, state: &AppState, name: &str, note: Option<&str>) -> Result<()> {
        self.write_backup_file(state, name, note)
    }

    fn restore(&self, name: &str, backup_name: &str) -> Result<AppState> {
        let backup_path = self.backup_path(name, backup_name);
        if !backup_path.exists() {
            return Err(BudgetError::StorageError(format!(
                "backup `{}` not found",
                backup_name
            )));
        }
        let state = load_state_from_path(&backup_path)?;
        save_state_to_path(&state, &self.snapshot_path(name))?;
        Ok(state)
    }
}

pub fn save_state_to_path(state: &AppState, path: &Path) -> Result<()> {
    let json = serde_json::to_string_pretty(state)?;
    write_atomic(path, &json)
}

/// Loads a snapshot, refusing files written by a newer schema.
pub fn load_state_from_path(path: &Path) -> Result<AppState> {
    let data = fs::read_to_string(path)?;
    let state: AppState = serde_json::from_str(&data)?;
    if state.schema_version > CURRENT_SCHEMA_VERSION {
        return Err(BudgetError::StorageError(format!(
            "snapshot schema v{} is newer than supported v{}",
            state.schema_version, CURRENT_SCHEMA_VERSION
        )));
    }
    Ok(state)
}

fn canonical_name(name: &str) -> String {
    let sanitized: String = name
        .trim()
        .to_lowercase()
        .chars()
        .map(|c| match c {
            'a'..='z' | '0'..='9' => c,
            _ => '_',
        })
        .collect();
    if sanitized.trim_matches('_').is_empty() {
        "state".into()
    } else {
        sanitized
    }
}

fn sanitize_backup_note(note: Option<&str>) -> Option<String> {
    let raw = note?.trim();
    let mut sanitized = String::new();
    let mut last_dash = false;
    for ch in raw.chars() {
        if ch.is_ascii_alphanumeric() {
            sanitized.push(ch.to_ascii_lowercase());
            last_dash = false;
        } else if (ch.is_whitespace() || matches!(ch, '-' | '.'))
            && !sanitized.is_empty()
            && !last_dash
        {
            sanitized.push('-');
            last_dash = true;
        }
    }
    let trimmed = sanitized.trim_matches('-').to_string();
    if trimmed.is_empty() {
        None
    } else {
        Some(trimmed)
    }
}

/// Backup names look like `<name>_<YYYYmmdd>_<HHMMSS>[_<note>].json`.
fn parse_backup_timestamp(file_name: &str) -> Option<DateTime<Utc>> {
    let stem = file_name.strip_suffix(&format!(".{}", SNAPSHOT_EXTENSION))?;
    let parts: Vec<&str> = stem.split('_').collect();
    parts.windows(2).rev().find_map(|pair| {
        if !is_digits(pair[0], 8) || !is_digits(pair[1], 6) {
            return None;
        }
        NaiveDateTime::parse_from_str(&format!("{}{}", pair[0], pair[1]), "%Y%m%d%H%M%S")
            .ok()
            .map(|naive| DateTime::from_naive_utc_and_offset(naive, Utc))
    })
}

fn is_digits(value: &str, len: usize) -> bool {
    value.len() == len && value.chars().all(|c| c.is_ascii_digit())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ledger::BudgetAccount;
    use tempfile::TempDir;

    fn storage_with_temp_dir() -> (JsonStorage, TempDir) {
        let temp = TempDir::new().expect("temp dir");
        let storage =
            JsonStorage::new(Some(temp.path().to_path_buf()), Some(3)).expect("json storage");
        (storage, temp)
    }

    fn sample_state() -> AppState {
        AppState::default().with_account(BudgetAccount::new("Courant", "owner").with_id("acc"))
    }

    #[test]
    fn save_and_load_roundtrip() {
        let (storage, _guard) = storage_with_temp_dir();
        storage
            .save(&sample_state(), "household")
            .expect("save state");
        let loaded = storage.load("household").expect("load state");
        assert_eq!(loaded.accounts.len(), 1);
        assert_eq!(loaded.accounts[0].name, "Courant");
    }

    #[test]
    fn backup_names_carry_sanitized_notes() {
        let (storage, _guard) = storage_with_temp_dir();
        storage
            .backup(&sample_state(), "Family Budget", Some("Quarter Close"))
            .expect("create backup");
        let backups = storage.list_backups("Family Budget").expect("list backups");
        assert_eq!(backups.len(), 1);
        assert!(backups[0].starts_with("family_budget_"));
        assert!(backups[0].ends_with("_quarter-close.json"));
        assert!(parse_backup_timestamp(&backups[0]).is_some());
    }

    #[test]
    fn rejects_future_schema_versions() {
        let (storage, _guard) = storage_with_temp_dir();
        let mut state = sample_state();
        state.schema_version = CURRENT_SCHEMA_VERSION + 1;
        let path = storage.snapshot_path("future");
        fs::write(&path, serde_json::to_string(&state).unwrap()).unwrap();
        let err = storage
            .load("future")
            .expect_err("newer schema must be refused");
        assert!(err.to_string().contains("newer"), "unexpected error: {err}");
    }

    #[test]
    fn restore_missing_backup_fails() {
        let (storage, _guard) = storage_with_temp_dir();
        let err = storage
            .restore("household", "household_20240101_000000.json")
            .expect_err("missing backup");
        assert!(matches!(err, BudgetError::StorageError(_)));
    }
}
