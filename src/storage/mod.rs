//! Persistence sinks for whole application-state snapshots.

pub mod json_backend;

use crate::{core::state::AppState, errors::Result};

/// Abstraction over backends able to store full state snapshots. No partial updates.
pub trait StorageBackend: Send + Sync {
    fn save(&self, state: &AppState, name: &str) -> Result<()>;
    fn load(&self, name: &str) -> Result<AppState>;
    fn list_backups(&self, name: &str) -> Result<Vec<String>>;
    fn backup(&self, state: &AppState, name: &str, note: Option<&str>) -> Result<()>;
    fn restore(&self, name: &str, backup_name: &str) -> Result<AppState>;
}

pub use json_backend::JsonStorage;
