use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::ledger::BudgetAccount;
use crate::storage::StorageBackend;

pub const CURRENT_SCHEMA_VERSION: u8 = 1;

/// Whole-program snapshot: every account plus the one currently shown.
///
/// Accounts are shared behind `Arc`, so deriving a new state clones only the accounts that
/// actually change and readers can compare accounts by pointer.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AppState {
    #[serde(default = "AppState::schema_version_default")]
    pub schema_version: u8,
    #[serde(default)]
    pub accounts: Vec<Arc<BudgetAccount>>,
    #[serde(default)]
    pub active_account_id: Option<String>,
}

impl Default for AppState {
    fn default() -> Self {
        Self {
            schema_version: CURRENT_SCHEMA_VERSION,
            accounts: Vec::new(),
            active_account_id: None,
        }
    }
}

impl AppState {
    pub fn account(&self, id: &str) -> Option<&Arc<BudgetAccount>> {
        self.accounts.iter().find(|account| account.id == id)
    }

    pub fn active_account(&self) -> Option<&Arc<BudgetAccount>> {
        self.active_account_id
            .as_deref()
            .and_then(|id| self.account(id))
            .or_else(|| self.accounts.first())
    }

    /// Adds `account`, or replaces the account with the same id.
    pub fn with_account(&self, account: BudgetAccount) -> Self {
        let mut next = self.clone();
        let account = Arc::new(account);
        match next
            .accounts
            .iter()
            .position(|existing| existing.id == account.id)
        {
            Some(position) => next.accounts[position] = account,
            None => next.accounts.push(account),
        }
        next
    }

    pub fn without_account(&self, id: &str) -> Self {
        let mut next = self.clone();
        next.accounts.retain(|account| account.id != id);
        if next.active_account_id.as_deref() == Some(id) {
            next.active_account_id = None;
        }
        next
    }

    pub fn with_active_account(&self, id: &str) -> Self {
        if self.account(id).is_none() {
            return self.clone();
        }
        let mut next = self.clone();
        next.active_account_id = Some(id.to_string());
        next
    }

    /// Derives the next state by rewriting one account.
    ///
    /// An unknown `account_id` leaves the state unchanged: callers only target accounts they
    /// read from this snapshot, so a miss is a stale request, not a user-facing failure.
    pub fn update_account<F>(&self, account_id: &str, update: F) -> Self
    where
        F: FnOnce(&BudgetAccount) -> BudgetAccount,
    {
        let Some(position) = self.accounts.iter().position(|a| a.id == account_id) else {
            debug!(account = account_id, "update ignored for unknown account");
            return self.clone();
        };
        let mut next = self.clone();
        next.accounts[position] = Arc::new(update(&self.accounts[position]));
        next
    }

    pub fn schema_version_default() -> u8 {
        CURRENT_SCHEMA_VERSION
    }
}

/// Holds the published state and forwards every transition to an optional persistence sink.
///
/// Transitions are whole-snapshot replacements: a reader holding an older `Arc<AppState>`
/// keeps seeing exactly what it read. Persistence happens after publication and its failures
/// are logged, never rolled back.
pub struct StateStore {
    current: Arc<AppState>,
    sink: Option<Box<dyn StorageBackend>>,
    snapshot_name: String,
}

impl StateStore {
    pub fn new(initial: AppState) -> Self {
        Self {
            current: Arc::new(initial),
            sink: None,
            snapshot_name: String::from("default"),
        }
    }

    pub fn with_sink(
        mut self,
        sink: Box<dyn StorageBackend>,
        snapshot_name: impl Into<String>,
    ) -> Self {
        self.sink = Some(sink);
        self.snapshot_name = snapshot_name.into();
        self
    }

    pub fn snapshot(&self) -> Arc<AppState> {
        Arc::clone(&self.current)
    }

    /// Publishes the state derived by `transition` and returns it.
    pub fn apply<F>(&mut self, transition: F) -> Arc<AppState>
    where
        F: FnOnce(&AppState) -> AppState,
    {
        let next = Arc::new(transition(&self.current));
        self.current = Arc::clone(&next);
        self.persist();
        next
    }

    pub fn replace(&mut self, state: AppState) -> Arc<AppState> {
        self.apply(|_| state)
    }

    fn persist(&self) {
        let Some(sink) = self.sink.as_ref() else {
            return;
        };
        if let Err(err) = sink.save(&self.current, &self.snapshot_name) {
            warn!(
                %err,
                snapshot = %self.snapshot_name,
                "failed to persist state; keeping in-memory state"
            );
        }
    }
}
