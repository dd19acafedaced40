#![allow(dead_code)]

use budget_projection::{
    core::state::{AppState, StateStore},
    ledger::{BudgetAccount, RecurringTemplate, TransactionKind, YearMonth},
    storage::JsonStorage,
};
use chrono::NaiveDate;
use rust_decimal_macros::dec;
use tempfile::TempDir;

pub const ACCOUNT_ID: &str = "main";
pub const SNAPSHOT: &str = "household";

pub fn date(year: i32, month: u32, day: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(year, month, day).expect("valid date")
}

pub fn ym(year: i32, month: u32) -> YearMonth {
    YearMonth::new(year, month).expect("valid month")
}

/// Monthly income of 1000 on the 28th, the account used throughout the scenarios.
pub fn salary_template() -> RecurringTemplate {
    RecurringTemplate::new(dec!(1000), TransactionKind::Income, "salaire", 28).with_id("t1")
}

pub fn salary_account() -> BudgetAccount {
    BudgetAccount::new("Courant", "owner")
        .with_id(ACCOUNT_ID)
        .with_template(salary_template())
}

/// Creates storage in a fresh directory; keep the guard alive for the test's duration.
pub fn temp_storage() -> (JsonStorage, TempDir) {
    let temp = TempDir::new().expect("create temp dir");
    let storage =
        JsonStorage::new(Some(temp.path().to_path_buf()), Some(3)).expect("create json storage");
    (storage, temp)
}

/// A store holding [`salary_account`] and persisting every transition to a temp directory.
pub fn setup_store() -> (StateStore, JsonStorage, TempDir) {
    let (storage, temp) = temp_storage();
    let initial = AppState::default()
        .with_account(salary_account())
        .with_active_account(ACCOUNT_ID);
    let store = StateStore::new(initial).with_sink(Box::new(storage.clone()), SNAPSHOT);
    (store, storage, temp)
}
