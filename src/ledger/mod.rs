//! Ledger domain models, persistence-friendly types, and calendar helpers.

pub mod account;
pub mod calendar;
pub mod category;
pub mod recurring;
pub mod transaction;

pub use account::BudgetAccount;
pub use calendar::{BudgetCycle, MonthRange, YearMonth};
pub use category::{
    default_categories, resolve_display, Category, CategoryDisplay, CategoryKind, CategoryLookup,
};
pub use recurring::RecurringTemplate;
pub use transaction::{
    Transaction, TransactionDraft, TransactionKind, TransactionRef, VirtualId, VirtualIdError,
};
