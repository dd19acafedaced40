//! Business logic helpers for saving and deleting account entries.

use tracing::{info, instrument};

use crate::core::{feed, reconcile, state::AppState};
use crate::ledger::{Transaction, TransactionDraft, YearMonth};

/// State-level entry points for the reconciliation engine.
pub struct TransactionService;

impl TransactionService {
    /// Saves `draft` into the account and derives the next state.
    #[instrument(skip(state, draft), fields(draft_id = draft.id.as_deref().unwrap_or("new")))]
    pub fn upsert(state: &AppState, account_id: &str, draft: TransactionDraft) -> AppState {
        state.update_account(account_id, |account| {
            let next = reconcile::upsert(account, draft);
            info!(account = account_id, "saved transaction");
            next
        })
    }

    /// Deletes `id` from the account. Virtual ids suppress a single month.
    #[instrument(skip(state))]
    pub fn delete(state: &AppState, account_id: &str, id: &str) -> AppState {
        state.update_account(account_id, |account| {
            let next = reconcile::delete(account, id);
            info!(account = account_id, "deleted transaction");
            next
        })
    }

    /// The month's effective list, empty for an unknown account.
    pub fn feed(state: &AppState, account_id: &str, month: YearMonth) -> Vec<Transaction> {
        state
            .account(account_id)
            .map(|account| feed::effective_list(account, month))
            .unwrap_or_default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ledger::{BudgetAccount, RecurringTemplate, TransactionKind, VirtualId};
    use chrono::NaiveDate;
    use rust_decimal_macros::dec;
    use std::sync::Arc;

    fn march() -> YearMonth {
        YearMonth::new(2024, 3).unwrap()
    }

    fn state() -> AppState {
        let rent = RecurringTemplate::new(dec!(750), TransactionKind::Expense, "logement", 1)
            .with_id("rent");
        let main = BudgetAccount::new("Courant", "owner")
            .with_id("main")
            .with_template(rent);
        AppState::default()
            .with_account(main)
            .with_account(BudgetAccount::new("Epargne", "owner").with_id("savings"))
    }

    #[test]
    fn upsert_touches_only_the_target_account() {
        let before = state();
        let date = NaiveDate::from_ymd_opt(2024, 3, 5).unwrap();
        let draft =
            TransactionDraft::new(dec!(42.5), TransactionKind::Expense, "alimentation", date);
        let after = TransactionService::upsert(&before, "main", draft);

        assert_eq!(after.account("main").unwrap().transactions.len(), 1);
        assert!(Arc::ptr_eq(
            before.account("savings").unwrap(),
            after.account("savings").unwrap()
        ));
        assert!(before.account("main").unwrap().transactions.is_empty());
    }

    #[test]
    fn deleting_a_virtual_hides_it_from_the_feed() {
        let before = state();
        let id = VirtualId::new("rent", march()).to_string();
        assert_eq!(TransactionService::feed(&before, "main", march()).len(), 1);

        let after = TransactionService::delete(&before, "main", &id);
        assert!(TransactionService::feed(&after, "main", march()).is_empty());
        let april = TransactionService::feed(&after, "main", march().succ());
        assert_eq!(april.len(), 1);
    }

    #[test]
    fn delete_on_unknown_account_is_ignored() {
        let before = state();
        let after = TransactionService::delete(&before, "missing", "x");
        assert_eq!(after.accounts.len(), before.accounts.len());
        let feed = TransactionService::feed(&after, "missing", march());
        assert!(feed.is_empty());
    }

    #[test]
    fn upsert_on_unknown_account_leaves_state_unchanged() {
        let before = state();
        let date = NaiveDate::from_ymd_opt(2024, 3, 5).unwrap();
        let draft = TransactionDraft::new(dec!(12), TransactionKind::Expense, "transport", date)
            .recurring(true);

        let after = TransactionService::upsert(&before, "missing", draft);

        assert!(after.account("missing").is_none());
        assert_eq!(after.accounts.len(), before.accounts.len());
        for (old, new) in before.accounts.iter().zip(&after.accounts) {
            assert!(Arc::ptr_eq(old, new));
        }
    }
}
