//! State transitions of ledger slots when entries are saved or deleted.
//!
//! A slot is either a template-month pair or a freestanding entry. Every operation reads an
//! account snapshot and returns the next one; the input is never modified.

use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::ledger::{
    transaction::fresh_id, BudgetAccount, RecurringTemplate, Transaction, TransactionDraft,
    TransactionRef, VirtualId,
};

/// Where a slot stands for an account snapshot.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SlotState {
    /// Projected occurrence, still open.
    NotYetOccurred,
    /// Backed by a stored real entry.
    Materialized,
    /// Projected occurrence dismissed for its month.
    Suppressed,
    /// No stored entry carries this id.
    Deleted,
}

/// Reports the state of the slot addressed by `id`.
pub fn slot_state(account: &BudgetAccount, id: &str) -> SlotState {
    match TransactionRef::parse(id) {
        TransactionRef::Virtual(virtual_id) => virtual_slot_state(account, &virtual_id),
        TransactionRef::Real(id) => {
            if account.transaction(&id).is_some() {
                SlotState::Materialized
            } else {
                SlotState::Deleted
            }
        }
    }
}

fn virtual_slot_state(account: &BudgetAccount, id: &VirtualId) -> SlotState {
    let paid = account
        .transactions_in(id.month)
        .any(|txn| txn.template_id.as_deref() == Some(id.template_id.as_str()));
    if paid {
        SlotState::Materialized
    } else if account.is_suppressed(id) {
        SlotState::Suppressed
    } else {
        SlotState::NotYetOccurred
    }
}

/// Saves a draft and returns the next account snapshot.
///
/// - A draft targeting a virtual id materializes it: the id is suppressed and a new stored
///   entry linked to the template is prepended.
/// - A draft targeting a stored id replaces that entry in place, keeping its id.
/// - Anything else (no id, unknown id, undecodable virtual id) prepends a new entry.
///
/// Recurring drafts that do not materialize an occurrence are linked to a template,
/// creating one when none matches.
pub fn upsert(account: &BudgetAccount, draft: TransactionDraft) -> BudgetAccount {
    let mut next = account.clone();
    let target = draft.id.as_deref().map(TransactionRef::parse);

    match target {
        Some(TransactionRef::Virtual(virtual_id)) => {
            let mut draft = draft;
            draft.template_id = Some(virtual_id.template_id.clone());
            // The template segment of the id wins, even when that template is gone.
            let txn = draft.into_transaction(fresh_id());
            info!(
                account = %next.id,
                occurrence = %virtual_id,
                transaction = %txn.id,
                "materialized recurring occurrence"
            );
            next.deleted_virtual_ids.insert(virtual_id);
            next.transactions.insert(0, txn);
        }
        Some(TransactionRef::Real(id)) if account.transaction(&id).is_some() => {
            let mut draft = draft;
            if let Some(position) = next.transactions.iter().position(|txn| txn.id == id) {
                let previous = &next.transactions[position];
                draft.template_id = draft.template_id.or_else(|| previous.template_id.clone());
                let mut txn = draft.into_transaction(id);
                link_template(&mut next, &mut txn);
                debug!(account = %next.id, transaction = %txn.id, "updated transaction");
                next.transactions[position] = txn;
            }
        }
        _ => {
            let mut txn = draft.into_transaction(fresh_id());
            link_template(&mut next, &mut txn);
            debug!(account = %next.id, transaction = %txn.id, "recorded transaction");
            next.transactions.insert(0, txn);
        }
    }
    next
}

/// Deletes the entry addressed by `id` and returns the next account snapshot.
///
/// Stored entries are removed. Virtual occurrences were never stored, so deleting one
/// suppresses it for its month only.
pub fn delete(account: &BudgetAccount, id: &str) -> BudgetAccount {
    let mut next = account.clone();
    match TransactionRef::parse(id) {
        TransactionRef::Virtual(virtual_id) => {
            debug!(account = %next.id, occurrence = %virtual_id, "suppressed recurring occurrence");
            next.deleted_virtual_ids.insert(virtual_id);
        }
        TransactionRef::Real(id) => {
            let before = next.transactions.len();
            next.transactions.retain(|txn| txn.id != id);
            if next.transactions.len() == before {
                debug!(account = %next.id, transaction = %id, "delete target not found");
            } else {
                debug!(account = %next.id, transaction = %id, "deleted transaction");
            }
        }
    }
    next
}

/// Ties a recurring entry to its template, synthesizing the template on first use.
///
/// Entries already referencing an existing template keep it. Otherwise the first template
/// with the same category, amount and kind is reused, so re-submitting an identical
/// recurring entry never creates a duplicate rule.
fn link_template(account: &mut BudgetAccount, txn: &mut Transaction) {
    if !txn.is_recurring {
        return;
    }
    if let Some(template_id) = txn.template_id.as_deref() {
        if account.template(template_id).is_some() {
            return;
        }
    }

    let existing = account
        .matching_template(&txn.category_id, txn.amount, txn.kind)
        .map(|template| template.id.clone());
    let template_id = match existing {
        Some(id) => id,
        None => {
            let template = RecurringTemplate::from_transaction(txn);
            info!(
                account = %account.id,
                template = %template.id,
                day = template.day_of_month,
                "created recurring template from transaction"
            );
            let id = template.id.clone();
            account.recurring_templates.push(template);
            id
        }
    };
    txn.template_id = Some(template_id);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::feed::effective_list;
    use crate::ledger::{TransactionKind, YearMonth};
    use chrono::NaiveDate;
    use rust_decimal::Decimal;
    use rust_decimal_macros::dec;

    fn march() -> YearMonth {
        YearMonth::new(2024, 3).unwrap()
    }

    fn date(day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 3, day).unwrap()
    }

    fn salary(amount: Decimal, day: u32) -> TransactionDraft {
        TransactionDraft::new(amount, TransactionKind::Income, "salaire", date(day))
    }

    fn expense(amount: Decimal, category: &str, day: u32) -> TransactionDraft {
        TransactionDraft::new(amount, TransactionKind::Expense, category, date(day))
    }

    fn account_with_salary() -> BudgetAccount {
        let template = RecurringTemplate::new(dec!(1000), TransactionKind::Income, "salaire", 28);
        BudgetAccount::new("Courant", "owner").with_template(template.with_id("t1"))
    }

    #[test]
    fn materializing_a_virtual_occurrence_replaces_the_projection() {
        let account = account_with_salary();
        let draft = salary(dec!(1000), 27)
            .targeting("virtual-t1-2-2024")
            .recurring(true);

        let next = upsert(&account, draft);

        assert!(next.is_suppressed(&VirtualId::new("t1", march())));
        assert_eq!(next.transactions.len(), 1);
        let stored = &next.transactions[0];
        assert_eq!(stored.template_id.as_deref(), Some("t1"));
        assert!(!stored.is_virtual());
        assert_eq!(
            next.recurring_templates.len(),
            1,
            "no template may be synthesized"
        );

        let feed = effective_list(&next, march());
        assert_eq!(feed.len(), 1);
        assert_eq!(feed[0].id, stored.id);
        let state = slot_state(&next, "virtual-t1-2-2024");
        assert_eq!(state, SlotState::Materialized);

        // The snapshot we started from is untouched.
        assert!(account.transactions.is_empty());
        assert!(account.deleted_virtual_ids.is_empty());
    }

    #[test]
    fn editing_keeps_id_and_template_link() {
        let paid = salary(dec!(1000), 28).targeting("virtual-t1-2-2024");
        let account = upsert(&account_with_salary(), paid);
        let stored_id = account.transactions[0].id.clone();

        let edit = salary(dec!(1050), 29)
            .targeting(stored_id.clone())
            .with_comment("Salaire + prime");
        let next = upsert(&account, edit);

        assert_eq!(next.transactions.len(), 1);
        let edited = &next.transactions[0];
        assert_eq!(edited.id, stored_id);
        assert_eq!(edited.amount, dec!(1050));
        assert_eq!(edited.template_id.as_deref(), Some("t1"));
    }

    #[test]
    fn unknown_or_malformed_targets_create_new_entries() {
        let account = account_with_salary();
        let first = upsert(
            &account,
            expense(dec!(15), "loisirs", 2).targeting("no-such-id"),
        );
        let second = upsert(
            &first,
            expense(dec!(20), "loisirs", 3).targeting("virtual-t1-garbage"),
        );
        assert_eq!(second.transactions.len(), 2);
        assert_eq!(second.transactions[0].amount, dec!(20));
        assert!(second.transactions.iter().all(|txn| txn.id != "no-such-id"));
        assert!(second.deleted_virtual_ids.is_empty());
    }

    #[test]
    fn recurring_entry_spawns_a_single_template() {
        let account = BudgetAccount::new("Courant", "owner");
        let draft = expense(dec!(9.99), "abonnements", 14)
            .with_comment("Streaming")
            .recurring(true);

        let once = upsert(&account, draft.clone());
        let twice = upsert(&once, draft);

        assert_eq!(twice.recurring_templates.len(), 1);
        let template = &twice.recurring_templates[0];
        assert_eq!(template.day_of_month, 14);
        assert!(template.is_active);
        assert!(twice
            .transactions
            .iter()
            .all(|txn| txn.template_id.as_deref() == Some(template.id.as_str())));

        // Linked entries satisfy the month, so no projection duplicates them.
        let feed = effective_list(&twice, march());
        assert!(feed.iter().all(|txn| !txn.is_virtual()));
    }

    #[test]
    fn recurring_entry_reuses_matching_template() {
        let account = account_with_salary();
        let next = upsert(&account, salary(dec!(1000), 25).recurring(true));
        assert_eq!(next.recurring_templates.len(), 1);
        assert_eq!(next.transactions[0].template_id.as_deref(), Some("t1"));
    }

    #[test]
    fn deleting_a_virtual_occurrence_suppresses_one_month() {
        let account = account_with_salary();
        let next = delete(&account, "virtual-t1-2-2024");

        let march_state = slot_state(&next, "virtual-t1-2-2024");
        assert_eq!(march_state, SlotState::Suppressed);
        let april_state = slot_state(&next, "virtual-t1-3-2024");
        assert_eq!(april_state, SlotState::NotYetOccurred);
        assert!(effective_list(&next, march()).is_empty());
        assert_eq!(effective_list(&next, march().succ()).len(), 1);
        assert_eq!(next.recurring_templates, account.recurring_templates);
    }

    #[test]
    fn materializing_keeps_the_template_segment_of_a_removed_template() {
        let account = BudgetAccount::new("Courant", "owner");
        let draft = expense(dec!(40), "sante", 6)
            .targeting("virtual-gone-2-2024")
            .recurring(true);

        let next = upsert(&account, draft);

        assert_eq!(next.transactions[0].template_id.as_deref(), Some("gone"));
        assert!(next.recurring_templates.is_empty());
        assert!(next.is_suppressed(&VirtualId::new("gone", march())));
    }

    #[test]
    fn template_with_empty_id_can_be_suppressed_and_paid() {
        let template = RecurringTemplate::new(dec!(30), TransactionKind::Expense, "transport", 4);
        let account = BudgetAccount::new("Courant", "owner").with_template(template.with_id(""));
        let feed = effective_list(&account, march());
        assert_eq!(feed[0].id, "virtual--2-2024");

        let skipped = delete(&account, "virtual--2-2024");
        assert!(effective_list(&skipped, march()).is_empty());
        let state = slot_state(&skipped, "virtual--2-2024");
        assert_eq!(state, SlotState::Suppressed);

        let draft = expense(dec!(30), "transport", 4).targeting("virtual--2-2024");
        let paid = upsert(&account, draft);
        let feed = effective_list(&paid, march());
        assert_eq!(feed.len(), 1);
        assert!(!feed[0].is_virtual());
        assert_eq!(feed[0].template_id.as_deref(), Some(""));
    }

    #[test]
    fn deleting_a_stored_entry_removes_it() {
        let empty = BudgetAccount::new("Courant", "owner");
        let account = upsert(&empty, expense(dec!(42), "alimentation", 9));
        let id = account.transactions[0].id.clone();
        let next = delete(&account, &id);
        assert!(next.transactions.is_empty());
        assert_eq!(slot_state(&next, &id), SlotState::Deleted);

        let unchanged = delete(&next, "missing");
        assert_eq!(unchanged, next);
    }
}
