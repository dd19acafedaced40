//! The effective transaction feed shown for a month: real entries plus open occurrences.

use std::cmp::Ordering;
use std::collections::HashSet;

use tracing::debug;

use crate::core::occurrences;
use crate::ledger::{BudgetAccount, Transaction, YearMonth};

/// Most recent first; ties fall back to the id so the order is stable across calls.
pub fn display_order(a: &Transaction, b: &Transaction) -> Ordering {
    b.date.cmp(&a.date).then_with(|| a.id.cmp(&b.id))
}

/// Real entries dated in `month` merged with the occurrences still open for that month.
///
/// Ids are unique in the result. An occurrence appears only when no real entry references
/// its template in `month` and it was not suppressed for `month`.
pub fn effective_list(account: &BudgetAccount, month: YearMonth) -> Vec<Transaction> {
    let real: Vec<&Transaction> = account.transactions_in(month).collect();
    let projected = occurrences::generate(
        &account.recurring_templates,
        real.iter().copied(),
        &account.deleted_virtual_ids,
        month,
    );

    let mut seen = HashSet::with_capacity(real.len() + projected.len());
    let mut feed: Vec<Transaction> = real
        .into_iter()
        .cloned()
        .chain(projected)
        .filter(|txn| seen.insert(txn.id.clone()))
        .collect();
    feed.sort_by(display_order);

    debug!(
        account = %account.id,
        %month,
        entries = feed.len(),
        virtual_entries = feed.iter().filter(|txn| txn.is_virtual()).count(),
        "built effective feed"
    );
    feed
}
