//! Projection of recurring templates into virtual occurrences for a month.

use std::collections::{BTreeSet, HashSet};

use tracing::trace;

use crate::ledger::{BudgetAccount, RecurringTemplate, Transaction, VirtualId, YearMonth};

/// Template ids already paid by a real entry dated in `month`.
///
/// A template counts as satisfied only when a real transaction references it through
/// `template_id`; comment or amount coincidences never satisfy a template.
pub fn satisfied_templates<'a, I>(real: I, month: YearMonth) -> HashSet<&'a str>
where
    I: IntoIterator<Item = &'a Transaction>,
{
    real.into_iter()
        .filter(|txn| !txn.is_virtual() && month.contains(txn.date))
        .filter_map(|txn| txn.template_id.as_deref())
        .collect()
}

/// Builds the projected entry of `template` for `month`, without consulting any ledger state.
pub fn occurrence_for(template: &RecurringTemplate, month: YearMonth) -> Transaction {
    Transaction {
        id: template.virtual_id(month).to_string(),
        amount: template.magnitude(),
        kind: template.kind,
        category_id: template.category_id.clone(),
        comment: Some(template.label().to_string()),
        date: template.occurrence_date(month),
        is_recurring: true,
        template_id: Some(template.id.clone()),
    }
}

/// Produces the virtual occurrences for `month`.
///
/// Inactive templates, templates satisfied by a real entry in `real_in_month`, and
/// occurrences listed in `deleted` are skipped. Entries of `real_in_month` dated outside
/// `month` are ignored. Pure: identical inputs always yield identical output.
pub fn generate<'a, I>(
    templates: &[RecurringTemplate],
    real_in_month: I,
    deleted: &BTreeSet<VirtualId>,
    month: YearMonth,
) -> Vec<Transaction>
where
    I: IntoIterator<Item = &'a Transaction>,
{
    let satisfied = satisfied_templates(real_in_month, month);
    templates
        .iter()
        .filter(|template| template.is_active)
        .filter(|template| !satisfied.contains(template.id.as_str()))
        .filter(|template| {
            let suppressed = deleted.contains(&template.virtual_id(month));
            if suppressed {
                trace!(template = %template.id, %month, "occurrence suppressed");
            }
            !suppressed
        })
        .map(|template| occurrence_for(template, month))
        .collect()
}

/// Convenience wrapper running [`generate`] against an account snapshot.
pub fn for_account(account: &BudgetAccount, month: YearMonth) -> Vec<Transaction> {
    generate(
        &account.recurring_templates,
        account.transactions_in(month),
        &account.deleted_virtual_ids,
        month,
    )
}
