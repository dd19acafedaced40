//! Business logic helpers for the recurring template store.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::ledger::{BudgetAccount, RecurringTemplate, TransactionKind};

/// Monthly fixed income and charges implied by the active templates.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TemplateTotals {
    pub income: Decimal,
    pub expense: Decimal,
    pub net: Decimal,
}

/// Copy-on-write helpers for an account's recurring templates.
pub struct TemplateService;

impl TemplateService {
    pub fn add(account: &BudgetAccount, template: RecurringTemplate) -> BudgetAccount {
        let mut next = account.clone();
        info!(account = %next.id, template = %template.id, "added recurring template");
        next.recurring_templates.push(template);
        next
    }

    /// Replaces the template with the same id; unknown ids leave the account unchanged.
    pub fn update(account: &BudgetAccount, template: RecurringTemplate) -> BudgetAccount {
        let mut next = account.clone();
        match next
            .recurring_templates
            .iter_mut()
            .find(|existing| existing.id == template.id)
        {
            Some(existing) => *existing = template,
            None => debug!(
                account = %account.id,
                template = %template.id,
                "update ignored for unknown template"
            ),
        }
        next
    }

    /// Deletes a template for good, together with its per-month suppressions.
    ///
    /// Stored entries keep their `template_id`; it simply no longer resolves.
    pub fn remove(account: &BudgetAccount, template_id: &str) -> BudgetAccount {
        let mut next = account.clone();
        next.recurring_templates
            .retain(|template| template.id != template_id);
        next.deleted_virtual_ids
            .retain(|id| id.template_id != template_id);
        info!(account = %next.id, template = template_id, "removed recurring template");
        next
    }

    pub fn set_active(account: &BudgetAccount, template_id: &str, active: bool) -> BudgetAccount {
        let mut next = account.clone();
        if let Some(template) = next
            .recurring_templates
            .iter_mut()
            .find(|template| template.id == template_id)
        {
            template.is_active = active;
        }
        next
    }

    pub fn find_matching<'a>(
        account: &'a BudgetAccount,
        category_id: &str,
        amount: Decimal,
        kind: TransactionKind,
    ) -> Option<&'a RecurringTemplate> {
        account.matching_template(category_id, amount, kind)
    }

    /// Templates ordered by the day they fall on, then by label.
    pub fn list(account: &BudgetAccount) -> Vec<&RecurringTemplate> {
        let mut templates: Vec<_> = account.recurring_templates.iter().collect();
        templates.sort_by(|a, b| {
            a.nominal_day()
                .cmp(&b.nominal_day())
                .then_with(|| a.label().cmp(b.label()))
        });
        templates
    }

    pub fn monthly_totals(account: &BudgetAccount) -> TemplateTotals {
        let mut totals = TemplateTotals::default();
        for template in account.active_templates() {
            match template.kind {
                TransactionKind::Income => totals.income += template.magnitude(),
                TransactionKind::Expense => totals.expense += template.magnitude(),
            }
        }
        totals.net = totals.income - totals.expense;
        totals
    }
}
