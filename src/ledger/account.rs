use std::collections::BTreeSet;

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use super::{
    calendar::YearMonth,
    recurring::RecurringTemplate,
    transaction::{fresh_id, Transaction, TransactionKind, VirtualId},
};

const MAX_CYCLE_END_DAY: u32 = 31;

/// Aggregate root owning one ledger: stored transactions, recurring rules, and the
/// per-month suppressions of projected occurrences.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BudgetAccount {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub color: String,
    #[serde(default)]
    pub owner_id: String,
    #[serde(default)]
    pub transactions: Vec<Transaction>,
    #[serde(default)]
    pub recurring_templates: Vec<RecurringTemplate>,
    #[serde(default, with = "suppressed_ids")]
    pub deleted_virtual_ids: BTreeSet<VirtualId>,
    #[serde(default)]
    pub cycle_end_day: u32,
}

impl BudgetAccount {
    pub fn new(name: impl Into<String>, owner_id: impl Into<String>) -> Self {
        Self {
            id: fresh_id(),
            name: name.into(),
            color: String::new(),
            owner_id: owner_id.into(),
            transactions: Vec::new(),
            recurring_templates: Vec::new(),
            deleted_virtual_ids: BTreeSet::new(),
            cycle_end_day: 0,
        }
    }

    pub fn with_id(mut self, id: impl Into<String>) -> Self {
        self.id = id.into();
        self
    }

    pub fn with_transaction(mut self, transaction: Transaction) -> Self {
        self.transactions.push(transaction);
        self
    }

    pub fn with_template(mut self, template: RecurringTemplate) -> Self {
        self.recurring_templates.push(template);
        self
    }

    pub fn with_cycle_end_day(mut self, day: u32) -> Self {
        self.cycle_end_day = day;
        self
    }

    pub fn transaction(&self, id: &str) -> Option<&Transaction> {
        self.transactions.iter().find(|txn| txn.id == id)
    }

    pub fn template(&self, id: &str) -> Option<&RecurringTemplate> {
        self.recurring_templates
            .iter()
            .find(|template| template.id == id)
    }

    /// First template sharing the category, magnitude and kind, active or not.
    pub fn matching_template(
        &self,
        category_id: &str,
        amount: Decimal,
        kind: TransactionKind,
    ) -> Option<&RecurringTemplate> {
        self.recurring_templates
            .iter()
            .find(|template| template.matches(category_id, amount, kind))
    }

    pub fn active_templates(&self) -> impl Iterator<Item = &RecurringTemplate> {
        self.recurring_templates
            .iter()
            .filter(|template| template.is_active)
    }

    pub fn transactions_in(&self, month: YearMonth) -> impl Iterator<Item = &Transaction> {
        self.transactions
            .iter()
            .filter(move |txn| month.contains(txn.date))
    }

    pub fn is_suppressed(&self, id: &VirtualId) -> bool {
        self.deleted_virtual_ids.contains(id)
    }

    /// `cycle_end_day` normalized into `0..=31`.
    pub fn cycle_end_day(&self) -> u32 {
        self.cycle_end_day.min(MAX_CYCLE_END_DAY)
    }

    /// Month of the earliest stored transaction, if any.
    pub fn first_activity_month(&self) -> Option<YearMonth> {
        self.transactions
            .iter()
            .map(|txn| txn.date)
            .min()
            .map(YearMonth::of)
    }
}

/// Suppressed ids persist as plain strings; entries that no longer decompose are dropped
/// on load rather than failing the whole snapshot.
mod suppressed_ids {
    use std::collections::BTreeSet;

    use serde::{Deserialize, Deserializer, Serialize, Serializer};

    use crate::ledger::transaction::VirtualId;

    pub fn serialize<S>(ids: &BTreeSet<VirtualId>, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        let raw: Vec<String> = ids.iter().map(ToString::to_string).collect();
        raw.serialize(serializer)
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<BTreeSet<VirtualId>, D::Error>
    where
        D: Deserializer<'de>,
    {
        let raw = Vec::<String>::deserialize(deserializer)?;
        Ok(raw
            .into_iter()
            .filter_map(|id| match id.parse::<VirtualId>() {
                Ok(parsed) => Some(parsed),
                Err(err) => {
                    tracing::warn!(%err, "dropping unreadable suppressed occurrence id");
                    None
                }
            })
            .collect())
    }
}
