use chrono::{Datelike, NaiveDate};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use super::{
    calendar::YearMonth,
    transaction::{fresh_id, Transaction, TransactionKind, VirtualId},
};

const MAX_DAY_OF_MONTH: u32 = 31;

/// A monthly cash-flow rule (rent, salary, subscriptions).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RecurringTemplate {
    pub id: String,
    pub amount: Decimal,
    #[serde(rename = "type")]
    pub kind: TransactionKind,
    pub category_id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub comment: Option<String>,
    pub day_of_month: u32,
    #[serde(default = "RecurringTemplate::default_active")]
    pub is_active: bool,
}

impl RecurringTemplate {
    pub fn new(
        amount: Decimal,
        kind: TransactionKind,
        category_id: impl Into<String>,
        day_of_month: u32,
    ) -> Self {
        Self {
            id: fresh_id(),
            amount: amount.abs(),
            kind,
            category_id: category_id.into(),
            comment: None,
            day_of_month,
            is_active: true,
        }
    }

    /// Synthesizes the rule implied by a transaction flagged as recurring.
    pub fn from_transaction(txn: &Transaction) -> Self {
        Self {
            id: fresh_id(),
            amount: txn.amount.abs(),
            kind: txn.kind,
            category_id: txn.category_id.clone(),
            comment: txn.comment.clone(),
            day_of_month: txn.date.day(),
            is_active: true,
        }
    }

    pub fn with_id(mut self, id: impl Into<String>) -> Self {
        self.id = id.into();
        self
    }

    pub fn with_comment(mut self, comment: impl Into<String>) -> Self {
        self.comment = Some(comment.into());
        self
    }

    pub fn inactive(mut self) -> Self {
        self.is_active = false;
        self
    }

    /// Stored amounts may predate validation; only the magnitude is meaningful.
    pub fn magnitude(&self) -> Decimal {
        self.amount.abs()
    }

    pub fn signed_amount(&self) -> Decimal {
        self.kind.signed(self.amount)
    }

    /// `day_of_month` normalized into `1..=31`.
    pub fn nominal_day(&self) -> u32 {
        self.day_of_month.clamp(1, MAX_DAY_OF_MONTH)
    }

    pub fn occurrence_date(&self, month: YearMonth) -> NaiveDate {
        month.clamp_day(self.nominal_day())
    }

    pub fn virtual_id(&self, month: YearMonth) -> VirtualId {
        VirtualId::new(self.id.clone(), month)
    }

    /// The dedup key used when a recurring transaction spawns a template.
    pub fn matches(&self, category_id: &str, amount: Decimal, kind: TransactionKind) -> bool {
        self.category_id == category_id && self.magnitude() == amount.abs() && self.kind == kind
    }

    pub fn label(&self) -> &str {
        match self.comment.as_deref().map(str::trim) {
            Some(comment) if !comment.is_empty() => comment,
            _ => self.kind.default_label(),
        }
    }

    fn default_active() -> bool {
        true
    }
}
