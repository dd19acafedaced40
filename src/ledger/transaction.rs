use std::{fmt, str::FromStr};

use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use uuid::Uuid;

use super::calendar::YearMonth;

/// Namespace prefix of synthetic, never-persisted occurrence ids.
pub const VIRTUAL_PREFIX: &str = "virtual-";

pub const DEFAULT_INCOME_LABEL: &str = "Revenu fixe";
pub const DEFAULT_EXPENSE_LABEL: &str = "Charge fixe";

/// Direction of a cash movement. Amounts are stored as magnitudes; the kind carries the sign.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum TransactionKind {
    Income,
    Expense,
}

impl TransactionKind {
    /// Applies this kind's sign to a magnitude.
    pub fn signed(&self, amount: Decimal) -> Decimal {
        match self {
            TransactionKind::Income => amount.abs(),
            TransactionKind::Expense => -amount.abs(),
        }
    }

    pub fn default_label(&self) -> &'static str {
        match self {
            TransactionKind::Income => DEFAULT_INCOME_LABEL,
            TransactionKind::Expense => DEFAULT_EXPENSE_LABEL,
        }
    }
}

/// Identifies the projected occurrence of a template in a given month.
///
/// The textual form is `virtual-<templateId>-<month0>-<year>` with a zero-based month, which
/// is the representation persisted in an account's suppressed set.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct VirtualId {
    pub template_id: String,
    pub month: YearMonth,
}

impl VirtualId {
    pub fn new(template_id: impl Into<String>, month: YearMonth) -> Self {
        Self {
            template_id: template_id.into(),
            month,
        }
    }
}

impl fmt::Display for VirtualId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}{}-{}-{}",
            VIRTUAL_PREFIX,
            self.template_id,
            self.month.zero_based_month(),
            self.month.year()
        )
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum VirtualIdError {
    #[error("`{0}` is not in the virtual namespace")]
    MissingPrefix(String),
    #[error("`{0}` does not decompose into template, month and year")]
    Malformed(String),
}

impl FromStr for VirtualId {
    type Err = VirtualIdError;

    fn from_str(raw: &str) -> Result<Self, Self::Err> {
        let rest = raw
            .strip_prefix(VIRTUAL_PREFIX)
            .ok_or_else(|| VirtualIdError::MissingPrefix(raw.to_string()))?;
        let malformed = || VirtualIdError::Malformed(raw.to_string());

        // Template ids may themselves contain dashes, so split from the right.
        let mut parts = rest.rsplitn(3, '-');
        let year = parts.next().ok_or_else(malformed)?;
        let month0 = parts.next().ok_or_else(malformed)?;
        let template_id = parts.next().ok_or_else(malformed)?;
        let year: i32 = year.parse().map_err(|_| malformed())?;
        let month0: u32 = month0.parse().map_err(|_| malformed())?;
        let month = YearMonth::from_zero_based(year, month0);
        Ok(Self::new(template_id, month.ok_or_else(malformed)?))
    }
}

impl TryFrom<String> for VirtualId {
    type Error = VirtualIdError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<VirtualId> for String {
    fn from(value: VirtualId) -> Self {
        value.to_string()
    }
}

/// A transaction id resolved into its namespace.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum TransactionRef {
    Real(String),
    Virtual(VirtualId),
}

impl TransactionRef {
    /// Never fails: ids in the virtual namespace that do not decompose are treated as real ids.
    pub fn parse(id: &str) -> Self {
        match id.parse::<VirtualId>() {
            Ok(virtual_id) => TransactionRef::Virtual(virtual_id),
            Err(VirtualIdError::Malformed(_)) => {
                tracing::debug!(id, "malformed virtual id treated as a real id");
                TransactionRef::Real(id.to_string())
            }
            Err(VirtualIdError::MissingPrefix(_)) => TransactionRef::Real(id.to_string()),
        }
    }
}

pub fn fresh_id() -> String {
    Uuid::new_v4().to_string()
}

/// A ledger entry. Stored entries are always real; virtual ones only exist in derived views.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Transaction {
    pub id: String,
    pub amount: Decimal,
    #[serde(rename = "type")]
    pub kind: TransactionKind,
    pub category_id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub comment: Option<String>,
    pub date: NaiveDate,
    #[serde(default)]
    pub is_recurring: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub template_id: Option<String>,
}

impl Transaction {
    pub fn new(
        amount: Decimal,
        kind: TransactionKind,
        category_id: impl Into<String>,
        date: NaiveDate,
    ) -> Self {
        Self {
            id: fresh_id(),
            amount: amount.abs(),
            kind,
            category_id: category_id.into(),
            comment: None,
            date,
            is_recurring: false,
            template_id: None,
        }
    }

    pub fn with_comment(mut self, comment: impl Into<String>) -> Self {
        self.comment = Some(comment.into());
        self
    }

    pub fn with_template(mut self, template_id: impl Into<String>) -> Self {
        self.template_id = Some(template_id.into());
        self.is_recurring = true;
        self
    }

    /// Amount with the kind's sign applied.
    pub fn signed_amount(&self) -> Decimal {
        self.kind.signed(self.amount)
    }

    pub fn is_virtual(&self) -> bool {
        self.id.starts_with(VIRTUAL_PREFIX)
    }

    pub fn month(&self) -> YearMonth {
        YearMonth::of(self.date)
    }

    pub fn label(&self) -> &str {
        match self.comment.as_deref().map(str::trim) {
            Some(comment) if !comment.is_empty() => comment,
            _ => self.kind.default_label(),
        }
    }
}

/// Values submitted from an entry form, targeting an existing, virtual, or new slot.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TransactionDraft {
    #[serde(default)]
    pub id: Option<String>,
    pub amount: Decimal,
    #[serde(rename = "type")]
    pub kind: TransactionKind,
    pub category_id: String,
    #[serde(default)]
    pub comment: Option<String>,
    pub date: NaiveDate,
    #[serde(default)]
    pub is_recurring: bool,
    #[serde(default)]
    pub template_id: Option<String>,
}

impl TransactionDraft {
    pub fn new(
        amount: Decimal,
        kind: TransactionKind,
        category_id: impl Into<String>,
        date: NaiveDate,
    ) -> Self {
        Self {
            id: None,
            amount,
            kind,
            category_id: category_id.into(),
            comment: None,
            date,
            is_recurring: false,
            template_id: None,
        }
    }

    pub fn targeting(mut self, id: impl Into<String>) -> Self {
        self.id = Some(id.into());
        self
    }

    pub fn with_comment(mut self, comment: impl Into<String>) -> Self {
        self.comment = Some(comment.into());
        self
    }

    pub fn recurring(mut self, is_recurring: bool) -> Self {
        self.is_recurring = is_recurring;
        self
    }

    /// Materializes the draft under `id`, normalizing the amount to its magnitude.
    pub fn into_transaction(self, id: String) -> Transaction {
        let comment = self
            .comment
            .map(|comment| comment.trim().to_string())
            .filter(|comment| !comment.is_empty());
        Transaction {
            id,
            amount: self.amount.abs(),
            kind: self.kind,
            category_id: self.category_id,
            comment,
            date: self.date,
            is_recurring: self.is_recurring,
            template_id: self.template_id,
        }
    }
}

impl From<&Transaction> for TransactionDraft {
    fn from(txn: &Transaction) -> Self {
        Self {
            id: Some(txn.id.clone()),
            amount: txn.amount,
            kind: txn.kind,
            category_id: txn.category_id.clone(),
            comment: txn.comment.clone(),
            date: txn.date,
            is_recurring: txn.is_recurring,
            template_id: txn.template_id.clone(),
        }
    }
}
