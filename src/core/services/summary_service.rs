use std::collections::HashMap;

use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::core::{
    clock::Clock,
    feed,
    projection::{BalanceSummary, ProjectionSettings},
};
use crate::errors::Result;
use crate::ledger::{
    resolve_display, BudgetAccount, BudgetCycle, CategoryDisplay, CategoryLookup, Transaction,
    TransactionKind, YearMonth,
};

/// Expense total for one category within a month.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CategorySpending {
    pub category_id: String,
    pub display: CategoryDisplay,
    pub total: Decimal,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MonthSummary {
    pub month: YearMonth,
    pub income: Decimal,
    pub expense: Decimal,
    pub net: Decimal,
    /// Part of `income` still expected from recurring occurrences.
    pub projected_income: Decimal,
    /// Part of `expense` still expected from recurring occurrences.
    pub projected_expense: Decimal,
    /// Largest spending first.
    pub categories: Vec<CategorySpending>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CycleSummary {
    pub cycle: BudgetCycle,
    pub income: Decimal,
    pub expense: Decimal,
    pub net: Decimal,
    pub days_remaining: i64,
}

/// Everything an export needs for one account and month.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExportBundle {
    pub account_id: String,
    pub account_name: String,
    pub month: YearMonth,
    pub generated_at: DateTime<Utc>,
    pub transactions: Vec<Transaction>,
    pub balances: BalanceSummary,
}

/// Destination for export bundles. Formatting belongs to the implementor.
pub trait ExportSink {
    fn export(&self, bundle: &ExportBundle) -> Result<()>;
}

pub struct SummaryService;

impl SummaryService {
    pub fn balances(
        account: &BudgetAccount,
        view: YearMonth,
        clock: &dyn Clock,
        settings: &ProjectionSettings,
    ) -> BalanceSummary {
        BalanceSummary::compute(account, view, clock, settings)
    }

    pub fn month_summary<L>(
        account: &BudgetAccount,
        month: YearMonth,
        categories: &L,
    ) -> MonthSummary
    where
        L: CategoryLookup + ?Sized,
    {
        let entries = feed::effective_list(account, month);
        let mut summary = MonthSummary {
            month,
            income: Decimal::ZERO,
            expense: Decimal::ZERO,
            net: Decimal::ZERO,
            projected_income: Decimal::ZERO,
            projected_expense: Decimal::ZERO,
            categories: Vec::new(),
        };
        let mut per_category: HashMap<&str, Decimal> = HashMap::new();

        for txn in &entries {
            match txn.kind {
                TransactionKind::Income => {
                    summary.income += txn.amount;
                    if txn.is_virtual() {
                        summary.projected_income += txn.amount;
                    }
                }
                TransactionKind::Expense => {
                    summary.expense += txn.amount;
                    if txn.is_virtual() {
                        summary.projected_expense += txn.amount;
                    }
                    *per_category.entry(txn.category_id.as_str()).or_default() += txn.amount;
                }
            }
        }
        summary.net = summary.income - summary.expense;

        let mut spending: Vec<CategorySpending> = per_category
            .into_iter()
            .map(|(category_id, total)| CategorySpending {
                category_id: category_id.to_string(),
                display: resolve_display(categories, category_id),
                total,
            })
            .collect();
        spending.sort_by(|a, b| {
            b.total
                .cmp(&a.total)
                .then_with(|| a.category_id.cmp(&b.category_id))
        });
        summary.categories = spending;
        summary
    }

    /// Totals of the budget cycle attached to `view`, spanning month boundaries when the
    /// account closes its cycle mid-month.
    pub fn cycle_summary(
        account: &BudgetAccount,
        view: YearMonth,
        clock: &dyn Clock,
    ) -> CycleSummary {
        let cycle = BudgetCycle::for_month(view, account.cycle_end_day());
        let mut income = Decimal::ZERO;
        let mut expense = Decimal::ZERO;

        for month in YearMonth::of(cycle.start).through(YearMonth::of(cycle.end)) {
            for txn in feed::effective_list(account, month) {
                if !cycle.contains(txn.date) {
                    continue;
                }
                match txn.kind {
                    TransactionKind::Income => income += txn.amount,
                    TransactionKind::Expense => expense += txn.amount,
                }
            }
        }

        let today: NaiveDate = clock.today();
        debug!(
            account = %account.id,
            start = %cycle.start,
            end = %cycle.end,
            "summarized budget cycle"
        );
        CycleSummary {
            cycle,
            income,
            expense,
            net: income - expense,
            days_remaining: cycle.days_remaining(today),
        }
    }

    pub fn export_bundle(
        account: &BudgetAccount,
        month: YearMonth,
        clock: &dyn Clock,
        settings: &ProjectionSettings,
    ) -> ExportBundle {
        ExportBundle {
            account_id: account.id.clone(),
            account_name: account.name.clone(),
            month,
            generated_at: clock.now(),
            transactions: feed::effective_list(account, month),
            balances: BalanceSummary::compute(account, month, clock, settings).rounded(),
        }
    }

    pub fn export_to<S>(
        sink: &S,
        account: &BudgetAccount,
        month: YearMonth,
        clock: &dyn Clock,
        settings: &ProjectionSettings,
    ) -> Result<()>
    where
        S: ExportSink + ?Sized,
    {
        let bundle = Self::export_bundle(account, month, clock, settings);
        sink.export(&bundle)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::clock::FixedClock;
    use crate::ledger::{default_categories, RecurringTemplate, VirtualId};
    use rust_decimal_macros::dec;
    use std::cell::RefCell;

    fn date(year: i32, month: u32, day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(year, month, day).unwrap()
    }

    fn march() -> YearMonth {
        YearMonth::new(2024, 3).unwrap()
    }

    fn spent(amount: Decimal, category: &str, day: u32) -> Transaction {
        let on = date(2024, 3, day);
        Transaction::new(amount, TransactionKind::Expense, category, on)
    }

    fn account() -> BudgetAccount {
        let pay = RecurringTemplate::new(dec!(2100), TransactionKind::Income, "salaire", 28);
        let rent = RecurringTemplate::new(dec!(750), TransactionKind::Expense, "logement", 1);
        BudgetAccount::new("Courant", "owner")
            .with_id("main")
            .with_template(pay.with_id("pay"))
            .with_template(rent.with_id("rent"))
            .with_transaction(spent(dec!(750), "logement", 2).with_template("rent"))
            .with_transaction(spent(dec!(60.40), "alimentation", 9))
            .with_transaction(spent(dec!(12), "inconnue", 11))
    }

    #[test]
    fn month_summary_splits_projected_share() {
        let summary = SummaryService::month_summary(&account(), march(), &default_categories());
        assert_eq!(summary.income, dec!(2100));
        assert_eq!(summary.projected_income, dec!(2100));
        assert_eq!(summary.expense, dec!(822.40));
        assert_eq!(summary.projected_expense, Decimal::ZERO);
        assert_eq!(summary.net, dec!(1277.60));

        let ids: Vec<_> = summary
            .categories
            .iter()
            .map(|c| c.category_id.as_str())
            .collect();
        assert_eq!(ids, vec!["logement", "alimentation", "inconnue"]);
        assert!(!summary.categories[2].display.resolved);
        assert_eq!(summary.categories[2].display.name, "Autres");
    }

    #[test]
    fn cycle_summary_spans_month_boundary() {
        let account = account().with_cycle_end_day(25);
        let clock = FixedClock::on(date(2024, 3, 20));
        let summary = SummaryService::cycle_summary(&account, march(), &clock);

        assert_eq!(summary.cycle.start, date(2024, 2, 26));
        assert_eq!(summary.cycle.end, date(2024, 3, 25));
        // February's salary falls on the 28th, inside the cycle; March's is after the 25th.
        assert_eq!(summary.income, dec!(2100));
        assert_eq!(summary.expense, dec!(822.40));
        assert_eq!(summary.days_remaining, 6);
    }

    #[test]
    fn export_bundle_feeds_sink() {
        struct Recorder(RefCell<Vec<ExportBundle>>);
        impl ExportSink for Recorder {
            fn export(&self, bundle: &ExportBundle) -> Result<()> {
                self.0.borrow_mut().push(bundle.clone());
                Ok(())
            }
        }

        let mut account = account();
        account
            .deleted_virtual_ids
            .insert(VirtualId::new("pay", march()));
        let clock = FixedClock::on(date(2024, 3, 15));
        let settings = ProjectionSettings::default();
        let recorder = Recorder(RefCell::new(Vec::new()));
        SummaryService::export_to(&recorder, &account, march(), &clock, &settings).unwrap();

        let bundles = recorder.0.borrow();
        assert_eq!(bundles.len(), 1);
        assert_eq!(bundles[0].account_name, "Courant");
        assert_eq!(bundles[0].transactions.len(), 3);
        assert_eq!(bundles[0].balances.checking, dec!(-822.40));
    }
}
