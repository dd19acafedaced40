//! Balance projection: real ledger sums plus replayed recurring occurrences.

use std::collections::BTreeMap;

use chrono::NaiveDate;
use rust_decimal::{Decimal, RoundingStrategy};
use serde::{Deserialize, Serialize};
use tracing::{debug, trace};

use crate::core::{clock::Clock, occurrences};
use crate::ledger::{BudgetAccount, Transaction, YearMonth};

const DEFAULT_LOOKBACK_MONTHS: u32 = 6;

/// Which balance a viewed month inherits from the months before it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CarryOverMode {
    /// Real entries plus unpaid recurring occurrences.
    #[default]
    Projected,
    /// Real entries only.
    Actual,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProjectionSettings {
    /// How many months before the current one unpaid occurrences are still replayed.
    pub lookback_months: u32,
    pub carry_over: CarryOverMode,
}

impl Default for ProjectionSettings {
    fn default() -> Self {
        Self {
            lookback_months: DEFAULT_LOOKBACK_MONTHS,
            carry_over: CarryOverMode::default(),
        }
    }
}

/// First month whose occurrences are replayed by a projection.
///
/// Never further back than `lookback_months` before `today`, and never before the month of
/// the account's first recorded activity (the current month when there is none).
pub fn projection_origin(
    account: &BudgetAccount,
    today: NaiveDate,
    lookback_months: u32,
) -> YearMonth {
    let current = YearMonth::of(today);
    let floor = current.add_months(-(lookback_months.min(i32::MAX as u32) as i32));
    let first_activity = account
        .first_activity_month()
        .map_or(current, |month| month.min(current));
    floor.max(first_activity)
}

/// Sum of real entries dated on or before `target` (the actual bank balance).
pub fn actual_balance(account: &BudgetAccount, target: NaiveDate) -> Decimal {
    account
        .transactions
        .iter()
        .filter(|txn| txn.date <= target)
        .map(Transaction::signed_amount)
        .sum()
}

/// Computes balances for one account snapshot against a fixed projection origin.
#[derive(Debug, Clone, Copy)]
pub struct BalanceProjector<'a> {
    account: &'a BudgetAccount,
    origin: YearMonth,
}

impl<'a> BalanceProjector<'a> {
    pub fn new(
        account: &'a BudgetAccount,
        today: NaiveDate,
        settings: &ProjectionSettings,
    ) -> Self {
        let origin = projection_origin(account, today, settings.lookback_months);
        Self::with_origin(account, origin)
    }

    pub fn with_origin(account: &'a BudgetAccount, origin: YearMonth) -> Self {
        Self { account, origin }
    }

    pub fn origin(&self) -> YearMonth {
        self.origin
    }

    /// Balance as of `target` (inclusive, day granularity).
    pub fn balance_at(&self, target: NaiveDate, include_projections: bool) -> Decimal {
        let base = actual_balance(self.account, target);
        if !include_projections {
            return base;
        }
        base + self.projected_delta(target)
    }

    /// Net of every unpaid, unsuppressed occurrence from the origin through `target`.
    ///
    /// Months are replayed one at a time because a template can be paid, skipped, or left
    /// open independently in each month.
    pub fn projected_delta(&self, target: NaiveDate) -> Decimal {
        let last = YearMonth::of(target);
        if last < self.origin {
            return Decimal::ZERO;
        }

        let mut linked_by_month: BTreeMap<YearMonth, Vec<&Transaction>> = BTreeMap::new();
        for txn in &self.account.transactions {
            if txn.template_id.is_some() {
                linked_by_month.entry(txn.month()).or_default().push(txn);
            }
        }

        let mut total = Decimal::ZERO;
        for month in self.origin.through(last) {
            let real = linked_by_month.get(&month).into_iter().flatten().copied();
            let month_delta: Decimal = occurrences::generate(
                &self.account.recurring_templates,
                real,
                &self.account.deleted_virtual_ids,
                month,
            )
            .iter()
            .filter(|occurrence| occurrence.date <= target)
            .map(Transaction::signed_amount)
            .sum();
            trace!(%month, %month_delta, "replayed recurring occurrences");
            total += month_delta;
        }
        total
    }
}

/// Sign of a balance as shown to the user.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Trend {
    Surplus,
    Deficit,
    Even,
}

impl Trend {
    pub fn of(amount: Decimal) -> Self {
        if amount > Decimal::ZERO {
            Trend::Surplus
        } else if amount < Decimal::ZERO {
            Trend::Deficit
        } else {
            Trend::Even
        }
    }
}

/// Presentation rounding; computations never round.
pub fn round_for_display(amount: Decimal) -> Decimal {
    amount.round_dp_with_strategy(2, RoundingStrategy::MidpointAwayFromZero)
}

/// The four balances a dashboard shows for a viewed month.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BalanceSummary {
    pub view: YearMonth,
    /// Real money as of today.
    pub checking: Decimal,
    /// End of the current month, including unpaid occurrences.
    pub available: Decimal,
    /// End of the viewed month, including unpaid occurrences.
    pub projected: Decimal,
    /// Balance inherited from every month before the viewed one.
    pub carry_over: Decimal,
}

impl BalanceSummary {
    pub fn compute(
        account: &BudgetAccount,
        view: YearMonth,
        clock: &dyn Clock,
        settings: &ProjectionSettings,
    ) -> Self {
        let today = clock.today();
        let projector = BalanceProjector::new(account, today, settings);
        let current = YearMonth::of(today);
        let before_view = view.first_day().pred_opt().unwrap_or(NaiveDate::MIN);
        let include_in_carry_over = settings.carry_over == CarryOverMode::Projected;

        let summary = Self {
            view,
            checking: projector.balance_at(today, false),
            available: projector.balance_at(current.last_day(), true),
            projected: projector.balance_at(view.last_day(), true),
            carry_over: projector.balance_at(before_view, include_in_carry_over),
        };
        debug!(
            account = %account.id,
            %view,
            origin = %projector.origin(),
            checking = %summary.checking,
            projected = %summary.projected,
            "computed balance summary"
        );
        summary
    }

    pub fn carry_over_trend(&self) -> Trend {
        Trend::of(self.carry_over)
    }

    pub fn rounded(&self) -> Self {
        Self {
            view: self.view,
            checking: round_for_display(self.checking),
            available: round_for_display(self.available),
            projected: round_for_display(self.projected),
            carry_over: round_for_display(self.carry_over),
        }
    }
}
