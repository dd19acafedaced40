use std::fmt;

use chrono::{Datelike, Duration, NaiveDate};
use serde::{Deserialize, Serialize};

/// A calendar month. `month` is 1-based (January = 1).
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct YearMonth {
    year: i32,
    month: u32,
}

impl YearMonth {
    /// Returns `None` when `month` is outside `1..=12` or the year is not representable.
    pub fn new(year: i32, month: u32) -> Option<Self> {
        NaiveDate::from_ymd_opt(year, month, 1)?;
        NaiveDate::from_ymd_opt(year, month, 28)?;
        Some(Self { year, month })
    }

    /// Builds a month from a zero-based month index (January = 0).
    pub fn from_zero_based(year: i32, month0: u32) -> Option<Self> {
        Self::new(year, month0.checked_add(1)?)
    }

    pub fn of(date: NaiveDate) -> Self {
        Self {
            year: date.year(),
            month: date.month(),
        }
    }

    pub fn year(&self) -> i32 {
        self.year
    }

    pub fn month(&self) -> u32 {
        self.month
    }

    pub fn zero_based_month(&self) -> u32 {
        self.month - 1
    }

    pub fn days_in_month(&self) -> u32 {
        match self.month {
            4 | 6 | 9 | 11 => 30,
            2 if NaiveDate::from_ymd_opt(self.year, 2, 29).is_some() => 29,
            2 => 28,
            _ => 31,
        }
    }

    /// Places `day` inside this month, clamping it to `1..=days_in_month`.
    pub fn clamp_day(&self, day: u32) -> NaiveDate {
        let day = day.clamp(1, self.days_in_month());
        NaiveDate::from_ymd_opt(self.year, self.month, day).unwrap_or(NaiveDate::MIN)
    }

    pub fn first_day(&self) -> NaiveDate {
        self.clamp_day(1)
    }

    pub fn last_day(&self) -> NaiveDate {
        self.clamp_day(self.days_in_month())
    }

    pub fn contains(&self, date: NaiveDate) -> bool {
        date.year() == self.year && date.month() == self.month
    }

    pub fn add_months(&self, delta: i32) -> Self {
        let index = self.year as i64 * 12 + (self.month as i64 - 1) + delta as i64;
        let year = index.div_euclid(12);
        let month = index.rem_euclid(12) as u32 + 1;
        Self {
            year: year.clamp(i32::MIN as i64, i32::MAX as i64) as i32,
            month,
        }
    }

    pub fn succ(&self) -> Self {
        self.add_months(1)
    }

    pub fn pred(&self) -> Self {
        self.add_months(-1)
    }

    /// Iterates from `self` through `last`, both inclusive. Empty when `last < self`.
    pub fn through(self, last: YearMonth) -> MonthRange {
        MonthRange {
            next: self,
            last,
        }
    }
}

impl fmt::Display for YearMonth {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:04}-{:02}", self.year, self.month)
    }
}

#[derive(Debug, Clone)]
pub struct MonthRange {
    next: YearMonth,
    last: YearMonth,
}

impl Iterator for MonthRange {
    type Item = YearMonth;

    fn next(&mut self) -> Option<YearMonth> {
        if self.next > self.last {
            return None;
        }
        let current = self.next;
        self.next = current.succ();
        Some(current)
    }
}

/// The user's budgeting period for a viewed month, bounded by a custom payday.
///
/// With `cycle_end_day == 0` (or any day past the month's end) the cycle is the calendar
/// month. Otherwise it starts the day after the previous month's end day and closes on
/// this month's end day, both clamped to the real length of their months.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct BudgetCycle {
    pub start: NaiveDate,
    pub end: NaiveDate,
}

impl BudgetCycle {
    pub fn for_month(month: YearMonth, cycle_end_day: u32) -> Self {
        if cycle_end_day == 0 {
            return Self {
                start: month.first_day(),
                end: month.last_day(),
            };
        }
        let end = month.clamp_day(cycle_end_day);
        let previous_end = month.pred().clamp_day(cycle_end_day);
        Self {
            start: previous_end + Duration::days(1),
            end,
        }
    }

    /// Returns the cycle that `date` falls into.
    pub fn containing(date: NaiveDate, cycle_end_day: u32) -> Self {
        let month = YearMonth::of(date);
        let cycle = Self::for_month(month, cycle_end_day);
        if date > cycle.end {
            Self::for_month(month.succ(), cycle_end_day)
        } else {
            cycle
        }
    }

    pub fn contains(&self, date: NaiveDate) -> bool {
        self.start <= date && date <= self.end
    }

    pub fn len_days(&self) -> i64 {
        (self.end - self.start).num_days() + 1
    }

    /// Days left in the cycle counting `today`; zero once the cycle is over.
    pub fn days_remaining(&self, today: NaiveDate) -> i64 {
        if today > self.end {
            0
        } else if today < self.start {
            self.len_days()
        } else {
            (self.end - today).num_days() + 1
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ym(year: i32, month: u32) -> YearMonth {
        YearMonth::new(year, month).unwrap()
    }

    fn date(year: i32, month: u32, day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(year, month, day).unwrap()
    }

    #[test]
    fn rejects_out_of_range_months() {
        assert!(YearMonth::new(2024, 0).is_none());
        assert!(YearMonth::new(2024, 13).is_none());
        assert_eq!(YearMonth::from_zero_based(2024, 2), Some(ym(2024, 3)));
    }

    #[test]
    fn clamp_day_respects_month_length() {
        assert_eq!(ym(2024, 2).clamp_day(31), date(2024, 2, 29));
        assert_eq!(ym(2023, 2).clamp_day(31), date(2023, 2, 28));
        assert_eq!(ym(2024, 4).clamp_day(31), date(2024, 4, 30));
        assert_eq!(ym(2024, 4).clamp_day(0), date(2024, 4, 1));
    }

    #[test]
    fn add_months_crosses_year_boundaries() {
        assert_eq!(ym(2024, 11).add_months(3), ym(2025, 2));
        assert_eq!(ym(2024, 1).add_months(-1), ym(2023, 12));
        assert_eq!(ym(2024, 3).add_months(-27), ym(2021, 12));
    }

    #[test]
    fn month_range_is_inclusive() {
        let months: Vec<_> = ym(2023, 11).through(ym(2024, 2)).collect();
        assert_eq!(
            months,
            vec![ym(2023, 11), ym(2023, 12), ym(2024, 1), ym(2024, 2)]
        );
        assert_eq!(ym(2024, 3).through(ym(2024, 2)).count(), 0);
    }

    #[test]
    fn calendar_cycle_when_end_day_is_zero() {
        let cycle = BudgetCycle::for_month(ym(2024, 2), 0);
        assert_eq!(cycle.start, date(2024, 2, 1));
        assert_eq!(cycle.end, date(2024, 2, 29));
        assert_eq!(cycle.len_days(), 29);
    }

    #[test]
    fn payday_cycle_spans_two_months() {
        let cycle = BudgetCycle::for_month(ym(2024, 3), 25);
        assert_eq!(cycle.start, date(2024, 2, 26));
        assert_eq!(cycle.end, date(2024, 3, 25));

        let clamped = BudgetCycle::for_month(ym(2024, 3), 30);
        assert_eq!(clamped.start, date(2024, 3, 1));
        assert_eq!(clamped.end, date(2024, 3, 30));
    }

    #[test]
    fn containing_rolls_into_next_cycle_after_payday() {
        let cycle = BudgetCycle::containing(date(2024, 3, 27), 25);
        assert_eq!(cycle.start, date(2024, 3, 26));
        assert_eq!(cycle.end, date(2024, 4, 25));
        assert_eq!(cycle.days_remaining(date(2024, 4, 20)), 6);
        assert_eq!(cycle.days_remaining(date(2024, 5, 1)), 0);
    }
}
