// src/period.rs
//
// Date-range quantization: turning one report range into an ordered list of
// column sub-ranges, one per period of the requested frequency, plus the
// human-readable heading for each column.

use chrono::{Datelike, Days, NaiveDate, Weekday};
use serde::Serialize;

/// Hard cap on the number of days a daily-frequency report may span.
pub const MAX_DAILY_SPAN_DAYS: i64 = 32;

// UK tax year: 6 April through 5 April of the following year.
const TAX_YEAR_START_MONTH: u32 = 4;
const TAX_YEAR_START_DAY: u32 = 6;

/// An inclusive range of calendar dates. `first <= last` always holds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct DateRange {
    pub first: NaiveDate,
    pub last: NaiveDate,
}

impl DateRange {
    pub fn new(first: NaiveDate, last: NaiveDate) -> Self {
        debug_assert!(first <= last, "DateRange built backwards: {first} > {last}");
        Self { first, last }
    }

    pub fn single_day(day: NaiveDate) -> Self {
        Self { first: day, last: day }
    }

    pub fn contains(&self, date: NaiveDate) -> bool {
        self.first <= date && date <= self.last
    }

    /// Number of calendar days covered, inclusive of both endpoints.
    pub fn day_count(&self) -> i64 {
        (self.last - self.first).num_days() + 1
    }

    /// The trailing `days`-day portion of this range, or the whole range if
    /// it is already short enough.
    pub fn clamp_to_last_days(&self, days: i64) -> Self {
        if self.day_count() <= days {
            return *self;
        }
        let first = self
            .last
            .checked_sub_days(Days::new((days - 1) as u64))
            .unwrap_or(self.first);
        Self { first, last: self.last }
    }
}

/// Time granularity of report columns.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum Frequency {
    TotalsOnly,
    TaxYear,
    CalendarYear,
    Quarter,
    Month,
    Week,
    Daily,
}

pub(crate) fn last_day_of_month(year: i32, month: u32) -> Option<NaiveDate> {
    let (next_year, next_month) = if month == 12 {
        (year + 1, 1)
    } else {
        (year, month + 1)
    };
    NaiveDate::from_ymd_opt(next_year, next_month, 1)?.pred_opt()
}

fn tax_year_start_year(date: NaiveDate) -> i32 {
    if (date.month(), date.day()) >= (TAX_YEAR_START_MONTH, TAX_YEAR_START_DAY) {
        date.year()
    } else {
        date.year() - 1
    }
}

/// Last day of the period of `frequency` containing `date`. `None` for the
/// modes that have no intrinsic period length (totals-only), or on calendar
/// overflow, in which case the caller lets the period run to the range end.
pub(crate) fn end_of_period(
    date: NaiveDate,
    frequency: Frequency,
    week_start: Weekday,
) -> Option<NaiveDate> {
    match frequency {
        Frequency::TotalsOnly => None,
        Frequency::Daily => Some(date),
        Frequency::TaxYear => {
            // 5 April of the year after the tax year opens.
            NaiveDate::from_ymd_opt(
                tax_year_start_year(date) + 1,
                TAX_YEAR_START_MONTH,
                TAX_YEAR_START_DAY - 1,
            )
        }
        Frequency::CalendarYear => NaiveDate::from_ymd_opt(date.year(), 12, 31),
        Frequency::Quarter => {
            let quarter_end_month = ((date.month() - 1) / 3) * 3 + 3;
            last_day_of_month(date.year(), quarter_end_month)
        }
        Frequency::Month => last_day_of_month(date.year(), date.month()),
        Frequency::Week => {
            let into_week = date.weekday().days_since(week_start) as u64;
            date.checked_add_days(Days::new(6 - into_week))
        }
    }
}

/// First day of the period of `frequency` containing `date`. Mirrors
/// [`end_of_period`]; used for partial-column detection.
pub(crate) fn start_of_period(
    date: NaiveDate,
    frequency: Frequency,
    week_start: Weekday,
) -> Option<NaiveDate> {
    match frequency {
        Frequency::TotalsOnly => None,
        Frequency::Daily => Some(date),
        Frequency::TaxYear => NaiveDate::from_ymd_opt(
            tax_year_start_year(date),
            TAX_YEAR_START_MONTH,
            TAX_YEAR_START_DAY,
        ),
        Frequency::CalendarYear => NaiveDate::from_ymd_opt(date.year(), 1, 1),
        Frequency::Quarter => {
            let quarter_start_month = ((date.month() - 1) / 3) * 3 + 1;
            NaiveDate::from_ymd_opt(date.year(), quarter_start_month, 1)
        }
        Frequency::Month => NaiveDate::from_ymd_opt(date.year(), date.month(), 1),
        Frequency::Week => {
            let into_week = date.weekday().days_since(week_start) as u64;
            date.checked_sub_days(Days::new(into_week))
        }
    }
}

/// Restartable iterator over the column sub-ranges of one report range.
///
/// Starting at `range.first`, each step emits
/// `[current, min(end_of_period(current), range.last)]` and advances to the
/// day after. First and last columns may therefore be partial periods when
/// the range does not align to period boundaries.
#[derive(Debug, Clone)]
pub struct PeriodIter {
    remaining: Option<DateRange>,
    frequency: Frequency,
    week_start: Weekday,
}

impl Iterator for PeriodIter {
    type Item = DateRange;

    fn next(&mut self) -> Option<DateRange> {
        let whole = self.remaining?;
        let end = end_of_period(whole.first, self.frequency, self.week_start)
            .map(|period_end| period_end.min(whole.last))
            .unwrap_or(whole.last);
        self.remaining = end
            .succ_opt()
            .filter(|next| *next <= whole.last)
            .map(|next| DateRange::new(next, whole.last));
        Some(DateRange::new(whole.first, end))
    }
}

/// Partition `range` into column sub-ranges of the given frequency.
///
/// Recomputed per report compilation; nothing is cached across reports. The
/// emitted sub-ranges tile `range` exactly: ascending, no gaps, no overlaps.
pub fn columns(range: DateRange, frequency: Frequency, week_start: Weekday) -> PeriodIter {
    PeriodIter {
        remaining: Some(range),
        frequency,
        week_start,
    }
}

/// Whether `column` covers less than the full quantized period it sits in.
///
/// Detection deliberately compares against the period boundaries, not the
/// requested report range: a January..December report in quarterly mode has
/// no partial columns even though the range itself was user-supplied.
pub fn is_partial_column(column: DateRange, frequency: Frequency, week_start: Weekday) -> bool {
    match frequency {
        Frequency::TotalsOnly | Frequency::Daily => false,
        _ => {
            start_of_period(column.first, frequency, week_start) != Some(column.first)
                || end_of_period(column.first, frequency, week_start) != Some(column.last)
        }
    }
}

/// Human-readable heading for one report column, e.g. tax year "2007 / 2008"
/// or weekly "06-Apr-2008 (15)". Pure formatting; one arm per frequency.
pub fn column_heading(frequency: Frequency, column: DateRange) -> String {
    match frequency {
        Frequency::TotalsOnly => format!(
            "{} - {}",
            column.first.format("%d-%b-%Y"),
            column.last.format("%d-%b-%Y")
        ),
        Frequency::TaxYear => {
            let opens = tax_year_start_year(column.first);
            format!("{} / {}", opens, opens + 1)
        }
        Frequency::CalendarYear => column.first.year().to_string(),
        Frequency::Quarter => format!(
            "Q{} {}",
            (column.first.month() - 1) / 3 + 1,
            column.first.year()
        ),
        Frequency::Month => column.first.format("%b %Y").to_string(),
        Frequency::Week => format!(
            "{} ({})",
            column.first.format("%d-%b-%Y"),
            column.first.iso_week().week()
        ),
        Frequency::Daily => column.first.format("%d-%b-%Y").to_string(),
    }
}
