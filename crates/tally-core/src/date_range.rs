//! # Date Range Resolution
//!
//! Every report screen offers the same quick-pick selectors. This module is
//! the single place that turns a selector and "today" into concrete dates.
//!
//! ## Selector Table (today = Friday 2024-03-15)
//! ```text
//! ┌──────────────┬──────────────────────────────┬───────────────────────────┐
//! │ Selector     │ Rule                         │ Result                    │
//! ├──────────────┼──────────────────────────────┼───────────────────────────┤
//! │ today        │ [today, today]               │ 2024-03-15 … 2024-03-15   │
//! │ yesterday    │ [today-1, today-1]           │ 2024-03-14 … 2024-03-14   │
//! │ thisWeek     │ [Monday, today]              │ 2024-03-11 … 2024-03-15   │
//! │ lastWeek     │ [prev Monday, prev Sunday]   │ 2024-03-04 … 2024-03-10   │
//! │ thisMonth    │ [2nd of month, today]        │ 2024-03-02 … 2024-03-15   │
//! │ lastMonth    │ [1st, last of prev month]    │ 2024-02-01 … 2024-02-29   │
//! │ thisQuarter  │ [2nd of quarter start, today]│ 2024-01-02 … 2024-03-15   │
//! │ thisYear     │ [Jan 2, today]               │ 2024-01-02 … 2024-03-15   │
//! │ custom       │ caller supplies both dates   │ unchanged                 │
//! └──────────────┴──────────────────────────────┴───────────────────────────┘
//! ```
//!
//! The month, quarter and year ranges start on day 2. Reported totals have
//! always been computed this way, so the anchor is kept and pinned by tests.
//! On the 1st of a month `thisMonth` therefore yields a start after its end.
//!
//! Weeks start on Monday; a Sunday belongs to the week that began six days
//! earlier.

use std::fmt;
use std::str::FromStr;

use chrono::{Datelike, Days, Months, NaiveDate};
use serde::{Deserialize, Serialize};
use ts_rs::TS;

use crate::error::{CoreError, CoreResult};

/// Wire format for range bounds.
pub const DATE_FORMAT: &str = "%Y-%m-%d";

// =============================================================================
// Selector
// =============================================================================

/// Symbolic quick-pick range.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize, TS)]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub enum RangeSelector {
    #[default]
    Today,
    Yesterday,
    ThisWeek,
    LastWeek,
    ThisMonth,
    LastMonth,
    ThisQuarter,
    ThisYear,
    Custom,
}

impl RangeSelector {
    pub const ALL: [RangeSelector; 9] = [
        RangeSelector::Today,
        RangeSelector::Yesterday,
        RangeSelector::ThisWeek,
        RangeSelector::LastWeek,
        RangeSelector::ThisMonth,
        RangeSelector::LastMonth,
        RangeSelector::ThisQuarter,
        RangeSelector::ThisYear,
        RangeSelector::Custom,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            RangeSelector::Today => "today",
            RangeSelector::Yesterday => "yesterday",
            RangeSelector::ThisWeek => "thisWeek",
            RangeSelector::LastWeek => "lastWeek",
            RangeSelector::ThisMonth => "thisMonth",
            RangeSelector::LastMonth => "lastMonth",
            RangeSelector::ThisQuarter => "thisQuarter",
            RangeSelector::ThisYear => "thisYear",
            RangeSelector::Custom => "custom",
        }
    }
}

impl FromStr for RangeSelector {
    type Err = CoreError;

    /// Accepts the camelCase keys plus kebab/snake spellings ("this-week").
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let normalized: String = s
            .trim()
            .chars()
            .filter(|c| *c != '-' && *c != '_')
            .map(|c| c.to_ascii_lowercase())
            .collect();
        RangeSelector::ALL
            .into_iter()
            .find(|selector| selector.as_str().to_ascii_lowercase() == normalized)
            .ok_or_else(|| CoreError::UnknownRangeSelector(s.to_string()))
    }
}

impl fmt::Display for RangeSelector {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// =============================================================================
// Date Range
// =============================================================================

/// Inclusive calendar range, in the caller's local calendar.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, TS)]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct DateRange {
    #[ts(as = "String")]
    pub start: NaiveDate,
    #[ts(as = "String")]
    pub end: NaiveDate,
}

impl DateRange {
    /// Builds a range without reordering; see [`DateRange::checked`].
    pub const fn new(start: NaiveDate, end: NaiveDate) -> Self {
        DateRange { start, end }
    }

    /// Builds a range, rejecting an end before the start.
    pub fn checked(start: NaiveDate, end: NaiveDate) -> CoreResult<Self> {
        if end < start {
            return Err(CoreError::InvalidDateRange { start, end });
        }
        Ok(DateRange { start, end })
    }

    pub const fn single(day: NaiveDate) -> Self {
        DateRange { start: day, end: day }
    }

    /// Inclusive number of days, never less than one.
    pub fn day_count(&self) -> i64 {
        ((self.end - self.start).num_days() + 1).max(1)
    }

    pub fn contains(&self, day: NaiveDate) -> bool {
        self.start <= day && day <= self.end
    }

    pub fn start_param(&self) -> String {
        self.start.format(DATE_FORMAT).to_string()
    }

    pub fn end_param(&self) -> String {
        self.end.format(DATE_FORMAT).to_string()
    }
}

impl fmt::Display for DateRange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} … {}", self.start_param(), self.end_param())
    }
}

/// Resolves a quick-pick selector against `today`.
///
/// Returns `None` for [`RangeSelector::Custom`], whose dates come from the
/// caller, and at the very edges of the calendar where a bound would not
/// exist.
///
/// ## Example
/// ```rust
/// use chrono::NaiveDate;
/// use tally_core::date_range::{resolve, RangeSelector};
///
/// let sunday = NaiveDate::from_ymd_opt(2024, 3, 10).unwrap();
/// let week = resolve(RangeSelector::ThisWeek, sunday).unwrap();
/// assert_eq!(week.start, NaiveDate::from_ymd_opt(2024, 3, 4).unwrap());
/// assert_eq!(week.end, sunday);
/// ```
pub fn resolve(selector: RangeSelector, today: NaiveDate) -> Option<DateRange> {
    match selector {
        RangeSelector::Today => Some(DateRange::single(today)),
        RangeSelector::Yesterday => today.pred_opt().map(DateRange::single),
        RangeSelector::ThisWeek => week_start(today).map(|monday| DateRange::new(monday, today)),
        RangeSelector::LastWeek => {
            let monday = week_start(today)?.checked_sub_days(Days::new(7))?;
            let sunday = monday.checked_add_days(Days::new(6))?;
            Some(DateRange::new(monday, sunday))
        }
        RangeSelector::ThisMonth => {
            NaiveDate::from_ymd_opt(today.year(), today.month(), 2).map(|start| DateRange::new(start, today))
        }
        RangeSelector::LastMonth => {
            let first_of_month = today.with_day(1)?;
            let start = first_of_month.checked_sub_months(Months::new(1))?;
            let end = first_of_month.pred_opt()?;
            Some(DateRange::new(start, end))
        }
        RangeSelector::ThisQuarter => {
            let quarter_month = (today.month0() / 3) * 3 + 1;
            NaiveDate::from_ymd_opt(today.year(), quarter_month, 2).map(|start| DateRange::new(start, today))
        }
        RangeSelector::ThisYear => {
            NaiveDate::from_ymd_opt(today.year(), 1, 2).map(|start| DateRange::new(start, today))
        }
        RangeSelector::Custom => None,
    }
}

/// Monday of the week containing `day`.
fn week_start(day: NaiveDate) -> Option<NaiveDate> {
    day.checked_sub_days(Days::new(u64::from(day.weekday().num_days_from_monday())))
}

// =============================================================================
// Picker State
// =============================================================================

/// The range control shared by every report view.
///
/// ## User Workflow
/// ```text
/// select("thisWeek") ──► range = [Mon, today], selector = thisWeek
///        │
/// set_end(earlier than start) ──► start snaps to the new end
///        │                         selector becomes custom
/// select("bogus") ──► nothing changes
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS)]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct DateRangePicker {
    pub selector: RangeSelector,
    pub range: DateRange,
}

impl DateRangePicker {
    /// Starts on "today".
    pub fn new(today: NaiveDate) -> Self {
        DateRangePicker {
            selector: RangeSelector::Today,
            range: DateRange::single(today),
        }
    }

    /// Starts from an explicit custom range.
    pub fn custom(range: DateRange) -> Self {
        DateRangePicker {
            selector: RangeSelector::Custom,
            range,
        }
    }

    /// Applies a quick pick. Returns whether anything changed.
    ///
    /// `Custom` only switches the selector label; the dates stay as they are.
    pub fn select(&mut self, selector: RangeSelector, today: NaiveDate) -> bool {
        let before = *self;
        self.selector = selector;
        if let Some(range) = resolve(selector, today) {
            self.range = range;
        }
        *self != before
    }

    /// Applies a quick pick by its key; unknown keys are ignored.
    pub fn select_key(&mut self, key: &str, today: NaiveDate) -> bool {
        match key.parse::<RangeSelector>() {
            Ok(selector) => self.select(selector, today),
            Err(_) => false,
        }
    }

    /// Sets the start date; an end before it snaps forward to match.
    pub fn set_start(&mut self, start: NaiveDate) {
        self.selector = RangeSelector::Custom;
        self.range.start = start;
        if self.range.end < start {
            self.range.end = start;
        }
    }

    /// Sets the end date; a start after it snaps back to match.
    pub fn set_end(&mut self, end: NaiveDate) {
        self.selector = RangeSelector::Custom;
        self.range.end = end;
        if self.range.start > end {
            self.range.start = end;
        }
    }

    pub fn range(&self) -> DateRange {
        self.range
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Weekday;

    fn d(y: i32, m: u32, day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, day).unwrap()
    }

    #[test]
    fn test_today_and_yesterday() {
        let today = d(2024, 3, 1);
        assert_eq!(resolve(RangeSelector::Today, today), Some(DateRange::single(today)));
        assert_eq!(
            resolve(RangeSelector::Yesterday, today),
            Some(DateRange::single(d(2024, 2, 29)))
        );
    }

    #[test]
    fn test_this_week_starts_on_monday_even_on_sunday() {
        let range = resolve(RangeSelector::ThisWeek, d(2024, 3, 10)).unwrap();
        assert_eq!(range.start, d(2024, 3, 4));
        assert_eq!(range.end, d(2024, 3, 10));

        let range = resolve(RangeSelector::ThisWeek, d(2024, 3, 4)).unwrap();
        assert_eq!(range.start, d(2024, 3, 4));
    }

    #[test]
    fn test_this_week_always_monday_for_a_whole_year() {
        let mut day = d(2024, 1, 1);
        while day.year() == 2024 {
            let range = resolve(RangeSelector::ThisWeek, day).unwrap();
            assert_eq!(range.start.weekday(), Weekday::Mon, "today = {day}");
            assert!(range.day_count() <= 7);
            day = day.succ_opt().unwrap();
        }
    }

    #[test]
    fn test_last_week_is_the_seven_days_before_this_monday() {
        let mut day = d(2023, 12, 20);
        while day < d(2024, 2, 10) {
            let this_week = resolve(RangeSelector::ThisWeek, day).unwrap();
            let last_week = resolve(RangeSelector::LastWeek, day).unwrap();
            assert_eq!(last_week.start.weekday(), Weekday::Mon);
            assert_eq!(last_week.end.weekday(), Weekday::Sun);
            assert_eq!(last_week.day_count(), 7);
            assert_eq!(last_week.end.succ_opt().unwrap(), this_week.start);
            day = day.succ_opt().unwrap();
        }
    }

    #[test]
    fn test_this_month_starts_on_day_two() {
        let range = resolve(RangeSelector::ThisMonth, d(2024, 3, 15)).unwrap();
        assert_eq!(range.start, d(2024, 3, 2));
        assert_eq!(range.end, d(2024, 3, 15));
    }

    #[test]
    fn test_this_month_on_the_first_is_inverted() {
        let range = resolve(RangeSelector::ThisMonth, d(2024, 3, 1)).unwrap();
        assert_eq!(range.start, d(2024, 3, 2));
        assert_eq!(range.end, d(2024, 3, 1));
        assert_eq!(range.day_count(), 1);
    }

    #[test]
    fn test_last_month_spans_the_whole_month() {
        let range = resolve(RangeSelector::LastMonth, d(2024, 3, 15)).unwrap();
        assert_eq!(range, DateRange::new(d(2024, 2, 1), d(2024, 2, 29)));

        let range = resolve(RangeSelector::LastMonth, d(2024, 1, 31)).unwrap();
        assert_eq!(range, DateRange::new(d(2023, 12, 1), d(2023, 12, 31)));
    }

    #[test]
    fn test_quarter_and_year() {
        let range = resolve(RangeSelector::ThisQuarter, d(2024, 8, 20)).unwrap();
        assert_eq!(range.start, d(2024, 7, 2));
        let range = resolve(RangeSelector::ThisQuarter, d(2024, 12, 31)).unwrap();
        assert_eq!(range.start, d(2024, 10, 2));
        let range = resolve(RangeSelector::ThisYear, d(2024, 8, 20)).unwrap();
        assert_eq!(range.start, d(2024, 1, 2));
        assert_eq!(range.end, d(2024, 8, 20));
    }

    #[test]
    fn test_custom_resolves_to_nothing() {
        assert_eq!(resolve(RangeSelector::Custom, d(2024, 3, 15)), None);
    }

    #[test]
    fn test_selector_parsing() {
        assert_eq!("thisWeek".parse::<RangeSelector>().unwrap(), RangeSelector::ThisWeek);
        assert_eq!("this-week".parse::<RangeSelector>().unwrap(), RangeSelector::ThisWeek);
        assert_eq!("LAST_MONTH".parse::<RangeSelector>().unwrap(), RangeSelector::LastMonth);
        assert!(matches!(
            "fortnight".parse::<RangeSelector>(),
            Err(CoreError::UnknownRangeSelector(_))
        ));
    }

    #[test]
    fn test_day_count_and_contains() {
        let range = DateRange::new(d(2024, 3, 1), d(2024, 3, 10));
        assert_eq!(range.day_count(), 10);
        assert!(range.contains(d(2024, 3, 1)));
        assert!(range.contains(d(2024, 3, 10)));
        assert!(!range.contains(d(2024, 3, 11)));
        assert_eq!(range.start_param(), "2024-03-01");
    }

    #[test]
    fn test_checked_rejects_inverted_range() {
        assert!(DateRange::checked(d(2024, 3, 10), d(2024, 3, 1)).is_err());
        assert!(DateRange::checked(d(2024, 3, 1), d(2024, 3, 1)).is_ok());
    }

    #[test]
    fn test_picker_unknown_key_is_noop() {
        let today = d(2024, 3, 15);
        let mut picker = DateRangePicker::new(today);
        assert!(picker.select_key("thisWeek", today));
        let before = picker;
        assert!(!picker.select_key("fortnight", today));
        assert_eq!(picker, before);
    }

    #[test]
    fn test_picker_custom_keeps_dates() {
        let today = d(2024, 3, 15);
        let mut picker = DateRangePicker::new(today);
        picker.select(RangeSelector::LastMonth, today);
        let range = picker.range();
        picker.select(RangeSelector::Custom, today);
        assert_eq!(picker.range(), range);
        assert_eq!(picker.selector, RangeSelector::Custom);
    }

    #[test]
    fn test_picker_snaps_bounds() {
        let mut picker = DateRangePicker::custom(DateRange::new(d(2024, 3, 5), d(2024, 3, 10)));

        picker.set_end(d(2024, 3, 1));
        assert_eq!(picker.range(), DateRange::new(d(2024, 3, 1), d(2024, 3, 1)));

        picker.set_start(d(2024, 3, 20));
        assert_eq!(picker.range(), DateRange::new(d(2024, 3, 20), d(2024, 3, 20)));

        picker.set_end(d(2024, 3, 25));
        assert_eq!(picker.range(), DateRange::new(d(2024, 3, 20), d(2024, 3, 25)));
    }
}
