//! Holiday calendars consulted by the business-hours gate.

use std::collections::BTreeSet;

use chrono::{Datelike, NaiveDate, Weekday};

/// A queryable set of non-working dates.
pub trait HolidayCalendar: Send + Sync {
    fn is_holiday(&self, date: NaiveDate) -> bool;
}

/// Calendar with no holidays at all.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoHolidays;

impl HolidayCalendar for NoHolidays {
    fn is_holiday(&self, _date: NaiveDate) -> bool {
        false
    }
}

/// Explicit list of dates.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DateSet {
    dates: BTreeSet<NaiveDate>,
}

impl DateSet {
    pub fn new(dates: impl IntoIterator<Item = NaiveDate>) -> Self {
        Self {
            dates: dates.into_iter().collect(),
        }
    }

    /// Parse ISO-8601 (`YYYY-MM-DD`) dates.
    pub fn parse<S: AsRef<str>>(dates: &[S]) -> crate::Result<Self> {
        let mut parsed = BTreeSet::new();
        for raw in dates {
            let raw = raw.as_ref();
            let date = NaiveDate::parse_from_str(raw.trim(), "%Y-%m-%d").map_err(|e| {
                crate::ScanError::Configuration(format!("invalid holiday date '{}': {}", raw, e))
            })?;
            parsed.insert(date);
        }
        Ok(Self { dates: parsed })
    }

    pub fn len(&self) -> usize {
        self.dates.len()
    }

    pub fn is_empty(&self) -> bool {
        self.dates.is_empty()
    }
}

impl HolidayCalendar for DateSet {
    fn is_holiday(&self, date: NaiveDate) -> bool {
        self.dates.contains(&date)
    }
}

/// United States federal holidays, including weekend observance shifts.
#[derive(Debug, Clone, Copy, Default)]
pub struct UsFederalHolidays;

impl UsFederalHolidays {
    /// Holidays defined for `year`, actual and observed. An observed date can
    /// fall in the previous year (New Year's Day on a Saturday).
    pub fn holidays_for_year(year: i32) -> BTreeSet<NaiveDate> {
        let mut days = BTreeSet::new();

        let mut fixed = vec![(1, 1), (7, 4), (11, 11), (12, 25)];
        if year >= 2021 {
            fixed.push((6, 19));
        }
        for (month, day) in fixed {
            if let Some(date) = NaiveDate::from_ymd_opt(year, month, day) {
                days.insert(date);
                if let Some(observed) = observed(date) {
                    days.insert(observed);
                }
            }
        }

        let floating = [
            (1, Weekday::Mon, 3),  // Birthday of Martin Luther King, Jr.
            (2, Weekday::Mon, 3),  // Washington's Birthday
            (9, Weekday::Mon, 1),  // Labor Day
            (10, Weekday::Mon, 2), // Columbus Day
            (11, Weekday::Thu, 4), // Thanksgiving
        ];
        for (month, weekday, n) in floating {
            if let Some(date) = NaiveDate::from_weekday_of_month_opt(year, month, weekday, n) {
                days.insert(date);
            }
        }
        if let Some(memorial) = last_weekday_of_month(year, 5, Weekday::Mon) {
            days.insert(memorial);
        }

        days
    }
}

impl HolidayCalendar for UsFederalHolidays {
    fn is_holiday(&self, date: NaiveDate) -> bool {
        Self::holidays_for_year(date.year()).contains(&date)
            || Self::holidays_for_year(date.year() + 1).contains(&date)
    }
}

/// Union of several calendars.
#[derive(Default)]
pub struct CombinedCalendar {
    calendars: Vec<Box<dyn HolidayCalendar>>,
}

impl CombinedCalendar {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, calendar: impl HolidayCalendar + 'static) -> Self {
        self.calendars.push(Box::new(calendar));
        self
    }
}

impl HolidayCalendar for CombinedCalendar {
    fn is_holiday(&self, date: NaiveDate) -> bool {
        self.calendars.iter().any(|c| c.is_holiday(date))
    }
}

fn observed(date: NaiveDate) -> Option<NaiveDate> {
    match date.weekday() {
        Weekday::Sat => date.pred_opt(),
        Weekday::Sun => date.succ_opt(),
        _ => None,
    }
}

fn last_weekday_of_month(year: i32, month: u32, weekday: Weekday) -> Option<NaiveDate> {
    NaiveDate::from_weekday_of_month_opt(year, month, weekday, 5)
        .or_else(|| NaiveDate::from_weekday_of_month_opt(year, month, weekday, 4))
}
