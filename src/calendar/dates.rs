//! Local-calendar date helpers for the week and month views.
//!
//! Weeks start on Sunday. All formatting goes through the local timezone so a
//! late-evening timestamp never lands on the next UTC day.

use chrono::{DateTime, Datelike, Duration, Local, Months, NaiveDate, TimeZone};

pub fn today() -> NaiveDate {
    Local::now().date_naive()
}

/// `YYYY-MM-DD` of the local calendar day the instant falls on.
pub fn format_local_date<Tz: TimeZone>(instant: &DateTime<Tz>) -> String {
    instant
        .with_timezone(&Local)
        .date_naive()
        .format("%Y-%m-%d")
        .to_string()
}

pub fn format_date(date: NaiveDate) -> String {
    date.format("%Y-%m-%d").to_string()
}

pub fn parse_date(value: &str) -> Option<NaiveDate> {
    NaiveDate::parse_from_str(value.trim(), "%Y-%m-%d").ok()
}

pub fn week_start(date: NaiveDate) -> NaiveDate {
    date - Duration::days(i64::from(date.weekday().num_days_from_sunday()))
}

pub fn week_days(date: NaiveDate) -> [NaiveDate; 7] {
    let start = week_start(date);
    std::array::from_fn(|offset| start + Duration::days(offset as i64))
}

/// First and last day of the Sunday-based week containing `date`.
pub fn week_range(date: NaiveDate) -> (NaiveDate, NaiveDate) {
    let start = week_start(date);
    (start, start + Duration::days(6))
}

/// First and last day of the month containing `date`.
pub fn month_range(date: NaiveDate) -> (NaiveDate, NaiveDate) {
    let first = date.with_day(1).unwrap_or(date);
    let last = first + Months::new(1) - Duration::days(1);
    (first, last)
}

/// Month grid cells: `None` for the leading weekday offset, every day of the
/// month, then trailing `None` so the grid is made of whole weeks.
pub fn month_days(date: NaiveDate) -> Vec<Option<NaiveDate>> {
    let (first, last) = month_range(date);
    let offset = first.weekday().num_days_from_sunday() as usize;

    let mut cells: Vec<Option<NaiveDate>> = vec![None; offset];
    cells.extend(first.iter_days().take_while(|d| *d <= last).map(Some));

    let rows = cells.len().div_ceil(7);
    cells.resize(rows * 7, None);
    cells
}

/// Inclusive membership test. A missing end means a single-day span.
pub fn date_range_contains(day: NaiveDate, start: NaiveDate, end: Option<NaiveDate>) -> bool {
    match end {
        None => day == start,
        Some(end) => start <= day && day <= end,
    }
}

pub fn shift_weeks(date: NaiveDate, weeks: i64) -> NaiveDate {
    date + Duration::weeks(weeks)
}

/// Move by whole months, clamping the day to the target month's length.
pub fn shift_months(date: NaiveDate, months: i32) -> NaiveDate {
    let step = Months::new(months.unsigned_abs());
    let shifted = if months >= 0 {
        date.checked_add_months(step)
    } else {
        date.checked_sub_months(step)
    };
    shifted.unwrap_or(date)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{FixedOffset, Weekday};

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn range_without_end_is_single_day() {
        let start = date(2025, 4, 10);
        assert!(date_range_contains(start, start, None));
        assert!(!date_range_contains(date(2025, 4, 11), start, None));
        assert!(!date_range_contains(date(2025, 4, 9), start, None));
    }

    #[test]
    fn range_with_end_is_inclusive() {
        let start = date(2025, 4, 10);
        let end = Some(date(2025, 4, 12));
        assert!(date_range_contains(start, start, end));
        assert!(date_range_contains(date(2025, 4, 11), start, end));
        assert!(date_range_contains(date(2025, 4, 12), start, end));
        assert!(!date_range_contains(date(2025, 4, 9), start, end));
        assert!(!date_range_contains(date(2025, 4, 13), start, end));
    }

    #[test]
    fn week_starts_on_sunday() {
        // 2025-04-16 is a Wednesday.
        let days = week_days(date(2025, 4, 16));
        assert_eq!(days[0], date(2025, 4, 13));
        assert_eq!(days[0].weekday(), Weekday::Sun);
        assert_eq!(days[6], date(2025, 4, 19));
        assert_eq!(week_start(date(2025, 4, 13)), date(2025, 4, 13));
        assert_eq!(week_range(date(2025, 4, 19)), (date(2025, 4, 13), date(2025, 4, 19)));
    }

    #[test]
    fn month_grid_pads_to_whole_weeks() {
        // February 2025 starts on a Saturday: 6 leading blanks, 28 days.
        let cells = month_days(date(2025, 2, 14));
        assert_eq!(cells.len(), 35);
        assert!(cells[..6].iter().all(Option::is_none));
        assert_eq!(cells[6], Some(date(2025, 2, 1)));
        assert_eq!(cells[33], Some(date(2025, 2, 28)));
        assert_eq!(cells[34], None);

        // February 2026 starts on a Sunday and fills exactly four rows.
        let cells = month_days(date(2026, 2, 1));
        assert_eq!(cells.len(), 28);
        assert!(cells.iter().all(Option::is_some));
    }

    #[test]
    fn month_range_handles_leap_years() {
        assert_eq!(month_range(date(2024, 2, 10)), (date(2024, 2, 1), date(2024, 2, 29)));
        assert_eq!(month_range(date(2025, 12, 31)), (date(2025, 12, 1), date(2025, 12, 31)));
    }

    #[test]
    fn month_shift_clamps_day() {
        assert_eq!(shift_months(date(2025, 1, 31), 1), date(2025, 2, 28));
        assert_eq!(shift_months(date(2025, 3, 31), -1), date(2025, 2, 28));
        assert_eq!(shift_weeks(date(2025, 3, 31), -1), date(2025, 3, 24));
    }

    #[test]
    fn local_formatting_follows_local_calendar() {
        let offset = FixedOffset::east_opt(9 * 3600).unwrap();
        let instant = offset.with_ymd_and_hms(2025, 5, 1, 23, 30, 0).unwrap();
        let expected = instant.with_timezone(&Local).date_naive();
        assert_eq!(format_local_date(&instant), format_date(expected));
        assert_eq!(parse_date(&format_date(expected)), Some(expected));
    }
}
