//! Calendar-consistent date and clock strings for dynamic assertions.
//!
//! The schedule header renders the selected day as
//! `"Schedule for Tuesday, December 30, 2025"`. Assertions compare by
//! containment so the header prefix is tolerated.

use chrono::{Datelike, Local, NaiveDate, Timelike};

/// The local calendar date of the invoking machine
pub fn today() -> NaiveDate {
    Local::now().date_naive()
}

/// Long-form English date, e.g. `"Tuesday, December 30, 2025"`
pub fn format_long_date(date: NaiveDate) -> String {
    date.format("%A, %B %-d, %Y").to_string()
}

/// Today's date in long form
pub fn formatted_date() -> String {
    format_long_date(today())
}

/// Day of the month (1-31)
pub fn current_day_of_month() -> u32 {
    today().day()
}

/// Full English month name, e.g. `"December"`
pub fn month_name(date: NaiveDate) -> String {
    date.format("%B").to_string()
}

/// Current month name
pub fn current_month_name() -> String {
    month_name(today())
}

/// Current year
pub fn current_year() -> i32 {
    today().year()
}

/// Calendar caption for the month containing `date`, e.g. `"December 2025"`
pub fn month_year_label(date: NaiveDate) -> String {
    date.format("%B %Y").to_string()
}

/// Zero-padded 24h clock time
pub fn format_clock_time(hour: u32, minute: u32) -> String {
    format!("{hour:02}:{minute:02}")
}

/// Current local time as `HH:MM`
pub fn current_clock_time() -> String {
    let now = Local::now();
    format_clock_time(now.hour(), now.minute())
}

/// Whether a rendered header mentions `date` in long form
pub fn header_contains_date(header: &str, date: NaiveDate) -> bool {
    header.contains(&format_long_date(date))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).expect("valid date")
    }

    #[test]
    fn long_date_matches_header_format() {
        assert_eq!(
            format_long_date(date(2025, 12, 30)),
            "Tuesday, December 30, 2025"
        );
    }

    #[test]
    fn long_date_does_not_pad_day() {
        assert_eq!(format_long_date(date(2026, 11, 1)), "Sunday, November 1, 2026");
    }

    #[test]
    fn header_containment_handles_leap_day() {
        let leap = date(2028, 2, 29);
        assert_eq!(format_long_date(leap), "Tuesday, February 29, 2028");
        assert!(header_contains_date(
            "Schedule for Tuesday, February 29, 2028",
            leap
        ));
    }

    #[test]
    fn header_containment_across_rollovers() {
        let cases = [
            (date(2025, 12, 31), "Schedule for Wednesday, December 31, 2025"),
            (date(2026, 1, 1), "Schedule for Thursday, January 1, 2026"),
            (date(2026, 10, 31), "Schedule for Saturday, October 31, 2026"),
            (date(2024, 2, 29), "Schedule for Thursday, February 29, 2024"),
        ];
        for (day, header) in cases {
            assert!(header_contains_date(header, day), "{header}");
            let next = day.succ_opt().expect("next day");
            assert!(!header_contains_date(header, next), "{header} vs {next}");
        }
    }

    #[test]
    fn containment_tolerates_any_prefix() {
        let day = date(2026, 3, 9);
        for prefix in ["", "Schedule for ", "Today: "] {
            let header = format!("{prefix}{}", format_long_date(day));
            assert!(header_contains_date(&header, day));
        }
    }

    #[test]
    fn month_helpers() {
        assert_eq!(month_name(date(2026, 10, 19)), "October");
        assert_eq!(month_year_label(date(2026, 10, 19)), "October 2026");
    }

    #[test]
    fn clock_time_is_zero_padded() {
        assert_eq!(format_clock_time(9, 0), "09:00");
        assert_eq!(format_clock_time(14, 5), "14:05");
        assert_eq!(format_clock_time(0, 0), "00:00");
    }

    #[test]
    fn current_values_are_in_range() {
        let day = current_day_of_month();
        assert!((1..=31).contains(&day));
        assert_eq!(current_clock_time().len(), 5);
        assert!(formatted_date().contains(&current_year().to_string()));
        assert!(formatted_date().contains(&current_month_name()));
    }
}
