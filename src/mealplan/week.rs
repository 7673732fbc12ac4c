use time::format_description::FormatItem;
use time::macros::format_description;
use time::{Date, Duration};

use crate::error::{ApiError, ApiResult};
use crate::repo::{DayMeals, WeekMeals};

/// Canonical day names. Every module that turns a day name into a date or an
/// offset goes through this table; the slot names live on
/// [`DayMeals::slots`](crate::repo::DayMeals::slots).
pub const DAYS: [&str; 7] = [
    "monday",
    "tuesday",
    "wednesday",
    "thursday",
    "friday",
    "saturday",
    "sunday",
];

const DATE_FMT: &[FormatItem<'static>] = format_description!("[year]-[month]-[day]");

/// Offset of a day within its week: monday → 0 .. sunday → 6.
pub fn day_offset(day: &str) -> Option<i64> {
    DAYS.iter().position(|d| *d == day).map(|i| i as i64)
}

/// Date of `day` in the week starting at `week_start` (a Monday).
/// Unknown day names yield None.
pub fn date_for_day(week_start: Date, day: &str) -> Option<Date> {
    Some(week_start + Duration::days(day_offset(day)?))
}

/// The Monday of the week containing `date`.
pub fn monday_of(date: Date) -> Date {
    date - Duration::days(i64::from(date.weekday().number_days_from_monday()))
}

/// Parse a client-supplied date. Accepts a bare `YYYY-MM-DD` or a full ISO
/// timestamp (trailing `Z` included); only the date part is kept.
pub fn parse_date(raw: &str) -> ApiResult<Date> {
    let trimmed = raw.trim();
    let date_part = trimmed.get(..10).unwrap_or(trimmed);
    Date::parse(date_part, DATE_FMT).map_err(|_| ApiError::invalid(format!("Invalid date: {raw}")))
}

/// Parse a client-supplied week-start value; any day of the target week may
/// be sent, so callers that key storage on it must normalize with
/// [`monday_of`] where required.
pub fn parse_week_start(raw: &str) -> ApiResult<Date> {
    parse_date(raw).map_err(|_| ApiError::invalid(format!("Invalid week start date: {raw}")))
}

pub fn format_date(date: Date) -> String {
    // The format only contains infallible components.
    date.format(DATE_FMT).unwrap_or_default()
}

/// Empty skeleton: all seven days present, all four slots null.
pub fn empty_week() -> WeekMeals {
    DAYS.iter()
        .map(|d| (d.to_string(), DayMeals::default()))
        .collect()
}

/// "breakfast" → "Breakfast", for notification copy.
pub fn title_case(word: &str) -> String {
    let mut chars = word.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().collect::<String>() + chars.as_str(),
        None => String::new(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use time::macros::date;

    #[test]
    fn day_offsets_span_the_week() {
        assert_eq!(day_offset("monday"), Some(0));
        assert_eq!(day_offset("thursday"), Some(3));
        assert_eq!(day_offset("sunday"), Some(6));
        assert_eq!(day_offset("caturday"), None);
    }

    #[test]
    fn date_for_day_walks_from_week_start() {
        let monday = date!(2025 - 06 - 09);
        assert_eq!(date_for_day(monday, "monday"), Some(monday));
        assert_eq!(date_for_day(monday, "wednesday"), Some(date!(2025 - 06 - 11)));
        assert_eq!(date_for_day(monday, "sunday"), Some(date!(2025 - 06 - 15)));
        assert_eq!(date_for_day(monday, "someday"), None);
    }

    #[test]
    fn monday_of_normalizes_any_weekday() {
        // 2025-06-11 is a Wednesday.
        assert_eq!(monday_of(date!(2025 - 06 - 11)), date!(2025 - 06 - 09));
        assert_eq!(monday_of(date!(2025 - 06 - 09)), date!(2025 - 06 - 09));
        assert_eq!(monday_of(date!(2025 - 06 - 15)), date!(2025 - 06 - 09));
    }

    #[test]
    fn parse_accepts_bare_dates_and_iso_timestamps() {
        assert_eq!(parse_week_start("2025-06-09").unwrap(), date!(2025 - 06 - 09));
        assert_eq!(
            parse_week_start("2025-06-09T00:00:00.000Z").unwrap(),
            date!(2025 - 06 - 09)
        );
        assert_eq!(
            parse_week_start(" 2025-06-09T14:30:00Z ").unwrap(),
            date!(2025 - 06 - 09)
        );
        assert!(parse_week_start("next monday").is_err());
        assert!(parse_week_start("").is_err());
    }

    #[test]
    fn empty_week_has_all_days_and_null_slots() {
        let week = empty_week();
        assert_eq!(week.len(), 7);
        for day in DAYS {
            let meals = week.get(day).expect("day present");
            assert!(meals.slots().iter().all(|(_, slot)| slot.is_none()));
        }
    }

    #[test]
    fn title_case_capitalizes_slot_names() {
        assert_eq!(title_case("breakfast"), "Breakfast");
        assert_eq!(title_case(""), "");
    }
}
