//! Calendar-day identifiers (`YYYY-MM-DD`) used to attach tasks to day columns.

use crate::error::AppError;
use time::format_description::FormatItem;
use time::macros::format_description;
use time::{Date, UtcOffset};

const DAY_ID_FORMAT: &[FormatItem<'static>] = format_description!("[year]-[month]-[day]");

pub fn day_id(date: Date) -> String {
    // Only years outside 0..=9999 fail to format.
    date.format(DAY_ID_FORMAT).unwrap_or_else(|_| date.to_string())
}

pub fn parse_day_id(raw: &str) -> Result<Date, AppError> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return Err(AppError::invalid_input("day is required"));
    }

    let date = Date::parse(trimmed, DAY_ID_FORMAT)
        .map_err(|_| AppError::invalid_input("day must be YYYY-MM-DD"))?;
    if day_id(date) != trimmed {
        return Err(AppError::invalid_input("day must be YYYY-MM-DD"));
    }
    Ok(date)
}

/// Accepts a day identifier or one of `today`, `tomorrow`, `yesterday`
/// relative to `today`.
pub fn resolve_day(raw: &str, today: Date) -> Result<Date, AppError> {
    let trimmed = raw.trim();
    if trimmed.eq_ignore_ascii_case("today") {
        return Ok(today);
    }
    if trimmed.eq_ignore_ascii_case("tomorrow") {
        return today
            .next_day()
            .ok_or_else(|| AppError::invalid_input("day is out of range"));
    }
    if trimmed.eq_ignore_ascii_case("yesterday") {
        return today
            .previous_day()
            .ok_or_else(|| AppError::invalid_input("day is out of range"));
    }
    parse_day_id(trimmed)
}

pub fn local_offset() -> UtcOffset {
    UtcOffset::current_local_offset().unwrap_or(UtcOffset::UTC)
}

#[cfg(test)]
mod tests {
    use super::{day_id, parse_day_id, resolve_day};
    use time::macros::date;

    #[test]
    fn day_id_is_zero_padded() {
        assert_eq!(day_id(date!(2025 - 02 - 03)), "2025-02-03");
    }

    #[test]
    fn parse_day_id_accepts_canonical_form() {
        assert_eq!(parse_day_id(" 2025-12-31 ").unwrap(), date!(2025 - 12 - 31));
    }

    #[test]
    fn parse_day_id_rejects_other_shapes() {
        for raw in ["", "2025-2-3", "2025/02/03", "2025-02-30", "tomorrow"] {
            let err = parse_day_id(raw).unwrap_err();
            assert_eq!(err.code(), "invalid_input", "{raw}");
        }
    }

    #[test]
    fn resolve_day_understands_relative_words() {
        let today = date!(2025 - 03 - 01);
        assert_eq!(resolve_day("today", today).unwrap(), today);
        assert_eq!(resolve_day("Tomorrow", today).unwrap(), date!(2025 - 03 - 02));
        assert_eq!(resolve_day("yesterday", today).unwrap(), date!(2025 - 02 - 28));
        assert_eq!(resolve_day("2025-04-10", today).unwrap(), date!(2025 - 04 - 10));
    }
}
