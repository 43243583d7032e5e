//! Date values used by created/modified and attribute-date filters.

use std::fmt;

use chrono::{DateTime, Days, FixedOffset, Months, NaiveDate, NaiveDateTime};
use serde::Serialize;

/// Calendar unit of a relative offset.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum DateUnit {
    Day,
    Week,
    Month,
    Year,
}

impl DateUnit {
    fn from_char(c: char) -> Option<Self> {
        match c.to_ascii_lowercase() {
            'd' => Some(DateUnit::Day),
            'w' => Some(DateUnit::Week),
            'm' => Some(DateUnit::Month),
            'y' => Some(DateUnit::Year),
            _ => None,
        }
    }

    fn suffix(self) -> char {
        match self {
            DateUnit::Day => 'd',
            DateUnit::Week => 'w',
            DateUnit::Month => 'm',
            DateUnit::Year => 'y',
        }
    }
}

/// A signed offset from the evaluation day, e.g. `-7d` or `+2w`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct RelativeOffset {
    /// Signed amount; negative values point into the past.
    pub amount: i64,
    /// Unit of `amount`.
    pub unit: DateUnit,
}

/// A date as written in a query.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum DateValue {
    /// A calendar date (`YYYY-MM-DD`).
    Absolute(NaiveDate),
    /// An offset from the evaluation day.
    Relative(RelativeOffset),
}

impl DateValue {
    /// Parses `YYYY-MM-DD`, `[+-]N(d|w|m|y)` or one of `today`, `yesterday`,
    /// `tomorrow`.
    ///
    /// An unsigned offset (`7d`) points into the past, like `-7d`.
    pub fn parse(input: &str) -> Option<DateValue> {
        let input = input.trim();
        match input.to_ascii_lowercase().as_str() {
            "today" => return Some(DateValue::days(0)),
            "yesterday" => return Some(DateValue::days(-1)),
            "tomorrow" => return Some(DateValue::days(1)),
            _ => {}
        }

        if let Some(offset) = parse_offset(input) {
            return Some(DateValue::Relative(offset));
        }

        if input.len() == 10 {
            if let Ok(date) = NaiveDate::parse_from_str(input, "%Y-%m-%d") {
                return Some(DateValue::Absolute(date));
            }
        }

        None
    }

    fn days(amount: i64) -> DateValue {
        DateValue::Relative(RelativeOffset {
            amount,
            unit: DateUnit::Day,
        })
    }

    /// Resolves the value to a calendar date, relative to `today`.
    ///
    /// Returns `None` when the offset leaves chrono's representable range.
    pub fn resolve(&self, today: NaiveDate) -> Option<NaiveDate> {
        match self {
            DateValue::Absolute(date) => Some(*date),
            DateValue::Relative(offset) => offset.apply(today),
        }
    }
}

impl RelativeOffset {
    fn apply(&self, today: NaiveDate) -> Option<NaiveDate> {
        let magnitude = self.amount.unsigned_abs();
        let forward = self.amount >= 0;
        match self.unit {
            DateUnit::Day => shift_days(today, magnitude, forward),
            DateUnit::Week => shift_days(today, magnitude.checked_mul(7)?, forward),
            DateUnit::Month => shift_months(today, magnitude, forward),
            DateUnit::Year => shift_months(today, magnitude.checked_mul(12)?, forward),
        }
    }
}

fn shift_days(date: NaiveDate, days: u64, forward: bool) -> Option<NaiveDate> {
    if forward {
        date.checked_add_days(Days::new(days))
    } else {
        date.checked_sub_days(Days::new(days))
    }
}

fn shift_months(date: NaiveDate, months: u64, forward: bool) -> Option<NaiveDate> {
    let months = Months::new(u32::try_from(months).ok()?);
    if forward {
        date.checked_add_months(months)
    } else {
        date.checked_sub_months(months)
    }
}

fn parse_offset(input: &str) -> Option<RelativeOffset> {
    let (negative, signed) = match input.chars().next()? {
        '-' => (true, true),
        '+' => (false, true),
        _ => (true, false),
    };
    let body = if signed { &input[1..] } else { input };

    let unit_char = body.chars().last()?;
    let unit = DateUnit::from_char(unit_char)?;
    let digits = &body[..body.len() - unit_char.len_utf8()];
    if digits.is_empty() || !digits.chars().all(|c| c.is_ascii_digit()) {
        return None;
    }

    let magnitude: i64 = digits.parse().ok()?;
    Some(RelativeOffset {
        amount: if negative { -magnitude } else { magnitude },
        unit,
    })
}

/// Parses an attribute value stored on a node as a calendar date.
///
/// Accepts `YYYY-MM-DD`, RFC 3339 date-times (converted to `offset` before
/// taking the date) and naive `YYYY-MM-DDTHH:MM[:SS]` date-times.
pub fn parse_stored_date(value: &str, offset: &FixedOffset) -> Option<NaiveDate> {
    let value = value.trim();
    if let Ok(date) = NaiveDate::parse_from_str(value, "%Y-%m-%d") {
        return Some(date);
    }
    if let Ok(datetime) = DateTime::parse_from_rfc3339(value) {
        return Some(datetime.with_timezone(offset).date_naive());
    }
    ["%Y-%m-%dT%H:%M:%S", "%Y-%m-%dT%H:%M", "%Y-%m-%d %H:%M:%S", "%Y-%m-%d %H:%M"]
        .iter()
        .find_map(|format| NaiveDateTime::parse_from_str(value, format).ok())
        .map(|datetime| datetime.date())
}

impl fmt::Display for DateValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DateValue::Absolute(date) => write!(f, "{}", date.format("%Y-%m-%d")),
            DateValue::Relative(offset) => {
                let sign = if offset.amount < 0 { '-' } else { '+' };
                write!(
                    f,
                    "{sign}{}{}",
                    offset.amount.unsigned_abs(),
                    offset.unit.suffix()
                )
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn test_parse_absolute() {
        assert_eq!(
            DateValue::parse("2025-11-01"),
            Some(DateValue::Absolute(date(2025, 11, 1)))
        );
    }

    #[test]
    fn test_parse_signed_offsets() {
        assert_eq!(
            DateValue::parse("-7d"),
            Some(DateValue::Relative(RelativeOffset {
                amount: -7,
                unit: DateUnit::Day
            }))
        );
        assert_eq!(
            DateValue::parse("+2w"),
            Some(DateValue::Relative(RelativeOffset {
                amount: 2,
                unit: DateUnit::Week
            }))
        );
    }

    #[test]
    fn test_unsigned_offset_points_to_past() {
        assert_eq!(DateValue::parse("3m"), DateValue::parse("-3m"));
    }

    #[test]
    fn test_keywords() {
        let today = date(2025, 11, 10);
        assert_eq!(DateValue::parse("today").unwrap().resolve(today), Some(today));
        assert_eq!(
            DateValue::parse("Yesterday").unwrap().resolve(today),
            Some(date(2025, 11, 9))
        );
        assert_eq!(
            DateValue::parse("tomorrow").unwrap().resolve(today),
            Some(date(2025, 11, 11))
        );
    }

    #[test]
    fn test_rejects_non_dates() {
        for input in ["", "d", "-d", "7", "7x", "done", "2025-13-01", "1.5d", "--7d"] {
            assert_eq!(DateValue::parse(input), None, "input: {input:?}");
        }
    }

    #[test]
    fn test_resolve_units() {
        let today = date(2025, 1, 31);
        let resolve = |s: &str| DateValue::parse(s).unwrap().resolve(today).unwrap();
        assert_eq!(resolve("-7d"), date(2025, 1, 24));
        assert_eq!(resolve("+1w"), date(2025, 2, 7));
        // Month arithmetic clamps to the end of the month.
        assert_eq!(resolve("+1m"), date(2025, 2, 28));
        assert_eq!(resolve("-1y"), date(2024, 1, 31));
    }

    #[test]
    fn test_resolve_out_of_range() {
        let value = DateValue::parse("+9999999999y").unwrap();
        assert_eq!(value.resolve(date(2025, 1, 1)), None);
    }

    #[test]
    fn test_display_round_trips() {
        for input in ["2025-11-01", "-7d", "+2w", "+0d", "-1y"] {
            let value = DateValue::parse(input).unwrap();
            assert_eq!(DateValue::parse(&value.to_string()), Some(value));
        }
    }

    #[test]
    fn test_parse_stored_date_formats() {
        let utc = FixedOffset::east_opt(0).unwrap();
        assert_eq!(parse_stored_date("2025-11-01", &utc), Some(date(2025, 11, 1)));
        assert_eq!(
            parse_stored_date("2025-11-01T23:30:00Z", &utc),
            Some(date(2025, 11, 1))
        );
        assert_eq!(
            parse_stored_date("2025-11-01T09:15", &utc),
            Some(date(2025, 11, 1))
        );
        assert_eq!(parse_stored_date("soon", &utc), None);
    }

    #[test]
    fn test_parse_stored_date_uses_offset() {
        let plus_two = FixedOffset::east_opt(2 * 3600).unwrap();
        assert_eq!(
            parse_stored_date("2025-11-01T23:30:00Z", &plus_two),
            Some(date(2025, 11, 2))
        );
    }
}
