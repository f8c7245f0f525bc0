//! Expiry time parsing
//!
//! Accepted inputs:
//! - RFC3339: `2026-10-01T12:00:00Z`, `2026-10-01T12:00:00+08:00`
//! - naive ISO, read as UTC: `2026-10-01T12:00:00`, `2026-10-01 12:00:00`
//! - relative offsets from now: `1d`, `2w`, `1h30m`, `1d2h30m`

use chrono::{DateTime, Duration, NaiveDateTime, Utc};

use crate::errors::{Result, SnaplinkError};

const NAIVE_FORMATS: &[&str] = &[
    "%Y-%m-%dT%H:%M:%S%.f",
    "%Y-%m-%dT%H:%M:%S",
    "%Y-%m-%d %H:%M:%S",
];

pub fn parse_expire_time(input: &str) -> Result<DateTime<Utc>> {
    parse_expire_time_at(input, Utc::now())
}

/// Same as [`parse_expire_time`] with relative offsets taken from `now`.
pub fn parse_expire_time_at(input: &str, now: DateTime<Utc>) -> Result<DateTime<Utc>> {
    let input = input.trim();

    if let Ok(dt) = DateTime::parse_from_rfc3339(input) {
        return Ok(dt.with_timezone(&Utc));
    }

    for format in NAIVE_FORMATS {
        if let Ok(naive) = NaiveDateTime::parse_from_str(input, format) {
            return Ok(naive.and_utc());
        }
    }

    let offset = parse_relative(input).map_err(SnaplinkError::invalid_format)?;
    now.checked_add_signed(offset)
        .ok_or_else(|| SnaplinkError::invalid_format("Expiry time is out of range"))
}

fn parse_relative(input: &str) -> std::result::Result<Duration, String> {
    let mut total = Duration::zero();
    let mut rest = input;

    while !rest.is_empty() {
        let digits_end = rest
            .find(|c: char| !c.is_ascii_digit())
            .unwrap_or(rest.len());
        if digits_end == 0 {
            return Err(format!("Invalid time format: '{}'", input));
        }
        let num: i64 = rest[..digits_end]
            .parse()
            .map_err(|_| format!("Invalid number in '{}'", input))?;
        rest = &rest[digits_end..];

        let unit_end = rest
            .find(|c: char| !c.is_ascii_alphabetic())
            .unwrap_or(rest.len());
        if unit_end == 0 {
            return Err(format!("Missing time unit after '{}'", num));
        }
        let unit = &rest[..unit_end];
        rest = &rest[unit_end..];

        // "M" 表示月，其余单位不区分大小写
        let step = match unit {
            "M" => Duration::days(num.saturating_mul(30)),
            _ => match unit.to_lowercase().as_str() {
                "s" | "sec" | "second" | "seconds" => Duration::seconds(num),
                "m" | "min" | "minute" | "minutes" => Duration::minutes(num),
                "h" | "hour" | "hours" => Duration::hours(num),
                "d" | "day" | "days" => Duration::days(num),
                "w" | "week" | "weeks" => Duration::weeks(num),
                "month" | "months" => Duration::days(num.saturating_mul(30)),
                "y" | "year" | "years" => Duration::days(num.saturating_mul(365)),
                _ => return Err(format!("Unsupported time unit: '{}'", unit)),
            },
        };
        total += step;
    }

    if total == Duration::zero() {
        return Err("Expiry offset must be greater than zero".to_string());
    }
    Ok(total)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn fixed_now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2026, 10, 18, 12, 0, 0).unwrap()
    }

    #[test]
    fn test_parse_relative_time() {
        let now = fixed_now();

        let result = parse_expire_time_at("1d", now).unwrap();
        assert_eq!(result - now, Duration::days(1));

        let result = parse_expire_time_at("2w", now).unwrap();
        assert_eq!(result - now, Duration::days(14));

        let result = parse_expire_time_at("1d2h30m", now).unwrap();
        assert_eq!(
            result - now,
            Duration::days(1) + Duration::hours(2) + Duration::minutes(30)
        );
    }

    #[test]
    fn test_month_vs_minute() {
        let now = fixed_now();
        assert_eq!(
            parse_expire_time_at("1M", now).unwrap() - now,
            Duration::days(30)
        );
        assert_eq!(
            parse_expire_time_at("1m", now).unwrap() - now,
            Duration::minutes(1)
        );
    }

    #[test]
    fn test_parse_rfc3339() {
        let parsed = parse_expire_time("2026-10-01T12:00:00+08:00").unwrap();
        assert_eq!(parsed, Utc.with_ymd_and_hms(2026, 10, 1, 4, 0, 0).unwrap());
    }

    #[test]
    fn test_parse_naive_as_utc() {
        let expected = Utc.with_ymd_and_hms(2026, 10, 1, 12, 0, 0).unwrap();
        assert_eq!(parse_expire_time("2026-10-01T12:00:00").unwrap(), expected);
        assert_eq!(parse_expire_time("2026-10-01 12:00:00").unwrap(), expected);
    }

    #[test]
    fn test_invalid_format() {
        for input in ["invalid", "1x", "abc", "", "0d", "d1"] {
            assert!(
                matches!(parse_expire_time(input), Err(SnaplinkError::InvalidFormat(_))),
                "{} should be rejected",
                input
            );
        }
    }
}
