use chrono::NaiveDate;
use rust_decimal::Decimal;

use crate::errors::AppError;

pub const DATE_FMT: &str = "%Y-%m-%d";

/// Whole-day difference between two `YYYY-MM-DD` dates. A same-day stay is 0
/// nights and an inverted range is negative; the caller decides whether to
/// reject those.
pub fn nights(checkin: &str, checkout: &str) -> Result<i64, AppError> {
    let start = parse_date(checkin)?;
    let end = parse_date(checkout)?;
    Ok((end - start).num_days())
}

/// Exact `nights * rate`; money stays decimal end to end.
pub fn total(nights: i64, rate: Decimal) -> Decimal {
    Decimal::from(nights) * rate
}

fn parse_date(s: &str) -> Result<NaiveDate, AppError> {
    let trimmed = s.trim();
    NaiveDate::parse_from_str(trimmed, DATE_FMT)
        .map_err(|_| AppError::InvalidDate(trimmed.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn dec(s: &str) -> Decimal {
        s.parse().unwrap()
    }

    #[test]
    fn two_night_stay() {
        assert_eq!(nights("2024-01-01", "2024-01-03").unwrap(), 2);
    }

    #[test]
    fn same_day_is_zero_nights() {
        assert_eq!(nights("2024-01-01", "2024-01-01").unwrap(), 0);
    }

    #[test]
    fn inverted_range_is_negative() {
        assert_eq!(nights("2024-01-05", "2024-01-02").unwrap(), -3);
    }

    #[test]
    fn surrounding_whitespace_is_tolerated() {
        assert_eq!(nights(" 2024-05-01 ", "2024-05-04\n").unwrap(), 3);
    }

    #[test]
    fn malformed_date_is_rejected() {
        let err = nights("banana", "2024-01-03").unwrap_err();
        assert!(matches!(err, AppError::InvalidDate(s) if s == "banana"));

        let err = nights("2024-01-01", "01/03/2024").unwrap_err();
        assert!(matches!(err, AppError::InvalidDate(_)));
    }

    #[test]
    fn total_is_exact() {
        assert_eq!(total(3, dec("50.00")), dec("150.00"));
        assert_eq!(total(7, dec("99.99")), dec("699.93"));
        assert_eq!(total(0, dec("120")), dec("0"));
    }
}
