use chrono::{Datelike, Months, NaiveDate, Utc};
use service_core::error::AppError;

pub const DATE_FORMAT: &str = "%Y-%m-%d";

/// Strict `YYYY-MM-DD`.
pub fn parse_date(field: &str, raw: &str) -> Result<NaiveDate, AppError> {
    NaiveDate::parse_from_str(raw.trim(), DATE_FORMAT).map_err(|_| {
        AppError::bad_request(format!("Invalid {}: expected YYYY-MM-DD, got '{}'", field, raw))
    })
}

pub fn today() -> NaiveDate {
    Utc::now().date_naive()
}

/// Same calendar day next year; 29 Feb lands on 28 Feb.
pub fn add_one_year(date: NaiveDate) -> NaiveDate {
    date.checked_add_months(Months::new(12))
        .or_else(|| NaiveDate::from_ymd_opt(date.year() + 1, date.month(), 28))
        .unwrap_or(date)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ymd(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn parses_iso_dates_only() {
        assert_eq!(parse_date("date_taken", "2024-03-15").unwrap(), ymd(2024, 3, 15));
        assert!(parse_date("date_taken", "03/15/2024").is_err());
        assert!(parse_date("date_taken", "2024-02-30").is_err());
        assert!(parse_date("date_taken", "").is_err());
    }

    #[test]
    fn one_year_later() {
        assert_eq!(add_one_year(ymd(2024, 3, 15)), ymd(2025, 3, 15));
        assert_eq!(add_one_year(ymd(2023, 12, 31)), ymd(2024, 12, 31));
    }

    #[test]
    fn leap_day_clamps_to_28th() {
        assert_eq!(add_one_year(ymd(2024, 2, 29)), ymd(2025, 2, 28));
    }
}
