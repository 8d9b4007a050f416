//! Best-effort date extraction from model output.

use chrono::NaiveDate;
use once_cell::sync::Lazy;
use regex::Regex;

static ISO: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"\b(\d{4})-(\d{1,2})-(\d{1,2})\b").expect("valid date regex")
});

// MM/DD/YYYY, MM-DD-YYYY, MM/DD/YY
static US_NUMERIC: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"\b(\d{1,2})[/-](\d{1,2})[/-](\d{4}|\d{2})\b").expect("valid date regex")
});

// Month DD, YYYY
static MONTH_FIRST: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)\b([a-z]{3,9})\.?\s+(\d{1,2})(?:st|nd|rd|th)?,?\s+(\d{4})\b")
        .expect("valid date regex")
});

// DD Month YYYY
static DAY_FIRST: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)\b(\d{1,2})(?:st|nd|rd|th)?\s+([a-z]{3,9})\.?,?\s+(\d{4})\b")
        .expect("valid date regex")
});

pub const NOT_FOUND: &str = "NOT_FOUND";

fn month_number(name: &str) -> Option<u32> {
    const MONTHS: [&str; 12] = [
        "jan", "feb", "mar", "apr", "may", "jun", "jul", "aug", "sep", "oct", "nov", "dec",
    ];
    let lower = name.to_lowercase();
    if lower.len() < 3 {
        return None;
    }
    MONTHS
        .iter()
        .position(|m| lower.starts_with(m))
        .map(|idx| idx as u32 + 1)
}

/// Two-digit years up to 50 are 20YY, above are 19YY.
fn expand_year(raw: &str) -> Option<i32> {
    let year: i32 = raw.parse().ok()?;
    Some(match raw.len() {
        2 if year <= 50 => 2000 + year,
        2 => 1900 + year,
        _ => year,
    })
}

fn ymd(year: i32, month: u32, day: u32) -> Option<NaiveDate> {
    NaiveDate::from_ymd_opt(year, month, day)
}

/// First date found in `text`, trying each supported format in turn.
pub fn extract_date(text: &str) -> Option<NaiveDate> {
    let text = text.trim();
    if text.is_empty() || text.eq_ignore_ascii_case(NOT_FOUND) {
        return None;
    }

    let iso = ISO.captures_iter(text).find_map(|c| {
        ymd(c[1].parse().ok()?, c[2].parse().ok()?, c[3].parse().ok()?)
    });
    if iso.is_some() {
        return iso;
    }

    let us = US_NUMERIC.captures_iter(text).find_map(|c| {
        ymd(expand_year(&c[3])?, c[1].parse().ok()?, c[2].parse().ok()?)
    });
    if us.is_some() {
        return us;
    }

    let month_first = MONTH_FIRST.captures_iter(text).find_map(|c| {
        ymd(c[3].parse().ok()?, month_number(&c[1])?, c[2].parse().ok()?)
    });
    if month_first.is_some() {
        return month_first;
    }

    DAY_FIRST.captures_iter(text).find_map(|c| {
        ymd(c[3].parse().ok()?, month_number(&c[2])?, c[1].parse().ok()?)
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(y: i32, m: u32, d: u32) -> Option<NaiveDate> {
        NaiveDate::from_ymd_opt(y, m, d)
    }

    #[test]
    fn iso_answer() {
        assert_eq!(extract_date("2026-03-15"), date(2026, 3, 15));
        assert_eq!(extract_date("The date is 2026-03-15."), date(2026, 3, 15));
    }

    #[test]
    fn us_numeric_answers() {
        assert_eq!(extract_date("03/15/2026"), date(2026, 3, 15));
        assert_eq!(extract_date("3-5-2026"), date(2026, 3, 5));
        assert_eq!(extract_date("Exp: 03/15/26"), date(2026, 3, 15));
        assert_eq!(extract_date("03/15/51"), date(1951, 3, 15));
    }

    #[test]
    fn month_name_answers() {
        assert_eq!(extract_date("March 15, 2026"), date(2026, 3, 15));
        assert_eq!(extract_date("Expires Sept. 1st 2026"), date(2026, 9, 1));
        assert_eq!(extract_date("15 March 2026"), date(2026, 3, 15));
        assert_eq!(extract_date("1 dec 2026"), date(2026, 12, 1));
    }

    #[test]
    fn not_found_and_noise() {
        assert_eq!(extract_date("NOT_FOUND"), None);
        assert_eq!(extract_date("not_found"), None);
        assert_eq!(extract_date(""), None);
        assert_eq!(extract_date("no date here"), None);
        assert_eq!(extract_date("13/45/2026"), None);
    }
}
