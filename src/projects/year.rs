use chrono::{DateTime, Datelike, NaiveDate, NaiveDateTime, Utc};

pub const UNKNOWN_YEAR: &str = "N/A";

// `%#z` also takes `Z` and hour-only offsets such as Postgres' `+00`.
const OFFSET_FORMATS: &[&str] = &["%Y-%m-%dT%H:%M%#z", "%Y-%m-%d %H:%M:%S%.f%#z"];

const DATETIME_FORMATS: &[&str] = &[
    "%Y-%m-%dT%H:%M:%S%.f",
    "%Y-%m-%d %H:%M:%S%.f",
    "%Y-%m-%dT%H:%M",
    "%Y-%m-%dT%H:%MZ",
    "%m/%d/%Y %H:%M:%S",
    "%m/%d/%Y, %I:%M:%S %p",
];

const DATE_FORMATS: &[&str] = &[
    "%Y-%m-%d",
    "%Y/%m/%d",
    "%m/%d/%Y",
    "%B %d, %Y",
    "%b %d, %Y",
    "%d %B %Y",
    "%a %b %d %Y",
];

/// Reduce a loosely formatted date to its four-digit UTC year, or `"N/A"`.
///
/// All-digit input is a unix timestamp: up to ten digits are seconds, longer
/// runs are milliseconds. Exactly four digits is read as a bare year.
pub fn normalize_year(raw: &str) -> String {
    let raw = raw.trim();
    if raw.is_empty() {
        return UNKNOWN_YEAR.to_string();
    }

    let parsed = if raw.bytes().all(|b| b.is_ascii_digit()) {
        from_digits(raw)
    } else {
        parse_date(raw)
    };

    match parsed {
        Some(dt) if (1000..=9999).contains(&dt.year()) => dt.year().to_string(),
        _ => UNKNOWN_YEAR.to_string(),
    }
}

fn from_digits(raw: &str) -> Option<DateTime<Utc>> {
    if raw.len() == 4 {
        let year = raw.parse::<i32>().ok()?;
        return NaiveDate::from_ymd_opt(year, 1, 1)?
            .and_hms_opt(0, 0, 0)
            .map(|dt| dt.and_utc());
    }
    let value = raw.parse::<i64>().ok()?;
    if raw.len() <= 10 {
        DateTime::from_timestamp(value, 0)
    } else {
        DateTime::from_timestamp_millis(value)
    }
}

fn parse_date(raw: &str) -> Option<DateTime<Utc>> {
    if let Ok(dt) = DateTime::parse_from_rfc3339(raw) {
        return Some(dt.with_timezone(&Utc));
    }
    if let Ok(dt) = DateTime::parse_from_rfc2822(raw) {
        return Some(dt.with_timezone(&Utc));
    }
    for fmt in OFFSET_FORMATS {
        if let Ok(dt) = DateTime::parse_from_str(raw, fmt) {
            return Some(dt.with_timezone(&Utc));
        }
    }
    for fmt in DATETIME_FORMATS {
        if let Ok(dt) = NaiveDateTime::parse_from_str(raw, fmt) {
            return Some(dt.and_utc());
        }
    }
    for fmt in DATE_FORMATS {
        if let Ok(d) = NaiveDate::parse_from_str(raw, fmt) {
            return d.and_hms_opt(0, 0, 0).map(|dt| dt.and_utc());
        }
    }
    // Year and month only.
    NaiveDate::parse_from_str(&format!("{}-01", raw), "%Y-%m-%d")
        .ok()
        .and_then(|d| d.and_hms_opt(0, 0, 0))
        .map(|dt| dt.and_utc())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_and_garbage_are_unknown() {
        assert_eq!(normalize_year(""), "N/A");
        assert_eq!(normalize_year("   "), "N/A");
        assert_eq!(normalize_year("abc"), "N/A");
        assert_eq!(normalize_year("2024-13-45"), "N/A");
    }

    #[test]
    fn unix_seconds_and_millis() {
        assert_eq!(normalize_year("1700000000"), "2023");
        assert_eq!(normalize_year("1700000000000"), "2023");
        assert_eq!(normalize_year("0"), "1970");
    }

    #[test]
    fn iso_and_human_dates() {
        assert_eq!(normalize_year("2024-01-05T00:00:00Z"), "2024");
        assert_eq!(normalize_year("2024-05-01"), "2024");
        assert_eq!(normalize_year("2023-12-31T23:30:00-05:00"), "2024");
        assert_eq!(normalize_year("2022-06-01T10:00:00.123"), "2022");
        assert_eq!(normalize_year("March 3, 2021"), "2021");
        assert_eq!(normalize_year("04/15/2020"), "2020");
    }

    #[test]
    fn reduced_precision_and_zoned_iso() {
        assert_eq!(normalize_year("2024-05"), "2024");
        assert_eq!(normalize_year("2024-05-01T10:00Z"), "2024");
        assert_eq!(normalize_year("2024-05-01T10:00+02:00"), "2024");
        assert_eq!(normalize_year("2024-01-01T01:00+05:00"), "2023");
        assert_eq!(normalize_year("2024-13"), "N/A");
    }

    #[test]
    fn database_and_browser_date_strings() {
        assert_eq!(normalize_year("2024-05-01 10:00:00+00"), "2024");
        assert_eq!(normalize_year("2024-05-01 10:00:00.123456+00"), "2024");
        assert_eq!(normalize_year("2024/05/01"), "2024");
        assert_eq!(normalize_year("Wed May 01 2024"), "2024");
        assert_eq!(normalize_year("5/1/2024, 10:00:00 AM"), "2024");
        assert_eq!(normalize_year("12/31/2023, 11:59:59 PM"), "2023");
    }

    #[test]
    fn bare_year() {
        assert_eq!(normalize_year("2024"), "2024");
    }

    #[test]
    fn overflow_is_unknown() {
        assert_eq!(normalize_year("99999999999999999999999"), "N/A");
        assert_eq!(normalize_year("9223372036854775807"), "N/A");
    }

    #[test]
    fn always_four_digits_or_sentinel() {
        for raw in ["", "abc", "1700000000", "1700000000000", "2024-01-05T00:00:00Z", "2024", "1"] {
            let year = normalize_year(raw);
            assert!(
                year == UNKNOWN_YEAR || (year.len() == 4 && year.bytes().all(|b| b.is_ascii_digit())),
                "{raw:?} -> {year:?}"
            );
        }
    }
}
