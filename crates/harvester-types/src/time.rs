use chrono::{DateTime, NaiveDate, SecsFormat, Utc};

/// `YYYY-MM-DDTHH:MM:SSZ` — whole-second UTC, matching every internally
/// generated timestamp (`archived_at`, `started_at`, `finished_at`,
/// `generated_at`). Parsed timestamps coming from feeds keep their own
/// precision; this is only for values this crate stamps itself.
pub fn iso_now() -> String {
    Utc::now().to_rfc3339_opts(SecsFormat::Secs, true)
}

pub fn iso_date_today() -> String {
    Utc::now().date_naive().to_string()
}

pub fn run_id_now() -> String {
    Utc::now().format("%Y%m%d-%H%M%S").to_string()
}

/// Accepts ISO-8601 (with or without a timezone) and falls back to RFC 2822
/// for feed-style dates; naive values are interpreted as UTC.
pub fn parse_datetime(value: &str) -> Option<DateTime<Utc>> {
    if let Ok(dt) = DateTime::parse_from_rfc3339(value) {
        return Some(dt.with_timezone(&Utc));
    }
    if let Ok(naive) = chrono::NaiveDateTime::parse_from_str(value, "%Y-%m-%dT%H:%M:%S") {
        return Some(DateTime::from_naive_utc_and_offset(naive, Utc));
    }
    if let Ok(dt) = DateTime::parse_from_rfc2822(value) {
        return Some(dt.with_timezone(&Utc));
    }
    None
}

pub fn parse_date(value: &str) -> Option<NaiveDate> {
    if let Ok(date) = NaiveDate::parse_from_str(value, "%Y-%m-%d") {
        return Some(date);
    }
    parse_datetime(value).map(|dt| dt.date_naive())
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    proptest! {
        #[test]
        fn parse_date_round_trips_iso_dates(year in 2000i32..2100, month in 1u32..=12, day in 1u32..=28) {
            let date = NaiveDate::from_ymd_opt(year, month, day).unwrap();
            let parsed = parse_date(&date.to_string());
            prop_assert_eq!(parsed, Some(date));
        }
    }

    #[test]
    fn iso_now_ends_with_z_and_no_fractional_seconds() {
        let stamp = iso_now();
        assert!(stamp.ends_with('Z'));
        assert!(!stamp.contains('.'));
    }

    #[test]
    fn parse_datetime_accepts_rfc3339_and_naive_forms() {
        assert!(parse_datetime("2026-01-02T03:04:05Z").is_some());
        assert!(parse_datetime("2026-01-02T03:04:05").is_some());
        assert!(parse_datetime("Fri, 02 Jan 2026 03:04:05 GMT").is_some());
        assert!(parse_datetime("not a date").is_none());
    }

    #[test]
    fn parse_date_accepts_plain_dates_and_datetimes() {
        assert_eq!(parse_date("2026-01-02"), NaiveDate::from_ymd_opt(2026, 1, 2));
        assert_eq!(parse_date("2026-01-02T03:04:05Z"), NaiveDate::from_ymd_opt(2026, 1, 2));
    }
}
