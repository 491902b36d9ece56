use chrono::{NaiveDateTime, Utc};

const DB_FORMATS: &[&str] = &["%Y-%m-%d %H:%M:%S%.f", "%Y-%m-%d %H:%M:%S"];

pub fn parse_db_time(db_time: &str) -> Option<NaiveDateTime> {
    DB_FORMATS
        .iter()
        .find_map(|fmt| NaiveDateTime::parse_from_str(db_time, fmt).ok())
}

/// Publication date as shown under a post, e.g. "14 October 2026".
pub fn format_date(db_time: &str) -> String {
    parse_db_time(db_time)
        .map(|dt| dt.format("%-d %B %Y").to_string())
        .unwrap_or_else(|| db_time.to_string())
}

pub fn format_relative(db_time: &str) -> String {
    parse_db_time(db_time)
        .map(|dt| format_relative_time(&dt))
        .unwrap_or_else(|| db_time.to_string())
}

pub fn format_relative_time(dt: &NaiveDateTime) -> String {
    let now = Utc::now().naive_utc();
    let diff = now.signed_duration_since(*dt);

    let seconds = diff.num_seconds();
    if seconds < 60 {
        return "just now".to_string();
    }

    let minutes = diff.num_minutes();
    if minutes < 60 {
        return format!("{}m ago", minutes);
    }

    let hours = diff.num_hours();
    if hours < 24 {
        return format!("{}h ago", hours);
    }

    let days = diff.num_days();
    if days < 7 {
        return format!("{}d ago", days);
    }

    dt.format("%b %-d, %Y").to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    #[test]
    fn format_relative_time_just_now() {
        let now = Utc::now().naive_utc();
        assert_eq!(format_relative_time(&now), "just now");
    }

    #[test]
    fn format_relative_time_hours() {
        let dt = Utc::now().naive_utc() - chrono::Duration::hours(3);
        assert_eq!(format_relative_time(&dt), "3h ago");
    }

    #[test]
    fn format_relative_time_old_date() {
        let dt = NaiveDate::from_ymd_opt(2025, 1, 15)
            .unwrap()
            .and_hms_opt(12, 0, 0)
            .unwrap();
        assert_eq!(format_relative_time(&dt), "Jan 15, 2025");
    }

    #[test]
    fn format_date_accepts_fractional_seconds() {
        assert_eq!(format_date("2025-01-15 12:00:00.123"), "15 January 2025");
        assert_eq!(format_date("2025-01-15 12:00:00"), "15 January 2025");
    }

    #[test]
    fn bad_input_is_returned_raw() {
        assert_eq!(format_date("not-a-date"), "not-a-date");
        assert_eq!(format_relative("not-a-date"), "not-a-date");
    }
}
