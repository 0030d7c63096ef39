use chrono::{DateTime, Utc};

/// Formats a timestamp the way persisted rows and activity-log lines carry it.
pub fn format_timestamp(timestamp: DateTime<Utc>) -> String {
    timestamp.format("%Y-%m-%d %H:%M:%S").to_string()
}

/// Current UTC time as `YYYY-MM-DD HH:MM:SS`.
pub fn current_timestamp_string() -> String {
    format_timestamp(Utc::now())
}

#[cfg(test)]
mod tests {
    use super::{current_timestamp_string, format_timestamp};
    use chrono::TimeZone;

    #[test]
    fn unit_format_timestamp_uses_second_precision_utc() {
        let timestamp = chrono::Utc
            .with_ymd_and_hms(2024, 3, 9, 17, 5, 2)
            .single()
            .expect("valid timestamp");
        assert_eq!(format_timestamp(timestamp), "2024-03-09 17:05:02");
    }

    #[test]
    fn unit_current_timestamp_string_has_expected_shape() {
        let rendered = current_timestamp_string();
        assert_eq!(rendered.len(), 19);
        assert_eq!(rendered.as_bytes()[4], b'-');
        assert_eq!(rendered.as_bytes()[10], b' ');
        assert_eq!(rendered.as_bytes()[13], b':');
    }
}
