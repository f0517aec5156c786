use chrono::{DateTime, Duration, DurationRound, Utc};

pub fn now() -> DateTime<Utc> {
    Utc::now()
}

pub fn to_rfc3339(dt: DateTime<Utc>) -> String {
    dt.to_rfc3339()
}

pub fn from_rfc3339(s: &str) -> anyhow::Result<DateTime<Utc>> {
    Ok(DateTime::parse_from_rfc3339(s)?.with_timezone(&Utc))
}

/// Session deadline: start plus the session duration, truncated down to the
/// whole minute, plus one minute of buffer. A start at 10:00:15 with a
/// 10-minute duration yields 10:11:00.
pub fn session_deadline(start: DateTime<Utc>, duration_minutes: i64) -> DateTime<Utc> {
    let end = start + Duration::minutes(duration_minutes);
    let truncated = end
        .duration_trunc(Duration::minutes(1))
        .expect("whole-minute truncation cannot fail");
    truncated + Duration::minutes(1)
}

#[cfg(test)]
mod tests {
    use chrono::TimeZone;

    use super::*;

    #[test]
    fn deadline_rounds_up_to_the_next_whole_minute() {
        let start = Utc.with_ymd_and_hms(2026, 8, 25, 10, 0, 15).unwrap();
        let deadline = session_deadline(start, 10);
        assert_eq!(deadline, Utc.with_ymd_and_hms(2026, 8, 25, 10, 11, 0).unwrap());
    }

    #[test]
    fn deadline_on_a_minute_boundary_still_gets_the_buffer() {
        let start = Utc.with_ymd_and_hms(2026, 8, 25, 10, 0, 0).unwrap();
        let deadline = session_deadline(start, 10);
        assert_eq!(deadline, Utc.with_ymd_and_hms(2026, 8, 25, 10, 11, 0).unwrap());
    }

    #[test]
    fn rfc3339_round_trip() {
        let dt = Utc.with_ymd_and_hms(2026, 8, 25, 9, 30, 45).unwrap();
        assert_eq!(from_rfc3339(&to_rfc3339(dt)).unwrap(), dt);
    }
}
