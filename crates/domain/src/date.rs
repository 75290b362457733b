use chrono::prelude::*;
use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq)]
#[error("Start date: {0} is malformed")]
pub struct InvalidStartDate(pub String);

/// Parses an event start date into a UTC timestamp in millis.
///
/// Clients are sloppy about ISO-8601: seconds and timezone designators
/// are frequently missing and date-only strings do occur. Partial
/// strings are normalized before parsing; anything unparseable after
/// normalization is a validation error for the caller, never a panic.
///
/// - `2021-06-01T18:30:00+02:00` is taken as is
/// - `2021-06-01T18:30:00` and `2021-06-01T18:30` are assumed UTC
/// - `2021-06-01` becomes midnight UTC
pub fn parse_start_date(datestr: &str) -> Result<i64, InvalidStartDate> {
    let datestr = datestr.trim();
    if datestr.is_empty() {
        return Err(InvalidStartDate(datestr.to_string()));
    }

    if let Ok(date) = DateTime::parse_from_rfc3339(datestr) {
        return Ok(date.timestamp_millis());
    }

    let normalized = normalize_partial_iso(datestr);
    DateTime::parse_from_rfc3339(&normalized)
        .map(|date| date.timestamp_millis())
        .map_err(|_| InvalidStartDate(datestr.to_string()))
}

fn normalize_partial_iso(datestr: &str) -> String {
    // Date without any time component
    if !datestr.contains('T') {
        return format!("{}T00:00:00Z", datestr);
    }

    let t_pos = datestr.find('T').unwrap_or(0);
    let time = &datestr[t_pos + 1..];

    // Split the clock from the zone designator. A `+`/`-` after the
    // `T` can only start an offset, the date separators all come
    // before it. Missing seconds and a missing zone are independent
    // defects, `18:30+02:00` is as common as a bare `18:30`.
    let zone_pos = time.rfind(|c| c == '+' || c == '-').or_else(|| {
        if time.ends_with('Z') {
            Some(time.len() - 1)
        } else {
            None
        }
    });
    let (clock, zone) = match zone_pos {
        Some(pos) => time.split_at(pos),
        None => (time, ""),
    };

    let mut normalized = String::from(&datestr[..t_pos + 1]);
    normalized.push_str(clock);
    if clock.matches(':').count() == 1 {
        // Missing seconds
        normalized.push_str(":00");
    }
    if zone.is_empty() {
        normalized.push('Z');
    } else {
        normalized.push_str(zone);
    }
    normalized
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn it_accepts_fully_qualified_dates() {
        assert_eq!(
            parse_start_date("1970-01-01T00:00:00Z").unwrap(),
            0
        );
        assert_eq!(
            parse_start_date("2021-06-01T18:30:00+02:00").unwrap(),
            parse_start_date("2021-06-01T16:30:00Z").unwrap()
        );
    }

    #[test]
    fn it_normalizes_partial_dates_to_utc() {
        let full = parse_start_date("2021-06-01T18:30:00Z").unwrap();
        assert_eq!(parse_start_date("2021-06-01T18:30:00").unwrap(), full);
        assert_eq!(parse_start_date("2021-06-01T18:30").unwrap(), full);
        assert_eq!(parse_start_date("2021-06-01T18:30Z").unwrap(), full);

        let midnight = parse_start_date("2021-06-01T00:00:00Z").unwrap();
        assert_eq!(parse_start_date("2021-06-01").unwrap(), midnight);
    }

    #[test]
    fn it_normalizes_missing_seconds_with_an_offset_present() {
        let full = parse_start_date("2021-06-01T18:30:00+02:00").unwrap();
        assert_eq!(parse_start_date("2021-06-01T18:30+02:00").unwrap(), full);
        assert_eq!(parse_start_date("2021-06-01T14:30-02:00").unwrap(), full);
        assert_eq!(
            parse_start_date("2021-06-01T18:30+02:00").unwrap(),
            parse_start_date("2021-06-01T16:30Z").unwrap()
        );
    }

    #[test]
    fn it_rejects_malformed_dates() {
        let invalid_dates = vec![
            "",
            "not a date",
            "2021-13-01T10:00",
            "2021-06-32T10:00",
            "2021-06-01T25:00",
            "01/06/2021",
        ];

        for date in &invalid_dates {
            assert!(parse_start_date(date).is_err(), "accepted: {}", date);
        }
    }
}
