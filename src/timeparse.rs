use chrono::{DateTime, Datelike, Duration, LocalResult, NaiveDate, NaiveDateTime, NaiveTime, TimeZone, Utc};
use tracing::debug;

use crate::error::{LogSearchError, Result};
use crate::model::ResolvedTime;
use crate::relative::parse_relative;

/// Trailing marker that forces UTC instead of the local zone.
const UTC_MARKER: &str = " utc";

#[derive(Debug, Clone, Copy)]
enum LayoutKind {
    /// Format carries a numeric offset (`%z`).
    Zoned,
    Rfc3339,
    /// Full date and time, read in the chosen zone.
    Naive,
    /// The word at `zone_index` is a zone abbreviation, read at offset zero.
    Abbrev { zone_index: usize },
    DateOnly,
    /// Time of day on the current date.
    TimeOnly,
    /// Month, day and time; the current year is assumed.
    NoYear,
}

#[derive(Debug)]
struct Layout {
    name: &'static str,
    format: &'static str,
    kind: LayoutKind,
}

/// Absolute layouts in priority order: the first one that parses wins, so an
/// input matching several layouts resolves to the earliest entry.
const LAYOUTS: &[Layout] = &[
    Layout { name: "reference", format: "%m/%d %I:%M:%S%p '%y %z", kind: LayoutKind::Zoned },
    Layout { name: "ansic", format: "%a %b %e %H:%M:%S %Y", kind: LayoutKind::Naive },
    Layout { name: "unix-date", format: "%a %b %e %H:%M:%S %Y", kind: LayoutKind::Abbrev { zone_index: 4 } },
    Layout { name: "ruby-date", format: "%a %b %d %H:%M:%S %z %Y", kind: LayoutKind::Zoned },
    Layout { name: "rfc822", format: "%d %b %y %H:%M", kind: LayoutKind::Abbrev { zone_index: 4 } },
    Layout { name: "rfc822z", format: "%d %b %y %H:%M %z", kind: LayoutKind::Zoned },
    Layout { name: "rfc850", format: "%A, %d-%b-%y %H:%M:%S", kind: LayoutKind::Abbrev { zone_index: 3 } },
    Layout { name: "rfc1123", format: "%a, %d %b %Y %H:%M:%S", kind: LayoutKind::Abbrev { zone_index: 5 } },
    Layout { name: "rfc1123z", format: "%a, %d %b %Y %H:%M:%S %z", kind: LayoutKind::Zoned },
    Layout { name: "rfc3339", format: "", kind: LayoutKind::Rfc3339 },
    Layout { name: "kitchen", format: "%I:%M%p", kind: LayoutKind::TimeOnly },
    Layout { name: "stamp", format: "%Y %b %e %H:%M:%S%.f", kind: LayoutKind::NoYear },
    Layout { name: "date-time", format: "%Y-%m-%d %H:%M:%S", kind: LayoutKind::Naive },
    Layout { name: "date-only", format: "%Y-%m-%d", kind: LayoutKind::DateOnly },
    Layout { name: "time-only", format: "%H:%M:%S", kind: LayoutKind::TimeOnly },
];

impl Layout {
    fn parse<Tz: TimeZone>(&self, text: &str, now: &DateTime<Tz>) -> Option<DateTime<Tz>> {
        let tz = now.timezone();
        match self.kind {
            LayoutKind::Zoned => DateTime::parse_from_str(text, self.format)
                .ok()
                .map(|dt| dt.with_timezone(&tz)),
            LayoutKind::Rfc3339 => DateTime::parse_from_rfc3339(text)
                .ok()
                .map(|dt| dt.with_timezone(&tz)),
            LayoutKind::Naive => NaiveDateTime::parse_from_str(text, self.format)
                .ok()
                .and_then(|naive| local_datetime(&tz, naive)),
            LayoutKind::Abbrev { zone_index } => {
                let mut words: Vec<&str> = text.split_whitespace().collect();
                let zone = words.get(zone_index)?;
                if zone.is_empty() || zone.len() > 5 || !zone.chars().all(|c| c.is_ascii_alphabetic()) {
                    return None;
                }
                words.remove(zone_index);
                NaiveDateTime::parse_from_str(&words.join(" "), self.format)
                    .ok()
                    .map(|naive| Utc.from_utc_datetime(&naive).with_timezone(&tz))
            }
            LayoutKind::DateOnly => NaiveDate::parse_from_str(text, self.format)
                .ok()
                .and_then(|date| date.and_hms_opt(0, 0, 0))
                .and_then(|naive| local_datetime(&tz, naive)),
            LayoutKind::TimeOnly => NaiveTime::parse_from_str(text, self.format)
                .ok()
                .and_then(|time| local_datetime(&tz, now.date_naive().and_time(time))),
            LayoutKind::NoYear => {
                let dated = format!("{} {}", now.year(), text);
                NaiveDateTime::parse_from_str(&dated, self.format)
                    .ok()
                    .and_then(|naive| local_datetime(&tz, naive))
            }
        }
    }
}

/// Wall-clock time in `tz`. An ambiguous time takes the earlier instant; a time
/// skipped by a forward transition moves one hour later, past the gap.
pub(crate) fn local_datetime<Tz: TimeZone>(tz: &Tz, naive: NaiveDateTime) -> Option<DateTime<Tz>> {
    match tz.from_local_datetime(&naive) {
        LocalResult::Single(dt) => Some(dt),
        LocalResult::Ambiguous(earliest, _) => Some(earliest),
        LocalResult::None => {
            let shifted = naive.checked_add_signed(Duration::try_hours(1)?)?;
            tz.from_local_datetime(&shifted).earliest()
        }
    }
}

/// 时间解析器：绝对格式优先，其次英文相对时间；`now` 由调用方注入。
#[derive(Debug, Clone)]
pub struct TimeResolver<Tz: TimeZone> {
    now: DateTime<Tz>,
}

impl<Tz: TimeZone> TimeResolver<Tz> {
    pub fn new(now: DateTime<Tz>) -> Self {
        Self { now }
    }

    pub fn now(&self) -> &DateTime<Tz> {
        &self.now
    }

    pub fn resolve(&self, input: &str) -> Result<ResolvedTime> {
        let trimmed = input.trim();
        let resolved = match strip_utc_marker(trimmed) {
            Some(rest) => resolve_in(rest, &self.now.with_timezone(&Utc)),
            None => resolve_in(trimmed, &self.now),
        };
        resolved.ok_or_else(|| LogSearchError::InvalidDateTime {
            input: input.to_string(),
        })
    }
}

fn strip_utc_marker(input: &str) -> Option<&str> {
    let split = input.len().checked_sub(UTC_MARKER.len())?;
    let (head, tail) = (input.get(..split)?, input.get(split..)?);
    tail.eq_ignore_ascii_case(UTC_MARKER).then(|| head.trim_end())
}

fn resolve_in<Tz: TimeZone>(text: &str, now: &DateTime<Tz>) -> Option<ResolvedTime> {
    // space-padded days ("Jan  2") collapse to a single separator
    let normalized = text.split_whitespace().collect::<Vec<_>>().join(" ");
    let text = normalized.as_str();
    for layout in LAYOUTS {
        if let Some(dt) = layout.parse(text, now) {
            debug!(layout = layout.name, input = text, "matched absolute layout");
            return Some(ResolvedTime::from_datetime(&dt));
        }
    }
    let dt = parse_relative(text, now)?;
    debug!(input = text, "matched relative phrase");
    Some(ResolvedTime::from_datetime(&dt))
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::FixedOffset;

    fn utc_resolver() -> TimeResolver<Utc> {
        TimeResolver::new(Utc.with_ymd_and_hms(2000, 1, 1, 10, 0, 30).unwrap())
    }

    fn resolve(input: &str) -> String {
        utc_resolver().resolve(input).unwrap().to_string()
    }

    #[test]
    fn known_inputs() {
        assert_eq!(resolve("2000-01-01T12:13:14Z"), "2000-01-01T12:13:14Z");
        assert_eq!(resolve("04 Feb 00 13:14 MST"), "2000-02-04T13:14:00Z");
        assert_eq!(resolve("5 seconds ago"), "2000-01-01T10:00:25Z");
        assert_eq!(resolve("2024-05-13 13:00:00 UTC"), "2024-05-13T13:00:00Z");
    }

    #[test]
    fn every_layout_family_parses() {
        let cases = [
            ("01/02 03:04:05PM '06 -0700", "2006-01-02T22:04:05Z"),
            ("Mon Jan  2 15:04:05 2006", "2006-01-02T15:04:05Z"),
            ("Mon Jan  2 15:04:05 MST 2006", "2006-01-02T15:04:05Z"),
            ("Mon Jan 02 15:04:05 -0700 2006", "2006-01-02T22:04:05Z"),
            ("02 Jan 06 15:04 +0100", "2006-01-02T14:04:00Z"),
            ("Monday, 02-Jan-06 15:04:05 GMT", "2006-01-02T15:04:05Z"),
            ("Mon, 02 Jan 2006 15:04:05 GMT", "2006-01-02T15:04:05Z"),
            ("Mon, 02 Jan 2006 15:04:05 -0700", "2006-01-02T22:04:05Z"),
            ("2006-01-02T15:04:05.999999999+02:00", "2006-01-02T13:04:05Z"),
            ("3:04PM", "2000-01-01T15:04:00Z"),
            ("Jan  2 15:04:05", "2000-01-02T15:04:05Z"),
            ("Jan  2 15:04:05.000", "2000-01-02T15:04:05Z"),
            ("2006-01-02 15:04:05", "2006-01-02T15:04:05Z"),
            ("2006-01-02", "2006-01-02T00:00:00Z"),
            ("15:04:05", "2000-01-01T15:04:05Z"),
        ];
        for (input, expected) in cases {
            assert_eq!(resolve(input), expected, "input {input:?}");
        }
    }

    #[test]
    fn utc_marker_overrides_local_zone() {
        let local = FixedOffset::east_opt(2 * 3600).unwrap();
        let resolver = TimeResolver::new(local.with_ymd_and_hms(2024, 5, 13, 9, 0, 0).unwrap());

        let marked = resolver.resolve("2024-05-13 13:00:00 UTC").unwrap();
        assert_eq!(marked.to_string(), "2024-05-13T13:00:00Z");

        let unmarked = resolver.resolve("2024-05-13 13:00:00").unwrap();
        assert_eq!(unmarked.to_string(), "2024-05-13T13:00:00+02:00");
        assert_eq!(marked.instant() - unmarked.instant(), chrono::Duration::hours(2));
    }

    #[test]
    fn relative_phrases_use_injected_now() {
        let local = FixedOffset::west_opt(5 * 3600).unwrap();
        let resolver = TimeResolver::new(local.with_ymd_and_hms(2020, 6, 1, 8, 0, 0).unwrap());
        assert_eq!(resolver.resolve("5 seconds ago").unwrap().to_string(), "2020-06-01T07:59:55-05:00");
        assert_eq!(resolver.resolve("1 hour ago UTC").unwrap().to_string(), "2020-06-01T12:00:00Z");
    }

    #[test]
    fn unparseable_input_is_invalid_date_time() {
        let err = utc_resolver().resolve("the day after never").unwrap_err();
        assert!(matches!(err, LogSearchError::InvalidDateTime { ref input } if input == "the day after never"));
    }

    /// UTC+1, switching to UTC+2 at 2024-03-31 01:00 UTC: local 02:00..03:00
    /// does not exist that day.
    #[derive(Debug, Clone, Copy)]
    struct SpringForward;

    impl SpringForward {
        fn switch() -> NaiveDateTime {
            NaiveDate::from_ymd_opt(2024, 3, 31).unwrap().and_hms_opt(1, 0, 0).unwrap()
        }

        fn winter() -> FixedOffset {
            FixedOffset::east_opt(3600).unwrap()
        }

        fn summer() -> FixedOffset {
            FixedOffset::east_opt(2 * 3600).unwrap()
        }
    }

    impl TimeZone for SpringForward {
        type Offset = FixedOffset;

        fn from_offset(_offset: &FixedOffset) -> Self {
            SpringForward
        }

        fn offset_from_local_date(&self, local: &NaiveDate) -> LocalResult<FixedOffset> {
            self.offset_from_local_datetime(&local.and_hms_opt(12, 0, 0).unwrap())
        }

        fn offset_from_local_datetime(&self, local: &NaiveDateTime) -> LocalResult<FixedOffset> {
            let as_winter = *local - Duration::hours(1);
            let as_summer = *local - Duration::hours(2);
            match (as_winter < Self::switch(), as_summer >= Self::switch()) {
                (true, false) => LocalResult::Single(Self::winter()),
                (false, true) => LocalResult::Single(Self::summer()),
                _ => LocalResult::None,
            }
        }

        fn offset_from_utc_date(&self, utc: &NaiveDate) -> FixedOffset {
            self.offset_from_utc_datetime(&utc.and_hms_opt(12, 0, 0).unwrap())
        }

        fn offset_from_utc_datetime(&self, utc: &NaiveDateTime) -> FixedOffset {
            if *utc < Self::switch() {
                Self::winter()
            } else {
                Self::summer()
            }
        }
    }

    #[test]
    fn wall_clock_in_a_dst_gap_moves_past_it() {
        let now = SpringForward.with_ymd_and_hms(2024, 3, 31, 12, 0, 0).unwrap();
        let resolver = TimeResolver::new(now);

        let skipped = resolver.resolve("2024-03-31 02:30:00").unwrap();
        assert_eq!(skipped.to_string(), "2024-03-31T03:30:00+02:00");

        let before = resolver.resolve("2024-03-31 01:30:00").unwrap();
        assert_eq!(before.to_string(), "2024-03-31T01:30:00+01:00");

        let clock = resolver.resolve("02:15:00").unwrap();
        assert_eq!(clock.to_string(), "2024-03-31T03:15:00+02:00");

        let relative = resolver.resolve("today at 2:45am").unwrap();
        assert_eq!(relative.to_string(), "2024-03-31T03:45:00+02:00");
    }

    #[test]
    fn overflowing_relative_span_is_invalid_date_time() {
        let err = utc_resolver().resolve("100000000 years ago").unwrap_err();
        assert!(matches!(err, LogSearchError::InvalidDateTime { .. }));
    }

    #[test]
    fn utc_marker_needs_a_separating_space() {
        assert_eq!(strip_utc_marker("2024-05-13 UTC"), Some("2024-05-13"));
        assert_eq!(strip_utc_marker("noon utc"), Some("noon"));
        assert_eq!(strip_utc_marker("XUTC"), None);
        assert_eq!(strip_utc_marker("UTC"), None);
    }
}
