//! English relative time phrases: "5 seconds ago", "in 2 hours",
//! "yesterday at noon", "last monday", "2 days ago at noon".

use std::sync::OnceLock;

use chrono::{DateTime, Datelike, Duration, NaiveTime, TimeZone, Weekday};
use regex::Regex;

use crate::timeparse::local_datetime;

/// Resolve `input` against `now`. Day anchors are evaluated in the zone of `now`.
///
/// A phrase is a day part, a clock part, or both (`<day> at <clock>`,
/// `<day> <clock>`, `<clock> <day>`). The day part alone keeps the time of day
/// of `now`; the clock part alone means today.
pub fn parse_relative<Tz: TimeZone>(input: &str, now: &DateTime<Tz>) -> Option<DateTime<Tz>> {
    let text = input.trim().to_lowercase();
    let words: Vec<&str> = text.split_whitespace().collect();
    if words.is_empty() {
        return None;
    }

    if let Some(at) = words.iter().rposition(|w| *w == "at") {
        let clock = parse_clock(&words[at + 1..].join(" "))?;
        let day = parse_day(&words[..at], now)?;
        return with_clock(&day, clock);
    }

    if let Some(day) = parse_day(&words, now) {
        return Some(day);
    }

    // `<day> <clock>` first, then `<clock> <day>`
    for split in 0..words.len() {
        let (day_words, clock_words) = words.split_at(split);
        if let (Some(clock), Some(day)) = (parse_clock(&clock_words.join(" ")), parse_day(day_words, now)) {
            return with_clock(&day, clock);
        }
    }
    for split in 1..words.len() {
        let (clock_words, day_words) = words.split_at(split);
        if let (Some(clock), Some(day)) = (parse_clock(&clock_words.join(" ")), parse_day(day_words, now)) {
            return with_clock(&day, clock);
        }
    }
    None
}

fn with_clock<Tz: TimeZone>(day: &DateTime<Tz>, clock: NaiveTime) -> Option<DateTime<Tz>> {
    local_datetime(&day.timezone(), day.date_naive().and_time(clock))
}

/// The day part of a phrase. An empty day part is today.
fn parse_day<Tz: TimeZone>(words: &[&str], now: &DateTime<Tz>) -> Option<DateTime<Tz>> {
    match words {
        [] | ["now"] | ["right", "now"] | ["today"] | ["tonight"] => Some(now.clone()),
        ["yesterday"] => shift_days(now, -1),
        ["tomorrow"] => shift_days(now, 1),
        ["ago"] => None,
        [rest @ .., "ago"] => now.clone().checked_sub_signed(parse_span(rest)?),
        [rest @ .., "from", "now"] => now.clone().checked_add_signed(parse_span(rest)?),
        ["in", rest @ ..] => now.clone().checked_add_signed(parse_span(rest)?),
        ["last", word] => match parse_weekday(word) {
            Some(weekday) => shift_days(now, -days_back(now.weekday(), weekday)),
            None => now.clone().checked_sub_signed(parse_span(&["1", *word])?),
        },
        ["next", word] => match parse_weekday(word) {
            Some(weekday) => shift_days(now, days_ahead(now.weekday(), weekday)),
            None => now.clone().checked_add_signed(parse_span(&["1", *word])?),
        },
        ["this", word] | [word] => {
            let weekday = parse_weekday(word)?;
            shift_days(now, same_week_offset(now.weekday(), weekday))
        }
        _ => None,
    }
}

fn shift_days<Tz: TimeZone>(now: &DateTime<Tz>, days: i64) -> Option<DateTime<Tz>> {
    now.clone().checked_add_signed(Duration::try_days(days)?)
}

fn parse_weekday(word: &str) -> Option<Weekday> {
    word.parse::<Weekday>().ok()
}

/// Most recent `target` strictly before today: 1..=7 days back.
fn days_back(today: Weekday, target: Weekday) -> i64 {
    let diff = (7 + today.num_days_from_monday() as i64 - target.num_days_from_monday() as i64) % 7;
    if diff == 0 {
        7
    } else {
        diff
    }
}

/// Soonest `target` strictly after today: 1..=7 days ahead.
fn days_ahead(today: Weekday, target: Weekday) -> i64 {
    let diff = (7 + target.num_days_from_monday() as i64 - today.num_days_from_monday() as i64) % 7;
    if diff == 0 {
        7
    } else {
        diff
    }
}

/// `target` within the current Sunday-based week, past or future.
fn same_week_offset(today: Weekday, target: Weekday) -> i64 {
    target.num_days_from_sunday() as i64 - today.num_days_from_sunday() as i64
}

fn parse_clock(text: &str) -> Option<NaiveTime> {
    match text {
        "noon" | "midday" => return NaiveTime::from_hms_opt(12, 0, 0),
        "midnight" => return NaiveTime::from_hms_opt(0, 0, 0),
        _ => {}
    }

    static CLOCK: OnceLock<Regex> = OnceLock::new();
    let re = CLOCK.get_or_init(|| {
        Regex::new(r"^(\d{1,2})(?::(\d{2}))?(?::(\d{2}))?\s*(am|pm|a\.m\.|p\.m\.)?$")
            .expect("clock pattern is valid")
    });
    let caps = re.captures(text)?;
    let mut hour: u32 = caps[1].parse().ok()?;
    let minute: u32 = caps.get(2).map_or(Some(0), |m| m.as_str().parse().ok())?;
    let second: u32 = caps.get(3).map_or(Some(0), |m| m.as_str().parse().ok())?;

    match caps.get(4).map(|m| m.as_str().starts_with('p')) {
        Some(pm) => {
            if !(1..=12).contains(&hour) {
                return None;
            }
            hour %= 12;
            if pm {
                hour += 12;
            }
        }
        // a bare number is too ambiguous to be a clock; require minutes
        None if caps.get(2).is_none() => return None,
        None => {}
    }
    NaiveTime::from_hms_opt(hour, minute, second)
}

/// "5 seconds", "an hour", "2h 30m", "1 day and 3 hours".
fn parse_span(words: &[&str]) -> Option<Duration> {
    if words.is_empty() {
        return None;
    }
    let mut parts: Vec<String> = Vec::new();
    let mut iter = words.iter().map(|w| w.trim_matches(',')).peekable();
    while let Some(word) = iter.next() {
        let amount = match word {
            "a" | "an" | "one" => "1",
            "and" | "" => continue,
            other => other,
        };
        let is_number = amount.chars().all(|c| c.is_ascii_digit());
        match iter.peek() {
            Some(unit) if is_number && unit.starts_with(|c: char| c.is_ascii_alphabetic()) => {
                parts.push(format!("{amount}{unit}"));
                iter.next();
            }
            _ => parts.push(amount.to_string()),
        }
    }
    let std = humantime::parse_duration(&parts.join(" ")).ok()?;
    Duration::from_std(std).ok()
}
