//! Time-zone-aware formatting and relative-time humanization used by the report renderer.

use chrono::{DateTime, Utc};
use chrono_tz::Tz;

/// `h:mm a z` in the given zone, e.g. `10:19 am PDT`.
pub fn format_clock_time(instant: DateTime<Utc>, tz: Tz) -> String {
    instant.with_timezone(&tz).format("%-I:%M %P %Z").to_string()
}

/// Panel "last updated" stamp: the instant in `reference`, then again in UTC,
/// e.g. `August 21 2017, 10:19 am PDT (5:19 pm UTC)`.
pub fn format_updated_stamp(instant: DateTime<Utc>, reference: Tz) -> String {
    let local = instant
        .with_timezone(&reference)
        .format("%B %d %Y, %-I:%M %P %Z");
    let utc = format_clock_time(instant, Tz::UTC);
    format!("{local} ({utc})")
}

/// Human phrase for how far `then` is from `now`, e.g. `3 hours ago` or `in a day`.
pub fn humanize_since(then: DateTime<Utc>, now: DateTime<Utc>) -> String {
    let millis = (now - then).num_milliseconds();
    let phrase = relative_phrase(millis.unsigned_abs() as f64);
    if millis >= 0 {
        format!("{phrase} ago")
    } else {
        format!("in {phrase}")
    }
}

fn relative_phrase(millis: f64) -> String {
    let seconds = (millis / 1_000.0).round();
    let minutes = (millis / 60_000.0).round();
    let hours = (millis / 3_600_000.0).round();
    let days_exact = millis / 86_400_000.0;
    let days = days_exact.round();
    let months_exact = days_exact * 4_800.0 / 146_097.0;
    let months = months_exact.round();
    let years = (months_exact / 12.0).round();

    if seconds <= 44.0 {
        "a few seconds".to_string()
    } else if minutes <= 1.0 {
        "a minute".to_string()
    } else if minutes < 45.0 {
        format!("{minutes} minutes")
    } else if hours <= 1.0 {
        "an hour".to_string()
    } else if hours < 22.0 {
        format!("{hours} hours")
    } else if days <= 1.0 {
        "a day".to_string()
    } else if days < 26.0 {
        format!("{days} days")
    } else if months <= 1.0 {
        "a month".to_string()
    } else if months < 11.0 {
        format!("{months} months")
    } else if years <= 1.0 {
        "a year".to_string()
    } else {
        format!("{years} years")
    }
}
