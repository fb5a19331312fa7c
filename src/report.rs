//! Markdown tables for the forecast post and the panel.

use chrono::{DateTime, Utc};
use chrono_tz::Tz;

use crate::aggregate::LocationRecord;
use crate::clock::{format_clock_time, format_updated_stamp, humanize_since};

pub const POST_TABLE_HEADER: &str = "Place|Weather|Temperature|Cloud Cover|Totality Time|\n:--|:--|:--|:--|:--|";

pub const PANEL_TABLE_HEADER: &str = "Place|Weather|Cloud Cover|Totality Time|\n:--|:--|:--|:--|";

pub const ATTRIBUTION: &str = "Data from [Dark Sky](https://darksky.net/poweredby/).";

const POST_TITLE: &str = "**Weather Forecast Update**:";

const POST_SIGNATURE: &str = "*Brought to you by your VLT bot, bleep bloop.";

fn round_to_int(value: f64) -> i64 {
    value.round() as i64
}

pub fn fahrenheit_to_celsius(fahrenheit: f64) -> f64 {
    (fahrenheit - 32.0) * 5.0 / 9.0
}

/// `73°F (23°C)`
pub fn format_temperature(fahrenheit: f64) -> String {
    format!(
        "{}°F ({}°C)",
        round_to_int(fahrenheit),
        round_to_int(fahrenheit_to_celsius(fahrenheit))
    )
}

/// `73%` for a fraction of `0.73`.
pub fn format_cloud_cover(fraction: f64) -> String {
    format!("{}%", round_to_int(fraction * 100.0))
}

fn post_row(record: &LocationRecord) -> String {
    format!(
        "{}|{}|{}|{}|{}|",
        record.location.name,
        record.weather.summary,
        format_temperature(record.weather.temperature),
        format_cloud_cover(record.weather.cloud_cover),
        format_clock_time(record.location.time, record.location.timezone),
    )
}

fn panel_row(record: &LocationRecord) -> String {
    format!(
        "{}|{}|{}|{}|",
        record.location.name,
        record.weather.summary,
        format_cloud_cover(record.weather.cloud_cover),
        format_clock_time(record.location.time, record.location.timezone),
    )
}

fn table(header: &str, rows: impl Iterator<Item = String>) -> String {
    let mut out = header.to_string();
    for row in rows {
        out.push('\n');
        out.push_str(&row);
    }
    out
}

/// Header plus one row per record, with temperature, in input order.
pub fn render_post_table(records: &[LocationRecord]) -> String {
    table(POST_TABLE_HEADER, records.iter().map(post_row))
}

/// Header plus one row per record, without temperature, in input order.
pub fn render_panel_table(records: &[LocationRecord]) -> String {
    table(PANEL_TABLE_HEADER, records.iter().map(panel_row))
}

/// The full body of a forecast update.
pub fn render_post(
    records: &[LocationRecord],
    previous_post: DateTime<Utc>,
    now: DateTime<Utc>,
) -> String {
    format!(
        "{POST_TITLE}\n\n{}\n\nPrevious update was {}. Forecast is at time of totality and will get more accurate the closer we get to totality.\n\n{POST_SIGNATURE} {ATTRIBUTION}*\n",
        render_post_table(records),
        humanize_since(previous_post, now),
    )
}

/// Text placed after `*Last updated ` in the panel trailer.
pub fn render_panel_footer(now: DateTime<Utc>, reference: Tz) -> String {
    format!("{}. {ATTRIBUTION}", format_updated_stamp(now, reference))
}
