//! Wall-clock conversion between the tournament's timezone and the viewer's.

use chrono::{DateTime, NaiveTime, TimeZone, Utc};
use chrono_tz::{Australia::Sydney, Europe::Paris, Tz};

/// Convert a Paris `HH:MM` time of day to the Sydney `HH:MM` it corresponds to.
///
/// The calendar date is the reference instant's date as observed in Paris, so
/// a reference just after midnight Paris time picks the Paris date, not the
/// UTC one. Returns `None` when the input is not a valid time of day or the
/// local time does not exist on that date (spring-forward gap).
pub fn paris_to_sydney(time_of_day: &str, reference: DateTime<Utc>) -> Option<String> {
    convert_time_of_day(time_of_day, reference, Paris, Sydney)
}

pub fn convert_time_of_day(
    time_of_day: &str,
    reference: DateTime<Utc>,
    from: Tz,
    to: Tz,
) -> Option<String> {
    let time = NaiveTime::parse_from_str(time_of_day.trim(), "%H:%M").ok()?;
    let date = reference.with_timezone(&from).date_naive();

    // Ambiguous fall-back times resolve to the first occurrence.
    let local = from.from_local_datetime(&date.and_time(time)).earliest()?;

    Some(local.with_timezone(&to).format("%H:%M").to_string())
}
