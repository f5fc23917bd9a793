//! Strict human-readable elapsed time ("5 minutes", "1 day").

const MS_PER_SECOND: f64 = 1_000.0;
const MINUTES_IN_HOUR: f64 = 60.0;
const MINUTES_IN_DAY: f64 = 1_440.0;
const MINUTES_IN_MONTH: f64 = 43_200.0;
const MINUTES_IN_YEAR: f64 = 525_600.0;

/// Formats the absolute elapsed time `delta_ms` in one rounded unit.
///
/// The unit is the largest of second/minute/hour/day/month/year whose
/// threshold the duration reaches. Twelve rounded months read as `1 year`.
pub fn format_elapsed_strict(delta_ms: i64) -> String {
    let seconds = delta_ms.unsigned_abs() as f64 / MS_PER_SECOND;
    let minutes = seconds / 60.0;

    let (value, unit) = if seconds < 60.0 {
        (seconds.round(), "second")
    } else if minutes < MINUTES_IN_HOUR {
        (minutes.round(), "minute")
    } else if minutes < MINUTES_IN_DAY {
        ((minutes / MINUTES_IN_HOUR).round(), "hour")
    } else if minutes < MINUTES_IN_MONTH {
        ((minutes / MINUTES_IN_DAY).round(), "day")
    } else if minutes < MINUTES_IN_YEAR {
        let months = (minutes / MINUTES_IN_MONTH).round();
        if months >= 12.0 {
            (1.0, "year")
        } else {
            (months, "month")
        }
    } else {
        ((minutes / MINUTES_IN_YEAR).round(), "year")
    };

    let value = value as u64;
    if value == 1 {
        format!("1 {unit}")
    } else {
        format!("{value} {unit}s")
    }
}
