//! Great-circle distance and the distance label shown between notes.

/// Mean earth radius in kilometers.
pub const EARTH_RADIUS_KM: f64 = 6371.0088;

const SIGNIFICANT_DIGITS: i32 = 3;

/// Haversine great-circle distance between two `lat/lon` points in kilometers.
pub fn haversine_km(lat1: f64, lon1: f64, lat2: f64, lon2: f64) -> f64 {
    let d_lat = (lat2 - lat1).to_radians();
    let d_lon = (lon2 - lon1).to_radians();
    let lat1_r = lat1.to_radians();
    let lat2_r = lat2.to_radians();

    let a = (d_lat / 2.0).sin().powi(2) + lat1_r.cos() * lat2_r.cos() * (d_lon / 2.0).sin().powi(2);
    let c = 2.0 * a.sqrt().asin();
    EARTH_RADIUS_KM * c
}

/// Formats a distance for the delta row between two notes.
///
/// At or above 1 km the value is rounded to three significant digits with a
/// ` km` suffix (`15.6 km`, `1,540 km`); anything shorter reads `<1 km`.
pub fn format_distance_km(km: f64) -> String {
    if !km.is_finite() || km < 1.0 {
        return "<1 km".to_string();
    }

    let magnitude = km.log10().floor() as i32 + 1;
    let scale = 10f64.powi(magnitude - SIGNIFICANT_DIGITS);
    let rounded = (km / scale).round() * scale;

    if magnitude >= SIGNIFICANT_DIGITS {
        return format!("{} km", group_thousands(rounded.round() as u64));
    }

    let decimals = (SIGNIFICANT_DIGITS - magnitude) as usize;
    let text = format!("{rounded:.decimals$}");
    let text = text.trim_end_matches('0').trim_end_matches('.');
    format!("{text} km")
}

fn group_thousands(value: u64) -> String {
    let digits = value.to_string();
    let mut grouped = String::with_capacity(digits.len() + digits.len() / 3);
    for (idx, ch) in digits.chars().enumerate() {
        if idx > 0 && (digits.len() - idx) % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(ch);
    }
    grouped
}
