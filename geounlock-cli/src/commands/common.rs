//! Common formatting and parsing shared across CLI commands.

use geounlock::geo::Coordinate;

use crate::error::CliError;

/// Distances below this are shown in meters.
const KILOMETER_THRESHOLD_M: f64 = 1000.0;

/// Human-readable distance: "240 m" below a kilometer, "1.3 km" above.
pub fn format_distance(meters: f64) -> String {
    if meters < KILOMETER_THRESHOLD_M {
        format!("{:.0} m", meters)
    } else {
        format!("{:.1} km", meters / 1000.0)
    }
}

/// Eight-point compass direction for a bearing in degrees.
pub fn compass_point(bearing_deg: f64) -> &'static str {
    const POINTS: [&str; 8] = ["N", "NE", "E", "SE", "S", "SW", "W", "NW"];
    let normalized = bearing_deg.rem_euclid(360.0);
    let index = ((normalized + 22.5) / 45.0) as usize % POINTS.len();
    POINTS[index]
}

/// Validate a `--lat`/`--lon` pair.
pub fn parse_location(lat: f64, lon: f64) -> Result<Coordinate, CliError> {
    Ok(Coordinate::new(lat, lon)?)
}
