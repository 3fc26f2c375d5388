//! Great-circle geometry on a spherical Earth.
//!
//! Provides distance, initial bearing and destination-point calculations
//! between WGS84 coordinates. All functions are pure and treat the Earth as a
//! sphere of radius [`EARTH_RADIUS_M`]; no ellipsoid correction is applied.

mod types;

pub use types::{Coordinate, CoordError, MAX_LAT, MAX_LON, MIN_LAT, MIN_LON};

/// Mean Earth radius in meters.
pub const EARTH_RADIUS_M: f64 = 6_371_000.0;

/// Great-circle distance between two coordinates in meters (haversine).
#[inline]
pub fn distance_meters(a: Coordinate, b: Coordinate) -> f64 {
    let phi1 = a.latitude.to_radians();
    let phi2 = b.latitude.to_radians();
    let d_phi = (b.latitude - a.latitude).to_radians();
    let d_lambda = (b.longitude - a.longitude).to_radians();

    let h = (d_phi / 2.0).sin().powi(2) + phi1.cos() * phi2.cos() * (d_lambda / 2.0).sin().powi(2);

    // Rounding can push h marginally past 1 for antipodal points
    let c = 2.0 * h.clamp(0.0, 1.0).sqrt().asin();

    EARTH_RADIUS_M * c
}

/// Initial bearing from `from` towards `to` in degrees.
///
/// The result is normalized to `[0, 360)`, where 0 = North and 90 = East.
/// Identical points have no defined bearing and return 0.
#[inline]
pub fn bearing_degrees(from: Coordinate, to: Coordinate) -> f64 {
    if from == to {
        return 0.0;
    }

    let phi1 = from.latitude.to_radians();
    let phi2 = to.latitude.to_radians();
    let d_lambda = (to.longitude - from.longitude).to_radians();

    let y = d_lambda.sin() * phi2.cos();
    let x = phi1.cos() * phi2.sin() - phi1.sin() * phi2.cos() * d_lambda.cos();

    normalize_bearing(y.atan2(x).to_degrees())
}

/// Project a position along a bearing for a given distance.
///
/// Uses the spherical destination-point formula. Longitude is wrapped to
/// `[-180, 180]` and latitude clamped to `[-90, 90]`.
pub fn destination(from: Coordinate, bearing_deg: f64, distance_m: f64) -> Coordinate {
    let phi1 = from.latitude.to_radians();
    let lambda1 = from.longitude.to_radians();
    let theta = bearing_deg.to_radians();
    let delta = distance_m / EARTH_RADIUS_M;

    let phi2 = (phi1.sin() * delta.cos() + phi1.cos() * delta.sin() * theta.cos()).asin();
    let lambda2 = lambda1
        + (theta.sin() * delta.sin() * phi1.cos()).atan2(delta.cos() - phi1.sin() * phi2.sin());

    let mut longitude = lambda2.to_degrees();
    if longitude > MAX_LON {
        longitude -= 360.0;
    } else if longitude < MIN_LON {
        longitude += 360.0;
    }

    Coordinate {
        latitude: phi2.to_degrees().clamp(MIN_LAT, MAX_LAT),
        longitude,
    }
}

/// Normalize an angle in degrees to `[0, 360)`.
fn normalize_bearing(deg: f64) -> f64 {
    let normalized = deg.rem_euclid(360.0);
    // rem_euclid can round a tiny negative input up to exactly 360.0
    if normalized >= 360.0 {
        0.0
    } else {
        normalized
    }
}
