//! Ellipsoidal distance on the WGS84 reference ellipsoid.
//!
//! Closed-form inverse solution from the PROJ.4 `geod` family: reduced
//! latitudes, a spherical arc, then a fourth-order flattening correction.
//! Good to a few metres for airport-to-airport distances.
//!
//! Angles use the full-precision `PI`. Historical outputs were produced with
//! the 11-digit literal 3.14159265359; the difference is below 1e-9 miles
//! for continental distances.

use serde::{Deserialize, Serialize};
use std::f64::consts::PI;
use thiserror::Error;

/// Equatorial radius in metres.
pub const G_A: f64 = 6_378_137.0;
/// One minus flattening.
pub const G_ONEF: f64 = 0.996_647_189_335_252_54;
pub const G_FLAT4: f64 = 0.000_838_202_666_186_865_79;
pub const G_FLAT64: f64 = 1.756_459_274_006_926e-7;
pub const METERS_TO_MILES: f64 = 0.000_621_369_949_494_949_66;
const DTOL: f64 = 1e-12;

const DEG: f64 = PI / 180.0;

/// A WGS84 point in decimal degrees.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Coordinate {
    pub lat: f64,
    pub lon: f64,
}

#[derive(Debug, Error, PartialEq)]
pub enum GeodesyError {
    #[error("invalid coordinate ({lat}, {lon}): latitude must be within -90..90 and longitude within -180..180")]
    InvalidCoordinate { lat: f64, lon: f64 },
}

impl Coordinate {
    /// Validated constructor used at input boundaries.
    pub fn new(lat: f64, lon: f64) -> Result<Self, GeodesyError> {
        let valid = lat.is_finite()
            && lon.is_finite()
            && (-90.0..=90.0).contains(&lat)
            && (-180.0..=180.0).contains(&lon);
        if !valid {
            return Err(GeodesyError::InvalidCoordinate { lat, lon });
        }
        Ok(Self { lat, lon })
    }
}

impl From<(f64, f64)> for Coordinate {
    fn from((lat, lon): (f64, f64)) -> Self {
        Self { lat, lon }
    }
}

/// Bring a longitude (radians) back into -PI..PI.
fn adjlon(mut lon: f64) -> f64 {
    if lon.abs() <= PI {
        return lon;
    }
    lon += PI;
    lon -= 2.0 * PI * (lon / (2.0 * PI)).floor();
    lon -= PI;
    lon
}

/// Distance between two points in statute miles.
///
/// Returns `None` for degenerate pairs: coincident points, antipodal
/// points, and two pole points that differ only in longitude. The series
/// divides by `L` and `1 - L`, which vanish there. Callers must not read
/// `None` as "close by".
pub fn distance_in_miles(a: Coordinate, b: Coordinate) -> Option<f64> {
    let lat1 = a.lat * DEG;
    let lat2 = b.lat * DEG;
    let lon1 = a.lon * DEG;
    let lon2 = b.lon * DEG;

    let th1 = (G_ONEF * lat1.tan()).atan();
    let th2 = (G_ONEF * lat2.tan()).atan();
    let thm = 0.5 * (th1 + th2);
    let dthm = 0.5 * (th2 - th1);
    let dlam = adjlon(lon2 - lon1);
    let dlamm = 0.5 * dlam;

    if dlam.abs() < DTOL && dthm.abs() < DTOL {
        return None;
    }

    let sindlamm = dlamm.sin();
    let costhm = thm.cos();
    let sinthm = thm.sin();
    let cosdthm = dthm.cos();
    let sindthm = dthm.sin();

    let l = sindthm * sindthm + (cosdthm * cosdthm - sinthm * sinthm) * sindlamm * sindlamm;
    if l <= 0.0 || l >= 1.0 {
        return None;
    }
    let cosd = 1.0 - l - l;
    let d = cosd.acos();

    let e = cosd + cosd;
    let sind = d.sin();
    let mut y = sinthm * cosdthm;
    y *= (y + y) / (1.0 - l);
    let mut t = sindthm * costhm;
    t *= (t + t) / l;
    let x = y + t;
    y -= t;
    t = d / sind;
    let dd = 4.0 * t * t;
    let aa = dd * e;
    let bb = dd + dd;

    let meters = G_A
        * sind
        * (t - G_FLAT4 * (t * x - y)
            + G_FLAT64 * (x * (aa + (t - 0.5 * (aa - e)) * x) - y * (bb + e * y) + dd * x * y));

    let miles = meters * METERS_TO_MILES;
    miles.is_finite().then_some(miles)
}
