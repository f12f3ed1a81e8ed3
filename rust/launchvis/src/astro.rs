//! Low-precision solar ephemeris and great-circle geometry.
//!
//! Everything here is a pure function of its arguments. The solar position is
//! good to a few hundredths of a degree, which is plenty to tell civil from
//! nautical twilight but not to point a telescope.

use serde::{Deserialize, Serialize};

// ---------- Constants ----------
const EARTH_MEAN_RADIUS_KM: f64 = 6371.0;
const UNIX_EPOCH_JD: f64 = 2_440_587.5;
const J2000_JD: f64 = 2_451_545.0;
const SECONDS_PER_DAY: f64 = 86_400.0;

/// Sky brightness band derived from the Sun's elevation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TwilightBand {
    Day,
    Civil,
    Nautical,
    Astronomical,
    Night,
}

impl TwilightBand {
    pub fn label(self) -> &'static str {
        match self {
            TwilightBand::Day => "daylight",
            TwilightBand::Civil => "civil twilight",
            TwilightBand::Nautical => "nautical twilight",
            TwilightBand::Astronomical => "astronomical twilight",
            TwilightBand::Night => "full night",
        }
    }
}

/// Apparent equatorial position of the Sun, degrees.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SolarPosition {
    pub right_ascension_deg: f64,
    pub declination_deg: f64,
}

/// Julian date for a unix timestamp (seconds, UTC).
pub fn julian_date(unix_seconds: i64) -> f64 {
    UNIX_EPOCH_JD + unix_seconds as f64 / SECONDS_PER_DAY
}

/// Sun right ascension / declination from the usual mean-longitude, mean-anomaly
/// series with the two equation-of-centre terms.
pub fn solar_position(unix_seconds: i64) -> SolarPosition {
    let n = julian_date(unix_seconds) - J2000_JD;

    let mean_longitude = unwind_deg(280.460 + 0.985_647_4 * n);
    let mean_anomaly = unwind_deg(357.528 + 0.985_600_3 * n).to_radians();

    let ecliptic_longitude = unwind_deg(
        mean_longitude + 1.915 * mean_anomaly.sin() + 0.020 * (2.0 * mean_anomaly).sin(),
    )
    .to_radians();
    let obliquity = (23.439 - 0.000_000_4 * n).to_radians();

    let ra = (obliquity.cos() * ecliptic_longitude.sin()).atan2(ecliptic_longitude.cos());
    let dec = (obliquity.sin() * ecliptic_longitude.sin()).asin();

    SolarPosition {
        right_ascension_deg: unwind_deg(ra.to_degrees()),
        declination_deg: dec.to_degrees(),
    }
}

/// Greenwich mean sidereal time in degrees.
pub fn gmst_deg(unix_seconds: i64) -> f64 {
    let d = julian_date(unix_seconds) - J2000_JD;
    let t = d / 36_525.0;
    let gmst = 280.460_618_37 + 360.985_647_366_29 * d + 0.000_387_933 * t * t
        - t * t * t / 38_710_000.0;
    unwind_deg(gmst)
}

/// Altitude above the horizon of an equatorial position seen from (lat, lon).
pub fn altitude_from_equatorial(
    ra_deg: f64,
    dec_deg: f64,
    lat_deg: f64,
    lon_deg: f64,
    unix_seconds: i64,
) -> f64 {
    // LST ≈ GMST + longitude
    let lst = unwind_deg(gmst_deg(unix_seconds) + lon_deg);
    let h = unwind_deg(lst - ra_deg).to_radians();
    let lat = lat_deg.to_radians();
    let dec = dec_deg.to_radians();

    let sin_alt = lat.sin() * dec.sin() + lat.cos() * dec.cos() * h.cos();
    sin_alt.clamp(-1.0, 1.0).asin().to_degrees()
}

/// Sun elevation in degrees, in [-90, 90], at a point and instant.
pub fn solar_elevation(lat_deg: f64, lon_deg: f64, unix_seconds: i64) -> f64 {
    let sun = solar_position(unix_seconds);
    altitude_from_equatorial(
        sun.right_ascension_deg,
        sun.declination_deg,
        lat_deg,
        lon_deg,
        unix_seconds,
    )
}

pub fn classify_twilight(elevation_deg: f64) -> TwilightBand {
    if elevation_deg > 0.0 {
        TwilightBand::Day
    } else if elevation_deg > -6.0 {
        TwilightBand::Civil
    } else if elevation_deg > -12.0 {
        TwilightBand::Nautical
    } else if elevation_deg > -18.0 {
        TwilightBand::Astronomical
    } else {
        TwilightBand::Night
    }
}

/// Haversine distance on a spherical Earth (R = 6371 km).
pub fn haversine_distance_km(lat1: f64, lon1: f64, lat2: f64, lon2: f64) -> f64 {
    let lat1_rad = lat1.to_radians();
    let lat2_rad = lat2.to_radians();
    let delta_lat = (lat2 - lat1).to_radians();
    let delta_lon = (lon2 - lon1).to_radians();

    let a = (delta_lat / 2.0).sin().powi(2)
        + lat1_rad.cos() * lat2_rad.cos() * (delta_lon / 2.0).sin().powi(2);
    let c = 2.0 * a.sqrt().min(1.0).asin();

    EARTH_MEAN_RADIUS_KM * c
}

/// Forward azimuth from point 1 to point 2, degrees in [0, 360).
pub fn initial_bearing_deg(lat1: f64, lon1: f64, lat2: f64, lon2: f64) -> f64 {
    let lat1_rad = lat1.to_radians();
    let lat2_rad = lat2.to_radians();
    let delta_lon = (lon2 - lon1).to_radians();

    let x = delta_lon.sin() * lat2_rad.cos();
    let y = lat1_rad.cos() * lat2_rad.sin() - lat1_rad.sin() * lat2_rad.cos() * delta_lon.cos();

    unwind_deg(x.atan2(y).to_degrees())
}

/// 16-point compass name for a bearing.
pub fn cardinal_direction(bearing_deg: f64) -> &'static str {
    const POINTS: [&str; 16] = [
        "N", "NNE", "NE", "ENE", "E", "ESE", "SE", "SSE", "S", "SSW", "SW", "WSW", "W", "WNW",
        "NW", "NNW",
    ];
    let idx = ((unwind_deg(bearing_deg) + 11.25) / 22.5) as usize % 16;
    POINTS[idx]
}

/// Smallest angle between two directions, folded into [0, 180].
pub fn angular_offset_deg(a: f64, b: f64) -> f64 {
    let diff = unwind_deg(a - b);
    if diff > 180.0 {
        360.0 - diff
    } else {
        diff
    }
}

pub fn unwind_deg(x: f64) -> f64 {
    let r = x.rem_euclid(360.0);
    // rem_euclid can round up to exactly 360.0 for tiny negative inputs
    if r >= 360.0 {
        0.0
    } else {
        r
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn twilight_band_edges() {
        assert_eq!(classify_twilight(0.5), TwilightBand::Day);
        assert_eq!(classify_twilight(0.0), TwilightBand::Civil);
        assert_eq!(classify_twilight(-6.0), TwilightBand::Nautical);
        assert_eq!(classify_twilight(-12.0), TwilightBand::Astronomical);
        assert_eq!(classify_twilight(-18.0), TwilightBand::Night);
        assert_eq!(classify_twilight(-40.0), TwilightBand::Night);
    }

    #[test]
    fn solar_declination_near_solstice() {
        // 2024-06-20 20:51 UTC, June solstice
        let sun = solar_position(1_718_916_660);
        assert!((sun.declination_deg - 23.44).abs() < 0.1, "dec = {}", sun.declination_deg);
    }

    #[test]
    fn sun_high_at_local_noon_low_at_midnight() {
        // 2025-06-21 20:00 UTC is roughly local solar noon at Vandenberg
        let noon = solar_elevation(34.742, -120.5724, 1_750_536_000);
        assert!(noon > 70.0, "noon elevation = {noon}");
        let midnight = solar_elevation(34.742, -120.5724, 1_750_536_000 + 12 * 3600);
        assert!(midnight < -25.0, "midnight elevation = {midnight}");
    }

    #[test]
    fn elevation_stays_in_range() {
        for i in 0..48 {
            let t = 1_700_000_000 + i * 1800;
            for (lat, lon) in [(89.9, 0.0), (-89.9, 120.0), (0.0, -179.9), (45.0, 10.0)] {
                let e = solar_elevation(lat, lon, t);
                assert!((-90.0..=90.0).contains(&e));
            }
        }
    }

    #[test]
    fn vandenberg_to_los_angeles() {
        // Vandenberg SLC-4E to downtown LA is roughly 230 km
        let d = haversine_distance_km(34.632, -120.611, 34.0522, -118.2437);
        assert!((d - 227.0).abs() < 10.0, "distance = {d}");
        assert_eq!(haversine_distance_km(10.0, 10.0, 10.0, 10.0), 0.0);
    }

    #[test]
    fn bearing_cardinal_points() {
        assert!((initial_bearing_deg(0.0, 0.0, 1.0, 0.0) - 0.0).abs() < 1e-9);
        assert!((initial_bearing_deg(0.0, 0.0, 0.0, 1.0) - 90.0).abs() < 1e-9);
        assert!((initial_bearing_deg(1.0, 0.0, 0.0, 0.0) - 180.0).abs() < 1e-9);
        assert!((initial_bearing_deg(0.0, 1.0, 0.0, 0.0) - 270.0).abs() < 1e-9);
    }

    #[test]
    fn reverse_bearing_is_opposite() {
        let (lat1, lon1) = (34.0522, -118.2437);
        let (lat2, lon2) = (34.632, -120.611);
        let fwd = initial_bearing_deg(lat1, lon1, lat2, lon2);
        let back = initial_bearing_deg(lat2, lon2, lat1, lon1);
        // meridian convergence over ~230 km is about a degree and a half
        assert!((angular_offset_deg(fwd, back) - 180.0).abs() < 2.0);
    }

    #[test]
    fn offsets_and_compass() {
        assert_eq!(angular_offset_deg(350.0, 10.0), 20.0);
        assert_eq!(angular_offset_deg(90.0, 270.0), 180.0);
        assert_eq!(cardinal_direction(0.0), "N");
        assert_eq!(cardinal_direction(359.0), "N");
        assert_eq!(cardinal_direction(135.0), "SE");
        assert_eq!(cardinal_direction(290.0), "WNW");
        assert_eq!(unwind_deg(-30.0), 330.0);
    }
}
