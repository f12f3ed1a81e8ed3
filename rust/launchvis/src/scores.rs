//! Per-factor visibility scores. Each calculator maps raw measurements and
//! calibration constants to [0, 1]; the cloud calculator can also veto the
//! whole prediction.

use crate::astro::angular_offset_deg;
use crate::calibration::Thresholds;
use crate::mission::RocketType;

/// Why a factor scored the way it did, when that needs saying.
#[derive(Debug, Clone, PartialEq)]
pub enum ScoreReason {
    /// The condition alone makes the launch invisible.
    Fatal(String),
    Caution(String),
}

#[derive(Debug, Clone, PartialEq)]
pub struct CloudScore {
    pub score: f64,
    pub reason: Option<ScoreReason>,
}

impl CloudScore {
    pub fn is_fatal(&self) -> bool {
        matches!(self.reason, Some(ScoreReason::Fatal(_)))
    }

    pub fn caution(&self) -> Option<&str> {
        match &self.reason {
            Some(ScoreReason::Caution(msg)) => Some(msg.as_str()),
            _ => None,
        }
    }
}

/// `cloud_cover_pct` in 0-100; `cloud_base_m` unknown is treated as below the
/// plume altitude, since real decks always are.
pub fn cloud_score(cloud_cover_pct: f64, cloud_base_m: Option<f64>, t: &Thresholds) -> CloudScore {
    let fraction = (cloud_cover_pct / 100.0).clamp(0.0, 1.0);
    let below_plume = cloud_base_m.map_or(true, |base| base < t.plume_altitude_m);

    if fraction > 0.8 && below_plume {
        return CloudScore {
            score: 0.0,
            reason: Some(ScoreReason::Fatal(format!(
                "{:.0}% cloud cover below the plume altitude: the sky is effectively opaque",
                fraction * 100.0
            ))),
        };
    }

    if let Some(base) = cloud_base_m {
        if base < t.low_cloud_base_m && fraction > 0.6 {
            return CloudScore {
                score: 0.2 * (1.0 - fraction),
                reason: Some(ScoreReason::Caution(format!(
                    "Heavy low cloud deck ({:.0}% at {:.0} m) will hide most of the ascent",
                    fraction * 100.0,
                    base
                ))),
            };
        }
    }

    let reason = (fraction > 0.5).then(|| {
        ScoreReason::Caution(format!(
            "{:.0}% cloud cover: you may only catch the rocket through gaps",
            fraction * 100.0
        ))
    });
    CloudScore { score: 1.0 - fraction, reason }
}

/// Step function over twilight bands, peaking in nautical twilight when the
/// plume is sunlit against a dark sky.
pub fn sun_score(solar_elevation_deg: f64) -> f64 {
    let e = solar_elevation_deg;
    if (-12.0..=-6.0).contains(&e) {
        1.0
    } else if e > -6.0 && e <= -3.0 {
        0.95
    } else if e > -3.0 && e <= 0.0 {
        0.85
    } else if (-18.0..-12.0).contains(&e) {
        0.85
    } else if e < -18.0 {
        0.65
    } else if e <= 6.0 {
        // golden hour
        0.30
    } else if e <= 30.0 {
        0.15
    } else {
        0.05
    }
}

/// Linear decay to zero at `max_visible_km`, boosted inside the optimal band.
pub fn distance_score(distance_km: f64, max_visible_km: f64, t: &Thresholds) -> f64 {
    if distance_km <= 0.0 || distance_km > max_visible_km || max_visible_km <= 0.0 {
        return 0.0;
    }
    let base = 1.0 - distance_km / max_visible_km;
    if (t.optimal_band_min_km..=t.optimal_band_max_km).contains(&distance_km) {
        (base * t.optimal_band_boost).min(1.0)
    } else {
        base
    }
}

/// Broadside views (45°-135° between line of sight and ground track) score 1;
/// head-on or tail-on views fall linearly to 0.6.
pub fn bearing_score(bearing_to_site_deg: f64, trajectory_azimuth_deg: f64) -> f64 {
    let offset = angular_offset_deg(bearing_to_site_deg, trajectory_azimuth_deg);
    if (45.0..=135.0).contains(&offset) {
        1.0
    } else if offset < 45.0 {
        0.6 + 0.4 * offset / 45.0
    } else {
        0.6 + 0.4 * (180.0 - offset) / 45.0
    }
}

pub fn clarity_score(surface_visibility_km: f64, aqi: Option<f64>, humidity_penalty: f64) -> f64 {
    let base = ((surface_visibility_km - 5.0) / 35.0).clamp(0.0, 1.0);
    let aqi_factor = match aqi {
        None => 1.0,
        Some(a) if a <= 50.0 => 1.0,
        Some(a) if a <= 100.0 => 0.9,
        Some(a) if a <= 150.0 => 0.7,
        Some(a) if a <= 200.0 => 0.4,
        Some(_) => 0.2,
    };
    (base * aqi_factor * (1.0 - humidity_penalty.clamp(0.0, 1.0))).clamp(0.0, 1.0)
}

const PLUME_UNKNOWN: f64 = 0.6;

/// Plume persistence from upper-level humidity and wind near 10 km.
pub fn plume_score(upper_humidity_pct: Option<f64>, upper_wind_speed_ms: Option<f64>) -> f64 {
    if upper_humidity_pct.is_none() && upper_wind_speed_ms.is_none() {
        return PLUME_UNKNOWN;
    }
    let humidity = upper_humidity_pct.map_or(PLUME_UNKNOWN, |rh| match rh {
        rh if rh >= 70.0 => 0.9,
        rh if rh >= 50.0 => 0.7,
        rh if rh >= 30.0 => 0.5,
        _ => 0.3,
    });
    // moderate shear spreads the plume without tearing it apart
    let wind = upper_wind_speed_ms.map_or(PLUME_UNKNOWN, |w| match w {
        w if (10.0..=25.0).contains(&w) => 1.0,
        w if (5.0..10.0).contains(&w) => 0.8,
        w if w > 25.0 && w <= 40.0 => 0.7,
        w if w < 5.0 => 0.6,
        _ => 0.4,
    });
    (humidity + wind) / 2.0
}

pub fn brightness_score(mission_name: &str, rocket: RocketType, crewed: bool) -> f64 {
    let mut score: f64 = match rocket {
        RocketType::Falcon9 => 0.85,
        RocketType::FalconHeavy => 0.95,
        RocketType::Starship => 1.0,
        RocketType::SmallRocket => 0.4,
    };
    if rocket == RocketType::Falcon9 && mission_name.to_lowercase().contains("starlink") {
        score = 0.8;
    }
    if crewed {
        score += 0.1;
    }
    score.min(1.0)
}

pub fn obstruction_score(
    is_urban: bool,
    viewer_elevation_m: Option<f64>,
    light_pollution_base: f64,
) -> f64 {
    let mut score = 1.0;
    if is_urban {
        score -= 0.2;
    }
    score -= light_pollution_base;
    match viewer_elevation_m {
        Some(e) if e > 1000.0 => score = (score + 0.1).min(1.0),
        Some(e) if e < 100.0 => score -= 0.05,
        _ => {}
    }
    score.clamp(0.0, 1.0)
}
