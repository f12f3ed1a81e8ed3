//! Request and result types. Everything here crosses the C ABI as JSON, so
//! field names are camelCase on the wire.

use serde::{Deserialize, Serialize};

use crate::astro::TwilightBand;
use crate::calibration::{LightingCondition, Weights};
use crate::mission::{MissionCategory, RocketType};

// Dry-adiabatic lapse approximation: cloud base rises ~125 m per °C of spread.
const CLOUD_BASE_M_PER_DEG_SPREAD: f64 = 125.0;

/// Where the observer stands.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ViewingLocation {
    pub latitude: f64,
    pub longitude: f64,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub elevation_m: Option<f64>,
    #[serde(default)]
    pub is_urban: Option<bool>,
}

/// Weather at one point. Every field may be missing.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct WeatherSnapshot {
    /// Total cloud cover, percent.
    pub cloud_cover_pct: Option<f64>,
    /// Cloud base above ground, metres.
    pub cloud_base_m: Option<f64>,
    pub surface_visibility_km: Option<f64>,
    pub aqi: Option<f64>,
    /// Wind speed near 10 km (~250 hPa), m/s.
    pub upper_wind_speed_ms: Option<f64>,
    /// Relative humidity near 10 km, percent.
    pub upper_humidity_pct: Option<f64>,
    pub temperature_c: Option<f64>,
    pub dew_point_c: Option<f64>,
}

impl WeatherSnapshot {
    /// Reported cloud base, or one estimated from the surface dew-point spread.
    pub fn cloud_base_or_estimate(&self) -> Option<f64> {
        self.cloud_base_m.or_else(|| match (self.temperature_c, self.dew_point_c) {
            (Some(t), Some(td)) => Some(((t - td).max(0.0)) * CLOUD_BASE_M_PER_DEG_SPREAD),
            _ => None,
        })
    }
}

/// Input to [`crate::VisibilityEngine::calculate_visibility`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VisibilityRequest {
    pub launch_time_unix: i64,
    pub mission_name: String,
    #[serde(default)]
    pub weather_launch_site: WeatherSnapshot,
    #[serde(default)]
    pub weather_viewing: WeatherSnapshot,
    #[serde(default)]
    pub viewing_location: Option<ViewingLocation>,
    #[serde(default)]
    pub site_id: Option<String>,
}

/// Per-factor scores, each in [0, 1].
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SubScores {
    pub cloud: f64,
    pub sun: f64,
    pub distance: f64,
    pub bearing: f64,
    pub clarity: f64,
    pub plume: f64,
    pub brightness: f64,
    pub obstruction: f64,
}

impl SubScores {
    pub fn weighted_sum(&self, w: &Weights) -> f64 {
        self.cloud * w.cloud
            + self.sun * w.sun
            + self.distance * w.distance
            + self.clarity * w.clarity
            + self.plume * w.plume
            + self.bearing * w.bearing
            + self.brightness * w.brightness
            + self.obstruction * w.obstruction
    }

    pub fn get(&self, factor: Factor) -> f64 {
        match factor {
            Factor::Cloud => self.cloud,
            Factor::Sun => self.sun,
            Factor::Distance => self.distance,
            Factor::Bearing => self.bearing,
            Factor::Clarity => self.clarity,
            Factor::Plume => self.plume,
            Factor::Brightness => self.brightness,
            Factor::Obstruction => self.obstruction,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Factor {
    Cloud,
    Sun,
    Distance,
    Bearing,
    Clarity,
    Plume,
    Brightness,
    Obstruction,
}

impl Factor {
    pub fn weight(self, w: &Weights) -> f64 {
        match self {
            Factor::Cloud => w.cloud,
            Factor::Sun => w.sun,
            Factor::Distance => w.distance,
            Factor::Bearing => w.bearing,
            Factor::Clarity => w.clarity,
            Factor::Plume => w.plume,
            Factor::Brightness => w.brightness,
            Factor::Obstruction => w.obstruction,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Rating {
    Poor,
    Fair,
    Good,
    Excellent,
}

impl Rating {
    pub fn from_percentage(pct: u8) -> Self {
        match pct {
            75.. => Rating::Excellent,
            50..=74 => Rating::Good,
            30..=49 => Rating::Fair,
            _ => Rating::Poor,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Major,
    Minor,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LimitingFactor {
    pub factor: Factor,
    pub description: String,
    pub severity: Severity,
    pub score: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ConfidenceInterval {
    pub low: u8,
    pub high: u8,
    pub margin: u8,
}

/// When to look. Start and end are absent when the sky is too bright.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ViewingWindow {
    pub start_unix: Option<i64>,
    pub end_unix: Option<i64>,
    pub start_local: Option<String>,
    pub end_local: Option<String>,
    pub description: String,
}

/// Inputs and intermediate values behind a score, for display.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RawData {
    pub site_id: String,
    pub site_name: String,
    pub solar_elevation_deg: f64,
    pub twilight: TwilightBand,
    pub lighting: LightingCondition,
    pub rocket_type: RocketType,
    pub mission_category: Option<MissionCategory>,
    pub crewed: bool,
    pub trajectory_azimuth_deg: f64,
    pub bearing_offset_deg: f64,
    pub max_visible_distance_km: f64,
    pub cloud_cover_pct: f64,
    pub cloud_base_m: Option<f64>,
    pub surface_visibility_km: f64,
    pub aqi: Option<f64>,
    pub upper_wind_speed_ms: Option<f64>,
    pub upper_humidity_pct: Option<f64>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VisibilityResult {
    pub percentage: u8,
    pub rating: Rating,
    pub confidence: ConfidenceInterval,
    pub sub_scores: SubScores,
    pub weights: Weights,
    pub raw: RawData,
    pub limiting_factors: Vec<LimitingFactor>,
    pub viewing_window: ViewingWindow,
    pub recommendations: Vec<String>,
    pub viewer: ViewingLocation,
    pub distance_km: f64,
    pub bearing_deg: f64,
    /// Compass point toward the site; `None` when the viewer is at the pad.
    pub direction: Option<String>,
    pub fatal_blocker: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rating_thresholds() {
        assert_eq!(Rating::from_percentage(100), Rating::Excellent);
        assert_eq!(Rating::from_percentage(75), Rating::Excellent);
        assert_eq!(Rating::from_percentage(74), Rating::Good);
        assert_eq!(Rating::from_percentage(50), Rating::Good);
        assert_eq!(Rating::from_percentage(30), Rating::Fair);
        assert_eq!(Rating::from_percentage(29), Rating::Poor);
        assert_eq!(Rating::from_percentage(0), Rating::Poor);
    }

    #[test]
    fn cloud_base_estimate_from_spread() {
        let w = WeatherSnapshot {
            temperature_c: Some(18.0),
            dew_point_c: Some(14.0),
            ..Default::default()
        };
        assert_eq!(w.cloud_base_or_estimate(), Some(500.0));

        let reported = WeatherSnapshot { cloud_base_m: Some(2200.0), ..w };
        assert_eq!(reported.cloud_base_or_estimate(), Some(2200.0));
        assert_eq!(WeatherSnapshot::default().cloud_base_or_estimate(), None);
    }

    #[test]
    fn request_accepts_sparse_json() {
        let req: VisibilityRequest = serde_json::from_str(
            r#"{"launchTimeUnix": 1700000000, "missionName": "Starlink 6-1"}"#,
        )
        .unwrap();
        assert_eq!(req.weather_viewing, WeatherSnapshot::default());
        assert!(req.viewing_location.is_none());
        assert!(req.site_id.is_none());
    }
}
