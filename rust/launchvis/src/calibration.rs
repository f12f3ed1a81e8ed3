//! Calibration tables: launch sites, factor weights, range and timing tables.
//!
//! [`Calibration::default`] is the canonical set fitted to documented
//! sightings. A TOML file may replace any top-level section; see
//! [`Calibration::from_toml_str`].

use std::collections::BTreeMap;
use std::fs;
use std::path::Path;

use log::debug;
use serde::{Deserialize, Serialize};

use crate::astro::unwind_deg;
use crate::error::{ConfigError, Result};
use crate::mission::{azimuth_for_inclination, MissionCategory, RocketType};

const WEIGHT_SUM_TOLERANCE: f64 = 1e-6;

/// Lighting regime used to pick a maximum visible distance.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LightingCondition {
    Twilight,
    Night,
    Day,
}

impl LightingCondition {
    /// Twilight covers -18° to 0° inclusive; below is night, above is day.
    pub fn from_solar_elevation(elevation_deg: f64) -> Self {
        if elevation_deg > 0.0 {
            LightingCondition::Day
        } else if elevation_deg >= -18.0 {
            LightingCondition::Twilight
        } else {
            LightingCondition::Night
        }
    }
}

/// Static per-site corrections fitted from local sighting history.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VisibilityModifiers {
    /// Multiplicative clarity loss from typical humidity, 0-1.
    pub humidity_penalty: f64,
    /// Climatological cloud fraction, 0-1.
    pub typical_cloud_cover: f64,
    /// Marine-layer propensity, 0-1.
    pub coastal_fog_factor: f64,
    /// Sky-glow baseline subtracted from the obstruction score.
    pub light_pollution_base: f64,
}

/// Free-text advice shown for a site.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SiteTips {
    #[serde(default)]
    pub general: Vec<String>,
    #[serde(default)]
    pub starship: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LaunchSite {
    pub id: String,
    pub name: String,
    pub latitude: f64,
    pub longitude: f64,
    pub elevation_m: f64,
    /// IANA zone name, informational.
    pub timezone: String,
    pub utc_offset_hours: i32,
    #[serde(default)]
    pub observes_dst: bool,
    pub standard_abbrev: String,
    pub daylight_abbrev: String,
    pub default_azimuth_deg: f64,
    #[serde(default)]
    pub category_azimuths: BTreeMap<MissionCategory, f64>,
    pub bortle_class: u8,
    pub modifiers: VisibilityModifiers,
    /// Where to look, e.g. "toward the coast near Lompoc".
    pub landmark_hint: String,
    #[serde(default)]
    pub tips: SiteTips,
}

impl LaunchSite {
    /// Trajectory azimuth for a mission category: site override first, then
    /// the geometric azimuth for the category's inclination, then the default.
    pub fn azimuth_for(&self, category: MissionCategory) -> f64 {
        if let Some(az) = self.category_azimuths.get(&category) {
            return *az;
        }
        category
            .nominal_inclination_deg()
            .and_then(|inc| azimuth_for_inclination(inc, self.latitude))
            .map(|az| {
                if self.launches_southward() {
                    unwind_deg(180.0 - az)
                } else {
                    az
                }
            })
            .unwrap_or(self.default_azimuth_deg)
    }

    fn launches_southward(&self) -> bool {
        self.default_azimuth_deg > 90.0 && self.default_azimuth_deg < 270.0
    }
}

/// Relative importance of each factor. Must sum to 1.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Weights {
    pub cloud: f64,
    pub sun: f64,
    pub distance: f64,
    pub clarity: f64,
    pub plume: f64,
    pub bearing: f64,
    pub brightness: f64,
    pub obstruction: f64,
}

impl Weights {
    pub fn sum(&self) -> f64 {
        self.cloud
            + self.sun
            + self.distance
            + self.clarity
            + self.plume
            + self.bearing
            + self.brightness
            + self.obstruction
    }
}

impl Default for Weights {
    fn default() -> Self {
        Self {
            cloud: 0.35,
            sun: 0.25,
            distance: 0.15,
            clarity: 0.10,
            plume: 0.05,
            bearing: 0.04,
            brightness: 0.04,
            obstruction: 0.02,
        }
    }
}

/// One value per vehicle class. Keys are snake_case like every other
/// calibration field.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PerRocket<T> {
    pub falcon9: T,
    pub falcon_heavy: T,
    pub starship: T,
    pub small_rocket: T,
}

impl<T: Copy> PerRocket<T> {
    pub fn get(&self, rocket: RocketType) -> T {
        match rocket {
            RocketType::Falcon9 => self.falcon9,
            RocketType::FalconHeavy => self.falcon_heavy,
            RocketType::Starship => self.starship,
            RocketType::SmallRocket => self.small_rocket,
        }
    }
}

/// Maximum visible distance (km) by lighting and vehicle.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct MaxDistanceTable {
    pub twilight: PerRocket<f64>,
    pub night: PerRocket<f64>,
    pub day: PerRocket<f64>,
}

impl MaxDistanceTable {
    pub fn get(&self, lighting: LightingCondition, rocket: RocketType) -> f64 {
        match lighting {
            LightingCondition::Twilight => self.twilight.get(rocket),
            LightingCondition::Night => self.night.get(rocket),
            LightingCondition::Day => self.day.get(rocket),
        }
    }
}

impl Default for MaxDistanceTable {
    fn default() -> Self {
        // Twilight ranges rely on the sunlit plume above a dark observer.
        Self {
            twilight: PerRocket { falcon9: 1000.0, falcon_heavy: 1200.0, starship: 1500.0, small_rocket: 500.0 },
            night: PerRocket { falcon9: 600.0, falcon_heavy: 750.0, starship: 900.0, small_rocket: 300.0 },
            day: PerRocket { falcon9: 200.0, falcon_heavy: 250.0, starship: 400.0, small_rocket: 100.0 },
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RocketTiming {
    /// Seconds after liftoff before the vehicle clears local terrain and haze.
    pub time_to_visible_s: i64,
    /// How long the vehicle or plume stays visible, seconds.
    pub visible_duration_s: i64,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TimingTable(pub PerRocket<RocketTiming>);

impl TimingTable {
    pub fn get(&self, rocket: RocketType) -> RocketTiming {
        self.0.get(rocket)
    }
}

impl Default for TimingTable {
    fn default() -> Self {
        Self(PerRocket {
            falcon9: RocketTiming { time_to_visible_s: 90, visible_duration_s: 6 * 60 },
            falcon_heavy: RocketTiming { time_to_visible_s: 100, visible_duration_s: 7 * 60 },
            starship: RocketTiming { time_to_visible_s: 120, visible_duration_s: 8 * 60 },
            small_rocket: RocketTiming { time_to_visible_s: 60, visible_duration_s: 4 * 60 },
        })
    }
}

/// Scalar thresholds used by the sub-score calculators and the engine.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Thresholds {
    /// Altitude the plume must be seen at; an overcast deck below it is opaque.
    pub plume_altitude_m: f64,
    pub low_cloud_base_m: f64,
    pub optimal_band_min_km: f64,
    pub optimal_band_max_km: f64,
    pub optimal_band_boost: f64,
    pub confidence_margin: f64,
    pub variable_weather_margin: f64,
    pub variable_cloud_cover: f64,
    pub default_cloud_cover_pct: f64,
    pub default_surface_visibility_km: f64,
}

impl Thresholds {
    fn named(&self) -> [(&'static str, f64); 10] {
        [
            ("plume_altitude_m", self.plume_altitude_m),
            ("low_cloud_base_m", self.low_cloud_base_m),
            ("optimal_band_min_km", self.optimal_band_min_km),
            ("optimal_band_max_km", self.optimal_band_max_km),
            ("optimal_band_boost", self.optimal_band_boost),
            ("confidence_margin", self.confidence_margin),
            ("variable_weather_margin", self.variable_weather_margin),
            ("variable_cloud_cover", self.variable_cloud_cover),
            ("default_cloud_cover_pct", self.default_cloud_cover_pct),
            ("default_surface_visibility_km", self.default_surface_visibility_km),
        ]
    }
}

impl Default for Thresholds {
    fn default() -> Self {
        Self {
            plume_altitude_m: 40_000.0,
            low_cloud_base_m: 3_000.0,
            optimal_band_min_km: 130.0,
            optimal_band_max_km: 800.0,
            optimal_band_boost: 1.1,
            confidence_margin: 10.0,
            variable_weather_margin: 15.0,
            variable_cloud_cover: 0.35,
            default_cloud_cover_pct: 50.0,
            default_surface_visibility_km: 10.0,
        }
    }
}

/// Everything the engine needs besides per-call inputs.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Calibration {
    pub default_site: String,
    pub weights: Weights,
    pub max_distance: MaxDistanceTable,
    pub timing: TimingTable,
    pub thresholds: Thresholds,
    pub sites: Vec<LaunchSite>,
}

impl Default for Calibration {
    fn default() -> Self {
        Self {
            default_site: "vandenberg".to_string(),
            weights: Weights::default(),
            max_distance: MaxDistanceTable::default(),
            timing: TimingTable::default(),
            thresholds: Thresholds::default(),
            sites: default_sites(),
        }
    }
}

impl Calibration {
    /// Parse a TOML override. Omitted sections keep their canonical values.
    pub fn from_toml_str(s: &str) -> Result<Self> {
        let calibration: Calibration = toml::from_str(s).map_err(ConfigError::from)?;
        calibration.validate()?;
        debug!(
            "[calibration] loaded {} sites, default '{}'",
            calibration.sites.len(),
            calibration.default_site
        );
        Ok(calibration)
    }

    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let text = fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.display().to_string(),
            source,
        })?;
        Self::from_toml_str(&text)
    }

    pub fn validate(&self) -> Result<()> {
        let sum = self.weights.sum();
        if (sum - 1.0).abs() > WEIGHT_SUM_TOLERANCE {
            return Err(ConfigError::WeightSum(sum).into());
        }
        for lighting in [LightingCondition::Twilight, LightingCondition::Night, LightingCondition::Day] {
            for rocket in RocketType::ALL {
                let km = self.max_distance.get(lighting, rocket);
                if !(km > 0.0) {
                    return Err(ConfigError::MaxDistance { lighting, rocket, km }.into());
                }
            }
        }
        for rocket in RocketType::ALL {
            let timing = self.timing.get(rocket);
            for (field, seconds) in [
                ("time_to_visible_s", timing.time_to_visible_s),
                ("visible_duration_s", timing.visible_duration_s),
            ] {
                if seconds <= 0 {
                    return Err(ConfigError::Timing { rocket, field, seconds }.into());
                }
            }
        }
        if let Some((name, value)) = self.thresholds.named().into_iter().find(|(_, v)| !v.is_finite()) {
            return Err(ConfigError::Threshold { name, value }.into());
        }
        if self.site(&self.default_site).is_none() {
            return Err(ConfigError::UnknownDefaultSite(self.default_site.clone()).into());
        }
        Ok(())
    }

    pub fn site(&self, id: &str) -> Option<&LaunchSite> {
        self.sites.iter().find(|s| s.id.eq_ignore_ascii_case(id))
    }

    /// Site by id, falling back to the default site for unknown or missing ids.
    pub fn resolve_site(&self, id: Option<&str>) -> &LaunchSite {
        id.and_then(|id| self.site(id))
            .or_else(|| self.site(&self.default_site))
            .or_else(|| self.sites.first())
            .unwrap_or_else(|| &*FALLBACK_SITE)
    }

    pub fn max_visible_distance_km(&self, lighting: LightingCondition, rocket: RocketType) -> f64 {
        self.max_distance.get(lighting, rocket)
    }
}

// Used only when a hand-built Calibration has no sites at all.
static FALLBACK_SITE: std::sync::LazyLock<LaunchSite> = std::sync::LazyLock::new(vandenberg);

fn default_sites() -> Vec<LaunchSite> {
    vec![vandenberg(), cape_canaveral(), starbase()]
}

fn tips(items: &[&str]) -> Vec<String> {
    items.iter().map(|s| s.to_string()).collect()
}

fn vandenberg() -> LaunchSite {
    LaunchSite {
        id: "vandenberg".to_string(),
        name: "Vandenberg Space Force Base, CA".to_string(),
        latitude: 34.742,
        longitude: -120.5724,
        elevation_m: 112.0,
        timezone: "America/Los_Angeles".to_string(),
        utc_offset_hours: -8,
        observes_dst: true,
        standard_abbrev: "PST".to_string(),
        daylight_abbrev: "PDT".to_string(),
        default_azimuth_deg: 180.0,
        category_azimuths: BTreeMap::from([
            (MissionCategory::Starlink, 150.0),
            (MissionCategory::NationalSecurity, 185.0),
            (MissionCategory::Rideshare, 193.0),
            (MissionCategory::SdaTranche, 175.0),
            (MissionCategory::SunSynchronous, 195.0),
            (MissionCategory::Iridium, 183.0),
        ]),
        bortle_class: 3,
        modifiers: VisibilityModifiers {
            humidity_penalty: 0.15,
            typical_cloud_cover: 0.40,
            coastal_fog_factor: 0.35,
            light_pollution_base: 0.10,
        },
        landmark_hint: "over the coast near Lompoc".to_string(),
        tips: SiteTips {
            general: tips(&[
                "Marine layer often burns off inland first; Santa Barbara and the Santa Ynez valley frequently clear before the coast.",
                "From Los Angeles, look west-northwest a minute or two after liftoff as the vehicle climbs above the coastal haze.",
            ]),
            starship: Vec::new(),
        },
    }
}

fn cape_canaveral() -> LaunchSite {
    LaunchSite {
        id: "cape-canaveral".to_string(),
        name: "Cape Canaveral Space Force Station, FL".to_string(),
        latitude: 28.5623,
        longitude: -80.5774,
        elevation_m: 3.0,
        timezone: "America/New_York".to_string(),
        utc_offset_hours: -5,
        observes_dst: true,
        standard_abbrev: "EST".to_string(),
        daylight_abbrev: "EDT".to_string(),
        default_azimuth_deg: 90.0,
        category_azimuths: BTreeMap::from([
            (MissionCategory::Starlink, 45.0),
            (MissionCategory::Crew, 44.0),
            (MissionCategory::Iss, 44.0),
            (MissionCategory::NationalSecurity, 90.0),
            (MissionCategory::Rideshare, 150.0),
            (MissionCategory::SunSynchronous, 150.0),
        ]),
        bortle_class: 4,
        modifiers: VisibilityModifiers {
            humidity_penalty: 0.20,
            typical_cloud_cover: 0.30,
            coastal_fog_factor: 0.10,
            light_pollution_base: 0.15,
        },
        landmark_hint: "toward the Space Coast".to_string(),
        tips: SiteTips {
            general: tips(&[
                "Afternoon thunderstorms are common in summer; evening and night launches tend to have clearer skies.",
                "Beach viewing from Cocoa Beach or Jetty Park gives an unobstructed eastern horizon.",
            ]),
            starship: tips(&[
                "Starship's plume is far larger than Falcon 9's; expect it to stay visible well after staging.",
            ]),
        },
    }
}

fn starbase() -> LaunchSite {
    LaunchSite {
        id: "starbase".to_string(),
        name: "Starbase, Boca Chica, TX".to_string(),
        latitude: 25.9971,
        longitude: -97.1554,
        elevation_m: 5.0,
        timezone: "America/Chicago".to_string(),
        utc_offset_hours: -6,
        observes_dst: true,
        standard_abbrev: "CST".to_string(),
        daylight_abbrev: "CDT".to_string(),
        default_azimuth_deg: 97.0,
        category_azimuths: BTreeMap::from([(MissionCategory::Starship, 97.0)]),
        bortle_class: 2,
        modifiers: VisibilityModifiers {
            humidity_penalty: 0.15,
            typical_cloud_cover: 0.35,
            coastal_fog_factor: 0.15,
            light_pollution_base: 0.05,
        },
        landmark_hint: "toward Boca Chica beach".to_string(),
        tips: SiteTips {
            general: tips(&[
                "South Padre Island and the Port Isabel causeway are the closest public viewpoints.",
            ]),
            starship: tips(&[
                "Starship climbs slowly off the pad; the first minute is the most dramatic from close range.",
                "Booster boostback and the hot-staging ring are often visible as a separate bright point after staging.",
            ]),
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::Error;

    #[test]
    fn default_weights_sum_to_one() {
        assert!((Weights::default().sum() - 1.0).abs() < 1e-12);
        assert!(Calibration::default().validate().is_ok());
    }

    #[test]
    fn lighting_boundaries() {
        assert_eq!(LightingCondition::from_solar_elevation(0.1), LightingCondition::Day);
        assert_eq!(LightingCondition::from_solar_elevation(0.0), LightingCondition::Twilight);
        assert_eq!(LightingCondition::from_solar_elevation(-18.0), LightingCondition::Twilight);
        assert_eq!(LightingCondition::from_solar_elevation(-18.1), LightingCondition::Night);
    }

    #[test]
    fn twilight_range_dwarfs_daytime() {
        let table = MaxDistanceTable::default();
        for rocket in RocketType::ALL {
            assert!(
                table.get(LightingCondition::Twilight, rocket) > table.get(LightingCondition::Night, rocket)
            );
            assert!(table.get(LightingCondition::Night, rocket) > table.get(LightingCondition::Day, rocket));
        }
        assert_eq!(table.get(LightingCondition::Twilight, RocketType::Falcon9), 1000.0);
        assert_eq!(table.get(LightingCondition::Day, RocketType::Falcon9), 200.0);
        assert_eq!(table.get(LightingCondition::Twilight, RocketType::Starship), 1500.0);
    }

    #[test]
    fn unknown_site_falls_back_to_default() {
        let cal = Calibration::default();
        assert_eq!(cal.resolve_site(Some("kourou")).id, "vandenberg");
        assert_eq!(cal.resolve_site(None).id, "vandenberg");
        assert_eq!(cal.resolve_site(Some("Cape-Canaveral")).id, "cape-canaveral");
    }

    #[test]
    fn empty_site_list_still_resolves() {
        let cal = Calibration { sites: Vec::new(), ..Calibration::default() };
        assert_eq!(cal.resolve_site(Some("starbase")).id, "vandenberg");
    }

    #[test]
    fn category_azimuth_from_inclination() {
        let cal = Calibration::default();
        let cape = cal.site("cape-canaveral").unwrap();
        // no Iridium override at the Cape: derived, northbound, near-polar
        let az = cape.azimuth_for(MissionCategory::Iridium);
        assert!(az < 10.0, "azimuth = {az}");

        let vandenberg = cal.site("vandenberg").unwrap();
        // Crew has no Vandenberg override; mirrored to the southern solution
        let crew = vandenberg.azimuth_for(MissionCategory::Crew);
        assert!(crew > 90.0 && crew < 180.0, "azimuth = {crew}");
        // no inclination at all: site default
        assert_eq!(vandenberg.azimuth_for(MissionCategory::Starship), 180.0);
    }

    #[test]
    fn partial_toml_keeps_other_sections() {
        let cal = Calibration::from_toml_str(
            r#"
            [thresholds]
            plume_altitude_m = 35000.0
            "#,
        )
        .unwrap();
        assert_eq!(cal.thresholds.plume_altitude_m, 35_000.0);
        assert_eq!(cal.thresholds.low_cloud_base_m, 3_000.0);
        assert_eq!(cal.weights, Weights::default());
        assert_eq!(cal.sites.len(), 3);
    }

    #[test]
    fn bad_weights_rejected() {
        let err = Calibration::from_toml_str(
            r#"
            [weights]
            cloud = 0.5
            sun = 0.5
            distance = 0.5
            clarity = 0.0
            plume = 0.0
            bearing = 0.0
            brightness = 0.0
            obstruction = 0.0
            "#,
        )
        .unwrap_err();
        assert!(matches!(err, Error::Config(ConfigError::WeightSum(s)) if (s - 1.5).abs() < 1e-9));
    }

    #[test]
    fn non_positive_timing_rejected() {
        let mut cal = Calibration::default();
        cal.timing.0.starship.time_to_visible_s = -30;
        let err = cal.validate().unwrap_err();
        assert!(matches!(
            err,
            Error::Config(ConfigError::Timing { rocket: RocketType::Starship, field: "time_to_visible_s", seconds: -30 })
        ));

        let mut cal = Calibration::default();
        cal.timing.0.falcon9.visible_duration_s = 0;
        assert!(matches!(
            cal.validate(),
            Err(Error::Config(ConfigError::Timing { field: "visible_duration_s", .. }))
        ));
    }

    #[test]
    fn non_finite_threshold_rejected() {
        let mut cal = Calibration::default();
        cal.thresholds.optimal_band_boost = f64::NAN;
        assert!(matches!(
            cal.validate(),
            Err(Error::Config(ConfigError::Threshold { name: "optimal_band_boost", .. }))
        ));

        let err = Calibration::from_toml_str("[thresholds]\nplume_altitude_m = inf\n").unwrap_err();
        assert!(matches!(err, Error::Config(ConfigError::Threshold { name: "plume_altitude_m", .. })));
    }

    #[test]
    fn per_rocket_keys_are_snake_case() {
        let cal = Calibration::from_toml_str(
            r#"
            [timing.falcon_heavy]
            time_to_visible_s = 110
            visible_duration_s = 400

            [timing.falcon9]
            time_to_visible_s = 90
            visible_duration_s = 360

            [timing.starship]
            time_to_visible_s = 120
            visible_duration_s = 480

            [timing.small_rocket]
            time_to_visible_s = 60
            visible_duration_s = 240
            "#,
        )
        .unwrap();
        assert_eq!(cal.timing.get(RocketType::FalconHeavy).time_to_visible_s, 110);
        assert_eq!(cal.timing.get(RocketType::SmallRocket).visible_duration_s, 240);
    }

    #[test]
    fn unknown_default_site_rejected() {
        let err = Calibration::from_toml_str("default_site = \"baikonur\"").unwrap_err();
        assert!(matches!(err, Error::Config(ConfigError::UnknownDefaultSite(_))));
    }

    #[test]
    fn malformed_toml_is_a_parse_error() {
        let err = Calibration::from_toml_str("weights = [").unwrap_err();
        assert!(matches!(err, Error::Config(ConfigError::Parse(_))));
    }
}
