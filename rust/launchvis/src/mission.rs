//! Mission-name heuristics: which vehicle is flying and which way it heads.
//!
//! Launch schedules give a free-text mission name and little else, so vehicle
//! and ground-track direction are inferred from naming conventions. The scoring
//! engine only sees the [`MissionClassifier`] trait, so a lookup table or a
//! smarter model can replace [`KeywordClassifier`] without touching the math.

use serde::{Deserialize, Serialize};

use crate::calibration::LaunchSite;

/// Vehicle class, which drives plume size, brightness and range tables.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum RocketType {
    Falcon9,
    FalconHeavy,
    Starship,
    SmallRocket,
}

impl RocketType {
    pub const ALL: [RocketType; 4] = [
        RocketType::Falcon9,
        RocketType::FalconHeavy,
        RocketType::Starship,
        RocketType::SmallRocket,
    ];

    pub fn display_name(self) -> &'static str {
        match self {
            RocketType::Falcon9 => "Falcon 9",
            RocketType::FalconHeavy => "Falcon Heavy",
            RocketType::Starship => "Starship",
            RocketType::SmallRocket => "small-lift rocket",
        }
    }
}

/// Orbit family a mission name points at. Sites override the trajectory
/// azimuth per category. Serialized camelCase like the rest of the result;
/// calibration files may also spell keys in snake_case.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum MissionCategory {
    Starlink,
    #[serde(alias = "national_security")]
    NationalSecurity,
    Rideshare,
    #[serde(alias = "sda_tranche")]
    SdaTranche,
    Crew,
    Iss,
    #[serde(alias = "sun_synchronous")]
    SunSynchronous,
    Iridium,
    Starship,
}

impl MissionCategory {
    /// Nominal orbital inclination, degrees.
    pub fn nominal_inclination_deg(self) -> Option<f64> {
        match self {
            MissionCategory::Starlink => Some(53.0),
            MissionCategory::Crew | MissionCategory::Iss => Some(51.6),
            MissionCategory::Rideshare | MissionCategory::SunSynchronous => Some(97.5),
            MissionCategory::Iridium => Some(86.4),
            MissionCategory::SdaTranche => Some(81.0),
            MissionCategory::NationalSecurity | MissionCategory::Starship => None,
        }
    }
}

// Payload brands that fly almost exclusively to sun-synchronous orbit.
const SSO_BRANDS: [&str; 8] = [
    "planet", "spire", "swarm", "worldview", "landsat", "sentinel", "capella", "iceye",
];

/// Narrow seam between free-text mission names and the scoring engine.
pub trait MissionClassifier {
    fn rocket_type(&self, mission_name: &str) -> RocketType;

    fn category(&self, mission_name: &str) -> Option<MissionCategory>;

    /// Ground-track azimuth in degrees for this mission from `site`.
    fn launch_azimuth(&self, mission_name: &str, site: &LaunchSite) -> f64 {
        match self.category(mission_name) {
            Some(category) => site.azimuth_for(category),
            None => site.default_azimuth_deg,
        }
    }

    fn is_crewed(&self, mission_name: &str) -> bool;
}

/// Case-insensitive substring matching on mission names.
#[derive(Debug, Clone, Copy, Default)]
pub struct KeywordClassifier;

impl MissionClassifier for KeywordClassifier {
    fn rocket_type(&self, mission_name: &str) -> RocketType {
        let name = mission_name.to_lowercase();
        if name.contains("falcon heavy") || has_word(&name, "fh") {
            RocketType::FalconHeavy
        } else if name.contains("starship") {
            RocketType::Starship
        } else if name.contains("electron") || name.contains("rocket lab") {
            RocketType::SmallRocket
        } else {
            RocketType::Falcon9
        }
    }

    fn category(&self, mission_name: &str) -> Option<MissionCategory> {
        let name = mission_name.to_lowercase();
        let category = if name.contains("starship") {
            MissionCategory::Starship
        } else if name.contains("starlink") {
            MissionCategory::Starlink
        } else if name.contains("nrol") || name.contains("usa-") {
            MissionCategory::NationalSecurity
        } else if name.contains("transporter") || name.contains("bandwagon") {
            MissionCategory::Rideshare
        } else if name.contains("sda") || name.contains("tranche") {
            MissionCategory::SdaTranche
        } else if name.contains("crew") || name.contains("dragon") || name.contains("axiom") {
            MissionCategory::Crew
        } else if has_word(&name, "iss") || name.contains("crs-") || name.contains("cygnus") {
            MissionCategory::Iss
        } else if name.contains("iridium") {
            MissionCategory::Iridium
        } else if SSO_BRANDS.iter().any(|brand| name.contains(brand)) {
            MissionCategory::SunSynchronous
        } else {
            return None;
        };
        Some(category)
    }

    fn is_crewed(&self, mission_name: &str) -> bool {
        let name = mission_name.to_lowercase();
        ["crew", "axiom", "ax-", "polaris", "inspiration4", "fram2"]
            .iter()
            .any(|k| name.contains(k))
            // Cargo Dragon (CRS) is uncrewed
            && !name.contains("crs-")
    }
}

/// Launch azimuth that reaches `inclination_deg` from `latitude_deg`, using
/// sin(az) = cos(i) / cos(lat). Returns the northbound solution in [0, 360),
/// or `None` when the inclination is lower than the site latitude.
pub fn azimuth_for_inclination(inclination_deg: f64, latitude_deg: f64) -> Option<f64> {
    let ratio = inclination_deg.to_radians().cos() / latitude_deg.to_radians().cos();
    if !(-1.0..=1.0).contains(&ratio) {
        return None;
    }
    Some(crate::astro::unwind_deg(ratio.asin().to_degrees()))
}

fn has_word(haystack: &str, word: &str) -> bool {
    haystack
        .split(|c: char| !c.is_ascii_alphanumeric())
        .any(|token| token == word)
}
