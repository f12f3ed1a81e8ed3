use std::ffi::{c_char, CStr, CString};
use std::sync::{Once, OnceLock};

use log::{debug, error, info, warn};

pub mod astro;
pub mod calibration;
pub mod engine;
pub mod error;
pub mod local_time;
pub mod mission;
pub mod model;
pub mod scores;

pub use astro::{classify_twilight, haversine_distance_km, initial_bearing_deg, solar_elevation, TwilightBand};
pub use calibration::{Calibration, LaunchSite, LightingCondition, VisibilityModifiers, Weights};
pub use engine::VisibilityEngine;
pub use error::{ConfigError, Error, RequestError, Result};
pub use mission::{KeywordClassifier, MissionCategory, MissionClassifier, RocketType};
pub use model::{
    Rating, SubScores, ViewingLocation, ViewingWindow, VisibilityRequest, VisibilityResult,
    WeatherSnapshot,
};

/// Path to a TOML calibration override used by the C ABI.
pub const CALIBRATION_ENV: &str = "LAUNCHVIS_CALIBRATION";

// ---------- Logging ----------
static INIT_LOGGER: Once = Once::new();

#[cfg(target_os = "android")]
fn init_logger() {
    use android_logger::Config;
    use log::LevelFilter;
    INIT_LOGGER.call_once(|| {
        android_logger::init_once(
            Config::default()
                .with_max_level(LevelFilter::Info)
                .with_tag("launchvis"),
        );
    });
}

#[cfg(not(target_os = "android"))]
fn init_logger() {
    INIT_LOGGER.call_once(|| {
        let _ = env_logger::Builder::new()
            .filter_level(log::LevelFilter::Info)
            .parse_default_env()
            .try_init();
    });
}

// ---------- Shared engine ----------
static ENGINE: OnceLock<VisibilityEngine> = OnceLock::new();

fn shared_engine() -> &'static VisibilityEngine {
    ENGINE.get_or_init(|| {
        let calibration = match std::env::var(CALIBRATION_ENV) {
            Ok(path) => match Calibration::load(&path) {
                Ok(c) => {
                    info!("[shared_engine] calibration loaded from {}", path);
                    c
                }
                Err(e) => {
                    warn!("[shared_engine] {}; using built-in calibration", e);
                    Calibration::default()
                }
            },
            Err(_) => Calibration::default(),
        };
        VisibilityEngine::new(calibration)
    })
}

// ---------- C ABI ----------
#[no_mangle]
pub extern "C" fn free_json(ptr: *mut c_char) {
    if ptr.is_null() { return; }
    unsafe { let _ = CString::from_raw(ptr); }
}

/// Score a launch. `request_json` is a UTF-8 JSON [`VisibilityRequest`]; the
/// returned string is a JSON [`VisibilityResult`] or `{"error": "..."}` and
/// must be released with [`free_json`].
#[no_mangle]
pub extern "C" fn calculate_visibility_json(request_json: *const c_char) -> *mut c_char {
    init_logger();
    let json = match decode_request(request_json)
        .and_then(|req| score_request(shared_engine(), &req))
    {
        Ok(json) => json,
        Err(e) => {
            error!("[calculate_visibility_json] {}", e);
            error_json(&e.to_string())
        }
    };
    into_c_string(json)
}

/// Sun elevation in degrees at (lat, lon) and a unix time.
#[no_mangle]
pub extern "C" fn solar_elevation_deg(lat: f64, lon: f64, unix_seconds: i64) -> f64 {
    solar_elevation(lat, lon, unix_seconds)
}

/// Map radius (km) within which this mission may be visible from a point
/// whose sky matches (lat, lon) at `unix_seconds`. Returns 0 on bad input.
#[no_mangle]
pub extern "C" fn visibility_radius_km(
    mission_name: *const c_char,
    lat: f64,
    lon: f64,
    unix_seconds: i64,
) -> f64 {
    init_logger();
    match read_c_str(mission_name, "mission_name") {
        Ok(name) => {
            let radius = shared_engine().visibility_radius_km(&name, lat, lon, unix_seconds);
            debug!("[visibility_radius_km] '{}' at ({}, {}): {:.0} km", name, lat, lon, radius);
            radius
        }
        Err(e) => {
            error!("[visibility_radius_km] {}", e);
            0.0
        }
    }
}

fn decode_request(ptr: *const c_char) -> Result<VisibilityRequest> {
    let text = read_c_str(ptr, "request_json")?;
    let request = serde_json::from_str(&text).map_err(RequestError::from)?;
    Ok(request)
}

fn score_request<C: MissionClassifier>(engine: &VisibilityEngine<C>, request: &VisibilityRequest) -> Result<String> {
    let result = engine.calculate_visibility(request);
    let json = serde_json::to_string(&result).map_err(RequestError::from)?;
    Ok(json)
}

fn read_c_str(ptr: *const c_char, what: &'static str) -> Result<String> {
    if ptr.is_null() {
        return Err(RequestError::NullPointer(what).into());
    }
    let s = unsafe { CStr::from_ptr(ptr) };
    s.to_str()
        .map(str::to_owned)
        .map_err(|_| RequestError::InvalidUtf8(what).into())
}

fn error_json(message: &str) -> String {
    serde_json::json!({ "error": message }).to_string()
}

fn into_c_string(json: String) -> *mut c_char {
    // serde_json escapes control characters, so interior NULs cannot occur
    CString::new(json)
        .unwrap_or_else(|_| CString::from(c"{\"error\":\"internal\"}"))
        .into_raw()
}
