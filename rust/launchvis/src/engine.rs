//! The visibility engine: resolves site and viewer, runs every sub-score,
//! applies fatal blockers and the weighted composite, then explains itself.

use log::{debug, info};

use crate::astro::{
    angular_offset_deg, cardinal_direction, classify_twilight, haversine_distance_km,
    initial_bearing_deg, solar_elevation, TwilightBand,
};
use crate::calibration::{Calibration, LaunchSite, LightingCondition};
use crate::local_time::format_local;
use crate::mission::{KeywordClassifier, MissionCategory, MissionClassifier, RocketType};
use crate::model::{
    ConfidenceInterval, Factor, LimitingFactor, Rating, RawData, Severity, SubScores,
    ViewingLocation, ViewingWindow, VisibilityRequest, VisibilityResult, WeatherSnapshot,
};
use crate::scores::{
    bearing_score, brightness_score, clarity_score, cloud_score, distance_score, obstruction_score,
    plume_score, sun_score, CloudScore, ScoreReason,
};

const BLOCKED_MAX_PCT: u8 = 5;
const MIDDAY_SUN_SCORE: f64 = 0.1;
const BRIGHT_SKY_SUN_SCORE: f64 = 0.2;
const LIMITING_SCORE: f64 = 0.5;
const MAJOR_SCORE: f64 = 0.3;
const MARINE_LAYER_FOG_FACTOR: f64 = 0.25;
// Closer than this the viewer is at the pad and has no meaningful bearing.
const AT_PAD_KM: f64 = 1.0;

// Factors considered when explaining a low score.
const RANKED_FACTORS: [Factor; 5] = [
    Factor::Cloud,
    Factor::Sun,
    Factor::Distance,
    Factor::Clarity,
    Factor::Plume,
];

/// Scores rocket launches for a viewer. Calibration and mission classifier
/// are injected; the engine holds no other state.
#[derive(Debug, Clone)]
pub struct VisibilityEngine<C = KeywordClassifier> {
    calibration: Calibration,
    classifier: C,
}

impl Default for VisibilityEngine {
    fn default() -> Self {
        Self::new(Calibration::default())
    }
}

impl VisibilityEngine {
    pub fn new(calibration: Calibration) -> Self {
        Self::with_classifier(calibration, KeywordClassifier)
    }
}

/// Everything computed for one request before it is turned into a result.
struct Assessment<'a> {
    site: &'a LaunchSite,
    viewer: ViewingLocation,
    viewer_given: bool,
    distance_km: f64,
    bearing_deg: f64,
    solar_elevation_deg: f64,
    twilight: TwilightBand,
    lighting: LightingCondition,
    rocket: RocketType,
    category: Option<MissionCategory>,
    crewed: bool,
    trajectory_azimuth_deg: f64,
    max_visible_km: f64,
    weather: ResolvedWeather,
    cloud: CloudScore,
    scores: SubScores,
}

impl Assessment<'_> {
    fn at_pad(&self) -> bool {
        self.distance_km < AT_PAD_KM
    }

    fn beyond_range(&self) -> bool {
        self.distance_km > self.max_visible_km
    }

    /// Compass direction toward the site, or `None` when standing at the pad.
    fn direction(&self) -> Option<&'static str> {
        (!self.at_pad()).then(|| cardinal_direction(self.bearing_deg))
    }
}

/// Weather fields after fallbacks. Always complete where a default exists.
#[derive(Debug, Clone, Copy)]
struct ResolvedWeather {
    cloud_cover_pct: f64,
    cloud_base_m: Option<f64>,
    surface_visibility_km: f64,
    aqi: Option<f64>,
    upper_wind_speed_ms: Option<f64>,
    upper_humidity_pct: Option<f64>,
}

impl<C: MissionClassifier> VisibilityEngine<C> {
    pub fn with_classifier(calibration: Calibration, classifier: C) -> Self {
        Self { calibration, classifier }
    }

    pub fn calibration(&self) -> &Calibration {
        &self.calibration
    }

    /// Score one launch for one viewer. Never fails: missing weather and
    /// unknown sites resolve to documented defaults.
    pub fn calculate_visibility(&self, request: &VisibilityRequest) -> VisibilityResult {
        let a = self.assess(request);
        let weights = &self.calibration.weights;

        let fatal_blocker = evaluate_blockers(&a);
        let computed = pct_from_fraction(a.scores.weighted_sum(weights));
        let percentage = if fatal_blocker.is_some() {
            computed.min(BLOCKED_MAX_PCT)
        } else {
            computed
        };
        let rating = if fatal_blocker.is_some() {
            Rating::Poor
        } else {
            Rating::from_percentage(percentage)
        };

        let limiting_factors = self.limiting_factors(&a);
        let viewing_window = self.viewing_window(&a, request.launch_time_unix);
        let recommendations = self.recommendations(&a, fatal_blocker.is_some());
        let confidence = self.confidence(a.site, percentage);

        match &fatal_blocker {
            Some(reason) => info!(
                "[calculate_visibility] '{}' from {}: blocked at {}% ({})",
                request.mission_name, a.site.id, percentage, reason
            ),
            None => info!(
                "[calculate_visibility] '{}' from {}: {}% {:?}, {:.0} km {}",
                request.mission_name,
                a.site.id,
                percentage,
                rating,
                a.distance_km,
                a.direction().unwrap_or("at the pad")
            ),
        }

        VisibilityResult {
            percentage,
            rating,
            confidence,
            sub_scores: a.scores,
            weights: *weights,
            raw: RawData {
                site_id: a.site.id.clone(),
                site_name: a.site.name.clone(),
                solar_elevation_deg: a.solar_elevation_deg,
                twilight: a.twilight,
                lighting: a.lighting,
                rocket_type: a.rocket,
                mission_category: a.category,
                crewed: a.crewed,
                trajectory_azimuth_deg: a.trajectory_azimuth_deg,
                bearing_offset_deg: angular_offset_deg(a.bearing_deg, a.trajectory_azimuth_deg),
                max_visible_distance_km: a.max_visible_km,
                cloud_cover_pct: a.weather.cloud_cover_pct,
                cloud_base_m: a.weather.cloud_base_m,
                surface_visibility_km: a.weather.surface_visibility_km,
                aqi: a.weather.aqi,
                upper_wind_speed_ms: a.weather.upper_wind_speed_ms,
                upper_humidity_pct: a.weather.upper_humidity_pct,
            },
            limiting_factors,
            viewing_window,
            recommendations,
            direction: a.direction().map(str::to_string),
            distance_km: a.distance_km,
            bearing_deg: a.bearing_deg,
            viewer: a.viewer,
            fatal_blocker,
        }
    }

    /// Maximum visible distance for this mission's vehicle under the sky at
    /// (lat, lon) at `unix_seconds`. Cheap enough to draw map radii.
    pub fn visibility_radius_km(&self, mission_name: &str, lat: f64, lon: f64, unix_seconds: i64) -> f64 {
        let rocket = self.classifier.rocket_type(mission_name);
        let lighting = LightingCondition::from_solar_elevation(solar_elevation(lat, lon, unix_seconds));
        self.calibration.max_visible_distance_km(lighting, rocket)
    }

    fn assess(&self, request: &VisibilityRequest) -> Assessment<'_> {
        let cal = &self.calibration;
        let t = &cal.thresholds;
        let site = cal.resolve_site(request.site_id.as_deref());
        if let Some(id) = request.site_id.as_deref() {
            if !site.id.eq_ignore_ascii_case(id) {
                debug!("[assess] unknown site '{}', using {}", id, site.id);
            }
        }

        let viewer_given = request.viewing_location.is_some();
        let viewer = request.viewing_location.clone().unwrap_or_else(|| ViewingLocation {
            latitude: site.latitude,
            longitude: site.longitude,
            name: site.name.clone(),
            elevation_m: Some(site.elevation_m),
            is_urban: Some(false),
        });

        let distance_km = haversine_distance_km(viewer.latitude, viewer.longitude, site.latitude, site.longitude);
        let bearing_deg = initial_bearing_deg(viewer.latitude, viewer.longitude, site.latitude, site.longitude);

        // the observer's sky matters, not the pad's
        let solar_elevation_deg = solar_elevation(viewer.latitude, viewer.longitude, request.launch_time_unix);
        let twilight = classify_twilight(solar_elevation_deg);
        let lighting = LightingCondition::from_solar_elevation(solar_elevation_deg);

        let name = request.mission_name.as_str();
        let rocket = self.classifier.rocket_type(name);
        let category = self.classifier.category(name);
        let crewed = self.classifier.is_crewed(name);
        let trajectory_azimuth_deg = self.classifier.launch_azimuth(name, site);
        let max_visible_km = cal.max_visible_distance_km(lighting, rocket);

        let weather = resolve_weather(&request.weather_viewing, &request.weather_launch_site, cal);

        let cloud = cloud_score(weather.cloud_cover_pct, weather.cloud_base_m, t);
        let scores = SubScores {
            cloud: cloud.score,
            sun: sun_score(solar_elevation_deg),
            distance: distance_score(distance_km, max_visible_km, t),
            bearing: bearing_score(bearing_deg, trajectory_azimuth_deg),
            clarity: clarity_score(
                weather.surface_visibility_km,
                weather.aqi,
                site.modifiers.humidity_penalty,
            ),
            plume: plume_score(weather.upper_humidity_pct, weather.upper_wind_speed_ms),
            brightness: brightness_score(name, rocket, crewed),
            obstruction: obstruction_score(
                viewer.is_urban.unwrap_or(false),
                viewer.elevation_m,
                site.modifiers.light_pollution_base,
            ),
        };

        debug!(
            "[assess] site={} viewer=({:.3}, {:.3}) dist={:.1} km bearing={:.1} sun_el={:.2} ({:?}) rocket={:?} az={:.0} max={:.0} km",
            site.id,
            viewer.latitude,
            viewer.longitude,
            distance_km,
            bearing_deg,
            solar_elevation_deg,
            twilight,
            rocket,
            trajectory_azimuth_deg,
            max_visible_km
        );
        debug!(
            "[assess] cloud={:.2} sun={:.2} distance={:.2} bearing={:.2} clarity={:.2} plume={:.2} brightness={:.2} obstruction={:.2}",
            scores.cloud,
            scores.sun,
            scores.distance,
            scores.bearing,
            scores.clarity,
            scores.plume,
            scores.brightness,
            scores.obstruction
        );

        Assessment {
            site,
            viewer,
            viewer_given,
            distance_km,
            bearing_deg,
            solar_elevation_deg,
            twilight,
            lighting,
            rocket,
            category,
            crewed,
            trajectory_azimuth_deg,
            max_visible_km,
            weather,
            cloud,
            scores,
        }
    }

    fn limiting_factors(&self, a: &Assessment<'_>) -> Vec<LimitingFactor> {
        let weights = &self.calibration.weights;
        let mut factors = Vec::new();

        let cloud_caution = a.cloud.caution();
        if let Some(msg) = cloud_caution {
            factors.push(LimitingFactor {
                factor: Factor::Cloud,
                description: msg.to_string(),
                severity: severity(a.scores.cloud),
                score: a.scores.cloud,
            });
        }

        let mut ranked: Vec<Factor> = RANKED_FACTORS
            .into_iter()
            .filter(|f| !(cloud_caution.is_some() && *f == Factor::Cloud))
            .collect();
        ranked.sort_by(|x, y| {
            let wx = a.scores.get(*x) * x.weight(weights);
            let wy = a.scores.get(*y) * y.weight(weights);
            wx.total_cmp(&wy)
        });

        factors.extend(
            ranked
                .into_iter()
                .filter(|f| a.scores.get(*f) < LIMITING_SCORE)
                .take(2)
                .map(|f| LimitingFactor {
                    factor: f,
                    description: describe_factor(f, a),
                    severity: severity(a.scores.get(f)),
                    score: a.scores.get(f),
                }),
        );
        factors
    }

    fn viewing_window(&self, a: &Assessment<'_>, launch_time_unix: i64) -> ViewingWindow {
        if a.scores.sun < BRIGHT_SKY_SUN_SCORE {
            return ViewingWindow {
                start_unix: None,
                end_unix: None,
                start_local: None,
                end_local: None,
                description: "The sky will be bright for the whole ascent, so there is no good \
                              viewing window. At most you may catch a brief glint or contrail."
                    .to_string(),
            };
        }

        let timing = self.calibration.timing.get(a.rocket);
        let start = launch_time_unix + timing.time_to_visible_s;
        let end = start + timing.visible_duration_s;
        let minutes = timing.visible_duration_s / 60;

        let description = match a.twilight {
            TwilightBand::Nautical => format!(
                "Prime twilight window: for about {minutes} minutes the sunlit plume should spread \
                 across a dark sky."
            ),
            TwilightBand::Civil => format!(
                "Bright twilight: the plume will glow against a fading sky for about {minutes} \
                 minutes. Watch low on the horizon."
            ),
            TwilightBand::Astronomical => format!(
                "Dark sky with the plume still catching sunlight at altitude, visible for about \
                 {minutes} minutes."
            ),
            TwilightBand::Night => format!(
                "Night launch: follow the engine flame as a moving bright point for about \
                 {minutes} minutes."
            ),
            TwilightBand::Day => format!(
                "Low sun: look for the exhaust trail and a bright point of flame for about \
                 {minutes} minutes."
            ),
        };

        ViewingWindow {
            start_unix: Some(start),
            end_unix: Some(end),
            start_local: format_local(a.site, start),
            end_local: format_local(a.site, end),
            description,
        }
    }

    fn recommendations(&self, a: &Assessment<'_>, blocked: bool) -> Vec<String> {
        let mut recs = Vec::new();
        let s = &a.scores;

        // a blocked launch has no good timing to praise
        if !blocked {
            if let Some(timing) = timing_advice(s.sun) {
                recs.push(timing.to_string());
            }
        }

        if s.cloud < LIMITING_SCORE {
            recs.push(format!(
                "Clouds are the main risk ({:.0}% cover). Check the forecast again an hour before \
                 launch and consider driving toward clearer skies.",
                a.weather.cloud_cover_pct
            ));
        }

        if let Some(advice) = distance_advice(a) {
            recs.push(advice);
        }

        if s.clarity < LIMITING_SCORE {
            match a.weather.aqi {
                Some(aqi) if aqi > 100.0 => recs.push(format!(
                    "Air quality is poor (AQI {aqi:.0}); smoke or haze will dim the plume."
                )),
                _ => recs.push(format!(
                    "Haze limits surface visibility to about {:.0} km; higher ground helps.",
                    a.weather.surface_visibility_km
                )),
            }
        }

        if a.site.modifiers.coastal_fog_factor >= MARINE_LAYER_FOG_FACTOR && marine_layer_likely(&a.weather) {
            recs.push(
                "A low marine layer is likely near the coast. Inland or elevated spots often sit \
                 above it."
                    .to_string(),
            );
        }

        recs.extend(a.site.tips.general.iter().cloned());
        if a.rocket == RocketType::Starship {
            recs.extend(a.site.tips.starship.iter().cloned());
        }

        if !blocked {
            if recs.is_empty() {
                recs.push("Conditions look reasonable. Find a spot with an open view toward the launch site.".to_string());
            }
            recs.push(trust_note(a));
        }
        recs
    }

    fn confidence(&self, site: &LaunchSite, percentage: u8) -> ConfidenceInterval {
        let t = &self.calibration.thresholds;
        let margin = if site.modifiers.typical_cloud_cover > t.variable_cloud_cover {
            t.variable_weather_margin
        } else {
            t.confidence_margin
        };
        let margin = margin.round().clamp(0.0, 100.0) as u8;
        ConfidenceInterval {
            low: percentage.saturating_sub(margin),
            high: percentage.saturating_add(margin).min(100),
            margin,
        }
    }
}

fn resolve_weather(viewing: &WeatherSnapshot, launch_site: &WeatherSnapshot, cal: &Calibration) -> ResolvedWeather {
    let t = &cal.thresholds;
    ResolvedWeather {
        cloud_cover_pct: viewing
            .cloud_cover_pct
            .or(launch_site.cloud_cover_pct)
            .unwrap_or(t.default_cloud_cover_pct)
            .clamp(0.0, 100.0),
        cloud_base_m: viewing
            .cloud_base_or_estimate()
            .or_else(|| launch_site.cloud_base_or_estimate()),
        surface_visibility_km: viewing
            .surface_visibility_km
            .or(launch_site.surface_visibility_km)
            .unwrap_or(t.default_surface_visibility_km)
            .max(0.0),
        aqi: viewing.aqi.or(launch_site.aqi),
        // the plume forms over the pad
        upper_wind_speed_ms: launch_site.upper_wind_speed_ms.or(viewing.upper_wind_speed_ms),
        upper_humidity_pct: launch_site.upper_humidity_pct.or(viewing.upper_humidity_pct),
    }
}

type BlockerRule = fn(&Assessment<'_>) -> Option<String>;

// Evaluated in order; the first match is the only blocker reported.
const BLOCKER_RULES: [BlockerRule; 3] = [opaque_sky, out_of_range, midday_sun];

fn evaluate_blockers(a: &Assessment<'_>) -> Option<String> {
    BLOCKER_RULES.iter().find_map(|rule| rule(a))
}

fn opaque_sky(a: &Assessment<'_>) -> Option<String> {
    match &a.cloud.reason {
        Some(ScoreReason::Fatal(reason)) => Some(format!("Heavy cloud or fog: {reason}.")),
        _ => None,
    }
}

fn out_of_range(a: &Assessment<'_>) -> Option<String> {
    if a.scores.distance > 0.0 || a.distance_km <= a.max_visible_km {
        return None;
    }
    let rocket = a.rocket.display_name();
    let (d, max) = (a.distance_km, a.max_visible_km);
    Some(match a.lighting {
        LightingCondition::Twilight => format!(
            "At {d:.0} km you are beyond the ~{max:.0} km range at which a {rocket} plume has \
             been seen, even in twilight."
        ),
        LightingCondition::Night => format!(
            "At {d:.0} km you are beyond the ~{max:.0} km night-time range for {rocket}. Without \
             a sunlit plume only the engine flame shows, and it sets below your horizon."
        ),
        LightingCondition::Day => format!(
            "In daylight a {rocket} is only visible out to about {max:.0} km, and you are \
             {d:.0} km away."
        ),
    })
}

fn midday_sun(a: &Assessment<'_>) -> Option<String> {
    (a.scores.sun < MIDDAY_SUN_SCORE).then(|| {
        "The Sun is high: the launch will be lost in daylight glare. Try a launch near \
         twilight instead."
            .to_string()
    })
}

fn pct_from_fraction(fraction: f64) -> u8 {
    (fraction * 100.0).round().clamp(0.0, 100.0) as u8
}

fn severity(score: f64) -> Severity {
    if score < MAJOR_SCORE {
        Severity::Major
    } else {
        Severity::Minor
    }
}

fn describe_factor(factor: Factor, a: &Assessment<'_>) -> String {
    match factor {
        Factor::Cloud => format!("{:.0}% cloud cover hides much of the sky", a.weather.cloud_cover_pct),
        Factor::Sun => match a.lighting {
            LightingCondition::Day => format!(
                "Sun {:.0}° above the horizon washes out the exhaust plume",
                a.solar_elevation_deg
            ),
            LightingCondition::Night => {
                "Full darkness: the plume is not sunlit, only the engine flame shows".to_string()
            }
            LightingCondition::Twilight => "Twilight sky is still bright".to_string(),
        },
        Factor::Distance if a.distance_km <= 0.0 => {
            "No viewing location given; distance could not be scored".to_string()
        }
        Factor::Distance if a.beyond_range() => format!(
            "{:.0} km is beyond the {:.0} km limit for {} in these lighting conditions",
            a.distance_km,
            a.max_visible_km,
            a.rocket.display_name()
        ),
        Factor::Distance => format!(
            "{:.0} km is near the {:.0} km limit for {} in these lighting conditions",
            a.distance_km,
            a.max_visible_km,
            a.rocket.display_name()
        ),
        Factor::Clarity => match a.weather.aqi {
            Some(aqi) if aqi > 100.0 => format!(
                "Hazy air: {:.0} km visibility, AQI {aqi:.0}",
                a.weather.surface_visibility_km
            ),
            _ => format!("Hazy air: {:.0} km visibility", a.weather.surface_visibility_km),
        },
        Factor::Plume => {
            "Upper-level air will disperse the exhaust plume quickly".to_string()
        }
        Factor::Bearing => "Viewing the trajectory nearly head-on".to_string(),
        Factor::Brightness => format!("{} is a faint vehicle", a.rocket.display_name()),
        Factor::Obstruction => "Light pollution and terrain limit the view".to_string(),
    }
}

fn timing_advice(sun: f64) -> Option<&'static str> {
    let advice = if sun >= 0.95 {
        "Excellent timing: the launch falls in twilight, when the sunlit plume stands out against a dark sky."
    } else if sun >= 0.8 {
        "Good timing: the sky will be dark enough for the plume to stand out."
    } else if sun >= 0.6 {
        "Night launch: expect a bright moving point of flame rather than a glowing plume."
    } else if sun >= 0.2 {
        "Low sun: the rocket will be visible but the plume will not glow."
    } else {
        return None;
    };
    Some(advice)
}

fn distance_advice(a: &Assessment<'_>) -> Option<String> {
    // without a viewing location there is nowhere to point the viewer
    if !a.viewer_given {
        return None;
    }
    let hint = &a.site.landmark_hint;
    let d = a.distance_km;
    let max = a.max_visible_km;
    let Some(dir) = a.direction() else {
        return Some(
            "You are at the launch site: watch liftoff directly and follow the rocket as it \
             climbs overhead."
                .to_string(),
        );
    };
    let advice = if a.beyond_range() {
        format!(
            "At {d:.0} km this launch is out of range. Get within about {max:.0} km of the site, \
             looking {dir} {hint}, for a chance to see it."
        )
    } else if d < 50.0 {
        format!(
            "You are close to the pad: look {dir} {hint} right at liftoff; the rocket climbs \
             quickly overhead."
        )
    } else if d < 200.0 {
        format!("Look {dir} {hint} about a minute after liftoff as the rocket clears the horizon.")
    } else if d < 500.0 {
        format!(
            "At {d:.0} km the rocket will appear low on the {dir} horizon; find a spot with an \
             unobstructed view that way."
        )
    } else {
        format!(
            "At {d:.0} km only the high-altitude plume will be visible, low to the {dir}, a few \
             minutes after liftoff."
        )
    };
    Some(advice)
}

fn marine_layer_likely(w: &ResolvedWeather) -> bool {
    match w.cloud_base_m {
        Some(base) => base < 1000.0 && w.cloud_cover_pct > 0.0,
        None => w.cloud_cover_pct > 30.0,
    }
}

fn trust_note(a: &Assessment<'_>) -> String {
    let rocket = a.rocket.display_name();
    let max = a.max_visible_km;
    match a.lighting {
        LightingCondition::Twilight => format!(
            "Twilight launches give the most reliable sightings: {rocket} plumes have been \
             reported up to ~{max:.0} km away in similar conditions."
        ),
        LightingCondition::Night => format!(
            "This score follows documented night sightings of {rocket}, which typically reach \
             ~{max:.0} km."
        ),
        LightingCondition::Day => format!(
            "Daytime sightings of {rocket} rarely exceed ~{max:.0} km, so this score leans on \
             distance and clear skies."
        ),
    }
}
