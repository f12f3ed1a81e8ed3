use launchvis::calibration::{Calibration, Thresholds, Weights};
use launchvis::scores::{
    bearing_score, brightness_score, clarity_score, cloud_score, distance_score, obstruction_score,
    plume_score, sun_score,
};
use launchvis::{
    initial_bearing_deg, Rating, RocketType, ViewingLocation, VisibilityEngine, VisibilityRequest,
    WeatherSnapshot,
};
use proptest::prelude::*;

fn unit(x: f64) -> bool {
    (0.0..=1.0).contains(&x)
}

fn rocket() -> impl Strategy<Value = RocketType> {
    prop_oneof![
        Just(RocketType::Falcon9),
        Just(RocketType::FalconHeavy),
        Just(RocketType::Starship),
        Just(RocketType::SmallRocket),
    ]
}

fn weather() -> impl Strategy<Value = WeatherSnapshot> {
    (
        proptest::option::of(0.0..=100.0f64),
        proptest::option::of(0.0..20_000.0f64),
        proptest::option::of(0.0..80.0f64),
        proptest::option::of(0.0..500.0f64),
        proptest::option::of(0.0..90.0f64),
        proptest::option::of(0.0..=100.0f64),
    )
        .prop_map(|(cloud, base, vis, aqi, wind, rh)| WeatherSnapshot {
            cloud_cover_pct: cloud,
            cloud_base_m: base,
            surface_visibility_km: vis,
            aqi,
            upper_wind_speed_ms: wind,
            upper_humidity_pct: rh,
            ..Default::default()
        })
}

#[test]
fn weights_sum_to_one() {
    assert!((Weights::default().sum() - 1.0).abs() < 1e-12);
}

proptest! {
    #[test]
    fn geometry_scores_stay_in_unit_range(
        cloud in 0.0..=100.0f64,
        base in proptest::option::of(0.0..50_000.0f64),
        elevation in -90.0..=90.0f64,
        distance in 0.0..3_000.0f64,
        max in 1.0..2_000.0f64,
        bearing in 0.0..360.0f64,
        azimuth in 0.0..360.0f64,
    ) {
        let t = Thresholds::default();
        prop_assert!(unit(cloud_score(cloud, base, &t).score));
        prop_assert!(unit(sun_score(elevation)));
        prop_assert!(unit(distance_score(distance, max, &t)));
        prop_assert!(unit(bearing_score(bearing, azimuth)));
    }

    #[test]
    fn atmosphere_and_vehicle_scores_stay_in_unit_range(
        vis in 0.0..100.0f64,
        aqi in proptest::option::of(0.0..500.0f64),
        humidity_penalty in 0.0..=1.0f64,
        rh in proptest::option::of(0.0..=100.0f64),
        wind in proptest::option::of(0.0..100.0f64),
        rocket in rocket(),
        crewed in any::<bool>(),
        urban in any::<bool>(),
        viewer_elevation in proptest::option::of(-50.0..5_000.0f64),
        light in 0.0..=1.0f64,
    ) {
        prop_assert!(unit(clarity_score(vis, aqi, humidity_penalty)));
        prop_assert!(unit(plume_score(rh, wind)));
        prop_assert!(unit(brightness_score("Starlink", rocket, crewed)));
        prop_assert!(unit(obstruction_score(urban, viewer_elevation, light)));
    }

    #[test]
    fn more_cloud_never_helps(
        lo in 0.0..=100.0f64,
        hi in 0.0..=100.0f64,
        base in proptest::option::of(0.0..50_000.0f64),
    ) {
        let t = Thresholds::default();
        let (lo, hi) = if lo <= hi { (lo, hi) } else { (hi, lo) };
        prop_assert!(cloud_score(hi, base, &t).score <= cloud_score(lo, base, &t).score);
    }

    #[test]
    fn beyond_max_distance_scores_zero(max in 1.0..2_000.0f64, extra in 0.001..5_000.0f64) {
        prop_assert_eq!(distance_score(max + extra, max, &Thresholds::default()), 0.0);
    }

    #[test]
    fn nautical_twilight_is_the_optimum(elevation in -12.0..=-6.0f64, other in -90.0..=90.0f64) {
        prop_assert_eq!(sun_score(elevation), 1.0);
        prop_assert!(sun_score(other) <= 1.0);
    }

    #[test]
    fn reverse_bearing_differs_by_half_turn(
        lat1 in -60.0..60.0f64,
        lon1 in -179.0..179.0f64,
        dlat in -0.5..0.5f64,
        dlon in -0.5..0.5f64,
    ) {
        prop_assume!(dlat.abs() > 0.01 || dlon.abs() > 0.01);
        let (lat2, lon2) = (lat1 + dlat, lon1 + dlon);
        let fwd = initial_bearing_deg(lat1, lon1, lat2, lon2);
        let back = initial_bearing_deg(lat2, lon2, lat1, lon1);
        let diff = (fwd - back).rem_euclid(360.0);
        // meridian convergence over half a degree of longitude stays under a degree
        prop_assert!((diff - 180.0).abs() < 1.0, "fwd {} back {}", fwd, back);
    }

    #[test]
    fn engine_output_respects_invariants(
        time in 1_700_000_000i64..1_800_000_000i64,
        lat in -60.0..60.0f64,
        lon in -180.0..180.0f64,
        site in prop_oneof![Just("vandenberg"), Just("cape-canaveral"), Just("starbase"), Just("nowhere")],
        mission in prop_oneof![
            Just("Starlink 12-1"), Just("Crew-12"), Just("Starship Flight 11"),
            Just("Electron | Rocket Lab"), Just("Falcon Heavy USSF-99"), Just("NROL-69"),
        ],
        viewing in weather(),
        launch_site in weather(),
        with_viewer in any::<bool>(),
    ) {
        let engine = VisibilityEngine::new(Calibration::default());
        let request = VisibilityRequest {
            launch_time_unix: time,
            mission_name: mission.to_string(),
            weather_launch_site: launch_site,
            weather_viewing: viewing,
            viewing_location: with_viewer.then(|| ViewingLocation {
                latitude: lat,
                longitude: lon,
                name: "somewhere".to_string(),
                elevation_m: None,
                is_urban: None,
            }),
            site_id: Some(site.to_string()),
        };
        let result = engine.calculate_visibility(&request);

        prop_assert!(result.percentage <= 100);
        let s = result.sub_scores;
        for x in [s.cloud, s.sun, s.distance, s.bearing, s.clarity, s.plume, s.brightness, s.obstruction] {
            prop_assert!(unit(x));
        }
        if result.fatal_blocker.is_some() {
            prop_assert!(result.percentage <= 5);
            prop_assert_eq!(result.rating, Rating::Poor);
        }
        prop_assert!(result.confidence.low <= result.percentage);
        prop_assert!(result.confidence.high >= result.percentage);
        prop_assert!(result.confidence.high <= 100);
        prop_assert!(result.limiting_factors.len() <= 3);
        if result.distance_km > result.raw.max_visible_distance_km {
            prop_assert_eq!(s.distance, 0.0);
        }
        prop_assert_eq!(result.clone(), engine.calculate_visibility(&request));
    }
}
