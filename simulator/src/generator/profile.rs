use anyhow::{ensure, Context};
use chrono::{Datelike, Duration, NaiveDate, Timelike};
use cpscore::grid::{GeopotentialSnapshots, PolarAxes};
use cpscore::tracks::motion::theta_multitrack;
use cpscore::TrackPoint;
use ndarray::{Array1, Array4};
use rand::{rngs::StdRng, Rng, SeedableRng};
use serde::{Deserialize, Serialize};

/// Scale height used for the background geopotential profile, in m.
const SCALE_HEIGHT: f64 = 7400.0;
const SURFACE_PRESSURE: f64 = 101325.0;

/// Configuration for generating a synthetic cyclone track and its snapshots.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct ScenarioConfig {
    pub points: usize,
    pub start_lat: f64,
    pub start_lon: f64,
    /// Displacement per 6-hourly step, in degrees.
    pub step_lon: f64,
    pub step_lat: f64,
    pub start: NaiveDate,
    pub levels_hpa: Vec<f64>,
    pub radius_count: usize,
    /// Ring spacing, in degrees of great circle.
    pub radius_step: f64,
    pub azimuth_step: f64,
    /// Depth of the low near the surface, in m.
    pub core_depth: f64,
    /// 900-600 hPa thickness contrast across the track, in m.
    pub asymmetry: f64,
    pub noise: f64,
    pub seed: u64,
    pub geopt_name: String,
    pub plev_name: String,
}

impl Default for ScenarioConfig {
    fn default() -> Self {
        Self {
            points: 8,
            start_lat: 15.0,
            start_lon: -45.0,
            step_lon: -0.8,
            step_lat: 0.4,
            start: NaiveDate::from_ymd_opt(2005, 8, 23).unwrap_or_default(),
            levels_hpa: vec![
                1000.0, 950.0, 900.0, 850.0, 800.0, 750.0, 700.0, 650.0, 600.0, 550.0, 500.0,
                450.0, 400.0, 350.0, 300.0, 250.0, 200.0,
            ],
            radius_count: 10,
            radius_step: 0.5,
            azimuth_step: 10.0,
            core_depth: 120.0,
            asymmetry: 40.0,
            noise: 0.0,
            seed: 0,
            geopt_name: "snap_zg".to_string(),
            plev_name: "level".to_string(),
        }
    }
}

/// A generated track with its aligned snapshot dataset.
#[derive(Debug, Clone)]
pub struct Scenario {
    pub tracks: Vec<TrackPoint>,
    pub snapshots: GeopotentialSnapshots,
}

fn build_tracks(config: &ScenarioConfig) -> anyhow::Result<Vec<TrackPoint>> {
    let lon: Vec<f64> = (0..config.points)
        .map(|i| config.start_lon + i as f64 * config.step_lon)
        .collect();
    let lat: Vec<f64> = (0..config.points)
        .map(|i| config.start_lat + i as f64 * config.step_lat)
        .collect();
    let ids = vec![0_u32; config.points];
    let bearings = theta_multitrack(&ids, &lon, &lat);
    let start = config
        .start
        .and_hms_opt(0, 0, 0)
        .context("building scenario start time")?;

    Ok((0..config.points)
        .map(|i| {
            let time = start + Duration::hours(6 * i as i64);
            TrackPoint::new(lat[i])
                .with_theta(bearings[i])
                .with_time_components(time.year(), time.month(), time.day(), time.hour())
                .with_extra("lon", lon[i])
                .with_extra("track_id", ids[i])
        })
        .collect())
}

fn build_heights(config: &ScenarioConfig, axes: &PolarAxes, bearings: &[f64]) -> Array4<f64> {
    let levels = config.levels_hpa.len();
    let shape = (levels, axes.radius_count(), axes.azimuth_count(), config.points);
    let r_max = axes.radii()[axes.radius_count() - 1];
    let mut rng = StdRng::seed_from_u64(config.seed);
    let mut heights = Array4::zeros(shape);

    for ((l, r, a, s), z) in heights.indexed_iter_mut() {
        let p = config.levels_hpa[l] * 100.0;
        let radius = axes.radii()[r];
        let azimuth = axes.azimuths()[a].to_radians();
        let background = SCALE_HEIGHT * (SURFACE_PRESSURE / p).ln();
        // weakens upward: warm core
        let low = -config.core_depth * (p / SURFACE_PRESSURE).powi(2)
            * (-(radius / (0.4 * r_max)).powi(2)).exp();
        // grows from 900 hPa upward, warmest right of motion
        let lift = ((90000.0 - p) / 30000.0).clamp(0.0, 1.5);
        let right_of_motion = (bearings[s] - 90.0).to_radians();
        let front = config.asymmetry * lift * (radius / r_max) * (azimuth - right_of_motion).cos();
        let jitter = if config.noise > 0.0 {
            rng.gen_range(-config.noise..config.noise)
        } else {
            0.0
        };
        *z = background + low + front + jitter;
    }
    heights
}

pub fn build_scenario(config: &ScenarioConfig) -> anyhow::Result<Scenario> {
    ensure!(config.points > 0, "scenario needs at least one point");
    ensure!(
        config.radius_count > 0 && config.radius_step > 0.0,
        "scenario needs positive radius spacing"
    );
    ensure!(
        config.azimuth_step > 0.0 && config.azimuth_step <= 180.0,
        "azimuth step must be in (0, 180] degrees"
    );
    ensure!(!config.levels_hpa.is_empty(), "scenario needs pressure levels");

    let radii = Array1::from_shape_fn(config.radius_count, |i| (i as f64 + 0.5) * config.radius_step);
    let azimuths = Array1::range(0.0, 360.0, config.azimuth_step);
    let axes = PolarAxes::new(radii, azimuths).context("building polar grid")?;

    let tracks = build_tracks(config)?;
    let bearings: Vec<f64> = tracks.iter().map(|row| row.theta.unwrap_or(0.0)).collect();
    let heights = build_heights(config, &axes, &bearings);
    let levels_pa = config.levels_hpa.iter().map(|p| p * 100.0).collect();

    let snapshots = GeopotentialSnapshots::new(&config.plev_name, levels_pa, axes, config.points)
        .with_variable(&config.geopt_name, heights)
        .context("assembling snapshot dataset")?;

    Ok(Scenario { tracks, snapshots })
}
