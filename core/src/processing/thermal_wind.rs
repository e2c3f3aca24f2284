use ndarray::{s, Array1, Array2, ArrayView2};
use rayon::prelude::*;

use crate::grid::levels::PressureLevelStack;
use crate::math::stats::StatsHelper;
use crate::prelude::{
    CpsConfig, CpsResult, Diagnostic, DiagnosticColumn, DiagnosticStage, StageInput, StageOutput,
    ThermalWindMethod,
};
use crate::telemetry::log::LogManager;

/// Per-snapshot lower and upper thermal wind, NaN where not available.
#[derive(Debug, Clone, PartialEq)]
pub struct ThermalWindResult {
    pub vtl: Array1<f64>,
    pub vtu: Array1<f64>,
}

/// Thermal-wind parameters from the height range on each pressure level.
#[derive(Debug, Clone, Copy)]
pub struct ThermalWind {
    lower_band: [f64; 2],
    upper_band: [f64; 2],
}

impl Default for ThermalWind {
    fn default() -> Self {
        Self::new([950e2, 600e2], [600e2, 250e2])
    }
}

impl ThermalWind {
    /// Bands are `[bottom, top]` pressures in Pa, bounds inclusive.
    pub fn new(lower_band: [f64; 2], upper_band: [f64; 2]) -> Self {
        Self {
            lower_band,
            upper_band,
        }
    }

    /// `max - min` over radius and azimuth, `(level, snapshot)`.
    pub fn height_ranges(stack: &PressureLevelStack) -> Array2<f64> {
        let heights = stack.heights();
        let levels = stack.levels().len();
        let snapshots = stack.snapshot_count();

        let columns: Vec<Vec<f64>> = (0..snapshots)
            .into_par_iter()
            .map(|snapshot| {
                (0..levels)
                    .map(|level| {
                        StatsHelper::nan_range(heights.slice(s![level, .., .., snapshot]))
                    })
                    .collect()
            })
            .collect();

        let mut ranges = Array2::from_elem((levels, snapshots), f64::NAN);
        for (snapshot, column) in columns.into_iter().enumerate() {
            for (level, value) in column.into_iter().enumerate() {
                ranges[[level, snapshot]] = value;
            }
        }
        ranges
    }

    /// Slopes of the height range against ln(p) over both bands.
    pub fn regression(&self, stack: &PressureLevelStack) -> ThermalWindResult {
        let stack = stack.descending();
        let ranges = Self::height_ranges(&stack);
        ThermalWindResult {
            vtl: band_slopes(&stack, ranges.view(), self.lower_band),
            vtu: band_slopes(&stack, ranges.view(), self.upper_band),
        }
    }

    /// Finite-difference form using the levels nearest 900, 600 and 300 hPa.
    pub fn three_level(stack: &PressureLevelStack) -> ThermalWindResult {
        let ranges = Self::height_ranges(stack);
        let at = |target: f64| ranges.row(stack.nearest_level(target).0).mapv(f64::abs);
        let (z900, z600, z300) = (at(900e2), at(600e2), at(300e2));
        ThermalWindResult {
            vtl: (&z900 - &z600) * 750.0 / (900.0 - 600.0),
            vtu: (&z600 - &z300) * 450.0 / (600.0 - 300.0),
        }
    }
}

fn band_slopes(stack: &PressureLevelStack, ranges: ArrayView2<f64>, band: [f64; 2]) -> Array1<f64> {
    let [bottom, top] = band;
    let indices = stack.band_indices(bottom, top);
    let log_p: Vec<f64> = indices.iter().map(|&idx| stack.levels()[idx].ln()).collect();

    let slopes: Vec<f64> = (0..ranges.ncols())
        .into_par_iter()
        .map(|snapshot| {
            let y: Vec<f64> = indices.iter().map(|&idx| ranges[[idx, snapshot]]).collect();
            StatsHelper::ols_slope(&log_p, &y)
        })
        .collect();
    Array1::from(slopes)
}

/// Stage producing the VTL and VTU columns.
pub struct ThermalWindStage {
    method: ThermalWindMethod,
    wind: ThermalWind,
    logger: LogManager,
}

impl ThermalWindStage {
    pub fn new(config: &CpsConfig, logger: LogManager) -> Self {
        Self {
            method: config.thermal_wind,
            wind: ThermalWind::new(config.lower_band_pa, config.upper_band_pa),
            logger,
        }
    }
}

impl DiagnosticStage for ThermalWindStage {
    fn name(&self) -> &'static str {
        "thermal_wind"
    }

    fn execute(&self, input: &StageInput<'_>) -> CpsResult<StageOutput> {
        let stack = input.stack;
        let mut notes = Vec::new();
        let result = match self.method {
            ThermalWindMethod::Regression => {
                for (label, [bottom, top]) in [
                    ("lower", self.wind.lower_band),
                    ("upper", self.wind.upper_band),
                ] {
                    let count = stack.band_indices(bottom, top).len();
                    if count < 2 {
                        self.logger.warn(&format!(
                            "{} band {}-{} Pa holds {} level(s); its slope is not available",
                            label, bottom, top, count
                        ));
                    }
                    notes.push(format!("{} band uses {} levels", label, count));
                }
                self.wind.regression(stack)
            }
            ThermalWindMethod::ThreeLevel => {
                for target in [900e2, 600e2, 300e2] {
                    let (_, level) = stack.nearest_level(target);
                    let note = format!("Level {} is taken for {}hPa", level, target / 100.0);
                    self.logger.record(&note);
                    notes.push(note);
                }
                ThermalWind::three_level(stack)
            }
        };

        Ok(StageOutput {
            columns: vec![
                DiagnosticColumn {
                    kind: Diagnostic::Vtl,
                    values: result.vtl,
                },
                DiagnosticColumn {
                    kind: Diagnostic::Vtu,
                    values: result.vtu,
                },
            ],
            notes,
        })
    }
}
