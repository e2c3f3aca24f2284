use ndarray::Array1;
use serde::{Deserialize, Serialize};

use crate::grid::levels::PressureLevelStack;
use crate::tracks::record::TrackTable;

/// How the track rows carry their timestamp.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "snake_case")]
pub enum TimeFields {
    /// Every row already has a `time` value.
    #[default]
    Timestamp,
    /// `time` is built from `year`, `month`, `day` and `hour` when absent.
    Components,
    /// Rows are not timed; no time column is required.
    Untimed,
}

/// Formulation used for the thermal-wind parameters.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "snake_case")]
pub enum ThermalWindMethod {
    /// Least-squares slope of the height range against ln(p) over each band.
    #[default]
    Regression,
    /// Finite differences between the levels nearest 900, 600 and 300 hPa.
    ThreeLevel,
}

/// Configuration shared by every stage of one pipeline invocation.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct CpsConfig {
    /// Name of the geopotential-height variable in the snapshot dataset.
    pub geopt_name: String,
    /// Label of the vertical coordinate in the incoming dataset.
    pub plev_name: String,
    pub verbose: bool,
    pub time_fields: TimeFields,
    /// Reference levels for B as `[lower, upper]`, in Pa.
    pub b_levels_pa: [f64; 2],
    /// Lower-troposphere band as `[bottom, top]`, in Pa.
    pub lower_band_pa: [f64; 2],
    /// Upper-troposphere band as `[bottom, top]`, in Pa.
    pub upper_band_pa: [f64; 2],
    /// Heights whose magnitude reaches this value are fill values.
    pub missing_threshold: f64,
    pub thermal_wind: ThermalWindMethod,
}

impl Default for CpsConfig {
    fn default() -> Self {
        Self {
            geopt_name: "snap_zg".to_string(),
            plev_name: "level".to_string(),
            verbose: true,
            time_fields: TimeFields::Timestamp,
            b_levels_pa: [900e2, 600e2],
            lower_band_pa: [950e2, 600e2],
            upper_band_pa: [600e2, 250e2],
            missing_threshold: 1e10,
            thermal_wind: ThermalWindMethod::Regression,
        }
    }
}

impl CpsConfig {
    pub fn validate(&self) -> CpsResult<()> {
        if self.geopt_name.trim().is_empty() {
            return Err(CpsError::InvalidConfig("geopt_name is empty".into()));
        }
        if self.plev_name.trim().is_empty() {
            return Err(CpsError::InvalidConfig("plev_name is empty".into()));
        }
        if !(self.missing_threshold.is_finite() && self.missing_threshold > 0.0) {
            return Err(CpsError::InvalidConfig(format!(
                "missing_threshold must be positive, got {}",
                self.missing_threshold
            )));
        }
        for (label, pair) in [
            ("b_levels_pa", self.b_levels_pa),
            ("lower_band_pa", self.lower_band_pa),
            ("upper_band_pa", self.upper_band_pa),
        ] {
            let [bottom, top] = pair;
            if !(bottom.is_finite() && top.is_finite() && top > 0.0 && bottom > top) {
                return Err(CpsError::InvalidConfig(format!(
                    "{} must be [higher, lower] positive pressures, got [{}, {}]",
                    label, bottom, top
                )));
            }
        }
        Ok(())
    }
}

/// Common error type for pipeline execution.
#[derive(thiserror::Error, Debug)]
pub enum CpsError {
    #[error("input shape: {0}")]
    InputShape(String),
    #[error("unsupported track input: {0}")]
    UnsupportedInput(String),
    #[error("track row {row} has no motion direction (theta); compute bearings before running the pipeline")]
    MissingDirection { row: usize },
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),
    #[error("serialization: {0}")]
    Serialization(#[from] serde_json::Error),
}

pub type CpsResult<T> = Result<T, CpsError>;

/// Diagnostic columns produced by the stages.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Diagnostic {
    B,
    Vtl,
    Vtu,
}

impl Diagnostic {
    pub fn column_name(self) -> &'static str {
        match self {
            Diagnostic::B => "B",
            Diagnostic::Vtl => "VTL",
            Diagnostic::Vtu => "VTU",
        }
    }
}

/// Input payload for a diagnostic stage.
#[derive(Debug, Clone, Copy)]
pub struct StageInput<'a> {
    pub stack: &'a PressureLevelStack,
    pub tracks: &'a TrackTable,
}

/// One per-snapshot column, NaN where the value is not available.
#[derive(Debug, Clone)]
pub struct DiagnosticColumn {
    pub kind: Diagnostic,
    pub values: Array1<f64>,
}

/// Output produced by each stage.
#[derive(Debug, Clone, Default)]
pub struct StageOutput {
    pub columns: Vec<DiagnosticColumn>,
    pub notes: Vec<String>,
}

/// A pure computation over the normalized stack and the track table.
pub trait DiagnosticStage {
    fn name(&self) -> &'static str;
    fn execute(&self, input: &StageInput<'_>) -> CpsResult<StageOutput>;
}
