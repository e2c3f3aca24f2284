//! Hart Cyclone Phase Space diagnostics for tropical-cyclone track points.
//!
//! Geopotential-height snapshots sampled on a polar (radius, azimuth) grid
//! around each track point are reduced to the thermal asymmetry `B` and the
//! lower/upper thermal winds `VTL` and `VTU`.

pub mod grid;
pub mod math;
pub mod prelude;
pub mod processing;
pub mod telemetry;
pub mod tracks;

pub use grid::{GeopotentialSnapshots, PolarAxes, PressureLevelStack};
pub use prelude::{CpsConfig, CpsError, CpsResult, Diagnostic, ThermalWindMethod, TimeFields};
pub use processing::{compute_cps_parameters, CpsPipeline};
pub use tracks::{TrackColumns, TrackInput, TrackPoint, TrackTable};
