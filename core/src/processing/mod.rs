pub mod asymmetry;
pub mod hemisphere;
pub mod pipeline;
pub mod thermal_wind;

pub use asymmetry::{b_parameter, b_parameter_batch, AsymmetryStage};
pub use hemisphere::{HemisphereMasks, HemisphereSplit, Side};
pub use pipeline::{compute_cps_parameters, CpsPipeline};
pub use thermal_wind::{ThermalWind, ThermalWindResult, ThermalWindStage};
