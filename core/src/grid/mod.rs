pub mod levels;
pub mod polar;

pub use levels::{GeopotentialSnapshots, PressureLevelStack, CANONICAL_LEVEL_LABEL};
pub use polar::{area_weights, PolarAxes};
