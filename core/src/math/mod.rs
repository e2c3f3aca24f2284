pub mod angle;
pub mod stats;

pub use angle::{circular_distance, nearest_azimuth, wrap_degrees};
pub use stats::StatsHelper;
