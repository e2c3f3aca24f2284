pub mod ingest;
pub mod motion;
pub mod record;

pub use ingest::{TrackColumns, TrackInput};
pub use record::{TrackPoint, TrackTable};
