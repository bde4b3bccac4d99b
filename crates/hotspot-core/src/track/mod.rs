pub mod assembler;
pub mod lifecycle;
pub mod stats;

pub use assembler::TrackAssembler;
pub use lifecycle::{Track, TrackState};
pub use stats::TrackMovementStatistics;
