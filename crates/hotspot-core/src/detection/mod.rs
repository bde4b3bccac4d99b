pub mod components;
pub mod detector;
pub mod filtered;
pub mod morphology;
pub mod region;
pub mod threshold;

pub use detector::{DetectionResult, FrameDetector};
pub use region::{BoundingBox, Region};
