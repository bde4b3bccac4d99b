pub mod metadata;
pub mod thermal;
pub mod thermal_writer;

use crate::error::Result;
use crate::frame::Frame;

pub use thermal::{ClipHeader, ThermalReader};

/// Ordered sequence of decoded thermal frames plus clip-level metadata.
pub trait FrameSource {
    fn header(&self) -> &ClipHeader;

    fn read_frame(&self, index: usize) -> Result<Frame>;

    fn frame_count(&self) -> usize {
        self.header().frame_count as usize
    }

    /// Decode every frame. The background pass needs the whole clip resident.
    fn read_all(&self) -> Result<Vec<Frame>> {
        (0..self.frame_count()).map(|i| self.read_frame(i)).collect()
    }
}
