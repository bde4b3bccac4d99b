/// Minimum pixel count (h*w) to use row-level Rayon parallelism.
pub const PARALLEL_PIXEL_THRESHOLD: usize = 65_536;

/// Per-pixel percentile (across the clip) used as the statistical background.
pub const BACKGROUND_PERCENTILE: f64 = 10.0;

/// Offset added to the per-frame median when no background model is available.
pub const NO_BACKGROUND_OFFSET: f32 = 40.0;

/// Side length of the blur kernel applied before thresholding.
pub const DETECTION_BLUR_KERNEL_SIZE: usize = 5;

/// Number of output bucket folders used to shard per-file artifacts.
pub const DEFAULT_BUCKET_COUNT: u64 = 256;

/// Multiplier of the polynomial filename hash.
pub const BUCKET_HASH_SEED: u64 = 31;

/// Rayon threads each worker process allows itself.
pub const DEFAULT_THREADS_PER_WORKER: usize = 2;

/// Extension of source clip containers.
pub const DEFAULT_SOURCE_EXTENSION: &str = "thv";

/// Extension of the sidecar metadata file next to each clip.
pub const METADATA_EXTENSION: &str = "txt";

/// File name of the track store inside the tracks folder.
pub const DATABASE_FILE_NAME: &str = "dataset.json";

/// File name of the advisory lock guarding the track store.
pub const LOCK_FILE_NAME: &str = "dataset.lock";

// Tracking defaults.

pub const DEFAULT_EDGE_PIXELS: usize = 1;
pub const DEFAULT_IGNORE_FRAMES: usize = 2;
pub const DEFAULT_DELTA_THRESH: f32 = 20.0;
pub const DEFAULT_TEMP_THRESH: f32 = 2900.0;
pub const DEFAULT_THRESHOLD_PERCENTILE: f64 = 99.9;
pub const DEFAULT_MIN_THRESHOLD: f32 = 30.0;
pub const DEFAULT_MAX_THRESHOLD: f32 = 50.0;
pub const DEFAULT_STATIC_BACKGROUND_THRESHOLD: f32 = 4.0;
pub const DEFAULT_DILATION_PIXELS: usize = 2;
pub const DEFAULT_MIN_TAG_CONFIDENCE: f64 = 0.8;

/// Flow vectors shorter than this (pixels per frame) are zeroed.
pub const DEFAULT_FLOW_THRESHOLD: f32 = 0.2;

/// Maximum centroid distance (pixels) for a region to continue a track.
pub const DEFAULT_MAX_MATCH_DISTANCE: f64 = 10.0;

// Optical flow pyramid settings.

pub const FAST_FLOW_SCALES: usize = 3;
pub const FAST_FLOW_WARPS: usize = 3;
pub const FAST_FLOW_SCALE_STEP: f32 = 0.5;
pub const FAST_FLOW_ITERATIONS: usize = 20;

pub const HQ_FLOW_SCALES: usize = 5;
pub const HQ_FLOW_WARPS: usize = 5;
pub const HQ_FLOW_SCALE_STEP: f32 = 0.8;
pub const HQ_FLOW_ITERATIONS: usize = 50;

/// Smoothness weight of the variational flow energy.
pub const FLOW_SMOOTHNESS: f32 = 0.15;

/// Gaussian blur sigma used when building flow pyramids.
pub const PYRAMID_BLUR_SIGMA: f32 = 1.0;

/// Smallest pyramid level side length; coarser levels are skipped.
pub const MIN_PYRAMID_SIDE: usize = 8;

/// Score caps for track movement statistics.
pub const MOVEMENT_POINTS_CAP: f64 = 100.0;
pub const DELTA_POINTS_CAP: f64 = 100.0;
pub const DELTA_POINTS_WEIGHT: f64 = 25.0;
