pub mod mean;
pub mod percentile;
