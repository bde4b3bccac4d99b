pub mod config;
mod types;

pub use types::{NoOpReporter, ProgressReporter};
