//! Configured analysis preparation.

mod runner;

pub use runner::{apply_config, load_metadata, prepare, PreparationSummary, PreparedAnalysis};
