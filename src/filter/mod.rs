//! Filtering primitives for distance matrices and metadata.

pub mod cofilter;
pub mod report;

pub use cofilter::{co_filter, CoFilterResult};
pub use report::{FilterReport, ReportContext};
