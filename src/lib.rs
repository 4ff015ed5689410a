//! Composable Beta-Diversity Analysis Preparation Library
//!
//! This library provides modular primitives for preparing distance matrices
//! and sample metadata for distance-based statistics such as bioenv,
//! PERMANOVA, ANOSIM and PERMDISP. The statistics themselves are supplied by
//! an external backend.
//!
//! # Overview
//!
//! The library is organized into composable modules:
//!
//! - **data**: Core data structures (DistanceMatrix, Metadata, NumericTable)
//! - **filter**: Co-filtering of a distance matrix with its metadata
//! - **profile**: Metadata profiling (column kinds, missingness, variance)
//! - **analysis**: Backend seams and input preparation for bioenv and group tests
//! - **correct**: Multiple testing correction (Benjamini-Hochberg)
//! - **config**: YAML analysis configuration
//! - **pipeline**: Configured preparation and output writing
//!
//! # Example
//!
//! ```no_run
//! use composable_beta::prelude::*;
//!
//! let dm = DistanceMatrix::from_tsv("distance-matrix.tsv").unwrap();
//! let metadata = Metadata::from_tsv("metadata.tsv").unwrap();
//!
//! let result = co_filter(&dm, &metadata).unwrap();
//! println!("{}", result.report);
//! let table = result.metadata.to_numeric_table().unwrap();
//! assert_eq!(table.sample_ids(), result.distance_matrix.ids());
//! ```

pub mod analysis;
pub mod config;
pub mod correct;
pub mod data;
pub mod error;
pub mod filter;
pub mod pipeline;
pub mod profile;

/// Convenient re-exports for common usage.
pub mod prelude {
    pub use crate::analysis::{
        pairwise_comparisons, prepare_bioenv, prepare_group_significance, run_bioenv,
        run_group_significance, AnalysisError, BioenvBackend, BioenvInput, BioenvReport,
        GroupSignificanceInput, GroupSignificanceReport, GroupTest, GroupTestBackend,
        GroupTestOutcome, Grouping, PairwiseResult,
    };
    pub use crate::config::{AnalysisConfig, AnalysisKind};
    pub use crate::correct::{benjamini_hochberg, correct_bh, BhCorrected};
    pub use crate::data::{
        ColumnFilter, ColumnType, DistanceMatrix, LoadOptions, Metadata, NumericTable, Variable,
        VariableType,
    };
    pub use crate::error::{BetaError, Result};
    pub use crate::filter::{co_filter, CoFilterResult, FilterReport, ReportContext};
    pub use crate::pipeline::{prepare, PreparationSummary, PreparedAnalysis};
    pub use crate::profile::{profile_metadata, ColumnKind, ColumnProfile, MetadataProfile};
}
