//! Preparation of inputs for distance-based statistics.
//!
//! The statistics themselves (bioenv, PERMANOVA, ANOSIM, PERMDISP) are
//! provided by an external backend through [`BioenvBackend`] and
//! [`GroupTestBackend`]. This module shapes the distance matrix and metadata
//! into what those backends consume and collects their outputs.

pub mod bioenv;
pub mod group;
pub mod significance;

pub use bioenv::{prepare_bioenv, run_bioenv, BioenvInput, BioenvReport};
pub use group::{
    pairwise_comparisons, prepare_group_significance, GroupSignificanceInput, GroupTest, Grouping,
};
pub use significance::{
    run_group_significance, GroupSignificanceReport, GroupTestOutcome, PairwiseResult,
};

use crate::data::{DistanceMatrix, NumericTable};
use crate::error::BetaError;
use thiserror::Error;

/// Ranks subsets of numeric metadata variables by their correlation with
/// distances.
pub trait BioenvBackend {
    /// Ranked result produced by the backend.
    type Output;
    /// Error type for backend failures.
    type Error;

    /// Run bioenv over a co-filtered matrix and table with identical rows.
    fn bioenv(
        &self,
        distance_matrix: &DistanceMatrix,
        table: &NumericTable,
    ) -> std::result::Result<Self::Output, Self::Error>;
}

/// Permutation test of group separation or dispersion in distance space.
pub trait GroupTestBackend {
    /// Error type for backend failures.
    type Error;

    /// Test whether the groups differ.
    fn test(
        &self,
        method: GroupTest,
        distance_matrix: &DistanceMatrix,
        grouping: &Grouping,
        permutations: usize,
    ) -> std::result::Result<GroupTestOutcome, Self::Error>;
}

/// Failure of an analysis run.
///
/// Backend errors are carried as-is.
#[derive(Debug, Error)]
pub enum AnalysisError<E> {
    #[error(transparent)]
    Prepare(#[from] BetaError),

    #[error("statistics backend failed: {0}")]
    Backend(E),
}
