//! Input preparation for bioenv.

use crate::analysis::{AnalysisError, BioenvBackend};
use crate::data::{DistanceMatrix, Metadata, NumericTable};
use crate::error::Result;
use crate::filter::{co_filter, FilterReport};
use serde::Serialize;

/// Co-filtered inputs for a bioenv run.
#[derive(Debug, Clone)]
pub struct BioenvInput {
    /// Distance matrix over the surviving samples.
    pub distance_matrix: DistanceMatrix,
    /// Complete numeric metadata with the same rows.
    pub metadata: Metadata,
    /// `metadata` as a dense table, rows in matrix order.
    pub table: NumericTable,
    /// What was excluded and why.
    pub report: FilterReport,
}

/// Backend output together with the filtering record.
#[derive(Debug, Clone, Serialize)]
pub struct BioenvReport<T> {
    pub filter: FilterReport,
    pub result: T,
}

/// Co-filter the inputs and convert metadata to a numeric table.
pub fn prepare_bioenv(distance_matrix: &DistanceMatrix, metadata: &Metadata) -> Result<BioenvInput> {
    let filtered = co_filter(distance_matrix, metadata)?;
    let table = filtered.metadata.to_numeric_table()?;
    Ok(BioenvInput {
        distance_matrix: filtered.distance_matrix,
        metadata: filtered.metadata,
        table,
        report: filtered.report,
    })
}

/// Prepare inputs and hand them to a bioenv backend.
pub fn run_bioenv<B: BioenvBackend>(
    distance_matrix: &DistanceMatrix,
    metadata: &Metadata,
    backend: &B,
) -> std::result::Result<BioenvReport<B::Output>, AnalysisError<B::Error>> {
    let input = prepare_bioenv(distance_matrix, metadata)?;
    log::debug!(
        "Running bioenv on {} samples x {} variables",
        input.table.n_samples(),
        input.table.n_columns()
    );
    let result = backend
        .bioenv(&input.distance_matrix, &input.table)
        .map_err(AnalysisError::Backend)?;
    Ok(BioenvReport {
        filter: input.report,
        result,
    })
}
