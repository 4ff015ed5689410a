//! Co-filtering of a distance matrix and its sample metadata.
//!
//! Reduces a (distance matrix, metadata) pair to a mutually consistent pair
//! ready for statistics that relate numeric metadata to distances:
//!
//! 1. Restrict metadata rows to the distance matrix IDs (all must be present)
//! 2. Keep numeric columns only
//! 3. Drop numeric columns that are all missing or have zero variance
//! 4. Drop samples with a missing value in any remaining column
//! 5. Restrict the distance matrix to the surviving samples
//!
//! Dropping samples in step 4 can leave a column constant over the
//! survivors. Such columns are dropped as zero-variance and step 4 is
//! repeated on the remaining columns until every column varies.
//!
//! All constant columns are dropped together. When only one sample has a
//! complete row, every column is constant over it, so all of them are
//! reported as zero-variance and the result keeps every sample with no
//! columns.

use crate::data::{ColumnFilter, ColumnType, DistanceMatrix, Metadata};
use crate::error::{BetaError, Result};
use crate::filter::FilterReport;
use std::collections::BTreeSet;

/// Output of [`co_filter`].
#[derive(Debug, Clone)]
pub struct CoFilterResult {
    /// Distance matrix restricted to the surviving samples.
    pub distance_matrix: DistanceMatrix,
    /// Complete numeric metadata over the same samples.
    pub metadata: Metadata,
    /// What was excluded and why.
    pub report: FilterReport,
}

/// Co-filter a distance matrix and metadata.
///
/// # Errors
/// * `MissingIdentifiers` if any distance matrix sample has no metadata row
/// * `EmptyResult` if no sample has a complete set of retained values
pub fn co_filter(distance_matrix: &DistanceMatrix, metadata: &Metadata) -> Result<CoFilterResult> {
    let metadata = metadata.filter_ids(distance_matrix.ids())?;

    let numeric = metadata.filter_columns(&ColumnFilter::of_type(ColumnType::Numeric));
    let non_numeric_columns = dropped(&metadata, &numeric);

    let mut informative = numeric.filter_columns(&ColumnFilter::informative());
    let mut complete = informative.drop_missing_rows();
    loop {
        let constant: Vec<&String> = complete
            .column_names()
            .iter()
            .filter(|c| complete.has_zero_variance(c))
            .collect();
        if constant.is_empty() || complete.n_samples() == 0 {
            break;
        }
        log::debug!(
            "{} column(s) constant after dropping incomplete samples",
            constant.len()
        );
        let keep: Vec<String> = informative
            .column_names()
            .iter()
            .filter(|c| !constant.contains(c))
            .cloned()
            .collect();
        informative = informative.select_columns(&keep)?;
        complete = informative.drop_missing_rows();
    }
    let zero_variance_columns = dropped(&numeric, &informative);

    let initial_count = distance_matrix.n_samples();
    if complete.n_samples() == 0 {
        return Err(BetaError::EmptyResult(format!(
            "all {} samples have a missing value in at least one of {} retained column(s)",
            initial_count,
            complete.n_columns()
        )));
    }
    let distance_matrix = distance_matrix.filter(complete.sample_ids())?;
    let filtered_count = distance_matrix.n_samples();

    log::debug!(
        "Dropped {} non-numeric and {} zero-variance column(s)",
        non_numeric_columns.len(),
        zero_variance_columns.len()
    );
    log::info!(
        "Co-filter kept {} of {} samples and {} column(s)",
        filtered_count,
        initial_count,
        complete.n_columns()
    );
    if complete.n_columns() == 0 {
        log::warn!("Every metadata column was excluded");
    }

    // Row order of the metadata follows the filtered matrix.
    let metadata = complete.filter_ids(distance_matrix.ids())?;

    Ok(CoFilterResult {
        distance_matrix,
        metadata,
        report: FilterReport {
            initial_count,
            filtered_count,
            non_numeric_columns,
            zero_variance_columns,
        },
    })
}

fn dropped(before: &Metadata, after: &Metadata) -> Vec<String> {
    let kept: BTreeSet<&String> = after.column_names().iter().collect();
    let removed: BTreeSet<&String> = before
        .column_names()
        .iter()
        .filter(|c| !kept.contains(c))
        .collect();
    removed.into_iter().cloned().collect()
}
