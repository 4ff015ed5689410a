//! Running group significance tests through a backend.

use crate::analysis::{
    pairwise_comparisons, AnalysisError, GroupSignificanceInput, GroupTest, GroupTestBackend,
};
use crate::correct::benjamini_hochberg;
use crate::error::{BetaError, Result};
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Summary returned by a group test backend.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GroupTestOutcome {
    pub method: GroupTest,
    pub test_statistic: f64,
    pub p_value: f64,
    pub sample_size: usize,
    pub number_of_groups: usize,
    pub permutations: usize,
}

/// Outcome of one pairwise comparison.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PairwiseResult {
    pub group1: String,
    pub group2: String,
    pub sample_size: usize,
    pub permutations: usize,
    pub test_statistic: f64,
    pub p_value: f64,
    /// Benjamini-Hochberg adjusted across all pairs.
    pub q_value: f64,
}

/// Overall and pairwise outcomes for one grouping column.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GroupSignificanceReport {
    pub column: String,
    pub method: GroupTest,
    pub initial_count: usize,
    pub filtered_count: usize,
    pub overall: GroupTestOutcome,
    pub pairwise: Vec<PairwiseResult>,
}

impl GroupSignificanceReport {
    /// Write pairwise results as TSV.
    pub fn write_pairwise_tsv<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let mut writer = csv::WriterBuilder::new()
            .delimiter(b'\t')
            .from_path(path)?;
        for row in &self.pairwise {
            writer.serialize(row)?;
        }
        writer.flush()?;
        Ok(())
    }
}

impl std::fmt::Display for GroupSignificanceReport {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        writeln!(f, "Group Significance ({}) on '{}'", self.method, self.column)?;
        writeln!(f, "  Samples:      {} of {}", self.filtered_count, self.initial_count)?;
        writeln!(f, "  Groups:       {}", self.overall.number_of_groups)?;
        writeln!(
            f,
            "  {}: {:.4}  p = {:.4} ({} permutations)",
            self.method.statistic_name(),
            self.overall.test_statistic,
            self.overall.p_value,
            self.overall.permutations
        )?;
        for pair in &self.pairwise {
            writeln!(
                f,
                "    {} vs {}: stat = {:.4}, p = {:.4}, q = {:.4}",
                pair.group1, pair.group2, pair.test_statistic, pair.p_value, pair.q_value
            )?;
        }
        Ok(())
    }
}

/// Run a group test over all groups and, optionally, every pair of groups.
pub fn run_group_significance<B: GroupTestBackend>(
    input: &GroupSignificanceInput,
    method: GroupTest,
    permutations: usize,
    pairwise: bool,
    backend: &B,
) -> std::result::Result<GroupSignificanceReport, AnalysisError<B::Error>> {
    if permutations == 0 {
        return Err(BetaError::InvalidParameter(
            "permutations must be greater than zero".to_string(),
        )
        .into());
    }

    let overall = backend
        .test(method, &input.distance_matrix, &input.grouping, permutations)
        .map_err(AnalysisError::Backend)?;

    let mut pairwise_results = Vec::new();
    if pairwise {
        for (group1, group2) in pairwise_comparisons(input) {
            let grouping = input.grouping.restrict(&[group1.as_str(), group2.as_str()]);
            let distance_matrix = input.distance_matrix.filter(&grouping.ids)?;
            log::debug!(
                "Pairwise {} vs {}: {} samples",
                group1,
                group2,
                grouping.len()
            );
            let outcome = backend
                .test(method, &distance_matrix, &grouping, permutations)
                .map_err(AnalysisError::Backend)?;
            pairwise_results.push(PairwiseResult {
                group1,
                group2,
                sample_size: outcome.sample_size,
                permutations: outcome.permutations,
                test_statistic: outcome.test_statistic,
                p_value: outcome.p_value,
                q_value: f64::NAN,
            });
        }

        let p_values: Vec<f64> = pairwise_results.iter().map(|r| r.p_value).collect();
        for (result, q) in pairwise_results.iter_mut().zip(benjamini_hochberg(&p_values)) {
            result.q_value = q;
        }
    }

    Ok(GroupSignificanceReport {
        column: input.column.clone(),
        method,
        initial_count: input.initial_count,
        filtered_count: input.filtered_count(),
        overall,
        pairwise: pairwise_results,
    })
}
