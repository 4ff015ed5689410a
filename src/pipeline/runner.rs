//! Preparing an analysis from configuration and writing its inputs to disk.

use crate::analysis::{
    pairwise_comparisons, prepare_bioenv, prepare_group_significance, BioenvInput,
    GroupSignificanceInput, GroupTest,
};
use crate::config::{AnalysisConfig, AnalysisKind};
use crate::data::{DistanceMatrix, Metadata};
use crate::error::Result;
use serde::Serialize;
use std::fs;
use std::path::{Path, PathBuf};

/// Inputs prepared for one configured analysis.
#[derive(Debug, Clone)]
pub enum PreparedAnalysis {
    Bioenv(BioenvInput),
    GroupSignificance {
        input: GroupSignificanceInput,
        method: GroupTest,
        permutations: usize,
        pairwise: bool,
    },
}

/// Machine-readable summary written next to the prepared inputs.
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "analysis", rename_all = "snake_case")]
pub enum PreparationSummary {
    Bioenv {
        initial_dm_length: usize,
        filtered_dm_length: usize,
        non_numeric_cols: Vec<String>,
        zero_variance_cols: Vec<String>,
        variables: Vec<String>,
    },
    GroupSignificance {
        column: String,
        method: GroupTest,
        permutations: usize,
        initial_count: usize,
        filtered_count: usize,
        group_sizes: std::collections::BTreeMap<String, usize>,
        comparisons: Vec<(String, String)>,
    },
}

/// Load-time adjustments from the configuration, applied to raw metadata.
pub fn apply_config(metadata: Metadata, config: &AnalysisConfig) -> Result<Metadata> {
    if config.column_types.is_empty() {
        Ok(metadata)
    } else {
        metadata.with_column_types(config.column_type_overrides())
    }
}

/// Load metadata the way the configuration asks.
pub fn load_metadata<P: AsRef<Path>>(path: P, config: &AnalysisConfig) -> Result<Metadata> {
    let metadata = Metadata::from_tsv_with(path, &config.load_options())?;
    apply_config(metadata, config)
}

/// Prepare inputs for the configured analysis.
pub fn prepare(
    config: &AnalysisConfig,
    distance_matrix: &DistanceMatrix,
    metadata: &Metadata,
) -> Result<PreparedAnalysis> {
    config.validate()?;
    log::info!("Preparing analysis '{}'", config.name);

    match &config.analysis {
        AnalysisKind::Bioenv => Ok(PreparedAnalysis::Bioenv(prepare_bioenv(
            distance_matrix,
            metadata,
        )?)),
        AnalysisKind::GroupSignificance {
            column,
            method,
            permutations,
            pairwise,
        } => Ok(PreparedAnalysis::GroupSignificance {
            input: prepare_group_significance(distance_matrix, metadata, column)?,
            method: *method,
            permutations: *permutations,
            pairwise: *pairwise,
        }),
    }
}

impl PreparedAnalysis {
    /// The distance matrix the statistic will run on.
    pub fn distance_matrix(&self) -> &DistanceMatrix {
        match self {
            PreparedAnalysis::Bioenv(input) => &input.distance_matrix,
            PreparedAnalysis::GroupSignificance { input, .. } => &input.distance_matrix,
        }
    }

    pub fn summary(&self) -> PreparationSummary {
        match self {
            PreparedAnalysis::Bioenv(input) => PreparationSummary::Bioenv {
                initial_dm_length: input.report.initial_count,
                filtered_dm_length: input.report.filtered_count,
                non_numeric_cols: input.report.non_numeric_columns.clone(),
                zero_variance_cols: input.report.zero_variance_columns.clone(),
                variables: input.table.column_names().to_vec(),
            },
            PreparedAnalysis::GroupSignificance {
                input,
                method,
                permutations,
                pairwise,
            } => PreparationSummary::GroupSignificance {
                column: input.column.clone(),
                method: *method,
                permutations: *permutations,
                initial_count: input.initial_count,
                filtered_count: input.filtered_count(),
                group_sizes: input.grouping.group_sizes(),
                comparisons: if *pairwise {
                    pairwise_comparisons(input)
                } else {
                    Vec::new()
                },
            },
        }
    }

    /// Write prepared inputs into `dir`, returning the written paths.
    ///
    /// Always writes `distance-matrix.tsv` and `summary.json`; bioenv adds
    /// `metadata.tsv`, group significance adds `grouping.tsv`.
    pub fn write<P: AsRef<Path>>(&self, dir: P) -> Result<Vec<PathBuf>> {
        let dir = dir.as_ref();
        fs::create_dir_all(dir)?;
        let mut written = Vec::new();

        let dm_path = dir.join("distance-matrix.tsv");
        self.distance_matrix().to_tsv(&dm_path)?;
        written.push(dm_path);

        match self {
            PreparedAnalysis::Bioenv(input) => {
                let path = dir.join("metadata.tsv");
                input.metadata.to_tsv(&path)?;
                written.push(path);
            }
            PreparedAnalysis::GroupSignificance { input, .. } => {
                let path = dir.join("grouping.tsv");
                let mut writer = csv::WriterBuilder::new()
                    .delimiter(b'\t')
                    .from_path(&path)?;
                writer.write_record(["sample_id", input.column.as_str()])?;
                for (id, label) in input.grouping.ids.iter().zip(&input.grouping.labels) {
                    writer.write_record([id.as_str(), label.as_str()])?;
                }
                writer.flush()?;
                written.push(path);
            }
        }

        let summary_path = dir.join("summary.json");
        fs::write(&summary_path, serde_json::to_string_pretty(&self.summary())?)?;
        written.push(summary_path);

        Ok(written)
    }
}
