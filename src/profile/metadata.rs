//! Per-column profiling of sample metadata.

use crate::data::{Metadata, Variable, VariableType};
use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

/// Semantic kind of a column over the current samples.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ColumnKind {
    Numeric,
    Categorical,
    /// No present values.
    MissingOnly,
}

impl ColumnKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ColumnKind::Numeric => "numeric",
            ColumnKind::Categorical => "categorical",
            ColumnKind::MissingOnly => "missing-only",
        }
    }
}

/// Profile of one metadata column.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ColumnProfile {
    /// Column name.
    pub name: String,
    /// Declared type.
    pub variable_type: VariableType,
    /// Derived kind.
    pub kind: ColumnKind,
    /// Number of missing values.
    pub n_missing: usize,
    /// Number of distinct present values.
    pub n_distinct: usize,
    /// Sample variance (n - 1 denominator) of a numeric column with at least
    /// two present values.
    pub variance: Option<f64>,
}

impl ColumnProfile {
    /// Whether the co-filter would keep this column before row filtering.
    pub fn is_informative(&self) -> bool {
        self.kind == ColumnKind::Numeric && self.n_distinct > 1
    }
}

/// Profile of all columns of a metadata table.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MetadataProfile {
    /// Number of samples.
    pub n_samples: usize,
    /// Samples with no missing value in any column.
    pub n_complete_samples: usize,
    /// One entry per column, in column order.
    pub columns: Vec<ColumnProfile>,
}

impl MetadataProfile {
    /// Columns of the given kind.
    pub fn columns_of_kind(&self, kind: ColumnKind) -> Vec<&ColumnProfile> {
        self.columns.iter().filter(|c| c.kind == kind).collect()
    }
}

impl std::fmt::Display for MetadataProfile {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        writeln!(f, "Metadata Profile")?;
        writeln!(f, "  Samples:          {}", self.n_samples)?;
        writeln!(f, "  Complete samples: {}", self.n_complete_samples)?;
        writeln!(f, "  Columns:          {}", self.columns.len())?;
        for col in &self.columns {
            write!(
                f,
                "    {:<20} {:<13} missing={:<4} distinct={:<4}",
                col.name,
                col.kind.as_str(),
                col.n_missing,
                col.n_distinct
            )?;
            match col.variance {
                Some(v) => writeln!(f, " variance={:.4}", v)?,
                None => writeln!(f)?,
            }
        }
        Ok(())
    }
}

/// Profile every column of a metadata table.
pub fn profile_metadata(metadata: &Metadata) -> MetadataProfile {
    let columns: Vec<ColumnProfile> = metadata
        .column_names()
        .par_iter()
        .filter_map(|name| profile_column(metadata, name))
        .collect();

    MetadataProfile {
        n_samples: metadata.n_samples(),
        n_complete_samples: metadata.drop_missing_rows().n_samples(),
        columns,
    }
}

fn profile_column(metadata: &Metadata, name: &str) -> Option<ColumnProfile> {
    let variable_type = metadata.column_type(name)?;
    let values = metadata.column(name).ok()?;
    let n_missing = values.iter().filter(|v| v.is_missing()).count();

    let (kind, n_distinct, variance) = if n_missing == values.len() {
        (ColumnKind::MissingOnly, 0, None)
    } else if variable_type.is_numeric() {
        let present: Vec<f64> = values.iter().filter_map(|v| v.as_f64()).collect();
        let distinct: BTreeSet<u64> = present.iter().map(|x| x.to_bits()).collect();
        (ColumnKind::Numeric, distinct.len(), sample_variance(&present))
    } else {
        let distinct: BTreeSet<&str> = values
            .iter()
            .filter_map(|v| match v {
                Variable::Categorical(s) => Some(s.as_str()),
                _ => None,
            })
            .collect();
        (ColumnKind::Categorical, distinct.len(), None)
    };

    Some(ColumnProfile {
        name: name.to_string(),
        variable_type,
        kind,
        n_missing,
        n_distinct,
        variance,
    })
}

fn sample_variance(values: &[f64]) -> Option<f64> {
    if values.len() < 2 {
        return None;
    }
    let n = values.len() as f64;
    let mean = values.iter().sum::<f64>() / n;
    Some(values.iter().map(|x| (x - mean).powi(2)).sum::<f64>() / (n - 1.0))
}
