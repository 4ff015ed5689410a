//! Bookkeeping for what the co-filter excluded.

use serde::{Deserialize, Serialize};

/// Record of one co-filtering run.
///
/// Always produced on success so a report can state exactly which samples
/// and columns were excluded and why.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FilterReport {
    /// Samples in the distance matrix before row filtering.
    pub initial_count: usize,
    /// Samples surviving row filtering.
    pub filtered_count: usize,
    /// Columns dropped for not being numeric, sorted.
    pub non_numeric_columns: Vec<String>,
    /// Numeric columns dropped for zero variance or being all missing, sorted.
    pub zero_variance_columns: Vec<String>,
}

impl FilterReport {
    /// Number of samples dropped.
    pub fn n_dropped(&self) -> usize {
        self.initial_count.saturating_sub(self.filtered_count)
    }

    /// All dropped columns, non-numeric first.
    pub fn dropped_columns(&self) -> Vec<&str> {
        self.non_numeric_columns
            .iter()
            .chain(&self.zero_variance_columns)
            .map(String::as_str)
            .collect()
    }

    /// Flatten into the values a rendered report shows.
    pub fn context(&self) -> ReportContext {
        ReportContext {
            initial_dm_length: self.initial_count,
            filtered_dm_length: self.filtered_count,
            non_numeric_cols: self.non_numeric_columns.join(", "),
            zero_variance_cols: self.zero_variance_columns.join(", "),
        }
    }
}

impl std::fmt::Display for FilterReport {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        writeln!(f, "Co-filter Report")?;
        writeln!(f, "  Samples before:  {}", self.initial_count)?;
        writeln!(f, "  Samples after:   {}", self.filtered_count)?;
        writeln!(f, "  Samples removed: {}", self.n_dropped())?;
        if !self.non_numeric_columns.is_empty() {
            writeln!(f, "  Non-numeric columns:   {}", self.non_numeric_columns.join(", "))?;
        }
        if !self.zero_variance_columns.is_empty() {
            writeln!(f, "  Zero-variance columns: {}", self.zero_variance_columns.join(", "))?;
        }
        Ok(())
    }
}

/// Report fields as flat display values.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReportContext {
    pub initial_dm_length: usize,
    pub filtered_dm_length: usize,
    /// Comma-separated, sorted.
    pub non_numeric_cols: String,
    /// Comma-separated, sorted.
    pub zero_variance_cols: String,
}
