//! Dense numeric view of sample metadata.

use crate::data::{Metadata, Variable};
use crate::error::{BetaError, Result};
use nalgebra::DMatrix;

/// A rectangular samples × variables table of numeric metadata.
///
/// This is the form handed to statistics that correlate metadata with
/// distances (e.g. bioenv). Every cell is present.
#[derive(Debug, Clone, PartialEq)]
pub struct NumericTable {
    /// Values (samples × columns).
    matrix: DMatrix<f64>,
    /// Column names.
    column_names: Vec<String>,
    /// Sample IDs (rows).
    sample_ids: Vec<String>,
}

impl NumericTable {
    /// Create a table directly from components.
    pub fn from_matrix(
        matrix: DMatrix<f64>,
        column_names: Vec<String>,
        sample_ids: Vec<String>,
    ) -> Result<Self> {
        if matrix.nrows() != sample_ids.len() {
            return Err(BetaError::DimensionMismatch {
                expected: matrix.nrows(),
                actual: sample_ids.len(),
            });
        }
        if matrix.ncols() != column_names.len() {
            return Err(BetaError::DimensionMismatch {
                expected: matrix.ncols(),
                actual: column_names.len(),
            });
        }
        Ok(Self {
            matrix,
            column_names,
            sample_ids,
        })
    }

    /// Build a table from metadata whose columns are all numeric and complete.
    pub fn from_metadata(metadata: &Metadata) -> Result<Self> {
        let sample_ids = metadata.sample_ids().to_vec();
        let column_names = metadata.column_names().to_vec();

        for col in &column_names {
            if !metadata.is_numeric(col) {
                return Err(BetaError::InvalidVariableType {
                    column: col.clone(),
                    reason: "column is not numeric".to_string(),
                });
            }
        }

        let mut matrix = DMatrix::zeros(sample_ids.len(), column_names.len());
        for (i, sid) in sample_ids.iter().enumerate() {
            for (j, col) in column_names.iter().enumerate() {
                let value = metadata
                    .get(sid, col)
                    .and_then(Variable::as_f64)
                    .filter(|v| v.is_finite())
                    .ok_or_else(|| BetaError::MissingValue {
                        sample: sid.clone(),
                        column: col.clone(),
                    })?;
                matrix[(i, j)] = value;
            }
        }

        Ok(Self {
            matrix,
            column_names,
            sample_ids,
        })
    }

    /// Get the underlying matrix.
    pub fn matrix(&self) -> &DMatrix<f64> {
        &self.matrix
    }

    /// Get column names.
    pub fn column_names(&self) -> &[String] {
        &self.column_names
    }

    /// Get sample IDs.
    pub fn sample_ids(&self) -> &[String] {
        &self.sample_ids
    }

    /// Number of samples (rows).
    pub fn n_samples(&self) -> usize {
        self.matrix.nrows()
    }

    /// Number of columns.
    pub fn n_columns(&self) -> usize {
        self.matrix.ncols()
    }

    /// Get the index of a column by name.
    pub fn column_index(&self, name: &str) -> Option<usize> {
        self.column_names.iter().position(|n| n == name)
    }

    /// Values of one column, in sample order.
    pub fn column_values(&self, name: &str) -> Result<Vec<f64>> {
        let idx = self
            .column_index(name)
            .ok_or_else(|| BetaError::MissingColumn(name.to_string()))?;
        Ok(self.matrix.column(idx).iter().copied().collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    fn create_test_metadata() -> Metadata {
        let mut file = NamedTempFile::new().unwrap();
        writeln!(file, "sample_id\tage\tph").unwrap();
        writeln!(file, "S1\t25\t6.5").unwrap();
        writeln!(file, "S2\t30\t7.0").unwrap();
        writeln!(file, "S3\t35\t7.5").unwrap();
        file.flush().unwrap();
        Metadata::from_tsv(file.path()).unwrap()
    }

    #[test]
    fn test_from_metadata() {
        let meta = create_test_metadata();
        let table = NumericTable::from_metadata(&meta).unwrap();

        assert_eq!(table.n_samples(), 3);
        assert_eq!(table.n_columns(), 2);
        assert_eq!(table.matrix()[(1, 0)], 30.0);
        assert_eq!(table.column_values("ph").unwrap(), vec![6.5, 7.0, 7.5]);
    }

    #[test]
    fn test_rejects_categorical() {
        let mut file = NamedTempFile::new().unwrap();
        writeln!(file, "sample_id\tgroup").unwrap();
        writeln!(file, "S1\tgut").unwrap();
        file.flush().unwrap();
        let meta = Metadata::from_tsv(file.path()).unwrap();

        let result = NumericTable::from_metadata(&meta);
        assert!(matches!(result, Err(BetaError::InvalidVariableType { .. })));
    }

    #[test]
    fn test_rejects_missing_cell() {
        let mut file = NamedTempFile::new().unwrap();
        writeln!(file, "sample_id\tage").unwrap();
        writeln!(file, "S1\t25").unwrap();
        writeln!(file, "S2\tNA").unwrap();
        file.flush().unwrap();
        let meta = Metadata::from_tsv(file.path()).unwrap();

        let result = NumericTable::from_metadata(&meta);
        assert!(matches!(
            result,
            Err(BetaError::MissingValue { sample, .. }) if sample == "S2"
        ));
    }

    #[test]
    fn test_from_matrix_dimension_check() {
        let result = NumericTable::from_matrix(
            DMatrix::zeros(2, 1),
            vec!["a".to_string()],
            vec!["S1".to_string()],
        );
        assert!(matches!(result, Err(BetaError::DimensionMismatch { .. })));
    }
}
