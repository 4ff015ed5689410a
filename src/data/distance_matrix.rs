//! Dense symmetric distance matrix over sample identifiers.

use crate::error::{BetaError, Result};
use nalgebra::DMatrix;
use std::collections::{HashMap, HashSet};
use std::fs::File;
use std::io::{BufRead, BufReader, BufWriter, Write};
use std::path::Path;

/// A square, symmetric, hollow matrix of pairwise dissimilarities.
///
/// Rows and columns are indexed by the same unique sample identifiers.
/// The matrix is immutable once constructed; [`DistanceMatrix::filter`]
/// produces a new matrix restricted to a subset of identifiers.
#[derive(Debug, Clone, PartialEq)]
pub struct DistanceMatrix {
    /// Dense distances (samples × samples).
    data: DMatrix<f64>,
    /// Sample identifiers, in row/column order.
    ids: Vec<String>,
    /// Identifier -> row index.
    index: HashMap<String, usize>,
}

impl DistanceMatrix {
    /// Create a distance matrix from dense data and identifiers.
    ///
    /// Validates that the matrix is non-empty and square, that there is one
    /// unique identifier per row, that every value is finite and
    /// non-negative, that the diagonal is zero and that the matrix is
    /// symmetric.
    pub fn new(data: DMatrix<f64>, ids: Vec<String>) -> Result<Self> {
        let (nrows, ncols) = data.shape();
        if nrows == 0 {
            return Err(BetaError::EmptyData(
                "Distance matrix must contain at least one sample".to_string(),
            ));
        }
        if nrows != ncols {
            return Err(BetaError::InvalidDistanceMatrix(format!(
                "matrix must be square, got {} x {}",
                nrows, ncols
            )));
        }
        if ids.len() != nrows {
            return Err(BetaError::DimensionMismatch {
                expected: nrows,
                actual: ids.len(),
            });
        }

        let mut index = HashMap::with_capacity(ids.len());
        for (i, id) in ids.iter().enumerate() {
            if index.insert(id.clone(), i).is_some() {
                return Err(BetaError::DuplicateId(id.clone()));
            }
        }

        for i in 0..nrows {
            if data[(i, i)] != 0.0 {
                return Err(BetaError::InvalidDistanceMatrix(format!(
                    "diagonal entry for '{}' is {}, expected 0",
                    ids[i],
                    data[(i, i)]
                )));
            }
            for j in (i + 1)..ncols {
                let d = data[(i, j)];
                if !d.is_finite() || d < 0.0 {
                    return Err(BetaError::InvalidDistanceMatrix(format!(
                        "distance between '{}' and '{}' is {}, expected a non-negative finite value",
                        ids[i], ids[j], d
                    )));
                }
                if d != data[(j, i)] {
                    return Err(BetaError::InvalidDistanceMatrix(format!(
                        "matrix is not symmetric at ('{}', '{}')",
                        ids[i], ids[j]
                    )));
                }
            }
        }

        Ok(Self { data, ids, index })
    }

    /// Build a distance matrix from row-major nested vectors.
    pub fn from_rows(rows: Vec<Vec<f64>>, ids: Vec<String>) -> Result<Self> {
        let n = rows.len();
        for row in &rows {
            if row.len() != n {
                return Err(BetaError::DimensionMismatch {
                    expected: n,
                    actual: row.len(),
                });
            }
        }
        let data = DMatrix::from_fn(n, n, |i, j| rows[i][j]);
        Self::new(data, ids)
    }

    /// Load a distance matrix from a TSV file.
    ///
    /// Expected format:
    /// - First row: an ignored corner cell followed by the sample IDs
    /// - Subsequent rows: sample ID followed by distances, in header order
    pub fn from_tsv<P: AsRef<Path>>(path: P) -> Result<Self> {
        let file = File::open(path)?;
        let reader = BufReader::new(file);
        let mut lines = reader.lines();

        let header_line = lines
            .next()
            .ok_or_else(|| BetaError::EmptyData("Empty distance matrix file".to_string()))??;
        let header: Vec<&str> = header_line.split('\t').collect();
        if header.len() < 2 {
            return Err(BetaError::EmptyData(
                "Distance matrix must have at least one sample".to_string(),
            ));
        }
        let ids: Vec<String> = header[1..].iter().map(|s| s.trim().to_string()).collect();
        let n = ids.len();

        let mut rows: Vec<Vec<f64>> = Vec::with_capacity(n);
        for line_result in lines {
            let line = line_result?;
            if line.trim().is_empty() {
                continue;
            }
            let row_idx = rows.len();
            let fields: Vec<&str> = line.split('\t').collect();
            let row_id = fields[0].trim();
            if row_idx >= n {
                return Err(BetaError::DimensionMismatch {
                    expected: n,
                    actual: row_idx + 1,
                });
            }
            if row_id != ids[row_idx] {
                return Err(BetaError::InvalidDistanceMatrix(format!(
                    "row {} is labelled '{}' but column {} is '{}'",
                    row_idx, row_id, row_idx, ids[row_idx]
                )));
            }
            if fields.len() - 1 != n {
                return Err(BetaError::DimensionMismatch {
                    expected: n,
                    actual: fields.len() - 1,
                });
            }

            let row = fields[1..]
                .iter()
                .enumerate()
                .map(|(col_idx, raw)| {
                    raw.trim().parse::<f64>().map_err(|_| BetaError::InvalidValue {
                        value: raw.to_string(),
                        row: row_idx,
                        col: col_idx,
                    })
                })
                .collect::<Result<Vec<f64>>>()?;
            rows.push(row);
        }

        if rows.len() != n {
            return Err(BetaError::DimensionMismatch {
                expected: n,
                actual: rows.len(),
            });
        }

        Self::from_rows(rows, ids)
    }

    /// Write the distance matrix to a TSV file.
    pub fn to_tsv<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let file = File::create(path)?;
        let mut writer = BufWriter::new(file);

        for id in &self.ids {
            write!(writer, "\t{}", id)?;
        }
        writeln!(writer)?;

        for (i, id) in self.ids.iter().enumerate() {
            write!(writer, "{}", id)?;
            for j in 0..self.n_samples() {
                write!(writer, "\t{}", self.data[(i, j)])?;
            }
            writeln!(writer)?;
        }
        writer.flush()?;

        Ok(())
    }

    /// Sample identifiers in row/column order.
    #[inline]
    pub fn ids(&self) -> &[String] {
        &self.ids
    }

    /// Number of samples.
    #[inline]
    pub fn n_samples(&self) -> usize {
        self.ids.len()
    }

    /// Matrix shape (always square).
    #[inline]
    pub fn shape(&self) -> (usize, usize) {
        self.data.shape()
    }

    /// Underlying dense matrix.
    #[inline]
    pub fn data(&self) -> &DMatrix<f64> {
        &self.data
    }

    /// Distance at (row, col).
    #[inline]
    pub fn get(&self, row: usize, col: usize) -> f64 {
        self.data[(row, col)]
    }

    /// Row index of a sample, if present.
    pub fn index_of(&self, id: &str) -> Option<usize> {
        self.index.get(id).copied()
    }

    /// Check whether a sample is present.
    pub fn contains(&self, id: &str) -> bool {
        self.index.contains_key(id)
    }

    /// Distance between two samples by identifier.
    pub fn distance(&self, a: &str, b: &str) -> Option<f64> {
        let i = self.index_of(a)?;
        let j = self.index_of(b)?;
        Some(self.data[(i, j)])
    }

    /// Upper triangle in row-major order, excluding the diagonal.
    pub fn condensed(&self) -> Vec<f64> {
        let n = self.n_samples();
        let mut out = Vec::with_capacity(n * n.saturating_sub(1) / 2);
        for i in 0..n {
            for j in (i + 1)..n {
                out.push(self.data[(i, j)]);
            }
        }
        out
    }

    /// Restrict the matrix to the given identifiers.
    ///
    /// The result keeps this matrix's relative order, not the order of
    /// `ids`. Every requested identifier must be present.
    pub fn filter(&self, ids: &[String]) -> Result<Self> {
        let missing: Vec<String> = ids
            .iter()
            .filter(|id| !self.contains(id))
            .cloned()
            .collect();
        if !missing.is_empty() {
            return Err(BetaError::MissingIdentifiers { ids: missing });
        }

        let wanted: HashSet<&str> = ids.iter().map(String::as_str).collect();
        let keep: Vec<usize> = self
            .ids
            .iter()
            .enumerate()
            .filter(|(_, id)| wanted.contains(id.as_str()))
            .map(|(i, _)| i)
            .collect();

        self.subset(&keep)
    }

    /// Restrict the matrix to the given row indices, in the given order.
    pub fn subset(&self, indices: &[usize]) -> Result<Self> {
        let n = self.n_samples();
        if let Some(&bad) = indices.iter().find(|&&i| i >= n) {
            return Err(BetaError::InvalidParameter(format!(
                "Sample index {} out of bounds",
                bad
            )));
        }
        let data = DMatrix::from_fn(indices.len(), indices.len(), |i, j| {
            self.data[(indices[i], indices[j])]
        });
        let ids = indices.iter().map(|&i| self.ids[i].clone()).collect();
        Self::new(data, ids)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    fn ids(names: &[&str]) -> Vec<String> {
        names.iter().map(|s| s.to_string()).collect()
    }

    fn create_test_matrix() -> DistanceMatrix {
        DistanceMatrix::from_rows(
            vec![
                vec![0.0, 1.0, 2.0, 3.0],
                vec![1.0, 0.0, 4.0, 5.0],
                vec![2.0, 4.0, 0.0, 6.0],
                vec![3.0, 5.0, 6.0, 0.0],
            ],
            ids(&["A", "B", "C", "D"]),
        )
        .unwrap()
    }

    #[test]
    fn test_new_valid() {
        let dm = create_test_matrix();
        assert_eq!(dm.n_samples(), 4);
        assert_eq!(dm.shape(), (4, 4));
        assert_eq!(dm.distance("B", "D"), Some(5.0));
        assert_eq!(dm.distance("D", "B"), Some(5.0));
        assert_eq!(dm.distance("A", "Z"), None);
    }

    #[test]
    fn test_rejects_asymmetric() {
        let result = DistanceMatrix::from_rows(
            vec![vec![0.0, 1.0], vec![2.0, 0.0]],
            ids(&["A", "B"]),
        );
        assert!(matches!(result, Err(BetaError::InvalidDistanceMatrix(_))));
    }

    #[test]
    fn test_rejects_nonzero_diagonal() {
        let result = DistanceMatrix::from_rows(
            vec![vec![0.5, 1.0], vec![1.0, 0.0]],
            ids(&["A", "B"]),
        );
        assert!(matches!(result, Err(BetaError::InvalidDistanceMatrix(_))));
    }

    #[test]
    fn test_rejects_negative_distance() {
        let result = DistanceMatrix::from_rows(
            vec![vec![0.0, -1.0], vec![-1.0, 0.0]],
            ids(&["A", "B"]),
        );
        assert!(matches!(result, Err(BetaError::InvalidDistanceMatrix(_))));
    }

    #[test]
    fn test_rejects_duplicate_ids() {
        let result = DistanceMatrix::from_rows(
            vec![vec![0.0, 1.0], vec![1.0, 0.0]],
            ids(&["A", "A"]),
        );
        assert!(matches!(result, Err(BetaError::DuplicateId(id)) if id == "A"));
    }

    #[test]
    fn test_rejects_empty() {
        let result = DistanceMatrix::from_rows(vec![], vec![]);
        assert!(matches!(result, Err(BetaError::EmptyData(_))));
    }

    #[test]
    fn test_filter_keeps_matrix_order() {
        let dm = create_test_matrix();
        let filtered = dm.filter(&ids(&["D", "B"])).unwrap();
        assert_eq!(filtered.ids(), &["B", "D"]);
        assert_eq!(filtered.get(0, 1), 5.0);
        assert_eq!(filtered.get(1, 0), 5.0);
        assert_eq!(filtered.get(0, 0), 0.0);
    }

    #[test]
    fn test_filter_unknown_id() {
        let dm = create_test_matrix();
        let err = dm.filter(&ids(&["A", "S999"])).unwrap_err();
        match err {
            BetaError::MissingIdentifiers { ids } => assert_eq!(ids, vec!["S999"]),
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_condensed() {
        let dm = create_test_matrix();
        assert_eq!(dm.condensed(), vec![1.0, 2.0, 3.0, 4.0, 5.0, 6.0]);
    }

    #[test]
    fn test_tsv_roundtrip() {
        let dm = create_test_matrix();
        let file = NamedTempFile::new().unwrap();
        dm.to_tsv(file.path()).unwrap();
        let loaded = DistanceMatrix::from_tsv(file.path()).unwrap();
        assert_eq!(loaded, dm);
    }

    #[test]
    fn test_from_tsv_mislabelled_row() {
        let mut file = NamedTempFile::new().unwrap();
        writeln!(file, "\tA\tB").unwrap();
        writeln!(file, "B\t0\t1").unwrap();
        writeln!(file, "A\t1\t0").unwrap();
        file.flush().unwrap();

        let result = DistanceMatrix::from_tsv(file.path());
        assert!(matches!(result, Err(BetaError::InvalidDistanceMatrix(_))));
    }

    #[test]
    fn test_from_tsv_invalid_value() {
        let mut file = NamedTempFile::new().unwrap();
        writeln!(file, "\tA\tB").unwrap();
        writeln!(file, "A\t0\tx").unwrap();
        writeln!(file, "B\t1\t0").unwrap();
        file.flush().unwrap();

        let result = DistanceMatrix::from_tsv(file.path());
        assert!(matches!(
            result,
            Err(BetaError::InvalidValue { row: 0, col: 1, .. })
        ));
    }
}
