//! Input preparation for group significance tests.

use crate::data::{DistanceMatrix, Metadata};
use crate::error::{BetaError, Result};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet, HashSet};
use std::str::FromStr;

/// Permutation test applied to a grouping of samples.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum GroupTest {
    /// Permutational multivariate analysis of variance.
    Permanova,
    /// Analysis of similarities.
    Anosim,
    /// Permutational test of multivariate dispersion.
    Permdisp,
}

impl GroupTest {
    pub fn name(&self) -> &'static str {
        match self {
            GroupTest::Permanova => "permanova",
            GroupTest::Anosim => "anosim",
            GroupTest::Permdisp => "permdisp",
        }
    }

    /// Name of the statistic the test reports.
    pub fn statistic_name(&self) -> &'static str {
        match self {
            GroupTest::Permanova => "pseudo-F",
            GroupTest::Anosim => "R",
            GroupTest::Permdisp => "F-value",
        }
    }

    pub fn all() -> [GroupTest; 3] {
        [GroupTest::Permanova, GroupTest::Anosim, GroupTest::Permdisp]
    }
}

impl FromStr for GroupTest {
    type Err = BetaError;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_ascii_lowercase().as_str() {
            "permanova" => Ok(GroupTest::Permanova),
            "anosim" => Ok(GroupTest::Anosim),
            "permdisp" => Ok(GroupTest::Permdisp),
            other => Err(BetaError::InvalidParameter(format!(
                "Unknown group test '{}' (expected permanova, anosim or permdisp)",
                other
            ))),
        }
    }
}

impl std::fmt::Display for GroupTest {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

/// Group label for each sample, aligned with a distance matrix.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Grouping {
    /// Sample IDs.
    pub ids: Vec<String>,
    /// Group label per sample.
    pub labels: Vec<String>,
}

impl Grouping {
    /// Number of samples.
    pub fn len(&self) -> usize {
        self.ids.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ids.is_empty()
    }

    /// Distinct group labels, sorted.
    pub fn groups(&self) -> Vec<String> {
        let groups: BTreeSet<&String> = self.labels.iter().collect();
        groups.into_iter().cloned().collect()
    }

    /// Number of samples in each group.
    pub fn group_sizes(&self) -> BTreeMap<String, usize> {
        let mut sizes = BTreeMap::new();
        for label in &self.labels {
            *sizes.entry(label.clone()).or_insert(0) += 1;
        }
        sizes
    }

    /// Keep only samples belonging to the given groups.
    pub fn restrict(&self, groups: &[&str]) -> Self {
        let wanted: HashSet<&str> = groups.iter().copied().collect();
        let (ids, labels): (Vec<String>, Vec<String>) = self
            .ids
            .iter()
            .zip(&self.labels)
            .filter(|(_, label)| wanted.contains(label.as_str()))
            .map(|(id, label)| (id.clone(), label.clone()))
            .unzip();
        Self { ids, labels }
    }
}

/// Distance matrix and grouping ready for a group significance test.
#[derive(Debug, Clone)]
pub struct GroupSignificanceInput {
    /// Grouping column.
    pub column: String,
    /// Distance matrix over samples with a group label.
    pub distance_matrix: DistanceMatrix,
    /// Labels aligned with the distance matrix.
    pub grouping: Grouping,
    /// Samples in the distance matrix before dropping unlabelled ones.
    pub initial_count: usize,
}

impl GroupSignificanceInput {
    /// Samples retained.
    pub fn filtered_count(&self) -> usize {
        self.grouping.len()
    }
}

/// Align a categorical metadata column with a distance matrix.
///
/// Every distance matrix sample must have a metadata row. Samples with a
/// missing value in the column are dropped from the matrix. The resulting
/// grouping must have more than one group and fewer groups than samples.
pub fn prepare_group_significance(
    distance_matrix: &DistanceMatrix,
    metadata: &Metadata,
    column: &str,
) -> Result<GroupSignificanceInput> {
    if !metadata.has_column(column) {
        return Err(BetaError::MissingColumn(column.to_string()));
    }
    if !metadata.is_categorical(column) {
        return Err(BetaError::InvalidVariableType {
            column: column.to_string(),
            reason: "group significance requires a categorical column".to_string(),
        });
    }

    let labelled = metadata
        .filter_ids(distance_matrix.ids())?
        .select_columns(&[column.to_string()])?
        .drop_missing_rows();
    if labelled.n_samples() == 0 {
        return Err(BetaError::EmptyResult(format!(
            "no sample has a value in column '{}'",
            column
        )));
    }

    let filtered = distance_matrix.filter(labelled.sample_ids())?;
    let labels = filtered
        .ids()
        .iter()
        .map(|sid| {
            labelled
                .get(sid, column)
                .and_then(|v| v.as_categorical())
                .map(String::from)
                .ok_or_else(|| BetaError::MissingValue {
                    sample: sid.clone(),
                    column: column.to_string(),
                })
        })
        .collect::<Result<Vec<String>>>()?;
    let grouping = Grouping {
        ids: filtered.ids().to_vec(),
        labels,
    };

    let n_groups = grouping.groups().len();
    if n_groups == grouping.len() {
        return Err(BetaError::InvalidGrouping {
            column: column.to_string(),
            reason: "all values are unique; every sample would be its own group".to_string(),
        });
    }
    if n_groups == 1 {
        return Err(BetaError::InvalidGrouping {
            column: column.to_string(),
            reason: "all values are the same; at least two groups are required".to_string(),
        });
    }

    log::info!(
        "Grouping '{}': {} groups over {} of {} samples",
        column,
        n_groups,
        grouping.len(),
        distance_matrix.n_samples()
    );

    Ok(GroupSignificanceInput {
        column: column.to_string(),
        distance_matrix: filtered,
        grouping,
        initial_count: distance_matrix.n_samples(),
    })
}

/// All unordered pairs of groups, in sorted order.
pub fn pairwise_comparisons(input: &GroupSignificanceInput) -> Vec<(String, String)> {
    let groups = input.grouping.groups();
    let mut pairs = Vec::with_capacity(groups.len() * groups.len().saturating_sub(1) / 2);
    for (i, a) in groups.iter().enumerate() {
        for b in &groups[i + 1..] {
            pairs.push((a.clone(), b.clone()));
        }
    }
    pairs
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::Variable;

    fn ids(names: &[&str]) -> Vec<String> {
        names.iter().map(|s| s.to_string()).collect()
    }

    fn line_matrix(names: &[&str]) -> DistanceMatrix {
        let n = names.len();
        let rows = (0..n)
            .map(|i| (0..n).map(|j| (i as f64 - j as f64).abs()).collect())
            .collect();
        DistanceMatrix::from_rows(rows, ids(names)).unwrap()
    }

    fn site_metadata(values: &[Option<&str>]) -> Metadata {
        let sample_ids: Vec<String> = (0..values.len()).map(|i| format!("S{}", i)).collect();
        let column = values
            .iter()
            .map(|v| match v {
                Some(s) => Variable::Categorical(s.to_string()),
                None => Variable::Missing,
            })
            .collect();
        Metadata::from_columns(
            sample_ids.clone(),
            vec![
                ("site".to_string(), column),
                (
                    "ph".to_string(),
                    (0..values.len()).map(|i| Variable::Continuous(i as f64)).collect(),
                ),
            ],
        )
        .unwrap()
    }

    #[test]
    fn test_group_test_parse() {
        assert_eq!("PERMANOVA".parse::<GroupTest>().unwrap(), GroupTest::Permanova);
        assert_eq!("anosim".parse::<GroupTest>().unwrap(), GroupTest::Anosim);
        assert!("mantel".parse::<GroupTest>().is_err());
        assert_eq!(GroupTest::Permdisp.to_string(), "permdisp");
    }

    #[test]
    fn test_prepare_drops_unlabelled_samples() {
        let dm = line_matrix(&["S0", "S1", "S2", "S3", "S4"]);
        let meta = site_metadata(&[Some("gut"), Some("gut"), None, Some("skin"), Some("skin")]);

        let input = prepare_group_significance(&dm, &meta, "site").unwrap();

        assert_eq!(input.initial_count, 5);
        assert_eq!(input.filtered_count(), 4);
        assert_eq!(input.distance_matrix.ids(), &["S0", "S1", "S3", "S4"]);
        assert_eq!(input.grouping.labels, ids(&["gut", "gut", "skin", "skin"]));
        assert_eq!(input.grouping.group_sizes().get("skin"), Some(&2));
    }

    #[test]
    fn test_prepare_rejects_numeric_column() {
        let dm = line_matrix(&["S0", "S1"]);
        let meta = site_metadata(&[Some("gut"), Some("skin")]);

        let result = prepare_group_significance(&dm, &meta, "ph");
        assert!(matches!(result, Err(BetaError::InvalidVariableType { .. })));
    }

    #[test]
    fn test_prepare_unknown_column() {
        let dm = line_matrix(&["S0", "S1"]);
        let meta = site_metadata(&[Some("gut"), Some("skin")]);

        let result = prepare_group_significance(&dm, &meta, "body");
        assert!(matches!(result, Err(BetaError::MissingColumn(_))));
    }

    #[test]
    fn test_prepare_rejects_unique_groups() {
        let dm = line_matrix(&["S0", "S1", "S2"]);
        let meta = site_metadata(&[Some("a"), Some("b"), Some("c")]);

        let result = prepare_group_significance(&dm, &meta, "site");
        assert!(matches!(result, Err(BetaError::InvalidGrouping { .. })));
    }

    #[test]
    fn test_prepare_rejects_single_group() {
        let dm = line_matrix(&["S0", "S1", "S2"]);
        let meta = site_metadata(&[Some("a"), Some("a"), None]);

        let result = prepare_group_significance(&dm, &meta, "site");
        assert!(matches!(result, Err(BetaError::InvalidGrouping { .. })));
    }

    #[test]
    fn test_prepare_all_unlabelled() {
        let dm = line_matrix(&["S0", "S1"]);
        let meta = site_metadata(&[None, None]);

        // an all-missing column is inferred numeric
        let result = prepare_group_significance(&dm, &meta, "site");
        assert!(matches!(result, Err(BetaError::InvalidVariableType { .. })));
    }

    #[test]
    fn test_pairwise_comparisons() {
        let dm = line_matrix(&["S0", "S1", "S2", "S3", "S4", "S5"]);
        let meta = site_metadata(&[
            Some("soil"),
            Some("gut"),
            Some("skin"),
            Some("gut"),
            Some("skin"),
            Some("soil"),
        ]);
        let input = prepare_group_significance(&dm, &meta, "site").unwrap();

        let pairs = pairwise_comparisons(&input);
        assert_eq!(
            pairs,
            vec![
                ("gut".to_string(), "skin".to_string()),
                ("gut".to_string(), "soil".to_string()),
                ("skin".to_string(), "soil".to_string()),
            ]
        );
    }

    #[test]
    fn test_grouping_restrict() {
        let grouping = Grouping {
            ids: ids(&["A", "B", "C"]),
            labels: ids(&["x", "y", "z"]),
        };
        let restricted = grouping.restrict(&["x", "z"]);
        assert_eq!(restricted.ids, ids(&["A", "C"]));
        assert_eq!(restricted.groups(), ids(&["x", "z"]));
    }
}
