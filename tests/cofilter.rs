//! Integration tests for co-filtering and analysis preparation.

use composable_beta::prelude::*;
use std::io::Write;
use tempfile::{NamedTempFile, TempDir};

fn write_tsv(lines: &[&str]) -> NamedTempFile {
    let mut file = NamedTempFile::new().unwrap();
    for line in lines {
        writeln!(file, "{}", line).unwrap();
    }
    file.flush().unwrap();
    file
}

fn abc_matrix() -> NamedTempFile {
    write_tsv(&[
        "\tA\tB\tC",
        "A\t0\t0.25\t0.5",
        "B\t0.25\t0\t0.75",
        "C\t0.5\t0.75\t0",
    ])
}

#[test]
fn test_mixed_columns_scenario() {
    let dm = DistanceMatrix::from_tsv(abc_matrix().path()).unwrap();
    let metadata = Metadata::from_tsv(
        write_tsv(&[
            "sample_id\tnumeric_a\tnumeric_b\ttext_c",
            "A\t1\t5\tx",
            "B\t2\t5\ty",
            "C\t3\t5\tz",
        ])
        .path(),
    )
    .unwrap();

    let result = co_filter(&dm, &metadata).unwrap();

    assert_eq!(result.metadata.column_names(), &["numeric_a"]);
    assert_eq!(result.metadata.n_samples(), 3);
    assert_eq!(result.report.initial_count, 3);
    assert_eq!(result.report.filtered_count, 3);
    assert_eq!(result.report.non_numeric_columns, vec!["text_c"]);
    assert_eq!(result.report.zero_variance_columns, vec!["numeric_b"]);

    let ctx = result.report.context();
    assert_eq!(ctx.non_numeric_cols, "text_c");
    assert_eq!(ctx.zero_variance_cols, "numeric_b");
}

#[test]
fn test_missing_value_drops_sample() {
    let dm = DistanceMatrix::from_tsv(abc_matrix().path()).unwrap();
    let metadata = Metadata::from_tsv(
        write_tsv(&[
            "sample_id\tph\tsite",
            "A\t6.5\tgut",
            "B\t\tgut",
            "C\t7.1\tskin",
        ])
        .path(),
    )
    .unwrap();

    let result = co_filter(&dm, &metadata).unwrap();

    assert_eq!(result.report.filtered_count, 2);
    assert_eq!(result.distance_matrix.ids(), &["A", "C"]);
    assert_eq!(result.distance_matrix.distance("A", "C"), Some(0.5));
    assert!(!result.metadata.has_sample("B"));
}

#[test]
fn test_missing_identifier_is_named() {
    let dm = DistanceMatrix::from_tsv(
        write_tsv(&["\tA\tS999", "A\t0\t1", "S999\t1\t0"]).path(),
    )
    .unwrap();
    let metadata =
        Metadata::from_tsv(write_tsv(&["sample_id\tph", "A\t6.5", "B\t7.0"]).path()).unwrap();

    let err = co_filter(&dm, &metadata).unwrap_err();
    assert!(matches!(&err, BetaError::MissingIdentifiers { ids } if ids == &["S999"]));
    assert!(err.to_string().contains("S999"));
}

#[test]
fn test_extra_metadata_samples_ignored() {
    let dm = DistanceMatrix::from_tsv(abc_matrix().path()).unwrap();
    let metadata = Metadata::from_tsv(
        write_tsv(&[
            "sample_id\tph",
            "Z\t9.9",
            "C\t7.0",
            "B\t6.0",
            "A\t5.0",
        ])
        .path(),
    )
    .unwrap();

    let result = co_filter(&dm, &metadata).unwrap();
    assert_eq!(result.metadata.sample_ids(), &["A", "B", "C"]);
    assert_eq!(result.report.initial_count, 3);
}

#[test]
fn test_nan_cell_drops_sample_with_custom_missing_tokens() {
    let dm = DistanceMatrix::from_tsv(abc_matrix().path()).unwrap();
    let md_file = write_tsv(&[
        "sample_id\tph\tdepth",
        "A\t1\t10",
        "B\tNaN\t20",
        "C\t3\t30",
    ]);
    let config = AnalysisConfig::from_yaml(
        "\
name: env
missing_tokens: ['']
analysis:
  type: bioenv
",
    )
    .unwrap();
    let metadata = composable_beta::pipeline::load_metadata(md_file.path(), &config).unwrap();

    let result = co_filter(&dm, &metadata).unwrap();

    assert_eq!(result.report.filtered_count, 2);
    assert_eq!(result.distance_matrix.ids(), &["A", "C"]);
    let table = result.metadata.to_numeric_table().unwrap();
    assert_eq!(table.column_names(), &["ph", "depth"]);
    assert!(table.matrix().iter().all(|v| v.is_finite()));
}

#[test]
fn test_prepare_and_write_configured_bioenv() {
    let dm_file = abc_matrix();
    let md_file = write_tsv(&[
        "sample_id\tph\tdepth\tsite",
        "A\t6.5\tnot collected\tgut",
        "B\t6.9\t12\tgut",
        "C\t7.1\t30\tskin",
    ]);
    let config = AnalysisConfig::from_yaml(
        "\
name: env
missing_tokens: ['', 'not collected']
analysis:
  type: bioenv
",
    )
    .unwrap();

    let dm = DistanceMatrix::from_tsv(dm_file.path()).unwrap();
    let metadata = composable_beta::pipeline::load_metadata(md_file.path(), &config).unwrap();
    assert!(metadata.is_numeric("depth"));

    let prepared = prepare(&config, &dm, &metadata).unwrap();
    let dir = TempDir::new().unwrap();
    prepared.write(dir.path()).unwrap();

    let filtered = Metadata::from_tsv(dir.path().join("metadata.tsv")).unwrap();
    assert_eq!(filtered.sample_ids(), &["B", "C"]);
    assert_eq!(filtered.column_names(), &["ph", "depth"]);
}

#[test]
fn test_group_significance_end_to_end() {
    struct ConstantBackend;

    impl GroupTestBackend for ConstantBackend {
        type Error = std::convert::Infallible;

        fn test(
            &self,
            method: GroupTest,
            distance_matrix: &DistanceMatrix,
            grouping: &Grouping,
            permutations: usize,
        ) -> std::result::Result<GroupTestOutcome, Self::Error> {
            Ok(GroupTestOutcome {
                method,
                test_statistic: 2.5,
                p_value: 0.001,
                sample_size: distance_matrix.n_samples(),
                number_of_groups: grouping.groups().len(),
                permutations,
            })
        }
    }

    let dm = DistanceMatrix::from_tsv(
        write_tsv(&[
            "\tA\tB\tC\tD",
            "A\t0\t1\t4\t4",
            "B\t1\t0\t4\t4",
            "C\t4\t4\t0\t1",
            "D\t4\t4\t1\t0",
        ])
        .path(),
    )
    .unwrap();
    let metadata = Metadata::from_tsv(
        write_tsv(&[
            "sample_id\tsite",
            "A\tgut",
            "B\tgut",
            "C\tskin",
            "D\tskin",
        ])
        .path(),
    )
    .unwrap();

    let input = prepare_group_significance(&dm, &metadata, "site").unwrap();
    let report =
        run_group_significance(&input, GroupTest::Permanova, 999, true, &ConstantBackend).unwrap();

    assert_eq!(report.overall.number_of_groups, 2);
    assert_eq!(report.pairwise.len(), 1);
    assert_eq!(report.pairwise[0].sample_size, 4);
    assert!((report.pairwise[0].q_value - 0.001).abs() < 1e-12);
}
