//! beta - Beta-diversity analysis preparation CLI
//!
//! Command-line interface for co-filtering distance matrices with sample
//! metadata and preparing inputs for distance-based statistics.

use clap::{Parser, Subcommand, ValueEnum};
use composable_beta::analysis::{pairwise_comparisons, prepare_group_significance, GroupTest};
use composable_beta::config::AnalysisConfig;
use composable_beta::data::{DistanceMatrix, Metadata};
use composable_beta::error::Result;
use composable_beta::filter::co_filter;
use composable_beta::pipeline::{load_metadata, prepare};
use composable_beta::profile::profile_metadata;
use serde::Serialize;
use std::path::{Path, PathBuf};

/// Output format for reports.
#[derive(Debug, Clone, Copy, ValueEnum)]
enum OutputFormat {
    Text,
    Json,
    Yaml,
}

/// CLI-friendly group test enum
#[derive(Debug, Clone, Copy, ValueEnum)]
enum CliGroupTest {
    Permanova,
    Anosim,
    Permdisp,
}

impl From<CliGroupTest> for GroupTest {
    fn from(method: CliGroupTest) -> Self {
        match method {
            CliGroupTest::Permanova => GroupTest::Permanova,
            CliGroupTest::Anosim => GroupTest::Anosim,
            CliGroupTest::Permdisp => GroupTest::Permdisp,
        }
    }
}

/// Composable Beta-Diversity Analysis Preparation
#[derive(Parser)]
#[command(name = "beta")]
#[command(author, version, about, long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Co-filter a distance matrix and metadata for bioenv
    Cofilter {
        /// Path to distance matrix TSV
        #[arg(short, long)]
        distance_matrix: PathBuf,

        /// Path to metadata TSV
        #[arg(short, long)]
        metadata: PathBuf,

        /// Output directory for the filtered matrix, metadata and report
        #[arg(short, long)]
        output: PathBuf,

        /// Report format printed to stdout
        #[arg(short, long, value_enum, default_value = "text")]
        format: OutputFormat,
    },

    /// Align a categorical column with a distance matrix for group tests
    Groups {
        /// Path to distance matrix TSV
        #[arg(short, long)]
        distance_matrix: PathBuf,

        /// Path to metadata TSV
        #[arg(short, long)]
        metadata: PathBuf,

        /// Categorical metadata column defining the groups
        #[arg(short, long)]
        column: String,

        /// Group test the inputs are prepared for
        #[arg(long, value_enum, default_value = "permanova")]
        method: CliGroupTest,

        /// List pairwise comparisons between groups
        #[arg(long)]
        pairwise: bool,
    },

    /// Profile metadata columns
    Profile {
        /// Path to metadata TSV
        #[arg(short, long)]
        metadata: PathBuf,

        /// Output format
        #[arg(short, long, value_enum, default_value = "text")]
        format: OutputFormat,
    },

    /// Prepare an analysis from a YAML configuration file
    Run {
        /// Path to analysis configuration YAML
        #[arg(short, long)]
        config: PathBuf,

        /// Path to distance matrix TSV
        #[arg(short, long)]
        distance_matrix: PathBuf,

        /// Path to metadata TSV
        #[arg(short, long)]
        metadata: PathBuf,

        /// Output directory
        #[arg(short, long)]
        output: PathBuf,
    },

    /// Generate an example analysis configuration
    Example {
        /// Output path for the example YAML
        #[arg(short, long, default_value = "analysis.yaml")]
        output: PathBuf,
    },
}

fn main() {
    env_logger::init();
    let cli = Cli::parse();

    let result = match cli.command {
        Commands::Cofilter {
            distance_matrix,
            metadata,
            output,
            format,
        } => cmd_cofilter(&distance_matrix, &metadata, &output, format),

        Commands::Groups {
            distance_matrix,
            metadata,
            column,
            method,
            pairwise,
        } => cmd_groups(&distance_matrix, &metadata, &column, method.into(), pairwise),

        Commands::Profile { metadata, format } => cmd_profile(&metadata, format),

        Commands::Run {
            config,
            distance_matrix,
            metadata,
            output,
        } => cmd_run(&config, &distance_matrix, &metadata, &output),

        Commands::Example { output } => cmd_example(&output),
    };

    if let Err(e) = result {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }
}

fn print_formatted<T: Serialize + std::fmt::Display>(value: &T, format: OutputFormat) -> Result<()> {
    match format {
        OutputFormat::Text => print!("{}", value),
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(value)?),
        OutputFormat::Yaml => print!("{}", serde_yaml::to_string(value)?),
    }
    Ok(())
}

/// Co-filter inputs and write the filtered pair with its report
fn cmd_cofilter(
    dm_path: &Path,
    metadata_path: &Path,
    output_dir: &Path,
    format: OutputFormat,
) -> Result<()> {
    eprintln!("Loading data...");
    let dm = DistanceMatrix::from_tsv(dm_path)?;
    let metadata = Metadata::from_tsv(metadata_path)?;
    eprintln!(
        "Loaded {} x {} distance matrix and {} samples x {} metadata columns",
        dm.n_samples(),
        dm.n_samples(),
        metadata.n_samples(),
        metadata.n_columns()
    );

    let result = co_filter(&dm, &metadata)?;

    std::fs::create_dir_all(output_dir)?;
    result
        .distance_matrix
        .to_tsv(output_dir.join("distance-matrix.tsv"))?;
    result.metadata.to_tsv(output_dir.join("metadata.tsv"))?;
    std::fs::write(
        output_dir.join("report.json"),
        serde_json::to_string_pretty(&result.report)?,
    )?;
    eprintln!("Wrote filtered inputs to {:?}", output_dir);

    print_formatted(&result.report, format)
}

/// Show how a categorical column groups the distance matrix samples
fn cmd_groups(
    dm_path: &Path,
    metadata_path: &Path,
    column: &str,
    method: GroupTest,
    pairwise: bool,
) -> Result<()> {
    let dm = DistanceMatrix::from_tsv(dm_path)?;
    let metadata = Metadata::from_tsv(metadata_path)?;

    let input = prepare_group_significance(&dm, &metadata, column)?;

    println!("Grouping '{}' for {}", column, method);
    println!(
        "  Samples: {} of {}",
        input.filtered_count(),
        input.initial_count
    );
    for (group, size) in input.grouping.group_sizes() {
        println!("    {:<20} {}", group, size);
    }
    if pairwise {
        let pairs = pairwise_comparisons(&input);
        println!("  Pairwise comparisons: {}", pairs.len());
        for (a, b) in pairs {
            println!("    {} vs {}", a, b);
        }
    }

    Ok(())
}

/// Profile metadata columns
fn cmd_profile(metadata_path: &Path, format: OutputFormat) -> Result<()> {
    let metadata = Metadata::from_tsv(metadata_path)?;
    let profile = profile_metadata(&metadata);
    print_formatted(&profile, format)
}

/// Prepare an analysis from configuration
fn cmd_run(
    config_path: &Path,
    dm_path: &Path,
    metadata_path: &Path,
    output_dir: &Path,
) -> Result<()> {
    eprintln!("Loading analysis configuration from {:?}...", config_path);
    let config = AnalysisConfig::from_file(config_path)?;

    eprintln!("Loading data...");
    let dm = DistanceMatrix::from_tsv(dm_path)?;
    let metadata = load_metadata(metadata_path, &config)?;

    eprintln!("Preparing '{}'...", config.name);
    let prepared = prepare(&config, &dm, &metadata)?;
    let written = prepared.write(output_dir)?;

    for path in &written {
        eprintln!("  wrote {:?}", path);
    }
    println!("{}", serde_json::to_string_pretty(&prepared.summary())?);

    Ok(())
}

/// Write an example configuration
fn cmd_example(output_path: &Path) -> Result<()> {
    let yaml = AnalysisConfig::example().to_yaml()?;

    std::fs::write(output_path, &yaml)?;
    eprintln!("Wrote example configuration to {:?}", output_path);
    eprintln!();
    eprintln!("Contents:");
    println!("{}", yaml);

    Ok(())
}
