//! cellsubset - select cell subsets from annotated expression matrices
//!
//! Command-line interface for rule-based cell subset selection.

use cell_subset::config::SelectionConfig;
use cell_subset::data::AnnotatedMatrix;
use cell_subset::error::Result;
use cell_subset::report::{write_subsets, SelectionReport};
use cell_subset::rules::DEFAULT_CELLTYPE_COLUMN;
use cell_subset::select::select_all;
use clap::{Parser, Subcommand, ValueEnum};
use log::info;
use std::path::{Path, PathBuf};

#[derive(Debug, Clone, Copy, ValueEnum)]
enum OutputFormat {
    Text,
    Json,
}

/// Rule-based cell subset selection
#[derive(Parser)]
#[command(name = "cellsubset")]
#[command(author, version, about, long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Apply the rules of a YAML configuration file
    Run {
        /// Path to selection configuration YAML
        #[arg(short, long)]
        config: PathBuf,

        /// Path to expression matrix TSV (cells x genes)
        #[arg(short = 'x', long)]
        matrix: PathBuf,

        /// Path to cell annotation TSV
        #[arg(short, long)]
        obs: PathBuf,

        /// Directory for subset TSVs and summary.json
        #[arg(short = 'd', long)]
        output_dir: PathBuf,
    },

    /// Apply the built-in marker rules
    Builtin {
        /// Path to expression matrix TSV (cells x genes)
        #[arg(short = 'x', long)]
        matrix: PathBuf,

        /// Path to cell annotation TSV
        #[arg(short, long)]
        obs: PathBuf,

        /// Directory for subset TSVs and summary.json
        #[arg(short = 'd', long)]
        output_dir: PathBuf,

        /// Annotation column holding the cell-type label
        #[arg(long, default_value = DEFAULT_CELLTYPE_COLUMN)]
        celltype_column: String,
    },

    /// Write the built-in rules as an editable configuration
    Example {
        /// Output path for the example YAML
        #[arg(short, long, default_value = "selection.yaml")]
        output: PathBuf,

        /// Annotation column holding the cell-type label
        #[arg(long, default_value = DEFAULT_CELLTYPE_COLUMN)]
        celltype_column: String,
    },

    /// Report subset sizes without writing subsets
    Inspect {
        /// Path to expression matrix TSV (cells x genes)
        #[arg(short = 'x', long)]
        matrix: PathBuf,

        /// Path to cell annotation TSV
        #[arg(short, long)]
        obs: PathBuf,

        /// Optional selection configuration (built-in rules otherwise)
        #[arg(short, long)]
        config: Option<PathBuf>,

        /// Output format
        #[arg(short, long, value_enum, default_value = "text")]
        format: OutputFormat,
    },
}

fn main() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let cli = Cli::parse();

    let result = match cli.command {
        Commands::Run {
            config,
            matrix,
            obs,
            output_dir,
        } => SelectionConfig::from_file(&config)
            .and_then(|config| cmd_apply(&config, &matrix, &obs, &output_dir)),

        Commands::Builtin {
            matrix,
            obs,
            output_dir,
            celltype_column,
        } => cmd_apply(
            &SelectionConfig::builtin(&celltype_column),
            &matrix,
            &obs,
            &output_dir,
        ),

        Commands::Example {
            output,
            celltype_column,
        } => cmd_example(&output, &celltype_column),

        Commands::Inspect {
            matrix,
            obs,
            config,
            format,
        } => cmd_inspect(&matrix, &obs, config.as_deref(), format),
    };

    if let Err(e) = result {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }
}

fn load(matrix_path: &Path, obs_path: &Path) -> Result<AnnotatedMatrix> {
    info!("Loading {:?} and {:?}...", matrix_path, obs_path);
    let adata = AnnotatedMatrix::from_tsv(matrix_path, obs_path)?;
    info!(
        "Loaded {} cells x {} genes",
        adata.n_cells(),
        adata.n_genes()
    );
    Ok(adata)
}

/// Apply a rule set and write every subset
fn cmd_apply(
    config: &SelectionConfig,
    matrix_path: &Path,
    obs_path: &Path,
    output_dir: &Path,
) -> Result<()> {
    let adata = load(matrix_path, obs_path)?;

    info!(
        "Applying {} rules from '{}'...",
        config.rules.len(),
        config.name
    );
    let results = select_all(&adata, &config.rules)?;

    let report = write_subsets(output_dir, &config.name, &adata, &results)?;
    eprint!("{}", report);
    info!("Done! Wrote {} subsets to {:?}", results.len(), output_dir);

    Ok(())
}

/// Write the built-in configuration
fn cmd_example(output_path: &Path, celltype_column: &str) -> Result<()> {
    let yaml = SelectionConfig::builtin(celltype_column).to_yaml()?;
    std::fs::write(output_path, &yaml)?;
    info!("Wrote example selection to {:?}", output_path);
    println!("{}", yaml);
    Ok(())
}

/// Print subset sizes and overlaps
fn cmd_inspect(
    matrix_path: &Path,
    obs_path: &Path,
    config_path: Option<&Path>,
    format: OutputFormat,
) -> Result<()> {
    let config = match config_path {
        Some(path) => SelectionConfig::from_file(path)?,
        None => SelectionConfig::default(),
    };
    let adata = load(matrix_path, obs_path)?;
    let results = select_all(&adata, &config.rules)?;
    let report = SelectionReport::new(&config.name, &adata, &results);

    match format {
        OutputFormat::Json => println!("{}", report.to_json()?),
        OutputFormat::Text => print!("{}", report),
    }

    Ok(())
}
