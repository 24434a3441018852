use std::path::{Path, PathBuf};

use clap::{Args, Parser, Subcommand};
use dataconv::{
    read_matrix, read_matrix_with_metadata, render_matrix, MatrixBlock, ReadProperties,
    RenderConfig, StorageFormat,
};
use dataconv_core::density::sparsity;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(author, version, long_about = None)]
#[command(about = "dataconv - inspect stored matrices")]
struct Cli {
    /// Log conversion decisions to stderr
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Print a stored matrix
    Show {
        #[command(flatten)]
        source: Source,

        /// Print non-zeros as 1-indexed `row col value` lines
        #[arg(long)]
        coordinates: bool,

        /// Maximum number of rows to print
        #[arg(long)]
        max_rows: Option<usize>,

        /// Maximum number of columns to print
        #[arg(long)]
        max_cols: Option<usize>,

        /// Minimum fraction digits
        #[arg(long, default_value_t = 3)]
        decimals: usize,

        /// Field separator
        #[arg(long, default_value = " ")]
        sep: String,
    },
    /// Show dimensions, non-zeros and storage mode
    Info {
        #[command(flatten)]
        source: Source,
    },
}

#[derive(Args)]
struct Source {
    /// Path to the matrix data file
    path: PathBuf,

    /// Storage format; without it the `.mtd` sidecar is used
    #[arg(long)]
    format: Option<StorageFormat>,

    /// Declared row count; 0 x 0 takes the shape from the file header or,
    /// for cell formats, from the largest indices
    #[arg(long, default_value_t = 0)]
    rows: usize,

    /// Declared column count; 0 x 0 infers the shape
    #[arg(long, default_value_t = 0)]
    cols: usize,
}

impl Source {
    fn load(&self) -> dataconv::Result<MatrixBlock> {
        match self.format {
            Some(format) => read_matrix(&ReadProperties::new(&self.path, format, self.rows, self.cols)),
            None => read_matrix_with_metadata(&self.path),
        }
    }
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    match &cli.command {
        Commands::Show {
            source,
            coordinates,
            max_rows,
            max_cols,
            decimals,
            sep,
        } => {
            let matrix = source.load()?;
            let mut config = RenderConfig::new()
                .with_field_separator(sep.as_str())
                .with_decimal_places(Some(*decimals));
            if *coordinates {
                config = config.coordinates();
            }
            if let Some(rows) = max_rows {
                config = config.with_max_rows(*rows);
            }
            if let Some(cols) = max_cols {
                config = config.with_max_cols(*cols);
            }
            print!("{}", render_matrix(&matrix, &config));
        }
        Commands::Info { source } => {
            let matrix = source.load()?;
            print_info(&source.path, &matrix);
        }
    }

    Ok(())
}

fn print_info(path: &Path, matrix: &MatrixBlock) {
    let (rows, cols) = matrix.dimensions();
    println!("Matrix: {}", path.display());
    println!("  dimensions: {rows} x {cols}");
    println!("  nnz: {}", matrix.nnz());
    println!("  sparsity: {:.6}", sparsity(rows, cols, matrix.nnz()));
    println!("  storage: {}", matrix.storage_mode());
}

fn init_logging(verbose: bool) {
    let default_level = if verbose { "debug" } else { "warn" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}
