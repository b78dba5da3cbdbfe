//! Import legacy chart CSV files into the charting database.
//!
//! One-shot batch job: resolves a legacy export directory, deduplicates
//! against the destination store, inserts survivors in one transaction, and
//! prints a run summary. Exit code 1 when no source directory or no
//! matching files were found.

use charting_service::import::{self, ImportError};
use clap::Parser;
use std::process::ExitCode;

#[derive(Parser)]
#[command(name = "import-legacy")]
#[command(about = "Import legacy charts_YYYYMMDD.csv files into the charting database")]
struct Cli {
    /// Path to the destination SQLite database
    #[arg(long, default_value = "data/charting.db")]
    db: String,

    /// Directory containing legacy charts_YYYYMMDD.csv files
    #[arg(long)]
    legacy_dir: Option<String>,
}

fn main() -> ExitCode {
    dotenv::dotenv().ok();
    env_logger::init();

    let cli = Cli::parse();
    match import::run_import(&cli.db, cli.legacy_dir.as_deref()) {
        Ok(summary) => {
            println!("Legacy directory: {}", summary.legacy_dir);
            println!("Database: {}", summary.db_path);
            println!("Inserted: {}", summary.inserted);
            println!("Skipped existing: {}", summary.skipped_existing);
            println!("Skipped empty: {}", summary.skipped_empty);
            ExitCode::SUCCESS
        }
        Err(err @ (ImportError::NoLegacyDir | ImportError::NoFiles(_))) => {
            println!("{err}");
            ExitCode::from(1)
        }
        Err(err) => {
            eprintln!("Import failed: {err}");
            ExitCode::from(1)
        }
    }
}
