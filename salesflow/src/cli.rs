// salesflow/src/cli.rs
//
// Single source of truth for all CLI definitions (Clap structs).

use clap::{Parser, Subcommand};
use std::path::PathBuf;

use salesflow_core::domain::project::LoadMode;

#[derive(Parser)]
#[command(name = "salesflow")]
#[command(about = "Batch sales ETL: extract, clean, aggregate and load", long_about = None)]
#[command(version)]
pub struct Cli {
    /// Debug-level logs (RUST_LOG still wins when set)
    #[arg(long, short, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// 🌱 Fills the source table with reproducible demo sales
    Seed {
        /// Project directory
        #[arg(long, default_value = ".")]
        project_dir: PathBuf,

        /// Number of sales to generate (duplicates come on top)
        #[arg(long, default_value = "1000")]
        count: usize,

        /// RNG seed
        #[arg(long, default_value = "42")]
        seed: u64,
    },

    /// 📤 Copies the source table to extracted_data.csv
    Extract {
        #[arg(long, default_value = ".")]
        project_dir: PathBuf,
    },

    /// 🧮 Cleans, enriches and aggregates a sales CSV
    Transform {
        #[arg(long, default_value = ".")]
        project_dir: PathBuf,

        /// Input CSV (default: <output_path>/extracted_data.csv)
        #[arg(long)]
        input: Option<PathBuf>,

        /// Aggregated output CSV (default: <output_path>/transformed_data.csv)
        #[arg(long)]
        output: Option<PathBuf>,
    },

    /// 📥 Validates the transformed CSV and writes it to the target table
    Load {
        #[arg(long, default_value = ".")]
        project_dir: PathBuf,

        /// Transformed CSV (default: <output_path>/transformed_data.csv)
        #[arg(long)]
        input: Option<PathBuf>,

        /// Overrides `load.mode`: replace | append | fail
        #[arg(long, value_parser = parse_load_mode)]
        mode: Option<LoadMode>,
    },

    /// 📊 Summarizes the target table
    Report {
        #[arg(long, default_value = ".")]
        project_dir: PathBuf,
    },

    /// 🚀 Runs extract, transform, load and report in sequence
    Run {
        #[arg(long, default_value = ".")]
        project_dir: PathBuf,
    },

    /// 🔍 Inspects a table (schema + sample rows)
    Inspect {
        #[arg(long, default_value = ".")]
        project_dir: PathBuf,

        /// Table name (default: the target table)
        #[arg(long, short)]
        table: Option<String>,

        /// Number of sample rows to display
        #[arg(long, default_value = "5")]
        limit: usize,
    },
}

fn parse_load_mode(value: &str) -> Result<LoadMode, String> {
    match value.to_ascii_lowercase().as_str() {
        "replace" => Ok(LoadMode::Replace),
        "append" => Ok(LoadMode::Append),
        "fail" => Ok(LoadMode::Fail),
        other => Err(format!(
            "unknown load mode '{}' (expected replace, append or fail)",
            other
        )),
    }
}
