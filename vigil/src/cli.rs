// vigil/src/cli.rs
//
// Single source of truth for all CLI definitions (Clap structs).

use clap::{Parser, Subcommand};
use std::path::PathBuf;

use vigil_core::domain::detection::{AnalysisMode, Frequency, MethodKind};

#[derive(Parser)]
#[command(name = "vigil")]
#[command(about = "Statistical anomaly detection for warehouse business metrics", long_about = None)]
#[command(version)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// 🚀 Runs every metric of the catalog (vigil.yaml)
    Run {
        /// Project directory
        #[arg(long, default_value = ".")]
        project_dir: PathBuf,

        /// Run only a specific metric (ex: "sales")
        #[arg(long, short)]
        select: Option<String>,
    },

    /// ⚡ Runs detection on the result of an ad-hoc SQL query
    Detect {
        /// Query producing the value and index columns
        #[arg(long, short)]
        query: String,

        #[arg(long)]
        value_col: String,

        #[arg(long)]
        index_col: String,

        /// TIME_AGGREGATED | TIME_RAW | DISTRIBUTIONAL
        #[arg(long)]
        mode: AnalysisMode,

        /// Bucket frequencies for TIME_AGGREGATED (D, W, M)
        #[arg(long = "frequency", short, num_args = 1.., default_values_t = [Frequency::Daily, Frequency::Weekly])]
        frequencies: Vec<Frequency>,

        /// IQR | Z-Score
        #[arg(long, default_value_t = MethodKind::Iqr)]
        method: MethodKind,

        #[arg(long)]
        iqr_factor: Option<f64>,

        #[arg(long)]
        z_threshold: Option<f64>,

        /// Metric description written into the report
        #[arg(long, default_value = "Metric")]
        desc: String,

        /// Path to the DuckDB database file
        #[arg(long, default_value = ":memory:", env = "VIGIL_DATABASE")]
        db_path: String,

        /// Where to write the JSON report
        #[arg(long, short)]
        output: Option<PathBuf>,

        /// Register a CSV/Parquet file as a view before querying (name=path)
        #[arg(long = "register", value_parser = parse_registration)]
        registrations: Vec<(String, String)>,
    },

    /// 🔍 Prints a saved anomaly report
    Show {
        /// Path to the JSON report
        report: PathBuf,
    },
}

fn parse_registration(raw: &str) -> Result<(String, String), String> {
    match raw.split_once('=') {
        Some((name, path)) if !name.trim().is_empty() && !path.trim().is_empty() => {
            Ok((name.trim().to_string(), path.trim().to_string()))
        }
        _ => Err(format!("expected name=path, got '{}'", raw)),
    }
}
