// vigil/src/main.rs

mod cli;
mod commands;

use clap::Parser;
use cli::{Cli, Commands};
use commands::detect::DetectArgs;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // 1. Setup Logging (Tracing)
    // RUST_LOG=debug vigil run ... to see the details
    tracing_subscriber::fmt::init();

    let cli = Cli::parse();

    match cli.command {
        // --- USE CASE: RUN CATALOG ---
        Commands::Run {
            project_dir,
            select,
        } => commands::run::execute(project_dir, select).await,

        // --- USE CASE: AD-HOC DETECTION ---
        Commands::Detect {
            query,
            value_col,
            index_col,
            mode,
            frequencies,
            method,
            iqr_factor,
            z_threshold,
            desc,
            db_path,
            output,
            registrations,
        } => {
            commands::detect::execute(DetectArgs {
                query,
                value_col,
                index_col,
                mode,
                frequencies,
                method,
                iqr_factor,
                z_threshold,
                desc,
                db_path,
                output,
                registrations,
            })
            .await
        }

        // --- USE CASE: SHOW REPORT ---
        Commands::Show { report } => commands::show::execute(&report),
    }
}
