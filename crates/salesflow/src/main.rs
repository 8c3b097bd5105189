use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::Parser;
use salesflow_core::{PipelineConfig, TracingObserver};
use tracing::{error, info};

mod logging;

#[derive(Parser, Debug)]
#[command(author, version, about = "Clean and summarize per-country sales figures", long_about = None)]
struct Cli {
    /// TOML file with pipeline settings
    #[arg(long)]
    config: Option<PathBuf>,
    /// Input CSV (must contain a `Country` column)
    #[arg(long)]
    input: Option<PathBuf>,
    /// Directory receiving the CSV files and the SQLite database
    #[arg(long)]
    output_dir: Option<PathBuf>,
    /// Table replaced with the growth results
    #[arg(long)]
    table: Option<String>,
    /// Directory holding pipeline.log
    #[arg(long)]
    log_dir: Option<PathBuf>,
    /// Substring identifying the sales columns
    #[arg(long)]
    marker: Option<String>,
}

impl Cli {
    fn into_config(self) -> Result<PipelineConfig> {
        let mut config = PipelineConfig::load(self.config.as_deref())
            .context("failed to load pipeline configuration")?;

        if let Some(input) = self.input {
            config.input_path = input;
        }
        if let Some(output_dir) = self.output_dir {
            config.output_dir = output_dir;
        }
        if let Some(table) = self.table {
            config.table_name = table;
        }
        if let Some(log_dir) = self.log_dir {
            config.log_dir = log_dir;
        }
        if let Some(marker) = self.marker {
            config.measure_marker = marker;
        }
        Ok(config)
    }
}

#[tokio::main]
async fn main() -> ExitCode {
    dotenvy::dotenv().ok();

    let config = match Cli::parse().into_config() {
        Ok(config) => config,
        Err(err) => {
            eprintln!("{err:#}");
            return ExitCode::FAILURE;
        }
    };

    let _guard = match logging::init_logging(&config.log_path()) {
        Ok(guard) => guard,
        Err(err) => {
            eprintln!("{err:#}");
            return ExitCode::FAILURE;
        }
    };

    match run(&config).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            error!("{err:#}");
            ExitCode::FAILURE
        }
    }
}

async fn run(config: &PipelineConfig) -> Result<()> {
    info!(input = %config.input_path.display(), "Starting sales pipeline");

    let summary = salesflow_core::run(config, Arc::new(TracingObserver))
        .await
        .context("sales pipeline failed")?;

    info!(
        run_id = %summary.run_id,
        input_rows = summary.input_rows,
        sanitized_rows = summary.sanitized_rows,
        measures = ?summary.measure_columns,
        growth = ?summary.growth_columns,
        elapsed_ms = (summary.finished_at - summary.started_at).num_milliseconds(),
        "Run finished"
    );
    for output in &summary.outputs {
        info!(output = %output, "Wrote output");
    }
    Ok(())
}
