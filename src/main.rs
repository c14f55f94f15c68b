use anyhow::Context;
use bank_etl::config::Config;
use bank_etl::logging;
use bank_etl::Pipeline;
use clap::Parser;
use std::path::PathBuf;
use tracing::{error, info};

#[derive(Parser)]
#[command(name = "bank_etl")]
#[command(about = "Extract the largest-banks table, convert market caps and load them")]
#[command(version)]
struct Cli {
    /// Config file (defaults to ./etl.toml when present)
    #[arg(long)]
    config: Option<PathBuf>,
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let config = Config::load(cli.config.as_deref()).context("loading configuration")?;
    let _guard = logging::init_logging(&config.diagnostics_dir);

    let pipeline = Pipeline::new(config);
    let source = pipeline.default_source()?;

    match pipeline.run(source.as_ref()) {
        Ok(report) => {
            info!(
                rows = report.table.len(),
                queries = report.query_results.len(),
                stage = %report.stage,
                "pipeline finished"
            );
            Ok(())
        }
        Err(e) => {
            error!("Pipeline failed: {}", e);
            Err(e.into())
        }
    }
}
