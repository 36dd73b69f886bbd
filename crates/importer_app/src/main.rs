mod cli;
mod env_file;

use std::path::PathBuf;
use std::process::ExitCode;

use anyhow::Context;
use clap::Parser;
use importer_core::BatchReport;
use importer_engine::{lift_front_matter_in_file, Importer, LoggingSink};
use importer_logging::{importer_error, importer_info, importer_warn};

fn main() -> ExitCode {
    let args = cli::Args::parse();
    importer_logging::initialize(args.log_level(), args.log_file.as_deref());

    if !args.lift.is_empty() {
        return lift(&args.lift);
    }

    match run(&args) {
        Ok(report) if report.is_success() => ExitCode::SUCCESS,
        Ok(report) => {
            importer_error!(
                "{} entries failed: {}",
                report.failed.len(),
                report.failed_ids().join(", ")
            );
            if report.aborted {
                importer_warn!("batch stopped early after the first failure");
            }
            ExitCode::FAILURE
        }
        Err(err) => {
            importer_error!("{err:#}");
            ExitCode::FAILURE
        }
    }
}

fn run(args: &cli::Args) -> anyhow::Result<BatchReport> {
    let file_vars = env_file::load(args.env_file.as_deref()).context("failed to read .env file")?;
    let config = args.apply(env_file::import_config(&file_vars)?);
    importer_info!(
        "importing database {} into {}",
        config.database_id,
        config.output_dir.display()
    );

    let runtime = tokio::runtime::Runtime::new().context("failed to start async runtime")?;
    let report = runtime.block_on(async {
        let importer = Importer::from_config(&config)?;
        let report = importer.run(&LoggingSink).await?;
        Ok::<_, anyhow::Error>(report)
    })?;

    importer_info!(
        "{} written, {} failed, {} filename collisions",
        report.written.len(),
        report.failed.len(),
        report.collisions.len()
    );
    Ok(report)
}

fn lift(paths: &[PathBuf]) -> ExitCode {
    let mut failed = 0usize;
    for path in paths {
        match lift_front_matter_in_file(path) {
            Ok(true) => importer_info!("✔ {} front matter lifted", path.display()),
            Ok(false) => importer_info!("{} has no embedded front matter", path.display()),
            Err(err) => {
                importer_error!("✘ {}: {err}", path.display());
                failed += 1;
            }
        }
    }
    if failed == 0 {
        ExitCode::SUCCESS
    } else {
        ExitCode::FAILURE
    }
}
