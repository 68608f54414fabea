mod cli;
mod config;
mod report;

use std::fs::File;
use std::io::{self, BufReader};
use std::process::ExitCode;
use std::sync::Arc;

use anyhow::Context;
use clap::Parser;
use feedcheck_core::read_url_list;
use feedcheck_engine::Dispatcher;
use feedcheck_logging::{check_info, check_warn};

use crate::cli::Cli;
use crate::config::FileConfig;
use crate::report::{write_report, StdoutSink};

#[tokio::main]
async fn main() -> ExitCode {
    match run().await {
        Ok(code) => code,
        Err(err) => {
            eprintln!("Error: {err:#}");
            ExitCode::FAILURE
        }
    }
}

async fn run() -> anyhow::Result<ExitCode> {
    let cli = Cli::parse();
    feedcheck_logging::initialize(cli.log_destination(), cli.log_level());

    let file_config = match &cli.config {
        Some(path) => FileConfig::load(path)?,
        None => FileConfig::default(),
    };
    let settings = cli.apply_overrides(file_config.into_settings());
    settings.validate().context("invalid configuration")?;

    let file = File::open(&cli.input)
        .with_context(|| format!("failed to open url list {:?}", cli.input))?;
    let list = read_url_list(BufReader::new(file), !cli.no_header)?;
    if list.skipped_lines > 0 {
        check_warn!("Skipped {} unreadable lines in {:?}", list.skipped_lines, cli.input);
    }
    if list.duplicates > 0 {
        check_info!("Ignored {} duplicate urls", list.duplicates);
    }
    if list.urls.is_empty() {
        println!("No URLs found to validate");
        return Ok(ExitCode::SUCCESS);
    }

    check_info!(
        "Checking {} feeds with concurrency {}",
        list.urls.len(),
        settings.concurrency
    );
    let dispatcher = Dispatcher::from_settings(&settings, Arc::new(StdoutSink))?;
    let report = dispatcher.run(list.urls).await;

    write_report(&mut io::stdout().lock(), &report)?;
    Ok(ExitCode::from(cli.exit_policy().exit_code(&report.summary)))
}
