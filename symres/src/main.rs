//! # symres - Main Entry Point
//!
//! Connects to the database, opens the engine, writes the symbol listing and
//! runs the resolution pipeline. Fatal errors surface here and set the exit
//! code.

use anyhow::{Context, Result};
use clap::{CommandFactory, Parser};
use log::{error, info};

use symres::cli::{Args, EngineKind, RunConfig};
use symres::pipeline::{self, PipelineOptions};
use symres::preflight::run_preflight_checks;
use symres::sink::write_symbol_file;
use symres::source::{DbDriver, RecordSource};
use symres::symbolization::{DwarfLoader, EngineLoader, ProcessLoader, ResolverHandle};

// Exit codes
const EXIT_SUCCESS: i32 = 0;
const EXIT_ERROR: i32 = 1;

fn main() {
    env_logger::init();
    std::process::exit(match run() {
        Ok(()) => EXIT_SUCCESS,
        Err(e) => {
            eprintln!("error: {e:#}");
            EXIT_ERROR
        }
    });
}

#[tokio::main]
async fn run() -> Result<()> {
    let Some(config) = RunConfig::from_args(Args::parse()) else {
        // Too few arguments is not an error
        println!("{}", Args::command().render_usage());
        return Ok(());
    };

    let driver: DbDriver = config.driver.parse()?;
    let source = RecordSource::connect(driver, &config.dsn)
        .await
        .context("Failed to connect to database")?;

    run_preflight_checks(&config)?;

    match config.engine {
        EngineKind::Dwarf => {
            resolve_instance(&config, &source, DwarfLoader::new(&config.image)).await
        }
        EngineKind::Binutils => {
            let loader = ProcessLoader::new(&config.addr2line, &config.image);
            resolve_instance(&config, &source, loader).await
        }
    }
}

/// Fetch, list and resolve every symbol of the configured instance
async fn resolve_instance<L>(config: &RunConfig, source: &RecordSource, loader: L) -> Result<()>
where
    L: EngineLoader + 'static,
{
    let handle = ResolverHandle::open(loader, config.recycle_threshold)
        .with_context(|| format!("Failed to load {}", config.image.display()))?;

    let records = match source.fetch(&config.instance_id).await {
        Ok(fetched) => {
            if let Some(e) = fetched.error {
                error!("{e}");
            }
            fetched.records
        }
        Err(e) => {
            error!("{e}");
            Vec::new()
        }
    };

    write_symbol_file(&config.output, &records);

    let options =
        PipelineOptions { include_inlines: config.include_inlines, ..PipelineOptions::default() };
    let report = tokio::task::spawn_blocking(move || {
        pipeline::run(&records, handle, options, std::io::stdout())
    })
    .await
    .context("Resolver task panicked")??;

    info!(
        "Done: {} jobs, {} resolved, {} failed, {} inlined frames, {} engine recycles",
        report.stats.jobs,
        report.stats.resolved,
        report.stats.failed,
        report.stats.inlined,
        report.recycles,
    );
    Ok(())
}
