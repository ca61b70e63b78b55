//! Command-line batch extraction: reports or tables in, feature matrix out.

use std::path::PathBuf;
use std::process::ExitCode;

use anyhow::{Context, Result};
use clap::Parser;
use rusty_extraktor::config::Settings;
use rusty_extraktor::data::export;
use rusty_extraktor::data::source::{resolve_targets, ExtractionTarget, Extraktor, SourceKind};

/// Build a feature matrix from chromatography reports, CSV files or workbooks.
#[derive(Debug, Parser)]
#[command(name = "extract", about, version)]
struct Cli {
    /// Input files; all of one kind (.pdf, .csv or .xlsx)
    #[arg(value_name = "FILE", required = true)]
    files: Vec<PathBuf>,

    /// Settings file (TOML). Default: $RUSTY_EXTRAKTOR_CONFIG, then built-in
    #[arg(short, long, value_name = "CONFIG")]
    config: Option<PathBuf>,

    /// Keep cache entries under this directory instead of next to each PDF
    #[arg(long, value_name = "DIR")]
    cache_dir: Option<PathBuf>,

    /// Parse every PDF, neither reading nor writing cache entries
    #[arg(long)]
    no_cache: bool,

    /// Measurement (Area, Area%) or sheet name. Default: first available
    #[arg(short, long)]
    target: Option<String>,

    /// Write the matrix here (.csv or .parquet) instead of printing it
    #[arg(short, long, value_name = "OUT")]
    output: Option<PathBuf>,

    /// Print the targets the batch offers and exit
    #[arg(long)]
    list_targets: bool,

    /// Log debug output
    #[arg(short, long)]
    verbose: bool,
}

fn run(cli: Cli) -> Result<()> {
    let mut settings = Settings::discover(cli.config.as_deref())?;
    if cli.no_cache {
        settings.cache.enabled = false;
    }
    if let Some(dir) = cli.cache_dir {
        settings.cache.root = Some(dir);
    }

    if cli.list_targets {
        let choices = resolve_targets(&cli.files);
        let kind = choices.kind.context("no common input kind for these files")?;
        println!("{kind}:");
        for target in &choices.targets {
            println!("  {target}");
        }
        return Ok(());
    }

    let target = match &cli.target {
        Some(raw) => {
            let kind = SourceKind::of_batch(&cli.files)?;
            Some(ExtractionTarget::parse_for(kind, raw)?)
        }
        None => None,
    };

    let extraktor = Extraktor::new(settings);
    let outcome = extraktor.run(&cli.files, target.as_ref())?;
    for ex in &outcome.excluded {
        eprintln!("excluded {}: {}", ex.path, ex.reason);
    }

    match cli.output {
        Some(path) => {
            export::write_matrix(&outcome.matrix, &path)?;
            log::info!("Wrote {} row(s) to {}", outcome.matrix.len(), path.display());
        }
        None => {
            let batch = export::to_record_batch(&outcome.matrix)?;
            let table = arrow::util::pretty::pretty_format_batches(&[batch])
                .context("formatting matrix")?;
            println!("{table}");
        }
    }
    Ok(())
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    let level = if cli.verbose {
        log::LevelFilter::Debug
    } else {
        log::LevelFilter::Info
    };
    env_logger::Builder::from_default_env()
        .filter_level(level)
        .init();

    match run(cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("error: {e:#}");
            ExitCode::FAILURE
        }
    }
}
