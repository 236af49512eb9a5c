mod config;
mod ingest;

use std::{path::PathBuf, process::ExitCode};

use anyhow::Context as _;
use chrono::NaiveDate;
use clap::{Parser, Subcommand};
use newmusic_core::{
    HttpArtFetcher, RecordingSurface, RunOutcome, Surface, ValidationReport, render_card,
    validate_store,
};
use newmusic_raster::RasterSurface;
use tracing_subscriber::{layer::SubscriberExt as _, util::SubscriberInitExt as _};

use config::Config;

#[derive(Parser)]
#[command(author, version, about = "Renders a weekly new releases card", long_about = None)]
struct Args {
    /// Path to the configuration file
    #[arg(long, global = true, default_value = Config::FILENAME)]
    config: PathBuf,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Render the card for the seven days ending today
    Render {
        /// Render as of this date (YYYY-MM-DD) instead of today
        #[arg(long)]
        today: Option<NaiveDate>,

        /// Write a JSON display list instead of a JPEG
        #[arg(long)]
        dry_run: bool,
    },
    /// Fetch the albums in the album list and append them to the record store
    Ingest,
    /// Check every row of the record store
    Validate,
}

#[tokio::main]
async fn main() -> anyhow::Result<ExitCode> {
    tracing_subscriber::registry()
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| {
                tracing_subscriber::EnvFilter::new(
                    "newmusic=info,newmusic_core=info,newmusic_catalog=info,newmusic_raster=info",
                )
            }),
        )
        .init();

    let args = Args::parse();
    let config = Config::load(&args.config)?;

    match args.command {
        Command::Render { today, dry_run } => {
            let today = today.unwrap_or_else(|| chrono::Local::now().date_naive());
            render(&config, today, dry_run).await?;
            Ok(ExitCode::SUCCESS)
        }
        Command::Ingest => match ingest::run(&config).await? {
            Some(report) => Ok(print_report(&config, &report)),
            None => {
                println!("No new albums fetched");
                Ok(ExitCode::SUCCESS)
            }
        },
        Command::Validate => {
            let records = &config.paths.records;
            let file = std::fs::File::open(records)
                .with_context(|| format!("failed to open {}", records.display()))?;
            let report = validate_store(file, config.render.date_order)?;
            Ok(print_report(&config, &report))
        }
    }
}

async fn render(config: &Config, today: NaiveDate, dry_run: bool) -> anyhow::Result<()> {
    let composer = config.composer();
    let (width, height) = (composer.geometry.width, composer.geometry.height);
    let mut surface: Box<dyn Surface> = if dry_run {
        Box::new(RecordingSurface::new(width, height))
    } else {
        let fonts = config.load_fonts()?;
        Box::new(RasterSurface::new(width, height, &fonts)?)
    };

    let records = &config.paths.records;
    let file = std::fs::File::open(records)
        .with_context(|| format!("failed to open {}", records.display()))?;
    let outcome = render_card(
        file,
        today,
        &HttpArtFetcher::new(),
        &composer,
        surface.as_mut(),
        &config.render_settings(),
    )
    .await?;

    match outcome {
        RunOutcome::NoReleases { .. } => println!("No releases found for the previous week"),
        RunOutcome::Rendered { card, path, .. } => {
            println!(
                "Saved {} ({} releases, {} skipped)",
                path.display(),
                card.rendered_count(),
                card.skipped_count()
            );
            if !card.clipped.is_empty() {
                println!(
                    "{} releases did not fit on the card and were clipped",
                    card.clipped.len()
                );
            }
        }
    }
    Ok(())
}

fn print_report(config: &Config, report: &ValidationReport) -> ExitCode {
    let records = config.paths.records.display();
    for (line, issue) in &report.issues {
        println!("{records}:{line}: {issue}");
    }
    println!(
        "Checked {} rows, found {} issues",
        report.rows_checked,
        report.issues.len()
    );
    if report.is_clean() {
        ExitCode::SUCCESS
    } else {
        ExitCode::FAILURE
    }
}
