mod cli;
mod error;
mod exports;
mod progress;

use crate::cli::Cli;
use crate::error::{ErrorKind, Result};
use crate::exports::resolve;
use crate::progress::{Progress, Tally};
use clap::Parser;
use e621_config::{Config, Exports};
use e621_dataset::{ArtistTagSet, Dataset, DatasetIndex, DumpDirectory, ExportSource};
use e621_library::{Outcome, OutputOptions, ScanEvent, ScanOptions, finalize, scan};
use exn::{OptionExt, ResultExt};
use futures::StreamExt;
use std::process::ExitCode;
use std::time::Instant;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();
    init_tracing(cli.log_level());
    match run(cli).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            tracing::error!("{e:?}");
            ExitCode::FAILURE
        },
    }
}

/// `RUST_LOG` takes precedence over the verbosity flags.
fn init_tracing(default_level: &str) {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level)))
        .with_writer(std::io::stderr)
        .init();
}

async fn run(cli: Cli) -> Result<()> {
    let started = Instant::now();
    let mut config = Config::load(cli.config.as_deref()).or_raise(|| ErrorKind::Config)?;
    cli.apply(&mut config);
    config.validate().or_raise(|| ErrorKind::Config)?;
    let data_directory = config.data_directory.clone().ok_or_raise(|| ErrorKind::Config)?;
    tracing::info!(path = %data_directory.display(), "Data directory validated");

    let exports = config.exports.clone();
    let (posts, artists) = tokio::task::spawn_blocking(move || load_indices(&exports))
        .await
        .or_raise(|| ErrorKind::Task)??;

    let mut tally = Tally::default();
    let mut progress = Progress::default();
    let mut records = Vec::new();
    let options = ScanOptions { concurrency: config.scan.concurrency };
    let mut events = std::pin::pin!(scan(&data_directory, &posts, artists.as_ref(), options));
    while let Some(event) = events.next().await {
        let event = match event {
            Ok(event) => event,
            Err(e) => {
                let kind = &*e;
                if kind.is_file_error() {
                    tracing::warn!(path = %kind.path().display(), error = ?e, "Skipping unreadable file");
                    tally.skipped += 1;
                    report(&mut progress);
                } else {
                    tracing::warn!(path = %kind.path().display(), error = ?e, "Skipping unreadable directory");
                    tally.unreadable_directories += 1;
                }
                continue;
            },
        };
        match event {
            ScanEvent::Started => tracing::info!(path = %data_directory.display(), "Scanning directory"),
            ScanEvent::DiscoveryComplete(total) => {
                tracing::info!(total, "Discovered files");
                progress = Progress::new(total);
            },
            ScanEvent::Matched { path, record } => {
                tracing::debug!(path = %path.display(), id = ?record.id(), "Match");
                records.push(*record);
                tally.matched += 1;
                report(&mut progress);
            },
            ScanEvent::Unmatched { .. } => {
                tally.unmatched += 1;
                report(&mut progress);
            },
            ScanEvent::Complete => tracing::debug!("Scan complete"),
        }
    }

    let output = OutputOptions::new(config.output.clone()).with_json(config.export_json);
    let outcome = tokio::task::spawn_blocking(move || finalize(records, &output))
        .await
        .or_raise(|| ErrorKind::Task)?
        .or_raise(|| ErrorKind::Output)?;

    let elapsed_secs = started.elapsed().as_secs_f64();
    match outcome {
        Outcome::NoMatches => tracing::info!(
            elapsed_secs,
            unmatched = tally.unmatched,
            skipped = tally.skipped,
            "No matching files found"
        ),
        Outcome::Written { csv, json, .. } => tracing::info!(
            elapsed_secs,
            matched = tally.matched,
            unmatched = tally.unmatched,
            skipped = tally.skipped,
            unreadable_directories = tally.unreadable_directories,
            csv = %csv.display(),
            json = ?json,
            "Processing complete"
        ),
    }
    Ok(())
}

fn load_indices(exports: &Exports) -> Result<(DatasetIndex, Option<ArtistTagSet>)> {
    let dump = exports.directory.as_ref().map(DumpDirectory::new);
    let paths = resolve(exports, dump.as_ref().map(|dump| dump as &dyn ExportSource))?;

    tracing::info!(path = %paths.posts.display(), "Loading the posts export (this can take a minute)");
    let posts = DatasetIndex::load(&paths.posts).or_raise(|| ErrorKind::Index(Dataset::Posts))?;
    let artists = match &paths.tags {
        Some(tags) => Some(ArtistTagSet::load(tags).or_raise(|| ErrorKind::Index(Dataset::Tags))?),
        None => {
            tracing::warn!("No tags export configured; artist_string will not be derived");
            None
        },
    };
    Ok((posts, artists))
}

fn report(progress: &mut Progress) {
    if let Some(percent) = progress.advance() {
        tracing::info!(done = progress.done(), total = progress.total(), "Scanned {percent}%");
    }
}
