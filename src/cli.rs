use clap::{ArgAction, Parser};
use e621_config::Config;
use std::path::PathBuf;

/// Match a local file collection against the e621 database export and write
/// the metadata of every matching post.
#[derive(Debug, Parser)]
#[command(name = "e621-metadata", version, about)]
pub struct Cli {
    /// Configuration file (TOML, JSON or YAML).
    #[arg(short, long, value_name = "FILE")]
    pub config: Option<PathBuf>,
    /// Directory to scan.
    #[arg(short, long, value_name = "DIR")]
    pub data_directory: Option<PathBuf>,
    /// Posts export (CSV, optionally gzip or bzip2 compressed).
    #[arg(long, value_name = "FILE")]
    pub posts: Option<PathBuf>,
    /// Tags export; without it `artist_string` is not derived.
    #[arg(long, value_name = "FILE")]
    pub tags: Option<PathBuf>,
    /// Directory of dated exports to pick the latest from.
    #[arg(long, value_name = "DIR")]
    pub exports_directory: Option<PathBuf>,
    /// CSV results file.
    #[arg(short, long, value_name = "FILE")]
    pub output: Option<PathBuf>,
    /// Also write newline-delimited JSON next to the CSV file.
    #[arg(long)]
    pub json: bool,
    /// Files fingerprinted at once.
    #[arg(long, value_name = "N")]
    pub concurrency: Option<usize>,
    /// More logging; repeat for trace output.
    #[arg(short, long, action = ArgAction::Count)]
    pub verbose: u8,
}

impl Cli {
    /// Command line values take precedence over the loaded configuration.
    pub fn apply(&self, config: &mut Config) {
        if let Some(data_directory) = &self.data_directory {
            config.data_directory = Some(data_directory.clone());
        }
        if let Some(posts) = &self.posts {
            config.exports.posts = Some(posts.clone());
        }
        if let Some(tags) = &self.tags {
            config.exports.tags = Some(tags.clone());
        }
        if let Some(directory) = &self.exports_directory {
            config.exports.directory = Some(directory.clone());
        }
        if let Some(output) = &self.output {
            config.output = output.clone();
        }
        if self.json {
            config.export_json = true;
        }
        if let Some(concurrency) = self.concurrency {
            config.scan.concurrency = concurrency;
        }
    }

    pub fn log_level(&self) -> &'static str {
        match self.verbose {
            0 => "info",
            1 => "debug",
            _ => "trace",
        }
    }
}
