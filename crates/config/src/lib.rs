//! Layered configuration for `e621-metadata`.
//!
//! Values are merged, lowest priority first, from the built-in defaults, a
//! configuration file (TOML, JSON or YAML) and `E621_`-prefixed environment
//! variables. Nested keys use a double underscore in the environment, so
//! `exports.posts` is read from `E621_EXPORTS__POSTS`.

pub mod error;

use crate::error::{ErrorKind, Result};
use directories::ProjectDirs;
use exn::ResultExt;
use figment::Figment;
use figment::providers::{Env, Format, Json, Toml, Yaml};
use serde::Deserialize;
use std::path::{Path, PathBuf};
use tracing::instrument;

pub const DEFAULT_OUTPUT: &str = "e621_metadata.csv";
pub const DEFAULT_CONCURRENCY: usize = 64;
pub const ENV_PREFIX: &str = "E621_";

/// File names tried in the working directory when no file is given.
const LOCAL_CANDIDATES: [&str; 2] = ["config.toml", "config.json"];

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Root of the file collection to scan.
    pub data_directory: Option<PathBuf>,
    /// Also write the results as newline-delimited JSON.
    pub export_json: bool,
    /// Path of the CSV results file.
    pub output: PathBuf,
    pub exports: Exports,
    pub scan: Scan,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            data_directory: None,
            export_json: false,
            output: PathBuf::from(DEFAULT_OUTPUT),
            exports: Exports::default(),
            scan: Scan::default(),
        }
    }
}

/// Where the database exports come from.
///
/// An explicit `posts` or `tags` path always wins over whatever is discovered
/// in `directory`.
#[derive(Debug, Default, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct Exports {
    pub posts: Option<PathBuf>,
    pub tags: Option<PathBuf>,
    /// A dump directory holding dated `posts-*.csv.gz`/`tags-*.csv.gz` files.
    pub directory: Option<PathBuf>,
    /// Discovered exports are copied here before loading.
    pub cache_directory: Option<PathBuf>,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct Scan {
    pub concurrency: usize,
}

impl Default for Scan {
    fn default() -> Self {
        Self { concurrency: DEFAULT_CONCURRENCY }
    }
}

impl Config {
    /// Load the configuration from `path`, or from the first file found by
    /// [`Config::discover`] when no path is given. Running without any file
    /// is fine; the environment and defaults still apply.
    #[instrument(skip_all, fields(path = ?path))]
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let file = match path {
            Some(path) if !path.is_file() => exn::bail!(ErrorKind::NotFound(path.to_path_buf())),
            Some(path) => Some(path.to_path_buf()),
            None => Self::discover(),
        };
        match &file {
            Some(file) => tracing::debug!(file = %file.display(), "Loading configuration file"),
            None => tracing::debug!("No configuration file found; using defaults and environment"),
        }
        Self::from_figment(Self::figment(file.as_deref())?)
    }

    /// The provider chain behind [`Config::load`], without extracting it.
    pub fn figment(file: Option<&Path>) -> Result<Figment> {
        let mut figment = Figment::new();
        if let Some(file) = file {
            figment = match file.extension().and_then(|ext| ext.to_str()) {
                Some("toml") => figment.merge(Toml::file_exact(file)),
                Some("json") => figment.merge(Json::file_exact(file)),
                Some("yaml" | "yml") => figment.merge(Yaml::file_exact(file)),
                _ => exn::bail!(ErrorKind::UnsupportedFormat(file.to_path_buf())),
            };
        }
        Ok(figment.merge(Env::prefixed(ENV_PREFIX).split("__")))
    }

    pub fn from_figment(figment: Figment) -> Result<Self> {
        figment.extract().or_raise(|| ErrorKind::Parse)
    }

    /// The first configuration file that exists out of `./config.toml`,
    /// `./config.json` and `config.toml` in the platform's configuration
    /// directory.
    pub fn discover() -> Option<PathBuf> {
        let user = ProjectDirs::from("net", "e621", "e621-metadata").map(|dirs| dirs.config_dir().join("config.toml"));
        LOCAL_CANDIDATES.iter().map(PathBuf::from).chain(user).find(|path| path.is_file())
    }

    /// Check that the configuration is complete enough to run with.
    pub fn validate(&self) -> Result<()> {
        let Some(data_directory) = &self.data_directory else {
            exn::bail!(ErrorKind::Invalid("data_directory is required".to_string()));
        };
        if !data_directory.is_dir() {
            exn::bail!(ErrorKind::Invalid(format!(
                "data_directory is not a directory: {}",
                data_directory.display()
            )));
        }
        if self.exports.posts.is_none() && self.exports.directory.is_none() {
            exn::bail!(ErrorKind::Invalid("either exports.posts or exports.directory is required".to_string()));
        }
        if self.scan.concurrency == 0 {
            exn::bail!(ErrorKind::Invalid("scan.concurrency must be at least 1".to_string()));
        }
        Ok(())
    }
}
