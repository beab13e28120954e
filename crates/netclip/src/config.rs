use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::{Context, Result};

pub const DEFAULT_BASE_URL: &str = "http://localhost:8000/";
pub const KEY_FILE_NAME: &str = ".netclip_key";

/// Everything an invocation needs to know about its surroundings.
///
/// Built once in [`crate::run`] and handed by reference to the credential
/// store and the service client.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Config {
    pub base_url: String,
    pub key_file: PathBuf,
    pub timeout: Option<Duration>,
}

impl Config {
    pub fn new(base_url: impl Into<String>, key_file: impl Into<PathBuf>) -> Self {
        Self {
            base_url: base_url.into(),
            key_file: key_file.into(),
            timeout: None,
        }
    }

    pub fn with_timeout(mut self, timeout: Option<Duration>) -> Self {
        self.timeout = timeout;
        self
    }

    /// Apply overrides on top of the defaults (`http://localhost:8000/`, `~/.netclip_key`).
    pub fn resolve(
        base_url: Option<&str>,
        key_file: Option<&Path>,
        timeout: Option<Duration>,
    ) -> Result<Self> {
        resolve_with(base_url, key_file, timeout, dirs::home_dir)
    }

    pub fn key_file(&self) -> &Path {
        &self.key_file
    }
}

fn resolve_with(
    base_url: Option<&str>,
    key_file: Option<&Path>,
    timeout: Option<Duration>,
    home_dir: impl FnOnce() -> Option<PathBuf>,
) -> Result<Config> {
    let base_url = match base_url.map(str::trim) {
        Some(url) if !url.is_empty() => url.to_string(),
        _ => DEFAULT_BASE_URL.to_string(),
    };
    let key_file = match key_file {
        Some(path) => path.to_path_buf(),
        None => home_dir()
            .context("could not determine home directory; pass --key-file")?
            .join(KEY_FILE_NAME),
    };
    Ok(Config::new(base_url, key_file).with_timeout(timeout))
}
