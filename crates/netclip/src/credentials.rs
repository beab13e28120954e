use std::fmt;
use std::fs::{self, OpenOptions};
use std::io::{self, Write};
use std::path::{Path, PathBuf};

use anyhow::Result;
use tracing::{debug, warn};

/// Opaque token identifying this machine to the clip service.
///
/// Always trimmed and never empty.
#[derive(Clone, PartialEq, Eq)]
pub struct ApiKey(String);

impl ApiKey {
    pub fn new(raw: impl AsRef<str>) -> Result<Self> {
        let trimmed = raw.as_ref().trim();
        anyhow::ensure!(!trimmed.is_empty(), "API key must not be empty");
        Ok(Self(trimmed.to_string()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Debug for ApiKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("ApiKey").field(&"[redacted]").finish()
    }
}

impl fmt::Display for ApiKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// The single credential file holding this machine's API key.
///
/// The file is owner-read-only once written, so every write removes it
/// first. There is no locking: two concurrent writers can race between the
/// remove and the create, and the loser gets an `AlreadyExists` error.
#[derive(Clone, Debug)]
pub struct KeyStore {
    path: PathBuf,
}

impl KeyStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Read the stored key. A missing or blank file is `Ok(None)`.
    pub fn load(&self) -> io::Result<Option<ApiKey>> {
        match fs::read_to_string(&self.path) {
            Ok(contents) => Ok(ApiKey::new(contents).ok()),
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e),
        }
    }

    /// Like [`KeyStore::load`], but a read failure is logged and reported as no key.
    pub fn read(&self) -> Option<ApiKey> {
        self.load().unwrap_or_else(|e| {
            warn!(path = %self.path.display(), error = %e, "failed to read API key");
            None
        })
    }

    /// Replace the stored key with `key`.
    pub fn write(&self, key: &ApiKey) -> io::Result<()> {
        self.remove_previous()?;
        self.create(key)
    }

    fn remove_previous(&self) -> io::Result<()> {
        match fs::remove_file(&self.path) {
            Ok(()) => {
                debug!(path = %self.path.display(), "removed previous API key");
                Ok(())
            }
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e),
        }
    }

    /// Create the file fresh; fails with `AlreadyExists` if anything is at the path.
    fn create(&self, key: &ApiKey) -> io::Result<()> {
        let mut options = OpenOptions::new();
        options.write(true).create_new(true);
        #[cfg(unix)]
        {
            use std::os::unix::fs::OpenOptionsExt;
            options.mode(0o400);
        }

        let mut file = options.open(&self.path)?;
        file.write_all(key.as_str().as_bytes())?;
        file.sync_all()?;

        #[cfg(not(unix))]
        {
            let mut perms = file.metadata()?.permissions();
            perms.set_readonly(true);
            fs::set_permissions(&self.path, perms)?;
        }

        debug!(path = %self.path.display(), "stored API key");
        Ok(())
    }
}
