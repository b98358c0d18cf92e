//! Persisted login credential.
//!
//! The token lives in a small JSON file. Writes go to a hidden temporary
//! file in the same directory which is then renamed over the target, so a
//! crash never leaves a truncated credential behind.

use std::io::{self, Write};
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::{SystemTime, UNIX_EPOCH};

use camino::{Utf8Path, Utf8PathBuf};
use cap_std::ambient_authority;
use cap_std::fs::{Dir, OpenOptions};
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::ClientError;

static TEMP_COUNTER: AtomicU64 = AtomicU64::new(0);

/// Contents of the credential file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StoredToken {
    /// Bearer token.
    pub token: String,
    /// Username the token was issued to.
    pub username: String,
}

/// Credential file at a fixed path.
#[derive(Debug, Clone)]
pub struct TokenStore {
    path: Utf8PathBuf,
}

impl TokenStore {
    /// Store backed by `path`.
    #[must_use]
    pub fn new(path: impl Into<Utf8PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// Credential file path.
    #[must_use]
    pub fn path(&self) -> &Utf8Path {
        &self.path
    }

    /// Read the stored credential, if any.
    ///
    /// # Errors
    /// Returns [`ClientError::TokenStore`] when the file exists but cannot be
    /// read or parsed.
    pub fn load(&self) -> Result<Option<StoredToken>, ClientError> {
        let file_name = self.file_name()?;
        let dir = match Dir::open_ambient_dir(self.parent(), ambient_authority()) {
            Ok(dir) => dir,
            Err(err) if err.kind() == io::ErrorKind::NotFound => return Ok(None),
            Err(err) => return Err(self.failure(&err)),
        };
        let contents = match dir.read_to_string(file_name) {
            Ok(contents) => contents,
            Err(err) if err.kind() == io::ErrorKind::NotFound => return Ok(None),
            Err(err) => return Err(self.failure(&err)),
        };
        serde_json::from_str(&contents)
            .map(Some)
            .map_err(|err| self.failure(&err))
    }

    /// Replace the stored credential.
    ///
    /// # Errors
    /// Returns [`ClientError::TokenStore`] when the directory or file cannot
    /// be written.
    pub fn save(&self, token: &StoredToken) -> Result<(), ClientError> {
        let file_name = self.file_name()?;
        let parent = self.parent();
        Dir::create_ambient_dir_all(parent, ambient_authority())
            .map_err(|err| self.failure(&err))?;
        let dir =
            Dir::open_ambient_dir(parent, ambient_authority()).map_err(|err| self.failure(&err))?;
        let contents = serde_json::to_string_pretty(token).map_err(|err| self.failure(&err))?;
        self.write_atomic(&dir, file_name, &contents)?;
        debug!(path = %self.path, "stored credential");
        Ok(())
    }

    /// Delete the stored credential. Returns whether a file was removed.
    ///
    /// # Errors
    /// Returns [`ClientError::TokenStore`] when the file exists but cannot be
    /// removed.
    pub fn clear(&self) -> Result<bool, ClientError> {
        let file_name = self.file_name()?;
        let dir = match Dir::open_ambient_dir(self.parent(), ambient_authority()) {
            Ok(dir) => dir,
            Err(err) if err.kind() == io::ErrorKind::NotFound => return Ok(false),
            Err(err) => return Err(self.failure(&err)),
        };
        match dir.remove_file(file_name) {
            Ok(()) => Ok(true),
            Err(err) if err.kind() == io::ErrorKind::NotFound => Ok(false),
            Err(err) => Err(self.failure(&err)),
        }
    }

    fn parent(&self) -> &Utf8Path {
        self.path
            .parent()
            .filter(|parent| !parent.as_str().is_empty())
            .unwrap_or_else(|| Utf8Path::new("."))
    }

    fn file_name(&self) -> Result<&str, ClientError> {
        self.path.file_name().ok_or_else(|| ClientError::TokenStore {
            path: self.path.clone(),
            message: "token path must name a file".to_owned(),
        })
    }

    fn failure(&self, err: &impl ToString) -> ClientError {
        ClientError::TokenStore {
            path: self.path.clone(),
            message: err.to_string(),
        }
    }

    fn write_atomic(&self, dir: &Dir, file_name: &str, contents: &str) -> Result<(), ClientError> {
        let counter = TEMP_COUNTER.fetch_add(1, Ordering::Relaxed);
        let suffix = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map_or(0, |elapsed| elapsed.as_nanos());
        let tmp_name = format!(
            ".{file_name}.tmp.{}.{suffix}.{counter}",
            std::process::id()
        );

        if let Err(err) = write_private_file(dir, &tmp_name, contents) {
            drop(dir.remove_file(&tmp_name));
            return Err(self.failure(&err));
        }
        if let Err(err) = dir.rename(&tmp_name, dir, file_name) {
            drop(dir.remove_file(&tmp_name));
            return Err(self.failure(&err));
        }
        Ok(())
    }
}

fn write_private_file(dir: &Dir, name: &str, contents: &str) -> io::Result<()> {
    let mut options = OpenOptions::new();
    options.write(true).create_new(true);
    let mut file = dir.open_with(name, &options)?;
    restrict_to_owner(dir, name)?;
    file.write_all(contents.as_bytes())?;
    file.sync_all()
}

#[cfg(unix)]
fn restrict_to_owner(dir: &Dir, name: &str) -> io::Result<()> {
    use std::os::unix::fs::PermissionsExt;

    let permissions = cap_std::fs::Permissions::from_std(std::fs::Permissions::from_mode(0o600));
    dir.set_permissions(name, permissions)
}

#[cfg(not(unix))]
fn restrict_to_owner(_dir: &Dir, _name: &str) -> io::Result<()> {
    Ok(())
}
