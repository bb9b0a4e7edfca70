//! File-backed credential store.

use std::fs::{self, OpenOptions};
use std::io::Write;
use std::path::{Path, PathBuf};

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use fs2::FileExt;
use serde::{Deserialize, Serialize};
use tracing::{debug, instrument, warn};

use lectern_core::error::StorageError;
use lectern_core::{AccessToken, CredentialStore, Result};

#[cfg(unix)]
use std::os::unix::fs::{OpenOptionsExt, PermissionsExt};

/// File holding the persisted credential.
const CREDENTIAL_FILE: &str = "credential.json";

/// Lock file serializing writers across processes.
const LOCK_FILE: &str = "credential.lock";

/// On-disk layout: one credential under the well-known key.
#[derive(Debug, Serialize, Deserialize)]
struct StoredCredential {
    #[serde(rename = "access_token")]
    token: String,
    stored_at: DateTime<Utc>,
}

fn map_io(path: &Path, err: std::io::Error) -> StorageError {
    StorageError::Io {
        path: path.display().to_string(),
        message: err.to_string(),
    }
}

/// Credential store persisted as a single JSON file.
///
/// Writes go to a temporary file that is renamed over the previous one, so
/// a reader never observes a half-written credential. On Unix the file is
/// created with mode `0600`.
#[derive(Debug, Clone)]
pub struct FileCredentialStore {
    dir: PathBuf,
}

impl FileCredentialStore {
    /// Create a store rooted at the given directory. The directory is
    /// created on first write.
    pub fn new(dir: impl AsRef<Path>) -> Self {
        Self {
            dir: dir.as_ref().to_path_buf(),
        }
    }

    /// Path of the credential file.
    pub fn path(&self) -> PathBuf {
        self.dir.join(CREDENTIAL_FILE)
    }

    /// When the current credential was written, if one is stored.
    pub fn stored_at(&self) -> Result<Option<DateTime<Utc>>> {
        Ok(self.read()?.map(|stored| stored.stored_at))
    }

    fn lock_path(&self) -> PathBuf {
        self.dir.join(LOCK_FILE)
    }

    fn read(&self) -> Result<Option<StoredCredential>> {
        let path = self.path();
        let contents = match fs::read_to_string(&path) {
            Ok(contents) => contents,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(map_io(&path, e).into()),
        };

        let stored: StoredCredential =
            serde_json::from_str(&contents).map_err(|e| StorageError::Corrupt {
                message: e.to_string(),
            })?;
        Ok(Some(stored))
    }

    fn with_lock<T>(&self, f: impl FnOnce() -> Result<T>) -> Result<T> {
        fs::create_dir_all(&self.dir).map_err(|e| map_io(&self.dir, e))?;

        let lock_path = self.lock_path();
        let lock_file = OpenOptions::new()
            .create(true)
            .truncate(false)
            .write(true)
            .open(&lock_path)
            .map_err(|e| map_io(&lock_path, e))?;
        lock_file
            .lock_exclusive()
            .map_err(|e| map_io(&lock_path, e))?;

        let result = f();

        if let Err(e) = lock_file.unlock() {
            warn!(error = %e, "Failed to release credential lock");
        }
        result
    }

    fn write(&self, stored: &StoredCredential) -> Result<()> {
        let path = self.path();
        let tmp = self.dir.join(format!("{}.tmp", CREDENTIAL_FILE));
        let json = serde_json::to_string_pretty(stored).map_err(|e| StorageError::Corrupt {
            message: e.to_string(),
        })?;

        let mut options = OpenOptions::new();
        options.create(true).truncate(true).write(true);
        #[cfg(unix)]
        options.mode(0o600);

        let mut file = options.open(&tmp).map_err(|e| map_io(&tmp, e))?;

        // A temp file left by an interrupted write keeps its old mode.
        #[cfg(unix)]
        file.set_permissions(fs::Permissions::from_mode(0o600))
            .map_err(|e| map_io(&tmp, e))?;

        file.write_all(json.as_bytes())
            .and_then(|()| file.sync_all())
            .map_err(|e| map_io(&tmp, e))?;
        drop(file);

        fs::rename(&tmp, &path).map_err(|e| map_io(&path, e))?;
        Ok(())
    }
}

#[async_trait]
impl CredentialStore for FileCredentialStore {
    async fn get(&self) -> Result<Option<AccessToken>> {
        Ok(self.read()?.map(|stored| AccessToken::new(stored.token)))
    }

    #[instrument(skip(self, token), fields(dir = %self.dir.display()))]
    async fn set(&self, token: &AccessToken) -> Result<()> {
        let stored = StoredCredential {
            token: token.as_str().to_string(),
            stored_at: Utc::now(),
        };
        self.with_lock(|| self.write(&stored))?;
        debug!("Stored credential");
        Ok(())
    }

    #[instrument(skip(self), fields(dir = %self.dir.display()))]
    async fn clear(&self) -> Result<()> {
        let path = self.path();
        self.with_lock(|| match fs::remove_file(&path) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(map_io(&path, e).into()),
        })?;
        debug!("Cleared credential");
        Ok(())
    }
}
