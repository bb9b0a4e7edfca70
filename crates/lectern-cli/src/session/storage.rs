//! On-disk layout of the CLI's session.

use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use directories::ProjectDirs;

use lectern_core::ApiBaseUrl;
use lectern_http::AmbientSession;

#[cfg(unix)]
use std::os::unix::fs::PermissionsExt;

const AMBIENT_FILE: &str = "session-cookie";

/// Resolve and create the data directory.
pub fn data_dir(explicit: Option<&Path>) -> Result<PathBuf> {
    let dir = match explicit {
        Some(dir) => dir.to_path_buf(),
        None => ProjectDirs::from("app", "lectern", "lectern")
            .context("Could not determine data directory")?
            .data_dir()
            .to_path_buf(),
    };

    fs::create_dir_all(&dir).context("Failed to create data directory")?;
    Ok(dir)
}

/// Seed the cookie jar from the previous run, if anything was saved.
pub fn load_ambient(dir: &Path, base: &ApiBaseUrl, ambient: &AmbientSession) -> Result<()> {
    let path = dir.join(AMBIENT_FILE);
    if !path.exists() {
        return Ok(());
    }

    let header = fs::read_to_string(&path).context("Failed to read session cookie")?;
    ambient.restore(base, header.trim());
    Ok(())
}

/// Persist the cookie jar for the next run, or remove the file once the
/// server has dropped the cookie.
pub fn save_ambient(dir: &Path, base: &ApiBaseUrl, ambient: &AmbientSession) -> Result<()> {
    let path = dir.join(AMBIENT_FILE);

    let Some(header) = ambient.cookie_header(base) else {
        if path.exists() {
            fs::remove_file(&path).context("Failed to remove session cookie")?;
        }
        return Ok(());
    };

    fs::write(&path, header).context("Failed to write session cookie")?;

    // Set restrictive permissions (Unix only)
    #[cfg(unix)]
    {
        let mut perms = fs::metadata(&path)?.permissions();
        perms.set_mode(0o600);
        fs::set_permissions(&path, perms)?;
    }

    Ok(())
}

/// Forget the cookie regardless of what the jar holds.
pub fn clear_ambient(dir: &Path) -> Result<()> {
    let path = dir.join(AMBIENT_FILE);
    if path.exists() {
        fs::remove_file(&path).context("Failed to remove session cookie")?;
    }
    Ok(())
}
