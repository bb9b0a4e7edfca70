//! Wiring between the CLI and the session manager.

pub mod storage;

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use tokio::sync::broadcast::error::RecvError;
use tracing::debug;

use lectern_core::{ApiBaseUrl, CredentialStore, SessionEvent};
use lectern_http::{AmbientSession, LoginRedirect, SessionConfig, SessionManager};
use lectern_store::FileCredentialStore;

use crate::cli::GlobalArgs;
use crate::output;

/// A terminal has no login screen to navigate to; tell the user instead.
struct PromptLogin {
    at_login: bool,
}

impl LoginRedirect for PromptLogin {
    fn is_at_login(&self) -> bool {
        self.at_login
    }

    fn redirect_to_login(&self) {
        output::warning("Session expired. Run 'lectern login' to sign in again.");
    }
}

/// The session manager plus what is needed to persist it on exit.
pub struct CliSession {
    pub manager: SessionManager,
    base: ApiBaseUrl,
    dir: PathBuf,
}

impl CliSession {
    /// Open the session stored in the data directory.
    ///
    /// `at_login` suppresses the expiry prompt while the user is already
    /// logging in.
    pub fn open(global: &GlobalArgs, at_login: bool) -> Result<Self> {
        let base = ApiBaseUrl::new(&global.base_url).context("Invalid base URL")?;
        let dir = storage::data_dir(global.data_dir.as_deref())?;

        let ambient = AmbientSession::new();
        storage::load_ambient(&dir, &base, &ambient)?;

        let config = SessionConfig::new(base.clone())
            .with_refresh_timeout(Duration::from_secs(global.refresh_timeout))
            .with_user_agent(concat!("lectern-cli/", env!("CARGO_PKG_VERSION")));
        let store: Arc<dyn CredentialStore> = Arc::new(FileCredentialStore::new(&dir));

        let manager = SessionManager::builder(config, store)
            .ambient(ambient)
            .login_redirect(Arc::new(PromptLogin { at_login }))
            .build()
            .context("Failed to create session")?;

        spawn_event_log(&manager);

        Ok(Self { manager, base, dir })
    }

    /// Write the session cookie back to disk.
    pub fn persist(&self) -> Result<()> {
        storage::save_ambient(&self.dir, &self.base, self.manager.ambient())
    }

    /// Forget the session cookie.
    pub fn forget(&self) -> Result<()> {
        storage::clear_ambient(&self.dir)
    }

    pub fn base(&self) -> &ApiBaseUrl {
        &self.base
    }
}

fn spawn_event_log(manager: &SessionManager) {
    let mut events = manager.events();
    tokio::spawn(async move {
        loop {
            match events.recv().await {
                Ok(SessionEvent::StateChanged(state)) => debug!(state = state.name(), "Session state"),
                Ok(event) => debug!(?event, "Session event"),
                Err(RecvError::Lagged(skipped)) => debug!(skipped, "Session events dropped"),
                Err(RecvError::Closed) => break,
            }
        }
    });
}
