//! State shared by the session manager, the interceptor, and the refresh
//! coordinator: the credential store, the state cell, the event channel,
//! and the teardown hooks.

use std::sync::Arc;

use tokio::sync::{Mutex, broadcast};
use tracing::{debug, info, warn};

use lectern_core::{AccessToken, CredentialStore, Result, SessionEvent, SessionState};

use crate::hooks::{CacheInvalidator, LoginRedirect};
use crate::state::SessionStateCell;

const EVENT_CHANNEL_CAPACITY: usize = 64;

pub(crate) struct Lifecycle {
    store: Arc<dyn CredentialStore>,
    state: SessionStateCell,
    events: broadcast::Sender<SessionEvent>,
    caches: Vec<Arc<dyn CacheInvalidator>>,
    redirect: Option<Arc<dyn LoginRedirect>>,
    /// Bumped whenever the session ends or a new one begins. Held across
    /// every credential write so a refresh started under an older session
    /// cannot store its result after the store was cleared.
    generation: Mutex<u64>,
}

impl Lifecycle {
    pub(crate) fn new(
        store: Arc<dyn CredentialStore>,
        caches: Vec<Arc<dyn CacheInvalidator>>,
        redirect: Option<Arc<dyn LoginRedirect>>,
    ) -> Self {
        let (events, _) = broadcast::channel(EVENT_CHANNEL_CAPACITY);
        Self {
            store,
            state: SessionStateCell::default(),
            events,
            caches,
            redirect,
            generation: Mutex::new(0),
        }
    }

    pub(crate) fn store(&self) -> &dyn CredentialStore {
        self.store.as_ref()
    }

    pub(crate) fn state(&self) -> &SessionStateCell {
        &self.state
    }

    pub(crate) fn subscribe_events(&self) -> broadcast::Receiver<SessionEvent> {
        self.events.subscribe()
    }

    pub(crate) fn emit(&self, event: SessionEvent) {
        // No receivers is fine.
        let _ = self.events.send(event);
    }

    pub(crate) fn transition(&self, next: SessionState) {
        let name = next.name();
        let previous = self.state.transition(next.clone());
        if previous != next {
            debug!(from = previous.name(), to = name, "Session state changed");
            self.emit(SessionEvent::StateChanged(next));
        }
    }

    pub(crate) async fn generation(&self) -> u64 {
        *self.generation.lock().await
    }

    /// Store a refreshed credential, unless the session it belongs to has
    /// ended since `generation` was read. Returns whether it was stored.
    pub(crate) async fn store_refreshed(
        &self,
        generation: u64,
        token: &AccessToken,
    ) -> Result<bool> {
        let current = self.generation.lock().await;
        if *current != generation {
            return Ok(false);
        }
        self.store.set(token).await?;
        Ok(true)
    }

    /// Store the credential of a newly established session.
    pub(crate) async fn begin_session(&self, token: &AccessToken) -> Result<()> {
        let mut generation = self.generation.lock().await;
        *generation += 1;
        self.store.set(token).await
    }

    /// Drop the credential and every dependent cache.
    pub(crate) async fn clear_local(&self) {
        {
            let mut generation = self.generation.lock().await;
            *generation += 1;
            if let Err(e) = self.store.clear().await {
                warn!(error = %e, "Failed to clear stored credential");
            }
        }
        for cache in &self.caches {
            cache.invalidate();
        }
    }

    /// Tear the session down after the server refused to refresh it.
    ///
    /// Completes before any caller waiting on the failed refresh is
    /// released, so they all observe an empty store and `Unauthenticated`.
    pub(crate) async fn teardown(&self) {
        info!("Tearing down session");
        self.transition(SessionState::Terminating);
        self.clear_local().await;
        self.transition(SessionState::Unauthenticated);

        let redirected = match &self.redirect {
            Some(redirect) if !redirect.is_at_login() => {
                redirect.redirect_to_login();
                true
            }
            _ => false,
        };
        self.emit(SessionEvent::Terminated { redirected });
    }
}
