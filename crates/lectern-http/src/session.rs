//! Session facade: login, logout, startup resume, and state observation.

use std::sync::Arc;

use tokio::sync::broadcast;
use tracing::{debug, info, instrument, warn};

use lectern_core::{
    AccessToken, AuthError, CredentialStore, LoginCredentials, Result, SessionEvent,
    SessionState, TokenData, UserProfile,
};

use crate::ambient::AmbientSession;
use crate::client::HttpClient;
use crate::config::SessionConfig;
use crate::coordinator::RefreshCoordinator;
use crate::endpoints::{CURRENT_USER, LOGIN, LOGOUT, LoginRequest};
use crate::hooks::{CacheInvalidator, LoginRedirect};
use crate::interceptor::ApiClient;
use crate::lifecycle::Lifecycle;
use crate::request::ApiRequest;
use crate::state::SessionSubscription;

/// The session lifecycle manager.
///
/// This is the only type other components use to authenticate. It is cheap
/// to clone and every clone drives the same session.
///
/// # Example
///
/// ```no_run
/// use std::sync::Arc;
///
/// use lectern_core::{ApiBaseUrl, LoginCredentials};
/// use lectern_http::{SessionConfig, SessionManager};
/// # use lectern_core::CredentialStore;
///
/// # async fn example(store: Arc<dyn CredentialStore>) -> Result<(), lectern_core::Error> {
/// let config = SessionConfig::new(ApiBaseUrl::new("https://api.lectern.example")?);
/// let session = SessionManager::builder(config, store).build()?;
///
/// session.bootstrap().await?;
/// if !session.state().is_authenticated() {
///     session.login(LoginCredentials::new("ada", "app-password")).await?;
/// }
///
/// let courses: serde_json::Value = session.client().get("/courses").await?;
/// # Ok(())
/// # }
/// ```
#[derive(Clone)]
pub struct SessionManager {
    inner: Arc<SessionInner>,
}

struct SessionInner {
    config: SessionConfig,
    http: HttpClient,
    api: ApiClient,
    coordinator: RefreshCoordinator,
    lifecycle: Arc<Lifecycle>,
    ambient: AmbientSession,
}

/// Builder for [`SessionManager`].
pub struct SessionManagerBuilder {
    config: SessionConfig,
    store: Arc<dyn CredentialStore>,
    caches: Vec<Arc<dyn CacheInvalidator>>,
    redirect: Option<Arc<dyn LoginRedirect>>,
    ambient: AmbientSession,
}

impl SessionManagerBuilder {
    /// Register application state to clear when the session ends.
    pub fn cache(mut self, cache: Arc<dyn CacheInvalidator>) -> Self {
        self.caches.push(cache);
        self
    }

    /// Navigation hook invoked when a failed refresh ends the session.
    pub fn login_redirect(mut self, redirect: Arc<dyn LoginRedirect>) -> Self {
        self.redirect = Some(redirect);
        self
    }

    /// Use an existing ambient session, for example one restored from disk.
    pub fn ambient(mut self, ambient: AmbientSession) -> Self {
        self.ambient = ambient;
        self
    }

    pub fn build(self) -> Result<SessionManager> {
        let http = HttpClient::new(&self.config, &self.ambient)?;
        let lifecycle = Arc::new(Lifecycle::new(self.store, self.caches, self.redirect));
        let coordinator = RefreshCoordinator::new(
            http.clone(),
            Arc::clone(&lifecycle),
            self.config.refresh_timeout,
        );
        let api = ApiClient::new(http.clone(), coordinator.clone(), Arc::clone(&lifecycle));

        Ok(SessionManager {
            inner: Arc::new(SessionInner {
                config: self.config,
                http,
                api,
                coordinator,
                lifecycle,
                ambient: self.ambient,
            }),
        })
    }
}

impl SessionManager {
    /// Start building a manager that keeps its credential in `store`.
    pub fn builder(config: SessionConfig, store: Arc<dyn CredentialStore>) -> SessionManagerBuilder {
        SessionManagerBuilder {
            config,
            store,
            caches: Vec::new(),
            redirect: None,
            ambient: AmbientSession::new(),
        }
    }

    /// The current session state.
    pub fn state(&self) -> SessionState {
        self.inner.lifecycle.state().current()
    }

    /// The current user's profile, if authenticated.
    pub fn profile(&self) -> Option<UserProfile> {
        self.state().profile().cloned()
    }

    /// Observe state changes.
    pub fn subscribe(&self) -> SessionSubscription {
        self.inner.lifecycle.state().subscribe()
    }

    /// Receive lifecycle events (state changes, logout, teardown).
    pub fn events(&self) -> broadcast::Receiver<SessionEvent> {
        self.inner.lifecycle.subscribe_events()
    }

    /// The API client for other subsystems' network calls.
    pub fn client(&self) -> &ApiClient {
        &self.inner.api
    }

    /// The ambient session cookie jar.
    pub fn ambient(&self) -> &AmbientSession {
        &self.inner.ambient
    }

    pub fn config(&self) -> &SessionConfig {
        &self.inner.config
    }

    /// Resume a session on startup without user interaction.
    ///
    /// With a stored credential, the profile is fetched; an expired
    /// credential is refreshed once along the way. Without one, a single
    /// silent refresh is attempted in case the ambient session is still
    /// alive. Ends `Authenticated` or `Unauthenticated`.
    ///
    /// Transport failures leave the stored credential in place and are
    /// returned, so the caller can retry once the network is back.
    #[instrument(skip(self))]
    pub async fn bootstrap(&self) -> Result<SessionState> {
        let lifecycle = &self.inner.lifecycle;
        let stored = lifecycle.store().get().await?;
        lifecycle.transition(SessionState::Authenticating);

        if stored.is_none() {
            info!("No stored credential, attempting silent resume");
            if let Err(e) = self.inner.coordinator.refresh_or_join().await {
                debug!(error = %e, "Silent resume failed");
                lifecycle.transition(SessionState::Unauthenticated);
                return Ok(SessionState::Unauthenticated);
            }
        }

        match self.fetch_profile().await {
            Ok(profile) => Ok(self.authenticated(profile)),
            Err(e) if e.is_refresh_failure() => {
                // Teardown already cleared the credential.
                debug!(error = %e, "Stored credential could not be refreshed");
                lifecycle.transition(SessionState::Unauthenticated);
                Ok(SessionState::Unauthenticated)
            }
            Err(e) if e.as_api().is_some_and(|api| api.is_auth_expired()) => {
                debug!(error = %e, "Stored credential rejected after refresh");
                lifecycle.clear_local().await;
                lifecycle.transition(SessionState::Unauthenticated);
                Ok(SessionState::Unauthenticated)
            }
            Err(e) => {
                warn!(error = %e, "Could not resume session");
                lifecycle.transition(SessionState::Unauthenticated);
                Err(e)
            }
        }
    }

    /// Log in with a username/email and password.
    #[instrument(skip(self, credentials), fields(identifier = %credentials.identifier()))]
    pub async fn login(&self, credentials: LoginCredentials) -> Result<UserProfile> {
        info!("Logging in");

        let request = ApiRequest::post(LOGIN).with_json(&LoginRequest {
            identifier: credentials.identifier(),
            password: credentials.password(),
        })?;
        let data: TokenData = self
            .inner
            .http
            .execute(&request, None)
            .await?
            .into_data()?;

        if data.token.is_empty() {
            return Err(AuthError::MissingToken.into());
        }
        self.login_with_token(AccessToken::new(data.token)).await
    }

    /// Establish a session from an access credential obtained elsewhere.
    ///
    /// The credential is stored, then validated by fetching the profile. If
    /// that fails the credential is cleared and the session stays
    /// unauthenticated.
    #[instrument(skip(self, token))]
    pub async fn login_with_token(&self, token: AccessToken) -> Result<UserProfile> {
        let lifecycle = &self.inner.lifecycle;
        lifecycle.begin_session(&token).await?;
        lifecycle.transition(SessionState::Authenticating);

        match self.fetch_profile().await {
            Ok(profile) => {
                info!(user = %profile.id, "Logged in");
                self.authenticated(profile.clone());
                Ok(profile)
            }
            Err(e) => {
                warn!(error = %e, "Login failed");
                lifecycle.clear_local().await;
                lifecycle.transition(SessionState::Unauthenticated);
                Err(e)
            }
        }
    }

    /// Log out. The server is told on a best-effort basis; local state is
    /// always cleared.
    #[instrument(skip(self))]
    pub async fn logout(&self) {
        let lifecycle = &self.inner.lifecycle;
        info!("Logging out");
        lifecycle.transition(SessionState::Terminating);

        let token = match lifecycle.store().get().await {
            Ok(token) => token,
            Err(e) => {
                warn!(error = %e, "Could not read credential for logout");
                None
            }
        };

        let request = ApiRequest::post(LOGOUT);
        if let Err(e) = self
            .inner
            .http
            .execute::<serde_json::Value>(&request, token.as_ref())
            .await
        {
            warn!(error = %e, "Server-side logout failed");
        }

        lifecycle.clear_local().await;
        lifecycle.transition(SessionState::Unauthenticated);
        lifecycle.emit(SessionEvent::LoggedOut);
    }

    /// Refresh the credential now, or join a refresh already in flight.
    pub async fn refresh(&self) -> Result<AccessToken> {
        self.inner.coordinator.refresh_or_join().await
    }

    async fn fetch_profile(&self) -> Result<UserProfile> {
        self.inner.api.get(CURRENT_USER).await
    }

    fn authenticated(&self, profile: UserProfile) -> SessionState {
        let state = SessionState::Authenticated(profile);
        self.inner.lifecycle.transition(state.clone());
        state
    }
}

impl std::fmt::Debug for SessionManager {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SessionManager")
            .field("base_url", &self.inner.config.base_url)
            .field("state", &self.state().name())
            .field("credential", &"[REDACTED]")
            .finish()
    }
}
