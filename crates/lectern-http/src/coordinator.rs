//! Single-flight credential refresh.
//!
//! At most one refresh call is in flight at any time. The first caller
//! starts it; every caller arriving while it runs joins the same shared
//! future and receives the same outcome. The refresh itself runs on its own
//! task, so it completes even if every waiter goes away.

use std::sync::Arc;
use std::time::Duration;

use futures_util::FutureExt;
use futures_util::future::{BoxFuture, Shared};
use tokio::sync::Mutex;
use tracing::{debug, info, instrument, warn};

use lectern_core::{AccessToken, AuthError, RefreshFailure, Result, TokenData};

use crate::client::HttpClient;
use crate::endpoints::REFRESH;
use crate::lifecycle::Lifecycle;
use crate::request::ApiRequest;

type RefreshOutcome = std::result::Result<AccessToken, AuthError>;
type InFlight = Shared<BoxFuture<'static, RefreshOutcome>>;

/// Coordinates credential refreshes so concurrent expiries share one call.
#[derive(Clone)]
pub struct RefreshCoordinator {
    inner: Arc<CoordinatorInner>,
}

struct CoordinatorInner {
    http: HttpClient,
    lifecycle: Arc<Lifecycle>,
    timeout: Duration,
    in_flight: Mutex<Option<InFlight>>,
}

impl RefreshCoordinator {
    pub(crate) fn new(http: HttpClient, lifecycle: Arc<Lifecycle>, timeout: Duration) -> Self {
        Self {
            inner: Arc::new(CoordinatorInner {
                http,
                lifecycle,
                timeout,
                in_flight: Mutex::new(None),
            }),
        }
    }

    /// Start a refresh, or join the one already in flight.
    ///
    /// On success the new credential has been stored before this returns.
    /// On failure the session has been torn down before this returns.
    pub async fn refresh_or_join(&self) -> Result<AccessToken> {
        let refresh = {
            let mut slot = self.inner.in_flight.lock().await;
            self.join_or_start(&mut slot)
        };
        Ok(refresh.await?)
    }

    /// Refresh after the server rejected `rejected`.
    ///
    /// If no refresh is in flight and the store already holds a different
    /// credential, a refresh finished after the rejected request was sent;
    /// that credential is returned instead of starting another refresh.
    pub(crate) async fn refresh_after_rejection(
        &self,
        rejected: Option<&AccessToken>,
    ) -> Result<AccessToken> {
        let refresh = {
            let mut slot = self.inner.in_flight.lock().await;
            if slot.is_none() {
                let current = self.inner.lifecycle.store().get().await?;
                if let Some(current) = current.filter(|c| Some(c) != rejected) {
                    debug!("Credential already replaced, skipping refresh");
                    return Ok(current);
                }
            }
            self.join_or_start(&mut slot)
        };
        Ok(refresh.await?)
    }

    /// True while a refresh call is outstanding.
    pub async fn is_refreshing(&self) -> bool {
        self.inner.in_flight.lock().await.is_some()
    }

    fn join_or_start(&self, slot: &mut Option<InFlight>) -> InFlight {
        if let Some(refresh) = slot.as_ref() {
            debug!("Joining in-flight refresh");
            return refresh.clone();
        }

        let inner = Arc::clone(&self.inner);
        // The slot lock is held by our caller until the future is stored,
        // so the task cannot clear the slot before it has been filled.
        let task = tokio::spawn(async move {
            let outcome = inner.run().await;
            inner.in_flight.lock().await.take();
            outcome
        });

        let refresh = async move {
            task.await.unwrap_or_else(|e| {
                Err(AuthError::RefreshFailed(RefreshFailure::new(
                    None,
                    format!("refresh task aborted: {}", e),
                )))
            })
        }
        .boxed()
        .shared();

        *slot = Some(refresh.clone());
        refresh
    }
}

impl CoordinatorInner {
    /// One refresh call plus its side effects on the session.
    #[instrument(skip(self), fields(timeout_ms = self.timeout.as_millis() as u64))]
    async fn run(&self) -> RefreshOutcome {
        info!("Refreshing credential");
        let generation = self.lifecycle.generation().await;

        let outcome = match self.call().await {
            Ok(token) => match self.lifecycle.store_refreshed(generation, &token).await {
                Ok(true) => Ok(token),
                Ok(false) => {
                    debug!("Session ended during refresh, discarding credential");
                    return Err(AuthError::RefreshFailed(RefreshFailure::new(
                        None,
                        "session ended during refresh",
                    )));
                }
                Err(e) => Err(AuthError::RefreshFailed(RefreshFailure::new(
                    None,
                    format!("could not store refreshed credential: {}", e),
                ))),
            },
            Err(e) => Err(e),
        };

        match &outcome {
            Ok(_) => debug!("Credential refreshed"),
            Err(e) if self.lifecycle.generation().await != generation => {
                debug!(error = %e, "Refresh failed after the session ended");
            }
            Err(e) => {
                warn!(error = %e, "Credential refresh failed");
                self.lifecycle.teardown().await;
            }
        }
        outcome
    }

    async fn call(&self) -> RefreshOutcome {
        let request = ApiRequest::post(REFRESH);
        let response = tokio::time::timeout(
            self.timeout,
            self.http.execute::<TokenData>(&request, None),
        )
        .await
        .map_err(|_| AuthError::RefreshTimedOut)?;

        let data = response
            .and_then(|envelope| envelope.into_data())
            .map_err(|e| AuthError::RefreshFailed(RefreshFailure::from_error(&e)))?;

        if data.token.is_empty() {
            return Err(AuthError::RefreshFailed(RefreshFailure::new(
                None,
                AuthError::MissingToken.to_string(),
            )));
        }
        Ok(AccessToken::new(data.token))
    }
}

impl std::fmt::Debug for RefreshCoordinator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RefreshCoordinator")
            .field("timeout", &self.inner.timeout)
            .finish_non_exhaustive()
    }
}
