//! Credential-attaching, refresh-aware API client.

use std::sync::Arc;

use serde::Serialize;
use serde::de::DeserializeOwned;
use tracing::{debug, info, instrument};

use lectern_core::{Envelope, Error, Result};

use crate::client::HttpClient;
use crate::coordinator::RefreshCoordinator;
use crate::endpoints::is_auth_endpoint;
use crate::lifecycle::Lifecycle;
use crate::request::ApiRequest;

/// The client every subsystem uses for API calls.
///
/// Each call carries the stored credential. If the server answers with the
/// auth-expired status, the call is not itself an auth endpoint, and it has
/// not been retried yet, the client waits for a refresh (starting one or
/// joining the one in flight) and re-issues the call exactly once with the
/// refreshed credential. Any other failure is returned unchanged.
#[derive(Clone)]
pub struct ApiClient {
    http: HttpClient,
    coordinator: RefreshCoordinator,
    lifecycle: Arc<Lifecycle>,
}

impl ApiClient {
    pub(crate) fn new(
        http: HttpClient,
        coordinator: RefreshCoordinator,
        lifecycle: Arc<Lifecycle>,
    ) -> Self {
        Self {
            http,
            coordinator,
            lifecycle,
        }
    }

    /// Send a request and return the envelope's `data`.
    pub async fn send<T: DeserializeOwned>(&self, request: ApiRequest) -> Result<T> {
        self.send_envelope(request).await?.into_data()
    }

    /// Send a request and return the whole envelope.
    #[instrument(skip(self, request), fields(method = %request.method(), path = request.path()))]
    pub async fn send_envelope<T: DeserializeOwned>(
        &self,
        mut request: ApiRequest,
    ) -> Result<Envelope<T>> {
        let token = self.lifecycle.store().get().await?;

        match self.http.execute(&request, token.as_ref()).await {
            Err(Error::Api(err))
                if err.is_auth_expired()
                    && !request.retried
                    && !is_auth_endpoint(request.path()) =>
            {
                info!(status = err.status, "Credential rejected, waiting for refresh");
                request.retried = true;

                let fresh = self
                    .coordinator
                    .refresh_after_rejection(token.as_ref())
                    .await?;

                debug!("Re-issuing request with refreshed credential");
                self.http.execute(&request, Some(&fresh)).await
            }
            other => other,
        }
    }

    pub async fn get<T: DeserializeOwned>(&self, path: &str) -> Result<T> {
        self.send(ApiRequest::get(path)).await
    }

    pub async fn post<B, T>(&self, path: &str, body: &B) -> Result<T>
    where
        B: Serialize,
        T: DeserializeOwned,
    {
        self.send(ApiRequest::post(path).with_json(body)?).await
    }

    pub async fn put<B, T>(&self, path: &str, body: &B) -> Result<T>
    where
        B: Serialize,
        T: DeserializeOwned,
    {
        self.send(ApiRequest::put(path).with_json(body)?).await
    }

    /// Delete a resource. Any `data` in the response is ignored.
    pub async fn delete(&self, path: &str) -> Result<()> {
        self.send_envelope::<serde_json::Value>(ApiRequest::delete(path))
            .await
            .map(|_| ())
    }

    /// The refresh coordinator this client routes expiries through.
    pub fn coordinator(&self) -> &RefreshCoordinator {
        &self.coordinator
    }
}

impl std::fmt::Debug for ApiClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ApiClient")
            .field("base_url", self.http.base_url())
            .finish_non_exhaustive()
    }
}
