//! Raw HTTP client for the course platform API.
//!
//! Issues a single request and decodes the response envelope. It knows
//! nothing about refresh or retry; that lives in [`ApiClient`](crate::ApiClient).

use reqwest::header::{AUTHORIZATION, HeaderValue};
use serde::de::DeserializeOwned;
use tracing::{debug, instrument, trace};
use uuid::Uuid;

use lectern_core::error::{ApiError, TransportError};
use lectern_core::{AccessToken, ApiBaseUrl, Envelope, Error, Result};

use crate::ambient::AmbientSession;
use crate::config::SessionConfig;
use crate::request::ApiRequest;

/// Header carrying a per-request correlation id.
const REQUEST_ID_HEADER: &str = "x-request-id";

pub(crate) fn transport_error(err: reqwest::Error) -> Error {
    let err = if err.is_timeout() {
        TransportError::Timeout
    } else if err.is_connect() {
        TransportError::Connection {
            message: err.to_string(),
        }
    } else {
        TransportError::Http {
            message: err.to_string(),
        }
    };
    Error::Transport(err)
}

/// HTTP client bound to one API base URL and one ambient session.
#[derive(Debug, Clone)]
pub struct HttpClient {
    client: reqwest::Client,
    base: ApiBaseUrl,
    auth_expired_status: u16,
}

impl HttpClient {
    /// Build a client from configuration. The ambient session's cookie jar
    /// is shared with the client, so cookies set by the server land in it.
    pub fn new(config: &SessionConfig, ambient: &AmbientSession) -> Result<Self> {
        let client = reqwest::Client::builder()
            .user_agent(config.user_agent.as_str())
            .timeout(config.request_timeout)
            .cookie_provider(ambient.jar())
            .build()
            .map_err(transport_error)?;

        Ok(Self {
            client,
            base: config.base_url.clone(),
            auth_expired_status: config.auth_expired_status,
        })
    }

    /// Returns the API base URL this client is configured for.
    pub fn base_url(&self) -> &ApiBaseUrl {
        &self.base
    }

    /// Issue one request, attaching `token` as a bearer credential if given.
    #[instrument(
        skip(self, request, token),
        fields(method = %request.method(), path = request.path(), retried = request.is_retried())
    )]
    pub async fn execute<T>(
        &self,
        request: &ApiRequest,
        token: Option<&AccessToken>,
    ) -> Result<Envelope<T>>
    where
        T: DeserializeOwned,
    {
        request.validate()?;

        let url = self.base.endpoint_url(request.path());
        let request_id = Uuid::new_v4();
        debug!(%request_id, authed = token.is_some(), "API request");

        let mut builder = self
            .client
            .request(request.method().clone(), &url)
            .header(REQUEST_ID_HEADER, request_id.to_string());

        if !request.query().is_empty() {
            builder = builder.query(request.query());
        }
        if let Some(body) = request.body() {
            builder = builder.json(body);
        }
        if let Some(token) = token {
            let value = HeaderValue::from_str(&token.bearer()).map_err(|_| Error::InvalidResponse {
                message: "credential contains characters not allowed in a header".to_string(),
            })?;
            builder = builder.header(AUTHORIZATION, value);
        }

        let response = builder.send().await.map_err(transport_error)?;
        self.handle_response(response).await
    }

    /// Decode a response into its envelope, or into an [`ApiError`].
    async fn handle_response<T: DeserializeOwned>(
        &self,
        response: reqwest::Response,
    ) -> Result<Envelope<T>> {
        let status = response.status();
        trace!(status = %status, "API response");

        let bytes = response.bytes().await.map_err(transport_error)?;

        if status.is_success() {
            if bytes.is_empty() {
                return Ok(Envelope {
                    status: None,
                    message: None,
                    data: None,
                });
            }
            serde_json::from_slice(&bytes).map_err(|e| Error::InvalidResponse {
                message: format!("malformed envelope: {}", e),
            })
        } else {
            let message = serde_json::from_slice::<Envelope<serde_json::Value>>(&bytes)
                .ok()
                .and_then(|envelope| envelope.message);
            Err(ApiError::new(status.as_u16(), message)
                .with_auth_expired_status(self.auth_expired_status)
                .into())
        }
    }
}
