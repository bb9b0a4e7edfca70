//! Outbound request description.

use reqwest::Method;
use serde::Serialize;

use lectern_core::error::InvalidInputError;
use lectern_core::{Error, Result};

/// A request against the course platform API.
///
/// Holds everything needed to issue the call again, so the interceptor can
/// replay it once after a credential refresh.
#[derive(Debug, Clone)]
pub struct ApiRequest {
    method: Method,
    path: String,
    query: Vec<(String, String)>,
    body: Option<serde_json::Value>,
    pub(crate) retried: bool,
}

impl ApiRequest {
    pub fn new(method: Method, path: impl Into<String>) -> Self {
        Self {
            method,
            path: path.into(),
            query: Vec::new(),
            body: None,
            retried: false,
        }
    }

    pub fn get(path: impl Into<String>) -> Self {
        Self::new(Method::GET, path)
    }

    pub fn post(path: impl Into<String>) -> Self {
        Self::new(Method::POST, path)
    }

    pub fn put(path: impl Into<String>) -> Self {
        Self::new(Method::PUT, path)
    }

    pub fn patch(path: impl Into<String>) -> Self {
        Self::new(Method::PATCH, path)
    }

    pub fn delete(path: impl Into<String>) -> Self {
        Self::new(Method::DELETE, path)
    }

    /// Attach a JSON body.
    pub fn with_json<B: Serialize>(mut self, body: &B) -> Result<Self> {
        let value = serde_json::to_value(body).map_err(|e| Error::InvalidResponse {
            message: format!("request body is not serializable: {}", e),
        })?;
        self.body = Some(value);
        Ok(self)
    }

    /// Append a query parameter.
    pub fn with_query(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.query.push((key.into(), value.into()));
        self
    }

    pub fn method(&self) -> &Method {
        &self.method
    }

    pub fn path(&self) -> &str {
        &self.path
    }

    pub fn query(&self) -> &[(String, String)] {
        &self.query
    }

    pub fn body(&self) -> Option<&serde_json::Value> {
        self.body.as_ref()
    }

    /// True once the request has been re-issued after a refresh.
    pub fn is_retried(&self) -> bool {
        self.retried
    }

    /// Reject paths that would escape the configured base URL.
    pub(crate) fn validate(&self) -> Result<()> {
        let reason = if self.path.is_empty() {
            Some("must not be empty")
        } else if self.path.contains("://") {
            Some("must be relative to the API base URL")
        } else if self.path.contains('?') {
            Some("query parameters go through with_query")
        } else {
            None
        };

        match reason {
            Some(reason) => Err(InvalidInputError::Path {
                value: self.path.clone(),
                reason: reason.to_string(),
            }
            .into()),
            None => Ok(()),
        }
    }
}
