//! The uniform `{status, message, data}` response envelope.

use serde::{Deserialize, Serialize};

use crate::{Error, Result};

/// Response envelope returned by every API endpoint.
///
/// `status` is informational; the HTTP status code decides success. The
/// server uses either a number or a short string here, so it is kept as raw
/// JSON.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Envelope<T> {
    pub status: Option<serde_json::Value>,
    pub message: Option<String>,
    pub data: Option<T>,
}

impl<T> Envelope<T> {
    /// Take the payload, failing if the server sent none.
    pub fn into_data(self) -> Result<T> {
        self.data.ok_or_else(|| Error::InvalidResponse {
            message: match self.message {
                Some(message) => format!("envelope has no data ({})", message),
                None => "envelope has no data".to_string(),
            },
        })
    }
}

/// `data` payload of the login and refresh endpoints.
#[derive(Debug, Clone, Deserialize)]
pub struct TokenData {
    pub token: String,
}
