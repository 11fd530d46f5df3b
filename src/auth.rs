//! Request authentication
//!
//! The Copilot API authenticates every request with two static credential
//! headers. There is no token exchange and nothing expires, so applying
//! credentials is a synchronous header insertion.

use crate::config::ConnectorConfig;
use crate::error::{Error, Result};
use reqwest::RequestBuilder;
use std::fmt;

/// Header carrying the API key
pub const API_KEY_HEADER: &str = "X-Api-Key";

/// Header carrying the API password
pub const API_PASSWORD_HEADER: &str = "X-Api-Password";

/// Applies the credential headers to outgoing requests
#[derive(Clone)]
pub struct CredentialAuthenticator {
    api_key: String,
    api_password: String,
}

impl CredentialAuthenticator {
    /// Create an authenticator from raw credentials
    pub fn new(api_key: impl Into<String>, api_password: impl Into<String>) -> Result<Self> {
        let api_key = api_key.into();
        let api_password = api_password.into();
        if api_key.is_empty() {
            return Err(Error::auth("api_key is empty"));
        }
        if api_password.is_empty() {
            return Err(Error::auth("api_password is empty"));
        }
        Ok(Self {
            api_key,
            api_password,
        })
    }

    /// Create an authenticator from connector configuration
    pub fn from_config(config: &ConnectorConfig) -> Result<Self> {
        Self::new(config.api_key.clone(), config.api_password.clone())
    }

    /// Apply both credential headers to a request builder
    pub fn apply(&self, req: RequestBuilder) -> RequestBuilder {
        req.header(API_KEY_HEADER, &self.api_key)
            .header(API_PASSWORD_HEADER, &self.api_password)
    }
}

impl fmt::Debug for CredentialAuthenticator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CredentialAuthenticator")
            .field("api_key", &"***")
            .field("api_password", &"***")
            .finish()
    }
}
