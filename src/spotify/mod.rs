//! # Spotify Integration Module
//!
//! Integration layer between songify and the Spotify Web API. All calls on
//! behalf of the user go through [`SpotifyApi::fetch_with_auth`], which
//! attaches the stored access token as a bearer credential.
//!
//! ```text
//! CLI Layer
//!      ↓
//! Resource Fetchers (playlists, search, profile)
//!      ↓
//! Authenticated Fetch (bearer header, status check, JSON decode)
//!      ↓
//! Spotify Web API
//! ```
//!
//! Authenticated fetch never refreshes on its own. A `401` surfaces as
//! [`Error::HttpError`](crate::error::Error::HttpError) and the caller decides
//! whether to call [`TokenManager::refresh`] and retry; the CLI instead calls
//! [`TokenManager::ensure_fresh`] before issuing requests.
//!
//! ## Submodules
//!
//! - [`auth`] - authorize URL, token exchange and refresh against the provider
//! - [`playlists`] - paginated listing of the user's playlists
//! - [`search`] - catalog search with an observable error slot
//! - [`profile`] - the current user's profile

use std::time::Duration;

use parking_lot::Mutex;
use reqwest::{Client, Method, header::HeaderMap};
use serde::de::DeserializeOwned;
use serde_json::Value;

use crate::{
    error::{Error, Result},
    management::TokenManager,
};

pub mod auth;
pub mod playlists;
pub mod profile;
pub mod search;

/// Per-request options for [`SpotifyApi::fetch_with_auth`].
#[derive(Debug, Clone)]
pub struct RequestOptions {
    pub method: Method,
    pub headers: HeaderMap,
    pub body: Option<Value>,
    /// Overrides the client-wide timeout.
    pub timeout: Option<Duration>,
}

impl Default for RequestOptions {
    fn default() -> Self {
        Self {
            method: Method::GET,
            headers: HeaderMap::new(),
            body: None,
            timeout: None,
        }
    }
}

impl RequestOptions {
    pub fn get() -> Self {
        Self::default()
    }

    pub fn post(body: Value) -> Self {
        Self {
            method: Method::POST,
            body: Some(body),
            ..Self::default()
        }
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }
}

#[derive(Clone)]
pub struct SpotifyApi {
    http: Client,
    base_url: String,
    tokens: TokenManager,
}

impl SpotifyApi {
    pub fn new(http: Client, base_url: impl Into<String>, tokens: TokenManager) -> Self {
        Self {
            http,
            base_url: base_url.into().trim_end_matches('/').to_string(),
            tokens,
        }
    }

    pub fn tokens(&self) -> &TokenManager {
        &self.tokens
    }

    /// Absolute URL for a Web API path such as `/me/playlists`.
    pub fn endpoint(&self, path: &str) -> String {
        format!("{}/{}", self.base_url, path.trim_start_matches('/'))
    }

    /// Sends an authenticated request and decodes the JSON response.
    ///
    /// # Errors
    ///
    /// - [`Error::Unauthenticated`] when no access token is stored; nothing
    ///   is sent in that case
    /// - [`Error::HttpError`] for any non-success status, including `401`
    /// - [`Error::Timeout`] / [`Error::Network`] / [`Error::Decode`] for
    ///   transport failures
    pub async fn fetch_with_auth<T: DeserializeOwned>(
        &self,
        url: &str,
        options: RequestOptions,
    ) -> Result<T> {
        let token = self
            .tokens
            .store()
            .access_token()
            .ok_or(Error::Unauthenticated)?;

        let mut request = self
            .http
            .request(options.method, url)
            .headers(options.headers)
            .bearer_auth(token);
        if let Some(body) = &options.body {
            request = request.json(body);
        }
        if let Some(timeout) = options.timeout {
            request = request.timeout(timeout);
        }

        let response = request.send().await?;
        let status = response.status();
        if !status.is_success() {
            tracing::debug!(%status, url, "authenticated request failed");
            return Err(Error::HttpError { status });
        }

        Ok(response.json::<T>().await?)
    }
}

/// Sets a loading flag for as long as it lives, so the flag is cleared
/// however the request ends, including cancellation.
pub(crate) struct LoadingGuard<'a, S> {
    state: &'a Mutex<S>,
    flag: fn(&mut S) -> &mut bool,
}

impl<'a, S> LoadingGuard<'a, S> {
    pub(crate) fn start(state: &'a Mutex<S>, flag: fn(&mut S) -> &mut bool) -> Self {
        *flag(&mut *state.lock()) = true;
        Self { state, flag }
    }
}

impl<S> Drop for LoadingGuard<'_, S> {
    fn drop(&mut self) {
        *(self.flag)(&mut *self.state.lock()) = false;
    }
}
