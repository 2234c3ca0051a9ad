//! Configuration management for songify.
//!
//! Configuration values come from environment variables, optionally seeded
//! from a `.env` file in the local data directory. Accessor functions read a
//! single variable and fall back to a default where one makes sense;
//! [`Settings::from_env`] gathers them into the typed struct the rest of the
//! crate is built around.
//!
//! The configuration system follows a hierarchical approach:
//! 1. Environment variables (highest priority)
//! 2. `.env` file in the local data directory
//! 3. Application defaults (where applicable)

use std::{env, path::PathBuf, time::Duration};

use crate::error::{Error, Result};

pub const DEFAULT_AUTH_URL: &str = "https://accounts.spotify.com/authorize";
pub const DEFAULT_TOKEN_URL: &str = "https://accounts.spotify.com/api/token";
pub const DEFAULT_API_URL: &str = "https://api.spotify.com/v1";
pub const DEFAULT_SERVER_ADDRESS: &str = "127.0.0.1:3000";
pub const DEFAULT_HTTP_TIMEOUT_SECS: u64 = 30;
pub const DEFAULT_LOGIN_TIMEOUT_SECS: u64 = 120;

/// Scopes requested when no `SPOTIFY_API_AUTH_SCOPE` override is set.
pub const DEFAULT_SCOPES: &[&str] = &[
    "user-read-private",
    "user-read-email",
    "playlist-read-private",
    "playlist-modify-public",
    "playlist-modify-private",
    "user-library-read",
    "user-top-read",
    "user-follow-read",
    "streaming",
    "user-read-playback-state",
    "user-modify-playback-state",
    "user-read-currently-playing",
    "app-remote-control",
];

/// Returns the songify directory inside the platform's local data directory.
///
/// - Linux: `~/.local/share/songify`
/// - macOS: `~/Library/Application Support/songify`
/// - Windows: `%LOCALAPPDATA%/songify`
pub fn data_dir() -> PathBuf {
    let mut path = dirs::data_local_dir().unwrap_or_else(|| PathBuf::from("."));
    path.push("songify");
    path
}

/// Loads environment variables from `songify/.env` in the local data directory.
///
/// Creates the directory if it does not exist yet. A missing `.env` file is
/// not an error since every variable may also come from the process
/// environment; a file that exists but cannot be parsed is.
///
/// # Example
///
/// ```
/// use songify::config;
///
/// #[tokio::main]
/// async fn main() {
///     if let Err(e) = config::load_env().await {
///         eprintln!("Configuration error: {}", e);
///     }
/// }
/// ```
pub async fn load_env() -> Result<()> {
    let path = data_dir().join(".env");
    if let Some(parent) = path.parent() {
        async_fs::create_dir_all(parent)
            .await
            .map_err(|e| Error::Config(e.to_string()))?;
    }

    if !path.is_file() {
        tracing::debug!(path = %path.display(), "no .env file, using process environment");
        return Ok(());
    }

    dotenv::from_path(&path).map_err(|e| Error::Config(e.to_string()))?;
    Ok(())
}

fn required(name: &str) -> Result<String> {
    optional(name).ok_or_else(|| Error::Config(format!("{name} must be set")))
}

fn optional(name: &str) -> Option<String> {
    env::var(name).ok().filter(|v| !v.trim().is_empty())
}

fn seconds(name: &str, default: u64) -> Result<Duration> {
    match optional(name) {
        Some(raw) => raw
            .trim()
            .parse::<u64>()
            .map(Duration::from_secs)
            .map_err(|_| Error::Config(format!("{name} must be a number of seconds"))),
        None => Ok(Duration::from_secs(default)),
    }
}

/// Returns the Spotify API client ID (`SPOTIFY_API_AUTH_CLIENT_ID`).
pub fn spotify_client_id() -> Result<String> {
    required("SPOTIFY_API_AUTH_CLIENT_ID")
}

/// Returns the Spotify API client secret (`SPOTIFY_API_AUTH_CLIENT_SECRET`).
///
/// Only the token-exchange server needs it; clients that talk to a remote
/// `songify serve` instance can leave it unset.
///
/// # Security Note
///
/// The client secret should be kept confidential and never exposed in logs
/// or version control.
pub fn spotify_client_secret() -> Option<String> {
    optional("SPOTIFY_API_AUTH_CLIENT_SECRET")
}

/// Returns the OAuth redirect URI (`SPOTIFY_API_REDIRECT_URI`).
///
/// Defaults to the `/callback` route of the local server.
pub fn spotify_redirect_uri() -> String {
    optional("SPOTIFY_API_REDIRECT_URI")
        .unwrap_or_else(|| format!("http://{}/callback", server_addr()))
}

/// Returns the requested scopes (`SPOTIFY_API_AUTH_SCOPE`, space-separated).
pub fn spotify_scopes() -> Vec<String> {
    match optional("SPOTIFY_API_AUTH_SCOPE") {
        Some(scope) => scope.split_whitespace().map(str::to_string).collect(),
        None => DEFAULT_SCOPES.iter().map(|s| s.to_string()).collect(),
    }
}

/// Returns the provider authorization URL (`SPOTIFY_API_AUTH_URL`).
pub fn spotify_apiauth_url() -> String {
    optional("SPOTIFY_API_AUTH_URL").unwrap_or_else(|| DEFAULT_AUTH_URL.to_string())
}

/// Returns the provider token URL (`SPOTIFY_API_TOKEN_URL`).
pub fn spotify_apitoken_url() -> String {
    optional("SPOTIFY_API_TOKEN_URL").unwrap_or_else(|| DEFAULT_TOKEN_URL.to_string())
}

/// Returns the Web API base URL (`SPOTIFY_API_URL`).
pub fn spotify_apiurl() -> String {
    optional("SPOTIFY_API_URL").unwrap_or_else(|| DEFAULT_API_URL.to_string())
}

/// Returns the bind address of the local server (`SERVER_ADDRESS`).
pub fn server_addr() -> String {
    optional("SERVER_ADDRESS").unwrap_or_else(|| DEFAULT_SERVER_ADDRESS.to_string())
}

/// Returns the base URL of a remote token-exchange server (`SONGIFY_SERVER_URL`).
///
/// When unset the CLI runs the exchange endpoints in-process on
/// [`server_addr`].
pub fn songify_server_url() -> Option<String> {
    optional("SONGIFY_SERVER_URL")
}

#[derive(Debug, Clone)]
pub struct Settings {
    pub client_id: String,
    pub client_secret: Option<String>,
    pub redirect_uri: String,
    pub scopes: Vec<String>,
    pub auth_url: String,
    pub token_url: String,
    pub api_url: String,
    pub server_address: String,
    /// Remote exchange server; `None` means the embedded one.
    pub server_url: Option<String>,
    pub http_timeout: Duration,
    pub login_timeout: Duration,
}

impl Settings {
    /// Builds settings from the process environment.
    pub fn from_env() -> Result<Self> {
        Ok(Self {
            client_id: spotify_client_id()?,
            client_secret: spotify_client_secret(),
            redirect_uri: spotify_redirect_uri(),
            scopes: spotify_scopes(),
            auth_url: spotify_apiauth_url(),
            token_url: spotify_apitoken_url(),
            api_url: spotify_apiurl(),
            server_address: server_addr(),
            server_url: songify_server_url(),
            http_timeout: seconds("SONGIFY_HTTP_TIMEOUT_SECS", DEFAULT_HTTP_TIMEOUT_SECS)?,
            login_timeout: seconds("SONGIFY_LOGIN_TIMEOUT_SECS", DEFAULT_LOGIN_TIMEOUT_SECS)?,
        })
    }

    /// Settings with provider defaults, for a given client ID.
    pub fn new(client_id: impl Into<String>) -> Self {
        Self {
            client_id: client_id.into(),
            client_secret: None,
            redirect_uri: format!("http://{DEFAULT_SERVER_ADDRESS}/callback"),
            scopes: DEFAULT_SCOPES.iter().map(|s| s.to_string()).collect(),
            auth_url: DEFAULT_AUTH_URL.to_string(),
            token_url: DEFAULT_TOKEN_URL.to_string(),
            api_url: DEFAULT_API_URL.to_string(),
            server_address: DEFAULT_SERVER_ADDRESS.to_string(),
            server_url: None,
            http_timeout: Duration::from_secs(DEFAULT_HTTP_TIMEOUT_SECS),
            login_timeout: Duration::from_secs(DEFAULT_LOGIN_TIMEOUT_SECS),
        }
    }

    /// Base URL of the token-exchange server the client talks to.
    pub fn exchange_base_url(&self) -> String {
        let base = match &self.server_url {
            Some(url) => url.clone(),
            None => format!("http://{}", self.server_address),
        };
        base.trim_end_matches('/').to_string()
    }

    pub fn token_exchange_url(&self) -> String {
        format!("{}/api/spotify/token", self.exchange_base_url())
    }

    pub fn token_refresh_url(&self) -> String {
        format!("{}/api/spotify/refresh", self.exchange_base_url())
    }

    /// Whether the CLI should run the exchange endpoints itself.
    pub fn uses_embedded_server(&self) -> bool {
        self.server_url.is_none()
    }
}
