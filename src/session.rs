use std::sync::Arc;

use reqwest::Client;
use serde_json::Value;

use crate::{
    config::Settings,
    error::{Error, Result},
    management::{CredentialStore, FileStore, KeyValueStore, TokenManager},
    spotify::{self, SpotifyApi, playlists::PlaylistLibrary, search::SearchSession},
    types::AuthorizationCode,
};

/// Everything a command needs to talk to Spotify on the user's behalf.
///
/// A session is an explicit context object: it owns the settings, the HTTP
/// client, the credential store and the token manager, and is handed to the
/// resource fetchers instead of living in global state. Clones share the
/// same credentials and refresh slot.
#[derive(Clone)]
pub struct Session {
    settings: Arc<Settings>,
    http: Client,
    api: SpotifyApi,
}

impl Session {
    /// Opens a session backed by the default on-disk store.
    pub async fn open(settings: Settings) -> Result<Self> {
        Self::with_store(settings, Arc::new(FileStore::new(FileStore::default_path()))).await
    }

    pub async fn with_store(settings: Settings, backend: Arc<dyn KeyValueStore>) -> Result<Self> {
        let http = http_client(&settings)?;
        let store = CredentialStore::load(backend).await?;
        let tokens = TokenManager::new(store, http.clone(), settings.token_refresh_url());
        let api = SpotifyApi::new(http.clone(), settings.api_url.clone(), tokens);

        Ok(Self {
            settings: Arc::new(settings),
            http,
            api,
        })
    }

    pub fn settings(&self) -> &Settings {
        &self.settings
    }

    pub fn http(&self) -> &Client {
        &self.http
    }

    pub fn api(&self) -> &SpotifyApi {
        &self.api
    }

    pub fn tokens(&self) -> &TokenManager {
        self.api.tokens()
    }

    pub fn store(&self) -> &CredentialStore {
        self.api.tokens().store()
    }

    pub fn playlists(&self) -> PlaylistLibrary {
        PlaylistLibrary::new(self.api.clone())
    }

    pub fn search(&self) -> SearchSession {
        SearchSession::new(self.api.clone())
    }

    /// Finishes a login once the provider redirected back with a code.
    ///
    /// Checks the returned `state` against the one persisted when the
    /// authorization page was opened, exchanges the code through the
    /// token-exchange endpoint, then stores the tokens and the user's
    /// profile. Returns the profile.
    pub async fn complete_login(&self, authorization: AuthorizationCode) -> Result<Value> {
        let expected = self.store().take_authorization_state().await?;
        if expected.is_none() || authorization.state != expected {
            return Err(Error::StateMismatch);
        }

        let token = spotify::auth::request_token(&self.http, &self.settings, &authorization.code).await?;
        if token.access_token.is_none() {
            return Err(Error::Decode("token response without access_token".to_string()));
        }
        self.tokens().save_auth_data(Some(&token), None).await?;

        let profile = spotify::profile::fetch_profile(&self.api).await?;
        self.tokens().save_auth_data(None, Some(&profile)).await?;
        Ok(profile)
    }
}

/// HTTP client shared by every outbound call, with the configured deadline.
pub fn http_client(settings: &Settings) -> Result<Client> {
    Client::builder()
        .user_agent(concat!(env!("CARGO_PKG_NAME"), "/", env!("CARGO_PKG_VERSION")))
        .timeout(settings.http_timeout)
        .build()
        .map_err(|e| Error::Config(format!("failed to build HTTP client: {e}")))
}
