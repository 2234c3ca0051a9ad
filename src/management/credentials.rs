use std::sync::{
    Arc,
    atomic::{AtomicU64, Ordering},
};

use parking_lot::Mutex;
use serde_json::Value;

use crate::{
    error::{Error, Result},
    management::store::KeyValueStore,
    types::{Credentials, TokenResponse},
    utils,
};

pub const ACCESS_TOKEN_KEY: &str = "spotify_access_token";
pub const REFRESH_TOKEN_KEY: &str = "spotify_refresh_token";
pub const EXPIRES_KEY: &str = "spotify_token_expires";
pub const PROFILE_KEY: &str = "spotify_profile";
pub const AUTH_STATE_KEY: &str = "spotify_auth_state";

const CREDENTIAL_KEYS: [&str; 4] = [ACCESS_TOKEN_KEY, REFRESH_TOKEN_KEY, EXPIRES_KEY, PROFILE_KEY];

/// Owner of the signed-in user's credentials.
///
/// Keeps an in-memory copy for synchronous reads and writes every change
/// through to the durable backend. Writers are serialized, so the in-memory
/// copy and the backend are updated as one step.
pub struct CredentialStore {
    backend: Arc<dyn KeyValueStore>,
    current: Mutex<Credentials>,
    write: tokio::sync::Mutex<()>,
    generation: AtomicU64,
}

impl CredentialStore {
    /// Reconstructs credentials from the backend.
    ///
    /// A stored profile that is not valid JSON, or an expiry that is not an
    /// integer, is logged and treated as absent.
    pub async fn load(backend: Arc<dyn KeyValueStore>) -> Result<Self> {
        let access_token = backend.get(ACCESS_TOKEN_KEY).await?;
        let refresh_token = backend.get(REFRESH_TOKEN_KEY).await?;

        let expires_at = match backend.get(EXPIRES_KEY).await? {
            Some(raw) => match raw.trim().parse::<i64>() {
                Ok(at) => Some(at),
                Err(e) => {
                    tracing::warn!(value = %raw, error = %e, "ignoring malformed stored token expiry");
                    None
                }
            },
            None => None,
        };

        let profile = match backend.get(PROFILE_KEY).await? {
            Some(raw) => match parse_profile(&raw) {
                Ok(profile) => Some(profile),
                Err(e) => {
                    tracing::warn!(error = %e, "Error parsing stored profile");
                    None
                }
            },
            None => None,
        };

        Ok(Self {
            backend,
            current: Mutex::new(Credentials {
                access_token,
                refresh_token,
                expires_at,
                profile,
            }),
            write: tokio::sync::Mutex::new(()),
            generation: AtomicU64::new(0),
        })
    }

    pub fn snapshot(&self) -> Credentials {
        self.current.lock().clone()
    }

    pub fn access_token(&self) -> Option<String> {
        self.current.lock().access_token.clone()
    }

    pub fn refresh_token(&self) -> Option<String> {
        self.current.lock().refresh_token.clone()
    }

    /// Bumped by every [`clear`](Self::clear).
    pub fn generation(&self) -> u64 {
        self.generation.load(Ordering::Acquire)
    }

    /// Writes whichever token fields and profile are present; absent fields
    /// keep their stored value.
    pub async fn save(&self, token: Option<&TokenResponse>, profile: Option<&Value>) -> Result<()> {
        self.save_at(token, profile, utils::now_millis()).await
    }

    /// [`save`](Self::save) with an explicit clock, in epoch milliseconds.
    pub async fn save_at(
        &self,
        token: Option<&TokenResponse>,
        profile: Option<&Value>,
        now_ms: i64,
    ) -> Result<()> {
        self.write_at(token, profile, now_ms, None).await.map(|_| ())
    }

    /// Saves `token` only if nothing cleared the store since `generation` was
    /// read. Returns whether the token was written.
    pub async fn save_if_generation(&self, token: &TokenResponse, generation: u64) -> Result<bool> {
        self.write_at(Some(token), None, utils::now_millis(), Some(generation))
            .await
    }

    async fn write_at(
        &self,
        token: Option<&TokenResponse>,
        profile: Option<&Value>,
        now_ms: i64,
        generation: Option<u64>,
    ) -> Result<bool> {
        let mut entries: Vec<(&str, String)> = Vec::new();
        let mut expires_at = None;

        if let Some(token) = token {
            if let Some(access_token) = &token.access_token {
                entries.push((ACCESS_TOKEN_KEY, access_token.clone()));
            }
            if let Some(refresh_token) = &token.refresh_token {
                entries.push((REFRESH_TOKEN_KEY, refresh_token.clone()));
            }
            if let Some(expires_in) = token.expires_in {
                let at = utils::expires_at_from(now_ms, expires_in);
                entries.push((EXPIRES_KEY, at.to_string()));
                expires_at = Some(at);
            }
        }

        if let Some(profile) = profile {
            entries.push((PROFILE_KEY, serde_json::to_string(profile)?));
        }

        let _guard = self.write.lock().await;
        if generation.is_some_and(|g| g != self.generation()) {
            return Ok(false);
        }
        if entries.is_empty() {
            return Ok(true);
        }

        self.backend.set_entries(&entries).await?;

        let mut current = self.current.lock();
        if let Some(token) = token {
            if let Some(access_token) = &token.access_token {
                current.access_token = Some(access_token.clone());
            }
            if let Some(refresh_token) = &token.refresh_token {
                current.refresh_token = Some(refresh_token.clone());
            }
        }
        if expires_at.is_some() {
            current.expires_at = expires_at;
        }
        if let Some(profile) = profile {
            current.profile = Some(profile.clone());
        }
        Ok(true)
    }

    /// Removes every credential field from memory and the backend.
    ///
    /// Memory is cleared first so no reader sees a partially cleared state,
    /// even when the backend write fails.
    pub async fn clear(&self) -> Result<()> {
        let _guard = self.write.lock().await;
        self.generation.fetch_add(1, Ordering::AcqRel);
        *self.current.lock() = Credentials::default();
        self.backend.remove_entries(&CREDENTIAL_KEYS).await
    }

    /// Persists the CSRF state of a pending authorization.
    pub async fn remember_authorization_state(&self, state: &str) -> Result<()> {
        self.backend
            .set_entries(&[(AUTH_STATE_KEY, state.to_string())])
            .await
    }

    /// Returns and forgets the pending authorization state.
    pub async fn take_authorization_state(&self) -> Result<Option<String>> {
        let state = self.backend.get(AUTH_STATE_KEY).await?;
        if state.is_some() {
            self.backend.remove_entries(&[AUTH_STATE_KEY]).await?;
        }
        Ok(state)
    }
}

fn parse_profile(raw: &str) -> Result<Value> {
    match serde_json::from_str::<Value>(raw) {
        Ok(Value::Object(map)) => Ok(Value::Object(map)),
        Ok(other) => Err(Error::MalformedStoredProfile(format!(
            "expected an object, found {other}"
        ))),
        Err(e) => Err(Error::MalformedStoredProfile(e.to_string())),
    }
}
