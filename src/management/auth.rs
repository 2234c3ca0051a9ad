use std::sync::Arc;

use futures::{
    FutureExt,
    future::{BoxFuture, Shared},
};
use parking_lot::Mutex;
use reqwest::Client;
use serde_json::Value;

use crate::{
    error::{Error, Result},
    management::CredentialStore,
    types::{Credentials, RefreshRequest, TokenResponse},
    utils,
};

type SharedRefresh = Shared<BoxFuture<'static, Result<String>>>;

enum RefreshState {
    Idle,
    Refreshing(SharedRefresh),
}

/// Returns the refresh slot to idle once the refresh task ends, including
/// when it panics.
struct IdleOnDrop<'a>(&'a Mutex<RefreshState>);

impl Drop for IdleOnDrop<'_> {
    fn drop(&mut self) {
        *self.0.lock() = RefreshState::Idle;
    }
}

/// Token lifecycle on top of the [`CredentialStore`].
///
/// Cloning is cheap and clones share both the store and the refresh slot,
/// so concurrent `refresh` calls from any clone collapse into one request.
#[derive(Clone)]
pub struct TokenManager {
    inner: Arc<Inner>,
}

struct Inner {
    store: CredentialStore,
    http: Client,
    refresh_url: String,
    refresh: Mutex<RefreshState>,
}

impl TokenManager {
    pub fn new(store: CredentialStore, http: Client, refresh_url: impl Into<String>) -> Self {
        TokenManager {
            inner: Arc::new(Inner {
                store,
                http,
                refresh_url: refresh_url.into(),
                refresh: Mutex::new(RefreshState::Idle),
            }),
        }
    }

    pub fn store(&self) -> &CredentialStore {
        &self.inner.store
    }

    pub fn credentials(&self) -> Credentials {
        self.inner.store.snapshot()
    }

    pub fn is_authenticated(&self) -> bool {
        self.is_authenticated_at(utils::now_millis())
    }

    pub fn is_authenticated_at(&self, now_ms: i64) -> bool {
        self.inner.store.snapshot().is_authenticated_at(now_ms)
    }

    pub fn is_refreshing(&self) -> bool {
        matches!(*self.inner.refresh.lock(), RefreshState::Refreshing(_))
    }

    pub async fn save_auth_data(
        &self,
        token: Option<&TokenResponse>,
        profile: Option<&Value>,
    ) -> Result<()> {
        self.inner.store.save(token, profile).await
    }

    pub async fn clear_auth_data(&self) -> Result<()> {
        self.inner.store.clear().await
    }

    pub async fn logout(&self) -> Result<()> {
        self.clear_auth_data().await
    }

    /// Exchanges the stored refresh token for a new access token.
    ///
    /// While a refresh is in flight every caller awaits the same request and
    /// receives the same result. The request runs as its own task, so it
    /// settles even when every caller stops waiting. A failed refresh clears
    /// all credentials.
    pub async fn refresh(&self) -> Result<String> {
        let task = {
            let mut state = self.inner.refresh.lock();
            match &*state {
                RefreshState::Refreshing(task) => task.clone(),
                RefreshState::Idle => {
                    let refresh_token = self
                        .inner
                        .store
                        .refresh_token()
                        .ok_or(Error::NoRefreshToken)?;

                    let manager = self.clone();
                    let handle = tokio::spawn(async move {
                        let _idle = IdleOnDrop(&manager.inner.refresh);
                        manager.request_refresh(refresh_token).await
                    });

                    let task = async move {
                        handle.await.unwrap_or_else(|e| {
                            Err(Error::Network(format!("refresh task failed: {e}")))
                        })
                    }
                    .boxed()
                    .shared();

                    *state = RefreshState::Refreshing(task.clone());
                    task
                }
            }
        };

        task.await
    }

    /// Refreshes when the stored access token has expired and a refresh token
    /// is available. Returns the access token to use, if any.
    pub async fn ensure_fresh(&self) -> Result<Option<String>> {
        let credentials = self.inner.store.snapshot();
        if credentials.access_token.is_some()
            && credentials.refresh_token.is_some()
            && credentials.is_expired_at(utils::now_millis())
        {
            return self.refresh().await.map(Some);
        }
        Ok(credentials.access_token)
    }

    async fn request_refresh(&self, refresh_token: String) -> Result<String> {
        tracing::info!("Refreshing access token...");
        let generation = self.inner.store.generation();

        match self.call_refresh_endpoint(refresh_token, generation).await {
            Ok(access_token) => {
                tracing::info!("Token refreshed successfully");
                Ok(access_token)
            }
            Err(err) => {
                tracing::warn!(error = %err, "Token refresh failed, clearing credentials");
                if let Err(clear_err) = self.inner.store.clear().await {
                    tracing::warn!(error = %clear_err, "failed to clear stored credentials");
                }
                Err(err)
            }
        }
    }

    /// Posts the refresh token to the exchange server and stores the answer,
    /// unless the credentials were cleared since `generation` was read.
    async fn call_refresh_endpoint(&self, refresh_token: String, generation: u64) -> Result<String> {
        let response = self
            .inner
            .http
            .post(&self.inner.refresh_url)
            .json(&RefreshRequest {
                refresh_token: Some(refresh_token),
            })
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            tracing::debug!(%status, %body, "refresh endpoint rejected the request");
            return Err(Error::RefreshFailed { status });
        }

        let token: TokenResponse = response.json().await?;
        let access_token = token
            .access_token
            .clone()
            .ok_or_else(|| Error::Decode("refresh response without access_token".to_string()))?;

        if !self.inner.store.save_if_generation(&token, generation).await? {
            tracing::info!("Credentials were cleared during the refresh, discarding new token");
            return Err(Error::Unauthenticated);
        }
        Ok(access_token)
    }
}
