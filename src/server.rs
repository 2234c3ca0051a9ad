use std::{net::SocketAddr, str::FromStr, sync::Arc};

use axum::{
    Extension, Router,
    routing::{get, post},
};
use reqwest::Client;
use tokio::{net::TcpListener, task::JoinHandle};

use crate::{
    api::{self, ApiState, PendingLogin},
    config::Settings,
    error::{Error, Result},
};

/// Routes of the local server. The callback route is only mounted while a
/// login is waiting for it.
pub fn router(settings: Arc<Settings>, http: Client, pending: Option<PendingLogin>) -> Router {
    let state = ApiState { settings, http };

    let mut app = Router::new()
        .route("/health", get(api::health))
        .route("/api/spotify/token", post(api::exchange_token))
        .route("/api/spotify/refresh", post(api::refresh_token))
        .with_state(state);

    if let Some(pending) = pending {
        app = app.route("/callback", get(api::callback).layer(Extension(pending)));
    }

    app
}

pub async fn bind(address: &str) -> Result<TcpListener> {
    let addr = SocketAddr::from_str(address)
        .map_err(|e| Error::Config(format!("Failed to parse server address {address}: {e}")))?;
    TcpListener::bind(addr)
        .await
        .map_err(|e| Error::Config(format!("Failed to bind {addr}: {e}")))
}

/// Serves `app` on `listener` until the process ends.
pub async fn serve(listener: TcpListener, app: Router) -> Result<()> {
    if let Ok(addr) = listener.local_addr() {
        tracing::info!(%addr, "songify server listening");
    }
    axum::serve(listener, app)
        .await
        .map_err(|e| Error::Network(e.to_string()))
}

/// Runs the server in the background on an already bound listener.
pub fn spawn(listener: TcpListener, app: Router) -> JoinHandle<()> {
    tokio::spawn(async move {
        if let Err(e) = serve(listener, app).await {
            tracing::error!(error = %e, "songify server stopped");
        }
    })
}

/// Starts the exchange endpoints in-process when no remote server is
/// configured. Returns `None` when a remote server is used or the address is
/// already taken (for example by a running `songify serve`).
pub async fn spawn_embedded(settings: &Settings, http: &Client) -> Option<JoinHandle<()>> {
    if !settings.uses_embedded_server() {
        return None;
    }

    match bind(&settings.server_address).await {
        Ok(listener) => {
            let app = router(Arc::new(settings.clone()), http.clone(), None);
            Some(spawn(listener, app))
        }
        Err(e) => {
            tracing::debug!(error = %e, "embedded server not started");
            None
        }
    }
}
