//! # API Module
//!
//! HTTP endpoints served by the local songify server.
//!
//! ## Endpoints
//!
//! - `POST /api/spotify/token` ([`exchange_token`]) - swaps an authorization
//!   code for tokens using the client secret
//! - `POST /api/spotify/refresh` ([`refresh_token`]) - swaps a refresh token
//!   for a new access token
//! - `GET /callback` ([`callback`]) - receives the provider redirect during
//!   `songify login`
//! - `GET /health` ([`health`]) - status and version
//!
//! Handler failures are rendered as `{ "statusCode", "statusMessage" }` with
//! the status from [`Error::status_code`]; provider failures keep the
//! provider's status.

use std::sync::Arc;

use axum::{
    Json,
    response::{IntoResponse, Response},
};
use reqwest::Client;
use serde_json::json;

use crate::{config::Settings, error::Error};

mod callback;
mod health;
mod token;

pub use callback::{CallbackResult, PendingLogin, callback};
pub use health::health;
pub use token::{exchange_token, refresh_token};

/// Shared state of the token endpoints.
#[derive(Clone)]
pub struct ApiState {
    pub settings: Arc<Settings>,
    pub http: Client,
}

impl IntoResponse for Error {
    fn into_response(self) -> Response {
        let status = self.status_code();
        let body = Json(json!({
            "statusCode": status.as_u16(),
            "statusMessage": self.to_string(),
        }));
        (status, body).into_response()
    }
}
