use axum::{Json, extract::State};
use serde_json::Value;

use crate::{
    api::ApiState,
    error::Result,
    spotify,
    types::{CodeRequest, RefreshRequest},
};

/// `POST /api/spotify/token` with `{ "code": ... }`.
pub async fn exchange_token(
    State(state): State<ApiState>,
    Json(request): Json<CodeRequest>,
) -> Result<Json<Value>> {
    let token =
        spotify::auth::exchange_code_for_token(&state.http, &state.settings, request.code.as_deref())
            .await?;
    Ok(Json(token))
}

/// `POST /api/spotify/refresh` with `{ "refresh_token": ... }`.
pub async fn refresh_token(
    State(state): State<ApiState>,
    Json(request): Json<RefreshRequest>,
) -> Result<Json<Value>> {
    let token = spotify::auth::refresh_with_provider(
        &state.http,
        &state.settings,
        request.refresh_token.as_deref(),
    )
    .await?;
    Ok(Json(token))
}
