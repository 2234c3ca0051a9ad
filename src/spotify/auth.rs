use reqwest::{Client, header};
use serde_json::Value;
use url::Url;

use crate::{
    config::Settings,
    error::{Error, Result},
    management::CredentialStore,
    types::TokenResponse,
    utils, warning,
};

pub const STATE_LENGTH: usize = 16;

/// Builds the provider authorization URL for the authorization-code flow.
pub fn authorize_url(settings: &Settings, state: &str) -> Result<Url> {
    let scope = settings.scopes.join(" ");
    Url::parse_with_params(
        &settings.auth_url,
        &[
            ("response_type", "code"),
            ("client_id", settings.client_id.as_str()),
            ("scope", scope.as_str()),
            ("redirect_uri", settings.redirect_uri.as_str()),
            ("state", state),
            ("show_dialog", "true"),
        ],
    )
    .map_err(|e| Error::Config(format!("invalid authorization URL: {e}")))
}

/// Starts a login: persists a fresh CSRF state and opens the authorization
/// page in the browser. Returns the URL that was opened.
pub async fn redirect_to_authorize(settings: &Settings, store: &CredentialStore) -> Result<Url> {
    let state = utils::generate_state(STATE_LENGTH);
    store.remember_authorization_state(&state).await?;

    let url = authorize_url(settings, &state)?;

    if webbrowser::open(url.as_str()).is_err() {
        warning!(
            "Failed to open browser. Please navigate to the following URL manually:\n{}",
            url
        )
    }

    Ok(url)
}

/// Exchanges an authorization code at the provider token endpoint.
///
/// Runs server-side since it needs the client secret. Fails with
/// [`Error::MissingCode`] before any network call when no code is given.
pub async fn exchange_code_for_token(
    http: &Client,
    settings: &Settings,
    code: Option<&str>,
) -> Result<Value> {
    let code = code
        .filter(|c| !c.trim().is_empty())
        .ok_or(Error::MissingCode)?;

    provider_token_request(
        http,
        settings,
        &[
            ("grant_type", "authorization_code"),
            ("code", code),
            ("redirect_uri", settings.redirect_uri.as_str()),
        ],
    )
    .await
}

/// Exchanges a refresh token at the provider token endpoint.
pub async fn refresh_with_provider(
    http: &Client,
    settings: &Settings,
    refresh_token: Option<&str>,
) -> Result<Value> {
    let refresh_token = refresh_token
        .filter(|t| !t.trim().is_empty())
        .ok_or(Error::MissingRefreshToken)?;

    provider_token_request(
        http,
        settings,
        &[
            ("grant_type", "refresh_token"),
            ("refresh_token", refresh_token),
        ],
    )
    .await
}

async fn provider_token_request(
    http: &Client,
    settings: &Settings,
    form: &[(&str, &str)],
) -> Result<Value> {
    let secret = settings
        .client_secret
        .as_deref()
        .ok_or_else(|| Error::Config("SPOTIFY_API_AUTH_CLIENT_SECRET must be set".to_string()))?;

    let response = http
        .post(&settings.token_url)
        .header(
            header::AUTHORIZATION,
            utils::basic_auth_header(&settings.client_id, secret),
        )
        .form(form)
        .send()
        .await?;

    let status = response.status();
    if !status.is_success() {
        let body = response.text().await.unwrap_or_default();
        tracing::warn!(%status, %body, "provider token request failed");
        return Err(Error::ProviderExchangeFailed { status, body });
    }

    Ok(response.json::<Value>().await?)
}

/// Client side of the exchange: posts the code to the token-exchange
/// endpoint and decodes the token payload.
pub async fn request_token(http: &Client, settings: &Settings, code: &str) -> Result<TokenResponse> {
    let response = http
        .post(settings.token_exchange_url())
        .json(&serde_json::json!({ "code": code }))
        .send()
        .await?;

    let status = response.status();
    if !status.is_success() {
        let body = response.text().await.unwrap_or_default();
        return Err(Error::ProviderExchangeFailed { status, body });
    }

    Ok(response.json::<TokenResponse>().await?)
}
