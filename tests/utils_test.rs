use std::collections::HashMap;

use serde_json::json;
use songify::{
    config::{DEFAULT_SCOPES, Settings},
    error::Error,
    spotify::auth::authorize_url,
    types::Credentials,
    utils::*,
};

#[test]
fn test_generate_state() {
    let state = generate_state(16);

    assert_eq!(state.len(), 16);
    assert!(state.chars().all(|c| c.is_ascii_alphanumeric()));

    // Two generated states should be different
    assert_ne!(state, generate_state(16));
}

#[test]
fn test_basic_auth_header() {
    // base64("id:secret")
    assert_eq!(basic_auth_header("id", "secret"), "Basic aWQ6c2VjcmV0");
}

#[test]
fn test_expires_at_from() {
    assert_eq!(expires_at_from(1_000, 3600), 3_601_000);
    assert_eq!(expires_at_from(1_000, 0), 1_000);
}

#[test]
fn test_parse_page_cursor() {
    let next = "https://api.spotify.com/v1/me/playlists?offset=50&limit=20";
    assert_eq!(parse_page_cursor(next).unwrap(), (20, 50));
}

#[test]
fn test_parse_page_cursor_defaults() {
    let next = "https://api.spotify.com/v1/me/playlists";
    assert_eq!(parse_page_cursor(next).unwrap(), (DEFAULT_PAGE_LIMIT, 0));

    let garbage = "https://api.spotify.com/v1/me/playlists?limit=abc&offset=-1";
    assert_eq!(parse_page_cursor(garbage).unwrap(), (DEFAULT_PAGE_LIMIT, 0));
}

#[test]
fn test_parse_page_cursor_rejects_relative_url() {
    let result = parse_page_cursor("/me/playlists?offset=50");
    assert!(matches!(result, Err(Error::InvalidCursor(_))));
}

#[test]
fn test_is_authenticated_truth_table() {
    let now = 10_000;
    let profile = Some(json!({ "id": "user" }));

    for access in [None, Some("token".to_string())] {
        for prof in [None, profile.clone()] {
            for expires in [None, Some(now - 1), Some(now), Some(now + 1)] {
                let credentials = Credentials {
                    access_token: access.clone(),
                    refresh_token: None,
                    expires_at: expires,
                    profile: prof.clone(),
                };

                let expected =
                    access.is_some() && prof.is_some() && expires.is_none_or(|at| now < at);
                assert_eq!(
                    credentials.is_authenticated_at(now),
                    expected,
                    "access={access:?} profile={prof:?} expires={expires:?}"
                );
            }
        }
    }
}

#[test]
fn test_missing_expiry_never_expires() {
    let credentials = Credentials {
        access_token: Some("token".to_string()),
        profile: Some(json!({ "id": "user" })),
        ..Credentials::default()
    };

    assert!(credentials.is_authenticated_at(i64::MAX));
    assert!(!credentials.is_expired_at(i64::MAX));
}

#[test]
fn test_authorize_url() {
    let mut settings = Settings::new("client-123");
    settings.redirect_uri = "http://127.0.0.1:3000/callback".to_string();

    let url = authorize_url(&settings, "abcdef").unwrap();
    let params: HashMap<String, String> = url.query_pairs().into_owned().collect();

    assert_eq!(url.host_str(), Some("accounts.spotify.com"));
    assert_eq!(url.path(), "/authorize");
    assert_eq!(params["response_type"], "code");
    assert_eq!(params["client_id"], "client-123");
    assert_eq!(params["redirect_uri"], "http://127.0.0.1:3000/callback");
    assert_eq!(params["state"], "abcdef");
    assert_eq!(params["show_dialog"], "true");
    assert_eq!(params["scope"], DEFAULT_SCOPES.join(" "));
}

#[test]
fn test_settings_exchange_urls() {
    let mut settings = Settings::new("client");
    assert!(settings.uses_embedded_server());
    assert_eq!(
        settings.token_refresh_url(),
        "http://127.0.0.1:3000/api/spotify/refresh"
    );

    settings.server_url = Some("https://songify.example.com/".to_string());
    assert!(!settings.uses_embedded_server());
    assert_eq!(
        settings.token_exchange_url(),
        "https://songify.example.com/api/spotify/token"
    );
}

#[test]
fn test_error_status_codes() {
    use reqwest::StatusCode;

    assert_eq!(Error::MissingCode.status_code(), StatusCode::BAD_REQUEST);
    assert_eq!(
        Error::ProviderExchangeFailed {
            status: StatusCode::FORBIDDEN,
            body: String::new()
        }
        .status_code(),
        StatusCode::FORBIDDEN
    );
    assert!(
        Error::RefreshFailed {
            status: StatusCode::UNAUTHORIZED
        }
        .clears_credentials()
    );
    assert!(!Error::Unauthenticated.clears_credentials());
}
