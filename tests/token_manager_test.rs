mod common;

use std::time::Duration;

use reqwest::StatusCode;
use serde_json::json;
use songify::{
    error::Error,
    management::{ACCESS_TOKEN_KEY, EXPIRES_KEY, MemoryStore, PROFILE_KEY, REFRESH_TOKEN_KEY},
};
use wiremock::{
    Mock, MockServer, ResponseTemplate,
    matchers::{body_json, method, path},
};

use common::{profile_json, session_with, signed_in_store};

fn expired_store() -> MemoryStore {
    MemoryStore::with_entries([
        (ACCESS_TOKEN_KEY, "stale-token".to_string()),
        (REFRESH_TOKEN_KEY, "old-refresh".to_string()),
        (EXPIRES_KEY, "1000".to_string()),
        (PROFILE_KEY, profile_json().to_string()),
    ])
}

#[tokio::test]
async fn test_concurrent_refresh_issues_one_request() {
    let mock_server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/api/spotify/refresh"))
        .and(body_json(json!({ "refresh_token": "old-refresh" })))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(json!({ "access_token": "new-token", "expires_in": 3600 }))
                .set_delay(Duration::from_millis(200)),
        )
        .expect(1)
        .mount(&mock_server)
        .await;

    let (session, _) = session_with(&mock_server.uri(), expired_store()).await;
    let tokens = session.tokens().clone();
    let other = tokens.clone();

    let (first, second) = tokio::join!(tokens.refresh(), other.refresh());

    assert_eq!(first.unwrap(), "new-token");
    assert_eq!(second.unwrap(), "new-token");
    assert!(!tokens.is_refreshing());
    assert!(tokens.is_authenticated());
}

#[tokio::test]
async fn test_settled_refresh_allows_new_attempt() {
    let mock_server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/api/spotify/refresh"))
        .respond_with(
            ResponseTemplate::new(200).set_body_json(json!({ "access_token": "new-token" })),
        )
        .expect(2)
        .mount(&mock_server)
        .await;

    let (session, _) = session_with(&mock_server.uri(), expired_store()).await;

    session.tokens().refresh().await.unwrap();
    session.tokens().refresh().await.unwrap();
}

#[tokio::test]
async fn test_refresh_without_refresh_token_makes_no_request() {
    let mock_server = MockServer::start().await;

    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&mock_server)
        .await;

    let store = MemoryStore::with_entries([(ACCESS_TOKEN_KEY, "token")]);
    let (session, _) = session_with(&mock_server.uri(), store).await;

    let result = session.tokens().refresh().await;
    assert!(matches!(result, Err(Error::NoRefreshToken)));
    assert!(!session.tokens().is_refreshing());
}

#[tokio::test]
async fn test_refresh_keeps_refresh_token_when_not_returned() {
    let mock_server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/api/spotify/refresh"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(json!({ "access_token": "new-token", "expires_in": 3600 })),
        )
        .mount(&mock_server)
        .await;

    let (session, backend) = session_with(&mock_server.uri(), expired_store()).await;
    session.tokens().refresh().await.unwrap();

    let credentials = session.tokens().credentials();
    assert_eq!(credentials.access_token.as_deref(), Some("new-token"));
    assert_eq!(credentials.refresh_token.as_deref(), Some("old-refresh"));
    assert!(credentials.expires_at.unwrap() > songify::utils::now_millis());
    assert_eq!(backend.entries()[REFRESH_TOKEN_KEY], "old-refresh");
    assert_eq!(backend.entries()[ACCESS_TOKEN_KEY], "new-token");
}

#[tokio::test]
async fn test_refresh_overwrites_refresh_token_when_returned() {
    let mock_server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/api/spotify/refresh"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "access_token": "new-token",
            "refresh_token": "new-refresh",
            "expires_in": 3600
        })))
        .mount(&mock_server)
        .await;

    let (session, backend) = session_with(&mock_server.uri(), expired_store()).await;
    session.tokens().refresh().await.unwrap();

    assert_eq!(
        session.tokens().credentials().refresh_token.as_deref(),
        Some("new-refresh")
    );
    assert_eq!(backend.entries()[REFRESH_TOKEN_KEY], "new-refresh");
}

#[tokio::test]
async fn test_failed_refresh_clears_credentials() {
    let mock_server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/api/spotify/refresh"))
        .respond_with(ResponseTemplate::new(400).set_body_string("invalid_grant"))
        .expect(1)
        .mount(&mock_server)
        .await;

    let (session, backend) = session_with(&mock_server.uri(), expired_store()).await;
    let result = session.tokens().refresh().await;

    match result {
        Err(Error::RefreshFailed { status }) => assert_eq!(status, StatusCode::BAD_REQUEST),
        other => panic!("expected RefreshFailed, got {other:?}"),
    }
    assert!(session.tokens().credentials().is_empty());
    assert!(backend.entries().is_empty());
    assert!(!session.tokens().is_refreshing());

    // A second attempt has nothing left to refresh with.
    assert!(matches!(
        session.tokens().refresh().await,
        Err(Error::NoRefreshToken)
    ));
}

#[tokio::test]
async fn test_concurrent_callers_share_failure() {
    let mock_server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/api/spotify/refresh"))
        .respond_with(ResponseTemplate::new(500).set_delay(Duration::from_millis(100)))
        .expect(1)
        .mount(&mock_server)
        .await;

    let (session, _) = session_with(&mock_server.uri(), expired_store()).await;
    let tokens = session.tokens().clone();

    let (first, second) = tokio::join!(tokens.refresh(), tokens.refresh());

    assert!(matches!(first, Err(Error::RefreshFailed { .. })));
    assert!(matches!(second, Err(Error::RefreshFailed { .. })));
}

#[tokio::test]
async fn test_refresh_times_out() {
    let mock_server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/api/spotify/refresh"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(json!({ "access_token": "late" }))
                .set_delay(Duration::from_secs(3)),
        )
        .mount(&mock_server)
        .await;

    let mut settings = common::settings_for(&mock_server.uri());
    settings.http_timeout = Duration::from_millis(200);
    let session = songify::session::Session::with_store(
        settings,
        std::sync::Arc::new(expired_store()),
    )
    .await
    .unwrap();

    let result = session.tokens().refresh().await;
    assert!(matches!(result, Err(Error::Timeout)));
    assert!(session.tokens().credentials().is_empty());
}

#[tokio::test]
async fn test_ensure_fresh_only_refreshes_expired_tokens() {
    let mock_server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/api/spotify/refresh"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "access_token": "new" })))
        .expect(1)
        .mount(&mock_server)
        .await;

    let (valid, _) = session_with(&mock_server.uri(), signed_in_store()).await;
    assert_eq!(
        valid.tokens().ensure_fresh().await.unwrap().as_deref(),
        Some("test-token")
    );

    let (expired, _) = session_with(&mock_server.uri(), expired_store()).await;
    assert!(!expired.tokens().is_authenticated());
    assert_eq!(
        expired.tokens().ensure_fresh().await.unwrap().as_deref(),
        Some("new")
    );
}

#[tokio::test]
async fn test_logout_wipes_everything() {
    let mock_server = MockServer::start().await;
    let (session, backend) = session_with(&mock_server.uri(), signed_in_store()).await;
    assert!(session.tokens().is_authenticated());

    session.tokens().logout().await.unwrap();

    assert!(!session.tokens().is_authenticated());
    assert!(session.tokens().credentials().is_empty());
    assert!(backend.entries().is_empty());
}

#[tokio::test]
async fn test_abandoned_refresh_still_settles() {
    let mock_server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/api/spotify/refresh"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(json!({
                    "access_token": "new-token",
                    "refresh_token": "rotated-refresh",
                    "expires_in": 3600
                }))
                .set_delay(Duration::from_millis(50)),
        )
        .expect(2)
        .mount(&mock_server)
        .await;

    let mut settings = common::settings_for(&mock_server.uri());
    settings.http_timeout = Duration::from_millis(300);
    let session = songify::session::Session::with_store(
        settings,
        std::sync::Arc::new(expired_store()),
    )
    .await
    .unwrap();
    let tokens = session.tokens().clone();

    let abandoned = tokio::time::timeout(Duration::from_millis(10), tokens.refresh()).await;
    assert!(abandoned.is_err());

    tokio::time::sleep(Duration::from_millis(500)).await;

    assert!(!tokens.is_refreshing());
    assert!(tokens.is_authenticated());
    let credentials = tokens.credentials();
    assert_eq!(credentials.access_token.as_deref(), Some("new-token"));
    assert_eq!(credentials.refresh_token.as_deref(), Some("rotated-refresh"));

    assert_eq!(tokens.refresh().await.unwrap(), "new-token");
}

#[tokio::test]
async fn test_logout_during_refresh_is_not_undone() {
    let mock_server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/api/spotify/refresh"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(json!({ "access_token": "new-token", "expires_in": 3600 }))
                .set_delay(Duration::from_millis(200)),
        )
        .expect(1)
        .mount(&mock_server)
        .await;

    let (session, backend) = session_with(&mock_server.uri(), expired_store()).await;
    let tokens = session.tokens().clone();

    let refreshing = tokio::spawn({
        let tokens = tokens.clone();
        async move { tokens.refresh().await }
    });

    tokio::time::sleep(Duration::from_millis(50)).await;
    tokens.logout().await.unwrap();

    let result = refreshing.await.unwrap();
    assert!(matches!(result, Err(Error::Unauthenticated)));
    assert!(tokens.credentials().is_empty());
    assert!(backend.entries().is_empty());
    assert!(!tokens.is_refreshing());
}
