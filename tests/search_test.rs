mod common;

use std::time::Duration;

use serde_json::json;
use songify::{
    spotify::search::{DEFAULT_SEARCH_LIMIT, DEFAULT_SEARCH_TYPES},
    types::{SearchResults, SearchType},
};
use wiremock::{
    Mock, MockServer, ResponseTemplate,
    matchers::{method, path, query_param},
};

use common::{session_with, signed_in_store};

fn search_body(name: &str) -> serde_json::Value {
    json!({
        "tracks": { "items": [{ "name": name, "artists": [{ "name": "Artist" }], "uri": "spotify:track:1" }], "total": 1 },
        "albums": { "items": [], "total": 0 }
    })
}

#[tokio::test]
async fn test_search_sends_query_parameters() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/v1/search"))
        .and(query_param("q", "daft punk"))
        .and(query_param("type", "track,album"))
        .and(query_param("limit", "10"))
        .respond_with(ResponseTemplate::new(200).set_body_json(search_body("One More Time")))
        .expect(1)
        .mount(&mock_server)
        .await;

    let (session, _) = session_with(&mock_server.uri(), signed_in_store()).await;
    let search = session.search();

    let response = search
        .search("daft punk", DEFAULT_SEARCH_TYPES, DEFAULT_SEARCH_LIMIT)
        .await
        .unwrap();

    assert_eq!(search.results(), Some(response.clone()));
    assert_eq!(search.error(), None);
    assert!(!search.is_loading());

    let results: SearchResults = serde_json::from_value(response).unwrap();
    let rows = results.rows();
    assert_eq!(rows.len(), 1);
    assert_eq!(rows[0].name, "One More Time");
    assert_eq!(rows[0].by, "Artist");
}

#[tokio::test]
async fn test_blank_query_clears_results_without_request() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/v1/search"))
        .respond_with(ResponseTemplate::new(200).set_body_json(search_body("Song")))
        .expect(1)
        .mount(&mock_server)
        .await;

    let (session, _) = session_with(&mock_server.uri(), signed_in_store()).await;
    let search = session.search();

    search.search("song", &[SearchType::Track], 5).await.unwrap();
    assert!(search.results().is_some());

    assert_eq!(search.search("", &[SearchType::Track], 5).await, None);
    assert_eq!(search.results(), None);

    assert_eq!(search.search("   ", &[SearchType::Track], 5).await, None);
}

#[tokio::test]
async fn test_failed_search_sets_error_and_keeps_results() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/v1/search"))
        .and(query_param("q", "adele"))
        .respond_with(ResponseTemplate::new(200).set_body_json(search_body("Hello")))
        .mount(&mock_server)
        .await;
    Mock::given(method("GET"))
        .and(path("/v1/search"))
        .and(query_param("q", "drake"))
        .respond_with(ResponseTemplate::new(503))
        .mount(&mock_server)
        .await;

    let (session, _) = session_with(&mock_server.uri(), signed_in_store()).await;
    let search = session.search();

    let previous = search.search("adele", DEFAULT_SEARCH_TYPES, 10).await;
    assert!(previous.is_some());

    let result = search.search("drake", DEFAULT_SEARCH_TYPES, 10).await;

    assert_eq!(result, None);
    assert_eq!(search.results(), previous);
    let error = search.error().unwrap();
    assert!(error.starts_with("Failed to search:"));
    assert!(!search.is_loading());

    search.clear_search();
    assert_eq!(search.results(), None);
    assert_eq!(search.error(), None);
}

#[tokio::test]
async fn test_cancelled_search_clears_loading() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/v1/search"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(search_body("Slow"))
                .set_delay(Duration::from_millis(300)),
        )
        .mount(&mock_server)
        .await;

    let (session, _) = session_with(&mock_server.uri(), signed_in_store()).await;
    let search = session.search();

    let cancelled = tokio::time::timeout(
        Duration::from_millis(20),
        search.search("slow", DEFAULT_SEARCH_TYPES, DEFAULT_SEARCH_LIMIT),
    )
    .await;

    assert!(cancelled.is_err());
    assert!(!search.is_loading());
    assert_eq!(search.results(), None);
}
