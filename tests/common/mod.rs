#![allow(dead_code)]

use std::{sync::Arc, time::Duration};

use serde_json::{Value, json};
use songify::{
    config::Settings,
    management::{ACCESS_TOKEN_KEY, EXPIRES_KEY, MemoryStore, PROFILE_KEY, REFRESH_TOKEN_KEY},
    session::Session,
    types::Playlist,
};

pub const CLIENT_ID: &str = "test-client";
pub const CLIENT_SECRET: &str = "test-secret";

/// Settings pointing every endpoint at `base`.
pub fn settings_for(base: &str) -> Settings {
    let mut settings = Settings::new(CLIENT_ID);
    settings.client_secret = Some(CLIENT_SECRET.to_string());
    settings.api_url = format!("{base}/v1");
    settings.token_url = format!("{base}/api/token");
    settings.auth_url = format!("{base}/authorize");
    settings.server_url = Some(base.to_string());
    settings.redirect_uri = "http://127.0.0.1:3000/callback".to_string();
    settings.http_timeout = Duration::from_secs(5);
    settings
}

pub fn profile_json() -> Value {
    json!({ "id": "user-1", "display_name": "Test User", "email": "user@example.com" })
}

pub fn far_future_ms() -> i64 {
    songify::utils::now_millis() + 3_600_000
}

/// Store holding a valid, non-expired login.
pub fn signed_in_store() -> MemoryStore {
    MemoryStore::with_entries([
        (ACCESS_TOKEN_KEY, "test-token".to_string()),
        (REFRESH_TOKEN_KEY, "old-refresh".to_string()),
        (EXPIRES_KEY, far_future_ms().to_string()),
        (PROFILE_KEY, profile_json().to_string()),
    ])
}

pub async fn session_with(base: &str, store: MemoryStore) -> (Session, Arc<MemoryStore>) {
    let store = Arc::new(store);
    let session = Session::with_store(settings_for(base), store.clone())
        .await
        .expect("session opens");
    (session, store)
}

pub fn playlist(id: &str) -> Playlist {
    Playlist {
        id: id.to_string(),
        name: format!("Playlist {id}"),
        description: None,
        public: Some(true),
        collaborative: false,
        owner: None,
        tracks: None,
        snapshot_id: None,
        uri: None,
    }
}

pub fn playlist_page(ids: &[&str], next: Option<String>) -> Value {
    json!({
        "items": ids.iter().map(|id| playlist(id)).collect::<Vec<_>>(),
        "next": next,
        "total": 3,
    })
}
