use parking_lot::Mutex;
use serde_json::Value;
use url::Url;

use crate::{
    error::Error,
    spotify::{LoadingGuard, RequestOptions, SpotifyApi},
    types::SearchType,
};

pub const DEFAULT_SEARCH_TYPES: &[SearchType] = &[SearchType::Track, SearchType::Album];
pub const DEFAULT_SEARCH_LIMIT: u32 = 10;

#[derive(Default)]
struct SearchState {
    results: Option<Value>,
    error: Option<String>,
    loading: bool,
}

impl SearchState {
    fn loading(&mut self) -> &mut bool {
        &mut self.loading
    }
}

/// Catalog search that reports failures through an error slot instead of
/// returning them.
pub struct SearchSession {
    api: SpotifyApi,
    state: Mutex<SearchState>,
}

impl SearchSession {
    pub fn new(api: SpotifyApi) -> Self {
        Self {
            api,
            state: Mutex::new(SearchState::default()),
        }
    }

    pub fn results(&self) -> Option<Value> {
        self.state.lock().results.clone()
    }

    pub fn error(&self) -> Option<String> {
        self.state.lock().error.clone()
    }

    pub fn is_loading(&self) -> bool {
        self.state.lock().loading
    }

    pub fn clear_search(&self) {
        let mut state = self.state.lock();
        state.results = None;
        state.error = None;
    }

    /// Searches for `query` across `types`.
    ///
    /// A blank query clears the stored results without calling the API. On
    /// failure the stored results are left untouched, the error slot is set
    /// and `None` is returned.
    pub async fn search(&self, query: &str, types: &[SearchType], limit: u32) -> Option<Value> {
        if query.trim().is_empty() {
            self.state.lock().results = None;
            return None;
        }

        self.state.lock().error = None;
        let result = {
            let _loading = LoadingGuard::start(&self.state, SearchState::loading);
            self.request(query, types, limit).await
        };

        let mut state = self.state.lock();
        match result {
            Ok(response) => {
                state.results = Some(response.clone());
                Some(response)
            }
            Err(e) => {
                tracing::warn!(error = %e, query, "Search error");
                state.error = Some(format!("Failed to search: {e}"));
                None
            }
        }
    }

    async fn request(&self, query: &str, types: &[SearchType], limit: u32) -> Result<Value, Error> {
        let types = types
            .iter()
            .map(SearchType::as_str)
            .collect::<Vec<_>>()
            .join(",");

        let url = Url::parse_with_params(
            &self.api.endpoint("/search"),
            &[
                ("q", query.to_string()),
                ("type", types),
                ("limit", limit.to_string()),
            ],
        )
        .map_err(|e| Error::Config(e.to_string()))?;

        self.api
            .fetch_with_auth::<Value>(url.as_str(), RequestOptions::get())
            .await
    }
}
