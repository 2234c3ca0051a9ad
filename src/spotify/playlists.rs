use parking_lot::Mutex;
use url::Url;

use crate::{
    error::{Error, Result},
    spotify::{LoadingGuard, RequestOptions, SpotifyApi},
    types::PlaylistPage,
    utils,
};

#[derive(Default)]
struct PlaylistState {
    page: Option<PlaylistPage>,
    loading: bool,
}

impl PlaylistState {
    fn loading(&mut self) -> &mut bool {
        &mut self.loading
    }
}

/// The current user's playlists, accumulated page by page.
pub struct PlaylistLibrary {
    api: SpotifyApi,
    state: Mutex<PlaylistState>,
}

impl PlaylistLibrary {
    pub fn new(api: SpotifyApi) -> Self {
        Self {
            api,
            state: Mutex::new(PlaylistState::default()),
        }
    }

    /// Stored page, with every appended item.
    pub fn playlists(&self) -> Option<PlaylistPage> {
        self.state.lock().page.clone()
    }

    pub fn is_loading(&self) -> bool {
        self.state.lock().loading
    }

    pub fn has_more(&self) -> bool {
        self.state
            .lock()
            .page
            .as_ref()
            .is_some_and(|page| page.next.is_some())
    }

    /// Fetches one page of `/me/playlists`.
    ///
    /// With `reset` (or when nothing is stored yet) the page replaces the
    /// stored one; otherwise its items are appended and its `next` cursor
    /// replaces the stored cursor. Returns the fetched page.
    pub async fn fetch_playlists(&self, limit: u32, offset: u32, reset: bool) -> Result<PlaylistPage> {
        if !self.api.tokens().is_authenticated() {
            return Err(Error::Unauthenticated);
        }

        let url = Url::parse_with_params(
            &self.api.endpoint("/me/playlists"),
            &[("limit", limit.to_string()), ("offset", offset.to_string())],
        )
        .map_err(|e| Error::Config(e.to_string()))?;

        let response = {
            let _loading = LoadingGuard::start(&self.state, PlaylistState::loading);
            self.api
                .fetch_with_auth::<PlaylistPage>(url.as_str(), RequestOptions::get())
                .await
        };

        let page = match response {
            Ok(page) => page,
            Err(e) => {
                tracing::warn!(error = %e, "Failed to fetch user playlists");
                return Err(e);
            }
        };

        let mut state = self.state.lock();
        match state.page.as_mut().filter(|_| !reset) {
            Some(stored) => {
                stored.items.extend(page.items.iter().cloned());
                stored.next = page.next.clone();
            }
            None => state.page = Some(page.clone()),
        }

        Ok(page)
    }

    /// Fetches the page after the stored one and appends it.
    ///
    /// Returns `Ok(None)` when there is nothing more to fetch.
    pub async fn fetch_more_playlists(&self) -> Result<Option<PlaylistPage>> {
        let next = match self.state.lock().page.as_ref().and_then(|p| p.next.clone()) {
            Some(next) => next,
            None => return Ok(None),
        };

        let (limit, offset) = utils::parse_page_cursor(&next)?;
        self.fetch_playlists(limit, offset, false).await.map(Some)
    }
}
