use serde::{Deserialize, Serialize};
use serde_json::Value;
use tabled::Tabled;

/// Token payload returned by the provider token endpoint and relayed by the
/// local exchange and refresh endpoints.
///
/// Every field is optional so a partial payload (a refresh response without a
/// new refresh token) only updates what it carries.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TokenResponse {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub access_token: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub refresh_token: Option<String>,
    /// Lifetime of the access token in seconds.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub expires_in: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub scope: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub token_type: Option<String>,
}

/// Everything the credential store keeps for the signed-in user.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Credentials {
    pub access_token: Option<String>,
    pub refresh_token: Option<String>,
    /// Expiry as epoch milliseconds.
    pub expires_at: Option<i64>,
    /// Raw `/me` payload.
    pub profile: Option<Value>,
}

impl Credentials {
    /// A missing expiry never expires.
    pub fn is_authenticated_at(&self, now_ms: i64) -> bool {
        self.access_token.is_some()
            && self.profile.is_some()
            && self.expires_at.is_none_or(|expires_at| now_ms < expires_at)
    }

    pub fn is_expired_at(&self, now_ms: i64) -> bool {
        self.expires_at.is_some_and(|expires_at| now_ms >= expires_at)
    }

    pub fn is_empty(&self) -> bool {
        *self == Self::default()
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct CodeRequest {
    #[serde(default)]
    pub code: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RefreshRequest {
    #[serde(default)]
    pub refresh_token: Option<String>,
}

/// Authorization result delivered by the provider redirect.
#[derive(Debug, Clone, PartialEq)]
pub struct AuthorizationCode {
    pub code: String,
    pub state: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlaylistPage {
    pub items: Vec<Playlist>,
    pub next: Option<String>,
    #[serde(default)]
    pub total: Option<u64>,
    #[serde(default)]
    pub limit: Option<u32>,
    #[serde(default)]
    pub offset: Option<u32>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Playlist {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub public: Option<bool>,
    #[serde(default)]
    pub collaborative: bool,
    #[serde(default)]
    pub owner: Option<PlaylistOwner>,
    #[serde(default)]
    pub tracks: Option<TrackCount>,
    #[serde(default)]
    pub snapshot_id: Option<String>,
    #[serde(default)]
    pub uri: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlaylistOwner {
    pub id: String,
    #[serde(default)]
    pub display_name: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrackCount {
    pub total: u64,
}

#[derive(Tabled)]
pub struct PlaylistTableRow {
    pub name: String,
    pub owner: String,
    pub tracks: String,
    pub visibility: String,
}

impl From<&Playlist> for PlaylistTableRow {
    fn from(playlist: &Playlist) -> Self {
        let visibility = match (playlist.collaborative, playlist.public) {
            (true, _) => "collaborative",
            (false, Some(true)) => "public",
            (false, Some(false)) => "private",
            (false, None) => "-",
        };

        Self {
            name: playlist.name.clone(),
            owner: playlist
                .owner
                .as_ref()
                .map(|o| o.display_name.clone().unwrap_or_else(|| o.id.clone()))
                .unwrap_or_default(),
            tracks: playlist
                .tracks
                .as_ref()
                .map(|t| t.total.to_string())
                .unwrap_or_default(),
            visibility: visibility.to_string(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UserProfile {
    pub id: String,
    #[serde(default)]
    pub display_name: Option<String>,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub uri: Option<String>,
    #[serde(default)]
    pub href: Option<String>,
    #[serde(default)]
    pub country: Option<String>,
    #[serde(default)]
    pub product: Option<String>,
    #[serde(default)]
    pub followers: Option<Followers>,
    #[serde(default)]
    pub images: Vec<Image>,
    #[serde(default)]
    pub external_urls: ExternalUrls,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Followers {
    pub total: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Image {
    pub url: String,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ExternalUrls {
    #[serde(default)]
    pub spotify: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, clap::ValueEnum)]
pub enum SearchType {
    Track,
    Album,
    Artist,
    Playlist,
}

impl SearchType {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Track => "track",
            Self::Album => "album",
            Self::Artist => "artist",
            Self::Playlist => "playlist",
        }
    }
}

impl std::fmt::Display for SearchType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Typed view of a `/search` response.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct SearchResults {
    #[serde(default)]
    pub tracks: Option<Paging<SearchItem>>,
    #[serde(default)]
    pub albums: Option<Paging<SearchItem>>,
    #[serde(default)]
    pub artists: Option<Paging<SearchItem>>,
    #[serde(default)]
    pub playlists: Option<Paging<Option<SearchItem>>>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Paging<T> {
    pub items: Vec<T>,
    #[serde(default)]
    pub total: Option<u64>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct SearchItem {
    pub name: String,
    #[serde(default)]
    pub artists: Vec<NamedRef>,
    #[serde(default)]
    pub owner: Option<PlaylistOwner>,
    #[serde(default)]
    pub release_date: Option<String>,
    #[serde(default)]
    pub uri: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct NamedRef {
    pub name: String,
}

#[derive(Tabled)]
pub struct SearchTableRow {
    pub kind: String,
    pub name: String,
    pub by: String,
    pub uri: String,
}

impl SearchTableRow {
    pub fn new(kind: SearchType, item: &SearchItem) -> Self {
        let by = if !item.artists.is_empty() {
            item.artists
                .iter()
                .map(|a| a.name.as_str())
                .collect::<Vec<_>>()
                .join(", ")
        } else {
            item.owner
                .as_ref()
                .and_then(|o| o.display_name.clone())
                .unwrap_or_default()
        };

        Self {
            kind: kind.to_string(),
            name: item.name.clone(),
            by,
            uri: item.uri.clone().unwrap_or_default(),
        }
    }
}

impl SearchResults {
    pub fn rows(&self) -> Vec<SearchTableRow> {
        let mut rows = Vec::new();
        let sections = [
            (SearchType::Track, &self.tracks),
            (SearchType::Album, &self.albums),
            (SearchType::Artist, &self.artists),
        ];
        for (kind, section) in sections {
            if let Some(page) = section {
                rows.extend(page.items.iter().map(|item| SearchTableRow::new(kind, item)));
            }
        }
        if let Some(page) = &self.playlists {
            rows.extend(
                page.items
                    .iter()
                    .flatten()
                    .map(|item| SearchTableRow::new(SearchType::Playlist, item)),
            );
        }
        rows
    }
}
