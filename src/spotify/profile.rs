use serde_json::Value;

use crate::{
    error::Result,
    spotify::{RequestOptions, SpotifyApi},
    types::UserProfile,
};

/// Raw `/me` payload of the signed-in user.
pub async fn fetch_profile(api: &SpotifyApi) -> Result<Value> {
    api.fetch_with_auth::<Value>(&api.endpoint("/me"), RequestOptions::get())
        .await
}

/// Typed view of a stored or freshly fetched profile.
pub fn parse_profile(profile: &Value) -> Result<UserProfile> {
    Ok(serde_json::from_value(profile.clone())?)
}
