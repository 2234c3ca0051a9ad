use crate::{
    cli::{authorized_session, spinner},
    config::Settings,
    error, info,
    spotify::profile::{fetch_profile, parse_profile},
    warning,
};

pub async fn profile(settings: Settings) {
    let (session, _server) = authorized_session(settings).await;

    let pb = spinner("Fetching profile...");
    let result = fetch_profile(session.api()).await;
    pb.finish_and_clear();

    let raw = match result {
        Ok(raw) => raw,
        Err(e) => error!("Failed to fetch profile: {}", e),
    };

    if let Err(e) = session.tokens().save_auth_data(None, Some(&raw)).await {
        warning!("Failed to store profile: {}", e);
    }

    let profile = match parse_profile(&raw) {
        Ok(profile) => profile,
        Err(e) => error!("Unexpected profile payload: {}", e),
    };

    info!("Display name: {}", profile.display_name.unwrap_or_default());
    info!("ID: {}", profile.id);
    if let Some(email) = profile.email {
        info!("Email: {}", email);
    }
    if let Some(country) = profile.country {
        info!("Country: {}", country);
    }
    if let Some(product) = profile.product {
        info!("Product: {}", product);
    }
    if let Some(followers) = profile.followers {
        info!("Followers: {}", followers.total);
    }
    if let Some(uri) = profile.uri {
        info!("URI: {}", uri);
    }
    if let Some(url) = profile.external_urls.spotify {
        info!("URL: {}", url);
    }
    if let Some(image) = profile.images.first() {
        info!("Image: {}", image.url);
    }
}
