use std::sync::Arc;

use tokio::sync::{Mutex, oneshot};

use crate::{
    api::PendingLogin,
    cli::{open_session, spinner},
    config::Settings,
    error, info, server,
    spotify::{self, profile::parse_profile},
    success, utils, warning,
};

pub async fn login(settings: Settings) {
    let session = open_session(settings).await;
    let settings = session.settings().clone();

    let (sender, receiver) = oneshot::channel();
    let pending: PendingLogin = Arc::new(Mutex::new(Some(sender)));

    let listener = match server::bind(&settings.server_address).await {
        Ok(listener) => listener,
        Err(e) => error!("Cannot start callback server: {}", e),
    };
    let app = server::router(Arc::new(settings.clone()), session.http().clone(), Some(pending));
    let handle = server::spawn(listener, app);

    if let Err(e) = spotify::auth::redirect_to_authorize(&settings, session.store()).await {
        error!("Failed to start authorization: {}", e);
    }

    let pb = spinner("Waiting for authorization in the browser...");
    let authorization = match tokio::time::timeout(settings.login_timeout, receiver).await {
        Ok(Ok(Ok(authorization))) => authorization,
        Ok(Ok(Err(e))) => {
            pb.finish_and_clear();
            error!("Authorization failed: {}", e)
        }
        Ok(Err(_)) => {
            pb.finish_and_clear();
            error!("Callback server stopped before authorization completed.")
        }
        Err(_) => {
            pb.finish_and_clear();
            error!("Authentication failed or timed out.")
        }
    };

    pb.set_message("Exchanging authorization code...");
    let result = session.complete_login(authorization).await;
    pb.finish_and_clear();
    handle.abort();

    match result {
        Ok(profile) => {
            let name = parse_profile(&profile)
                .ok()
                .and_then(|p| p.display_name.or(Some(p.id)))
                .unwrap_or_default();
            success!("Authentication successful! Logged in as {}", name);
        }
        Err(e) => error!("Login failed: {}", e),
    }
}

pub async fn logout(settings: Settings) {
    let session = open_session(settings).await;
    match session.tokens().logout().await {
        Ok(()) => success!("Logged out"),
        Err(e) => error!("Failed to clear stored credentials: {}", e),
    }
}

pub async fn status(settings: Settings) {
    let session = open_session(settings).await;
    let credentials = session.tokens().credentials();

    if credentials.is_empty() {
        warning!("Not logged in. Please run songify login");
        return;
    }

    match credentials.profile.as_ref().map(parse_profile) {
        Some(Ok(profile)) => info!(
            "User: {} ({})",
            profile.display_name.unwrap_or_default(),
            profile.id
        ),
        Some(Err(e)) => warning!("Stored profile could not be read: {}", e),
        None => warning!("No profile stored"),
    }

    match credentials.expires_at {
        Some(at) => info!("Access token expires at {}", utils::format_expiry(at)),
        None if credentials.access_token.is_some() => info!("Access token has no expiry"),
        None => warning!("No access token stored"),
    }

    if credentials.refresh_token.is_none() {
        warning!("No refresh token stored; you will need to log in again once the token expires");
    }

    if session.tokens().is_authenticated() {
        success!("Authenticated");
    } else {
        warning!("Not authenticated. Run songify refresh or songify login");
    }
}

pub async fn refresh(settings: Settings) {
    let session = open_session(settings).await;
    let _server = server::spawn_embedded(session.settings(), session.http()).await;

    let pb = spinner("Refreshing access token...");
    let result = session.tokens().refresh().await;
    pb.finish_and_clear();

    match result {
        Ok(_) => match session.tokens().credentials().expires_at {
            Some(at) => success!("Token refreshed, valid until {}", utils::format_expiry(at)),
            None => success!("Token refreshed"),
        },
        Err(e) if e.clears_credentials() => {
            error!("{}. Stored credentials were cleared, please run songify login", e)
        }
        Err(e) => error!("{}", e),
    }
}
