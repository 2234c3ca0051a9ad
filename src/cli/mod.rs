//! # CLI Module
//!
//! User-facing commands of songify. Each command opens a [`Session`],
//! delegates to the `spotify` and `management` layers and reports progress
//! with the `info!` / `success!` / `warning!` / `error!` macros. Fatal
//! problems end the process through `error!`.
//!
//! ## Commands
//!
//! - [`login`] - authorization-code login through the browser
//! - [`logout`] - forget all stored credentials
//! - [`status`] - show what is stored and whether it is still valid
//! - [`refresh`] - force a token refresh
//! - [`profile`] - show the signed-in user's profile
//! - [`playlists`] - list the user's playlists
//! - [`search`] - search the catalog
//! - [`serve`] - run the token-exchange server
//!
//! ## Usage Patterns
//!
//! ```bash
//! songify serve                         # on the machine holding the client secret
//! songify login                         # opens the browser
//! songify playlists --all               # every playlist, page by page
//! songify search "drake" --type artist  # catalog search
//! ```

use std::time::Duration;

use indicatif::{ProgressBar, ProgressStyle};
use tokio::task::JoinHandle;

use crate::{config::Settings, error, server, session::Session};

mod auth;
mod playlists;
mod profile;
mod search;
mod serve;

pub use auth::{login, logout, refresh, status};
pub use playlists::playlists;
pub use profile::profile;
pub use search::search;
pub use serve::serve;

async fn open_session(settings: Settings) -> Session {
    match Session::open(settings).await {
        Ok(session) => session,
        Err(e) => error!("Failed to open session: {}", e),
    }
}

/// Opens a session ready for API calls: the exchange endpoints are reachable
/// and an expired access token has been refreshed.
async fn authorized_session(settings: Settings) -> (Session, Option<JoinHandle<()>>) {
    let session = open_session(settings).await;
    let server = server::spawn_embedded(session.settings(), session.http()).await;

    match session.tokens().ensure_fresh().await {
        Ok(Some(_)) => {}
        Ok(None) => error!("Not logged in. Please run songify login"),
        Err(e) if e.clears_credentials() => {
            error!("Session expired and could not be refreshed ({}). Please run songify login", e)
        }
        Err(e) => error!("Failed to refresh access token: {}", e),
    }

    (session, server)
}

fn spinner(message: &str) -> ProgressBar {
    let pb = ProgressBar::new_spinner();
    pb.set_message(message.to_string());
    pb.enable_steady_tick(Duration::from_millis(100));
    if let Ok(style) = ProgressStyle::with_template("{spinner:.blue} {msg}") {
        pb.set_style(style.tick_chars("⠋⠙⠹⠸⠼⠴⠦⠧⠇⠏"));
    }
    pb
}
