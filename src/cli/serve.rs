use std::sync::Arc;

use crate::{config::Settings, error, info, server, session::http_client};

pub async fn serve(settings: Settings) {
    if settings.client_secret.is_none() {
        error!("SPOTIFY_API_AUTH_CLIENT_SECRET must be set to run the token-exchange server");
    }

    let http = match http_client(&settings) {
        Ok(http) => http,
        Err(e) => error!("{}", e),
    };

    let listener = match server::bind(&settings.server_address).await {
        Ok(listener) => listener,
        Err(e) => error!("{}", e),
    };

    info!("Token-exchange server listening on http://{}", settings.server_address);
    let app = server::router(Arc::new(settings), http, None);
    if let Err(e) = server::serve(listener, app).await {
        error!("Server stopped: {}", e);
    }
}
