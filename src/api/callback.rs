use std::{collections::HashMap, sync::Arc};

use axum::{Extension, extract::Query, response::Html};
use tokio::sync::{Mutex, oneshot};

use crate::{error::Error, types::AuthorizationCode, warning};

pub type CallbackResult = Result<AuthorizationCode, Error>;

/// Sender half of a login waiting for the provider redirect.
pub type PendingLogin = Arc<Mutex<Option<oneshot::Sender<CallbackResult>>>>;

pub async fn callback(
    Query(params): Query<HashMap<String, String>>,
    Extension(pending): Extension<PendingLogin>,
) -> Html<&'static str> {
    let Some(sender) = pending.lock().await.take() else {
        return Html("<h4>No login in progress.</h4>");
    };

    let (result, page) = match (params.get("code"), params.get("error")) {
        (Some(code), _) => (
            Ok(AuthorizationCode {
                code: code.clone(),
                state: params.get("state").cloned(),
            }),
            Html("<h2>Authorization received.</h2><p>You can close this browser window.</p>"),
        ),
        (None, Some(error)) => (
            Err(Error::AuthorizationDenied(error.clone())),
            Html("<h4>Login failed.</h4>"),
        ),
        (None, None) => (Err(Error::MissingCode), Html("<h4>Missing authorization code.</h4>")),
    };

    if sender.send(result).is_err() {
        warning!("Login is no longer waiting for the callback");
    }
    page
}
