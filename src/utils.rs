use base64::{Engine, engine::general_purpose::STANDARD};
use chrono::{DateTime, Local, Utc};
use rand::{Rng, distr::Alphanumeric};
use url::Url;

use crate::error::{Error, Result};

pub const DEFAULT_PAGE_LIMIT: u32 = 50;

/// Random alphanumeric string used as the OAuth `state` parameter.
pub fn generate_state(length: usize) -> String {
    rand::rng()
        .sample_iter(&Alphanumeric)
        .take(length)
        .map(char::from)
        .collect()
}

/// `Basic` authorization header value for the given client credentials.
pub fn basic_auth_header(client_id: &str, client_secret: &str) -> String {
    format!(
        "Basic {}",
        STANDARD.encode(format!("{client_id}:{client_secret}"))
    )
}

pub fn now_millis() -> i64 {
    Utc::now().timestamp_millis()
}

/// Absolute expiry in epoch milliseconds for a token that lives `expires_in`
/// seconds from `now_ms`.
pub fn expires_at_from(now_ms: i64, expires_in: u64) -> i64 {
    now_ms.saturating_add((expires_in as i64).saturating_mul(1000))
}

/// Extracts `limit` and `offset` from a paging `next` URL.
///
/// Missing or unparseable values fall back to the first page defaults.
pub fn parse_page_cursor(next: &str) -> Result<(u32, u32)> {
    let url = Url::parse(next).map_err(|e| Error::InvalidCursor(format!("{next}: {e}")))?;

    let mut limit = DEFAULT_PAGE_LIMIT;
    let mut offset = 0;
    for (key, value) in url.query_pairs() {
        match key.as_ref() {
            "limit" => limit = value.parse().unwrap_or(DEFAULT_PAGE_LIMIT),
            "offset" => offset = value.parse().unwrap_or(0),
            _ => {}
        }
    }

    Ok((limit, offset))
}

/// Human readable local time for an epoch-millis expiry.
pub fn format_expiry(expires_at: i64) -> String {
    match DateTime::<Utc>::from_timestamp_millis(expires_at) {
        Some(at) => at
            .with_timezone(&Local)
            .format("%Y-%m-%d %H:%M:%S")
            .to_string(),
        None => expires_at.to_string(),
    }
}
