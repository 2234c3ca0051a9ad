mod auth;
mod credentials;
mod store;

pub use auth::TokenManager;
pub use credentials::{
    ACCESS_TOKEN_KEY, AUTH_STATE_KEY, CredentialStore, EXPIRES_KEY, PROFILE_KEY,
    REFRESH_TOKEN_KEY,
};
pub use store::{FileStore, KeyValueStore, MemoryStore};
