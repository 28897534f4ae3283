//! Sign a user in with the Microsoft identity platform (authorization-code
//! flow for a confidential client) and read their mailbox through
//! Microsoft Graph with the resulting access token.
//!
//! The library side ([`AuthClient`], [`GraphClient`]) is usable on its own;
//! [`server`] wires both into an axum router backed by a session store.

pub mod error;
pub mod graph;
pub mod ids;
pub mod oauth;
pub mod server;
pub mod types;

// Re-exports for convenient access
pub use error::Error;
pub use graph::GraphClient;
pub use ids::generate_session_id;
pub use oauth::{
    AuthClient, AuthorizationRequest, OAuthConfig, TokenExchangeRequest, TokenResponse,
};
pub use types::{AccessToken, SessionId};
