//! Axum routes for the sign-in flow and the protected mail listing.
//!
//! | Route | Behaviour |
//! |---|---|
//! | `GET /auth` | redirect to the identity provider |
//! | `GET /auth/callback?code=…` | redeem the code, store the token in the session, redirect to `/emails` |
//! | `GET /emails` | list the user's messages, or redirect to `/auth` without a token |
//!
//! # Quick Start
//!
//! ```rust,ignore
//! use graph_mail_oauth::server::{AppConfig, MemorySessionStore, app_routes};
//! use graph_mail_oauth::{AuthClient, GraphClient};
//!
//! let config = AppConfig::from_env()?;
//! let provider = AuthClient::new(config.oauth().clone());
//! let mail = GraphClient::with_base_url(config.graph_base_url().clone());
//! let store = MemorySessionStore::new(config.max_sessions());
//!
//! let app = app_routes(config, provider, mail, store);
//! ```

mod config;
mod cookies;
mod error;
mod extractor;
mod routes;
mod session;
mod state;
mod traits;

pub use config::{AppConfig, MIN_SESSION_SECRET_LEN};
pub use error::{AppError, ConfigError};
pub use routes::{AUTH_PATH, CALLBACK_PATH, EMAILS_PATH, app_routes};
pub use session::{MemorySessionStore, SessionRecord};
pub use traits::{IdentityProvider, MailApi, SessionStore};
