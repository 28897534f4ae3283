use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};

/// Request-scoped failures of the route handlers.
///
/// Every variant becomes a `500` with a fixed body. The wrapped detail is
/// logged, never sent to the client. A missing session token is not an
/// error: the handler redirects to `/auth` instead.
#[derive(Debug, thiserror::Error)]
pub enum AppError {
    /// Building the provider authorization URL failed.
    #[error("Authorization URL construction failed: {0}")]
    AuthUrlConstruction(#[source] crate::Error),

    /// Redeeming the authorization code failed (or the provider sent an error instead of a code).
    #[error("Token exchange failed: {0}")]
    TokenExchange(#[source] crate::Error),

    /// The downstream mail API call failed.
    #[error("Downstream API call failed: {0}")]
    DownstreamApi(#[source] crate::Error),

    /// Session store operation failed.
    #[error("Session store error: {0}")]
    Store(String),
}

impl AppError {
    fn public_message(&self) -> &'static str {
        match self {
            Self::AuthUrlConstruction(_) => "Error generating authentication URL",
            Self::TokenExchange(_) => "Error during authentication",
            Self::DownstreamApi(_) => "Error fetching emails",
            Self::Store(_) => "Internal error",
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        match &self {
            Self::AuthUrlConstruction(_) => {
                tracing::error!(error = %self, "Error generating auth URL");
            }
            Self::TokenExchange(_) => tracing::error!(error = %self, "Error acquiring token"),
            Self::DownstreamApi(_) => tracing::error!(error = %self, "Error fetching emails"),
            Self::Store(_) => tracing::error!(error = %self, "Session store failure"),
        }
        (StatusCode::INTERNAL_SERVER_ERROR, self.public_message()).into_response()
    }
}

/// Missing or invalid startup configuration. Fatal: the server does not start.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("{0} is required")]
    Missing(&'static str),

    #[error("{var}: {reason}")]
    Invalid { var: &'static str, reason: String },
}
