use serde::Deserialize;
use serde_json::Value as JsonValue;
use url::Url;

use crate::error::Error;
use crate::types::AccessToken;

/// Default Microsoft Graph endpoint.
pub const DEFAULT_GRAPH_BASE_URL: &str = "https://graph.microsoft.com/v1.0/";

/// Thin Microsoft Graph REST client authenticated per call with a bearer token.
#[derive(Clone)]
pub struct GraphClient {
    base_url: Url,
    http: reqwest::Client,
}

/// Graph collection envelope (`{"value": [...]}`).
#[derive(Deserialize)]
struct Collection {
    #[serde(default)]
    value: Vec<JsonValue>,
}

impl GraphClient {
    #[must_use]
    pub fn new() -> Self {
        Self::with_base_url(DEFAULT_GRAPH_BASE_URL.parse().expect("valid default URL"))
    }

    /// Point the client at another Graph deployment.
    ///
    /// A trailing slash is added when missing so that relative resource
    /// paths resolve under the version segment.
    #[must_use]
    pub fn with_base_url(mut base_url: Url) -> Self {
        if !base_url.path().ends_with('/') {
            let path = format!("{}/", base_url.path());
            base_url.set_path(&path);
        }
        Self {
            base_url,
            http: reqwest::Client::new(),
        }
    }

    /// Use a custom HTTP client (for connection pool reuse or testing).
    #[must_use]
    pub fn with_http_client(mut self, client: reqwest::Client) -> Self {
        self.http = client;
        self
    }

    #[must_use]
    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    /// List the signed-in user's messages (`GET /me/messages`).
    ///
    /// Items are returned as Graph sent them. Only the first page is read.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Http`] on network or decode failure, or
    /// [`Error::Api`] if Graph answers with a non-success status.
    pub async fn list_messages(&self, token: &AccessToken) -> Result<Vec<JsonValue>, Error> {
        let url = self.base_url.join("me/messages")?;

        let response = self
            .http
            .get(url)
            .bearer_auth(token.secret())
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            return Err(Error::Api {
                operation: "list messages",
                status: status.as_u16(),
                detail: api_error_detail(response).await,
            });
        }

        let collection = response.json::<Collection>().await?;
        Ok(collection.value)
    }
}

impl Default for GraphClient {
    fn default() -> Self {
        Self::new()
    }
}

/// Extracts `error.code: error.message` from a Graph error body.
async fn api_error_detail(response: reqwest::Response) -> String {
    #[derive(Deserialize)]
    struct ErrorBody {
        error: ErrorInfo,
    }

    #[derive(Deserialize)]
    struct ErrorInfo {
        code: String,
        #[serde(default)]
        message: String,
    }

    match response.json::<ErrorBody>().await {
        Ok(body) => format!("{}: {}", body.error.code, body.error.message),
        Err(_) => "unrecognized error response".into(),
    }
}
