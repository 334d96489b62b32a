//! Graph adapter errors

use reqwest::StatusCode;

/// Errors from the Graph client and the OAuth flows
#[derive(Debug, thiserror::Error)]
pub enum GraphError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("API error {status}: {body}")]
    Api { status: u16, body: String },

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("invalid Graph URL: {0}")]
    InvalidUrl(String),

    #[error("{0}")]
    Auth(String),
}

impl GraphError {
    /// Build an API error from a non-success response, consuming its body
    pub(crate) async fn from_response(response: reqwest::Response) -> Self {
        let status = response.status().as_u16();
        let body = response.text().await.unwrap_or_default();
        GraphError::Api { status, body }
    }
}

impl From<GraphError> for cx_core::Error {
    fn from(err: GraphError) -> Self {
        match err {
            GraphError::Api { status, body } => {
                let message = format!("{status}: {body}");
                match StatusCode::from_u16(status) {
                    Ok(StatusCode::UNAUTHORIZED) | Ok(StatusCode::FORBIDDEN) => {
                        cx_core::Error::Auth(message)
                    }
                    Ok(StatusCode::NOT_FOUND) => cx_core::Error::NotFound(message),
                    _ => cx_core::Error::Network(message),
                }
            }
            GraphError::Http(e) => cx_core::Error::Network(e.to_string()),
            GraphError::Json(e) => cx_core::Error::Json(e),
            GraphError::InvalidUrl(url) => {
                cx_core::Error::Config(format!("invalid Graph URL: {url}"))
            }
            GraphError::Auth(reason) => cx_core::Error::Auth(reason),
        }
    }
}
