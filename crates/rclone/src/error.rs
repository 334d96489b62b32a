//! Gateway errors

/// Message returned when rclone exits cleanly but prints unparsable JSON
pub const DECODE_MESSAGE: &str = "Failed to decode JSON output from rclone.";

/// Failures of an rclone invocation
#[derive(Debug, thiserror::Error)]
pub enum GatewayError {
    /// The process could not be started
    #[error("Exception occurred: {0}")]
    Spawn(#[from] std::io::Error),

    /// Non-zero exit; carries the trimmed standard error
    #[error("{0}")]
    Tool(String),

    /// Zero exit but stdout was not the expected JSON
    #[error("{0}")]
    Decode(String),
}

impl GatewayError {
    pub(crate) fn decode() -> Self {
        GatewayError::Decode(DECODE_MESSAGE.to_string())
    }
}

impl From<GatewayError> for cx_core::Error {
    fn from(err: GatewayError) -> Self {
        cx_core::Error::Gateway(err.to_string())
    }
}
