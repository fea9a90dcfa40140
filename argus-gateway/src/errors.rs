use argus_core::prelude::DataType;
use thiserror::Error;

use crate::encoder::OutputFormat;

#[derive(Debug, Error)]
pub enum GatewayError {
    /// Required field missing or not of the expected shape. Recovered
    /// locally: counted, logged, frame dropped, stream continues.
    #[error("malformed frame: {0}")]
    MalformedFrame(String),

    /// Encoder asked to produce a form it does not support. Programming
    /// error, surfaced synchronously to the caller.
    #[error("unsupported encoding: {format} for {data_type}")]
    UnsupportedEncoding { format: OutputFormat, data_type: DataType },

    /// Socket read/write/handshake failure. Triggers a reconnect.
    #[error("transport failed: {0}")]
    TransportFailed(#[from] tokio_tungstenite::tungstenite::Error),

    /// Venue returned an explicit error for a subscribe request.
    #[error("subscription rejected by venue: {0}")]
    SubscriptionRejected(String),

    /// Reconnect supervisor passed its retry cap. Fatal for the venue.
    #[error("reconnect retries exhausted after {attempts} attempts")]
    RetriesExhausted { attempts: u32 },

    /// Cooperative termination, not a true error.
    #[error("shutdown requested")]
    ShutdownRequested,
}

impl GatewayError {
    pub fn missing_field(field: &str) -> Self {
        GatewayError::MalformedFrame(format!("missing field `{field}`"))
    }

    pub fn invalid_field(field: &str) -> Self {
        GatewayError::MalformedFrame(format!("invalid value in field `{field}`"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        assert_eq!(
            GatewayError::missing_field("p").to_string(),
            "malformed frame: missing field `p`"
        );
        assert_eq!(
            GatewayError::RetriesExhausted { attempts: 11 }.to_string(),
            "reconnect retries exhausted after 11 attempts"
        );
    }
}
