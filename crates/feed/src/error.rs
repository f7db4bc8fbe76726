//! Feed error types

use thiserror::Error;

/// Errors raised while fetching or applying upstream data
#[derive(Error, Debug)]
pub enum FeedError {
    /// Every attempt allowed by the source's retry policy failed
    #[error("{source_name} unavailable after {attempts} attempt(s): {message}")]
    UpstreamUnavailable {
        source_name: String,
        attempts: u32,
        message: String,
    },

    #[error("Malformed response from {source_name}: {message}")]
    MalformedResponse { source_name: String, message: String },

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Decode error: {0}")]
    Decode(#[from] serde_json::Error),

    /// Non-HTTP transport failure (file replay, scripted source)
    #[error("{source_name}: {message}")]
    Transport { source_name: String, message: String },

    /// A newer response for the same source was already applied
    #[error("Stale response from {source_name}: ticket {ticket} <= applied {applied}")]
    StaleResponse {
        source_name: String,
        ticket: u64,
        applied: u64,
    },

    #[error("Unsupported source url '{0}'")]
    InvalidUrl(String),
}

impl FeedError {
    pub fn malformed(source_name: &str, message: impl Into<String>) -> Self {
        Self::MalformedResponse {
            source_name: source_name.to_string(),
            message: message.into(),
        }
    }

    pub fn transport(source_name: &str, message: impl Into<String>) -> Self {
        Self::Transport {
            source_name: source_name.to_string(),
            message: message.into(),
        }
    }

    /// The response arrived but its body could not be used
    pub fn is_malformed(&self) -> bool {
        match self {
            Self::MalformedResponse { .. } | Self::Decode(_) => true,
            Self::Http(e) => e.is_decode(),
            _ => false,
        }
    }

    /// Only transport failures are worth another attempt; a bad body would
    /// come back the same
    pub fn is_retryable(&self) -> bool {
        match self {
            Self::Http(e) => !e.is_decode(),
            Self::Transport { .. } => true,
            _ => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_retry_classification() {
        let transport = FeedError::transport("greeks", "connection reset");
        assert!(transport.is_retryable());
        assert!(!transport.is_malformed());

        let decode = FeedError::from(serde_json::from_str::<serde_json::Value>("<html>").unwrap_err());
        assert!(!decode.is_retryable());
        assert!(decode.is_malformed());

        let malformed = FeedError::malformed("greeks", "greeks chain is empty");
        assert!(!malformed.is_retryable());
        assert!(!FeedError::InvalidUrl("ftp://x".to_string()).is_retryable());
    }
}
