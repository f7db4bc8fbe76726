//! Analytics error types

use thiserror::Error;

/// Errors that can occur while deriving analytics from a snapshot
#[derive(Error, Debug)]
pub enum AnalyticsError {
    /// Upstream payload is not the expected shape
    #[error("Malformed response: {0}")]
    MalformedResponse(String),

    /// A required input (OHLC, ATM, ...) is missing or non-finite
    #[error("Insufficient data: {0}")]
    InsufficientData(String),

    /// Caller supplied an input outside its domain
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// CSV export failure
    #[error("CSV export failed: {0}")]
    Export(#[from] csv::Error),
}

impl AnalyticsError {
    pub fn malformed(msg: impl Into<String>) -> Self {
        Self::MalformedResponse(msg.into())
    }

    pub fn insufficient(msg: impl Into<String>) -> Self {
        Self::InsufficientData(msg.into())
    }

    pub fn invalid_input(msg: impl Into<String>) -> Self {
        Self::InvalidInput(msg.into())
    }

    /// True for errors the caller should render as a placeholder rather than a banner
    pub fn is_placeholder(&self) -> bool {
        matches!(self, Self::InsufficientData(_))
    }
}
