use chain_ltc::LtcError;
use thiserror::Error;

/// Provider errors. Every variant aborts the operation that raised it.
#[derive(Debug, Error)]
pub enum ProviderError {
    #[error("insufficient funds: need {needed} litoshi, have {available}")]
    InsufficientFunds { needed: u64, available: u64 },

    #[error("network failure: {0}")]
    NetworkFailure(String),

    #[error("invalid explorer response: {0}")]
    InvalidResponse(String),

    #[error("invalid address: {0}")]
    InvalidAddress(String),

    #[error("invalid key: {0}")]
    InvalidKey(String),

    #[error("transaction build failed: {0}")]
    Transaction(String),

    #[error("signing failed: {0}")]
    SigningFailure(String),

    #[error("invalid configuration: {0}")]
    Config(String),
}

/// Result type
pub type Result<T> = std::result::Result<T, ProviderError>;

impl From<LtcError> for ProviderError {
    fn from(e: LtcError) -> Self {
        match e {
            LtcError::InsufficientFunds { needed, available } => {
                ProviderError::InsufficientFunds { needed, available }
            }
            LtcError::InvalidAddress(msg) => ProviderError::InvalidAddress(msg),
            LtcError::InvalidPrivateKey(msg) | LtcError::InvalidPublicKey(msg) => {
                ProviderError::InvalidKey(msg)
            }
            LtcError::TransactionBuildError(msg) => ProviderError::Transaction(msg),
            LtcError::SigningError(msg) => ProviderError::SigningFailure(msg),
        }
    }
}

impl From<reqwest::Error> for ProviderError {
    fn from(e: reqwest::Error) -> Self {
        if e.is_timeout() {
            ProviderError::NetworkFailure(format!("request timed out: {e}"))
        } else if e.is_decode() {
            ProviderError::InvalidResponse(format!("JSON decode error: {e}"))
        } else {
            ProviderError::NetworkFailure(format!("HTTP error: {e}"))
        }
    }
}
