use thiserror::Error;

/// Litecoin chain operation errors.
#[derive(Debug, Error)]
pub enum LtcError {
    #[error("invalid private key: {0}")]
    InvalidPrivateKey(String),

    #[error("invalid public key: {0}")]
    InvalidPublicKey(String),

    #[error("invalid address: {0}")]
    InvalidAddress(String),

    #[error("insufficient funds: need {needed} litoshi, have {available}")]
    InsufficientFunds { needed: u64, available: u64 },

    #[error("transaction build error: {0}")]
    TransactionBuildError(String),

    #[error("signing error: {0}")]
    SigningError(String),
}
