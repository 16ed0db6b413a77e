//! Litecoin wallet provider.
//!
//! Ties the offline chain logic in `chain_ltc` to a block-explorer API:
//! balance and unspent-output lookups, concurrent resolution of prior
//! transactions, signing and broadcast.

pub mod builder;
pub mod config;
pub mod error;
pub mod explorer;
pub mod provider;

pub use builder::build_transaction;
pub use chain_ltc::{LtcNetwork, SpendableOutput, TransactionRequest, UnsignedLtcTx};
pub use config::ProviderConfig;
pub use error::{ProviderError, Result};
pub use explorer::{ExplorerApi, SochainClient};
pub use provider::LtcProvider;
