//! Litecoin chain support for the wallet provider.
//!
//! Provides per-network parameters, address encoding and decoding, first-fit
//! output selection, transaction assembly with optional change and memo
//! outputs, P2WPKH signing, and Litecoin signed messages.

pub mod address;
pub mod error;
pub mod message;
pub mod network;
pub mod signer;
pub mod transaction;
pub mod utxo;

pub use error::LtcError;
pub use network::{LtcNetwork, NetworkParams};
pub use signer::KeySigner;
pub use transaction::{TransactionRequest, UnsignedLtcTx};
pub use utxo::{OutputSelection, SpendableOutput};
