use serde::{Deserialize, Serialize};

/// Default Sochain v2 API endpoint. The network is selected per request path.
pub const SOCHAIN_API: &str = "https://sochain.com/api/v2";

/// Prefix mixed into the digest of signed messages on both networks.
pub const MESSAGE_PREFIX: &str = "\x19Litecoin Signed Message:\n";

/// Address and key encoding constants for one Litecoin network.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct NetworkParams {
    /// Network code used in block-explorer request paths.
    pub explorer_code: &'static str,
    pub message_prefix: &'static str,
    /// Human-readable part of bech32 segwit addresses.
    pub bech32_hrp: &'static str,
    /// Base58Check version byte of P2PKH addresses.
    pub pubkey_hash: u8,
    /// Base58Check version byte of P2SH addresses.
    pub script_hash: u8,
    /// Version byte of WIF-encoded private keys.
    pub wif: u8,
}

pub const MAINNET_PARAMS: NetworkParams = NetworkParams {
    explorer_code: "LTC",
    message_prefix: MESSAGE_PREFIX,
    bech32_hrp: "ltc",
    pubkey_hash: 0x30,
    script_hash: 0x32,
    wif: 0xb0,
};

pub const TESTNET_PARAMS: NetworkParams = NetworkParams {
    explorer_code: "LTCTEST",
    message_prefix: MESSAGE_PREFIX,
    bech32_hrp: "tltc",
    pubkey_hash: 0x6f,
    script_hash: 0xc4,
    wif: 0xef,
};

/// Supported Litecoin networks.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LtcNetwork {
    #[default]
    Mainnet,
    Testnet,
}

impl LtcNetwork {
    /// Encoding constants for this network.
    pub fn params(self) -> &'static NetworkParams {
        match self {
            LtcNetwork::Mainnet => &MAINNET_PARAMS,
            LtcNetwork::Testnet => &TESTNET_PARAMS,
        }
    }

    /// Network code used in block-explorer request paths (`LTC` / `LTCTEST`).
    pub fn explorer_code(self) -> &'static str {
        self.params().explorer_code
    }
}

impl std::fmt::Display for LtcNetwork {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            LtcNetwork::Mainnet => write!(f, "mainnet"),
            LtcNetwork::Testnet => write!(f, "testnet"),
        }
    }
}
