use bech32::Hrp;
use bitcoin::hashes::Hash;
use bitcoin::script::ScriptBuf;
use bitcoin::{CompressedPublicKey, PubkeyHash, ScriptHash, WitnessProgram, WitnessVersion};

use crate::error::LtcError;
use crate::network::{LtcNetwork, NetworkParams};

/// A decoded Litecoin address.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LtcAddress {
    P2pkh([u8; 20]),
    P2sh([u8; 20]),
    Segwit(WitnessProgram),
}

impl LtcAddress {
    /// Parse an address string for the given network.
    ///
    /// Accepts bech32/bech32m segwit addresses carrying the network's hrp and
    /// Base58Check P2PKH/P2SH addresses carrying its version bytes.
    pub fn parse(address: &str, network: LtcNetwork) -> Result<Self, LtcError> {
        let params = network.params();
        if let Ok((hrp, version, program)) = bech32::segwit::decode(address) {
            return decode_segwit(hrp, version.to_u8(), &program, params);
        }
        decode_base58(address, params)
    }

    /// The output script paying to this address.
    pub fn script_pubkey(&self) -> ScriptBuf {
        match self {
            LtcAddress::P2pkh(hash) => ScriptBuf::new_p2pkh(&PubkeyHash::from_byte_array(*hash)),
            LtcAddress::P2sh(hash) => ScriptBuf::new_p2sh(&ScriptHash::from_byte_array(*hash)),
            LtcAddress::Segwit(program) => ScriptBuf::new_witness_program(program),
        }
    }
}

fn decode_segwit(
    hrp: Hrp,
    version: u8,
    program: &[u8],
    params: &NetworkParams,
) -> Result<LtcAddress, LtcError> {
    if hrp.to_lowercase() != params.bech32_hrp {
        return Err(LtcError::InvalidAddress(format!(
            "bech32 prefix {hrp} does not belong to this network (expected {})",
            params.bech32_hrp
        )));
    }
    let version = WitnessVersion::try_from(version)
        .map_err(|e| LtcError::InvalidAddress(format!("bad witness version: {e}")))?;
    let program = WitnessProgram::new(version, program)
        .map_err(|e| LtcError::InvalidAddress(format!("bad witness program: {e}")))?;
    Ok(LtcAddress::Segwit(program))
}

fn decode_base58(address: &str, params: &NetworkParams) -> Result<LtcAddress, LtcError> {
    let payload = bs58::decode(address)
        .with_check(None)
        .into_vec()
        .map_err(|e| LtcError::InvalidAddress(format!("failed to parse address: {e}")))?;

    if payload.len() != 21 {
        return Err(LtcError::InvalidAddress(format!(
            "expected 21-byte payload, got {}",
            payload.len()
        )));
    }

    let mut hash = [0u8; 20];
    hash.copy_from_slice(&payload[1..]);

    match payload[0] {
        v if v == params.pubkey_hash => Ok(LtcAddress::P2pkh(hash)),
        v if v == params.script_hash => Ok(LtcAddress::P2sh(hash)),
        v => Err(LtcError::InvalidAddress(format!(
            "version byte 0x{v:02x} does not belong to this network"
        ))),
    }
}

/// Resolve an address string to the output script paying to it.
pub fn address_to_script(address: &str, network: LtcNetwork) -> Result<ScriptBuf, LtcError> {
    Ok(LtcAddress::parse(address, network)?.script_pubkey())
}

/// Derive a P2WPKH (native SegWit bech32) address from a compressed public key.
///
/// Returns `ltc1...` for mainnet and `tltc1...` for testnet.
pub fn pubkey_to_p2wpkh_address(
    pubkey_bytes: &[u8; 33],
    network: LtcNetwork,
) -> Result<String, LtcError> {
    let compressed_pk = CompressedPublicKey::from_slice(pubkey_bytes).map_err(|e| {
        LtcError::InvalidPublicKey(format!("failed to parse compressed public key: {e}"))
    })?;
    let hash = compressed_pk.wpubkey_hash().to_byte_array();

    let hrp = Hrp::parse(network.params().bech32_hrp)
        .map_err(|e| LtcError::InvalidAddress(format!("bad hrp: {e}")))?;
    bech32::segwit::encode_v0(hrp, &hash)
        .map_err(|e| LtcError::InvalidAddress(format!("bech32 encoding failed: {e}")))
}

/// Encode a 20-byte hash as a Base58Check P2PKH address.
pub fn p2pkh_address(pubkey_hash: &[u8; 20], network: LtcNetwork) -> String {
    base58_address(network.params().pubkey_hash, pubkey_hash)
}

fn base58_address(version: u8, hash: &[u8; 20]) -> String {
    let mut payload = Vec::with_capacity(21);
    payload.push(version);
    payload.extend_from_slice(hash);
    bs58::encode(payload).with_check().into_string()
}
