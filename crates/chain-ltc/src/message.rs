use bitcoin::script::ScriptBuf;
use bitcoin::CompressedPublicKey;
use k256::ecdsa::signature::hazmat::PrehashSigner;
use k256::ecdsa::{RecoveryId, Signature, SigningKey, VerifyingKey};
use sha2::{Digest, Sha256};

use crate::address::LtcAddress;
use crate::error::LtcError;
use crate::network::LtcNetwork;
use crate::signer::KeySigner;

/// Header offset of a recoverable signature made with a compressed key.
const COMPRESSED_HEADER_BASE: u8 = 31;
const UNCOMPRESSED_HEADER_BASE: u8 = 27;

fn write_compact_size(buf: &mut Vec<u8>, n: u64) {
    match n {
        0..=0xfc => buf.push(n as u8),
        0xfd..=0xffff => {
            buf.push(0xfd);
            buf.extend_from_slice(&(n as u16).to_le_bytes());
        }
        0x1_0000..=0xffff_ffff => {
            buf.push(0xfe);
            buf.extend_from_slice(&(n as u32).to_le_bytes());
        }
        _ => {
            buf.push(0xff);
            buf.extend_from_slice(&n.to_le_bytes());
        }
    }
}

/// Double-SHA256 of `prefix || compact_size(len) || message`.
///
/// The network prefix already starts with its own length byte (`0x19`).
pub fn message_digest(message: &[u8], network: LtcNetwork) -> [u8; 32] {
    let prefix = network.params().message_prefix.as_bytes();
    let mut buf = Vec::with_capacity(prefix.len() + 9 + message.len());
    buf.extend_from_slice(prefix);
    write_compact_size(&mut buf, message.len() as u64);
    buf.extend_from_slice(message);

    let first = Sha256::digest(&buf);
    Sha256::digest(first).into()
}

/// Sign a message in the Litecoin signed-message format.
///
/// Returns the 65-byte compact recoverable signature: a header byte
/// (`31 + recovery id` for compressed keys) followed by `r || s`.
pub fn sign_message(message: &[u8], signer: &KeySigner) -> Result<[u8; 65], LtcError> {
    let digest = message_digest(message, signer.network());

    let key_bytes = signer.secret_bytes();
    let signing_key = SigningKey::from_bytes((&*key_bytes).into())
        .map_err(|e| LtcError::InvalidPrivateKey(e.to_string()))?;

    let (signature, recovery_id): (Signature, RecoveryId) = signing_key
        .sign_prehash(&digest)
        .map_err(|e| LtcError::SigningError(e.to_string()))?;

    let mut out = [0u8; 65];
    out[0] = COMPRESSED_HEADER_BASE + recovery_id.to_byte();
    out[1..].copy_from_slice(&signature.to_bytes());
    Ok(out)
}

/// Check that `signature` over `message` was made by the key behind `address`.
///
/// P2WPKH and P2PKH addresses are matched against the recovered key. Returns
/// `Ok(false)` for a well-formed signature by a different key.
pub fn verify_message(
    address: &str,
    message: &[u8],
    signature: &[u8],
    network: LtcNetwork,
) -> Result<bool, LtcError> {
    let expected = LtcAddress::parse(address, network)?.script_pubkey();

    if signature.len() != 65 {
        return Err(LtcError::SigningError(format!(
            "expected 65-byte signature, got {}",
            signature.len()
        )));
    }

    let header = signature[0];
    if !(UNCOMPRESSED_HEADER_BASE..COMPRESSED_HEADER_BASE + 4).contains(&header) {
        return Err(LtcError::SigningError(format!("bad signature header {header}")));
    }
    if header < COMPRESSED_HEADER_BASE {
        // Only compressed keys can own the address types we derive.
        return Ok(false);
    }

    let recovery_id = RecoveryId::from_byte(header - COMPRESSED_HEADER_BASE)
        .ok_or_else(|| LtcError::SigningError("bad recovery id".into()))?;
    let sig = Signature::from_slice(&signature[1..])
        .map_err(|e| LtcError::SigningError(format!("malformed signature: {e}")))?;

    let digest = message_digest(message, network);
    let recovered = match VerifyingKey::recover_from_prehash(&digest, &sig, recovery_id) {
        Ok(key) => key,
        Err(_) => return Ok(false),
    };

    let pubkey = CompressedPublicKey::from_slice(&recovered.to_sec1_bytes())
        .map_err(|e| LtcError::InvalidPublicKey(e.to_string()))?;

    Ok(expected == ScriptBuf::new_p2wpkh(&pubkey.wpubkey_hash())
        || expected == ScriptBuf::new_p2pkh(&pubkey.pubkey_hash()))
}
