use bitcoin::hashes::Hash;
use bitcoin::script::ScriptBuf;
use bitcoin::secp256k1::{ecdsa, Message, PublicKey, Secp256k1, SecretKey};
use bitcoin::sighash::{EcdsaSighashType, SighashCache};
use bitcoin::{CompressedPublicKey, Transaction, Witness};
use zeroize::Zeroizing;

use crate::address;
use crate::error::LtcError;
use crate::network::LtcNetwork;
use crate::transaction::UnsignedLtcTx;

/// A single secp256k1 key controlling a P2WPKH address.
///
/// Every input of a transaction it signs must spend an output locked to this
/// key's P2WPKH script.
pub struct KeySigner {
    secret_key: SecretKey,
    public_key: PublicKey,
    network: LtcNetwork,
}

impl std::fmt::Debug for KeySigner {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("KeySigner")
            .field("public_key", &self.public_key)
            .field("network", &self.network)
            .finish_non_exhaustive()
    }
}

impl KeySigner {
    /// Build a signer from a 32-byte secp256k1 scalar.
    pub fn from_bytes(private_key: &[u8; 32], network: LtcNetwork) -> Result<Self, LtcError> {
        let secp = Secp256k1::new();
        let secret_key = SecretKey::from_slice(private_key)
            .map_err(|e| LtcError::InvalidPrivateKey(format!("invalid secret key: {e}")))?;
        let public_key = PublicKey::from_secret_key(&secp, &secret_key);
        Ok(Self {
            secret_key,
            public_key,
            network,
        })
    }

    /// Build a signer from a hex-encoded 32-byte private key.
    pub fn from_hex(private_key_hex: &str, network: LtcNetwork) -> Result<Self, LtcError> {
        let bytes = Zeroizing::new(
            hex::decode(private_key_hex.trim())
                .map_err(|e| LtcError::InvalidPrivateKey(format!("invalid hex: {e}")))?,
        );
        let key: Zeroizing<[u8; 32]> = Zeroizing::new(bytes.as_slice().try_into().map_err(|_| {
            LtcError::InvalidPrivateKey(format!("expected 32 bytes, got {}", bytes.len()))
        })?);
        Self::from_bytes(&key, network)
    }

    /// Build a signer from a compressed-key WIF string for `network`.
    pub fn from_wif(wif: &str, network: LtcNetwork) -> Result<Self, LtcError> {
        let payload = Zeroizing::new(
            bs58::decode(wif.trim())
                .with_check(None)
                .into_vec()
                .map_err(|e| LtcError::InvalidPrivateKey(format!("invalid WIF: {e}")))?,
        );

        if payload.len() != 34 || payload[33] != 0x01 {
            return Err(LtcError::InvalidPrivateKey(
                "only compressed-key WIF is supported".into(),
            ));
        }
        if payload[0] != network.params().wif {
            return Err(LtcError::InvalidPrivateKey(format!(
                "WIF version 0x{:02x} does not belong to {network}",
                payload[0]
            )));
        }

        let key: Zeroizing<[u8; 32]> = Zeroizing::new(
            payload[1..33]
                .try_into()
                .map_err(|_| LtcError::InvalidPrivateKey("truncated WIF".into()))?,
        );
        Self::from_bytes(&key, network)
    }

    pub fn network(&self) -> LtcNetwork {
        self.network
    }

    /// 33-byte compressed public key.
    pub fn public_key_bytes(&self) -> [u8; 33] {
        self.public_key.serialize()
    }

    /// Raw private scalar, for signing outside the transaction path.
    pub(crate) fn secret_bytes(&self) -> Zeroizing<[u8; 32]> {
        Zeroizing::new(self.secret_key.secret_bytes())
    }

    /// The P2WPKH address of this key.
    pub fn address(&self) -> Result<String, LtcError> {
        address::pubkey_to_p2wpkh_address(&self.public_key_bytes(), self.network)
    }

    /// The P2WPKH output script of this key.
    pub fn script_pubkey(&self) -> ScriptBuf {
        ScriptBuf::new_p2wpkh(&CompressedPublicKey(self.public_key).wpubkey_hash())
    }

    /// Produce a SIGHASH_ALL signature for every input.
    pub fn sign_all_inputs(&self, unsigned: UnsignedLtcTx) -> Result<PartiallySignedLtcTx, LtcError> {
        let secp = Secp256k1::new();
        let script_pubkey = self.script_pubkey();
        let mut sighash_cache = SighashCache::new(&unsigned.tx);
        let mut signatures = Vec::with_capacity(unsigned.inputs.len());

        for (input_index, funding) in unsigned.inputs.iter().enumerate() {
            let prevout = funding.prevout()?;
            if prevout.script_pubkey != script_pubkey {
                return Err(LtcError::SigningError(format!(
                    "input {input_index} ({}:{}) is not locked to this key",
                    funding.output.txid, funding.output.vout
                )));
            }

            let sighash = sighash_cache
                .p2wpkh_signature_hash(
                    input_index,
                    &script_pubkey,
                    prevout.value,
                    EcdsaSighashType::All,
                )
                .map_err(|e| LtcError::SigningError(format!("sighash computation failed: {e}")))?;

            let message = Message::from_digest(sighash.to_byte_array());
            let signature = secp.sign_ecdsa(&message, &self.secret_key);

            signatures.push(InputSignature {
                message,
                signature,
                public_key: self.public_key,
            });
        }

        Ok(PartiallySignedLtcTx {
            unsigned,
            signatures,
        })
    }
}

#[derive(Debug, Clone)]
struct InputSignature {
    message: Message,
    signature: ecdsa::Signature,
    public_key: PublicKey,
}

/// A transaction whose inputs carry signatures that are not yet attached as
/// witnesses.
#[derive(Debug, Clone)]
pub struct PartiallySignedLtcTx {
    unsigned: UnsignedLtcTx,
    signatures: Vec<InputSignature>,
}

impl PartiallySignedLtcTx {
    /// Verify every input signature against its sighash and public key.
    pub fn validate_signatures_of_all_inputs(&self) -> Result<(), LtcError> {
        if self.signatures.len() != self.unsigned.tx.input.len() {
            return Err(LtcError::SigningError(format!(
                "{} of {} inputs signed",
                self.signatures.len(),
                self.unsigned.tx.input.len()
            )));
        }

        let secp = Secp256k1::verification_only();
        for (input_index, sig) in self.signatures.iter().enumerate() {
            secp.verify_ecdsa(&sig.message, &sig.signature, &sig.public_key)
                .map_err(|e| {
                    LtcError::SigningError(format!("signature for input {input_index} invalid: {e}"))
                })?;
        }
        Ok(())
    }

    /// Attach `[signature, pubkey]` witnesses and return the final transaction.
    pub fn finalize_all_inputs(self) -> Result<Transaction, LtcError> {
        if self.signatures.len() != self.unsigned.tx.input.len() {
            return Err(LtcError::SigningError("cannot finalize a partially signed transaction".into()));
        }

        let mut tx = self.unsigned.tx;
        for (txin, sig) in tx.input.iter_mut().zip(&self.signatures) {
            let mut sig_bytes = sig.signature.serialize_der().to_vec();
            sig_bytes.push(EcdsaSighashType::All as u8);

            let mut witness = Witness::new();
            witness.push(&sig_bytes);
            witness.push(sig.public_key.serialize());
            txin.witness = witness;
        }
        Ok(tx)
    }
}

/// Sign, validate, finalize and serialize in one step.
///
/// Returns the consensus-serialized transaction ready for broadcast.
pub fn sign_transaction(unsigned: UnsignedLtcTx, signer: &KeySigner) -> Result<Vec<u8>, LtcError> {
    let signed = signer.sign_all_inputs(unsigned)?;
    signed.validate_signatures_of_all_inputs()?;
    let tx = signed.finalize_all_inputs()?;
    Ok(bitcoin::consensus::serialize(&tx))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::transaction::tests::{funding_tx, spendable};
    use crate::transaction::{assemble_transaction, decode_raw_transaction};
    use crate::utxo::select_outputs;

    fn signer() -> KeySigner {
        KeySigner::from_bytes(&[0xcd; 32], LtcNetwork::Mainnet).unwrap()
    }

    /// Compressed-key WIF of `key` under `version`.
    fn wif_for(key: &[u8; 32], version: u8) -> String {
        let mut payload = vec![version];
        payload.extend_from_slice(key);
        payload.push(0x01);
        bs58::encode(payload).with_check().into_string()
    }

    fn unsigned_for(signer: &KeySigner, values: &[u64], amount: u64, fee: u64) -> UnsignedLtcTx {
        let prev: Vec<Transaction> = values
            .iter()
            .enumerate()
            .map(|(i, v)| funding_tx(signer.script_pubkey(), *v, i as u32))
            .collect();
        let outputs: Vec<_> = prev.iter().map(|tx| spendable(tx, 0)).collect();
        let selection = select_outputs(&outputs, amount, fee).unwrap();
        let needed = prev[..selection.selected.len()].to_vec();
        let destination = ScriptBuf::new_p2wpkh(
            &CompressedPublicKey(
                KeySigner::from_bytes(&[0x42; 32], LtcNetwork::Mainnet)
                    .unwrap()
                    .public_key,
            )
            .wpubkey_hash(),
        );
        assemble_transaction(&selection, needed, destination, amount, signer.script_pubkey(), Some("hi"))
            .unwrap()
    }

    #[test]
    fn from_hex_matches_from_bytes() {
        let a = KeySigner::from_hex(&"cd".repeat(32), LtcNetwork::Mainnet).unwrap();
        assert_eq!(a.public_key_bytes(), signer().public_key_bytes());
    }

    #[test]
    fn from_hex_rejects_bad_input() {
        assert!(KeySigner::from_hex("zz", LtcNetwork::Mainnet).is_err());
        assert!(KeySigner::from_hex(&"cd".repeat(31), LtcNetwork::Mainnet).is_err());
        assert!(KeySigner::from_hex(&"00".repeat(32), LtcNetwork::Mainnet).is_err());
    }

    #[test]
    fn wif_roundtrip_and_network_check() {
        let wif = wif_for(&[0xcd; 32], LtcNetwork::Mainnet.params().wif);
        let restored = KeySigner::from_wif(&wif, LtcNetwork::Mainnet).unwrap();
        assert_eq!(restored.public_key_bytes(), signer().public_key_bytes());
        assert!(KeySigner::from_wif(&wif, LtcNetwork::Testnet).is_err());
    }

    #[test]
    fn mainnet_wif_starts_with_t() {
        // Version 0xb0 with compressed flag encodes to a leading 'T'.
        assert!(wif_for(&[0xcd; 32], LtcNetwork::Mainnet.params().wif).starts_with('T'));
    }

    #[test]
    fn uncompressed_wif_is_rejected() {
        let mut payload = vec![LtcNetwork::Mainnet.params().wif];
        payload.extend_from_slice(&[0xcd; 32]);
        let wif = bs58::encode(payload).with_check().into_string();
        assert!(matches!(
            KeySigner::from_wif(&wif, LtcNetwork::Mainnet),
            Err(LtcError::InvalidPrivateKey(_))
        ));
    }

    #[test]
    fn debug_does_not_leak_secret() {
        let debug = format!("{:?}", signer());
        assert!(!debug.contains(&"cd".repeat(32)));
    }

    #[test]
    fn address_is_native_segwit() {
        assert!(signer().address().unwrap().starts_with("ltc1q"));
    }

    #[test]
    fn sign_validate_finalize() {
        let signer = signer();
        let unsigned = unsigned_for(&signer, &[1_000_000, 4_000_000], 2_000_000, 1_000_000);

        let signed = signer.sign_all_inputs(unsigned).unwrap();
        signed.validate_signatures_of_all_inputs().unwrap();
        let tx = signed.finalize_all_inputs().unwrap();

        assert_eq!(tx.input.len(), 2);
        for txin in &tx.input {
            assert_eq!(txin.witness.len(), 2);
            assert_eq!(txin.witness.nth(1).unwrap(), signer.public_key_bytes().as_slice());
            assert!(txin.script_sig.is_empty());
        }
    }

    #[test]
    fn serialized_transaction_decodes_back() {
        let signer = signer();
        let unsigned = unsigned_for(&signer, &[5_000_000], 2_000_000, 1_000_000);
        let expected_txid = unsigned.tx.compute_txid();

        let raw = sign_transaction(unsigned, &signer).unwrap();
        let decoded = decode_raw_transaction(&raw).unwrap();

        // Witnesses do not change the txid.
        assert_eq!(decoded.compute_txid(), expected_txid);
        assert_eq!(decoded.output.len(), 3);
    }

    #[test]
    fn tampered_signature_fails_validation() {
        let signer = signer();
        let unsigned = unsigned_for(&signer, &[5_000_000], 2_000_000, 1_000_000);
        let mut signed = signer.sign_all_inputs(unsigned).unwrap();

        let other = KeySigner::from_bytes(&[0x42; 32], LtcNetwork::Mainnet).unwrap();
        signed.signatures[0].public_key = other.public_key;

        assert!(matches!(
            signed.validate_signatures_of_all_inputs(),
            Err(LtcError::SigningError(_))
        ));
    }

    #[test]
    fn foreign_input_is_refused() {
        let owner = signer();
        let unsigned = unsigned_for(&owner, &[5_000_000], 2_000_000, 1_000_000);

        let stranger = KeySigner::from_bytes(&[0x42; 32], LtcNetwork::Mainnet).unwrap();
        assert!(matches!(
            stranger.sign_all_inputs(unsigned),
            Err(LtcError::SigningError(_))
        ));
    }

    #[test]
    fn out_of_range_output_index_is_an_error() {
        let signer = signer();
        let mut unsigned = unsigned_for(&signer, &[5_000_000], 2_000_000, 1_000_000);
        unsigned.inputs[0].output.vout = 7;

        assert!(matches!(
            signer.sign_all_inputs(unsigned),
            Err(LtcError::TransactionBuildError(_))
        ));
    }
}
