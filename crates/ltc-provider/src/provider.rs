//! Wallet provider bound to a single key.

use bitcoin::Amount;
use chain_ltc::signer::sign_transaction;
use chain_ltc::message as ltc_message;
use chain_ltc::{KeySigner, LtcNetwork, TransactionRequest};
use tracing::{debug, info, warn};

use crate::builder::build_transaction;
use crate::config::ProviderConfig;
use crate::error::{ProviderError, Result};
use crate::explorer::{ExplorerApi, SochainClient};

/// Litecoin provider: one P2WPKH key, one explorer.
pub struct LtcProvider<A: ExplorerApi = SochainClient> {
    signer: KeySigner,
    address: String,
    balance: Amount,
    config: ProviderConfig,
    api: A,
}

impl LtcProvider<SochainClient> {
    /// Create a provider talking to the configured Sochain endpoint.
    pub fn new(private_key_hex: &str, config: ProviderConfig) -> Result<Self> {
        let api = SochainClient::new(&config)?;
        Self::with_api(private_key_hex, config, api)
    }
}

impl<A: ExplorerApi> LtcProvider<A> {
    /// Create a provider over any explorer implementation.
    pub fn with_api(private_key_hex: &str, config: ProviderConfig, api: A) -> Result<Self> {
        config.validate()?;
        let signer = KeySigner::from_hex(private_key_hex, config.network)?;
        let address = signer.address()?;
        info!(%address, network = %config.network, "litecoin provider ready");

        Ok(Self {
            signer,
            address,
            balance: Amount::ZERO,
            config,
            api,
        })
    }

    /// Load the initial balance.
    pub async fn init(&mut self) -> Result<()> {
        self.update_balance().await
    }

    /// Refresh the cached confirmed balance.
    pub async fn update_balance(&mut self) -> Result<()> {
        self.balance = self.api.fetch_balance(&self.address).await?;
        debug!(balance = self.balance.to_sat(), "balance updated");
        Ok(())
    }

    pub fn address(&self) -> &str {
        &self.address
    }

    /// Balance as of the last [`update_balance`](Self::update_balance).
    pub fn balance(&self) -> Amount {
        self.balance
    }

    pub fn network(&self) -> LtcNetwork {
        self.config.network
    }

    /// Build and sign a transaction for `request`, returning its wire hex.
    ///
    /// Change goes back to the provider's own address.
    pub async fn sign_transaction(&self, request: &TransactionRequest) -> Result<String> {
        Ok(hex::encode(self.sign_raw(request).await?))
    }

    async fn sign_raw(&self, request: &TransactionRequest) -> Result<Vec<u8>> {
        let available = self.api.fetch_unspent_outputs(&self.address).await?;
        debug!(count = available.len(), "fetched unspent outputs");

        let unsigned = build_transaction(
            request,
            &available,
            &self.address,
            self.config.network,
            self.config.default_fee_litoshi,
            &self.api,
        )
        .await?;

        Ok(sign_transaction(unsigned, &self.signer)?)
    }

    /// Sign a transaction for `request` and broadcast it. Returns the txid.
    pub async fn sign_and_send_transaction(&self, request: &TransactionRequest) -> Result<String> {
        let raw = self.sign_raw(request).await?;
        let txid = self.api.broadcast(&raw).await.inspect_err(|e| {
            warn!(error = %e, "broadcast failed");
        })?;
        info!(%txid, "transaction broadcast");
        Ok(txid)
    }

    /// Sign `message` in the Litecoin signed-message format; hex-encoded.
    pub fn sign_message(&self, message: &str) -> Result<String> {
        let signature = ltc_message::sign_message(message.as_bytes(), &self.signer)?;
        Ok(hex::encode(signature))
    }

    /// Check a hex signature produced by [`sign_message`](Self::sign_message).
    pub fn verify_message(&self, address: &str, message: &str, signature_hex: &str) -> Result<bool> {
        let signature = hex::decode(signature_hex)
            .map_err(|e| ProviderError::SigningFailure(format!("signature is not hex: {e}")))?;
        Ok(ltc_message::verify_message(
            address,
            message.as_bytes(),
            &signature,
            self.config.network,
        )?)
    }

    /// Whether the explorer answers a balance query for `address`.
    pub async fn verify_address(&self, address: &str) -> bool {
        self.api.verify_address_reachable(address).await
    }
}
