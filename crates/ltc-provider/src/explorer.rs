//! Block-explorer capabilities and the Sochain v2 client.

use async_trait::async_trait;
use bitcoin::amount::Denomination;
use bitcoin::Amount;
use chain_ltc::{LtcNetwork, SpendableOutput};
use serde::de::DeserializeOwned;
use serde::Deserialize;
use tracing::{debug, warn};

use crate::config::ProviderConfig;
use crate::error::{ProviderError, Result};

/// Remote chain queries the provider depends on.
///
/// Implementations report any transport failure or timeout as
/// [`ProviderError::NetworkFailure`] and never retry.
#[async_trait]
pub trait ExplorerApi: Send + Sync {
    /// Confirmed balance of `address`.
    async fn fetch_balance(&self, address: &str) -> Result<Amount>;

    /// Unspent outputs of `address`, in the order the explorer lists them.
    async fn fetch_unspent_outputs(&self, address: &str) -> Result<Vec<SpendableOutput>>;

    /// Consensus bytes of the transaction `txid`.
    async fn fetch_raw_transaction(&self, txid: &str) -> Result<Vec<u8>>;

    /// Submit a signed transaction and return its txid.
    async fn broadcast(&self, raw_tx: &[u8]) -> Result<String>;

    /// Whether the balance endpoint answers successfully for `address`.
    async fn verify_address_reachable(&self, address: &str) -> bool {
        self.fetch_balance(address).await.is_ok()
    }
}

/// Parse a decimal LTC string such as `"0.05000000"` into an exact amount.
pub fn parse_ltc_amount(value: &str) -> Result<Amount> {
    Amount::from_str_in(value.trim(), Denomination::Bitcoin)
        .map_err(|e| ProviderError::InvalidResponse(format!("bad amount {value:?}: {e}")))
}

#[derive(Deserialize)]
struct Envelope {
    status: String,
    #[serde(default)]
    data: serde_json::Value,
}

#[derive(Deserialize)]
struct BalanceData {
    confirmed_balance: String,
}

#[derive(Deserialize)]
struct UnspentData {
    txs: Vec<UnspentTx>,
}

#[derive(Deserialize)]
struct UnspentTx {
    txid: String,
    output_no: u32,
    value: String,
}

#[derive(Deserialize)]
struct RawTxData {
    tx_hex: String,
}

#[derive(Deserialize)]
struct SendTxData {
    txid: String,
}

/// Sochain v2 REST client
pub struct SochainClient {
    base_url: String,
    network: LtcNetwork,
    client: reqwest::Client,
}

impl SochainClient {
    /// Create a client for the configured network and endpoint.
    pub fn new(config: &ProviderConfig) -> Result<Self> {
        config.validate()?;
        let client = reqwest::Client::builder()
            .timeout(config.request_timeout())
            .build()
            .map_err(|e| ProviderError::Config(format!("failed to build HTTP client: {e}")))?;

        Ok(Self {
            base_url: config.base_url().to_string(),
            network: config.network,
            client,
        })
    }

    fn url(&self, endpoint: &str, arg: &str) -> String {
        format!(
            "{}/{}/{}/{}",
            self.base_url,
            endpoint,
            self.network.explorer_code(),
            arg
        )
    }

    /// Decode a Sochain envelope, failing unless `status` is `success`.
    async fn unwrap_envelope<R: DeserializeOwned>(
        endpoint: &str,
        response: reqwest::Response,
    ) -> Result<R> {
        if !response.status().is_success() {
            warn!(endpoint, status = %response.status(), "explorer request failed");
            return Err(ProviderError::NetworkFailure(format!(
                "{endpoint}: HTTP error: {}",
                response.status()
            )));
        }

        let envelope: Envelope = response.json().await?;
        if envelope.status != "success" {
            warn!(endpoint, status = %envelope.status, "explorer reported failure");
            return Err(ProviderError::NetworkFailure(format!(
                "{endpoint}: explorer status {:?}: {}",
                envelope.status, envelope.data
            )));
        }

        serde_json::from_value(envelope.data)
            .map_err(|e| ProviderError::InvalidResponse(format!("{endpoint}: {e}")))
    }

    async fn get<R: DeserializeOwned>(&self, endpoint: &str, arg: &str) -> Result<R> {
        let url = self.url(endpoint, arg);
        debug!(%url, "GET");
        let response = self.client.get(&url).send().await?;
        Self::unwrap_envelope(endpoint, response).await
    }
}

#[async_trait]
impl ExplorerApi for SochainClient {
    async fn fetch_balance(&self, address: &str) -> Result<Amount> {
        let data: BalanceData = self.get("get_address_balance", address).await?;
        parse_ltc_amount(&data.confirmed_balance)
    }

    async fn fetch_unspent_outputs(&self, address: &str) -> Result<Vec<SpendableOutput>> {
        let data: UnspentData = self.get("get_tx_unspent", address).await?;
        data.txs
            .into_iter()
            .map(|tx| -> Result<SpendableOutput> {
                Ok(SpendableOutput {
                    value_litoshi: parse_ltc_amount(&tx.value)?.to_sat(),
                    txid: tx.txid,
                    vout: tx.output_no,
                })
            })
            .collect()
    }

    async fn fetch_raw_transaction(&self, txid: &str) -> Result<Vec<u8>> {
        let data: RawTxData = self.get("get_tx", txid).await?;
        hex::decode(data.tx_hex.trim())
            .map_err(|e| ProviderError::InvalidResponse(format!("tx_hex of {txid}: {e}")))
    }

    async fn broadcast(&self, raw_tx: &[u8]) -> Result<String> {
        let url = self.url("send_tx", &hex::encode(raw_tx));
        debug!(bytes = raw_tx.len(), "POST send_tx");
        let response = self.client.post(&url).send().await?;
        let data: SendTxData = Self::unwrap_envelope("send_tx", response).await?;
        Ok(data.txid)
    }
}
