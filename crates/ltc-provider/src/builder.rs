//! Output selection and transaction assembly against a live explorer.

use chain_ltc::address::address_to_script;
use chain_ltc::transaction::{assemble_transaction, decode_raw_transaction};
use chain_ltc::utxo::select_outputs;
use chain_ltc::{LtcNetwork, SpendableOutput, TransactionRequest, UnsignedLtcTx};
use futures::future::try_join_all;
use tracing::{debug, info};

use crate::error::Result;
use crate::explorer::ExplorerApi;

/// Build an unsigned transaction paying `request` from `available`.
///
/// Outputs are taken first-fit in the order given. The prior transaction of
/// every selected output is fetched concurrently and the results are put back
/// in selection order. Any failure aborts the build; nothing partial is
/// returned.
pub async fn build_transaction<A>(
    request: &TransactionRequest,
    available: &[SpendableOutput],
    change_address: &str,
    network: LtcNetwork,
    default_fee_litoshi: u64,
    api: &A,
) -> Result<UnsignedLtcTx>
where
    A: ExplorerApi + ?Sized,
{
    let destination = address_to_script(&request.destination, network)?;
    let change = address_to_script(change_address, network)?;

    let fee_litoshi = request.fee_or(default_fee_litoshi);
    let selection = select_outputs(available, request.amount_litoshi, fee_litoshi)?;
    debug!(
        selected = selection.selected.len(),
        total = selection.total_litoshi,
        required = selection.required_litoshi,
        "selected outputs"
    );

    // try_join_all yields results in input order regardless of completion order.
    let prev_txs = try_join_all(selection.selected.iter().map(|output| async move {
        let raw = api.fetch_raw_transaction(&output.txid).await?;
        Ok::<_, crate::error::ProviderError>(decode_raw_transaction(&raw)?)
    }))
    .await?;

    let unsigned = assemble_transaction(
        &selection,
        prev_txs,
        destination,
        request.amount_litoshi,
        change,
        request.memo(),
    )?;

    info!(
        inputs = unsigned.tx.input.len(),
        outputs = unsigned.tx.output.len(),
        fee = unsigned.fee_litoshi(),
        "built transaction"
    );
    Ok(unsigned)
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::time::Duration;

    use async_trait::async_trait;
    use bitcoin::absolute::LockTime;
    use bitcoin::transaction::Version;
    use bitcoin::{Amount, OutPoint, ScriptBuf, Sequence, Transaction, TxIn, TxOut, Witness};
    use chain_ltc::KeySigner;

    use super::*;
    use crate::error::ProviderError;

    /// In-memory explorer. Lookups sleep for the configured delay so later
    /// inputs can finish before earlier ones.
    #[derive(Default)]
    struct FakeExplorer {
        raw_txs: HashMap<String, Vec<u8>>,
        delays_ms: HashMap<String, u64>,
        fail_txid: Option<String>,
        fetches: AtomicUsize,
    }

    #[async_trait]
    impl ExplorerApi for FakeExplorer {
        async fn fetch_balance(&self, _address: &str) -> Result<Amount> {
            Ok(Amount::ZERO)
        }

        async fn fetch_unspent_outputs(&self, _address: &str) -> Result<Vec<SpendableOutput>> {
            Ok(Vec::new())
        }

        async fn fetch_raw_transaction(&self, txid: &str) -> Result<Vec<u8>> {
            self.fetches.fetch_add(1, Ordering::SeqCst);
            if let Some(ms) = self.delays_ms.get(txid) {
                tokio::time::sleep(Duration::from_millis(*ms)).await;
            }
            if self.fail_txid.as_deref() == Some(txid) {
                return Err(ProviderError::NetworkFailure("connection reset".into()));
            }
            self.raw_txs
                .get(txid)
                .cloned()
                .ok_or_else(|| ProviderError::NetworkFailure(format!("unknown tx {txid}")))
        }

        async fn broadcast(&self, _raw_tx: &[u8]) -> Result<String> {
            Ok(String::new())
        }
    }

    fn owner() -> KeySigner {
        KeySigner::from_bytes(&[0xcd; 32], LtcNetwork::Mainnet).unwrap()
    }

    fn recipient() -> String {
        KeySigner::from_bytes(&[0x42; 32], LtcNetwork::Mainnet)
            .unwrap()
            .address()
            .unwrap()
    }

    fn funding_tx(script: ScriptBuf, value: u64, tag: u32) -> Transaction {
        Transaction {
            version: Version::TWO,
            lock_time: LockTime::from_consensus(tag),
            input: vec![TxIn {
                previous_output: OutPoint::null(),
                script_sig: ScriptBuf::from(vec![0x51]),
                sequence: Sequence::MAX,
                witness: Witness::default(),
            }],
            output: vec![TxOut {
                value: Amount::from_sat(value),
                script_pubkey: script,
            }],
        }
    }

    /// Explorer holding one funding transaction per value, plus the matching
    /// spendable outputs in the same order.
    fn fixture(values: &[u64]) -> (FakeExplorer, Vec<SpendableOutput>) {
        let script = owner().script_pubkey();
        let mut explorer = FakeExplorer::default();
        let mut outputs = Vec::new();
        for (i, value) in values.iter().enumerate() {
            let tx = funding_tx(script.clone(), *value, i as u32);
            let txid = tx.compute_txid().to_string();
            explorer
                .raw_txs
                .insert(txid.clone(), bitcoin::consensus::serialize(&tx));
            outputs.push(SpendableOutput {
                txid,
                vout: 0,
                value_litoshi: *value,
            });
        }
        (explorer, outputs)
    }

    async fn build(
        explorer: &FakeExplorer,
        outputs: &[SpendableOutput],
        request: TransactionRequest,
    ) -> Result<UnsignedLtcTx> {
        let change = owner().address().unwrap();
        build_transaction(&request, outputs, &change, LtcNetwork::Mainnet, 92_000_000, explorer).await
    }

    #[tokio::test]
    async fn change_returned_to_sender() {
        let (explorer, outputs) = fixture(&[5_000_000]);
        let request = TransactionRequest::new(recipient(), 2_000_000).with_fee(1_000_000);
        let unsigned = build(&explorer, &outputs, request).await.unwrap();

        assert_eq!(unsigned.tx.input.len(), 1);
        assert_eq!(unsigned.tx.output.len(), 2);
        assert_eq!(unsigned.tx.output[1].value.to_sat(), 2_000_000);
        assert_eq!(unsigned.tx.output[1].script_pubkey, owner().script_pubkey());
    }

    #[tokio::test]
    async fn insufficient_funds_fetches_nothing() {
        let (explorer, outputs) = fixture(&[1_000_000]);
        let request = TransactionRequest::new(recipient(), 2_000_000).with_fee(1_000_000);
        let result = build(&explorer, &outputs, request).await;

        assert!(matches!(
            result,
            Err(ProviderError::InsufficientFunds { needed: 3_000_000, available: 1_000_000 })
        ));
        assert_eq!(explorer.fetches.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn exact_cover_with_memo() {
        let (explorer, outputs) = fixture(&[3_000_000]);
        let request = TransactionRequest::new(recipient(), 2_000_000)
            .with_fee(1_000_000)
            .with_memo("hi");
        let unsigned = build(&explorer, &outputs, request).await.unwrap();

        assert_eq!(unsigned.tx.output.len(), 2);
        assert!(unsigned.tx.output[1].script_pubkey.is_op_return());
        assert_eq!(unsigned.tx.output[1].value, Amount::ZERO);
    }

    #[tokio::test]
    async fn default_fee_applies_when_unset() {
        let (explorer, outputs) = fixture(&[100_000_000]);
        let request = TransactionRequest::new(recipient(), 1_000_000);
        let unsigned = build(&explorer, &outputs, request).await.unwrap();
        assert_eq!(unsigned.fee_litoshi(), 92_000_000);
        assert_eq!(unsigned.tx.output[1].value.to_sat(), 7_000_000);
    }

    #[tokio::test]
    async fn inputs_keep_selection_order_despite_completion_order() {
        let (mut explorer, outputs) = fixture(&[1_000, 2_000, 3_000]);
        // First input finishes last.
        explorer.delays_ms.insert(outputs[0].txid.clone(), 60);
        explorer.delays_ms.insert(outputs[1].txid.clone(), 30);

        let request = TransactionRequest::new(recipient(), 5_500).with_fee(0);
        let unsigned = build(&explorer, &outputs, request).await.unwrap();

        let order: Vec<String> = unsigned
            .tx
            .input
            .iter()
            .map(|txin| txin.previous_output.txid.to_string())
            .collect();
        let expected: Vec<String> = outputs.iter().map(|o| o.txid.clone()).collect();
        assert_eq!(order, expected);
        assert_eq!(explorer.fetches.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn single_fetch_failure_aborts() {
        let (mut explorer, outputs) = fixture(&[1_000, 2_000]);
        explorer.fail_txid = Some(outputs[1].txid.clone());

        let request = TransactionRequest::new(recipient(), 2_500).with_fee(0);
        let result = build(&explorer, &outputs, request).await;
        assert!(matches!(result, Err(ProviderError::NetworkFailure(_))));
    }

    #[tokio::test]
    async fn invalid_destination_fails_before_fetching() {
        let (explorer, outputs) = fixture(&[5_000_000]);
        let request = TransactionRequest::new("bc1qw508d6qejxtdg4y5r3zarvary0c5xw7kv8f3t4", 1_000)
            .with_fee(0);
        let result = build(&explorer, &outputs, request).await;

        assert!(matches!(result, Err(ProviderError::InvalidAddress(_))));
        assert_eq!(explorer.fetches.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn undecodable_prior_transaction_aborts() {
        let (mut explorer, outputs) = fixture(&[5_000_000]);
        explorer.raw_txs.insert(outputs[0].txid.clone(), vec![0xde, 0xad]);

        let request = TransactionRequest::new(recipient(), 1_000).with_fee(0);
        let result = build(&explorer, &outputs, request).await;
        assert!(matches!(result, Err(ProviderError::Transaction(_))));
    }

    #[tokio::test]
    async fn zero_amount_and_fee_is_rejected_up_front() {
        let (explorer, outputs) = fixture(&[5_000]);
        let request = TransactionRequest::new(recipient(), 0).with_fee(0);
        let result = build(&explorer, &outputs, request).await;

        match result {
            Err(ProviderError::Transaction(msg)) => assert!(msg.contains("nothing to spend"), "{msg}"),
            other => panic!("unexpected result: {other:?}"),
        }
        assert_eq!(explorer.fetches.load(Ordering::SeqCst), 0);
    }
}
