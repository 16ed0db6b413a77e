use bitcoin::absolute::LockTime;
use bitcoin::opcodes::all::OP_RETURN;
use bitcoin::script::{Builder, PushBytesBuf, ScriptBuf};
use bitcoin::transaction::Version;
use bitcoin::{Amount, OutPoint, Sequence, Transaction, TxIn, TxOut, Txid, Witness};
use serde::{Deserialize, Serialize};

use crate::error::LtcError;
use crate::utxo::{OutputSelection, SpendableOutput};

/// A payment the wallet has been asked to make.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TransactionRequest {
    pub destination: String,
    pub amount_litoshi: u64,
    /// Falls back to the provider's default fee when absent.
    #[serde(default)]
    pub fee_litoshi: Option<u64>,
    #[serde(default)]
    pub memo: Option<String>,
}

impl TransactionRequest {
    pub fn new(destination: impl Into<String>, amount_litoshi: u64) -> Self {
        Self {
            destination: destination.into(),
            amount_litoshi,
            fee_litoshi: None,
            memo: None,
        }
    }

    pub fn with_fee(mut self, fee_litoshi: u64) -> Self {
        self.fee_litoshi = Some(fee_litoshi);
        self
    }

    pub fn with_memo(mut self, memo: impl Into<String>) -> Self {
        self.memo = Some(memo.into());
        self
    }

    /// The fee to pay, `default_fee_litoshi` if none was given.
    pub fn fee_or(&self, default_fee_litoshi: u64) -> u64 {
        self.fee_litoshi.unwrap_or(default_fee_litoshi)
    }

    /// The memo, treating an empty string as no memo.
    pub fn memo(&self) -> Option<&str> {
        self.memo.as_deref().filter(|m| !m.is_empty())
    }
}

/// A selected output together with the full transaction that created it.
#[derive(Debug, Clone)]
pub struct FundingInput {
    pub output: SpendableOutput,
    pub prev_tx: Transaction,
}

impl FundingInput {
    /// The output being spent, as recorded in the prior transaction.
    pub fn prevout(&self) -> Result<&TxOut, LtcError> {
        self.prev_tx
            .output
            .get(self.output.vout as usize)
            .ok_or_else(|| {
                LtcError::TransactionBuildError(format!(
                    "{} has no output {}",
                    self.output.txid, self.output.vout
                ))
            })
    }
}

/// An unsigned Litecoin transaction ready for signing.
#[derive(Debug, Clone)]
pub struct UnsignedLtcTx {
    /// The transaction with empty script sigs and witnesses.
    pub tx: Transaction,
    /// One entry per transaction input, in the same order.
    pub inputs: Vec<FundingInput>,
}

impl UnsignedLtcTx {
    pub fn total_input_litoshi(&self) -> u64 {
        self.inputs.iter().map(|i| i.output.value_litoshi).sum()
    }

    pub fn total_output_litoshi(&self) -> u64 {
        self.tx.output.iter().map(|o| o.value.to_sat()).sum()
    }

    /// Implicit fee: inputs minus outputs.
    pub fn fee_litoshi(&self) -> u64 {
        self.total_input_litoshi() - self.total_output_litoshi()
    }
}

/// Decode a consensus-serialized transaction.
pub fn decode_raw_transaction(raw: &[u8]) -> Result<Transaction, LtcError> {
    bitcoin::consensus::deserialize(raw)
        .map_err(|e| LtcError::TransactionBuildError(format!("undecodable prior transaction: {e}")))
}

/// Build a zero-value `OP_RETURN <memo>` script.
pub fn memo_script(memo: &[u8]) -> Result<ScriptBuf, LtcError> {
    let data = PushBytesBuf::try_from(memo.to_vec())
        .map_err(|e| LtcError::TransactionBuildError(format!("memo too large: {e}")))?;
    Ok(Builder::new()
        .push_opcode(OP_RETURN)
        .push_slice(&data)
        .into_script())
}

/// Check a prior transaction against the output it is supposed to fund.
fn attach_prior(output: &SpendableOutput, prev_tx: Transaction) -> Result<FundingInput, LtcError> {
    let txid: Txid = output
        .txid
        .parse()
        .map_err(|e| LtcError::TransactionBuildError(format!("invalid txid {}: {e}", output.txid)))?;

    if prev_tx.compute_txid() != txid {
        return Err(LtcError::TransactionBuildError(format!(
            "prior transaction does not match txid {txid}"
        )));
    }

    let prevout = prev_tx.output.get(output.vout as usize).ok_or_else(|| {
        LtcError::TransactionBuildError(format!("{txid} has no output {}", output.vout))
    })?;

    if prevout.value.to_sat() != output.value_litoshi {
        return Err(LtcError::TransactionBuildError(format!(
            "{txid}:{} is worth {} litoshi, source reported {}",
            output.vout,
            prevout.value.to_sat(),
            output.value_litoshi
        )));
    }

    Ok(FundingInput {
        output: output.clone(),
        prev_tx,
    })
}

/// Assemble an unsigned transaction from a completed selection.
///
/// `prev_txs` must hold the full prior transaction of each selected output,
/// in selection order. Outputs are emitted as destination, then change when
/// the selection has a surplus, then the memo when one is given.
pub fn assemble_transaction(
    selection: &OutputSelection,
    prev_txs: Vec<Transaction>,
    destination: ScriptBuf,
    amount_litoshi: u64,
    change: ScriptBuf,
    memo: Option<&str>,
) -> Result<UnsignedLtcTx, LtcError> {
    if selection.selected.is_empty() {
        return Err(LtcError::TransactionBuildError("no inputs selected".into()));
    }
    if prev_txs.len() != selection.selected.len() {
        return Err(LtcError::TransactionBuildError(format!(
            "expected {} prior transactions, got {}",
            selection.selected.len(),
            prev_txs.len()
        )));
    }

    let inputs = selection
        .selected
        .iter()
        .zip(prev_txs)
        .map(|(output, prev_tx)| attach_prior(output, prev_tx))
        .collect::<Result<Vec<_>, _>>()?;

    let tx_inputs = inputs
        .iter()
        .map(|input| TxIn {
            previous_output: OutPoint::new(input.prev_tx.compute_txid(), input.output.vout),
            script_sig: ScriptBuf::new(),
            sequence: Sequence::MAX,
            witness: Witness::default(),
        })
        .collect();

    let mut outputs = vec![TxOut {
        value: Amount::from_sat(amount_litoshi),
        script_pubkey: destination,
    }];

    let change_litoshi = selection.change_litoshi();
    if change_litoshi > 0 {
        outputs.push(TxOut {
            value: Amount::from_sat(change_litoshi),
            script_pubkey: change,
        });
    }

    if let Some(memo) = memo.filter(|m| !m.is_empty()) {
        outputs.push(TxOut {
            value: Amount::ZERO,
            script_pubkey: memo_script(memo.as_bytes())?,
        });
    }

    let tx = Transaction {
        version: Version::TWO,
        lock_time: LockTime::ZERO,
        input: tx_inputs,
        output: outputs,
    };

    Ok(UnsignedLtcTx { tx, inputs })
}
