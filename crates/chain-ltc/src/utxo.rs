use serde::{Deserialize, Serialize};

use crate::error::LtcError;

/// A single unspent transaction output owned by the wallet.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SpendableOutput {
    /// Transaction ID as a hex string (big-endian / display order).
    pub txid: String,
    /// Output index within the transaction.
    pub vout: u32,
    /// Value in litoshi.
    pub value_litoshi: u64,
}

/// Result of output selection: the chosen outputs and their aggregate value.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OutputSelection {
    /// The selected outputs, in the order the source returned them.
    pub selected: Vec<SpendableOutput>,
    /// Total value of the selected outputs in litoshi.
    pub total_litoshi: u64,
    /// Amount plus fee the selection had to cover.
    pub required_litoshi: u64,
}

impl OutputSelection {
    /// Surplus that goes back to the sender. Zero means no change output.
    pub fn change_litoshi(&self) -> u64 {
        self.total_litoshi - self.required_litoshi
    }
}

/// Select outputs to cover `amount_litoshi + fee_litoshi`.
///
/// First-fit: walks `outputs` in the order given and stops as soon as the
/// running total covers the requirement. No sorting and no attempt to
/// minimize the number of inputs or the leftover change.
pub fn select_outputs(
    outputs: &[SpendableOutput],
    amount_litoshi: u64,
    fee_litoshi: u64,
) -> Result<OutputSelection, LtcError> {
    let required_litoshi = amount_litoshi.checked_add(fee_litoshi).ok_or_else(|| {
        LtcError::TransactionBuildError("amount plus fee overflows u64".into())
    })?;
    if required_litoshi == 0 {
        return Err(LtcError::TransactionBuildError(
            "nothing to spend: amount and fee are both zero".into(),
        ));
    }

    let mut selected = Vec::new();
    let mut total_litoshi: u64 = 0;

    for output in outputs {
        if total_litoshi >= required_litoshi {
            break;
        }
        selected.push(output.clone());
        total_litoshi = total_litoshi.saturating_add(output.value_litoshi);
    }

    if total_litoshi < required_litoshi {
        return Err(LtcError::InsufficientFunds {
            needed: required_litoshi,
            available: total_litoshi,
        });
    }

    Ok(OutputSelection {
        selected,
        total_litoshi,
        required_litoshi,
    })
}
