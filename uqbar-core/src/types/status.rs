use std::fmt::{Display, Formatter};

use serde::{Deserialize, Serialize};

/// Result of executing a transaction, the last two digits of a final status
/// code.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, strum::Display, strum::FromRepr)]
#[repr(u16)]
pub enum ExecutionOutcome {
    /// x00
    #[strum(to_string = "successfully performed")]
    Success = 0,
    /// x01
    #[strum(to_string = "bad signature")]
    BadSignature = 1,
    /// x02
    #[strum(to_string = "incorrect nonce")]
    IncorrectNonce = 2,
    /// x03
    #[strum(to_string = "lack zigs to fulfill budget")]
    InsufficientBudget = 3,
    /// x04
    #[strum(to_string = "couldn't find contract")]
    ContractNotFound = 4,
    /// x05
    #[strum(to_string = "data was under contract ID")]
    DataUnderContractId = 5,
    /// x06
    #[strum(to_string = "crash in contract execution")]
    ContractCrashed = 6,
    /// x07
    #[strum(to_string = "validation of diff failed")]
    DiffValidationFailed = 7,
    /// x08
    #[strum(to_string = "ran out of gas while executing")]
    OutOfGas = 8,
    /// x09
    #[strum(to_string = "dedicated burn transaction failed")]
    BurnFailed = 9,
}

/// Status code of a transaction as reported by the wallet backend.
///
/// Codes below 200 describe the transaction's progress towards the
/// sequencer. Codes in the 200 range are executed-unbatched, codes in the 300
/// range executed-batched; the last two digits carry the `ExecutionOutcome`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TransactionStatus(u16);

impl TransactionStatus {
    /// Generated, waiting for a signature
    pub const PENDING: Self = Self(100);
    /// Submitted to the sequencer
    pub const SUBMITTED: Self = Self(101);
    /// Received by the sequencer
    pub const RECEIVED: Self = Self(102);
    /// Rejected by the sequencer
    pub const REJECTED: Self = Self(103);
    /// Executed, unbatched
    pub const SUCCESS: Self = Self(200);
    /// Executed and batched
    pub const SUCCESS_BATCHED: Self = Self(300);

    /// Wrap a raw status code
    pub const fn new(code: u16) -> Self {
        Self(code)
    }

    /// The raw status code
    pub const fn code(self) -> u16 {
        self.0
    }

    /// Still waiting to be signed by the user
    pub fn is_awaiting_signature(self) -> bool {
        self == Self::PENDING
    }

    /// Still on its way to the sequencer
    pub fn is_in_progress(self) -> bool {
        self.0 <= 102
    }

    /// Executed, successfully or not
    pub fn is_final(self) -> bool {
        self.0 >= 200
    }

    /// Executed successfully
    pub fn is_success(self) -> bool {
        self == Self::SUCCESS || self == Self::SUCCESS_BATCHED
    }

    /// Part of a batch
    pub fn is_batched(self) -> bool {
        (300..400).contains(&self.0)
    }

    /// The execution outcome, for final statuses with a known outcome digit
    pub fn outcome(self) -> Option<ExecutionOutcome> {
        match self.0 {
            200..=299 | 300..=399 => ExecutionOutcome::from_repr(self.0 % 100),
            _ => None,
        }
    }

    /// Human readable description of the status
    pub fn description(self) -> String {
        match self.0 {
            100 => "pending in wallet".to_owned(),
            101 => "submitted to sequencer".to_owned(),
            102 => "received by sequencer".to_owned(),
            103 => "failure: rejected by sequencer".to_owned(),
            _ => self
                .outcome()
                .map(|o| o.to_string())
                .unwrap_or_else(|| "unknown".to_owned()),
        }
    }
}

impl Display for TransactionStatus {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.description())
    }
}
