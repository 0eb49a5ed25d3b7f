use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::utils::{add_hex_dots, ud};
use crate::{FormatError, TransactionStatus};

/// Hash-keyed collection of transactions
pub type Transactions = BTreeMap<String, Transaction>;

/// The action a transaction performs. Either free text (a raw noun for a
/// custom contract) or a structured action such as `{give: {...}}`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum TransactionAction {
    /// Free text action
    Text(String),
    /// Structured action keyed by action name
    Structured(Map<String, Value>),
}

impl Default for TransactionAction {
    fn default() -> Self {
        Self::Text(String::new())
    }
}

impl TransactionAction {
    /// Name of a structured action, e.g. `give` or `give-nft`
    pub fn name(&self) -> Option<&str> {
        match self {
            Self::Text(_) => None,
            Self::Structured(map) => map.keys().next().map(String::as_str),
        }
    }

    /// Recipient of a `give` or `give-nft` action
    pub fn give_target(&self) -> Option<&str> {
        let Self::Structured(map) = self else {
            return None;
        };
        map.get("give")
            .or_else(|| map.get("give-nft"))
            .and_then(|give| give.get("to"))
            .and_then(Value::as_str)
    }
}

/// Execution output attached to a finished transaction
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TransactionOutput {
    /// Execution error code, `0` on success
    #[serde(default, deserialize_with = "ud::deserialize")]
    pub errorcode: u64,
    /// Gas spent
    #[serde(default, deserialize_with = "ud::deserialize")]
    pub gas: u64,
}

/// A transaction known to the wallet.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Transaction {
    /// Dotted hex hash; never changes
    pub hash: String,
    /// Current status
    pub status: TransactionStatus,
    /// Nonce of the sending account in `town`
    pub nonce: u64,
    /// Gas price
    pub rate: u64,
    /// Gas limit
    pub budget: u64,
    /// Sending account (dotted hex)
    pub from: String,
    /// Contract being called (dotted hex)
    pub contract: String,
    /// Town (chain) id, dotted hex
    pub town: String,
    /// What the transaction does
    pub action: TransactionAction,
    /// Execution output, once executed
    pub output: Option<TransactionOutput>,
    /// First time the wallet saw the transaction outside the pending map
    pub created: Option<DateTime<Utc>>,
    /// Last status change
    pub modified: Option<DateTime<Utc>>,
}

#[derive(Debug, Deserialize)]
struct WireFields {
    #[serde(default)]
    hash: Option<String>,
    #[serde(deserialize_with = "ud::deserialize")]
    status: u64,
    #[serde(default, deserialize_with = "ud::deserialize")]
    nonce: u64,
    #[serde(default, deserialize_with = "ud::deserialize")]
    rate: u64,
    #[serde(default, deserialize_with = "ud::deserialize")]
    budget: u64,
    #[serde(default)]
    from: String,
    #[serde(default)]
    contract: String,
    #[serde(default)]
    town: String,
    #[serde(default)]
    action: TransactionAction,
    #[serde(default)]
    output: Option<TransactionOutput>,
}

#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum WireEntry {
    Wrapped {
        transaction: WireFields,
        #[serde(default)]
        output: Option<TransactionOutput>,
    },
    Flat(WireFields),
}

impl Transaction {
    /// Decode the fields of a transaction as delivered by the backend, keyed
    /// externally by `hash`. Numbers may be dot-grouped strings or JSON
    /// numbers, and the fields may be wrapped as `{transaction, output}`.
    pub fn from_wire(hash: &str, value: &Value) -> Result<Self, FormatError> {
        let entry = WireEntry::deserialize(value)
            .map_err(|e| FormatError::malformed("transaction", e))?;
        let (fields, output) = match entry {
            WireEntry::Wrapped {
                transaction,
                output,
            } => {
                let output = output.or_else(|| transaction.output.clone());
                (transaction, output)
            }
            WireEntry::Flat(fields) => {
                let output = fields.output.clone();
                (fields, output)
            }
        };
        let status = u16::try_from(fields.status)
            .map_err(|_| FormatError::InvalidNumber(fields.status.to_string()))?;
        let hash = fields.hash.as_deref().unwrap_or(hash);
        Ok(Self {
            hash: add_hex_dots(hash),
            status: TransactionStatus::new(status),
            nonce: fields.nonce,
            rate: fields.rate,
            budget: fields.budget,
            from: fields.from,
            contract: fields.contract,
            town: fields.town,
            action: fields.action,
            output,
            created: None,
            modified: None,
        })
    }

    /// Decode a single `{hash: fields}` subscription event.
    pub fn from_event(event: &Value) -> Result<Self, FormatError> {
        let map = event
            .as_object()
            .ok_or_else(|| FormatError::malformed("transaction event", "not an object"))?;
        let (hash, fields) = map
            .iter()
            .next()
            .ok_or_else(|| FormatError::malformed("transaction event", "empty object"))?;
        Self::from_wire(hash, fields)
    }

    /// Decode a `{hash: fields}` map such as a `/pending/{address}` scry.
    pub fn map_from_wire(value: &Value) -> Result<Transactions, FormatError> {
        let Some(map) = value.as_object() else {
            return Ok(Transactions::new());
        };
        map.iter()
            .map(|(hash, fields)| {
                let txn = Self::from_wire(hash, fields)?;
                Ok((txn.hash.clone(), txn))
            })
            .collect()
    }
}

/// Transactions split for display in a history view.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TransactionGroups {
    /// Not yet executed
    pub pending: Vec<Transaction>,
    /// Executed, successfully or not
    pub finished: Vec<Transaction>,
    /// Rejected by the sequencer
    pub rejected: Vec<Transaction>,
}

/// Split transactions into pending, finished and rejected, preserving order.
pub fn group_transactions(transactions: &[Transaction]) -> TransactionGroups {
    let mut groups = TransactionGroups::default();
    for txn in transactions {
        if txn.status == TransactionStatus::REJECTED {
            groups.rejected.push(txn.clone());
        } else if txn.status.is_final() {
            groups.finished.push(txn.clone());
        } else {
            groups.pending.push(txn.clone());
        }
    }
    groups
}
