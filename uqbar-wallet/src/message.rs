use serde::Serialize;
use uqbar_core::utils::remove_dots;
use uqbar_core::{FormatError, Gas, Transaction};

/// The message an external signer signs for a pending transaction. Field
/// order is part of the format.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TransactionMessage {
    /// Recipient of a give, otherwise the contract repeated twice
    pub contract: String,
    /// Hex gas price
    pub gas_price: String,
    /// Even-length hex gas limit
    pub gas_limit: String,
    /// Sender nonce
    pub nonce: u64,
    /// Town id
    pub chain_id: u64,
    /// Even-length hex transaction hash
    pub data: String,
}

impl TransactionMessage {
    /// Build the message for the pending transaction `hash` at `gas`.
    pub fn new(hash: &str, txn: &Transaction, gas: Gas) -> Result<Self, FormatError> {
        let contract = match txn.action.give_target() {
            Some(to) => remove_dots(to),
            None => {
                let contract = remove_dots(&txn.contract);
                let contract = contract.trim_start_matches("0x");
                format!("0x{contract}{contract}")
            }
        };
        let town = remove_dots(&txn.town);
        let town = town.trim_start_matches("0x");
        let chain_id = if town.is_empty() {
            0
        } else {
            u64::from_str_radix(town, 16).map_err(|_| FormatError::InvalidHex(txn.town.clone()))?
        };
        Ok(Self {
            contract,
            gas_price: format!("0x{:x}", gas.rate),
            gas_limit: even_hex(&format!("{:x}", gas.bud)),
            nonce: txn.nonce,
            chain_id,
            data: even_hex(remove_dots(hash).trim_start_matches("0x")),
        })
    }

    /// Canonical JSON text that gets signed
    pub fn encode(&self) -> Result<String, FormatError> {
        serde_json::to_string(self).map_err(|e| FormatError::malformed("transaction message", e))
    }
}

fn even_hex(digits: &str) -> String {
    if digits.len() % 2 == 0 {
        format!("0x{digits}")
    } else {
        format!("0x0{digits}")
    }
}

#[cfg(test)]
mod test {
    use serde_json::json;

    use super::*;

    #[test]
    fn give_uses_recipient() {
        let txn = Transaction::from_wire(
            "0x1.2345",
            &json!({
                "status": "100",
                "nonce": "7",
                "from": "0xaaaa",
                "contract": "0x74.6f6b",
                "town": "0x1",
                "action": { "give": { "to": "0xbe.ef00", "amount": "5", "item": "0x1" } }
            }),
        )
        .unwrap();
        let message = TransactionMessage::new(&txn.hash, &txn, Gas { rate: 1, bud: 1_000_000 }).unwrap();
        assert_eq!(
            message.encode().unwrap(),
            r#"{"contract":"0xbeef00","gasPrice":"0x1","gasLimit":"0x0f4240","nonce":7,"chainId":1,"data":"0x012345"}"#
        );
    }

    #[test]
    fn custom_actions_repeat_the_contract() {
        let txn = Transaction::from_wire(
            "0xabcd",
            &json!({ "status": 100, "contract": "0x74.6f6b", "town": "0x0", "action": "[%foo ~]" }),
        )
        .unwrap();
        let message = TransactionMessage::new("0xab.cd", &txn, Gas { rate: 16, bud: 0 }).unwrap();
        assert_eq!(message.contract, "0x746f6b746f6b");
        assert_eq!(message.gas_price, "0x10");
        assert_eq!(message.gas_limit, "0x00");
        assert_eq!(message.chain_id, 0);
        assert_eq!(message.data, "0xabcd");
    }

    #[test]
    fn bad_town_is_an_error() {
        let txn = Transaction::from_wire("0x1", &json!({ "status": 100, "town": "0xzz" })).unwrap();
        assert!(TransactionMessage::new("0x1", &txn, Gas { rate: 1, bud: 1 }).is_err());
    }
}
