use ethers_core::types::U256;
use serde::Serialize;

use crate::utils::ud;
use crate::WalletSignature;

/// Gas settings for a submission
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Gas {
    /// Gas price
    pub rate: u64,
    /// Gas limit
    pub bud: u64,
}

/// Structured action carried by a `transaction` poke
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum PokeAction {
    /// Transfer fungible tokens
    Give {
        /// Recipient, dotted hex
        to: String,
        /// Amount in base units
        #[serde(serialize_with = "ud::serialize_u256_dec")]
        amount: U256,
        /// Token item id of the sender's holding
        item: String,
    },
    /// Transfer an NFT
    GiveNft {
        /// Recipient, dotted hex
        to: String,
        /// NFT item id
        item: String,
    },
    /// Free text noun for a custom contract call
    Text(String),
}

/// Every command the wallet agent accepts. Serializes to the wire shape
/// `{"<action-name>": {...}}`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum WalletPoke {
    /// Create a new hot wallet on the node
    GenerateHotWallet {
        /// Seed password
        password: String,
        /// Nickname of the first address
        nick: String,
    },
    /// Derive another address from the node's seed
    DeriveNewAddress {
        /// BIP-32 path
        hdpath: String,
        /// Nickname
        nick: String,
    },
    /// Restore a hot wallet from a mnemonic
    ImportSeed {
        /// BIP-39 mnemonic
        mnemonic: String,
        /// Seed password
        password: String,
        /// Nickname
        nick: String,
    },
    /// Track an address whose key lives elsewhere
    AddTrackedAddress {
        /// Dotted address
        address: String,
        /// Nickname; `nick//type` for imported signers
        nick: String,
    },
    /// Rename an address
    EditNickname {
        /// Dotted address
        address: String,
        /// New nickname
        nick: String,
    },
    /// Forget an address
    DeleteAddress {
        /// Dotted address
        address: String,
    },
    /// Choose the sequencer node for a town
    SetNode {
        /// Town id
        town: u64,
        /// Node ship name
        ship: String,
    },
    /// Choose the indexer
    SetIndexer {
        /// Indexer ship name
        ship: String,
    },
    /// Generate an unsigned transaction
    Transaction {
        /// Sender; omitted for custom actions that need none
        #[serde(skip_serializing_if = "Option::is_none")]
        from: Option<String>,
        /// Contract to call
        contract: String,
        /// Town id, dotted hex
        town: String,
        /// What to do
        action: PokeAction,
    },
    /// Submit a transaction signed outside the node
    SubmitSigned {
        /// Sender
        from: String,
        /// Pending hash
        hash: String,
        /// Gas
        gas: Gas,
        /// Dotted EIP-191 digest of the signed message
        #[serde(rename = "eth-hash", skip_serializing_if = "Option::is_none")]
        eth_hash: Option<String>,
        /// Signature
        sig: WalletSignature,
    },
    /// Have the node sign and submit with its own key
    Submit {
        /// Sender
        from: String,
        /// Pending hash
        hash: String,
        /// Gas
        gas: Gas,
    },
    /// Discard an unsigned transaction
    DeletePending {
        /// Sender
        from: String,
        /// Pending hash
        hash: String,
    },
}

impl WalletPoke {
    /// Wire name of the command
    pub fn name(&self) -> &'static str {
        match self {
            Self::GenerateHotWallet { .. } => "generate-hot-wallet",
            Self::DeriveNewAddress { .. } => "derive-new-address",
            Self::ImportSeed { .. } => "import-seed",
            Self::AddTrackedAddress { .. } => "add-tracked-address",
            Self::EditNickname { .. } => "edit-nickname",
            Self::DeleteAddress { .. } => "delete-address",
            Self::SetNode { .. } => "set-node",
            Self::SetIndexer { .. } => "set-indexer",
            Self::Transaction { .. } => "transaction",
            Self::SubmitSigned { .. } => "submit-signed",
            Self::Submit { .. } => "submit",
            Self::DeletePending { .. } => "delete-pending",
        }
    }
}

#[cfg(test)]
mod test {
    use serde_json::json;

    use super::*;

    #[test]
    fn serializes_transaction_pokes() {
        let poke = WalletPoke::Transaction {
            from: Some("0xaaaa".into()),
            contract: "0x74.6f6b".into(),
            town: "0x0".into(),
            action: PokeAction::Give {
                to: "0xbbbb".into(),
                amount: U256::exp10(20),
                item: "0x1".into(),
            },
        };
        assert_eq!(
            serde_json::to_value(&poke).unwrap(),
            json!({
                "transaction": {
                    "from": "0xaaaa",
                    "contract": "0x74.6f6b",
                    "town": "0x0",
                    "action": {
                        "give": { "to": "0xbbbb", "amount": "100000000000000000000", "item": "0x1" }
                    }
                }
            })
        );

        let custom = WalletPoke::Transaction {
            from: None,
            contract: "0x1".into(),
            town: "0x0".into(),
            action: PokeAction::Text("[%foo 1]".into()),
        };
        assert_eq!(
            serde_json::to_value(&custom).unwrap(),
            json!({ "transaction": { "contract": "0x1", "town": "0x0", "action": { "text": "[%foo 1]" } } })
        );

        let nft = PokeAction::GiveNft {
            to: "0xbbbb".into(),
            item: "0x2".into(),
        };
        assert_eq!(
            serde_json::to_value(&nft).unwrap(),
            json!({ "give-nft": { "to": "0xbbbb", "item": "0x2" } })
        );
    }

    #[test]
    fn serializes_submissions() {
        let poke = WalletPoke::SubmitSigned {
            from: "0xaaaa".into(),
            hash: "0x1234".into(),
            gas: Gas { rate: 1, bud: 1_000_000 },
            eth_hash: Some("0xbeef".into()),
            sig: WalletSignature {
                v: 27,
                r: "0x1".into(),
                s: "0x2".into(),
            },
        };
        assert_eq!(poke.name(), "submit-signed");
        assert_eq!(
            serde_json::to_value(&poke).unwrap(),
            json!({
                "submit-signed": {
                    "from": "0xaaaa",
                    "hash": "0x1234",
                    "gas": { "rate": 1, "bud": 1_000_000 },
                    "eth-hash": "0xbeef",
                    "sig": { "v": 27, "r": "0x1", "s": "0x2" }
                }
            })
        );

        let delete = WalletPoke::DeletePending {
            from: "0xaaaa".into(),
            hash: "0x1234".into(),
        };
        assert_eq!(
            serde_json::to_value(&delete).unwrap(),
            json!({ "delete-pending": { "from": "0xaaaa", "hash": "0x1234" } })
        );
    }
}
