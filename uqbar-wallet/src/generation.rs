use std::collections::HashSet;

use ethers_core::types::U256;
use uqbar_core::utils::{add_hex_dots, display_token_amount, is_valid_destination, remove_dots, scale_amount};
use uqbar_core::{PokeAction, Token, TokenMetadataStore, TokenType, Transaction, Transactions, WalletPoke};

use crate::ValidationError;

/// A transaction the user asked for
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TransactionRequest {
    /// Send some of a fungible token
    Token {
        /// Holding to send from
        token: Token,
        /// Recipient
        destination: String,
        /// Amount in display units, e.g. `"1.5"`
        amount: String,
    },
    /// Send an NFT
    Nft {
        /// Holding to send
        token: Token,
        /// Recipient
        destination: String,
    },
    /// Call a contract with a free text action
    Custom {
        /// Sender
        from: Option<String>,
        /// Contract to call
        contract: String,
        /// Town id
        town: String,
        /// Action noun
        action: String,
        /// Refuse to generate without a sender
        require_from: bool,
    },
}

impl TransactionRequest {
    /// Custom action that requires a sender
    pub fn custom(
        from: impl Into<String>,
        contract: impl Into<String>,
        town: impl Into<String>,
        action: impl Into<String>,
    ) -> Self {
        Self::Custom {
            from: Some(from.into()),
            contract: contract.into(),
            town: town.into(),
            action: action.into(),
            require_from: true,
        }
    }

    /// Check the request against the known token metadata and build the
    /// `transaction` poke for it. Nothing here touches the network.
    pub fn validate(&self, metadata: &TokenMetadataStore) -> Result<WalletPoke, ValidationError> {
        match self {
            Self::Token {
                token,
                destination,
                amount,
            } => {
                check_destination(destination)?;
                if token.token_type != TokenType::Token {
                    return Err(ValidationError::WrongTokenType(token.id.clone()));
                }
                let decimals = metadata
                    .get(&token.data.metadata)
                    .map(|m| m.decimals())
                    .unwrap_or_default();
                let amount = scale_amount(amount, decimals)
                    .map_err(|_| ValidationError::InvalidAmount(amount.clone()))?;
                if amount.is_zero() {
                    return Err(ValidationError::ZeroAmount);
                }
                let balance = token.data.balance.unwrap_or_else(U256::zero);
                if amount > balance {
                    return Err(ValidationError::InsufficientBalance {
                        balance: display_token_amount(balance, decimals),
                    });
                }
                Ok(WalletPoke::Transaction {
                    from: Some(token.holder.clone()),
                    contract: token.contract.clone(),
                    town: token.town.clone(),
                    action: PokeAction::Give {
                        to: add_hex_dots(destination.trim()),
                        amount,
                        item: token.id.clone(),
                    },
                })
            }
            Self::Nft { token, destination } => {
                check_destination(destination)?;
                if token.token_type != TokenType::Nft {
                    return Err(ValidationError::WrongTokenType(token.id.clone()));
                }
                Ok(WalletPoke::Transaction {
                    from: Some(token.holder.clone()),
                    contract: token.contract.clone(),
                    town: token.town.clone(),
                    action: PokeAction::GiveNft {
                        to: add_hex_dots(destination.trim()),
                        item: token.id.clone(),
                    },
                })
            }
            Self::Custom {
                from,
                contract,
                town,
                action,
                require_from,
            } => {
                let from = from.as_deref().map(str::trim).filter(|f| !f.is_empty());
                if *require_from && from.is_none() {
                    return Err(ValidationError::MissingFrom);
                }
                if contract.trim().is_empty() {
                    return Err(ValidationError::MissingContract);
                }
                Ok(WalletPoke::Transaction {
                    from: from.map(str::to_owned),
                    contract: add_hex_dots(contract.trim()),
                    town: add_hex_dots(town.trim()),
                    action: PokeAction::Text(action.replace('\n', "")),
                })
            }
        }
    }
}

fn check_destination(destination: &str) -> Result<(), ValidationError> {
    if is_valid_destination(destination) {
        Ok(())
    } else {
        Err(ValidationError::InvalidAddress(destination.to_owned()))
    }
}

/// Pick the transaction a poke just generated out of the refreshed pending
/// map: the lowest nonce sent from `from`, preferring hashes that were not
/// pending before the poke.
pub fn select_pending_hash(
    pending: &Transactions,
    from: Option<&str>,
    before: &HashSet<String>,
) -> Option<String> {
    let from = from.map(|f| remove_dots(f).to_lowercase());
    let candidates: Vec<&Transaction> = pending
        .values()
        .filter(|t| {
            from.as_ref()
                .map_or(true, |f| &remove_dots(&t.from).to_lowercase() == f)
        })
        .collect();
    lowest_nonce(candidates.iter().copied().filter(|t| !before.contains(&t.hash)))
        .or_else(|| lowest_nonce(candidates.iter().copied()))
}

fn lowest_nonce<'a>(txns: impl Iterator<Item = &'a Transaction>) -> Option<String> {
    txns.min_by_key(|t| t.nonce).map(|t| t.hash.clone())
}
