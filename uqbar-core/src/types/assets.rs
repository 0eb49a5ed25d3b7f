use std::collections::BTreeMap;

use ethers_core::types::U256;
use serde::Deserialize;
use serde_json::Value;

use crate::utils::ud;
use crate::FormatError;

/// Fungible or non-fungible
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TokenType {
    /// Fungible token
    #[default]
    Token,
    /// NFT
    Nft,
}

/// Mutable data of a token item
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct TokenData {
    /// Balance in base units, fungible tokens only
    #[serde(default, deserialize_with = "ud::deserialize_opt_u256")]
    pub balance: Option<U256>,
    /// Id of the token's metadata item
    #[serde(default)]
    pub metadata: String,
    /// Item id within the collection, NFTs only
    #[serde(default, deserialize_with = "ud::deserialize_opt_u256")]
    pub id: Option<U256>,
}

/// A token item held by one of the wallet's accounts.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct Token {
    /// Item id
    pub id: String,
    /// Contract that owns the item
    #[serde(default)]
    pub contract: String,
    /// Account that holds the item; stamped from the enclosing book key
    #[serde(default)]
    pub holder: String,
    /// Town the item lives in
    #[serde(default)]
    pub town: String,
    /// Fungible or NFT
    #[serde(default)]
    pub token_type: TokenType,
    /// Item data
    #[serde(default)]
    pub data: TokenData,
}

/// Tokens per holder, keyed by item id
pub type Assets = BTreeMap<String, BTreeMap<String, Token>>;

/// Decode a book update `{holder: {id: token}}`, stamping each token's
/// `holder` with its enclosing key.
pub fn assets_from_wire(value: &Value) -> Result<Assets, FormatError> {
    let book: BTreeMap<String, BTreeMap<String, Token>> =
        serde_json::from_value(value.clone()).map_err(|e| FormatError::malformed("book", e))?;
    Ok(book
        .into_iter()
        .map(|(holder, tokens)| {
            let tokens = tokens
                .into_iter()
                .map(|(id, token)| {
                    (
                        id,
                        Token {
                            holder: holder.clone(),
                            ..token
                        },
                    )
                })
                .collect();
            (holder, tokens)
        })
        .collect())
}

/// Find the token an account holds for `contract`
pub fn find_token<'a>(assets: &'a Assets, holder: &str, contract: &str) -> Option<&'a Token> {
    assets
        .get(holder)
        .and_then(|tokens| tokens.values().find(|t| t.contract == contract))
}

/// Descriptive data of a token contract
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct TokenMetadataData {
    /// Display name
    #[serde(default)]
    pub name: Option<String>,
    /// Ticker
    #[serde(default)]
    pub symbol: Option<String>,
    /// Decimal places of the base unit
    #[serde(default, deserialize_with = "ud::deserialize")]
    pub decimals: u64,
    /// Total supply
    #[serde(default, deserialize_with = "ud::deserialize_opt_u256")]
    pub supply: Option<U256>,
}

/// Metadata item of a token contract
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct TokenMetadata {
    /// Metadata item id
    #[serde(default)]
    pub id: String,
    /// Contract the metadata describes
    #[serde(default)]
    pub contract: String,
    /// Descriptive data
    #[serde(default)]
    pub data: TokenMetadataData,
}

impl TokenMetadata {
    /// Decimal places, clamped to what a `U256` amount can carry
    pub fn decimals(&self) -> u8 {
        self.data.decimals.min(77) as u8
    }
}

/// Token metadata keyed by metadata item id
pub type TokenMetadataStore = BTreeMap<String, TokenMetadata>;

/// Decode a metadata update or `/token-metadata` scry
pub fn metadata_from_wire(value: &Value) -> Result<TokenMetadataStore, FormatError> {
    serde_json::from_value(value.clone()).map_err(|e| FormatError::malformed("token metadata", e))
}
