//! This crate contains core primitives, traits, and types for the Uqbar wallet
//! client.
//!
//! It is intended to be the common dependency of every other wallet crate. It
//! knows nothing about how state is stored or how a user interacts with the
//! wallet; it only describes the data coming off the wire, the payloads we
//! send back, and the capabilities (`ChainClient`, `TransactionSigner`) the
//! rest of the workspace is written against.

#![warn(missing_docs)]
#![forbid(unsafe_code)]

pub use ethers_core::types::{Address, Signature, H256, U256};

pub use error::*;
pub use traits::*;
pub use types::*;

/// Formatting helpers for the dot-grouped wire encodings
pub mod utils;

mod error;
mod traits;
mod types;

/// Name of the wallet agent on the node
pub const WALLET_APP: &str = "wallet";
/// Mark used for every wallet poke
pub const WALLET_POKE_MARK: &str = "zig-wallet-poke";
/// Address that accepts tokens to be burned
pub const BURN_ADDRESS: &str = "0x0";
