//! The wallet client: an observable store of accounts, assets and
//! transactions, transaction generation, the signers an address can be
//! signed for with, and the flow that takes a pending transaction from
//! signature to submission.
//!
//! [`Wallet`] is the controller. It owns a [`WalletStore`] and talks to the
//! wallet agent through a [`uqbar_core::ChainClient`]. A [`SigningFlow`]
//! borrows a shared controller to sign one transaction at a time.

#![warn(missing_docs)]
#![forbid(unsafe_code)]

pub use error::{ValidationError, WalletError};
pub use generation::{select_pending_hash, TransactionRequest};
pub use keyring::{decrypt_secret, encrypt_private_key, encrypt_secret, KdfParams, KeyRing};
pub use message::TransactionMessage;
pub use nickname::NicknameEditor;
pub use signers::{
    resolve_signer, BrowserExtensionSigner, HardwareSigner, LocalKeySigner, SignerProviders,
    SignerSelection, WalletConnectSigner,
};
pub use signing::{Confirmation, SigningFlow, SigningState};
pub use store::{Notification, TransactionUpdate, WalletState, WalletStore};
pub use wallet::Wallet;

mod error;
mod generation;
mod keyring;
mod message;
mod nickname;
mod signers;
mod signing;
mod store;
mod wallet;

#[cfg(test)]
mod tests;
