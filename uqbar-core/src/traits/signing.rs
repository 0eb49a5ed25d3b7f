use std::fmt::Debug;

use async_trait::async_trait;
use auto_impl::auto_impl;
use ethers_core::types::{Signature, H256};
use serde_json::Value;

use crate::WalletSignature;

pub use hashes::{hash_message, keccak256};

/// An error incurred while obtaining a signature
#[derive(thiserror::Error, Debug)]
pub enum SignerError {
    /// The key for this address is encrypted and has not been unlocked
    #[error("Wallet {0} is locked")]
    Locked(String),
    /// The remote session is bound to a different account
    #[error("Connected account {connected} does not match {expected}")]
    WrongAccount {
        /// Account the session is bound to
        connected: String,
        /// Account that has to sign
        expected: String,
    },
    /// The user or the provider declined to sign
    #[error("{0}")]
    Rejected(String),
    /// No provider of the required kind is available
    #[error("No {0} provider is available")]
    Unavailable(String),
    /// The provider returned something that is not a signature
    #[error("Malformed signature: {0}")]
    MalformedSignature(String),
    /// Any other error
    #[error(transparent)]
    Other(#[from] Box<dyn std::error::Error + Send + Sync>),
}

/// The family of a signer, for logging and submission details
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, strum::Display)]
#[strum(serialize_all = "kebab-case")]
pub enum SignerKind {
    /// In-memory plaintext key
    HotKey,
    /// In-memory key unlocked from an encrypted wallet
    EncryptedKey,
    /// Injected EIP-1193 provider
    BrowserExtension,
    /// WalletConnect session
    WalletConnect,
    /// Hardware device
    Hardware,
}

impl SignerKind {
    /// The backend is told the signed digest for signatures made outside
    /// this process
    pub fn submits_eth_hash(self) -> bool {
        !matches!(self, Self::HotKey | Self::EncryptedKey)
    }
}

/// What a signer is asked to sign
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SigningRequest {
    /// Signing address, dots removed
    pub address: String,
    /// Canonical JSON message
    pub message: String,
    /// EIP-191 digest of `message`
    pub eth_hash: H256,
}

impl SigningRequest {
    /// Build a request, hashing the message
    pub fn new(address: impl Into<String>, message: impl Into<String>) -> Self {
        let message = message.into();
        Self {
            address: address.into(),
            eth_hash: hash_message(&message),
            message,
        }
    }
}

/// Something that can sign transaction messages for one address.
#[async_trait]
#[auto_impl(&, Box, Arc)]
pub trait TransactionSigner: Send + Sync + Debug {
    /// Signer family
    fn kind(&self) -> SignerKind;

    /// Sign the request's message
    async fn sign_transaction(&self, request: &SigningRequest) -> Result<WalletSignature, SignerError>;
}

/// An injected browser wallet speaking EIP-1193 `request`.
#[async_trait]
#[auto_impl(&, Box, Arc)]
pub trait Eip1193Provider: Send + Sync + Debug {
    /// Issue a JSON-RPC request
    async fn request(&self, method: &str, params: Vec<Value>) -> Result<Value, SignerError>;
}

/// A paired WalletConnect session.
#[async_trait]
#[auto_impl(&, Box, Arc)]
pub trait WalletConnectSession: Send + Sync + Debug {
    /// Accounts the session is bound to
    fn accounts(&self) -> Vec<String>;

    /// Issue a JSON-RPC request to the remote wallet
    async fn request(&self, method: &str, params: Vec<Value>) -> Result<Value, SignerError>;
}

/// A hardware wallet that signs raw digests.
#[async_trait]
#[auto_impl(&, Box, Arc)]
pub trait HardwareDevice: Send + Sync + Debug {
    /// Address at `hdpath`, or at the device's default path
    async fn address(&self, hdpath: Option<&str>) -> Result<String, SignerError>;

    /// Sign `digest` with the key for `address`
    async fn sign_digest(&self, address: &str, digest: H256) -> Result<Signature, SignerError>;
}

mod hashes {
    use ethers_core::types::H256;
    use tiny_keccak::{Hasher, Keccak};

    const PREFIX: &str = "\x19Ethereum Signed Message:\n";

    /// Hash a message according to EIP-191.
    ///
    /// The data is a UTF-8 encoded string and will enveloped as follows:
    /// `"\x19Ethereum Signed Message:\n" + message.length + message` and hashed
    /// using keccak256.
    pub fn hash_message<S>(message: S) -> H256
    where
        S: AsRef<[u8]>,
    {
        let message = message.as_ref();

        let mut eth_message = format!("{PREFIX}{}", message.len()).into_bytes();
        eth_message.extend_from_slice(message);
        keccak256(&eth_message).into()
    }

    /// Compute the Keccak-256 hash of input bytes.
    pub fn keccak256<S>(bytes: S) -> [u8; 32]
    where
        S: AsRef<[u8]>,
    {
        let mut output = [0u8; 32];
        let mut hasher = Keccak::v256();
        hasher.update(bytes.as_ref());
        hasher.finalize(&mut output);
        output
    }

    #[test]
    fn matches_personal_sign_framing() {
        assert_eq!(
            ethers_core::utils::hash_message(b"{\"contract\":\"0x1\"}"),
            hash_message(b"{\"contract\":\"0x1\"}")
        );
        assert_eq!(
            ethers_core::utils::hash_message("uqbar"),
            hash_message("uqbar")
        );
    }
}
