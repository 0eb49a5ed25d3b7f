use uqbar_base::PollExhausted;
use uqbar_core::{ChainClientError, FormatError, SignerError};

/// A transaction request that cannot be generated
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ValidationError {
    /// Destination is neither a 20-byte hex address nor the burn address
    #[error("Invalid destination address: {0}")]
    InvalidAddress(String),
    /// Amounts must be positive
    #[error("Must send an amount greater than 0")]
    ZeroAmount,
    /// Amount exceeds what the holder has
    #[error("Amount cannot be greater than the balance of {balance}")]
    InsufficientBalance {
        /// Balance in display units
        balance: String,
    },
    /// Custom transactions need a sender unless told otherwise
    #[error("A from address is required")]
    MissingFrom,
    /// Amount is not a decimal number with at most `decimals` fraction digits
    #[error("Invalid amount: {0}")]
    InvalidAmount(String),
    /// Token transfer of an NFT or NFT transfer of a fungible token
    #[error("Token {0} cannot be sent this way")]
    WrongTokenType(String),
    /// Custom transactions need a contract
    #[error("A contract is required")]
    MissingContract,
}

/// An error returned by a wallet operation
#[derive(Debug, thiserror::Error)]
pub enum WalletError {
    /// Rejected before anything was sent
    #[error(transparent)]
    Validation(#[from] ValidationError),
    /// No signer is registered for the address
    #[error("Unsupported wallet type for {0}")]
    UnsupportedWalletType(String),
    /// The generated transaction did not show up in the pending map
    #[error("There was an error fetching the pending transaction, please refresh the page and try again")]
    PendingHashNotFound,
    /// The hash is not a pending transaction
    #[error("No pending transaction {0}")]
    UnknownPendingTransaction(String),
    /// The signing flow was asked to do something its state does not allow
    #[error("Expected signing state {expected}, was {actual}")]
    InvalidState {
        /// State the operation needs
        expected: &'static str,
        /// Current state
        actual: String,
    },
    /// Decryption of the stored key failed
    #[error("Incorrect password for {0}")]
    IncorrectPassword(String),
    /// Stored or decrypted key material is unusable
    #[error("Malformed key: {0}")]
    MalformedKey(String),
    /// The external account is already tracked
    #[error("You have already imported this address.")]
    AlreadyImported(String),
    /// Signing failed
    #[error(transparent)]
    Signer(#[from] SignerError),
    /// The agent refused a signed transaction
    #[error("Submission failed: {0}")]
    Submission(ChainClientError),
    /// Talking to the agent failed
    #[error(transparent)]
    Chain(#[from] ChainClientError),
    /// The agent sent something we cannot decode
    #[error(transparent)]
    Format(#[from] FormatError),
    /// A bounded wait ran out
    #[error(transparent)]
    Timeout(#[from] PollExhausted),
    /// Any other error
    #[error(transparent)]
    EyreError(#[from] eyre::Report),
}

impl WalletError {
    /// The same call may succeed when retried unchanged
    pub fn is_retryable(&self) -> bool {
        match self {
            Self::Chain(_) | Self::Submission(_) | Self::Timeout(_) | Self::PendingHashNotFound => {
                true
            }
            Self::Signer(err) => !matches!(err, SignerError::MalformedSignature(_)),
            _ => false,
        }
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn retryable_errors() {
        assert!(WalletError::PendingHashNotFound.is_retryable());
        assert!(WalletError::Signer(SignerError::Rejected("no".into())).is_retryable());
        assert!(!WalletError::Signer(SignerError::MalformedSignature("0x".into())).is_retryable());
        assert!(!WalletError::from(ValidationError::ZeroAmount).is_retryable());
        assert!(!WalletError::AlreadyImported("0x1".into()).is_retryable());
    }

    #[test]
    fn messages() {
        assert_eq!(
            WalletError::from(ValidationError::ZeroAmount).to_string(),
            "Must send an amount greater than 0"
        );
        assert_eq!(
            WalletError::AlreadyImported("0x1".into()).to_string(),
            "You have already imported this address."
        );
    }
}
