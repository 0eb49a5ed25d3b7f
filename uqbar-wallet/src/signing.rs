use std::sync::Arc;

use tracing::{info, instrument, warn};
use uqbar_core::utils::{add_hex_dots, remove_dots};
use uqbar_core::{
    ChainClient, Gas, SignerError, SigningRequest, Transaction, TransactionStatus, WalletPoke,
};

use crate::message::TransactionMessage;
use crate::signers::SignerSelection;
use crate::{TransactionRequest, Wallet, WalletError};

/// Where the signing of one pending transaction stands
#[derive(Debug, Clone, PartialEq, Eq, strum::Display)]
#[strum(serialize_all = "snake_case")]
pub enum SigningState {
    /// Nothing to sign
    NoPendingHash,
    /// A pending transaction waits for a signature
    NeedsSignature {
        /// Pending hash
        hash: String,
    },
    /// The sender's key is encrypted; `unlock` with its password to go on
    AwaitingPassword {
        /// Pending hash
        hash: String,
        /// Sender
        address: String,
    },
    /// The remote wallet is bound to another account; reconnect with the
    /// right one and call `reconnected`
    DisconnectRequired {
        /// Pending hash
        hash: String,
        /// Account the session is bound to
        connected: String,
        /// Sender
        expected: String,
    },
    /// The signed transaction is being sent
    Submitting {
        /// Pending hash
        hash: String,
    },
    /// Sent; the transaction is now tracked by the store
    SubmittedConfirmation {
        /// Hash of the submitted transaction
        hash: String,
    },
}

impl SigningState {
    /// Hash the state is about, if any
    pub fn hash(&self) -> Option<&str> {
        match self {
            Self::NoPendingHash => None,
            Self::NeedsSignature { hash }
            | Self::AwaitingPassword { hash, .. }
            | Self::DisconnectRequired { hash, .. }
            | Self::Submitting { hash }
            | Self::SubmittedConfirmation { hash } => Some(hash),
        }
    }
}

/// Progress of a submitted transaction
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Confirmation {
    /// The store has not seen the transaction yet
    Waiting,
    /// Submitted or received, not executed yet
    InProgress(TransactionStatus),
    /// Executed or rejected; the status tells which
    Finished(Transaction),
}

impl Confirmation {
    /// Text shown for this stage
    pub fn description(&self) -> String {
        match self {
            Self::Waiting => TransactionStatus::SUBMITTED.description(),
            Self::InProgress(status) => status.description(),
            Self::Finished(txn) => txn.status.description(),
        }
    }
}

/// Drives one pending transaction from generation to submission.
///
/// Errors put the flow back to `NeedsSignature`, leave the pending
/// transaction where it was and are published as alerts, so the caller can
/// simply retry.
#[derive(Debug)]
pub struct SigningFlow<C> {
    wallet: Arc<Wallet<C>>,
    state: SigningState,
    gas: Gas,
}

impl<C> SigningFlow<C>
where
    C: ChainClient + 'static,
{
    /// A flow with nothing to sign and the configured default gas
    pub fn new(wallet: Arc<Wallet<C>>) -> Self {
        let gas = Gas {
            rate: wallet.settings().gas.rate,
            bud: wallet.settings().gas.budget,
        };
        Self {
            wallet,
            state: SigningState::NoPendingHash,
            gas,
        }
    }

    /// Current state
    pub fn state(&self) -> &SigningState {
        &self.state
    }

    /// Gas used for submission
    pub fn gas(&self) -> Gas {
        self.gas
    }

    /// Change the gas used for submission
    pub fn set_gas(&mut self, rate: u64, budget: u64) {
        self.gas = Gas { rate, bud: budget };
    }

    fn fail(&mut self, hash: String, err: WalletError) -> WalletError {
        self.wallet.store().alert(err.to_string());
        self.state = SigningState::NeedsSignature { hash };
        err
    }

    /// Start signing an unsigned transaction that already exists
    pub fn select(&mut self, hash: &str) -> Result<(), WalletError> {
        let known = self
            .wallet
            .store()
            .read(|state| state.unsigned_transactions.contains_key(hash));
        if !known {
            return Err(WalletError::UnknownPendingTransaction(hash.to_owned()));
        }
        self.state = SigningState::NeedsSignature {
            hash: hash.to_owned(),
        };
        Ok(())
    }

    /// Generate a transaction and start signing it
    pub async fn generate(&mut self, request: &TransactionRequest) -> Result<String, WalletError> {
        match self.wallet.generate_transaction(request).await {
            Ok(hash) => {
                self.state = SigningState::NeedsSignature { hash: hash.clone() };
                Ok(hash)
            }
            Err(err) => {
                self.wallet.store().alert(err.to_string());
                Err(err)
            }
        }
    }

    /// Sign the pending transaction and submit it.
    ///
    /// Ends in `SubmittedConfirmation` on success. A locked encrypted key
    /// moves to `AwaitingPassword` and a WalletConnect session on the wrong
    /// account to `DisconnectRequired`, both without error.
    #[instrument(skip(self), fields(state = %self.state))]
    pub async fn sign(&mut self) -> Result<(), WalletError> {
        let SigningState::NeedsSignature { hash } = &self.state else {
            return Err(WalletError::InvalidState {
                expected: "needs_signature",
                actual: self.state.to_string(),
            });
        };
        let hash = hash.clone();
        let txn = self
            .wallet
            .store()
            .read(|state| state.unsigned_transactions.get(&hash).cloned());
        let Some(txn) = txn else {
            let err = WalletError::UnknownPendingTransaction(hash.clone());
            return Err(self.fail(hash, err));
        };

        let submission = match self.wallet.resolve_signer(&txn.from) {
            Ok(SignerSelection::AwaitingPassword) => {
                info!(address = %txn.from, "Waiting for password");
                self.state = SigningState::AwaitingPassword {
                    hash,
                    address: txn.from,
                };
                return Ok(());
            }
            Ok(SignerSelection::Node) => WalletPoke::Submit {
                from: txn.from.clone(),
                hash: hash.clone(),
                gas: self.gas,
            },
            Ok(SignerSelection::Signer(signer)) => {
                let message = match TransactionMessage::new(&hash, &txn, self.gas)
                    .and_then(|message| message.encode())
                {
                    Ok(message) => message,
                    Err(err) => return Err(self.fail(hash, err.into())),
                };
                let request = SigningRequest::new(remove_dots(&txn.from), message);
                let sig = match signer.sign_transaction(&request).await {
                    Ok(sig) => sig,
                    Err(SignerError::Locked(address)) => {
                        self.state = SigningState::AwaitingPassword { hash, address };
                        return Ok(());
                    }
                    Err(SignerError::WrongAccount {
                        connected,
                        expected,
                    }) => {
                        warn!(%connected, %expected, "Connected to the wrong account");
                        self.state = SigningState::DisconnectRequired {
                            hash,
                            connected,
                            expected,
                        };
                        return Ok(());
                    }
                    Err(err) => return Err(self.fail(hash, err.into())),
                };
                let eth_hash = signer
                    .kind()
                    .submits_eth_hash()
                    .then(|| add_hex_dots(&format!("{:x}", request.eth_hash)));
                WalletPoke::SubmitSigned {
                    from: txn.from.clone(),
                    hash: hash.clone(),
                    gas: self.gas,
                    eth_hash,
                    sig,
                }
            }
            Err(err) => return Err(self.fail(hash, err)),
        };

        self.state = SigningState::Submitting { hash: hash.clone() };
        if let Err(err) = self.wallet.submit(&submission).await {
            warn!(%hash, error = %err, "Submission failed");
            return Err(self.fail(hash, err));
        }

        info!(%hash, command = submission.name(), "Submitted transaction");
        self.wallet.store().remove_pending(&hash);
        self.state = SigningState::SubmittedConfirmation { hash };
        if let Err(err) = self.wallet.refresh_pending().await {
            warn!(error = %err, "Failed to refresh pending transactions");
        }
        Ok(())
    }

    /// Unlock the sender's encrypted key and sign
    #[instrument(skip_all)]
    pub async fn unlock(&mut self, password: &str) -> Result<(), WalletError> {
        let SigningState::AwaitingPassword { hash, address } = &self.state else {
            return Err(WalletError::InvalidState {
                expected: "awaiting_password",
                actual: self.state.to_string(),
            });
        };
        if let Err(err) = self.wallet.unlock(address, password) {
            self.wallet.store().alert(err.to_string());
            return Err(err);
        }
        self.state = SigningState::NeedsSignature { hash: hash.clone() };
        self.sign().await
    }

    /// The remote wallet was reconnected; sign again
    pub fn reconnected(&mut self) -> Result<(), WalletError> {
        let SigningState::DisconnectRequired { hash, .. } = &self.state else {
            return Err(WalletError::InvalidState {
                expected: "disconnect_required",
                actual: self.state.to_string(),
            });
        };
        self.state = SigningState::NeedsSignature { hash: hash.clone() };
        Ok(())
    }

    /// Discard the pending transaction being signed
    pub async fn discard(&mut self) -> Result<(), WalletError> {
        let Some(hash) = self.state.hash().map(str::to_owned) else {
            return Ok(());
        };
        let from = self
            .wallet
            .store()
            .read(|state| state.unsigned_transactions.get(&hash).map(|t| t.from.clone()));
        if let Some(from) = from {
            self.wallet.delete_unsigned_transaction(&from, &hash).await?;
        }
        self.state = SigningState::NoPendingHash;
        Ok(())
    }

    /// How far the submitted transaction has come
    pub fn confirmation(&self) -> Option<Confirmation> {
        let SigningState::SubmittedConfirmation { hash } = &self.state else {
            return None;
        };
        Some(self.wallet.store().read(|state| match state.transaction(hash) {
            None => Confirmation::Waiting,
            Some(txn) if txn.status.is_in_progress() => Confirmation::InProgress(txn.status),
            Some(txn) => Confirmation::Finished(txn.clone()),
        }))
    }

    /// Wait until the submitted transaction is executed or rejected
    pub async fn wait_for_confirmation(&self) -> Result<Transaction, WalletError> {
        let SigningState::SubmittedConfirmation { hash } = &self.state else {
            return Err(WalletError::InvalidState {
                expected: "submitted_confirmation",
                actual: self.state.to_string(),
            });
        };
        self.wallet.wait_for_transaction(hash).await
    }

    /// Forget the current transaction
    pub fn reset(&mut self) {
        self.state = SigningState::NoPendingHash;
    }
}
