use std::sync::Arc;

use chrono::Utc;
use serde_json::Value;
use tokio::sync::{broadcast, watch};
use tracing::{debug, info, warn};
use uqbar_core::{Account, Assets, FormatError, TokenMetadataStore, Transaction, Transactions};

pub use state::{TransactionUpdate, WalletState};

pub(crate) mod handlers;
mod state;

const NOTIFICATION_CAPACITY: usize = 64;

/// Something the user should be told about
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Notification {
    /// A transaction reached a successful status
    TransactionConfirmed {
        /// Dotted hash
        hash: String,
    },
    /// An operation failed
    Alert(String),
}

#[derive(Debug)]
struct StoreChannels {
    state: watch::Sender<WalletState>,
    notifications: broadcast::Sender<Notification>,
}

/// Shared handle to the wallet state.
///
/// State changes only through the commands below. Observers either take
/// snapshots or subscribe to a `watch` receiver that sees every change;
/// confirmations and alerts go out on a separate broadcast channel.
#[derive(Debug, Clone)]
pub struct WalletStore {
    inner: Arc<StoreChannels>,
}

impl Default for WalletStore {
    fn default() -> Self {
        Self::new()
    }
}

impl WalletStore {
    /// An empty store
    pub fn new() -> Self {
        let (state, _) = watch::channel(WalletState::default());
        let (notifications, _) = broadcast::channel(NOTIFICATION_CAPACITY);
        Self {
            inner: Arc::new(StoreChannels {
                state,
                notifications,
            }),
        }
    }

    /// Receiver that is marked changed on every command
    pub fn subscribe(&self) -> watch::Receiver<WalletState> {
        self.inner.state.subscribe()
    }

    /// Receiver of notifications sent from now on
    pub fn notifications(&self) -> broadcast::Receiver<Notification> {
        self.inner.notifications.subscribe()
    }

    /// Copy of the current state
    pub fn snapshot(&self) -> WalletState {
        self.inner.state.borrow().clone()
    }

    /// Read from the current state without copying it
    pub fn read<R>(&self, f: impl FnOnce(&WalletState) -> R) -> R {
        f(&self.inner.state.borrow())
    }

    fn modify<R>(&self, f: impl FnOnce(&mut WalletState) -> R) -> R {
        let mut result = None;
        self.inner.state.send_modify(|state| result = Some(f(state)));
        match result {
            Some(result) => result,
            None => unreachable!("send_modify always runs its closure"),
        }
    }

    fn notify(&self, notification: Notification) {
        // no receivers is fine
        let _ = self.inner.notifications.send(notification);
    }

    /// Publish an alert
    pub fn alert(&self, message: impl Into<String>) {
        let message = message.into();
        warn!(%message, "Alert");
        self.notify(Notification::Alert(message));
    }

    /// Apply a decoded transaction
    pub fn apply_transaction(&self, txn: Transaction) -> TransactionUpdate {
        let hash = txn.hash.clone();
        let update = self.modify(|state| state.apply_transaction(txn, Utc::now()));
        debug!(%hash, ?update, "Applied transaction");
        if let TransactionUpdate::Updated { confirmed: true } = update {
            info!(%hash, "Transaction confirmed");
            self.notify(Notification::TransactionConfirmed { hash });
        }
        update
    }

    /// Apply a `{hash: fields}` event from the transaction subscription
    pub fn apply_transaction_event(&self, event: &Value) -> Result<TransactionUpdate, FormatError> {
        let txn = Transaction::from_event(event)?;
        Ok(self.apply_transaction(txn))
    }

    /// Replace the pending map
    pub fn replace_pending(&self, pending: Transactions) {
        self.modify(|state| state.replace_pending(pending));
    }

    /// Drop one hash from the pending map
    pub fn remove_pending(&self, hash: &str) -> Option<Transaction> {
        self.modify(|state| state.unsigned_transactions.remove(hash))
    }

    /// Replace the finalized list
    pub fn replace_transactions(&self, transactions: Vec<Transaction>) {
        self.modify(|state| state.replace_transactions(transactions));
    }

    /// Replace the account list
    pub fn set_accounts(&self, accounts: Vec<Account>) {
        self.modify(|state| state.accounts = accounts);
    }

    /// Replace token holdings
    pub fn set_assets(&self, assets: Assets) {
        self.modify(|state| state.assets = assets);
    }

    /// Replace token metadata
    pub fn set_metadata(&self, metadata: TokenMetadataStore) {
        self.modify(|state| state.metadata = metadata);
    }

    /// Record the town chosen for `set_node`
    pub fn set_selected_town(&self, town: u64) {
        self.modify(|state| state.selected_town = Some(town));
    }

    /// Set or clear the most recent transaction
    pub fn set_most_recent(&self, txn: Option<Transaction>) {
        self.modify(|state| state.most_recent_transaction = txn);
    }

    /// Set or clear the progress message
    pub fn set_loading(&self, loading: Option<&str>) {
        self.modify(|state| state.loading = loading.map(str::to_owned));
    }
}
