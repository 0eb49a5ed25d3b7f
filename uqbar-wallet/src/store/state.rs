use std::collections::HashSet;

use chrono::{DateTime, Utc};
use itertools::Itertools;
use uqbar_core::utils::remove_dots;
use uqbar_core::{
    Account, Assets, TokenMetadataStore, Transaction, TransactionAction, Transactions,
};

/// Everything the wallet knows. Owned by the [`WalletStore`](super::WalletStore)
/// and only changed through its commands.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct WalletState {
    /// Every account, sorted by nickname
    pub accounts: Vec<Account>,
    /// Token holdings by holder and item id
    pub assets: Assets,
    /// Token metadata by metadata id
    pub metadata: TokenMetadataStore,
    /// Town picked with `set_node`
    pub selected_town: Option<u64>,
    /// Transactions past the pending stage, newest first
    pub transactions: Vec<Transaction>,
    /// Transactions waiting for a signature, by hash
    pub unsigned_transactions: Transactions,
    /// Last transaction that was inserted or changed
    pub most_recent_transaction: Option<Transaction>,
    /// Progress message while a long operation runs
    pub loading: Option<String>,
}

/// How a transaction event changed the state
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TransactionUpdate {
    /// Stored in the pending map
    Pending,
    /// Prepended to the finalized list
    Inserted,
    /// Updated in place in the finalized list
    Updated {
        /// Status moved from not successful to successful
        confirmed: bool,
    },
}

impl WalletState {
    /// Apply one transaction event.
    ///
    /// A hash already in the finalized list is updated in place: it keeps its
    /// `created` stamp and `modified` is set to `now`, so replaying an event
    /// changes nothing but that stamp. A new hash with status
    /// 100 goes to the pending map; any other new hash is prepended to the
    /// finalized list. A hash leaves the pending map as soon as it is seen
    /// with another status.
    pub fn apply_transaction(&mut self, txn: Transaction, now: DateTime<Utc>) -> TransactionUpdate {
        if let Some(existing) = self.transactions.iter_mut().find(|t| t.hash == txn.hash) {
            let confirmed = !existing.status.is_success() && txn.status.is_success();
            existing.modified = Some(now);
            existing.created.get_or_insert(now);
            merge_fields(existing, txn);
            let updated = existing.clone();
            if !updated.status.is_awaiting_signature() {
                self.unsigned_transactions.remove(&updated.hash);
            }
            self.most_recent_transaction = Some(updated);
            return TransactionUpdate::Updated { confirmed };
        }

        if txn.status.is_awaiting_signature() {
            self.unsigned_transactions.insert(txn.hash.clone(), txn);
            return TransactionUpdate::Pending;
        }

        let mut txn = match self.unsigned_transactions.remove(&txn.hash) {
            Some(mut pending) => {
                merge_fields(&mut pending, txn);
                pending
            }
            None => txn,
        };
        txn.created = Some(now);
        txn.modified = Some(now);
        self.transactions.insert(0, txn.clone());
        self.most_recent_transaction = Some(txn);
        TransactionUpdate::Inserted
    }

    /// Replace the pending map, dropping hashes the finalized list already
    /// has.
    pub fn replace_pending(&mut self, pending: Transactions) {
        let finalized: HashSet<&str> = self.transactions.iter().map(|t| t.hash.as_str()).collect();
        self.unsigned_transactions = pending
            .into_iter()
            .filter(|(hash, _)| !finalized.contains(hash.as_str()))
            .collect();
    }

    /// Replace the finalized list, newest nonce first. Pending entries with
    /// the same hashes are dropped.
    pub fn replace_transactions(&mut self, transactions: Vec<Transaction>) {
        self.transactions = transactions;
        self.sort_finalized();
        for txn in &self.transactions {
            self.unsigned_transactions.remove(&txn.hash);
        }
    }

    /// Sort the finalized list by nonce, descending
    pub fn sort_finalized(&mut self) {
        self.transactions.sort_by(|a, b| b.nonce.cmp(&a.nonce));
    }

    /// Canonical addresses of every account
    pub fn tracked_addresses(&self) -> Vec<String> {
        self.accounts
            .iter()
            .map(|a| a.info().raw_address.clone())
            .unique()
            .collect()
    }

    /// Account named by `address`, dotted or not
    pub fn account(&self, address: &str) -> Option<&Account> {
        self.accounts.iter().find(|a| a.matches(address))
    }

    /// Pending transactions sent from `address`
    pub fn pending_from<'a>(&'a self, address: &'a str) -> impl Iterator<Item = &'a Transaction> {
        let address = remove_dots(address).to_lowercase();
        self.unsigned_transactions
            .values()
            .filter(move |t| remove_dots(&t.from).to_lowercase() == address)
    }

    /// Finalized transaction with `hash`
    pub fn transaction(&self, hash: &str) -> Option<&Transaction> {
        self.transactions.iter().find(|t| t.hash == hash)
    }
}

/// Overwrite `existing` with `update`, keeping fields the update leaves
/// empty. Timestamps are left alone.
fn merge_fields(existing: &mut Transaction, update: Transaction) {
    existing.status = update.status;
    if update.nonce != 0 {
        existing.nonce = update.nonce;
    }
    if update.rate != 0 {
        existing.rate = update.rate;
    }
    if update.budget != 0 {
        existing.budget = update.budget;
    }
    for (field, value) in [
        (&mut existing.from, update.from),
        (&mut existing.contract, update.contract),
        (&mut existing.town, update.town),
    ] {
        if !value.is_empty() {
            *field = value;
        }
    }
    if update.action != TransactionAction::default() {
        existing.action = update.action;
    }
    if update.output.is_some() {
        existing.output = update.output;
    }
}
