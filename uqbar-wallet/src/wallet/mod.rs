use std::collections::HashSet;
use std::sync::Arc;

use futures::future::{try_join_all, BoxFuture};
use futures::FutureExt;
use serde_json::Value;
use tokio::task::JoinHandle;
use tracing::{debug, info, instrument, warn};
use uqbar_base::settings::WalletSettings;
use uqbar_base::{poll_until, run_supervised, SubscriptionExhausted};
use uqbar_core::{
    Account, ChainClient, ChainClientExt, FormatError, Transaction,
    Transactions, WalletPoke,
};

use crate::generation::select_pending_hash;
use crate::nickname::NicknameEditor;
use crate::signers::{resolve_signer, SignerSelection};
use crate::store::handlers::{handle_book_update, handle_metadata_update, handle_tx_update};
use crate::store::{WalletState, WalletStore};
use crate::{KeyRing, SignerProviders, TransactionRequest, WalletError};

mod accounts;

type EventHandler = fn(&WalletStore, Value);

const SUBSCRIPTIONS: [(&str, EventHandler); 3] = [
    ("/book-updates", handle_book_update),
    ("/metadata-updates", handle_metadata_update),
    ("/tx-updates", handle_tx_update),
];

/// The wallet controller.
///
/// Owns the store and is the only thing that talks to the wallet agent.
/// Every command pokes or scries through the chain client and then brings
/// the store up to date.
#[derive(Debug)]
pub struct Wallet<C> {
    client: Arc<C>,
    settings: WalletSettings,
    store: WalletStore,
    keyring: KeyRing,
    providers: SignerProviders,
    nicknames: NicknameEditor,
}

impl<C> Wallet<C>
where
    C: ChainClient + 'static,
{
    /// A controller with no external signers
    pub fn new(client: Arc<C>, settings: WalletSettings) -> Self {
        let store = WalletStore::new();
        let nicknames = NicknameEditor::new(
            settings.nickname_debounce(),
            nickname_persister(
                client.clone(),
                store.clone(),
                settings.app.clone(),
                settings.mark.clone(),
            ),
        );
        Self {
            client,
            settings,
            store,
            keyring: KeyRing::new(),
            providers: SignerProviders::default(),
            nicknames,
        }
    }

    /// Use `providers` for imported accounts
    pub fn with_providers(mut self, providers: SignerProviders) -> Self {
        self.providers = providers;
        self
    }

    /// The state handle
    pub fn store(&self) -> &WalletStore {
        &self.store
    }

    /// Settings in use
    pub fn settings(&self) -> &WalletSettings {
        &self.settings
    }

    /// Keys unlocked in this session
    pub fn keyring(&self) -> &KeyRing {
        &self.keyring
    }

    async fn poke(&self, poke: &WalletPoke) -> Result<(), WalletError> {
        self.client
            .poke_wallet(&self.settings.app, &self.settings.mark, poke)
            .await?;
        Ok(())
    }

    /// Load accounts, token metadata, transactions and the pending map.
    #[instrument(skip(self))]
    pub async fn load(&self) -> Result<(), WalletError> {
        self.store.set_loading(Some("Loading..."));
        let loaded = async {
            self.refresh_accounts().await?;
            self.refresh_metadata().await?;
            self.refresh_transactions().await?;
            self.refresh_pending().await?;
            Ok::<_, WalletError>(())
        }
        .await;
        self.store.set_loading(None);
        if let Err(err) = &loaded {
            warn!(error = %err, "Initial load failed");
        }
        loaded
    }

    /// Keep the book, metadata and transaction feeds applied to the store.
    /// Each feed is resubscribed when it closes; its task ends once
    /// resubscribing has failed too often.
    pub fn spawn_subscriptions(&self) -> Vec<JoinHandle<Result<(), SubscriptionExhausted>>> {
        SUBSCRIPTIONS
            .into_iter()
            .map(|(path, handler)| {
                let client = self.client.clone();
                let store = self.store.clone();
                let app = self.settings.app.clone();
                let config = self.settings.resubscribe;
                tokio::spawn(async move {
                    run_supervised(client, &app, path, &config, move |event| {
                        handler(&store, event)
                    })
                    .await
                })
            })
            .collect()
    }

    /// Replace the finalized transaction list from the agent
    pub async fn refresh_transactions(&self) -> Result<(), WalletError> {
        let value = self.client.scry(&self.settings.app, "/transactions").await?;
        let transactions = transactions_from_wire(&value)?;
        debug!(count = transactions.len(), "Loaded transactions");
        self.store.replace_transactions(transactions);
        Ok(())
    }

    /// Replace the pending map with the pending transactions of every
    /// account, returning the new map.
    #[instrument(skip(self))]
    pub async fn refresh_pending(&self) -> Result<Transactions, WalletError> {
        let addresses = self.store.read(WalletState::tracked_addresses);
        let app = &self.settings.app;
        let maps = try_join_all(addresses.iter().map(|address| async move {
            let value = self.client.scry(app, &format!("/pending/{address}")).await?;
            Ok::<_, WalletError>(Transaction::map_from_wire(&value)?)
        }))
        .await?;
        let pending: Transactions = maps.into_iter().flatten().collect();
        debug!(count = pending.len(), "Refreshed pending transactions");
        self.store.replace_pending(pending);
        Ok(self.store.read(|state| state.unsigned_transactions.clone()))
    }

    /// Validate `request`, have the agent generate the transaction and
    /// return the hash of the pending transaction it created.
    ///
    /// Nothing is sent when validation fails.
    #[instrument(skip_all)]
    pub async fn generate_transaction(&self, request: &TransactionRequest) -> Result<String, WalletError> {
        let poke = self.store.read(|state| request.validate(&state.metadata))?;
        let from = match &poke {
            WalletPoke::Transaction { from, .. } => from.clone(),
            _ => None,
        };
        let before: HashSet<String> =
            self.store.read(|state| state.unsigned_transactions.keys().cloned().collect());

        self.store.set_most_recent(None);
        self.poke(&poke).await?;
        let pending = self.refresh_pending().await?;
        let hash = select_pending_hash(&pending, from.as_deref(), &before)
            .ok_or(WalletError::PendingHashNotFound)?;
        info!(%hash, from = ?from, "Generated transaction");
        Ok(hash)
    }

    /// Who signs for `from`
    pub fn resolve_signer(&self, from: &str) -> Result<SignerSelection, WalletError> {
        self.store.read(|state| {
            resolve_signer(
                &state.accounts,
                &self.keyring,
                &self.providers,
                self.settings.node_signs_hot_wallets,
                from,
            )
        })
    }

    /// Send a `submit-signed` or `submit` poke
    pub async fn submit(&self, poke: &WalletPoke) -> Result<(), WalletError> {
        self.client
            .poke_wallet(&self.settings.app, &self.settings.mark, poke)
            .await
            .map_err(WalletError::Submission)
    }

    /// Discard an unsigned transaction
    #[instrument(skip(self))]
    pub async fn delete_unsigned_transaction(&self, from: &str, hash: &str) -> Result<(), WalletError> {
        self.poke(&WalletPoke::DeletePending {
            from: from.to_owned(),
            hash: hash.to_owned(),
        })
        .await?;
        self.refresh_pending().await?;
        Ok(())
    }

    /// Decrypt the key of the encrypted wallet at `address` for this session
    pub fn unlock(&self, address: &str, password: &str) -> Result<(), WalletError> {
        let wallet = self.store.read(|state| match state.account(address) {
            Some(Account::Encrypted(wallet)) => Some(wallet.clone()),
            _ => None,
        });
        let wallet = wallet.ok_or_else(|| WalletError::UnsupportedWalletType(address.to_owned()))?;
        self.keyring.unlock(&wallet, password)
    }

    /// Wait until the transaction `hash` is no longer in progress
    pub async fn wait_for_transaction(&self, hash: &str) -> Result<Transaction, WalletError> {
        let store = &self.store;
        let done = poll_until(&self.settings.polling, move || async move {
            store.read(|state| {
                state
                    .transaction(hash)
                    .filter(|t| !t.status.is_in_progress())
                    .cloned()
            })
        })
        .await?;
        Ok(done)
    }

    /// Wait until the wallet desk shows up among the node's installed desks
    #[instrument(skip(self), fields(desk = %self.settings.desk))]
    pub async fn await_installed(&self) -> Result<(), WalletError> {
        let client = &self.client;
        let desk = self.settings.desk.as_str();
        poll_until(&self.settings.polling, move || async move {
            match client.scry("docket", "/charges").await {
                Ok(charges) => charges
                    .get("initial")
                    .unwrap_or(&charges)
                    .get(desk)
                    .map(|_| ()),
                Err(err) => {
                    debug!(error = %err, "Charges not available");
                    None
                }
            }
        })
        .await?;
        info!("Wallet desk installed");
        Ok(())
    }
}

fn nickname_persister<C>(
    client: Arc<C>,
    store: WalletStore,
    app: String,
    mark: String,
) -> impl Fn(String, String) -> BoxFuture<'static, ()> + Send + Sync + 'static
where
    C: ChainClient + 'static,
{
    move |address, nick| {
        let client = client.clone();
        let store = store.clone();
        let app = app.clone();
        let mark = mark.clone();
        async move {
            let poke = WalletPoke::EditNickname {
                address: address.clone(),
                nick,
            };
            if let Err(err) = client.poke_wallet(&app, &mark, &poke).await {
                warn!(%address, error = %err, "Failed to save nickname");
                store.alert(format!("Failed to save nickname: {err}"));
                return;
            }
            if let Err(err) = accounts::load_accounts(&*client, &app, &store).await {
                warn!(error = %err, "Failed to reload accounts");
            }
        }
        .boxed()
    }
}

/// Decode a `/transactions` scry, `{finished: {from: {hash: entry}},
/// unfinished: {hash: entry}}`. Unfinished entries still waiting for a
/// signature belong to the pending map and are left out.
fn transactions_from_wire(value: &Value) -> Result<Vec<Transaction>, FormatError> {
    let mut transactions = Vec::new();
    if let Some(finished) = value.get("finished").and_then(Value::as_object) {
        for by_hash in finished.values() {
            transactions.extend(Transaction::map_from_wire(by_hash)?.into_values());
        }
    }
    if let Some(unfinished) = value.get("unfinished") {
        transactions.extend(
            Transaction::map_from_wire(unfinished)?
                .into_values()
                .filter(|t| !t.status.is_awaiting_signature()),
        );
    }
    Ok(transactions)
}

#[cfg(test)]
mod test {
    use serde_json::json;

    use super::*;

    #[test]
    fn transactions_skip_unsigned_entries() {
        let txns = transactions_from_wire(&json!({
            "finished": {
                "0xaaaa": {
                    "0x1": { "status": "200", "nonce": "1" },
                    "0x2": { "status": "103", "nonce": "2" }
                }
            },
            "unfinished": {
                "0x3": { "status": "101", "nonce": "3" },
                "0x4": { "status": "100", "nonce": "4" }
            }
        }))
        .unwrap();
        let mut hashes: Vec<_> = txns.iter().map(|t| t.hash.as_str()).collect();
        hashes.sort();
        assert_eq!(hashes, vec!["0x1", "0x2", "0x3"]);
    }
}
