use serde_json::Value;
use tracing::{info, instrument, warn};
use uqbar_core::utils::add_hex_dots;
use uqbar_core::{
    imported_nick, metadata_from_wire, Account, ChainClient, ChainClientExt, Seed, WalletPoke,
    WalletType,
};

use super::Wallet;
use crate::store::WalletStore;
use crate::WalletError;

const DERIVING: &str = "Deriving address, this could take up to 60 seconds...";
const DERIVE_FAILED: &str =
    "There was an error deriving the address, please check the HD path and try again.";

/// Scry the account list into `store`
pub(super) async fn load_accounts<C>(
    client: &C,
    app: &str,
    store: &WalletStore,
) -> Result<Vec<Account>, WalletError>
where
    C: ChainClient + ?Sized,
{
    let value = client.scry(app, "/accounts").await?;
    let accounts = Account::list_from_wire(&value)?;
    store.set_accounts(accounts.clone());
    Ok(accounts)
}

impl<C> Wallet<C>
where
    C: ChainClient + 'static,
{
    /// Reload every account, sorted by nickname
    pub async fn refresh_accounts(&self) -> Result<Vec<Account>, WalletError> {
        load_accounts(&*self.client, &self.settings.app, &self.store).await
    }

    /// Reload token metadata
    pub async fn refresh_metadata(&self) -> Result<(), WalletError> {
        let value = self.client.scry(&self.settings.app, "/token-metadata").await?;
        self.store.set_metadata(metadata_from_wire(&value)?);
        Ok(())
    }

    /// The node's seed
    pub async fn get_seed(&self) -> Result<Seed, WalletError> {
        Ok(self.client.scry_as::<Seed>(&self.settings.app, "/seed").await?)
    }

    async fn poke_and_reload(&self, poke: WalletPoke) -> Result<(), WalletError> {
        self.poke(&poke).await?;
        self.refresh_accounts().await?;
        Ok(())
    }

    /// Create a hot wallet on the node
    #[instrument(skip(self, password))]
    pub async fn create_account(&self, password: &str, nick: &str) -> Result<(), WalletError> {
        self.poke_and_reload(WalletPoke::GenerateHotWallet {
            password: password.to_owned(),
            nick: nick.to_owned(),
        })
        .await
    }

    /// Restore the node's hot wallet from a mnemonic
    #[instrument(skip(self, mnemonic, password))]
    pub async fn restore_account(&self, mnemonic: &str, password: &str, nick: &str) -> Result<(), WalletError> {
        self.poke_and_reload(WalletPoke::ImportSeed {
            mnemonic: mnemonic.to_owned(),
            password: password.to_owned(),
            nick: nick.to_owned(),
        })
        .await
    }

    /// Watch an address without being able to sign for it
    #[instrument(skip(self))]
    pub async fn track_address(&self, address: &str, nick: &str) -> Result<(), WalletError> {
        self.poke_and_reload(WalletPoke::AddTrackedAddress {
            address: add_hex_dots(address),
            nick: nick.to_owned(),
        })
        .await
    }

    /// Forget an address
    #[instrument(skip(self))]
    pub async fn delete_account(&self, address: &str) -> Result<(), WalletError> {
        self.keyring.lock(address);
        self.poke_and_reload(WalletPoke::DeleteAddress {
            address: add_hex_dots(address),
        })
        .await
    }

    /// Rename an address. The new name is persisted once no further edit of
    /// the same address arrives within the debounce window.
    pub fn edit_nickname(&self, address: &str, nick: &str) {
        self.nicknames.edit(address, nick);
    }

    /// Choose the sequencer for `town`
    pub async fn set_node(&self, town: u64, ship: &str) -> Result<(), WalletError> {
        self.poke(&WalletPoke::SetNode {
            town,
            ship: ship.to_owned(),
        })
        .await?;
        self.store.set_selected_town(town);
        Ok(())
    }

    /// Choose the indexer
    pub async fn set_indexer(&self, ship: &str) -> Result<(), WalletError> {
        self.poke(&WalletPoke::SetIndexer {
            ship: ship.to_owned(),
        })
        .await
    }

    /// Derive a new address. With a hardware `wallet_type` the device derives
    /// it at `hdpath` and the address is tracked as an imported account;
    /// otherwise the node derives it from its seed.
    #[instrument(skip(self))]
    pub async fn derive_new_address(
        &self,
        hdpath: &str,
        nick: &str,
        wallet_type: Option<WalletType>,
    ) -> Result<(), WalletError> {
        self.store.set_loading(Some(DERIVING));
        let derived = match wallet_type {
            Some(wallet_type) if wallet_type.is_hardware() => {
                match self.provider_address(wallet_type, Some(hdpath)).await {
                    Ok(address) => self.track_imported(&address, nick, wallet_type).await,
                    Err(err) => Err(err),
                }
            }
            _ => {
                self.poke_and_reload(WalletPoke::DeriveNewAddress {
                    hdpath: hdpath.to_owned(),
                    nick: nick.to_owned(),
                })
                .await
            }
        };
        self.store.set_loading(None);
        if let Err(err) = &derived {
            if !matches!(err, WalletError::AlreadyImported(_)) {
                warn!(error = %err, "Failed to derive address");
                self.store.alert(DERIVE_FAILED);
            }
        }
        derived
    }

    /// Track the address an external signer of `wallet_type` exposes, so it
    /// can sign for it later.
    #[instrument(skip(self))]
    pub async fn import_account(&self, wallet_type: WalletType, nick: &str) -> Result<(), WalletError> {
        self.store.set_loading(Some("Importing..."));
        let imported = match self.provider_address(wallet_type, None).await {
            Ok(address) => self.track_imported(&address, nick, wallet_type).await,
            Err(err) => Err(err),
        };
        self.store.set_loading(None);
        imported
    }

    async fn provider_address(
        &self,
        wallet_type: WalletType,
        hdpath: Option<&str>,
    ) -> Result<String, WalletError> {
        let address = match wallet_type {
            t if t.is_browser() => {
                let accounts = self
                    .providers
                    .browser()?
                    .request("eth_requestAccounts", vec![])
                    .await?;
                accounts
                    .as_array()
                    .and_then(|a| a.first())
                    .and_then(Value::as_str)
                    .map(str::to_owned)
            }
            WalletType::Walletconnect => self.providers.wallet_connect()?.accounts().into_iter().next(),
            t if t.is_hardware() => Some(self.providers.hardware(t)?.address(hdpath).await?),
            _ => None,
        };
        address.ok_or_else(|| WalletError::UnsupportedWalletType(wallet_type.to_string()))
    }

    async fn track_imported(
        &self,
        address: &str,
        nick: &str,
        wallet_type: WalletType,
    ) -> Result<(), WalletError> {
        let known = self.store.read(|state| {
            state
                .accounts
                .iter()
                .any(|a| matches!(a, Account::Imported(_)) && a.matches(address))
        });
        if known {
            let err = WalletError::AlreadyImported(address.to_owned());
            self.store.alert(err.to_string());
            return Err(err);
        }
        info!(%address, %wallet_type, "Importing account");
        self.poke_and_reload(WalletPoke::AddTrackedAddress {
            address: add_hex_dots(address),
            nick: imported_nick(nick, wallet_type),
        })
        .await
    }
}
