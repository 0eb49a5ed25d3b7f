use std::sync::Arc;

use serde_json::{json, Map, Value};
use uqbar_base::settings::WalletSettings;
use uqbar_base::{poll_until, PollConfig};
use uqbar_core::utils::add_hex_dots;
use uqbar_core::{assets_from_wire, Token};
use uqbar_test::FakeChainClient;

use crate::{encrypt_private_key, KdfParams, SignerProviders, Wallet};

pub const KEY: &str = "4c0883a69102937d6231471b5dbb6204fe5129617082792ae468d01a3f362318";
pub const ADDRESS: &str = "0x2c7536e3605d9c16a7a3d7b1898e529396a65c23";
pub const OTHER_ADDRESS: &str = "0x1111111111111111111111111111111111111111";
pub const RECIPIENT: &str = "0xabababababababababababababababababababab";
pub const PASSWORD: &str = "hunter2";

pub const ZIG_CONTRACT: &str = "0x74.6f6b";
pub const ZIG_METADATA: &str = "0x61.7367";
pub const ZIG_ITEM: &str = "0x89.a0ef";

/// Dotted form of an address, as the agent keys it
pub fn raw(address: &str) -> String {
    add_hex_dots(address)
}

pub fn hot_account(nick: &str) -> (String, Value) {
    (
        raw(ADDRESS),
        json!({ "nick": nick, "pubkey": raw(ADDRESS), "privkey": format!("0x{KEY}"), "nonces": {} }),
    )
}

pub fn encrypted_account(nick: &str) -> (String, Value) {
    let cheap = KdfParams {
        m_cost: 64,
        t_cost: 1,
        p_cost: 1,
    };
    let encrypted = encrypt_private_key(KEY, PASSWORD, cheap).unwrap();
    (
        raw(ADDRESS),
        json!({ "nick": nick, "pubkey": raw(ADDRESS), "priv": encrypted, "seed": "00", "nonces": {} }),
    )
}

pub fn imported_account(nick: &str) -> (String, Value) {
    (
        raw(ADDRESS),
        json!({ "nick": nick, "pubkey": raw(ADDRESS), "privkey": "", "nonces": {} }),
    )
}

pub fn accounts_json(accounts: impl IntoIterator<Item = (String, Value)>) -> Value {
    Value::Object(accounts.into_iter().collect::<Map<_, _>>())
}

/// An agent that knows `accounts`, the ZIG token (2 decimals) and no
/// transactions yet
pub fn fake_agent(accounts: Value) -> Arc<FakeChainClient> {
    let fake = Arc::new(FakeChainClient::new());
    fake.set_scry("/accounts", accounts);
    fake.set_scry(
        "/token-metadata",
        json!({
            ZIG_METADATA: {
                "id": ZIG_METADATA,
                "contract": ZIG_CONTRACT,
                "data": { "name": "Zigs", "symbol": "ZIG", "decimals": "2" }
            }
        }),
    );
    fake.set_scry("/transactions", json!({ "finished": {}, "unfinished": {} }));
    fake
}

pub fn test_settings() -> WalletSettings {
    WalletSettings {
        polling: PollConfig {
            interval_ms: 10,
            max_attempts: 200,
        },
        ..Default::default()
    }
}

pub fn wallet(
    fake: &Arc<FakeChainClient>,
    settings: WalletSettings,
    providers: SignerProviders,
) -> Arc<Wallet<FakeChainClient>> {
    Arc::new(Wallet::new(fake.clone(), settings).with_providers(providers))
}

pub async fn loaded_wallet(
    fake: &Arc<FakeChainClient>,
    providers: SignerProviders,
) -> Arc<Wallet<FakeChainClient>> {
    let wallet = wallet(fake, test_settings(), providers);
    wallet.load().await.unwrap();
    wallet
}

/// A `/book-updates` event giving `holder` a ZIG balance
pub fn zig_book(holder: &str, balance: u64) -> Value {
    json!({
        holder: {
            ZIG_ITEM: {
                "id": ZIG_ITEM,
                "contract": ZIG_CONTRACT,
                "town": "0x0",
                "token_type": "token",
                "data": { "balance": balance.to_string(), "metadata": ZIG_METADATA }
            }
        }
    })
}

/// Put a ZIG holding into the store and return it
pub fn give_zigs(wallet: &Wallet<FakeChainClient>, holder: &str, balance: u64) -> Token {
    let assets = assets_from_wire(&zig_book(holder, balance)).unwrap();
    let token = assets[holder][ZIG_ITEM].clone();
    wallet.store().set_assets(assets);
    token
}

/// A `/tx-updates` event for `hash`
pub fn tx_event(hash: &str, status: &str, from: &str) -> Value {
    let mut event = Map::new();
    event.insert(
        hash.to_owned(),
        json!({ "status": status, "nonce": "0", "from": from, "contract": ZIG_CONTRACT, "town": "0x0" }),
    );
    Value::Object(event)
}

/// Wait, in short real-time steps, until `check` holds
pub async fn wait_until(mut check: impl FnMut() -> bool) {
    let config = PollConfig {
        interval_ms: 5,
        max_attempts: 400,
    };
    poll_until(&config, || {
        let done = check();
        async move { done.then_some(()) }
    })
    .await
    .expect("condition not met in time");
}
