use serde_json::json;
use uqbar_base::PollConfig;
use uqbar_core::SubscriptionEvent;

use super::test_utils::*;
use crate::{SignerProviders, WalletError};

#[tokio::test]
#[tracing_test::traced_test]
async fn test_subscriptions_keep_the_store_current() {
    let holder = raw(ADDRESS);
    let fake = fake_agent(accounts_json([hot_account("main")]));
    let wallet = loaded_wallet(&fake, SignerProviders::default()).await;
    let changes = wallet.store().subscribe();
    let subscriptions = wallet.spawn_subscriptions();
    wait_until(|| {
        ["/book-updates", "/metadata-updates", "/tx-updates"]
            .iter()
            .all(|path| fake.subscribe_count(path) > 0)
    })
    .await;

    fake.push_event("/book-updates", zig_book(&holder, 250));
    fake.push_event(
        "/metadata-updates",
        json!({ ZIG_METADATA: { "id": ZIG_METADATA, "contract": ZIG_CONTRACT, "data": { "symbol": "ZIG", "decimals": "3" } } }),
    );
    fake.push_event("/tx-updates", json!("not a transaction"));
    fake.push_event("/tx-updates", tx_event("0xfeed", "102", &holder));

    wait_until(|| {
        wallet
            .store()
            .read(|state| state.transaction("0xfeed").is_some())
    })
    .await;
    let state = wallet.store().snapshot();
    assert_eq!(state.assets[&holder][ZIG_ITEM].holder, holder);
    assert_eq!(state.metadata[ZIG_METADATA].decimals(), 3);
    assert!(changes.has_changed().unwrap());

    fake.close_subscriptions("/tx-updates", SubscriptionEvent::Quit);
    wait_until(|| fake.subscribe_count("/tx-updates") > 1).await;
    fake.push_event("/tx-updates", tx_event("0xfeed", "200", &holder));
    wait_until(|| {
        wallet.store().read(|state| {
            state
                .transaction("0xfeed")
                .is_some_and(|t| t.status.is_success())
        })
    })
    .await;

    for handle in subscriptions {
        handle.abort();
    }
}

#[tokio::test]
async fn test_await_installed_polls_the_charges() {
    let fake = fake_agent(json!({}));
    fake.set_scry("/charges", json!({ "initial": { "zig": { "title": "Zig" } } }));
    let installed = wallet(&fake, test_settings(), SignerProviders::default());
    installed.await_installed().await.unwrap();

    let fake = fake_agent(json!({}));
    fake.set_scry("/charges", json!({ "landscape": {} }));
    let mut settings = test_settings();
    settings.polling = PollConfig {
        interval_ms: 1,
        max_attempts: 3,
    };
    let missing = wallet(&fake, settings, SignerProviders::default());
    let err = missing.await_installed().await.unwrap_err();
    assert!(matches!(err, WalletError::Timeout(_)));
    assert!(err.is_retryable());
}

#[tokio::test]
async fn test_initial_load_fills_the_store() {
    let holder = raw(ADDRESS);
    let fake = fake_agent(accounts_json([hot_account("main")]));
    fake.set_scry(
        "/transactions",
        json!({
            "finished": { holder.clone(): { "0xa1": { "status": "200", "nonce": "1", "from": holder.clone() } } },
            "unfinished": { "0xa2": { "status": "101", "nonce": "2", "from": holder.clone() } }
        }),
    );
    fake.insert_pending(
        &holder,
        "0xa3",
        json!({ "status": "100", "nonce": "3", "from": holder.clone() }),
    );
    let wallet = loaded_wallet(&fake, SignerProviders::default()).await;

    let state = wallet.store().snapshot();
    assert_eq!(state.accounts.len(), 1);
    assert_eq!(state.metadata[ZIG_METADATA].decimals(), 2);
    let nonces: Vec<_> = state.transactions.iter().map(|t| t.nonce).collect();
    assert_eq!(nonces, vec![2, 1]);
    assert_eq!(state.unsigned_transactions.len(), 1);
    assert!(state.unsigned_transactions.contains_key("0xa3"));
    assert_eq!(state.loading, None);
    assert!(wallet.get_seed().await.is_err());
}
