use serde_json::json;
use uqbar_core::{TransactionStatus, WalletPoke};

use super::test_utils::*;
use crate::{
    Confirmation, Notification, SignerProviders, SigningFlow, SigningState, TransactionRequest,
    ValidationError, WalletError,
};

#[tokio::test]
#[tracing_test::traced_test]
async fn test_hot_key_transfer_is_signed_submitted_and_confirmed() {
    let holder = raw(ADDRESS);
    let fake = fake_agent(accounts_json([hot_account("main")]));
    let wallet = loaded_wallet(&fake, SignerProviders::default()).await;
    let subscriptions = wallet.spawn_subscriptions();
    wait_until(|| fake.subscribe_count("/book-updates") > 0 && fake.subscribe_count("/tx-updates") > 0)
        .await;

    fake.push_event("/book-updates", zig_book(&holder, 100));
    wait_until(|| wallet.store().read(|state| state.assets.contains_key(&holder))).await;
    let token = wallet.store().read(|state| state.assets[&holder][ZIG_ITEM].clone());

    let mut flow = SigningFlow::new(wallet.clone());
    let hash = flow
        .generate(&TransactionRequest::Token {
            token,
            destination: RECIPIENT.to_owned(),
            amount: "0.05".to_owned(),
        })
        .await
        .unwrap();
    assert_eq!(flow.state(), &SigningState::NeedsSignature { hash: hash.clone() });
    assert!(wallet
        .store()
        .read(|state| state.unsigned_transactions.contains_key(&hash)));

    let generated = fake.pokes_named("transaction");
    assert_eq!(generated.len(), 1);
    assert_eq!(generated[0]["from"], holder.as_str());
    assert_eq!(generated[0]["action"]["give"]["amount"], "5");
    assert_eq!(generated[0]["action"]["give"]["to"], raw(RECIPIENT).as_str());

    flow.sign().await.unwrap();
    assert_eq!(
        flow.state(),
        &SigningState::SubmittedConfirmation { hash: hash.clone() }
    );
    let submitted = fake.pokes_named("submit-signed");
    assert_eq!(submitted.len(), 1);
    assert_eq!(submitted[0]["hash"], hash.as_str());
    assert_eq!(submitted[0]["from"], holder.as_str());
    assert_eq!(submitted[0]["gas"], json!({ "rate": 1, "bud": 1_000_000 }));
    assert!(submitted[0].get("eth-hash").is_none());
    let v = submitted[0]["sig"]["v"].as_u64().unwrap();
    assert!(v == 27 || v == 28);
    assert!(fake.pending(&holder).is_empty());
    assert!(wallet
        .store()
        .read(|state| state.unsigned_transactions.is_empty()));
    assert_eq!(flow.confirmation(), Some(Confirmation::Waiting));

    let mut notifications = wallet.store().notifications();
    fake.push_event("/tx-updates", tx_event(&hash, "101", &holder));
    wait_until(|| {
        flow.confirmation() == Some(Confirmation::InProgress(TransactionStatus::SUBMITTED))
    })
    .await;

    fake.push_event("/tx-updates", tx_event(&hash, "200", &holder));
    let done = flow.wait_for_confirmation().await.unwrap();
    assert!(done.status.is_success());
    assert!(done.created.is_some());
    assert!(matches!(flow.confirmation(), Some(Confirmation::Finished(_))));
    assert_eq!(
        notifications.try_recv().unwrap(),
        Notification::TransactionConfirmed { hash: hash.clone() }
    );
    assert_eq!(
        wallet
            .store()
            .read(|state| state.most_recent_transaction.as_ref().map(|t| t.hash.clone())),
        Some(hash)
    );

    for handle in subscriptions {
        handle.abort();
    }
}

#[tokio::test]
async fn test_transfer_over_balance_never_reaches_the_agent() {
    let holder = raw(ADDRESS);
    let fake = fake_agent(accounts_json([hot_account("main")]));
    let wallet = loaded_wallet(&fake, SignerProviders::default()).await;
    let token = give_zigs(&wallet, &holder, 100);
    let mut notifications = wallet.store().notifications();

    let mut flow = SigningFlow::new(wallet.clone());
    let err = flow
        .generate(&TransactionRequest::Token {
            token: token.clone(),
            destination: RECIPIENT.to_owned(),
            amount: "1.5".to_owned(),
        })
        .await
        .unwrap_err();
    assert!(matches!(
        err,
        WalletError::Validation(ValidationError::InsufficientBalance { .. })
    ));

    let err = flow
        .generate(&TransactionRequest::Token {
            token,
            destination: "0x1234".to_owned(),
            amount: "1".to_owned(),
        })
        .await
        .unwrap_err();
    assert!(matches!(
        err,
        WalletError::Validation(ValidationError::InvalidAddress(_))
    ));

    assert!(fake.pokes().is_empty());
    assert_eq!(flow.state(), &SigningState::NoPendingHash);
    assert!(matches!(notifications.try_recv(), Ok(Notification::Alert(_))));
}

#[tokio::test]
#[tracing_test::traced_test]
async fn test_rejected_submission_keeps_the_transaction_pending() {
    let holder = raw(ADDRESS);
    let fake = fake_agent(accounts_json([hot_account("main")]));
    let wallet = loaded_wallet(&fake, SignerProviders::default()).await;
    let token = give_zigs(&wallet, &holder, 100);

    let mut flow = SigningFlow::new(wallet.clone());
    let hash = flow
        .generate(&TransactionRequest::Token {
            token,
            destination: RECIPIENT.to_owned(),
            amount: "0.5".to_owned(),
        })
        .await
        .unwrap();

    let mut notifications = wallet.store().notifications();
    fake.fail_next_poke("sequencer unavailable");
    let err = flow.sign().await.unwrap_err();
    assert!(matches!(err, WalletError::Submission(_)));
    assert!(err.is_retryable());
    assert!(logs_contain("Submission failed"));
    assert_eq!(flow.state(), &SigningState::NeedsSignature { hash: hash.clone() });
    assert!(fake.pending(&holder).contains_key(&hash));
    assert!(wallet
        .store()
        .read(|state| state.unsigned_transactions.contains_key(&hash)));
    assert!(matches!(notifications.try_recv(), Ok(Notification::Alert(_))));

    flow.sign().await.unwrap();
    assert_eq!(fake.pokes_named("submit-signed").len(), 2);
    assert_eq!(flow.state(), &SigningState::SubmittedConfirmation { hash });
}

#[tokio::test]
async fn test_node_signs_hot_wallets_when_configured() {
    let holder = raw(ADDRESS);
    let fake = fake_agent(accounts_json([hot_account("main")]));
    let mut settings = test_settings();
    settings.node_signs_hot_wallets = true;
    let wallet = wallet(&fake, settings, SignerProviders::default());
    wallet.load().await.unwrap();

    let mut flow = SigningFlow::new(wallet.clone());
    flow.set_gas(2, 500_000);
    let hash = flow
        .generate(&TransactionRequest::custom(&holder, ZIG_CONTRACT, "0x0", "[%mint 1]"))
        .await
        .unwrap();
    flow.sign().await.unwrap();

    assert!(fake.pokes_named("submit-signed").is_empty());
    let expected = WalletPoke::Submit {
        from: holder.clone(),
        hash: hash.clone(),
        gas: flow.gas(),
    };
    assert_eq!(fake.pokes().last(), Some(&serde_json::to_value(&expected).unwrap()));
    assert!(fake.pending(&holder).is_empty());
}

#[tokio::test]
async fn test_discarding_deletes_the_pending_transaction() {
    let holder = raw(ADDRESS);
    let fake = fake_agent(accounts_json([hot_account("main")]));
    let wallet = loaded_wallet(&fake, SignerProviders::default()).await;

    let mut flow = SigningFlow::new(wallet.clone());
    let hash = flow
        .generate(&TransactionRequest::custom(&holder, ZIG_CONTRACT, "0x0", "[%mint\n 1]"))
        .await
        .unwrap();
    assert_eq!(fake.pokes_named("transaction")[0]["action"]["text"], "[%mint 1]");

    flow.discard().await.unwrap();
    assert_eq!(flow.state(), &SigningState::NoPendingHash);
    assert_eq!(
        fake.pokes_named("delete-pending"),
        vec![json!({ "from": holder, "hash": hash })]
    );
    assert!(wallet
        .store()
        .read(|state| state.unsigned_transactions.is_empty()));
}

#[tokio::test]
async fn test_flow_rejects_out_of_order_commands() {
    let holder = raw(ADDRESS);
    let fake = fake_agent(accounts_json([hot_account("main")]));
    let wallet = loaded_wallet(&fake, SignerProviders::default()).await;
    let mut flow = SigningFlow::new(wallet.clone());

    let err = flow.sign().await.unwrap_err();
    assert!(matches!(
        err,
        WalletError::InvalidState {
            expected: "needs_signature",
            ..
        }
    ));
    assert!(matches!(
        flow.select("0xdead.beef"),
        Err(WalletError::UnknownPendingTransaction(_))
    ));
    assert!(flow.unlock(PASSWORD).await.is_err());
    assert!(flow.reconnected().is_err());
    assert!(flow.wait_for_confirmation().await.is_err());

    fake.insert_pending(
        &holder,
        "0xbeef",
        json!({ "from": holder, "status": "100", "nonce": "3", "contract": ZIG_CONTRACT, "town": "0x0" }),
    );
    wallet.refresh_pending().await.unwrap();
    flow.select("0xbeef").unwrap();
    assert_eq!(
        flow.state(),
        &SigningState::NeedsSignature {
            hash: "0xbeef".to_owned()
        }
    );
    flow.reset();
    assert_eq!(flow.state(), &SigningState::NoPendingHash);
    assert!(fake.pokes().is_empty());
}
