use std::fmt::Debug;

use async_trait::async_trait;
use auto_impl::auto_impl;
use futures::stream::BoxStream;
use serde::de::DeserializeOwned;
use serde_json::Value;
use tracing::instrument;

use crate::{ChainResult, WalletPoke};

/// One item delivered on a subscription
#[derive(Debug, Clone, PartialEq)]
pub enum SubscriptionEvent {
    /// A fact pushed by the agent
    Event(Value),
    /// The subscription failed; it is closed
    Error(String),
    /// The agent closed the subscription
    Quit,
}

/// Stream of subscription events; ends when the subscription closes
pub type SubscriptionStream = BoxStream<'static, SubscriptionEvent>;

/// Connection to the node that runs the wallet agent.
///
/// `scry` reads a resource, `poke` submits a command, `subscribe` opens a push
/// feed. Payloads are plain JSON at this boundary.
#[async_trait]
#[auto_impl(&, Box, Arc)]
pub trait ChainClient: Send + Sync + Debug {
    /// Read `path` from `app`
    async fn scry(&self, app: &str, path: &str) -> ChainResult<Value>;

    /// Send `json` with `mark` to `app`
    async fn poke(&self, app: &str, mark: &str, json: Value) -> ChainResult<()>;

    /// Subscribe to `path` on `app`
    async fn subscribe(&self, app: &str, path: &str) -> ChainResult<SubscriptionStream>;
}

/// Typed helpers on top of `ChainClient`, auto-implemented.
#[async_trait]
pub trait ChainClientExt {
    /// Scry and decode the result
    async fn scry_as<T: DeserializeOwned + Send>(&self, app: &str, path: &str) -> ChainResult<T>;

    /// Serialize a wallet command and poke it
    async fn poke_wallet(&self, app: &str, mark: &str, poke: &WalletPoke) -> ChainResult<()>;
}

#[async_trait]
impl<C: ChainClient + ?Sized> ChainClientExt for C {
    async fn scry_as<T: DeserializeOwned + Send>(&self, app: &str, path: &str) -> ChainResult<T> {
        let value = self.scry(app, path).await?;
        Ok(serde_json::from_value(value)?)
    }

    #[instrument(skip_all, fields(app = %app, command = poke.name()))]
    async fn poke_wallet(&self, app: &str, mark: &str, poke: &WalletPoke) -> ChainResult<()> {
        let json = serde_json::to_value(poke)?;
        self.poke(app, mark, json).await
    }
}
