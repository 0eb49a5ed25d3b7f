#![allow(non_snake_case)]

use async_trait::async_trait;
use mockall::*;
use serde_json::Value;

use uqbar_core::*;

mock! {
    pub ChainClient {
        pub fn _scry(&self, app: &str, path: &str) -> ChainResult<Value> {}

        pub fn _poke(&self, app: &str, mark: &str, json: Value) -> ChainResult<()> {}

        pub fn _subscribe(&self, app: &str, path: &str) -> ChainResult<SubscriptionStream> {}
    }
}

impl std::fmt::Debug for MockChainClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "MockChainClient")
    }
}

#[async_trait]
impl ChainClient for MockChainClient {
    async fn scry(&self, app: &str, path: &str) -> ChainResult<Value> {
        self._scry(app, path)
    }

    async fn poke(&self, app: &str, mark: &str, json: Value) -> ChainResult<()> {
        self._poke(app, mark, json)
    }

    async fn subscribe(&self, app: &str, path: &str) -> ChainResult<SubscriptionStream> {
        self._subscribe(app, path)
    }
}
