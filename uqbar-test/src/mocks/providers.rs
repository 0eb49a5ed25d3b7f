#![allow(non_snake_case)]

use async_trait::async_trait;
use ethers_core::types::{Signature, H256};
use mockall::*;
use serde_json::Value;

use uqbar_core::*;

mock! {
    pub Eip1193Provider {
        pub fn _request(&self, method: &str, params: Vec<Value>) -> Result<Value, SignerError> {}
    }
}

impl std::fmt::Debug for MockEip1193Provider {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "MockEip1193Provider")
    }
}

#[async_trait]
impl Eip1193Provider for MockEip1193Provider {
    async fn request(&self, method: &str, params: Vec<Value>) -> Result<Value, SignerError> {
        self._request(method, params)
    }
}

mock! {
    pub WalletConnectSession {
        pub fn _accounts(&self) -> Vec<String> {}

        pub fn _request(&self, method: &str, params: Vec<Value>) -> Result<Value, SignerError> {}
    }
}

impl std::fmt::Debug for MockWalletConnectSession {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "MockWalletConnectSession")
    }
}

#[async_trait]
impl WalletConnectSession for MockWalletConnectSession {
    fn accounts(&self) -> Vec<String> {
        self._accounts()
    }

    async fn request(&self, method: &str, params: Vec<Value>) -> Result<Value, SignerError> {
        self._request(method, params)
    }
}

mock! {
    pub HardwareDevice {
        pub fn _address(&self, hdpath: Option<String>) -> Result<String, SignerError> {}

        pub fn _sign_digest(&self, address: &str, digest: H256) -> Result<Signature, SignerError> {}
    }
}

impl std::fmt::Debug for MockHardwareDevice {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "MockHardwareDevice")
    }
}

#[async_trait]
impl HardwareDevice for MockHardwareDevice {
    async fn address(&self, hdpath: Option<&str>) -> Result<String, SignerError> {
        self._address(hdpath.map(str::to_owned))
    }

    async fn sign_digest(&self, address: &str, digest: H256) -> Result<Signature, SignerError> {
        self._sign_digest(address, digest)
    }
}
