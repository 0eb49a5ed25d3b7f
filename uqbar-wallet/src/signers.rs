use std::collections::HashMap;
use std::str::FromStr;
use std::sync::Arc;

use async_trait::async_trait;
use derive_new::new;
use ethers_core::types::Signature;
use ethers_signers::{LocalWallet, Signer};
use serde_json::{json, Value};
use tracing::{debug, instrument, warn};
use uqbar_core::utils::remove_dots;
use uqbar_core::{
    Account, Eip1193Provider, HardwareDevice, HotWallet, SignerError, SignerKind, SigningRequest,
    TransactionSigner, WalletConnectSession, WalletSignature, WalletType,
};

use crate::{KeyRing, WalletError};

const NOT_AUTHORIZED: &str =
    "You must be logged in and then authorize this site to sign messages with your wallet.";

/// Signs with a key held in this process
#[derive(Debug, Clone, new)]
pub struct LocalKeySigner {
    wallet: LocalWallet,
    kind: SignerKind,
}

impl LocalKeySigner {
    /// Signer for a hot wallet's plaintext key
    pub fn from_hot_wallet(hot: &HotWallet) -> Result<Self, WalletError> {
        let key = remove_dots(&hot.private_key);
        let key = format!("{:0>64}", key.trim_start_matches("0x"));
        let wallet = LocalWallet::from_str(&key).map_err(|e| WalletError::MalformedKey(e.to_string()))?;
        Ok(Self::new(wallet, SignerKind::HotKey))
    }
}

#[async_trait]
impl TransactionSigner for LocalKeySigner {
    fn kind(&self) -> SignerKind {
        self.kind
    }

    async fn sign_transaction(&self, request: &SigningRequest) -> Result<WalletSignature, SignerError> {
        let signature = self
            .wallet
            .sign_message(request.message.as_bytes())
            .await
            .map_err(|e| SignerError::Other(Box::new(e)))?;
        Ok(signature.into())
    }
}

/// Parse a 65-byte hex signature as returned by `personal_sign`
fn parse_signature(value: &Value) -> Result<WalletSignature, SignerError> {
    let hex = value
        .as_str()
        .ok_or_else(|| SignerError::MalformedSignature(value.to_string()))?;
    let mut signature =
        Signature::from_str(hex).map_err(|_| SignerError::MalformedSignature(hex.to_owned()))?;
    if signature.v < 27 {
        signature.v += 27;
    }
    Ok(signature.into())
}

/// Signs with an injected browser wallet (MetaMask, Brave, ...)
#[derive(Debug, Clone, new)]
pub struct BrowserExtensionSigner {
    provider: Arc<dyn Eip1193Provider>,
}

#[async_trait]
impl TransactionSigner for BrowserExtensionSigner {
    fn kind(&self) -> SignerKind {
        SignerKind::BrowserExtension
    }

    #[instrument(skip_all, fields(address = %request.address))]
    async fn sign_transaction(&self, request: &SigningRequest) -> Result<WalletSignature, SignerError> {
        let authorize = self.provider.request("eth_requestAccounts", vec![]).await;
        let signed = match authorize {
            Ok(_) => {
                self.provider
                    .request("personal_sign", vec![json!(request.message), json!(request.address)])
                    .await
            }
            Err(err) => Err(err),
        };
        let signed = signed.map_err(|err| {
            warn!(error = %err, "Browser wallet did not sign");
            SignerError::Rejected(NOT_AUTHORIZED.to_owned())
        })?;
        parse_signature(&signed)
    }
}

/// Signs through a WalletConnect session
#[derive(Debug, Clone, new)]
pub struct WalletConnectSigner {
    session: Arc<dyn WalletConnectSession>,
}

#[async_trait]
impl TransactionSigner for WalletConnectSigner {
    fn kind(&self) -> SignerKind {
        SignerKind::WalletConnect
    }

    #[instrument(skip_all, fields(address = %request.address))]
    async fn sign_transaction(&self, request: &SigningRequest) -> Result<WalletSignature, SignerError> {
        let accounts = self.session.accounts();
        if !accounts.iter().any(|a| a.eq_ignore_ascii_case(&request.address)) {
            return Err(SignerError::WrongAccount {
                connected: accounts.first().cloned().unwrap_or_default(),
                expected: request.address.clone(),
            });
        }
        let message = json!(request.message);
        let signed = self
            .session
            .request("personal_sign", vec![message.clone(), json!(request.address), message])
            .await?;
        parse_signature(&signed)
    }
}

/// Signs the digest on a hardware device
#[derive(Debug, Clone, new)]
pub struct HardwareSigner {
    device: Arc<dyn HardwareDevice>,
}

#[async_trait]
impl TransactionSigner for HardwareSigner {
    fn kind(&self) -> SignerKind {
        SignerKind::Hardware
    }

    async fn sign_transaction(&self, request: &SigningRequest) -> Result<WalletSignature, SignerError> {
        let signature = self.device.sign_digest(&request.address, request.eth_hash).await?;
        Ok(signature.into())
    }
}

/// External signers available to this session
#[derive(Debug, Clone, Default)]
pub struct SignerProviders {
    browser: Option<Arc<dyn Eip1193Provider>>,
    wallet_connect: Option<Arc<dyn WalletConnectSession>>,
    hardware: HashMap<WalletType, Arc<dyn HardwareDevice>>,
}

impl SignerProviders {
    /// Use `provider` for browser wallets
    pub fn with_browser(mut self, provider: Arc<dyn Eip1193Provider>) -> Self {
        self.browser = Some(provider);
        self
    }

    /// Use `session` for WalletConnect wallets
    pub fn with_wallet_connect(mut self, session: Arc<dyn WalletConnectSession>) -> Self {
        self.wallet_connect = Some(session);
        self
    }

    /// Use `device` for hardware wallets of `wallet_type`
    pub fn with_hardware(mut self, wallet_type: WalletType, device: Arc<dyn HardwareDevice>) -> Self {
        self.hardware.insert(wallet_type, device);
        self
    }

    /// Browser provider
    pub fn browser(&self) -> Result<&Arc<dyn Eip1193Provider>, SignerError> {
        self.browser
            .as_ref()
            .ok_or_else(|| SignerError::Unavailable("browser wallet".to_owned()))
    }

    /// WalletConnect session
    pub fn wallet_connect(&self) -> Result<&Arc<dyn WalletConnectSession>, SignerError> {
        self.wallet_connect
            .as_ref()
            .ok_or_else(|| SignerError::Unavailable("WalletConnect".to_owned()))
    }

    /// Hardware device for `wallet_type`
    pub fn hardware(&self, wallet_type: WalletType) -> Result<&Arc<dyn HardwareDevice>, SignerError> {
        self.hardware
            .get(&wallet_type)
            .ok_or_else(|| SignerError::Unavailable(wallet_type.to_string()))
    }

    /// Signer for an imported account of `wallet_type`
    fn signer_for(&self, wallet_type: WalletType) -> Result<Option<Arc<dyn TransactionSigner>>, SignerError> {
        let signer: Arc<dyn TransactionSigner> = match wallet_type {
            t if t.is_browser() => Arc::new(BrowserExtensionSigner::new(self.browser()?.clone())),
            WalletType::Walletconnect => {
                Arc::new(WalletConnectSigner::new(self.wallet_connect()?.clone()))
            }
            t if t.is_hardware() => Arc::new(HardwareSigner::new(self.hardware(t)?.clone())),
            _ => return Ok(None),
        };
        Ok(Some(signer))
    }
}

/// Who signs for an address
#[derive(Debug, Clone)]
pub enum SignerSelection {
    /// Sign here and submit with `submit-signed`
    Signer(Arc<dyn TransactionSigner>),
    /// The node holds the key; submit with `submit`
    Node,
    /// The key is encrypted and has not been unlocked
    AwaitingPassword,
}

/// Find the signer for `from`. Encrypted wallets are looked up first, then
/// imported ones, then hot wallets; an address none of them owns cannot be
/// signed for.
pub fn resolve_signer(
    accounts: &[Account],
    keyring: &KeyRing,
    providers: &SignerProviders,
    node_signs_hot_wallets: bool,
    from: &str,
) -> Result<SignerSelection, WalletError> {
    let unsupported = || WalletError::UnsupportedWalletType(from.to_owned());
    let owned = |account: &&Account| account.matches(from);

    if let Some(Account::Encrypted(wallet)) = accounts
        .iter()
        .filter(owned)
        .find(|a| matches!(a, Account::Encrypted(_)))
    {
        return Ok(match keyring.signer(&wallet.info.address) {
            Some(key) => {
                SignerSelection::Signer(Arc::new(LocalKeySigner::new(key, SignerKind::EncryptedKey)))
            }
            None => SignerSelection::AwaitingPassword,
        });
    }

    if let Some(Account::Imported(wallet)) = accounts
        .iter()
        .filter(owned)
        .find(|a| matches!(a, Account::Imported(_)))
    {
        let wallet_type = wallet.wallet_type.ok_or_else(unsupported)?;
        debug!(%wallet_type, address = %from, "Imported signer");
        return providers
            .signer_for(wallet_type)?
            .map(SignerSelection::Signer)
            .ok_or_else(unsupported);
    }

    if let Some(Account::Hot(hot)) = accounts
        .iter()
        .filter(owned)
        .find(|a| matches!(a, Account::Hot(_)))
    {
        if node_signs_hot_wallets {
            return Ok(SignerSelection::Node);
        }
        return Ok(SignerSelection::Signer(Arc::new(LocalKeySigner::from_hot_wallet(hot)?)));
    }

    Err(unsupported())
}
