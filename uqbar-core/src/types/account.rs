use std::collections::BTreeMap;
use std::fmt::{Debug, Formatter};

use serde::Deserialize;
use serde_json::Value;

use crate::utils::{remove_dots, ud};
use crate::FormatError;

/// Kind of external signer behind an imported account
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    strum::Display,
    strum::EnumString,
    serde::Serialize,
    serde::Deserialize,
)]
#[strum(serialize_all = "kebab-case")]
#[serde(rename_all = "kebab-case")]
pub enum WalletType {
    /// Key held by the node
    Hot,
    /// Ledger hardware wallet
    Ledger,
    /// Trezor hardware wallet
    Trezor,
    /// MetaMask browser extension
    Metamask,
    /// Brave browser wallet
    Brave,
    /// Any other injected EIP-1193 provider
    OtherBrowser,
    /// WalletConnect session
    Walletconnect,
}

impl WalletType {
    /// Signs through an injected browser provider
    pub fn is_browser(self) -> bool {
        matches!(self, Self::Metamask | Self::Brave | Self::OtherBrowser)
    }

    /// Signs on a hardware device
    pub fn is_hardware(self) -> bool {
        matches!(self, Self::Ledger | Self::Trezor)
    }
}

/// Which registry an account belongs to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, strum::Display)]
#[strum(serialize_all = "lowercase")]
pub enum WalletKind {
    /// Plaintext key available to this process
    Hot,
    /// Key encrypted under a password
    Encrypted,
    /// External signer
    Imported,
}

/// Fields common to every account
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AccountInfo {
    /// User-facing nickname
    pub nick: String,
    /// Address with dots removed
    pub address: String,
    /// Canonical dotted address
    pub raw_address: String,
    /// Next nonce per town
    pub nonces: BTreeMap<String, u64>,
}

/// An account whose key is held in plaintext, either here or on the node.
#[derive(Clone, PartialEq, Eq)]
pub struct HotWallet {
    /// Common fields
    pub info: AccountInfo,
    /// Hex private key with dots removed
    pub private_key: String,
}

impl Debug for HotWallet {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HotWallet")
            .field("info", &self.info)
            .field("private_key", &"<redacted>")
            .finish()
    }
}

/// An account whose key and seed are encrypted under a user password.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EncryptedWallet {
    /// Common fields
    pub info: AccountInfo,
    /// Hex encoded encrypted private key
    pub encrypted_pk: String,
    /// Hex encoded encrypted seed
    pub encrypted_seed: String,
}

/// An account signed for by an external provider. `wallet_type` is `None`
/// for addresses that are only tracked.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImportedWallet {
    /// Common fields
    pub info: AccountInfo,
    /// Provider that signs for this address
    pub wallet_type: Option<WalletType>,
}

/// Any account known to the wallet
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Account {
    /// Plaintext key
    Hot(HotWallet),
    /// Password encrypted key
    Encrypted(EncryptedWallet),
    /// External signer or watch-only
    Imported(ImportedWallet),
}

impl Account {
    /// Common fields
    pub fn info(&self) -> &AccountInfo {
        match self {
            Self::Hot(w) => &w.info,
            Self::Encrypted(w) => &w.info,
            Self::Imported(w) => &w.info,
        }
    }

    /// Registry the account belongs to
    pub fn kind(&self) -> WalletKind {
        match self {
            Self::Hot(_) => WalletKind::Hot,
            Self::Encrypted(_) => WalletKind::Encrypted,
            Self::Imported(_) => WalletKind::Imported,
        }
    }

    /// True if `address` (dotted or not) names this account
    pub fn matches(&self, address: &str) -> bool {
        self.info()
            .address
            .eq_ignore_ascii_case(&remove_dots(address))
    }

    /// Decode an `/accounts` scry, `{pubkey: raw_account}`, sorted by
    /// nickname.
    pub fn list_from_wire(value: &Value) -> Result<Vec<Self>, FormatError> {
        let Some(map) = value.as_object() else {
            return Err(FormatError::malformed("accounts", "not an object"));
        };
        let mut accounts = map
            .iter()
            .map(|(pubkey, raw)| Self::from_wire(pubkey, raw))
            .collect::<Result<Vec<_>, _>>()?;
        accounts.sort_by(|a, b| a.info().nick.cmp(&b.info().nick));
        Ok(accounts)
    }

    /// Decode one account. Accounts with `priv`/`seed` are encrypted; legacy
    /// accounts without a private key are imported, their nickname carrying
    /// the provider as `nick//type`.
    pub fn from_wire(pubkey: &str, value: &Value) -> Result<Self, FormatError> {
        let raw = RawAccount::deserialize(value).map_err(|e| FormatError::malformed("account", e))?;
        let raw_address = raw.pubkey.unwrap_or_else(|| pubkey.to_owned());
        let info = |nick: String, nonces: BTreeMap<String, u64>| AccountInfo {
            nick,
            address: remove_dots(&raw_address),
            raw_address: raw_address.clone(),
            nonces,
        };
        let nonces = raw.nonces.into_iter().map(|(k, v)| (k, v.0)).collect();
        match (raw.encrypted_pk, raw.encrypted_seed, raw.privkey) {
            (Some(encrypted_pk), Some(encrypted_seed), _) => Ok(Self::Encrypted(EncryptedWallet {
                info: info(raw.nick, nonces),
                encrypted_pk,
                encrypted_seed,
            })),
            (_, _, Some(privkey)) if !remove_dots(&privkey).is_empty() => Ok(Self::Hot(HotWallet {
                info: info(raw.nick, nonces),
                private_key: remove_dots(&privkey),
            })),
            _ => {
                let (nick, wallet_type) = split_imported_nick(&raw.nick);
                Ok(Self::Imported(ImportedWallet {
                    info: info(nick, nonces),
                    wallet_type,
                }))
            }
        }
    }
}

/// Split an imported account's stored nickname `nick//type`.
pub fn split_imported_nick(stored: &str) -> (String, Option<WalletType>) {
    match stored.split_once("//") {
        Some((nick, kind)) => (nick.to_owned(), kind.parse().ok()),
        None => (stored.to_owned(), None),
    }
}

/// Stored nickname for an imported account.
pub fn imported_nick(nick: &str, wallet_type: WalletType) -> String {
    format!("{nick}//{wallet_type}")
}

#[derive(Debug, Deserialize)]
struct Nonce(#[serde(deserialize_with = "ud::deserialize")] u64);

#[derive(Debug, Deserialize)]
struct RawAccount {
    #[serde(default)]
    nick: String,
    #[serde(default)]
    pubkey: Option<String>,
    #[serde(default)]
    privkey: Option<String>,
    #[serde(default, rename = "priv")]
    encrypted_pk: Option<String>,
    #[serde(default, rename = "seed")]
    encrypted_seed: Option<String>,
    #[serde(default)]
    nonces: BTreeMap<String, Nonce>,
}

/// Mnemonic and optional password of the node's hot wallet seed
#[derive(Clone, PartialEq, Eq, Deserialize)]
pub struct Seed {
    /// BIP-39 mnemonic
    pub mnemonic: String,
    /// Seed password
    #[serde(default)]
    pub password: Option<String>,
}

impl Debug for Seed {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str("Seed(<redacted>)")
    }
}

#[cfg(test)]
mod test {
    use serde_json::json;

    use super::*;

    #[test]
    fn decodes_each_account_kind() {
        let accounts = Account::list_from_wire(&json!({
            "0x7a9a.97e0": {
                "nick": "zed",
                "pubkey": "0x7a9a.97e0",
                "privkey": "0xdead.beef",
                "nonces": { "0x0": "1.001" }
            },
            "0x1234.5678": {
                "nick": "alpha",
                "priv": "c0ffee",
                "seed": "beef",
                "nonces": {}
            },
            "0xaaaa.bbbb": {
                "nick": "ledger one//ledger",
                "pubkey": "0xaaaa.bbbb",
                "privkey": "",
                "nonces": { "0x0": 4 }
            },
            "0xcccc": { "nick": "watched", "pubkey": "0xcccc", "privkey": "" }
        }))
        .unwrap();

        let nicks: Vec<_> = accounts.iter().map(|a| a.info().nick.as_str()).collect();
        assert_eq!(nicks, vec!["alpha", "ledger one", "watched", "zed"]);

        assert_eq!(accounts[0].kind(), WalletKind::Encrypted);
        assert_eq!(accounts[0].info().raw_address, "0x1234.5678");
        assert_eq!(accounts[0].info().address, "0x12345678");

        let Account::Imported(ledger) = &accounts[1] else {
            panic!("expected imported account");
        };
        assert_eq!(ledger.wallet_type, Some(WalletType::Ledger));
        assert_eq!(ledger.info.nonces["0x0"], 4);

        let Account::Imported(watched) = &accounts[2] else {
            panic!("expected imported account");
        };
        assert_eq!(watched.wallet_type, None);

        let Account::Hot(hot) = &accounts[3] else {
            panic!("expected hot account");
        };
        assert_eq!(hot.private_key, "0xdeadbeef");
        assert_eq!(hot.info.nonces["0x0"], 1001);
        assert!(!format!("{hot:?}").contains("deadbeef"));
        assert!(accounts[3].matches("0x7a9a97e0"));
    }

    #[test]
    fn imported_nicks() {
        assert_eq!(
            imported_nick("main", WalletType::OtherBrowser),
            "main//other-browser"
        );
        assert_eq!(
            split_imported_nick("main//walletconnect"),
            ("main".to_owned(), Some(WalletType::Walletconnect))
        );
        assert_eq!(split_imported_nick("main"), ("main".to_owned(), None));
    }
}
