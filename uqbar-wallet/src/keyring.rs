//! Password protection of wallet keys and the in-memory ring of unlocked
//! keys.
//!
//! An encrypted key is a hex string of
//! `magic || version || m_cost || t_cost || p_cost || salt || nonce || ciphertext`.
//! The key encryption key is derived from the password with Argon2id and the
//! secret is sealed with ChaCha20-Poly1305, the header being authenticated as
//! associated data.

use std::collections::HashMap;

use argon2::{Algorithm, Argon2, Params, Version};
use chacha20poly1305::aead::{Aead, KeyInit, Payload};
use chacha20poly1305::{ChaCha20Poly1305, Key, Nonce};
use ethers_signers::LocalWallet;
use parking_lot::RwLock;
use rand::rngs::OsRng;
use rand::RngCore;
use tracing::{debug, info};
use uqbar_core::utils::remove_dots;
use uqbar_core::EncryptedWallet;
use zeroize::Zeroizing;

use crate::WalletError;

const MAGIC: &[u8; 4] = b"UQBK";
const VERSION: u8 = 1;
const SALT_LEN: usize = 16;
const NONCE_LEN: usize = 12;
const KEY_LEN: usize = 32;
const HEADER_LEN: usize = MAGIC.len() + 1 + 4 + 4 + 1 + SALT_LEN + NONCE_LEN;

/// Argon2id cost parameters
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct KdfParams {
    /// Memory in KiB
    pub m_cost: u32,
    /// Iterations
    pub t_cost: u32,
    /// Lanes
    pub p_cost: u8,
}

impl Default for KdfParams {
    fn default() -> Self {
        Self {
            m_cost: Params::DEFAULT_M_COST,
            t_cost: Params::DEFAULT_T_COST,
            p_cost: Params::DEFAULT_P_COST as u8,
        }
    }
}

fn derive_key(
    password: &str,
    salt: &[u8],
    params: KdfParams,
) -> Result<Zeroizing<[u8; KEY_LEN]>, WalletError> {
    let params = Params::new(
        params.m_cost,
        params.t_cost,
        params.p_cost as u32,
        Some(KEY_LEN),
    )
    .map_err(|e| WalletError::MalformedKey(format!("bad kdf parameters: {e}")))?;
    let mut key = Zeroizing::new([0u8; KEY_LEN]);
    Argon2::new(Algorithm::Argon2id, Version::V0x13, params)
        .hash_password_into(password.as_bytes(), salt, &mut key[..])
        .map_err(|e| WalletError::MalformedKey(format!("key derivation failed: {e}")))?;
    Ok(key)
}

/// Encrypt `secret` under `password`, returning the hex blob.
pub fn encrypt_secret(secret: &[u8], password: &str, params: KdfParams) -> Result<String, WalletError> {
    let mut salt = [0u8; SALT_LEN];
    let mut nonce = [0u8; NONCE_LEN];
    OsRng.fill_bytes(&mut salt);
    OsRng.fill_bytes(&mut nonce);

    let mut header = Vec::with_capacity(HEADER_LEN);
    header.extend_from_slice(MAGIC);
    header.push(VERSION);
    header.extend_from_slice(&params.m_cost.to_be_bytes());
    header.extend_from_slice(&params.t_cost.to_be_bytes());
    header.push(params.p_cost);
    header.extend_from_slice(&salt);
    header.extend_from_slice(&nonce);

    let kek = derive_key(password, &salt, params)?;
    let cipher = ChaCha20Poly1305::new(Key::from_slice(&kek[..]));
    let ciphertext = cipher
        .encrypt(
            Nonce::from_slice(&nonce),
            Payload {
                msg: secret,
                aad: &header,
            },
        )
        .map_err(|_| WalletError::MalformedKey("encryption failed".to_owned()))?;

    header.extend_from_slice(&ciphertext);
    Ok(hex::encode(header))
}

/// Decrypt a hex blob made by [`encrypt_secret`]. A wrong password and a
/// tampered blob are indistinguishable and both fail authentication.
pub fn decrypt_secret(blob: &str, password: &str) -> Result<Zeroizing<Vec<u8>>, WalletError> {
    let clean = remove_dots(blob);
    let bytes = hex::decode(clean.trim_start_matches("0x"))
        .map_err(|e| WalletError::MalformedKey(format!("not hex: {e}")))?;
    if bytes.len() <= HEADER_LEN || &bytes[..MAGIC.len()] != MAGIC {
        return Err(WalletError::MalformedKey("unrecognized key format".to_owned()));
    }
    let (header, ciphertext) = bytes.split_at(HEADER_LEN);
    if header[MAGIC.len()] != VERSION {
        return Err(WalletError::MalformedKey(format!(
            "unsupported key version {}",
            header[MAGIC.len()]
        )));
    }
    let read_u32 = |at: usize| u32::from_be_bytes([header[at], header[at + 1], header[at + 2], header[at + 3]]);
    let at = MAGIC.len() + 1;
    let m_cost = read_u32(at);
    let t_cost = read_u32(at + 4);
    let p_cost = header[at + 8];
    let salt = &header[at + 9..at + 9 + SALT_LEN];
    let nonce = &header[at + 9 + SALT_LEN..HEADER_LEN];

    let kek = derive_key(
        password,
        salt,
        KdfParams {
            m_cost,
            t_cost,
            p_cost,
        },
    )?;
    let cipher = ChaCha20Poly1305::new(Key::from_slice(&kek[..]));
    cipher
        .decrypt(
            Nonce::from_slice(nonce),
            Payload {
                msg: ciphertext,
                aad: header,
            },
        )
        .map(Zeroizing::new)
        .map_err(|_| WalletError::IncorrectPassword(String::new()))
}

/// Encrypt a hex private key for storage as an encrypted wallet's key.
pub fn encrypt_private_key(private_key: &str, password: &str, params: KdfParams) -> Result<String, WalletError> {
    let clean = Zeroizing::new(remove_dots(private_key));
    let bytes = Zeroizing::new(
        hex::decode(clean.trim_start_matches("0x"))
            .map_err(|e| WalletError::MalformedKey(format!("not hex: {e}")))?,
    );
    encrypt_secret(&bytes, password, params)
}

fn ring_key(address: &str) -> String {
    remove_dots(address).to_lowercase()
}

/// Keys of encrypted wallets unlocked during this session, by address.
/// Keys stay in memory until locked; the underlying signing keys are zeroized
/// on drop.
#[derive(Debug, Default)]
pub struct KeyRing {
    keys: RwLock<HashMap<String, LocalWallet>>,
}

impl KeyRing {
    /// An empty ring
    pub fn new() -> Self {
        Self::default()
    }

    /// Decrypt the wallet's key with `password` and keep it.
    pub fn unlock(&self, wallet: &EncryptedWallet, password: &str) -> Result<(), WalletError> {
        let address = &wallet.info.address;
        let secret = decrypt_secret(&wallet.encrypted_pk, password).map_err(|err| match err {
            WalletError::IncorrectPassword(_) => WalletError::IncorrectPassword(address.clone()),
            other => other,
        })?;
        let signer = LocalWallet::from_bytes(&secret)
            .map_err(|e| WalletError::MalformedKey(e.to_string()))?;
        info!(%address, "Unlocked wallet");
        self.keys.write().insert(ring_key(address), signer);
        Ok(())
    }

    /// Signing key for `address`, if unlocked
    pub fn signer(&self, address: &str) -> Option<LocalWallet> {
        self.keys.read().get(&ring_key(address)).cloned()
    }

    /// True if `address` has been unlocked
    pub fn is_unlocked(&self, address: &str) -> bool {
        self.keys.read().contains_key(&ring_key(address))
    }

    /// Forget the key for `address`
    pub fn lock(&self, address: &str) {
        if self.keys.write().remove(&ring_key(address)).is_some() {
            debug!(%address, "Locked wallet");
        }
    }

    /// Forget every key
    pub fn lock_all(&self) {
        self.keys.write().clear();
    }
}

#[cfg(test)]
mod test {
    use std::collections::BTreeMap;

    use ethers_signers::Signer;
    use uqbar_core::AccountInfo;

    use super::*;

    const KEY: &str = "0x4c0883a69102937d6231471b5dbb6204fe5129617082792ae468d01a3f362318";

    fn cheap() -> KdfParams {
        KdfParams {
            m_cost: 64,
            t_cost: 1,
            p_cost: 1,
        }
    }

    fn wallet(encrypted_pk: String) -> EncryptedWallet {
        EncryptedWallet {
            info: AccountInfo {
                nick: "vault".into(),
                address: "0x2c7536e3605d9c16a7a3d7b1898e529396a65c23".into(),
                raw_address: "0x2c75.36e3.605d.9c16.a7a3.d7b1.898e.5293.96a6.5c23".into(),
                nonces: BTreeMap::new(),
            },
            encrypted_pk,
            encrypted_seed: String::new(),
        }
    }

    #[test]
    fn secrets_round_trip() {
        let blob = encrypt_secret(b"attack at dawn", "hunter2", cheap()).unwrap();
        assert_eq!(&*decrypt_secret(&blob, "hunter2").unwrap(), b"attack at dawn");
        assert!(matches!(
            decrypt_secret(&blob, "hunter3"),
            Err(WalletError::IncorrectPassword(_))
        ));
    }

    #[test]
    fn tampered_blobs_fail() {
        let blob = encrypt_secret(b"secret", "pw", cheap()).unwrap();
        let mut bytes = hex::decode(&blob).unwrap();
        let last = bytes.len() - 1;
        bytes[last] ^= 1;
        assert!(matches!(
            decrypt_secret(&hex::encode(&bytes), "pw"),
            Err(WalletError::IncorrectPassword(_))
        ));
        assert!(matches!(
            decrypt_secret("0xdead", "pw"),
            Err(WalletError::MalformedKey(_))
        ));
    }

    #[test]
    fn unlock_keeps_the_key_for_the_session() {
        let ring = KeyRing::new();
        let wallet = wallet(encrypt_private_key(KEY, "pw", cheap()).unwrap());
        let err = ring.unlock(&wallet, "wrong").unwrap_err();
        assert!(matches!(err, WalletError::IncorrectPassword(ref a) if a == &wallet.info.address));
        assert!(!ring.is_unlocked("0x2c75.36e3.605d.9c16.a7a3.d7b1.898e.5293.96a6.5c23"));

        ring.unlock(&wallet, "pw").unwrap();
        let signer = ring
            .signer("0x2c75.36e3.605d.9c16.a7a3.d7b1.898e.5293.96a6.5c23")
            .unwrap();
        assert_eq!(
            format!("{:?}", signer.address()),
            "0x2c7536e3605d9c16a7a3d7b1898e529396a65c23"
        );

        ring.lock(&wallet.info.address);
        assert!(ring.signer(&wallet.info.address).is_none());
    }
}
