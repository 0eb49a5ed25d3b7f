use ethers_core::types::Signature;
use serde::{Deserialize, Serialize};

use crate::utils::add_hex_dots;

/// A secp256k1 signature in the form the wallet backend accepts: `r` and `s`
/// as dotted hex.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WalletSignature {
    /// Recovery id, 27 or 28
    pub v: u64,
    /// Dotted hex `r`
    pub r: String,
    /// Dotted hex `s`
    pub s: String,
}

impl From<Signature> for WalletSignature {
    fn from(sig: Signature) -> Self {
        Self {
            v: sig.v,
            r: add_hex_dots(&format!("{:x}", sig.r)),
            s: add_hex_dots(&format!("{:x}", sig.s)),
        }
    }
}

impl WalletSignature {
    /// Recovery id is one of the two legacy values
    pub fn is_well_formed(&self) -> bool {
        matches!(self.v, 27 | 28) && self.r.starts_with("0x") && self.s.starts_with("0x")
    }
}
