//! Settings and configuration for the wallet client
//!
//! ## Configuration
//!
//! The wallet reads settings from config files and then from the environment.
//!
//! #### N.B.: Environment variable names correspond 1:1 with the config file's JSON object hierarchy.
//!
//! Any environment variable prefixed with `UQBAR_WALLET_` is read as an
//! override applied against the structure loaded from the JSON files. Nested
//! keys are separated by a double underscore. For example, if the config file
//! is:
//!
//! ```json
//! {
//!   "gas": { "rate": 1, "budget": 1000000 },
//!   "nickname_debounce_ms": 1000
//! }
//! ```
//!
//! then `UQBAR_WALLET_GAS__RATE=2` overrides `gas.rate` and
//! `UQBAR_WALLET_NICKNAME_DEBOUNCE_MS=500` overrides the debounce window.
//!
//! ### Configuration value precedence
//!
//! Configuration key/value pairs are loaded in the following order, with later
//! sources taking precedence:
//!
//! 1. Every `*.json` file in `./config`, if the directory exists.
//! 2. The files listed in `CONFIG_FILES`, comma separated, in order.
//! 3. Environment variables prefixed with `UQBAR_WALLET_`.
//!
//! Every field has a default, so an empty configuration is valid.

use std::collections::HashMap;
use std::env;
use std::path::Path;
use std::time::Duration;

use eyre::Result;
use serde::Deserialize;
use uqbar_core::{WALLET_APP, WALLET_POKE_MARK};

use crate::{PollConfig, ResubscribeConfig};

pub use trace::{Level, Style, TracingConfig};

mod loader;
/// Tracing subscriber management
pub mod trace;

/// Prefix of environment overrides
pub const ENV_PREFIX: &str = "UQBAR_WALLET";

/// Gas used when the user does not pick any
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct GasDefaults {
    /// Gas price
    pub rate: u64,
    /// Gas limit
    pub budget: u64,
}

impl Default for GasDefaults {
    fn default() -> Self {
        Self {
            rate: 1,
            budget: 1_000_000,
        }
    }
}

/// Everything the wallet client can be configured with
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct WalletSettings {
    /// Agent the wallet talks to
    pub app: String,
    /// Mark of every wallet poke
    pub mark: String,
    /// Desk whose installation `await_installed` waits for
    pub desk: String,
    /// Default gas for submissions
    pub gas: GasDefaults,
    /// Nickname edits are persisted this long after the last keystroke
    pub nickname_debounce_ms: u64,
    /// Bounded polling (install wait, confirmation wait)
    pub polling: PollConfig,
    /// Re-establishing closed subscriptions
    pub resubscribe: ResubscribeConfig,
    /// Hot wallets are signed for by the node (`submit`) instead of by a
    /// key held in this process (`submit-signed`)
    pub node_signs_hot_wallets: bool,
    /// Logging
    pub tracing: TracingConfig,
}

impl Default for WalletSettings {
    fn default() -> Self {
        Self {
            app: WALLET_APP.to_owned(),
            mark: WALLET_POKE_MARK.to_owned(),
            desk: "zig".to_owned(),
            gas: GasDefaults::default(),
            nickname_debounce_ms: 1_000,
            polling: PollConfig::default(),
            resubscribe: ResubscribeConfig::default(),
            node_signs_hot_wallets: false,
            tracing: TracingConfig::default(),
        }
    }
}

impl WalletSettings {
    /// Load settings from `./config`, `CONFIG_FILES` and the environment.
    pub fn load() -> Result<Self> {
        loader::load_settings_object(ENV_PREFIX, Path::new("./config"), env::vars().collect())
    }

    /// Load settings from an explicit config directory and environment.
    pub fn load_from(config_dir: &Path, env: HashMap<String, String>) -> Result<Self> {
        loader::load_settings_object(ENV_PREFIX, config_dir, env)
    }

    /// Nickname debounce window
    pub fn nickname_debounce(&self) -> Duration {
        Duration::from_millis(self.nickname_debounce_ms)
    }
}

#[cfg(test)]
mod test {
    use std::fs;

    use maplit::hashmap;

    use super::*;

    #[test]
    fn defaults_without_any_source() {
        let dir = tempfile::tempdir().unwrap();
        let settings = WalletSettings::load_from(dir.path(), HashMap::new()).unwrap();
        assert_eq!(settings, WalletSettings::default());
        assert_eq!(settings.app, "wallet");
        assert_eq!(settings.mark, "zig-wallet-poke");
        assert_eq!(settings.nickname_debounce(), Duration::from_secs(1));
    }

    #[test]
    fn env_overrides_files() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(
            dir.path().join("wallet.json"),
            r#"{ "gas": { "rate": 3, "budget": 500 }, "nickname_debounce_ms": 250, "tracing": { "level": "debug", "fmt": "json" } }"#,
        )
        .unwrap();
        let env = hashmap! {
            "UQBAR_WALLET_GAS__RATE".to_owned() => "7".to_owned(),
            "UQBAR_WALLET_NODE_SIGNS_HOT_WALLETS".to_owned() => "true".to_owned(),
            "UNRELATED".to_owned() => "x".to_owned(),
        };
        let settings = WalletSettings::load_from(dir.path(), env).unwrap();
        assert_eq!(settings.gas, GasDefaults { rate: 7, budget: 500 });
        assert_eq!(settings.nickname_debounce_ms, 250);
        assert!(settings.node_signs_hot_wallets);
        assert_eq!(settings.tracing.level, Level::Debug);
        assert_eq!(settings.tracing.fmt, Style::Json);
    }

    #[test]
    fn config_files_are_layered_in_order() {
        let dir = tempfile::tempdir().unwrap();
        let extra = tempfile::tempdir().unwrap();
        let first = extra.path().join("first.json");
        let second = extra.path().join("second.json");
        fs::write(&first, r#"{ "desk": "first", "app": "wallet-dev" }"#).unwrap();
        fs::write(&second, r#"{ "desk": "second" }"#).unwrap();
        let env = hashmap! {
            "CONFIG_FILES".to_owned() => format!("{},{}", first.display(), second.display()),
        };
        let settings = WalletSettings::load_from(dir.path(), env).unwrap();
        assert_eq!(settings.desk, "second");
        assert_eq!(settings.app, "wallet-dev");
    }
}
