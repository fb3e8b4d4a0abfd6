//! Ledger Configuration
//!
//! [`LedgerConfig`] describes a deployment: initial supply, role holders,
//! token metadata and the ledger's own identifier. It loads from defaults,
//! JSON or `EV_ELASTIC_*` environment variables.

use crate::{
    constants::{DEFAULT_LEDGER_ADDRESS, INITIAL_SUPPLY, MAX_SUPPLY},
    error::LedgerError,
    ledger::{ElasticLedger, TokenMetadata},
    store::LedgerStore,
};
use alloy_primitives::{Address, U256};
use serde::{Deserialize, Serialize};
use std::{path::Path, str::FromStr};

fn default_initial_supply() -> u128 {
    INITIAL_SUPPLY.to::<u128>()
}

const fn default_ledger_address() -> Address {
    DEFAULT_LEDGER_ADDRESS
}

/// Configuration for an elastic ledger instance.
///
/// Expected JSON shape (example):
/// ```json
/// {
///   "initialSupply": 50000000000000000,
///   "administrator": "0x00000000000000000000000000000000000000a1",
///   "rebaseAuthority": "0x00000000000000000000000000000000000000b1",
///   "metadata": { "name": "Lbd Protocol", "symbol": "LBD", "decimals": 9 }
/// }
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LedgerConfig {
    /// Supply credited to the administrator at initialization.
    #[serde(default = "default_initial_supply")]
    pub initial_supply: u128,
    /// Account that initializes the ledger and may change the rebase authority.
    pub administrator: Address,
    /// Account permitted to rebase. The zero address is treated as unset.
    #[serde(default)]
    pub rebase_authority: Option<Address>,
    /// Token name, symbol and decimals.
    #[serde(default)]
    pub metadata: TokenMetadata,
    /// Identifier the ledger itself is reachable at.
    #[serde(default = "default_ledger_address")]
    pub ledger_address: Address,
}

impl Default for LedgerConfig {
    /// Reference deployment values with no administrator.
    ///
    /// The zero administrator fails [`LedgerConfig::validate`]; set one before
    /// building a ledger.
    fn default() -> Self {
        Self {
            initial_supply: default_initial_supply(),
            administrator: Address::ZERO,
            rebase_authority: None,
            metadata: TokenMetadata::default(),
            ledger_address: DEFAULT_LEDGER_ADDRESS,
        }
    }
}

impl LedgerConfig {
    /// Creates a config with the reference supply administered by `administrator`.
    pub fn with_administrator(administrator: Address) -> Self {
        Self {
            administrator,
            ..Default::default()
        }
    }

    /// Parses a config from a JSON string.
    pub fn from_json_str(json: &str) -> Result<Self, ConfigError> {
        let mut config: Self = serde_json::from_str(json)?;
        config.normalize();
        Ok(config)
    }

    /// Reads a JSON config file.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let contents = std::fs::read_to_string(path)?;
        Self::from_json_str(&contents)
    }

    /// Creates a config from environment variables.
    ///
    /// `EV_ELASTIC_ADMIN` is required. `EV_ELASTIC_INITIAL_SUPPLY`,
    /// `EV_ELASTIC_REBASE_AUTHORITY` and `EV_ELASTIC_LEDGER_ADDR` are optional.
    pub fn from_env() -> eyre::Result<Self> {
        let administrator = std::env::var("EV_ELASTIC_ADMIN").map(|s| Address::from_str(s.trim()))??;

        let initial_supply = std::env::var("EV_ELASTIC_INITIAL_SUPPLY")
            .ok()
            .map(|s| s.trim().parse::<u128>())
            .transpose()?
            .unwrap_or_else(default_initial_supply);

        let rebase_authority = std::env::var("EV_ELASTIC_REBASE_AUTHORITY")
            .ok()
            .map(|s| Address::from_str(s.trim()))
            .transpose()?;

        let ledger_address = std::env::var("EV_ELASTIC_LEDGER_ADDR")
            .ok()
            .map(|s| Address::from_str(s.trim()))
            .transpose()?
            .unwrap_or(DEFAULT_LEDGER_ADDRESS);

        let mut config = Self {
            initial_supply,
            administrator,
            rebase_authority,
            metadata: TokenMetadata::default(),
            ledger_address,
        };
        config.normalize();
        config.validate()?;
        Ok(config)
    }

    fn normalize(&mut self) {
        self.rebase_authority = self.rebase_authority.filter(|addr| !addr.is_zero());
    }

    /// Initial supply as a ledger amount.
    pub fn initial_supply(&self) -> U256 {
        U256::from(self.initial_supply)
    }

    /// Validates the configuration
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.administrator.is_zero() {
            return Err(ConfigError::ZeroAdministrator);
        }
        let supply = self.initial_supply();
        if supply.is_zero() || supply > MAX_SUPPLY {
            return Err(ConfigError::InvalidSupply(self.initial_supply));
        }
        Ok(())
    }
}

impl ElasticLedger {
    /// Builds an initialized in-memory ledger from `config`.
    ///
    /// The administrator receives the initial supply. A configured rebase
    /// authority is installed by the administrator, so the returned ledger's
    /// log holds the initial `Transfer` and, if set, the `AuthorityUpdated`
    /// notification.
    pub fn from_config(config: &LedgerConfig) -> Result<Self, ConfigError> {
        let mut ledger = Self::new(config.ledger_address, config.metadata.clone());
        ledger.initialize_from(config)?;
        Ok(ledger)
    }
}

impl<S: LedgerStore> ElasticLedger<S> {
    /// Initializes this ledger with the supply and roles of `config`.
    ///
    /// Metadata and the ledger identifier are fixed when the ledger is built
    /// and are not taken from `config`.
    pub fn initialize_from(&mut self, config: &LedgerConfig) -> Result<(), ConfigError> {
        config.validate()?;
        self.initialize(config.administrator, config.initial_supply())?;
        if let Some(authority) = config.rebase_authority {
            self.set_rebase_authority(config.administrator, authority)?;
        }
        Ok(())
    }
}

/// Errors that can occur during configuration validation
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// No administrator configured
    #[error("administrator cannot be the zero address")]
    ZeroAdministrator,
    /// Initial supply outside `1..=MAX_SUPPLY`
    #[error("invalid initial supply: {0}")]
    InvalidSupply(u128),
    /// Config JSON failed to parse
    #[error("invalid ledger config: {0}")]
    Json(#[from] serde_json::Error),
    /// Config file could not be read
    #[error("failed to read ledger config: {0}")]
    Io(#[from] std::io::Error),
    /// Ledger rejected the configured values
    #[error("ledger setup failed: {0}")]
    Ledger(#[from] LedgerError),
}
