//! # Elastic Supply Ledger
//!
//! A single-asset ledger whose total supply can be rebased in O(1) without
//! rewriting any holder balance.
//!
//! ## Unit Model
//!
//! Balances are stored in fine-grained *internal units*. The pool of internal
//! units is fixed at initialization and never changes afterwards; only the
//! scaling factor between internal units and the externally reported amount
//! moves when the supply is rebased:
//!
//! | Quantity | Definition |
//! |----------|------------|
//! | `total_units` | `U256::MAX - (U256::MAX % initial_supply)` |
//! | `units_per_token` | `total_units / total_supply` (floor) |
//! | `balance_of(a)` | `units[a] / units_per_token` (floor) |
//!
//! Rebasing changes `total_supply` and recomputes `units_per_token`; every
//! holder's external balance follows proportionally.
//!
//! ## Modules
//!
//! - [`ledger`]: [`ElasticLedger`], balances, allowances and rebase
//! - [`access`]: [`AccessGate`], administrator and rebase-authority checks
//! - [`events`]: [`LedgerEvent`] notifications and the [`EventLog`]
//! - [`config`]: [`LedgerConfig`] loaded from defaults, JSON or environment
//! - [`store`]: [`LedgerStore`] word storage and the in-memory [`MemoryStore`]
//! - [`error`]: [`LedgerError`] taxonomy
//!
//! ## Example
//!
//! ```
//! use alloy_primitives::{address, U256};
//! use ev_elastic::{supply_delta, ElasticLedger, INITIAL_SUPPLY};
//!
//! let admin = address!("0x00000000000000000000000000000000000000a1");
//! let mut ledger: ElasticLedger = ElasticLedger::default();
//! ledger.initialize(admin, INITIAL_SUPPLY).unwrap();
//! ledger.set_rebase_authority(admin, admin).unwrap();
//!
//! let delta = supply_delta(INITIAL_SUPPLY / U256::from(10), false).unwrap();
//! ledger.rebase(admin, U256::from(1), delta).unwrap();
//! assert_eq!(ledger.balance_of(admin), ledger.total_supply());
//! ```

pub mod access;
pub mod config;
pub mod constants;
pub mod error;
pub mod events;
pub mod ledger;
pub mod store;

pub use access::{AccessGate, Role};
pub use config::{ConfigError, LedgerConfig};
pub use constants::*;
pub use error::{LedgerError, LedgerResult};
pub use events::{EventLog, LedgerEvent};
pub use ledger::{supply_delta, ElasticLedger, TokenMetadata};
pub use store::{LedgerStore, MemoryStore, StorageKey};
