//! # Elastic Supply EVM Precompile
//!
//! This crate exposes the [`ev_elastic`] rebasing ledger to the EVM as a
//! precompiled ERC-20 contract.
//!
//! ## Available Precompiles
//!
//! | Address | Name | Description |
//! |---------|------|-------------|
//! | `0x00FE` | [`elastic_supply`] | Rebasing ERC-20 with an authority-gated supply |
//!
//! ## Architecture
//!
//! 1. **Authorization**: owner and rebase authority enforced by the ledger's access gate
//! 2. **State Management**: ledger words stored in the precompile account through the EVM journal
//! 3. **Safety**: checked unit arithmetic, rejected recipients, all-or-nothing calls
//! 4. **Events**: ledger notifications emitted as EVM logs
//!
//! ## Integration
//!
//! The precompile implements `alloy_evm::precompiles::Precompile` and can be
//! installed into any `PrecompilesMap` at [`elastic_supply::ELASTIC_SUPPLY_PRECOMPILE_ADDR`].
//!
//! ```ignore
//! use ev_elastic::LedgerConfig;
//! use ev_precompiles::elastic_supply::{ElasticSupplyPrecompile, ELASTIC_SUPPLY_PRECOMPILE_ADDR};
//!
//! let precompile = ElasticSupplyPrecompile::from_config(&LedgerConfig::from_env()?)?;
//! precompiles.apply_precompile(&ELASTIC_SUPPLY_PRECOMPILE_ADDR, |_| {
//!     Some(DynPrecompile::from(precompile))
//! });
//! ```
//!
//! ## References
//!
//! - [Ampleforth Whitepaper](https://www.ampleforth.org/paper/)
//! - [Revm Documentation](https://bluealloy.github.io/revm/)

pub mod elastic_supply;
