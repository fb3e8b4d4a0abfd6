//! Elastic Ledger
//!
//! Balances are kept in internal units. The external amount of a holder is
//! derived on read by dividing by the current scaling factor, so a rebase only
//! touches `total_supply` and `units_per_token`.
//!
//! ## Storage
//!
//! Every mutable word lives in the ledger's [`LedgerStore`]. [`ElasticLedger`]
//! defaults to the in-memory [`MemoryStore`]; the EVM precompile runs the same
//! logic over the precompile account's storage.
//!
//! ## Atomicity
//!
//! Every mutating method validates all of its preconditions before the first
//! write. A method that returns `Err` leaves the ledger unchanged and appends no
//! notification.
//!
//! ## Rounding
//!
//! All conversions use floor division. `sum(units) == total_units` holds
//! exactly; the sum of external balances may fall short of `total_supply` by
//! less than one unit per holder.

use crate::{
    access::{AccessGate, Role},
    constants::{
        total_units_for, DECIMALS, DEFAULT_LEDGER_ADDRESS, DEFAULT_NAME, DEFAULT_SYMBOL,
        MAX_SUPPLY,
    },
    error::{LedgerError, LedgerResult},
    events::{EventLog, LedgerEvent},
    store::{LedgerStore, MemoryStore, StorageKey},
};
use alloy_primitives::{Address, Sign, I256, U256};
use serde::{Deserialize, Serialize};

/// Descriptive token parameters.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct TokenMetadata {
    /// Human-readable token name.
    pub name: String,
    /// Ticker symbol.
    pub symbol: String,
    /// Display precision of external amounts.
    pub decimals: u8,
}

impl Default for TokenMetadata {
    fn default() -> Self {
        Self {
            name: DEFAULT_NAME.to_string(),
            symbol: DEFAULT_SYMBOL.to_string(),
            decimals: DECIMALS,
        }
    }
}

/// Builds a signed rebase delta from a magnitude.
///
/// Fails with [`LedgerError::ArithmeticBound`] when the magnitude does not fit
/// in an `I256`.
pub fn supply_delta(magnitude: U256, contraction: bool) -> LedgerResult<I256> {
    let sign = if contraction {
        Sign::Negative
    } else {
        Sign::Positive
    };
    I256::checked_from_sign_and_abs(sign, magnitude).ok_or(LedgerError::ArithmeticBound)
}

/// The elastic-supply ledger.
#[derive(Clone, Debug)]
pub struct ElasticLedger<S = MemoryStore> {
    ledger_address: Address,
    metadata: TokenMetadata,
    store: S,
    events: EventLog,
}

impl Default for ElasticLedger {
    fn default() -> Self {
        Self::new(DEFAULT_LEDGER_ADDRESS, TokenMetadata::default())
    }
}

impl ElasticLedger {
    /// Creates an uninitialized in-memory ledger reachable at `ledger_address`.
    pub fn new(ledger_address: Address, metadata: TokenMetadata) -> Self {
        Self::with_store(MemoryStore::default(), ledger_address, metadata)
    }
}

impl<S: LedgerStore> ElasticLedger<S> {
    /// Wraps an existing store. The ledger is initialized if the store already
    /// holds an initialized ledger.
    pub fn with_store(store: S, ledger_address: Address, metadata: TokenMetadata) -> Self {
        Self {
            ledger_address,
            metadata,
            store,
            events: EventLog::default(),
        }
    }

    /// The backing store.
    pub const fn store(&self) -> &S {
        &self.store
    }

    /// Consumes the ledger, returning the backing store.
    pub fn into_store(self) -> S {
        self.store
    }

    // === Lifecycle ===

    /// One-time setup. `caller` becomes the administrator and receives the
    /// whole unit pool.
    pub fn initialize(&mut self, caller: Address, initial_supply: U256) -> LedgerResult<()> {
        if self.is_initialized() {
            return Err(LedgerError::AlreadyInitialized);
        }
        if initial_supply.is_zero() || initial_supply > MAX_SUPPLY {
            return Err(LedgerError::InvalidSupply(initial_supply));
        }

        let total_units = total_units_for(initial_supply);
        self.store.store(StorageKey::Initialized, U256::from(1));
        self.store.store(StorageKey::TotalSupply, initial_supply);
        self.store.store(StorageKey::TotalUnits, total_units);
        self.store
            .store(StorageKey::UnitsPerToken, total_units / initial_supply);
        self.store.store(StorageKey::Units(caller), total_units);
        self.store.store_address(StorageKey::Administrator, caller);

        tracing::info!(
            target: "ev_elastic",
            administrator = ?caller,
            %initial_supply,
            "ledger initialized"
        );
        self.events.push(LedgerEvent::Transfer {
            from: Address::ZERO,
            to: caller,
            amount: initial_supply,
        });
        Ok(())
    }

    /// Returns true once [`Self::initialize`] has succeeded.
    pub fn is_initialized(&self) -> bool {
        !self.store.load(StorageKey::Initialized).is_zero()
    }

    fn ensure_initialized(&self) -> LedgerResult<()> {
        if self.is_initialized() {
            Ok(())
        } else {
            Err(LedgerError::NotInitialized)
        }
    }

    // === Views ===

    /// Identifier the ledger itself is reachable at.
    pub const fn ledger_address(&self) -> Address {
        self.ledger_address
    }

    /// Token name.
    pub fn name(&self) -> &str {
        &self.metadata.name
    }

    /// Token symbol.
    pub fn symbol(&self) -> &str {
        &self.metadata.symbol
    }

    /// Display decimals.
    pub const fn decimals(&self) -> u8 {
        self.metadata.decimals
    }

    /// Current external supply.
    pub fn total_supply(&self) -> U256 {
        self.store.load(StorageKey::TotalSupply)
    }

    /// Fixed internal unit pool.
    pub fn scaled_total_supply(&self) -> U256 {
        self.store.load(StorageKey::TotalUnits)
    }

    /// Internal units per external token.
    pub fn units_per_token(&self) -> U256 {
        self.store.load(StorageKey::UnitsPerToken)
    }

    /// External balance of `account`, zero for unknown accounts.
    pub fn balance_of(&self, account: Address) -> U256 {
        self.scaled_balance_of(account)
            .checked_div(self.units_per_token())
            .unwrap_or_default()
    }

    /// Internal-unit balance of `account`.
    pub fn scaled_balance_of(&self, account: Address) -> U256 {
        self.store.load(StorageKey::Units(account))
    }

    /// Amount `spender` may still move on behalf of `owner`.
    pub fn allowance(&self, owner: Address, spender: Address) -> U256 {
        self.store.load(StorageKey::Allowance { owner, spender })
    }

    /// The administrator.
    pub fn owner(&self) -> Address {
        self.store.load_address(StorageKey::Administrator)
    }

    /// The account permitted to rebase.
    pub fn rebase_authority(&self) -> Address {
        self.store.load_address(StorageKey::RebaseAuthority)
    }

    /// Pending notifications.
    pub const fn events(&self) -> &EventLog {
        &self.events
    }

    /// Removes and returns pending notifications.
    pub fn drain_events(&mut self) -> Vec<LedgerEvent> {
        self.events.drain()
    }

    // === Access Gate ===

    fn gate(&self) -> AccessGate {
        AccessGate::from_parts(self.owner(), self.rebase_authority())
    }

    /// Replaces the rebase authority. Administrator only.
    pub fn set_rebase_authority(
        &mut self,
        caller: Address,
        new_authority: Address,
    ) -> LedgerResult<()> {
        self.ensure_initialized()?;
        let mut gate = self.gate();
        gate.set_rebase_authority(caller, new_authority)?;
        self.store
            .store_address(StorageKey::RebaseAuthority, gate.rebase_authority());

        tracing::info!(target: "ev_elastic", authority = ?new_authority, "rebase authority updated");
        self.events.push(LedgerEvent::AuthorityUpdated {
            authority: new_authority,
        });
        Ok(())
    }

    // === Rebase ===

    /// Adjusts the supply by `supply_delta`, clamped to `[0, MAX_SUPPLY]`.
    ///
    /// Clamping is not an error: the call succeeds and the notification carries
    /// the clamped supply. Returns the new supply.
    pub fn rebase(
        &mut self,
        caller: Address,
        epoch: U256,
        supply_delta: I256,
    ) -> LedgerResult<U256> {
        self.ensure_initialized()?;
        self.gate().ensure(caller, Role::RebaseAuthority)?;

        let total_supply = self.total_supply();
        let magnitude = supply_delta.unsigned_abs();
        let new_supply = if supply_delta.is_negative() {
            total_supply.saturating_sub(magnitude)
        } else {
            total_supply.saturating_add(magnitude).min(MAX_SUPPLY)
        };

        if supply_delta.is_negative() && magnitude > total_supply {
            tracing::debug!(target: "ev_elastic", %epoch, %supply_delta, "contraction clamped at zero");
        } else if !supply_delta.is_negative() && new_supply == MAX_SUPPLY {
            tracing::debug!(target: "ev_elastic", %epoch, %supply_delta, "expansion clamped at max supply");
        }

        let units_per_token = self
            .scaled_total_supply()
            .checked_div(new_supply)
            .unwrap_or_default();
        self.store.store(StorageKey::TotalSupply, new_supply);
        self.store.store(StorageKey::UnitsPerToken, units_per_token);

        tracing::info!(
            target: "ev_elastic",
            ?caller,
            %epoch,
            %supply_delta,
            total_supply = %new_supply,
            "rebase applied"
        );
        self.events.push(LedgerEvent::Rebase {
            epoch,
            total_supply: new_supply,
        });
        Ok(new_supply)
    }

    // === Transfers ===

    /// Moves `amount` from `from` to `to`.
    pub fn transfer(&mut self, from: Address, to: Address, amount: U256) -> LedgerResult<()> {
        self.ensure_initialized()?;
        self.ensure_recipient(to)?;
        let units = self.units_for(from, amount)?;

        self.move_units(from, to, units)?;
        self.record_transfer(from, to, amount);
        Ok(())
    }

    /// Moves the whole internal balance of `from` to `to`. Returns the external
    /// amount moved.
    ///
    /// Fails with [`LedgerError::ZeroSupply`] while the supply is zero and
    /// `from` holds units.
    pub fn transfer_all(&mut self, from: Address, to: Address) -> LedgerResult<U256> {
        self.ensure_initialized()?;
        self.ensure_recipient(to)?;
        let units = self.scaled_balance_of(from);
        self.ensure_backed(units)?;
        let amount = self.balance_of(from);

        self.move_units(from, to, units)?;
        self.record_transfer(from, to, amount);
        Ok(amount)
    }

    /// Moves `amount` from `from` to `to` on behalf of `spender`, consuming
    /// exactly `amount` of the allowance.
    pub fn transfer_from(
        &mut self,
        spender: Address,
        from: Address,
        to: Address,
        amount: U256,
    ) -> LedgerResult<()> {
        self.ensure_initialized()?;
        self.ensure_recipient(to)?;
        let remaining = self.remaining_allowance(from, spender, amount)?;
        let units = self.units_for(from, amount)?;

        self.move_units(from, to, units)?;
        self.store
            .store(StorageKey::Allowance { owner: from, spender }, remaining);
        self.record_transfer(from, to, amount);
        Ok(())
    }

    /// Moves the whole internal balance of `from` to `to` on behalf of
    /// `spender`. Returns the external amount moved.
    ///
    /// The allowance is charged the moved units rounded up to whole external
    /// units, so a sub-unit remainder is never taken for free. Fails with
    /// [`LedgerError::ZeroSupply`] while the supply is zero and `from` holds
    /// units.
    pub fn transfer_all_from(
        &mut self,
        spender: Address,
        from: Address,
        to: Address,
    ) -> LedgerResult<U256> {
        self.ensure_initialized()?;
        self.ensure_recipient(to)?;
        let units = self.scaled_balance_of(from);
        self.ensure_backed(units)?;
        let amount = self.balance_of(from);
        let charge = self.covering_amount(units);
        let remaining = self.remaining_allowance(from, spender, charge)?;

        self.move_units(from, to, units)?;
        self.store
            .store(StorageKey::Allowance { owner: from, spender }, remaining);
        self.record_transfer(from, to, amount);
        Ok(amount)
    }

    fn ensure_recipient(&self, to: Address) -> LedgerResult<()> {
        if to.is_zero() || to == self.ledger_address {
            tracing::debug!(target: "ev_elastic", ?to, "recipient rejected");
            return Err(LedgerError::InvalidRecipient(to));
        }
        Ok(())
    }

    /// Units carry no external value at zero supply; none may move.
    fn ensure_backed(&self, units: U256) -> LedgerResult<()> {
        if self.total_supply().is_zero() && !units.is_zero() {
            tracing::debug!(target: "ev_elastic", %units, "unbacked units cannot move");
            return Err(LedgerError::ZeroSupply);
        }
        Ok(())
    }

    /// Smallest external amount worth at least `units`.
    fn covering_amount(&self, units: U256) -> U256 {
        let factor = self.units_per_token();
        if factor.is_zero() {
            return U256::ZERO;
        }
        let whole = units / factor;
        if (units % factor).is_zero() {
            whole
        } else {
            whole + U256::from(1)
        }
    }

    /// Converts `amount` to internal units and checks `from` holds them.
    fn units_for(&self, from: Address, amount: U256) -> LedgerResult<U256> {
        let units = amount
            .checked_mul(self.units_per_token())
            .ok_or(LedgerError::ArithmeticBound)?;

        // At zero supply every non-zero amount is unbacked.
        let unbacked = self.total_supply().is_zero() && !amount.is_zero();
        if unbacked || self.scaled_balance_of(from) < units {
            return Err(LedgerError::InsufficientBalance {
                have: self.balance_of(from),
                need: amount,
            });
        }
        Ok(units)
    }

    fn remaining_allowance(
        &self,
        owner: Address,
        spender: Address,
        amount: U256,
    ) -> LedgerResult<U256> {
        let have = self.allowance(owner, spender);
        have.checked_sub(amount)
            .ok_or(LedgerError::InsufficientAllowance { have, need: amount })
    }

    fn move_units(&mut self, from: Address, to: Address, units: U256) -> LedgerResult<()> {
        if from == to {
            return Ok(());
        }
        let from_after = self
            .scaled_balance_of(from)
            .checked_sub(units)
            .ok_or(LedgerError::ArithmeticBound)?;
        let to_after = self
            .scaled_balance_of(to)
            .checked_add(units)
            .ok_or(LedgerError::ArithmeticBound)?;

        self.store.store(StorageKey::Units(from), from_after);
        self.store.store(StorageKey::Units(to), to_after);
        Ok(())
    }

    fn record_transfer(&mut self, from: Address, to: Address, amount: U256) {
        tracing::info!(target: "ev_elastic", ?from, ?to, %amount, "transfer executed");
        self.events.push(LedgerEvent::Transfer { from, to, amount });
    }

    // === Allowances ===

    /// Sets the allowance of `spender` over `owner`'s balance to `amount`.
    pub fn approve(&mut self, owner: Address, spender: Address, amount: U256) -> LedgerResult<()> {
        self.ensure_initialized()?;
        self.write_allowance(owner, spender, amount);
        Ok(())
    }

    /// Raises the allowance by `added`, saturating at `U256::MAX`. Returns the
    /// new allowance.
    pub fn increase_allowance(
        &mut self,
        owner: Address,
        spender: Address,
        added: U256,
    ) -> LedgerResult<U256> {
        self.ensure_initialized()?;
        let amount = self.allowance(owner, spender).saturating_add(added);
        self.write_allowance(owner, spender, amount);
        Ok(amount)
    }

    /// Lowers the allowance by `subtracted`, flooring at zero. Returns the new
    /// allowance.
    pub fn decrease_allowance(
        &mut self,
        owner: Address,
        spender: Address,
        subtracted: U256,
    ) -> LedgerResult<U256> {
        self.ensure_initialized()?;
        let amount = self.allowance(owner, spender).saturating_sub(subtracted);
        self.write_allowance(owner, spender, amount);
        Ok(amount)
    }

    fn write_allowance(&mut self, owner: Address, spender: Address, amount: U256) {
        self.store
            .store(StorageKey::Allowance { owner, spender }, amount);
        tracing::debug!(target: "ev_elastic", ?owner, ?spender, %amount, "allowance set");
        self.events.push(LedgerEvent::Approval {
            owner,
            spender,
            amount,
        });
    }
}
