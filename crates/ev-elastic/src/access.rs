//! Access Gate
//!
//! Holds the two capability roles of the ledger and answers authorization
//! checks before any mutation takes place:
//!
//! | Role | Permits |
//! |------|---------|
//! | [`Role::Administrator`] | `set_rebase_authority` |
//! | [`Role::RebaseAuthority`] | `rebase` |
//!
//! The zero address never holds a role. An unset rebase authority therefore
//! authorizes nobody.

use crate::error::{LedgerError, LedgerResult};
use alloy_primitives::Address;
use std::fmt;

/// Capability role checked by the gate.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Role {
    /// Owner of the ledger; installs the rebase authority.
    Administrator,
    /// Monetary-policy account permitted to rebase.
    RebaseAuthority,
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Administrator => f.write_str("administrator"),
            Self::RebaseAuthority => f.write_str("rebase authority"),
        }
    }
}

/// Role holder registry.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct AccessGate {
    administrator: Address,
    rebase_authority: Address,
}

impl AccessGate {
    /// Creates a gate with `administrator` and no rebase authority.
    pub const fn new(administrator: Address) -> Self {
        Self {
            administrator,
            rebase_authority: Address::ZERO,
        }
    }

    /// Rebuilds a gate from stored role holders.
    pub const fn from_parts(administrator: Address, rebase_authority: Address) -> Self {
        Self {
            administrator,
            rebase_authority,
        }
    }

    /// The administrator.
    pub const fn owner(&self) -> Address {
        self.administrator
    }

    /// The account currently permitted to rebase.
    pub const fn rebase_authority(&self) -> Address {
        self.rebase_authority
    }

    /// Returns the holder of `role`.
    pub const fn holder(&self, role: Role) -> Address {
        match role {
            Role::Administrator => self.administrator,
            Role::RebaseAuthority => self.rebase_authority,
        }
    }

    /// Checks that `caller` holds `role`.
    pub fn ensure(&self, caller: Address, role: Role) -> LedgerResult<()> {
        let holder = self.holder(role);
        if !holder.is_zero() && caller == holder {
            tracing::debug!(target: "ev_elastic", ?caller, %role, "authorization granted");
            Ok(())
        } else {
            tracing::warn!(target: "ev_elastic", ?caller, %role, "authorization denied");
            Err(LedgerError::Unauthorized { caller, role })
        }
    }

    /// Replaces the rebase authority. Only the administrator may do this.
    pub fn set_rebase_authority(
        &mut self,
        caller: Address,
        new_authority: Address,
    ) -> LedgerResult<()> {
        self.ensure(caller, Role::Administrator)?;
        self.rebase_authority = new_authority;
        Ok(())
    }
}
