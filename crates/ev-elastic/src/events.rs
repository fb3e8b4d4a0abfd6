//! Ledger notifications.
//!
//! Each committed operation appends its notification to the ledger's
//! [`EventLog`]. Failed operations append nothing. Consumers read the log or
//! drain it after each call.

use alloy_primitives::{Address, U256};
use serde::{Deserialize, Serialize};

/// An immutable fact produced by a committed ledger operation.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "event", rename_all = "camelCase")]
pub enum LedgerEvent {
    /// External `amount` moved from `from` to `to`.
    Transfer {
        /// Sender, or the null identifier at initialization.
        from: Address,
        /// Recipient.
        to: Address,
        /// External amount.
        amount: U256,
    },
    /// Allowance of `spender` over `owner`'s balance set to `amount`.
    Approval {
        /// Account whose balance may be spent.
        owner: Address,
        /// Account permitted to spend.
        spender: Address,
        /// New allowance.
        amount: U256,
    },
    /// Supply rebased to `total_supply` under the caller-supplied `epoch`.
    #[serde(rename_all = "camelCase")]
    Rebase {
        /// Opaque tag supplied by the rebase authority.
        epoch: U256,
        /// Supply after clamping.
        total_supply: U256,
    },
    /// Rebase authority replaced.
    AuthorityUpdated {
        /// New rebase authority.
        authority: Address,
    },
}

/// Append-only notification log.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct EventLog {
    entries: Vec<LedgerEvent>,
}

impl EventLog {
    pub(crate) fn push(&mut self, event: LedgerEvent) {
        self.entries.push(event);
    }

    /// All notifications not yet drained, oldest first.
    pub fn entries(&self) -> &[LedgerEvent] {
        &self.entries
    }

    /// The most recent notification.
    pub fn last(&self) -> Option<&LedgerEvent> {
        self.entries.last()
    }

    /// Number of pending notifications.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Returns true when no notification is pending.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Removes and returns all pending notifications.
    pub fn drain(&mut self) -> Vec<LedgerEvent> {
        std::mem::take(&mut self.entries)
    }
}
