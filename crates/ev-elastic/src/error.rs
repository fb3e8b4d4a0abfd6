//! Ledger Errors

use crate::access::Role;
use alloy_primitives::{Address, U256};
use thiserror::Error;

/// Error during ledger operations.
///
/// Every variant aborts the operation with the ledger state unchanged.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum LedgerError {
    /// Caller does not hold the role the operation requires.
    #[error("unauthorized caller {caller}: requires {role}")]
    Unauthorized {
        /// Account that attempted the operation.
        caller: Address,
        /// Role the operation requires.
        role: Role,
    },

    /// Destination is the null identifier or the ledger itself.
    #[error("invalid recipient: {0}")]
    InvalidRecipient(Address),

    /// Sender's units do not cover the amount, in external amounts.
    #[error("insufficient balance: have {have}, need {need}")]
    InsufficientBalance {
        /// External balance of the sender.
        have: U256,
        /// Requested external amount.
        need: U256,
    },

    /// Allowance does not cover the amount charged.
    #[error("insufficient allowance: have {have}, need {need}")]
    InsufficientAllowance {
        /// Current allowance.
        have: U256,
        /// Amount the operation charges against it.
        need: U256,
    },

    /// Supply is zero, so internal units carry no external value and cannot move.
    #[error("supply is zero: internal units are unbacked")]
    ZeroSupply,

    /// Checked unit arithmetic overflowed.
    #[error("arithmetic bound exceeded")]
    ArithmeticBound,

    /// `initialize` already ran.
    #[error("ledger already initialized")]
    AlreadyInitialized,

    /// Operation requires an initialized ledger.
    #[error("ledger not initialized")]
    NotInitialized,

    /// Initial supply outside `1..=MAX_SUPPLY`.
    #[error("invalid supply: {0}")]
    InvalidSupply(U256),
}

/// Result type for ledger operations
pub type LedgerResult<T> = Result<T, LedgerError>;
