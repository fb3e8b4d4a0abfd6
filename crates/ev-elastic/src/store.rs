//! Ledger Storage
//!
//! The ledger keeps every mutable word behind a [`LedgerStore`]. Each entry is
//! a single `U256` addressed by a [`StorageKey`], which lets the same ledger
//! logic run over an in-memory map or over EVM account storage.
//!
//! Absent entries read as zero. Writing zero is equivalent to deleting.

use alloy_primitives::{Address, B256, U256};
use std::collections::HashMap;

/// Address of one ledger word.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum StorageKey {
    /// Non-zero once `initialize` has succeeded.
    Initialized,
    /// External supply.
    TotalSupply,
    /// Fixed internal unit pool.
    TotalUnits,
    /// Internal units per external token.
    UnitsPerToken,
    /// Administrator account.
    Administrator,
    /// Rebase authority account.
    RebaseAuthority,
    /// Internal-unit balance of an account.
    Units(Address),
    /// Allowance of `spender` over `owner`'s balance.
    Allowance {
        /// Account whose balance is spent.
        owner: Address,
        /// Account permitted to spend.
        spender: Address,
    },
}

/// Word-addressed backing store for an [`ElasticLedger`](crate::ElasticLedger).
pub trait LedgerStore {
    /// Reads the word at `key`, zero when absent.
    fn load(&self, key: StorageKey) -> U256;

    /// Writes `value` at `key`.
    fn store(&mut self, key: StorageKey, value: U256);

    /// Reads an account identifier stored as a left-padded word.
    fn load_address(&self, key: StorageKey) -> Address {
        Address::from_word(B256::from(self.load(key).to_be_bytes::<32>()))
    }

    /// Writes an account identifier as a left-padded word.
    fn store_address(&mut self, key: StorageKey, address: Address) {
        self.store(key, address.into_word().into());
    }
}

/// In-memory store. Zero writes remove the entry.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct MemoryStore {
    words: HashMap<StorageKey, U256>,
}

impl MemoryStore {
    /// Number of non-zero words held.
    pub fn len(&self) -> usize {
        self.words.len()
    }

    /// Returns true when every word is zero.
    pub fn is_empty(&self) -> bool {
        self.words.is_empty()
    }
}

impl LedgerStore for MemoryStore {
    fn load(&self, key: StorageKey) -> U256 {
        self.words.get(&key).copied().unwrap_or_default()
    }

    fn store(&mut self, key: StorageKey, value: U256) {
        if value.is_zero() {
            self.words.remove(&key);
        } else {
            self.words.insert(key, value);
        }
    }
}
