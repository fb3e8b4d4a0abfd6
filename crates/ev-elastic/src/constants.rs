//! Ledger constants.

use alloy_primitives::{address, Address, U256};

/// Number of decimals of the external denomination.
pub const DECIMALS: u8 = 9;

/// Hard cap on the external supply: `2^128 - 1`.
pub const MAX_SUPPLY: U256 = U256::from_limbs([u64::MAX, u64::MAX, 0, 0]);

/// Default initial supply: 50 million tokens with [`DECIMALS`] decimals.
pub const INITIAL_SUPPLY: U256 = U256::from_limbs([50_000_000 * 1_000_000_000, 0, 0, 0]);

/// Identifier the ledger itself is reachable at. Transfers into it are rejected.
pub const DEFAULT_LEDGER_ADDRESS: Address =
    address!("0x00000000000000000000000000000000000000fe");

/// Default token name.
pub const DEFAULT_NAME: &str = "Lbd Protocol";

/// Default token symbol.
pub const DEFAULT_SYMBOL: &str = "LBD";

/// Multiplier for one whole token in the external denomination (`10^DECIMALS`).
pub fn unit_token() -> U256 {
    U256::from(10u64).pow(U256::from(DECIMALS))
}

/// Returns the internal unit pool for a given initial supply: the largest
/// 256-bit value evenly divisible by `initial_supply`.
///
/// Returns zero for a zero supply.
pub fn total_units_for(initial_supply: U256) -> U256 {
    if initial_supply.is_zero() {
        return U256::ZERO;
    }
    U256::MAX - (U256::MAX % initial_supply)
}
