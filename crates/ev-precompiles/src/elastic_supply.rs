//! Elastic Supply Precompile
//!
//! Exposes an [`ElasticLedger`] to EVM callers as an ERC-20 token whose supply
//! can be rebased by a designated monetary-policy account.
//!
//! ## Overview
//!
//! Holder balances are tracked in internal units that never change on a
//! rebase. The rebase authority adjusts the external supply with
//! `rebase(epoch, supplyDelta)`; every holder's `balanceOf` follows
//! proportionally without a single balance write.
//!
//! ## Address
//!
//! The precompile is deployed at address `0x00..00FE` (254). Transfers into
//! this address are rejected.
//!
//! ## Interface
//!
//! ```solidity
//! interface IElasticSupply {
//!     function initialize(uint256 initialSupply) external;
//!     function totalSupply() external view returns (uint256);
//!     function balanceOf(address who) external view returns (uint256);
//!     function transfer(address to, uint256 value) external returns (bool);
//!     function transferFrom(address from, address to, uint256 value) external returns (bool);
//!     function approve(address spender, uint256 value) external returns (bool);
//!     function rebase(uint256 epoch, int256 supplyDelta) external returns (uint256);
//!     function setRebaseAuthority(address newAuthority) external;
//!     function owner() external view returns (address);
//!     // ... see the `sol!` block below for the full surface
//! }
//! ```
//!
//! ## Authorization
//!
//! | Call | Caller must be |
//! |------|----------------|
//! | `initialize` | anyone, once; becomes the owner |
//! | `rebase` | the rebase authority |
//! | `setRebaseAuthority` | the owner |
//! | `transfer*`, `approve`, allowance changes | the token holder / spender |
//!
//! Calls that change state are rejected in a static context.
//!
//! ## Events
//!
//! Ledger notifications are emitted as EVM logs at the precompile address:
//! `Transfer`, `Approval`, `LogRebase(uint256 indexed epoch, uint256 totalSupply)`
//! and `LogRebaseAuthorityUpdated(address rebaseAuthority)`.
//!
//! ## Storage Layout
//!
//! Ledger state lives in the storage of the precompile account (`0x..FE`) and
//! is read and written through the EVM journal, so it follows the enclosing
//! call's commit or revert.
//!
//! | Slot | Description |
//! |------|-------------|
//! | `0` | Initialized flag |
//! | `1` | Total supply |
//! | `2` | Total internal units |
//! | `3` | Internal units per token |
//! | `4` | Owner |
//! | `5` | Rebase authority |
//! | `keccak256(holder . 6)` | Internal-unit balance |
//! | `keccak256(spender . keccak256(owner . 7))` | Allowance |
//!
//! Mapping slots follow the Solidity layout for `mapping(address => ...)`.
//!
//! ## Genesis
//!
//! A precompile built with [`ElasticSupplyPrecompile::from_config`] writes the
//! configured supply and roles into storage on the first call that finds the
//! ledger uninitialized. The seeding emits no logs.
//!
//! ## Gas Costs
//!
//! Gas is accounted at the transaction level. The precompile returns
//! `gas_used = 0`.

use alloy::{
    sol,
    sol_types::{SolEvent, SolInterface, SolValue},
};
use alloy_evm::{
    precompiles::{Precompile, PrecompileInput},
    revm::precompile::{PrecompileError, PrecompileId, PrecompileResult},
    EvmInternals, EvmInternalsError,
};
use alloy_primitives::{keccak256, Address, Bytes, Log, B256, U256};
use ev_elastic::{
    ConfigError, ElasticLedger, LedgerConfig, LedgerError, LedgerEvent, LedgerResult,
    LedgerStore, StorageKey, TokenMetadata, DEFAULT_LEDGER_ADDRESS,
};
use revm::{bytecode::Bytecode, precompile::PrecompileOutput};
use std::{cell::RefCell, sync::OnceLock};

sol! {
    /// Elastic supply token interface
    interface IElasticSupply {
        event Transfer(address indexed from, address indexed to, uint256 value);
        event Approval(address indexed owner, address indexed spender, uint256 value);
        event LogRebase(uint256 indexed epoch, uint256 totalSupply);
        event LogRebaseAuthorityUpdated(address rebaseAuthority);

        /// One-time setup; the caller becomes owner and receives the supply
        function initialize(uint256 initialSupply) external;

        function name() external view returns (string memory);
        function symbol() external view returns (string memory);
        function decimals() external view returns (uint8);

        function totalSupply() external view returns (uint256);
        function balanceOf(address who) external view returns (uint256);

        /// Internal-unit views
        function scaledTotalSupply() external view returns (uint256);
        function scaledBalanceOf(address who) external view returns (uint256);

        function transfer(address to, uint256 value) external returns (bool);
        function transferAll(address to) external returns (bool);
        function transferFrom(address from, address to, uint256 value) external returns (bool);
        function transferAllFrom(address from, address to) external returns (bool);

        function allowance(address owner, address spender) external view returns (uint256);
        function approve(address spender, uint256 value) external returns (bool);
        function increaseAllowance(address spender, uint256 addedValue) external returns (bool);
        function decreaseAllowance(address spender, uint256 subtractedValue) external returns (bool);

        /// Adjust the supply by a signed delta, clamped to [0, 2^128 - 1]
        /// @return The new total supply
        function rebase(uint256 epoch, int256 supplyDelta) external returns (uint256);

        function setRebaseAuthority(address newAuthority) external;
        function rebaseAuthority() external view returns (address);
        function owner() external view returns (address);
    }
}

/// Elastic Supply Precompile Address: 0x00..fe (254)
pub const ELASTIC_SUPPLY_PRECOMPILE_ADDR: Address = DEFAULT_LEDGER_ADDRESS;

/// Base slot of the internal-unit balance mapping.
const UNITS_SLOT: u64 = 6;
/// Base slot of the nested allowance mapping.
const ALLOWANCES_SLOT: u64 = 7;

/// Bytecode marker for the precompile account.
///
/// The invalid instruction `0xFE` keeps the account from being pruned as empty
/// once it holds storage.
fn bytecode() -> &'static Bytecode {
    static BYTECODE: OnceLock<Bytecode> = OnceLock::new();
    BYTECODE.get_or_init(|| Bytecode::new_raw(Bytes::from_static(&[0xFE])))
}

fn map_internals_error(err: EvmInternalsError) -> PrecompileError {
    PrecompileError::other(err.to_string())
}

/// Solidity mapping slot: `keccak256(key . base)`.
fn mapping_slot(key: B256, base: U256) -> U256 {
    let mut preimage = [0u8; 64];
    preimage[..32].copy_from_slice(key.as_slice());
    preimage[32..].copy_from_slice(&base.to_be_bytes::<32>());
    U256::from_be_bytes(keccak256(preimage).0)
}

/// Storage slot of a ledger word in the precompile account.
pub fn storage_slot(key: StorageKey) -> U256 {
    match key {
        StorageKey::Initialized => U256::ZERO,
        StorageKey::TotalSupply => U256::from(1),
        StorageKey::TotalUnits => U256::from(2),
        StorageKey::UnitsPerToken => U256::from(3),
        StorageKey::Administrator => U256::from(4),
        StorageKey::RebaseAuthority => U256::from(5),
        StorageKey::Units(holder) => mapping_slot(holder.into_word(), U256::from(UNITS_SLOT)),
        StorageKey::Allowance { owner, spender } => mapping_slot(
            spender.into_word(),
            mapping_slot(owner.into_word(), U256::from(ALLOWANCES_SLOT)),
        ),
    }
}

/// Ledger storage backed by the precompile account in the EVM journal.
///
/// [`LedgerStore`] access is infallible, so the first journal error is kept
/// and reported by [`JournalStore::finish`]. Loads after an error read zero
/// and stores are skipped.
#[derive(Debug)]
struct JournalStore<'a> {
    internals: RefCell<EvmInternals<'a>>,
    account_ready: bool,
    error: RefCell<Option<EvmInternalsError>>,
}

impl<'a> JournalStore<'a> {
    const fn new(internals: EvmInternals<'a>) -> Self {
        Self {
            internals: RefCell::new(internals),
            account_ready: false,
            error: RefCell::new(None),
        }
    }

    fn latch(&self, err: EvmInternalsError) {
        tracing::warn!(target: "elastic_supply", error = %err, "journal access failed");
        let mut slot = self.error.borrow_mut();
        if slot.is_none() {
            *slot = Some(err);
        }
    }

    fn ensure_account_created(&mut self) -> Result<(), EvmInternalsError> {
        if self.account_ready {
            return Ok(());
        }
        let internals = self.internals.get_mut();
        let missing = internals
            .load_account(ELASTIC_SUPPLY_PRECOMPILE_ADDR)?
            .is_loaded_as_not_existing();
        if missing {
            internals.set_code(ELASTIC_SUPPLY_PRECOMPILE_ADDR, bytecode().clone())?;
            internals.bump_nonce(ELASTIC_SUPPLY_PRECOMPILE_ADDR)?;
        }
        internals.touch_account(ELASTIC_SUPPLY_PRECOMPILE_ADDR)?;
        self.account_ready = true;
        Ok(())
    }

    /// Returns the journal handle, or the first error hit while using it.
    fn finish(self) -> Result<EvmInternals<'a>, PrecompileError> {
        match self.error.into_inner() {
            Some(err) => Err(map_internals_error(err)),
            None => Ok(self.internals.into_inner()),
        }
    }
}

impl LedgerStore for JournalStore<'_> {
    fn load(&self, key: StorageKey) -> U256 {
        if self.error.borrow().is_some() {
            return U256::ZERO;
        }
        let slot = storage_slot(key);
        let loaded = self
            .internals
            .borrow_mut()
            .sload(ELASTIC_SUPPLY_PRECOMPILE_ADDR, slot);
        match loaded {
            Ok(value) => *value,
            Err(err) => {
                self.latch(err);
                U256::ZERO
            }
        }
    }

    fn store(&mut self, key: StorageKey, value: U256) {
        if self.error.get_mut().is_some() {
            return;
        }
        if let Err(err) = self.ensure_account_created() {
            self.latch(err);
            return;
        }
        let slot = storage_slot(key);
        let stored = self
            .internals
            .get_mut()
            .sstore(ELASTIC_SUPPLY_PRECOMPILE_ADDR, slot, value);
        if let Err(err) = stored {
            self.latch(err);
        }
    }
}

/// Elastic Supply Precompile
///
/// Holds only the token metadata and optional genesis configuration; ledger
/// state is read from the journal on every call.
#[derive(Clone, Debug)]
pub struct ElasticSupplyPrecompile {
    metadata: TokenMetadata,
    genesis: Option<LedgerConfig>,
}

impl ElasticSupplyPrecompile {
    /// Lazily-initialized precompile ID
    pub fn id() -> &'static PrecompileId {
        static ID: OnceLock<PrecompileId> = OnceLock::new();
        ID.get_or_init(|| PrecompileId::custom("elastic_supply"))
    }

    /// Creates a precompile awaiting an `initialize` call.
    pub const fn uninitialized(metadata: TokenMetadata) -> Self {
        Self {
            metadata,
            genesis: None,
        }
    }

    /// Creates a precompile that seeds its ledger from `config`.
    ///
    /// The configured ledger address is replaced by the precompile address.
    pub fn from_config(config: &LedgerConfig) -> Result<Self, ConfigError> {
        config.validate()?;
        let genesis = LedgerConfig {
            ledger_address: ELASTIC_SUPPLY_PRECOMPILE_ADDR,
            ..config.clone()
        };
        Ok(Self {
            metadata: genesis.metadata.clone(),
            genesis: Some(genesis),
        })
    }

    /// Token metadata reported by the name, symbol and decimals views.
    pub const fn metadata(&self) -> &TokenMetadata {
        &self.metadata
    }

    /// Configuration written to storage on first use, if any.
    pub const fn genesis(&self) -> Option<&LedgerConfig> {
        self.genesis.as_ref()
    }

    // === Error Handling ===

    fn map_ledger_error(err: LedgerError) -> PrecompileError {
        PrecompileError::other(err.to_string())
    }

    fn map_config_error(err: ConfigError) -> PrecompileError {
        PrecompileError::other(err.to_string())
    }

    // === Dispatch ===

    /// Initializes an empty ledger from the genesis configuration. Pending
    /// notifications from the seeding are dropped.
    fn seed_genesis<S: LedgerStore>(
        &self,
        ledger: &mut ElasticLedger<S>,
    ) -> Result<(), PrecompileError> {
        let Some(genesis) = &self.genesis else {
            return Ok(());
        };
        if ledger.is_initialized() {
            return Ok(());
        }
        ledger.initialize_from(genesis).map_err(Self::map_config_error)?;
        let discarded = ledger.drain_events();
        tracing::info!(
            target: "elastic_supply",
            administrator = ?genesis.administrator,
            discarded = discarded.len(),
            "ledger seeded from genesis config"
        );
        Ok(())
    }

    const fn is_view(call: &IElasticSupply::IElasticSupplyCalls) -> bool {
        use IElasticSupply::IElasticSupplyCalls as Calls;

        matches!(
            call,
            Calls::name(_)
                | Calls::symbol(_)
                | Calls::decimals(_)
                | Calls::totalSupply(_)
                | Calls::balanceOf(_)
                | Calls::scaledTotalSupply(_)
                | Calls::scaledBalanceOf(_)
                | Calls::allowance(_)
                | Calls::rebaseAuthority(_)
                | Calls::owner(_)
        )
    }

    fn dispatch<S: LedgerStore>(
        ledger: &mut ElasticLedger<S>,
        caller: Address,
        call: IElasticSupply::IElasticSupplyCalls,
    ) -> LedgerResult<Vec<u8>> {
        use IElasticSupply::IElasticSupplyCalls as Calls;

        let output = match call {
            Calls::initialize(call) => {
                ledger.initialize(caller, call.initialSupply)?;
                Vec::new()
            }
            Calls::name(_) => (ledger.name().to_string(),).abi_encode_params(),
            Calls::symbol(_) => (ledger.symbol().to_string(),).abi_encode_params(),
            Calls::decimals(_) => U256::from(ledger.decimals()).abi_encode(),
            Calls::totalSupply(_) => ledger.total_supply().abi_encode(),
            Calls::balanceOf(call) => ledger.balance_of(call.who).abi_encode(),
            Calls::scaledTotalSupply(_) => ledger.scaled_total_supply().abi_encode(),
            Calls::scaledBalanceOf(call) => ledger.scaled_balance_of(call.who).abi_encode(),
            Calls::transfer(call) => {
                ledger.transfer(caller, call.to, call.value)?;
                true.abi_encode()
            }
            Calls::transferAll(call) => {
                ledger.transfer_all(caller, call.to)?;
                true.abi_encode()
            }
            Calls::transferFrom(call) => {
                ledger.transfer_from(caller, call.from, call.to, call.value)?;
                true.abi_encode()
            }
            Calls::transferAllFrom(call) => {
                ledger.transfer_all_from(caller, call.from, call.to)?;
                true.abi_encode()
            }
            Calls::allowance(call) => ledger.allowance(call.owner, call.spender).abi_encode(),
            Calls::approve(call) => {
                ledger.approve(caller, call.spender, call.value)?;
                true.abi_encode()
            }
            Calls::increaseAllowance(call) => {
                ledger.increase_allowance(caller, call.spender, call.addedValue)?;
                true.abi_encode()
            }
            Calls::decreaseAllowance(call) => {
                ledger.decrease_allowance(caller, call.spender, call.subtractedValue)?;
                true.abi_encode()
            }
            Calls::rebase(call) => ledger
                .rebase(caller, call.epoch, call.supplyDelta)?
                .abi_encode(),
            Calls::setRebaseAuthority(call) => {
                ledger.set_rebase_authority(caller, call.newAuthority)?;
                Vec::new()
            }
            Calls::rebaseAuthority(_) => ledger.rebase_authority().abi_encode(),
            Calls::owner(_) => ledger.owner().abi_encode(),
        };
        Ok(output)
    }

    fn execute<S: LedgerStore>(
        &self,
        ledger: &mut ElasticLedger<S>,
        caller: Address,
        is_static: bool,
        call: IElasticSupply::IElasticSupplyCalls,
    ) -> Result<Vec<u8>, PrecompileError> {
        if is_static && !Self::is_view(&call) {
            tracing::warn!(target: "elastic_supply", ?caller, "state change in static call rejected");
            return Err(PrecompileError::other("state change in static call"));
        }
        self.seed_genesis(ledger)?;
        Self::dispatch(ledger, caller, call).map_err(Self::map_ledger_error)
    }

    // === Event Logs ===

    fn event_log(event: &LedgerEvent) -> Log {
        let data = match *event {
            LedgerEvent::Transfer { from, to, amount } => IElasticSupply::Transfer {
                from,
                to,
                value: amount,
            }
            .encode_log_data(),
            LedgerEvent::Approval {
                owner,
                spender,
                amount,
            } => IElasticSupply::Approval {
                owner,
                spender,
                value: amount,
            }
            .encode_log_data(),
            LedgerEvent::Rebase {
                epoch,
                total_supply,
            } => IElasticSupply::LogRebase {
                epoch,
                totalSupply: total_supply,
            }
            .encode_log_data(),
            LedgerEvent::AuthorityUpdated { authority } => {
                IElasticSupply::LogRebaseAuthorityUpdated {
                    rebaseAuthority: authority,
                }
                .encode_log_data()
            }
        };
        Log {
            address: ELASTIC_SUPPLY_PRECOMPILE_ADDR,
            data,
        }
    }
}

impl Default for ElasticSupplyPrecompile {
    /// Uninitialized precompile with the reference token metadata.
    fn default() -> Self {
        Self::uninitialized(TokenMetadata::default())
    }
}

impl Precompile for ElasticSupplyPrecompile {
    fn precompile_id(&self) -> &PrecompileId {
        Self::id()
    }

    fn call(&self, input: PrecompileInput<'_>) -> PrecompileResult {
        let PrecompileInput {
            data,
            gas,
            caller,
            value,
            is_static,
            internals,
            ..
        } = input;

        tracing::debug!(
            target: "elastic_supply",
            ?caller,
            gas,
            is_static,
            calldata_len = data.len(),
            "precompile call invoked"
        );

        if !value.is_zero() {
            tracing::warn!(target: "elastic_supply", ?caller, %value, "value transfer rejected");
            return Err(PrecompileError::other("precompile does not accept value"));
        }

        // Decode ABI
        let decoded = match IElasticSupply::IElasticSupplyCalls::abi_decode(data) {
            Ok(v) => v,
            Err(e) => return Err(PrecompileError::other(e.to_string())),
        };

        let mut ledger = ElasticLedger::with_store(
            JournalStore::new(internals),
            ELASTIC_SUPPLY_PRECOMPILE_ADDR,
            self.metadata.clone(),
        );
        let outcome = self.execute(&mut ledger, caller, is_static, decoded);
        let events = ledger.drain_events();

        // Journal failures take precedence over the ledger's verdict.
        let mut internals = ledger.into_store().finish()?;
        let output = outcome?;
        for event in &events {
            internals.log(Self::event_log(event));
        }

        Ok(PrecompileOutput::new(0, output.into()))
    }

    fn is_pure(&self) -> bool {
        false
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use alloy::sol_types::SolCall;
    use alloy_primitives::{address, I256};
    use ev_elastic::{unit_token, INITIAL_SUPPLY, MAX_SUPPLY};
    use revm::{
        context::{
            journal::{Journal, JournalInner},
            BlockEnv, CfgEnv, TxEnv,
        },
        database::{CacheDB, EmptyDB},
        primitives::hardfork::SpecId,
    };

    type TestJournal = Journal<CacheDB<EmptyDB>>;

    const GAS_LIMIT: u64 = 1_000_000;

    const OWNER: Address = address!("0x00000000000000000000000000000000000000a1");
    const POLICY: Address = address!("0x00000000000000000000000000000000000000b1");
    const HOLDER: Address = address!("0x00000000000000000000000000000000000000c1");
    const SPENDER: Address = address!("0x00000000000000000000000000000000000000d1");

    struct TestContext {
        journal: TestJournal,
        block_env: BlockEnv,
        cfg_env: CfgEnv,
        tx_env: TxEnv,
    }

    impl TestContext {
        fn logs(&self) -> &[Log] {
            &self.journal.inner.logs
        }

        fn storage_at(&self, key: StorageKey) -> Option<U256> {
            self.journal
                .inner
                .state
                .get(&ELASTIC_SUPPLY_PRECOMPILE_ADDR)
                .and_then(|account| account.storage.get(&storage_slot(key)))
                .map(|slot| slot.present_value)
        }
    }

    fn setup_context() -> TestContext {
        let mut journal = Journal::new_with_inner(CacheDB::default(), JournalInner::new());
        journal.inner.set_spec_id(SpecId::PRAGUE);
        TestContext {
            journal,
            block_env: BlockEnv::default(),
            cfg_env: CfgEnv::default(),
            tx_env: TxEnv::default(),
        }
    }

    fn run_call_with(
        ctx: &mut TestContext,
        precompile: &ElasticSupplyPrecompile,
        caller: Address,
        data: &[u8],
        value: U256,
        is_static: bool,
    ) -> PrecompileResult {
        let input = PrecompileInput {
            data,
            gas: GAS_LIMIT,
            caller,
            value,
            is_static,
            target_address: ELASTIC_SUPPLY_PRECOMPILE_ADDR,
            bytecode_address: ELASTIC_SUPPLY_PRECOMPILE_ADDR,
            internals: EvmInternals::new(
                &mut ctx.journal,
                &ctx.block_env,
                &ctx.cfg_env,
                &ctx.tx_env,
            ),
        };

        precompile.call(input)
    }

    fn run_call(
        ctx: &mut TestContext,
        precompile: &ElasticSupplyPrecompile,
        caller: Address,
        data: &[u8],
    ) -> PrecompileResult {
        run_call_with(ctx, precompile, caller, data, U256::ZERO, false)
    }

    fn tokens(n: u64) -> U256 {
        U256::from(n) * unit_token()
    }

    /// Precompile seeded with the reference supply held by `OWNER` and
    /// `POLICY` as rebase authority.
    fn deployed_precompile() -> ElasticSupplyPrecompile {
        let config = LedgerConfig {
            rebase_authority: Some(POLICY),
            ..LedgerConfig::with_administrator(OWNER)
        };
        ElasticSupplyPrecompile::from_config(&config).expect("config should be valid")
    }

    fn query_u256(
        ctx: &mut TestContext,
        precompile: &ElasticSupplyPrecompile,
        calldata: &[u8],
    ) -> U256 {
        let output = run_call(ctx, precompile, OWNER, calldata).expect("query should succeed");
        U256::abi_decode(&output.bytes).expect("decode result")
    }

    fn query_address(
        ctx: &mut TestContext,
        precompile: &ElasticSupplyPrecompile,
        calldata: &[u8],
    ) -> Address {
        let output = run_call(ctx, precompile, OWNER, calldata).expect("query should succeed");
        Address::abi_decode(&output.bytes).expect("decode result")
    }

    fn balance_of(
        ctx: &mut TestContext,
        precompile: &ElasticSupplyPrecompile,
        who: Address,
    ) -> U256 {
        query_u256(
            ctx,
            precompile,
            &IElasticSupply::balanceOfCall { who }.abi_encode(),
        )
    }

    fn allowance(
        ctx: &mut TestContext,
        precompile: &ElasticSupplyPrecompile,
        owner: Address,
        spender: Address,
    ) -> U256 {
        query_u256(
            ctx,
            precompile,
            &IElasticSupply::allowanceCall { owner, spender }.abi_encode(),
        )
    }

    fn expect_error(result: PrecompileResult, needle: &str) {
        match result {
            Err(PrecompileError::Other(msg)) => {
                assert!(msg.contains(needle), "expected '{needle}' error, got: {msg}")
            }
            other => panic!("expected '{needle}' error, got {other:?}"),
        }
    }

    // === Test: Initialization ===

    #[test]
    fn initialize_credits_caller() {
        let precompile = ElasticSupplyPrecompile::default();
        let mut ctx = setup_context();

        let calldata = IElasticSupply::initializeCall {
            initialSupply: INITIAL_SUPPLY,
        }
        .abi_encode();
        run_call(&mut ctx, &precompile, OWNER, &calldata).expect("initialize should succeed");

        assert_eq!(
            balance_of(&mut ctx, &precompile, OWNER),
            INITIAL_SUPPLY,
            "caller should hold the whole supply"
        );
        assert_eq!(
            query_address(&mut ctx, &precompile, &IElasticSupply::ownerCall {}.abi_encode()),
            OWNER,
            "caller should become owner"
        );

        assert_eq!(ctx.logs().len(), 1, "initialize should emit one log");
        let log = &ctx.logs()[0];
        assert_eq!(log.address, ELASTIC_SUPPLY_PRECOMPILE_ADDR);
        let transfer =
            IElasticSupply::Transfer::decode_log_data(&log.data).expect("decode transfer log");
        assert_eq!(transfer.from, Address::ZERO);
        assert_eq!(transfer.to, OWNER);
        assert_eq!(transfer.value, INITIAL_SUPPLY);
    }

    #[test]
    fn second_initialize_is_rejected() {
        let precompile = deployed_precompile();
        let mut ctx = setup_context();

        let calldata = IElasticSupply::initializeCall {
            initialSupply: tokens(1),
        }
        .abi_encode();
        let result = run_call(&mut ctx, &precompile, HOLDER, &calldata);

        expect_error(result, "already initialized");
        assert_eq!(
            query_address(&mut ctx, &precompile, &IElasticSupply::ownerCall {}.abi_encode()),
            OWNER
        );
        assert!(ctx.logs().is_empty(), "failed call must not emit logs");
    }

    #[test]
    fn genesis_is_seeded_without_logs() {
        let precompile = deployed_precompile();
        let mut ctx = setup_context();
        assert_eq!(ctx.storage_at(StorageKey::Initialized), None);

        let supply = query_u256(
            &mut ctx,
            &precompile,
            &IElasticSupply::totalSupplyCall {}.abi_encode(),
        );

        assert_eq!(supply, INITIAL_SUPPLY);
        assert_eq!(
            query_address(
                &mut ctx,
                &precompile,
                &IElasticSupply::rebaseAuthorityCall {}.abi_encode()
            ),
            POLICY
        );
        assert!(ctx.logs().is_empty(), "seeding should not emit logs");
    }

    #[test]
    fn ledger_state_lives_in_account_storage() {
        let precompile = deployed_precompile();
        let mut ctx = setup_context();

        let calldata = IElasticSupply::transferCall {
            to: HOLDER,
            value: tokens(10),
        }
        .abi_encode();
        run_call(&mut ctx, &precompile, OWNER, &calldata).expect("transfer should succeed");

        assert_eq!(ctx.storage_at(StorageKey::Initialized), Some(U256::from(1)));
        assert_eq!(ctx.storage_at(StorageKey::TotalSupply), Some(INITIAL_SUPPLY));
        let account = ctx
            .journal
            .inner
            .state
            .get(&ELASTIC_SUPPLY_PRECOMPILE_ADDR)
            .expect("precompile account should exist");
        assert_eq!(account.info.code, Some(bytecode().clone()));

        // A second instance reads the same journal state.
        let other = ElasticSupplyPrecompile::default();
        assert_eq!(balance_of(&mut ctx, &other, HOLDER), tokens(10));
    }

    #[test]
    fn reverted_frame_discards_ledger_changes() {
        let precompile = deployed_precompile();
        let mut ctx = setup_context();
        assert_eq!(balance_of(&mut ctx, &precompile, OWNER), INITIAL_SUPPLY);

        let checkpoint = ctx.journal.inner.checkpoint();
        let transfer = IElasticSupply::transferCall {
            to: HOLDER,
            value: tokens(10),
        }
        .abi_encode();
        run_call(&mut ctx, &precompile, OWNER, &transfer).expect("transfer should succeed");
        let rebase = IElasticSupply::rebaseCall {
            epoch: U256::from(1),
            supplyDelta: I256::ONE,
        }
        .abi_encode();
        run_call(&mut ctx, &precompile, POLICY, &rebase).expect("rebase should succeed");
        assert_eq!(balance_of(&mut ctx, &precompile, HOLDER), tokens(10));
        ctx.journal.inner.checkpoint_revert(checkpoint);

        assert_eq!(balance_of(&mut ctx, &precompile, HOLDER), U256::ZERO);
        assert_eq!(balance_of(&mut ctx, &precompile, OWNER), INITIAL_SUPPLY);
        assert_eq!(
            query_u256(
                &mut ctx,
                &precompile,
                &IElasticSupply::totalSupplyCall {}.abi_encode()
            ),
            INITIAL_SUPPLY
        );
        assert!(ctx.logs().is_empty(), "reverted logs must be dropped");
    }

    // === Test: Metadata ===

    #[test]
    fn metadata_queries_return_configured_values() {
        let precompile = deployed_precompile();
        let mut ctx = setup_context();

        let output = run_call(
            &mut ctx,
            &precompile,
            HOLDER,
            &IElasticSupply::symbolCall {}.abi_encode(),
        )
        .expect("symbol query should succeed");
        let (symbol,) = <(String,)>::abi_decode_params(&output.bytes).expect("decode symbol");
        assert_eq!(symbol, "LBD");

        let decimals = query_u256(
            &mut ctx,
            &precompile,
            &IElasticSupply::decimalsCall {}.abi_encode(),
        );
        assert_eq!(decimals, U256::from(9));
    }

    // === Test: Transfer ===

    #[test]
    fn transfer_moves_balance_and_emits_log() {
        let precompile = deployed_precompile();
        let mut ctx = setup_context();

        let calldata = IElasticSupply::transferCall {
            to: HOLDER,
            value: tokens(10),
        }
        .abi_encode();
        let output =
            run_call(&mut ctx, &precompile, OWNER, &calldata).expect("transfer should succeed");
        assert_eq!(output.gas_used, 0, "precompile should not consume gas");
        assert!(bool::abi_decode(&output.bytes).expect("decode result"));

        assert_eq!(balance_of(&mut ctx, &precompile, HOLDER), tokens(10));
        assert_eq!(
            balance_of(&mut ctx, &precompile, OWNER),
            INITIAL_SUPPLY - tokens(10)
        );

        assert_eq!(ctx.logs().len(), 1, "exactly one transfer log");
        let transfer = IElasticSupply::Transfer::decode_log_data(&ctx.logs()[0].data)
            .expect("decode transfer log");
        assert_eq!(transfer.from, OWNER);
        assert_eq!(transfer.to, HOLDER);
        assert_eq!(transfer.value, tokens(10));
    }

    #[test]
    fn transfer_all_moves_whole_balance() {
        let precompile = deployed_precompile();
        let mut ctx = setup_context();

        let fund = IElasticSupply::transferCall {
            to: HOLDER,
            value: tokens(3),
        }
        .abi_encode();
        run_call(&mut ctx, &precompile, OWNER, &fund).expect("fund holder");
        let rebase = IElasticSupply::rebaseCall {
            epoch: U256::from(1),
            supplyDelta: I256::from_raw(U256::from(7)),
        }
        .abi_encode();
        run_call(&mut ctx, &precompile, POLICY, &rebase).expect("rebase should succeed");
        let expected = balance_of(&mut ctx, &precompile, HOLDER);

        let calldata = IElasticSupply::transferAllCall { to: SPENDER }.abi_encode();
        let output = run_call(&mut ctx, &precompile, HOLDER, &calldata)
            .expect("transferAll should succeed");
        assert!(bool::abi_decode(&output.bytes).expect("decode result"));

        let scaled = IElasticSupply::scaledBalanceOfCall { who: HOLDER }.abi_encode();
        assert_eq!(query_u256(&mut ctx, &precompile, &scaled), U256::ZERO);
        assert_eq!(balance_of(&mut ctx, &precompile, SPENDER), expected);

        let transfer = IElasticSupply::Transfer::decode_log_data(
            &ctx.logs().last().expect("transfer log").data,
        )
        .expect("decode transfer log");
        assert_eq!(transfer.value, expected);
    }

    #[test]
    fn transfer_to_precompile_or_zero_address_is_rejected() {
        let precompile = deployed_precompile();
        let mut ctx = setup_context();

        for to in [ELASTIC_SUPPLY_PRECOMPILE_ADDR, Address::ZERO] {
            let calldata = IElasticSupply::transferCall {
                to,
                value: tokens(1),
            }
            .abi_encode();
            let result = run_call(&mut ctx, &precompile, OWNER, &calldata);
            expect_error(result, "invalid recipient");
        }

        assert_eq!(balance_of(&mut ctx, &precompile, OWNER), INITIAL_SUPPLY);
        assert!(ctx.logs().is_empty());
    }

    #[test]
    fn insufficient_balance_is_rejected() {
        let precompile = deployed_precompile();
        let mut ctx = setup_context();

        let calldata = IElasticSupply::transferCall {
            to: OWNER,
            value: tokens(1),
        }
        .abi_encode();
        let result = run_call(&mut ctx, &precompile, HOLDER, &calldata);

        expect_error(result, "insufficient balance");
    }

    #[test]
    fn value_bearing_call_is_rejected() {
        let precompile = deployed_precompile();
        let mut ctx = setup_context();

        let calldata = IElasticSupply::totalSupplyCall {}.abi_encode();
        let result = run_call_with(&mut ctx, &precompile, HOLDER, &calldata, U256::from(1), false);

        expect_error(result, "does not accept value");
    }

    #[test]
    fn static_call_allows_views_only() {
        let precompile = deployed_precompile();
        let mut ctx = setup_context();

        let view = IElasticSupply::balanceOfCall { who: OWNER }.abi_encode();
        let output = run_call_with(&mut ctx, &precompile, HOLDER, &view, U256::ZERO, true)
            .expect("view should succeed in a static call");
        assert_eq!(
            U256::abi_decode(&output.bytes).expect("decode result"),
            INITIAL_SUPPLY
        );

        let transfer = IElasticSupply::transferCall {
            to: HOLDER,
            value: tokens(1),
        }
        .abi_encode();
        let result = run_call_with(&mut ctx, &precompile, OWNER, &transfer, U256::ZERO, true);
        expect_error(result, "static call");
        assert_eq!(balance_of(&mut ctx, &precompile, HOLDER), U256::ZERO);
    }

    // === Test: Allowances ===

    #[test]
    fn approve_then_transfer_from() {
        let precompile = deployed_precompile();
        let mut ctx = setup_context();

        let approve = IElasticSupply::approveCall {
            spender: SPENDER,
            value: tokens(10),
        }
        .abi_encode();
        run_call(&mut ctx, &precompile, OWNER, &approve).expect("approve should succeed");

        let transfer_from = IElasticSupply::transferFromCall {
            from: OWNER,
            to: HOLDER,
            value: tokens(4),
        }
        .abi_encode();
        run_call(&mut ctx, &precompile, SPENDER, &transfer_from)
            .expect("transferFrom should succeed");

        assert_eq!(
            allowance(&mut ctx, &precompile, OWNER, SPENDER),
            tokens(6),
            "allowance decreases by exactly the amount"
        );
        assert_eq!(balance_of(&mut ctx, &precompile, HOLDER), tokens(4));

        // approval + transfer, no separate log for the allowance decrement
        assert_eq!(ctx.logs().len(), 2);
        assert_eq!(
            ctx.logs()[1].data.topics()[0],
            IElasticSupply::Transfer::SIGNATURE_HASH
        );

        let overspend = IElasticSupply::transferFromCall {
            from: OWNER,
            to: HOLDER,
            value: tokens(7),
        }
        .abi_encode();
        let result = run_call(&mut ctx, &precompile, SPENDER, &overspend);
        expect_error(result, "insufficient allowance");
    }

    #[test]
    fn transfer_all_from_consumes_allowance() {
        let precompile = deployed_precompile();
        let mut ctx = setup_context();

        let fund = IElasticSupply::transferCall {
            to: HOLDER,
            value: tokens(5),
        }
        .abi_encode();
        run_call(&mut ctx, &precompile, OWNER, &fund).expect("fund holder");

        let calldata = IElasticSupply::transferAllFromCall {
            from: HOLDER,
            to: SPENDER,
        }
        .abi_encode();
        let result = run_call(&mut ctx, &precompile, SPENDER, &calldata);
        expect_error(result, "insufficient allowance");
        assert_eq!(balance_of(&mut ctx, &precompile, HOLDER), tokens(5));

        let approve = IElasticSupply::approveCall {
            spender: SPENDER,
            value: tokens(8),
        }
        .abi_encode();
        run_call(&mut ctx, &precompile, HOLDER, &approve).expect("approve should succeed");
        run_call(&mut ctx, &precompile, SPENDER, &calldata)
            .expect("transferAllFrom should succeed");

        assert_eq!(balance_of(&mut ctx, &precompile, HOLDER), U256::ZERO);
        assert_eq!(balance_of(&mut ctx, &precompile, SPENDER), tokens(5));
        assert_eq!(allowance(&mut ctx, &precompile, HOLDER, SPENDER), tokens(3));
    }

    #[test]
    fn transfer_all_from_is_rejected_at_zero_supply() {
        let precompile = deployed_precompile();
        let mut ctx = setup_context();

        let collapse = IElasticSupply::rebaseCall {
            epoch: U256::from(1),
            supplyDelta: -I256::from_raw(INITIAL_SUPPLY),
        }
        .abi_encode();
        run_call(&mut ctx, &precompile, POLICY, &collapse).expect("rebase should succeed");

        let calldata = IElasticSupply::transferAllFromCall {
            from: OWNER,
            to: SPENDER,
        }
        .abi_encode();
        let result = run_call(&mut ctx, &precompile, SPENDER, &calldata);
        expect_error(result, "supply is zero");

        let scaled = IElasticSupply::scaledBalanceOfCall { who: SPENDER }.abi_encode();
        assert_eq!(query_u256(&mut ctx, &precompile, &scaled), U256::ZERO);
    }

    #[test]
    fn increase_allowance_accumulates() {
        let precompile = deployed_precompile();
        let mut ctx = setup_context();

        for _ in 0..2 {
            let increase = IElasticSupply::increaseAllowanceCall {
                spender: SPENDER,
                addedValue: tokens(3),
            }
            .abi_encode();
            let output = run_call(&mut ctx, &precompile, OWNER, &increase)
                .expect("increase should succeed");
            assert!(bool::abi_decode(&output.bytes).expect("decode result"));
        }

        assert_eq!(allowance(&mut ctx, &precompile, OWNER, SPENDER), tokens(6));
        let approval = IElasticSupply::Approval::decode_log_data(&ctx.logs()[1].data)
            .expect("decode approval log");
        assert_eq!(approval.value, tokens(6), "log carries the resulting allowance");
    }

    #[test]
    fn decrease_allowance_floors_at_zero() {
        let precompile = deployed_precompile();
        let mut ctx = setup_context();

        let increase = IElasticSupply::increaseAllowanceCall {
            spender: SPENDER,
            addedValue: tokens(3),
        }
        .abi_encode();
        run_call(&mut ctx, &precompile, OWNER, &increase).expect("increase should succeed");

        let decrease = IElasticSupply::decreaseAllowanceCall {
            spender: SPENDER,
            subtractedValue: tokens(100),
        }
        .abi_encode();
        run_call(&mut ctx, &precompile, OWNER, &decrease).expect("decrease should not fail");

        assert_eq!(allowance(&mut ctx, &precompile, OWNER, SPENDER), U256::ZERO);
        let approval = IElasticSupply::Approval::decode_log_data(&ctx.logs()[1].data)
            .expect("decode approval log");
        assert_eq!(approval.value, U256::ZERO);
    }

    // === Test: Rebase ===

    #[test]
    fn rebase_by_authority_emits_log() {
        let precompile = deployed_precompile();
        let mut ctx = setup_context();

        let delta = INITIAL_SUPPLY / U256::from(10);
        let calldata = IElasticSupply::rebaseCall {
            epoch: U256::from(1),
            supplyDelta: I256::from_raw(delta),
        }
        .abi_encode();
        let output =
            run_call(&mut ctx, &precompile, POLICY, &calldata).expect("rebase should succeed");

        let expected = INITIAL_SUPPLY + delta;
        assert_eq!(U256::abi_decode(&output.bytes).expect("decode"), expected);
        assert_eq!(balance_of(&mut ctx, &precompile, OWNER), expected);

        let rebase = IElasticSupply::LogRebase::decode_log_data(&ctx.logs()[0].data)
            .expect("decode rebase log");
        assert_eq!(rebase.epoch, U256::from(1));
        assert_eq!(rebase.totalSupply, expected);
    }

    #[test]
    fn scaled_views_are_unchanged_by_rebase() {
        let precompile = deployed_precompile();
        let mut ctx = setup_context();

        let scaled_total = IElasticSupply::scaledTotalSupplyCall {}.abi_encode();
        let scaled_owner = IElasticSupply::scaledBalanceOfCall { who: OWNER }.abi_encode();
        let total_units = query_u256(&mut ctx, &precompile, &scaled_total);
        assert_eq!(query_u256(&mut ctx, &precompile, &scaled_owner), total_units);

        let calldata = IElasticSupply::rebaseCall {
            epoch: U256::from(1),
            supplyDelta: I256::from_raw(INITIAL_SUPPLY),
        }
        .abi_encode();
        run_call(&mut ctx, &precompile, POLICY, &calldata).expect("rebase should succeed");

        assert_eq!(query_u256(&mut ctx, &precompile, &scaled_total), total_units);
        assert_eq!(query_u256(&mut ctx, &precompile, &scaled_owner), total_units);
        assert_eq!(
            balance_of(&mut ctx, &precompile, OWNER),
            INITIAL_SUPPLY * U256::from(2)
        );
    }

    #[test]
    fn rebase_by_non_authority_is_denied() {
        let precompile = deployed_precompile();
        let mut ctx = setup_context();

        let calldata = IElasticSupply::rebaseCall {
            epoch: U256::from(1),
            supplyDelta: I256::ONE,
        }
        .abi_encode();
        let result = run_call(&mut ctx, &precompile, OWNER, &calldata);

        expect_error(result, "unauthorized caller");
        assert_eq!(
            query_u256(
                &mut ctx,
                &precompile,
                &IElasticSupply::totalSupplyCall {}.abi_encode()
            ),
            INITIAL_SUPPLY
        );
    }

    #[test]
    fn rebase_clamps_at_max_supply() {
        let precompile = deployed_precompile();
        let mut ctx = setup_context();

        let calldata = IElasticSupply::rebaseCall {
            epoch: U256::from(1),
            supplyDelta: I256::MAX,
        }
        .abi_encode();
        let output = run_call(&mut ctx, &precompile, POLICY, &calldata)
            .expect("clamped rebase should succeed");

        assert_eq!(U256::abi_decode(&output.bytes).expect("decode"), MAX_SUPPLY);
        assert_eq!(
            query_u256(
                &mut ctx,
                &precompile,
                &IElasticSupply::totalSupplyCall {}.abi_encode()
            ),
            MAX_SUPPLY
        );
    }

    // === Test: Access Gate ===

    #[test]
    fn owner_sets_rebase_authority() {
        let precompile = deployed_precompile();
        let mut ctx = setup_context();

        let calldata = IElasticSupply::setRebaseAuthorityCall {
            newAuthority: HOLDER,
        }
        .abi_encode();
        run_call(&mut ctx, &precompile, OWNER, &calldata).expect("owner should set authority");

        assert_eq!(
            query_address(
                &mut ctx,
                &precompile,
                &IElasticSupply::rebaseAuthorityCall {}.abi_encode()
            ),
            HOLDER
        );

        let updated =
            IElasticSupply::LogRebaseAuthorityUpdated::decode_log_data(&ctx.logs()[0].data)
                .expect("decode authority log");
        assert_eq!(updated.rebaseAuthority, HOLDER);
    }

    #[test]
    fn non_owner_cannot_set_rebase_authority() {
        let precompile = deployed_precompile();
        let mut ctx = setup_context();

        let calldata = IElasticSupply::setRebaseAuthorityCall {
            newAuthority: HOLDER,
        }
        .abi_encode();
        let result = run_call(&mut ctx, &precompile, HOLDER, &calldata);

        expect_error(result, "unauthorized caller");
        assert_eq!(
            query_address(
                &mut ctx,
                &precompile,
                &IElasticSupply::rebaseAuthorityCall {}.abi_encode()
            ),
            POLICY
        );
    }

    #[test]
    fn invalid_calldata_returns_error() {
        let precompile = deployed_precompile();
        let mut ctx = setup_context();

        let result = run_call(&mut ctx, &precompile, OWNER, &[0xde, 0xad]);
        assert!(result.is_err(), "malformed calldata should fail");
    }
}
