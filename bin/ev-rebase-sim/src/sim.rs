//! Rebase precision simulations.

use alloy_primitives::{address, Address, I256, U256};
use ev_elastic::{supply_delta, ElasticLedger, LedgerConfig, MAX_SUPPLY};
use eyre::{ensure, WrapErr};
use rand::{rngs::StdRng, Rng, SeedableRng};
use tracing::{debug, info};

/// Counterparty in the transfer checks.
pub(crate) const SIM_USER: Address = address!("0x000000000000000000000000000000000000beef");

/// Growth rates are sampled in steps of 1e-5.
const GROWTH_SCALE: i64 = 100_000;
const MIN_GROWTH: i64 = -50_000;
const MAX_GROWTH: i64 = 250_000;

/// Outcome of a completed simulation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct SimReport {
    pub(crate) cycles: u64,
    pub(crate) final_supply: U256,
}

/// Builds the ledger with the administrator also acting as rebase authority.
fn deploy(config: &LedgerConfig) -> eyre::Result<ElasticLedger> {
    let mut ledger = ElasticLedger::from_config(config).wrap_err("failed to deploy ledger")?;
    ledger.set_rebase_authority(config.administrator, config.administrator)?;
    ledger.drain_events();
    Ok(ledger)
}

/// Alternates a +1 rebase with a doubling rebase until the supply reaches
/// `MAX_SUPPLY`, requiring every +1 rebase to move the supply by exactly one.
pub(crate) fn supply_precision(config: &LedgerConfig) -> eyre::Result<SimReport> {
    let mut ledger = deploy(config)?;
    let policy = config.administrator;
    let mut cycles = 0u64;

    while ledger.total_supply() < MAX_SUPPLY {
        let before = ledger.total_supply();
        let after = ledger.rebase(policy, U256::from(2 * cycles), I256::ONE)?;
        ensure!(
            after == before + U256::from(1),
            "cycle {}: +1 rebase moved supply from {before} to {after}",
            cycles + 1
        );

        debug!(cycle = cycles + 1, supply = %after, "doubling supply");
        ledger.rebase(policy, U256::from(2 * cycles + 1), supply_delta(after, false)?)?;
        ledger.drain_events();
        cycles += 1;
    }

    info!(cycles, "supply precision held up to the cap");
    Ok(SimReport {
        cycles,
        final_supply: ledger.total_supply(),
    })
}

/// Applies seeded random growth in `[-50%, +250%]` per cycle and checks that
/// transfers of one unit and of a full balance move external balances by
/// exactly the amount. Stops before a rebase would reach `MAX_SUPPLY`.
pub(crate) fn transfer_precision(
    config: &LedgerConfig,
    seed: u64,
    max_cycles: Option<u64>,
) -> eyre::Result<SimReport> {
    let mut ledger = deploy(config)?;
    let deployer = config.administrator;
    ensure!(
        deployer != SIM_USER && ledger.ledger_address() != SIM_USER,
        "simulation user {SIM_USER} collides with a configured address"
    );

    let mut rng = StdRng::seed_from_u64(seed);
    let mut rebase_amount = I256::ZERO;
    let mut cycles = 0u64;

    loop {
        cycles += 1;
        let supply = ledger.rebase(deployer, U256::from(cycles), rebase_amount)?;
        debug!(cycle = cycles, %rebase_amount, %supply, "rebased");

        let one = U256::from(1);
        check_transfer(&mut ledger, deployer, SIM_USER, one)?;
        check_transfer(&mut ledger, SIM_USER, deployer, one)?;

        let full = ledger.balance_of(deployer);
        check_transfer(&mut ledger, deployer, SIM_USER, full)?;
        check_transfer(&mut ledger, SIM_USER, deployer, full)?;
        ledger.drain_events();

        let growth = rng.gen_range(MIN_GROWTH..=MAX_GROWTH);
        let supply = ledger.total_supply();
        let magnitude = supply * U256::from(growth.unsigned_abs()) / U256::from(GROWTH_SCALE);
        rebase_amount = supply_delta(magnitude, growth < 0)?;

        if growth >= 0 && supply + magnitude >= MAX_SUPPLY {
            break;
        }
        if max_cycles.is_some_and(|max| cycles >= max) {
            break;
        }
    }

    info!(cycles, seed, "transfer precision held");
    Ok(SimReport {
        cycles,
        final_supply: ledger.total_supply(),
    })
}

fn check_transfer(
    ledger: &mut ElasticLedger,
    from: Address,
    to: Address,
    amount: U256,
) -> eyre::Result<()> {
    let (from_before, to_before) = (ledger.balance_of(from), ledger.balance_of(to));
    ledger
        .transfer(from, to, amount)
        .wrap_err_with(|| format!("transfer of {amount} from {from} to {to} failed"))?;
    let (from_after, to_after) = (ledger.balance_of(from), ledger.balance_of(to));

    ensure!(
        from_before + to_before == from_after + to_after,
        "transfer of {amount} changed the pair sum"
    );
    ensure!(
        from_before - amount == from_after && to_before + amount == to_after,
        "transfer of {amount} was not exact: sender {from_before} -> {from_after}, \
         recipient {to_before} -> {to_after}"
    );
    Ok(())
}
