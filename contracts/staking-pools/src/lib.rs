//! OrbitYield - Staking Pools (Soroban)
//! Time-based staking with lock periods and reputation-weighted reward
//! claims on Stellar.

#![no_std]
use soroban_sdk::{
    contract, contractimpl, contracttype, symbol_short, token, Address, Env, IntoVal, String,
    Symbol, Val, Vec,
};

use orbit_common::math::{self, BPS_DENOM, SECONDS_PER_YEAR};

// ============================================================
// Data Types
// ============================================================

/// How a claimant's reputation multiplier (10_000 = neutral) converts into
/// a bonus on top of the base reward. The two deployed reward contracts
/// historically disagreed on this, so both behaviors are kept selectable
/// per pool (see DESIGN.md).
#[contracttype]
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum BonusStrategy {
    /// `bonus = base * (multiplier - 10_000) / 10_000`; a neutral
    /// multiplier pays the base reward only.
    AboveBaseline,
    /// `bonus = base * multiplier / 10_000`; the multiplier is read as an
    /// absolute bonus fraction, so a neutral multiplier doubles the base.
    Absolute,
}

#[contracttype]
#[derive(Clone)]
pub struct Pool {
    pub id: u32,
    pub name: String,
    pub rate_bps: u32, // APY in basis points
    pub lock_period: u64, // seconds, 0 = no lock
    pub min_stake: i128,
    pub max_stake: i128,
    pub total_deposited: i128,
    pub reward_budget: i128,
    pub active: bool,
    pub bonus_strategy: BonusStrategy,
}

#[contracttype]
#[derive(Clone)]
pub struct Position {
    pub staker: Address,
    pub pool_id: u32,
    pub amount: i128,
    pub deposit_time: u64,
    pub last_claim_time: u64,
}

#[contracttype]
#[derive(Clone)]
pub enum DataKey {
    Admin,
    PendingAdmin,
    Token,
    ReputationContract,
    Paused,
    PoolCounter,
    Pool(u32),
    Position(Address, u32),
    AccountStaked(Address),
}

#[soroban_sdk::contracterror]
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
#[repr(u32)]
pub enum Error {
    AlreadyInitialized = 1,
    NotInitialized = 2,
    NotFound = 3,
    Unauthorized = 4,
    InvalidInput = 5,
    AlreadyExists = 6,
    StillLocked = 7,
    InsufficientBudget = 8,
    Paused = 9,
    Overflow = 10,
}

const INSTANCE_LIFETIME_THRESHOLD: u32 = 17_280;
const INSTANCE_BUMP_AMOUNT: u32 = 86_400;
const PERSISTENT_LIFETIME_THRESHOLD: u32 = 120_960;
const PERSISTENT_BUMP_AMOUNT: u32 = 1_051_200;

#[contract]
pub struct StakingPoolsContract;

#[contractimpl]
impl StakingPoolsContract {
    pub fn initialize(env: Env, admin: Address, token: Address) -> Result<(), Error> {
        env.storage()
            .instance()
            .extend_ttl(INSTANCE_LIFETIME_THRESHOLD, INSTANCE_BUMP_AMOUNT);
        if env.storage().instance().has(&DataKey::Admin) {
            return Err(Error::AlreadyInitialized);
        }
        admin.require_auth();
        env.storage().instance().set(&DataKey::Admin, &admin);
        env.storage().instance().set(&DataKey::Token, &token);
        env.storage().instance().set(&DataKey::PoolCounter, &0u32);
        env.storage().instance().set(&DataKey::Paused, &false);
        Ok(())
    }

    /// Wire the reputation contract whose multiplier weights claims.
    /// Claims pay the neutral multiplier until this is set.
    pub fn set_reputation(env: Env, admin: Address, contract: Address) -> Result<(), Error> {
        Self::_require_admin(&env, &admin)?;
        env.storage()
            .instance()
            .set(&DataKey::ReputationContract, &contract);
        Ok(())
    }

    pub fn set_paused(env: Env, admin: Address, paused: bool) -> Result<(), Error> {
        Self::_require_admin(&env, &admin)?;
        env.storage().instance().set(&DataKey::Paused, &paused);
        env.events().publish(
            (symbol_short!("stake"), symbol_short!("paused")),
            paused,
        );
        Ok(())
    }

    // ============================================================
    // Pool Registry
    // ============================================================

    pub fn create_pool(
        env: Env,
        admin: Address,
        name: String,
        lock_period: u64,
        rate_bps: u32,
        min_stake: i128,
        max_stake: i128,
        bonus_strategy: BonusStrategy,
    ) -> Result<u32, Error> {
        Self::_require_admin(&env, &admin)?;
        Self::_require_not_paused(&env)?;
        if min_stake <= 0 || min_stake > max_stake {
            return Err(Error::InvalidInput);
        }

        let counter: u32 = env
            .storage()
            .instance()
            .get(&DataKey::PoolCounter)
            .unwrap_or(0);
        let pool_id = counter + 1;
        env.storage().instance().set(&DataKey::PoolCounter, &pool_id);

        let pool = Pool {
            id: pool_id,
            name,
            rate_bps,
            lock_period,
            min_stake,
            max_stake,
            total_deposited: 0,
            reward_budget: 0,
            active: true,
            bonus_strategy,
        };
        Self::_write_pool(&env, &pool);

        env.events().publish(
            (symbol_short!("stake"), symbol_short!("create")),
            (pool_id, rate_bps, lock_period),
        );
        Ok(pool_id)
    }

    /// Update rate, deposit bounds, and the active flag. Pools are never
    /// deleted, only deactivated, so historical claims stay resolvable.
    pub fn update_pool(
        env: Env,
        admin: Address,
        pool_id: u32,
        rate_bps: u32,
        min_stake: i128,
        max_stake: i128,
        active: bool,
    ) -> Result<(), Error> {
        Self::_require_admin(&env, &admin)?;
        Self::_require_not_paused(&env)?;
        if min_stake <= 0 || min_stake > max_stake {
            return Err(Error::InvalidInput);
        }
        let mut pool = Self::_read_pool(&env, pool_id)?;
        pool.rate_bps = rate_bps;
        pool.min_stake = min_stake;
        pool.max_stake = max_stake;
        pool.active = active;
        Self::_write_pool(&env, &pool);
        Ok(())
    }

    /// Fund the pool's reward budget. The tokens move from the admin into
    /// the contract in the same invocation, so the budget counter never
    /// exceeds what the contract actually holds.
    pub fn add_pool_rewards(
        env: Env,
        admin: Address,
        pool_id: u32,
        amount: i128,
    ) -> Result<(), Error> {
        Self::_require_admin(&env, &admin)?;
        Self::_require_not_paused(&env)?;
        if amount <= 0 {
            return Err(Error::InvalidInput);
        }
        let mut pool = Self::_read_pool(&env, pool_id)?;

        let token_addr: Address = env.storage().instance().get(&DataKey::Token).unwrap();
        token::Client::new(&env, &token_addr).transfer(
            &admin,
            &env.current_contract_address(),
            &amount,
        );

        pool.reward_budget = pool
            .reward_budget
            .checked_add(amount)
            .ok_or(Error::Overflow)?;
        Self::_write_pool(&env, &pool);

        env.events().publish(
            (symbol_short!("stake"), symbol_short!("funded")),
            (pool_id, amount),
        );
        Ok(())
    }

    // ============================================================
    // Position Ledger
    // ============================================================

    pub fn stake(env: Env, staker: Address, pool_id: u32, amount: i128) -> Result<(), Error> {
        env.storage()
            .instance()
            .extend_ttl(INSTANCE_LIFETIME_THRESHOLD, INSTANCE_BUMP_AMOUNT);
        staker.require_auth();
        Self::_require_not_paused(&env)?;

        let mut pool = Self::_read_pool(&env, pool_id)?;
        if !pool.active {
            return Err(Error::InvalidInput);
        }
        if amount < pool.min_stake || amount > pool.max_stake {
            return Err(Error::InvalidInput);
        }

        let position_key = DataKey::Position(staker.clone(), pool_id);
        if env.storage().persistent().has(&position_key) {
            return Err(Error::AlreadyExists);
        }

        let token_addr: Address = env.storage().instance().get(&DataKey::Token).unwrap();
        token::Client::new(&env, &token_addr).transfer(
            &staker,
            &env.current_contract_address(),
            &amount,
        );

        let now = env.ledger().timestamp();
        let position = Position {
            staker: staker.clone(),
            pool_id,
            amount,
            deposit_time: now,
            last_claim_time: now,
        };
        env.storage().persistent().set(&position_key, &position);
        env.storage().persistent().extend_ttl(
            &position_key,
            PERSISTENT_LIFETIME_THRESHOLD,
            PERSISTENT_BUMP_AMOUNT,
        );

        pool.total_deposited = pool
            .total_deposited
            .checked_add(amount)
            .ok_or(Error::Overflow)?;
        Self::_write_pool(&env, &pool);
        Self::_adjust_account_staked(&env, &staker, amount)?;

        Self::_signal_activity(&env, &staker);

        env.events().publish(
            (symbol_short!("stake"), symbol_short!("deposit")),
            (staker, pool_id, amount),
        );
        Ok(())
    }

    /// Pay out the pending reward. Zero elapsed time pays zero and leaves
    /// the position untouched; a short budget fails the whole claim.
    pub fn claim_rewards(env: Env, staker: Address, pool_id: u32) -> Result<i128, Error> {
        env.storage()
            .instance()
            .extend_ttl(INSTANCE_LIFETIME_THRESHOLD, INSTANCE_BUMP_AMOUNT);
        staker.require_auth();
        Self::_require_not_paused(&env)?;

        let mut pool = Self::_read_pool(&env, pool_id)?;
        let position_key = DataKey::Position(staker.clone(), pool_id);
        let mut position: Position = env
            .storage()
            .persistent()
            .get(&position_key)
            .ok_or(Error::NotFound)?;

        let now = env.ledger().timestamp();
        let base = Self::_pending_base(&pool, &position, now)?;
        if base == 0 {
            return Ok(0);
        }

        let multiplier = Self::_reward_multiplier(&env, &staker);
        let bonus = Self::_bonus(base, multiplier, pool.bonus_strategy)?;
        let payout = base.checked_add(bonus).ok_or(Error::Overflow)?;
        if payout > pool.reward_budget {
            return Err(Error::InsufficientBudget);
        }

        pool.reward_budget -= payout;
        position.last_claim_time = now;
        Self::_write_pool(&env, &pool);
        env.storage().persistent().set(&position_key, &position);
        env.storage().persistent().extend_ttl(
            &position_key,
            PERSISTENT_LIFETIME_THRESHOLD,
            PERSISTENT_BUMP_AMOUNT,
        );

        let token_addr: Address = env.storage().instance().get(&DataKey::Token).unwrap();
        token::Client::new(&env, &token_addr).transfer(
            &env.current_contract_address(),
            &staker,
            &payout,
        );

        env.events().publish(
            (symbol_short!("stake"), symbol_short!("claim")),
            (staker, pool_id, payout),
        );
        Ok(payout)
    }

    /// Close the position: claim pending rewards first so nothing is
    /// stranded, then return the principal.
    pub fn unstake(env: Env, staker: Address, pool_id: u32) -> Result<i128, Error> {
        env.storage()
            .instance()
            .extend_ttl(INSTANCE_LIFETIME_THRESHOLD, INSTANCE_BUMP_AMOUNT);
        staker.require_auth();
        Self::_require_not_paused(&env)?;

        let pool = Self::_read_pool(&env, pool_id)?;
        let position_key = DataKey::Position(staker.clone(), pool_id);
        let position: Position = env
            .storage()
            .persistent()
            .get(&position_key)
            .ok_or(Error::NotFound)?;

        let now = env.ledger().timestamp();
        if pool.lock_period > 0 && now < position.deposit_time + pool.lock_period {
            return Err(Error::StillLocked);
        }

        Self::claim_rewards(env.clone(), staker.clone(), pool_id)?;

        // Re-read: the claim advanced the budget and last_claim_time.
        let mut pool = Self::_read_pool(&env, pool_id)?;
        let principal = position.amount;
        env.storage().persistent().remove(&position_key);
        pool.total_deposited -= principal;
        Self::_write_pool(&env, &pool);
        Self::_adjust_account_staked(&env, &staker, -principal)?;

        let token_addr: Address = env.storage().instance().get(&DataKey::Token).unwrap();
        token::Client::new(&env, &token_addr).transfer(
            &env.current_contract_address(),
            &staker,
            &principal,
        );

        env.events().publish(
            (symbol_short!("stake"), symbol_short!("unstake")),
            (staker, pool_id, principal),
        );
        Ok(principal)
    }

    /// Return a stuck position's principal, forfeiting unclaimed rewards.
    /// Bypasses the lock period and the pause flag; admin only. Lossy.
    pub fn emergency_withdraw(
        env: Env,
        admin: Address,
        staker: Address,
        pool_id: u32,
    ) -> Result<i128, Error> {
        Self::_require_admin(&env, &admin)?;

        let position_key = DataKey::Position(staker.clone(), pool_id);
        let position: Position = env
            .storage()
            .persistent()
            .get(&position_key)
            .ok_or(Error::NotFound)?;

        let mut pool = Self::_read_pool(&env, pool_id)?;
        let principal = position.amount;
        env.storage().persistent().remove(&position_key);
        pool.total_deposited -= principal;
        Self::_write_pool(&env, &pool);
        Self::_adjust_account_staked(&env, &staker, -principal)?;

        let token_addr: Address = env.storage().instance().get(&DataKey::Token).unwrap();
        token::Client::new(&env, &token_addr).transfer(
            &env.current_contract_address(),
            &staker,
            &principal,
        );

        env.events().publish(
            (symbol_short!("stake"), symbol_short!("emergency")),
            (staker, pool_id, principal),
        );
        Ok(principal)
    }

    // ============================================================
    // Queries
    // ============================================================

    pub fn get_pool(env: Env, pool_id: u32) -> Option<Pool> {
        env.storage()
            .instance()
            .extend_ttl(INSTANCE_LIFETIME_THRESHOLD, INSTANCE_BUMP_AMOUNT);
        env.storage().persistent().get(&DataKey::Pool(pool_id))
    }

    pub fn get_position(env: Env, staker: Address, pool_id: u32) -> Option<Position> {
        env.storage()
            .instance()
            .extend_ttl(INSTANCE_LIFETIME_THRESHOLD, INSTANCE_BUMP_AMOUNT);
        env.storage()
            .persistent()
            .get(&DataKey::Position(staker, pool_id))
    }

    /// Pending reward at the current ledger time, before any bonus.
    pub fn get_pending_reward(env: Env, staker: Address, pool_id: u32) -> Result<i128, Error> {
        let pool = Self::_read_pool(&env, pool_id)?;
        let position: Position = env
            .storage()
            .persistent()
            .get(&DataKey::Position(staker, pool_id))
            .ok_or(Error::NotFound)?;
        Self::_pending_base(&pool, &position, env.ledger().timestamp())
    }

    /// Sum of this account's open positions across all pools. Read by the
    /// reputation contract when it recomputes the staking component.
    pub fn get_account_staked(env: Env, staker: Address) -> i128 {
        env.storage()
            .persistent()
            .get(&DataKey::AccountStaked(staker))
            .unwrap_or(0)
    }

    pub fn get_pool_count(env: Env) -> u32 {
        env.storage()
            .instance()
            .get(&DataKey::PoolCounter)
            .unwrap_or(0)
    }

    pub fn is_paused(env: Env) -> bool {
        env.storage()
            .instance()
            .get(&DataKey::Paused)
            .unwrap_or(false)
    }

    pub fn propose_admin(env: Env, current_admin: Address, new_admin: Address) {
        orbit_common::admin::propose_admin(
            &env,
            &DataKey::Admin,
            &DataKey::PendingAdmin,
            current_admin,
            new_admin,
        );
    }

    pub fn accept_admin(env: Env, new_admin: Address) {
        orbit_common::admin::accept_admin(&env, &DataKey::Admin, &DataKey::PendingAdmin, new_admin);
    }

    // ============================================================
    // Internal Helpers
    // ============================================================

    /// Linearized simple-interest accrual: APY basis points over elapsed
    /// seconds, not compounded. Zero elapsed yields zero.
    fn _pending_base(pool: &Pool, position: &Position, now: u64) -> Result<i128, Error> {
        let elapsed = now.saturating_sub(position.last_claim_time);
        if elapsed == 0 {
            return Ok(0);
        }
        math::accrual(
            position.amount,
            pool.rate_bps as i128,
            elapsed as i128,
            SECONDS_PER_YEAR as i128 * BPS_DENOM,
        )
        .ok_or(Error::Overflow)
    }

    fn _bonus(base: i128, multiplier: u32, strategy: BonusStrategy) -> Result<i128, Error> {
        // The reputation contract never reports below neutral; clamp so a
        // misbehaving collaborator can't turn the bonus negative.
        let multiplier = (multiplier as i128).max(BPS_DENOM);
        let bonus = match strategy {
            BonusStrategy::AboveBaseline => math::mul_div(base, multiplier - BPS_DENOM, BPS_DENOM),
            BonusStrategy::Absolute => math::mul_div(base, multiplier, BPS_DENOM),
        };
        bonus.ok_or(Error::Overflow)
    }

    fn _reward_multiplier(env: &Env, staker: &Address) -> u32 {
        match env
            .storage()
            .instance()
            .get::<DataKey, Address>(&DataKey::ReputationContract)
        {
            Some(reputation) => env.invoke_contract(
                &reputation,
                &Symbol::new(env, "get_reward_multiplier"),
                Vec::<Val>::from_array(env, [staker.into_val(env)]),
            ),
            None => BPS_DENOM as u32,
        }
    }

    /// Participation signal into the reputation ledger: a call, not a
    /// field write, so the coupling stays one-directional.
    fn _signal_activity(env: &Env, staker: &Address) {
        if let Some(reputation) = env
            .storage()
            .instance()
            .get::<DataKey, Address>(&DataKey::ReputationContract)
        {
            env.invoke_contract::<()>(
                &reputation,
                &Symbol::new(env, "record_activity"),
                Vec::<Val>::from_array(env, [staker.into_val(env)]),
            );
        }
    }

    fn _adjust_account_staked(env: &Env, staker: &Address, delta: i128) -> Result<(), Error> {
        let key = DataKey::AccountStaked(staker.clone());
        let current: i128 = env.storage().persistent().get(&key).unwrap_or(0);
        let next = current.checked_add(delta).ok_or(Error::Overflow)?;
        env.storage().persistent().set(&key, &next);
        env.storage().persistent().extend_ttl(
            &key,
            PERSISTENT_LIFETIME_THRESHOLD,
            PERSISTENT_BUMP_AMOUNT,
        );
        Ok(())
    }

    fn _read_pool(env: &Env, pool_id: u32) -> Result<Pool, Error> {
        env.storage()
            .persistent()
            .get(&DataKey::Pool(pool_id))
            .ok_or(Error::NotFound)
    }

    fn _write_pool(env: &Env, pool: &Pool) {
        let key = DataKey::Pool(pool.id);
        env.storage().persistent().set(&key, pool);
        env.storage().persistent().extend_ttl(
            &key,
            PERSISTENT_LIFETIME_THRESHOLD,
            PERSISTENT_BUMP_AMOUNT,
        );
    }

    fn _require_admin(env: &Env, caller: &Address) -> Result<(), Error> {
        env.storage()
            .instance()
            .extend_ttl(INSTANCE_LIFETIME_THRESHOLD, INSTANCE_BUMP_AMOUNT);
        if !env.storage().instance().has(&DataKey::Admin) {
            return Err(Error::NotInitialized);
        }
        caller.require_auth();
        if !orbit_common::admin::is_admin(env, &DataKey::Admin, caller) {
            return Err(Error::Unauthorized);
        }
        Ok(())
    }

    fn _require_not_paused(env: &Env) -> Result<(), Error> {
        let paused: bool = env
            .storage()
            .instance()
            .get(&DataKey::Paused)
            .unwrap_or(false);
        if paused {
            return Err(Error::Paused);
        }
        Ok(())
    }
}
