//! OrbitYield - LP Farming (Soroban)
//! Liquidity-farming campaigns with a bounded emission window and
//! reputation-weighted reward claims on Stellar.

#![no_std]
use soroban_sdk::{
    contract, contractimpl, contracttype, symbol_short, token, Address, Env, IntoVal, String,
    Symbol, Val, Vec,
};

use orbit_common::math::{self, BPS_DENOM};

/// How a claimant's reputation multiplier (10_000 = neutral) converts into
/// a bonus on top of the base reward. Kept selectable per farm for parity
/// with the staking contract (see DESIGN.md).
#[contracttype]
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum BonusStrategy {
    /// `bonus = base * (multiplier - 10_000) / 10_000`.
    AboveBaseline,
    /// `bonus = base * multiplier / 10_000`.
    Absolute,
}

#[contracttype]
#[derive(Clone)]
pub struct Farm {
    pub id: u32,
    pub name: String,
    /// Reward units per second per deposited unit, scaled by 10_000.
    pub rate: u32,
    pub lock_period: u64,
    pub min_deposit: i128,
    pub max_deposit: i128,
    pub start_time: u64,
    pub end_time: u64,
    pub total_deposited: i128,
    pub reward_budget: i128,
    pub active: bool,
    pub bonus_strategy: BonusStrategy,
}

#[contracttype]
#[derive(Clone)]
pub struct FarmPosition {
    pub farmer: Address,
    pub farm_id: u32,
    pub amount: i128,
    pub deposit_time: u64,
    pub last_claim_time: u64,
}

#[contracttype]
#[derive(Clone)]
pub enum DataKey {
    Admin,
    PendingAdmin,
    LpToken,
    RewardToken,
    ReputationContract,
    Paused,
    FarmCounter,
    Farm(u32),
    Position(Address, u32),
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
    InvariantViolation = 10,
    Overflow = 11,
}

const INSTANCE_LIFETIME_THRESHOLD: u32 = 17_280;
const INSTANCE_BUMP_AMOUNT: u32 = 86_400;
const PERSISTENT_LIFETIME_THRESHOLD: u32 = 120_960;
const PERSISTENT_BUMP_AMOUNT: u32 = 1_051_200;

#[contract]
pub struct LpFarmingContract;

#[contractimpl]
impl LpFarmingContract {
    /// LP deposits and reward payouts may use different assets, so the
    /// contract is wired with both at construction.
    pub fn initialize(
        env: Env,
        admin: Address,
        lp_token: Address,
        reward_token: Address,
    ) -> Result<(), Error> {
        env.storage()
            .instance()
            .extend_ttl(INSTANCE_LIFETIME_THRESHOLD, INSTANCE_BUMP_AMOUNT);
        if env.storage().instance().has(&DataKey::Admin) {
            return Err(Error::AlreadyInitialized);
        }
        admin.require_auth();
        env.storage().instance().set(&DataKey::Admin, &admin);
        env.storage().instance().set(&DataKey::LpToken, &lp_token);
        env.storage()
            .instance()
            .set(&DataKey::RewardToken, &reward_token);
        env.storage().instance().set(&DataKey::FarmCounter, &0u32);
        env.storage().instance().set(&DataKey::Paused, &false);
        Ok(())
    }

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
        env.events()
            .publish((symbol_short!("farm"), symbol_short!("paused")), paused);
        Ok(())
    }

    // ============================================================
    // Farm Registry
    // ============================================================

    pub fn create_farm(
        env: Env,
        admin: Address,
        name: String,
        lock_period: u64,
        rate: u32,
        min_deposit: i128,
        max_deposit: i128,
        start_time: u64,
        end_time: u64,
        bonus_strategy: BonusStrategy,
    ) -> Result<u32, Error> {
        Self::_require_admin(&env, &admin)?;
        Self::_require_not_paused(&env)?;
        if start_time >= end_time {
            return Err(Error::InvariantViolation);
        }
        if min_deposit <= 0 || min_deposit > max_deposit {
            return Err(Error::InvalidInput);
        }

        let counter: u32 = env
            .storage()
            .instance()
            .get(&DataKey::FarmCounter)
            .unwrap_or(0);
        let farm_id = counter + 1;
        env.storage().instance().set(&DataKey::FarmCounter, &farm_id);

        let farm = Farm {
            id: farm_id,
            name,
            rate,
            lock_period,
            min_deposit,
            max_deposit,
            start_time,
            end_time,
            total_deposited: 0,
            reward_budget: 0,
            active: true,
            bonus_strategy,
        };
        Self::_write_farm(&env, &farm);

        env.events().publish(
            (symbol_short!("farm"), symbol_short!("create")),
            (farm_id, rate, start_time, end_time),
        );
        Ok(farm_id)
    }

    pub fn update_farm(
        env: Env,
        admin: Address,
        farm_id: u32,
        rate: u32,
        min_deposit: i128,
        max_deposit: i128,
        active: bool,
    ) -> Result<(), Error> {
        Self::_require_admin(&env, &admin)?;
        Self::_require_not_paused(&env)?;
        if min_deposit <= 0 || min_deposit > max_deposit {
            return Err(Error::InvalidInput);
        }
        let mut farm = Self::_read_farm(&env, farm_id)?;
        farm.rate = rate;
        farm.min_deposit = min_deposit;
        farm.max_deposit = max_deposit;
        farm.active = active;
        Self::_write_farm(&env, &farm);
        Ok(())
    }

    /// Top up the farm's reward budget from the admin's reward-token
    /// balance. The transfer and the counter update land atomically.
    pub fn add_farm_rewards(
        env: Env,
        admin: Address,
        farm_id: u32,
        amount: i128,
    ) -> Result<(), Error> {
        Self::_require_admin(&env, &admin)?;
        Self::_require_not_paused(&env)?;
        if amount <= 0 {
            return Err(Error::InvalidInput);
        }
        let mut farm = Self::_read_farm(&env, farm_id)?;

        let reward_token: Address = env.storage().instance().get(&DataKey::RewardToken).unwrap();
        token::Client::new(&env, &reward_token).transfer(
            &admin,
            &env.current_contract_address(),
            &amount,
        );

        farm.reward_budget = farm
            .reward_budget
            .checked_add(amount)
            .ok_or(Error::Overflow)?;
        Self::_write_farm(&env, &farm);

        env.events().publish(
            (symbol_short!("farm"), symbol_short!("funded")),
            (farm_id, amount),
        );
        Ok(())
    }

    // ============================================================
    // Position Ledger
    // ============================================================

    pub fn deposit_lp(env: Env, farmer: Address, farm_id: u32, amount: i128) -> Result<(), Error> {
        env.storage()
            .instance()
            .extend_ttl(INSTANCE_LIFETIME_THRESHOLD, INSTANCE_BUMP_AMOUNT);
        farmer.require_auth();
        Self::_require_not_paused(&env)?;

        let mut farm = Self::_read_farm(&env, farm_id)?;
        if !farm.active {
            return Err(Error::InvalidInput);
        }
        let now = env.ledger().timestamp();
        if now < farm.start_time || now >= farm.end_time {
            return Err(Error::InvalidInput);
        }
        if amount < farm.min_deposit || amount > farm.max_deposit {
            return Err(Error::InvalidInput);
        }

        let position_key = DataKey::Position(farmer.clone(), farm_id);
        if env.storage().persistent().has(&position_key) {
            return Err(Error::AlreadyExists);
        }

        let lp_token: Address = env.storage().instance().get(&DataKey::LpToken).unwrap();
        token::Client::new(&env, &lp_token).transfer(
            &farmer,
            &env.current_contract_address(),
            &amount,
        );

        let position = FarmPosition {
            farmer: farmer.clone(),
            farm_id,
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

        farm.total_deposited = farm
            .total_deposited
            .checked_add(amount)
            .ok_or(Error::Overflow)?;
        Self::_write_farm(&env, &farm);

        Self::_signal_activity(&env, &farmer);

        env.events().publish(
            (symbol_short!("farm"), symbol_short!("deposit")),
            (farmer, farm_id, amount),
        );
        Ok(())
    }

    /// Pay out pending farm rewards. Accrual stops at the farm's end time
    /// no matter how late the claim lands.
    pub fn claim_farm_rewards(env: Env, farmer: Address, farm_id: u32) -> Result<i128, Error> {
        env.storage()
            .instance()
            .extend_ttl(INSTANCE_LIFETIME_THRESHOLD, INSTANCE_BUMP_AMOUNT);
        farmer.require_auth();
        Self::_require_not_paused(&env)?;

        let mut farm = Self::_read_farm(&env, farm_id)?;
        let position_key = DataKey::Position(farmer.clone(), farm_id);
        let mut position: FarmPosition = env
            .storage()
            .persistent()
            .get(&position_key)
            .ok_or(Error::NotFound)?;

        let now = env.ledger().timestamp();
        let base = Self::_pending_base(&farm, &position, now)?;
        if base == 0 {
            return Ok(0);
        }

        let multiplier = Self::_reward_multiplier(&env, &farmer);
        let bonus = Self::_bonus(base, multiplier, farm.bonus_strategy)?;
        let payout = base.checked_add(bonus).ok_or(Error::Overflow)?;
        if payout > farm.reward_budget {
            return Err(Error::InsufficientBudget);
        }

        farm.reward_budget -= payout;
        position.last_claim_time = now;
        Self::_write_farm(&env, &farm);
        env.storage().persistent().set(&position_key, &position);
        env.storage().persistent().extend_ttl(
            &position_key,
            PERSISTENT_LIFETIME_THRESHOLD,
            PERSISTENT_BUMP_AMOUNT,
        );

        let reward_token: Address = env.storage().instance().get(&DataKey::RewardToken).unwrap();
        token::Client::new(&env, &reward_token).transfer(
            &env.current_contract_address(),
            &farmer,
            &payout,
        );

        env.events().publish(
            (symbol_short!("farm"), symbol_short!("claim")),
            (farmer, farm_id, payout),
        );
        Ok(payout)
    }

    pub fn withdraw_lp(env: Env, farmer: Address, farm_id: u32) -> Result<i128, Error> {
        env.storage()
            .instance()
            .extend_ttl(INSTANCE_LIFETIME_THRESHOLD, INSTANCE_BUMP_AMOUNT);
        farmer.require_auth();
        Self::_require_not_paused(&env)?;

        let farm = Self::_read_farm(&env, farm_id)?;
        let position_key = DataKey::Position(farmer.clone(), farm_id);
        let position: FarmPosition = env
            .storage()
            .persistent()
            .get(&position_key)
            .ok_or(Error::NotFound)?;

        let now = env.ledger().timestamp();
        if farm.lock_period > 0 && now < position.deposit_time + farm.lock_period {
            return Err(Error::StillLocked);
        }

        Self::claim_farm_rewards(env.clone(), farmer.clone(), farm_id)?;

        let mut farm = Self::_read_farm(&env, farm_id)?;
        let principal = position.amount;
        env.storage().persistent().remove(&position_key);
        farm.total_deposited -= principal;
        Self::_write_farm(&env, &farm);

        let lp_token: Address = env.storage().instance().get(&DataKey::LpToken).unwrap();
        token::Client::new(&env, &lp_token).transfer(
            &env.current_contract_address(),
            &farmer,
            &principal,
        );

        env.events().publish(
            (symbol_short!("farm"), symbol_short!("withdraw")),
            (farmer, farm_id, principal),
        );
        Ok(principal)
    }

    /// Return a stuck position's LP principal, forfeiting unclaimed
    /// rewards. Bypasses the lock and the pause flag; admin only. Lossy.
    pub fn emergency_withdraw(
        env: Env,
        admin: Address,
        farmer: Address,
        farm_id: u32,
    ) -> Result<i128, Error> {
        Self::_require_admin(&env, &admin)?;

        let position_key = DataKey::Position(farmer.clone(), farm_id);
        let position: FarmPosition = env
            .storage()
            .persistent()
            .get(&position_key)
            .ok_or(Error::NotFound)?;

        let mut farm = Self::_read_farm(&env, farm_id)?;
        let principal = position.amount;
        env.storage().persistent().remove(&position_key);
        farm.total_deposited -= principal;
        Self::_write_farm(&env, &farm);

        let lp_token: Address = env.storage().instance().get(&DataKey::LpToken).unwrap();
        token::Client::new(&env, &lp_token).transfer(
            &env.current_contract_address(),
            &farmer,
            &principal,
        );

        env.events().publish(
            (symbol_short!("farm"), symbol_short!("emergency")),
            (farmer, farm_id, principal),
        );
        Ok(principal)
    }

    // ============================================================
    // Queries
    // ============================================================

    pub fn get_farm(env: Env, farm_id: u32) -> Option<Farm> {
        env.storage()
            .instance()
            .extend_ttl(INSTANCE_LIFETIME_THRESHOLD, INSTANCE_BUMP_AMOUNT);
        env.storage().persistent().get(&DataKey::Farm(farm_id))
    }

    pub fn get_position(env: Env, farmer: Address, farm_id: u32) -> Option<FarmPosition> {
        env.storage()
            .instance()
            .extend_ttl(INSTANCE_LIFETIME_THRESHOLD, INSTANCE_BUMP_AMOUNT);
        env.storage()
            .persistent()
            .get(&DataKey::Position(farmer, farm_id))
    }

    pub fn get_pending_reward(env: Env, farmer: Address, farm_id: u32) -> Result<i128, Error> {
        let farm = Self::_read_farm(&env, farm_id)?;
        let position: FarmPosition = env
            .storage()
            .persistent()
            .get(&DataKey::Position(farmer, farm_id))
            .ok_or(Error::NotFound)?;
        Self::_pending_base(&farm, &position, env.ledger().timestamp())
    }

    pub fn get_farm_count(env: Env) -> u32 {
        env.storage()
            .instance()
            .get(&DataKey::FarmCounter)
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

    /// Farm accrual: the rate is already per second per unit, so the only
    /// denominator is the basis-point scale. Accrual is clipped to the
    /// emission window.
    fn _pending_base(farm: &Farm, position: &FarmPosition, now: u64) -> Result<i128, Error> {
        let effective_now = now.min(farm.end_time);
        let elapsed = effective_now.saturating_sub(position.last_claim_time);
        if elapsed == 0 {
            return Ok(0);
        }
        math::accrual(
            position.amount,
            farm.rate as i128,
            elapsed as i128,
            BPS_DENOM,
        )
        .ok_or(Error::Overflow)
    }

    fn _bonus(base: i128, multiplier: u32, strategy: BonusStrategy) -> Result<i128, Error> {
        let multiplier = (multiplier as i128).max(BPS_DENOM);
        let bonus = match strategy {
            BonusStrategy::AboveBaseline => math::mul_div(base, multiplier - BPS_DENOM, BPS_DENOM),
            BonusStrategy::Absolute => math::mul_div(base, multiplier, BPS_DENOM),
        };
        bonus.ok_or(Error::Overflow)
    }

    fn _reward_multiplier(env: &Env, farmer: &Address) -> u32 {
        match env
            .storage()
            .instance()
            .get::<DataKey, Address>(&DataKey::ReputationContract)
        {
            Some(reputation) => env.invoke_contract(
                &reputation,
                &Symbol::new(env, "get_reward_multiplier"),
                Vec::<Val>::from_array(env, [farmer.into_val(env)]),
            ),
            None => BPS_DENOM as u32,
        }
    }

    fn _signal_activity(env: &Env, farmer: &Address) {
        if let Some(reputation) = env
            .storage()
            .instance()
            .get::<DataKey, Address>(&DataKey::ReputationContract)
        {
            env.invoke_contract::<()>(
                &reputation,
                &Symbol::new(env, "record_activity"),
                Vec::<Val>::from_array(env, [farmer.into_val(env)]),
            );
        }
    }

    fn _read_farm(env: &Env, farm_id: u32) -> Result<Farm, Error> {
        env.storage()
            .persistent()
            .get(&DataKey::Farm(farm_id))
            .ok_or(Error::NotFound)
    }

    fn _write_farm(env: &Env, farm: &Farm) {
        let key = DataKey::Farm(farm.id);
        env.storage().persistent().set(&key, farm);
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

mod test;
