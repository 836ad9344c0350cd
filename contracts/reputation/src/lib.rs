//! OrbitYield - Reputation Ledger (Soroban)
//! Decaying multi-factor reputation scores with peer attestations and
//! badge issuance on Stellar. The deposit contracts read the reward
//! multiplier from here; they never write reputation state directly.

#![no_std]
use soroban_sdk::{
    contract, contractimpl, contracttype, symbol_short, xdr::ToXdr, Address, Bytes, BytesN, Env,
    IntoVal, String, Symbol, Val, Vec,
};

use orbit_common::math::{self, BPS_DENOM, SECONDS_PER_DAY};

// ============================================================
// Data Types
// ============================================================

/// Per-account component scores and their weighted total. Mutated only by
/// the recompute pipeline; never deleted once created.
#[contracttype]
#[derive(Clone)]
pub struct ReputationRecord {
    pub account: Address,
    pub credential_score: u32,
    pub attestation_score: u32,
    pub staking_score: u32,
    pub participation_score: u32,
    pub time_score: u32,
    pub total_score: u32,
    pub last_update: u64,
    pub first_activity: u64,
}

/// Aggregation weights in basis points. The five fields must sum to
/// exactly 10_000.
#[contracttype]
#[derive(Clone)]
pub struct ComponentWeights {
    pub credential: u32,
    pub attestation: u32,
    pub staking: u32,
    pub participation: u32,
    pub time: u32,
}

#[contracttype]
#[derive(Clone)]
pub struct ScoringConfig {
    /// Upper bound for every component and for the total.
    pub max_score: u32,
    /// Daily decay in basis points.
    pub decay_bps: u32,
    /// Bonus span of the reward multiplier: a maxed-out score reports
    /// `10_000 + max_bonus_bps` to the deposit contracts.
    pub max_bonus_bps: u32,
    /// Staked units per staking-score point.
    pub staked_per_point: i128,
}

/// Peer endorsement. Revocation is one-way and the record is never
/// physically deleted, so the audit trail survives.
#[contracttype]
#[derive(Clone)]
pub struct Attestation {
    pub id: BytesN<32>,
    pub attester: Address,
    pub subject: Address,
    pub weight: u32, // 1..=100
    pub timestamp: u64,
    pub metadata: String,
    pub revoked: bool,
}

#[contracttype]
#[derive(Clone)]
pub struct Badge {
    pub id: u32,
    pub name: String,
    pub description: String,
    /// Minimum total score required to earn this badge.
    pub requirement: u32,
    pub active: bool,
}

#[contracttype]
#[derive(Clone)]
pub struct UserBadge {
    pub badge_id: u32,
    pub earned_at: u64,
}

#[contracttype]
#[derive(Clone)]
pub enum DataKey {
    Admin,
    PendingAdmin,
    Paused,
    Config,
    Weights,
    CredentialOracle,
    StakingContract,
    BadgeCounter,
    Reputation(Address),
    Attestation(BytesN<32>),
    SubjectAttestations(Address),
    GivenCount(Address),
    Badge(u32),
    UserBadge(Address, u32),
    AccountBadges(Address),
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
    Paused = 7,
    InvariantViolation = 8,
}

const INSTANCE_LIFETIME_THRESHOLD: u32 = 17_280;
const INSTANCE_BUMP_AMOUNT: u32 = 86_400;
const PERSISTENT_LIFETIME_THRESHOLD: u32 = 120_960;
const PERSISTENT_BUMP_AMOUNT: u32 = 1_051_200;

/// Smoothing constants for attester-weighted attestations: a weight is
/// scaled by `(attester_total + 10) / 110` so zero-reputation attesters
/// still contribute a sliver of signal.
const ATTESTER_SMOOTHING: u64 = 10;
const ATTESTER_SCALE: u64 = 110;

#[contract]
pub struct ReputationContract;

#[contractimpl]
impl ReputationContract {
    pub fn initialize(env: Env, admin: Address) -> Result<(), Error> {
        env.storage()
            .instance()
            .extend_ttl(INSTANCE_LIFETIME_THRESHOLD, INSTANCE_BUMP_AMOUNT);
        if env.storage().instance().has(&DataKey::Admin) {
            return Err(Error::AlreadyInitialized);
        }
        admin.require_auth();
        env.storage().instance().set(&DataKey::Admin, &admin);
        env.storage().instance().set(&DataKey::Paused, &false);
        env.storage().instance().set(&DataKey::BadgeCounter, &0u32);
        env.storage().instance().set(
            &DataKey::Config,
            &ScoringConfig {
                max_score: 100,
                decay_bps: 100, // 1% per day
                max_bonus_bps: 2_000,
                staked_per_point: 10_000_000_000,
            },
        );
        env.storage().instance().set(
            &DataKey::Weights,
            &ComponentWeights {
                credential: 3_000,
                attestation: 2_500,
                staking: 2_000,
                participation: 1_500,
                time: 1_000,
            },
        );
        Ok(())
    }

    /// Wire or unwire the credential oracle. While unwired, the decayed
    /// credential carry-over stands at recompute time.
    pub fn set_credential_oracle(
        env: Env,
        admin: Address,
        oracle: Option<Address>,
    ) -> Result<(), Error> {
        Self::_require_admin(&env, &admin)?;
        match oracle {
            Some(addr) => env
                .storage()
                .instance()
                .set(&DataKey::CredentialOracle, &addr),
            None => env.storage().instance().remove(&DataKey::CredentialOracle),
        }
        Ok(())
    }

    /// Wire or unwire the staking contract whose per-account totals feed
    /// the staking component.
    pub fn set_staking_contract(
        env: Env,
        admin: Address,
        contract: Option<Address>,
    ) -> Result<(), Error> {
        Self::_require_admin(&env, &admin)?;
        match contract {
            Some(addr) => env
                .storage()
                .instance()
                .set(&DataKey::StakingContract, &addr),
            None => env.storage().instance().remove(&DataKey::StakingContract),
        }
        Ok(())
    }

    pub fn set_config(env: Env, admin: Address, config: ScoringConfig) -> Result<(), Error> {
        Self::_require_admin(&env, &admin)?;
        if config.max_score == 0
            || config.decay_bps > BPS_DENOM as u32
            || config.staked_per_point <= 0
        {
            return Err(Error::InvalidInput);
        }
        env.storage().instance().set(&DataKey::Config, &config);
        Ok(())
    }

    /// Replace the aggregation weights. The five values must sum to
    /// exactly 10_000 or the update is rejected whole.
    pub fn update_weights(env: Env, admin: Address, weights: ComponentWeights) -> Result<(), Error> {
        Self::_require_admin(&env, &admin)?;
        let sum = weights.credential as u64
            + weights.attestation as u64
            + weights.staking as u64
            + weights.participation as u64
            + weights.time as u64;
        if sum != BPS_DENOM as u64 {
            return Err(Error::InvariantViolation);
        }
        env.storage().instance().set(&DataKey::Weights, &weights);
        Ok(())
    }

    pub fn set_paused(env: Env, admin: Address, paused: bool) -> Result<(), Error> {
        Self::_require_admin(&env, &admin)?;
        env.storage().instance().set(&DataKey::Paused, &paused);
        env.events()
            .publish((symbol_short!("rep"), symbol_short!("paused")), paused);
        Ok(())
    }

    // ============================================================
    // Reputation Ledger
    // ============================================================

    pub fn opt_in(env: Env, account: Address) -> Result<(), Error> {
        env.storage()
            .instance()
            .extend_ttl(INSTANCE_LIFETIME_THRESHOLD, INSTANCE_BUMP_AMOUNT);
        account.require_auth();
        Self::_require_not_paused(&env)?;

        let key = DataKey::Reputation(account.clone());
        if env.storage().persistent().has(&key) {
            return Err(Error::AlreadyExists);
        }
        Self::_create_record(&env, &account);
        Ok(())
    }

    /// Idempotent activity signal from the deposit contracts: creates the
    /// record on first contact, otherwise does nothing. Deliberately
    /// infallible so a paused reputation ledger never blocks a deposit.
    pub fn record_activity(env: Env, account: Address) {
        env.storage()
            .instance()
            .extend_ttl(INSTANCE_LIFETIME_THRESHOLD, INSTANCE_BUMP_AMOUNT);
        let key = DataKey::Reputation(account.clone());
        if env.storage().persistent().has(&key) {
            return;
        }
        Self::_create_record(&env, &account);
    }

    /// Re-derive the account's score: decay, fresh component signals,
    /// weighted aggregation, badge sweep. Safe to call repeatedly; a
    /// second call at the same timestamp is a no-op beyond the first.
    pub fn recompute(env: Env, account: Address) -> Result<u32, Error> {
        env.storage()
            .instance()
            .extend_ttl(INSTANCE_LIFETIME_THRESHOLD, INSTANCE_BUMP_AMOUNT);
        Self::_require_not_paused(&env)?;
        Self::_recompute(&env, &account)
    }

    // ============================================================
    // Attestation Registry
    // ============================================================

    pub fn attest(
        env: Env,
        attester: Address,
        subject: Address,
        weight: u32,
        metadata: String,
    ) -> Result<BytesN<32>, Error> {
        env.storage()
            .instance()
            .extend_ttl(INSTANCE_LIFETIME_THRESHOLD, INSTANCE_BUMP_AMOUNT);
        attester.require_auth();
        Self::_require_not_paused(&env)?;

        if attester == subject {
            return Err(Error::InvalidInput);
        }
        if weight < 1 || weight > 100 {
            return Err(Error::InvalidInput);
        }

        let now = env.ledger().timestamp();
        let id = Self::_attestation_id(&env, &attester, &subject, now);
        let att_key = DataKey::Attestation(id.clone());
        if env.storage().persistent().has(&att_key) {
            return Err(Error::AlreadyExists);
        }

        let attestation = Attestation {
            id: id.clone(),
            attester: attester.clone(),
            subject: subject.clone(),
            weight,
            timestamp: now,
            metadata,
            revoked: false,
        };
        env.storage().persistent().set(&att_key, &attestation);
        env.storage().persistent().extend_ttl(
            &att_key,
            PERSISTENT_LIFETIME_THRESHOLD,
            PERSISTENT_BUMP_AMOUNT,
        );

        let list_key = DataKey::SubjectAttestations(subject.clone());
        let mut ids: Vec<BytesN<32>> = env
            .storage()
            .persistent()
            .get(&list_key)
            .unwrap_or(Vec::new(&env));
        ids.push_back(id.clone());
        env.storage().persistent().set(&list_key, &ids);
        env.storage().persistent().extend_ttl(
            &list_key,
            PERSISTENT_LIFETIME_THRESHOLD,
            PERSISTENT_BUMP_AMOUNT,
        );

        let given_key = DataKey::GivenCount(attester.clone());
        let given: u64 = env.storage().persistent().get(&given_key).unwrap_or(0);
        env.storage().persistent().set(&given_key, &(given + 1));
        env.storage().persistent().extend_ttl(
            &given_key,
            PERSISTENT_LIFETIME_THRESHOLD,
            PERSISTENT_BUMP_AMOUNT,
        );

        // An attestation counts as the subject's first contact.
        if !env
            .storage()
            .persistent()
            .has(&DataKey::Reputation(subject.clone()))
        {
            Self::_create_record(&env, &subject);
        }
        Self::_recompute(&env, &subject)?;

        env.events().publish(
            (symbol_short!("attest"), symbol_short!("add")),
            (attester, subject, id.clone()),
        );
        Ok(id)
    }

    /// Revoke an attestation. Allowed for the attester, the subject, or
    /// the admin. One-way: a revoked attestation never comes back.
    pub fn revoke(env: Env, caller: Address, id: BytesN<32>) -> Result<(), Error> {
        env.storage()
            .instance()
            .extend_ttl(INSTANCE_LIFETIME_THRESHOLD, INSTANCE_BUMP_AMOUNT);
        caller.require_auth();
        Self::_require_not_paused(&env)?;

        let att_key = DataKey::Attestation(id.clone());
        let mut attestation: Attestation = env
            .storage()
            .persistent()
            .get(&att_key)
            .ok_or(Error::NotFound)?;

        let admin: Address = env
            .storage()
            .instance()
            .get(&DataKey::Admin)
            .ok_or(Error::NotInitialized)?;
        if caller != attestation.attester && caller != attestation.subject && caller != admin {
            return Err(Error::Unauthorized);
        }
        if attestation.revoked {
            return Err(Error::InvalidInput);
        }

        attestation.revoked = true;
        env.storage().persistent().set(&att_key, &attestation);

        Self::_recompute(&env, &attestation.subject)?;

        env.events().publish(
            (symbol_short!("attest"), symbol_short!("revoke")),
            (caller, attestation.subject, id),
        );
        Ok(())
    }

    // ============================================================
    // Badges
    // ============================================================

    pub fn create_badge(
        env: Env,
        admin: Address,
        name: String,
        description: String,
        requirement: u32,
    ) -> Result<u32, Error> {
        Self::_require_admin(&env, &admin)?;
        Self::_require_not_paused(&env)?;

        let counter: u32 = env
            .storage()
            .instance()
            .get(&DataKey::BadgeCounter)
            .unwrap_or(0);
        let badge_id = counter + 1;
        env.storage().instance().set(&DataKey::BadgeCounter, &badge_id);

        let badge = Badge {
            id: badge_id,
            name,
            description,
            requirement,
            active: true,
        };
        let key = DataKey::Badge(badge_id);
        env.storage().persistent().set(&key, &badge);
        env.storage().persistent().extend_ttl(
            &key,
            PERSISTENT_LIFETIME_THRESHOLD,
            PERSISTENT_BUMP_AMOUNT,
        );

        env.events().publish(
            (symbol_short!("badge"), symbol_short!("create")),
            (badge_id, requirement),
        );
        Ok(badge_id)
    }

    pub fn update_badge(env: Env, admin: Address, badge_id: u32, active: bool) -> Result<(), Error> {
        Self::_require_admin(&env, &admin)?;
        let key = DataKey::Badge(badge_id);
        let mut badge: Badge = env
            .storage()
            .persistent()
            .get(&key)
            .ok_or(Error::NotFound)?;
        badge.active = active;
        env.storage().persistent().set(&key, &badge);
        Ok(())
    }

    /// Manual award, bypassing the score requirement. Idempotent: earned
    /// badges are set once and never cleared.
    pub fn award_badge(
        env: Env,
        admin: Address,
        account: Address,
        badge_id: u32,
    ) -> Result<(), Error> {
        Self::_require_admin(&env, &admin)?;
        Self::_require_not_paused(&env)?;
        let badge: Badge = env
            .storage()
            .persistent()
            .get(&DataKey::Badge(badge_id))
            .ok_or(Error::NotFound)?;
        if !badge.active {
            return Err(Error::InvalidInput);
        }
        if env
            .storage()
            .persistent()
            .has(&DataKey::UserBadge(account.clone(), badge_id))
        {
            return Ok(());
        }
        Self::_award(&env, &account, badge_id);
        Ok(())
    }

    // ============================================================
    // Queries
    // ============================================================

    /// Reward multiplier in basis points, 10_000 = neutral. Read by the
    /// deposit contracts on every claim; unknown accounts are neutral.
    pub fn get_reward_multiplier(env: Env, account: Address) -> u32 {
        let record: Option<ReputationRecord> = env
            .storage()
            .persistent()
            .get(&DataKey::Reputation(account));
        let config: Option<ScoringConfig> = env.storage().instance().get(&DataKey::Config);
        match (record, config) {
            (Some(rec), Some(cfg)) if cfg.max_score > 0 => {
                let bonus =
                    rec.total_score as u64 * cfg.max_bonus_bps as u64 / cfg.max_score as u64;
                BPS_DENOM as u32 + bonus as u32
            }
            _ => BPS_DENOM as u32,
        }
    }

    pub fn get_reputation(env: Env, account: Address) -> Option<ReputationRecord> {
        env.storage()
            .instance()
            .extend_ttl(INSTANCE_LIFETIME_THRESHOLD, INSTANCE_BUMP_AMOUNT);
        env.storage()
            .persistent()
            .get(&DataKey::Reputation(account))
    }

    pub fn get_attestation(env: Env, id: BytesN<32>) -> Option<Attestation> {
        env.storage()
            .instance()
            .extend_ttl(INSTANCE_LIFETIME_THRESHOLD, INSTANCE_BUMP_AMOUNT);
        env.storage().persistent().get(&DataKey::Attestation(id))
    }

    pub fn get_subject_attestations(env: Env, subject: Address) -> Vec<BytesN<32>> {
        env.storage()
            .persistent()
            .get(&DataKey::SubjectAttestations(subject))
            .unwrap_or(Vec::new(&env))
    }

    pub fn get_given_count(env: Env, attester: Address) -> u64 {
        env.storage()
            .persistent()
            .get(&DataKey::GivenCount(attester))
            .unwrap_or(0)
    }

    pub fn get_badge(env: Env, badge_id: u32) -> Option<Badge> {
        env.storage().persistent().get(&DataKey::Badge(badge_id))
    }

    pub fn get_user_badges(env: Env, account: Address) -> Vec<u32> {
        env.storage()
            .persistent()
            .get(&DataKey::AccountBadges(account))
            .unwrap_or(Vec::new(&env))
    }

    pub fn get_user_badge(env: Env, account: Address, badge_id: u32) -> Option<UserBadge> {
        env.storage()
            .persistent()
            .get(&DataKey::UserBadge(account, badge_id))
    }

    pub fn get_weights(env: Env) -> Result<ComponentWeights, Error> {
        env.storage()
            .instance()
            .get(&DataKey::Weights)
            .ok_or(Error::NotInitialized)
    }

    pub fn get_config(env: Env) -> Result<ScoringConfig, Error> {
        env.storage()
            .instance()
            .get(&DataKey::Config)
            .ok_or(Error::NotInitialized)
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

    fn _create_record(env: &Env, account: &Address) {
        let now = env.ledger().timestamp();
        let record = ReputationRecord {
            account: account.clone(),
            credential_score: 0,
            attestation_score: 0,
            staking_score: 0,
            participation_score: 0,
            time_score: 0,
            total_score: 0,
            last_update: now,
            first_activity: now,
        };
        let key = DataKey::Reputation(account.clone());
        env.storage().persistent().set(&key, &record);
        env.storage().persistent().extend_ttl(
            &key,
            PERSISTENT_LIFETIME_THRESHOLD,
            PERSISTENT_BUMP_AMOUNT,
        );
        env.events().publish(
            (symbol_short!("rep"), symbol_short!("optin")),
            account.clone(),
        );
    }

    fn _recompute(env: &Env, account: &Address) -> Result<u32, Error> {
        let rep_key = DataKey::Reputation(account.clone());
        let mut record: ReputationRecord = env
            .storage()
            .persistent()
            .get(&rep_key)
            .ok_or(Error::NotFound)?;
        let config: ScoringConfig = env
            .storage()
            .instance()
            .get(&DataKey::Config)
            .ok_or(Error::NotInitialized)?;
        let weights: ComponentWeights = env
            .storage()
            .instance()
            .get(&DataKey::Weights)
            .ok_or(Error::NotInitialized)?;
        let now = env.ledger().timestamp();

        // Decay over whole elapsed days; skipped outright when none have
        // passed so back-to-back recomputes are exact no-ops.
        let days = now.saturating_sub(record.last_update) / SECONDS_PER_DAY;
        if days > 0 {
            record.credential_score = math::decay_pow(record.credential_score, config.decay_bps, days);
            record.attestation_score =
                math::decay_pow(record.attestation_score, config.decay_bps, days);
            record.staking_score = math::decay_pow(record.staking_score, config.decay_bps, days);
            record.participation_score =
                math::decay_pow(record.participation_score, config.decay_bps, days);
            record.time_score = math::decay_pow(record.time_score, config.decay_bps, days);
        }

        // Fresh component signals, each clamped to [0, max_score]. Where a
        // collaborator is unwired the decayed carry-over stands.
        if let Some(oracle) = env
            .storage()
            .instance()
            .get::<DataKey, Address>(&DataKey::CredentialOracle)
        {
            let raw: u32 = env.invoke_contract(
                &oracle,
                &Symbol::new(env, "credential_score"),
                Vec::<Val>::from_array(env, [account.into_val(env)]),
            );
            record.credential_score = raw.min(config.max_score);
        }

        record.attestation_score = Self::_attestation_score(env, account, &config);

        if let Some(staking) = env
            .storage()
            .instance()
            .get::<DataKey, Address>(&DataKey::StakingContract)
        {
            let staked: i128 = env.invoke_contract(
                &staking,
                &Symbol::new(env, "get_account_staked"),
                Vec::<Val>::from_array(env, [account.into_val(env)]),
            );
            let points = (staked / config.staked_per_point)
                .clamp(0, config.max_score as i128);
            record.staking_score = points as u32;
        }

        let given: u64 = env
            .storage()
            .persistent()
            .get(&DataKey::GivenCount(account.clone()))
            .unwrap_or(0);
        record.participation_score = given
            .saturating_mul(2)
            .min(config.max_score as u64) as u32;

        let tenure_days = now.saturating_sub(record.first_activity) / SECONDS_PER_DAY;
        record.time_score = (tenure_days / 30).min(config.max_score as u64) as u32;

        // Weighted aggregation: weights sum to 10_000, so the total stays
        // within [0, max_score] whenever the components do.
        let total = (record.credential_score as u64 * weights.credential as u64
            + record.attestation_score as u64 * weights.attestation as u64
            + record.staking_score as u64 * weights.staking as u64
            + record.participation_score as u64 * weights.participation as u64
            + record.time_score as u64 * weights.time as u64)
            / BPS_DENOM as u64;
        record.total_score = total as u32;
        record.last_update = now;

        env.storage().persistent().set(&rep_key, &record);
        env.storage().persistent().extend_ttl(
            &rep_key,
            PERSISTENT_LIFETIME_THRESHOLD,
            PERSISTENT_BUMP_AMOUNT,
        );

        Self::_sweep_badges(env, account, record.total_score);

        env.events().publish(
            (symbol_short!("rep"), symbol_short!("score")),
            (account.clone(), record.total_score),
        );
        Ok(record.total_score)
    }

    /// Average of non-revoked attestation weights, each scaled by the
    /// attester's own stored reputation. Zero valid attestations score
    /// zero, not an error.
    fn _attestation_score(env: &Env, subject: &Address, config: &ScoringConfig) -> u32 {
        let ids: Vec<BytesN<32>> = env
            .storage()
            .persistent()
            .get(&DataKey::SubjectAttestations(subject.clone()))
            .unwrap_or(Vec::new(env));

        let mut sum: u64 = 0;
        let mut count: u64 = 0;
        for id in ids.iter() {
            let attestation: Attestation =
                match env.storage().persistent().get(&DataKey::Attestation(id)) {
                    Some(a) => a,
                    None => continue,
                };
            if attestation.revoked {
                continue;
            }
            let attester_total: u64 = env
                .storage()
                .persistent()
                .get::<DataKey, ReputationRecord>(&DataKey::Reputation(attestation.attester))
                .map(|r| r.total_score as u64)
                .unwrap_or(0);
            sum += attestation.weight as u64 * (attester_total + ATTESTER_SMOOTHING)
                / ATTESTER_SCALE;
            count += 1;
        }
        if count == 0 {
            return 0;
        }
        ((sum / count) as u32).min(config.max_score)
    }

    /// Award every active badge whose requirement the new total clears.
    /// Earned badges are never re-awarded, so re-sweeping is free.
    fn _sweep_badges(env: &Env, account: &Address, total: u32) {
        let badge_count: u32 = env
            .storage()
            .instance()
            .get(&DataKey::BadgeCounter)
            .unwrap_or(0);
        for badge_id in 1..=badge_count {
            let badge: Badge = match env.storage().persistent().get(&DataKey::Badge(badge_id)) {
                Some(b) => b,
                None => continue,
            };
            if !badge.active || total < badge.requirement {
                continue;
            }
            if env
                .storage()
                .persistent()
                .has(&DataKey::UserBadge(account.clone(), badge_id))
            {
                continue;
            }
            Self::_award(env, account, badge_id);
        }
    }

    fn _award(env: &Env, account: &Address, badge_id: u32) {
        let earned = UserBadge {
            badge_id,
            earned_at: env.ledger().timestamp(),
        };
        let key = DataKey::UserBadge(account.clone(), badge_id);
        env.storage().persistent().set(&key, &earned);
        env.storage().persistent().extend_ttl(
            &key,
            PERSISTENT_LIFETIME_THRESHOLD,
            PERSISTENT_BUMP_AMOUNT,
        );

        let list_key = DataKey::AccountBadges(account.clone());
        let mut earned_ids: Vec<u32> = env
            .storage()
            .persistent()
            .get(&list_key)
            .unwrap_or(Vec::new(env));
        earned_ids.push_back(badge_id);
        env.storage().persistent().set(&list_key, &earned_ids);
        env.storage().persistent().extend_ttl(
            &list_key,
            PERSISTENT_LIFETIME_THRESHOLD,
            PERSISTENT_BUMP_AMOUNT,
        );

        env.events().publish(
            (symbol_short!("badge"), symbol_short!("award")),
            (account.clone(), badge_id),
        );
    }

    /// Deterministic attestation id: sha256 over the XDR of both parties
    /// plus the ledger timestamp. A second attestation by the same pair in
    /// the same second collides and is rejected, never overwritten.
    fn _attestation_id(
        env: &Env,
        attester: &Address,
        subject: &Address,
        timestamp: u64,
    ) -> BytesN<32> {
        let mut data = Bytes::new(env);
        data.append(&attester.clone().to_xdr(env));
        data.append(&subject.clone().to_xdr(env));
        for b in timestamp.to_be_bytes().iter() {
            data.push_back(*b);
        }
        env.crypto().sha256(&data).into()
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
