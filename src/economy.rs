//! Currency, upgrade ladders and prestige
//!
//! All mutation goes through methods; purchases and prestige report
//! affordability with a `bool` rather than an error.

use serde::{Deserialize, Serialize};

use crate::bignum::BigNumber;
use crate::consts::*;
use crate::sim::BallKind;

/// Purchasable global upgrades
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum UpgradeKind {
    Damage,
    Speed,
    #[serde(rename = "coinMult")]
    CoinMultiplier,
}

impl UpgradeKind {
    pub const ALL: [UpgradeKind; 3] = [
        UpgradeKind::Damage,
        UpgradeKind::Speed,
        UpgradeKind::CoinMultiplier,
    ];

    pub fn index(self) -> usize {
        self as usize
    }

    /// Key used in save files
    pub fn as_str(self) -> &'static str {
        match self {
            UpgradeKind::Damage => "damage",
            UpgradeKind::Speed => "speed",
            UpgradeKind::CoinMultiplier => "coinMult",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|k| k.as_str() == s)
    }

    pub fn ladder(self) -> CostLadder {
        match self {
            UpgradeKind::Damage => CostLadder::new(150.0, 1.15),
            UpgradeKind::Speed => CostLadder::new(100.0, 1.20),
            UpgradeKind::CoinMultiplier => CostLadder::new(200.0, 1.25),
        }
    }
}

/// Geometric cost progression: `ceil(base × multiplier^level)`
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CostLadder {
    pub base: f64,
    pub multiplier: f64,
}

impl CostLadder {
    pub const fn new(base: f64, multiplier: f64) -> Self {
        Self { base, multiplier }
    }

    pub fn cost_at(&self, level: u32) -> BigNumber {
        let level = level.min(i32::MAX as u32) as i32;
        BigNumber::from_f64(self.multiplier)
            .pow(level)
            .mul_f64(self.base)
            .ceil()
    }
}

/// Ladder for buying additional balls of a kind
pub fn ball_ladder(kind: BallKind) -> CostLadder {
    CostLadder::new(kind.stats().base_cost, BALL_COST_MULTIPLIER)
}

/// `costForNextLevel(type, level)`
pub fn cost_for_next_level(kind: UpgradeKind, level: u32) -> BigNumber {
    kind.ladder().cost_at(level)
}

/// Destroyed-brick count needed to prestige at `level`, clamped to the last entry
pub fn prestige_threshold(level: u32) -> BigNumber {
    let index = (level as usize).min(PRESTIGE_THRESHOLDS.len() - 1);
    BigNumber::from(PRESTIGE_THRESHOLDS[index])
}

/// Economy state: balance, upgrade levels, ball ladders and prestige counters
#[derive(Debug, Clone, PartialEq)]
pub struct Economy {
    pub(crate) balance: BigNumber,
    pub(crate) levels: [u32; 3],
    pub(crate) costs: [BigNumber; 3],
    pub(crate) ball_purchases: [u32; BallKind::COUNT],
    pub(crate) ball_costs: [BigNumber; BallKind::COUNT],
    pub(crate) prestige_level: u32,
    /// Bricks destroyed across all finished runs
    pub(crate) lifetime_destroyed: BigNumber,
    /// Bricks destroyed in the current run
    pub(crate) run_destroyed: BigNumber,
    pub(crate) current_tier: u32,
}

impl Default for Economy {
    fn default() -> Self {
        Self {
            balance: BigNumber::ZERO,
            levels: [0; 3],
            costs: UpgradeKind::ALL.map(|k| k.ladder().cost_at(0)),
            ball_purchases: [0; BallKind::COUNT],
            ball_costs: BallKind::ALL.map(|k| ball_ladder(k).cost_at(0)),
            prestige_level: 0,
            lifetime_destroyed: BigNumber::ZERO,
            run_destroyed: BigNumber::ZERO,
            current_tier: 1,
        }
    }
}

impl Economy {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn balance(&self) -> BigNumber {
        self.balance
    }

    pub fn level(&self, kind: UpgradeKind) -> u32 {
        self.levels[kind.index()]
    }

    /// Price of the next level of `kind`
    pub fn cost(&self, kind: UpgradeKind) -> BigNumber {
        self.costs[kind.index()]
    }

    pub fn ball_cost(&self, kind: BallKind) -> BigNumber {
        self.ball_costs[kind.index()]
    }

    pub fn ball_purchases(&self, kind: BallKind) -> u32 {
        self.ball_purchases[kind.index()]
    }

    pub fn prestige_level(&self) -> u32 {
        self.prestige_level
    }

    pub fn lifetime_destroyed(&self) -> BigNumber {
        self.lifetime_destroyed
    }

    pub fn run_destroyed(&self) -> BigNumber {
        self.run_destroyed
    }

    pub fn current_tier(&self) -> u32 {
        self.current_tier
    }

    /// Buy one level of an upgrade
    pub fn purchase(&mut self, kind: UpgradeKind) -> bool {
        let i = kind.index();
        if !self.try_spend(self.costs[i]) {
            return false;
        }
        self.levels[i] = self.levels[i].saturating_add(1);
        self.costs[i] = kind.ladder().cost_at(self.levels[i]);
        log::debug!("Upgrade {} -> level {}", kind.as_str(), self.levels[i]);
        true
    }

    /// Pay for a ball of `kind`; the caller spawns it
    pub fn purchase_ball(&mut self, kind: BallKind) -> bool {
        let i = kind.index();
        if !self.try_spend(self.ball_costs[i]) {
            return false;
        }
        self.ball_purchases[i] = self.ball_purchases[i].saturating_add(1);
        self.ball_costs[i] = ball_ladder(kind).cost_at(self.ball_purchases[i]);
        true
    }

    fn try_spend(&mut self, cost: BigNumber) -> bool {
        if self.balance < cost {
            return false;
        }
        self.balance = self.balance.saturating_sub(cost);
        true
    }

    /// `1 + level × UPGRADE_BONUS`
    pub fn multiplier(&self, kind: UpgradeKind) -> f64 {
        1.0 + self.level(kind) as f64 * UPGRADE_BONUS
    }

    /// `1 + prestigeLevel × PRESTIGE_BONUS`
    pub fn prestige_bonus(&self) -> f64 {
        1.0 + self.prestige_level as f64 * PRESTIGE_BONUS
    }

    /// Pay a brick reward, scaled by the coin multiplier and prestige bonus.
    /// Returns the amount credited.
    pub fn earn(&mut self, reward: BigNumber) -> BigNumber {
        let paid = reward
            .mul_f64(self.multiplier(UpgradeKind::CoinMultiplier))
            .mul_f64(self.prestige_bonus());
        self.balance = self.balance + paid;
        paid
    }

    /// Credit an amount as-is (offline earnings)
    pub fn credit(&mut self, amount: BigNumber) {
        if amount.is_positive() {
            self.balance = self.balance + amount;
        }
    }

    /// Count a destroyed brick toward the run and advance the run tier
    pub fn record_destroyed(&mut self) {
        self.run_destroyed = self.run_destroyed + BigNumber::ONE;
        let tier = 1.0 + (self.run_destroyed.to_f64() / BRICKS_PER_TIER as f64).floor();
        let tier = tier.min(MAX_TIER as f64) as u32;
        if tier > self.current_tier {
            log::info!("Run tier {} -> {}", self.current_tier, tier);
            self.current_tier = tier;
        }
    }

    pub fn can_prestige(&self) -> bool {
        self.run_destroyed >= prestige_threshold(self.prestige_level)
    }

    /// Bank the run, bump the prestige level and reset run progress.
    /// The caller resets the world when this returns `true`.
    pub fn do_prestige(&mut self) -> bool {
        if !self.can_prestige() {
            return false;
        }
        let next = Self {
            prestige_level: self.prestige_level.saturating_add(1),
            lifetime_destroyed: self.lifetime_destroyed + self.run_destroyed,
            ..Self::default()
        };
        log::info!(
            "Prestige {} -> {} (run {}, lifetime {})",
            self.prestige_level,
            next.prestige_level,
            self.run_destroyed,
            next.lifetime_destroyed
        );
        *self = next;
        true
    }

    /// Everything back to a fresh game, prestige included
    pub fn hard_reset(&mut self) {
        *self = Self::default();
    }
}
