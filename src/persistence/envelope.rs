//! Versioned save envelope
//!
//! Every BigNumber is written as an exact decimal string. Ball positions are
//! not saved; balls respawn at the bottom of the play area on load.

use std::collections::BTreeMap;

use glam::Vec2;
use serde::Serialize;

use crate::bignum::BigNumber;
use crate::consts::{MAX_TIER, SAVE_VERSION};
use crate::economy::{Economy, UpgradeKind};
use crate::error::SaveError;
use crate::sim::{BallKind, Simulator};

/// Everything needed to rebuild a game, in the external JSON shape.
///
/// Reading goes through [`SaveBlob::from_json`], which merges partial and
/// older saves field by field instead of relying on a derived decoder.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SaveBlob {
    pub version: u32,
    pub coins: BigNumber,
    /// Bricks destroyed in the current run
    pub bricks_broken: BigNumber,
    /// Bricks destroyed in finished runs
    pub total_bricks_broken: BigNumber,
    pub prestige_level: u32,
    pub current_tier: u32,
    pub upgrades: BTreeMap<UpgradeKind, u32>,
    pub upgrade_costs: BTreeMap<UpgradeKind, BigNumber>,
    pub ball_costs: BTreeMap<BallKind, BigNumber>,
    pub ball_purchases: BTreeMap<BallKind, u32>,
    pub balls: Vec<BallKind>,
    pub destroyed_bricks: Vec<u64>,
    /// Top-left corner of the play viewport, world pixels
    pub camera: Vec2,
    /// Wall-clock save time, Unix milliseconds; 0 when unknown
    pub timestamp: u64,
}

impl SaveBlob {
    /// Capture the persistent part of a running game
    pub fn capture(sim: &Simulator, now_ms: u64) -> Self {
        let eco = sim.economy();
        let viewport = sim.viewport();
        Self {
            version: SAVE_VERSION,
            coins: eco.balance,
            bricks_broken: eco.run_destroyed,
            total_bricks_broken: eco.lifetime_destroyed,
            prestige_level: eco.prestige_level,
            current_tier: eco.current_tier,
            upgrades: UpgradeKind::ALL
                .into_iter()
                .map(|k| (k, eco.levels[k.index()]))
                .collect(),
            upgrade_costs: UpgradeKind::ALL
                .into_iter()
                .map(|k| (k, eco.costs[k.index()]))
                .collect(),
            ball_costs: BallKind::ALL
                .into_iter()
                .map(|k| (k, eco.ball_costs[k.index()]))
                .collect(),
            ball_purchases: BallKind::ALL
                .into_iter()
                .map(|k| (k, eco.ball_purchases[k.index()]))
                .collect(),
            balls: sim.balls().iter().map(|b| b.kind).collect(),
            destroyed_bricks: sim.grid().destroyed_ids().collect(),
            camera: Vec2::new(viewport.x, viewport.y),
            timestamp: now_ms,
        }
    }

    pub fn to_json(&self) -> Result<String, SaveError> {
        serde_json::to_string(self).map_err(|e| SaveError::malformed(e.to_string()))
    }

    /// Rebuild the economy this blob describes
    pub fn economy(&self) -> Economy {
        let mut eco = Economy::new();
        eco.balance = self.coins.max(BigNumber::ZERO);
        eco.run_destroyed = self.bricks_broken.max(BigNumber::ZERO);
        eco.lifetime_destroyed = self.total_bricks_broken.max(BigNumber::ZERO);
        eco.prestige_level = self.prestige_level;
        eco.current_tier = self.current_tier.clamp(1, MAX_TIER);
        for kind in UpgradeKind::ALL {
            let i = kind.index();
            if let Some(&level) = self.upgrades.get(&kind) {
                eco.levels[i] = level;
                eco.costs[i] = kind.ladder().cost_at(level);
            }
            if let Some(&cost) = self.upgrade_costs.get(&kind) {
                eco.costs[i] = cost;
            }
        }
        for kind in BallKind::ALL {
            let i = kind.index();
            if let Some(&count) = self.ball_purchases.get(&kind) {
                eco.ball_purchases[i] = count;
                eco.ball_costs[i] = crate::economy::ball_ladder(kind).cost_at(count);
            }
            if let Some(&cost) = self.ball_costs.get(&kind) {
                eco.ball_costs[i] = cost;
            }
        }
        eco
    }
}
