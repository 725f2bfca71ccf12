//! Sparse brick field
//!
//! A brick's state is a pure function of its coordinate until it is hit.
//! Only two exception sets occupy memory: partially damaged bricks and
//! destroyed brick ids. Everything else is recomputed on demand, which keeps
//! a million-cell grid cheap.

use std::collections::{BTreeSet, HashMap};

use glam::Vec2;
use serde::{Deserialize, Serialize};

use crate::bignum::BigNumber;
use crate::config::SimConfig;
use crate::consts::{BRICK_HEALTH_PER_TIER, BRICK_REWARD_EXPONENT, MAX_TIER};

/// Integer cell address. May lie outside the grid; lookups treat that as empty.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct GridCoord {
    pub x: i32,
    pub y: i32,
}

impl GridCoord {
    pub const fn new(x: i32, y: i32) -> Self {
        Self { x, y }
    }
}

/// Axis-aligned rectangle in world pixels
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Rect {
    pub x: f32,
    pub y: f32,
    pub width: f32,
    pub height: f32,
}

impl Rect {
    pub const fn new(x: f32, y: f32, width: f32, height: f32) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }

    #[inline]
    pub fn min(&self) -> Vec2 {
        Vec2::new(self.x, self.y)
    }

    #[inline]
    pub fn max(&self) -> Vec2 {
        Vec2::new(self.x + self.width, self.y + self.height)
    }

    #[inline]
    pub fn center(&self) -> Vec2 {
        Vec2::new(self.x + self.width * 0.5, self.y + self.height * 0.5)
    }

    /// Closed-interval overlap test
    pub fn intersects(&self, other: &Rect) -> bool {
        self.x <= other.x + other.width
            && other.x <= self.x + self.width
            && self.y <= other.y + other.height
            && other.y <= self.y + self.height
    }
}

/// Everything the presentation layer needs about one brick
#[derive(Debug, Clone, PartialEq)]
pub struct BrickView {
    pub coord: GridCoord,
    pub id: u64,
    pub rect: Rect,
    pub tier: u32,
    pub health: BigNumber,
    pub max_health: BigNumber,
    pub reward: BigNumber,
    pub destroyed: bool,
}

impl BrickView {
    /// Remaining health in [0, 1] for damage tinting
    pub fn health_ratio(&self) -> f32 {
        if self.max_health.is_zero() {
            return 0.0;
        }
        (self.health.to_f64() / self.max_health.to_f64()).clamp(0.0, 1.0) as f32
    }
}

/// Outcome of a hit
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DamageResult {
    /// True only on the hit that destroyed the brick
    pub destroyed: bool,
    /// Brick reward, paid on the destroying hit only
    pub reward: BigNumber,
}

impl DamageResult {
    pub fn none() -> Self {
        Self {
            destroyed: false,
            reward: BigNumber::ZERO,
        }
    }
}

/// Difficulty tier for a row: `min(MAX_TIER, 1 + row / rows_per_tier)`
pub fn tier_for_row(y: i32, rows_per_tier: u32) -> u32 {
    let row = y.max(0) as u32;
    (1 + row / rows_per_tier.max(1)).min(MAX_TIER)
}

/// `3 × tier`
pub fn max_health_for_tier(tier: u32) -> BigNumber {
    BigNumber::from(tier * BRICK_HEALTH_PER_TIER)
}

/// `floor(tier^1.2)`
pub fn reward_for_tier(tier: u32) -> BigNumber {
    BigNumber::from_f64((tier as f64).powf(BRICK_REWARD_EXPONENT)).floor()
}

#[derive(Debug, Clone)]
pub struct WorldGrid {
    width: u32,
    height: u32,
    pitch: Vec2,
    brick_size: Vec2,
    rows_per_tier: u32,
    /// Bricks hit but still alive, keyed by id
    damaged: HashMap<u64, BigNumber>,
    destroyed: BTreeSet<u64>,
}

impl WorldGrid {
    pub fn new(config: &SimConfig) -> Self {
        Self {
            width: config.grid_width,
            height: config.grid_height,
            pitch: config.cell_pitch(),
            brick_size: Vec2::new(config.brick_width, config.brick_height),
            rows_per_tier: config.rows_per_tier,
            damaged: HashMap::new(),
            destroyed: BTreeSet::new(),
        }
    }

    #[inline]
    pub fn width(&self) -> u32 {
        self.width
    }

    #[inline]
    pub fn height(&self) -> u32 {
        self.height
    }

    pub fn in_bounds(&self, coord: GridCoord) -> bool {
        coord.x >= 0 && coord.y >= 0 && (coord.x as u32) < self.width && (coord.y as u32) < self.height
    }

    /// Packed id `y × width + x`, or `None` outside the grid
    pub fn id_of(&self, coord: GridCoord) -> Option<u64> {
        self.in_bounds(coord)
            .then(|| coord.y as u64 * self.width as u64 + coord.x as u64)
    }

    pub fn coord_of(&self, id: u64) -> Option<GridCoord> {
        let w = self.width as u64;
        let coord = GridCoord::new((id % w) as i32, (id / w) as i32);
        self.in_bounds(coord).then_some(coord)
    }

    pub fn tier(&self, y: i32) -> u32 {
        tier_for_row(y, self.rows_per_tier)
    }

    pub fn brick_rect(&self, coord: GridCoord) -> Rect {
        let origin = Vec2::new(coord.x as f32, coord.y as f32) * self.pitch;
        Rect::new(origin.x, origin.y, self.brick_size.x, self.brick_size.y)
    }

    /// Cell containing a world-pixel point (unclamped)
    pub fn coord_at(&self, point: Vec2) -> GridCoord {
        let cell = (point / self.pitch).floor();
        GridCoord::new(cell.x as i32, cell.y as i32)
    }

    /// Current health; zero for destroyed or out-of-range cells
    pub fn get_health(&self, coord: GridCoord) -> BigNumber {
        let Some(id) = self.id_of(coord) else {
            return BigNumber::ZERO;
        };
        if self.destroyed.contains(&id) {
            return BigNumber::ZERO;
        }
        self.damaged
            .get(&id)
            .copied()
            .unwrap_or_else(|| max_health_for_tier(self.tier(coord.y)))
    }

    /// Out-of-range cells count as destroyed: there is nothing to hit
    pub fn is_destroyed(&self, coord: GridCoord) -> bool {
        match self.id_of(coord) {
            Some(id) => self.destroyed.contains(&id),
            None => true,
        }
    }

    pub fn materialize(&self, coord: GridCoord) -> Option<BrickView> {
        let id = self.id_of(coord)?;
        let tier = self.tier(coord.y);
        Some(BrickView {
            coord,
            id,
            rect: self.brick_rect(coord),
            tier,
            health: self.get_health(coord),
            max_health: max_health_for_tier(tier),
            reward: reward_for_tier(tier),
            destroyed: self.destroyed.contains(&id),
        })
    }

    /// Apply damage. Idempotent once destroyed: later calls pay nothing.
    pub fn damage(&mut self, coord: GridCoord, amount: BigNumber) -> DamageResult {
        let Some(id) = self.id_of(coord) else {
            return DamageResult::none();
        };
        if !amount.is_positive() || self.destroyed.contains(&id) {
            return DamageResult::none();
        }

        let remaining = self.get_health(coord) - amount;
        if remaining.is_positive() {
            self.damaged.insert(id, remaining);
            return DamageResult::none();
        }

        self.damaged.remove(&id);
        self.destroyed.insert(id);
        DamageResult {
            destroyed: true,
            reward: reward_for_tier(self.tier(coord.y)),
        }
    }

    /// Restore the pristine grid
    pub fn reset(&mut self) {
        self.damaged.clear();
        self.destroyed.clear();
    }

    pub fn destroyed_ids(&self) -> impl Iterator<Item = u64> + '_ {
        self.destroyed.iter().copied()
    }

    pub fn destroyed_count(&self) -> usize {
        self.destroyed.len()
    }

    pub fn damaged_count(&self) -> usize {
        self.damaged.len()
    }

    /// Replace the destroyed set (save restore). Ids outside the grid are dropped.
    pub fn restore_destroyed(&mut self, ids: impl IntoIterator<Item = u64>) {
        let cells = self.width as u64 * self.height as u64;
        self.reset();
        self.destroyed.extend(ids.into_iter().filter(|&id| id < cells));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn grid() -> WorldGrid {
        WorldGrid::new(&SimConfig::default())
    }

    #[test]
    fn test_untouched_brick_uses_formula() {
        let g = grid();
        let view = g.materialize(GridCoord::new(5, 0)).unwrap();
        assert_eq!(view.tier, 1);
        assert_eq!(view.health, BigNumber::from(3u32));
        assert_eq!(view.max_health, BigNumber::from(3u32));
        assert_eq!(view.reward, BigNumber::ONE);
        assert_eq!(view.rect, Rect::new(310.0, 0.0, 60.0, 20.0));
        assert!(!view.destroyed);

        // floor(20^1.2) = 36
        let deep = g.materialize(GridCoord::new(0, 999)).unwrap();
        assert_eq!(deep.tier, 20);
        assert_eq!(deep.max_health, BigNumber::from(60u32));
        assert_eq!(deep.reward, BigNumber::from(36u32));
    }

    #[test]
    fn test_ids_are_deterministic() {
        let g = grid();
        assert_eq!(g.id_of(GridCoord::new(3, 2)), Some(2003));
        assert_eq!(g.coord_of(2003), Some(GridCoord::new(3, 2)));
        assert_eq!(g.id_of(GridCoord::new(-1, 0)), None);
        assert_eq!(g.id_of(GridCoord::new(0, 1000)), None);
    }

    #[test]
    fn test_three_hits_destroy_tier_one() {
        let mut g = grid();
        let c = GridCoord::new(1, 1);
        assert!(!g.damage(c, BigNumber::ONE).destroyed);
        assert_eq!(g.get_health(c), BigNumber::from(2u32));
        assert_eq!(g.damaged_count(), 1);
        assert!(!g.damage(c, BigNumber::ONE).destroyed);
        let last = g.damage(c, BigNumber::ONE);
        assert!(last.destroyed);
        assert_eq!(last.reward, BigNumber::ONE);
        assert_eq!(g.damaged_count(), 0);
        assert!(g.is_destroyed(c));
        assert!(g.materialize(c).unwrap().destroyed);
    }

    #[test]
    fn test_damage_is_idempotent_after_destruction() {
        let mut g = grid();
        let c = GridCoord::new(7, 3);
        assert!(g.damage(c, BigNumber::from(100u32)).destroyed);
        let again = g.damage(c, BigNumber::from(100u32));
        assert_eq!(again, DamageResult::none());
        assert!(g.get_health(c).is_zero());
    }

    #[test]
    fn test_out_of_range_is_noop() {
        let mut g = grid();
        let c = GridCoord::new(-4, 2);
        assert!(g.is_destroyed(c));
        assert!(g.materialize(c).is_none());
        assert_eq!(g.damage(c, BigNumber::ONE), DamageResult::none());
        assert_eq!(g.destroyed_count(), 0);
    }

    #[test]
    fn test_reset_and_restore() {
        let mut g = grid();
        g.damage(GridCoord::new(0, 0), BigNumber::from(5u32));
        g.damage(GridCoord::new(1, 0), BigNumber::ONE);
        g.reset();
        assert_eq!(g.destroyed_count(), 0);
        assert_eq!(g.damaged_count(), 0);

        g.restore_destroyed([0, 42, 5_000_000]);
        assert_eq!(g.destroyed_ids().collect::<Vec<_>>(), vec![0, 42]);
        assert!(g.is_destroyed(GridCoord::new(42, 0)));
    }

    #[test]
    fn test_coord_at() {
        let g = grid();
        assert_eq!(g.coord_at(Vec2::new(61.9, 21.9)), GridCoord::new(0, 0));
        assert_eq!(g.coord_at(Vec2::new(62.0, 22.0)), GridCoord::new(1, 1));
        assert_eq!(g.coord_at(Vec2::new(-1.0, 5.0)), GridCoord::new(-1, 0));
    }

    proptest! {
        #[test]
        fn prop_formulas_monotonic_in_row(y in 0i32..2000) {
            let (a, b) = (tier_for_row(y, 50), tier_for_row(y + 1, 50));
            prop_assert!(a <= b);
            prop_assert!(max_health_for_tier(a) <= max_health_for_tier(b));
            prop_assert!(reward_for_tier(a) <= reward_for_tier(b));
        }

        #[test]
        fn prop_untouched_health_matches_formula(x in 0i32..1000, y in 0i32..1000) {
            let g = grid();
            let c = GridCoord::new(x, y);
            prop_assert_eq!(g.get_health(c), max_health_for_tier(g.tier(y)));
        }

        #[test]
        fn prop_health_stays_in_range(
            hits in proptest::collection::vec((0i32..4, 0i32..4, 1u32..8), 1..60)
        ) {
            let mut g = grid();
            let mut paid = std::collections::HashMap::new();
            for (x, y, amount) in hits {
                let c = GridCoord::new(x, y);
                let result = g.damage(c, BigNumber::from(amount));
                if result.destroyed {
                    *paid.entry(c).or_insert(0) += 1;
                }
                let view = g.materialize(c).unwrap();
                prop_assert!(!view.health.is_negative());
                prop_assert!(view.health <= view.max_health);
            }
            prop_assert!(paid.values().all(|&n| n == 1));
        }
    }
}
