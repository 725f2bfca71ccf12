//! Simulation state and core entity types
//!
//! Everything the tick loop mutates lives in `SimulationState`. Presentation
//! code only ever sees a `Snapshot`.

use glam::Vec2;
use rand::SeedableRng;
use rand_pcg::Pcg32;
use serde::{Deserialize, Serialize};

use crate::bignum::BigNumber;
use crate::consts::*;
use crate::economy::Economy;
use crate::world::{BrickView, GridCoord, Viewport};

/// Ball types, each a fixed capability bundle
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BallKind {
    Basic,
    Fast,
    Heavy,
    Plasma,
    Explosive,
    Sniper,
}

/// Per-kind stats before upgrades
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BallStats {
    /// Pixels per second
    pub speed: f32,
    pub damage: f64,
    /// Passes through bricks instead of bouncing
    pub pierce: bool,
    /// Area damage radius on impact
    pub explosion_radius: Option<f32>,
    /// Steers toward the weakest loaded brick
    pub targeting: bool,
    pub base_cost: f64,
}

impl BallKind {
    pub const COUNT: usize = 6;
    pub const ALL: [BallKind; Self::COUNT] = [
        BallKind::Basic,
        BallKind::Fast,
        BallKind::Heavy,
        BallKind::Plasma,
        BallKind::Explosive,
        BallKind::Sniper,
    ];

    pub fn index(self) -> usize {
        self as usize
    }

    pub fn as_str(self) -> &'static str {
        match self {
            BallKind::Basic => "basic",
            BallKind::Fast => "fast",
            BallKind::Heavy => "heavy",
            BallKind::Plasma => "plasma",
            BallKind::Explosive => "explosive",
            BallKind::Sniper => "sniper",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|k| k.as_str() == s)
    }

    pub fn stats(self) -> BallStats {
        let plain = BallStats {
            speed: 240.0,
            damage: 1.0,
            pierce: false,
            explosion_radius: None,
            targeting: false,
            base_cost: 10.0,
        };
        match self {
            BallKind::Basic => plain,
            BallKind::Fast => BallStats {
                speed: 420.0,
                base_cost: 30.0,
                ..plain
            },
            BallKind::Heavy => BallStats {
                speed: 180.0,
                damage: 5.0,
                base_cost: 150.0,
                ..plain
            },
            BallKind::Plasma => BallStats {
                speed: 300.0,
                damage: 3.0,
                pierce: true,
                base_cost: 500.0,
                ..plain
            },
            BallKind::Explosive => BallStats {
                damage: 6.0,
                explosion_radius: Some(70.0),
                base_cost: 1500.0,
                ..plain
            },
            BallKind::Sniper => BallStats {
                speed: 360.0,
                damage: 10.0,
                targeting: true,
                base_cost: 3500.0,
                ..plain
            },
        }
    }
}

/// A ball entity
#[derive(Debug, Clone, PartialEq)]
pub struct Ball {
    pub id: u32,
    pub kind: BallKind,
    pub pos: Vec2,
    pub vel: Vec2,
    /// Bricks the ball currently overlaps; a brick is damaged on entry only
    pub inside: Vec<GridCoord>,
}

impl Ball {
    pub fn new(id: u32, kind: BallKind, pos: Vec2, vel: Vec2) -> Self {
        Self {
            id,
            kind,
            pos,
            vel,
            inside: Vec::new(),
        }
    }
}

/// Transient explosion effect, pure time decay
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Explosion {
    pub pos: Vec2,
    pub radius: f32,
    /// Seconds since spawn
    pub age: f32,
    pub lifetime: f32,
}

impl Explosion {
    pub fn new(pos: Vec2, radius: f32) -> Self {
        Self {
            pos,
            radius,
            age: 0.0,
            lifetime: EXPLOSION_LIFETIME,
        }
    }

    /// 0 at spawn, 1 when expired
    pub fn progress(&self) -> f32 {
        (self.age / self.lifetime).clamp(0.0, 1.0)
    }

    /// Drawn radius grows from half to full
    pub fn current_radius(&self) -> f32 {
        self.radius * (0.5 + 0.5 * self.progress())
    }

    pub fn alpha(&self) -> f32 {
        1.0 - self.progress()
    }

    pub fn expired(&self) -> bool {
        self.age >= self.lifetime
    }
}

/// Things that happened during a tick, for the render layer
#[derive(Debug, Clone, PartialEq)]
pub enum SimEvent {
    BrickDamaged {
        coord: GridCoord,
        damage: BigNumber,
        health: BigNumber,
    },
    BrickDestroyed {
        coord: GridCoord,
        /// Coins credited, after multipliers
        reward: BigNumber,
    },
    Explosion {
        pos: Vec2,
        radius: f32,
    },
    /// Play area moved down to fresh rows
    DepthAdvanced {
        viewport: Viewport,
    },
}

/// Mutable simulation state, owned by the `Simulator`
#[derive(Debug, Clone)]
pub struct SimulationState {
    pub seed: u64,
    pub rng: Pcg32,
    pub economy: Economy,
    /// Active balls (sorted by id for determinism)
    pub balls: Vec<Ball>,
    pub explosions: Vec<Explosion>,
    pub paused: bool,
    /// Simulated seconds since start
    pub time: f64,
    next_id: u32,
}

impl SimulationState {
    pub fn new(seed: u64) -> Self {
        Self {
            seed,
            rng: Pcg32::seed_from_u64(seed),
            economy: Economy::new(),
            balls: Vec::new(),
            explosions: Vec::new(),
            paused: false,
            time: 0.0,
            next_id: 1,
        }
    }

    /// Allocate a new entity ID
    pub fn next_entity_id(&mut self) -> u32 {
        let id = self.next_id;
        self.next_id += 1;
        id
    }

    pub fn ball_count(&self, kind: BallKind) -> usize {
        self.balls.iter().filter(|b| b.kind == kind).count()
    }
}

/// Read-only copy of everything presentation code may look at
#[derive(Debug, Clone)]
pub struct Snapshot {
    pub balls: Vec<Ball>,
    pub bricks: Vec<BrickView>,
    pub explosions: Vec<Explosion>,
    pub economy: Economy,
    pub viewport: Viewport,
    pub paused: bool,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ball_table() {
        let explosive = BallKind::Explosive.stats();
        assert_eq!(explosive.explosion_radius, Some(70.0));
        assert_eq!(explosive.damage, 6.0);
        assert!(BallKind::Plasma.stats().pierce);
        assert!(BallKind::Sniper.stats().targeting);
        assert!(!BallKind::Basic.stats().pierce);
        assert_eq!(BallKind::Heavy.stats().speed, 180.0);
        for kind in BallKind::ALL {
            assert_eq!(BallKind::from_str(kind.as_str()), Some(kind));
            assert_eq!(BallKind::ALL[kind.index()], kind);
        }
    }

    #[test]
    fn test_explosion_decay() {
        let mut e = Explosion::new(Vec2::ZERO, 70.0);
        assert_eq!(e.current_radius(), 35.0);
        assert_eq!(e.alpha(), 1.0);
        e.age = EXPLOSION_LIFETIME;
        assert!(e.expired());
        assert_eq!(e.current_radius(), 70.0);
        assert_eq!(e.alpha(), 0.0);
    }

    #[test]
    fn test_entity_ids_increase() {
        let mut state = SimulationState::new(7);
        assert_eq!(state.next_entity_id(), 1);
        assert_eq!(state.next_entity_id(), 2);
    }

    #[test]
    fn test_ball_kind_serde_names() {
        let json = serde_json::to_string(&BallKind::Explosive).unwrap();
        assert_eq!(json, "\"explosive\"");
        let kind: BallKind = serde_json::from_str("\"sniper\"").unwrap();
        assert_eq!(kind, BallKind::Sniper);
    }
}
