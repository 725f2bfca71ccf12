//! Idle Bricks - simulation and economy core for an incremental brick breaker
//!
//! Core modules:
//! - `bignum`: Arbitrary-magnitude decimal numbers for currency and health
//! - `economy`: Upgrade ladders, multipliers and prestige
//! - `world`: Sparse brick grid and viewport chunk streaming
//! - `sim`: Deterministic simulation (balls, collisions, tick loop)
//! - `persistence`: Versioned saves, migration, offline earnings
//! - `config`: Data-driven geometry and streaming knobs

pub mod bignum;
pub mod config;
pub mod economy;
pub mod error;
pub mod persistence;
pub mod sim;
pub mod world;

pub use bignum::BigNumber;
pub use config::SimConfig;
pub use economy::{Economy, UpgradeKind};
pub use error::{Error, SaveError};
pub use sim::{BallKind, SimEvent, Simulator, Snapshot};
pub use world::{ChunkEvent, GridCoord, Viewport, WorldGrid};

/// Game configuration constants
pub mod consts {
    /// Fixed simulation timestep used by the host loop (120 Hz)
    pub const SIM_DT: f32 = 1.0 / 120.0;
    /// Maximum host steps per frame to prevent spiral of death
    pub const MAX_SUBSTEPS: u32 = 8;

    /// Economy
    pub const UPGRADE_BONUS: f64 = 0.1;
    pub const PRESTIGE_BONUS: f64 = 0.25;
    /// Bricks destroyed in a run needed for each prestige; last entry repeats
    pub const PRESTIGE_THRESHOLDS: [u32; 3] = [10_000, 20_000, 40_000];
    pub const BALL_COST_MULTIPLIER: f64 = 1.15;
    pub const BRICKS_PER_TIER: u32 = 100;
    pub const MAX_TIER: u32 = 20;

    /// Offline progress
    pub const OFFLINE_EARNINGS_RATE: f64 = 0.5;
    /// Absences this short (seconds) earn nothing
    pub const OFFLINE_MIN_SECS: f64 = 60.0;

    /// Bricks
    pub const BRICK_HEALTH_PER_TIER: u32 = 3;
    pub const BRICK_REWARD_EXPONENT: f64 = 1.2;

    /// Ball defaults
    pub const BALL_RADIUS: f32 = 8.0;
    /// Horizontal spawn jitter around the viewport center
    pub const BALL_SPAWN_JITTER: f32 = 100.0;
    /// Spawn height above the viewport bottom
    pub const BALL_SPAWN_INSET: f32 = 50.0;
    /// Launch angle spread either side of straight up (30 degrees)
    pub const BALL_SPAWN_SPREAD: f32 = std::f32::consts::FRAC_PI_6;
    /// Upper bound on per-ball collision substeps in one tick
    pub const MAX_BALL_SUBSTEPS: usize = 64;
    /// Sniper steering strength, fraction of speed per second
    pub const SNIPER_STEER: f32 = 0.45;

    /// Explosions
    pub const EXPLOSION_DAMAGE_FRACTION: f64 = 0.5;
    /// Effect lifetime in seconds
    pub const EXPLOSION_LIFETIME: f32 = 0.3;

    /// Save schema version written by this build
    pub const SAVE_VERSION: u32 = 2;
}
