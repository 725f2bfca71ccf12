//! Deterministic simulation module
//!
//! Ball motion, brick collisions and the tick loop. This module must stay
//! deterministic:
//! - Seeded RNG only
//! - Stable iteration order (balls by spawn order, bricks by coordinate)
//! - No rendering or platform dependencies

pub mod collision;
pub mod spatial;
pub mod state;
pub mod tick;

pub use collision::{
    CollisionResult, bounce_off_rect, circle_rect_collision, circle_rect_overlap,
    reflect_in_bounds,
};
pub use spatial::{BrickShape, SpatialIndex};
pub use state::{Ball, BallKind, BallStats, Explosion, SimEvent, SimulationState, Snapshot};
pub use tick::Simulator;
