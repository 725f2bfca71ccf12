//! Brick world: the sparse grid and the chunk streamer that windows it

pub mod chunks;
pub mod grid;

pub use chunks::{ChunkCoord, ChunkEvent, ChunkStreamer, Viewport};
pub use grid::{BrickView, DamageResult, GridCoord, Rect, WorldGrid};
