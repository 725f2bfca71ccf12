//! Viewport-driven chunk streaming
//!
//! The world is split into square chunks of cells. Only chunks around the
//! viewport are loaded; moving the viewport yields unload events for chunks
//! that fell out of range and load events (with their live bricks) for chunks
//! that came into range.

use std::collections::BTreeSet;

use glam::Vec2;
use serde::{Deserialize, Serialize};

use super::grid::{BrickView, GridCoord, Rect, WorldGrid};
use crate::config::SimConfig;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ChunkCoord {
    pub cx: u32,
    pub cy: u32,
}

impl ChunkCoord {
    pub const fn new(cx: u32, cy: u32) -> Self {
        Self { cx, cy }
    }
}

/// Visible rectangle in world pixels
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Viewport {
    pub x: f32,
    pub y: f32,
    pub width: f32,
    pub height: f32,
}

impl Viewport {
    pub const fn new(x: f32, y: f32, width: f32, height: f32) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }

    pub fn min(&self) -> Vec2 {
        Vec2::new(self.x, self.y)
    }

    pub fn max(&self) -> Vec2 {
        Vec2::new(self.x + self.width, self.y + self.height)
    }

    pub fn as_rect(&self) -> Rect {
        Rect::new(self.x, self.y, self.width, self.height)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum ChunkEvent {
    /// Chunk entered range; carries its non-destroyed bricks
    Load {
        chunk: ChunkCoord,
        bricks: Vec<BrickView>,
    },
    /// Chunk left range; every brick inside it must be dropped downstream
    Unload { chunk: ChunkCoord },
}

#[derive(Debug, Clone)]
pub struct ChunkStreamer {
    chunk_size: u32,
    buffer: u32,
    max_loads: usize,
    chunk_pixels: Vec2,
    /// World size in chunks
    chunks_x: u32,
    chunks_y: u32,
    loaded: BTreeSet<ChunkCoord>,
    /// Visible chunks held back by the load cap on the last update
    pending: usize,
}

impl ChunkStreamer {
    pub fn new(config: &SimConfig) -> Self {
        let chunk_size = config.chunk_size.max(1);
        Self {
            chunk_size,
            buffer: config.chunk_buffer,
            max_loads: config.max_chunk_loads_per_update.max(1),
            chunk_pixels: config.chunk_pixels(),
            chunks_x: config.grid_width.div_ceil(chunk_size),
            chunks_y: config.grid_height.div_ceil(chunk_size),
            loaded: BTreeSet::new(),
            pending: 0,
        }
    }

    pub fn chunk_of(&self, coord: GridCoord) -> ChunkCoord {
        ChunkCoord::new(
            coord.x.max(0) as u32 / self.chunk_size,
            coord.y.max(0) as u32 / self.chunk_size,
        )
    }

    /// Inclusive cell range `(min, max)` covered by a chunk, clipped to the grid
    pub fn cell_range(&self, chunk: ChunkCoord, grid: &WorldGrid) -> (GridCoord, GridCoord) {
        let x0 = chunk.cx * self.chunk_size;
        let y0 = chunk.cy * self.chunk_size;
        let x1 = (x0 + self.chunk_size).min(grid.width()).saturating_sub(1);
        let y1 = (y0 + self.chunk_size).min(grid.height()).saturating_sub(1);
        (
            GridCoord::new(x0 as i32, y0 as i32),
            GridCoord::new(x1 as i32, y1 as i32),
        )
    }

    /// Chunk range along one axis, buffered and clamped to `[0, count)`
    fn axis_range(&self, start: f32, extent: f32, chunk_px: f32, count: u32) -> Option<(u32, u32)> {
        let buffer = self.buffer as i64;
        let first = (start / chunk_px).floor() as i64 - buffer;
        let last = ((start + extent) / chunk_px).ceil() as i64 - 1 + buffer;
        let first = first.max(0);
        let last = last.min(count as i64 - 1);
        (first <= last).then_some((first as u32, last as u32))
    }

    /// Chunks that should be loaded for `viewport`
    pub fn visible_chunks(&self, viewport: &Viewport) -> BTreeSet<ChunkCoord> {
        let xs = self.axis_range(viewport.x, viewport.width, self.chunk_pixels.x, self.chunks_x);
        let ys = self.axis_range(viewport.y, viewport.height, self.chunk_pixels.y, self.chunks_y);
        let (Some((x0, x1)), Some((y0, y1))) = (xs, ys) else {
            return BTreeSet::new();
        };
        (y0..=y1)
            .flat_map(|cy| (x0..=x1).map(move |cx| ChunkCoord::new(cx, cy)))
            .collect()
    }

    /// Live bricks inside a chunk
    pub fn chunk_bricks(&self, chunk: ChunkCoord, grid: &WorldGrid) -> Vec<BrickView> {
        let (min, max) = self.cell_range(chunk, grid);
        let mut bricks = Vec::with_capacity((self.chunk_size * self.chunk_size) as usize);
        for y in min.y..=max.y {
            for x in min.x..=max.x {
                if let Some(view) = grid.materialize(GridCoord::new(x, y)) {
                    if !view.destroyed {
                        bricks.push(view);
                    }
                }
            }
        }
        bricks
    }

    /// Diff the loaded set against `viewport`. Unloads come first, then at
    /// most `max_chunk_loads_per_update` loads; the rest arrive on later calls.
    pub fn update_viewport(&mut self, viewport: &Viewport, grid: &WorldGrid) -> Vec<ChunkEvent> {
        let target = self.visible_chunks(viewport);
        let mut events = Vec::new();

        let stale: Vec<ChunkCoord> = self.loaded.difference(&target).copied().collect();
        for chunk in stale {
            self.loaded.remove(&chunk);
            events.push(ChunkEvent::Unload { chunk });
        }
        let unloads = events.len();

        let fresh: Vec<ChunkCoord> = target
            .difference(&self.loaded)
            .take(self.max_loads)
            .copied()
            .collect();
        for chunk in fresh {
            let bricks = self.chunk_bricks(chunk, grid);
            self.loaded.insert(chunk);
            events.push(ChunkEvent::Load { chunk, bricks });
        }
        // Stale chunks are gone, so everything loaded is in the target set
        self.pending = target.len() - self.loaded.len();

        if !events.is_empty() {
            log::debug!(
                "Chunks: {} unloaded, {} loaded, {} resident",
                unloads,
                events.len() - unloads,
                self.loaded.len()
            );
        }
        events
    }

    /// Unload everything, then load for `viewport` from scratch
    pub fn reload_all(&mut self, viewport: &Viewport, grid: &WorldGrid) -> Vec<ChunkEvent> {
        let mut events: Vec<ChunkEvent> = std::mem::take(&mut self.loaded)
            .into_iter()
            .map(|chunk| ChunkEvent::Unload { chunk })
            .collect();
        events.extend(self.update_viewport(viewport, grid));
        events
    }

    pub fn is_loaded(&self, chunk: ChunkCoord) -> bool {
        self.loaded.contains(&chunk)
    }

    /// True while capped loads for the last viewport are still outstanding
    pub fn has_pending(&self) -> bool {
        self.pending > 0
    }

    pub fn loaded_count(&self) -> usize {
        self.loaded.len()
    }

    pub fn loaded_chunks(&self) -> impl Iterator<Item = ChunkCoord> + '_ {
        self.loaded.iter().copied()
    }
}
