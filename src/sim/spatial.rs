//! Uniform-cell spatial hash over loaded bricks
//!
//! Broad phase only: `query` may return bricks that do not touch the circle,
//! but never misses one whose bounding box overlaps the circle's.

use std::collections::HashMap;

use glam::Vec2;

use crate::world::{GridCoord, Rect};

/// What the index needs to know about a brick
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BrickShape {
    pub coord: GridCoord,
    pub rect: Rect,
}

#[derive(Debug, Clone)]
pub struct SpatialIndex {
    cell_size: f32,
    cells: HashMap<i64, Vec<BrickShape>>,
}

#[inline]
fn cell_key(col: i32, row: i32) -> i64 {
    ((col as i64) << 32) | (row as u32 as i64)
}

impl SpatialIndex {
    pub fn new(cell_size: f32) -> Self {
        Self {
            cell_size: cell_size.max(1.0),
            cells: HashMap::new(),
        }
    }

    #[inline]
    fn cell(&self, v: f32) -> i32 {
        (v / self.cell_size).floor() as i32
    }

    /// Register a brick in every cell its rect touches
    pub fn add(&mut self, shape: BrickShape) {
        let min = shape.rect.min();
        let max = shape.rect.max();
        for col in self.cell(min.x)..=self.cell(max.x) {
            for row in self.cell(min.y)..=self.cell(max.y) {
                self.cells.entry(cell_key(col, row)).or_default().push(shape);
            }
        }
    }

    pub fn rebuild(&mut self, shapes: impl IntoIterator<Item = BrickShape>) {
        self.clear();
        for shape in shapes {
            self.add(shape);
        }
    }

    pub fn clear(&mut self) {
        self.cells.clear();
    }

    pub fn is_empty(&self) -> bool {
        self.cells.is_empty()
    }

    /// Candidates near a circle, sorted by coordinate and deduplicated
    pub fn query(&self, center: Vec2, radius: f32) -> Vec<BrickShape> {
        let mut found = Vec::new();
        for col in self.cell(center.x - radius)..=self.cell(center.x + radius) {
            for row in self.cell(center.y - radius)..=self.cell(center.y + radius) {
                if let Some(bucket) = self.cells.get(&cell_key(col, row)) {
                    found.extend_from_slice(bucket);
                }
            }
        }
        found.sort_by_key(|s| s.coord);
        found.dedup_by_key(|s| s.coord);
        found
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn shape(x: i32, y: i32, rect: Rect) -> BrickShape {
        BrickShape {
            coord: GridCoord::new(x, y),
            rect,
        }
    }

    #[test]
    fn test_query_finds_nearby_only() {
        let mut index = SpatialIndex::new(100.0);
        index.add(shape(0, 0, Rect::new(0.0, 0.0, 60.0, 20.0)));
        index.add(shape(9, 9, Rect::new(900.0, 900.0, 60.0, 20.0)));
        let hits = index.query(Vec2::new(30.0, 30.0), 8.0);
        assert_eq!(hits.len(), 1);
        assert_eq!(hits[0].coord, GridCoord::new(0, 0));
    }

    #[test]
    fn test_large_brick_spans_cells_without_duplicates() {
        let mut index = SpatialIndex::new(100.0);
        index.add(shape(0, 0, Rect::new(50.0, 50.0, 300.0, 300.0)));
        assert_eq!(index.query(Vec2::new(320.0, 320.0), 5.0).len(), 1);
        assert_eq!(index.query(Vec2::new(200.0, 200.0), 150.0).len(), 1);
    }

    #[test]
    fn test_negative_coordinates() {
        let mut index = SpatialIndex::new(100.0);
        index.add(shape(-1, -1, Rect::new(-62.0, -22.0, 60.0, 20.0)));
        assert_eq!(index.query(Vec2::new(-30.0, -10.0), 8.0).len(), 1);
    }

    #[test]
    fn test_rebuild_replaces_contents() {
        let mut index = SpatialIndex::new(100.0);
        index.add(shape(0, 0, Rect::new(0.0, 0.0, 60.0, 20.0)));
        index.rebuild([shape(1, 0, Rect::new(62.0, 0.0, 60.0, 20.0))]);
        let hits = index.query(Vec2::new(30.0, 10.0), 40.0);
        assert_eq!(hits.len(), 1);
        assert_eq!(hits[0].coord, GridCoord::new(1, 0));
        index.clear();
        assert!(index.is_empty());
    }

    proptest! {
        #[test]
        fn prop_no_false_negatives(
            bricks in proptest::collection::vec(
                (-2_000.0f32..2_000.0, -2_000.0f32..2_000.0, 1.0f32..250.0, 1.0f32..250.0),
                1..80,
            ),
            center in (-2_100.0f32..2_100.0, -2_100.0f32..2_100.0),
            radius in 0.0f32..200.0,
            cell in 10.0f32..300.0,
        ) {
            let mut index = SpatialIndex::new(cell);
            let shapes: Vec<BrickShape> = bricks
                .iter()
                .enumerate()
                .map(|(i, &(x, y, w, h))| shape(i as i32, 0, Rect::new(x, y, w, h)))
                .collect();
            index.rebuild(shapes.iter().copied());

            let center = Vec2::new(center.0, center.1);
            let (qmin, qmax) = (center - radius, center + radius);
            let found = index.query(center, radius);
            for s in &shapes {
                let (min, max) = (s.rect.min(), s.rect.max());
                let overlaps = min.x <= qmax.x && qmin.x <= max.x && min.y <= qmax.y && qmin.y <= max.y;
                if overlaps {
                    prop_assert!(found.iter().any(|f| f.coord == s.coord), "missed {:?}", s.coord);
                }
            }
        }
    }
}
