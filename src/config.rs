//! Simulation configuration
//!
//! Geometry and streaming knobs. Every field has a default, so a partial
//! JSON file only needs to name what it changes.

use std::path::Path;

use glam::Vec2;
use serde::{Deserialize, Serialize};

use crate::world::Viewport;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SimConfig {
    // === World ===
    /// Grid columns
    pub grid_width: u32,
    /// Grid rows
    pub grid_height: u32,
    pub brick_width: f32,
    pub brick_height: f32,
    /// Space between neighbouring bricks
    pub brick_gap: f32,
    /// Rows per difficulty tier
    pub rows_per_tier: u32,

    // === Streaming ===
    /// Chunk edge length in cells
    pub chunk_size: u32,
    /// Extra chunks loaded around the viewport
    pub chunk_buffer: u32,
    /// Upper bound on chunk loads per viewport update
    pub max_chunk_loads_per_update: usize,

    // === Physics ===
    pub spatial_cell_size: f32,
    pub ball_radius: f32,
    /// Bricks left in the play area before the view advances deeper
    pub low_water_mark: usize,

    // === Host ===
    pub viewport_width: f32,
    pub viewport_height: f32,
    /// Autosave interval in seconds
    pub autosave_secs: f32,
}

impl Default for SimConfig {
    fn default() -> Self {
        Self {
            grid_width: 1000,
            grid_height: 1000,
            brick_width: 60.0,
            brick_height: 20.0,
            brick_gap: 2.0,
            rows_per_tier: 50,

            chunk_size: 10,
            chunk_buffer: 1,
            max_chunk_loads_per_update: 256,

            spatial_cell_size: 100.0,
            ball_radius: crate::consts::BALL_RADIUS,
            low_water_mark: 20,

            viewport_width: 800.0,
            viewport_height: 600.0,
            autosave_secs: 30.0,
        }
    }
}

impl SimConfig {
    /// Distance between brick origins
    pub fn cell_pitch(&self) -> Vec2 {
        Vec2::new(
            self.brick_width + self.brick_gap,
            self.brick_height + self.brick_gap,
        )
    }

    /// Pixel size of one streaming chunk
    pub fn chunk_pixels(&self) -> Vec2 {
        self.cell_pitch() * self.chunk_size as f32
    }

    /// Pixel size of the whole brick field
    pub fn world_pixels(&self) -> Vec2 {
        self.cell_pitch() * Vec2::new(self.grid_width as f32, self.grid_height as f32)
    }

    /// Starting viewport at the top-left of the world
    pub fn initial_viewport(&self) -> Viewport {
        Viewport::new(0.0, 0.0, self.viewport_width, self.viewport_height)
    }

    /// Parse from JSON, falling back to defaults for missing fields
    pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
        let mut config: Self = serde_json::from_str(json)?;
        config.sanitize();
        Ok(config)
    }

    /// Load from a JSON file; a missing file yields defaults
    pub fn load(path: impl AsRef<Path>) -> Result<Self, crate::error::SaveError> {
        let path = path.as_ref();
        if !path.exists() {
            log::info!("No config at {}, using defaults", path.display());
            return Ok(Self::default());
        }
        let json = std::fs::read_to_string(path)?;
        let config = Self::from_json(&json)
            .map_err(|e| crate::error::SaveError::malformed(format!("config: {e}")))?;
        log::info!("Loaded config from {}", path.display());
        Ok(config)
    }

    /// Clamp values that would make the world degenerate
    pub(crate) fn sanitize(&mut self) {
        self.grid_width = self.grid_width.max(1);
        self.grid_height = self.grid_height.max(1);
        self.chunk_size = self.chunk_size.max(1);
        self.rows_per_tier = self.rows_per_tier.max(1);
        self.max_chunk_loads_per_update = self.max_chunk_loads_per_update.max(1);
        self.brick_width = self.brick_width.max(1.0);
        self.brick_height = self.brick_height.max(1.0);
        self.brick_gap = self.brick_gap.max(0.0);
        self.spatial_cell_size = self.spatial_cell_size.max(1.0);
        self.ball_radius = self.ball_radius.max(0.5);
        self.viewport_width = self.viewport_width.max(self.ball_radius * 4.0);
        self.viewport_height = self.viewport_height.max(self.ball_radius * 4.0);
        self.autosave_secs = self.autosave_secs.max(1.0);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = SimConfig::default();
        assert_eq!(config.cell_pitch(), Vec2::new(62.0, 22.0));
        assert_eq!(config.chunk_pixels(), Vec2::new(620.0, 220.0));
        assert_eq!(config.world_pixels(), Vec2::new(62_000.0, 22_000.0));
    }

    #[test]
    fn test_partial_json_keeps_defaults() {
        let config = SimConfig::from_json(r#"{ "grid_width": 40, "chunk_size": 5 }"#).unwrap();
        assert_eq!(config.grid_width, 40);
        assert_eq!(config.chunk_size, 5);
        assert_eq!(config.grid_height, 1000);
        assert_eq!(config.low_water_mark, 20);
    }

    #[test]
    fn test_degenerate_values_are_clamped() {
        let config = SimConfig::from_json(r#"{ "chunk_size": 0, "grid_height": 0 }"#).unwrap();
        assert_eq!(config.chunk_size, 1);
        assert_eq!(config.grid_height, 1);
    }

    #[test]
    fn test_load_missing_file_is_default() {
        let dir = tempfile::tempdir().unwrap();
        let config = SimConfig::load(dir.path().join("absent.json")).unwrap();
        assert_eq!(config, SimConfig::default());
    }

    #[test]
    fn test_load_rejects_garbage() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.json");
        std::fs::write(&path, "not json").unwrap();
        assert!(SimConfig::load(&path).is_err());
    }
}
