//! Save/load persistence
//!
//! Features:
//! - Versioned JSON envelope with exact decimal strings for big numbers
//! - Field-level migration of partial and older saves
//! - Offline earnings credited once on load
//! - Portable base64 export/import
//! - Backup rotation (tmp → save, old save → backup) and recovery

pub mod envelope;
pub mod migration;
pub mod store;

pub use envelope::SaveBlob;
pub use store::{FileStore, MemoryStore, SaveStore};

use std::time::{SystemTime, UNIX_EPOCH};

use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use glam::Vec2;

use crate::bignum::BigNumber;
use crate::config::SimConfig;
use crate::consts::*;
use crate::economy::{Economy, UpgradeKind};
use crate::error::SaveError;
use crate::sim::{BallKind, Simulator};

/// Outcome of a successful load
#[derive(Debug, Clone, PartialEq)]
pub struct LoadReport {
    /// Schema version the save was written with
    pub version: u32,
    /// Seconds between the save timestamp and the load
    pub offline_secs: f64,
    /// Coins credited for the time away
    pub offline_earnings: BigNumber,
    pub balls: usize,
}

/// Current wall-clock time in Unix milliseconds
pub fn now_ms() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_millis() as u64)
        .unwrap_or(0)
}

/// Coins earned while away: `balls × coin multiplier × prestige bonus × secs × rate`,
/// only once the absence exceeds the minimum.
pub fn offline_earnings(economy: &Economy, balls: usize, elapsed_secs: f64) -> BigNumber {
    if elapsed_secs.is_nan() || elapsed_secs <= OFFLINE_MIN_SECS {
        return BigNumber::ZERO;
    }
    let income = balls as f64
        * economy.multiplier(UpgradeKind::CoinMultiplier)
        * economy.prestige_bonus();
    BigNumber::from_f64(income * elapsed_secs * OFFLINE_EARNINGS_RATE).floor()
}

/// Keep a restored camera inside the world
fn clamp_camera(config: &SimConfig, camera: Vec2) -> Vec2 {
    if !camera.is_finite() {
        return Vec2::ZERO;
    }
    let view = Vec2::new(config.viewport_width, config.viewport_height);
    let max = (config.world_pixels() - view).max(Vec2::ZERO);
    camera.clamp(Vec2::ZERO, max)
}

/// Serialize the running game as JSON
pub fn serialize(sim: &Simulator, now_ms: u64) -> Result<String, SaveError> {
    SaveBlob::capture(sim, now_ms).to_json()
}

/// Parse a save without touching any game state
pub fn deserialize(json: &str) -> Result<SaveBlob, SaveError> {
    SaveBlob::from_json(json)
}

/// Replace the game with a validated save and credit offline earnings
pub fn apply(sim: &mut Simulator, blob: &SaveBlob, now_ms: u64) -> LoadReport {
    let mut economy = blob.economy();
    let balls = if blob.balls.is_empty() {
        vec![BallKind::Basic]
    } else {
        blob.balls.clone()
    };

    let offline_secs = if blob.timestamp > 0 {
        now_ms.saturating_sub(blob.timestamp) as f64 / 1000.0
    } else {
        0.0
    };
    let earnings = offline_earnings(&economy, balls.len(), offline_secs);
    economy.credit(earnings);

    let camera = clamp_camera(sim.config(), blob.camera);
    sim.restore(economy, blob.destroyed_bricks.iter().copied(), &balls, camera);

    log::info!(
        "Loaded save v{}: {} coins, {} balls, prestige {}",
        blob.version,
        sim.economy().balance().format(2),
        balls.len(),
        blob.prestige_level
    );
    if earnings.is_positive() {
        log::info!(
            "Offline for {:.0}s, earned {}",
            offline_secs,
            earnings.format(2)
        );
    }

    LoadReport {
        version: blob.version,
        offline_secs,
        offline_earnings: earnings,
        balls: balls.len(),
    }
}

/// Portable export string (base64 of the JSON save)
pub fn export_text(sim: &Simulator, now_ms: u64) -> Result<String, SaveError> {
    Ok(STANDARD.encode(serialize(sim, now_ms)?))
}

/// Decode export text: base64, or a raw JSON object from older exports
pub fn decode_text(text: &str) -> Result<SaveBlob, SaveError> {
    let text = text.trim();
    if text.starts_with('{') {
        return deserialize(text);
    }
    let bytes = STANDARD
        .decode(text)
        .map_err(|e| SaveError::malformed(format!("invalid base64: {e}")))?;
    let json =
        String::from_utf8(bytes).map_err(|e| SaveError::malformed(format!("invalid UTF-8: {e}")))?;
    deserialize(&json)
}

/// Import export text. On error the game is left untouched.
pub fn import_text(sim: &mut Simulator, text: &str, now_ms: u64) -> Result<LoadReport, SaveError> {
    match decode_text(text) {
        Ok(blob) => Ok(apply(sim, &blob, now_ms)),
        Err(e) => {
            log::warn!("Import rejected: {e}");
            Err(e)
        }
    }
}

/// Write the game to `store`
pub fn save_to(store: &mut impl SaveStore, sim: &Simulator, now_ms: u64) -> Result<(), SaveError> {
    store.save(&serialize(sim, now_ms)?)?;
    log::info!(
        "Game saved ({} coins, {} destroyed bricks)",
        sim.economy().balance().format(2),
        sim.grid().destroyed_count()
    );
    Ok(())
}

/// Load from `store`, falling back to the backup when the current save is
/// missing or unreadable. `Ok(None)` means there is nothing to load.
pub fn load_from(
    store: &impl SaveStore,
    sim: &mut Simulator,
    now_ms: u64,
) -> Result<Option<LoadReport>, SaveError> {
    let blob = match store.load()? {
        Some(text) => match decode_text(&text) {
            Ok(blob) => blob,
            Err(err) => {
                log::warn!("Save rejected: {err}");
                let Some(backup) = store.load_backup()? else {
                    return Err(err);
                };
                let blob = decode_text(&backup).map_err(|_| err)?;
                log::info!("Recovered from backup save");
                blob
            }
        },
        None => {
            let Some(backup) = store.load_backup()? else {
                return Ok(None);
            };
            log::warn!("Save missing, loading backup");
            decode_text(&backup)?
        }
    };
    Ok(Some(apply(sim, &blob, now_ms)))
}
