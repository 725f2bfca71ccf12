//! Reading saves from any schema version
//!
//! Only `coins` and `prestigeLevel` are mandatory. Every other field, and
//! every entry of the keyed tables, falls back to its default on its own, so a
//! partial or older save loads instead of being rejected wholesale.

use std::collections::BTreeMap;

use glam::Vec2;
use serde::de::DeserializeOwned;
use serde_json::{Map, Value};

use super::envelope::SaveBlob;
use crate::bignum::BigNumber;
use crate::consts::SAVE_VERSION;
use crate::economy::UpgradeKind;
use crate::error::SaveError;
use crate::sim::BallKind;

/// Schema version assumed when a save carries none
const LEGACY_VERSION: u32 = 1;

type Object = Map<String, Value>;

impl SaveBlob {
    /// Parse and validate a JSON save, merging absent fields with defaults
    pub fn from_json(json: &str) -> Result<Self, SaveError> {
        let value: Value =
            serde_json::from_str(json).map_err(|e| SaveError::malformed(e.to_string()))?;
        let Value::Object(obj) = value else {
            return Err(SaveError::malformed("save is not a JSON object"));
        };

        let version = field(&obj, "version")?.unwrap_or(LEGACY_VERSION);
        if version > SAVE_VERSION {
            return Err(SaveError::incompatible(format!(
                "save version {version} is newer than supported {SAVE_VERSION}"
            )));
        }

        let coins: BigNumber = field(&obj, "coins")?
            .ok_or_else(|| SaveError::incompatible("missing field `coins`"))?;
        let prestige_level: u32 = field(&obj, "prestigeLevel")?
            .ok_or_else(|| SaveError::incompatible("missing field `prestigeLevel`"))?;

        let balls: Vec<String> = field(&obj, "balls")?.unwrap_or_default();
        let balls = balls
            .iter()
            .filter_map(|name| {
                let kind = BallKind::from_str(name);
                if kind.is_none() {
                    log::debug!("Skipping unknown ball type {name:?}");
                }
                kind
            })
            .collect();

        let blob = Self {
            version,
            coins,
            bricks_broken: field(&obj, "bricksBroken")?.unwrap_or(BigNumber::ZERO),
            total_bricks_broken: field(&obj, "totalBricksBroken")?.unwrap_or(BigNumber::ZERO),
            prestige_level,
            current_tier: field(&obj, "currentTier")?.unwrap_or(1),
            upgrades: keyed(&obj, "upgrades", UpgradeKind::from_str)?,
            upgrade_costs: keyed(&obj, "upgradeCosts", UpgradeKind::from_str)?,
            ball_costs: keyed(&obj, "ballCosts", BallKind::from_str)?,
            ball_purchases: keyed(&obj, "ballPurchases", BallKind::from_str)?,
            balls,
            destroyed_bricks: field(&obj, "destroyedBricks")?.unwrap_or_default(),
            camera: field(&obj, "camera")?.unwrap_or(Vec2::ZERO),
            timestamp: field(&obj, "timestamp")?.unwrap_or(0),
        };

        if version < SAVE_VERSION {
            log::info!("Migrated save from version {version} to {SAVE_VERSION}");
        }
        Ok(blob)
    }
}

/// Optional field; `null` counts as absent, a wrong type is malformed
fn field<T: DeserializeOwned>(obj: &Object, key: &str) -> Result<Option<T>, SaveError> {
    match obj.get(key) {
        None | Some(Value::Null) => Ok(None),
        Some(value) => serde_json::from_value(value.clone())
            .map(Some)
            .map_err(|e| SaveError::malformed(format!("field `{key}`: {e}"))),
    }
}

/// Keyed table (costs, levels). Unknown keys are ignored, missing ones stay
/// absent so the caller can fill them from defaults.
fn keyed<K: Ord, T: DeserializeOwned>(
    obj: &Object,
    key: &str,
    parse_key: impl Fn(&str) -> Option<K>,
) -> Result<BTreeMap<K, T>, SaveError> {
    let Some(table) = field::<Object>(obj, key)? else {
        return Ok(BTreeMap::new());
    };
    let mut out = BTreeMap::new();
    for (name, value) in &table {
        let Some(k) = parse_key(name) else {
            log::debug!("Ignoring unknown key {name:?} in `{key}`");
            continue;
        };
        if value.is_null() {
            continue;
        }
        let v = serde_json::from_value(value.clone())
            .map_err(|e| SaveError::malformed(format!("field `{key}.{name}`: {e}")))?;
        out.insert(k, v);
    }
    Ok(out)
}
