//! Save schema migration.
//!
//! Saves are migrated as raw JSON documents, one version step at a time, before they are
//! decoded into the typed [`SaveSnapshot`](super::SaveSnapshot). The typed snapshot declares
//! every field with no serde defaults, so any field introduced by a later schema must be
//! filled in here.
//!
//! # Schema history
//!
//! - v1: money, dark matter, modifiers, dice and skill unlocks, prestige level and total
//! - v2: adds `timeShards` and `unlockedActiveSkills`
//! - v3: adds `diceValueUpgradeLevel` and `prestige.hasAscended`
//!
//! # Adding New Migrations
//!
//! 1. Increment [`CURRENT_SAVE_VERSION`]
//! 2. Add a `migrate_save_from_vN_to_vN1()` step and call it from [`migrate_to_current`]
//! 3. Add tests for the step

use log::info;
use serde_json::{json, Map, Value};

use crate::economy::errors::PersistenceError;

/// Schema version written by this build.
pub const CURRENT_SAVE_VERSION: u32 = 3;

/// Oldest schema this build can still read.
pub const OLDEST_SUPPORTED_VERSION: u32 = 1;

/// Read the `saveVersion` tag of a raw save document.
pub fn document_version(doc: &Value) -> Result<u32, PersistenceError> {
    doc.get("saveVersion")
        .and_then(Value::as_u64)
        .and_then(|v| u32::try_from(v).ok())
        .ok_or_else(|| PersistenceError::Corrupt("missing or invalid saveVersion".to_string()))
}

/// Bring a raw save document up to [`CURRENT_SAVE_VERSION`].
///
/// Returns the migrated document and the version it started at. Saves from a newer build are
/// refused rather than truncated.
pub fn migrate_to_current(mut doc: Value) -> Result<(Value, u32), PersistenceError> {
    let original = document_version(&doc)?;
    if original > CURRENT_SAVE_VERSION {
        return Err(PersistenceError::UnsupportedVersion {
            found: original,
            supported: CURRENT_SAVE_VERSION,
        });
    }
    if original < OLDEST_SUPPORTED_VERSION {
        return Err(PersistenceError::Corrupt(format!(
            "save version {} predates the oldest supported version {}",
            original, OLDEST_SUPPORTED_VERSION
        )));
    }
    if original == CURRENT_SAVE_VERSION {
        return Ok((doc, original));
    }

    info!(
        "Migrating save from schema v{} to v{}",
        original, CURRENT_SAVE_VERSION
    );

    let body = doc
        .as_object_mut()
        .ok_or_else(|| PersistenceError::Corrupt("save root is not an object".to_string()))?;

    if original < 2 {
        migrate_save_from_v1_to_v2(body);
    }
    if original < 3 {
        migrate_save_from_v2_to_v3(body, original)?;
    }

    body.insert("saveVersion".to_string(), json!(CURRENT_SAVE_VERSION));
    info!(
        "Successfully migrated save from v{} to v{}",
        original, CURRENT_SAVE_VERSION
    );
    Ok((doc, original))
}

/// v2 introduced Time Shards and active skills.
fn migrate_save_from_v1_to_v2(body: &mut Map<String, Value>) {
    body.entry("timeShards")
        .or_insert_with(|| json!({ "current": 0.0, "lifetime": 0.0 }));
    body.entry("unlockedActiveSkills")
        .or_insert_with(|| json!([]));
    body.insert("saveVersion".to_string(), json!(2));
}

/// v3 introduced the dice value upgrade level and the explicit ascension flag.
///
/// `hasAscended` is derived from the prestige level: any save with a level above zero has
/// prestiged at least once.
fn migrate_save_from_v2_to_v3(
    body: &mut Map<String, Value>,
    from: u32,
) -> Result<(), PersistenceError> {
    body.entry("diceValueUpgradeLevel")
        .or_insert_with(|| json!(0));

    let prestige = body
        .get_mut("prestige")
        .and_then(Value::as_object_mut)
        .ok_or_else(|| PersistenceError::Migration {
            from,
            reason: "prestige record missing".to_string(),
        })?;
    let level = prestige.get("level").and_then(Value::as_u64).unwrap_or(0);
    prestige
        .entry("hasAscended")
        .or_insert_with(|| json!(level > 0));

    body.insert("saveVersion".to_string(), json!(3));
    Ok(())
}
