use thiserror::Error;

use super::types::{CurrencyKind, DiceTypeId};

/// Expected-negative gameplay outcomes.
///
/// These are ordinary results of player input (not enough money, not eligible yet) and
/// are never logged as errors.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum GameError {
    /// The dice type exists but has not been unlocked by the skill tree yet.
    #[error("dice type not unlocked: {0}")]
    Locked(DiceTypeId),

    /// The dice type is not part of the configured catalog.
    #[error("unknown dice type: {0}")]
    UnknownDiceType(DiceTypeId),

    #[error("insufficient {kind}: need {needed}, have {available}")]
    InsufficientFunds {
        kind: CurrencyKind,
        needed: f64,
        available: f64,
    },

    #[error("prestige requires {required} lifetime money, have {lifetime}")]
    PrestigeIneligible { lifetime: f64, required: f64 },

    /// Eligible by threshold, but the computed reward rounds down to nothing.
    #[error("prestige reward would be zero")]
    NoPrestigeReward,
}

/// Errors raised by the save/load boundary.
#[derive(Debug, Error)]
pub enum PersistenceError {
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    #[error("serialization error: {0}")]
    Json(#[from] serde_json::Error),

    /// The save exists but could not be decoded into a snapshot.
    #[error("corrupt save data: {0}")]
    Corrupt(String),

    /// The save was written by a newer build than this one understands.
    #[error("save version {found} is newer than supported version {supported}")]
    UnsupportedVersion { found: u32, supported: u32 },

    #[error("migration from v{from} failed: {reason}")]
    Migration { from: u32, reason: String },
}
