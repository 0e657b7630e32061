//! Shared identifiers and event types for the progression engine.

use serde::{Deserialize, Serialize};
use std::fmt;

/// The three currencies tracked by the [`Ledger`](super::ledger::Ledger).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum CurrencyKind {
    Money,
    DarkMatter,
    TimeShards,
}

impl CurrencyKind {
    pub const ALL: [CurrencyKind; 3] = [
        CurrencyKind::Money,
        CurrencyKind::DarkMatter,
        CurrencyKind::TimeShards,
    ];

    pub fn label(self) -> &'static str {
        match self {
            CurrencyKind::Money => "money",
            CurrencyKind::DarkMatter => "dark matter",
            CurrencyKind::TimeShards => "time shards",
        }
    }
}

impl fmt::Display for CurrencyKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

macro_rules! string_id {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
        #[serde(transparent)]
        pub struct $name(String);

        impl $name {
            pub fn new(id: impl Into<String>) -> Self {
                Self(id.into())
            }

            pub fn as_str(&self) -> &str {
                &self.0
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(&self.0)
            }
        }

        impl From<&str> for $name {
            fn from(s: &str) -> Self {
                Self(s.to_string())
            }
        }

        impl From<String> for $name {
            fn from(s: String) -> Self {
                Self(s)
            }
        }
    };
}

string_id!(
    /// Identifier of a dice type from the static dice catalog.
    DiceTypeId
);
string_id!(
    /// Identifier of a permanent skill-tree node.
    SkillNodeId
);
string_id!(
    /// Identifier of an unlockable active skill.
    ActiveSkillId
);

/// Id of the starter die. Always unlocked, always owned at least once after a prestige.
pub const BASIC_DICE_ID: &str = "basic";

impl DiceTypeId {
    pub fn basic() -> Self {
        Self::new(BASIC_DICE_ID)
    }

    pub fn is_basic(&self) -> bool {
        self.0 == BASIC_DICE_ID
    }
}

/// Notifications published to external collaborators (UI, audio, analytics).
///
/// Currency variants carry the [`CurrencyKind`] so Money, Dark Matter and Time Shards
/// share the same shape: `CurrencyChanged { kind: Money, .. }` is the money-changed event.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum GameEvent {
    CurrencyChanged { kind: CurrencyKind, current: f64 },
    LifetimeChanged { kind: CurrencyKind, lifetime: f64 },
    DiceTypeUnlocked(DiceTypeId),
    SkillNodeUnlocked(SkillNodeId),
    ActiveSkillUnlocked(ActiveSkillId),
    DiceCountChanged { id: DiceTypeId, owned: u32 },
    ValueUpgradeChanged { level: u32 },
    PrestigeCompleted { new_level: u32 },
    PotentialPrestigeRewardChanged { amount: f64 },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ids_serialize_as_plain_strings() {
        let id = DiceTypeId::new("gold");
        assert_eq!(serde_json::to_string(&id).unwrap(), "\"gold\"");
        let back: DiceTypeId = serde_json::from_str("\"gold\"").unwrap();
        assert_eq!(back, id);
    }

    #[test]
    fn basic_id_is_recognized() {
        assert!(DiceTypeId::basic().is_basic());
        assert!(!DiceTypeId::from("silver").is_basic());
    }
}
