//! The on-disk save document.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::economy::engine::EngineState;
use crate::economy::ledger::{Balance, LedgerValues};
use crate::economy::modifiers::{ModifierRegistry, ModifierValue};
use crate::economy::prestige::PrestigeRecord;
use crate::economy::progression::ProgressionValues;
use crate::economy::types::{ActiveSkillId, DiceTypeId, SkillNodeId};

use super::migration::CURRENT_SAVE_VERSION;

/// Versioned, self-describing record of everything the engine persists.
///
/// Every field is required: documents from older schemas are brought up to date by
/// [`migration`](super::migration) before they are decoded into this type.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct SaveSnapshot {
    pub save_version: u32,
    pub timestamp: DateTime<Utc>,
    pub money: Balance,
    pub dark_matter: Balance,
    pub time_shards: Balance,
    pub modifiers: BTreeMap<String, ModifierValue>,
    pub unlocked_dice_types: Vec<DiceTypeId>,
    pub owned_counts: BTreeMap<DiceTypeId, u32>,
    pub unlocked_skill_nodes: Vec<SkillNodeId>,
    pub unlocked_active_skills: Vec<ActiveSkillId>,
    pub dice_value_upgrade_level: u32,
    pub prestige: PrestigeRecord,
}

impl SaveSnapshot {
    /// Build a current-version snapshot from captured engine values.
    pub fn from_state(state: &EngineState, timestamp: DateTime<Utc>) -> Self {
        let progression = &state.progression;
        Self {
            save_version: CURRENT_SAVE_VERSION,
            timestamp,
            money: state.ledger.money,
            dark_matter: state.ledger.dark_matter,
            time_shards: state.ledger.time_shards,
            modifiers: state.modifiers.to_map(),
            unlocked_dice_types: progression.unlocked_dice_types.iter().cloned().collect(),
            owned_counts: progression.owned_counts.clone(),
            unlocked_skill_nodes: progression.unlocked_skill_nodes.iter().cloned().collect(),
            unlocked_active_skills: progression.unlocked_active_skills.iter().cloned().collect(),
            dice_value_upgrade_level: progression.dice_value_upgrade_level,
            prestige: state.prestige,
        }
    }

    /// Convert back into engine values. Unknown modifier names are dropped.
    pub fn into_state(self) -> EngineState {
        EngineState {
            ledger: LedgerValues {
                money: self.money,
                dark_matter: self.dark_matter,
                time_shards: self.time_shards,
            },
            modifiers: ModifierRegistry::from_map(&self.modifiers),
            progression: ProgressionValues {
                unlocked_dice_types: self.unlocked_dice_types.into_iter().collect(),
                owned_counts: self.owned_counts,
                unlocked_skill_nodes: self.unlocked_skill_nodes.into_iter().collect(),
                unlocked_active_skills: self.unlocked_active_skills.into_iter().collect(),
                dice_value_upgrade_level: self.dice_value_upgrade_level,
            },
            prestige: self.prestige,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Config;
    use crate::economy::engine::GameEngine;
    use crate::economy::ledger::Earning;
    use crate::economy::modifiers::NumericKnob;
    use crate::economy::types::CurrencyKind;

    #[test]
    fn snapshot_uses_camel_case_field_names() {
        let engine = GameEngine::with_seed(&Config::default(), 1);
        let snapshot = SaveSnapshot::from_state(&engine.state(), Utc::now());
        let value = serde_json::to_value(&snapshot).unwrap();
        for key in [
            "saveVersion",
            "darkMatter",
            "timeShards",
            "unlockedDiceTypes",
            "ownedCounts",
            "unlockedSkillNodes",
            "unlockedActiveSkills",
            "diceValueUpgradeLevel",
        ] {
            assert!(value.get(key).is_some(), "missing {key}");
        }
        assert_eq!(value["prestige"]["hasAscended"], serde_json::json!(false));
        assert_eq!(value["saveVersion"], serde_json::json!(CURRENT_SAVE_VERSION));
    }

    #[test]
    fn state_survives_snapshot_conversion() {
        let mut engine = GameEngine::with_seed(&Config::default(), 1);
        engine.add_currency(CurrencyKind::Money, 1234.5, Earning::Earned);
        engine.add_currency(CurrencyKind::TimeShards, 3.0, Earning::Earned);
        engine.update_modifiers(|m| m.set(NumericKnob::JackpotChance, 0.25));
        engine.unlock_dice_type(DiceTypeId::from("silver"));

        let state = engine.state();
        let snapshot = SaveSnapshot::from_state(&state, Utc::now());
        assert_eq!(snapshot.into_state(), state);
    }

    #[test]
    fn unknown_top_level_fields_are_rejected() {
        let engine = GameEngine::with_seed(&Config::default(), 1);
        let mut value =
            serde_json::to_value(SaveSnapshot::from_state(&engine.state(), Utc::now())).unwrap();
        value["surprise"] = serde_json::json!(1);
        assert!(serde_json::from_value::<SaveSnapshot>(value).is_err());
    }
}
