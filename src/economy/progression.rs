//! Unlocks, owned dice and the shop cost curve.
//!
//! Unlock sets only ever grow; they are permanent meta-progression and survive prestige.
//! Owned counts and the dice value upgrade level are the resettable part of a run.

use std::collections::{BTreeMap, BTreeSet};

use crate::config::DiceSpec;

use super::errors::GameError;
use super::types::{ActiveSkillId, DiceTypeId, GameEvent, SkillNodeId};

/// Static per-type dice data, keyed by id.
#[derive(Debug, Clone, Default)]
pub struct DiceCatalog {
    specs: BTreeMap<DiceTypeId, DiceSpec>,
}

impl DiceCatalog {
    pub fn new(specs: impl IntoIterator<Item = DiceSpec>) -> Self {
        Self {
            specs: specs
                .into_iter()
                .map(|spec| (DiceTypeId::new(spec.id.clone()), spec))
                .collect(),
        }
    }

    pub fn get(&self, id: &DiceTypeId) -> Option<&DiceSpec> {
        self.specs.get(id)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&DiceTypeId, &DiceSpec)> {
        self.specs.iter()
    }
}

/// Plain values restored from a snapshot.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ProgressionValues {
    pub unlocked_dice_types: BTreeSet<DiceTypeId>,
    pub owned_counts: BTreeMap<DiceTypeId, u32>,
    pub unlocked_skill_nodes: BTreeSet<SkillNodeId>,
    pub unlocked_active_skills: BTreeSet<ActiveSkillId>,
    pub dice_value_upgrade_level: u32,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ProgressionState {
    unlocked_dice_types: BTreeSet<DiceTypeId>,
    owned_counts: BTreeMap<DiceTypeId, u32>,
    unlocked_skill_nodes: BTreeSet<SkillNodeId>,
    unlocked_active_skills: BTreeSet<ActiveSkillId>,
    dice_value_upgrade_level: u32,
}

/// Dice on the table at the start of every run, fresh or after prestige.
fn starting_dice() -> BTreeMap<DiceTypeId, u32> {
    BTreeMap::from([(DiceTypeId::basic(), 1)])
}

impl Default for ProgressionState {
    fn default() -> Self {
        Self {
            unlocked_dice_types: BTreeSet::from([DiceTypeId::basic()]),
            owned_counts: starting_dice(),
            unlocked_skill_nodes: BTreeSet::new(),
            unlocked_active_skills: BTreeSet::new(),
            dice_value_upgrade_level: 0,
        }
    }
}

impl ProgressionState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_dice_unlocked(&self, id: &DiceTypeId) -> bool {
        self.unlocked_dice_types.contains(id)
    }

    pub fn unlocked_dice_types(&self) -> &BTreeSet<DiceTypeId> {
        &self.unlocked_dice_types
    }

    pub fn unlocked_skill_nodes(&self) -> &BTreeSet<SkillNodeId> {
        &self.unlocked_skill_nodes
    }

    pub fn unlocked_active_skills(&self) -> &BTreeSet<ActiveSkillId> {
        &self.unlocked_active_skills
    }

    pub fn owned_counts(&self) -> &BTreeMap<DiceTypeId, u32> {
        &self.owned_counts
    }

    pub fn owned(&self, id: &DiceTypeId) -> u32 {
        self.owned_counts.get(id).copied().unwrap_or(0)
    }

    pub fn dice_value_upgrade_level(&self) -> u32 {
        self.dice_value_upgrade_level
    }

    pub fn unlock_dice_type(&mut self, id: DiceTypeId, events: &mut Vec<GameEvent>) -> bool {
        let inserted = self.unlocked_dice_types.insert(id.clone());
        if inserted {
            events.push(GameEvent::DiceTypeUnlocked(id));
        }
        inserted
    }

    pub fn unlock_skill_node(&mut self, id: SkillNodeId, events: &mut Vec<GameEvent>) -> bool {
        let inserted = self.unlocked_skill_nodes.insert(id.clone());
        if inserted {
            events.push(GameEvent::SkillNodeUnlocked(id));
        }
        inserted
    }

    pub fn unlock_active_skill(&mut self, id: ActiveSkillId, events: &mut Vec<GameEvent>) -> bool {
        let inserted = self.unlocked_active_skills.insert(id.clone());
        if inserted {
            events.push(GameEvent::ActiveSkillUnlocked(id));
        }
        inserted
    }

    /// Count one more owned die of `id`. The type must already be unlocked.
    pub fn record_purchase(
        &mut self,
        id: &DiceTypeId,
        events: &mut Vec<GameEvent>,
    ) -> Result<u32, GameError> {
        if !self.is_dice_unlocked(id) {
            return Err(GameError::Locked(id.clone()));
        }
        let count = self.owned_counts.entry(id.clone()).or_insert(0);
        *count = count.saturating_add(1);
        let owned = *count;
        events.push(GameEvent::DiceCountChanged {
            id: id.clone(),
            owned,
        });
        Ok(owned)
    }

    /// Drop one owned die of `id` (e.g. lost to a hazard). Floors at zero.
    pub fn record_removal(&mut self, id: &DiceTypeId, events: &mut Vec<GameEvent>) -> u32 {
        match self.owned_counts.get_mut(id) {
            Some(count) if *count > 0 => {
                *count -= 1;
                let owned = *count;
                events.push(GameEvent::DiceCountChanged {
                    id: id.clone(),
                    owned,
                });
                owned
            }
            _ => 0,
        }
    }

    /// `base_price * growth_rate ^ owned`.
    pub fn current_price(&self, id: &DiceTypeId, catalog: &DiceCatalog) -> Result<f64, GameError> {
        let spec = catalog
            .get(id)
            .ok_or_else(|| GameError::UnknownDiceType(id.clone()))?;
        Ok(spec.base_price * spec.growth_rate.powi(self.owned(id) as i32))
    }

    pub fn increment_value_upgrade(&mut self, events: &mut Vec<GameEvent>) -> u32 {
        self.dice_value_upgrade_level = self.dice_value_upgrade_level.saturating_add(1);
        events.push(GameEvent::ValueUpgradeChanged {
            level: self.dice_value_upgrade_level,
        });
        self.dice_value_upgrade_level
    }

    /// Start a new run: one Basic die, no value upgrades. Unlocks are untouched.
    pub fn reset_for_prestige(&mut self, events: &mut Vec<GameEvent>) {
        let previous = std::mem::replace(&mut self.owned_counts, starting_dice());
        for (id, _) in previous.into_iter().filter(|(id, _)| !id.is_basic()) {
            events.push(GameEvent::DiceCountChanged { id, owned: 0 });
        }
        events.push(GameEvent::DiceCountChanged {
            id: DiceTypeId::basic(),
            owned: 1,
        });
        self.dice_value_upgrade_level = 0;
        events.push(GameEvent::ValueUpgradeChanged { level: 0 });
    }

    /// Overwrite from persisted values, emitting unlock and count events for subscribers.
    pub fn restore(&mut self, values: ProgressionValues, events: &mut Vec<GameEvent>) {
        *self = Self::default();
        self.owned_counts.clear();
        for id in values.unlocked_dice_types {
            self.unlock_dice_type(id, events);
        }
        for id in values.unlocked_skill_nodes {
            self.unlock_skill_node(id, events);
        }
        for id in values.unlocked_active_skills {
            self.unlock_active_skill(id, events);
        }
        for (id, owned) in values.owned_counts {
            events.push(GameEvent::DiceCountChanged {
                id: id.clone(),
                owned,
            });
            self.owned_counts.insert(id, owned);
        }
        self.dice_value_upgrade_level = values.dice_value_upgrade_level;
        events.push(GameEvent::ValueUpgradeChanged {
            level: self.dice_value_upgrade_level,
        });
    }

    pub fn values(&self) -> ProgressionValues {
        ProgressionValues {
            unlocked_dice_types: self.unlocked_dice_types.clone(),
            owned_counts: self.owned_counts.clone(),
            unlocked_skill_nodes: self.unlocked_skill_nodes.clone(),
            unlocked_active_skills: self.unlocked_active_skills.clone(),
            dice_value_upgrade_level: self.dice_value_upgrade_level,
        }
    }
}
