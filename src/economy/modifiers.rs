//! Stat knobs driven by the skill tree and upgrades, and the reward pipeline that reads them.
//!
//! The registry is written only by the upgrade subsystem through the clamped setters and is
//! read-only to the reward pipeline. Knobs survive prestige; [`ModifierRegistry::reset_to_defaults`]
//! is reserved for a brand-new game.

use log::warn;
use rand::Rng;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::time::Duration;

/// Shortest cooldown the cooldown knobs can produce.
pub const MIN_COOLDOWN: Duration = Duration::from_millis(100);

/// Numeric knobs. Multipliers default to 1.0, additive knobs and probabilities to 0.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum NumericKnob {
    GlobalMoneyMultiplier,
    ManualMoneyMultiplier,
    IdleMoneyMultiplier,
    JackpotChance,
    JackpotMultiplier,
    DarkMatterGainMultiplier,
    /// Scales the delay between manual rolls; read through [`ModifierRegistry::roll_cooldown`].
    RollCooldownMultiplier,
    /// Scales the idle tick period; read through [`ModifierRegistry::idle_cooldown`].
    IdleCooldownMultiplier,
    DarkMatterPerRoll,
}

/// Boolean knobs, all `false` by default.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum FlagKnob {
    TimeDilationActive,
    AutoRollEnabled,
}

impl NumericKnob {
    pub const ALL: [NumericKnob; 9] = [
        NumericKnob::GlobalMoneyMultiplier,
        NumericKnob::ManualMoneyMultiplier,
        NumericKnob::IdleMoneyMultiplier,
        NumericKnob::JackpotChance,
        NumericKnob::JackpotMultiplier,
        NumericKnob::DarkMatterGainMultiplier,
        NumericKnob::RollCooldownMultiplier,
        NumericKnob::IdleCooldownMultiplier,
        NumericKnob::DarkMatterPerRoll,
    ];

    /// Stable name used in save files.
    pub fn name(self) -> &'static str {
        match self {
            NumericKnob::GlobalMoneyMultiplier => "globalMoneyMultiplier",
            NumericKnob::ManualMoneyMultiplier => "manualMoneyMultiplier",
            NumericKnob::IdleMoneyMultiplier => "idleMoneyMultiplier",
            NumericKnob::JackpotChance => "jackpotChance",
            NumericKnob::JackpotMultiplier => "jackpotMultiplier",
            NumericKnob::DarkMatterGainMultiplier => "darkMatterGainMultiplier",
            NumericKnob::RollCooldownMultiplier => "rollCooldownMultiplier",
            NumericKnob::IdleCooldownMultiplier => "idleCooldownMultiplier",
            NumericKnob::DarkMatterPerRoll => "darkMatterPerRoll",
        }
    }

    pub fn default_value(self) -> f64 {
        match self {
            NumericKnob::JackpotChance | NumericKnob::DarkMatterPerRoll => 0.0,
            _ => 1.0,
        }
    }

    fn clamp(self, value: f64) -> f64 {
        match self {
            NumericKnob::JackpotChance => value.clamp(0.0, 1.0),
            _ => value.max(0.0),
        }
    }

    pub fn from_name(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|k| k.name() == name)
    }
}

impl FlagKnob {
    pub const ALL: [FlagKnob; 2] = [FlagKnob::TimeDilationActive, FlagKnob::AutoRollEnabled];

    pub fn name(self) -> &'static str {
        match self {
            FlagKnob::TimeDilationActive => "timeDilationActive",
            FlagKnob::AutoRollEnabled => "autoRollEnabled",
        }
    }

    pub fn from_name(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|k| k.name() == name)
    }
}

/// A knob value as it appears in a save file.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ModifierValue {
    Flag(bool),
    Number(f64),
}

/// Result of the money pipeline.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MoneyRoll {
    pub amount: f64,
    pub jackpot: bool,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ModifierRegistry {
    numbers: BTreeMap<NumericKnob, f64>,
    flags: BTreeMap<FlagKnob, bool>,
}

impl Default for ModifierRegistry {
    fn default() -> Self {
        Self {
            numbers: NumericKnob::ALL
                .into_iter()
                .map(|k| (k, k.default_value()))
                .collect(),
            flags: FlagKnob::ALL.into_iter().map(|k| (k, false)).collect(),
        }
    }
}

impl ModifierRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, knob: NumericKnob) -> f64 {
        self.numbers
            .get(&knob)
            .copied()
            .unwrap_or_else(|| knob.default_value())
    }

    pub fn flag(&self, knob: FlagKnob) -> bool {
        self.flags.get(&knob).copied().unwrap_or(false)
    }

    /// Clamped assignment. Non-finite input is ignored and the previous value kept.
    pub fn set(&mut self, knob: NumericKnob, value: f64) {
        if !value.is_finite() {
            warn!("ignoring non-finite value for modifier {}", knob.name());
            return;
        }
        self.numbers.insert(knob, knob.clamp(value));
    }

    pub fn set_flag(&mut self, knob: FlagKnob, value: bool) {
        self.flags.insert(knob, value);
    }

    pub fn reset_to_defaults(&mut self) {
        *self = Self::default();
    }

    /// Money pipeline. The order is fixed: global, then manual or idle, then a single jackpot draw
    /// applied to the fully modified amount. Call once per reward.
    pub fn apply_money_modifiers<R: Rng>(
        &self,
        base: f64,
        is_manual: bool,
        is_idle: bool,
        rng: &mut R,
    ) -> MoneyRoll {
        let mut amount = base * self.get(NumericKnob::GlobalMoneyMultiplier);
        // Idle income never receives the manual bonus, even when both flags are set.
        if is_manual && !is_idle {
            amount *= self.get(NumericKnob::ManualMoneyMultiplier);
        }
        if is_idle {
            amount *= self.get(NumericKnob::IdleMoneyMultiplier);
        }
        let draw: f64 = rng.gen();
        let jackpot = draw < self.get(NumericKnob::JackpotChance);
        if jackpot {
            amount *= self.get(NumericKnob::JackpotMultiplier);
        }
        MoneyRoll { amount, jackpot }
    }

    pub fn apply_dark_matter_modifiers(&self, base: f64) -> f64 {
        let mut amount = base * self.get(NumericKnob::DarkMatterGainMultiplier);
        if self.flag(FlagKnob::TimeDilationActive) {
            amount *= 2.0;
        }
        amount
    }

    /// Delay a host should enforce between manual rolls.
    pub fn roll_cooldown(&self, base: Duration) -> Duration {
        scale_cooldown(base, self.get(NumericKnob::RollCooldownMultiplier))
    }

    /// Period of the idle roll loop.
    pub fn idle_cooldown(&self, base: Duration) -> Duration {
        scale_cooldown(base, self.get(NumericKnob::IdleCooldownMultiplier))
    }

    /// Flatten into the save-file representation.
    pub fn to_map(&self) -> BTreeMap<String, ModifierValue> {
        let mut map = BTreeMap::new();
        for knob in NumericKnob::ALL {
            map.insert(knob.name().to_string(), ModifierValue::Number(self.get(knob)));
        }
        for knob in FlagKnob::ALL {
            map.insert(knob.name().to_string(), ModifierValue::Flag(self.flag(knob)));
        }
        map
    }

    /// Rebuild from a save-file map. Missing knobs take their defaults; unknown names and
    /// type mismatches are skipped with a warning.
    pub fn from_map(map: &BTreeMap<String, ModifierValue>) -> Self {
        let mut registry = Self::default();
        for (name, value) in map {
            match (NumericKnob::from_name(name), FlagKnob::from_name(name), value) {
                (Some(knob), _, ModifierValue::Number(v)) => registry.set(knob, *v),
                (_, Some(knob), ModifierValue::Flag(b)) => registry.set_flag(knob, *b),
                (None, None, _) => warn!("ignoring unknown modifier '{}' in save", name),
                _ => warn!("ignoring modifier '{}' with mismatched type", name),
            }
        }
        registry
    }
}

fn scale_cooldown(base: Duration, multiplier: f64) -> Duration {
    Duration::try_from_secs_f64(base.as_secs_f64() * multiplier)
        .unwrap_or(base)
        .max(MIN_COOLDOWN)
}
