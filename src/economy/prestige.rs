//! Prestige (ascension): trade the current run's money for permanent Dark Matter.
//!
//! Phases cycle `Fresh -> Eligible -> Prestiged -> Eligible -> ...`; there is no terminal state.
//! Each level raises the lifetime-money requirement by `scaling_factor`.

use log::info;
use serde::{Deserialize, Serialize};

use crate::config::PrestigeConfig;

use super::errors::GameError;
use super::ledger::{saturating_add, Earning, Ledger};
use super::modifiers::ModifierRegistry;
use super::progression::ProgressionState;
use super::types::{CurrencyKind, GameEvent};

/// Currencies that survive a prestige untouched.
pub const PRESTIGE_KEEPS: [CurrencyKind; 2] = [CurrencyKind::DarkMatter, CurrencyKind::TimeShards];

/// Permanent prestige bookkeeping.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PrestigeRecord {
    pub level: u32,
    pub total_dark_matter_earned: f64,
    pub has_ascended: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum PrestigePhase {
    /// Never prestiged and not yet eligible.
    Fresh,
    /// Lifetime money meets the current requirement.
    Eligible,
    /// Has prestiged at least once and is working toward the next requirement.
    Prestiged,
}

/// Outcome of a successful prestige.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PrestigeReceipt {
    pub dark_matter_awarded: f64,
    pub new_level: u32,
}

#[derive(Debug, Clone, PartialEq)]
pub struct PrestigeEngine {
    rules: PrestigeConfig,
    record: PrestigeRecord,
}

impl PrestigeEngine {
    pub fn new(rules: PrestigeConfig) -> Self {
        Self {
            rules,
            record: PrestigeRecord::default(),
        }
    }

    pub fn record(&self) -> PrestigeRecord {
        self.record
    }

    pub fn rules(&self) -> &PrestigeConfig {
        &self.rules
    }

    pub fn required_lifetime_money(&self) -> f64 {
        self.rules.base_requirement * self.rules.scaling_factor.powi(self.record.level as i32)
    }

    pub fn can_prestige(&self, ledger: &Ledger) -> bool {
        ledger.lifetime(CurrencyKind::Money) >= self.required_lifetime_money()
    }

    /// Dark Matter a prestige would award right now, after modifiers.
    ///
    /// `log10` of the overshoot ratio gives diminishing returns for stockpiling past the
    /// threshold.
    pub fn potential_reward(&self, ledger: &Ledger, modifiers: &ModifierRegistry) -> f64 {
        let required = self.required_lifetime_money();
        if required <= 0.0 {
            return 0.0;
        }
        let ratio = ledger.lifetime(CurrencyKind::Money) / required;
        let raw = (self.rules.dark_matter_per_prestige
            * (ratio + 1.0).log10()
            * 10.0
            * self.rules.level_scaling.powi(self.record.level as i32))
        .floor();
        modifiers.apply_dark_matter_modifiers(raw)
    }

    pub fn phase(&self, ledger: &Ledger) -> PrestigePhase {
        if self.can_prestige(ledger) {
            PrestigePhase::Eligible
        } else if self.record.has_ascended {
            PrestigePhase::Prestiged
        } else {
            PrestigePhase::Fresh
        }
    }

    /// Perform the soft reset. Nothing is mutated unless every precondition holds, and the
    /// caller publishes `events` only after this returns.
    pub fn execute(
        &mut self,
        ledger: &mut Ledger,
        progression: &mut ProgressionState,
        modifiers: &ModifierRegistry,
        events: &mut Vec<GameEvent>,
    ) -> Result<PrestigeReceipt, GameError> {
        if !self.can_prestige(ledger) {
            return Err(GameError::PrestigeIneligible {
                lifetime: ledger.lifetime(CurrencyKind::Money),
                required: self.required_lifetime_money(),
            });
        }
        let award = self.potential_reward(ledger, modifiers);
        if !award.is_finite() || award <= 0.0 {
            return Err(GameError::NoPrestigeReward);
        }

        ledger.add_currency(CurrencyKind::DarkMatter, award, Earning::Earned, events);
        self.record.level = self.record.level.saturating_add(1);
        self.record.total_dark_matter_earned =
            saturating_add(self.record.total_dark_matter_earned, award);
        ledger.reset_keeping_some(&PRESTIGE_KEEPS, events);
        progression.reset_for_prestige(events);
        self.record.has_ascended = true;
        events.push(GameEvent::PrestigeCompleted {
            new_level: self.record.level,
        });

        info!(
            "prestige complete: level {} awarded {} dark matter",
            self.record.level, award
        );
        Ok(PrestigeReceipt {
            dark_matter_awarded: award,
            new_level: self.record.level,
        })
    }

    /// Overwrite the record from a snapshot (load path).
    pub fn restore(&mut self, record: PrestigeRecord) {
        self.record = PrestigeRecord {
            level: record.level,
            total_dark_matter_earned: if record.total_dark_matter_earned.is_finite() {
                record.total_dark_matter_earned.max(0.0)
            } else {
                0.0
            },
            has_ascended: record.has_ascended || record.level > 0,
        };
    }
}
