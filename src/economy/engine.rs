//! The game core: one owner for Ledger, ModifierRegistry, ProgressionState and PrestigeEngine.
//!
//! Every mutating entry point follows the same shape: validate, mutate, collect events into a
//! local buffer, then publish the buffer in one go. Subscribers therefore never observe a
//! half-applied operation. Serializing callers across threads is the job of
//! [`GameHandle`](crate::handle::GameHandle).

use log::debug;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use crate::config::{Config, EconomyConfig};

use super::errors::GameError;
use super::events::EventBus;
use super::ledger::{saturating_add, Earning, Ledger, LedgerValues};
use super::modifiers::{ModifierRegistry, NumericKnob};
use super::prestige::{PrestigeEngine, PrestigePhase, PrestigeReceipt, PrestigeRecord};
use super::progression::{DiceCatalog, ProgressionState, ProgressionValues};
use super::types::{ActiveSkillId, CurrencyKind, DiceTypeId, GameEvent, SkillNodeId};

/// Money and Dark Matter credited by one roll.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct RollReward {
    pub money: f64,
    pub dark_matter: f64,
    pub jackpot: bool,
}

impl RollReward {
    fn accumulate(&mut self, other: RollReward) {
        self.money = saturating_add(self.money, other.money);
        self.dark_matter = saturating_add(self.dark_matter, other.dark_matter);
        self.jackpot |= other.jackpot;
    }
}

/// A completed dice purchase.
#[derive(Debug, Clone, PartialEq)]
pub struct Purchase {
    pub id: DiceTypeId,
    pub price: f64,
    pub owned: u32,
}

/// Read model for status displays.
#[derive(Debug, Clone, PartialEq)]
pub struct GameStatus {
    pub money: f64,
    pub lifetime_money: f64,
    pub dark_matter: f64,
    pub time_shards: f64,
    pub prestige: PrestigeRecord,
    pub phase: PrestigePhase,
    pub required_lifetime_money: f64,
    pub potential_reward: f64,
    pub owned_dice: Vec<(DiceTypeId, u32)>,
    pub dice_value_upgrade_level: u32,
}

/// Every component's plain values, as captured for persistence.
#[derive(Debug, Clone, PartialEq)]
pub struct EngineState {
    pub ledger: LedgerValues,
    pub modifiers: ModifierRegistry,
    pub progression: ProgressionValues,
    pub prestige: PrestigeRecord,
}

pub struct GameEngine {
    ledger: Ledger,
    modifiers: ModifierRegistry,
    progression: ProgressionState,
    prestige: PrestigeEngine,
    catalog: DiceCatalog,
    economy: EconomyConfig,
    rng: StdRng,
    bus: EventBus,
    last_potential_reward: Option<f64>,
}

impl GameEngine {
    /// Fresh game with defaults everywhere.
    pub fn new(config: &Config) -> Self {
        Self::with_rng(config, StdRng::from_entropy())
    }

    /// Deterministic engine for tests and simulations.
    pub fn with_seed(config: &Config, seed: u64) -> Self {
        Self::with_rng(config, StdRng::seed_from_u64(seed))
    }

    fn with_rng(config: &Config, rng: StdRng) -> Self {
        Self {
            ledger: Ledger::new(),
            modifiers: ModifierRegistry::new(),
            progression: ProgressionState::new(),
            prestige: PrestigeEngine::new(config.prestige.clone()),
            catalog: DiceCatalog::new(config.dice.clone()),
            economy: config.economy.clone(),
            rng,
            bus: EventBus::new(),
            last_potential_reward: None,
        }
    }

    pub fn ledger(&self) -> &Ledger {
        &self.ledger
    }

    pub fn modifiers(&self) -> &ModifierRegistry {
        &self.modifiers
    }

    pub fn progression(&self) -> &ProgressionState {
        &self.progression
    }

    pub fn prestige(&self) -> &PrestigeEngine {
        &self.prestige
    }

    pub fn catalog(&self) -> &DiceCatalog {
        &self.catalog
    }

    pub fn events(&mut self) -> &mut EventBus {
        &mut self.bus
    }

    /// Publish a finished operation's events, plus a reward-changed event if the potential
    /// prestige reward moved.
    fn commit(&mut self, mut events: Vec<GameEvent>) {
        let potential = self.prestige.potential_reward(&self.ledger, &self.modifiers);
        if self.last_potential_reward != Some(potential) {
            self.last_potential_reward = Some(potential);
            events.push(GameEvent::PotentialPrestigeRewardChanged { amount: potential });
        }
        self.bus.publish_all(events);
    }

    // ------------------------------------------------------------------
    // Ledger entry points
    // ------------------------------------------------------------------

    pub fn add_currency(&mut self, kind: CurrencyKind, amount: f64, earning: Earning) -> bool {
        let mut events = Vec::new();
        let changed = self.ledger.add_currency(kind, amount, earning, &mut events);
        self.commit(events);
        changed
    }

    pub fn try_spend(&mut self, kind: CurrencyKind, amount: f64) -> bool {
        let mut events = Vec::new();
        let spent = self.ledger.try_spend(kind, amount, &mut events);
        if !spent {
            debug!("spend of {} {} rejected", amount, kind);
        }
        self.commit(events);
        spent
    }

    pub fn can_afford(&self, kind: CurrencyKind, amount: f64) -> bool {
        self.ledger.can_afford(kind, amount)
    }

    // ------------------------------------------------------------------
    // Rolling
    // ------------------------------------------------------------------

    /// Payout multiplier from dice value upgrades.
    pub fn value_factor(&self) -> f64 {
        1.0 + self.progression.dice_value_upgrade_level() as f64 * self.economy.value_upgrade_bonus
    }

    /// Turn one rolled face into rewards and credit them as earned income.
    pub fn roll(
        &mut self,
        base_face_value: f64,
        tier_multiplier: f64,
        is_manual: bool,
        is_idle: bool,
    ) -> RollReward {
        let mut events = Vec::new();
        let reward = self.roll_inner(base_face_value, tier_multiplier, is_manual, is_idle, &mut events);
        self.commit(events);
        reward
    }

    fn roll_inner(
        &mut self,
        base_face_value: f64,
        tier_multiplier: f64,
        is_manual: bool,
        is_idle: bool,
        events: &mut Vec<GameEvent>,
    ) -> RollReward {
        let base = base_face_value * tier_multiplier * self.value_factor();
        let money = self
            .modifiers
            .apply_money_modifiers(base, is_manual, is_idle, &mut self.rng);
        let dark_matter = self.modifiers.apply_dark_matter_modifiers(
            base_face_value * self.modifiers.get(NumericKnob::DarkMatterPerRoll),
        );
        self.ledger
            .add_currency(CurrencyKind::Money, money.amount, Earning::Earned, events);
        self.ledger
            .add_currency(CurrencyKind::DarkMatter, dark_matter, Earning::Earned, events);
        RollReward {
            money: money.amount.max(0.0),
            dark_matter: dark_matter.max(0.0),
            jackpot: money.jackpot,
        }
    }

    /// Roll every owned die once. Idle rolls come from automation, manual from the player.
    pub fn roll_owned_dice(&mut self, is_idle: bool) -> RollReward {
        let dice: Vec<(u32, f64, u32)> = self
            .progression
            .owned_counts()
            .iter()
            .filter_map(|(id, &owned)| {
                self.catalog
                    .get(id)
                    .map(|spec| (spec.faces, spec.tier_multiplier, owned))
            })
            .collect();

        let mut events = Vec::new();
        let mut total = RollReward::default();
        for (faces, tier_multiplier, owned) in dice {
            for _ in 0..owned {
                let face = self.rng.gen_range(1..=faces.max(1)) as f64;
                let reward = self.roll_inner(face, tier_multiplier, !is_idle, is_idle, &mut events);
                total.accumulate(reward);
            }
        }
        self.commit(events);
        total
    }

    // ------------------------------------------------------------------
    // Shop
    // ------------------------------------------------------------------

    pub fn current_price(&self, id: &DiceTypeId) -> Result<f64, GameError> {
        self.progression.current_price(id, &self.catalog)
    }

    /// Buy one die of `id` at its current price.
    pub fn try_buy_dice_type(&mut self, id: &DiceTypeId) -> Result<Purchase, GameError> {
        let price = self.current_price(id)?;
        if !self.progression.is_dice_unlocked(id) {
            return Err(GameError::Locked(id.clone()));
        }
        let mut events = Vec::new();
        if !self.ledger.try_spend(CurrencyKind::Money, price, &mut events) {
            return Err(GameError::InsufficientFunds {
                kind: CurrencyKind::Money,
                needed: price,
                available: self.ledger.current(CurrencyKind::Money),
            });
        }
        let owned = self.progression.record_purchase(id, &mut events)?;
        self.commit(events);
        Ok(Purchase {
            id: id.clone(),
            price,
            owned,
        })
    }

    pub fn value_upgrade_price(&self) -> f64 {
        self.economy.value_upgrade_base_cost
            * self
                .economy
                .value_upgrade_growth
                .powi(self.progression.dice_value_upgrade_level() as i32)
    }

    /// Buy the next dice value upgrade level. Returns the new level.
    pub fn try_buy_value_upgrade(&mut self) -> Result<u32, GameError> {
        let price = self.value_upgrade_price();
        let mut events = Vec::new();
        if !self.ledger.try_spend(CurrencyKind::Money, price, &mut events) {
            return Err(GameError::InsufficientFunds {
                kind: CurrencyKind::Money,
                needed: price,
                available: self.ledger.current(CurrencyKind::Money),
            });
        }
        let level = self.progression.increment_value_upgrade(&mut events);
        self.commit(events);
        Ok(level)
    }

    /// A die was destroyed by external gameplay. Returns the remaining count.
    pub fn remove_dice(&mut self, id: &DiceTypeId) -> u32 {
        let mut events = Vec::new();
        let owned = self.progression.record_removal(id, &mut events);
        self.commit(events);
        owned
    }

    // ------------------------------------------------------------------
    // Skill tree
    // ------------------------------------------------------------------

    pub fn unlock_dice_type(&mut self, id: DiceTypeId) -> bool {
        let mut events = Vec::new();
        let inserted = self.progression.unlock_dice_type(id, &mut events);
        self.commit(events);
        inserted
    }

    pub fn unlock_skill_node(&mut self, id: SkillNodeId) -> bool {
        let mut events = Vec::new();
        let inserted = self.progression.unlock_skill_node(id, &mut events);
        self.commit(events);
        inserted
    }

    pub fn unlock_active_skill(&mut self, id: ActiveSkillId) -> bool {
        let mut events = Vec::new();
        let inserted = self.progression.unlock_active_skill(id, &mut events);
        self.commit(events);
        inserted
    }

    /// Apply skill-tree driven knob changes.
    pub fn update_modifiers<F>(&mut self, update: F)
    where
        F: FnOnce(&mut ModifierRegistry),
    {
        update(&mut self.modifiers);
        self.commit(Vec::new());
    }

    // ------------------------------------------------------------------
    // Prestige
    // ------------------------------------------------------------------

    pub fn required_lifetime_money(&self) -> f64 {
        self.prestige.required_lifetime_money()
    }

    pub fn can_prestige(&self) -> bool {
        self.prestige.can_prestige(&self.ledger)
    }

    pub fn potential_prestige_reward(&self) -> f64 {
        self.prestige.potential_reward(&self.ledger, &self.modifiers)
    }

    pub fn try_prestige(&mut self) -> Result<PrestigeReceipt, GameError> {
        let mut events = Vec::new();
        let receipt = self.prestige.execute(
            &mut self.ledger,
            &mut self.progression,
            &self.modifiers,
            &mut events,
        )?;
        self.commit(events);
        Ok(receipt)
    }

    // ------------------------------------------------------------------
    // Persistence boundary
    // ------------------------------------------------------------------

    /// Copy out every component's values. Never mutates.
    pub fn state(&self) -> EngineState {
        EngineState {
            ledger: self.ledger.values(),
            modifiers: self.modifiers.clone(),
            progression: self.progression.values(),
            prestige: self.prestige.record(),
        }
    }

    /// Overwrite every component. Order matters: ledger and modifiers first, then
    /// progression, then prestige.
    pub fn restore(&mut self, state: EngineState) {
        let mut events = Vec::new();
        self.ledger.set_all(state.ledger, &mut events);
        self.modifiers = state.modifiers;
        self.progression.restore(state.progression, &mut events);
        self.prestige.restore(state.prestige);
        self.last_potential_reward = None;
        self.commit(events);
    }

    /// Start over: wipe every component, including permanent unlocks and modifiers.
    pub fn reset_to_fresh(&mut self) {
        self.restore(EngineState {
            ledger: LedgerValues::default(),
            modifiers: ModifierRegistry::new(),
            progression: ProgressionValues::default(),
            prestige: PrestigeRecord::default(),
        });
    }

    pub fn status(&self) -> GameStatus {
        GameStatus {
            money: self.ledger.current(CurrencyKind::Money),
            lifetime_money: self.ledger.lifetime(CurrencyKind::Money),
            dark_matter: self.ledger.current(CurrencyKind::DarkMatter),
            time_shards: self.ledger.current(CurrencyKind::TimeShards),
            prestige: self.prestige.record(),
            phase: self.prestige.phase(&self.ledger),
            required_lifetime_money: self.required_lifetime_money(),
            potential_reward: self.potential_prestige_reward(),
            owned_dice: self
                .progression
                .owned_counts()
                .iter()
                .map(|(id, &owned)| (id.clone(), owned))
                .collect(),
            dice_value_upgrade_level: self.progression.dice_value_upgrade_level(),
        }
    }
}

impl std::fmt::Debug for GameEngine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GameEngine")
            .field("ledger", &self.ledger)
            .field("modifiers", &self.modifiers)
            .field("progression", &self.progression)
            .field("prestige", &self.prestige)
            .field("bus", &self.bus)
            .finish()
    }
}
