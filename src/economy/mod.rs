//! # Progression economy
//!
//! The in-memory game core:
//!
//! - [`ledger`] - spendable and lifetime balances for Money, Dark Matter and Time Shards
//! - [`modifiers`] - skill-tree knobs and the fixed money / dark matter pipelines
//! - [`progression`] - unlocks, owned dice and dynamic pricing
//! - [`prestige`] - ascension eligibility, reward curve and reset
//! - [`engine`] - [`GameEngine`], the single owner of all of the above
//! - [`events`] - fan-out of [`GameEvent`]s to subscribers
//!
//! Nothing in this module touches the filesystem; see [`crate::storage`].

pub mod currency;
pub mod engine;
pub mod errors;
pub mod events;
pub mod ledger;
pub mod modifiers;
pub mod prestige;
pub mod progression;
pub mod types;

pub use currency::{format_amount, format_currency};
pub use engine::{EngineState, GameEngine, GameStatus, Purchase, RollReward};
pub use errors::{GameError, PersistenceError};
pub use events::EventBus;
pub use ledger::{Balance, Earning, Ledger};
pub use modifiers::{FlagKnob, ModifierRegistry, NumericKnob};
pub use prestige::{PrestigeEngine, PrestigePhase, PrestigeReceipt, PrestigeRecord};
pub use progression::{DiceCatalog, ProgressionState};
pub use types::{ActiveSkillId, CurrencyKind, DiceTypeId, GameEvent, SkillNodeId};
