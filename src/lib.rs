//! # Idledice - Progression & Persistence Engine for an Idle Dice Game
//!
//! Idledice is the economic core of an incremental dice game. It tracks currencies, applies
//! skill-tree modifiers to every reward, prices dice, runs the prestige (ascension) loop and
//! saves the whole game to a single versioned JSON file that survives crashes.
//!
//! ## Features
//!
//! - **Ledger**: Money, Dark Matter and Time Shards with spendable and lifetime balances that never go negative.
//! - **Modifier Pipeline**: Global, manual/idle and jackpot multipliers applied in a fixed order, one jackpot draw per reward.
//! - **Dynamic Pricing**: Exponential per-die prices from a configurable dice catalog.
//! - **Prestige**: Logarithmic Dark Matter rewards with per-level requirement scaling; permanent unlocks survive.
//! - **Atomic Saves**: Temp-file-and-rename writes with file locking, backup rotation and corrupt-save quarantine.
//! - **Schema Migration**: Older saves are upgraded step by step; newer ones are refused rather than truncated.
//! - **Events**: Subscribers receive change events only after an operation has fully completed.
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use idledice::config::Config;
//! use idledice::economy::{CurrencyKind, DiceTypeId, Earning};
//! use idledice::handle::GameHandle;
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let config = Config::load("idledice.toml").await?;
//!     let (game, _outcome) = GameHandle::bootstrap(&config)?;
//!
//!     game.add_currency(CurrencyKind::Money, 10.0, Earning::Earned);
//!     game.try_buy_dice_type(&DiceTypeId::basic())?;
//!     game.save_now().await?;
//!     Ok(())
//! }
//! ```
//!
//! ## Module Organization
//!
//! - [`economy`] - ledger, modifiers, progression, prestige and the [`GameEngine`](economy::GameEngine) aggregate
//! - [`storage`] - save snapshots, atomic persistence, schema migration and autosave
//! - [`handle`] - thread-safe [`GameHandle`](handle::GameHandle) serializing all mutations
//! - [`config`] - TOML configuration and validation
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────────┐
//! │   GameHandle    │ ← One mutation lock, async saves
//! └─────────────────┘
//!          │
//! ┌─────────────────┐
//! │   GameEngine    │ ← Ledger, modifiers, progression, prestige, events
//! └─────────────────┘
//!          │
//! ┌─────────────────┐
//! │   Persistence   │ ← Snapshot, migration, atomic file writes
//! │   Gateway       │
//! └─────────────────┘
//! ```

pub mod config;
pub mod economy;
pub mod handle;
pub mod storage;
