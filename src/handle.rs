//! Shared, thread-safe access to one running game.
//!
//! [`GameHandle`] owns the single mutation lock. Every state-changing call takes it for the
//! duration of one engine operation, so concurrent callers are serialized and a prestige can
//! never interleave with a purchase. Saves capture under the lock and write after releasing it.

use log::info;
use std::sync::{Arc, Mutex, MutexGuard};
use tokio::sync::mpsc;

use crate::config::Config;
use crate::economy::engine::{GameEngine, GameStatus, Purchase, RollReward};
use crate::economy::errors::{GameError, PersistenceError};
use crate::economy::ledger::Earning;
use crate::economy::prestige::PrestigeReceipt;
use crate::economy::types::{ActiveSkillId, CurrencyKind, DiceTypeId, GameEvent, SkillNodeId};
use crate::storage::{LoadOutcome, PersistenceGateway, SaveSnapshot};

#[derive(Clone)]
pub struct GameHandle {
    engine: Arc<Mutex<GameEngine>>,
    gateway: Arc<PersistenceGateway>,
}

impl GameHandle {
    pub fn new(engine: GameEngine, gateway: PersistenceGateway) -> Self {
        Self {
            engine: Arc::new(Mutex::new(engine)),
            gateway: Arc::new(gateway),
        }
    }

    /// Build a game from configuration and restore the latest save, if any.
    ///
    /// A save with bad contents is set aside and the game starts fresh; the outcome says which
    /// happened. A save that cannot be read at all is an error, and the file is left alone.
    pub fn bootstrap(config: &Config) -> Result<(Self, LoadOutcome), PersistenceError> {
        let mut engine = GameEngine::new(config);
        let gateway = PersistenceGateway::new(&config.storage);
        let outcome = gateway.load_or_quarantine()?;
        match &outcome {
            LoadOutcome::Loaded(snapshot) => {
                info!(
                    "Restored save from {} (written {})",
                    gateway.path().display(),
                    snapshot.timestamp
                );
                PersistenceGateway::apply(&mut engine, snapshot.clone());
            }
            LoadOutcome::Fresh => info!("No save found, starting a new game"),
            LoadOutcome::Quarantined { .. } => info!("Starting a new game"),
        }
        Ok((Self::new(engine, gateway), outcome))
    }

    fn lock(&self) -> MutexGuard<'_, GameEngine> {
        // Operations validate before mutating, so a poisoned engine is still consistent.
        self.engine.lock().unwrap_or_else(|p| p.into_inner())
    }

    /// Run `f` with exclusive access to the engine.
    pub fn with_engine<R>(&self, f: impl FnOnce(&mut GameEngine) -> R) -> R {
        f(&mut self.lock())
    }

    pub fn gateway(&self) -> &PersistenceGateway {
        &self.gateway
    }

    pub fn subscribe(&self) -> mpsc::UnboundedReceiver<GameEvent> {
        self.lock().events().subscribe()
    }

    pub fn add_listener<F>(&self, listener: F)
    where
        F: Fn(&GameEvent) + Send + Sync + 'static,
    {
        self.lock().events().add_listener(listener);
    }

    pub fn status(&self) -> GameStatus {
        self.lock().status()
    }

    pub fn add_currency(&self, kind: CurrencyKind, amount: f64, earning: Earning) -> bool {
        self.lock().add_currency(kind, amount, earning)
    }

    pub fn try_spend(&self, kind: CurrencyKind, amount: f64) -> bool {
        self.lock().try_spend(kind, amount)
    }

    pub fn can_afford(&self, kind: CurrencyKind, amount: f64) -> bool {
        self.lock().can_afford(kind, amount)
    }

    pub fn roll(&self, face: f64, tier_multiplier: f64, is_manual: bool, is_idle: bool) -> RollReward {
        self.lock().roll(face, tier_multiplier, is_manual, is_idle)
    }

    pub fn roll_owned_dice(&self, is_idle: bool) -> RollReward {
        self.lock().roll_owned_dice(is_idle)
    }

    pub fn try_buy_dice_type(&self, id: &DiceTypeId) -> Result<Purchase, GameError> {
        self.lock().try_buy_dice_type(id)
    }

    pub fn try_buy_value_upgrade(&self) -> Result<u32, GameError> {
        self.lock().try_buy_value_upgrade()
    }

    pub fn remove_dice(&self, id: &DiceTypeId) -> u32 {
        self.lock().remove_dice(id)
    }

    pub fn unlock_dice_type(&self, id: DiceTypeId) -> bool {
        self.lock().unlock_dice_type(id)
    }

    pub fn unlock_skill_node(&self, id: SkillNodeId) -> bool {
        self.lock().unlock_skill_node(id)
    }

    pub fn unlock_active_skill(&self, id: ActiveSkillId) -> bool {
        self.lock().unlock_active_skill(id)
    }

    pub fn can_prestige(&self) -> bool {
        self.lock().can_prestige()
    }

    pub fn potential_prestige_reward(&self) -> f64 {
        self.lock().potential_prestige_reward()
    }

    pub fn try_prestige(&self) -> Result<PrestigeReceipt, GameError> {
        self.lock().try_prestige()
    }

    /// Consistent snapshot of the whole game, taken under the lock.
    pub fn capture(&self) -> SaveSnapshot {
        PersistenceGateway::capture(&self.lock())
    }

    /// Capture, release the lock, then write on the calling thread.
    pub fn save_blocking(&self) -> Result<(), PersistenceError> {
        let snapshot = self.capture();
        self.gateway.persist(&snapshot)
    }

    /// Capture, then write on tokio's blocking pool so game calls keep flowing.
    pub async fn save_now(&self) -> Result<(), PersistenceError> {
        let snapshot = self.capture();
        let gateway = Arc::clone(&self.gateway);
        tokio::task::spawn_blocking(move || gateway.persist(&snapshot))
            .await
            .map_err(|e| PersistenceError::Io(std::io::Error::new(std::io::ErrorKind::Other, e)))?
    }

    /// Re-read the save file and apply it. Returns `false` when no save exists.
    pub fn reload(&self) -> Result<bool, PersistenceError> {
        match self.gateway.load_latest()? {
            Some(snapshot) => {
                PersistenceGateway::apply(&mut self.lock(), snapshot);
                Ok(true)
            }
            None => Ok(false),
        }
    }
}

impl std::fmt::Debug for GameHandle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GameHandle")
            .field("save", &self.gateway.path())
            .finish()
    }
}
