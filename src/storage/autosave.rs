//! Periodic autosave.
//!
//! The scheduler is clock-driven rather than event-driven, so it works the same whether the host
//! calls [`AutosaveScheduler::check_and_save`] from its own loop or hands the scheduler to
//! [`AutosaveScheduler::spawn`] for a background tokio task.
//!
//! # Features
//! - Configurable interval, enabled by default
//! - Can be toggled at runtime
//! - Capture happens under the game lock, file I/O does not

use log::{debug, info, warn};
use serde::{Deserialize, Serialize};
use std::time::{Duration, Instant};
use tokio::task::JoinHandle;

use crate::economy::errors::PersistenceError;
use crate::handle::GameHandle;

/// Autosave configuration (`[autosave]` table).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AutosaveConfig {
    pub enabled: bool,
    /// Seconds between saves. Values below one are treated as one.
    pub interval_secs: u64,
}

impl Default for AutosaveConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            interval_secs: 30,
        }
    }
}

impl AutosaveConfig {
    pub fn interval(&self) -> Duration {
        Duration::from_secs(self.interval_secs.max(1))
    }
}

pub struct AutosaveScheduler {
    config: AutosaveConfig,
    last_save: Instant,
}

impl AutosaveScheduler {
    /// The first save falls due one interval after creation.
    pub fn new(config: AutosaveConfig) -> Self {
        Self::starting_at(config, Instant::now())
    }

    pub fn starting_at(config: AutosaveConfig, start: Instant) -> Self {
        Self {
            config,
            last_save: start,
        }
    }

    pub fn config(&self) -> &AutosaveConfig {
        &self.config
    }

    pub fn enable(&mut self) {
        self.config.enabled = true;
        info!("Autosave enabled");
    }

    pub fn disable(&mut self) {
        self.config.enabled = false;
        info!("Autosave disabled");
    }

    pub fn set_interval(&mut self, secs: u64) {
        self.config.interval_secs = secs.max(1);
        info!("Autosave interval set to {}s", self.config.interval_secs);
    }

    pub fn last_save(&self) -> Instant {
        self.last_save
    }

    pub fn is_due(&self, now: Instant) -> bool {
        self.config.enabled
            && now.saturating_duration_since(self.last_save) >= self.config.interval()
    }

    /// Save if an interval has elapsed since the last attempt.
    ///
    /// Returns `Ok(true)` when a save was written. A failed attempt still restarts the interval
    /// so a broken disk is not retried on every tick.
    pub fn check_and_save(
        &mut self,
        handle: &GameHandle,
        now: Instant,
    ) -> Result<bool, PersistenceError> {
        if !self.is_due(now) {
            return Ok(false);
        }
        self.last_save = now;
        handle.save_blocking()?;
        debug!("Autosave complete");
        Ok(true)
    }

    /// Run autosave on a background task. Returns `None` when autosave is disabled.
    pub fn spawn(self, handle: GameHandle) -> Option<JoinHandle<()>> {
        if !self.config.enabled {
            return None;
        }
        let period = self.config.interval();
        info!("Autosave every {}s", period.as_secs());
        Some(tokio::spawn(async move {
            let mut ticker = tokio::time::interval_at(tokio::time::Instant::now() + period, period);
            ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);
            loop {
                ticker.tick().await;
                if let Err(e) = handle.save_now().await {
                    warn!("Autosave failed: {}", e);
                }
            }
        }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Config;
    use crate::economy::engine::GameEngine;
    use crate::storage::PersistenceGateway;
    use tempfile::TempDir;

    fn handle(dir: &TempDir) -> GameHandle {
        let gateway = PersistenceGateway::at_path(dir.path().join("save.json"), 0);
        GameHandle::new(GameEngine::with_seed(&Config::default(), 9), gateway)
    }

    #[test]
    fn saves_only_after_interval() {
        let dir = TempDir::new().unwrap();
        let handle = handle(&dir);
        let start = Instant::now();
        let mut scheduler = AutosaveScheduler::starting_at(AutosaveConfig::default(), start);

        assert!(!scheduler.check_and_save(&handle, start + Duration::from_secs(29)).unwrap());
        assert!(!dir.path().join("save.json").exists());

        assert!(scheduler.check_and_save(&handle, start + Duration::from_secs(30)).unwrap());
        assert!(dir.path().join("save.json").exists());

        assert!(!scheduler.check_and_save(&handle, start + Duration::from_secs(45)).unwrap());
        assert!(scheduler.check_and_save(&handle, start + Duration::from_secs(60)).unwrap());
    }

    #[test]
    fn disabled_scheduler_never_saves() {
        let dir = TempDir::new().unwrap();
        let handle = handle(&dir);
        let start = Instant::now();
        let mut scheduler = AutosaveScheduler::starting_at(AutosaveConfig::default(), start);
        scheduler.disable();
        assert!(!scheduler.check_and_save(&handle, start + Duration::from_secs(3600)).unwrap());
        scheduler.enable();
        assert!(scheduler.check_and_save(&handle, start + Duration::from_secs(3600)).unwrap());
    }

    #[test]
    fn zero_interval_is_clamped() {
        let mut scheduler = AutosaveScheduler::new(AutosaveConfig::default());
        scheduler.set_interval(0);
        assert_eq!(scheduler.config().interval(), Duration::from_secs(1));
    }

    #[tokio::test]
    async fn spawn_respects_disabled_config() {
        let dir = TempDir::new().unwrap();
        let config = AutosaveConfig {
            enabled: false,
            interval_secs: 1,
        };
        assert!(AutosaveScheduler::new(config).spawn(handle(&dir)).is_none());
    }

    #[tokio::test]
    async fn background_task_writes_save() {
        let dir = TempDir::new().unwrap();
        let config = AutosaveConfig {
            enabled: true,
            interval_secs: 1,
        };
        let task = AutosaveScheduler::new(config).spawn(handle(&dir)).unwrap();
        tokio::time::sleep(Duration::from_millis(1500)).await;
        task.abort();
        assert!(dir.path().join("save.json").exists());
    }
}
