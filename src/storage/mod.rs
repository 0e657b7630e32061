//! Save file storage for the idle dice engine.
//!
//! [`PersistenceGateway`] is the only code that touches the save file. It captures engine state
//! into a [`SaveSnapshot`], writes it atomically and reads it back through schema migration.
//!
//! ## On-disk layout
//!
//! ```text
//! data/
//!   save.json                      current save (pretty JSON)
//!   save.json.lock                 advisory lock sidecar
//!   save.json.bak1 .. .bakN        previous saves, newest first
//!   save.json.corrupt-<timestamp>  unreadable saves set aside on load
//! ```
//!
//! ## Write protocol
//!
//! 1. Serialize the snapshot before touching the filesystem
//! 2. Take an exclusive lock on the sidecar (`fs2`)
//! 3. Rotate backups
//! 4. Write a uniquely named temp file in the same directory and fsync it
//! 5. Rename over the save file, then fsync the directory (best effort)
//!
//! A crash at any point leaves either the previous save or the new one, never a mix.
//! Writers inside one process also queue on an in-memory mutex so overlapping saves complete
//! one after another.

pub mod autosave;
pub mod migration;
pub mod snapshot;

use chrono::{DateTime, Utc};
use fs2::FileExt;
use log::{debug, error, info, warn};
use std::fs::{self, File, OpenOptions};
use std::io::{ErrorKind, Write};
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use crate::config::StorageConfig;
use crate::economy::engine::GameEngine;
use crate::economy::errors::PersistenceError;

pub use snapshot::SaveSnapshot;

/// What [`PersistenceGateway::load_or_quarantine`] found.
#[derive(Debug, Clone, PartialEq)]
pub enum LoadOutcome {
    /// No save file exists yet.
    Fresh,
    /// A save was read, migrated if needed, and decoded.
    Loaded(SaveSnapshot),
    /// The save was unreadable or from a newer build. It was renamed out of the way so the
    /// next save cannot overwrite it.
    Quarantined {
        reason: String,
        moved_to: Option<PathBuf>,
    },
}

#[derive(Debug)]
pub struct PersistenceGateway {
    path: PathBuf,
    backup_count: usize,
    writer: Mutex<()>,
}

impl PersistenceGateway {
    pub fn new(config: &StorageConfig) -> Self {
        Self::at_path(config.save_path(), config.backup_count)
    }

    pub fn at_path(path: impl Into<PathBuf>, backup_count: usize) -> Self {
        Self {
            path: path.into(),
            backup_count,
            writer: Mutex::new(()),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Path of the `n`th rotated backup (1 = most recent).
    pub fn backup_path(&self, n: usize) -> PathBuf {
        self.sibling(&format!("bak{}", n))
    }

    fn sibling(&self, suffix: &str) -> PathBuf {
        let mut name = self
            .path
            .file_name()
            .map(|s| s.to_os_string())
            .unwrap_or_else(|| "save.json".into());
        name.push(".");
        name.push(suffix);
        self.path.with_file_name(name)
    }

    /// Snapshot the engine's current values. Pure read; holds no locks of its own.
    pub fn capture(engine: &GameEngine) -> SaveSnapshot {
        SaveSnapshot::from_state(&engine.state(), Utc::now())
    }

    /// Overwrite the engine from a snapshot, emitting change events for every component.
    pub fn apply(engine: &mut GameEngine, snapshot: SaveSnapshot) {
        engine.restore(snapshot.into_state());
    }

    /// Durably write `snapshot`. On failure the previous save is left intact and the error is
    /// logged and returned.
    pub fn persist(&self, snapshot: &SaveSnapshot) -> Result<(), PersistenceError> {
        let _queued = self.writer.lock().unwrap_or_else(|p| p.into_inner());
        let result = self.persist_locked(snapshot);
        match &result {
            Ok(()) => debug!("Saved game to {}", self.path.display()),
            Err(e) => error!("Failed to save game to {}: {}", self.path.display(), e),
        }
        result
    }

    fn persist_locked(&self, snapshot: &SaveSnapshot) -> Result<(), PersistenceError> {
        let content = serde_json::to_string_pretty(snapshot)?;

        let dir = match self.path.parent() {
            Some(p) if !p.as_os_str().is_empty() => p.to_path_buf(),
            _ => PathBuf::from("."),
        };
        fs::create_dir_all(&dir)?;

        let lock_file = OpenOptions::new()
            .create(true)
            .read(true)
            .write(true)
            .open(self.sibling("lock"))?;
        lock_file.lock_exclusive()?;

        self.rotate_backups();

        let base = self
            .path
            .file_name()
            .and_then(|s| s.to_str())
            .unwrap_or("save.json");
        let mut counter = 0u32;
        let tmp_path = loop {
            let candidate = dir.join(format!(".{}.tmp-{}-{}", base, std::process::id(), counter));
            match OpenOptions::new().write(true).create_new(true).open(&candidate) {
                Ok(mut tmp) => {
                    let written = tmp
                        .write_all(content.as_bytes())
                        .and_then(|_| tmp.flush())
                        .and_then(|_| tmp.sync_all());
                    if let Err(e) = written {
                        let _ = fs::remove_file(&candidate);
                        return Err(e.into());
                    }
                    break candidate;
                }
                Err(e) if e.kind() == ErrorKind::AlreadyExists => {
                    counter = counter.saturating_add(1);
                    continue;
                }
                Err(e) => return Err(e.into()),
            }
        };

        if let Err(e) = fs::rename(&tmp_path, &self.path) {
            let _ = fs::remove_file(&tmp_path);
            return Err(e.into());
        }

        if let Ok(dir_file) = File::open(&dir) {
            let _ = dir_file.sync_all();
        }

        drop(lock_file);
        Ok(())
    }

    /// Shift `.bak1..` up by one and copy the current save into `.bak1`. Failures only cost
    /// history, so they are logged and the save proceeds.
    fn rotate_backups(&self) {
        if self.backup_count == 0 || !self.path.exists() {
            return;
        }
        for n in (1..self.backup_count).rev() {
            let from = self.backup_path(n);
            if from.exists() {
                if let Err(e) = fs::rename(&from, self.backup_path(n + 1)) {
                    warn!("Failed to rotate backup {}: {}", from.display(), e);
                }
            }
        }
        if let Err(e) = fs::copy(&self.path, self.backup_path(1)) {
            warn!("Failed to back up {}: {}", self.path.display(), e);
        }
    }

    /// Read the save file, migrating older schemas. `Ok(None)` means no save exists.
    pub fn load_latest(&self) -> Result<Option<SaveSnapshot>, PersistenceError> {
        let content = match fs::read_to_string(&self.path) {
            Ok(c) => c,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(None),
            Err(e) if e.kind() == ErrorKind::InvalidData => {
                return Err(PersistenceError::Corrupt(format!("not UTF-8 text: {}", e)))
            }
            Err(e) => return Err(e.into()),
        };
        // Preallocated files can carry trailing NUL padding after a crash.
        let trimmed = content.trim_end_matches('\0').trim();
        if trimmed.is_empty() {
            return Err(PersistenceError::Corrupt("save file is empty".to_string()));
        }

        let raw: serde_json::Value = serde_json::from_str(trimmed)
            .map_err(|e| PersistenceError::Corrupt(format!("invalid JSON: {}", e)))?;
        let (doc, from) = migration::migrate_to_current(raw)?;
        let snapshot: SaveSnapshot = serde_json::from_value(doc)
            .map_err(|e| PersistenceError::Corrupt(format!("unexpected save layout: {}", e)))?;

        if from != migration::CURRENT_SAVE_VERSION {
            info!(
                "Loaded save from {} (migrated from v{})",
                self.path.display(),
                from
            );
        } else {
            debug!("Loaded save from {}", self.path.display());
        }
        Ok(Some(snapshot))
    }

    /// Load the save, or set an unusable one aside and report a fresh start.
    ///
    /// Only bad contents are quarantined: corrupt data, a failed migration or a newer save
    /// version. I/O failures leave the file where it is and are returned so the caller can
    /// report them and retry.
    pub fn load_or_quarantine(&self) -> Result<LoadOutcome, PersistenceError> {
        let err = match self.load_latest() {
            Ok(Some(snapshot)) => return Ok(LoadOutcome::Loaded(snapshot)),
            Ok(None) => return Ok(LoadOutcome::Fresh),
            Err(
                e @ (PersistenceError::Corrupt(_)
                | PersistenceError::Migration { .. }
                | PersistenceError::UnsupportedVersion { .. }),
            ) => e,
            Err(e) => {
                error!("Cannot read save at {}: {}", self.path.display(), e);
                return Err(e);
            }
        };

        let reason = err.to_string();
        warn!("Save at {} is unusable: {}", self.path.display(), reason);
        let moved_to = match self.quarantine(Utc::now()) {
            Ok(path) => {
                warn!("Moved unusable save to {}", path.display());
                Some(path)
            }
            Err(qe) => {
                error!("Failed to quarantine {}: {}", self.path.display(), qe);
                None
            }
        };
        Ok(LoadOutcome::Quarantined { reason, moved_to })
    }

    /// Rename the save file to `<save>.corrupt-<timestamp>` and return the new path.
    pub fn quarantine(&self, at: DateTime<Utc>) -> Result<PathBuf, PersistenceError> {
        let stamp = at.format("%Y%m%dT%H%M%SZ");
        let mut target = self.sibling(&format!("corrupt-{}", stamp));
        let mut counter = 1u32;
        while target.exists() {
            target = self.sibling(&format!("corrupt-{}-{}", stamp, counter));
            counter += 1;
        }
        fs::rename(&self.path, &target)?;
        Ok(target)
    }
}
