//! Test utilities & fixtures shared by the integration tests.

use idledice::config::Config;
use idledice::economy::GameEngine;
use idledice::handle::GameHandle;
use idledice::storage::PersistenceGateway;
use tempfile::TempDir;

/// Config with a small prestige requirement and flat level scaling so numbers stay readable.
#[allow(dead_code)]
pub fn small_config(dir: &TempDir) -> Config {
    let mut config = Config::default();
    config.prestige.base_requirement = 1000.0;
    config.prestige.scaling_factor = 10.0;
    config.prestige.level_scaling = 1.0;
    config.storage.data_dir = dir.path().to_string_lossy().into_owned();
    config.storage.backup_count = 2;
    config
}

#[allow(dead_code)]
pub fn seeded_engine(config: &Config) -> GameEngine {
    GameEngine::with_seed(config, 0x5eed)
}

/// Handle over a seeded engine, saving into `dir`.
#[allow(dead_code)]
pub fn seeded_handle(dir: &TempDir) -> GameHandle {
    let config = small_config(dir);
    GameHandle::new(
        seeded_engine(&config),
        PersistenceGateway::new(&config.storage),
    )
}

/// Write raw text as the save file for `config`.
#[allow(dead_code)]
pub fn write_raw_save(config: &Config, content: &str) {
    let path = config.storage.save_path();
    std::fs::create_dir_all(path.parent().unwrap()).unwrap();
    std::fs::write(path, content).unwrap();
}
