//! Save/load contract:
//! 1. Capture -> persist -> load -> apply reproduces every component
//! 2. Older schemas migrate to the same state as a current save with default fields
//! 3. Newer schemas and corrupt files are set aside, never overwritten

mod common;

use idledice::economy::{
    ActiveSkillId, CurrencyKind, DiceTypeId, Earning, FlagKnob, GameEvent, NumericKnob,
    SkillNodeId,
};
use idledice::handle::GameHandle;
use idledice::storage::migration::CURRENT_SAVE_VERSION;
use idledice::storage::{LoadOutcome, PersistenceGateway};
use serde_json::json;
use tempfile::TempDir;

fn played_engine(config: &idledice::config::Config) -> idledice::economy::GameEngine {
    let mut engine = common::seeded_engine(config);
    engine.add_currency(CurrencyKind::Money, 2500.0, Earning::Earned);
    engine.add_currency(CurrencyKind::TimeShards, 7.5, Earning::Earned);
    engine.try_buy_dice_type(&DiceTypeId::basic()).unwrap();
    engine.unlock_dice_type(DiceTypeId::from("silver"));
    engine.unlock_skill_node(SkillNodeId::from("lucky_streak"));
    engine.unlock_active_skill(ActiveSkillId::from("overdrive"));
    engine.update_modifiers(|m| {
        m.set(NumericKnob::JackpotChance, 0.1);
        m.set(NumericKnob::JackpotMultiplier, 5.0);
        m.set_flag(FlagKnob::AutoRollEnabled, true);
    });
    engine.try_prestige().unwrap();
    engine.add_currency(CurrencyKind::Money, 60.0, Earning::Earned);
    engine.try_buy_value_upgrade().unwrap();
    engine
}

#[test]
fn persisted_game_restores_field_for_field() {
    let dir = TempDir::new().unwrap();
    let config = common::small_config(&dir);
    let engine = played_engine(&config);
    let gateway = PersistenceGateway::new(&config.storage);

    gateway.persist(&PersistenceGateway::capture(&engine)).unwrap();
    let loaded = gateway.load_latest().unwrap().expect("save exists");

    let mut restored = common::seeded_engine(&config);
    let mut rx = restored.events().subscribe();
    PersistenceGateway::apply(&mut restored, loaded);

    assert_eq!(restored.state(), engine.state());
    assert_eq!(restored.status(), engine.status());

    let mut events = Vec::new();
    while let Ok(event) = rx.try_recv() {
        events.push(event);
    }
    assert!(events.contains(&GameEvent::CurrencyChanged {
        kind: CurrencyKind::TimeShards,
        current: 7.5
    }));
    assert!(events.contains(&GameEvent::SkillNodeUnlocked(SkillNodeId::from("lucky_streak"))));
    assert!(events.contains(&GameEvent::ValueUpgradeChanged { level: 1 }));
}

#[test]
fn capture_does_not_mutate() {
    let dir = TempDir::new().unwrap();
    let config = common::small_config(&dir);
    let engine = played_engine(&config);
    let before = engine.state();
    let _ = PersistenceGateway::capture(&engine);
    assert_eq!(engine.state(), before);
}

#[test]
fn previous_schema_loads_like_current_with_defaults() {
    let dir = TempDir::new().unwrap();
    let config = common::small_config(&dir);
    let mut engine = common::seeded_engine(&config);
    engine.add_currency(CurrencyKind::Money, 321.0, Earning::Earned);
    engine.try_buy_dice_type(&DiceTypeId::basic()).unwrap();
    engine.unlock_active_skill(ActiveSkillId::from("overdrive"));

    let current = serde_json::to_value(PersistenceGateway::capture(&engine)).unwrap();
    assert_eq!(current["diceValueUpgradeLevel"], json!(0));
    assert_eq!(current["prestige"]["hasAscended"], json!(false));

    let mut previous = current.clone();
    previous["saveVersion"] = json!(CURRENT_SAVE_VERSION - 1);
    previous.as_object_mut().unwrap().remove("diceValueUpgradeLevel");
    previous["prestige"]
        .as_object_mut()
        .unwrap()
        .remove("hasAscended");
    common::write_raw_save(&config, &previous.to_string());

    let gateway = PersistenceGateway::new(&config.storage);
    let migrated = gateway.load_latest().unwrap().expect("migrated save");
    assert_eq!(migrated.save_version, CURRENT_SAVE_VERSION);
    assert_eq!(serde_json::to_value(&migrated).unwrap(), current);

    let mut restored = common::seeded_engine(&config);
    PersistenceGateway::apply(&mut restored, migrated);
    assert_eq!(restored.state(), engine.state());
}

#[test]
fn first_schema_save_boots() {
    let dir = TempDir::new().unwrap();
    let config = common::small_config(&dir);
    common::write_raw_save(
        &config,
        &json!({
            "saveVersion": 1,
            "timestamp": "2025-11-30T12:00:00Z",
            "money": { "current": 40.0, "lifetime": 4000.0 },
            "darkMatter": { "current": 12.0, "lifetime": 12.0 },
            "modifiers": { "globalMoneyMultiplier": 2.0, "retiredKnob": 9.0 },
            "unlockedDiceTypes": ["basic", "silver"],
            "ownedCounts": { "basic": 4, "silver": 1 },
            "unlockedSkillNodes": ["starter"],
            "prestige": { "level": 1, "totalDarkMatterEarned": 12.0 }
        })
        .to_string(),
    );

    let (game, outcome) = GameHandle::bootstrap(&config).unwrap();
    assert!(matches!(outcome, LoadOutcome::Loaded(_)));
    let status = game.status();
    assert_eq!(status.money, 40.0);
    assert_eq!(status.lifetime_money, 4000.0);
    assert_eq!(status.dark_matter, 12.0);
    assert_eq!(status.time_shards, 0.0);
    assert_eq!(status.dice_value_upgrade_level, 0);
    assert_eq!(status.prestige.level, 1);
    assert!(status.prestige.has_ascended);
    assert_eq!(
        game.with_engine(|e| e.modifiers().get(NumericKnob::GlobalMoneyMultiplier)),
        2.0
    );
    assert_eq!(
        game.with_engine(|e| e.progression().owned(&DiceTypeId::from("silver"))),
        1
    );
}

#[test]
fn newer_schema_is_refused_and_preserved() {
    let dir = TempDir::new().unwrap();
    let config = common::small_config(&dir);
    let future = json!({
        "saveVersion": CURRENT_SAVE_VERSION + 1,
        "money": { "current": 1e30, "lifetime": 1e30 },
        "hyperspace": true
    })
    .to_string();
    common::write_raw_save(&config, &future);

    let (game, outcome) = GameHandle::bootstrap(&config).unwrap();
    let moved_to = match outcome {
        LoadOutcome::Quarantined { reason, moved_to } => {
            assert!(reason.contains("newer"), "{reason}");
            moved_to.expect("quarantined path")
        }
        other => panic!("expected quarantine, got {:?}", other),
    };
    assert_eq!(game.status().money, 0.0);
    assert_eq!(std::fs::read_to_string(&moved_to).unwrap(), future);

    game.save_blocking().unwrap();
    assert_eq!(std::fs::read_to_string(&moved_to).unwrap(), future);
}

#[test]
fn truncated_save_starts_fresh_and_keeps_artifact() {
    let dir = TempDir::new().unwrap();
    let config = common::small_config(&dir);
    let engine = played_engine(&config);
    let text = serde_json::to_string_pretty(&PersistenceGateway::capture(&engine)).unwrap();
    let truncated = &text[..text.len() / 2];
    common::write_raw_save(&config, truncated);

    let (game, outcome) = GameHandle::bootstrap(&config).unwrap();
    let moved_to = match outcome {
        LoadOutcome::Quarantined { moved_to: Some(path), .. } => path,
        other => panic!("expected quarantine, got {:?}", other),
    };
    assert_eq!(game.status().lifetime_money, 0.0);
    assert_eq!(std::fs::read_to_string(moved_to).unwrap(), truncated);

    game.add_currency(CurrencyKind::Money, 5.0, Earning::Earned);
    tokio_test::block_on(game.save_now()).unwrap();
    let (reloaded, outcome) = GameHandle::bootstrap(&config).unwrap();
    assert!(matches!(outcome, LoadOutcome::Loaded(_)));
    assert_eq!(reloaded.status().money, 5.0);
}

#[test]
fn failed_write_keeps_previous_save() {
    let dir = TempDir::new().unwrap();
    let config = common::small_config(&dir);
    let gateway = PersistenceGateway::new(&config.storage);
    let engine = played_engine(&config);
    let first = PersistenceGateway::capture(&engine);
    gateway.persist(&first).unwrap();

    // A directory squatting on the lock path makes the next write fail before any rename.
    let lock_path = gateway.path().with_file_name("save.json.lock");
    std::fs::remove_file(&lock_path).unwrap();
    std::fs::create_dir(&lock_path).unwrap();

    let fresh = common::seeded_engine(&config);
    assert!(gateway.persist(&PersistenceGateway::capture(&fresh)).is_err());
    assert_eq!(gateway.load_latest().unwrap(), Some(first));
}
