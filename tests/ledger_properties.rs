//! Ledger invariants exercised through the engine:
//! 1. Non-positive adds and spends change nothing and emit nothing
//! 2. Overspending fails without mutating state
//! 3. Lifetime balances never decrease, prestige included
//! 4. Balances never go negative

mod common;

use idledice::economy::{CurrencyKind, Earning, GameEvent};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use tempfile::TempDir;

#[test]
fn non_positive_amounts_are_silent_no_ops() {
    let dir = TempDir::new().unwrap();
    let mut engine = common::seeded_engine(&common::small_config(&dir));
    engine.add_currency(CurrencyKind::Money, 50.0, Earning::Earned);
    let before = engine.state();
    let mut rx = engine.events().subscribe();

    for amount in [0.0, -1.0, -1e12, f64::NEG_INFINITY] {
        for kind in CurrencyKind::ALL {
            assert!(!engine.add_currency(kind, amount, Earning::Earned));
            assert!(engine.try_spend(kind, amount));
        }
    }

    assert_eq!(engine.state(), before);
    assert!(rx.try_recv().is_err(), "no events expected");
}

#[test]
fn overspend_fails_and_leaves_balance_intact() {
    let dir = TempDir::new().unwrap();
    let mut engine = common::seeded_engine(&common::small_config(&dir));
    engine.add_currency(CurrencyKind::Money, 100.0, Earning::Earned);
    let balance = engine.ledger().current(CurrencyKind::Money);

    assert!(!engine.try_spend(CurrencyKind::Money, balance + 0.01));
    assert_eq!(engine.ledger().current(CurrencyKind::Money), balance);
    assert!(engine.try_spend(CurrencyKind::Money, balance));
    assert_eq!(engine.ledger().current(CurrencyKind::Money), 0.0);
    assert!(!engine.try_spend(CurrencyKind::Money, balance));
}

#[test]
fn incidental_income_skips_lifetime() {
    let dir = TempDir::new().unwrap();
    let mut engine = common::seeded_engine(&common::small_config(&dir));
    let mut rx = engine.events().subscribe();
    engine.add_currency(CurrencyKind::TimeShards, 4.0, Earning::Incidental);

    assert_eq!(engine.ledger().current(CurrencyKind::TimeShards), 4.0);
    assert_eq!(engine.ledger().lifetime(CurrencyKind::TimeShards), 0.0);
    let mut events = Vec::new();
    while let Ok(event) = rx.try_recv() {
        events.push(event);
    }
    assert!(events.contains(&GameEvent::CurrencyChanged {
        kind: CurrencyKind::TimeShards,
        current: 4.0
    }));
    assert!(!events
        .iter()
        .any(|e| matches!(e, GameEvent::LifetimeChanged { .. })));
}

#[test]
fn lifetime_is_monotonic_across_random_operations() {
    let dir = TempDir::new().unwrap();
    let mut engine = common::seeded_engine(&common::small_config(&dir));
    let mut rng = StdRng::seed_from_u64(2024);
    let mut last_lifetime = [0.0f64; 3];

    for step in 0..2000 {
        let kind = CurrencyKind::ALL[rng.gen_range(0..3)];
        let amount = rng.gen_range(-50.0..500.0);
        match rng.gen_range(0..6) {
            0 | 1 => {
                engine.add_currency(kind, amount, Earning::Earned);
            }
            2 => {
                engine.add_currency(kind, amount, Earning::Incidental);
            }
            3 => {
                engine.try_spend(kind, amount);
            }
            4 => {
                engine.roll(rng.gen_range(1.0..7.0), 1.0, rng.gen(), rng.gen());
            }
            _ => {
                let _ = engine.try_prestige();
            }
        }

        for (i, kind) in CurrencyKind::ALL.into_iter().enumerate() {
            let balance = engine.ledger().balance(kind);
            assert!(balance.current >= 0.0, "step {step}: negative {kind}");
            assert!(
                balance.lifetime >= last_lifetime[i],
                "step {step}: lifetime {kind} decreased"
            );
            last_lifetime[i] = balance.lifetime;
        }
    }
    assert!(engine.prestige().record().level > 0, "walk should have prestiged");
}
