//! Spendable and lifetime balances for every currency.
//!
//! The ledger knows nothing about how amounts are earned. It only enforces:
//! - balances never go negative
//! - `lifetime` never decreases through live mutation
//! - non-positive adds and spends are silent no-ops
//! - sums saturate at `f64::MAX`, so every balance stays finite and serializable
//!
//! Every mutation appends the resulting [`GameEvent`]s to the caller's buffer; the engine
//! publishes them once the whole operation has completed.

use serde::{Deserialize, Serialize};

use super::types::{CurrencyKind, GameEvent};

/// Balance of a single currency.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct Balance {
    pub current: f64,
    pub lifetime: f64,
}

impl Balance {
    pub fn new(current: f64, lifetime: f64) -> Self {
        Self {
            current: sanitize(current),
            lifetime: sanitize(lifetime),
        }
    }
}

/// Whether an addition counts toward lifetime earnings.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Earning {
    /// Regular income; tracked in `lifetime`.
    Earned,
    /// Refunds and other bookkeeping credits; `lifetime` is untouched.
    Incidental,
}

/// Bulk values used when restoring the ledger from a snapshot.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct LedgerValues {
    pub money: Balance,
    pub dark_matter: Balance,
    pub time_shards: Balance,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct Ledger {
    money: Balance,
    dark_matter: Balance,
    time_shards: Balance,
}

fn sanitize(value: f64) -> f64 {
    if value.is_finite() && value > 0.0 {
        value
    } else {
        0.0
    }
}

/// Add two non-negative amounts, saturating at `f64::MAX` instead of overflowing to infinity.
pub(crate) fn saturating_add(a: f64, b: f64) -> f64 {
    let sum = a + b;
    if sum.is_finite() {
        sum
    } else {
        f64::MAX
    }
}

impl Ledger {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn balance(&self, kind: CurrencyKind) -> Balance {
        match kind {
            CurrencyKind::Money => self.money,
            CurrencyKind::DarkMatter => self.dark_matter,
            CurrencyKind::TimeShards => self.time_shards,
        }
    }

    pub fn current(&self, kind: CurrencyKind) -> f64 {
        self.balance(kind).current
    }

    pub fn lifetime(&self, kind: CurrencyKind) -> f64 {
        self.balance(kind).lifetime
    }

    fn slot(&mut self, kind: CurrencyKind) -> &mut Balance {
        match kind {
            CurrencyKind::Money => &mut self.money,
            CurrencyKind::DarkMatter => &mut self.dark_matter,
            CurrencyKind::TimeShards => &mut self.time_shards,
        }
    }

    /// Credit `amount` of `kind`. Returns `true` if anything changed.
    pub fn add_currency(
        &mut self,
        kind: CurrencyKind,
        amount: f64,
        earning: Earning,
        events: &mut Vec<GameEvent>,
    ) -> bool {
        if !amount.is_finite() || amount <= 0.0 {
            return false;
        }
        let slot = self.slot(kind);
        slot.current = saturating_add(slot.current, amount);
        let current = slot.current;
        events.push(GameEvent::CurrencyChanged { kind, current });
        if earning == Earning::Earned {
            slot.lifetime = saturating_add(slot.lifetime, amount);
            let lifetime = slot.lifetime;
            events.push(GameEvent::LifetimeChanged { kind, lifetime });
        }
        true
    }

    /// Deduct `amount` if affordable. Overspending leaves the ledger untouched.
    pub fn try_spend(&mut self, kind: CurrencyKind, amount: f64, events: &mut Vec<GameEvent>) -> bool {
        if amount.is_nan() {
            return false;
        }
        if amount <= 0.0 {
            return true;
        }
        let slot = self.slot(kind);
        if amount > slot.current {
            return false;
        }
        // Clamp guards against rounding leaving a tiny negative residue.
        slot.current = (slot.current - amount).max(0.0);
        let current = slot.current;
        events.push(GameEvent::CurrencyChanged { kind, current });
        true
    }

    pub fn can_afford(&self, kind: CurrencyKind, amount: f64) -> bool {
        self.current(kind) >= amount
    }

    /// Overwrite every balance (load path). Emits all change events so subscribers resync.
    pub fn set_all(&mut self, values: LedgerValues, events: &mut Vec<GameEvent>) {
        self.money = Balance::new(values.money.current, values.money.lifetime);
        self.dark_matter = Balance::new(values.dark_matter.current, values.dark_matter.lifetime);
        self.time_shards = Balance::new(values.time_shards.current, values.time_shards.lifetime);
        for kind in CurrencyKind::ALL {
            let balance = self.balance(kind);
            events.push(GameEvent::CurrencyChanged {
                kind,
                current: balance.current,
            });
            events.push(GameEvent::LifetimeChanged {
                kind,
                lifetime: balance.lifetime,
            });
        }
    }

    /// Zero `current` for every kind not listed in `keep`. Lifetime totals always survive.
    pub fn reset_keeping_some(&mut self, keep: &[CurrencyKind], events: &mut Vec<GameEvent>) {
        for kind in CurrencyKind::ALL {
            if keep.contains(&kind) {
                continue;
            }
            let slot = self.slot(kind);
            slot.current = 0.0;
            events.push(GameEvent::CurrencyChanged { kind, current: 0.0 });
        }
    }

    pub fn values(&self) -> LedgerValues {
        LedgerValues {
            money: self.money,
            dark_matter: self.dark_matter,
            time_shards: self.time_shards,
        }
    }
}
