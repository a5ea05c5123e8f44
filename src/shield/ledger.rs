//! Per-hero damage-absorption bookkeeping.

use rustc_hash::FxHashMap;
use serde::{Deserialize, Serialize};
use tracing::trace;

use crate::core::{Combatant, CombatantId, Hero};
use crate::damage::DamageApplicationResult;

/// Why a shield value changed.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ShieldCause {
    Gain,
    Loss,
    /// Consumed by incoming damage.
    Absorb,
}

/// A single shield mutation, ready to be replicated.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ShieldChange {
    pub target: CombatantId,
    pub old: u32,
    pub new: u32,
    pub delta: i64,
    pub cause: ShieldCause,
}

impl ShieldChange {
    fn new(target: CombatantId, old: u32, new: u32, cause: ShieldCause) -> Self {
        Self {
            target,
            old,
            new,
            delta: i64::from(new) - i64::from(old),
            cause,
        }
    }
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
struct ShieldTotals {
    gained: u64,
    lost: u64,
}

/// Shield ledger.
///
/// The shield value itself lives on the [`Hero`]; the ledger is the only
/// code that writes it, and keeps running gain/loss totals per hero so the
/// stored value can be audited against its history.
///
/// Creatures have no shield layer and never pass through here.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ShieldLedger {
    totals: FxHashMap<CombatantId, ShieldTotals>,
}

impl ShieldLedger {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a hero's starting shield as its opening gain.
    pub fn open(&mut self, hero: &Hero) {
        let totals = self.totals.entry(hero.id()).or_default();
        totals.gained += u64::from(hero.shield);
    }

    /// Increase a hero's shield. Zero amounts change nothing.
    pub fn add_shield(&mut self, hero: &mut Hero, amount: u32) -> Option<ShieldChange> {
        if amount == 0 {
            return None;
        }
        let old = hero.shield;
        hero.shield = old.saturating_add(amount);
        let gained = hero.shield - old;
        self.totals.entry(hero.id()).or_default().gained += u64::from(gained);

        trace!(hero = %hero.id(), old, new = hero.shield, "shield gained");
        Some(ShieldChange::new(hero.id(), old, hero.shield, ShieldCause::Gain))
    }

    /// Decrease a hero's shield by at most its current value.
    ///
    /// Returns the amount actually removed and, when nonzero, the change.
    pub fn remove_shield(&mut self, hero: &mut Hero, amount: u32) -> (u32, Option<ShieldChange>) {
        self.drain(hero, amount, ShieldCause::Loss)
    }

    /// Split damage between shield and hp.
    ///
    /// Shield is consumed first; the remainder reduces hp, floored at zero.
    /// `died` is set only when this call takes hp from above zero to zero.
    /// The hero is not marked dead here; that is the caller's decision once
    /// revival has been checked.
    pub fn apply_damage_with_shields(
        &mut self,
        hero: &mut Hero,
        damage: u32,
    ) -> (DamageApplicationResult, Option<ShieldChange>) {
        let (shield_damage, change) = self.drain(hero, damage, ShieldCause::Absorb);
        let remaining = damage - shield_damage;
        let (hp_lost, died) = hero.vitals.take(remaining);

        let result = DamageApplicationResult {
            total: shield_damage + remaining,
            shield_damage,
            hp_damage: remaining,
            hp_lost,
            died,
            revived: false,
        };
        (result, change)
    }

    /// Sum of gains minus losses recorded for a hero.
    #[must_use]
    pub fn expected_shield(&self, id: CombatantId) -> u64 {
        self.totals
            .get(&id)
            .map(|t| t.gained.saturating_sub(t.lost))
            .unwrap_or(0)
    }

    /// True when the hero's shield matches its recorded history.
    #[must_use]
    pub fn is_consistent(&self, hero: &Hero) -> bool {
        self.expected_shield(hero.id()) == u64::from(hero.shield)
    }

    fn drain(&mut self, hero: &mut Hero, amount: u32, cause: ShieldCause) -> (u32, Option<ShieldChange>) {
        let old = hero.shield;
        let removed = amount.min(old);
        if removed == 0 {
            return (0, None);
        }
        hero.shield = old - removed;
        self.totals.entry(hero.id()).or_default().lost += u64::from(removed);

        trace!(hero = %hero.id(), old, new = hero.shield, ?cause, "shield reduced");
        (removed, Some(ShieldChange::new(hero.id(), old, hero.shield, cause)))
    }
}
