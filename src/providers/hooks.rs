//! Turn-level collaborators: spells, reactions and pacing.

use serde::{Deserialize, Serialize};
use std::time::Duration;

use crate::core::{Combatant, CombatantId, Hero, PacingConfig, SpellEntry};
use crate::damage::{DamageApplicationResult, DamageSource};

use super::RngProvider;

/// Read-only projection of a hero's spellbook with disabled spells removed.
///
/// Built once per turn and handed to the [`SpellCaster`]; it never reflects
/// later changes to the underlying list.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct SpellbookView {
    spells: Vec<String>,
}

impl SpellbookView {
    pub fn project(spells: &[SpellEntry]) -> Self {
        Self {
            spells: spells
                .iter()
                .filter(|s| s.enabled)
                .map(|s| s.name.clone())
                .collect(),
        }
    }

    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.spells.iter().map(String::as_str)
    }

    #[must_use]
    pub fn contains(&self, name: &str) -> bool {
        self.spells.iter().any(|s| s == name)
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.spells.is_empty()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.spells.len()
    }
}

/// One damaging hit produced by a spell.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct SpellStrike {
    /// Explicit target; `None` picks uniformly among living opponents.
    pub target: Option<CombatantId>,
    pub amount: f64,
}

/// A spell cast that replaces the hero's attack this turn.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct SpellCast {
    pub spell: String,
    pub strikes: Vec<SpellStrike>,
}

/// Decides whether a hero spends its turn on a ready spell.
pub trait SpellCaster {
    fn choose_spell(
        &mut self,
        caster: &Hero,
        spellbook: &SpellbookView,
        rng: &mut dyn RngProvider,
    ) -> Option<SpellCast>;
}

#[derive(Clone, Copy, Debug, Default)]
pub struct NoSpells;

impl SpellCaster for NoSpells {
    fn choose_spell(&mut self, _: &Hero, _: &SpellbookView, _: &mut dyn RngProvider) -> Option<SpellCast> {
        None
    }
}

/// Counter damage dealt back to a melee attacker.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Recoil {
    pub amount: f64,
    pub source: DamageSource,
}

/// Reactive hooks fired by the pipeline after damage lands.
pub trait ReactionHooks {
    /// Called after a melee attack lands; ranged attacks never reach here.
    fn on_melee_hit(
        &mut self,
        _attacker: &dyn Combatant,
        _target: &dyn Combatant,
        _result: &DamageApplicationResult,
    ) -> Vec<Recoil> {
        Vec::new()
    }

    /// Called after every application with nonzero damage.
    fn on_damage_taken(
        &mut self,
        _target: &dyn Combatant,
        _source: &DamageSource,
        _result: &DamageApplicationResult,
    ) {
    }

    /// Called once a death is final.
    fn on_death(&mut self, _victim: &dyn Combatant, _killer: Option<CombatantId>) {}
}

#[derive(Clone, Copy, Debug, Default)]
pub struct NoReactions;

impl ReactionHooks for NoReactions {}

/// Sequencing points where the authoritative side may pause.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum PausePoint {
    /// Actions broadcast, damage not yet applied.
    Travel,
    /// Damage applied, reactions not yet fired.
    Impact,
}

/// Pauses between sub-steps of an action. Never affects outcomes.
pub trait Pacer {
    fn pause(&mut self, point: PausePoint);
}

#[derive(Clone, Copy, Debug, Default)]
pub struct NoPacing;

impl Pacer for NoPacing {
    fn pause(&mut self, _: PausePoint) {}
}

/// Blocks the calling thread for configured durations.
#[derive(Clone, Copy, Debug, Default)]
pub struct SleepPacer {
    pub travel: Duration,
    pub impact: Duration,
}

impl SleepPacer {
    pub fn from_config(config: &PacingConfig) -> Self {
        Self {
            travel: config.travel_delay,
            impact: config.impact_delay,
        }
    }
}

impl Pacer for SleepPacer {
    fn pause(&mut self, point: PausePoint) {
        let delay = match point {
            PausePoint::Travel => self.travel,
            PausePoint::Impact => self.impact,
        };
        if !delay.is_zero() {
            std::thread::sleep(delay);
        }
    }
}
