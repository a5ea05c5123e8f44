//! Damage-stage collaborators.
//!
//! Each trait covers one stage of the damage pipeline that depends on
//! artifact, hero or equipment specifics the core does not know about.
//! The `No*`/`Plain*` types are the identity implementation of each stage.

use serde::{Deserialize, Serialize};
use smallvec::SmallVec;

use crate::core::{Combatant, CombatantId};
use crate::damage::DamageSource;

use super::RngProvider;

/// Decides whether a target resists a damage source.
pub trait ResistanceProvider {
    fn should_resist(
        &self,
        target: &dyn Combatant,
        source: &DamageSource,
        attacker: Option<&dyn Combatant>,
    ) -> bool;
}

/// A protector absorbing part of the damage aimed at someone else.
///
/// The target stays the nominal recipient; only the amount changes.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Protection {
    pub protector: CombatantId,
    pub reduced_damage: f64,
}

/// Finds a protector for a target about to take damage.
pub trait ProtectionProvider {
    fn find_protector(&self, target: &dyn Combatant, damage: f64) -> Option<Protection>;
}

/// Attacker-side modifier output.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct AttackModifiers {
    pub modified_damage: f64,
    /// Opaque labels for replay and the combat log.
    pub effects_triggered: SmallVec<[String; 2]>,
}

impl AttackModifiers {
    /// No modification.
    pub fn unchanged(damage: f64) -> Self {
        Self {
            modified_damage: damage,
            effects_triggered: SmallVec::new(),
        }
    }
}

/// Applies attacker-side modifiers (crits, equipment procs, ...).
///
/// Any randomness must come from the shared battle RNG passed in.
pub trait AttackEffectsProvider {
    fn compute_modifiers(
        &mut self,
        attacker: &dyn Combatant,
        target: &dyn Combatant,
        damage: f64,
        rng: &mut dyn RngProvider,
    ) -> AttackModifiers;
}

#[derive(Clone, Copy, Debug, Default)]
pub struct NoResistance;

impl ResistanceProvider for NoResistance {
    fn should_resist(&self, _: &dyn Combatant, _: &DamageSource, _: Option<&dyn Combatant>) -> bool {
        false
    }
}

#[derive(Clone, Copy, Debug, Default)]
pub struct NoProtection;

impl ProtectionProvider for NoProtection {
    fn find_protector(&self, _: &dyn Combatant, _: f64) -> Option<Protection> {
        None
    }
}

#[derive(Clone, Copy, Debug, Default)]
pub struct PlainAttacks;

impl AttackEffectsProvider for PlainAttacks {
    fn compute_modifiers(
        &mut self,
        _: &dyn Combatant,
        _: &dyn Combatant,
        damage: f64,
        _: &mut dyn RngProvider,
    ) -> AttackModifiers {
        AttackModifiers::unchanged(damage)
    }
}
