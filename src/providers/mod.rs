//! Collaborator interfaces consumed by the combat core.
//!
//! The core only calls these; artifact, hero, equipment and status systems
//! implement them. A [`Providers`] bundle is handed to the session once at
//! construction, replacing any global lookup.
//!
//! ## Stages and their collaborators
//!
//! - Target selection: [`StatusEffects`] (taunt), [`RngProvider`]
//! - Attacker modifiers: [`AttackEffectsProvider`]
//! - Protection: [`ProtectionProvider`]
//! - Damage-source modification: [`ResistanceProvider`]
//! - Reactions and death: [`ReactionHooks`]
//! - Spell preemption: [`SpellCaster`]
//! - Sequencing pauses: [`Pacer`]

use crate::core::PacingConfig;

pub mod status;
mod combat;
mod hooks;

pub use status::{StatusBoard, StatusEffects};
pub use combat::{
    AttackEffectsProvider, AttackModifiers, NoProtection, NoResistance, PlainAttacks, Protection,
    ProtectionProvider, ResistanceProvider,
};
pub use hooks::{
    NoPacing, NoReactions, NoSpells, Pacer, PausePoint, ReactionHooks, Recoil, SleepPacer,
    SpellCast, SpellCaster, SpellStrike, SpellbookView,
};

/// Seeded, shared randomness.
///
/// Only the authoritative side holds one. Every draw advances the single
/// battle stream, so call order is part of the replay contract.
pub trait RngProvider {
    /// True with probability `percent`/100.
    fn check_chance(&mut self, percent: f64) -> bool;

    /// Uniform integer in `lo..=hi`.
    fn random_int(&mut self, lo: i64, hi: i64) -> i64;

    /// Uniform index into a list of `len` items; `None` when empty.
    fn random_index(&mut self, len: usize) -> Option<usize>;

    /// Uniform pick from a slice.
    fn random_choice<'a, T>(&mut self, items: &'a [T]) -> Option<&'a T>
    where
        Self: Sized,
    {
        self.random_index(items.len()).map(|i| &items[i])
    }
}

/// Every collaborator a session needs.
pub struct Providers {
    pub status: Box<dyn StatusEffects>,
    pub resistance: Box<dyn ResistanceProvider>,
    pub protection: Box<dyn ProtectionProvider>,
    pub attack_effects: Box<dyn AttackEffectsProvider>,
    pub reactions: Box<dyn ReactionHooks>,
    pub spells: Box<dyn SpellCaster>,
    /// `None` paces from [`PacingConfig`] when the session opens.
    pub pacer: Option<Box<dyn Pacer>>,
}

impl Default for Providers {
    fn default() -> Self {
        Self {
            status: Box::new(StatusBoard::new()),
            resistance: Box::new(NoResistance),
            protection: Box::new(NoProtection),
            attack_effects: Box::new(PlainAttacks),
            reactions: Box::new(NoReactions),
            spells: Box::new(NoSpells),
            pacer: None,
        }
    }
}

impl Providers {
    pub fn with_status(mut self, status: impl StatusEffects + 'static) -> Self {
        self.status = Box::new(status);
        self
    }

    pub fn with_resistance(mut self, resistance: impl ResistanceProvider + 'static) -> Self {
        self.resistance = Box::new(resistance);
        self
    }

    pub fn with_protection(mut self, protection: impl ProtectionProvider + 'static) -> Self {
        self.protection = Box::new(protection);
        self
    }

    pub fn with_attack_effects(mut self, effects: impl AttackEffectsProvider + 'static) -> Self {
        self.attack_effects = Box::new(effects);
        self
    }

    pub fn with_reactions(mut self, reactions: impl ReactionHooks + 'static) -> Self {
        self.reactions = Box::new(reactions);
        self
    }

    pub fn with_spells(mut self, spells: impl SpellCaster + 'static) -> Self {
        self.spells = Box::new(spells);
        self
    }

    pub fn with_pacer(mut self, pacer: impl Pacer + 'static) -> Self {
        self.pacer = Some(Box::new(pacer));
        self
    }

    /// Fill in a pacer from config unless one was supplied.
    pub(crate) fn pace_from(&mut self, config: &PacingConfig) {
        if self.pacer.is_some() {
            return;
        }
        self.pacer = Some(if *config == PacingConfig::default() {
            Box::new(NoPacing)
        } else {
            Box::new(SleepPacer::from_config(config))
        });
    }
}
