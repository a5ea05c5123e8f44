//! Core battle types: sides, lanes, combatants, roster, RNG, configuration.
//!
//! This module contains the data model every other subsystem builds on.
//! Nothing here performs combat; it only stores and looks up state.

pub mod side;
pub mod combatant;
pub mod roster;
pub mod rng;
pub mod config;

pub use side::{Lane, Perspective, RelativeSide, Side, SideMap};
pub use combatant::{
    Combatant, CombatantId, CombatantKind, Creature, CreatureTemplate, EquipmentId, Hero,
    HeroTemplate, SpellEntry, Vitals, MAX_CREATURES,
};
pub use roster::{Formation, Roster};
pub use rng::{GameRng, GameRngState};
pub use config::{AckConfig, CombatConfig, PacingConfig};
