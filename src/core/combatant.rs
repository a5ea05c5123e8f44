//! Combatants: heroes and the creatures they field.
//!
//! Every combatant is addressed by a [`CombatantId`] built from its absolute
//! side, its lane and, for creatures, its index in the owning hero's list.
//! Ids never change during a battle: dead combatants stay in place with
//! `alive == false` so indices remain stable for replicas.
//!
//! The damage pipeline and target resolver only talk to combatants through
//! the [`Combatant`] capability trait, implemented once for [`Hero`] and once
//! for [`Creature`].

use serde::{Deserialize, Serialize};
use smallvec::SmallVec;
use tracing::warn;

use super::side::{Lane, Side};

/// Hero or creature.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum CombatantKind {
    Hero,
    Creature,
}

/// Absolute, wire-safe combatant identity.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct CombatantId {
    pub side: Side,
    pub lane: Lane,
    /// Index in the hero's creature list; `None` for the hero itself.
    pub creature: Option<u8>,
}

impl CombatantId {
    #[must_use]
    pub const fn hero(side: Side, lane: Lane) -> Self {
        Self { side, lane, creature: None }
    }

    #[must_use]
    pub const fn creature(side: Side, lane: Lane, index: u8) -> Self {
        Self { side, lane, creature: Some(index) }
    }

    #[must_use]
    pub const fn kind(self) -> CombatantKind {
        match self.creature {
            Some(_) => CombatantKind::Creature,
            None => CombatantKind::Hero,
        }
    }

    /// Id of the hero at the same lane (the creature's owner, or itself).
    #[must_use]
    pub const fn owner(self) -> Self {
        Self::hero(self.side, self.lane)
    }
}

impl std::fmt::Display for CombatantId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self.creature {
            Some(index) => write!(f, "{}:{}#{}", self.side, self.lane, index),
            None => write!(f, "{}:{}", self.side, self.lane),
        }
    }
}

/// Hit points and the alive flag.
///
/// `alive` mirrors `hp > 0` except inside the synchronous revival check,
/// where hp has reached zero but death is not yet final.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Vitals {
    hp: u32,
    max_hp: u32,
    alive: bool,
}

impl Vitals {
    #[must_use]
    pub fn new(max_hp: u32) -> Self {
        Self {
            hp: max_hp,
            max_hp,
            alive: max_hp > 0,
        }
    }

    /// Start below max hp (pre-damaged formations).
    #[must_use]
    pub fn with_hp(mut self, hp: u32) -> Self {
        self.hp = hp.min(self.max_hp);
        self.alive = self.hp > 0;
        self
    }

    #[must_use]
    pub fn hp(&self) -> u32 {
        self.hp
    }

    #[must_use]
    pub fn max_hp(&self) -> u32 {
        self.max_hp
    }

    #[must_use]
    pub fn is_alive(&self) -> bool {
        self.alive
    }

    /// Remove up to `amount` hp, floored at zero.
    ///
    /// Returns the hp actually removed and whether this call crossed from
    /// hp > 0 to hp == 0.
    pub fn take(&mut self, amount: u32) -> (u32, bool) {
        let before = self.hp;
        let removed = amount.min(before);
        self.hp = before - removed;
        (removed, before > 0 && self.hp == 0)
    }

    /// Set hp directly (clamped to max) and mark alive.
    pub fn restore(&mut self, hp: u32) {
        self.hp = hp.min(self.max_hp).max(1);
        self.alive = true;
    }

    /// Finalize death.
    pub fn mark_dead(&mut self) {
        self.hp = 0;
        self.alive = false;
    }

    /// Overwrite from a replicated value.
    pub fn mirror(&mut self, hp: u32, alive: bool) {
        self.hp = hp.min(self.max_hp);
        self.alive = alive;
    }
}

/// Capability interface used by targeting and the damage pipeline.
pub trait Combatant {
    fn id(&self) -> CombatantId;

    fn name(&self) -> &str;

    fn vitals(&self) -> &Vitals;

    fn vitals_mut(&mut self) -> &mut Vitals;

    /// Pre-computed attack, static bonuses included.
    fn attack(&self) -> u32;

    /// Current shield. Creatures have no shield layer.
    fn shield(&self) -> u32 {
        0
    }

    fn kind(&self) -> CombatantKind {
        self.id().kind()
    }

    fn is_alive(&self) -> bool {
        self.vitals().is_alive()
    }

    fn hp(&self) -> u32 {
        self.vitals().hp()
    }
}

/// Opaque equipment identity; the core only counts and compares these.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct EquipmentId(pub u32);

/// A spell in a hero's spellbook.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct SpellEntry {
    pub name: String,
    pub enabled: bool,
}

impl SpellEntry {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            enabled: true,
        }
    }

    #[must_use]
    pub fn disabled(mut self) -> Self {
        self.enabled = false;
        self
    }
}

/// A creature fielded by a hero.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Creature {
    pub name: String,
    id: CombatantId,
    pub vitals: Vitals,
    pub attack: u32,
}

impl Creature {
    fn new(id: CombatantId, template: CreatureTemplate) -> Self {
        Self {
            name: template.name,
            id,
            vitals: Vitals::new(template.max_hp),
            attack: template.attack,
        }
    }
}

impl Combatant for Creature {
    fn id(&self) -> CombatantId {
        self.id
    }

    fn name(&self) -> &str {
        &self.name
    }

    fn vitals(&self) -> &Vitals {
        &self.vitals
    }

    fn vitals_mut(&mut self) -> &mut Vitals {
        &mut self.vitals
    }

    fn attack(&self) -> u32 {
        self.attack
    }
}

/// Baseline stats for a creature in a starting formation.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct CreatureTemplate {
    pub name: String,
    pub max_hp: u32,
    pub attack: u32,
}

impl CreatureTemplate {
    pub fn new(name: impl Into<String>, max_hp: u32, attack: u32) -> Self {
        Self {
            name: name.into(),
            max_hp,
            attack,
        }
    }
}

/// A hero occupying one lane.
/// Creatures past this many are dropped: creature indices are a `u8`.
pub const MAX_CREATURES: usize = u8::MAX as usize + 1;

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Hero {
    pub name: String,
    id: CombatantId,
    pub vitals: Vitals,
    pub(crate) shield: u32,
    pub attack: u32,
    /// Ranged heroes skip creatures and never trigger recoil.
    pub ranged: bool,
    pub creatures: SmallVec<[Creature; 4]>,
    pub equipment: SmallVec<[EquipmentId; 4]>,
    pub spells: Vec<SpellEntry>,
}

impl Hero {
    /// Build a hero from its template at the given position.
    #[must_use]
    pub fn from_template(side: Side, lane: Lane, template: HeroTemplate) -> Self {
        let id = CombatantId::hero(side, lane);
        if template.creatures.len() > MAX_CREATURES {
            warn!(%id, count = template.creatures.len(), kept = MAX_CREATURES, "too many creatures, extras dropped");
        }
        let creatures = template
            .creatures
            .into_iter()
            .zip(0..=u8::MAX)
            .map(|(c, i)| Creature::new(CombatantId::creature(side, lane, i), c))
            .collect();

        Self {
            name: template.name,
            id,
            vitals: Vitals::new(template.max_hp).with_hp(template.hp.unwrap_or(template.max_hp)),
            shield: template.shield,
            attack: template.attack,
            ranged: template.ranged,
            creatures,
            equipment: template.equipment.into_iter().collect(),
            spells: template.spells,
        }
    }

    /// First living creature in list order.
    #[must_use]
    pub fn first_living_creature(&self) -> Option<&Creature> {
        self.creatures.iter().find(|c| c.is_alive())
    }

    pub fn living_creatures(&self) -> impl Iterator<Item = &Creature> {
        self.creatures.iter().filter(|c| c.is_alive())
    }

    #[must_use]
    pub fn creature(&self, index: u8) -> Option<&Creature> {
        self.creatures.get(index as usize)
    }

    pub fn creature_mut(&mut self, index: u8) -> Option<&mut Creature> {
        self.creatures.get_mut(index as usize)
    }

    #[must_use]
    pub fn equipment_count(&self) -> usize {
        self.equipment.len()
    }
}

impl Combatant for Hero {
    fn id(&self) -> CombatantId {
        self.id
    }

    fn name(&self) -> &str {
        &self.name
    }

    fn vitals(&self) -> &Vitals {
        &self.vitals
    }

    fn vitals_mut(&mut self) -> &mut Vitals {
        &mut self.vitals
    }

    fn attack(&self) -> u32 {
        self.attack
    }

    fn shield(&self) -> u32 {
        self.shield
    }
}

/// Pre-resolved baseline stats for a hero in a starting formation.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct HeroTemplate {
    pub name: String,
    pub max_hp: u32,
    /// Starting hp; defaults to `max_hp`.
    pub hp: Option<u32>,
    pub shield: u32,
    pub attack: u32,
    pub ranged: bool,
    pub creatures: Vec<CreatureTemplate>,
    pub equipment: Vec<EquipmentId>,
    pub spells: Vec<SpellEntry>,
}

impl HeroTemplate {
    pub fn new(name: impl Into<String>, max_hp: u32, attack: u32) -> Self {
        Self {
            name: name.into(),
            max_hp,
            hp: None,
            shield: 0,
            attack,
            ranged: false,
            creatures: Vec::new(),
            equipment: Vec::new(),
            spells: Vec::new(),
        }
    }

    #[must_use]
    pub fn with_hp(mut self, hp: u32) -> Self {
        self.hp = Some(hp);
        self
    }

    #[must_use]
    pub fn with_shield(mut self, shield: u32) -> Self {
        self.shield = shield;
        self
    }

    #[must_use]
    pub fn ranged(mut self) -> Self {
        self.ranged = true;
        self
    }

    #[must_use]
    pub fn with_creature(mut self, creature: CreatureTemplate) -> Self {
        self.creatures.push(creature);
        self
    }

    #[must_use]
    pub fn with_equipment(mut self, equipment: EquipmentId) -> Self {
        self.equipment.push(equipment);
        self
    }

    #[must_use]
    pub fn with_spell(mut self, spell: SpellEntry) -> Self {
        self.spells.push(spell);
        self
    }
}
