//! Lane-based target selection.
//!
//! Attackers prefer, in order:
//! 1. Taunting lanes (own lane first, then nearest, then the rest)
//! 2. The mirrored lane
//! 3. A lane fallback (left → center → right, right → center → left,
//!    center → a random alive hero)
//! 4. Any lane with a living hero, in roster order
//! 5. Creatures left behind by a fallen hero
//!
//! Steps 2 to 4 only consider lanes whose hero is alive.
//!
//! Within a lane, melee attacks hit the first living creature before the
//! hero; ranged attacks always hit the hero.

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::core::{Combatant, CombatantId, CombatantKind, Lane, Roster, Side};
use crate::providers::status::TAUNTING;
use crate::providers::{RngProvider, StatusEffects};

/// How a target is picked.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum TargetMode {
    /// Melee: creatures shield their hero.
    MeleeWithCreatures,
    /// Ranged: always the hero.
    MeleeIgnoreCreatures,
    /// Uniform over every living opposing combatant. Used by trigger effects.
    FullyRandom,
}

/// A resolved target.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct TargetDescriptor {
    pub kind: CombatantKind,
    pub side: Side,
    pub lane: Lane,
    /// Present only for creature targets.
    pub creature_index: Option<u8>,
}

impl TargetDescriptor {
    #[must_use]
    pub fn id(&self) -> CombatantId {
        CombatantId {
            side: self.side,
            lane: self.lane,
            creature: self.creature_index,
        }
    }
}

impl From<CombatantId> for TargetDescriptor {
    fn from(id: CombatantId) -> Self {
        Self {
            kind: id.kind(),
            side: id.side,
            lane: id.lane,
            creature_index: id.creature,
        }
    }
}

/// Target resolver for one attacker.
#[derive(Clone, Copy, Debug)]
pub struct TargetResolver {
    attacker_side: Side,
    attacker_lane: Lane,
    mode: TargetMode,
}

impl TargetResolver {
    pub fn new(attacker_side: Side, attacker_lane: Lane, mode: TargetMode) -> Self {
        Self {
            attacker_side,
            attacker_lane,
            mode,
        }
    }

    /// Pick a target among the opposing roster.
    ///
    /// Returns `None` only when nothing on the opposing side can be hit.
    /// RNG is drawn only for a center fallback or `FullyRandom`.
    pub fn resolve(
        &self,
        roster: &Roster,
        status: &dyn StatusEffects,
        rng: &mut dyn RngProvider,
    ) -> Option<TargetDescriptor> {
        let opposing = self.attacker_side.opponent();

        if self.mode == TargetMode::FullyRandom {
            let living = roster.living_combatants(opposing);
            let picked = rng.random_index(living.len()).map(|i| living[i]);
            return picked.map(TargetDescriptor::from);
        }

        let zones = self.taunting_zones(roster, status);
        for lane in &zones {
            if let Some(target) = self.resolve_at(roster, *lane) {
                debug!(attacker_lane = %self.attacker_lane, %lane, "taunt redirected attack");
                return Some(target);
            }
        }

        if let Some(target) = self.resolve_living(roster, self.attacker_lane) {
            return Some(target);
        }

        match self.attacker_lane.fallback_order() {
            Some(order) => {
                for lane in order {
                    if let Some(target) = self.resolve_living(roster, lane) {
                        return Some(target);
                    }
                }
            }
            None => {
                let alive: Vec<Lane> = roster
                    .formation(opposing)
                    .alive_heroes()
                    .map(|h| h.id().lane)
                    .collect();
                if let Some(lane) = rng.random_index(alive.len()).map(|i| alive[i]) {
                    if let Some(target) = self.resolve_at(roster, lane) {
                        return Some(target);
                    }
                }
            }
        }

        if let Some(target) = Lane::ALL.into_iter().find_map(|lane| self.resolve_living(roster, lane)) {
            return Some(target);
        }
        let orphan = Lane::ALL.into_iter().find_map(|lane| self.resolve_at(roster, lane));
        if orphan.is_some() {
            debug!(attacker_lane = %self.attacker_lane, "only creatures of fallen heroes remain");
        }
        orphan
    }

    /// Lanes with a living, taunting opposing hero, in preference order.
    ///
    /// Own lane first; others by lane distance, ties broken left to right.
    fn taunting_zones(&self, roster: &Roster, status: &dyn StatusEffects) -> Vec<Lane> {
        let mut zones: Vec<Lane> = roster
            .formation(self.attacker_side.opponent())
            .alive_heroes()
            .filter(|h| status.has_status_effect(h.id(), TAUNTING))
            .map(|h| h.id().lane)
            .collect();
        zones.sort_by_key(|lane| (lane.distance(self.attacker_lane), lane.index()));
        zones
    }

    /// [`Self::resolve_at`], but only when the lane's hero is alive.
    fn resolve_living(&self, roster: &Roster, lane: Lane) -> Option<TargetDescriptor> {
        let hero = roster.hero(self.attacker_side.opponent(), lane)?;
        if !hero.is_alive() {
            return None;
        }
        self.resolve_at(roster, lane)
    }

    /// Apply the position rule at one opposing lane.
    fn resolve_at(&self, roster: &Roster, lane: Lane) -> Option<TargetDescriptor> {
        let hero = roster.hero(self.attacker_side.opponent(), lane)?;

        if self.mode == TargetMode::MeleeWithCreatures {
            if let Some(creature) = hero.first_living_creature() {
                return Some(creature.id().into());
            }
        }

        hero.is_alive().then(|| hero.id().into())
    }
}
