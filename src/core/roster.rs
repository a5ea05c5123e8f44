//! Battle roster: the two three-lane formations.
//!
//! The roster is built once at battle start and owns every [`Hero`] and
//! [`Creature`]. Lookups go through [`CombatantId`]; a missing lane or
//! creature index simply yields `None`.

use serde::{Deserialize, Serialize};

use super::combatant::{Combatant, CombatantId, Creature, Hero, HeroTemplate};
use super::side::{Lane, Side, SideMap};

/// One side's three lanes. A lane may be empty.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Formation {
    lanes: [Option<Hero>; 3],
}

impl Formation {
    /// Build a formation from up to three hero templates in lane order.
    pub fn from_templates(side: Side, templates: [Option<HeroTemplate>; 3]) -> Self {
        let mut lanes: [Option<Hero>; 3] = Default::default();
        for (lane, template) in Lane::ALL.into_iter().zip(templates) {
            lanes[lane.index()] = template.map(|t| Hero::from_template(side, lane, t));
        }
        Self { lanes }
    }

    #[must_use]
    pub fn hero(&self, lane: Lane) -> Option<&Hero> {
        self.lanes[lane.index()].as_ref()
    }

    pub fn hero_mut(&mut self, lane: Lane) -> Option<&mut Hero> {
        self.lanes[lane.index()].as_mut()
    }

    /// Heroes in roster order (left to right), dead ones included.
    pub fn heroes(&self) -> impl Iterator<Item = &Hero> {
        self.lanes.iter().flatten()
    }

    pub fn alive_heroes(&self) -> impl Iterator<Item = &Hero> {
        self.heroes().filter(|h| h.is_alive())
    }
}

/// Both formations.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Roster {
    formations: SideMap<Formation>,
}

impl Roster {
    pub fn new(host: Formation, guest: Formation) -> Self {
        Self {
            formations: SideMap::new(host, guest),
        }
    }

    /// Convenience constructor from raw templates.
    pub fn from_templates(
        host: [Option<HeroTemplate>; 3],
        guest: [Option<HeroTemplate>; 3],
    ) -> Self {
        Self::new(
            Formation::from_templates(Side::Host, host),
            Formation::from_templates(Side::Guest, guest),
        )
    }

    #[must_use]
    pub fn formation(&self, side: Side) -> &Formation {
        &self.formations[side]
    }

    pub fn formation_mut(&mut self, side: Side) -> &mut Formation {
        &mut self.formations[side]
    }

    #[must_use]
    pub fn hero(&self, side: Side, lane: Lane) -> Option<&Hero> {
        self.formations[side].hero(lane)
    }

    pub fn hero_mut(&mut self, side: Side, lane: Lane) -> Option<&mut Hero> {
        self.formations[side].hero_mut(lane)
    }

    #[must_use]
    pub fn creature(&self, id: CombatantId) -> Option<&Creature> {
        let index = id.creature?;
        self.hero(id.side, id.lane)?.creature(index)
    }

    /// Look up any combatant through the capability trait.
    #[must_use]
    pub fn combatant(&self, id: CombatantId) -> Option<&dyn Combatant> {
        let hero = self.hero(id.side, id.lane)?;
        match id.creature {
            Some(index) => hero.creature(index).map(|c| c as &dyn Combatant),
            None => Some(hero as &dyn Combatant),
        }
    }

    pub fn combatant_mut(&mut self, id: CombatantId) -> Option<&mut dyn Combatant> {
        let hero = self.hero_mut(id.side, id.lane)?;
        match id.creature {
            Some(index) => hero.creature_mut(index).map(|c| c as &mut dyn Combatant),
            None => Some(hero as &mut dyn Combatant),
        }
    }

    /// Every living combatant on a side, heroes before their creatures,
    /// in roster order.
    #[must_use]
    pub fn living_combatants(&self, side: Side) -> Vec<CombatantId> {
        let mut ids = Vec::new();
        for hero in self.formations[side].heroes() {
            if hero.is_alive() {
                ids.push(hero.id());
            }
            ids.extend(hero.living_creatures().map(Combatant::id));
        }
        ids
    }

    /// True while the side has at least one living hero.
    #[must_use]
    pub fn has_living_hero(&self, side: Side) -> bool {
        self.formations[side].alive_heroes().next().is_some()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::combatant::CreatureTemplate;

    fn roster() -> Roster {
        Roster::from_templates(
            [
                Some(HeroTemplate::new("A", 50, 10)),
                None,
                Some(HeroTemplate::new("C", 50, 10).with_creature(CreatureTemplate::new("Imp", 5, 2))),
            ],
            [Some(HeroTemplate::new("X", 40, 8)), None, None],
        )
    }

    #[test]
    fn test_lookup_by_id() {
        let roster = roster();

        assert_eq!(roster.combatant(CombatantId::hero(Side::Host, Lane::Left)).map(|c| c.name().to_string()), Some("A".to_string()));
        assert!(roster.combatant(CombatantId::hero(Side::Host, Lane::Center)).is_none());
        assert_eq!(
            roster.creature(CombatantId::creature(Side::Host, Lane::Right, 0)).map(|c| c.name.as_str()),
            Some("Imp")
        );
        assert!(roster.creature(CombatantId::creature(Side::Host, Lane::Right, 3)).is_none());
    }

    #[test]
    fn test_living_combatants_order() {
        let roster = roster();
        let ids = roster.living_combatants(Side::Host);
        assert_eq!(
            ids,
            vec![
                CombatantId::hero(Side::Host, Lane::Left),
                CombatantId::hero(Side::Host, Lane::Right),
                CombatantId::creature(Side::Host, Lane::Right, 0),
            ]
        );
    }

    #[test]
    fn test_has_living_hero() {
        let mut roster = roster();
        assert!(roster.has_living_hero(Side::Guest));

        roster.hero_mut(Side::Guest, Lane::Left).unwrap().vitals.mark_dead();
        assert!(!roster.has_living_hero(Side::Guest));
    }
}
