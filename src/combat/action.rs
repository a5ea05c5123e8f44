//! Fully resolved turn actions, as broadcast before damage lands.

use serde::{Deserialize, Serialize};
use smallvec::SmallVec;

use crate::core::{CombatantId, Lane};
use crate::targeting::TargetDescriptor;

/// One resolved attack.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct TurnAction {
    pub attacker: CombatantId,
    pub target: TargetDescriptor,
    /// Damage after every pre-application stage.
    pub damage: u32,
    pub ranged: bool,
    pub protector: Option<CombatantId>,
    pub resisted: bool,
    pub effects_triggered: SmallVec<[String; 2]>,
}

/// One hit of a spell, target already chosen.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResolvedStrike {
    pub target: TargetDescriptor,
    pub damage: u32,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct SpellAction {
    pub caster: CombatantId,
    pub spell: String,
    pub strikes: Vec<ResolvedStrike>,
}

/// Why a hero did nothing this turn.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum IdleReason {
    CannotAct,
    NoTarget,
}

/// What one side's hero does in a lane turn.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LaneAction {
    Attack(TurnAction),
    Spell(SpellAction),
    Idle { hero: CombatantId, reason: IdleReason },
}

impl LaneAction {
    /// The acting hero.
    #[must_use]
    pub fn actor(&self) -> CombatantId {
        match self {
            LaneAction::Attack(action) => action.attacker,
            LaneAction::Spell(spell) => spell.caster,
            LaneAction::Idle { hero, .. } => *hero,
        }
    }

    #[must_use]
    pub fn is_idle(&self) -> bool {
        matches!(self, LaneAction::Idle { .. })
    }
}

/// Everything decided for one turn, broadcast before any damage.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct TurnExecution {
    pub turn: u32,
    /// `None` for a bonus action outside the lane sequence.
    pub lane: Option<Lane>,
    pub actions: Vec<LaneAction>,
    pub bonus: bool,
}

impl TurnExecution {
    /// Both sides act in the same lane turn.
    #[must_use]
    pub fn is_simultaneous(&self) -> bool {
        self.acting_count() == 2
    }

    #[must_use]
    pub fn acting_count(&self) -> usize {
        self.actions.iter().filter(|a| !a.is_idle()).count()
    }
}
