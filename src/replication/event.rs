//! Replicated battle events.
//!
//! Every authoritative mutation a replica needs to mirror is expressed as one
//! of these. Ids are absolute ([`Side::Host`]/[`Side::Guest`]); replicas map
//! them through their own [`Perspective`] for display.
//!
//! [`Side::Host`]: crate::core::Side::Host
//! [`Side::Guest`]: crate::core::Side::Guest
//! [`Perspective`]: crate::core::Perspective

use serde::{Deserialize, Serialize};

use crate::combat::{BattleOutcome, KillRecord, TurnExecution};
use crate::core::CombatantId;
use crate::damage::DamageSource;
use crate::shield::ShieldChange;

/// Why a combatant came back.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RevivalCause {
    /// An immortal stack was spent on a lethal hit.
    Immortal,
    /// An external revive effect.
    External,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ReplicationEvent {
    ShieldChanged(ShieldChange),

    DamageApplied {
        target: CombatantId,
        source: DamageSource,
        total: u32,
        shield: u32,
        hp: u32,
        resulting_hp: u32,
        /// hp crossed from above zero to zero in this application.
        died: bool,
    },

    TurnExecution(TurnExecution),

    ImmortalRevival {
        target: CombatantId,
        hp: u32,
        remaining_stacks: u32,
        cause: RevivalCause,
    },

    HeroDeath {
        target: CombatantId,
        killer: Option<CombatantId>,
    },

    CreatureDeath {
        target: CombatantId,
        killer: Option<CombatantId>,
    },

    KillRecorded(KillRecord),

    /// All damage for the turn has landed; replicas acknowledge this.
    TurnSettled { turn: u32 },

    BattleEnded { outcome: BattleOutcome },
}

impl ReplicationEvent {
    /// Short tag for logs.
    #[must_use]
    pub fn name(&self) -> &'static str {
        match self {
            ReplicationEvent::ShieldChanged(_) => "shield_changed",
            ReplicationEvent::DamageApplied { .. } => "damage_applied",
            ReplicationEvent::TurnExecution(_) => "turn_execution",
            ReplicationEvent::ImmortalRevival { .. } => "immortal_revival",
            ReplicationEvent::HeroDeath { .. } => "hero_death",
            ReplicationEvent::CreatureDeath { .. } => "creature_death",
            ReplicationEvent::KillRecorded(_) => "kill_recorded",
            ReplicationEvent::TurnSettled { .. } => "turn_settled",
            ReplicationEvent::BattleEnded { .. } => "battle_ended",
        }
    }
}
