//! Append-only combat log.
//!
//! Purely informational: nothing reads it back to decide outcomes. Backed by
//! `im::Vector` so snapshots share structure with the live log.

use im::Vector;
use serde::{Deserialize, Serialize};

use crate::core::{CombatantId, Lane};
use crate::damage::DamageSource;
use crate::replication::RevivalCause;

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct LogEntry {
    pub turn: u32,
    pub kind: LogKind,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub enum LogKind {
    /// How one application was split between shield and hp.
    ShieldHpSplit {
        target: CombatantId,
        source: DamageSource,
        shield: u32,
        hp: u32,
        resulting_hp: u32,
    },
    Attack {
        attacker: CombatantId,
        target: CombatantId,
        damage: u32,
        ranged: bool,
    },
    SpellCast {
        caster: CombatantId,
        spell: String,
    },
    Protected {
        target: CombatantId,
        protector: CombatantId,
    },
    Resisted {
        target: CombatantId,
        source: DamageSource,
    },
    /// A stage produced a non-finite or negative value and was skipped.
    StageFallback {
        stage: String,
        target: CombatantId,
    },
    Revived {
        target: CombatantId,
        hp: u32,
        cause: RevivalCause,
    },
    Died {
        target: CombatantId,
        killer: Option<CombatantId>,
    },
    /// No hero acted in this lane turn.
    NoAction {
        lane: Option<Lane>,
    },
    ActionAborted {
        actor: Option<CombatantId>,
        reason: String,
    },
    AckTimedOut,
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct CombatLog {
    entries: Vector<LogEntry>,
}

impl CombatLog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, turn: u32, kind: LogKind) {
        self.entries.push_back(LogEntry { turn, kind });
    }

    pub fn iter(&self) -> impl Iterator<Item = &LogEntry> {
        self.entries.iter()
    }

    /// Entries belonging to one turn.
    pub fn for_turn(&self, turn: u32) -> impl Iterator<Item = &LogEntry> {
        self.entries.iter().filter(move |e| e.turn == turn)
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    #[must_use]
    pub fn last(&self) -> Option<&LogEntry> {
        self.entries.last()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_log_filters_by_turn() {
        let mut log = CombatLog::new();
        log.push(1, LogKind::NoAction { lane: Some(Lane::Left) });
        log.push(2, LogKind::NoAction { lane: Some(Lane::Center) });
        log.push(2, LogKind::AckTimedOut);

        assert_eq!(log.len(), 3);
        assert_eq!(log.for_turn(2).count(), 2);
        assert_eq!(log.last().map(|e| &e.kind), Some(&LogKind::AckTimedOut));
    }

    #[test]
    fn test_clone_is_independent() {
        let mut log = CombatLog::new();
        log.push(1, LogKind::AckTimedOut);
        let snapshot = log.clone();

        log.push(2, LogKind::AckTimedOut);

        assert_eq!(snapshot.len(), 1);
        assert_eq!(log.len(), 2);
    }
}
