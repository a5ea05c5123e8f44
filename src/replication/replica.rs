//! Replica side of replication.
//!
//! A replica never computes combat. It applies each event verbatim to its own
//! copy of the roster, in sequence order, and acknowledges settled turns.
//! Display code asks for combatants by [`RelativeSide`]; the mirror maps that
//! to absolute sides through its [`Perspective`].

use std::time::Duration;

use tracing::{debug, info, warn};

use crate::combat::{BattleOutcome, KillRecord, TurnExecution};
use crate::core::{Combatant, CombatantId, Hero, Lane, Perspective, RelativeSide, Roster, Side};
use crate::error::WireError;

use super::{Frame, ReplicationEvent, RevivalCause, Transport};

#[derive(Clone, Debug)]
pub struct ReplicaMirror {
    perspective: Perspective,
    roster: Roster,
    expected_seq: u64,
    kills: Vec<KillRecord>,
    last_execution: Option<TurnExecution>,
    settled_turn: u32,
    outcome: BattleOutcome,
}

impl ReplicaMirror {
    /// Start from the same roster the authority opened the battle with.
    pub fn new(local: Side, roster: Roster) -> Self {
        Self {
            perspective: Perspective::new(local),
            roster,
            expected_seq: 0,
            kills: Vec::new(),
            last_execution: None,
            settled_turn: 0,
            outcome: BattleOutcome::Ongoing,
        }
    }

    pub fn perspective(&self) -> Perspective {
        self.perspective
    }

    pub fn roster(&self) -> &Roster {
        &self.roster
    }

    pub fn kills(&self) -> &[KillRecord] {
        &self.kills
    }

    /// The most recently broadcast turn actions.
    pub fn last_execution(&self) -> Option<&TurnExecution> {
        self.last_execution.as_ref()
    }

    pub fn settled_turn(&self) -> u32 {
        self.settled_turn
    }

    pub fn outcome(&self) -> BattleOutcome {
        self.outcome
    }

    /// Hero by locally-relative side.
    pub fn hero(&self, side: RelativeSide, lane: Lane) -> Option<&Hero> {
        self.roster.hero(self.perspective.absolute(side), lane)
    }

    /// How this participant labels a combatant's side.
    pub fn relative_side(&self, id: CombatantId) -> RelativeSide {
        self.perspective.relative(id.side)
    }

    /// Decode and apply one frame.
    ///
    /// Returns the ack frame to send back when a turn settled.
    pub fn ingest(&mut self, bytes: &[u8]) -> Result<Option<Frame>, WireError> {
        match Frame::decode(bytes)? {
            Frame::Event { seq, event } => {
                if seq != self.expected_seq {
                    return Err(WireError::SequenceGap {
                        expected: self.expected_seq,
                        received: seq,
                    });
                }
                self.expected_seq += 1;
                Ok(self.apply(&event)?.map(|turn| Frame::Ack { turn }))
            }
            Frame::Ack { turn } => {
                warn!(turn, "replica received an ack frame");
                Err(WireError::UnexpectedFrame("ack"))
            }
        }
    }

    /// Apply one event. Returns the turn to acknowledge, if any.
    pub fn apply(&mut self, event: &ReplicationEvent) -> Result<Option<u32>, WireError> {
        match event {
            ReplicationEvent::ShieldChanged(change) => {
                let hero = self
                    .roster
                    .hero_mut(change.target.side, change.target.lane)
                    .ok_or(WireError::UnknownCombatant(change.target))?;
                hero.shield = change.new;
            }
            ReplicationEvent::DamageApplied {
                target, resulting_hp, ..
            } => {
                let victim = self.combatant_mut(*target)?;
                let alive = victim.is_alive();
                victim.vitals_mut().mirror(*resulting_hp, alive);
            }
            ReplicationEvent::ImmortalRevival { target, hp, cause, .. } => {
                self.combatant_mut(*target)?.vitals_mut().mirror(*hp, true);
                if *cause == RevivalCause::External {
                    if let Some(record) = self.kills.iter_mut().rev().find(|k| k.target == *target) {
                        record.revived = true;
                    }
                }
            }
            ReplicationEvent::HeroDeath { target, .. } | ReplicationEvent::CreatureDeath { target, .. } => {
                self.combatant_mut(*target)?.vitals_mut().mark_dead();
            }
            ReplicationEvent::KillRecorded(record) => self.kills.push(record.clone()),
            ReplicationEvent::TurnExecution(execution) => {
                self.last_execution = Some(execution.clone());
            }
            ReplicationEvent::TurnSettled { turn } => {
                self.settled_turn = *turn;
                debug!(turn, "turn settled on replica");
                return Ok(Some(*turn));
            }
            ReplicationEvent::BattleEnded { outcome } => {
                info!(?outcome, "battle ended on replica");
                self.outcome = *outcome;
            }
        }
        Ok(None)
    }

    /// Process frames until the link stays quiet for `idle` or closes.
    pub fn serve<T: Transport>(&mut self, transport: &mut T, idle: Duration) -> Result<(), WireError> {
        loop {
            let bytes = match transport.recv_timeout(idle) {
                Ok(Some(bytes)) => bytes,
                Ok(None) | Err(WireError::Disconnected) => return Ok(()),
                Err(err) => return Err(err),
            };
            if let Some(ack) = self.ingest(&bytes)? {
                if let Err(err) = transport.send(ack.encode()?) {
                    debug!(error = %err, "authority gone before ack");
                    return Ok(());
                }
            }
        }
    }

    fn combatant_mut(&mut self, id: CombatantId) -> Result<&mut dyn Combatant, WireError> {
        self.roster
            .combatant_mut(id)
            .ok_or(WireError::UnknownCombatant(id))
    }
}
