//! Persistable battle snapshots.
//!
//! A snapshot holds everything outcome-relevant except the collaborators:
//! roster, ledger, RNG position, log, kill records and the immortal stacks
//! already spent. Encoded with bincode.

use im::Vector;
use rustc_hash::FxHashMap;
use serde::{Deserialize, Serialize};

use crate::core::{CombatantId, CombatConfig, GameRngState, Roster};
use crate::error::SnapshotError;
use crate::shield::ShieldLedger;

use super::log::CombatLog;
use super::{BattleOutcome, KillRecord};

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct BattleSnapshot {
    pub turn: u32,
    pub config: CombatConfig,
    pub roster: Roster,
    pub ledger: ShieldLedger,
    pub rng: GameRngState,
    pub log: CombatLog,
    pub kills: Vector<KillRecord>,
    /// Re-applied to the status provider on restore.
    pub spent_immortal: FxHashMap<CombatantId, u32>,
}

impl BattleSnapshot {
    pub fn encode(&self) -> Result<Vec<u8>, SnapshotError> {
        bincode::serialize(self).map_err(SnapshotError::Encode)
    }

    pub fn decode(bytes: &[u8]) -> Result<Self, SnapshotError> {
        bincode::deserialize(bytes).map_err(SnapshotError::Decode)
    }

    #[must_use]
    pub fn outcome(&self) -> BattleOutcome {
        BattleOutcome::of(&self.roster)
    }
}

/// Destination for snapshots written after each settled turn.
pub trait SnapshotSink {
    fn persist(&mut self, snapshot: &BattleSnapshot) -> Result<(), SnapshotError>;
}

/// Keeps encoded snapshots in memory, newest last.
#[derive(Clone, Debug, Default)]
pub struct MemorySink {
    frames: Vec<Vec<u8>>,
}

impl MemorySink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.frames.len()
    }

    pub fn is_empty(&self) -> bool {
        self.frames.is_empty()
    }

    /// Decode the most recent snapshot.
    pub fn latest(&self) -> Option<Result<BattleSnapshot, SnapshotError>> {
        self.frames.last().map(|bytes| BattleSnapshot::decode(bytes))
    }
}

impl SnapshotSink for MemorySink {
    fn persist(&mut self, snapshot: &BattleSnapshot) -> Result<(), SnapshotError> {
        self.frames.push(snapshot.encode()?);
        Ok(())
    }
}

/// Lets a session and an observer share one sink.
impl<S: SnapshotSink> SnapshotSink for std::sync::Arc<std::sync::Mutex<S>> {
    fn persist(&mut self, snapshot: &BattleSnapshot) -> Result<(), SnapshotError> {
        let mut sink = self
            .lock()
            .map_err(|_| SnapshotError::Sink("sink lock poisoned".to_string()))?;
        sink.persist(snapshot)
    }
}
