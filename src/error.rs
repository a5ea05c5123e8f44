//! Error types surfaced by the combat core.
//!
//! Gameplay edge cases (no target, dead target, invalid stage values) are not
//! errors: they degrade to no-ops and are logged. These types cover contract
//! violations by the caller and transport/persistence failures.

use thiserror::Error;

use crate::combat::TurnPhase;
use crate::core::CombatantId;

pub type Result<T> = std::result::Result<T, CombatError>;

#[derive(Debug, Error)]
pub enum CombatError {
    #[error("turn phase cannot move from {from:?} to {to:?}")]
    InvalidTransition { from: TurnPhase, to: TurnPhase },

    #[error("no combatant at {0}")]
    UnknownCombatant(CombatantId),

    #[error("{0} is under heal block and cannot be revived")]
    HealBlocked(CombatantId),

    #[error("{0} is not a hero")]
    NotAHero(CombatantId),

    #[error("battle is already over")]
    BattleOver,
}

/// Failures on the replication wire.
#[derive(Debug, Error)]
pub enum WireError {
    #[error("frame encoding failed")]
    Encode(#[source] bincode::Error),

    #[error("frame decoding failed")]
    Decode(#[source] bincode::Error),

    #[error("frame out of order: expected seq {expected}, got {received}")]
    SequenceGap { expected: u64, received: u64 },

    #[error("unexpected {0} frame")]
    UnexpectedFrame(&'static str),

    #[error("replica references unknown combatant {0}")]
    UnknownCombatant(CombatantId),

    #[error("transport disconnected")]
    Disconnected,
}

/// Failures while persisting a battle snapshot.
#[derive(Debug, Error)]
pub enum SnapshotError {
    #[error("snapshot encoding failed")]
    Encode(#[source] bincode::Error),

    #[error("snapshot decoding failed")]
    Decode(#[source] bincode::Error),

    #[error("snapshot sink rejected write: {0}")]
    Sink(String),
}
