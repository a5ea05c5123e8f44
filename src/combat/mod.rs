//! Turn orchestration on the authoritative side.
//!
//! - [`BattleSession`]: the single owner of battle state
//! - [`CombatResolver`]: lane turns, simultaneity and the turn state machine
//! - [`TurnExecution`] / [`LaneAction`]: resolved actions as broadcast
//! - [`KillRecord`], [`CombatLog`]: bookkeeping
//! - [`BattleSnapshot`]: persistence

mod action;
mod kill;
pub mod log;
mod resolver;
mod session;
mod snapshot;

pub use action::{IdleReason, LaneAction, ResolvedStrike, SpellAction, TurnAction, TurnExecution};
pub use kill::KillRecord;
pub use log::{CombatLog, LogEntry, LogKind};
pub use resolver::{AnimationMode, CombatResolver, TurnBarrier, TurnPhase, TurnReport, Unreplicated};
pub use session::{BattleOutcome, BattleSession};
pub use snapshot::{BattleSnapshot, MemorySink, SnapshotSink};
