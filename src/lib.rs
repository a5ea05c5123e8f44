//! # lane-duel
//!
//! Host-authoritative combat core for a turn-based, two-party card battler.
//!
//! Each side fields up to three heroes in fixed lanes (left, center, right),
//! each hero optionally fielding creatures. Combat proceeds lane by lane; in
//! every lane turn both sides' heroes act, their attacks resolved before
//! either lands.
//!
//! ## Design Principles
//!
//! 1. **One Authority**: Only the host computes. The guest mirrors
//!    replicated events verbatim and never recomputes combat.
//!
//! 2. **Deterministic**: One seeded RNG per battle. The same seed, roster
//!    and collaborator behavior reproduce the same event stream.
//!
//! 3. **Explicit Session**: All battle state lives on a `BattleSession`
//!    passed by handle. Collaborators (status effects, resistance,
//!    protection, modifiers, reactions, spells) are injected at construction.
//!
//! ## Modules
//!
//! - `core`: Sides, lanes, combatants, roster, RNG, configuration
//! - `providers`: Collaborator interfaces the core calls into
//! - `shield`: Shield ledger
//! - `targeting`: Target resolution (taunt, lane fallback, creatures)
//! - `damage`: The staged damage pipeline
//! - `combat`: Session, turn state machine, snapshots
//! - `replication`: Events, wire frames, authority channel, replica mirror

pub mod core;
pub mod providers;
pub mod shield;
pub mod targeting;
pub mod damage;
pub mod combat;
pub mod replication;
pub mod error;

// Re-export commonly used types
pub use crate::core::{
    Side, RelativeSide, Perspective, Lane, SideMap,
    Combatant, CombatantId, CombatantKind, Creature, CreatureTemplate, Hero, HeroTemplate,
    Formation, Roster,
    GameRng, GameRngState,
    CombatConfig, AckConfig, PacingConfig,
};

pub use crate::providers::{Providers, RngProvider, StatusBoard, StatusEffects};

pub use crate::shield::{ShieldCause, ShieldChange, ShieldLedger};

pub use crate::targeting::{TargetDescriptor, TargetMode, TargetResolver};

pub use crate::damage::{
    DamageApplicationResult, DamageContext, DamagePipeline, DamageSource, ResolvedDamage,
};

pub use crate::combat::{
    BattleOutcome, BattleSession, BattleSnapshot,
    CombatResolver, TurnBarrier, TurnPhase, TurnReport, Unreplicated,
    KillRecord, LaneAction, TurnAction, TurnExecution,
};

pub use crate::replication::{
    AckOutcome, Frame, ReplicaMirror, ReplicationChannel, ReplicationEvent, Transport,
};

pub use crate::error::{CombatError, SnapshotError, WireError};
