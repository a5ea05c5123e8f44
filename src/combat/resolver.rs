//! Lane-turn execution.
//!
//! ## Turn lifecycle
//!
//! ```text
//! Idle → ActionsDetermined → Animating(mode) → DamageApplied → Acknowledged → Idle
//! ```
//!
//! Both sides' actions for a lane are fully resolved (targets, damage values,
//! RNG draws) before either is applied, so the outcome of a simultaneous
//! exchange does not depend on application order. The resolved actions are
//! broadcast before any damage lands; replicas then see the damage events and
//! acknowledge the settled turn.
//!
//! A lane turn with no acting hero only logs a no-op marker: nothing is
//! broadcast, no acknowledgement is awaited, and the machine goes from
//! `ActionsDetermined` through `DamageApplied` back to `Idle`. Bonus actions
//! run outside the lane sequence and return to `Idle` without waiting for an
//! acknowledgement.

use std::time::Duration;

use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::core::{Combatant, CombatantId, CombatantKind, Lane, Side};
use crate::damage::{DamageApplicationResult, DamageContext, DamagePipeline, DamageSource, ResolvedDamage};
use crate::error::{CombatError, Result};
use crate::providers::{PausePoint, SpellCast, SpellbookView};
use crate::replication::{AckOutcome, ReplicationEvent};
use crate::targeting::{TargetDescriptor, TargetMode, TargetResolver};

use super::action::{IdleReason, LaneAction, ResolvedStrike, SpellAction, TurnAction, TurnExecution};
use super::log::LogKind;
use super::session::{BattleOutcome, BattleSession};

/// How the resolved actions are presented.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum AnimationMode {
    /// Both sides act; animations overlap.
    Simultaneous,
    Single,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum TurnPhase {
    Idle,
    ActionsDetermined,
    Animating(AnimationMode),
    DamageApplied,
    Acknowledged,
}

impl TurnPhase {
    /// Whether `next` is a legal successor.
    #[must_use]
    pub fn can_advance_to(self, next: TurnPhase) -> bool {
        use TurnPhase::*;
        matches!(
            (self, next),
            (Idle, ActionsDetermined)
                | (ActionsDetermined, Animating(_))
                | (ActionsDetermined, DamageApplied)
                | (Animating(_), DamageApplied)
                | (DamageApplied, Acknowledged)
                | (DamageApplied, Idle)
                | (Acknowledged, Idle)
        )
    }
}

/// Point where replication hooks into a turn.
///
/// The resolver calls `broadcast` after actions are determined and again
/// after damage settles, then waits on `await_ack` for lane turns.
pub trait TurnBarrier {
    fn broadcast(&mut self, session: &mut BattleSession);

    fn await_ack(&mut self, turn: u32) -> AckOutcome;
}

/// Barrier for a battle with no replica.
///
/// Events stay in the session outbox and every turn is acknowledged at once.
#[derive(Clone, Copy, Debug, Default)]
pub struct Unreplicated;

impl TurnBarrier for Unreplicated {
    fn broadcast(&mut self, _: &mut BattleSession) {}

    fn await_ack(&mut self, _: u32) -> AckOutcome {
        AckOutcome::Acknowledged { latency: Duration::ZERO }
    }
}

/// Summary of one executed turn or bonus action.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct TurnReport {
    pub execution: TurnExecution,
    /// One entry per landed hit, in application order.
    pub results: Vec<(CombatantId, DamageApplicationResult)>,
    /// `None` for bonus actions and quiet lane turns.
    pub ack: Option<AckOutcome>,
    pub outcome: BattleOutcome,
}

/// An action plus the hits it will land.
struct Planned {
    action: LaneAction,
    hits: Vec<ResolvedDamage>,
}

impl Planned {
    fn idle(hero: CombatantId, reason: IdleReason) -> Self {
        Self {
            action: LaneAction::Idle { hero, reason },
            hits: Vec::new(),
        }
    }
}

/// Drives the turn state machine against a session.
#[derive(Clone, Debug)]
pub struct CombatResolver {
    phase: TurnPhase,
}

impl Default for CombatResolver {
    fn default() -> Self {
        Self::new()
    }
}

impl CombatResolver {
    pub fn new() -> Self {
        Self { phase: TurnPhase::Idle }
    }

    pub fn phase(&self) -> TurnPhase {
        self.phase
    }

    /// Move to the next phase, rejecting illegal transitions.
    pub fn advance(&mut self, next: TurnPhase) -> Result<()> {
        if !self.phase.can_advance_to(next) {
            return Err(CombatError::InvalidTransition { from: self.phase, to: next });
        }
        debug!(from = ?self.phase, to = ?next, "turn phase");
        self.phase = next;
        Ok(())
    }

    /// Execute one lane turn for both sides.
    pub fn execute_lane_turn(
        &mut self,
        session: &mut BattleSession,
        lane: Lane,
        barrier: &mut dyn TurnBarrier,
    ) -> Result<TurnReport> {
        self.ensure_ready(session)?;
        let turn = session.begin_turn();
        info!(turn, %lane, "lane turn started");

        let plans: Vec<Planned> = Side::BOTH
            .into_iter()
            .filter_map(|side| plan_hero(session, side, lane))
            .collect();
        let execution = TurnExecution {
            turn,
            lane: Some(lane),
            actions: plans.iter().map(|p| p.action.clone()).collect(),
            bonus: false,
        };
        self.advance(TurnPhase::ActionsDetermined)?;

        if execution.acting_count() == 0 {
            session.record(LogKind::NoAction { lane: Some(lane) });
            self.advance(TurnPhase::DamageApplied)?;
            self.advance(TurnPhase::Idle)?;
            session.persist_snapshot();
            debug!(turn, %lane, "quiet lane turn");
            return Ok(TurnReport {
                execution,
                results: Vec::new(),
                ack: None,
                outcome: session.outcome(),
            });
        }

        let results = self.land(session, &execution, plans, barrier)?;

        session.emit(ReplicationEvent::TurnSettled { turn });
        let outcome = session.announce_outcome();
        session.persist_snapshot();
        barrier.broadcast(session);

        let ack = barrier.await_ack(turn);
        if let AckOutcome::TimedOut { waited } = ack {
            warn!(turn, waited_ms = waited.as_millis() as u64, "replica did not acknowledge, proceeding");
            session.record(LogKind::AckTimedOut);
        }
        self.advance(TurnPhase::Acknowledged)?;
        self.advance(TurnPhase::Idle)?;

        info!(turn, %lane, ?outcome, "lane turn settled");
        Ok(TurnReport {
            execution,
            results,
            ack: Some(ack),
            outcome,
        })
    }

    /// Lane turns for left, center and right, stopping early if the
    /// battle ends.
    pub fn execute_round(
        &mut self,
        session: &mut BattleSession,
        barrier: &mut dyn TurnBarrier,
    ) -> Result<Vec<TurnReport>> {
        let mut reports = Vec::with_capacity(Lane::ALL.len());
        for lane in Lane::ALL {
            if session.outcome().is_over() {
                break;
            }
            reports.push(self.execute_lane_turn(session, lane, barrier)?);
        }
        Ok(reports)
    }

    /// Run rounds until one side is defeated or `max_rounds` is reached.
    pub fn run_battle(
        &mut self,
        session: &mut BattleSession,
        barrier: &mut dyn TurnBarrier,
        max_rounds: u32,
    ) -> Result<BattleOutcome> {
        for _ in 0..max_rounds {
            if session.outcome().is_over() {
                break;
            }
            self.execute_round(session, barrier)?;
        }
        Ok(session.outcome())
    }

    /// An extra attack granted outside the lane sequence.
    ///
    /// Uses the same targeting and damage path as a single-side lane action
    /// but does not wait for an acknowledgement. Returns `Ok(None)` when the
    /// hero is dead or cannot act.
    pub fn execute_bonus_action(
        &mut self,
        session: &mut BattleSession,
        hero: CombatantId,
        barrier: &mut dyn TurnBarrier,
    ) -> Result<Option<TurnReport>> {
        if hero.kind() != CombatantKind::Hero {
            return Err(CombatError::NotAHero(hero));
        }
        self.ensure_ready(session)?;
        let actor = session
            .roster
            .hero(hero.side, hero.lane)
            .ok_or(CombatError::UnknownCombatant(hero))?;
        if !actor.is_alive() || !session.providers.status.can_take_action(hero) {
            debug!(%hero, "bonus action skipped");
            return Ok(None);
        }
        let ranged = actor.ranged;

        let plan = plan_attack(session, hero, ranged);
        let execution = TurnExecution {
            turn: session.turn,
            lane: None,
            actions: vec![plan.action.clone()],
            bonus: true,
        };
        self.advance(TurnPhase::ActionsDetermined)?;
        info!(%hero, turn = session.turn, "bonus action");

        let results = self.land(session, &execution, vec![plan], barrier)?;
        let outcome = session.announce_outcome();
        barrier.broadcast(session);
        self.advance(TurnPhase::Idle)?;

        Ok(Some(TurnReport {
            execution,
            results,
            ack: None,
            outcome,
        }))
    }

    fn ensure_ready(&self, session: &BattleSession) -> Result<()> {
        if self.phase != TurnPhase::Idle {
            return Err(CombatError::InvalidTransition {
                from: self.phase,
                to: TurnPhase::ActionsDetermined,
            });
        }
        if session.outcome().is_over() {
            return Err(CombatError::BattleOver);
        }
        Ok(())
    }

    /// Broadcast the resolved actions, animate, then apply every hit.
    fn land(
        &mut self,
        session: &mut BattleSession,
        execution: &TurnExecution,
        plans: Vec<Planned>,
        barrier: &mut dyn TurnBarrier,
    ) -> Result<Vec<(CombatantId, DamageApplicationResult)>> {
        let acting = execution.acting_count();
        if acting == 0 {
            session.record(LogKind::NoAction { lane: execution.lane });
        }
        session.emit(ReplicationEvent::TurnExecution(execution.clone()));
        barrier.broadcast(session);

        let mut results = Vec::new();
        if acting > 0 {
            let mode = if execution.is_simultaneous() {
                AnimationMode::Simultaneous
            } else {
                AnimationMode::Single
            };
            self.advance(TurnPhase::Animating(mode))?;
            session.pause(PausePoint::Travel);

            for plan in plans {
                for hit in &plan.hits {
                    match DamagePipeline::apply(session, hit) {
                        Some(result) => results.push((hit.target, result)),
                        None => warn!(actor = %plan.action.actor(), target = %hit.target, "hit aborted"),
                    }
                }
            }
        }
        self.advance(TurnPhase::DamageApplied)?;
        Ok(results)
    }
}

/// Decide what the hero at `lane` on `side` does. `None` when the lane is
/// empty or its hero is dead.
fn plan_hero(session: &mut BattleSession, side: Side, lane: Lane) -> Option<Planned> {
    let hero = session.roster.hero(side, lane)?;
    if !hero.is_alive() {
        return None;
    }
    let id = hero.id();
    let ranged = hero.ranged;

    if !session.providers.status.can_take_action(id) {
        debug!(hero = %id, "hero cannot act");
        return Some(Planned::idle(id, IdleReason::CannotAct));
    }

    let spellbook = SpellbookView::project(&hero.spells);
    if !spellbook.is_empty() {
        let cast = session
            .providers
            .spells
            .choose_spell(hero, &spellbook, &mut session.rng);
        if let Some(cast) = cast {
            return Some(plan_spell(session, id, cast));
        }
    }

    Some(plan_attack(session, id, ranged))
}

fn plan_attack(session: &mut BattleSession, attacker: CombatantId, ranged: bool) -> Planned {
    let mode = if ranged {
        TargetMode::MeleeIgnoreCreatures
    } else {
        TargetMode::MeleeWithCreatures
    };
    let target = TargetResolver::new(attacker.side, attacker.lane, mode).resolve(
        &session.roster,
        session.providers.status.as_ref(),
        &mut session.rng,
    );
    let Some(target) = target else {
        debug!(%attacker, "no valid target");
        return Planned::idle(attacker, IdleReason::NoTarget);
    };

    let Some(resolved) = DamagePipeline::resolve_attack(session, attacker, target.id(), !ranged) else {
        session.record(LogKind::ActionAborted {
            actor: Some(attacker),
            reason: format!("could not resolve attack on {}", target.id()),
        });
        return Planned::idle(attacker, IdleReason::NoTarget);
    };

    let damage = resolved.amount();
    session.record(LogKind::Attack {
        attacker,
        target: target.id(),
        damage,
        ranged,
    });
    Planned {
        action: LaneAction::Attack(TurnAction {
            attacker,
            target,
            damage,
            ranged,
            protector: resolved.protector,
            resisted: resolved.resisted,
            effects_triggered: resolved.effects_triggered.clone(),
        }),
        hits: vec![resolved],
    }
}

/// Resolve every strike of a spell. Untargeted strikes pick uniformly
/// among living opponents.
fn plan_spell(session: &mut BattleSession, caster: CombatantId, cast: SpellCast) -> Planned {
    let mut strikes = Vec::with_capacity(cast.strikes.len());
    let mut hits = Vec::with_capacity(cast.strikes.len());

    for strike in cast.strikes {
        let target = match strike.target {
            Some(id) => Some(TargetDescriptor::from(id)),
            None => TargetResolver::new(caster.side, caster.lane, TargetMode::FullyRandom).resolve(
                &session.roster,
                session.providers.status.as_ref(),
                &mut session.rng,
            ),
        };
        let Some(target) = target else {
            continue;
        };
        let context = DamageContext::from_source(DamageSource::Spell, Some(caster));
        let Some(resolved) = DamagePipeline::resolve_raw(session, target.id(), strike.amount, context) else {
            session.record(LogKind::ActionAborted {
                actor: Some(caster),
                reason: format!("could not resolve spell strike on {}", target.id()),
            });
            continue;
        };
        strikes.push(ResolvedStrike {
            target,
            damage: resolved.amount(),
        });
        hits.push(resolved);
    }

    info!(%caster, spell = %cast.spell, strikes = strikes.len(), "spell replaces attack");
    session.record(LogKind::SpellCast {
        caster,
        spell: cast.spell.clone(),
    });
    Planned {
        action: LaneAction::Spell(SpellAction {
            caster,
            spell: cast.spell,
            strikes,
        }),
        hits,
    }
}
