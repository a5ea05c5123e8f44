//! The battle session.
//!
//! One [`BattleSession`] exists per battle on the authoritative side. It owns
//! the roster, the shield ledger, the shared RNG, the collaborators and the
//! outgoing event queue, and is passed by handle to the damage pipeline and
//! the combat resolver. Nothing is looked up globally.
//!
//! ## Event flow
//!
//! Every authoritative mutation pushes a
//! [`ReplicationEvent`] onto the outbox. The replication channel drains the
//! outbox at broadcast points; tests can drain it directly.

use im::Vector;
use rustc_hash::FxHashMap;
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::core::{Combatant, CombatantId, CombatantKind, CombatConfig, GameRng, Hero, Roster, Side};
use crate::damage::{DamageApplicationResult, DamageContext, DamagePipeline};
use crate::error::{CombatError, Result};
use crate::providers::status::{HEAL_BLOCK, IMMORTAL};
use crate::providers::{PausePoint, Providers, StatusEffects};
use crate::replication::{ReplicationEvent, RevivalCause};
use crate::shield::ShieldLedger;

use super::log::{CombatLog, LogKind};
use super::snapshot::{BattleSnapshot, SnapshotSink};
use super::KillRecord;

/// Who, if anyone, has won.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BattleOutcome {
    Ongoing,
    Winner(Side),
    /// Both sides lost their last hero in the same exchange.
    Draw,
}

impl BattleOutcome {
    /// A side loses when none of its heroes is alive.
    #[must_use]
    pub fn of(roster: &Roster) -> Self {
        match (roster.has_living_hero(Side::Host), roster.has_living_hero(Side::Guest)) {
            (true, true) => BattleOutcome::Ongoing,
            (true, false) => BattleOutcome::Winner(Side::Host),
            (false, true) => BattleOutcome::Winner(Side::Guest),
            (false, false) => BattleOutcome::Draw,
        }
    }

    #[must_use]
    pub fn is_over(self) -> bool {
        self != BattleOutcome::Ongoing
    }
}

/// Authoritative battle state.
pub struct BattleSession {
    pub(crate) config: CombatConfig,
    pub(crate) roster: Roster,
    pub(crate) ledger: ShieldLedger,
    pub(crate) providers: Providers,
    pub(crate) rng: GameRng,
    pub(crate) turn: u32,
    pub(crate) log: CombatLog,
    pub(crate) kills: Vector<KillRecord>,
    /// Immortal stacks spent on revivals, per combatant.
    pub(crate) spent_immortal: FxHashMap<CombatantId, u32>,
    outbox: Vector<ReplicationEvent>,
    ended: bool,
    snapshot_sink: Option<Box<dyn SnapshotSink>>,
}

impl BattleSession {
    /// Open a battle from a starting roster.
    ///
    /// Starting shields are recorded in the ledger as opening gains. Without
    /// a supplied pacer, pauses follow `config.pacing`.
    pub fn new(config: CombatConfig, roster: Roster, mut providers: Providers) -> Self {
        let mut ledger = ShieldLedger::new();
        for side in Side::BOTH {
            for hero in roster.formation(side).heroes() {
                ledger.open(hero);
            }
        }
        let rng = GameRng::new(config.seed);
        providers.pace_from(&config.pacing);
        info!(seed = config.seed, "battle session opened");

        Self {
            config,
            roster,
            ledger,
            providers,
            rng,
            turn: 0,
            log: CombatLog::new(),
            kills: Vector::new(),
            spent_immortal: FxHashMap::default(),
            outbox: Vector::new(),
            ended: false,
            snapshot_sink: None,
        }
    }

    /// Resume from a persisted snapshot.
    ///
    /// Collaborators are not part of the snapshot and must be supplied again,
    /// in their starting state. Immortal stacks spent before the snapshot are
    /// consumed from the fresh status provider.
    pub fn restore(snapshot: BattleSnapshot, mut providers: Providers) -> Self {
        let ended = snapshot.outcome().is_over();
        providers.pace_from(&snapshot.config.pacing);
        for (&id, &spent) in &snapshot.spent_immortal {
            for _ in 0..spent {
                if !providers.status.consume_stack(id, IMMORTAL) {
                    warn!(%id, spent, "status provider has fewer immortal stacks than were spent");
                    break;
                }
            }
        }
        Self {
            rng: GameRng::from_state(&snapshot.rng),
            config: snapshot.config,
            roster: snapshot.roster,
            ledger: snapshot.ledger,
            providers,
            turn: snapshot.turn,
            log: snapshot.log,
            kills: snapshot.kills,
            spent_immortal: snapshot.spent_immortal,
            outbox: Vector::new(),
            ended,
            snapshot_sink: None,
        }
    }

    /// Persist a snapshot after every settled turn.
    #[must_use]
    pub fn with_snapshot_sink(mut self, sink: impl SnapshotSink + 'static) -> Self {
        self.snapshot_sink = Some(Box::new(sink));
        self
    }

    // === Accessors ===

    pub fn config(&self) -> &CombatConfig {
        &self.config
    }

    pub fn roster(&self) -> &Roster {
        &self.roster
    }

    pub fn ledger(&self) -> &ShieldLedger {
        &self.ledger
    }

    pub fn status(&self) -> &dyn StatusEffects {
        self.providers.status.as_ref()
    }

    pub fn rng(&self) -> &GameRng {
        &self.rng
    }

    /// Number of turns started so far.
    pub fn turn(&self) -> u32 {
        self.turn
    }

    pub fn log(&self) -> &CombatLog {
        &self.log
    }

    pub fn kills(&self) -> &Vector<KillRecord> {
        &self.kills
    }

    /// Events not yet handed to a replication channel.
    pub fn pending_events(&self) -> &Vector<ReplicationEvent> {
        &self.outbox
    }

    pub fn drain_events(&mut self) -> Vec<ReplicationEvent> {
        std::mem::take(&mut self.outbox).into_iter().collect()
    }

    #[must_use]
    pub fn outcome(&self) -> BattleOutcome {
        BattleOutcome::of(&self.roster)
    }

    pub fn snapshot(&self) -> BattleSnapshot {
        BattleSnapshot {
            turn: self.turn,
            config: self.config.clone(),
            roster: self.roster.clone(),
            ledger: self.ledger.clone(),
            rng: self.rng.state(),
            log: self.log.clone(),
            kills: self.kills.clone(),
            spent_immortal: self.spent_immortal.clone(),
        }
    }

    // === Authoritative operations ===

    /// Apply a known amount of damage through the full pipeline.
    ///
    /// Entry point for everything that is not a basic attack: spells,
    /// poison and burn ticks, recoil, external effects.
    pub fn authoritative_apply_damage(
        &mut self,
        target: CombatantId,
        damage: f64,
        context: DamageContext,
    ) -> Option<DamageApplicationResult> {
        DamagePipeline::apply_damage(self, target, damage, context)
    }

    /// Grant shield to a hero. Returns the new shield value.
    pub fn add_shield(&mut self, target: CombatantId, amount: u32) -> Result<u32> {
        let hero = shield_holder(&mut self.roster, target)?;
        let change = self.ledger.add_shield(hero, amount);
        let shield = hero.shield();
        if let Some(change) = change {
            self.emit(ReplicationEvent::ShieldChanged(change));
        }
        Ok(shield)
    }

    /// Strip shield from a hero. Returns the amount actually removed.
    pub fn remove_shield(&mut self, target: CombatantId, amount: u32) -> Result<u32> {
        let hero = shield_holder(&mut self.roster, target)?;
        let (removed, change) = self.ledger.remove_shield(hero, amount);
        if let Some(change) = change {
            self.emit(ReplicationEvent::ShieldChanged(change));
        }
        Ok(removed)
    }

    /// External revive.
    ///
    /// Refused under heal block. Returns `Ok(false)` for a combatant that is
    /// already alive. The most recent kill record for the target is flagged
    /// as revived.
    pub fn revive(&mut self, target: CombatantId, hp: u32) -> Result<bool> {
        if self.providers.status.has_status_effect(target, HEAL_BLOCK) {
            warn!(%target, "revive refused under heal block");
            return Err(CombatError::HealBlocked(target));
        }
        let victim = self
            .roster
            .combatant_mut(target)
            .ok_or(CombatError::UnknownCombatant(target))?;
        if victim.is_alive() {
            return Ok(false);
        }
        victim.vitals_mut().restore(hp);
        let hp = victim.hp();

        let latest = self
            .kills
            .iter()
            .enumerate()
            .filter(|(_, k)| k.target == target)
            .map(|(i, _)| i)
            .last();
        if let Some(index) = latest {
            if let Some(record) = self.kills.get_mut(index) {
                record.revived = true;
            }
        }
        self.ended = false;

        let remaining_stacks = self.providers.status.stacks(target, IMMORTAL);
        info!(%target, hp, "combatant revived");
        self.emit(ReplicationEvent::ImmortalRevival {
            target,
            hp,
            remaining_stacks,
            cause: RevivalCause::External,
        });
        self.record(LogKind::Revived {
            target,
            hp,
            cause: RevivalCause::External,
        });
        Ok(true)
    }

    // === Crate-internal plumbing ===

    pub(crate) fn emit(&mut self, event: ReplicationEvent) {
        self.outbox.push_back(event);
    }

    pub(crate) fn record(&mut self, kind: LogKind) {
        self.log.push(self.turn, kind);
    }

    /// Spend one immortal stack. False when none was left.
    pub(crate) fn spend_immortal(&mut self, target: CombatantId) -> bool {
        if !self.providers.status.consume_stack(target, IMMORTAL) {
            return false;
        }
        *self.spent_immortal.entry(target).or_default() += 1;
        true
    }

    pub(crate) fn pause(&mut self, point: PausePoint) {
        if let Some(pacer) = self.providers.pacer.as_mut() {
            pacer.pause(point);
        }
    }

    pub(crate) fn begin_turn(&mut self) -> u32 {
        self.turn += 1;
        self.turn
    }

    /// Make a death final: mark dead, announce, fire hooks, credit the kill.
    pub(crate) fn finalize_death(&mut self, target: CombatantId, killer: Option<CombatantId>) {
        let Some(victim) = self.roster.combatant_mut(target) else {
            return;
        };
        victim.vitals_mut().mark_dead();

        let target_name = victim.name().to_string();
        info!(%target, name = %target_name, killer = ?killer, "combatant died");
        self.emit(match target.kind() {
            CombatantKind::Hero => ReplicationEvent::HeroDeath { target, killer },
            CombatantKind::Creature => ReplicationEvent::CreatureDeath { target, killer },
        });
        self.record(LogKind::Died { target, killer });

        if let Some(victim) = self.roster.combatant(target) {
            self.providers.reactions.on_death(victim, killer);
        }

        let Some(killer) = killer else {
            return;
        };
        let killer_name = self
            .roster
            .combatant(killer)
            .map(|c| c.name().to_string())
            .unwrap_or_default();
        let record = KillRecord {
            killer,
            killer_name,
            target,
            target_name,
            target_kind: target.kind(),
            turn: self.turn,
            revived: false,
        };
        self.kills.push_back(record.clone());
        self.emit(ReplicationEvent::KillRecorded(record));
    }

    /// Announce the end of the battle once.
    pub(crate) fn announce_outcome(&mut self) -> BattleOutcome {
        let outcome = self.outcome();
        if outcome.is_over() && !self.ended {
            self.ended = true;
            info!(?outcome, turn = self.turn, "battle ended");
            self.emit(ReplicationEvent::BattleEnded { outcome });
        }
        outcome
    }

    /// Hand a snapshot to the sink. Failures are logged and otherwise ignored.
    pub(crate) fn persist_snapshot(&mut self) {
        if self.snapshot_sink.is_none() {
            return;
        }
        let snapshot = self.snapshot();
        if let Some(sink) = self.snapshot_sink.as_mut() {
            if let Err(err) = sink.persist(&snapshot) {
                warn!(turn = snapshot.turn, error = %err, "snapshot persistence failed");
            }
        }
    }
}

fn shield_holder(roster: &mut Roster, target: CombatantId) -> Result<&mut Hero> {
    if target.kind() != CombatantKind::Hero {
        return Err(CombatError::NotAHero(target));
    }
    roster
        .hero_mut(target.side, target.lane)
        .ok_or(CombatError::UnknownCombatant(target))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::{HeroTemplate, Lane};
    use crate::providers::StatusBoard;
    use crate::shield::ShieldCause;

    fn session_with(status: StatusBoard) -> BattleSession {
        let roster = Roster::from_templates(
            [Some(HeroTemplate::new("Knight", 100, 20)), None, None],
            [Some(HeroTemplate::new("Rogue", 60, 30).with_shield(10)), None, None],
        );
        BattleSession::new(
            CombatConfig::default(),
            roster,
            Providers::default().with_status(status),
        )
    }

    fn knight() -> CombatantId {
        CombatantId::hero(Side::Host, Lane::Left)
    }

    fn rogue() -> CombatantId {
        CombatantId::hero(Side::Guest, Lane::Left)
    }

    #[test]
    fn test_opening_shields_are_ledgered() {
        let session = session_with(StatusBoard::new());
        let hero = session.roster().hero(Side::Guest, Lane::Left).unwrap();
        assert!(session.ledger().is_consistent(hero));
    }

    #[test]
    fn test_shield_ops_emit_events() {
        let mut session = session_with(StatusBoard::new());

        assert_eq!(session.add_shield(knight(), 15).unwrap(), 15);
        assert_eq!(session.remove_shield(knight(), 40).unwrap(), 15);
        assert_eq!(session.remove_shield(knight(), 5).unwrap(), 0);

        let causes: Vec<ShieldCause> = session
            .drain_events()
            .into_iter()
            .filter_map(|e| match e {
                ReplicationEvent::ShieldChanged(change) => Some(change.cause),
                _ => None,
            })
            .collect();
        assert_eq!(causes, vec![ShieldCause::Gain, ShieldCause::Loss]);
    }

    #[test]
    fn test_shield_on_creature_rejected() {
        let mut session = session_with(StatusBoard::new());
        let err = session
            .add_shield(CombatantId::creature(Side::Host, Lane::Left, 0), 5)
            .unwrap_err();
        assert!(matches!(err, CombatError::NotAHero(_)));
    }

    #[test]
    fn test_kill_then_external_revive() {
        let mut session = session_with(StatusBoard::new());

        let result = session
            .authoritative_apply_damage(rogue(), 500.0, DamageContext::attack(knight(), true))
            .unwrap();
        assert!(result.died);
        assert_eq!(session.outcome(), BattleOutcome::Winner(Side::Host));
        assert_eq!(session.kills().len(), 1);
        assert_eq!(session.kills()[0].killer_name, "Knight");

        assert!(session.revive(rogue(), 25).unwrap());

        let rogue_hero = session.roster().hero(Side::Guest, Lane::Left).unwrap();
        assert_eq!(rogue_hero.hp(), 25);
        assert!(session.kills()[0].revived);
        assert_eq!(session.outcome(), BattleOutcome::Ongoing);
        assert!(session.drain_events().iter().any(|e| matches!(
            e,
            ReplicationEvent::ImmortalRevival { cause: RevivalCause::External, hp: 25, .. }
        )));
    }

    #[test]
    fn test_revive_refused_under_heal_block() {
        let mut session = session_with(StatusBoard::new().with(rogue(), HEAL_BLOCK, 1));
        session.authoritative_apply_damage(rogue(), 500.0, DamageContext::attack(knight(), true));

        let err = session.revive(rogue(), 25).unwrap_err();
        assert!(matches!(err, CombatError::HealBlocked(_)));
        assert!(!session.roster().hero(Side::Guest, Lane::Left).unwrap().is_alive());
    }

    #[test]
    fn test_revive_living_is_noop() {
        let mut session = session_with(StatusBoard::new());
        assert!(!session.revive(knight(), 10).unwrap());
        assert!(session.drain_events().is_empty());
    }

    #[test]
    fn test_outcome_announced_once() {
        let mut session = session_with(StatusBoard::new());
        session.authoritative_apply_damage(rogue(), 500.0, DamageContext::attack(knight(), true));

        session.announce_outcome();
        session.announce_outcome();

        let ended = session
            .drain_events()
            .into_iter()
            .filter(|e| matches!(e, ReplicationEvent::BattleEnded { .. }))
            .count();
        assert_eq!(ended, 1);
    }
}
