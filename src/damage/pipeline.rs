//! Damage pipeline stages.

use smallvec::SmallVec;
use tracing::{debug, info, warn};

use crate::combat::{BattleSession, LogKind};
use crate::core::{Combatant, CombatantId, CombatantKind};
use crate::providers::status::{HEAL_BLOCK, IMMORTAL, WEAKENED};
use crate::providers::{PausePoint, Providers};
use crate::replication::{ReplicationEvent, RevivalCause};

use super::{DamageApplicationResult, DamageContext, DamageSource, ResolvedDamage};

/// Stage names that fell back to the previous value.
type Fallbacks = SmallVec<[&'static str; 2]>;

/// Runs damage through the ordered stages against a session.
///
/// Stateless: everything it reads or mutates lives on the
/// [`BattleSession`] handed in.
pub struct DamagePipeline;

impl DamagePipeline {
    /// Stages 1–4 for a basic attack.
    ///
    /// Reads state and may draw RNG (through attack modifiers), but mutates
    /// no combatant. Returns `None` when either side of the attack is
    /// missing from the roster.
    pub fn resolve_attack(
        session: &mut BattleSession,
        attacker: CombatantId,
        target: CombatantId,
        melee: bool,
    ) -> Option<ResolvedDamage> {
        let (Some(attacker_ref), Some(target_ref)) = (
            session.roster.combatant(attacker),
            session.roster.combatant(target),
        ) else {
            warn!(%attacker, %target, "attack references a missing combatant");
            return None;
        };
        let mut fallbacks = Fallbacks::new();

        // Stage 1: base attack
        let raw = f64::from(attacker_ref.attack());
        let base = if session.providers.status.has_status_effect(attacker, WEAKENED) {
            let weakened = raw * session.config.weakened_multiplier;
            debug!(%attacker, raw, weakened, "weakened attacker");
            checked("weakened", weakened, raw, &mut fallbacks)
        } else {
            raw
        };

        // Stage 2: attacker modifiers
        let modifiers = session.providers.attack_effects.compute_modifiers(
            attacker_ref,
            target_ref,
            base,
            &mut session.rng,
        );
        let after_modifiers = checked("modifiers", modifiers.modified_damage, base, &mut fallbacks);

        let context = DamageContext::attack(attacker, melee);
        let mitigated = mitigate(
            &session.providers,
            session.config.resist_multiplier,
            target_ref,
            Some(attacker_ref),
            &context.source,
            after_modifiers,
            &mut fallbacks,
        );

        let resolved = ResolvedDamage {
            target,
            context,
            base,
            after_modifiers,
            after_protection: mitigated.after_protection,
            final_damage: mitigated.final_damage,
            protector: mitigated.protector,
            resisted: mitigated.resisted,
            effects_triggered: modifiers.effects_triggered,
        };
        record_fallbacks(session, target, &fallbacks);
        debug!(
            %attacker,
            %target,
            base,
            after_modifiers,
            final_damage = resolved.final_damage,
            "attack resolved"
        );
        Some(resolved)
    }

    /// Stages 3–4 for damage with a known amount (spells, status ticks,
    /// recoil, external effects).
    pub fn resolve_raw(
        session: &mut BattleSession,
        target: CombatantId,
        amount: f64,
        context: DamageContext,
    ) -> Option<ResolvedDamage> {
        let Some(target_ref) = session.roster.combatant(target) else {
            warn!(%target, source = %context.source, "damage aimed at a missing combatant");
            return None;
        };
        let attacker_ref = context.attacker.and_then(|id| session.roster.combatant(id));
        let mut fallbacks = Fallbacks::new();

        let base = checked("base", amount, 0.0, &mut fallbacks);
        let mitigated = mitigate(
            &session.providers,
            session.config.resist_multiplier,
            target_ref,
            attacker_ref,
            &context.source,
            base,
            &mut fallbacks,
        );

        let resolved = ResolvedDamage {
            target,
            context,
            base,
            after_modifiers: base,
            after_protection: mitigated.after_protection,
            final_damage: mitigated.final_damage,
            protector: mitigated.protector,
            resisted: mitigated.resisted,
            effects_triggered: SmallVec::new(),
        };
        record_fallbacks(session, target, &fallbacks);
        Some(resolved)
    }

    /// Stages 5–7: split, reactive triggers, revival check.
    ///
    /// A dead target absorbs nothing and yields an all-zero result. Returns
    /// `None` only when the target is missing from the roster.
    pub fn apply(session: &mut BattleSession, resolved: &ResolvedDamage) -> Option<DamageApplicationResult> {
        let target = resolved.target;
        let Some(victim) = session.roster.combatant(target) else {
            warn!(%target, "damage application aborted: target missing");
            session.record(LogKind::ActionAborted {
                actor: resolved.context.attacker,
                reason: format!("missing target {target}"),
            });
            return None;
        };
        if !victim.is_alive() {
            debug!(%target, "damage to a dead combatant ignored");
            return Some(DamageApplicationResult::default());
        }

        if let Some(protector) = resolved.protector {
            session.record(LogKind::Protected { target, protector });
        }
        if resolved.resisted {
            session.record(LogKind::Resisted {
                target,
                source: resolved.context.source.clone(),
            });
        }

        // Stage 5: shield/hp split
        let mut result = split(session, target, resolved.amount())?;
        let resulting_hp = session.roster.combatant(target).map_or(0, |c| c.hp());
        session.emit(ReplicationEvent::DamageApplied {
            target,
            source: resolved.context.source.clone(),
            total: result.total,
            shield: result.shield_damage,
            hp: result.hp_damage,
            resulting_hp,
            died: result.died,
        });
        session.record(LogKind::ShieldHpSplit {
            target,
            source: resolved.context.source.clone(),
            shield: result.shield_damage,
            hp: result.hp_damage,
            resulting_hp,
        });
        debug!(
            %target,
            total = result.total,
            shield = result.shield_damage,
            hp = result.hp_damage,
            resulting_hp,
            "damage applied"
        );

        if result.total > 0 {
            if let Some(victim) = session.roster.combatant(target) {
                session
                    .providers
                    .reactions
                    .on_damage_taken(victim, &resolved.context.source, &result);
            }
        }

        if resolved.context.source == DamageSource::Attack {
            session.pause(PausePoint::Impact);
        }

        // Stage 6: reactive triggers
        if resolved.context.melee {
            if let Some(attacker) = resolved.context.attacker {
                fire_recoil(session, attacker, target, &result);
            }
        }

        // Stage 7: revival check
        if result.died {
            settle_lethal(session, target, resolved.context.attacker, &mut result);
        }

        Some(result)
    }

    /// Full pipeline for a known amount: resolve then apply.
    pub fn apply_damage(
        session: &mut BattleSession,
        target: CombatantId,
        amount: f64,
        context: DamageContext,
    ) -> Option<DamageApplicationResult> {
        let resolved = Self::resolve_raw(session, target, amount, context)?;
        Self::apply(session, &resolved)
    }
}

struct Mitigated {
    after_protection: f64,
    final_damage: f64,
    protector: Option<CombatantId>,
    resisted: bool,
}

/// Stages 3 and 4.
fn mitigate(
    providers: &Providers,
    resist_multiplier: f64,
    target: &dyn Combatant,
    attacker: Option<&dyn Combatant>,
    source: &DamageSource,
    damage: f64,
    fallbacks: &mut Fallbacks,
) -> Mitigated {
    let (after_protection, protector) = match providers.protection.find_protector(target, damage) {
        Some(protection) => {
            debug!(
                target = %target.id(),
                protector = %protection.protector,
                reduced = protection.reduced_damage,
                "protector intercepted damage"
            );
            (
                checked("protection", protection.reduced_damage, damage, fallbacks),
                Some(protection.protector),
            )
        }
        None => (damage, None),
    };

    let resisted = providers.resistance.should_resist(target, source, attacker);
    let final_damage = if resisted {
        debug!(target = %target.id(), %source, "damage resisted");
        checked("resistance", after_protection * resist_multiplier, after_protection, fallbacks)
    } else {
        after_protection
    };

    Mitigated {
        after_protection,
        final_damage,
        protector,
        resisted,
    }
}

/// Keep a stage's output only if it is a usable amount.
fn checked(stage: &'static str, value: f64, previous: f64, fallbacks: &mut Fallbacks) -> f64 {
    if value.is_finite() && value >= 0.0 {
        value
    } else {
        warn!(stage, value, previous, "invalid stage output, keeping previous value");
        fallbacks.push(stage);
        previous
    }
}

fn record_fallbacks(session: &mut BattleSession, target: CombatantId, fallbacks: &Fallbacks) {
    for stage in fallbacks {
        session.record(LogKind::StageFallback {
            stage: (*stage).to_string(),
            target,
        });
    }
}

fn split(session: &mut BattleSession, target: CombatantId, amount: u32) -> Option<DamageApplicationResult> {
    match target.kind() {
        CombatantKind::Hero => {
            let hero = session.roster.hero_mut(target.side, target.lane)?;
            let (result, change) = session.ledger.apply_damage_with_shields(hero, amount);
            if let Some(change) = change {
                session.emit(ReplicationEvent::ShieldChanged(change));
            }
            Some(result)
        }
        CombatantKind::Creature => {
            let creature = session.roster.combatant_mut(target)?;
            let (hp_lost, died) = creature.vitals_mut().take(amount);
            Some(DamageApplicationResult {
                total: amount,
                shield_damage: 0,
                hp_damage: amount,
                hp_lost,
                died,
                revived: false,
            })
        }
    }
}

/// Melee-only counter damage. Recoil is applied as non-melee damage, so it
/// never triggers further recoil.
fn fire_recoil(
    session: &mut BattleSession,
    attacker: CombatantId,
    target: CombatantId,
    result: &DamageApplicationResult,
) {
    let recoils = match (session.roster.combatant(attacker), session.roster.combatant(target)) {
        (Some(a), Some(t)) if a.is_alive() => session.providers.reactions.on_melee_hit(a, t, result),
        _ => Vec::new(),
    };

    for recoil in recoils {
        debug!(%attacker, from = %target, amount = recoil.amount, "recoil");
        let context = DamageContext::from_source(recoil.source, Some(target));
        DamagePipeline::apply_damage(session, attacker, recoil.amount, context);
    }
}

/// Revive on an immortal stack unless heal-blocked; otherwise the death
/// is final.
fn settle_lethal(
    session: &mut BattleSession,
    target: CombatantId,
    killer: Option<CombatantId>,
    result: &mut DamageApplicationResult,
) {
    let immortal = session.providers.status.stacks(target, IMMORTAL);
    let blocked = session.providers.status.has_status_effect(target, HEAL_BLOCK);

    if immortal == 0 || blocked {
        if immortal > 0 {
            debug!(%target, "heal block suppressed immortal revival");
        }
        session.finalize_death(target, killer);
        return;
    }

    let revival_hp = session.config.revival_hp;
    let Some(victim) = session.roster.combatant_mut(target) else {
        return;
    };
    victim.vitals_mut().restore(revival_hp);
    let hp = victim.hp();
    session.spend_immortal(target);
    let remaining_stacks = session.providers.status.stacks(target, IMMORTAL);

    result.died = false;
    result.revived = true;

    info!(%target, hp, remaining_stacks, "immortal stack prevented death");
    session.emit(ReplicationEvent::ImmortalRevival {
        target,
        hp,
        remaining_stacks,
        cause: RevivalCause::Immortal,
    });
    session.record(LogKind::Revived {
        target,
        hp,
        cause: RevivalCause::Immortal,
    });
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::{CombatConfig, CreatureTemplate, HeroTemplate, Lane, Roster, Side};
    use crate::providers::{
        Protection, ProtectionProvider, ReactionHooks, Recoil, ResistanceProvider, StatusBoard,
    };

    fn host(lane: Lane) -> CombatantId {
        CombatantId::hero(Side::Host, lane)
    }

    fn guest(lane: Lane) -> CombatantId {
        CombatantId::hero(Side::Guest, lane)
    }

    fn duel(attacker: HeroTemplate, defender: HeroTemplate) -> Roster {
        Roster::from_templates([None, Some(attacker), None], [None, Some(defender), None])
    }

    fn session(roster: Roster, providers: Providers) -> BattleSession {
        BattleSession::new(CombatConfig::default(), roster, providers)
    }

    struct ResistAll;

    impl ResistanceProvider for ResistAll {
        fn should_resist(&self, _: &dyn Combatant, _: &DamageSource, _: Option<&dyn Combatant>) -> bool {
            true
        }
    }

    struct Bodyguard {
        protector: CombatantId,
        reduced: f64,
    }

    impl ProtectionProvider for Bodyguard {
        fn find_protector(&self, _: &dyn Combatant, _: f64) -> Option<Protection> {
            Some(Protection {
                protector: self.protector,
                reduced_damage: self.reduced,
            })
        }
    }

    struct Thorns(f64);

    impl ReactionHooks for Thorns {
        fn on_melee_hit(
            &mut self,
            _: &dyn Combatant,
            _: &dyn Combatant,
            _: &DamageApplicationResult,
        ) -> Vec<Recoil> {
            vec![Recoil {
                amount: self.0,
                source: DamageSource::Recoil,
            }]
        }
    }

    #[test]
    fn test_shield_absorbs_first() {
        let roster = duel(
            HeroTemplate::new("Attacker", 100, 50),
            HeroTemplate::new("Defender", 100, 10).with_shield(30),
        );
        let mut session = session(roster, Providers::default());

        let resolved =
            DamagePipeline::resolve_attack(&mut session, host(Lane::Center), guest(Lane::Center), true).unwrap();
        let result = DamagePipeline::apply(&mut session, &resolved).unwrap();

        assert_eq!(result.shield_damage, 30);
        assert_eq!(result.hp_damage, 20);
        let defender = session.roster().hero(Side::Guest, Lane::Center).unwrap();
        assert_eq!(defender.hp(), 80);
        assert_eq!(defender.shield(), 0);

        let events = session.drain_events();
        assert!(matches!(
            events[0],
            ReplicationEvent::ShieldChanged(ref change) if change.new == 0 && change.old == 30
        ));
        assert!(matches!(
            events[1],
            ReplicationEvent::DamageApplied { shield: 30, hp: 20, resulting_hp: 80, died: false, .. }
        ));
    }

    #[test]
    fn test_weakened_halves_base() {
        let roster = duel(HeroTemplate::new("A", 100, 40), HeroTemplate::new("D", 100, 10));
        let status = StatusBoard::new().with(host(Lane::Center), WEAKENED, 1);
        let mut session = session(roster, Providers::default().with_status(status));

        let resolved =
            DamagePipeline::resolve_attack(&mut session, host(Lane::Center), guest(Lane::Center), true).unwrap();

        assert_eq!(resolved.base, 20.0);
        assert_eq!(resolved.amount(), 20);
    }

    #[test]
    fn test_resisted_damage_negated() {
        let roster = duel(HeroTemplate::new("A", 100, 40), HeroTemplate::new("D", 100, 10));
        let mut session = session(roster, Providers::default().with_resistance(ResistAll));

        let resolved =
            DamagePipeline::resolve_attack(&mut session, host(Lane::Center), guest(Lane::Center), true).unwrap();

        assert!(resolved.resisted);
        assert_eq!(resolved.amount(), 0);
    }

    #[test]
    fn test_protector_reduces_but_target_is_nominal() {
        let roster = duel(HeroTemplate::new("A", 100, 40), HeroTemplate::new("D", 100, 10));
        let guard = Bodyguard {
            protector: guest(Lane::Left),
            reduced: 15.0,
        };
        let mut session = session(roster, Providers::default().with_protection(guard));

        let resolved =
            DamagePipeline::resolve_attack(&mut session, host(Lane::Center), guest(Lane::Center), true).unwrap();
        let result = DamagePipeline::apply(&mut session, &resolved).unwrap();

        assert_eq!(resolved.protector, Some(guest(Lane::Left)));
        assert_eq!(resolved.target, guest(Lane::Center));
        assert_eq!(result.total, 15);
    }

    #[test]
    fn test_invalid_stage_value_falls_back() {
        let roster = duel(HeroTemplate::new("A", 100, 40), HeroTemplate::new("D", 100, 10));
        let guard = Bodyguard {
            protector: guest(Lane::Left),
            reduced: f64::NAN,
        };
        let mut session = session(roster, Providers::default().with_protection(guard));

        let resolved =
            DamagePipeline::resolve_attack(&mut session, host(Lane::Center), guest(Lane::Center), true).unwrap();

        assert_eq!(resolved.amount(), 40);
        assert!(session
            .log()
            .iter()
            .any(|e| matches!(&e.kind, LogKind::StageFallback { stage, .. } if stage == "protection")));
    }

    #[test]
    fn test_immortal_revival() {
        let roster = duel(
            HeroTemplate::new("A", 100, 50),
            HeroTemplate::new("D", 200, 10).with_hp(15),
        );
        let status = StatusBoard::new().with(guest(Lane::Center), IMMORTAL, 1);
        let mut session = session(roster, Providers::default().with_status(status));

        let resolved =
            DamagePipeline::resolve_attack(&mut session, host(Lane::Center), guest(Lane::Center), true).unwrap();
        let result = DamagePipeline::apply(&mut session, &resolved).unwrap();

        assert!(!result.died);
        assert!(result.revived);
        let defender = session.roster().hero(Side::Guest, Lane::Center).unwrap();
        assert!(defender.is_alive());
        assert_eq!(defender.hp(), 100);
        assert_eq!(session.status().stacks(guest(Lane::Center), IMMORTAL), 0);
        assert!(session.kills().is_empty());
        assert!(session.drain_events().iter().any(|e| matches!(
            e,
            ReplicationEvent::ImmortalRevival { hp: 100, remaining_stacks: 0, cause: RevivalCause::Immortal, .. }
        )));
    }

    #[test]
    fn test_heal_block_suppresses_revival() {
        let roster = duel(
            HeroTemplate::new("A", 100, 50),
            HeroTemplate::new("D", 200, 10).with_hp(15),
        );
        let status = StatusBoard::new()
            .with(guest(Lane::Center), IMMORTAL, 1)
            .with(guest(Lane::Center), HEAL_BLOCK, 1);
        let mut session = session(roster, Providers::default().with_status(status));

        let result =
            DamagePipeline::apply_damage(&mut session, guest(Lane::Center), 50.0, DamageContext::attack(host(Lane::Center), true))
                .unwrap();

        assert!(result.died);
        assert!(!result.revived);
        assert!(!session.roster().hero(Side::Guest, Lane::Center).unwrap().is_alive());
        assert_eq!(session.status().stacks(guest(Lane::Center), IMMORTAL), 1);
        assert_eq!(session.kills().len(), 1);
    }

    #[test]
    fn test_dead_target_is_noop() {
        let roster = duel(HeroTemplate::new("A", 100, 50), HeroTemplate::new("D", 100, 10).with_hp(10));
        let mut session = session(roster, Providers::default());
        let context = DamageContext::attack(host(Lane::Center), true);

        let first = DamagePipeline::apply_damage(&mut session, guest(Lane::Center), 50.0, context.clone()).unwrap();
        assert!(first.died);
        session.drain_events();

        let second = DamagePipeline::apply_damage(&mut session, guest(Lane::Center), 50.0, context).unwrap();
        assert_eq!(second, DamageApplicationResult::default());
        assert!(session.drain_events().is_empty());
        assert_eq!(session.kills().len(), 1);
    }

    #[test]
    fn test_creature_has_no_shield_layer() {
        let roster = duel(
            HeroTemplate::new("A", 100, 50),
            HeroTemplate::new("D", 100, 10)
                .with_shield(50)
                .with_creature(CreatureTemplate::new("Wolf", 30, 5)),
        );
        let mut session = session(roster, Providers::default());
        let wolf = CombatantId::creature(Side::Guest, Lane::Center, 0);

        let result =
            DamagePipeline::apply_damage(&mut session, wolf, 20.0, DamageContext::from_source(DamageSource::Spell, None))
                .unwrap();

        assert_eq!(result.shield_damage, 0);
        assert_eq!(result.hp_damage, 20);
        assert_eq!(session.roster().combatant(wolf).unwrap().hp(), 10);
        assert_eq!(session.roster().hero(Side::Guest, Lane::Center).unwrap().shield(), 50);
    }

    #[test]
    fn test_melee_recoil_hits_attacker_once() {
        let roster = duel(HeroTemplate::new("A", 100, 20), HeroTemplate::new("D", 100, 10));
        let mut session = session(roster, Providers::default().with_reactions(Thorns(7.0)));

        DamagePipeline::apply_damage(&mut session, guest(Lane::Center), 20.0, DamageContext::attack(host(Lane::Center), true));

        // Recoil is not melee, so the thorns do not bounce back again.
        assert_eq!(session.roster().hero(Side::Host, Lane::Center).unwrap().hp(), 93);
        assert_eq!(session.roster().hero(Side::Guest, Lane::Center).unwrap().hp(), 80);
    }

    #[test]
    fn test_ranged_never_recoils() {
        let roster = duel(HeroTemplate::new("A", 100, 20), HeroTemplate::new("D", 100, 10));
        let mut session = session(roster, Providers::default().with_reactions(Thorns(7.0)));

        DamagePipeline::apply_damage(&mut session, guest(Lane::Center), 20.0, DamageContext::attack(host(Lane::Center), false));

        assert_eq!(session.roster().hero(Side::Host, Lane::Center).unwrap().hp(), 100);
    }
}
