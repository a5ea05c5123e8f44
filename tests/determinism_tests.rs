//! Replay determinism.
//!
//! Two authoritative runs with the same seed, roster and collaborator
//! behavior must emit identical event streams, including when collaborators
//! draw from the shared RNG.

use lane_duel::providers::{
    AttackEffectsProvider, AttackModifiers, Providers, RngProvider, SpellCast, SpellCaster, SpellStrike,
    SpellbookView,
};
use lane_duel::core::SpellEntry;
use lane_duel::providers::status::IMMORTAL;
use lane_duel::{
    BattleSession, BattleSnapshot, CombatConfig, CombatResolver, Combatant, CombatantId, CreatureTemplate,
    DamageContext, Hero, HeroTemplate, Lane, ReplicationEvent, Roster, Side, StatusBoard, Unreplicated,
};

/// Doubles damage on a 25% roll.
struct Crits;

impl AttackEffectsProvider for Crits {
    fn compute_modifiers(
        &mut self,
        _: &dyn Combatant,
        _: &dyn Combatant,
        damage: f64,
        rng: &mut dyn RngProvider,
    ) -> AttackModifiers {
        if rng.check_chance(25.0) {
            let mut modifiers = AttackModifiers::unchanged(damage * 2.0);
            modifiers.effects_triggered.push("crit".to_string());
            modifiers
        } else {
            AttackModifiers::unchanged(damage)
        }
    }
}

/// Casts a random-target bolt a third of the time.
struct Sometimes;

impl SpellCaster for Sometimes {
    fn choose_spell(&mut self, _: &Hero, spellbook: &SpellbookView, rng: &mut dyn RngProvider) -> Option<SpellCast> {
        let spell = spellbook.iter().next()?.to_string();
        if !rng.check_chance(33.0) {
            return None;
        }
        let amount = rng.random_int(5, 15) as f64;
        Some(SpellCast {
            spell,
            strikes: vec![SpellStrike { target: None, amount }],
        })
    }
}

fn roster() -> Roster {
    Roster::from_templates(
        [
            Some(HeroTemplate::new("Sentinel", 120, 14).with_shield(20)),
            Some(HeroTemplate::new("Sorcerer", 90, 9).with_spell(SpellEntry::new("Bolt"))),
            Some(HeroTemplate::new("Ranger", 80, 12).ranged()),
        ],
        [
            Some(HeroTemplate::new("Warden", 110, 13).with_creature(CreatureTemplate::new("Hound", 25, 0))),
            None,
            Some(
                HeroTemplate::new("Shaman", 95, 11)
                    .with_spell(SpellEntry::new("Hex"))
                    .with_creature(CreatureTemplate::new("Totem", 15, 0)),
            ),
        ],
    )
}

fn run(seed: u64) -> (Vec<ReplicationEvent>, BattleSession) {
    let providers = Providers::default().with_attack_effects(Crits).with_spells(Sometimes);
    let mut session = BattleSession::new(CombatConfig::default().with_seed(seed), roster(), providers);
    CombatResolver::new()
        .run_battle(&mut session, &mut Unreplicated, 40)
        .unwrap();
    (session.drain_events(), session)
}

#[test]
fn test_same_seed_same_events() {
    let (first_events, first) = run(1234);
    let (second_events, second) = run(1234);

    assert!(!first_events.is_empty());
    assert_eq!(first_events, second_events);
    assert_eq!(first.roster(), second.roster());
    assert_eq!(first.rng().state(), second.rng().state());
    assert_eq!(first.outcome(), second.outcome());
}

#[test]
fn test_battle_reaches_an_outcome() {
    let (events, session) = run(7);

    assert!(session.outcome().is_over());
    let ended = events
        .iter()
        .filter(|e| matches!(e, ReplicationEvent::BattleEnded { .. }))
        .count();
    assert_eq!(ended, 1);
}

#[test]
fn test_restored_session_continues_identically() {
    let providers = || Providers::default().with_attack_effects(Crits).with_spells(Sometimes);
    let mut original = BattleSession::new(CombatConfig::default().with_seed(99), roster(), providers());
    let mut resolver = CombatResolver::new();
    resolver.execute_round(&mut original, &mut Unreplicated).unwrap();

    let mut restored = BattleSession::restore(original.snapshot(), providers());
    original.drain_events();

    resolver.execute_round(&mut original, &mut Unreplicated).unwrap();
    CombatResolver::new()
        .execute_round(&mut restored, &mut Unreplicated)
        .unwrap();

    assert_eq!(original.drain_events(), restored.drain_events());
    assert_eq!(original.roster(), restored.roster());
}

#[test]
fn test_restore_remembers_spent_immortal_stacks() {
    let warden = CombatantId::hero(Side::Guest, Lane::Left);
    let sentinel = CombatantId::hero(Side::Host, Lane::Left);
    let providers = || Providers::default().with_status(StatusBoard::new().with(warden, IMMORTAL, 1));
    let mut original = BattleSession::new(CombatConfig::default(), roster(), providers());

    let first = original
        .authoritative_apply_damage(warden, 500.0, DamageContext::attack(sentinel, true))
        .unwrap();
    assert!(first.revived);

    let bytes = original.snapshot().encode().unwrap();
    let mut restored = BattleSession::restore(BattleSnapshot::decode(&bytes).unwrap(), providers());
    assert_eq!(restored.status().stacks(warden, IMMORTAL), 0);
    original.drain_events();

    let again = original
        .authoritative_apply_damage(warden, 500.0, DamageContext::attack(sentinel, true))
        .unwrap();
    let resumed = restored
        .authoritative_apply_damage(warden, 500.0, DamageContext::attack(sentinel, true))
        .unwrap();

    assert!(again.died && !again.revived);
    assert_eq!(again, resumed);
    assert_eq!(original.roster(), restored.roster());
    assert_eq!(original.kills(), restored.kills());
    assert_eq!(original.drain_events(), restored.drain_events());
}
