//! Authority/replica integration over the loopback transport.
//!
//! The replica runs on its own thread, as a remote peer would, and must end
//! up with exactly the authority's roster without computing anything.

use std::thread;
use std::time::Duration;

use lane_duel::combat::LogKind;
use lane_duel::core::Perspective;
use lane_duel::providers::Providers;
use lane_duel::replication::{loopback_pair, Frame, Transport};
use lane_duel::{
    AckConfig, AckOutcome, BattleOutcome, BattleSession, CombatConfig, CombatResolver, Combatant, CombatantId,
    CreatureTemplate, HeroTemplate, Lane, RelativeSide, ReplicaMirror, ReplicationChannel, Roster, Side,
    TurnPhase,
};

fn roster() -> Roster {
    Roster::from_templates(
        [
            Some(HeroTemplate::new("Vanguard", 90, 18).with_shield(15)),
            Some(HeroTemplate::new("Archer", 60, 14).ranged()),
            None,
        ],
        [
            Some(HeroTemplate::new("Brawler", 80, 16).with_creature(CreatureTemplate::new("Rat", 10, 0))),
            None,
            Some(HeroTemplate::new("Oracle", 70, 12).with_shield(10)),
        ],
    )
}

fn quick_acks() -> AckConfig {
    AckConfig {
        initial_timeout: Duration::from_millis(30),
        min_timeout: Duration::from_millis(10),
        max_timeout: Duration::from_millis(60),
        latency_multiplier: 4.0,
    }
}

#[test]
fn test_replica_mirrors_full_battle() {
    let (authority_end, mut replica_end) = loopback_pair();
    let replica_roster = roster();
    let replica = thread::spawn(move || {
        let mut mirror = ReplicaMirror::new(Side::Guest, replica_roster);
        mirror.serve(&mut replica_end, Duration::from_secs(5)).unwrap();
        mirror
    });

    let mut session = BattleSession::new(CombatConfig::default().with_seed(5), roster(), Providers::default());
    let mut channel = ReplicationChannel::new(authority_end, &session.config().ack);
    let outcome = CombatResolver::new()
        .run_battle(&mut session, &mut channel, 50)
        .unwrap();
    drop(channel);

    let mirror = replica.join().unwrap();
    assert!(outcome.is_over());
    assert_eq!(mirror.outcome(), outcome);
    assert_eq!(mirror.roster(), session.roster());
    assert_eq!(mirror.kills(), session.kills().iter().cloned().collect::<Vec<_>>().as_slice());
    assert_eq!(mirror.settled_turn(), session.turn());
    assert_eq!(mirror.last_execution().map(|e| e.turn), Some(session.turn()));
    assert!(!session.log().iter().any(|e| e.kind == LogKind::AckTimedOut));
}

#[test]
fn test_silent_replica_does_not_stall() {
    let (authority_end, _silent) = loopback_pair();
    let config = CombatConfig::default().with_ack(quick_acks());
    let mut session = BattleSession::new(config, roster(), Providers::default());
    let mut channel = ReplicationChannel::new(authority_end, &session.config().ack);
    let mut resolver = CombatResolver::new();

    let first = resolver
        .execute_lane_turn(&mut session, Lane::Left, &mut channel)
        .unwrap();
    let second = resolver
        .execute_lane_turn(&mut session, Lane::Center, &mut channel)
        .unwrap();

    assert!(matches!(first.ack, Some(AckOutcome::TimedOut { .. })));
    assert!(matches!(second.ack, Some(AckOutcome::TimedOut { .. })));
    assert_eq!(resolver.phase(), TurnPhase::Idle);
    assert_eq!(session.turn(), 2);
    assert_eq!(channel.timeout().current(), Duration::from_millis(60));
    assert_eq!(
        session.log().iter().filter(|e| e.kind == LogKind::AckTimedOut).count(),
        2
    );
}

#[test]
fn test_events_leave_outbox_on_broadcast() {
    let (authority_end, mut replica_end) = loopback_pair();
    let config = CombatConfig::default().with_ack(quick_acks());
    let mut session = BattleSession::new(config, roster(), Providers::default());
    let mut channel = ReplicationChannel::new(authority_end, &session.config().ack);

    CombatResolver::new()
        .execute_lane_turn(&mut session, Lane::Left, &mut channel)
        .unwrap();

    assert!(session.pending_events().is_empty());
    let mut seqs = Vec::new();
    while let Some(bytes) = replica_end.recv_timeout(Duration::from_millis(5)).unwrap() {
        if let Frame::Event { seq, .. } = Frame::decode(&bytes).unwrap() {
            seqs.push(seq);
        }
    }
    assert_eq!(seqs, (0..channel.next_seq()).collect::<Vec<_>>());
}

#[test]
fn test_external_shield_ops_replicate() {
    let (authority_end, mut replica_end) = loopback_pair();
    let mut session = BattleSession::new(CombatConfig::default(), roster(), Providers::default());
    let mut channel = ReplicationChannel::new(authority_end, &session.config().ack);
    let mut mirror = ReplicaMirror::new(Side::Host, roster());
    let vanguard = CombatantId::hero(Side::Host, Lane::Left);

    session.add_shield(vanguard, 25).unwrap();
    session.remove_shield(vanguard, 5).unwrap();
    for event in session.drain_events() {
        channel.publish(event).unwrap();
    }
    while let Some(bytes) = replica_end.recv_timeout(Duration::from_millis(5)).unwrap() {
        mirror.ingest(&bytes).unwrap();
    }

    let local = mirror.hero(RelativeSide::Player, Lane::Left).unwrap();
    assert_eq!(local.shield(), 35);
    assert_eq!(local.shield(), session.roster().hero(Side::Host, Lane::Left).unwrap().shield());
}

#[test]
fn test_perspectives_agree_on_absolute_ids() {
    let host_view = Perspective::new(Side::Host);
    let guest_view = Perspective::new(Side::Guest);
    let oracle = CombatantId::hero(Side::Guest, Lane::Right);

    assert_eq!(host_view.relative(oracle.side), RelativeSide::Opponent);
    assert_eq!(guest_view.relative(oracle.side), RelativeSide::Player);
    assert_eq!(
        host_view.absolute(RelativeSide::Opponent),
        guest_view.absolute(RelativeSide::Player)
    );
}

#[test]
fn test_replica_sees_battle_end() {
    let (authority_end, mut replica_end) = loopback_pair();
    let roster = Roster::from_templates(
        [Some(HeroTemplate::new("Titan", 500, 200)), None, None],
        [Some(HeroTemplate::new("Sprite", 20, 1)), None, None],
    );
    let replica_roster = roster.clone();
    let replica = thread::spawn(move || {
        let mut mirror = ReplicaMirror::new(Side::Guest, replica_roster);
        mirror.serve(&mut replica_end, Duration::from_secs(5)).unwrap();
        mirror
    });

    let mut session = BattleSession::new(CombatConfig::default(), roster, Providers::default());
    let mut channel = ReplicationChannel::new(authority_end, &session.config().ack);
    CombatResolver::new()
        .execute_lane_turn(&mut session, Lane::Left, &mut channel)
        .unwrap();
    drop(channel);

    let mirror = replica.join().unwrap();
    assert_eq!(mirror.outcome(), BattleOutcome::Winner(Side::Host));
    assert!(!mirror.hero(RelativeSide::Player, Lane::Left).unwrap().is_alive());
    assert_eq!(mirror.kills().len(), 1);
}
