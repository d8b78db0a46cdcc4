//! Integration Tests: End-to-End Tick Scenarios
//!
//! Drive a [`Hivemind`] through registration, squad setup, combat and loot
//! across several ticks, checking the decisions the host would read back.

use rand::SeedableRng;
use rand::rngs::StdRng;

use hivemind_core::behavior::VulturePhase;
use hivemind_core::combat::CombatEventKind;
use hivemind_core::config::QuestScoringConfig;
use hivemind_core::loot::{LootItem, LootKind};
use hivemind_core::objective::{
    PatrolChooser, PatrolRoute, QuestCandidate, score_quest, select_highest_index, select_route,
};
use hivemind_core::squad::{SquadAction, SquadPersonality, SquadRole};
use hivemind_core::{BotType, EntityId, Heading, Hivemind, HivemindConfig, Position, Sensor, hive};

fn at(x: f32, z: f32) -> Position {
    Position::new(x, 0.0, z)
}

fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}

fn hivemind() -> Hivemind {
    init_tracing();
    Hivemind::with_seed(HivemindConfig::default(), 2024).expect("default config is valid")
}

/// Boss at the origin heading north, three followers close behind.
fn pmc_squad(hm: &mut Hivemind) -> (hivemind_core::SquadId, EntityId, Vec<EntityId>) {
    let squad = hm.create_squad(900);
    let boss = hm.register(1, BotType::Pmc);
    hm.update_position(boss, at(0.0, 0.0), Heading { x: 0.0, z: 1.0 });
    hm.join_squad(squad, boss).expect("room");
    let mut followers = Vec::new();
    for i in 0..3u64 {
        let id = hm.register(10 + i, BotType::Pmc);
        hm.update_position(id, at(2.0 * i as f32, -4.0), Heading { x: 0.0, z: 1.0 });
        hm.join_squad(squad, id).expect("room");
        hm.assign_boss(id, boss);
        followers.push(id);
    }
    (squad, boss, followers)
}

fn item(id: u64, value: f32) -> LootItem {
    LootItem {
        id,
        position: at(0.0, 10.0),
        value,
        size: 1,
        kind: LootKind::Item,
    }
}

// ---------------------------------------------------------------------------
// Squad lifecycle
// ---------------------------------------------------------------------------

#[test]
fn squad_gets_roles_and_positions() {
    let mut hm = hivemind();
    let (squad, _boss, followers) = pmc_squad(&mut hm);
    hm.set_squad_objective(squad, at(0.0, 60.0), 0.0, 120.0).expect("squad exists");
    hm.set_squad_action(squad, SquadAction::HoldPosition);

    let report = hm.tick(1.0);
    assert_eq!(report.squads_updated, 1);
    assert_eq!(report.followers_positioned, 3);
    assert_eq!(hm.squads()[squad].personality, SquadPersonality::TacticalProfessional);

    let roles: Vec<_> = followers
        .iter()
        .map(|f| hm.bots()[*f].squad.expect("member").role)
        .collect();
    assert_eq!(roles, vec![SquadRole::Guard, SquadRole::Overwatch, SquadRole::Guard]);
    for f in &followers {
        let membership = hm.bots()[*f].squad.expect("member");
        assert!(membership.has_tactical_position);
        assert!(membership.tactical_position.is_finite());
    }
}

#[test]
fn combat_turns_escorts_into_flankers() {
    let mut hm = hivemind();
    let (squad, boss, followers) = pmc_squad(&mut hm);
    hm.set_squad_objective(squad, at(0.0, 60.0), 0.0, 120.0).expect("squad exists");
    hm.set_squad_action(squad, SquadAction::MoveToObjective);
    hm.record_event(at(40.0, 20.0), 0.5, 1.0, CombatEventKind::Gunshot, false);
    hm.update_sensor(boss, Sensor::InCombat, true, 0.5);

    hm.tick(1.0);
    for f in &followers {
        assert_ne!(hm.bots()[*f].squad.expect("member").role, SquadRole::Escort);
    }
}

#[test]
fn boss_death_hands_over_the_squad() {
    let mut hm = hivemind();
    let (squad, boss, followers) = pmc_squad(&mut hm);
    hm.bots_mut()[boss].is_active = false;
    hm.bots_mut()[boss].sensors.in_combat = true;

    let report = hm.tick(1.0);
    assert_eq!(report.dead_separated, 1);
    assert_eq!(report.sensors_reset, 1);
    for f in &followers {
        assert!(hm.bots()[*f].boss().is_none());
    }

    hm.deregister(1).expect("registered");
    assert_eq!(hm.squads()[squad].leader(), Some(followers[0]));
    assert_eq!(hive::count_active(hm.bots()), 3);
    assert_eq!(hm.counters().snapshot().entities_removed, 1);
}

// ---------------------------------------------------------------------------
// Loot
// ---------------------------------------------------------------------------

#[test]
fn squad_loot_is_deconflicted() {
    let mut hm = hivemind();
    let (squad, boss, followers) = pmc_squad(&mut hm);
    hm.set_squad_objective(squad, at(0.0, 0.0), 0.0, 120.0).expect("squad exists");
    hm.set_squad_action(squad, SquadAction::Loot);
    hm.update_sensor(boss, Sensor::WantsToLoot, true, 0.0);
    hm.publish_loot_scan(squad, &[item(1, 10_000.0), item(2, 80_000.0), item(3, 40_000.0)]);

    let report = hm.tick(1.0);
    assert_eq!(report.loot_claims, 3);
    assert_eq!(hm.claims().claimed_by(2), Some(boss));
    let follower_items: Vec<_> = followers
        .iter()
        .flat_map(|f| hm.claims().claims_of(*f).to_vec())
        .collect();
    assert_eq!(follower_items, vec![3, 1]);

    // A second tick must not double-claim.
    let report = hm.tick(2.0);
    assert_eq!(report.loot_claims, 0);
    assert_eq!(hm.claims().len(), 3);
}

#[test]
fn fighting_boss_does_not_loot() {
    let mut hm = hivemind();
    let (squad, boss, _) = pmc_squad(&mut hm);
    hm.update_sensor(boss, Sensor::InCombat, true, 0.0);
    hm.publish_loot_scan(squad, &[item(1, 50_000.0)]);
    assert_eq!(hm.tick(1.0).loot_claims, 0);
    assert!(hm.claims().is_empty());
}

// ---------------------------------------------------------------------------
// Combat awareness and behavior
// ---------------------------------------------------------------------------

#[test]
fn events_age_out_of_clusters() {
    let mut hm = hivemind();
    hm.record_event(at(0.0, 0.0), 0.0, 1.0, CombatEventKind::Explosion, true);
    hm.record_event(at(3.0, 0.0), 1.0, 1.0, CombatEventKind::Gunshot, false);
    assert_eq!(hm.tick(2.0).clusters, 1);
    assert!(hm.clusters()[0].has_boss);
    assert!((hm.clusters()[0].intensity - 4.0).abs() < f32::EPSILON);

    let report = hm.tick(500.0);
    assert_eq!(report.events_expired, 2);
    assert_eq!(report.clusters, 0);
    assert!(hm.events().get_nearest_event(0.0, 0.0, 100.0, 500.0, 120.0).is_none());
}

#[test]
fn vulture_runs_to_completion() {
    let mut hm = hivemind();
    let bot = hm.register(7, BotType::Scav);
    hm.start_vulture(bot, at(0.0, 0.0), 0.0);

    let steps = [
        (at(100.0, 0.0), 1.0),
        (at(50.0, 0.0), 2.0),
        (at(20.0, 0.0), 3.0),
        (at(20.0, 0.0), 40.0),
        (at(1.0, 0.0), 41.0),
    ];
    for (position, now) in steps {
        hm.update_position(bot, position, Heading { x: -1.0, z: 0.0 });
        hm.tick(now);
    }
    assert_eq!(hm.bots()[bot].behavior.vulture.phase, VulturePhase::Done);
}

#[test]
fn idle_bots_glance_around() {
    let mut hm = hivemind();
    let bot = hm.register(3, BotType::Scav);
    hm.update_position(bot, at(0.0, 0.0), Heading { x: 1.0, z: 0.0 });
    hm.record_event(at(30.0, 0.0), 0.0, 1.0, CombatEventKind::Gunshot, false);
    let report = hm.tick(1.0);
    assert_eq!(report.glances, 1);
    assert_eq!(hm.bots()[bot].behavior.look.target, Some(at(30.0, 0.0)));
}

// ---------------------------------------------------------------------------
// Objective scoring
// ---------------------------------------------------------------------------

#[test]
fn quest_and_patrol_selection() {
    assert_eq!(select_highest_index(&[0.2, 0.9, 0.5]), Some(1));

    let quests = [
        QuestCandidate { min_distance: 50.0, desirability: 30.0, active_for_player: false, exfil_angle: 10.0 },
        QuestCandidate { min_distance: 400.0, desirability: 90.0, active_for_player: true, exfil_angle: 170.0 },
    ];
    let config = QuestScoringConfig {
        distance_randomness: 0.0,
        desirability_randomness: 0.0,
        ..QuestScoringConfig::default()
    };
    let mut rng = StdRng::seed_from_u64(5);
    let max_distance = quests.iter().map(|q| q.min_distance).fold(0.0, f32::max);
    let scores: Vec<f32> = quests
        .iter()
        .map(|q| score_quest(q, max_distance, &config, &mut rng))
        .collect();
    // The far quest wins on desirability but points back past the exfil.
    assert_eq!(select_highest_index(&scores), Some(0));

    let routes = vec![PatrolRoute {
        waypoints: vec![at(10.0, 10.0)],
        min_aggression: 0.0,
        max_aggression: 1.0,
        min_raid_time: 0.0,
        max_raid_time: 1.0,
    }];
    let chooser = PatrolChooser {
        position: at(0.0, 0.0),
        aggression: 0.5,
        raid_time: 0.5,
        seed: 1,
    };
    assert_eq!(select_route(&routes, &chooser, &HivemindConfig::default().patrol), Some(0));
}

#[test]
fn config_round_trips_through_toml_file() {
    let dir = tempfile::tempdir().expect("tempdir");
    let path = dir.path().join("hivemind.toml");
    std::fs::write(&path, "[combat]\ncapacity = 32\n\n[squad]\nmax_members = 4\n").expect("write");
    let config = HivemindConfig::from_file(&path).expect("valid");
    assert_eq!(config.combat.capacity, 32);
    assert_eq!(config.squad.max_members, 4);

    let mut hm = Hivemind::with_seed(config, 1).expect("valid");
    let squad = hm.create_squad(1);
    for i in 0..4 {
        let id = hm.register(i, BotType::Scav);
        hm.join_squad(squad, id).expect("room");
    }
    let extra = hm.register(99, BotType::Scav);
    assert!(hm.join_squad(squad, extra).is_err());
}
