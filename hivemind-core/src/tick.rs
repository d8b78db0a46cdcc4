//! The per-tick pipeline over an owning [`Hivemind`] aggregate.
//!
//! ## Phase order
//!
//! | Phase        | Work                                                 |
//! |--------------|------------------------------------------------------|
//! | Events       | expire stale combat events                           |
//! | Maintenance  | separate dead bots, reset sensors, claims and picks  |
//! | Combat       | cluster events, extract deaths, build candidates     |
//! | Squads       | re-vote personality, refresh tactical positions      |
//! | Loot         | boss then follower claims from the shared scan       |
//! | Behavior     | vulture, room-clear and look-variance machines       |
//!
//! Each phase mutates at most one shared store. Registry add/remove only
//! happens between ticks through the ingestion methods.

use std::sync::Arc;

use rand::SeedableRng;
use rand::rngs::StdRng;
use serde::{Deserialize, Serialize};
use tracing::{debug, info_span, trace};

use crate::behavior::{LookContext, LookInstruction};
use crate::combat::{
    CombatCluster, CombatEvent, CombatEventKind, CombatEventLog, DynamicObjective, EventClusterer,
    filter_death_events, generate_candidates,
};
use crate::config::HivemindConfig;
use crate::error::{HivemindError, Result};
use crate::hive;
use crate::loot::{FollowerLootCheck, LootClaimRegistry, LootItem, follower_may_loot};
use crate::metrics::{HivemindCounters, TickTimer, spans};
use crate::registry::{BotRegistry, SquadRegistry};
use crate::squad::{self, ObjectiveState, SquadAction};
use crate::types::{BotType, EntityId, GameTime, Heading, LootId, PersonalityTag, Position, Sensor, SquadId};

/// Per-tick budget the timer measures against, in milliseconds.
const TICK_BUDGET_MS: f64 = 2.0;

/// Upper bound on dynamic objective candidates per tick.
const MAX_DYNAMIC_OBJECTIVES: usize = 32;

/// What one tick did.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TickReport {
    /// Combat events expired.
    pub events_expired: usize,
    /// Dead bots separated from their groups.
    pub dead_separated: usize,
    /// Dead bots whose sensors were reset.
    pub sensors_reset: usize,
    /// Loot claims released from dead bots.
    pub claims_released: usize,
    /// Combat clusters built.
    pub clusters: usize,
    /// Dynamic objective candidates built.
    pub dynamic_objectives: usize,
    /// Squads whose positions were refreshed.
    pub squads_updated: usize,
    /// Followers that received a tactical position.
    pub followers_positioned: usize,
    /// Loot claims granted during the loot phase.
    pub loot_claims: usize,
    /// Vultures still running after the behavior phase.
    pub vultures_running: usize,
    /// Bots glancing this tick.
    pub glances: usize,
}

/// The whole simulation core for one session.
#[derive(Debug)]
pub struct Hivemind {
    config: HivemindConfig,
    bots: BotRegistry,
    squads: SquadRegistry,
    events: CombatEventLog,
    clusterer: EventClusterer,
    claims: LootClaimRegistry,
    counters: HivemindCounters,
    timer: Arc<TickTimer>,
    rng: StdRng,
    building_markers: Vec<Position>,
    clusters: Vec<CombatCluster>,
    deaths: Vec<CombatEvent>,
    dynamic_objectives: Vec<DynamicObjective>,
}

impl Hivemind {
    /// Build a hivemind from validated configuration, seeding randomness
    /// from the OS.
    ///
    /// # Errors
    /// Returns `HivemindError::Config` if `config` fails validation.
    pub fn new(config: HivemindConfig) -> Result<Self> {
        Self::build(config, StdRng::from_entropy())
    }

    /// Like [`Hivemind::new`] with a fixed seed, for reproducible runs.
    ///
    /// # Errors
    /// Returns `HivemindError::Config` if `config` fails validation.
    pub fn with_seed(config: HivemindConfig, seed: u64) -> Result<Self> {
        Self::build(config, StdRng::seed_from_u64(seed))
    }

    fn build(config: HivemindConfig, rng: StdRng) -> Result<Self> {
        config.validate()?;
        let capacity = config.combat.capacity;
        Ok(Self {
            events: CombatEventLog::new(capacity),
            clusterer: EventClusterer::new(capacity),
            clusters: Vec::with_capacity(config.combat.max_clusters),
            deaths: Vec::new(),
            dynamic_objectives: Vec::with_capacity(MAX_DYNAMIC_OBJECTIVES),
            bots: BotRegistry::new(),
            squads: SquadRegistry::new(),
            claims: LootClaimRegistry::new(),
            counters: HivemindCounters::new(),
            timer: Arc::new(TickTimer::new(TICK_BUDGET_MS)),
            building_markers: Vec::new(),
            rng,
            config,
        })
    }

    // -- accessors ----------------------------------------------------------

    /// Active configuration.
    #[must_use]
    pub fn config(&self) -> &HivemindConfig {
        &self.config
    }

    /// Entity registry.
    #[must_use]
    pub fn bots(&self) -> &BotRegistry {
        &self.bots
    }

    /// Mutable entity registry, for host write-back between ticks.
    pub fn bots_mut(&mut self) -> &mut BotRegistry {
        &mut self.bots
    }

    /// Squad registry.
    #[must_use]
    pub fn squads(&self) -> &SquadRegistry {
        &self.squads
    }

    /// Combat event log.
    #[must_use]
    pub fn events(&self) -> &CombatEventLog {
        &self.events
    }

    /// Loot claims.
    #[must_use]
    pub fn claims(&self) -> &LootClaimRegistry {
        &self.claims
    }

    /// Runtime counters.
    #[must_use]
    pub fn counters(&self) -> &HivemindCounters {
        &self.counters
    }

    /// Tick duration history.
    #[must_use]
    pub fn timer(&self) -> &TickTimer {
        &self.timer
    }

    /// Shared handle to the tick timer, for reading percentiles off-thread.
    #[must_use]
    pub fn timer_handle(&self) -> Arc<TickTimer> {
        Arc::clone(&self.timer)
    }

    /// Clusters from the last tick.
    #[must_use]
    pub fn clusters(&self) -> &[CombatCluster] {
        &self.clusters
    }

    /// Dynamic objective candidates from the last tick.
    #[must_use]
    pub fn dynamic_objectives(&self) -> &[DynamicObjective] {
        &self.dynamic_objectives
    }

    // -- ingestion ----------------------------------------------------------

    /// Register a bot under a host id.
    pub fn register(&mut self, external_id: u64, bot_type: BotType) -> EntityId {
        let id = self.bots.add_with_external(external_id);
        self.bots[id].bot_type = bot_type;
        HivemindCounters::add(&self.counters.entities_added, 1);
        id
    }

    /// Remove a bot: separate it from its group and squad, release its
    /// claims, then drop it from the registry.
    ///
    /// # Errors
    /// `ExternalIdNotFound` if no bot is registered under `external_id`.
    pub fn deregister(&mut self, external_id: u64) -> Result<EntityId> {
        let id = self.bots.by_external(external_id)?;
        hive::separate_from_group(&mut self.bots, id);
        self.squads.remove_member(&mut self.bots, id);
        let released = self.claims.release_all(id);
        self.bots.remove(id);
        HivemindCounters::add(&self.counters.entities_removed, 1);
        debug!(bot = %id, external_id, released, "Bot deregistered");
        Ok(id)
    }

    /// Resolve a host id.
    ///
    /// # Errors
    /// `ExternalIdNotFound` if unmapped.
    pub fn entity_id(&self, external_id: u64) -> Result<EntityId> {
        self.bots.by_external(external_id)
    }

    /// Update where a bot is and which way it faces.
    pub fn update_position(&mut self, id: EntityId, position: Position, facing: Heading) -> bool {
        let Some(bot) = self.bots.get_mut(id) else {
            return false;
        };
        bot.position = position;
        bot.facing = facing;
        true
    }

    /// Write a sensor.
    pub fn update_sensor(&mut self, id: EntityId, sensor: Sensor, value: bool, now: GameTime) -> bool {
        hive::update_sensor(&mut self.bots, id, sensor, value, now)
    }

    /// Push a personality classification.
    pub fn set_personality(&mut self, id: EntityId, personality: PersonalityTag) -> bool {
        let Some(bot) = self.bots.get_mut(id) else {
            return false;
        };
        bot.set_personality(personality);
        true
    }

    /// Link a follower to a boss.
    pub fn assign_boss(&mut self, follower: EntityId, boss: EntityId) -> bool {
        hive::assign_boss(&mut self.bots, follower, boss)
    }

    /// Create a squad under a host id.
    pub fn create_squad(&mut self, external_id: u64) -> SquadId {
        let squad = &self.config.squad;
        self.squads
            .add_with_external(external_id, squad.strategy_count, squad.max_members)
    }

    /// Disband a squad.
    pub fn disband_squad(&mut self, squad: SquadId) -> bool {
        self.squads.remove(squad, &mut self.bots)
    }

    /// Add a bot to a squad.
    ///
    /// # Errors
    /// `SquadNotFound`, `EntityNotFound` or `SquadFull`.
    pub fn join_squad(&mut self, squad: SquadId, bot: EntityId) -> Result<()> {
        self.squads
            .add_member(&mut self.bots, squad, bot, self.config.squad.max_members)
    }

    /// Take a bot out of its squad.
    pub fn leave_squad(&mut self, bot: EntityId) -> bool {
        self.squads.remove_member(&mut self.bots, bot)
    }

    /// Point a squad at a new objective. Returns the new version.
    ///
    /// # Errors
    /// `SquadNotFound` if the squad does not exist.
    pub fn set_squad_objective(
        &mut self,
        squad: SquadId,
        position: Position,
        now: GameTime,
        duration: f32,
    ) -> Result<u32> {
        let entry = self.squads.get_mut(squad).ok_or(HivemindError::SquadNotFound(squad))?;
        let version = entry.objective.set_objective(position, now, duration);
        squad::clear_tactical_positions(entry, &mut self.bots);
        Ok(version)
    }

    /// Set what a squad is doing.
    pub fn set_squad_action(&mut self, squad: SquadId, action: SquadAction) -> bool {
        let Some(entry) = self.squads.get_mut(squad) else {
            return false;
        };
        entry.action = action;
        if action == SquadAction::HoldPosition && entry.objective.state == ObjectiveState::Active {
            entry.objective.state = ObjectiveState::Wait;
        }
        true
    }

    /// Record a combat event.
    pub fn record_event(
        &mut self,
        position: Position,
        time: GameTime,
        power: f32,
        kind: CombatEventKind,
        is_boss: bool,
    ) {
        self.events.record_event(position, time, power, kind, is_boss);
        HivemindCounters::add(&self.counters.events_recorded, 1);
    }

    /// Mark a building entrance for building-clear candidates.
    pub fn add_building_marker(&mut self, position: Position) {
        self.building_markers.push(position);
    }

    /// Share a boss's loot scan with its squad. Returns how many items
    /// fit the buffer.
    pub fn publish_loot_scan(&mut self, squad: SquadId, scan: &[LootItem]) -> usize {
        self.squads
            .get_mut(squad)
            .map_or(0, |entry| entry.loot_share.publish(scan))
    }

    /// Claim loot for a bot.
    pub fn try_claim_loot(&mut self, bot: EntityId, loot: LootId) -> bool {
        let granted = self.claims.try_claim(bot, loot);
        let counter = if granted {
            &self.counters.claims_granted
        } else {
            &self.counters.claims_denied
        };
        HivemindCounters::add(counter, 1);
        granted
    }

    /// Release one claim.
    pub fn release_loot(&mut self, bot: EntityId, loot: LootId) -> bool {
        self.claims.release(bot, loot)
    }

    /// Start a bot stalking a fight at `target`.
    pub fn start_vulture(&mut self, id: EntityId, target: Position, now: GameTime) -> bool {
        let Some(bot) = self.bots.get_mut(id) else {
            return false;
        };
        bot.behavior.vulture.begin(target, now);
        true
    }

    /// Tell the core whether a bot is indoors.
    pub fn set_indoor(&mut self, id: EntityId, indoor: bool) -> bool {
        let Some(bot) = self.bots.get_mut(id) else {
            return false;
        };
        bot.behavior.room_clear.indoor = indoor;
        true
    }

    // -- tick ---------------------------------------------------------------

    /// Advance every system once, in fixed phase order.
    pub fn tick(&mut self, now: GameTime) -> TickReport {
        let timer = Arc::clone(&self.timer);
        let _timing = timer.begin();
        let _tick = info_span!(spans::TICK, now).entered();
        let mut report = TickReport::default();

        {
            let _span = info_span!(spans::EVENT_CLEANUP).entered();
            report.events_expired = self.events.cleanup_expired(now, self.config.combat.max_event_age);
            HivemindCounters::add(&self.counters.events_expired, report.events_expired);
        }

        {
            let _span = info_span!(spans::MAINTENANCE).entered();
            report.dead_separated = hive::cleanup_dead_entities(&mut self.bots);
            report.sensors_reset = hive::reset_inactive_entity_sensors(&mut self.bots);
            for bot in self.bots.iter().filter(|b| !b.is_active) {
                report.claims_released += self.claims.release_all(bot.id);
            }
            for entry in self.squads.iter_mut() {
                let boss_lost = entry
                    .leader()
                    .and_then(|l| self.bots.get(l))
                    .is_none_or(|b| !b.is_active);
                if boss_lost {
                    entry.loot_share.forget_boss_target();
                }
            }
        }

        {
            let _span = info_span!(spans::COMBAT).entered();
            self.run_combat_phase(now, &mut report);
        }

        {
            let _span = info_span!(spans::SQUADS).entered();
            self.run_squad_phase(&mut report);
        }

        {
            let _span = info_span!(spans::LOOT).entered();
            self.run_loot_phase(&mut report);
        }

        {
            let _span = info_span!(spans::BEHAVIOR).entered();
            self.run_behavior_phase(now, &mut report);
        }

        HivemindCounters::add(&self.counters.ticks_run, 1);
        trace!(?report, "Tick complete");
        report
    }

    fn run_combat_phase(&mut self, now: GameTime, report: &mut TickReport) {
        let combat = &self.config.combat;
        report.clusters = self.clusterer.cluster_events(
            &self.events,
            now,
            combat.max_event_age,
            combat.cluster_radius * combat.cluster_radius,
            combat.max_clusters,
            &mut self.clusters,
        );
        HivemindCounters::add(&self.counters.clusters_emitted, report.clusters);

        self.deaths.clear();
        filter_death_events(&self.events, now, combat.max_event_age, combat.capacity, &mut self.deaths);
        report.dynamic_objectives = generate_candidates(
            &self.clusters,
            &self.deaths,
            &self.building_markers,
            combat,
            MAX_DYNAMIC_OBJECTIVES,
            &mut self.dynamic_objectives,
        );
    }

    fn run_squad_phase(&mut self, report: &mut TickReport) {
        for entry in self.squads.iter_mut().filter(|s| s.is_active) {
            squad::refresh_personality(entry, &self.bots);

            let engaged = entry
                .members()
                .iter()
                .filter_map(|&m| self.bots.get(m))
                .any(|b| b.is_active && b.sensors.in_combat);
            let threat = entry
                .leader()
                .and_then(|l| self.bots.get(l))
                .and_then(|leader| nearest_cluster(&self.clusters, leader.position));

            let action = entry.action;
            let update = squad::refresh_tactical_positions(
                entry,
                &mut self.bots,
                action,
                threat,
                engaged,
                &self.config.squad,
                &self.config.communication,
                &mut self.rng,
            );
            if update.positioned > 0 {
                report.squads_updated += 1;
                report.followers_positioned += update.positioned;
            }
        }
    }

    fn run_loot_phase(&mut self, report: &mut TickReport) {
        let comm_range = self.config.communication.range;
        for entry in self.squads.iter_mut().filter(|s| s.is_active) {
            if entry.loot_share.items().is_empty() {
                continue;
            }
            let Some(boss) = entry.leader().and_then(|l| self.bots.get(l)) else {
                continue;
            };
            if !boss.is_active || boss.sensors.in_combat {
                continue;
            }
            let boss_id = boss.id;
            let boss_position = boss.position;
            let boss_looting = boss.sensors.wants_to_loot;
            let boss_holding = entry.objective.state == ObjectiveState::Wait;

            if entry
                .loot_share
                .boss_target()
                .is_some_and(|t| self.claims.claimed_by(t) != Some(boss_id))
            {
                entry.loot_share.forget_boss_target();
            }
            if entry.loot_share.boss_target().is_none()
                && entry.loot_share.claim_for_boss(boss_id, &mut self.claims).is_some()
            {
                report.loot_claims += 1;
                HivemindCounters::add(&self.counters.claims_granted, 1);
            }

            for follower_id in entry.followers() {
                let Some(follower) = self.bots.get(follower_id).filter(|f| f.is_active) else {
                    continue;
                };
                if !self.claims.claims_of(follower_id).is_empty() {
                    continue;
                }
                let check = FollowerLootCheck {
                    in_combat: follower.sensors.in_combat,
                    position: follower.position,
                    boss_position,
                    boss_looting,
                    boss_holding,
                    tactical_position: follower
                        .squad
                        .filter(|m| m.has_tactical_position)
                        .map(|m| m.tactical_position),
                };
                if !follower_may_loot(&check, comm_range) {
                    continue;
                }
                if entry.loot_share.claim_for_follower(follower_id, &mut self.claims).is_some() {
                    report.loot_claims += 1;
                    HivemindCounters::add(&self.counters.claims_granted, 1);
                }
            }
        }
    }

    fn run_behavior_phase(&mut self, now: GameTime, report: &mut TickReport) {
        let config = &self.config.behavior;
        let max_event_age = self.config.combat.max_event_age;
        for bot in self.bots.iter_mut().filter(|b| b.is_awake()) {
            let position = bot.position;
            bot.behavior.vulture.update(position, now, config);
            if bot.behavior.vulture.is_running() {
                report.vultures_running += 1;
            }
            bot.behavior
                .room_clear
                .update(bot.movement.current_corner, now, config);

            let ctx = LookContext {
                position,
                facing: bot.facing,
                in_combat: bot.sensors.in_combat,
                events: &self.events,
                max_event_age,
            };
            if bot.behavior.look.update(&ctx, now, config, &mut self.rng) != LookInstruction::None {
                report.glances += 1;
            }
        }
    }
}

fn nearest_cluster(clusters: &[CombatCluster], from: Position) -> Option<Position> {
    clusters
        .iter()
        .map(|c| (c.position.horizontal_distance_sq(&from), c.position))
        .filter(|(d, _)| !d.is_nan())
        .min_by(|a, b| a.0.total_cmp(&b.0))
        .map(|(_, p)| p)
}
