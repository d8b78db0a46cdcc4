//! Hive-mind relationship graph: boss/follower links, group sensors and
//! single-pass population counters.
//!
//! Links are stored on both ends (`boss` on the follower, `followers` on the
//! boss). Every function here edits both ends together; nothing else in the
//! crate writes those fields.

use tracing::{debug, trace};

use crate::registry::BotRegistry;
use crate::types::{BotType, EntityId, GameTime, MovementStatus, Sensor, SensorSet, StuckPhase};

// ---------------------------------------------------------------------------
// Relationship mutators
// ---------------------------------------------------------------------------

/// Make `boss` the boss of `follower`.
///
/// Self-assignment and unknown ids are ignored (returns `false`). A
/// follower with a different boss is detached from it first. Assigning
/// the same boss again leaves a single follower entry.
pub fn assign_boss(bots: &mut BotRegistry, follower: EntityId, boss: EntityId) -> bool {
    if follower == boss || !bots.contains(follower) || !bots.contains(boss) {
        return false;
    }

    let previous = bots[follower].boss;
    if let Some(old) = previous.filter(|&old| old != boss) {
        if let Some(old_boss) = bots.get_mut(old) {
            old_boss.followers.retain(|&f| f != follower);
        }
        debug!(follower = %follower, from = %old, to = %boss, "Follower reassigned");
    }

    bots[follower].boss = Some(boss);
    let followers = &mut bots[boss].followers;
    if !followers.contains(&follower) {
        followers.push(follower);
    }
    true
}

/// Detach `follower` from its boss. Returns `false` if it had none.
pub fn remove_boss(bots: &mut BotRegistry, follower: EntityId) -> bool {
    let Some(boss) = bots.get_mut(follower).and_then(|f| f.boss.take()) else {
        return false;
    };
    if let Some(b) = bots.get_mut(boss) {
        b.followers.retain(|&f| f != follower);
    }
    trace!(follower = %follower, boss = %boss, "Boss link removed");
    true
}

/// Tear down every link touching `entity`: its own boss link and all of
/// its followers' links to it.
pub fn separate_from_group(bots: &mut BotRegistry, entity: EntityId) {
    if !bots.contains(entity) {
        return;
    }
    remove_boss(bots, entity);

    let mut followers = std::mem::take(&mut bots[entity].followers);
    for &f in &followers {
        if let Some(follower) = bots.get_mut(f) {
            if follower.boss == Some(entity) {
                follower.boss = None;
            }
        }
    }
    // Hand the emptied buffer back to keep its capacity.
    followers.clear();
    bots[entity].followers = followers;
}

/// Detach every inactive entity from its group. Idempotent.
///
/// Returns how many entities had links removed.
pub fn cleanup_dead_entities(bots: &mut BotRegistry) -> usize {
    let mut cleaned = 0;
    for i in 0..bots.len() {
        let entity = &bots.as_slice()[i];
        if entity.is_active || (entity.boss.is_none() && entity.followers.is_empty()) {
            continue;
        }
        let id = entity.id;
        separate_from_group(bots, id);
        cleaned += 1;
    }
    if cleaned > 0 {
        debug!(cleaned, "Dead entities separated from groups");
    }
    cleaned
}

/// Reset sensors to defaults on inactive entities only.
///
/// Field-movement state and assignment counters are left alone.
pub fn reset_inactive_entity_sensors(bots: &mut BotRegistry) -> usize {
    let mut reset = 0;
    for entity in bots.iter_mut().filter(|e| !e.is_active) {
        if entity.sensors != SensorSet::default() {
            entity.sensors = SensorSet::default();
            reset += 1;
        }
    }
    reset
}

/// Write a sensor. Raising `WantsToLoot` stamps the last-looting time.
pub fn update_sensor(
    bots: &mut BotRegistry,
    entity: EntityId,
    sensor: Sensor,
    value: bool,
    now: GameTime,
) -> bool {
    let Some(bot) = bots.get_mut(entity) else {
        return false;
    };
    bot.sensors.set(sensor, value);
    if sensor == Sensor::WantsToLoot && value {
        bot.sensors.last_loot_time = now;
    }
    true
}

// ---------------------------------------------------------------------------
// Group sensor queries
// ---------------------------------------------------------------------------

/// The entity's direct boss has `sensor` set. `false` without a boss.
#[must_use]
pub fn check_sensor_for_boss(bots: &BotRegistry, entity: EntityId, sensor: Sensor) -> bool {
    bots.get(entity)
        .and_then(|e| e.boss)
        .and_then(|b| bots.get(b))
        .is_some_and(|b| b.sensors.get(sensor))
}

/// Any of the entity's followers has `sensor` set.
#[must_use]
pub fn check_sensor_for_any_follower(bots: &BotRegistry, entity: EntityId, sensor: Sensor) -> bool {
    bots.get(entity).is_some_and(|e| {
        e.followers
            .iter()
            .filter_map(|&f| bots.get(f))
            .any(|f| f.sensors.get(sensor))
    })
}

/// The group leader (boss, or self without one) or any of the leader's
/// followers has `sensor` set.
#[must_use]
pub fn check_sensor_for_group(bots: &BotRegistry, entity: EntityId, sensor: Sensor) -> bool {
    let Some(leader) = group_leader(bots, entity) else {
        return false;
    };
    bots.get(leader).is_some_and(|l| l.sensors.get(sensor))
        || check_sensor_for_any_follower(bots, leader, sensor)
}

/// The entity's boss, or the entity itself if it has none.
#[must_use]
pub fn group_leader(bots: &BotRegistry, entity: EntityId) -> Option<EntityId> {
    let e = bots.get(entity)?;
    Some(e.boss.filter(|&b| bots.contains(b)).unwrap_or(entity))
}

// ---------------------------------------------------------------------------
// Counters: O(n) single sweeps over the dense list
// ---------------------------------------------------------------------------

/// Active, awake entities.
#[must_use]
pub fn count_active(bots: &BotRegistry) -> usize {
    bots.iter().filter(|e| e.is_awake()).count()
}

/// Active, awake entities of one type.
#[must_use]
pub fn count_active_by_type(bots: &BotRegistry, bot_type: BotType) -> usize {
    bots.iter()
        .filter(|e| e.is_awake() && e.bot_type == bot_type)
        .count()
}

/// Active, awake entities with the given path-follow status.
#[must_use]
pub fn count_by_movement_status(bots: &BotRegistry, status: MovementStatus) -> usize {
    bots.iter()
        .filter(|e| e.is_awake() && e.movement.status == status)
        .count()
}

/// Active, awake entities in any stuck phase.
#[must_use]
pub fn count_stuck_bots(bots: &BotRegistry) -> usize {
    bots.iter()
        .filter(|e| e.is_awake() && e.movement.stuck_phase != StuckPhase::None)
        .count()
}

/// Active, awake entities currently sprinting.
#[must_use]
pub fn count_sprinting_bots(bots: &BotRegistry) -> usize {
    bots.iter()
        .filter(|e| e.is_awake() && e.movement.is_sprinting)
        .count()
}
