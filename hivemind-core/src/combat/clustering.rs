//! Greedy single-pass seed clustering of live combat events.
//!
//! Walks the ring buffer in storage order. The first unassigned event seeds
//! a cluster that absorbs every later unassigned event within the radius of
//! the seed. Death events never cluster; they feed corpse candidates instead.

use serde::{Deserialize, Serialize};

use super::events::{CombatEventKind, CombatEventLog};
use crate::types::{GameTime, Position};

/// One cluster of nearby events.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct CombatCluster {
    /// Mean position of members.
    pub position: Position,
    /// +1 per member, +2 more per explosion.
    pub intensity: f32,
    /// Number of events absorbed.
    pub member_count: u32,
    /// Newest member time.
    pub latest_time: GameTime,
    /// Any member was boss-sourced.
    pub has_boss: bool,
}

/// Reusable clustering pass. Owns its assignment scratch so repeated
/// passes do not allocate and separate clusterers never share state.
#[derive(Debug, Clone, Default)]
pub struct EventClusterer {
    assigned: Vec<bool>,
}

impl EventClusterer {
    /// Create a clusterer sized for a log of `capacity` slots.
    #[must_use]
    pub fn new(capacity: usize) -> Self {
        Self {
            assigned: vec![false; capacity],
        }
    }

    /// Cluster live non-death events into `out` (cleared first).
    ///
    /// Stops seeding once `max_clusters` clusters exist. Returns the number
    /// of clusters written.
    pub fn cluster_events(
        &mut self,
        log: &CombatEventLog,
        now: GameTime,
        max_age: f32,
        radius_sq: f32,
        max_clusters: usize,
        out: &mut Vec<CombatCluster>,
    ) -> usize {
        out.clear();
        let events = log.slots();
        self.assigned.clear();
        self.assigned.resize(events.len(), false);

        let eligible = |i: usize| {
            let e = &events[i];
            e.is_live(now, max_age) && e.kind != CombatEventKind::Death
        };

        for seed in 0..events.len() {
            if out.len() >= max_clusters {
                break;
            }
            if self.assigned[seed] || !eligible(seed) {
                continue;
            }
            self.assigned[seed] = true;
            let origin = events[seed].position;

            let mut sum = origin;
            let mut cluster = CombatCluster {
                position: origin,
                intensity: 0.0,
                member_count: 0,
                latest_time: events[seed].time,
                has_boss: false,
            };
            absorb(&mut cluster, &events[seed]);

            for j in (seed + 1)..events.len() {
                if self.assigned[j] || !eligible(j) {
                    continue;
                }
                if events[j].position.horizontal_distance_sq(&origin) > radius_sq {
                    continue;
                }
                self.assigned[j] = true;
                sum.x += events[j].position.x;
                sum.y += events[j].position.y;
                sum.z += events[j].position.z;
                absorb(&mut cluster, &events[j]);
            }

            let n = cluster.member_count as f32;
            cluster.position = Position::new(sum.x / n, sum.y / n, sum.z / n);
            out.push(cluster);
        }
        out.len()
    }
}

fn absorb(cluster: &mut CombatCluster, event: &super::events::CombatEvent) {
    cluster.member_count += 1;
    cluster.intensity += 1.0;
    if event.kind == CombatEventKind::Explosion {
        cluster.intensity += 2.0;
    }
    cluster.latest_time = cluster.latest_time.max(event.time);
    cluster.has_boss |= event.is_boss;
}

#[cfg(test)]
mod tests {
    use super::*;

    fn log_with(points: &[(f32, f32, CombatEventKind)]) -> CombatEventLog {
        let mut log = CombatEventLog::new(32);
        for &(x, z, kind) in points {
            log.record_event(Position::new(x, 0.0, z), 10.0, 1.0, kind, false);
        }
        log
    }

    #[test]
    fn nearby_events_merge_with_mean_position() {
        let log = log_with(&[
            (0.0, 0.0, CombatEventKind::Gunshot),
            (10.0, 0.0, CombatEventKind::Gunshot),
            (200.0, 0.0, CombatEventKind::Gunshot),
        ]);
        let mut clusterer = EventClusterer::new(log.capacity());
        let mut out = Vec::new();
        assert_eq!(clusterer.cluster_events(&log, 10.0, 60.0, 50.0 * 50.0, 8, &mut out), 2);
        assert_eq!(out[0].member_count, 2);
        assert!((out[0].position.x - 5.0).abs() < 1e-4);
        assert_eq!(out[1].member_count, 1);
    }

    #[test]
    fn explosions_add_bonus_intensity() {
        let log = log_with(&[
            (0.0, 0.0, CombatEventKind::Explosion),
            (1.0, 0.0, CombatEventKind::Gunshot),
        ]);
        let mut out = Vec::new();
        EventClusterer::default().cluster_events(&log, 10.0, 60.0, 100.0, 8, &mut out);
        assert!((out[0].intensity - 4.0).abs() < f32::EPSILON);
    }

    #[test]
    fn deaths_and_expired_events_are_skipped() {
        let mut log = log_with(&[(0.0, 0.0, CombatEventKind::Death)]);
        log.record_event(Position::ZERO, -500.0, 1.0, CombatEventKind::Gunshot, false);
        let mut out = Vec::new();
        assert_eq!(EventClusterer::default().cluster_events(&log, 10.0, 60.0, 100.0, 8, &mut out), 0);
    }

    #[test]
    fn output_is_capped() {
        let points: Vec<_> = (0..10)
            .map(|i| (i as f32 * 1000.0, 0.0, CombatEventKind::Gunshot))
            .collect();
        let log = log_with(&points);
        let mut out = Vec::new();
        assert_eq!(EventClusterer::default().cluster_events(&log, 10.0, 60.0, 100.0, 3, &mut out), 3);
    }

    #[test]
    fn membership_is_measured_from_seed() {
        // b is within range of a; c is within range of b but not of a.
        let log = log_with(&[
            (0.0, 0.0, CombatEventKind::Gunshot),
            (8.0, 0.0, CombatEventKind::Gunshot),
            (16.0, 0.0, CombatEventKind::Gunshot),
        ]);
        let mut out = Vec::new();
        EventClusterer::default().cluster_events(&log, 10.0, 60.0, 100.0, 8, &mut out);
        assert_eq!(out.len(), 2);
        assert_eq!(out[0].member_count, 2);
    }
}
