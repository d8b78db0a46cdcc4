//! Fixed-capacity ring buffer of combat sound/violence events.
//!
//! Writers never allocate: the buffer is sized once and the oldest slot is
//! overwritten when full. Readers scan the whole buffer, skipping inactive
//! and expired slots.

use serde::{Deserialize, Serialize};
use tracing::trace;

use crate::types::{GameTime, Position};

/// What made the noise.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[repr(u8)]
pub enum CombatEventKind {
    /// Empty slot.
    #[default]
    None = 0,
    /// Weapon fire.
    Gunshot = 1,
    /// Grenade or other explosion.
    Explosion = 2,
    /// Airdrop landing.
    Airdrop = 3,
    /// Someone died.
    Death = 4,
}

impl CombatEventKind {
    /// Intensity this kind contributes: explosions count triple.
    #[must_use]
    pub fn intensity_weight(self) -> u32 {
        match self {
            Self::Explosion => 3,
            _ => 1,
        }
    }
}

/// One recorded event.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct CombatEvent {
    /// Where it happened.
    pub position: Position,
    /// When it happened.
    pub time: GameTime,
    /// Acoustic / violence power.
    pub power: f32,
    /// What happened.
    pub kind: CombatEventKind,
    /// Caused by a boss.
    pub is_boss: bool,
    /// Slot holds a live event.
    pub is_active: bool,
}

impl CombatEvent {
    /// Whether this event is older than `max_age` at `now`.
    #[must_use]
    pub fn is_expired(&self, now: GameTime, max_age: f32) -> bool {
        now - self.time > max_age
    }

    /// Active and not expired.
    #[must_use]
    pub fn is_live(&self, now: GameTime, max_age: f32) -> bool {
        self.is_active && !self.is_expired(now, max_age)
    }
}

/// The session's combat event ring buffer.
#[derive(Debug, Clone)]
pub struct CombatEventLog {
    events: Vec<CombatEvent>,
    head: usize,
    count: usize,
}

impl CombatEventLog {
    /// Create a log holding at most `capacity` events (minimum 1).
    #[must_use]
    pub fn new(capacity: usize) -> Self {
        Self {
            events: vec![CombatEvent::default(); capacity.max(1)],
            head: 0,
            count: 0,
        }
    }

    /// Store an event in the next slot, overwriting the oldest when full.
    pub fn record_event(
        &mut self,
        position: Position,
        time: GameTime,
        power: f32,
        kind: CombatEventKind,
        is_boss: bool,
    ) {
        self.events[self.head] = CombatEvent {
            position,
            time,
            power,
            kind,
            is_boss,
            is_active: true,
        };
        self.head = (self.head + 1) % self.events.len();
        self.count = (self.count + 1).min(self.events.len());
        trace!(?kind, %position, time, "Combat event recorded");
    }

    /// Closest live event within `max_range` on the horizontal plane.
    #[must_use]
    pub fn get_nearest_event(
        &self,
        x: f32,
        z: f32,
        max_range: f32,
        now: GameTime,
        max_age: f32,
    ) -> Option<CombatEvent> {
        let origin = Position::new(x, 0.0, z);
        let mut best_sq = max_range * max_range;
        let mut best = None;
        for event in self.events.iter().filter(|e| e.is_live(now, max_age)) {
            let d_sq = event.position.horizontal_distance_sq(&origin);
            if d_sq <= best_sq {
                best_sq = d_sq;
                best = Some(*event);
            }
        }
        best
    }

    /// Weighted count of active events within `radius` and `window` seconds.
    #[must_use]
    pub fn get_intensity(&self, x: f32, z: f32, radius: f32, window: f32, now: GameTime) -> u32 {
        let origin = Position::new(x, 0.0, z);
        let radius_sq = radius * radius;
        self.events
            .iter()
            .filter(|e| {
                e.is_active
                    && now - e.time <= window
                    && e.position.horizontal_distance_sq(&origin) <= radius_sq
            })
            .map(|e| e.kind.intensity_weight())
            .sum()
    }

    /// Any active boss event within `radius` younger than `decay` seconds.
    #[must_use]
    pub fn is_in_boss_zone(&self, x: f32, z: f32, radius: f32, decay: f32, now: GameTime) -> bool {
        let origin = Position::new(x, 0.0, z);
        let radius_sq = radius * radius;
        self.events.iter().any(|e| {
            e.is_active
                && e.is_boss
                && now - e.time < decay
                && e.position.horizontal_distance_sq(&origin) <= radius_sq
        })
    }

    /// Deactivate every event older than `max_age`. Returns how many expired.
    pub fn cleanup_expired(&mut self, now: GameTime, max_age: f32) -> usize {
        let mut expired = 0;
        for event in self.events.iter_mut().filter(|e| e.is_active) {
            if event.is_expired(now, max_age) {
                event.is_active = false;
                expired += 1;
            }
        }
        expired
    }

    /// Drop every event.
    pub fn clear(&mut self) {
        self.events.fill(CombatEvent::default());
        self.head = 0;
        self.count = 0;
    }

    /// Slots written since the last clear, capped at capacity.
    #[must_use]
    pub fn count(&self) -> usize {
        self.count
    }

    /// Buffer capacity.
    #[must_use]
    pub fn capacity(&self) -> usize {
        self.events.len()
    }

    /// Raw slots in storage order, including inactive ones.
    #[must_use]
    pub fn slots(&self) -> &[CombatEvent] {
        &self.events
    }

    /// Live events in storage order.
    pub fn live(&self, now: GameTime, max_age: f32) -> impl Iterator<Item = &CombatEvent> + '_ {
        self.events.iter().filter(move |e| e.is_live(now, max_age))
    }
}

/// Copy live death events into `out`, keeping at most `max` of them.
///
/// Returns the number written; `out` is cleared first.
pub fn filter_death_events(
    log: &CombatEventLog,
    now: GameTime,
    max_age: f32,
    max: usize,
    out: &mut Vec<CombatEvent>,
) -> usize {
    out.clear();
    out.extend(
        log.live(now, max_age)
            .filter(|e| e.kind == CombatEventKind::Death)
            .take(max)
            .copied(),
    );
    out.len()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn at(x: f32, z: f32) -> Position {
        Position::new(x, 0.0, z)
    }

    #[test]
    fn ring_overwrites_oldest_when_full() {
        let mut log = CombatEventLog::new(2);
        log.record_event(at(0.0, 0.0), 1.0, 1.0, CombatEventKind::Gunshot, false);
        log.record_event(at(1.0, 0.0), 2.0, 1.0, CombatEventKind::Gunshot, false);
        log.record_event(at(2.0, 0.0), 3.0, 1.0, CombatEventKind::Gunshot, false);
        assert_eq!(log.count(), 2);
        let times: Vec<f32> = log.slots().iter().map(|e| e.time).collect();
        assert_eq!(times, vec![3.0, 2.0]);
    }

    #[test]
    fn intensity_window_edge_is_inclusive() {
        let mut log = CombatEventLog::new(4);
        log.record_event(at(0.0, 0.0), 10.0, 1.0, CombatEventKind::Explosion, false);
        assert_eq!(log.get_intensity(0.0, 0.0, 5.0, 30.0, 40.0), 3);
        assert_eq!(log.get_intensity(0.0, 0.0, 5.0, 30.0, 40.5), 0);
    }

    #[test]
    fn boss_zone_ignores_ordinary_events() {
        let mut log = CombatEventLog::new(4);
        log.record_event(at(0.0, 0.0), 0.0, 1.0, CombatEventKind::Gunshot, false);
        log.record_event(at(1.0, 0.0), 0.0, 1.0, CombatEventKind::Explosion, false);
        assert!(!log.is_in_boss_zone(0.0, 0.0, 50.0, 60.0, 1.0));

        log.record_event(at(2.0, 0.0), 0.0, 1.0, CombatEventKind::Gunshot, true);
        assert!(log.is_in_boss_zone(0.0, 0.0, 50.0, 60.0, 1.0));
        // Decay is exclusive.
        assert!(!log.is_in_boss_zone(0.0, 0.0, 50.0, 60.0, 60.0));
    }

    #[test]
    fn nearest_event_respects_range_and_age() {
        let mut log = CombatEventLog::new(8);
        log.record_event(at(10.0, 0.0), 0.0, 1.0, CombatEventKind::Gunshot, false);
        log.record_event(at(30.0, 0.0), 50.0, 1.0, CombatEventKind::Gunshot, false);
        log.record_event(at(100.0, 0.0), 50.0, 1.0, CombatEventKind::Gunshot, false);

        let nearest = log.get_nearest_event(0.0, 0.0, 50.0, 60.0, 120.0).expect("in range");
        assert!((nearest.position.x - 10.0).abs() < f32::EPSILON);

        // The close one is too old at t=160 with max_age 120.
        let nearest = log.get_nearest_event(0.0, 0.0, 50.0, 160.0, 120.0).expect("in range");
        assert!((nearest.position.x - 30.0).abs() < f32::EPSILON);

        assert!(log.get_nearest_event(0.0, 0.0, 5.0, 60.0, 120.0).is_none());
    }

    #[test]
    fn nearest_ignores_height() {
        let mut log = CombatEventLog::new(4);
        log.record_event(Position::new(3.0, 500.0, 4.0), 0.0, 1.0, CombatEventKind::Gunshot, false);
        assert!(log.get_nearest_event(0.0, 0.0, 5.0, 0.0, 10.0).is_some());
    }

    #[test]
    fn explosions_weigh_triple() {
        let mut log = CombatEventLog::new(8);
        log.record_event(at(0.0, 0.0), 10.0, 1.0, CombatEventKind::Gunshot, false);
        log.record_event(at(1.0, 0.0), 10.0, 1.0, CombatEventKind::Explosion, false);
        log.record_event(at(500.0, 0.0), 10.0, 1.0, CombatEventKind::Explosion, false);
        log.record_event(at(0.0, 0.0), 0.0, 1.0, CombatEventKind::Gunshot, false);
        assert_eq!(log.get_intensity(0.0, 0.0, 20.0, 5.0, 12.0), 4);
    }

    #[test]
    fn boss_zone_decays() {
        let mut log = CombatEventLog::new(4);
        log.record_event(at(0.0, 0.0), 0.0, 1.0, CombatEventKind::Gunshot, true);
        assert!(log.is_in_boss_zone(10.0, 0.0, 20.0, 60.0, 30.0));
        assert!(!log.is_in_boss_zone(10.0, 0.0, 20.0, 60.0, 61.0));
        assert!(!log.is_in_boss_zone(50.0, 0.0, 20.0, 60.0, 30.0));
    }

    #[test]
    fn cleanup_deactivates_old_events() {
        let mut log = CombatEventLog::new(4);
        log.record_event(at(0.0, 0.0), 0.0, 1.0, CombatEventKind::Gunshot, false);
        log.record_event(at(0.0, 0.0), 90.0, 1.0, CombatEventKind::Gunshot, false);
        assert_eq!(log.cleanup_expired(100.0, 60.0), 1);
        assert_eq!(log.cleanup_expired(100.0, 60.0), 0);
        assert_eq!(log.live(100.0, 60.0).count(), 1);
    }

    #[test]
    fn death_filter_keeps_data_and_caps_output() {
        let mut log = CombatEventLog::new(8);
        for i in 0..4 {
            log.record_event(at(i as f32, 0.0), 5.0, 2.5, CombatEventKind::Death, i == 0);
        }
        log.record_event(at(9.0, 0.0), 5.0, 1.0, CombatEventKind::Gunshot, false);
        let mut out = Vec::new();
        assert_eq!(filter_death_events(&log, 6.0, 60.0, 3, &mut out), 3);
        assert!(out.iter().all(|e| e.kind == CombatEventKind::Death));
        assert!(out[0].is_boss);
        assert!((out[0].power - 2.5).abs() < f32::EPSILON);
    }

    #[test]
    fn clear_empties_log() {
        let mut log = CombatEventLog::new(4);
        log.record_event(at(0.0, 0.0), 0.0, 1.0, CombatEventKind::Gunshot, false);
        log.clear();
        assert_eq!(log.count(), 0);
        assert!(log.get_nearest_event(0.0, 0.0, 100.0, 0.0, 100.0).is_none());
    }
}
