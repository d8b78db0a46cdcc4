//! The shared squad objective and its tactical slots.

use serde::{Deserialize, Serialize};

use super::{MAX_SQUAD_SIZE, SquadRole};
use crate::types::{GameTime, Position};

/// Lifecycle of a squad objective.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum ObjectiveState {
    /// No objective.
    #[default]
    None,
    /// Moving to or working the objective.
    Active,
    /// Holding at the objective.
    Wait,
    /// Objective finished.
    Completed,
    /// Objective abandoned.
    Failed,
}

/// A squad's shared objective. Every change of position bumps `version` so
/// followers can detect a new order without comparing positions.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SquadObjective {
    /// Current objective point.
    pub position: Option<Position>,
    /// The point before the last change.
    pub previous_position: Option<Position>,
    /// Monotonic change counter.
    pub version: u32,
    /// When the current objective was set.
    pub start_time: GameTime,
    /// How long to work the objective (seconds).
    pub duration: f32,
    /// Whether `duration` was already adjusted once.
    pub duration_adjusted: bool,
    /// Lifecycle state.
    pub state: ObjectiveState,
    tactical_positions: [Position; MAX_SQUAD_SIZE],
    tactical_roles: [SquadRole; MAX_SQUAD_SIZE],
    member_count: usize,
}

impl Default for SquadObjective {
    fn default() -> Self {
        Self {
            position: None,
            previous_position: None,
            version: 0,
            start_time: 0.0,
            duration: 0.0,
            duration_adjusted: false,
            state: ObjectiveState::None,
            tactical_positions: [Position::ZERO; MAX_SQUAD_SIZE],
            tactical_roles: [SquadRole::None; MAX_SQUAD_SIZE],
            member_count: 0,
        }
    }
}

impl SquadObjective {
    /// Point the squad at a new objective. Returns the new version.
    pub fn set_objective(&mut self, position: Position, now: GameTime, duration: f32) -> u32 {
        self.previous_position = self.position;
        self.position = Some(position);
        self.start_time = now;
        self.duration = duration;
        self.duration_adjusted = false;
        self.state = ObjectiveState::Active;
        self.member_count = 0;
        self.version = self.version.wrapping_add(1);
        self.version
    }

    /// Drop the objective. Still bumps the version.
    pub fn clear(&mut self) {
        self.previous_position = self.position;
        self.position = None;
        self.state = ObjectiveState::None;
        self.member_count = 0;
        self.duration_adjusted = false;
        self.version = self.version.wrapping_add(1);
    }

    /// Scale the duration once; later calls are ignored.
    pub fn adjust_duration(&mut self, factor: f32) -> bool {
        if self.duration_adjusted {
            return false;
        }
        self.duration *= factor;
        self.duration_adjusted = true;
        true
    }

    /// Seconds since the objective was set.
    #[must_use]
    pub fn elapsed(&self, now: GameTime) -> f32 {
        (now - self.start_time).max(0.0)
    }

    /// Whether the objective's duration has run out.
    #[must_use]
    pub fn is_expired(&self, now: GameTime) -> bool {
        self.position.is_some() && self.elapsed(now) >= self.duration
    }

    /// Write a tactical slot. The recorded member count only grows.
    ///
    /// Returns `false` if `index` is out of range.
    pub fn set_tactical_position(&mut self, index: usize, position: Position, role: SquadRole) -> bool {
        if index >= MAX_SQUAD_SIZE {
            return false;
        }
        self.tactical_positions[index] = position;
        self.tactical_roles[index] = role;
        self.member_count = self.member_count.max(index + 1);
        true
    }

    /// Read a tactical slot written since the last objective change.
    #[must_use]
    pub fn tactical_position(&self, index: usize) -> Option<(Position, SquadRole)> {
        (index < self.member_count)
            .then(|| (self.tactical_positions[index], self.tactical_roles[index]))
    }

    /// Number of tactical slots in use.
    #[must_use]
    pub fn member_count(&self) -> usize {
        self.member_count
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn version_increments_on_every_change() {
        let mut objective = SquadObjective::default();
        assert_eq!(objective.set_objective(Position::new(1.0, 0.0, 1.0), 10.0, 60.0), 1);
        assert_eq!(objective.set_objective(Position::new(2.0, 0.0, 2.0), 20.0, 60.0), 2);
        assert_eq!(objective.previous_position, Some(Position::new(1.0, 0.0, 1.0)));
        objective.clear();
        assert_eq!(objective.version, 3);
        assert_eq!(objective.state, ObjectiveState::None);
    }

    #[test]
    fn slot_writes_only_grow_member_count() {
        let mut objective = SquadObjective::default();
        objective.set_tactical_position(3, Position::ZERO, SquadRole::Guard);
        assert_eq!(objective.member_count(), 4);
        objective.set_tactical_position(1, Position::ZERO, SquadRole::Flanker);
        assert_eq!(objective.member_count(), 4);
        assert_eq!(objective.tactical_position(1).map(|(_, r)| r), Some(SquadRole::Flanker));
        assert!(!objective.set_tactical_position(MAX_SQUAD_SIZE, Position::ZERO, SquadRole::Guard));
    }

    #[test]
    fn duration_adjusts_once() {
        let mut objective = SquadObjective::default();
        objective.set_objective(Position::ZERO, 0.0, 100.0);
        assert!(objective.adjust_duration(0.5));
        assert!(!objective.adjust_duration(0.5));
        assert!((objective.duration - 50.0).abs() < f32::EPSILON);
        assert!(!objective.is_expired(49.0));
        assert!(objective.is_expired(50.0));
    }
}
