//! En-route formation: followers arrange behind a moving boss.
//!
//! Heading comes from the boss's last two positions. Narrow paths use a
//! column, open ground a spread line. Speed is picked from squared
//! distances so the per-tick path needs no square roots.

use serde::{Deserialize, Serialize};

use crate::config::FormationConfig;
use crate::types::{Heading, Position};

/// Below this movement (metres) the heading is undefined.
pub const MIN_HEADING_MOVEMENT: f32 = 0.1;

/// Follower arrangement.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum FormationType {
    /// Single file behind the boss.
    Column,
    /// Line abreast, one spacing behind the boss.
    Spread,
}

/// How fast a follower should move.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum FormationSpeed {
    /// Far behind: sprint.
    Sprint,
    /// Behind: walk to close the gap.
    Walk,
    /// In formation: move at the boss's pace.
    MatchBoss,
    /// Almost on the slot: ease in.
    SlowApproach,
}

/// Probes how wide the walkable space is around a point.
///
/// Implemented for any `Fn(Position, Heading) -> f32`.
pub trait PathWidthProbe {
    /// Walkable width in metres at `position` across `heading`.
    fn path_width(&self, position: Position, heading: Heading) -> f32;
}

impl<F> PathWidthProbe for F
where
    F: Fn(Position, Heading) -> f32,
{
    fn path_width(&self, position: Position, heading: Heading) -> f32 {
        self(position, heading)
    }
}

/// Unit heading from `previous` to `current`, or `None` if the boss moved
/// less than [`MIN_HEADING_MOVEMENT`].
#[must_use]
pub fn compute_heading(previous: Position, current: Position) -> Option<Heading> {
    let dx = current.x - previous.x;
    let dz = current.z - previous.z;
    let len_sq = dx * dx + dz * dz;
    if !(len_sq >= MIN_HEADING_MOVEMENT * MIN_HEADING_MOVEMENT) {
        return None;
    }
    let len = len_sq.sqrt();
    Some(Heading { x: dx / len, z: dz / len })
}

/// Column for paths narrower than `switch_width`, spread otherwise.
#[must_use]
pub fn select_formation(path_width: f32, switch_width: f32) -> FormationType {
    if path_width < switch_width {
        FormationType::Column
    } else {
        FormationType::Spread
    }
}

/// Followers along the reverse heading at 1, 2, 3... spacings.
pub fn column_positions(boss: Position, heading: Heading, spacing: f32, out: &mut [Position]) {
    for (i, slot) in out.iter_mut().enumerate() {
        let back = spacing * (i + 1) as f32;
        *slot = boss.offset(-heading.x * back, -heading.z * back);
    }
}

/// Followers on a line perpendicular to the heading, centred, one spacing
/// behind the boss.
pub fn spread_positions(boss: Position, heading: Heading, spacing: f32, out: &mut [Position]) {
    let perp = heading.perpendicular();
    let centre = (out.len() as f32 - 1.0) / 2.0;
    for (i, slot) in out.iter_mut().enumerate() {
        let lateral = (i as f32 - centre) * spacing;
        *slot = boss.offset(
            -heading.x * spacing + perp.x * lateral,
            -heading.z * spacing + perp.z * lateral,
        );
    }
}

/// Full formation update: heading, type from the probe, and slots.
///
/// Returns `None` (leaving `out` untouched) while the boss is stationary.
pub fn compute_formation_positions(
    previous_boss: Position,
    boss: Position,
    probe: &impl PathWidthProbe,
    config: &FormationConfig,
    out: &mut [Position],
) -> Option<FormationType> {
    let heading = compute_heading(previous_boss, boss)?;
    let formation = select_formation(probe.path_width(boss, heading), config.switch_width);
    match formation {
        FormationType::Column => column_positions(boss, heading, config.spacing, out),
        FormationType::Spread => spread_positions(boss, heading, config.spacing, out),
    }
    Some(formation)
}

/// Pre-squared speed thresholds.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SpeedThresholds {
    /// Beyond this squared distance: sprint.
    pub catch_up_sq: f32,
    /// Beyond this squared distance: walk.
    pub match_speed_sq: f32,
    /// Within this squared distance: slow approach.
    pub slow_approach_sq: f32,
}

impl SpeedThresholds {
    /// Square the configured distances once.
    #[must_use]
    pub fn from_config(config: &FormationConfig) -> Self {
        Self {
            catch_up_sq: config.catch_up_distance * config.catch_up_distance,
            match_speed_sq: config.match_speed_distance * config.match_speed_distance,
            slow_approach_sq: config.slow_approach_distance * config.slow_approach_distance,
        }
    }
}

/// Classify a follower's squared distance to its formation slot.
#[must_use]
pub fn decide_speed(distance_sq: f32, thresholds: &SpeedThresholds) -> FormationSpeed {
    if distance_sq > thresholds.catch_up_sq {
        FormationSpeed::Sprint
    } else if distance_sq > thresholds.match_speed_sq {
        FormationSpeed::Walk
    } else if distance_sq > thresholds.slow_approach_sq {
        FormationSpeed::MatchBoss
    } else {
        FormationSpeed::SlowApproach
    }
}
