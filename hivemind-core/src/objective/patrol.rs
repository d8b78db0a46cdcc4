//! Patrol route selection.

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use serde::{Deserialize, Serialize};

use crate::config::PatrolConfig;
use crate::types::Position;

const PROXIMITY_WEIGHT: f32 = 0.6;
const AGGRESSION_WEIGHT: f32 = 0.4;

/// A patrol route and the bots it suits.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PatrolRoute {
    /// Waypoints in walking order.
    pub waypoints: Vec<Position>,
    /// Lowest aggression the route accepts.
    pub min_aggression: f32,
    /// Highest aggression the route accepts.
    pub max_aggression: f32,
    /// Earliest normalized raid time.
    pub min_raid_time: f32,
    /// Latest normalized raid time.
    pub max_raid_time: f32,
}

impl PatrolRoute {
    /// Whether a bot with these traits may walk this route.
    #[must_use]
    pub fn accepts(&self, aggression: f32, raid_time: f32) -> bool {
        !self.waypoints.is_empty()
            && (self.min_aggression..=self.max_aggression).contains(&aggression)
            && (self.min_raid_time..=self.max_raid_time).contains(&raid_time)
    }

    fn nearest_waypoint_distance(&self, from: Position) -> f32 {
        self.waypoints
            .iter()
            .map(|w| w.horizontal_distance(&from))
            .fold(f32::INFINITY, f32::min)
    }

    /// 1 at the band centre, 0 at its edges.
    fn aggression_centeredness(&self, aggression: f32) -> f32 {
        let half = (self.max_aggression - self.min_aggression) / 2.0;
        if half <= 0.0 {
            return 1.0;
        }
        let centre = self.min_aggression + half;
        (1.0 - (aggression - centre).abs() / half).clamp(0.0, 1.0)
    }
}

/// Facts about the bot choosing a route.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PatrolChooser {
    /// Bot position.
    pub position: Position,
    /// Aggression in `[0, 1]`.
    pub aggression: f32,
    /// Raid time in `[0, 1]`.
    pub raid_time: f32,
    /// Per-bot seed for tie-breaking jitter.
    pub seed: u64,
}

/// Score one route for `chooser`, or `None` if it does not accept the bot.
#[must_use]
pub fn score_route(route: &PatrolRoute, index: usize, chooser: &PatrolChooser, config: &PatrolConfig) -> Option<f32> {
    if !route.accepts(chooser.aggression, chooser.raid_time) {
        return None;
    }
    let max = config.max_waypoint_distance.max(f32::EPSILON);
    let proximity = 1.0 - (route.nearest_waypoint_distance(chooser.position) / max).min(1.0);
    let fit = route.aggression_centeredness(chooser.aggression);
    let score = PROXIMITY_WEIGHT * proximity
        + AGGRESSION_WEIGHT * fit
        + jitter(chooser.seed, index) * config.jitter_scale;
    Some(score)
}

/// Pick the best route for `chooser`. Ties keep the first seen; `None` if
/// no route accepts the bot.
#[must_use]
pub fn select_route(routes: &[PatrolRoute], chooser: &PatrolChooser, config: &PatrolConfig) -> Option<usize> {
    let mut best: Option<(usize, f32)> = None;
    for (i, route) in routes.iter().enumerate() {
        let Some(score) = score_route(route, i, chooser, config) else {
            continue;
        };
        if best.is_none_or(|(_, b)| score > b) {
            best = Some((i, score));
        }
    }
    best.map(|(i, _)| i)
}

/// Deterministic value in `[0, 1)` from a seed and route index.
fn jitter(seed: u64, index: usize) -> f32 {
    let mut rng = StdRng::seed_from_u64(seed ^ (index as u64).wrapping_mul(0x9E37_79B9_7F4A_7C15));
    rng.r#gen::<f32>()
}
