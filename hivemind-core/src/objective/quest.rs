//! Quest objective scoring.
//!
//! Three weighted terms: how close the quest is, how much the bot wants
//! it, and how far it points away from the bot's exfil.

use rand::Rng;
use serde::{Deserialize, Serialize};

use crate::config::QuestScoringConfig;

/// A quest the bot could take.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct QuestCandidate {
    /// Distance to the quest's nearest objective point.
    pub min_distance: f32,
    /// Base desirability, nominally `0..=100`.
    pub desirability: f32,
    /// The quest is active for the human player.
    pub active_for_player: bool,
    /// Angle in degrees between the quest direction and the exfil direction.
    pub exfil_angle: f32,
}

/// Score one quest. `max_distance` is the largest `min_distance` among the
/// candidates being compared.
pub fn score_quest<R: Rng + ?Sized>(
    quest: &QuestCandidate,
    max_distance: f32,
    config: &QuestScoringConfig,
    rng: &mut R,
) -> f32 {
    let distance_fraction = if max_distance > 0.0 {
        let jitter = symmetric(rng, config.distance_randomness) / 100.0 * max_distance;
        1.0 - (quest.min_distance + jitter) / max_distance
    } else {
        1.0
    };

    let multiplier = if quest.active_for_player {
        config.desirability_active_quest_multiplier
    } else {
        1.0
    };
    let desirability_fraction =
        (quest.desirability * multiplier + symmetric(rng, config.desirability_randomness)) / 100.0;

    distance_fraction * config.distance_weighting
        + desirability_fraction * config.desirability_weighting
        - exfil_penalty(quest.exfil_angle, config.max_exfil_angle) * config.exfil_direction_weighting
}

/// Zero up to `max_angle`, ramping to 1 at 180°.
///
/// With `max_angle >= 180` the ramp has no room and the penalty stays zero.
#[must_use]
pub fn exfil_penalty(angle: f32, max_angle: f32) -> f32 {
    let denominator = 180.0 - max_angle;
    if angle <= max_angle || denominator <= 0.0 {
        return 0.0;
    }
    ((angle - max_angle) / denominator).min(1.0)
}

/// Index of the largest score; first seen wins ties, NaN is skipped.
#[must_use]
pub fn select_highest_index(scores: &[f32]) -> Option<usize> {
    let mut best: Option<(usize, f32)> = None;
    for (i, &score) in scores.iter().enumerate() {
        if score.is_nan() {
            continue;
        }
        if best.is_none_or(|(_, b)| score > b) {
            best = Some((i, score));
        }
    }
    best.map(|(i, _)| i)
}

/// Uniform in `[-amplitude, amplitude]`.
fn symmetric<R: Rng + ?Sized>(rng: &mut R, amplitude: f32) -> f32 {
    (rng.r#gen::<f32>() * 2.0 - 1.0) * amplitude
}
