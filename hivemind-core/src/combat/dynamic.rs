//! Dynamic-objective candidates derived from clusters and deaths.
//!
//! Thin consumer of the event log: turns hot clusters into firefight or
//! building-clear candidates and recent deaths into corpse candidates. The
//! host decides what to do with them.

use serde::{Deserialize, Serialize};

use super::clustering::CombatCluster;
use super::events::CombatEvent;
use crate::config::CombatEventConfig;
use crate::types::{GameTime, Position};

/// Kind of generated objective.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum DynamicObjectiveKind {
    /// Investigate an ongoing fight.
    Firefight,
    /// Check a body.
    Corpse,
    /// Clear a building where fighting happened.
    BuildingClear,
}

/// One generated objective candidate.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct DynamicObjective {
    /// Kind of candidate.
    pub kind: DynamicObjectiveKind,
    /// Where to go.
    pub position: Position,
    /// Cluster intensity, or event power for corpses.
    pub intensity: f32,
    /// Newest contributing event time.
    pub time: GameTime,
}

/// Build candidates into `out` (cleared first), at most `max` of them.
///
/// Clusters come first, in input order, then corpses.
pub fn generate_candidates(
    clusters: &[CombatCluster],
    deaths: &[CombatEvent],
    building_markers: &[Position],
    config: &CombatEventConfig,
    max: usize,
    out: &mut Vec<DynamicObjective>,
) -> usize {
    out.clear();
    let building_sq = config.building_clear_radius * config.building_clear_radius;

    for cluster in clusters
        .iter()
        .filter(|c| c.intensity >= config.firefight_min_intensity)
    {
        if out.len() >= max {
            return out.len();
        }
        let indoors = building_markers
            .iter()
            .any(|b| b.horizontal_distance_sq(&cluster.position) <= building_sq);
        out.push(DynamicObjective {
            kind: if indoors {
                DynamicObjectiveKind::BuildingClear
            } else {
                DynamicObjectiveKind::Firefight
            },
            position: cluster.position,
            intensity: cluster.intensity,
            time: cluster.latest_time,
        });
    }

    for death in deaths {
        if out.len() >= max {
            break;
        }
        out.push(DynamicObjective {
            kind: DynamicObjectiveKind::Corpse,
            position: death.position,
            intensity: death.power,
            time: death.time,
        });
    }
    out.len()
}
