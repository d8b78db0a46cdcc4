//! Tactical position geometry for squad roles.
//!
//! Default positioning is laid out relative to the approach axis (boss →
//! objective). Combat repositioning uses the objective → threat axis
//! instead and turns escorts into flankers. A degenerate axis collapses
//! everyone onto the objective.

use std::f32::consts::{PI, TAU};

use super::SquadRole;
use crate::config::SquadConfig;
use crate::types::{Heading, Position};

/// Compute positions for followers travelling with or holding around the
/// objective.
///
/// `roles[i]` drives `out[i]`. Returns the number of positions written.
pub fn compute_tactical_positions(
    objective: Position,
    boss: Position,
    threat: Option<Position>,
    roles: &[SquadRole],
    config: &SquadConfig,
    out: &mut [Position],
) -> usize {
    let n = roles.len().min(out.len());
    let Some(axis) = Heading::between(&boss, &objective) else {
        return collapse(objective, &mut out[..n]);
    };
    let threat_bearing = threat
        .and_then(|t| Heading::between(&objective, &t))
        .map(|h| h.angle());
    layout(objective, boss, axis, threat_bearing, &roles[..n], config, &mut out[..n]);
    n
}

/// Reposition under fire, relative to the threat direction.
///
/// Escorts are reassigned to flankers in `roles` before layout.
pub fn compute_combat_positions(
    objective: Position,
    boss: Position,
    threat: Position,
    roles: &mut [SquadRole],
    config: &SquadConfig,
    out: &mut [Position],
) -> usize {
    let n = roles.len().min(out.len());
    for role in roles.iter_mut() {
        if *role == SquadRole::Escort {
            *role = SquadRole::Flanker;
        }
    }
    let Some(axis) = Heading::between(&objective, &threat) else {
        return collapse(objective, &mut out[..n]);
    };
    layout(objective, boss, axis, Some(axis.angle()), &roles[..n], config, &mut out[..n]);
    n
}

fn collapse(objective: Position, out: &mut [Position]) -> usize {
    out.fill(objective);
    out.len()
}

fn layout(
    objective: Position,
    boss: Position,
    axis: Heading,
    threat_bearing: Option<f32>,
    roles: &[SquadRole],
    config: &SquadConfig,
    out: &mut [Position],
) {
    let guard_total = roles.iter().filter(|r| **r == SquadRole::Guard).count();
    let perp = axis.perpendicular();

    let (mut guard_k, mut flank_k, mut escort_k) = (0usize, 0usize, 0usize);
    for (role, slot) in roles.iter().zip(out.iter_mut()) {
        *slot = match role {
            SquadRole::Guard => {
                let p = guard_point(objective, axis, threat_bearing, guard_k, guard_total, config.guard_radius);
                guard_k += 1;
                p
            }
            SquadRole::Flanker => {
                let side = alternating_side(flank_k);
                flank_k += 1;
                objective.offset(
                    perp.x * config.flank_distance * side,
                    perp.z * config.flank_distance * side,
                )
            }
            SquadRole::Overwatch => objective.offset(
                -axis.x * config.overwatch_distance,
                -axis.z * config.overwatch_distance,
            ),
            SquadRole::Escort => {
                let side = alternating_side(escort_k);
                escort_k += 1;
                let lateral = config.escort_lateral_offset * side;
                boss.offset(
                    -axis.x * config.escort_distance + perp.x * lateral,
                    -axis.z * config.escort_distance + perp.z * lateral,
                )
            }
            SquadRole::Leader | SquadRole::None => objective,
        };
    }
}

/// Evenly spaced on a full circle, or on a 180° arc facing the threat.
fn guard_point(
    objective: Position,
    axis: Heading,
    threat_bearing: Option<f32>,
    k: usize,
    total: usize,
    radius: f32,
) -> Position {
    let total = total.max(1) as f32;
    let k = k as f32;
    let angle = match threat_bearing {
        Some(bearing) => bearing - PI / 2.0 + PI * (k + 0.5) / total,
        None => axis.angle() + TAU * k / total,
    };
    let dir = Heading::from_angle(angle);
    objective.offset(dir.x * radius, dir.z * radius)
}

fn alternating_side(k: usize) -> f32 {
    if k % 2 == 0 { 1.0 } else { -1.0 }
}
