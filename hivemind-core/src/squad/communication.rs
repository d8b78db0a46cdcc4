//! Objective sharing tiers: who hears the leader, who hears it second-hand,
//! and how much second-hand positions drift.
//!
//! Scratch space is stack-allocated per call and bounded by
//! [`MAX_SQUAD_SIZE`], so concurrent squads never share buffers.

use std::f32::consts::TAU;

use ordered_float::OrderedFloat;
use rand::Rng;
use serde::{Deserialize, Serialize};

use super::MAX_SQUAD_SIZE;
use crate::types::Position;

/// How a follower receives shared positions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum CommTier {
    /// Out of reach.
    #[default]
    None,
    /// Hears the leader directly; exact positions.
    Direct,
    /// Hears a direct member; noisy positions.
    Relayed,
}

/// Assign tiers to followers. `out[i]` receives the tier of `followers[i]`.
///
/// Up to `trusted_count` of the closest followers within `range` of the
/// leader are direct. Any other follower within `range` of its nearest
/// direct member is relayed. Followers beyond [`MAX_SQUAD_SIZE`] or with
/// non-finite positions get [`CommTier::None`]. Returns the number of
/// reachable followers.
pub fn assign_tiers(
    leader: Position,
    followers: &[Position],
    range: f32,
    trusted_count: usize,
    out: &mut [CommTier],
) -> usize {
    out.fill(CommTier::None);
    let n = followers.len().min(out.len()).min(MAX_SQUAD_SIZE);
    let range_sq = range * range;

    let mut order = [0usize; MAX_SQUAD_SIZE];
    let mut dist_sq = [f32::INFINITY; MAX_SQUAD_SIZE];
    for i in 0..n {
        order[i] = i;
        if followers[i].is_finite() {
            dist_sq[i] = followers[i].horizontal_distance_sq(&leader);
        }
    }
    order[..n].sort_unstable_by_key(|&i| (OrderedFloat(dist_sq[i]), i));

    let mut direct = [0usize; MAX_SQUAD_SIZE];
    let mut direct_count = 0;
    for &i in &order[..n] {
        if direct_count >= trusted_count || !(dist_sq[i] <= range_sq) {
            break;
        }
        out[i] = CommTier::Direct;
        direct[direct_count] = i;
        direct_count += 1;
    }

    let mut reachable = direct_count;
    for i in 0..n {
        if out[i] == CommTier::Direct || !followers[i].is_finite() {
            continue;
        }
        let nearest_sq = direct[..direct_count]
            .iter()
            .map(|&d| followers[i].horizontal_distance_sq(&followers[d]))
            .fold(f32::INFINITY, f32::min);
        if nearest_sq <= range_sq {
            out[i] = CommTier::Relayed;
            reachable += 1;
        }
    }
    reachable
}

/// Perturb a relayed position with Gaussian noise.
///
/// Sigma is `base_noise / coordination` with `coordination` clamped to
/// 1..=5. Non-finite input yields `None`.
pub fn degrade_position<R: Rng + ?Sized>(
    position: Position,
    coordination: u8,
    base_noise: f32,
    rng: &mut R,
) -> Option<Position> {
    if !position.is_finite() {
        return None;
    }
    let sigma = base_noise / f32::from(coordination.clamp(1, 5));
    let (gx, gz) = box_muller(rng);
    let degraded = position.offset(gx * sigma, gz * sigma);
    degraded.is_finite().then_some(degraded)
}

/// The position a follower of `tier` should act on.
pub fn share_objective<R: Rng + ?Sized>(
    tier: CommTier,
    objective: Position,
    coordination: u8,
    base_noise: f32,
    rng: &mut R,
) -> Option<Position> {
    match tier {
        CommTier::Direct => objective.is_finite().then_some(objective),
        CommTier::Relayed => degrade_position(objective, coordination, base_noise, rng),
        CommTier::None => None,
    }
}

/// Two independent standard normal samples.
fn box_muller<R: Rng + ?Sized>(rng: &mut R) -> (f32, f32) {
    // u1 in (0, 1] so ln never sees zero.
    let u1: f32 = 1.0 - rng.r#gen::<f32>();
    let u2: f32 = rng.r#gen::<f32>();
    let r = (-2.0 * u1.ln()).sqrt();
    let theta = TAU * u2;
    (r * theta.cos(), r * theta.sin())
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;
    use rand::rngs::StdRng;

    fn at(x: f32, z: f32) -> Position {
        Position::new(x, 0.0, z)
    }

    #[test]
    fn one_trusted_member_relays_to_the_rest() {
        let leader = at(0.0, 0.0);
        let followers = [at(10.0, 0.0), at(30.0, 0.0), at(40.0, 0.0)];
        let mut tiers = [CommTier::None; 3];
        assign_tiers(leader, &followers, 35.0, 1, &mut tiers);
        assert_eq!(tiers.iter().filter(|t| **t == CommTier::Direct).count(), 1);
        assert_eq!(tiers, [CommTier::Direct, CommTier::Relayed, CommTier::Relayed]);
    }

    #[test]
    fn unreachable_follower_gets_none() {
        let leader = at(0.0, 0.0);
        let followers = [at(5.0, 0.0), at(20.0, 0.0), at(500.0, 0.0)];
        let mut tiers = [CommTier::Direct; 3];
        let reachable = assign_tiers(leader, &followers, 35.0, 1, &mut tiers);
        assert_eq!(tiers[2], CommTier::None);
        assert_eq!(reachable, 2);
    }

    #[test]
    fn closest_followers_become_direct() {
        let leader = at(0.0, 0.0);
        let followers = [at(30.0, 0.0), at(5.0, 0.0), at(10.0, 0.0)];
        let mut tiers = [CommTier::None; 3];
        assign_tiers(leader, &followers, 35.0, 2, &mut tiers);
        assert_eq!(tiers, [CommTier::Relayed, CommTier::Direct, CommTier::Direct]);
    }

    #[test]
    fn nan_follower_is_skipped() {
        let leader = at(0.0, 0.0);
        let followers = [at(f32::NAN, 0.0), at(5.0, 0.0)];
        let mut tiers = [CommTier::None; 2];
        assign_tiers(leader, &followers, 35.0, 2, &mut tiers);
        assert_eq!(tiers, [CommTier::None, CommTier::Direct]);
    }

    #[test]
    fn higher_coordination_means_less_noise() {
        let mut rng = StdRng::seed_from_u64(7);
        let origin = at(0.0, 0.0);
        let spread = |level: u8, rng: &mut StdRng| -> f32 {
            (0..500)
                .filter_map(|_| degrade_position(origin, level, 5.0, rng))
                .map(|p| p.horizontal_distance(&origin))
                .sum::<f32>()
                / 500.0
        };
        let sloppy = spread(1, &mut rng);
        let tight = spread(5, &mut rng);
        assert!(tight < sloppy, "tight={tight} sloppy={sloppy}");
    }

    #[test]
    fn nan_position_is_not_propagated() {
        let mut rng = StdRng::seed_from_u64(1);
        assert!(degrade_position(at(f32::NAN, 0.0), 3, 5.0, &mut rng).is_none());
        assert!(share_objective(CommTier::Direct, at(f32::NAN, 1.0), 3, 5.0, &mut rng).is_none());
    }

    #[test]
    fn direct_tier_gets_exact_objective() {
        let mut rng = StdRng::seed_from_u64(1);
        let objective = at(12.0, -3.0);
        assert_eq!(share_objective(CommTier::Direct, objective, 1, 5.0, &mut rng), Some(objective));
        assert!(share_objective(CommTier::None, objective, 1, 5.0, &mut rng).is_none());
    }
}
