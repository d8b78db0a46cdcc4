//! Squad coordination: objective, roles, tactical and formation geometry,
//! communication tiers and personality.

pub mod communication;
pub mod formation;
pub mod objective;
pub mod personality;
pub mod roles;
pub mod tactical;

pub use communication::{CommTier, assign_tiers, degrade_position, share_objective};
pub use formation::{FormationSpeed, FormationType, PathWidthProbe, SpeedThresholds};
pub use objective::{ObjectiveState, SquadObjective};
pub use personality::{PersonalityProfile, SquadPersonality, vote_personality};
pub use roles::{SquadAction, assign_roles};

use rand::Rng;
use serde::{Deserialize, Serialize};
use tracing::trace;

use crate::config::{CommunicationConfig, SquadConfig};
use crate::registry::{BotRegistry, SquadEntity, SquadMembership};
use crate::types::{EntityId, Position};

/// Hard upper bound on squad size; sizes every per-squad scratch array.
pub const MAX_SQUAD_SIZE: usize = 6;

/// A member's tactical role.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum SquadRole {
    /// Unassigned.
    #[default]
    None,
    /// Squad leader.
    Leader,
    /// Ring the objective.
    Guard,
    /// Offset to the side of the axis.
    Flanker,
    /// Hang back opposite the axis.
    Overwatch,
    /// Trail the leader.
    Escort,
}

/// Outcome of one tactical refresh.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TacticalUpdate {
    /// Followers that received a position.
    pub positioned: usize,
    /// Of those, followers that received a relayed (noisy) position.
    pub relayed: usize,
    /// Followers out of communication reach.
    pub unreachable: usize,
}

/// Recompute roles and tactical positions for every follower of `squad`,
/// filter them through communication tiers, and write them back onto the
/// objective slots and member records.
///
/// Without an objective or an active leader, every follower loses its
/// position. A known `threat` turns guards towards it; once `engaged`, the
/// squad uses combat repositioning instead. Followers out of reach lose
/// their previous position and role.
#[allow(clippy::too_many_arguments)]
pub fn refresh_tactical_positions<R: Rng + ?Sized>(
    squad: &mut SquadEntity,
    bots: &mut BotRegistry,
    action: SquadAction,
    threat: Option<Position>,
    engaged: bool,
    squad_config: &SquadConfig,
    comm_config: &CommunicationConfig,
    rng: &mut R,
) -> TacticalUpdate {
    let mut update = TacticalUpdate::default();
    let leader_pos = squad
        .leader()
        .and_then(|l| bots.get(l))
        .filter(|l| l.is_active)
        .map(|l| l.position);
    let (Some(leader_pos), Some(objective)) = (leader_pos, squad.objective.position) else {
        clear_tactical_positions(squad, bots);
        return update;
    };

    let mut ids = [EntityId(0); MAX_SQUAD_SIZE];
    let mut positions = [Position::ZERO; MAX_SQUAD_SIZE];
    let mut n = 0;
    for id in squad.followers() {
        if n == MAX_SQUAD_SIZE {
            break;
        }
        if let Some(bot) = bots.get(id).filter(|b| b.is_active) {
            ids[n] = id;
            positions[n] = bot.position;
            n += 1;
        }
    }

    let mut roles = [SquadRole::None; MAX_SQUAD_SIZE];
    assign_roles(action, n, &mut roles[..n]);
    let mut targets = [Position::ZERO; MAX_SQUAD_SIZE];
    match threat {
        Some(t) if engaged => tactical::compute_combat_positions(
            objective,
            leader_pos,
            t,
            &mut roles[..n],
            squad_config,
            &mut targets[..n],
        ),
        _ => tactical::compute_tactical_positions(
            objective,
            leader_pos,
            threat,
            &roles[..n],
            squad_config,
            &mut targets[..n],
        ),
    };

    let mut tiers = [CommTier::None; MAX_SQUAD_SIZE];
    assign_tiers(
        leader_pos,
        &positions[..n],
        comm_config.range,
        comm_config.trusted_count,
        &mut tiers[..n],
    );
    let coordination = squad
        .personality
        .profile()
        .map_or(comm_config.default_coordination, |p| p.coordination);

    for i in 0..n {
        squad.objective.set_tactical_position(i, targets[i], roles[i]);
        let received = share_objective(tiers[i], targets[i], coordination, comm_config.base_noise, rng);
        let Some(membership) = bots.get_mut(ids[i]).and_then(|b| b.squad.as_mut()) else {
            continue;
        };
        let Some(position) = received else {
            forget_position(membership);
            update.unreachable += 1;
            continue;
        };
        membership.role = roles[i];
        membership.tactical_position = position;
        membership.has_tactical_position = true;
        update.positioned += 1;
        if tiers[i] == CommTier::Relayed {
            update.relayed += 1;
        }
    }
    trace!(squad = %squad.id, ?update, "Tactical positions refreshed");
    update
}

/// Drop every follower's tactical position and role, e.g. after the
/// objective moved.
pub fn clear_tactical_positions(squad: &SquadEntity, bots: &mut BotRegistry) {
    for id in squad.followers() {
        if let Some(membership) = bots.get_mut(id).and_then(|b| b.squad.as_mut()) {
            forget_position(membership);
        }
    }
}

fn forget_position(membership: &mut SquadMembership) {
    membership.role = SquadRole::None;
    membership.has_tactical_position = false;
}

/// Re-vote the squad personality from current members.
pub fn refresh_personality(squad: &mut SquadEntity, bots: &BotRegistry) -> SquadPersonality {
    squad.personality = vote_personality(
        squad
            .members()
            .iter()
            .filter_map(|&m| bots.get(m))
            .map(|b| b.bot_type),
    );
    squad.personality
}
