//! The per-bot record.

use serde::{Deserialize, Serialize};

use crate::behavior::BehaviorState;
use crate::squad::SquadRole;
use crate::types::{
    BotType, EntityId, FieldState, Heading, MovementState, PersonalityTag, Position, SensorSet,
    SquadId,
};

/// A bot's membership in a squad. Present only while the bot is a member.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SquadMembership {
    /// The squad this bot belongs to.
    pub squad: SquadId,
    /// Current tactical role.
    pub role: SquadRole,
    /// Last computed tactical position.
    pub tactical_position: Position,
    /// Whether `tactical_position` is meaningful.
    pub has_tactical_position: bool,
    /// Bot is walking to a loot target instead of its tactical position.
    pub is_approaching_loot: bool,
}

impl SquadMembership {
    /// Fresh membership with no role or position yet.
    #[must_use]
    pub fn new(squad: SquadId) -> Self {
        Self {
            squad,
            role: SquadRole::None,
            tactical_position: Position::ZERO,
            has_tactical_position: false,
            is_approaching_loot: false,
        }
    }
}

/// One bot. Owned exclusively by [`super::BotRegistry`].
///
/// `boss` and `followers` are ids, not ownership. They are only edited
/// through [`crate::hive`] so both directions stay in agreement.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BotEntity {
    /// Stable internal id.
    pub id: EntityId,
    /// Host-issued id, if registered with one.
    pub external_id: Option<u64>,
    /// Alive and participating.
    pub is_active: bool,
    /// Dormant (far from players); excluded from most counts.
    pub is_sleeping: bool,
    /// Classification.
    pub bot_type: BotType,
    /// World position.
    pub position: Position,
    /// Facing on the horizontal plane.
    pub facing: Heading,
    /// Propagated boolean facts.
    pub sensors: SensorSet,
    /// Movement sub-record.
    pub movement: MovementState,
    /// Personality tag.
    pub personality: PersonalityTag,
    /// Aggression in `[0, 1]`, derived from `personality`.
    pub aggression: f32,
    /// Raid progress in `[0, 1]`.
    pub raid_time_normalized: f32,
    /// Vulture / room-clear / look-variance state.
    pub behavior: BehaviorState,
    /// Objective assignments that failed in a row.
    pub consecutive_failed_assignments: u32,
    /// Wandering state.
    pub field: FieldState,
    /// Squad membership.
    pub squad: Option<SquadMembership>,
    pub(crate) boss: Option<EntityId>,
    pub(crate) followers: Vec<EntityId>,
}

impl BotEntity {
    pub(crate) fn new(id: EntityId) -> Self {
        Self {
            id,
            external_id: None,
            is_active: true,
            is_sleeping: false,
            bot_type: BotType::Unknown,
            position: Position::ZERO,
            facing: Heading::default(),
            sensors: SensorSet::default(),
            movement: MovementState::default(),
            personality: PersonalityTag::Normal,
            aggression: PersonalityTag::Normal.aggression(),
            raid_time_normalized: 0.0,
            behavior: BehaviorState::default(),
            consecutive_failed_assignments: 0,
            field: FieldState::default(),
            squad: None,
            boss: None,
            followers: Vec::new(),
        }
    }

    /// Direct boss, if any.
    #[must_use]
    pub fn boss(&self) -> Option<EntityId> {
        self.boss
    }

    /// Direct followers.
    #[must_use]
    pub fn followers(&self) -> &[EntityId] {
        &self.followers
    }

    /// Whether this bot has at least one follower.
    #[must_use]
    pub fn has_followers(&self) -> bool {
        !self.followers.is_empty()
    }

    /// Active and awake.
    #[must_use]
    pub fn is_awake(&self) -> bool {
        self.is_active && !self.is_sleeping
    }

    /// Set the personality tag and re-derive aggression.
    pub fn set_personality(&mut self, personality: PersonalityTag) {
        self.personality = personality;
        self.aggression = personality.aggression();
    }

    /// Count one more failed objective assignment.
    pub fn record_assignment_failure(&mut self) -> u32 {
        self.consecutive_failed_assignments = self.consecutive_failed_assignments.saturating_add(1);
        self.consecutive_failed_assignments
    }

    /// A successful assignment clears the failure streak.
    pub fn reset_assignment_failures(&mut self) {
        self.consecutive_failed_assignments = 0;
    }
}
