//! Core type definitions shared by every hivemind subsystem.
//!
//! Handles are plain `Copy` newtypes over `u32` indices into the owning
//! registries; nothing in this crate holds a reference to another entity.

use serde::{Deserialize, Serialize};
use std::fmt;

// ---------------------------------------------------------------------------
// Identity Types
// ---------------------------------------------------------------------------

/// Stable internal identifier of a bot entity.
///
/// Issued by [`crate::registry::BotRegistry`]; recycled after removal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct EntityId(pub u32);

impl EntityId {
    /// Index form of this id.
    #[must_use]
    pub const fn index(self) -> usize {
        self.0 as usize
    }
}

impl fmt::Display for EntityId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "bot#{}", self.0)
    }
}

/// Stable internal identifier of a squad.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct SquadId(pub u32);

impl SquadId {
    /// Index form of this id.
    #[must_use]
    pub const fn index(self) -> usize {
        self.0 as usize
    }
}

impl fmt::Display for SquadId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "squad#{}", self.0)
    }
}

/// Host-issued loot item identifier.
pub type LootId = u64;

/// Session time in seconds since raid start.
pub type GameTime = f32;

// ---------------------------------------------------------------------------
// Spatial
// ---------------------------------------------------------------------------

/// A 3D position in the game world. `y` is up; the horizontal plane is `x`/`z`.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Position {
    /// X coordinate.
    pub x: f32,
    /// Y coordinate (height).
    pub y: f32,
    /// Z coordinate.
    pub z: f32,
}

impl Position {
    /// The origin.
    pub const ZERO: Self = Self { x: 0.0, y: 0.0, z: 0.0 };

    /// Create a new position.
    #[must_use]
    pub const fn new(x: f32, y: f32, z: f32) -> Self {
        Self { x, y, z }
    }

    /// Squared distance on the horizontal (`x`/`z`) plane.
    #[must_use]
    pub fn horizontal_distance_sq(&self, other: &Self) -> f32 {
        let dx = self.x - other.x;
        let dz = self.z - other.z;
        dx * dx + dz * dz
    }

    /// Distance on the horizontal (`x`/`z`) plane.
    #[must_use]
    pub fn horizontal_distance(&self, other: &Self) -> f32 {
        self.horizontal_distance_sq(other).sqrt()
    }

    /// Full 3D squared distance.
    #[must_use]
    pub fn distance_sq(&self, other: &Self) -> f32 {
        let dx = self.x - other.x;
        let dy = self.y - other.y;
        let dz = self.z - other.z;
        dx * dx + dy * dy + dz * dz
    }

    /// Full 3D distance.
    #[must_use]
    pub fn distance(&self, other: &Self) -> f32 {
        self.distance_sq(other).sqrt()
    }

    /// Whether any component is NaN or infinite.
    #[must_use]
    pub fn is_finite(&self) -> bool {
        self.x.is_finite() && self.y.is_finite() && self.z.is_finite()
    }

    /// Offset this position on the horizontal plane.
    #[must_use]
    pub fn offset(&self, dx: f32, dz: f32) -> Self {
        Self::new(self.x + dx, self.y, self.z + dz)
    }
}

impl fmt::Display for Position {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({:.1}, {:.1}, {:.1})", self.x, self.y, self.z)
    }
}

/// Squared-length guard for direction vectors; below this a direction is
/// treated as undefined.
pub const DIRECTION_EPSILON_SQ: f32 = 1e-4;

/// A unit direction on the horizontal plane.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Heading {
    /// X component.
    pub x: f32,
    /// Z component.
    pub z: f32,
}

impl Heading {
    /// Normalize `(dx, dz)`, or `None` if it is degenerate.
    #[must_use]
    pub fn from_components(dx: f32, dz: f32) -> Option<Self> {
        let len_sq = dx * dx + dz * dz;
        if !(len_sq >= DIRECTION_EPSILON_SQ) {
            return None;
        }
        let len = len_sq.sqrt();
        Some(Self { x: dx / len, z: dz / len })
    }

    /// Direction from `from` towards `to` on the horizontal plane.
    #[must_use]
    pub fn between(from: &Position, to: &Position) -> Option<Self> {
        Self::from_components(to.x - from.x, to.z - from.z)
    }

    /// Heading at `angle` radians (measured like `atan2(z, x)`).
    #[must_use]
    pub fn from_angle(angle: f32) -> Self {
        Self { x: angle.cos(), z: angle.sin() }
    }

    /// Bearing angle in radians, `atan2(z, x)`.
    #[must_use]
    pub fn angle(&self) -> f32 {
        self.z.atan2(self.x)
    }

    /// Rotated 90° counter-clockwise (left-hand perpendicular).
    #[must_use]
    pub fn perpendicular(&self) -> Self {
        Self { x: -self.z, z: self.x }
    }

    /// Opposite direction.
    #[must_use]
    pub fn reversed(&self) -> Self {
        Self { x: -self.x, z: -self.z }
    }
}

// ---------------------------------------------------------------------------
// Classification
// ---------------------------------------------------------------------------

/// What kind of bot an entity is. Ordering matters: higher variants win
/// personality-vote ties.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize)]
pub enum BotType {
    /// Not yet classified by the host.
    #[default]
    Unknown,
    /// Private military contractor.
    Pmc,
    /// AI scavenger.
    Scav,
    /// Player-controlled scav body driven by AI.
    PlayerScav,
    /// Boss-tier bot.
    Boss,
}

impl BotType {
    /// All variants in declaration order.
    pub const ALL: [Self; 5] = [
        Self::Unknown,
        Self::Pmc,
        Self::Scav,
        Self::PlayerScav,
        Self::Boss,
    ];
}

/// Host-assigned personality tag. Drives the derived aggression scalar.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum PersonalityTag {
    /// No personality assigned.
    #[default]
    Normal,
    /// Avoids fights.
    Timid,
    /// Careful, slow.
    Cautious,
    /// Pushes fights.
    Aggressive,
    /// Pushes everything.
    Reckless,
}

impl PersonalityTag {
    /// Aggression scalar in `[0, 1]` derived from the tag.
    #[must_use]
    pub fn aggression(self) -> f32 {
        match self {
            Self::Timid => 0.1,
            Self::Cautious => 0.3,
            Self::Normal => 0.5,
            Self::Aggressive => 0.75,
            Self::Reckless => 0.95,
        }
    }
}

// ---------------------------------------------------------------------------
// Sensors
// ---------------------------------------------------------------------------

/// Boolean facts that can be propagated across a boss/follower group.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Sensor {
    /// Bot is engaged in combat.
    InCombat,
    /// Bot has heard or seen something suspicious.
    Suspicious,
    /// Bot is allowed to run quest objectives.
    CanQuest,
    /// Bot may sprint toward its objective.
    CanSprintToObjective,
    /// Bot wants to loot.
    WantsToLoot,
}

impl Sensor {
    /// All sensors.
    pub const ALL: [Self; 5] = [
        Self::InCombat,
        Self::Suspicious,
        Self::CanQuest,
        Self::CanSprintToObjective,
        Self::WantsToLoot,
    ];
}

/// The per-entity sensor record.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SensorSet {
    /// In combat.
    pub in_combat: bool,
    /// Suspicious.
    pub suspicious: bool,
    /// May quest.
    pub can_quest: bool,
    /// May sprint to objective.
    pub can_sprint_to_objective: bool,
    /// Wants to loot.
    pub wants_to_loot: bool,
    /// Last time `wants_to_loot` was raised.
    pub last_loot_time: GameTime,
}

impl Default for SensorSet {
    fn default() -> Self {
        Self {
            in_combat: false,
            suspicious: false,
            can_quest: false,
            can_sprint_to_objective: true,
            wants_to_loot: false,
            last_loot_time: 0.0,
        }
    }
}

impl SensorSet {
    /// Read a sensor.
    #[must_use]
    pub fn get(&self, sensor: Sensor) -> bool {
        match sensor {
            Sensor::InCombat => self.in_combat,
            Sensor::Suspicious => self.suspicious,
            Sensor::CanQuest => self.can_quest,
            Sensor::CanSprintToObjective => self.can_sprint_to_objective,
            Sensor::WantsToLoot => self.wants_to_loot,
        }
    }

    /// Write a sensor.
    pub fn set(&mut self, sensor: Sensor, value: bool) {
        match sensor {
            Sensor::InCombat => self.in_combat = value,
            Sensor::Suspicious => self.suspicious = value,
            Sensor::CanQuest => self.can_quest = value,
            Sensor::CanSprintToObjective => self.can_sprint_to_objective = value,
            Sensor::WantsToLoot => self.wants_to_loot = value,
        }
    }
}

// ---------------------------------------------------------------------------
// Movement
// ---------------------------------------------------------------------------

/// Path-follow status reported by the navigation collaborator.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum MovementStatus {
    /// Not moving.
    #[default]
    Idle,
    /// Following a path.
    Moving,
    /// Reached the destination.
    Arrived,
    /// Path could not be computed.
    Failed,
}

/// How far into stuck remediation a bot is.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize)]
pub enum StuckPhase {
    /// Making progress.
    #[default]
    None,
    /// Progress stalled; trying a vault/jump.
    Soft,
    /// Still stalled; teleport or re-path requested.
    Hard,
    /// Remediation exhausted.
    Failed,
}

/// Movement sub-record written by the movement collaborator.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct MovementState {
    /// Path-follow status.
    pub status: MovementStatus,
    /// Stuck remediation phase.
    pub stuck_phase: StuckPhase,
    /// Currently sprinting.
    pub is_sprinting: bool,
    /// Pose from 0 (prone) to 1 (standing).
    pub pose: f32,
    /// Index of the next path corner.
    pub current_corner: u16,
    /// Total corners on the current path.
    pub total_corners: u16,
    /// Re-path attempts for the current destination.
    pub retry_count: u8,
}

/// Field-movement state: noise seed and previous destination for wandering.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct FieldState {
    /// Per-bot noise seed.
    pub noise_seed: u32,
    /// Previous wander destination, if any.
    pub previous_destination: Option<Position>,
}
