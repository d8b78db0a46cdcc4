//! Configuration for the hivemind core.
//!
//! Plain value structs handed to the tick pipeline and the pure scoring
//! functions. Loadable from `hivemind.toml`; nothing here watches files or
//! reloads live.

use serde::{Deserialize, Serialize};

use crate::error::{HivemindError, Result};

/// Top-level hivemind configuration, loadable from TOML.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct HivemindConfig {
    /// Combat event log and clustering.
    #[serde(default)]
    pub combat: CombatEventConfig,
    /// Squad tactical geometry.
    #[serde(default)]
    pub squad: SquadConfig,
    /// Follow-the-boss formation settings.
    #[serde(default)]
    pub formation: FormationConfig,
    /// Objective sharing between squad members.
    #[serde(default)]
    pub communication: CommunicationConfig,
    /// Loot scoring and squad looting.
    #[serde(default)]
    pub loot: LootConfig,
    /// Quest objective scoring.
    #[serde(default)]
    pub quest: QuestScoringConfig,
    /// Patrol route selection.
    #[serde(default)]
    pub patrol: PatrolConfig,
    /// Vulture / room-clear / look-variance timings.
    #[serde(default)]
    pub behavior: BehaviorConfig,
}

impl HivemindConfig {
    /// Load configuration from a TOML string.
    ///
    /// # Errors
    /// Returns `HivemindError::Config` if the TOML is invalid or fails validation.
    pub fn from_toml(toml_str: &str) -> Result<Self> {
        let config: Self =
            toml::from_str(toml_str).map_err(|e| HivemindError::Config(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    /// Load configuration from a TOML file.
    ///
    /// # Errors
    /// Returns an error if the file cannot be read or parsed.
    pub fn from_file(path: &std::path::Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        Self::from_toml(&content)
    }

    /// Reject structurally impossible values.
    ///
    /// `max_exfil_angle` above 180 is allowed; the scorer only applies the
    /// exfil penalty when its denominator is positive.
    ///
    /// # Errors
    /// Returns `HivemindError::Config` naming the first offending field.
    pub fn validate(&self) -> Result<()> {
        if self.combat.capacity == 0 {
            return Err(HivemindError::Config("combat.capacity must be > 0".into()));
        }
        if self.squad.max_members == 0 || self.squad.max_members > crate::squad::MAX_SQUAD_SIZE {
            return Err(HivemindError::Config(format!(
                "squad.max_members must be in 1..={}",
                crate::squad::MAX_SQUAD_SIZE
            )));
        }
        let non_negative = [
            ("combat.max_event_age", self.combat.max_event_age),
            ("combat.cluster_radius", self.combat.cluster_radius),
            ("squad.guard_radius", self.squad.guard_radius),
            ("squad.flank_distance", self.squad.flank_distance),
            ("squad.overwatch_distance", self.squad.overwatch_distance),
            ("formation.spacing", self.formation.spacing),
            ("communication.range", self.communication.range),
            ("loot.cooldown", self.loot.cooldown),
        ];
        for (name, value) in non_negative {
            if !(value >= 0.0) {
                return Err(HivemindError::Config(format!("{name} must be >= 0 (got {value})")));
            }
        }
        if !(1..=5).contains(&self.communication.default_coordination) {
            return Err(HivemindError::Config(
                "communication.default_coordination must be in 1..=5".into(),
            ));
        }
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Sub-configs
// ---------------------------------------------------------------------------

/// Combat event log settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CombatEventConfig {
    /// Ring buffer capacity.
    #[serde(default = "default_128")]
    pub capacity: usize,
    /// Events older than this (seconds) are expired.
    #[serde(default = "default_120_0")]
    pub max_event_age: f32,
    /// Clustering radius in metres (compared squared).
    #[serde(default = "default_50_0")]
    pub cluster_radius: f32,
    /// Max clusters produced per pass.
    #[serde(default = "default_8_usize")]
    pub max_clusters: usize,
    /// Boss zone radius in metres.
    #[serde(default = "default_75_0")]
    pub boss_zone_radius: f32,
    /// Boss events older than this (seconds) no longer mark a zone.
    #[serde(default = "default_120_0")]
    pub boss_zone_decay: f32,
    /// Minimum cluster intensity for a firefight candidate.
    #[serde(default = "default_3_0")]
    pub firefight_min_intensity: f32,
    /// Radius around a building marker within which a firefight becomes a
    /// building-clear candidate.
    #[serde(default = "default_20_0")]
    pub building_clear_radius: f32,
}

impl Default for CombatEventConfig {
    fn default() -> Self {
        Self {
            capacity: 128,
            max_event_age: 120.0,
            cluster_radius: 50.0,
            max_clusters: 8,
            boss_zone_radius: 75.0,
            boss_zone_decay: 120.0,
            firefight_min_intensity: 3.0,
            building_clear_radius: 20.0,
        }
    }
}

/// Squad tactical geometry.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SquadConfig {
    /// Member cap per squad (at most [`crate::squad::MAX_SQUAD_SIZE`]).
    #[serde(default = "default_6_usize")]
    pub max_members: usize,
    /// Guard circle / arc radius.
    #[serde(default = "default_8_0")]
    pub guard_radius: f32,
    /// Perpendicular flank offset.
    #[serde(default = "default_15_0")]
    pub flank_distance: f32,
    /// Overwatch stand-off distance.
    #[serde(default = "default_25_0")]
    pub overwatch_distance: f32,
    /// Escort trail distance behind the boss.
    #[serde(default = "default_5_0")]
    pub escort_distance: f32,
    /// Escort alternating lateral offset.
    #[serde(default = "default_2_0")]
    pub escort_lateral_offset: f32,
    /// A follower within this distance of its tactical position has arrived.
    #[serde(default = "default_5_0")]
    pub arrival_radius: f32,
    /// Number of strategies scored per squad.
    #[serde(default = "default_4_usize")]
    pub strategy_count: usize,
}

impl Default for SquadConfig {
    fn default() -> Self {
        Self {
            max_members: 6,
            guard_radius: 8.0,
            flank_distance: 15.0,
            overwatch_distance: 25.0,
            escort_distance: 5.0,
            escort_lateral_offset: 2.0,
            arrival_radius: 5.0,
            strategy_count: 4,
        }
    }
}

/// Follow-the-boss formation settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FormationConfig {
    /// Distance between followers.
    #[serde(default = "default_3_0")]
    pub spacing: f32,
    /// Path width below which a column is used.
    #[serde(default = "default_6_0")]
    pub switch_width: f32,
    /// Beyond this distance a follower sprints.
    #[serde(default = "default_30_0")]
    pub catch_up_distance: f32,
    /// Beyond this distance a follower walks to close the gap.
    #[serde(default = "default_15_0")]
    pub match_speed_distance: f32,
    /// Within this distance a follower slows down.
    #[serde(default = "default_5_0")]
    pub slow_approach_distance: f32,
}

impl Default for FormationConfig {
    fn default() -> Self {
        Self {
            spacing: 3.0,
            switch_width: 6.0,
            catch_up_distance: 30.0,
            match_speed_distance: 15.0,
            slow_approach_distance: 5.0,
        }
    }
}

/// Objective sharing between squad members.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CommunicationConfig {
    /// Radio/voice range in metres.
    #[serde(default = "default_35_0")]
    pub range: f32,
    /// How many followers hear the leader directly.
    #[serde(default = "default_2_usize")]
    pub trusted_count: usize,
    /// Noise sigma in metres at coordination level 1.
    #[serde(default = "default_5_0")]
    pub base_noise: f32,
    /// Coordination level used when a squad has no personality.
    #[serde(default = "default_3_u8")]
    pub default_coordination: u8,
}

impl Default for CommunicationConfig {
    fn default() -> Self {
        Self {
            range: 35.0,
            trusted_count: 2,
            base_noise: 5.0,
            default_coordination: 3,
        }
    }
}

/// Loot scoring and squad looting.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LootConfig {
    /// Items below this value are skipped unless they are gear upgrades.
    #[serde(default = "default_min_loot_value")]
    pub min_item_value: f32,
    /// Value at which the value score saturates.
    #[serde(default = "default_value_cap")]
    pub value_cap: f32,
    /// Distance penalty per metre.
    #[serde(default = "default_0_005")]
    pub distance_penalty_per_meter: f32,
    /// Upper bound of the distance penalty.
    #[serde(default = "default_0_4")]
    pub max_distance_penalty: f32,
    /// Bonus for loot near the active objective.
    #[serde(default = "default_0_15")]
    pub objective_bonus: f32,
    /// Radius around the objective that earns the bonus.
    #[serde(default = "default_30_0")]
    pub objective_bonus_radius: f32,
    /// Bonus for gear upgrades.
    #[serde(default = "default_0_3")]
    pub gear_upgrade_bonus: f32,
    /// Seconds after looting before full score returns.
    #[serde(default = "default_15_0")]
    pub cooldown: f32,
    /// Whether bots swap worn gear for upgrades.
    #[serde(default = "default_true")]
    pub gear_swap_enabled: bool,
}

impl Default for LootConfig {
    fn default() -> Self {
        Self {
            min_item_value: 5_000.0,
            value_cap: 100_000.0,
            distance_penalty_per_meter: 0.005,
            max_distance_penalty: 0.4,
            objective_bonus: 0.15,
            objective_bonus_radius: 30.0,
            gear_upgrade_bonus: 0.3,
            cooldown: 15.0,
            gear_swap_enabled: true,
        }
    }
}

/// Quest objective scoring.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct QuestScoringConfig {
    /// Weight of the distance term.
    #[serde(default = "default_1_0")]
    pub distance_weighting: f32,
    /// Weight of the desirability term.
    #[serde(default = "default_1_0")]
    pub desirability_weighting: f32,
    /// Weight of the exfil-alignment penalty.
    #[serde(default = "default_1_0")]
    pub exfil_direction_weighting: f32,
    /// Distance randomness as a percentage of the max distance.
    #[serde(default = "default_30_0")]
    pub distance_randomness: f32,
    /// Desirability randomness in desirability points.
    #[serde(default = "default_20_0")]
    pub desirability_randomness: f32,
    /// Desirability multiplier for quests active for the human player.
    #[serde(default = "default_1_5")]
    pub desirability_active_quest_multiplier: f32,
    /// Angle (degrees) from the exfil direction at which the penalty starts.
    #[serde(default = "default_90_0")]
    pub max_exfil_angle: f32,
}

impl Default for QuestScoringConfig {
    fn default() -> Self {
        Self {
            distance_weighting: 1.0,
            desirability_weighting: 1.0,
            exfil_direction_weighting: 1.0,
            distance_randomness: 30.0,
            desirability_randomness: 20.0,
            desirability_active_quest_multiplier: 1.5,
            max_exfil_angle: 90.0,
        }
    }
}

/// Patrol route selection.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PatrolConfig {
    /// Distance at which the proximity score reaches zero.
    #[serde(default = "default_300_0")]
    pub max_waypoint_distance: f32,
    /// Magnitude of the tie-breaking jitter.
    #[serde(default = "default_0_0001")]
    pub jitter_scale: f32,
}

impl Default for PatrolConfig {
    fn default() -> Self {
        Self {
            max_waypoint_distance: 300.0,
            jitter_scale: 1e-4,
        }
    }
}

/// Vulture / room-clear / look-variance timings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BehaviorConfig {
    /// Distance at which vultures stop sprinting and walk.
    #[serde(default = "default_60_0")]
    pub vulture_silent_distance: f32,
    /// Distance at which vultures hold and ambush.
    #[serde(default = "default_25_0")]
    pub vulture_ambush_distance: f32,
    /// Seconds to hold an ambush before rushing.
    #[serde(default = "default_30_0")]
    pub vulture_ambush_duration: f32,
    /// Seconds a vulture hunt may last in total.
    #[serde(default = "default_180_0")]
    pub vulture_max_duration: f32,
    /// Seconds of slow walking after entering a building.
    #[serde(default = "default_8_0")]
    pub room_clear_duration: f32,
    /// Seconds to pause at each sharp corner while clearing.
    #[serde(default = "default_1_5")]
    pub corner_pause_duration: f32,
    /// Minimum seconds between glances.
    #[serde(default = "default_3_0")]
    pub look_min_interval: f32,
    /// Maximum seconds between glances.
    #[serde(default = "default_8_0")]
    pub look_max_interval: f32,
    /// Combat events inside this range attract glances.
    #[serde(default = "default_60_0")]
    pub look_event_range: f32,
}

impl Default for BehaviorConfig {
    fn default() -> Self {
        Self {
            vulture_silent_distance: 60.0,
            vulture_ambush_distance: 25.0,
            vulture_ambush_duration: 30.0,
            vulture_max_duration: 180.0,
            room_clear_duration: 8.0,
            corner_pause_duration: 1.5,
            look_min_interval: 3.0,
            look_max_interval: 8.0,
            look_event_range: 60.0,
        }
    }
}

// ---------------------------------------------------------------------------
// Serde default helpers
// ---------------------------------------------------------------------------

fn default_true() -> bool { true }
fn default_0_0001() -> f32 { 1e-4 }
fn default_0_005() -> f32 { 0.005 }
fn default_0_15() -> f32 { 0.15 }
fn default_0_3() -> f32 { 0.3 }
fn default_0_4() -> f32 { 0.4 }
fn default_1_0() -> f32 { 1.0 }
fn default_1_5() -> f32 { 1.5 }
fn default_2_0() -> f32 { 2.0 }
fn default_3_0() -> f32 { 3.0 }
fn default_5_0() -> f32 { 5.0 }
fn default_6_0() -> f32 { 6.0 }
fn default_8_0() -> f32 { 8.0 }
fn default_15_0() -> f32 { 15.0 }
fn default_20_0() -> f32 { 20.0 }
fn default_25_0() -> f32 { 25.0 }
fn default_30_0() -> f32 { 30.0 }
fn default_35_0() -> f32 { 35.0 }
fn default_50_0() -> f32 { 50.0 }
fn default_60_0() -> f32 { 60.0 }
fn default_75_0() -> f32 { 75.0 }
fn default_90_0() -> f32 { 90.0 }
fn default_120_0() -> f32 { 120.0 }
fn default_180_0() -> f32 { 180.0 }
fn default_300_0() -> f32 { 300.0 }
fn default_min_loot_value() -> f32 { 5_000.0 }
fn default_value_cap() -> f32 { 100_000.0 }
fn default_3_u8() -> u8 { 3 }
fn default_2_usize() -> usize { 2 }
fn default_4_usize() -> usize { 4 }
fn default_6_usize() -> usize { 6 }
fn default_8_usize() -> usize { 8 }
fn default_128() -> usize { 128 }
