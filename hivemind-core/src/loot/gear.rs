//! Gear upgrade comparison.

use serde::{Deserialize, Serialize};

/// A tactical rig as seen by the comparer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct RigStats {
    /// Container grid size (cells).
    pub grid_size: u32,
    /// Armor class, meaningful only when `armored`.
    pub armor_class: u32,
    /// Whether the rig carries armor plates.
    pub armored: bool,
}

/// Strictly-greater comparisons on the stat that matters per slot.
pub struct GearComparer;

impl GearComparer {
    /// Higher armor class.
    #[must_use]
    pub fn is_armor_upgrade(current_class: u32, candidate_class: u32) -> bool {
        candidate_class > current_class
    }

    /// Higher weapon value.
    #[must_use]
    pub fn is_weapon_upgrade(current_value: f32, candidate_value: f32) -> bool {
        candidate_value > current_value
    }

    /// Larger backpack grid.
    #[must_use]
    pub fn is_backpack_upgrade(current_grid: u32, candidate_grid: u32) -> bool {
        candidate_grid > current_grid
    }

    /// Rig comparison.
    ///
    /// Armored over unarmored: wins if class and size are both at least as
    /// good. Two armored: class first, then size. Two unarmored: size only.
    /// Unarmored never replaces armored.
    #[must_use]
    pub fn is_rig_upgrade(current: RigStats, candidate: RigStats) -> bool {
        match (current.armored, candidate.armored) {
            (false, true) => {
                candidate.armor_class >= current.armor_class && candidate.grid_size >= current.grid_size
            }
            (true, true) => {
                candidate.armor_class > current.armor_class
                    || (candidate.armor_class == current.armor_class
                        && candidate.grid_size > current.grid_size)
            }
            (false, false) => candidate.grid_size > current.grid_size,
            (true, false) => false,
        }
    }
}
