//! What to do with a loot item: pick it up, swap gear for it, or leave it.

use serde::{Deserialize, Serialize};

use super::gear::{GearComparer, RigStats};
use crate::config::LootConfig;
use crate::types::{LootId, Position};

/// Planner decision.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum LootAction {
    /// Put it in the inventory.
    Pickup,
    /// Replace equipped gear with it.
    Swap,
    /// Leave it.
    Skip,
}

/// Item category, with the stat each gear slot compares on.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum LootKind {
    /// Anything that only goes into the inventory.
    Item,
    /// Body armor of the given class.
    Armor {
        /// Armor class.
        class: u32,
    },
    /// A weapon; compared by `LootItem::value`.
    Weapon,
    /// A backpack with the given grid size.
    Backpack {
        /// Grid cells.
        grid_size: u32,
    },
    /// A tactical rig.
    Rig(RigStats),
}

/// A candidate loot item.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct LootItem {
    /// Host identifier for claims.
    pub id: LootId,
    /// World position.
    pub position: Position,
    /// Market value.
    pub value: f32,
    /// Inventory cells it takes.
    pub size: u32,
    /// Category.
    pub kind: LootKind,
}

/// What a bot currently carries.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Loadout {
    /// Equipped armor class; 0 if none.
    pub armor_class: u32,
    /// Equipped weapon value; 0 if none.
    pub weapon_value: f32,
    /// Equipped backpack grid; 0 if none.
    pub backpack_grid: u32,
    /// Equipped rig.
    pub rig: RigStats,
    /// Free inventory cells.
    pub free_space: u32,
}

impl Loadout {
    /// Whether `item` upgrades an equipped slot.
    #[must_use]
    pub fn is_gear_upgrade(&self, item: &LootItem) -> bool {
        match item.kind {
            LootKind::Armor { class } => GearComparer::is_armor_upgrade(self.armor_class, class),
            LootKind::Weapon => GearComparer::is_weapon_upgrade(self.weapon_value, item.value),
            LootKind::Backpack { grid_size } => {
                GearComparer::is_backpack_upgrade(self.backpack_grid, grid_size)
            }
            LootKind::Rig(stats) => GearComparer::is_rig_upgrade(self.rig, stats),
            LootKind::Item => false,
        }
    }
}

/// Decides the action for one item against a loadout.
pub struct LootInventoryPlanner;

impl LootInventoryPlanner {
    /// Gear upgrades first (swap, or skip when swapping is disabled), then
    /// the minimum value gate, then inventory space.
    #[must_use]
    pub fn plan_action(item: &LootItem, loadout: &Loadout, config: &LootConfig) -> LootAction {
        if loadout.is_gear_upgrade(item) {
            return if config.gear_swap_enabled {
                LootAction::Swap
            } else {
                LootAction::Skip
            };
        }
        if item.value < config.min_item_value {
            return LootAction::Skip;
        }
        if item.size <= loadout.free_space {
            LootAction::Pickup
        } else {
            LootAction::Skip
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn item(kind: LootKind, value: f32, size: u32) -> LootItem {
        LootItem {
            id: 1,
            position: Position::ZERO,
            value,
            size,
            kind,
        }
    }

    fn loadout() -> Loadout {
        Loadout {
            armor_class: 3,
            weapon_value: 20_000.0,
            backpack_grid: 20,
            rig: RigStats::default(),
            free_space: 4,
        }
    }

    #[test]
    fn upgrades_swap_even_when_cheap() {
        let config = LootConfig::default();
        let armor = item(LootKind::Armor { class: 4 }, 10.0, 20);
        assert_eq!(LootInventoryPlanner::plan_action(&armor, &loadout(), &config), LootAction::Swap);
    }

    #[test]
    fn upgrades_skip_when_swapping_disabled() {
        let config = LootConfig {
            gear_swap_enabled: false,
            ..LootConfig::default()
        };
        let pack = item(LootKind::Backpack { grid_size: 30 }, 50_000.0, 20);
        assert_eq!(LootInventoryPlanner::plan_action(&pack, &loadout(), &config), LootAction::Skip);
    }

    #[test]
    fn value_then_space() {
        let config = LootConfig::default();
        let cheap = item(LootKind::Item, 100.0, 1);
        let fits = item(LootKind::Item, 30_000.0, 2);
        let bulky = item(LootKind::Item, 30_000.0, 9);
        let l = loadout();
        assert_eq!(LootInventoryPlanner::plan_action(&cheap, &l, &config), LootAction::Skip);
        assert_eq!(LootInventoryPlanner::plan_action(&fits, &l, &config), LootAction::Pickup);
        assert_eq!(LootInventoryPlanner::plan_action(&bulky, &l, &config), LootAction::Skip);
    }

    #[test]
    fn worse_gear_falls_through_to_inventory() {
        let config = LootConfig::default();
        let worse_gun = item(LootKind::Weapon, 15_000.0, 2);
        assert_eq!(
            LootInventoryPlanner::plan_action(&worse_gun, &loadout(), &config),
            LootAction::Pickup
        );
    }
}
