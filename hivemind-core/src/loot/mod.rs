//! Loot deconfliction, gear comparison, scoring and squad looting.

pub mod claims;
pub mod gear;
pub mod planner;
pub mod scorer;
pub mod selector;
pub mod squad;

pub use claims::LootClaimRegistry;
pub use gear::{GearComparer, RigStats};
pub use planner::{Loadout, LootAction, LootInventoryPlanner, LootItem, LootKind};
pub use scorer::{LootContext, LootScorer, PriceSource};
pub use selector::LootTargetSelector;
pub use squad::{FollowerLootCheck, SharedLoot, SquadLootShare, follower_may_loot};
