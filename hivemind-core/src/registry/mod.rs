//! Entity and squad registries: the arena every other subsystem indexes into.

pub mod bots;
pub mod entity;
pub mod squads;

pub use bots::BotRegistry;
pub use entity::{BotEntity, SquadMembership};
pub use squads::{SquadEntity, SquadRegistry, StrategyAssignment};
