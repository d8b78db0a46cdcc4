//! Combat awareness: the event ring buffer, clustering, and the dynamic
//! objective candidates built from them.

pub mod clustering;
pub mod dynamic;
pub mod events;

pub use clustering::{CombatCluster, EventClusterer};
pub use dynamic::{DynamicObjective, DynamicObjectiveKind, generate_candidates};
pub use events::{CombatEvent, CombatEventKind, CombatEventLog, filter_death_events};
