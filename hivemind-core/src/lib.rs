//! # Hivemind Core Library
//!
//! Per-tick simulation core for squads of autonomous bots: who leads whom,
//! where each squad member should stand, which combat events matter, and
//! which loot, quest or patrol route suits each bot.
//!
//! The host game owns rendering, navigation and sensing. It feeds positions,
//! sensor booleans and combat events in, and reads decisions back out:
//!
//! - **Registry**: dense entity and squad arenas with recycled ids
//! - **Hive**: boss/follower links and group sensor queries
//! - **Combat**: event ring buffer, clustering, dynamic objectives
//! - **Squad**: roles, tactical and formation geometry, communication tiers
//! - **Loot**: claims, gear comparison, scoring, squad looting
//! - **Objective**: quest scoring and patrol route selection
//! - **Behavior**: vulture, room-clear and look-variance instructions
//!
//! [`Hivemind`] owns all of it and runs the phases in a fixed order once per
//! tick.
//!
//! ## Performance Contract
//!
//! Tick-path functions never block and never allocate per call beyond
//! amortized growth of reused buffers. Per-squad scratch is stack arrays
//! bounded by [`squad::MAX_SQUAD_SIZE`].

#![deny(clippy::unwrap_used)]
#![warn(missing_docs)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]

pub mod behavior;
pub mod combat;
pub mod config;
pub mod error;
pub mod hive;
pub mod loot;
pub mod metrics;
pub mod objective;
pub mod registry;
pub mod squad;
pub mod tick;
pub mod types;

pub use config::HivemindConfig;
pub use error::{HivemindError, Result};
pub use registry::{BotEntity, BotRegistry, SquadEntity, SquadRegistry};
pub use tick::{Hivemind, TickReport};
pub use types::*;
