//! Error types for the hivemind core library.
//!
//! Tick-path operations are total and report "no result" through `Option`
//! or `bool`; this type covers typed lookups, capacity-limited mutations and
//! configuration loading.

use thiserror::Error;

use crate::types::{EntityId, SquadId};

/// Top-level error type for all hivemind operations.
#[derive(Error, Debug)]
pub enum HivemindError {
    /// No live entity with the given id.
    #[error("Entity not found: {0}")]
    EntityNotFound(EntityId),

    /// No live squad with the given id.
    #[error("Squad not found: {0}")]
    SquadNotFound(SquadId),

    /// No entity registered under the given host id.
    #[error("External id not mapped: {0}")]
    ExternalIdNotFound(u64),

    /// Squad membership would exceed the configured limit.
    #[error("Squad {squad} is full (limit: {limit})")]
    SquadFull {
        /// The full squad.
        squad: SquadId,
        /// Maximum allowed members.
        limit: usize,
    },

    /// Configuration error.
    #[error("Configuration error: {0}")]
    Config(String),

    /// Generic I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Convenience Result type alias.
pub type Result<T> = std::result::Result<T, HivemindError>;
