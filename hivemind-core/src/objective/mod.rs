//! Objective and route scoring.

pub mod patrol;
pub mod quest;

pub use patrol::{PatrolChooser, PatrolRoute, score_route, select_route};
pub use quest::{QuestCandidate, exfil_penalty, score_quest, select_highest_index};
