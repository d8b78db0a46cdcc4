//! Squad personality: a majority vote over member bot types.

use serde::{Deserialize, Serialize};

use crate::types::BotType;

/// Squad-wide behaviour archetype.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum SquadPersonality {
    /// No votes cast.
    #[default]
    None,
    /// Boss retinues: tight and aggressive.
    Elite,
    /// PMC teams: coordinated and measured.
    TacticalProfessional,
    /// Scav gangs: loose and loud.
    GangMember,
    /// Player-scav groups: loot first, fight second.
    Opportunist,
}

/// Fixed numbers each archetype carries.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PersonalityProfile {
    /// Coordination level, 1..=5.
    pub coordination: u8,
    /// Aggression in `[0, 1]`.
    pub aggression: f32,
    /// Chance a member shares loot finds, `[0, 1]`.
    pub sharing_chance: f32,
}

impl SquadPersonality {
    /// The archetype a single bot type votes for.
    #[must_use]
    pub fn for_bot_type(bot_type: BotType) -> Self {
        match bot_type {
            BotType::Unknown => Self::None,
            BotType::Pmc => Self::TacticalProfessional,
            BotType::Scav => Self::GangMember,
            BotType::PlayerScav => Self::Opportunist,
            BotType::Boss => Self::Elite,
        }
    }

    /// The archetype's profile, `None` for [`SquadPersonality::None`].
    #[must_use]
    pub fn profile(self) -> Option<PersonalityProfile> {
        let (coordination, aggression, sharing_chance) = match self {
            Self::None => return None,
            Self::Elite => (5, 0.8, 0.9),
            Self::TacticalProfessional => (4, 0.6, 0.7),
            Self::GangMember => (2, 0.5, 0.3),
            Self::Opportunist => (3, 0.4, 0.5),
        };
        Some(PersonalityProfile {
            coordination,
            aggression,
            sharing_chance,
        })
    }
}

/// Majority vote over member types. Ties go to the higher [`BotType`];
/// `Unknown` members abstain.
#[must_use]
pub fn vote_personality(members: impl IntoIterator<Item = BotType>) -> SquadPersonality {
    let mut votes = [0u32; BotType::ALL.len()];
    for bot_type in members {
        if bot_type != BotType::Unknown {
            votes[bot_type as usize] += 1;
        }
    }
    let mut winner: Option<(BotType, u32)> = None;
    for bot_type in BotType::ALL {
        let count = votes[bot_type as usize];
        // `>=` so later (higher) variants win ties.
        if count > 0 && winner.is_none_or(|(_, best)| count >= best) {
            winner = Some((bot_type, count));
        }
    }
    winner.map_or(SquadPersonality::None, |(t, _)| SquadPersonality::for_bot_type(t))
}
