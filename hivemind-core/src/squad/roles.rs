//! Role assignment from the squad's current action.

use serde::{Deserialize, Serialize};

use super::SquadRole;

/// What the squad is doing as a whole.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum SquadAction {
    /// No group action.
    #[default]
    Idle,
    /// Travelling to the objective.
    MoveToObjective,
    /// Holding at the objective.
    HoldPosition,
    /// Setting an ambush.
    Ambush,
    /// Long-range overwatch.
    Snipe,
    /// Planting a quest item.
    PlantItem,
    /// Walking a patrol route.
    Patrol,
    /// Looting.
    Loot,
}

/// `[first, second, rest]` roles for each action.
const ROLE_TABLE: [(SquadAction, [SquadRole; 3]); 8] = [
    (SquadAction::Idle, [SquadRole::Guard, SquadRole::Guard, SquadRole::Guard]),
    (SquadAction::MoveToObjective, [SquadRole::Escort, SquadRole::Flanker, SquadRole::Escort]),
    (SquadAction::HoldPosition, [SquadRole::Guard, SquadRole::Overwatch, SquadRole::Guard]),
    (SquadAction::Ambush, [SquadRole::Flanker, SquadRole::Overwatch, SquadRole::Flanker]),
    (SquadAction::Snipe, [SquadRole::Overwatch, SquadRole::Guard, SquadRole::Guard]),
    (SquadAction::PlantItem, [SquadRole::Guard, SquadRole::Overwatch, SquadRole::Flanker]),
    (SquadAction::Patrol, [SquadRole::Escort, SquadRole::Escort, SquadRole::Escort]),
    (SquadAction::Loot, [SquadRole::Guard, SquadRole::Overwatch, SquadRole::Guard]),
];

/// The `[first, second, rest]` role pattern for `action`.
#[must_use]
pub fn role_pattern(action: SquadAction) -> [SquadRole; 3] {
    ROLE_TABLE
        .iter()
        .find(|(a, _)| *a == action)
        .map_or([SquadRole::Guard; 3], |(_, pattern)| *pattern)
}

/// Fill `out[..member_count]` with roles for followers in join order.
///
/// Returns how many roles were written (bounded by `out.len()`).
pub fn assign_roles(action: SquadAction, member_count: usize, out: &mut [SquadRole]) -> usize {
    let [first, second, rest] = role_pattern(action);
    let n = member_count.min(out.len());
    for (i, slot) in out.iter_mut().take(n).enumerate() {
        *slot = match i {
            0 => first,
            1 => second,
            _ => rest,
        };
    }
    n
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn pattern_applies_first_second_rest() {
        let mut roles = [SquadRole::None; 5];
        assert_eq!(assign_roles(SquadAction::Ambush, 4, &mut roles), 4);
        assert_eq!(
            roles,
            [
                SquadRole::Flanker,
                SquadRole::Overwatch,
                SquadRole::Flanker,
                SquadRole::Flanker,
                SquadRole::None,
            ]
        );
    }

    #[test]
    fn output_bounds_are_respected() {
        let mut roles = [SquadRole::None; 1];
        assert_eq!(assign_roles(SquadAction::HoldPosition, 3, &mut roles), 1);
        assert_eq!(roles[0], SquadRole::Guard);
        assert_eq!(assign_roles(SquadAction::HoldPosition, 0, &mut roles), 0);
    }

    #[test]
    fn every_action_has_a_pattern() {
        for (action, pattern) in ROLE_TABLE {
            assert_eq!(role_pattern(action), pattern);
        }
    }
}
