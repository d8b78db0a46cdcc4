//! Squad looting: the boss claims first and shares the rest of its scan.

use serde::{Deserialize, Serialize};
use tracing::trace;

use super::claims::LootClaimRegistry;
use super::planner::LootItem;
use crate::types::{EntityId, LootId, Position};

/// Capacity of the shared scan buffer.
pub const SQUAD_LOOT_SHARE_CAPACITY: usize = 8;

/// Followers within this distance of their tactical position count as
/// arrived.
pub const ARRIVED_RADIUS: f32 = 5.0;

/// An item the boss saw.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct SharedLoot {
    /// Host identifier.
    pub id: LootId,
    /// World position.
    pub position: Position,
    /// Market value.
    pub value: f32,
}

impl From<&LootItem> for SharedLoot {
    fn from(item: &LootItem) -> Self {
        Self {
            id: item.id,
            position: item.position,
            value: item.value,
        }
    }
}

/// Fixed-size buffer of the boss's latest scan plus the boss's own pick.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SquadLootShare {
    items: [SharedLoot; SQUAD_LOOT_SHARE_CAPACITY],
    len: usize,
    boss_target: Option<LootId>,
}

impl SquadLootShare {
    /// Replace the buffer with the first [`SQUAD_LOOT_SHARE_CAPACITY`]
    /// items of a scan. Returns how many were kept.
    pub fn publish<'a>(&mut self, scan: impl IntoIterator<Item = &'a LootItem>) -> usize {
        self.len = 0;
        self.boss_target = None;
        for (slot, item) in self.items.iter_mut().zip(scan) {
            *slot = SharedLoot::from(item);
            self.len += 1;
        }
        self.len
    }

    /// Items currently shared.
    #[must_use]
    pub fn items(&self) -> &[SharedLoot] {
        &self.items[..self.len]
    }

    /// The item the boss claimed from this scan.
    #[must_use]
    pub fn boss_target(&self) -> Option<LootId> {
        self.boss_target
    }

    /// Forget the boss's pick once its claim is gone.
    pub fn forget_boss_target(&mut self) {
        self.boss_target = None;
    }

    /// Drop everything.
    pub fn clear(&mut self) {
        self.len = 0;
        self.boss_target = None;
    }

    /// The boss greedily claims the highest-value item nobody else holds.
    pub fn claim_for_boss(&mut self, boss: EntityId, claims: &mut LootClaimRegistry) -> Option<LootId> {
        let mut best: Option<SharedLoot> = None;
        for item in self.items() {
            if claims.is_claimed_by_other(item.id, boss) {
                continue;
            }
            if best.is_none_or(|b| item.value > b.value) {
                best = Some(*item);
            }
        }
        let pick = best?;
        if !claims.try_claim(boss, pick.id) {
            return None;
        }
        trace!(boss = %boss, loot = pick.id, value = pick.value, "Boss claimed squad loot");
        self.boss_target = Some(pick.id);
        Some(pick.id)
    }

    /// A follower picks the most valuable shared item that is neither the
    /// boss's target nor held by another bot, and claims it.
    pub fn claim_for_follower(
        &self,
        follower: EntityId,
        claims: &mut LootClaimRegistry,
    ) -> Option<SharedLoot> {
        let mut best: Option<SharedLoot> = None;
        for item in self.items() {
            if Some(item.id) == self.boss_target || claims.is_claimed_by_other(item.id, follower) {
                continue;
            }
            if best.is_none_or(|b| item.value > b.value) {
                best = Some(*item);
            }
        }
        let pick = best?;
        claims.try_claim(follower, pick.id).then_some(pick)
    }
}

/// Facts deciding whether a follower may break off to loot.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FollowerLootCheck {
    /// Follower is fighting.
    pub in_combat: bool,
    /// Follower position.
    pub position: Position,
    /// Boss position.
    pub boss_position: Position,
    /// Boss is looting.
    pub boss_looting: bool,
    /// Boss is holding at the objective.
    pub boss_holding: bool,
    /// Follower's tactical position, if assigned.
    pub tactical_position: Option<Position>,
}

/// Not in combat, within `comm_range` of the boss, and the boss is looting
/// or holding, or the follower has reached its tactical position.
#[must_use]
pub fn follower_may_loot(check: &FollowerLootCheck, comm_range: f32) -> bool {
    if check.in_combat {
        return false;
    }
    if check.position.horizontal_distance_sq(&check.boss_position) > comm_range * comm_range {
        return false;
    }
    let arrived = check
        .tactical_position
        .is_some_and(|t| t.horizontal_distance_sq(&check.position) <= ARRIVED_RADIUS * ARRIVED_RADIUS);
    check.boss_looting || check.boss_holding || arrived
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::loot::planner::LootKind;

    fn item(id: LootId, value: f32) -> LootItem {
        LootItem {
            id,
            position: Position::ZERO,
            value,
            size: 1,
            kind: LootKind::Item,
        }
    }

    fn check() -> FollowerLootCheck {
        FollowerLootCheck {
            in_combat: false,
            position: Position::new(10.0, 0.0, 0.0),
            boss_position: Position::ZERO,
            boss_looting: false,
            boss_holding: false,
            tactical_position: None,
        }
    }

    #[test]
    fn buffer_keeps_first_eight() {
        let scan: Vec<_> = (0..12).map(|i| item(i, 1.0)).collect();
        let mut share = SquadLootShare::default();
        assert_eq!(share.publish(&scan), SQUAD_LOOT_SHARE_CAPACITY);
        assert_eq!(share.items().last().map(|s| s.id), Some(7));
    }

    #[test]
    fn boss_takes_the_best_followers_take_the_rest() {
        let scan = [item(1, 10.0), item(2, 90.0), item(3, 50.0), item(4, 70.0)];
        let mut share = SquadLootShare::default();
        share.publish(&scan);
        let mut claims = LootClaimRegistry::new();
        claims.try_claim(EntityId(9), 4);

        assert_eq!(share.claim_for_boss(EntityId(0), &mut claims), Some(2));
        let first = share.claim_for_follower(EntityId(1), &mut claims).map(|s| s.id);
        let second = share.claim_for_follower(EntityId(2), &mut claims).map(|s| s.id);
        assert_eq!(first, Some(3));
        assert_eq!(second, Some(1));
        assert!(share.claim_for_follower(EntityId(3), &mut claims).is_none());
    }

    #[test]
    fn follower_gating() {
        assert!(!follower_may_loot(&check(), 35.0));
        assert!(follower_may_loot(&FollowerLootCheck { boss_looting: true, ..check() }, 35.0));
        assert!(follower_may_loot(&FollowerLootCheck { boss_holding: true, ..check() }, 35.0));
        let arrived = FollowerLootCheck {
            tactical_position: Some(Position::new(13.0, 0.0, 0.0)),
            ..check()
        };
        assert!(follower_may_loot(&arrived, 35.0));
        let fighting = FollowerLootCheck { in_combat: true, boss_looting: true, ..check() };
        assert!(!follower_may_loot(&fighting, 35.0));
        let far = FollowerLootCheck {
            position: Position::new(100.0, 0.0, 0.0),
            boss_looting: true,
            ..check()
        };
        assert!(!follower_may_loot(&far, 35.0));
    }
}
