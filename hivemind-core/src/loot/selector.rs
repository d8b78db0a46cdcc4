//! Best-candidate selection with claim filtering.

use super::claims::LootClaimRegistry;
use crate::types::{EntityId, LootId};

/// Picks the best unclaimed loot target for a bot.
pub struct LootTargetSelector;

impl LootTargetSelector {
    /// Index of the highest score among candidates not claimed by another
    /// bot. Ties keep the first seen; `None` if nothing qualifies.
    ///
    /// `ids` and `scores` are read pairwise up to the shorter length.
    #[must_use]
    pub fn select_best(
        bot: EntityId,
        ids: &[LootId],
        scores: &[f32],
        claims: &LootClaimRegistry,
    ) -> Option<usize> {
        let mut best: Option<(usize, f32)> = None;
        for (i, (&loot, &score)) in ids.iter().zip(scores).enumerate() {
            if claims.is_claimed_by_other(loot, bot) || score.is_nan() {
                continue;
            }
            if best.is_none_or(|(_, s)| score > s) {
                best = Some((i, score));
            }
        }
        best.map(|(i, _)| i)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn skips_items_claimed_by_others() {
        let mut claims = LootClaimRegistry::new();
        claims.try_claim(EntityId(2), 11);
        let best = LootTargetSelector::select_best(EntityId(1), &[10, 11, 12], &[0.3, 0.9, 0.5], &claims);
        assert_eq!(best, Some(2));
    }

    #[test]
    fn own_claims_stay_eligible() {
        let mut claims = LootClaimRegistry::new();
        claims.try_claim(EntityId(1), 11);
        let best = LootTargetSelector::select_best(EntityId(1), &[10, 11], &[0.3, 0.9], &claims);
        assert_eq!(best, Some(1));
    }

    #[test]
    fn ties_keep_first_and_empty_is_none() {
        let claims = LootClaimRegistry::new();
        assert_eq!(
            LootTargetSelector::select_best(EntityId(1), &[1, 2, 3], &[0.4, 0.7, 0.7], &claims),
            Some(1)
        );
        assert_eq!(LootTargetSelector::select_best(EntityId(1), &[], &[], &claims), None);
    }
}
