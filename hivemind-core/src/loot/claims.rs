//! Loot claim registry: one bot per item, revocable.
//!
//! A forward map (item → bot) answers "who has this?", a reverse map
//! (bot → items) makes releasing everything a bot holds O(claims). Every
//! mutation touches both maps.

use std::collections::HashMap;

use tracing::{debug, trace};

use crate::types::{EntityId, LootId};

/// Exclusive claims of loot items by bots.
#[derive(Debug, Default, Clone)]
pub struct LootClaimRegistry {
    owners: HashMap<LootId, EntityId>,
    held: HashMap<EntityId, Vec<LootId>>,
}

impl LootClaimRegistry {
    /// Create an empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Claim `loot` for `bot`.
    ///
    /// Succeeds if the item is free or already held by `bot`; fails if
    /// another bot holds it.
    pub fn try_claim(&mut self, bot: EntityId, loot: LootId) -> bool {
        match self.owners.get(&loot) {
            Some(&owner) if owner == bot => true,
            Some(&owner) => {
                trace!(bot = %bot, loot, owner = %owner, "Loot claim denied");
                false
            }
            None => {
                self.owners.insert(loot, bot);
                self.held.entry(bot).or_default().push(loot);
                trace!(bot = %bot, loot, "Loot claimed");
                true
            }
        }
    }

    /// Release `loot` if `bot` holds it. Releasing an unheld item is a no-op.
    pub fn release(&mut self, bot: EntityId, loot: LootId) -> bool {
        if self.owners.get(&loot) != Some(&bot) {
            return false;
        }
        self.owners.remove(&loot);
        if let Some(items) = self.held.get_mut(&bot) {
            items.retain(|&l| l != loot);
            if items.is_empty() {
                self.held.remove(&bot);
            }
        }
        true
    }

    /// Release every item `bot` holds. Returns how many were released.
    pub fn release_all(&mut self, bot: EntityId) -> usize {
        let Some(items) = self.held.remove(&bot) else {
            return 0;
        };
        for loot in &items {
            self.owners.remove(loot);
        }
        debug!(bot = %bot, released = items.len(), "Released all loot claims");
        items.len()
    }

    /// The bot holding `loot`, if any.
    #[must_use]
    pub fn claimed_by(&self, loot: LootId) -> Option<EntityId> {
        self.owners.get(&loot).copied()
    }

    /// Whether `loot` is held by someone other than `bot`.
    #[must_use]
    pub fn is_claimed_by_other(&self, loot: LootId, bot: EntityId) -> bool {
        self.claimed_by(loot).is_some_and(|owner| owner != bot)
    }

    /// Items held by `bot`, in claim order.
    #[must_use]
    pub fn claims_of(&self, bot: EntityId) -> &[LootId] {
        self.held.get(&bot).map_or(&[], Vec::as_slice)
    }

    /// Total number of claimed items.
    #[must_use]
    pub fn len(&self) -> usize {
        self.owners.len()
    }

    /// Whether nothing is claimed.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.owners.is_empty()
    }

    /// Drop every claim.
    pub fn clear(&mut self) {
        self.owners.clear();
        self.held.clear();
    }
}
