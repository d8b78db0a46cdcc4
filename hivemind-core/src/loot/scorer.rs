//! Loot scoring: how much a bot should want an item right now.

use super::planner::{Loadout, LootItem};
use crate::config::LootConfig;
use crate::types::{GameTime, LootId, Position};

/// Value weight before the other terms.
const VALUE_WEIGHT: f32 = 0.5;

/// Looks up an item's market value.
///
/// Implemented for any `Fn(LootId) -> Option<f32>`.
pub trait PriceSource {
    /// Price of `loot`, or `None` if unknown.
    fn price(&self, loot: LootId) -> Option<f32>;
}

impl<F> PriceSource for F
where
    F: Fn(LootId) -> Option<f32>,
{
    fn price(&self, loot: LootId) -> Option<f32> {
        self(loot)
    }
}

/// Per-bot facts the scorer needs.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LootContext {
    /// Bot position.
    pub position: Position,
    /// Current objective, if any.
    pub objective: Option<Position>,
    /// Whether the bot is fighting.
    pub in_combat: bool,
    /// When the bot last looted.
    pub last_loot_time: GameTime,
    /// Current time.
    pub now: GameTime,
}

/// Scores items in `[0, 1]`.
pub struct LootScorer;

impl LootScorer {
    /// Score `item` for a bot with `loadout` in `ctx`.
    ///
    /// Zero in combat, when the item is below the value floor, or when it
    /// does not fit and is not a gear upgrade.
    #[must_use]
    pub fn score(item: &LootItem, loadout: &Loadout, ctx: &LootContext, config: &LootConfig) -> f32 {
        if ctx.in_combat {
            return 0.0;
        }
        let upgrade = loadout.is_gear_upgrade(item);
        if !upgrade && (item.size > loadout.free_space || item.value < config.min_item_value) {
            return 0.0;
        }

        let cap = config.value_cap.max(f32::EPSILON);
        let value_score = (item.value / cap).clamp(0.0, 1.0) * VALUE_WEIGHT;

        let distance = ctx.position.distance(&item.position);
        let distance_penalty =
            (distance * config.distance_penalty_per_meter).min(config.max_distance_penalty);

        let objective_bonus = ctx
            .objective
            .filter(|o| o.distance_sq(&item.position) <= config.objective_bonus_radius * config.objective_bonus_radius)
            .map_or(0.0, |_| config.objective_bonus);
        let gear_bonus = if upgrade { config.gear_upgrade_bonus } else { 0.0 };

        let cooldown = cooldown_multiplier(ctx.now - ctx.last_loot_time, config.cooldown);
        let raw = (value_score - distance_penalty + objective_bonus + gear_bonus) * cooldown;
        if raw.is_nan() { 0.0 } else { raw.clamp(0.0, 1.0) }
    }

    /// Like [`LootScorer::score`] but takes the value from `prices`,
    /// falling back to the item's own value.
    #[must_use]
    pub fn score_priced(
        item: &LootItem,
        prices: &impl PriceSource,
        loadout: &Loadout,
        ctx: &LootContext,
        config: &LootConfig,
    ) -> f32 {
        let priced = LootItem {
            value: prices.price(item.id).unwrap_or(item.value),
            ..*item
        };
        Self::score(&priced, loadout, ctx, config)
    }
}

/// Ramps linearly from 0 right after looting to 1 at `cooldown`.
fn cooldown_multiplier(since_last: f32, cooldown: f32) -> f32 {
    if cooldown <= 0.0 {
        return 1.0;
    }
    (since_last / cooldown).clamp(0.0, 1.0)
}
