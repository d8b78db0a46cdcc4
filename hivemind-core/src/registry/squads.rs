//! Squad registry: same dense/recycling layout as [`super::BotRegistry`],
//! plus membership edits that keep the bot-side [`SquadMembership`] in sync.

use std::collections::HashMap;
use std::ops::{Index, IndexMut};

use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use super::bots::BotRegistry;
use super::entity::SquadMembership;
use crate::error::{HivemindError, Result};
use crate::loot::squad::SquadLootShare;
use crate::squad::objective::SquadObjective;
use crate::squad::personality::SquadPersonality;
use crate::squad::roles::SquadAction;
use crate::squad::SquadRole;
use crate::types::{EntityId, SquadId};

/// Which high-level strategy a squad is running.
///
/// The handle is opaque to the core; the host's strategy layer defines it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct StrategyAssignment {
    /// Host strategy handle.
    pub handle: u32,
    /// Position of the strategy in the squad's score vector.
    pub ordinal: usize,
}

/// A coordinated group of bots.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SquadEntity {
    /// Stable internal id.
    pub id: SquadId,
    /// Host-issued id, if any.
    pub external_id: Option<u64>,
    /// Participating in ticks.
    pub is_active: bool,
    /// How many members the squad wants.
    pub target_member_count: usize,
    /// One score per strategy; length fixed at creation.
    pub strategy_scores: Vec<f32>,
    /// Shared objective and tactical slots.
    pub objective: SquadObjective,
    /// Current strategy.
    pub strategy: Option<StrategyAssignment>,
    /// What the squad is doing; drives role assignment.
    pub action: SquadAction,
    /// Voted personality archetype.
    pub personality: SquadPersonality,
    /// Boss loot scan results shared with followers.
    pub loot_share: SquadLootShare,
    leader: Option<EntityId>,
    members: Vec<EntityId>,
}

impl SquadEntity {
    fn new(id: SquadId, strategy_count: usize, target_member_count: usize) -> Self {
        Self {
            id,
            external_id: None,
            is_active: true,
            target_member_count,
            strategy_scores: vec![0.0; strategy_count],
            objective: SquadObjective::default(),
            strategy: None,
            action: SquadAction::Idle,
            personality: SquadPersonality::None,
            loot_share: SquadLootShare::default(),
            leader: None,
            members: Vec::with_capacity(target_member_count),
        }
    }

    /// Current leader.
    #[must_use]
    pub fn leader(&self) -> Option<EntityId> {
        self.leader
    }

    /// Members in join order. The leader is included.
    #[must_use]
    pub fn members(&self) -> &[EntityId] {
        &self.members
    }

    /// Number of members.
    #[must_use]
    pub fn size(&self) -> usize {
        self.members.len()
    }

    /// Whether `bot` is a member.
    #[must_use]
    pub fn contains(&self, bot: EntityId) -> bool {
        self.members.contains(&bot)
    }

    /// Members excluding the leader, in join order.
    pub fn followers(&self) -> impl Iterator<Item = EntityId> + '_ {
        let leader = self.leader;
        self.members.iter().copied().filter(move |m| Some(*m) != leader)
    }

    /// Pick the highest-scoring strategy. Ties keep the lowest ordinal.
    pub fn select_strategy(&mut self, handles: &[u32]) -> Option<StrategyAssignment> {
        let mut best: Option<(usize, f32)> = None;
        for (ordinal, &score) in self.strategy_scores.iter().enumerate().take(handles.len()) {
            if best.is_none_or(|(_, s)| score > s) {
                best = Some((ordinal, score));
            }
        }
        self.strategy = best.map(|(ordinal, _)| StrategyAssignment {
            handle: handles[ordinal],
            ordinal,
        });
        self.strategy
    }
}

/// Owns every [`SquadEntity`] for the session.
#[derive(Debug, Default)]
pub struct SquadRegistry {
    squads: Vec<SquadEntity>,
    slots: Vec<Option<usize>>,
    free_ids: Vec<u32>,
    by_external: HashMap<u64, SquadId>,
}

impl SquadRegistry {
    /// Create an empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a squad with `strategy_count` strategy scores.
    pub fn add(&mut self, strategy_count: usize, target_member_count: usize) -> SquadId {
        let id = match self.free_ids.pop() {
            Some(raw) => SquadId(raw),
            None => {
                let raw = u32::try_from(self.slots.len()).unwrap_or(u32::MAX);
                self.slots.push(None);
                SquadId(raw)
            }
        };
        self.slots[id.index()] = Some(self.squads.len());
        self.squads.push(SquadEntity::new(id, strategy_count, target_member_count));
        debug!(squad = %id, live = self.squads.len(), "Squad added");
        id
    }

    /// Create a squad and map `external_id` to it.
    pub fn add_with_external(
        &mut self,
        external_id: u64,
        strategy_count: usize,
        target_member_count: usize,
    ) -> SquadId {
        let id = self.add(strategy_count, target_member_count);
        if let Some(previous) = self.by_external.insert(external_id, id) {
            warn!(external_id, previous = %previous, squad = %id, "External squad id remapped");
            if let Some(old) = self.get_mut(previous) {
                old.external_id = None;
            }
        }
        self[id].external_id = Some(external_id);
        id
    }

    /// Remove a squad, clearing membership on every member bot.
    pub fn remove(&mut self, id: SquadId, bots: &mut BotRegistry) -> bool {
        let Some(dense) = self.dense_index(id) else {
            return false;
        };
        let removed = self.squads.swap_remove(dense);
        if let Some(moved) = self.squads.get(dense) {
            self.slots[moved.id.index()] = Some(dense);
        }
        self.slots[id.index()] = None;
        self.free_ids.push(id.0);
        if let Some(external) = removed.external_id {
            if self.by_external.get(&external) == Some(&id) {
                self.by_external.remove(&external);
            }
        }
        for member in removed.members {
            if let Some(bot) = bots.get_mut(member) {
                if bot.squad.is_some_and(|m| m.squad == id) {
                    bot.squad = None;
                }
            }
        }
        debug!(squad = %id, live = self.squads.len(), "Squad removed");
        true
    }

    /// Reset to a pristine empty state. Bot memberships are not touched.
    pub fn clear(&mut self) {
        self.squads.clear();
        self.slots.clear();
        self.free_ids.clear();
        self.by_external.clear();
    }

    /// Add `bot` to `squad`, leaving any previous squad first.
    ///
    /// The first member becomes leader.
    ///
    /// # Errors
    /// `SquadNotFound`, `EntityNotFound`, or `SquadFull` when the squad
    /// already holds `max_members`.
    pub fn add_member(
        &mut self,
        bots: &mut BotRegistry,
        squad: SquadId,
        bot: EntityId,
        max_members: usize,
    ) -> Result<()> {
        if !bots.contains(bot) {
            return Err(HivemindError::EntityNotFound(bot));
        }
        let entry = self.get(squad).ok_or(HivemindError::SquadNotFound(squad))?;
        if entry.contains(bot) {
            return Ok(());
        }
        let limit = max_members.min(crate::squad::MAX_SQUAD_SIZE);
        if entry.size() >= limit {
            return Err(HivemindError::SquadFull { squad, limit });
        }

        self.remove_member(bots, bot);

        let entry = &mut self[squad];
        entry.members.push(bot);
        let mut membership = SquadMembership::new(squad);
        if entry.leader.is_none() {
            entry.leader = Some(bot);
            membership.role = SquadRole::Leader;
        }
        bots[bot].squad = Some(membership);
        debug!(squad = %squad, bot = %bot, size = entry.members.len(), "Squad member added");
        Ok(())
    }

    /// Take `bot` out of its squad. Promotes the next member if it led.
    ///
    /// Returns `false` if the bot was not in a squad.
    pub fn remove_member(&mut self, bots: &mut BotRegistry, bot: EntityId) -> bool {
        let Some(squad_id) = bots.get(bot).and_then(|b| b.squad).map(|m| m.squad) else {
            return false;
        };
        if let Some(b) = bots.get_mut(bot) {
            b.squad = None;
        }
        let Some(squad) = self.get_mut(squad_id) else {
            return true;
        };
        squad.members.retain(|&m| m != bot);
        if squad.leader == Some(bot) {
            squad.leader = squad.members.first().copied();
            if let Some(new_leader) = squad.leader {
                if let Some(membership) = bots.get_mut(new_leader).and_then(|b| b.squad.as_mut()) {
                    membership.role = SquadRole::Leader;
                }
                debug!(squad = %squad_id, leader = %new_leader, "Squad leader promoted");
            }
        }
        true
    }

    /// Make `bot` the leader of its squad.
    ///
    /// # Errors
    /// `SquadNotFound` or `EntityNotFound` if `bot` is not a member.
    pub fn set_leader(&mut self, bots: &mut BotRegistry, squad: SquadId, bot: EntityId) -> Result<()> {
        let entry = self.get_mut(squad).ok_or(HivemindError::SquadNotFound(squad))?;
        if !entry.contains(bot) {
            return Err(HivemindError::EntityNotFound(bot));
        }
        let previous = entry.leader.replace(bot);
        if let Some(prev) = previous.filter(|&p| p != bot) {
            if let Some(m) = bots.get_mut(prev).and_then(|b| b.squad.as_mut()) {
                m.role = SquadRole::None;
            }
        }
        if let Some(m) = bots.get_mut(bot).and_then(|b| b.squad.as_mut()) {
            m.role = SquadRole::Leader;
        }
        Ok(())
    }

    /// Number of live squads.
    #[must_use]
    pub fn len(&self) -> usize {
        self.squads.len()
    }

    /// No live squads.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.squads.is_empty()
    }

    fn dense_index(&self, id: SquadId) -> Option<usize> {
        self.slots.get(id.index()).copied().flatten()
    }

    /// Whether `id` is live.
    #[must_use]
    pub fn contains(&self, id: SquadId) -> bool {
        self.dense_index(id).is_some()
    }

    /// Look up a live squad.
    #[must_use]
    pub fn get(&self, id: SquadId) -> Option<&SquadEntity> {
        self.dense_index(id).map(|i| &self.squads[i])
    }

    /// Look up a live squad mutably.
    pub fn get_mut(&mut self, id: SquadId) -> Option<&mut SquadEntity> {
        let i = self.dense_index(id)?;
        Some(&mut self.squads[i])
    }

    /// Look up a live squad or fail.
    ///
    /// # Errors
    /// Returns `SquadNotFound` if `id` is not live.
    pub fn squad(&self, id: SquadId) -> Result<&SquadEntity> {
        self.get(id).ok_or(HivemindError::SquadNotFound(id))
    }

    /// Resolve a host-issued squad id.
    #[must_use]
    pub fn try_get_by_external(&self, external_id: u64) -> Option<SquadId> {
        self.by_external.get(&external_id).copied()
    }

    /// Iterate live squads in dense order.
    pub fn iter(&self) -> std::slice::Iter<'_, SquadEntity> {
        self.squads.iter()
    }

    /// Iterate live squads mutably in dense order.
    pub fn iter_mut(&mut self) -> std::slice::IterMut<'_, SquadEntity> {
        self.squads.iter_mut()
    }

    /// Ids of all live squads in dense order.
    pub fn ids(&self) -> impl Iterator<Item = SquadId> + '_ {
        self.squads.iter().map(|s| s.id)
    }
}

impl Index<SquadId> for SquadRegistry {
    type Output = SquadEntity;

    fn index(&self, id: SquadId) -> &Self::Output {
        match self.get(id) {
            Some(squad) => squad,
            None => panic!("no live squad {id}"),
        }
    }
}

impl IndexMut<SquadId> for SquadRegistry {
    fn index_mut(&mut self, id: SquadId) -> &mut Self::Output {
        match self.get_mut(id) {
            Some(squad) => squad,
            None => panic!("no live squad {id}"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn setup(n: usize) -> (BotRegistry, SquadRegistry, SquadId, Vec<EntityId>) {
        let mut bots = BotRegistry::new();
        let mut squads = SquadRegistry::new();
        let squad = squads.add(3, n);
        let ids: Vec<_> = (0..n).map(|_| bots.add()).collect();
        for &id in &ids {
            squads.add_member(&mut bots, squad, id, 6).expect("room in squad");
        }
        (bots, squads, squad, ids)
    }

    #[test]
    fn first_member_leads() {
        let (bots, squads, squad, ids) = setup(3);
        assert_eq!(squads[squad].leader(), Some(ids[0]));
        assert_eq!(bots[ids[0]].squad.map(|m| m.role), Some(SquadRole::Leader));
        assert_eq!(squads[squad].followers().collect::<Vec<_>>(), vec![ids[1], ids[2]]);
        assert_eq!(squads[squad].strategy_scores.len(), 3);
    }

    #[test]
    fn full_squad_rejects_member() {
        let (mut bots, mut squads, squad, _) = setup(2);
        let extra = bots.add();
        let err = squads.add_member(&mut bots, squad, extra, 2).unwrap_err();
        assert!(matches!(err, HivemindError::SquadFull { limit: 2, .. }));
        assert!(bots[extra].squad.is_none());
    }

    #[test]
    fn re_adding_member_is_noop() {
        let (mut bots, mut squads, squad, ids) = setup(2);
        squads.add_member(&mut bots, squad, ids[1], 6).expect("idempotent add");
        assert_eq!(squads[squad].size(), 2);
    }

    #[test]
    fn joining_new_squad_leaves_old_one() {
        let (mut bots, mut squads, first, ids) = setup(2);
        let second = squads.add(1, 2);
        squads.add_member(&mut bots, second, ids[1], 6).expect("join");
        assert!(!squads[first].contains(ids[1]));
        assert_eq!(bots[ids[1]].squad.map(|m| m.squad), Some(second));
        assert_eq!(squads[second].leader(), Some(ids[1]));
    }

    #[test]
    fn leader_loss_promotes_next_member() {
        let (mut bots, mut squads, squad, ids) = setup(3);
        assert!(squads.remove_member(&mut bots, ids[0]));
        assert_eq!(squads[squad].leader(), Some(ids[1]));
        assert_eq!(bots[ids[1]].squad.map(|m| m.role), Some(SquadRole::Leader));
        assert!(!squads.remove_member(&mut bots, ids[0]));
    }

    #[test]
    fn removing_squad_clears_memberships() {
        let (mut bots, mut squads, squad, ids) = setup(3);
        assert!(squads.remove(squad, &mut bots));
        assert!(ids.iter().all(|&id| bots[id].squad.is_none()));
        assert!(!squads.remove(squad, &mut bots));
        assert_eq!(squads.add(1, 1), squad);
    }

    #[test]
    fn set_leader_swaps_roles() {
        let (mut bots, mut squads, squad, ids) = setup(3);
        squads.set_leader(&mut bots, squad, ids[2]).expect("member");
        assert_eq!(squads[squad].leader(), Some(ids[2]));
        assert_eq!(bots[ids[0]].squad.map(|m| m.role), Some(SquadRole::None));
        let outsider = bots.add();
        assert!(squads.set_leader(&mut bots, squad, outsider).is_err());
    }

    #[test]
    fn strategy_selection_takes_max_first_seen() {
        let (_, mut squads, squad, _) = setup(1);
        squads[squad].strategy_scores.copy_from_slice(&[0.2, 0.7, 0.7]);
        let picked = squads[squad].select_strategy(&[10, 20, 30]).expect("scores present");
        assert_eq!(picked, StrategyAssignment { handle: 20, ordinal: 1 });
    }
}
