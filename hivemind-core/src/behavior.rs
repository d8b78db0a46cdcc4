//! Small per-bot instruction state machines: vulture, room clear, and look
//! variance. Each advances once per tick and reports an instruction code
//! the host turns into movement or aim.

use rand::Rng;
use serde::{Deserialize, Serialize};

use crate::combat::CombatEventLog;
use crate::config::BehaviorConfig;
use crate::types::{GameTime, Heading, Position};

/// Vulture counts as arrived within this distance while rushing.
pub const VULTURE_ARRIVAL_RADIUS: f32 = 3.0;

/// Lateral distance of a flank glance target.
const FLANK_GLANCE_DISTANCE: f32 = 10.0;

/// Stalking a fight to pick off the survivors.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum VulturePhase {
    /// Not vulturing.
    #[default]
    Idle,
    /// Moving towards the fight.
    Approach,
    /// Close enough to be heard: walk quietly.
    SilentApproach,
    /// In position, waiting.
    Ambush,
    /// Waited long enough; push in.
    Rush,
    /// Finished or timed out.
    Done,
}

/// Vulture progress.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct VultureState {
    /// Current phase.
    pub phase: VulturePhase,
    /// Where the fight was.
    pub target: Option<Position>,
    /// When the vulture started.
    pub started_at: GameTime,
    /// When the ambush began.
    pub ambush_started_at: GameTime,
}

impl VultureState {
    /// Start stalking `target`.
    pub fn begin(&mut self, target: Position, now: GameTime) {
        *self = Self {
            phase: VulturePhase::Approach,
            target: Some(target),
            started_at: now,
            ambush_started_at: now,
        };
    }

    /// Drop back to idle.
    pub fn reset(&mut self) {
        *self = Self::default();
    }

    /// Whether a vulture is in progress.
    #[must_use]
    pub fn is_running(&self) -> bool {
        !matches!(self.phase, VulturePhase::Idle | VulturePhase::Done)
    }

    /// Advance from the bot's position. At most one phase change per call.
    pub fn update(&mut self, position: Position, now: GameTime, config: &BehaviorConfig) -> VulturePhase {
        if !self.is_running() {
            return self.phase;
        }
        let Some(target) = self.target else {
            self.phase = VulturePhase::Done;
            return self.phase;
        };
        if now - self.started_at >= config.vulture_max_duration {
            self.phase = VulturePhase::Done;
            return self.phase;
        }
        let distance = position.horizontal_distance(&target);
        self.phase = match self.phase {
            VulturePhase::Approach if distance <= config.vulture_silent_distance => {
                VulturePhase::SilentApproach
            }
            VulturePhase::SilentApproach if distance <= config.vulture_ambush_distance => {
                self.ambush_started_at = now;
                VulturePhase::Ambush
            }
            VulturePhase::Ambush if now - self.ambush_started_at >= config.vulture_ambush_duration => {
                VulturePhase::Rush
            }
            VulturePhase::Rush if distance <= VULTURE_ARRIVAL_RADIUS => VulturePhase::Done,
            phase => phase,
        };
        self.phase
    }
}

/// Room-clearing instruction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum RoomClearInstruction {
    /// Move normally.
    #[default]
    None,
    /// Walk slowly through the room.
    SlowWalk,
    /// Stop and check the corner.
    PauseAtCorner,
}

/// Room-clear progress.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct RoomClearState {
    /// Current instruction.
    pub instruction: RoomClearInstruction,
    /// Whether the bot is indoors; written by the host.
    pub indoor: bool,
    was_indoor: bool,
    clear_until: GameTime,
    pause_until: GameTime,
    last_corner: u16,
}

impl RoomClearState {
    /// Advance. Entering a building starts a slow walk; reaching a new path
    /// corner during it pauses briefly.
    pub fn update(&mut self, current_corner: u16, now: GameTime, config: &BehaviorConfig) -> RoomClearInstruction {
        let entered = self.indoor && !self.was_indoor;
        self.was_indoor = self.indoor;
        let new_corner = current_corner != self.last_corner;
        self.last_corner = current_corner;

        if entered {
            self.instruction = RoomClearInstruction::SlowWalk;
            self.clear_until = now + config.room_clear_duration;
            return self.instruction;
        }
        if self.instruction == RoomClearInstruction::None {
            return self.instruction;
        }
        if now >= self.clear_until || !self.indoor {
            self.instruction = RoomClearInstruction::None;
            return self.instruction;
        }
        self.instruction = match self.instruction {
            RoomClearInstruction::SlowWalk if new_corner => {
                self.pause_until = now + config.corner_pause_duration;
                RoomClearInstruction::PauseAtCorner
            }
            RoomClearInstruction::PauseAtCorner if now >= self.pause_until => RoomClearInstruction::SlowWalk,
            other => other,
        };
        self.instruction
    }
}

/// Idle glance instruction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum LookInstruction {
    /// Keep looking ahead.
    #[default]
    None,
    /// Glance toward a recent combat event.
    GlanceAtEvent,
    /// Glance to one side.
    GlanceFlank,
}

/// Look-variance timer.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct LookState {
    /// Instruction for this tick.
    pub instruction: LookInstruction,
    /// Where to look, for a glance.
    pub target: Option<Position>,
    /// When the next glance is due.
    pub next_glance: GameTime,
}

/// What the look update needs to see of the world.
#[derive(Debug, Clone, Copy)]
pub struct LookContext<'a> {
    /// Bot position.
    pub position: Position,
    /// Bot facing.
    pub facing: Heading,
    /// Bots in combat do not glance.
    pub in_combat: bool,
    /// Combat events to glance at.
    pub events: &'a CombatEventLog,
    /// Oldest event worth glancing at.
    pub max_event_age: f32,
}

impl LookState {
    /// Advance. Glances fire for a single tick when the timer elapses, then
    /// the next one is scheduled a random interval away.
    pub fn update<R: Rng + ?Sized>(
        &mut self,
        ctx: &LookContext<'_>,
        now: GameTime,
        config: &BehaviorConfig,
        rng: &mut R,
    ) -> LookInstruction {
        self.instruction = LookInstruction::None;
        self.target = None;
        if ctx.in_combat || now < self.next_glance {
            return self.instruction;
        }
        let span = (config.look_max_interval - config.look_min_interval).max(0.0);
        self.next_glance = now + config.look_min_interval + rng.r#gen::<f32>() * span;

        let nearest = ctx.events.get_nearest_event(
            ctx.position.x,
            ctx.position.z,
            config.look_event_range,
            now,
            ctx.max_event_age,
        );
        if let Some(event) = nearest {
            self.instruction = LookInstruction::GlanceAtEvent;
            self.target = Some(event.position);
        } else {
            let side = if rng.r#gen::<bool>() { 1.0 } else { -1.0 };
            let perp = ctx.facing.perpendicular();
            self.instruction = LookInstruction::GlanceFlank;
            self.target = Some(ctx.position.offset(
                perp.x * FLANK_GLANCE_DISTANCE * side,
                perp.z * FLANK_GLANCE_DISTANCE * side,
            ));
        }
        self.instruction
    }
}

/// All three machines, stored on each bot.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct BehaviorState {
    /// Vulture.
    pub vulture: VultureState,
    /// Room clear.
    pub room_clear: RoomClearState,
    /// Look variance.
    pub look: LookState,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::combat::CombatEventKind;
    use rand::SeedableRng;
    use rand::rngs::StdRng;

    fn at(x: f32) -> Position {
        Position::new(x, 0.0, 0.0)
    }

    #[test]
    fn vulture_walks_through_every_phase() {
        let config = BehaviorConfig::default();
        let mut v = VultureState::default();
        v.begin(at(0.0), 0.0);
        assert_eq!(v.update(at(100.0), 1.0, &config), VulturePhase::Approach);
        assert_eq!(v.update(at(50.0), 2.0, &config), VulturePhase::SilentApproach);
        assert_eq!(v.update(at(20.0), 3.0, &config), VulturePhase::Ambush);
        assert_eq!(v.update(at(20.0), 10.0, &config), VulturePhase::Ambush);
        assert_eq!(v.update(at(20.0), 33.0, &config), VulturePhase::Rush);
        assert_eq!(v.update(at(2.0), 40.0, &config), VulturePhase::Done);
        assert!(!v.is_running());
    }

    #[test]
    fn vulture_times_out() {
        let config = BehaviorConfig::default();
        let mut v = VultureState::default();
        v.begin(at(0.0), 0.0);
        assert_eq!(v.update(at(500.0), config.vulture_max_duration, &config), VulturePhase::Done);
    }

    #[test]
    fn idle_vulture_stays_idle() {
        let config = BehaviorConfig::default();
        let mut v = VultureState::default();
        assert_eq!(v.update(at(0.0), 5.0, &config), VulturePhase::Idle);
    }

    #[test]
    fn room_clear_pauses_at_new_corners() {
        let config = BehaviorConfig::default();
        let mut r = RoomClearState::default();
        assert_eq!(r.update(0, 0.0, &config), RoomClearInstruction::None);
        r.indoor = true;
        assert_eq!(r.update(0, 1.0, &config), RoomClearInstruction::SlowWalk);
        assert_eq!(r.update(1, 2.0, &config), RoomClearInstruction::PauseAtCorner);
        assert_eq!(r.update(1, 2.5, &config), RoomClearInstruction::PauseAtCorner);
        assert_eq!(r.update(1, 4.0, &config), RoomClearInstruction::SlowWalk);
        assert_eq!(r.update(1, 9.0, &config), RoomClearInstruction::None);
    }

    #[test]
    fn leaving_the_building_ends_room_clear() {
        let config = BehaviorConfig::default();
        let mut r = RoomClearState {
            indoor: true,
            ..RoomClearState::default()
        };
        r.update(0, 0.0, &config);
        r.indoor = false;
        assert_eq!(r.update(0, 1.0, &config), RoomClearInstruction::None);
    }

    #[test]
    fn glance_prefers_recent_events() {
        let config = BehaviorConfig::default();
        let mut log = CombatEventLog::new(8);
        log.record_event(at(30.0), 0.0, 1.0, CombatEventKind::Gunshot, false);
        let mut rng = StdRng::seed_from_u64(4);
        let mut look = LookState::default();
        let ctx = LookContext {
            position: Position::ZERO,
            facing: Heading { x: 1.0, z: 0.0 },
            in_combat: false,
            events: &log,
            max_event_age: 120.0,
        };
        assert_eq!(look.update(&ctx, 1.0, &config, &mut rng), LookInstruction::GlanceAtEvent);
        assert_eq!(look.target, Some(at(30.0)));
        assert!(look.next_glance >= 1.0 + config.look_min_interval);
        assert!(look.next_glance <= 1.0 + config.look_max_interval);
        assert_eq!(look.update(&ctx, 2.0, &config, &mut rng), LookInstruction::None);
    }

    #[test]
    fn glance_flanks_without_events() {
        let config = BehaviorConfig::default();
        let log = CombatEventLog::new(8);
        let mut rng = StdRng::seed_from_u64(4);
        let mut look = LookState::default();
        let ctx = LookContext {
            position: Position::ZERO,
            facing: Heading { x: 1.0, z: 0.0 },
            in_combat: false,
            events: &log,
            max_event_age: 120.0,
        };
        assert_eq!(look.update(&ctx, 0.0, &config, &mut rng), LookInstruction::GlanceFlank);
        let target = look.target.expect("flank target");
        assert!(target.x.abs() < 1e-5);
        assert!((target.z.abs() - 10.0).abs() < 1e-5);

        let fighting = LookContext { in_combat: true, ..ctx };
        assert_eq!(look.update(&fighting, 100.0, &config, &mut rng), LookInstruction::None);
    }
}
