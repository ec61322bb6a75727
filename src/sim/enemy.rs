//! Enemy state machines
//!
//! Goombas and turtles patrol at a constant speed and turn around on side
//! contact. A stomped turtle becomes an inert shell that the player can kick;
//! a moving shell knocks out every enemy it touches, with escalating score.
//! Flowers stay where they are, without gravity, and are never culled.

use glam::Vec2;
use serde::{Deserialize, Serialize};

use super::body::Body;
use super::collision::{Collider, Group};
use super::event::{EntityKind, GameEvent};
use super::snapshot::Facing;
use super::state::{EntityId, TickContext};
use crate::tuning::Tuning;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum EnemyKind {
    Goomba,
    Turtle,
    Flower,
}

impl EnemyKind {
    pub fn half(self) -> Vec2 {
        match self {
            EnemyKind::Goomba => Vec2::new(16.0, 16.0),
            EnemyKind::Turtle | EnemyKind::Flower => Vec2::new(16.0, 24.0),
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            EnemyKind::Goomba => "goomba",
            EnemyKind::Turtle => "turtle",
            EnemyKind::Flower => "flower",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ShellState {
    Walking,
    /// Idle shell, inert until kicked
    Shelled,
    ShellMoving,
}

/// Flattened shell footprint (32x16)
const SHELL_HALF: Vec2 = Vec2::new(16.0, 8.0);

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Enemy {
    pub id: EntityId,
    pub kind: EnemyKind,
    pub body: Body,
    pub alive: bool,
    /// -1 = left, +1 = right
    pub direction: f32,
    pub move_speed: f32,
    pub shell: ShellState,
    /// Counts down after death; the enemy is removed when it expires
    pub despawn_timer: Option<f32>,
    /// Player contact is ignored while this runs
    pub kick_cooldown: f32,
    /// Kills made by this shell since it was kicked
    pub chain: u32,
    /// Marked for removal at end of tick
    pub destroyed: bool,
}

impl Enemy {
    pub fn new(id: EntityId, kind: EnemyKind, center: Vec2, tuning: &Tuning) -> Self {
        let max_speed = tuning.shell_speed.max(tuning.enemy_move_speed);
        let mut body = Body::new(center, kind.half()).with_max_speed(max_speed);
        // Flowers hold their spawn position
        if kind != EnemyKind::Flower {
            body = body.with_gravity(tuning.gravity, tuning.max_fall_speed);
        }
        let mut enemy = Self {
            id,
            kind,
            body,
            alive: true,
            direction: -1.0,
            move_speed: tuning.enemy_move_speed,
            shell: ShellState::Walking,
            despawn_timer: None,
            kick_cooldown: 0.0,
            chain: 0,
            destroyed: false,
        };
        enemy.body.vel.x = enemy.patrol_speed(tuning) * enemy.direction;
        enemy
    }

    pub fn collider(&self) -> Option<Collider> {
        (self.alive && self.body.enabled && !self.destroyed)
            .then(|| Collider::new(self.id, Group::Enemy, self.body.aabb))
    }

    pub fn is_moving_shell(&self) -> bool {
        self.alive && self.shell == ShellState::ShellMoving
    }

    pub fn is_idle_shell(&self) -> bool {
        self.alive && self.shell == ShellState::Shelled
    }

    /// Flowers are never culled by the world bounds
    pub fn is_cullable(&self) -> bool {
        self.kind != EnemyKind::Flower
    }

    fn patrol_speed(&self, tuning: &Tuning) -> f32 {
        match (self.kind, self.shell) {
            (EnemyKind::Flower, _) | (_, ShellState::Shelled) => 0.0,
            (_, ShellState::ShellMoving) => tuning.shell_speed,
            (_, ShellState::Walking) => self.move_speed,
        }
    }

    /// Knocked out. Awards `score` and reports the death once.
    pub fn die(&mut self, ctx: &mut TickContext, score: u32) {
        if !self.alive {
            return;
        }
        log::debug!("{} {} died", self.kind.as_str(), self.id);
        self.alive = false;
        self.body.enabled = false;
        self.body.vel = Vec2::ZERO;
        self.despawn_timer = Some(ctx.tuning.enemy_despawn_secs);
        ctx.award(score);
        ctx.emit(GameEvent::EntityDied {
            id: self.id,
            kind: EntityKind::Enemy(self.kind),
        });
    }

    /// Player landed on top
    ///
    /// A walking turtle retreats into its shell; a moving shell stops. An idle
    /// shell is left to the kick logic.
    pub fn take_stomp(&mut self, ctx: &mut TickContext) {
        if !self.alive {
            return;
        }
        match (self.kind, self.shell) {
            (EnemyKind::Turtle, ShellState::Walking) => self.enter_shell(ctx),
            (EnemyKind::Turtle, ShellState::ShellMoving) => self.stop_shell(ctx),
            (EnemyKind::Turtle, ShellState::Shelled) => {}
            (EnemyKind::Goomba | EnemyKind::Flower, _) => {
                let score = ctx.tuning.enemy_score;
                self.die(ctx, score);
            }
        }
    }

    fn enter_shell(&mut self, ctx: &mut TickContext) {
        log::debug!("turtle {} shelled", self.id);
        self.shell = ShellState::Shelled;
        self.body.set_half_keep_feet(SHELL_HALF);
        self.body.vel.x = 0.0;
        self.kick_cooldown = ctx.tuning.shell_kick_cooldown_secs;
        self.chain = 0;
        let score = ctx.tuning.enemy_score;
        ctx.award(score);
    }

    /// Send an idle shell sliding in `dir`
    pub fn kick(&mut self, dir: f32, ctx: &mut TickContext) {
        if !self.is_idle_shell() || self.kick_cooldown > 0.0 {
            return;
        }
        self.shell = ShellState::ShellMoving;
        self.direction = if dir < 0.0 { -1.0 } else { 1.0 };
        self.body.vel.x = self.direction * ctx.tuning.shell_speed;
        self.kick_cooldown = ctx.tuning.shell_kick_cooldown_secs;
        self.chain = 0;
        ctx.emit(GameEvent::ShellKicked { id: self.id });
    }

    pub fn stop_shell(&mut self, ctx: &mut TickContext) {
        if !self.is_moving_shell() {
            return;
        }
        self.shell = ShellState::Shelled;
        self.body.vel.x = 0.0;
        self.kick_cooldown = ctx.tuning.shell_kick_cooldown_secs;
        self.chain = 0;
    }

    /// Score for this shell's next kill
    pub fn next_chain_score(&mut self, tuning: &Tuning) -> u32 {
        self.chain += 1;
        tuning.shell_chain_score(self.chain)
    }

    /// Turn around after touching something on the side
    ///
    /// `normal` points from the other body toward this enemy. Only reverses
    /// when moving into the touched face, so a lingering overlap cannot flip
    /// the direction back and forth. Returns true if the direction changed.
    pub fn on_side_contact(&mut self, normal: Vec2, tuning: &Tuning) -> bool {
        if !self.alive || normal.x.abs() <= tuning.axis_threshold {
            return false;
        }
        let patrols = match (self.kind, self.shell) {
            (EnemyKind::Flower, _) | (_, ShellState::Shelled) => false,
            (_, ShellState::Walking | ShellState::ShellMoving) => true,
        };
        if !patrols || self.direction * normal.x >= 0.0 {
            return false;
        }
        self.direction = -self.direction;
        self.body.vel.x = self.direction * self.patrol_speed(tuning);
        true
    }

    /// Per-tick timers and patrol velocity
    pub fn update(&mut self, ctx: &mut TickContext) {
        self.kick_cooldown = (self.kick_cooldown - ctx.dt).max(0.0);

        if let Some(timer) = self.despawn_timer.as_mut() {
            *timer -= ctx.dt;
            if *timer <= 0.0 {
                self.destroyed = true;
            }
        }

        if self.alive {
            self.body.vel.x = self.direction * self.patrol_speed(ctx.tuning);
        }
    }

    pub fn facing(&self) -> Facing {
        Facing::from_sign(self.direction)
    }

    pub fn anim_tag(&self) -> &'static str {
        match (self.kind, self.alive, self.shell) {
            (EnemyKind::Goomba, true, _) => "goomba_walk",
            (EnemyKind::Goomba, false, _) => "goomba_die",
            (EnemyKind::Turtle, false, _) => "turtle_die",
            (EnemyKind::Turtle, true, ShellState::Walking) => "turtle_walk",
            (EnemyKind::Turtle, true, ShellState::Shelled) => "turtle_shell",
            (EnemyKind::Turtle, true, ShellState::ShellMoving) => "turtle_shell_moving",
            (EnemyKind::Flower, true, _) => "flower_attack",
            (EnemyKind::Flower, false, _) => "flower_die",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::session::Session;
    use crate::sim::event::EventSink;

    fn run<R>(f: impl FnOnce(&mut TickContext) -> R) -> (R, Session, Vec<GameEvent>) {
        let tuning = Tuning::default();
        let mut session = Session::new(&tuning);
        let mut events = EventSink::new();
        let r = {
            let mut ctx = TickContext {
                tuning: &tuning,
                session: &mut session,
                events: &mut events,
                dt: crate::consts::SIM_DT,
                tick: 0,
            };
            f(&mut ctx)
        };
        (r, session, events.flush())
    }

    fn enemy(kind: EnemyKind) -> Enemy {
        Enemy::new(5, kind, Vec2::new(200.0, 48.0), &Tuning::default())
    }

    #[test]
    fn test_patrol_starts_left() {
        let g = enemy(EnemyKind::Goomba);
        assert_eq!(g.body.vel.x, -100.0);
        let f = enemy(EnemyKind::Flower);
        assert_eq!(f.body.vel.x, 0.0);
        assert_eq!(f.body.gravity, 0.0);
        assert!(g.body.gravity < 0.0);
    }

    #[test]
    fn test_goomba_stomp_dies_once() {
        let (g, session, events) = run(|ctx| {
            let mut g = enemy(EnemyKind::Goomba);
            g.take_stomp(ctx);
            g.take_stomp(ctx);
            g.die(ctx, 100);
            g
        });
        assert!(!g.alive);
        assert!(g.collider().is_none());
        assert_eq!(session.score, 100);
        let died: Vec<_> = events.iter().filter(|e| matches!(e, GameEvent::EntityDied { .. })).collect();
        assert_eq!(died.len(), 1);
    }

    #[test]
    fn test_despawn_after_delay() {
        let ((), _, _) = run(|ctx| {
            let mut g = enemy(EnemyKind::Goomba);
            g.die(ctx, 100);
            for _ in 0..29 {
                g.update(ctx);
            }
            assert!(!g.destroyed);
            for _ in 0..2 {
                g.update(ctx);
            }
            assert!(g.destroyed);
        });
    }

    #[test]
    fn test_turtle_stomp_shells_without_death() {
        let (t, session, events) = run(|ctx| {
            let mut t = enemy(EnemyKind::Turtle);
            let feet = t.body.aabb.bottom();
            t.take_stomp(ctx);
            assert_eq!(t.body.aabb.bottom(), feet);
            t
        });
        assert!(t.alive);
        assert_eq!(t.shell, ShellState::Shelled);
        assert_eq!(t.body.aabb.half, SHELL_HALF);
        assert_eq!(t.body.vel.x, 0.0);
        assert_eq!(session.score, 100);
        assert!(!events.iter().any(|e| matches!(e, GameEvent::EntityDied { .. })));
    }

    #[test]
    fn test_kick_waits_for_cooldown() {
        let ((), _, events) = run(|ctx| {
            let mut t = enemy(EnemyKind::Turtle);
            t.take_stomp(ctx);
            t.kick(1.0, ctx);
            assert_eq!(t.shell, ShellState::Shelled);

            for _ in 0..20 {
                t.update(ctx);
            }
            t.kick(1.0, ctx);
            assert_eq!(t.shell, ShellState::ShellMoving);
            assert_eq!(t.body.vel.x, ctx.tuning.shell_speed);
            t.update(ctx);
            assert_eq!(t.body.vel.x, ctx.tuning.shell_speed);

            t.stop_shell(ctx);
            assert_eq!(t.shell, ShellState::Shelled);
            t.update(ctx);
            assert_eq!(t.body.vel.x, 0.0);
        });
        assert_eq!(events.iter().filter(|e| matches!(e, GameEvent::ShellKicked { .. })).count(), 1);
    }

    #[test]
    fn test_reverse_only_into_face() {
        let tuning = Tuning::default();
        let mut g = enemy(EnemyKind::Goomba);
        // Moving left into a wall on its left: normal points right (+x)
        assert!(g.on_side_contact(Vec2::new(1.0, 0.0), &tuning));
        assert_eq!(g.direction, 1.0);
        // Same contact next tick while already moving away: no flip back
        assert!(!g.on_side_contact(Vec2::new(1.0, 0.0), &tuning));
        assert_eq!(g.direction, 1.0);
        // Vertical contact never reverses
        assert!(!g.on_side_contact(Vec2::new(0.0, 1.0), &tuning));
    }

    #[test]
    fn test_idle_shell_and_flower_do_not_reverse() {
        let tuning = Tuning::default();
        let mut f = enemy(EnemyKind::Flower);
        assert!(!f.on_side_contact(Vec2::new(1.0, 0.0), &tuning));

        let ((), _, _) = run(|ctx| {
            let mut t = enemy(EnemyKind::Turtle);
            t.take_stomp(ctx);
            assert!(!t.on_side_contact(Vec2::new(1.0, 0.0), ctx.tuning));
        });
    }

    #[test]
    fn test_chain_score_escalates() {
        let tuning = Tuning::default();
        let mut t = enemy(EnemyKind::Turtle);
        let scores: Vec<u32> = (0..9).map(|_| t.next_chain_score(&tuning)).collect();
        assert_eq!(scores, vec![200, 400, 800, 1000, 2000, 4000, 8000, 8000, 8000]);
    }

    #[test]
    fn test_anim_tags() {
        let ((), _, _) = run(|ctx| {
            let mut t = enemy(EnemyKind::Turtle);
            assert_eq!(t.anim_tag(), "turtle_walk");
            t.take_stomp(ctx);
            assert_eq!(t.anim_tag(), "turtle_shell");
            t.kick_cooldown = 0.0;
            t.kick(-1.0, ctx);
            assert_eq!(t.anim_tag(), "turtle_shell_moving");
            assert_eq!(t.facing(), Facing::Left);
        });
    }
}
