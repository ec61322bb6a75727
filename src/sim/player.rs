//! The player character
//!
//! Size (`Small`, `Big`, `Fire`) is exclusive; invincibility is a separate
//! countdown stacked on top of whatever size the player has. Death is a
//! terminal flag that starts a scripted rise-and-fall before the life is
//! taken from the session.

use glam::Vec2;
use serde::{Deserialize, Serialize};

use super::body::Body;
use super::collision::{Collider, Group};
use super::event::{EntityKind, GameEvent};
use super::snapshot::Facing;
use super::state::{EntityId, TickContext};
use super::tick::TickInput;
use crate::session::FlowPhase;
use crate::tuning::Tuning;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum PlayerSize {
    Small,
    Big,
    Fire,
}

impl PlayerSize {
    /// Collider half extents (32x32 small, 32x64 otherwise)
    pub fn half(self) -> Vec2 {
        match self {
            PlayerSize::Small => Vec2::new(16.0, 16.0),
            PlayerSize::Big | PlayerSize::Fire => Vec2::new(16.0, 32.0),
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            PlayerSize::Small => "small",
            PlayerSize::Big => "big",
            PlayerSize::Fire => "fire",
        }
    }
}

/// Scripted displacement after death
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct DeathScript {
    pub elapsed: f32,
    pub start_y: f32,
    pub finished: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Player {
    pub id: EntityId,
    pub body: Body,
    pub size: PlayerSize,
    pub alive: bool,
    /// Seconds of invincibility left (0 = vulnerable)
    pub invincible_timer: f32,
    pub facing: Facing,
    /// Airborne from a jump or bounce, cleared on landing
    pub jumping: bool,
    /// Jump key is down; a new press is needed after release
    jump_held: bool,
    pub death: Option<DeathScript>,
    pub reached_flag: bool,
}

impl Player {
    pub fn new(id: EntityId, center: Vec2, tuning: &Tuning) -> Self {
        Self {
            id,
            body: Body::new(center, PlayerSize::Small.half())
                .with_gravity(tuning.gravity, tuning.max_fall_speed)
                .with_max_speed(tuning.player_max_speed),
            size: PlayerSize::Small,
            alive: true,
            invincible_timer: 0.0,
            facing: Facing::Right,
            jumping: false,
            jump_held: false,
            death: None,
            reached_flag: false,
        }
    }

    pub fn is_invincible(&self) -> bool {
        self.invincible_timer > 0.0
    }

    pub fn collider(&self) -> Option<Collider> {
        (self.alive && self.body.enabled).then(|| Collider::new(self.id, Group::Player, self.body.aabb))
    }

    fn set_size(&mut self, size: PlayerSize, ctx: &mut TickContext) {
        if self.size == size {
            return;
        }
        log::debug!("player {} -> {}", self.size.as_str(), size.as_str());
        self.size = size;
        self.body.set_half_keep_feet(size.half());
        ctx.emit(GameEvent::PlayerResized(size));
    }

    /// Take a hit from an enemy
    pub fn hurt(&mut self, ctx: &mut TickContext) {
        if !self.alive || self.is_invincible() {
            return;
        }
        match self.size {
            PlayerSize::Small => self.die(ctx),
            PlayerSize::Big | PlayerSize::Fire => {
                self.set_size(PlayerSize::Small, ctx);
                self.invincible_timer = ctx.tuning.hurt_invincible_secs;
            }
        }
    }

    pub fn grow_big(&mut self, ctx: &mut TickContext) {
        if self.alive && self.size == PlayerSize::Small {
            self.set_size(PlayerSize::Big, ctx);
        }
    }

    pub fn collect_fire_flower(&mut self, ctx: &mut TickContext) {
        if self.alive {
            self.set_size(PlayerSize::Fire, ctx);
        }
    }

    pub fn collect_star(&mut self, ctx: &mut TickContext) {
        if self.alive {
            self.invincible_timer = self.invincible_timer.max(ctx.tuning.star_invincible_secs);
        }
    }

    pub fn die(&mut self, ctx: &mut TickContext) {
        if !self.alive {
            return;
        }
        log::debug!("player {} died", self.id);
        self.alive = false;
        self.body.enabled = false;
        self.body.vel = Vec2::ZERO;
        self.body.grounded = false;
        self.invincible_timer = 0.0;
        self.death = Some(DeathScript {
            elapsed: 0.0,
            start_y: self.body.position().y,
            finished: false,
        });
        if ctx.session.phase == FlowPhase::Playing {
            ctx.session.phase = FlowPhase::Dying;
        }
        ctx.emit(GameEvent::EntityDied {
            id: self.id,
            kind: EntityKind::Player,
        });
    }

    /// Turn intents into velocity and jumps
    pub fn apply_input(&mut self, input: &TickInput, ctx: &mut TickContext) {
        if !self.alive {
            return;
        }

        let dir = match (input.move_left, input.move_right) {
            (true, false) => -1.0,
            (false, true) => 1.0,
            _ => 0.0,
        };
        self.body.vel.x = (dir * ctx.tuning.player_move_speed)
            .clamp(-ctx.tuning.player_max_speed, ctx.tuning.player_max_speed);
        if dir != 0.0 {
            self.facing = Facing::from_sign(dir);
        }

        if input.jump_pressed && !self.jump_held {
            self.jump_held = true;
            if self.body.grounded && !self.jumping {
                self.body.vel.y = ctx.tuning.jump_force;
                self.body.grounded = false;
                self.jumping = true;
                ctx.emit(GameEvent::PlayerJumped);
            }
        }
        if input.jump_released {
            self.jump_held = false;
        }
    }

    /// Ground sensor reported a landing
    pub fn on_landed(&mut self) {
        self.jumping = false;
    }

    /// Upward impulse after a stomp
    pub fn bounce(&mut self, tuning: &Tuning) {
        if !self.alive {
            return;
        }
        self.body.vel.y = tuning.bounce_force();
        self.body.grounded = false;
        self.jumping = true;
    }

    pub fn update_timers(&mut self, dt: f32) {
        self.invincible_timer = (self.invincible_timer - dt).max(0.0);
    }

    /// Advance the death script. Returns true on the tick the life is lost.
    pub fn update_death(&mut self, ctx: &mut TickContext) -> bool {
        let Some(script) = self.death.as_mut() else {
            return false;
        };
        if script.finished {
            return false;
        }

        let t = ctx.tuning;
        let rise = t.death_rise_secs.max(f32::EPSILON);
        let fall = t.death_fall_secs.max(f32::EPSILON);
        script.elapsed += ctx.dt;

        let y = if script.elapsed < rise {
            script.start_y + t.death_rise_height * (script.elapsed / rise)
        } else {
            let f = ((script.elapsed - rise) / fall).min(1.0);
            script.start_y + t.death_rise_height - t.death_fall_depth * f
        };
        self.body.aabb.center.y = y;

        if script.elapsed < rise + fall {
            return false;
        }
        script.finished = true;

        ctx.emit(GameEvent::LifeLost);
        if ctx.session.lose_life() {
            log::info!("Game over");
            ctx.emit(GameEvent::GameOver);
        }
        true
    }

    pub fn anim_tag(&self) -> &'static str {
        if !self.alive {
            return "die";
        }
        let moving = self.body.vel.x.abs() > 1.0;
        match (self.size, self.body.grounded, moving) {
            (PlayerSize::Small, false, _) => "small_jump",
            (PlayerSize::Small, true, true) => "small_run",
            (PlayerSize::Small, true, false) => "small_idle",
            (PlayerSize::Big, false, _) => "big_jump",
            (PlayerSize::Big, true, true) => "big_run",
            (PlayerSize::Big, true, false) => "big_idle",
            (PlayerSize::Fire, false, _) => "fire_jump",
            (PlayerSize::Fire, true, true) => "fire_run",
            (PlayerSize::Fire, true, false) => "fire_idle",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::session::Session;
    use crate::sim::event::EventSink;

    struct Fixture {
        tuning: Tuning,
        session: Session,
        events: EventSink,
    }

    impl Fixture {
        fn new() -> Self {
            let tuning = Tuning::default();
            let session = Session::new(&tuning);
            Self {
                tuning,
                session,
                events: EventSink::new(),
            }
        }

        fn ctx(&mut self) -> TickContext<'_> {
            TickContext {
                tuning: &self.tuning,
                session: &mut self.session,
                events: &mut self.events,
                dt: crate::consts::SIM_DT,
                tick: 0,
            }
        }
    }

    fn player(f: &Fixture) -> Player {
        Player::new(1, Vec2::new(100.0, 48.0), &f.tuning)
    }

    #[test]
    fn test_hurt_small_dies_once() {
        let mut f = Fixture::new();
        let mut p = player(&f);
        p.hurt(&mut f.ctx());
        p.hurt(&mut f.ctx());
        p.die(&mut f.ctx());
        assert!(!p.alive);
        assert!(!p.body.enabled);
        let died = f
            .events
            .pending()
            .iter()
            .filter(|e| matches!(e, GameEvent::EntityDied { .. }))
            .count();
        assert_eq!(died, 1);
        assert_eq!(f.session.phase, FlowPhase::Dying);
    }

    #[test]
    fn test_hurt_big_shrinks_with_invincibility() {
        let mut f = Fixture::new();
        let mut p = player(&f);
        p.grow_big(&mut f.ctx());
        assert_eq!(p.size, PlayerSize::Big);
        assert_eq!(p.body.aabb.bottom(), 32.0);

        p.hurt(&mut f.ctx());
        p.hurt(&mut f.ctx());
        assert_eq!(p.size, PlayerSize::Small);
        assert!(p.alive);
        assert!((p.invincible_timer - 3.0).abs() < 1e-6);
        assert_eq!(p.body.aabb.bottom(), 32.0);
        assert_eq!(p.body.aabb.half, PlayerSize::Small.half());
    }

    #[test]
    fn test_grow_big_only_from_small() {
        let mut f = Fixture::new();
        let mut p = player(&f);
        p.collect_fire_flower(&mut f.ctx());
        assert_eq!(p.size, PlayerSize::Fire);
        p.grow_big(&mut f.ctx());
        assert_eq!(p.size, PlayerSize::Fire);
    }

    #[test]
    fn test_star_invincibility_window() {
        let mut f = Fixture::new();
        let mut p = player(&f);
        p.grow_big(&mut f.ctx());
        p.collect_star(&mut f.ctx());

        // 10 time units of immunity
        for _ in 0..599 {
            p.update_timers(crate::consts::SIM_DT);
            p.hurt(&mut f.ctx());
        }
        assert_eq!(p.size, PlayerSize::Big);

        // Past 10.01 the next hit lands
        for _ in 0..2 {
            p.update_timers(crate::consts::SIM_DT);
        }
        assert!(!p.is_invincible());
        p.hurt(&mut f.ctx());
        assert_eq!(p.size, PlayerSize::Small);
        assert!((p.invincible_timer - 3.0).abs() < 1e-6);
    }

    #[test]
    fn test_star_does_not_shorten_longer_invincibility() {
        let mut f = Fixture::new();
        let mut p = player(&f);
        p.invincible_timer = 12.0;
        p.collect_star(&mut f.ctx());
        assert_eq!(p.invincible_timer, 12.0);
    }

    #[test]
    fn test_jump_is_edge_triggered() {
        let mut f = Fixture::new();
        let mut p = player(&f);
        p.body.grounded = true;

        let press = TickInput {
            jump_pressed: true,
            ..Default::default()
        };
        p.apply_input(&press, &mut f.ctx());
        assert_eq!(p.body.vel.y, f.tuning.jump_force);

        // Landed again but key still held: no second jump
        p.body.vel.y = 0.0;
        p.body.grounded = true;
        p.on_landed();
        p.apply_input(&press, &mut f.ctx());
        assert_eq!(p.body.vel.y, 0.0);

        let release = TickInput {
            jump_released: true,
            ..Default::default()
        };
        p.apply_input(&release, &mut f.ctx());
        p.apply_input(&press, &mut f.ctx());
        assert_eq!(p.body.vel.y, f.tuning.jump_force);
    }

    #[test]
    fn test_no_jump_midair() {
        let mut f = Fixture::new();
        let mut p = player(&f);
        p.body.grounded = false;
        let press = TickInput {
            jump_pressed: true,
            ..Default::default()
        };
        p.apply_input(&press, &mut f.ctx());
        assert_eq!(p.body.vel.y, 0.0);
    }

    #[test]
    fn test_horizontal_intent_sets_velocity_and_facing() {
        let mut f = Fixture::new();
        let mut p = player(&f);
        let left = TickInput {
            move_left: true,
            ..Default::default()
        };
        p.apply_input(&left, &mut f.ctx());
        assert_eq!(p.body.vel.x, -f.tuning.player_move_speed);
        assert_eq!(p.facing, Facing::Left);

        p.apply_input(&TickInput::default(), &mut f.ctx());
        assert_eq!(p.body.vel.x, 0.0);
        assert_eq!(p.facing, Facing::Left);
    }

    #[test]
    fn test_dead_player_ignores_input() {
        let mut f = Fixture::new();
        let mut p = player(&f);
        p.die(&mut f.ctx());
        let right = TickInput {
            move_right: true,
            ..Default::default()
        };
        p.apply_input(&right, &mut f.ctx());
        assert_eq!(p.body.vel.x, 0.0);
    }

    #[test]
    fn test_death_script_loses_one_life() {
        let mut f = Fixture::new();
        let mut p = player(&f);
        let start_y = p.body.position().y;
        p.die(&mut f.ctx());

        let mut lost = 0;
        let mut peak = start_y;
        for _ in 0..200 {
            if p.update_death(&mut f.ctx()) {
                lost += 1;
            }
            peak = peak.max(p.body.position().y);
        }
        assert_eq!(lost, 1);
        assert!((peak - (start_y + 100.0)).abs() < 2.0);
        assert!((p.body.position().y - (start_y - 400.0)).abs() < 1e-3);
        assert_eq!(f.session.lives, 2);
        assert_eq!(f.session.phase, FlowPhase::LifeLost);
        let events = f.events.flush();
        assert_eq!(events.iter().filter(|e| **e == GameEvent::LifeLost).count(), 1);
        assert!(!events.contains(&GameEvent::GameOver));
    }

    #[test]
    fn test_last_life_emits_game_over() {
        let mut f = Fixture::new();
        f.session.lives = 1;
        let mut p = player(&f);
        p.die(&mut f.ctx());
        while !p.update_death(&mut f.ctx()) {}
        assert_eq!(f.session.phase, FlowPhase::GameOver);
        assert!(f.events.pending().contains(&GameEvent::GameOver));
    }

    #[test]
    fn test_anim_tags() {
        let mut f = Fixture::new();
        let mut p = player(&f);
        p.body.grounded = true;
        assert_eq!(p.anim_tag(), "small_idle");
        p.body.vel.x = 200.0;
        assert_eq!(p.anim_tag(), "small_run");
        p.collect_fire_flower(&mut f.ctx());
        p.body.grounded = false;
        assert_eq!(p.anim_tag(), "fire_jump");
        p.die(&mut f.ctx());
        assert_eq!(p.anim_tag(), "die");
    }
}
