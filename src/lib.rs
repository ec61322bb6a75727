//! Scroll Quest - side-scrolling platformer simulation core
//!
//! Core modules:
//! - `sim`: Deterministic simulation (bodies, collisions, entity state machines)
//! - `tuning`: Data-driven game balance
//! - `session`: Score, lives and level timer for one play session
//! - `error`: Level loading errors

pub mod error;
pub mod session;
pub mod sim;
pub mod tuning;

pub use error::LevelError;
pub use session::{FlowPhase, Session};
pub use tuning::Tuning;

use glam::Vec2;

/// Game configuration constants
pub mod consts {
    /// Fixed simulation timestep (60 Hz)
    pub const SIM_DT: f32 = 1.0 / 60.0;
    /// Maximum substeps per frame to prevent spiral of death
    pub const MAX_SUBSTEPS: u32 = 8;

    /// Edge length of one layout tile (world units)
    pub const TILE_SIZE: f32 = 32.0;

    /// Gravity (y points up, units/s²)
    pub const GRAVITY: f32 = -1000.0;
    /// Terminal fall speed (keeps a body from tunneling through a tile)
    pub const MAX_FALL_SPEED: f32 = 900.0;

    /// Player defaults
    pub const PLAYER_MOVE_SPEED: f32 = 200.0;
    pub const PLAYER_MAX_SPEED: f32 = 400.0;
    pub const JUMP_FORCE: f32 = 600.0;
    /// Fraction of the jump impulse applied after a stomp
    pub const STOMP_BOUNCE_FACTOR: f32 = 0.7;
    pub const HURT_INVINCIBLE_SECS: f32 = 3.0;
    pub const STAR_INVINCIBLE_SECS: f32 = 10.0;
    /// Death script: rise, then drop off screen
    pub const DEATH_RISE_SECS: f32 = 0.5;
    pub const DEATH_RISE_HEIGHT: f32 = 100.0;
    pub const DEATH_FALL_SECS: f32 = 1.0;
    pub const DEATH_FALL_DEPTH: f32 = 500.0;

    /// Enemy defaults
    pub const ENEMY_MOVE_SPEED: f32 = 100.0;
    pub const SHELL_SPEED: f32 = 400.0;
    /// Player contact with a freshly kicked or stopped shell is ignored this long
    pub const SHELL_KICK_COOLDOWN_SECS: f32 = 0.25;
    /// Flattened/dying enemies stay visible this long before removal
    pub const ENEMY_DESPAWN_SECS: f32 = 0.5;

    /// Item defaults
    pub const ITEM_MOVE_SPEED: f32 = 100.0;
    pub const STAR_HOP_FORCE: f32 = 450.0;
    pub const STAR_HOP_COOLDOWN_SECS: f32 = 0.6;
    /// Spawned rewards start this far above the block center
    pub const ITEM_SPAWN_OFFSET: f32 = 16.0;
    /// Rewards rise one tile over this long before activating
    pub const ITEM_RISE_SECS: f32 = 0.5;
    pub const COIN_POPUP_SECS: f32 = 0.5;

    /// Scoring
    pub const ENEMY_SCORE: u32 = 100;
    pub const COIN_SCORE: u32 = 200;
    /// Consecutive kills by one moving shell (last value repeats)
    pub const SHELL_CHAIN_SCORES: [u32; 7] = [200, 400, 800, 1000, 2000, 4000, 8000];
    pub const TIME_BONUS_PER_UNIT: u32 = 10;

    /// Session defaults
    pub const START_LIVES: u8 = 3;
    pub const LEVEL_TIME: u32 = 300;

    /// Entities this far outside the level are culled
    pub const CULL_MARGIN: f32 = 100.0;
    /// Ground probe reaches this far below a body's feet
    pub const GROUND_PROBE_DEPTH: f32 = 5.0;
    /// Horizontal inset of the ground probe (stops wall contact counting as floor)
    pub const GROUND_PROBE_INSET: f32 = 2.0;
    /// Boxes closer than this are reported as touching
    pub const CONTACT_SKIN: f32 = 0.5;
    /// A normal component above this counts as that axis (stomps, walls, head bumps)
    pub const AXIS_THRESHOLD: f32 = 0.7;
}

/// World-space center of the tile at (`col`, `row`), where `row` counts up from the level floor
#[inline]
pub fn tile_center(col: usize, row: usize) -> Vec2 {
    use consts::TILE_SIZE;
    Vec2::new(
        col as f32 * TILE_SIZE + TILE_SIZE / 2.0,
        row as f32 * TILE_SIZE + TILE_SIZE / 2.0,
    )
}

/// Center for a box of `half` extents standing on the floor of tile (`col`, `row`)
#[inline]
pub fn standing_center(col: usize, row: usize, half: Vec2) -> Vec2 {
    use consts::TILE_SIZE;
    Vec2::new(
        col as f32 * TILE_SIZE + TILE_SIZE / 2.0,
        row as f32 * TILE_SIZE + half.y,
    )
}

/// Sign of `value` as ±1.0, using `fallback` for zero
#[inline]
pub fn sign_or(value: f32, fallback: f32) -> f32 {
    if value > 0.0 {
        1.0
    } else if value < 0.0 {
        -1.0
    } else {
        fallback
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tile_center() {
        let c = tile_center(0, 0);
        assert_eq!(c, Vec2::new(16.0, 16.0));
        let c = tile_center(3, 2);
        assert_eq!(c, Vec2::new(112.0, 80.0));
    }

    #[test]
    fn test_standing_center_keeps_feet_on_tile_floor() {
        let half = Vec2::new(16.0, 24.0);
        let c = standing_center(1, 1, half);
        assert!((c.y - half.y - 32.0).abs() < 1e-4);
    }

    #[test]
    fn test_sign_or() {
        assert_eq!(sign_or(3.0, 1.0), 1.0);
        assert_eq!(sign_or(-0.1, 1.0), -1.0);
        assert_eq!(sign_or(0.0, -1.0), -1.0);
    }
}
