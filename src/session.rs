//! Play session bookkeeping
//!
//! One [`Session`] spans a run of levels: it owns score, lives and the level
//! timer. The simulation is handed the session explicitly; nothing looks it
//! up globally.

use serde::{Deserialize, Serialize};

use crate::tuning::Tuning;

/// Where the current level is in its lifecycle
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum FlowPhase {
    /// Normal play
    Playing,
    /// Player death script is running
    Dying,
    /// A life was lost; waiting for the level to be restarted
    LifeLost,
    /// End flag reached
    LevelCleared,
    /// No lives left
    GameOver,
}

/// Score, lives and timer for one play session
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Session {
    pub score: u64,
    pub lives: u8,
    pub coins: u32,
    /// Whole time units left on the level clock
    pub remaining_time: u32,
    pub phase: FlowPhase,
    /// Sub-unit time accumulated toward the next clock decrement
    clock_accum: f32,
    level_time: u32,
}

impl Session {
    pub fn new(tuning: &Tuning) -> Self {
        Self {
            score: 0,
            lives: tuning.start_lives,
            coins: 0,
            remaining_time: tuning.level_time,
            phase: FlowPhase::Playing,
            clock_accum: 0.0,
            level_time: tuning.level_time,
        }
    }

    /// Reset per-level state (clock, phase) keeping score and lives
    pub fn begin_level(&mut self) {
        self.remaining_time = self.level_time;
        self.clock_accum = 0.0;
        if self.phase != FlowPhase::GameOver {
            self.phase = FlowPhase::Playing;
        }
    }

    pub fn add_score(&mut self, amount: u32) {
        self.score += amount as u64;
    }

    /// Whether entities should still be simulated
    pub fn is_running(&self) -> bool {
        matches!(self.phase, FlowPhase::Playing | FlowPhase::Dying)
    }

    /// Take a life. Returns true if that was the last one.
    pub fn lose_life(&mut self) -> bool {
        self.lives = self.lives.saturating_sub(1);
        if self.lives == 0 {
            self.phase = FlowPhase::GameOver;
            true
        } else {
            self.phase = FlowPhase::LifeLost;
            false
        }
    }

    /// Advance the level clock. Returns true on the tick the clock runs out.
    pub fn tick_clock(&mut self, dt: f32) -> bool {
        if self.phase != FlowPhase::Playing || self.remaining_time == 0 {
            return false;
        }
        self.clock_accum += dt;
        // At most one decrement per tick
        if self.clock_accum >= 1.0 {
            self.clock_accum -= 1.0;
            self.remaining_time -= 1;
            return self.remaining_time == 0;
        }
        false
    }

    /// Points awarded for the time left when the level is cleared
    pub fn time_bonus(&self, tuning: &Tuning) -> u32 {
        self.remaining_time * tuning.time_bonus_per_unit
    }
}
