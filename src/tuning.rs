//! Data-driven game balance
//!
//! Every gameplay constant the simulation reads comes from a [`Tuning`]
//! value. Defaults mirror [`crate::consts`]; a JSON file may override any
//! subset of fields.

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::consts::*;

/// Gameplay tuning values
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Tuning {
    // === Physics ===
    pub gravity: f32,
    pub max_fall_speed: f32,

    // === Player ===
    pub player_move_speed: f32,
    pub player_max_speed: f32,
    pub jump_force: f32,
    pub stomp_bounce_factor: f32,
    pub hurt_invincible_secs: f32,
    pub star_invincible_secs: f32,
    pub death_rise_secs: f32,
    pub death_rise_height: f32,
    pub death_fall_secs: f32,
    pub death_fall_depth: f32,

    // === Enemies ===
    pub enemy_move_speed: f32,
    pub shell_speed: f32,
    pub shell_kick_cooldown_secs: f32,
    pub enemy_despawn_secs: f32,

    // === Items and blocks ===
    pub item_move_speed: f32,
    pub star_hop_force: f32,
    pub star_hop_cooldown_secs: f32,
    pub item_spawn_offset: f32,
    pub item_rise_secs: f32,
    pub coin_popup_secs: f32,

    // === Scoring ===
    pub enemy_score: u32,
    pub coin_score: u32,
    pub shell_chain_scores: Vec<u32>,
    pub time_bonus_per_unit: u32,

    // === Session ===
    pub start_lives: u8,
    pub level_time: u32,

    // === World ===
    pub cull_margin: f32,
    pub ground_probe_depth: f32,
    pub ground_probe_inset: f32,
    pub contact_skin: f32,
    pub axis_threshold: f32,
}

impl Default for Tuning {
    fn default() -> Self {
        Self {
            gravity: GRAVITY,
            max_fall_speed: MAX_FALL_SPEED,

            player_move_speed: PLAYER_MOVE_SPEED,
            player_max_speed: PLAYER_MAX_SPEED,
            jump_force: JUMP_FORCE,
            stomp_bounce_factor: STOMP_BOUNCE_FACTOR,
            hurt_invincible_secs: HURT_INVINCIBLE_SECS,
            star_invincible_secs: STAR_INVINCIBLE_SECS,
            death_rise_secs: DEATH_RISE_SECS,
            death_rise_height: DEATH_RISE_HEIGHT,
            death_fall_secs: DEATH_FALL_SECS,
            death_fall_depth: DEATH_FALL_DEPTH,

            enemy_move_speed: ENEMY_MOVE_SPEED,
            shell_speed: SHELL_SPEED,
            shell_kick_cooldown_secs: SHELL_KICK_COOLDOWN_SECS,
            enemy_despawn_secs: ENEMY_DESPAWN_SECS,

            item_move_speed: ITEM_MOVE_SPEED,
            star_hop_force: STAR_HOP_FORCE,
            star_hop_cooldown_secs: STAR_HOP_COOLDOWN_SECS,
            item_spawn_offset: ITEM_SPAWN_OFFSET,
            item_rise_secs: ITEM_RISE_SECS,
            coin_popup_secs: COIN_POPUP_SECS,

            enemy_score: ENEMY_SCORE,
            coin_score: COIN_SCORE,
            shell_chain_scores: SHELL_CHAIN_SCORES.to_vec(),
            time_bonus_per_unit: TIME_BONUS_PER_UNIT,

            start_lives: START_LIVES,
            level_time: LEVEL_TIME,

            cull_margin: CULL_MARGIN,
            ground_probe_depth: GROUND_PROBE_DEPTH,
            ground_probe_inset: GROUND_PROBE_INSET,
            contact_skin: CONTACT_SKIN,
            axis_threshold: AXIS_THRESHOLD,
        }
    }
}

impl Tuning {
    /// Parse tuning from JSON. Missing fields keep their defaults.
    pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(json)
    }

    /// Load tuning from a JSON file, falling back to defaults if the file is
    /// missing or unparseable
    pub fn load_or_default(path: impl AsRef<Path>) -> Self {
        let path = path.as_ref();
        match std::fs::read_to_string(path) {
            Ok(text) => match Self::from_json(&text) {
                Ok(tuning) => {
                    log::info!("Loaded tuning from {}", path.display());
                    tuning
                }
                Err(e) => {
                    log::warn!("Tuning parse error in {}: {e}; using defaults", path.display());
                    Self::default()
                }
            },
            Err(_) => {
                log::info!("No tuning file at {}, using defaults", path.display());
                Self::default()
            }
        }
    }

    /// Score for the `chain`-th kill (1-based) by one moving shell
    pub fn shell_chain_score(&self, chain: u32) -> u32 {
        let idx = (chain.max(1) - 1) as usize;
        self.shell_chain_scores
            .get(idx)
            .or_else(|| self.shell_chain_scores.last())
            .copied()
            .unwrap_or(self.enemy_score)
    }

    /// Stomp bounce impulse
    pub fn bounce_force(&self) -> f32 {
        self.jump_force * self.stomp_bounce_factor
    }
}
