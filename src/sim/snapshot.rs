//! Read-only render view of the simulation

use glam::Vec2;
use serde::{Deserialize, Serialize};

use super::state::{EntityId, GameState};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Facing {
    Left,
    Right,
}

impl Facing {
    pub fn from_sign(value: f32) -> Self {
        if value < 0.0 { Facing::Left } else { Facing::Right }
    }

    pub fn sign(self) -> f32 {
        match self {
            Facing::Left => -1.0,
            Facing::Right => 1.0,
        }
    }
}

/// What a renderer needs to draw one entity
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RenderEntry {
    pub id: EntityId,
    pub position: Vec2,
    pub half: Vec2,
    pub facing: Facing,
    pub anim: &'static str,
    /// Invincible: draw blinking
    pub blink: bool,
}

impl GameState {
    /// Render entries for everything visible, player first, then by kind and id
    pub fn snapshot(&self) -> Vec<RenderEntry> {
        let mut out = Vec::with_capacity(
            1 + self.enemies.len() + self.items.len() + self.blocks.len() + self.popups.len() + self.flags.len(),
        );

        let p = &self.player;
        out.push(RenderEntry {
            id: p.id,
            position: p.body.position(),
            half: p.body.aabb.half,
            facing: p.facing,
            anim: p.anim_tag(),
            blink: p.is_invincible(),
        });

        out.extend(self.enemies.iter().map(|e| RenderEntry {
            id: e.id,
            position: e.body.position(),
            half: e.body.aabb.half,
            facing: e.facing(),
            anim: e.anim_tag(),
            blink: false,
        }));

        out.extend(self.items.iter().map(|i| RenderEntry {
            id: i.id,
            position: i.body.position(),
            half: i.body.aabb.half,
            facing: Facing::from_sign(i.direction),
            anim: i.anim_tag(),
            blink: false,
        }));

        out.extend(self.blocks.iter().map(|b| RenderEntry {
            id: b.id,
            position: b.aabb.center,
            half: b.aabb.half,
            facing: Facing::Right,
            anim: b.anim_tag(),
            blink: false,
        }));

        out.extend(self.popups.iter().map(|c| RenderEntry {
            id: c.id,
            position: c.position,
            half: Vec2::splat(8.0),
            facing: Facing::Right,
            anim: "coin_popup",
            blink: false,
        }));

        out.extend(self.flags.iter().map(|f| RenderEntry {
            id: f.id,
            position: f.aabb.center,
            half: f.aabb.half,
            facing: Facing::Right,
            anim: "end_flag",
            blink: false,
        }));

        out
    }

    /// Snapshot as JSON, for debugging and external viewers
    pub fn snapshot_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(&self.snapshot())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sim::level::LevelData;
    use crate::tuning::Tuning;

    #[test]
    fn test_facing_from_sign() {
        assert_eq!(Facing::from_sign(-3.0), Facing::Left);
        assert_eq!(Facing::from_sign(0.0), Facing::Right);
        assert_eq!(Facing::Left.sign(), -1.0);
    }

    #[test]
    fn test_snapshot_covers_every_entity() {
        let level = LevelData::from_ascii("t", &["  Q  Z", " E C  ", "GGGGGG"], 1).unwrap();
        let state = GameState::new(level, Tuning::default());
        let snap = state.snapshot();
        assert_eq!(snap.len(), 5);
        assert_eq!(snap[0].id, state.player.id);
        let tags: Vec<&str> = snap.iter().map(|e| e.anim).collect();
        assert!(tags.contains(&"goomba_walk"));
        assert!(tags.contains(&"coin"));
        assert!(tags.contains(&"block_active"));
        assert!(tags.contains(&"end_flag"));
        assert_eq!(snap[1].facing, Facing::Left);
        assert!(state.snapshot_json().unwrap().contains("goomba_walk"));
    }
}
