//! Pickups
//!
//! Coins are live from the start. Power-ups spawned by a question block stay
//! dormant (no physics, no contacts) until the block finishes raising them.

use glam::Vec2;
use serde::{Deserialize, Serialize};

use super::body::Body;
use super::collision::{Collider, Group};
use super::event::GameEvent;
use super::player::Player;
use super::state::{EntityId, TickContext};
use crate::tuning::Tuning;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ItemKind {
    Coin,
    Mushroom,
    Star,
    /// Fire flower power-up
    Flower,
}

impl ItemKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ItemKind::Coin => "coin",
            ItemKind::Mushroom => "mushroom",
            ItemKind::Star => "star",
            ItemKind::Flower => "fire_flower",
        }
    }
}

const ITEM_HALF: Vec2 = Vec2::new(16.0, 16.0);

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Item {
    pub id: EntityId,
    pub kind: ItemKind,
    pub body: Body,
    pub active: bool,
    pub direction: f32,
    pub hop_cooldown: f32,
    pub destroyed: bool,
}

impl Item {
    /// A new item, dormant unless it is a coin
    pub fn new(id: EntityId, kind: ItemKind, center: Vec2) -> Self {
        Self {
            id,
            kind,
            body: Body::new(center, ITEM_HALF).passive(),
            active: kind == ItemKind::Coin,
            direction: 1.0,
            hop_cooldown: 0.0,
            destroyed: false,
        }
    }

    /// An item placed directly in the level, live from the start
    pub fn new_active(id: EntityId, kind: ItemKind, center: Vec2, tuning: &Tuning) -> Self {
        let mut item = Self::new(id, kind, center);
        item.activate(tuning);
        item
    }

    pub fn collider(&self) -> Option<Collider> {
        (self.active && !self.destroyed).then(|| Collider::new(self.id, Group::Item, self.body.aabb))
    }

    /// Wake a dormant item
    pub fn activate(&mut self, tuning: &Tuning) {
        if self.active {
            return;
        }
        self.active = true;
        match self.kind {
            ItemKind::Coin | ItemKind::Flower => {}
            ItemKind::Mushroom | ItemKind::Star => {
                self.body.solid = true;
                self.body.gravity = tuning.gravity;
                self.body.max_fall_speed = tuning.max_fall_speed;
                self.body.vel.x = self.direction * tuning.item_move_speed;
            }
        }
        log::debug!("{} {} activated", self.kind.as_str(), self.id);
    }

    /// Player touched this item. Returns true if it was picked up.
    pub fn collect(&mut self, player: &mut Player, ctx: &mut TickContext) -> bool {
        if !self.active || self.destroyed || !player.alive {
            return false;
        }
        match self.kind {
            ItemKind::Coin => {
                ctx.session.coins += 1;
                let score = ctx.tuning.coin_score;
                ctx.award(score);
            }
            ItemKind::Mushroom => player.grow_big(ctx),
            ItemKind::Star => player.collect_star(ctx),
            ItemKind::Flower => player.collect_fire_flower(ctx),
        }
        ctx.emit(GameEvent::ItemCollected(self.kind));
        self.destroyed = true;
        true
    }

    fn moves(&self) -> bool {
        self.active && matches!(self.kind, ItemKind::Mushroom | ItemKind::Star)
    }

    /// Side contact with a wall. `normal` points from the wall toward the item.
    pub fn on_wall(&mut self, normal: Vec2, tuning: &Tuning) -> bool {
        if !self.moves() || normal.x.abs() <= tuning.axis_threshold || self.direction * normal.x >= 0.0 {
            return false;
        }
        self.direction = -self.direction;
        self.body.vel.x = self.direction * tuning.item_move_speed;
        true
    }

    pub fn update(&mut self, ctx: &mut TickContext) {
        if !self.moves() || self.destroyed {
            return;
        }
        self.body.vel.x = self.direction * ctx.tuning.item_move_speed;

        if self.kind == ItemKind::Star {
            self.hop_cooldown = (self.hop_cooldown - ctx.dt).max(0.0);
            if self.body.grounded && self.hop_cooldown <= 0.0 {
                self.body.vel.y = ctx.tuning.star_hop_force;
                self.body.grounded = false;
                self.hop_cooldown = ctx.tuning.star_hop_cooldown_secs;
            }
        }
    }

    pub fn anim_tag(&self) -> &'static str {
        self.kind.as_str()
    }
}
