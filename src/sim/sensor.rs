//! Ground sensing
//!
//! A thin probe under a body's feet decides whether it is supported. The
//! probe is inset horizontally so touching a wall never counts as standing.

use glam::Vec2;

use super::aabb::Aabb;
use super::body::Body;
use super::collision::CollisionWorld;
use crate::tuning::Tuning;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GroundSensor {
    pub depth: f32,
    pub inset: f32,
}

impl GroundSensor {
    pub fn new(depth: f32, inset: f32) -> Self {
        Self { depth, inset }
    }

    pub fn from_tuning(tuning: &Tuning) -> Self {
        Self::new(tuning.ground_probe_depth, tuning.ground_probe_inset)
    }

    /// Probe box spanning `depth` below the body's bottom edge
    pub fn probe_box(&self, body: &Aabb) -> Aabb {
        let half_w = (body.half.x - self.inset).max(0.5);
        let half_h = self.depth / 2.0;
        Aabb::new(Vec2::new(body.center.x, body.bottom() - half_h), Vec2::new(half_w, half_h))
    }

    /// Update `body.grounded`. Returns true on the tick the body lands.
    ///
    /// A body moving upward is never supported, so the tick a jump starts
    /// reads as airborne.
    pub fn sense(&self, body: &mut Body, world: &CollisionWorld) -> bool {
        let was_grounded = body.grounded;
        body.grounded = body.enabled
            && body.solid
            && body.vel.y <= 0.0
            && world.overlaps_solid(&self.probe_box(&body.aabb));
        body.grounded && !was_grounded
    }
}
