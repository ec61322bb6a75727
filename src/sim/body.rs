//! Kinematic bodies
//!
//! A [`Body`] is a box with a velocity. Integration applies gravity, clamps
//! speed, then moves x and y separately, pushing out of solid static
//! geometry on each axis (move-and-slide). Dynamic bodies never block each
//! other; their interactions are resolved by the entity state machines.

use glam::Vec2;
use serde::{Deserialize, Serialize};

use super::aabb::Aabb;
use super::collision::CollisionWorld;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Body {
    pub aabb: Aabb,
    pub vel: Vec2,
    /// Velocity at the start of the last move, before static resolution
    pub impact_vel: Vec2,
    /// Vertical acceleration (negative pulls down)
    pub gravity: f32,
    pub max_speed: f32,
    pub max_fall_speed: f32,
    /// Resolved against solid static geometry
    pub solid: bool,
    /// Takes part in collision detection at all
    pub enabled: bool,
    /// Set by the ground sensor
    pub grounded: bool,
}

impl Body {
    pub fn new(center: Vec2, half: Vec2) -> Self {
        Self {
            aabb: Aabb::new(center, half),
            vel: Vec2::ZERO,
            impact_vel: Vec2::ZERO,
            gravity: 0.0,
            max_speed: f32::INFINITY,
            max_fall_speed: f32::INFINITY,
            solid: true,
            enabled: true,
            grounded: false,
        }
    }

    pub fn with_gravity(mut self, gravity: f32, max_fall_speed: f32) -> Self {
        self.gravity = gravity;
        self.max_fall_speed = max_fall_speed;
        self
    }

    pub fn with_max_speed(mut self, max_speed: f32) -> Self {
        self.max_speed = max_speed;
        self
    }

    /// Non-blocking body that passes through the world
    pub fn passive(mut self) -> Self {
        self.solid = false;
        self
    }

    #[inline]
    pub fn position(&self) -> Vec2 {
        self.aabb.center
    }

    /// Resize, keeping the bottom edge where it is
    pub fn set_half_keep_feet(&mut self, half: Vec2) {
        self.aabb = self.aabb.resized_keep_bottom(half);
    }

    /// Advance one step
    pub fn integrate(&mut self, dt: f32, world: &CollisionWorld) {
        self.vel.y += self.gravity * dt;
        self.vel.x = self.vel.x.clamp(-self.max_speed, self.max_speed);
        self.vel.y = self.vel.y.max(-self.max_fall_speed);
        self.impact_vel = self.vel;

        let delta = self.vel * dt;
        if !self.solid || !self.enabled {
            self.aabb.center += delta;
            return;
        }

        // Geometry already overlapping before the move is not pushed against,
        // so a body that grew into a ceiling can still walk out of it
        let start = self.aabb;
        let reach = start.translated(delta).expanded(delta.abs().max_element());
        let solids: Vec<Aabb> = world
            .solids_near(&reach)
            .into_iter()
            .map(|s| s.aabb)
            .filter(|s| !s.overlaps(&start))
            .collect();

        if delta.x != 0.0 {
            self.aabb.center.x += delta.x;
            for s in &solids {
                if s.overlaps(&self.aabb) {
                    self.aabb.center.x = if delta.x > 0.0 {
                        s.left() - self.aabb.half.x
                    } else {
                        s.right() + self.aabb.half.x
                    };
                    self.vel.x = 0.0;
                }
            }
        }

        if delta.y != 0.0 {
            self.aabb.center.y += delta.y;
            for s in &solids {
                if s.overlaps(&self.aabb) {
                    self.aabb.center.y = if delta.y > 0.0 {
                        s.bottom() - self.aabb.half.y
                    } else {
                        s.top() + self.aabb.half.y
                    };
                    self.vel.y = 0.0;
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sim::collision::{Collider, Group};

    fn floor_world() -> CollisionWorld {
        let tiles = (0..4)
            .map(|i| {
                Collider::new(
                    100 + i,
                    Group::Ground,
                    Aabb::new(Vec2::new(16.0 + 32.0 * i as f32, 16.0), Vec2::splat(16.0)),
                )
            })
            .collect();
        CollisionWorld::new(tiles, 32.0, 0.5)
    }

    #[test]
    fn test_gravity_accumulates() {
        let world = CollisionWorld::new(Vec::new(), 32.0, 0.5);
        let mut body = Body::new(Vec2::new(0.0, 500.0), Vec2::splat(16.0)).with_gravity(-1000.0, 900.0);
        body.integrate(0.1, &world);
        assert!((body.vel.y + 100.0).abs() < 1e-3);
        body.integrate(0.1, &world);
        assert!((body.vel.y + 200.0).abs() < 1e-3);
    }

    #[test]
    fn test_speed_clamps() {
        let world = CollisionWorld::new(Vec::new(), 32.0, 0.5);
        let mut body = Body::new(Vec2::new(0.0, 500.0), Vec2::splat(16.0))
            .with_gravity(-1000.0, 300.0)
            .with_max_speed(400.0);
        body.vel = Vec2::new(-1000.0, -1000.0);
        body.integrate(1.0 / 60.0, &world);
        assert_eq!(body.vel, Vec2::new(-400.0, -300.0));
    }

    #[test]
    fn test_lands_on_floor() {
        let world = floor_world();
        let mut body = Body::new(Vec2::new(40.0, 60.0), Vec2::splat(16.0)).with_gravity(-1000.0, 900.0);
        for _ in 0..60 {
            body.integrate(1.0 / 60.0, &world);
        }
        assert!((body.aabb.bottom() - 32.0).abs() < 1e-3);
        assert_eq!(body.vel.y, 0.0);
        assert!(body.impact_vel.y < 0.0);
    }

    #[test]
    fn test_wall_stops_horizontal_motion() {
        let wall = Collider::new(7, Group::Brick, Aabb::new(Vec2::new(100.0, 100.0), Vec2::splat(16.0)));
        let world = CollisionWorld::new(vec![wall], 32.0, 0.5);
        let mut body = Body::new(Vec2::new(60.0, 100.0), Vec2::splat(16.0));
        body.vel.x = 300.0;
        for _ in 0..30 {
            body.integrate(1.0 / 60.0, &world);
        }
        assert!((body.aabb.right() - 84.0).abs() < 1e-3);
    }

    #[test]
    fn test_passive_body_ignores_world() {
        let world = floor_world();
        let mut body = Body::new(Vec2::new(40.0, 40.0), Vec2::splat(16.0)).passive();
        body.vel.y = -600.0;
        body.integrate(0.1, &world);
        assert!((body.position().y + 20.0).abs() < 1e-3);
    }

    #[test]
    fn test_resize_keeps_feet() {
        let mut body = Body::new(Vec2::new(40.0, 48.0), Vec2::splat(16.0));
        body.set_half_keep_feet(Vec2::new(16.0, 32.0));
        assert_eq!(body.aabb.bottom(), 32.0);
        assert_eq!(body.aabb.top(), 96.0);
    }
}
