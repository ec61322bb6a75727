//! Axis-aligned box geometry
//!
//! Every collider in the simulation is an [`Aabb`] stored as center plus
//! half-extents, in a y-up world.

use glam::Vec2;
use serde::{Deserialize, Serialize};

/// An axis-aligned bounding box
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Aabb {
    pub center: Vec2,
    /// Half width / half height (always positive for non-static bodies)
    pub half: Vec2,
}

impl Aabb {
    pub fn new(center: Vec2, half: Vec2) -> Self {
        Self { center, half }
    }

    #[inline]
    pub fn min(&self) -> Vec2 {
        self.center - self.half
    }

    #[inline]
    pub fn max(&self) -> Vec2 {
        self.center + self.half
    }

    #[inline]
    pub fn left(&self) -> f32 {
        self.center.x - self.half.x
    }

    #[inline]
    pub fn right(&self) -> f32 {
        self.center.x + self.half.x
    }

    #[inline]
    pub fn bottom(&self) -> f32 {
        self.center.y - self.half.y
    }

    #[inline]
    pub fn top(&self) -> f32 {
        self.center.y + self.half.y
    }

    /// Strict overlap: boxes that only share an edge do not overlap
    pub fn overlaps(&self, other: &Aabb) -> bool {
        let d = (self.center - other.center).abs();
        let reach = self.half + other.half;
        d.x < reach.x && d.y < reach.y
    }

    /// Overlap depth on each axis (negative on an axis means a gap)
    pub fn penetration(&self, other: &Aabb) -> Vec2 {
        let d = (self.center - other.center).abs();
        self.half + other.half - d
    }

    /// Box grown by `amount` on every side
    pub fn expanded(&self, amount: f32) -> Aabb {
        Aabb::new(self.center, self.half + Vec2::splat(amount))
    }

    pub fn translated(&self, offset: Vec2) -> Aabb {
        Aabb::new(self.center + offset, self.half)
    }

    /// Same box resized to `half`, keeping the bottom edge in place
    pub fn resized_keep_bottom(&self, half: Vec2) -> Aabb {
        let bottom = self.bottom();
        Aabb::new(Vec2::new(self.center.x, bottom + half.y), half)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_edges() {
        let b = Aabb::new(Vec2::new(10.0, 20.0), Vec2::new(4.0, 8.0));
        assert_eq!(b.left(), 6.0);
        assert_eq!(b.right(), 14.0);
        assert_eq!(b.bottom(), 12.0);
        assert_eq!(b.top(), 28.0);
        assert_eq!(b.min(), Vec2::new(6.0, 12.0));
        assert_eq!(b.max(), Vec2::new(14.0, 28.0));
    }

    #[test]
    fn test_touching_is_not_overlapping() {
        let a = Aabb::new(Vec2::new(0.0, 0.0), Vec2::splat(16.0));
        let b = Aabb::new(Vec2::new(32.0, 0.0), Vec2::splat(16.0));
        assert!(!a.overlaps(&b));
        assert!(a.expanded(0.5).overlaps(&b));

        let c = Aabb::new(Vec2::new(31.0, 5.0), Vec2::splat(16.0));
        assert!(a.overlaps(&c));
        let p = a.penetration(&c);
        assert!((p.x - 1.0).abs() < 1e-5);
        assert!((p.y - 27.0).abs() < 1e-5);
    }

    #[test]
    fn test_resize_keeps_feet() {
        let small = Aabb::new(Vec2::new(50.0, 48.0), Vec2::new(16.0, 16.0));
        let big = small.resized_keep_bottom(Vec2::new(16.0, 32.0));
        assert_eq!(big.bottom(), small.bottom());
        assert_eq!(big.center.y, 64.0);
        let back = big.resized_keep_bottom(Vec2::new(16.0, 16.0));
        assert_eq!(back, small);
    }
}
