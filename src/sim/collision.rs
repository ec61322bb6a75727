//! Contact detection between boxes
//!
//! The collision world keeps static geometry (tiles, question blocks, the end
//! flag) in a spatial hash built once per level, and rebuilds a second hash
//! of dynamic bodies every tick. Narrow phase is box-vs-box with a small
//! contact skin so resting and touching bodies still report contacts.
//!
//! Contacts are a per-tick snapshot: `refresh` discards the previous tick's
//! list before detecting anything.

use std::collections::HashMap;

use glam::Vec2;
use serde::{Deserialize, Serialize};

use super::aabb::Aabb;
use super::state::EntityId;
use crate::sign_or;

/// Collision group tag
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Group {
    Player,
    Enemy,
    Item,
    Ground,
    Brick,
    QuestionBlock,
    EndFlag,
}

impl Group {
    /// Part of the level geometry (never moves)
    pub fn is_static(self) -> bool {
        matches!(
            self,
            Group::Ground | Group::Brick | Group::QuestionBlock | Group::EndFlag
        )
    }

    /// Static geometry that blocks movement
    pub fn is_solid(self) -> bool {
        matches!(self, Group::Ground | Group::Brick | Group::QuestionBlock)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Group::Player => "player",
            Group::Enemy => "enemy",
            Group::Item => "item",
            Group::Ground => "ground",
            Group::Brick => "brick",
            Group::QuestionBlock => "questionBlock",
            Group::EndFlag => "endFlag",
        }
    }
}

/// A box registered with the collision world for one tick
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Collider {
    pub id: EntityId,
    pub group: Group,
    pub aabb: Aabb,
    /// Reports contacts but never blocks
    pub sensor: bool,
}

impl Collider {
    pub fn new(id: EntityId, group: Group, aabb: Aabb) -> Self {
        Self {
            id,
            group,
            aabb,
            sensor: false,
        }
    }

    pub fn sensor(mut self) -> Self {
        self.sensor = true;
        self
    }

    /// Solid static geometry that bodies are resolved against
    pub fn blocks(&self) -> bool {
        self.group.is_solid() && !self.sensor
    }
}

/// Result of a box-vs-box check
#[derive(Debug, Clone)]
pub struct CollisionResult {
    /// Whether the boxes overlap or touch within the skin
    pub hit: bool,
    /// Middle of the overlap region
    pub point: Vec2,
    /// Unit axis normal pointing from the second box toward the first
    pub normal: Vec2,
    /// Depth along `normal` (slightly negative for touching boxes)
    pub penetration: f32,
}

impl CollisionResult {
    pub fn miss() -> Self {
        Self {
            hit: false,
            point: Vec2::ZERO,
            normal: Vec2::ZERO,
            penetration: 0.0,
        }
    }
}

/// Check `a` against `b`
///
/// The separating axis is the one with the smaller penetration. A corner
/// touch (both axes within the skin) is classified as vertical so a body
/// resting on one tile does not read the next tile's edge as a wall.
pub fn box_collision(a: &Aabb, b: &Aabb, skin: f32) -> CollisionResult {
    let pen = a.penetration(b);
    if pen.x + skin <= 0.0 || pen.y + skin <= 0.0 {
        return CollisionResult::miss();
    }

    let d = a.center - b.center;
    let corner = pen.x <= skin && pen.y <= skin;
    let (normal, penetration) = if pen.x < pen.y && !corner {
        (Vec2::new(sign_or(d.x, 1.0), 0.0), pen.x)
    } else {
        (Vec2::new(0.0, sign_or(d.y, 1.0)), pen.y)
    };

    let lo = a.min().max(b.min());
    let hi = a.max().min(b.max());

    CollisionResult {
        hit: true,
        point: (lo + hi) * 0.5,
        normal,
        penetration,
    }
}

/// A contact between two colliders, valid for the tick that produced it
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Contact {
    pub a: EntityId,
    pub b: EntityId,
    pub group_a: Group,
    pub group_b: Group,
    /// Unit normal pointing from `b` toward `a`
    pub normal: Vec2,
    pub penetration: f32,
    pub point: Vec2,
}

impl Contact {
    pub fn involves(&self, id: EntityId) -> bool {
        self.a == id || self.b == id
    }

    /// Normal pointing from the other body toward `id`
    ///
    /// This is the outward normal of the face `id` touched: (0, 1) when
    /// `id` landed on top of the other body, (0, -1) when it struck the
    /// other body from below.
    pub fn normal_toward(&self, id: EntityId) -> Vec2 {
        if id == self.a { self.normal } else { -self.normal }
    }

    /// Same contact seen from `b`
    pub fn flipped(&self) -> Contact {
        Contact {
            a: self.b,
            b: self.a,
            group_a: self.group_b,
            group_b: self.group_a,
            normal: -self.normal,
            penetration: self.penetration,
            point: self.point,
        }
    }
}

/// Uniform grid hash of box indices
#[derive(Debug, Clone, Default)]
pub struct SpatialHash {
    cell_size: f32,
    cells: HashMap<(i32, i32), Vec<usize>>,
}

impl SpatialHash {
    pub fn new(cell_size: f32) -> Self {
        Self {
            cell_size: cell_size.max(1.0),
            cells: HashMap::new(),
        }
    }

    pub fn clear(&mut self) {
        // Keep the allocations, drop the contents
        for bucket in self.cells.values_mut() {
            bucket.clear();
        }
    }

    fn cell_range(&self, aabb: &Aabb) -> (i32, i32, i32, i32) {
        let min = aabb.min() / self.cell_size;
        let max = aabb.max() / self.cell_size;
        (
            min.x.floor() as i32,
            min.y.floor() as i32,
            max.x.floor() as i32,
            max.y.floor() as i32,
        )
    }

    pub fn insert(&mut self, index: usize, aabb: &Aabb) {
        let (x0, y0, x1, y1) = self.cell_range(aabb);
        for cx in x0..=x1 {
            for cy in y0..=y1 {
                self.cells.entry((cx, cy)).or_default().push(index);
            }
        }
    }

    /// Indices whose cells intersect `aabb`, sorted and deduplicated
    pub fn query_into(&self, aabb: &Aabb, out: &mut Vec<usize>) {
        out.clear();
        let (x0, y0, x1, y1) = self.cell_range(aabb);
        for cx in x0..=x1 {
            for cy in y0..=y1 {
                if let Some(bucket) = self.cells.get(&(cx, cy)) {
                    out.extend_from_slice(bucket);
                }
            }
        }
        out.sort_unstable();
        out.dedup();
    }
}

/// Broad and narrow phase for one level
#[derive(Debug, Clone)]
pub struct CollisionWorld {
    statics: Vec<Collider>,
    static_hash: SpatialHash,
    dynamic_hash: SpatialHash,
    contacts: Vec<Contact>,
    skin: f32,
}

impl CollisionWorld {
    pub fn new(mut statics: Vec<Collider>, cell_size: f32, skin: f32) -> Self {
        statics.sort_by_key(|s| s.id);
        let mut static_hash = SpatialHash::new(cell_size);
        for (i, s) in statics.iter().enumerate() {
            static_hash.insert(i, &s.aabb);
        }
        Self {
            statics,
            static_hash,
            dynamic_hash: SpatialHash::new(cell_size),
            contacts: Vec::new(),
            skin,
        }
    }

    pub fn statics(&self) -> &[Collider] {
        &self.statics
    }

    /// Contacts from the last `refresh`
    pub fn contacts(&self) -> &[Contact] {
        &self.contacts
    }

    /// Solid static colliders near `aabb`, in id order
    pub fn solids_near(&self, aabb: &Aabb) -> Vec<&Collider> {
        let mut buf = Vec::new();
        self.static_hash.query_into(aabb, &mut buf);
        buf.into_iter()
            .map(|i| &self.statics[i])
            .filter(|s| s.blocks())
            .collect()
    }

    /// Whether any solid static geometry strictly overlaps `aabb`
    pub fn overlaps_solid(&self, aabb: &Aabb) -> bool {
        self.solids_near(aabb).iter().any(|s| s.aabb.overlaps(aabb))
    }

    /// Rebuild the contact list from this tick's dynamic colliders
    ///
    /// `dynamic` must contain only live, enabled bodies. Dynamic pairs are
    /// reported once with the lower id as `a`; dynamic-vs-static contacts
    /// always have the dynamic body as `a`.
    pub fn refresh(&mut self, dynamic: &[Collider]) -> &[Contact] {
        self.contacts.clear();
        self.dynamic_hash.clear();

        for (i, c) in dynamic.iter().enumerate() {
            self.dynamic_hash.insert(i, &c.aabb.expanded(self.skin));
        }

        let mut buf = Vec::new();
        for (i, c) in dynamic.iter().enumerate() {
            let probe = c.aabb.expanded(self.skin);

            self.dynamic_hash.query_into(&probe, &mut buf);
            for &j in buf.iter().filter(|&&j| j > i) {
                let o = &dynamic[j];
                let (first, second) = if c.id <= o.id { (c, o) } else { (o, c) };
                let hit = box_collision(&first.aabb, &second.aabb, self.skin);
                if hit.hit {
                    self.contacts.push(Contact {
                        a: first.id,
                        b: second.id,
                        group_a: first.group,
                        group_b: second.group,
                        normal: hit.normal,
                        penetration: hit.penetration,
                        point: hit.point,
                    });
                }
            }

            self.static_hash.query_into(&probe, &mut buf);
            for &s in buf.iter() {
                let st = &self.statics[s];
                let hit = box_collision(&c.aabb, &st.aabb, self.skin);
                if hit.hit {
                    self.contacts.push(Contact {
                        a: c.id,
                        b: st.id,
                        group_a: c.group,
                        group_b: st.group,
                        normal: hit.normal,
                        penetration: hit.penetration,
                        point: hit.point,
                    });
                }
            }
        }

        self.contacts.sort_by_key(|c| (c.a, c.b));
        &self.contacts
    }
}
