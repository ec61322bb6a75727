//! Game state and entity storage
//!
//! Each entity kind lives in its own `Vec`, kept sorted by id so iteration
//! order is stable tick to tick. Ids come from a single counter and are never
//! reused within a level.

use glam::Vec2;
use serde::{Deserialize, Serialize};

use super::aabb::Aabb;
use super::block::{CoinPopup, QuestionBlock};
use super::collision::{Collider, CollisionWorld, Group};
use super::enemy::{Enemy, EnemyKind};
use super::event::{EventSink, GameEvent};
use super::item::{Item, ItemKind};
use super::level::{GridPos, LevelData, SpawnKind};
use super::player::{Player, PlayerSize};
use crate::consts::TILE_SIZE;
use crate::session::Session;
use crate::tuning::Tuning;
use crate::{standing_center, tile_center};

/// Handle for any entity in a level
pub type EntityId = u32;

/// Per-tick services handed to entity state machines
pub struct TickContext<'a> {
    pub tuning: &'a Tuning,
    pub session: &'a mut Session,
    pub events: &'a mut EventSink,
    pub dt: f32,
    /// Value of `GameState::time_ticks` for the tick being run
    pub tick: u64,
}

impl TickContext<'_> {
    /// Add points to the session and report them
    pub fn award(&mut self, amount: u32) {
        if amount == 0 {
            return;
        }
        self.session.add_score(amount);
        self.events.push(GameEvent::ScoreAwarded(amount));
    }

    pub fn emit(&mut self, event: GameEvent) {
        self.events.push(event);
    }
}

/// Sensor pole the player touches to clear the level
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct EndFlag {
    pub id: EntityId,
    pub aabb: Aabb,
}

impl EndFlag {
    /// Pole half width (10 units wide)
    const HALF_WIDTH: f32 = 5.0;

    /// Pole planted at `pos`, reaching from the level floor to the top of that tile
    pub fn at(id: EntityId, pos: GridPos) -> Self {
        let top = (pos.row + 1) as f32 * TILE_SIZE;
        let x = tile_center(pos.col, pos.row).x;
        Self {
            id,
            aabb: Aabb::new(Vec2::new(x, top / 2.0), Vec2::new(Self::HALF_WIDTH, top / 2.0)),
        }
    }
}

/// Entity creation requested mid-tick, applied once the tick's contacts are done
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum SpawnRequest {
    /// Dormant reward raised out of the block at `block` (index into `blocks`)
    BlockReward { block: usize, kind: ItemKind },
    CoinPopup { at: Vec2 },
}

/// Complete state of one level being played
#[derive(Debug)]
pub struct GameState {
    pub tuning: Tuning,
    pub session: Session,
    pub events: EventSink,
    /// Level this state was built from (kept for restarts)
    pub level: LevelData,
    pub player: Player,
    /// Sorted by id
    pub enemies: Vec<Enemy>,
    /// Sorted by id
    pub items: Vec<Item>,
    /// Sorted by id
    pub blocks: Vec<QuestionBlock>,
    pub popups: Vec<CoinPopup>,
    pub flags: Vec<EndFlag>,
    pub world: CollisionWorld,
    /// Simulation tick counter
    pub time_ticks: u64,
    next_id: EntityId,
}

impl GameState {
    /// Fresh session on `level`
    pub fn new(level: LevelData, tuning: Tuning) -> Self {
        let session = Session::new(&tuning);
        Self::build(level, tuning, session, EventSink::new())
    }

    /// Populate `level`, carrying over an existing session
    pub fn from_level(level: LevelData, tuning: Tuning, mut session: Session) -> Self {
        session.begin_level();
        Self::build(level, tuning, session, EventSink::new())
    }

    fn build(level: LevelData, tuning: Tuning, session: Session, events: EventSink) -> Self {
        let start = level.player_start;
        let player_center = standing_center(start.col, start.row, PlayerSize::Small.half());

        let mut state = Self {
            player: Player::new(1, player_center, &tuning),
            tuning,
            session,
            events,
            level: level.clone(),
            enemies: Vec::new(),
            items: Vec::new(),
            blocks: Vec::new(),
            popups: Vec::new(),
            flags: Vec::new(),
            world: CollisionWorld::new(Vec::new(), TILE_SIZE, 0.0),
            time_ticks: 0,
            next_id: 2,
        };

        let mut statics = Vec::with_capacity(level.tiles.len() + level.blocks.len() + level.flags.len());
        let tile_half = Vec2::splat(TILE_SIZE / 2.0);

        for tile in &level.tiles {
            let id = state.next_entity_id();
            let aabb = Aabb::new(tile_center(tile.pos.col, tile.pos.row), tile_half);
            statics.push(Collider::new(id, tile.kind.group(), aabb));
        }

        for record in &level.blocks {
            let id = state.next_entity_id();
            let aabb = Aabb::new(tile_center(record.pos.col, record.pos.row), tile_half);
            state.blocks.push(QuestionBlock::new(id, aabb, record.reward, record.uses));
            statics.push(Collider::new(id, Group::QuestionBlock, aabb));
        }

        for &pos in &level.flags {
            let flag = EndFlag::at(state.next_entity_id(), pos);
            statics.push(Collider::new(flag.id, Group::EndFlag, flag.aabb).sensor());
            state.flags.push(flag);
        }

        for spawn in &level.spawns {
            let GridPos { col, row } = spawn.pos;
            match spawn.kind {
                SpawnKind::Goomba => state.spawn_enemy(EnemyKind::Goomba, col, row),
                SpawnKind::Turtle => state.spawn_enemy(EnemyKind::Turtle, col, row),
                SpawnKind::FlowerEnemy => state.spawn_enemy(EnemyKind::Flower, col, row),
                SpawnKind::Coin => state.spawn_item(ItemKind::Coin, col, row),
                SpawnKind::Mushroom => state.spawn_item(ItemKind::Mushroom, col, row),
                SpawnKind::Star => state.spawn_item(ItemKind::Star, col, row),
                SpawnKind::FireFlower => state.spawn_item(ItemKind::Flower, col, row),
            };
        }

        state.world = CollisionWorld::new(statics, TILE_SIZE, state.tuning.contact_skin);
        state.normalize_order();

        log::info!(
            "Level '{}' ready: {} enemies, {} items, {} blocks, {} static colliders",
            state.level.name,
            state.enemies.len(),
            state.items.len(),
            state.blocks.len(),
            state.world.statics().len()
        );
        state
    }

    /// Rebuild the current level from scratch, keeping score and lives
    pub fn restart(&mut self) {
        self.load_level(self.level.clone());
    }

    /// Replace the level, keeping score, lives and listeners
    pub fn load_level(&mut self, level: LevelData) {
        let mut session = self.session.clone();
        session.begin_level();
        let events = std::mem::take(&mut self.events);
        *self = Self::build(level, self.tuning.clone(), session, events);
    }

    /// Get next entity ID
    pub fn next_entity_id(&mut self) -> EntityId {
        let id = self.next_id;
        self.next_id += 1;
        id
    }

    fn spawn_enemy(&mut self, kind: EnemyKind, col: usize, row: usize) -> EntityId {
        let id = self.next_entity_id();
        let center = standing_center(col, row, kind.half());
        self.enemies.push(Enemy::new(id, kind, center, &self.tuning));
        id
    }

    fn spawn_item(&mut self, kind: ItemKind, col: usize, row: usize) -> EntityId {
        let id = self.next_entity_id();
        let center = tile_center(col, row);
        self.items.push(Item::new_active(id, kind, center, &self.tuning));
        id
    }

    /// Apply spawns requested during the tick
    pub fn apply_spawns(&mut self, requests: Vec<SpawnRequest>) {
        for request in requests {
            match request {
                SpawnRequest::BlockReward { block, kind } => {
                    let Some(start) = self.blocks.get(block).map(|b| b.spawn_point(&self.tuning)) else {
                        continue;
                    };
                    let id = self.next_entity_id();
                    self.items.push(Item::new(id, kind, start));
                    self.blocks[block].start_rising(id, start.y);
                    log::debug!("{} {} rising from block {}", kind.as_str(), id, self.blocks[block].id);
                }
                SpawnRequest::CoinPopup { at } => {
                    let id = self.next_entity_id();
                    let duration = self.tuning.coin_popup_secs;
                    self.popups.push(CoinPopup::new(id, at, duration));
                }
            }
        }
        self.normalize_order();
    }

    pub fn enemy_index(&self, id: EntityId) -> Option<usize> {
        self.enemies.binary_search_by_key(&id, |e| e.id).ok()
    }

    pub fn item_index(&self, id: EntityId) -> Option<usize> {
        self.items.binary_search_by_key(&id, |i| i.id).ok()
    }

    pub fn enemy(&self, id: EntityId) -> Option<&Enemy> {
        self.enemy_index(id).map(|i| &self.enemies[i])
    }

    pub fn item(&self, id: EntityId) -> Option<&Item> {
        self.item_index(id).map(|i| &self.items[i])
    }

    /// Colliders of every live dynamic entity, for this tick's detection pass
    pub fn dynamic_colliders(&self) -> Vec<Collider> {
        let mut colliders = Vec::with_capacity(1 + self.enemies.len() + self.items.len());
        colliders.extend(self.player.collider());
        colliders.extend(self.enemies.iter().filter_map(Enemy::collider));
        colliders.extend(self.items.iter().filter_map(Item::collider));
        colliders
    }

    /// Ensure entities are sorted by ID for deterministic iteration
    pub fn normalize_order(&mut self) {
        self.enemies.sort_by_key(|e| e.id);
        self.items.sort_by_key(|i| i.id);
        self.blocks.sort_by_key(|b| b.id);
        self.popups.sort_by_key(|p| p.id);
    }

    /// Drop everything marked for removal this tick
    pub fn remove_destroyed(&mut self) {
        self.enemies.retain(|e| !e.destroyed);
        self.items.retain(|i| !i.destroyed);
        self.popups.retain(|p| !p.is_finished());
    }

    /// Mark enemies and items that left the level bounds
    ///
    /// Returns the number of entities culled.
    pub fn cull_out_of_bounds(&mut self) -> usize {
        let margin = self.tuning.cull_margin;
        let (left, right, bottom) = (-margin, self.level.world_width() + margin, -margin);
        let outside = |p: Vec2| p.y < bottom || p.x < left || p.x > right;

        let mut culled = 0;
        for enemy in self.enemies.iter_mut().filter(|e| e.is_cullable() && !e.destroyed) {
            if outside(enemy.body.position()) {
                log::debug!("culled {} {}", enemy.kind.as_str(), enemy.id);
                enemy.destroyed = true;
                enemy.despawn_timer = None;
                culled += 1;
            }
        }
        for item in self.items.iter_mut().filter(|i| !i.destroyed) {
            if outside(item.body.position()) {
                log::debug!("culled {} {}", item.kind.as_str(), item.id);
                item.destroyed = true;
                culled += 1;
            }
        }
        culled
    }
}

/// Two distinct mutable elements of one slice
pub(crate) fn two_mut<T>(items: &mut [T], i: usize, j: usize) -> Option<(&mut T, &mut T)> {
    if i == j || i >= items.len() || j >= items.len() {
        return None;
    }
    if i < j {
        let (lo, hi) = items.split_at_mut(j);
        Some((&mut lo[i], &mut hi[0]))
    } else {
        let (lo, hi) = items.split_at_mut(i);
        Some((&mut hi[0], &mut lo[j]))
    }
}
