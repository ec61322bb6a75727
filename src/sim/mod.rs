//! Deterministic simulation module
//!
//! All gameplay logic lives here. This module must be pure and deterministic:
//! - Fixed timestep only
//! - Seeded RNG only (level generation and block rewards)
//! - Stable iteration order (by entity ID)
//! - No rendering or platform dependencies

pub mod aabb;
pub mod block;
pub mod body;
pub mod collision;
pub mod enemy;
pub mod event;
pub mod item;
pub mod level;
pub mod player;
pub mod sensor;
pub mod snapshot;
pub mod state;
pub mod tick;

pub use aabb::Aabb;
pub use block::{BlockReward, CoinPopup, HitOutcome, QuestionBlock};
pub use body::Body;
pub use collision::{Collider, CollisionResult, CollisionWorld, Contact, Group, SpatialHash, box_collision};
pub use enemy::{Enemy, EnemyKind, ShellState};
pub use event::{EntityKind, EventListener, EventSink, GameEvent};
pub use item::{Item, ItemKind};
pub use level::{GridPos, LevelData, SpawnKind, TileKind};
pub use player::{Player, PlayerSize};
pub use sensor::GroundSensor;
pub use snapshot::{Facing, RenderEntry};
pub use state::{EndFlag, EntityId, GameState, SpawnRequest, TickContext};
pub use tick::{TickInput, tick};
