//! Question blocks and the coin popup effect

use glam::Vec2;
use serde::{Deserialize, Serialize};

use super::aabb::Aabb;
use super::event::GameEvent;
use super::item::{Item, ItemKind};
use super::state::{EntityId, TickContext};
use crate::consts::TILE_SIZE;
use crate::tuning::Tuning;

/// What a question block gives when struck
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum BlockReward {
    Coin,
    Mushroom,
    Star,
    Flower,
    /// A coin per hit until the uses run out
    MultiCoin,
}

/// Result of striking a block
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HitOutcome {
    /// Block already used up
    Ignored,
    /// Coin awarded; the caller spawns the popup
    Coin,
    /// Caller spawns this item dormant above the block
    Spawn(ItemKind),
    /// Block had no reward configured
    Empty,
}

/// A reward being raised out of its block
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RisingReward {
    pub item: EntityId,
    pub start_y: f32,
    pub elapsed: f32,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QuestionBlock {
    pub id: EntityId,
    pub aabb: Aabb,
    pub reward: Option<BlockReward>,
    pub remaining_uses: u32,
    pub active: bool,
    pub rising: Option<RisingReward>,
    /// Tick of the last hit that took effect
    pub last_hit_tick: Option<u64>,
}

impl QuestionBlock {
    pub fn new(id: EntityId, aabb: Aabb, reward: Option<BlockReward>, uses: u32) -> Self {
        let remaining_uses = match reward {
            Some(BlockReward::MultiCoin) => uses.max(1),
            _ => 1,
        };
        Self {
            id,
            aabb,
            reward,
            remaining_uses,
            active: true,
            rising: None,
            last_hit_tick: None,
        }
    }

    fn deactivate(&mut self) {
        self.active = false;
        self.remaining_uses = 0;
    }

    /// Strike the block from below
    ///
    /// At most one hit per tick takes effect.
    pub fn hit(&mut self, ctx: &mut TickContext) -> HitOutcome {
        if !self.active || self.last_hit_tick == Some(ctx.tick) {
            return HitOutcome::Ignored;
        }
        self.last_hit_tick = Some(ctx.tick);
        ctx.emit(GameEvent::BlockHit { id: self.id });

        let outcome = match self.reward {
            Some(BlockReward::Coin) => {
                self.deactivate();
                HitOutcome::Coin
            }
            Some(BlockReward::MultiCoin) => {
                self.remaining_uses = self.remaining_uses.saturating_sub(1);
                if self.remaining_uses == 0 {
                    self.deactivate();
                }
                HitOutcome::Coin
            }
            Some(BlockReward::Mushroom) => {
                self.deactivate();
                HitOutcome::Spawn(ItemKind::Mushroom)
            }
            Some(BlockReward::Star) => {
                self.deactivate();
                HitOutcome::Spawn(ItemKind::Star)
            }
            Some(BlockReward::Flower) => {
                self.deactivate();
                HitOutcome::Spawn(ItemKind::Flower)
            }
            None => {
                log::warn!("Question block {} has no reward configured", self.id);
                self.deactivate();
                HitOutcome::Empty
            }
        };

        if outcome == HitOutcome::Coin {
            ctx.session.coins += 1;
            let score = ctx.tuning.coin_score;
            ctx.award(score);
            ctx.emit(GameEvent::ItemCollected(ItemKind::Coin));
        }
        outcome
    }

    /// Where a spawned reward starts
    pub fn spawn_point(&self, tuning: &Tuning) -> Vec2 {
        self.aabb.center + Vec2::new(0.0, tuning.item_spawn_offset)
    }

    pub fn start_rising(&mut self, item: EntityId, start_y: f32) {
        self.rising = Some(RisingReward {
            item,
            start_y,
            elapsed: 0.0,
        });
    }

    /// Raise the pending reward one tile, then activate it
    ///
    /// `items` must be sorted by id.
    pub fn update_rising(&mut self, items: &mut [Item], tuning: &Tuning, dt: f32) {
        let Some(rising) = self.rising.as_mut() else {
            return;
        };
        let Ok(idx) = items.binary_search_by_key(&rising.item, |i| i.id) else {
            self.rising = None;
            return;
        };
        let item = &mut items[idx];

        rising.elapsed += dt;
        let f = (rising.elapsed / tuning.item_rise_secs.max(f32::EPSILON)).min(1.0);
        item.body.aabb.center.y = rising.start_y + TILE_SIZE * f;

        if f >= 1.0 {
            item.activate(tuning);
            self.rising = None;
        }
    }

    pub fn anim_tag(&self) -> &'static str {
        if self.active { "block_active" } else { "block_used" }
    }
}

/// Cosmetic coin that pops out of a block
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CoinPopup {
    pub id: EntityId,
    pub position: Vec2,
    pub start_y: f32,
    pub elapsed: f32,
    pub duration: f32,
}

/// How far the popup coin travels up
const POPUP_RISE: f32 = 80.0;

impl CoinPopup {
    pub fn new(id: EntityId, block_center: Vec2, duration: f32) -> Self {
        Self {
            id,
            position: block_center,
            start_y: block_center.y,
            elapsed: 0.0,
            duration,
        }
    }

    pub fn update(&mut self, dt: f32) {
        self.elapsed += dt;
        let f = (self.elapsed / self.duration.max(f32::EPSILON)).min(1.0);
        self.position.y = self.start_y + POPUP_RISE * f;
    }

    pub fn is_finished(&self) -> bool {
        self.elapsed >= self.duration
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::session::Session;
    use crate::sim::event::EventSink;

    fn block(reward: Option<BlockReward>, uses: u32) -> QuestionBlock {
        QuestionBlock::new(9, Aabb::new(Vec2::new(80.0, 144.0), Vec2::splat(16.0)), reward, uses)
    }

    fn hit_times(b: &mut QuestionBlock, n: usize) -> (Vec<HitOutcome>, Session, Vec<GameEvent>) {
        let tuning = Tuning::default();
        let mut session = Session::new(&tuning);
        let mut events = EventSink::new();
        let mut out = Vec::new();
        for tick in 0..n as u64 {
            let mut ctx = TickContext {
                tuning: &tuning,
                session: &mut session,
                events: &mut events,
                dt: crate::consts::SIM_DT,
                tick,
            };
            out.push(b.hit(&mut ctx));
        }
        (out, session, events.flush())
    }

    #[test]
    fn test_multi_coin_three_uses() {
        let mut b = block(Some(BlockReward::MultiCoin), 3);
        let mut states = Vec::new();
        for _ in 0..4 {
            let (outcome, _, _) = hit_times(&mut b, 1);
            states.push((outcome[0], b.active));
        }
        assert_eq!(
            states,
            vec![
                (HitOutcome::Coin, true),
                (HitOutcome::Coin, true),
                (HitOutcome::Coin, false),
                (HitOutcome::Ignored, false),
            ]
        );
    }

    #[test]
    fn test_multi_coin_scores_each_hit() {
        let mut b = block(Some(BlockReward::MultiCoin), 3);
        let (_, session, events) = hit_times(&mut b, 4);
        assert_eq!(session.score, 600);
        assert_eq!(session.coins, 3);
        assert_eq!(events.iter().filter(|e| matches!(e, GameEvent::BlockHit { .. })).count(), 3);
    }

    #[test]
    fn test_second_hit_in_same_tick_is_ignored() {
        let tuning = Tuning::default();
        let mut session = Session::new(&tuning);
        let mut events = EventSink::new();
        let mut b = block(Some(BlockReward::MultiCoin), 3);
        let outcomes = {
            let mut ctx = TickContext {
                tuning: &tuning,
                session: &mut session,
                events: &mut events,
                dt: crate::consts::SIM_DT,
                tick: 7,
            };
            [b.hit(&mut ctx), b.hit(&mut ctx)]
        };
        assert_eq!(outcomes, [HitOutcome::Coin, HitOutcome::Ignored]);
        assert_eq!(b.remaining_uses, 2);
        assert_eq!(session.score, 200);
        let events = events.flush();
        assert_eq!(events.iter().filter(|e| matches!(e, GameEvent::BlockHit { .. })).count(), 1);
        assert_eq!(events.iter().filter(|e| matches!(e, GameEvent::ScoreAwarded(_))).count(), 1);
    }

    #[test]
    fn test_single_use_blocks() {
        let mut b = block(Some(BlockReward::Mushroom), 5);
        let (out, session, _) = hit_times(&mut b, 2);
        assert_eq!(out, vec![HitOutcome::Spawn(ItemKind::Mushroom), HitOutcome::Ignored]);
        assert_eq!(session.score, 0);
        assert!(!b.active);
        assert_eq!(b.anim_tag(), "block_used");
    }

    #[test]
    fn test_missing_reward_is_consumed() {
        let mut b = block(None, 1);
        let (out, _, events) = hit_times(&mut b, 2);
        assert_eq!(out, vec![HitOutcome::Empty, HitOutcome::Ignored]);
        assert_eq!(events, vec![GameEvent::BlockHit { id: 9 }]);
    }

    #[test]
    fn test_reward_rises_then_activates() {
        let tuning = Tuning::default();
        let mut b = block(Some(BlockReward::Star), 1);
        let start = b.spawn_point(&tuning);
        let mut items = vec![Item::new(12, ItemKind::Star, start)];
        b.start_rising(12, start.y);

        for _ in 0..29 {
            b.update_rising(&mut items, &tuning, crate::consts::SIM_DT);
        }
        assert!(!items[0].active);
        assert!(b.rising.is_some());

        for _ in 0..2 {
            b.update_rising(&mut items, &tuning, crate::consts::SIM_DT);
        }
        assert!(items[0].active);
        assert!(b.rising.is_none());
        assert!((items[0].body.position().y - (start.y + TILE_SIZE)).abs() < 1e-3);
    }

    #[test]
    fn test_rising_reward_gone_is_dropped() {
        let tuning = Tuning::default();
        let mut b = block(Some(BlockReward::Mushroom), 1);
        b.start_rising(40, 0.0);
        b.update_rising(&mut [], &tuning, 0.1);
        assert!(b.rising.is_none());
    }

    #[test]
    fn test_coin_popup_expires() {
        let mut p = CoinPopup::new(3, Vec2::new(0.0, 100.0), 0.5);
        p.update(0.25);
        assert!(!p.is_finished());
        assert!(p.position.y > 100.0);
        p.update(0.3);
        assert!(p.is_finished());
    }
}
