//! Fixed timestep simulation tick
//!
//! Core game loop that advances simulation deterministically. One tick runs
//! detect, ground sense, contact dispatch, entity updates, integration,
//! culling and cleanup, then flushes the tick's events.

use glam::Vec2;
use serde::{Deserialize, Serialize};

use super::block::{HitOutcome, QuestionBlock};
use super::collision::{Contact, Group};
use super::enemy::Enemy;
use super::event::GameEvent;
use super::item::Item;
use super::player::Player;
use super::sensor::GroundSensor;
use super::state::{EntityId, GameState, SpawnRequest, TickContext, two_mut};
use crate::consts::TILE_SIZE;
use crate::session::FlowPhase;
use crate::sign_or;

/// Input commands for a single tick (deterministic)
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TickInput {
    pub move_left: bool,
    pub move_right: bool,
    /// Jump key went down (or is still down) this tick
    pub jump_pressed: bool,
    /// Jump key went up this tick
    pub jump_released: bool,
}

/// Advance the game state by one fixed timestep
///
/// Returns the events raised during the tick, after listeners have seen them.
pub fn tick(state: &mut GameState, input: &TickInput, dt: f32) -> Vec<GameEvent> {
    if !state.session.is_running() {
        return state.events.flush();
    }
    state.time_ticks += 1;

    // Contacts reflect positions at the start of the tick
    let colliders = state.dynamic_colliders();
    let contacts = state.world.refresh(&colliders).to_vec();

    sense_ground(state);

    let mut spawns = Vec::new();
    {
        let mut ctx = TickContext {
            tuning: &state.tuning,
            session: &mut state.session,
            events: &mut state.events,
            dt,
            tick: state.time_ticks,
        };

        for contact in &contacts {
            dispatch_contact(
                contact,
                &mut state.player,
                &mut state.enemies,
                &mut state.items,
                &mut state.blocks,
                &mut spawns,
                &mut ctx,
            );
        }

        state.player.update_timers(dt);
        if state.player.alive {
            state.player.apply_input(input, &mut ctx);
        } else {
            state.player.update_death(&mut ctx);
        }

        for enemy in &mut state.enemies {
            enemy.update(&mut ctx);
        }
        for item in &mut state.items {
            item.update(&mut ctx);
        }
        for block in &mut state.blocks {
            block.update_rising(&mut state.items, ctx.tuning, dt);
        }
        for popup in &mut state.popups {
            popup.update(dt);
        }

        if ctx.session.tick_clock(dt) {
            log::info!("Time up");
            state.player.die(&mut ctx);
        }
    }

    integrate(state, dt);

    state.cull_out_of_bounds();
    if state.player.alive && state.player.body.aabb.bottom() < -state.tuning.cull_margin {
        log::debug!("player fell out of the level");
        let mut ctx = TickContext {
            tuning: &state.tuning,
            session: &mut state.session,
            events: &mut state.events,
            dt,
            tick: state.time_ticks,
        };
        state.player.die(&mut ctx);
    }

    state.remove_destroyed();
    state.apply_spawns(spawns);

    state.events.flush()
}

fn sense_ground(state: &mut GameState) {
    let sensor = GroundSensor::from_tuning(&state.tuning);
    let world = &state.world;

    if state.player.alive && sensor.sense(&mut state.player.body, world) {
        state.player.on_landed();
    }
    for enemy in state.enemies.iter_mut().filter(|e| e.alive) {
        sensor.sense(&mut enemy.body, world);
    }
    for item in state.items.iter_mut().filter(|i| i.active && !i.destroyed) {
        sensor.sense(&mut item.body, world);
    }
}

fn integrate(state: &mut GameState, dt: f32) {
    let world = &state.world;

    if state.player.alive {
        let body = &mut state.player.body;
        body.integrate(dt, world);

        // Level edges are hard walls for the player
        let half = body.aabb.half.x;
        let max_x = (state.level.world_width() - half).max(half);
        body.aabb.center.x = body.aabb.center.x.clamp(half, max_x);
    }
    for enemy in state.enemies.iter_mut().filter(|e| e.alive) {
        enemy.body.integrate(dt, world);
    }
    for item in state.items.iter_mut().filter(|i| i.active && !i.destroyed) {
        item.body.integrate(dt, world);
    }
}

/// Lower rank dispatches as `a`
fn dispatch_rank(group: Group) -> u8 {
    match group {
        Group::Player => 0,
        Group::Enemy => 1,
        Group::Item => 2,
        _ => 3,
    }
}

fn enemy_slot(enemies: &[Enemy], id: EntityId) -> Option<usize> {
    enemies.binary_search_by_key(&id, |e| e.id).ok()
}

fn item_slot(items: &[Item], id: EntityId) -> Option<usize> {
    items.binary_search_by_key(&id, |i| i.id).ok()
}

fn block_slot(blocks: &[QuestionBlock], id: EntityId) -> Option<usize> {
    blocks.binary_search_by_key(&id, |b| b.id).ok()
}

fn dispatch_contact(
    contact: &Contact,
    player: &mut Player,
    enemies: &mut [Enemy],
    items: &mut [Item],
    blocks: &mut [QuestionBlock],
    spawns: &mut Vec<SpawnRequest>,
    ctx: &mut TickContext,
) {
    let c = if dispatch_rank(contact.group_b) < dispatch_rank(contact.group_a) {
        contact.flipped()
    } else {
        *contact
    };

    match (c.group_a, c.group_b) {
        (Group::Player, Group::Enemy) => {
            if let Some(i) = enemy_slot(enemies, c.b) {
                player_vs_enemy(player, &mut enemies[i], &c, ctx);
            }
        }
        (Group::Player, Group::Item) => {
            if let Some(i) = item_slot(items, c.b) {
                items[i].collect(player, ctx);
            }
        }
        (Group::Player, Group::QuestionBlock) => {
            player_vs_block(player, blocks, &c, spawns, ctx);
        }
        (Group::Player, Group::EndFlag) => reach_flag(player, ctx),
        (Group::Enemy, Group::Enemy) => enemy_vs_enemy(enemies, &c, ctx),
        (Group::Enemy, other) if other.is_solid() => {
            if let Some(i) = enemy_slot(enemies, c.a) {
                let normal = c.normal_toward(c.a);
                enemies[i].on_side_contact(normal, ctx.tuning);
            }
        }
        (Group::Item, other) if other.is_solid() => {
            if let Some(i) = item_slot(items, c.a) {
                let normal = c.normal_toward(c.a);
                items[i].on_wall(normal, ctx.tuning);
            }
        }
        // Player against ground and bricks is resolved by integration
        _ => {}
    }
}

fn player_vs_enemy(player: &mut Player, enemy: &mut Enemy, c: &Contact, ctx: &mut TickContext) {
    if !player.alive || !enemy.alive {
        return;
    }
    let t = ctx.tuning;
    let n = c.normal_toward(player.id);
    let from_above = n.y > t.axis_threshold || player.body.vel.y < 0.0;

    if enemy.is_idle_shell() {
        if enemy.kick_cooldown > 0.0 {
            return;
        }
        let dir = sign_or(enemy.body.position().x - player.body.position().x, player.facing.sign());
        enemy.kick(dir, ctx);
        if from_above {
            player.bounce(t);
        }
    } else if enemy.is_moving_shell() {
        if enemy.kick_cooldown > 0.0 {
            return;
        }
        if from_above {
            enemy.stop_shell(ctx);
            player.bounce(t);
        } else {
            player.hurt(ctx);
        }
    } else if from_above {
        enemy.take_stomp(ctx);
        player.bounce(t);
    } else {
        player.hurt(ctx);
    }
}

fn player_vs_block(
    player: &Player,
    blocks: &mut [QuestionBlock],
    c: &Contact,
    spawns: &mut Vec<SpawnRequest>,
    ctx: &mut TickContext,
) {
    // Only a head bump while moving up counts
    let n = c.normal_toward(player.id);
    if !player.alive || n.y >= -ctx.tuning.axis_threshold || player.body.impact_vel.y <= 0.0 {
        return;
    }
    let Some(i) = block_slot(blocks, c.b) else {
        return;
    };
    match blocks[i].hit(ctx) {
        HitOutcome::Coin => spawns.push(SpawnRequest::CoinPopup {
            at: blocks[i].aabb.center + Vec2::new(0.0, TILE_SIZE / 2.0),
        }),
        HitOutcome::Spawn(kind) => spawns.push(SpawnRequest::BlockReward { block: i, kind }),
        HitOutcome::Ignored | HitOutcome::Empty => {}
    }
}

fn reach_flag(player: &mut Player, ctx: &mut TickContext) {
    if !player.alive || player.reached_flag || ctx.session.phase != FlowPhase::Playing {
        return;
    }
    player.reached_flag = true;
    player.body.vel = Vec2::ZERO;

    let bonus = ctx.session.time_bonus(ctx.tuning);
    ctx.award(bonus);
    ctx.session.phase = FlowPhase::LevelCleared;
    log::info!("Level cleared, time bonus {bonus}");
    ctx.emit(GameEvent::LevelCleared);
}

fn enemy_vs_enemy(enemies: &mut [Enemy], c: &Contact, ctx: &mut TickContext) {
    let (Some(ia), Some(ib)) = (enemy_slot(enemies, c.a), enemy_slot(enemies, c.b)) else {
        return;
    };
    let Some((ea, eb)) = two_mut(enemies, ia, ib) else {
        return;
    };
    if !ea.alive || !eb.alive {
        return;
    }

    let t = ctx.tuning;
    match (ea.is_moving_shell(), eb.is_moving_shell()) {
        (true, true) => {
            let score_a = ea.next_chain_score(t);
            let score_b = eb.next_chain_score(t);
            eb.die(ctx, score_a);
            ea.die(ctx, score_b);
        }
        (true, false) => {
            let score = ea.next_chain_score(t);
            eb.die(ctx, score);
        }
        (false, true) => {
            let score = eb.next_chain_score(t);
            ea.die(ctx, score);
        }
        (false, false) => {
            ea.on_side_contact(c.normal_toward(ea.id), t);
            eb.on_side_contact(c.normal_toward(eb.id), t);
        }
    }
}
