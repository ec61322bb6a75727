//! Outbound game events
//!
//! Entities push events into an [`EventSink`] while a tick runs; the sink is
//! flushed once at the end of the tick. Listeners observe events and must not
//! feed anything back into the simulation.

use serde::{Deserialize, Serialize};

use super::enemy::EnemyKind;
use super::item::ItemKind;
use super::player::PlayerSize;
use super::state::EntityId;

/// What kind of entity an event refers to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum EntityKind {
    Player,
    Enemy(EnemyKind),
    Item(ItemKind),
}

/// Game events emitted by the simulation
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum GameEvent {
    /// Points added to the session score
    ScoreAwarded(u32),
    /// The death script finished and a life was taken
    LifeLost,
    /// The end flag was reached
    LevelCleared,
    EntityDied { id: EntityId, kind: EntityKind },
    ItemCollected(ItemKind),
    /// The last life was lost
    GameOver,
    /// A question block was struck from below and gave its reward
    BlockHit { id: EntityId },
    PlayerJumped,
    /// Player changed size (power-up or damage)
    PlayerResized(PlayerSize),
    ShellKicked { id: EntityId },
}

/// Observer of flushed events
pub trait EventListener {
    fn on_event(&mut self, event: &GameEvent);
}

impl<F: FnMut(&GameEvent)> EventListener for F {
    fn on_event(&mut self, event: &GameEvent) {
        self(event)
    }
}

/// Ordered event queue with registered listeners
#[derive(Default)]
pub struct EventSink {
    queue: Vec<GameEvent>,
    listeners: Vec<Box<dyn EventListener>>,
    warned_unobserved: bool,
}

impl std::fmt::Debug for EventSink {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EventSink")
            .field("queue", &self.queue)
            .field("listeners", &self.listeners.len())
            .finish()
    }
}

impl EventSink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, event: GameEvent) {
        log::trace!("event: {event:?}");
        self.queue.push(event);
    }

    /// Events queued since the last flush
    pub fn pending(&self) -> &[GameEvent] {
        &self.queue
    }

    pub fn subscribe(&mut self, listener: impl EventListener + 'static) {
        self.listeners.push(Box::new(listener));
    }

    /// Deliver queued events to every listener, in order, and return them
    ///
    /// With no listener registered the events are dropped from the sink's
    /// point of view; a warning is logged the first time this happens.
    pub fn flush(&mut self) -> Vec<GameEvent> {
        let events = std::mem::take(&mut self.queue);
        if events.is_empty() {
            return events;
        }
        if self.listeners.is_empty() {
            if !self.warned_unobserved {
                log::warn!("No event listener registered; {} event(s) dropped", events.len());
                self.warned_unobserved = true;
            }
            return events;
        }
        for listener in &mut self.listeners {
            for event in &events {
                listener.on_event(event);
            }
        }
        events
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::RefCell;
    use std::rc::Rc;

    #[test]
    fn test_flush_delivers_in_order() {
        let seen = Rc::new(RefCell::new(Vec::new()));
        let mut sink = EventSink::new();
        let log = Rc::clone(&seen);
        sink.subscribe(move |e: &GameEvent| log.borrow_mut().push(e.clone()));

        sink.push(GameEvent::ScoreAwarded(100));
        sink.push(GameEvent::LifeLost);
        assert_eq!(sink.pending().len(), 2);

        let flushed = sink.flush();
        assert_eq!(flushed, vec![GameEvent::ScoreAwarded(100), GameEvent::LifeLost]);
        assert_eq!(*seen.borrow(), flushed);
        assert!(sink.pending().is_empty());
        assert!(sink.flush().is_empty());
    }

    #[test]
    fn test_flush_without_listeners_does_not_fail() {
        let mut sink = EventSink::new();
        sink.push(GameEvent::GameOver);
        assert_eq!(sink.flush(), vec![GameEvent::GameOver]);
        sink.push(GameEvent::LevelCleared);
        assert_eq!(sink.flush().len(), 1);
        assert!(sink.pending().is_empty());
    }

    struct Counter(Rc<RefCell<usize>>);

    impl EventListener for Counter {
        fn on_event(&mut self, _event: &GameEvent) {
            *self.0.borrow_mut() += 1;
        }
    }

    #[test]
    fn test_every_listener_sees_every_event() {
        let a = Rc::new(RefCell::new(0));
        let b = Rc::new(RefCell::new(0));
        let mut sink = EventSink::new();
        sink.subscribe(Counter(Rc::clone(&a)));
        sink.subscribe(Counter(Rc::clone(&b)));
        sink.push(GameEvent::PlayerJumped);
        sink.push(GameEvent::BlockHit { id: 4 });
        sink.flush();
        assert_eq!(*a.borrow(), 2);
        assert_eq!(*b.borrow(), 2);
    }
}
