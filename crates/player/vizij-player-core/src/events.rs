//! Typed notification bus and the events the player publishes.

use std::cell::{Cell, RefCell};
use std::fmt;
use std::rc::Rc;

use serde::{Deserialize, Serialize};

use crate::state::PlaybackState;

/// Lifecycle notifications published by the player.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[non_exhaustive]
pub enum PlayerEvent {
    /// Every state transition, including repeated ones.
    StateChanged {
        new: PlaybackState,
        old: PlaybackState,
    },
    Playing,
    Loading,
    /// First frame processed after a `play()`.
    FirstFrameRendered,
    /// A load finished, successfully or not.
    AssetsLoaded,
}

impl PlayerEvent {
    /// Stable event name used on the wire and in logs.
    #[inline]
    pub fn name(&self) -> &'static str {
        match self {
            Self::StateChanged { .. } => "player:stateChanged",
            Self::Playing => "player:playing",
            Self::Loading => "player:loading",
            Self::FirstFrameRendered => "player:firstFramePlayed",
            Self::AssetsLoaded => "assetsLoaded",
        }
    }
}

#[derive(Copy, Clone, Debug, Eq, PartialEq, Hash, Serialize, Deserialize)]
pub struct SubscriptionId(pub u64);

type Listener<E> = Rc<dyn Fn(&E)>;

/// Single-threaded publish/subscribe bus.
///
/// Listeners run in subscription order. A publish reaches exactly the
/// listeners registered when it started, so listeners may subscribe or
/// unsubscribe from inside a callback.
pub struct EventBus<E> {
    listeners: RefCell<Vec<(SubscriptionId, Listener<E>)>>,
    next_id: Cell<u64>,
}

impl<E> EventBus<E> {
    pub fn new() -> Self {
        Self {
            listeners: RefCell::new(Vec::new()),
            next_id: Cell::new(0),
        }
    }

    pub fn subscribe(&self, listener: impl Fn(&E) + 'static) -> SubscriptionId {
        let id = SubscriptionId(self.next_id.get());
        self.next_id.set(self.next_id.get().wrapping_add(1));
        self.listeners.borrow_mut().push((id, Rc::new(listener)));
        id
    }

    /// Returns false if `id` was not subscribed.
    pub fn unsubscribe(&self, id: SubscriptionId) -> bool {
        let mut listeners = self.listeners.borrow_mut();
        let before = listeners.len();
        listeners.retain(|(sid, _)| *sid != id);
        listeners.len() != before
    }

    pub fn publish(&self, event: &E) {
        let snapshot: Vec<Listener<E>> = self
            .listeners
            .borrow()
            .iter()
            .map(|(_, l)| Rc::clone(l))
            .collect();
        for listener in snapshot {
            listener(event);
        }
    }

    #[inline]
    pub fn listener_count(&self) -> usize {
        self.listeners.borrow().len()
    }
}

impl<E> Default for EventBus<E> {
    fn default() -> Self {
        Self::new()
    }
}

impl<E> fmt::Debug for EventBus<E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EventBus")
            .field("listeners", &self.listener_count())
            .finish()
    }
}
