//! Local event bus
//!
//! A typed, synchronous publish/subscribe dispatcher composed into [`Arena`]
//! and [`Player`]. Callbacks are registered for one event kind and invoked in
//! registration order. A callback that returns an error is logged and skipped;
//! the remaining callbacks still run.
//!
//! [`Arena`]: crate::arena::Arena
//! [`Player`]: crate::player::Player

use std::fmt;

/// Error type returned by listeners
pub type ListenerError = Box<dyn std::error::Error + Send + Sync>;

/// Result returned by listeners
pub type ListenerResult = Result<(), ListenerError>;

/// An event that can travel over an [`EventBus`]
pub trait BusEvent {
    /// Payload-free discriminant listeners subscribe to
    type Kind: Copy + Eq + fmt::Debug;

    fn kind(&self) -> Self::Kind;
}

type Listener<E> = Box<dyn FnMut(&E) -> ListenerResult + Send>;

pub struct EventBus<E: BusEvent> {
    listeners: Vec<(E::Kind, Listener<E>)>,
}

impl<E: BusEvent> EventBus<E> {
    pub fn new() -> Self {
        Self {
            listeners: Vec::new(),
        }
    }

    /// Register `callback` for every event of `kind`
    pub fn listen<F>(&mut self, kind: E::Kind, callback: F)
    where
        F: FnMut(&E) -> ListenerResult + Send + 'static,
    {
        self.listeners.push((kind, Box::new(callback)));
    }

    /// Deliver `event` to its listeners. Returns how many succeeded.
    pub fn emit(&mut self, event: &E) -> usize {
        let kind = event.kind();
        let mut delivered = 0;
        for (listen_kind, callback) in self.listeners.iter_mut() {
            if *listen_kind != kind {
                continue;
            }
            match callback(event) {
                Ok(()) => delivered += 1,
                Err(e) => {
                    tracing::warn!(?kind, error = %e, "event listener failed");
                }
            }
        }
        delivered
    }

    /// Number of callbacks registered for `kind`
    pub fn listener_count(&self, kind: E::Kind) -> usize {
        self.listeners.iter().filter(|(k, _)| *k == kind).count()
    }
}

impl<E: BusEvent> Default for EventBus<E> {
    fn default() -> Self {
        Self::new()
    }
}

impl<E: BusEvent> fmt::Debug for EventBus<E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EventBus")
            .field("listeners", &self.listeners.len())
            .finish()
    }
}
