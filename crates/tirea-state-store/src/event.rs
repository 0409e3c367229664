//! Controller contract and the in-process event bus.
//!
//! The store does not own its controller. It registers handlers through
//! [`Controller::on`] and publishes `flush` through the [`Emitter`] it is
//! handed while a handler runs. Dispatch is synchronous: `emit` returns only
//! after every handler for the event has run.

use crate::error::StoreResult;
use crate::DirtyPaths;
use serde_json::Value;
use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;
use tracing::{trace, warn};

/// Event names understood by the store.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum EventKind {
    /// The controller finished a unit of work; the store answers with `Flush`.
    Change,
    /// Restore the initial state.
    Reset,
    /// Travel to a recorded point.
    Seek,
    /// Paths dirtied since the previous flush.
    Flush,
}

impl EventKind {
    pub fn name(&self) -> &'static str {
        match self {
            EventKind::Change => "change",
            EventKind::Reset => "reset",
            EventKind::Seek => "seek",
            EventKind::Flush => "flush",
        }
    }
}

impl fmt::Display for EventKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// An event with its payload.
#[derive(Clone, Debug, PartialEq)]
pub enum StoreEvent {
    Change,
    Reset,
    /// `recording` is the raw object from the history store; see
    /// [`Recording`](crate::Recording).
    Seek { recording: Value },
    Flush(DirtyPaths),
}

impl StoreEvent {
    pub fn seek(recording: Value) -> Self {
        StoreEvent::Seek { recording }
    }

    pub fn kind(&self) -> EventKind {
        match self {
            StoreEvent::Change => EventKind::Change,
            StoreEvent::Reset => EventKind::Reset,
            StoreEvent::Seek { .. } => EventKind::Seek,
            StoreEvent::Flush(_) => EventKind::Flush,
        }
    }
}

/// Publishing half of a controller.
pub trait Emitter {
    /// Run every handler registered for `event.kind()`, in registration
    /// order. The first handler error stops dispatch and is returned.
    fn emit(&self, event: &StoreEvent) -> StoreResult<()>;
}

/// Event callback. Receives the emitter so it can publish follow-up events.
pub type Handler = Arc<dyn Fn(&StoreEvent, &dyn Emitter) -> StoreResult<()> + Send + Sync>;

/// Subscription half of a controller.
pub trait Controller: Emitter {
    fn on(&mut self, kind: EventKind, handler: Handler);
}

/// Synchronous in-process controller.
///
/// ```
/// use tirea_state_store::{Controller, Emitter, EventBus, EventKind, StoreEvent};
/// use std::sync::{Arc, Mutex};
///
/// let seen = Arc::new(Mutex::new(0));
/// let mut bus = EventBus::new();
/// let counter = Arc::clone(&seen);
/// bus.subscribe(EventKind::Reset, move |_event, _bus| {
///     *counter.lock().unwrap() += 1;
///     Ok(())
/// });
///
/// bus.emit(&StoreEvent::Reset).unwrap();
/// assert_eq!(*seen.lock().unwrap(), 1);
/// ```
#[derive(Clone, Default)]
pub struct EventBus {
    handlers: HashMap<EventKind, Vec<Handler>>,
}

impl EventBus {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a closure without wrapping it in an `Arc` first.
    pub fn subscribe<F>(&mut self, kind: EventKind, handler: F)
    where
        F: Fn(&StoreEvent, &dyn Emitter) -> StoreResult<()> + Send + Sync + 'static,
    {
        self.on(kind, Arc::new(handler));
    }

    pub fn handler_count(&self, kind: EventKind) -> usize {
        self.handlers.get(&kind).map_or(0, Vec::len)
    }
}

impl Emitter for EventBus {
    fn emit(&self, event: &StoreEvent) -> StoreResult<()> {
        let kind = event.kind();
        let Some(handlers) = self.handlers.get(&kind) else {
            trace!(event = %kind, "no handlers registered");
            return Ok(());
        };

        trace!(event = %kind, handlers = handlers.len(), "dispatching event");
        for handler in handlers {
            if let Err(err) = handler(event, self) {
                warn!(event = %kind, error = %err, "event handler failed");
                return Err(err);
            }
        }
        Ok(())
    }
}

impl Controller for EventBus {
    fn on(&mut self, kind: EventKind, handler: Handler) {
        self.handlers.entry(kind).or_default().push(handler);
    }
}

impl fmt::Debug for EventBus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let counts: HashMap<&'static str, usize> = self
            .handlers
            .iter()
            .map(|(kind, handlers)| (kind.name(), handlers.len()))
            .collect();
        f.debug_struct("EventBus").field("handlers", &counts).finish()
    }
}
