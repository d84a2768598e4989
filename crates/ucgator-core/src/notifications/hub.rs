//! In-process fan-out of notification events.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex};

use super::NotificationEvent;
use crate::util::lock;

pub type NotificationHandler = Arc<dyn Fn(&NotificationEvent) + Send + Sync>;

/// Registration handle returned by [`NotificationHub::register_callback`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct HandlerId(u64);

/// Event emitter owned by the composition root and shared by reference.
#[derive(Default)]
pub struct NotificationHub {
    handlers: Mutex<Vec<(HandlerId, NotificationHandler)>>,
    next_id: AtomicU64,
}

impl NotificationHub {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register_callback(
        &self,
        handler: impl Fn(&NotificationEvent) + Send + Sync + 'static,
    ) -> HandlerId {
        let id = HandlerId(self.next_id.fetch_add(1, Ordering::Relaxed));
        lock(&self.handlers).push((id, Arc::new(handler)));
        id
    }

    /// Detach a handler. Returns `false` if it was already detached.
    pub fn unregister_callback(&self, id: HandlerId) -> bool {
        let mut handlers = lock(&self.handlers);
        let before = handlers.len();
        handlers.retain(|(handler_id, _)| *handler_id != id);
        handlers.len() != before
    }

    pub fn handler_count(&self) -> usize {
        lock(&self.handlers).len()
    }

    /// Deliver `event` to every registered handler in registration order.
    ///
    /// Handlers run outside the registry lock, so they may register or
    /// unregister handlers themselves.
    pub fn emit(&self, event: &NotificationEvent) {
        let handlers: Vec<NotificationHandler> = lock(&self.handlers)
            .iter()
            .map(|(_, handler)| Arc::clone(handler))
            .collect();
        tracing::debug!(event = event.name(), handlers = handlers.len(), "Emitting notification event");
        for handler in handlers {
            handler(event);
        }
    }

    /// Emit a raw push payload, dropping it if it is not a known event.
    pub fn emit_raw(&self, payload: &serde_json::Value) {
        if let Some(event) = NotificationEvent::from_value(payload) {
            self.emit(&event);
        }
    }
}

impl std::fmt::Debug for NotificationHub {
    fn fmt(&self, formatter: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        formatter
            .debug_struct("NotificationHub")
            .field("handlers", &self.handler_count())
            .finish()
    }
}
