//! Subscription registry for client lifecycle events.

use parking_lot::Mutex;
use tracing::warn;

use crate::events::{ClientEvent, EventCategory};

/// Error a handler may return. Failures are logged, never propagated.
pub type HandlerError = Box<dyn std::error::Error + Send + Sync>;

type Handler = Box<dyn FnMut(&ClientEvent) -> Result<(), HandlerError> + Send>;

/// Identifier for one registration, returned by `on` and accepted by `off`.
///
/// Registering the same closure logic twice yields two ids and two
/// invocations per event; there is no deduplication.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct HandlerId(u64);

struct Entry {
    id: HandlerId,
    // Taken while the handler runs so the registry lock is not held across
    // the call. If off() removes the entry in the meantime, the handler is
    // dropped on return instead of being reinstated.
    handler: Option<Handler>,
}

#[derive(Default)]
struct Registry {
    next_id: u64,
    lists: [Vec<Entry>; EventCategory::COUNT],
}

/// Dispatches client events to registered handlers.
///
/// Handlers for a category run synchronously, in registration order, on the
/// task that detected the transport event. A failing handler is logged and
/// does not stop the remaining handlers in the same dispatch. `on` and `off`
/// are safe at any time, including from inside a handler; a handler
/// registered during a dispatch first fires on the next event.
pub(crate) struct EventBus {
    registry: Mutex<Registry>,
}

impl EventBus {
    pub(crate) fn new() -> Self {
        Self {
            registry: Mutex::new(Registry::default()),
        }
    }

    /// Append `handler` to the ordered list for `category`.
    pub(crate) fn on<F>(&self, category: EventCategory, handler: F) -> HandlerId
    where
        F: FnMut(&ClientEvent) -> Result<(), HandlerError> + Send + 'static,
    {
        let mut registry = self.registry.lock();
        registry.next_id += 1;
        let id = HandlerId(registry.next_id);
        registry.lists[category.index()].push(Entry {
            id,
            handler: Some(Box::new(handler)),
        });
        id
    }

    /// Remove the registration `id` from `category`.
    ///
    /// Returns false if no such registration exists.
    pub(crate) fn off(&self, category: EventCategory, id: HandlerId) -> bool {
        let mut registry = self.registry.lock();
        let list = &mut registry.lists[category.index()];
        match list.iter().position(|entry| entry.id == id) {
            Some(pos) => {
                list.remove(pos);
                true
            }
            None => false,
        }
    }

    /// Dispatch `event` to every handler of its category, in order.
    pub(crate) fn emit(&self, event: &ClientEvent) {
        let slot = event.category().index();

        // Snapshot the registrations up front: handlers added during this
        // dispatch fire on the next event, not this one.
        let ids: Vec<HandlerId> = {
            let registry = self.registry.lock();
            registry.lists[slot].iter().map(|entry| entry.id).collect()
        };

        for id in ids {
            let taken = {
                let mut registry = self.registry.lock();
                registry.lists[slot]
                    .iter_mut()
                    .find(|entry| entry.id == id)
                    .and_then(|entry| entry.handler.take())
            };
            let Some(mut handler) = taken else { continue };

            if let Err(error) = handler(event) {
                warn!(category = ?event.category(), %error, "event handler failed");
            }

            let mut registry = self.registry.lock();
            if let Some(entry) = registry.lists[slot].iter_mut().find(|entry| entry.id == id) {
                entry.handler = Some(handler);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;
    use std::sync::atomic::{AtomicUsize, Ordering};

    use super::*;
    use crate::error::ClientError;

    fn counting_handler(
        counter: &Arc<AtomicUsize>,
    ) -> impl FnMut(&ClientEvent) -> Result<(), HandlerError> + Send + 'static {
        let counter = Arc::clone(counter);
        move |_| {
            counter.fetch_add(1, Ordering::SeqCst);
            Ok(())
        }
    }

    #[test]
    fn test_dispatch_in_registration_order() {
        let bus = EventBus::new();
        let order = Arc::new(Mutex::new(Vec::new()));

        for name in ["first", "second", "third"] {
            let order = Arc::clone(&order);
            bus.on(EventCategory::Message, move |_| {
                order.lock().push(name);
                Ok(())
            });
        }

        bus.emit(&ClientEvent::Message(Arc::new(Default::default())));
        assert_eq!(*order.lock(), vec!["first", "second", "third"]);
    }

    #[test]
    fn test_duplicate_registration_fires_twice() {
        let bus = EventBus::new();
        let counter = Arc::new(AtomicUsize::new(0));
        bus.on(EventCategory::Connect, counting_handler(&counter));
        bus.on(EventCategory::Connect, counting_handler(&counter));

        bus.emit(&ClientEvent::Connected);
        assert_eq!(counter.load(Ordering::SeqCst), 2);
    }

    #[test]
    fn test_off_removes_registration() {
        let bus = EventBus::new();
        let first = Arc::new(AtomicUsize::new(0));
        let second = Arc::new(AtomicUsize::new(0));

        let first_id = bus.on(EventCategory::Disconnect, counting_handler(&first));
        bus.on(EventCategory::Disconnect, counting_handler(&second));

        assert!(bus.off(EventCategory::Disconnect, first_id));
        bus.emit(&ClientEvent::Disconnected);

        assert_eq!(first.load(Ordering::SeqCst), 0);
        assert_eq!(second.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_off_unknown_id_is_noop() {
        let bus = EventBus::new();
        let id = bus.on(EventCategory::Error, |_| Ok(()));
        assert!(!bus.off(EventCategory::Connect, id));
        assert!(bus.off(EventCategory::Error, id));
        assert!(!bus.off(EventCategory::Error, id));
    }

    #[test]
    fn test_failing_handler_does_not_stop_dispatch() {
        let bus = EventBus::new();
        let after = Arc::new(AtomicUsize::new(0));

        bus.on(EventCategory::Error, |_| Err("boom".into()));
        bus.on(EventCategory::Error, counting_handler(&after));

        bus.emit(&ClientEvent::Error(ClientError::NotConnected));
        assert_eq!(after.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_emit_with_no_handlers_is_noop() {
        let bus = EventBus::new();
        bus.emit(&ClientEvent::Connected);
    }

    #[test]
    fn test_handler_can_deregister_itself() {
        let bus = Arc::new(EventBus::new());
        let counter = Arc::new(AtomicUsize::new(0));

        let slot: Arc<Mutex<Option<HandlerId>>> = Arc::new(Mutex::new(None));
        let id = {
            let bus = Arc::clone(&bus);
            let slot = Arc::clone(&slot);
            let counter = Arc::clone(&counter);
            bus.clone().on(EventCategory::Message, move |_| {
                counter.fetch_add(1, Ordering::SeqCst);
                if let Some(id) = *slot.lock() {
                    bus.off(EventCategory::Message, id);
                }
                Ok(())
            })
        };
        *slot.lock() = Some(id);

        let event = ClientEvent::Message(Arc::new(Default::default()));
        bus.emit(&event);
        bus.emit(&event);

        // Ran once, removed itself, never ran again.
        assert_eq!(counter.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_handler_registered_during_dispatch_fires_next_event() {
        let bus = Arc::new(EventBus::new());
        let late = Arc::new(AtomicUsize::new(0));

        {
            let bus = Arc::clone(&bus);
            let late = Arc::clone(&late);
            let registered = Arc::new(AtomicUsize::new(0));
            bus.clone().on(EventCategory::Connect, move |_| {
                if registered.fetch_add(1, Ordering::SeqCst) == 0 {
                    bus.on(EventCategory::Connect, counting_handler(&late));
                }
                Ok(())
            });
        }

        bus.emit(&ClientEvent::Connected);
        assert_eq!(late.load(Ordering::SeqCst), 0);

        bus.emit(&ClientEvent::Connected);
        assert_eq!(late.load(Ordering::SeqCst), 1);
    }
}
