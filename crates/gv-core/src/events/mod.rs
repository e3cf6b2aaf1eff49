use std::sync::Arc;
use parking_lot::Mutex;
use ahash::AHashMap;

/// Store-wide event bus
pub struct EventBus {
    handlers: Arc<Mutex<AHashMap<std::any::TypeId, Vec<Box<dyn EventHandler>>>>>,
}

/// Event trait that all events must implement
pub trait Event: Send + Sync + 'static {
    fn as_any(&self) -> &dyn std::any::Any;
}

/// Handler trait for event handlers
pub trait EventHandler: Send + Sync {
    fn handle(&mut self, event: &dyn Event);
}

/// Events published by the state store
pub mod events {
    use super::Event;
    use crate::config::StoreField;

    /// Raw text was replaced and a reparse was requested
    #[derive(Debug, Clone)]
    pub struct ContentChanged {
        pub generation: u64,
        pub text_len: usize,
    }

    /// A dataset became current, from a parse or a wholesale replacement
    #[derive(Debug, Clone)]
    pub struct DatasetCommitted {
        pub generation: u64,
        pub row_count: usize,
        pub column_count: usize,
    }

    /// A parse failed; the previous dataset stays current
    #[derive(Debug, Clone)]
    pub struct ParseRejected {
        pub generation: u64,
        pub error: String,
    }

    /// A parse finished after newer content was requested and was discarded
    #[derive(Debug, Clone)]
    pub struct ParseSuperseded {
        pub generation: u64,
        pub latest: u64,
    }

    /// A single store field was assigned
    #[derive(Debug, Clone)]
    pub struct FieldChanged {
        pub field: StoreField,
    }

    macro_rules! impl_event {
        ($($t:ty),*) => {
            $(
                impl Event for $t {
                    fn as_any(&self) -> &dyn std::any::Any {
                        self
                    }
                }
            )*
        }
    }

    impl_event!(
        ContentChanged,
        DatasetCommitted,
        ParseRejected,
        ParseSuperseded,
        FieldChanged
    );
}

impl EventBus {
    /// Create a new event bus
    pub fn new() -> Self {
        Self {
            handlers: Arc::new(Mutex::new(AHashMap::new())),
        }
    }

    /// Subscribe to events of a specific type
    pub fn subscribe<E: Event>(&self, handler: Box<dyn EventHandler>) {
        let type_id = std::any::TypeId::of::<E>();
        let mut handlers = self.handlers.lock();
        handlers.entry(type_id).or_insert_with(Vec::new).push(handler);
    }

    /// Publish an event
    ///
    /// Handlers run without the bus lock held, so they may publish or
    /// subscribe themselves. An event of the same type published from inside
    /// one of its own handlers is not delivered to that handler set again.
    pub fn publish<E: Event>(&self, event: E) {
        let type_id = std::any::TypeId::of::<E>();
        let taken = self.handlers.lock().get_mut(&type_id).map(std::mem::take);

        let Some(mut event_handlers) = taken else {
            return;
        };
        for handler in event_handlers.iter_mut() {
            handler.handle(&event);
        }

        // Put the handlers back ahead of any subscribed while dispatching
        let mut handlers = self.handlers.lock();
        let slot = handlers.entry(type_id).or_default();
        let added = std::mem::replace(slot, event_handlers);
        slot.extend(added);
    }
}

impl Default for EventBus {
    fn default() -> Self {
        Self::new()
    }
}

/// Adapter turning a closure into an [`EventHandler`]
pub struct ClosureEventHandler<F> {
    handler: F,
}

impl<F> EventHandler for ClosureEventHandler<F>
where
    F: FnMut(&dyn Event) + Send + Sync,
{
    fn handle(&mut self, event: &dyn Event) {
        (self.handler)(event);
    }
}

/// Create an event handler from a closure
pub fn handler_from_fn<F>(f: F) -> Box<dyn EventHandler>
where
    F: FnMut(&dyn Event) + Send + Sync + 'static,
{
    Box::new(ClosureEventHandler { handler: f })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    #[test]
    fn test_publish_reaches_matching_subscribers_only() {
        let bus = EventBus::new();
        let committed = Arc::new(AtomicUsize::new(0));

        let counter = committed.clone();
        bus.subscribe::<events::DatasetCommitted>(handler_from_fn(move |event| {
            if let Some(e) = event.as_any().downcast_ref::<events::DatasetCommitted>() {
                counter.fetch_add(e.row_count, Ordering::SeqCst);
            }
        }));

        bus.publish(events::DatasetCommitted { generation: 1, row_count: 3, column_count: 2 });
        bus.publish(events::ParseRejected { generation: 2, error: "bad row".to_string() });

        assert_eq!(committed.load(Ordering::SeqCst), 3);
    }

    #[test]
    fn test_handlers_may_reenter_the_bus() {
        let bus = Arc::new(EventBus::new());
        let rejected = Arc::new(AtomicUsize::new(0));

        let inner = bus.clone();
        let counter = rejected.clone();
        bus.subscribe::<events::DatasetCommitted>(handler_from_fn(move |_| {
            inner.publish(events::ParseRejected { generation: 0, error: "nested".to_string() });
            let counter = counter.clone();
            inner.subscribe::<events::DatasetCommitted>(handler_from_fn(move |_| {
                counter.fetch_add(100, Ordering::SeqCst);
            }));
        }));
        let counter = rejected.clone();
        bus.subscribe::<events::ParseRejected>(handler_from_fn(move |_| {
            counter.fetch_add(1, Ordering::SeqCst);
        }));

        bus.publish(events::DatasetCommitted { generation: 1, row_count: 1, column_count: 1 });
        assert_eq!(rejected.load(Ordering::SeqCst), 1);

        // The handler added during dispatch runs from the next publish on
        bus.publish(events::DatasetCommitted { generation: 2, row_count: 1, column_count: 1 });
        assert_eq!(rejected.load(Ordering::SeqCst), 102);
    }
}
