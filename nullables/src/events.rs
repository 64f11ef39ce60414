//! Nullable observer: records every notification it is handed.

use std::sync::{Arc, Mutex};

/// Collects events delivered to the listeners it hands out.
///
/// ```ignore
/// let recorder = EventRecorder::new();
/// node.subscribe(recorder.listener());
/// // ... drive the node ...
/// assert_eq!(recorder.events().len(), 2);
/// ```
pub struct EventRecorder<E> {
    events: Arc<Mutex<Vec<E>>>,
}

impl<E: Clone + Send + 'static> EventRecorder<E> {
    pub fn new() -> Self {
        Self {
            events: Arc::new(Mutex::new(Vec::new())),
        }
    }

    /// A listener that appends every event it receives to this recorder.
    pub fn listener(&self) -> Box<dyn Fn(&E) + Send + Sync> {
        let events = Arc::clone(&self.events);
        Box::new(move |event: &E| events.lock().unwrap().push(event.clone()))
    }

    /// Everything recorded so far, in delivery order.
    pub fn events(&self) -> Vec<E> {
        self.events.lock().unwrap().clone()
    }

    /// Return and forget everything recorded so far.
    pub fn take(&self) -> Vec<E> {
        std::mem::take(&mut *self.events.lock().unwrap())
    }

    pub fn len(&self) -> usize {
        self.events.lock().unwrap().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl<E: Clone + Send + 'static> Default for EventRecorder<E> {
    fn default() -> Self {
        Self::new()
    }
}
