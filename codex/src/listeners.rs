//! Synchronous event fan-out.
//!
//! Listeners are called in subscription order, on the emitting thread,
//! with no buffering.

use std::fmt;

/// Handle returned by [`Listeners::subscribe`].
pub type ListenerId = u64;

type Callback<E> = Box<dyn Fn(&E) + Send + Sync>;

/// A set of event listeners.
pub struct Listeners<E> {
    next_id: ListenerId,
    entries: Vec<(ListenerId, Callback<E>)>,
}

impl<E> Listeners<E> {
    /// Create an empty listener set.
    pub fn new() -> Self {
        Self {
            next_id: 1,
            entries: Vec::new(),
        }
    }

    /// Register a listener.
    pub fn subscribe<F>(&mut self, listener: F) -> ListenerId
    where
        F: Fn(&E) + Send + Sync + 'static,
    {
        let id = self.next_id;
        self.next_id += 1;
        self.entries.push((id, Box::new(listener)));
        id
    }

    /// Remove a listener. Returns false if it was not registered.
    pub fn unsubscribe(&mut self, id: ListenerId) -> bool {
        let before = self.entries.len();
        self.entries.retain(|(entry_id, _)| *entry_id != id);
        self.entries.len() != before
    }

    /// Deliver an event to every listener.
    pub fn emit(&self, event: &E) {
        for (_, listener) in &self.entries {
            listener(event);
        }
    }

    /// Number of registered listeners.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether no listener is registered.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl<E> Default for Listeners<E> {
    fn default() -> Self {
        Self::new()
    }
}

impl<E> fmt::Debug for Listeners<E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Listeners")
            .field("count", &self.entries.len())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    #[test]
    fn test_subscribe_emit_unsubscribe() {
        let mut listeners: Listeners<u32> = Listeners::new();
        let total = Arc::new(AtomicUsize::new(0));

        let sink = total.clone();
        let id = listeners.subscribe(move |value| {
            sink.fetch_add(*value as usize, Ordering::SeqCst);
        });

        listeners.emit(&3);
        listeners.emit(&4);
        assert_eq!(total.load(Ordering::SeqCst), 7);

        assert!(listeners.unsubscribe(id));
        assert!(!listeners.unsubscribe(id));
        listeners.emit(&10);
        assert_eq!(total.load(Ordering::SeqCst), 7);
        assert!(listeners.is_empty());
    }
}
