//! In-process notification bus for metadata writes
//!
//! Observers that cache decoded metadata subscribe here and drop their
//! caches when a write lands. Events carry no payload: a subscriber that
//! cares about a particular entry re-reads it.

use std::sync::Arc;

use parking_lot::Mutex;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MetadataEvent {
    /// A metadata document was written successfully
    Updated,
}

/// Fan-out publisher that can be cloned and shared across tasks
#[derive(Debug, Clone, Default)]
pub struct MetadataEvents {
    subscribers: Arc<Mutex<Vec<flume::Sender<MetadataEvent>>>>,
}

impl MetadataEvents {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a new observer
    ///
    /// Events published after this call are delivered to the returned
    /// receiver; dropping it unsubscribes.
    pub fn subscribe(&self) -> flume::Receiver<MetadataEvent> {
        let (tx, rx) = flume::unbounded();
        self.subscribers.lock().push(tx);
        rx
    }

    /// Deliver `event` to every live subscriber
    pub fn publish(&self, event: MetadataEvent) {
        let mut subscribers = self.subscribers.lock();
        subscribers.retain(|tx| tx.send(event).is_ok());
        tracing::debug!(
            "published {:?} to {} subscribers",
            event,
            subscribers.len()
        );
    }

    pub fn subscriber_count(&self) -> usize {
        self.subscribers.lock().len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_every_subscriber_receives_event() {
        let events = MetadataEvents::new();
        let a = events.subscribe();
        let b = events.subscribe();

        events.publish(MetadataEvent::Updated);

        assert_eq!(a.try_recv().unwrap(), MetadataEvent::Updated);
        assert_eq!(b.try_recv().unwrap(), MetadataEvent::Updated);
        assert!(a.try_recv().is_err());
    }

    #[test]
    fn test_dropped_subscribers_are_pruned() {
        let events = MetadataEvents::new();
        let kept = events.subscribe();
        drop(events.subscribe());
        assert_eq!(events.subscriber_count(), 2);

        events.publish(MetadataEvent::Updated);

        assert_eq!(events.subscriber_count(), 1);
        assert_eq!(kept.try_recv().unwrap(), MetadataEvent::Updated);
    }
}
