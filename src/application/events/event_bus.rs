//! Event bus for broadcasting reservation events to subscribers
//!
//! Publishing never blocks: a slow subscriber lags and skips messages
//! rather than stalling the engine.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use tokio::sync::broadcast;
use tracing::{debug, info, warn};

use crate::domain::events::{Event, EventMessage};

const DEFAULT_CAPACITY: usize = 1024;

#[derive(Clone)]
pub struct EventBus {
    sender: broadcast::Sender<EventMessage>,
    subscriber_count: Arc<AtomicUsize>,
}

impl EventBus {
    pub fn new() -> Self {
        Self::with_capacity(DEFAULT_CAPACITY)
    }

    pub fn with_capacity(capacity: usize) -> Self {
        let (sender, _) = broadcast::channel(capacity);
        Self {
            sender,
            subscriber_count: Arc::new(AtomicUsize::new(0)),
        }
    }

    pub fn publish(&self, event: Event) {
        let message = EventMessage::new(event);
        let event_type = message.event.event_type();
        let booking_id = message.event.booking_id();

        match self.sender.send(message) {
            Ok(count) => {
                debug!(event_type, ?booking_id, subscribers = count, "Event published");
            }
            Err(_) => {
                debug!(event_type, ?booking_id, "Event published (no subscribers)");
            }
        }
    }

    pub fn publish_all(&self, events: impl IntoIterator<Item = Event>) {
        for event in events {
            self.publish(event);
        }
    }

    pub fn subscribe(&self) -> EventSubscriber {
        let receiver = self.sender.subscribe();
        let count = self.subscriber_count.fetch_add(1, Ordering::SeqCst) + 1;
        info!(total = count, "New event subscriber");

        EventSubscriber {
            receiver,
            subscriber_count: self.subscriber_count.clone(),
        }
    }

    pub fn subscriber_count(&self) -> usize {
        self.subscriber_count.load(Ordering::SeqCst)
    }
}

impl Default for EventBus {
    fn default() -> Self {
        Self::new()
    }
}

pub struct EventSubscriber {
    receiver: broadcast::Receiver<EventMessage>,
    subscriber_count: Arc<AtomicUsize>,
}

impl EventSubscriber {
    pub async fn recv(&mut self) -> Option<EventMessage> {
        loop {
            match self.receiver.recv().await {
                Ok(msg) => return Some(msg),
                Err(broadcast::error::RecvError::Lagged(count)) => {
                    warn!(missed = count, "Subscriber lagged");
                    continue;
                }
                Err(broadcast::error::RecvError::Closed) => return None,
            }
        }
    }

    /// Non-blocking receive; `None` when nothing is queued.
    pub fn try_recv(&mut self) -> Option<EventMessage> {
        loop {
            match self.receiver.try_recv() {
                Ok(msg) => return Some(msg),
                Err(broadcast::error::TryRecvError::Lagged(count)) => {
                    warn!(missed = count, "Subscriber lagged");
                    continue;
                }
                Err(_) => return None,
            }
        }
    }

    /// Everything currently queued, in publication order
    pub fn drain(&mut self) -> Vec<EventMessage> {
        std::iter::from_fn(|| self.try_recv()).collect()
    }
}

impl Drop for EventSubscriber {
    fn drop(&mut self) {
        let prev = self.subscriber_count.fetch_sub(1, Ordering::SeqCst);
        debug!(remaining = prev.saturating_sub(1), "Event subscriber dropped");
    }
}

pub type SharedEventBus = Arc<EventBus>;

pub fn create_event_bus() -> SharedEventBus {
    Arc::new(EventBus::new())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::events::SlotStatusChangedEvent;
    use crate::domain::slot::SlotStatus;

    fn status_event(slot: &str) -> Event {
        Event::SlotStatusChanged(SlotStatusChangedEvent {
            slot_id: slot.into(),
            previous: SlotStatus::Available,
            current: SlotStatus::Reserved,
        })
    }

    #[tokio::test]
    async fn subscriber_receives_in_order() {
        let bus = EventBus::new();
        let mut sub = bus.subscribe();
        bus.publish(status_event("S1"));
        bus.publish(status_event("S2"));

        let first = sub.recv().await.unwrap();
        let second = sub.recv().await.unwrap();
        assert_eq!(first.event.slot_id(), "S1");
        assert_eq!(second.event.slot_id(), "S2");
    }

    #[test]
    fn publish_without_subscribers_is_fine() {
        let bus = EventBus::new();
        bus.publish(status_event("S1"));
        assert_eq!(bus.subscriber_count(), 0);
    }

    #[test]
    fn subscriber_count_tracks_drops() {
        let bus = EventBus::new();
        let a = bus.subscribe();
        let b = bus.subscribe();
        assert_eq!(bus.subscriber_count(), 2);
        drop(a);
        assert_eq!(bus.subscriber_count(), 1);
        drop(b);
        assert_eq!(bus.subscriber_count(), 0);
    }

    #[test]
    fn drain_collects_queued_messages() {
        let bus = EventBus::new();
        let mut sub = bus.subscribe();
        bus.publish_all([status_event("S1"), status_event("S2")]);
        let drained = sub.drain();
        assert_eq!(drained.len(), 2);
        assert!(sub.drain().is_empty());
    }
}
