//! Scene-level publish/subscribe.
//!
//! Commands publish an event after every change they make so that views
//! (inspector, overview list) and the selection can react. Listeners decide
//! whether an event concerns them by handle identity, see
//! [`SceneObject::same`].

use std::sync::{Arc, Mutex, PoisonError};

use async_channel::{Receiver, Sender, unbounded};
use futures_lite::Stream;
use tracing::trace;

use canvas_common::SceneObject;

#[derive(Clone, Debug)]
pub enum SceneEvent {
    ItemCreated { item: SceneObject },
    ItemDeleted { item: SceneObject },
    ItemUpdated { item: SceneObject },
    ItemSelected { items: Vec<SceneObject> },
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum EventKind {
    ItemCreated,
    ItemDeleted,
    ItemUpdated,
    ItemSelected,
}

impl SceneEvent {
    pub fn kind(&self) -> EventKind {
        match self {
            SceneEvent::ItemCreated { .. } => EventKind::ItemCreated,
            SceneEvent::ItemDeleted { .. } => EventKind::ItemDeleted,
            SceneEvent::ItemUpdated { .. } => EventKind::ItemUpdated,
            SceneEvent::ItemSelected { .. } => EventKind::ItemSelected,
        }
    }

    /// The single object the event is about, if it is about one.
    pub fn item(&self) -> Option<&SceneObject> {
        match self {
            SceneEvent::ItemCreated { item }
            | SceneEvent::ItemDeleted { item }
            | SceneEvent::ItemUpdated { item } => Some(item),
            SceneEvent::ItemSelected { .. } => None,
        }
    }

    /// Whether the event concerns `object`.
    pub fn concerns(&self, object: &SceneObject) -> bool {
        match self {
            SceneEvent::ItemSelected { items } => items.iter().any(|item| item.same(object)),
            _ => self.item().is_some_and(|item| item.same(object)),
        }
    }
}

struct Subscriber {
    /// `None` receives every event.
    kinds: Option<Vec<EventKind>>,
    sender: Sender<SceneEvent>,
}

impl Subscriber {
    fn wants(&self, kind: EventKind) -> bool {
        self.kinds.as_ref().is_none_or(|kinds| kinds.contains(&kind))
    }
}

/// Cloneable handle to the scene's event dispatch.
#[derive(Clone, Default)]
pub struct EventBus {
    subscribers: Arc<Mutex<Vec<Subscriber>>>,
}

impl std::fmt::Debug for EventBus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EventBus")
            .field("subscribers", &self.subscriber_count())
            .finish()
    }
}

impl EventBus {
    pub fn new() -> Self {
        Self::default()
    }

    /// Delivers `event` to every live subscriber interested in its kind.
    pub fn publish(&self, event: SceneEvent) {
        let kind = event.kind();
        let mut subscribers = self
            .subscribers
            .lock()
            .unwrap_or_else(PoisonError::into_inner);
        subscribers.retain(|subscriber| !subscriber.sender.is_closed());
        trace!(
            "[EventBus] Publishing {:?} to {} subscriber(s)",
            kind,
            subscribers.len()
        );
        for subscriber in subscribers.iter().filter(|s| s.wants(kind)) {
            // unbounded, so this only fails if the receiver went away meanwhile
            let _ = subscriber.sender.try_send(event.clone());
        }
    }

    /// Subscribes to every event.
    pub fn subscribe(&self) -> EventSubscription {
        self.add_subscriber(None)
    }

    /// Subscribes to the given kinds only.
    pub fn subscribe_to(&self, kinds: &[EventKind]) -> EventSubscription {
        self.add_subscriber(Some(kinds.to_vec()))
    }

    pub fn subscriber_count(&self) -> usize {
        self.subscribers
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .iter()
            .filter(|subscriber| !subscriber.sender.is_closed())
            .count()
    }

    fn add_subscriber(&self, kinds: Option<Vec<EventKind>>) -> EventSubscription {
        let (sender, receiver) = unbounded();
        self.subscribers
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(Subscriber { kinds, sender });
        EventSubscription { receiver }
    }
}

/// Receiving end of a subscription. Dropping it unsubscribes.
#[derive(Debug)]
pub struct EventSubscription {
    receiver: Receiver<SceneEvent>,
}

impl EventSubscription {
    /// Next queued event, without waiting.
    pub fn try_next(&self) -> Option<SceneEvent> {
        self.receiver.try_recv().ok()
    }

    /// Every queued event, oldest first.
    pub fn drain(&self) -> Vec<SceneEvent> {
        std::iter::from_fn(|| self.try_next()).collect()
    }

    /// Waits for the next event. `None` once the bus is gone.
    pub async fn next(&self) -> Option<SceneEvent> {
        self.receiver.recv().await.ok()
    }

    pub fn into_stream(self) -> impl Stream<Item = SceneEvent> {
        self.receiver
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use canvas_common::Heliostat;
    use futures_lite::StreamExt;
    use futures_lite::future::block_on;

    #[test]
    fn test_filtered_subscription() {
        let bus = EventBus::new();
        let deletions = bus.subscribe_to(&[EventKind::ItemDeleted]);
        let everything = bus.subscribe();
        let item = SceneObject::from(Heliostat::default());

        bus.publish(SceneEvent::ItemCreated { item: item.clone() });
        bus.publish(SceneEvent::ItemDeleted { item: item.clone() });

        let received = deletions.drain();
        assert_eq!(received.len(), 1);
        assert!(received[0].concerns(&item));
        assert_eq!(everything.drain().len(), 2);
    }

    #[test]
    fn test_dropped_subscriptions_are_pruned() {
        let bus = EventBus::new();
        let kept = bus.subscribe();
        drop(bus.subscribe());
        assert_eq!(bus.subscriber_count(), 1);
        bus.publish(SceneEvent::ItemSelected { items: Vec::new() });
        assert!(kept.try_next().is_some());
    }

    #[test]
    fn test_next_waits_for_publish() {
        let bus = EventBus::new();
        let subscription = bus.subscribe();
        let item = SceneObject::from(Heliostat::default());
        bus.publish(SceneEvent::ItemUpdated { item: item.clone() });
        let event = block_on(subscription.next()).unwrap();
        assert_eq!(event.kind(), EventKind::ItemUpdated);
        assert!(event.item().unwrap().same(&item));
    }

    #[test]
    fn test_stream_ends_with_the_bus() {
        let bus = EventBus::new();
        let stream = bus.subscribe_to(&[EventKind::ItemCreated]).into_stream();
        bus.publish(SceneEvent::ItemCreated {
            item: SceneObject::from(Heliostat::default()),
        });
        drop(bus);
        let events: Vec<SceneEvent> = block_on(stream.collect());
        assert_eq!(events.len(), 1);
    }
}
