//! In-process event publishing.
//!
//! Replaces the implicit "revalidate" side effect of write operations with an
//! explicit named event that any number of subscribers can observe.

use contracts::shared::events::AppEvent;
use std::sync::Arc;
use tokio::sync::broadcast;

/// Channel capacity for broadcast.
const CHANNEL_CAPACITY: usize = 1024;

pub trait EventPublisher: Send + Sync {
    fn publish(&self, event: AppEvent);

    fn subscribe(&self) -> broadcast::Receiver<AppEvent>;
}

pub type SharedPublisher = Arc<dyn EventPublisher>;

/// Publisher over a tokio broadcast channel.
///
/// Publishing with no subscribers is not an error; the event is dropped.
#[derive(Clone)]
pub struct BroadcastPublisher {
    sender: broadcast::Sender<AppEvent>,
}

impl BroadcastPublisher {
    pub fn new() -> Self {
        let (sender, _) = broadcast::channel(CHANNEL_CAPACITY);
        Self { sender }
    }

    pub fn shared() -> SharedPublisher {
        Arc::new(Self::new())
    }
}

impl Default for BroadcastPublisher {
    fn default() -> Self {
        Self::new()
    }
}

impl EventPublisher for BroadcastPublisher {
    fn publish(&self, event: AppEvent) {
        tracing::debug!(event = event.name(), "Publishing event");
        let _ = self.sender.send(event);
    }

    fn subscribe(&self) -> broadcast::Receiver<AppEvent> {
        self.sender.subscribe()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_every_subscriber_receives_event() {
        let publisher = BroadcastPublisher::new();
        let mut rx1 = publisher.subscribe();
        let mut rx2 = publisher.subscribe();

        publisher.publish(AppEvent::OrdersChanged);

        assert_eq!(rx1.recv().await.unwrap(), AppEvent::OrdersChanged);
        assert_eq!(rx2.recv().await.unwrap(), AppEvent::OrdersChanged);
    }

    #[test]
    fn test_publish_without_subscribers_is_noop() {
        let publisher = BroadcastPublisher::new();
        publisher.publish(AppEvent::OrdersChanged);
    }
}
