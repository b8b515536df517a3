//! Notifications published to the rendering layer

use crate::media::MediaItem;
use crate::view::ViewMode;

/// Fixed notification topics
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Topic {
    CatalogReplaced,
    ModeChanged,
    Advanced,
    Error,
    NoMedia,
}

#[derive(Debug, Clone, PartialEq)]
pub enum GalleryEvent {
    /// The current folder's listing was (re)loaded
    CatalogReplaced { folder: String, items: Vec<MediaItem> },
    /// View mode transition, with the displayed item when there is one
    ModeChanged {
        mode: ViewMode,
        index: Option<usize>,
        item: Option<MediaItem>,
    },
    /// A different item is now on screen
    Advanced { index: usize, total: usize, item: MediaItem },
    Error { message: String },
    /// Slideshow requested but the folder has no images
    NoMedia { folder: String },
}

impl GalleryEvent {
    pub fn topic(&self) -> Topic {
        match self {
            GalleryEvent::CatalogReplaced { .. } => Topic::CatalogReplaced,
            GalleryEvent::ModeChanged { .. } => Topic::ModeChanged,
            GalleryEvent::Advanced { .. } => Topic::Advanced,
            GalleryEvent::Error { .. } => Topic::Error,
            GalleryEvent::NoMedia { .. } => Topic::NoMedia,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SubscriptionId(u64);

type Callback = Box<dyn Fn(&GalleryEvent) + Send + Sync>;

struct Subscriber {
    id: SubscriptionId,
    /// `None` receives every topic
    topic: Option<Topic>,
    callback: Callback,
}

/// Synchronous publish/subscribe over [`Topic`]s
#[derive(Default)]
pub struct EventBus {
    next_id: u64,
    subscribers: Vec<Subscriber>,
}

impl EventBus {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn subscribe<F>(&mut self, topic: Topic, callback: F) -> SubscriptionId
    where
        F: Fn(&GalleryEvent) + Send + Sync + 'static,
    {
        self.add(Some(topic), Box::new(callback))
    }

    pub fn subscribe_all<F>(&mut self, callback: F) -> SubscriptionId
    where
        F: Fn(&GalleryEvent) + Send + Sync + 'static,
    {
        self.add(None, Box::new(callback))
    }

    fn add(&mut self, topic: Option<Topic>, callback: Callback) -> SubscriptionId {
        self.next_id += 1;
        let id = SubscriptionId(self.next_id);
        self.subscribers.push(Subscriber { id, topic, callback });
        id
    }

    pub fn unsubscribe(&mut self, id: SubscriptionId) -> bool {
        let before = self.subscribers.len();
        self.subscribers.retain(|s| s.id != id);
        self.subscribers.len() != before
    }

    /// Deliver to matching subscribers in subscription order
    pub fn publish(&self, event: GalleryEvent) {
        let topic = event.topic();
        for subscriber in &self.subscribers {
            if subscriber.topic.map_or(true, |t| t == topic) {
                (subscriber.callback)(&event);
            }
        }
    }

    pub fn subscriber_count(&self) -> usize {
        self.subscribers.len()
    }
}

impl std::fmt::Debug for EventBus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EventBus")
            .field("subscribers", &self.subscribers.len())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::{Arc, Mutex};

    #[test]
    fn test_topic_filtering() {
        let mut bus = EventBus::new();
        let errors = Arc::new(Mutex::new(Vec::new()));
        let all = Arc::new(Mutex::new(0));

        let sink = errors.clone();
        bus.subscribe(Topic::Error, move |event| {
            if let GalleryEvent::Error { message } = event {
                sink.lock().unwrap().push(message.clone());
            }
        });
        let counter = all.clone();
        bus.subscribe_all(move |_| *counter.lock().unwrap() += 1);

        bus.publish(GalleryEvent::NoMedia { folder: String::new() });
        bus.publish(GalleryEvent::Error { message: "boom".into() });

        assert_eq!(*errors.lock().unwrap(), vec!["boom".to_string()]);
        assert_eq!(*all.lock().unwrap(), 2);
    }

    #[test]
    fn test_unsubscribe() {
        let mut bus = EventBus::new();
        let hits = Arc::new(Mutex::new(0));
        let counter = hits.clone();
        let id = bus.subscribe(Topic::NoMedia, move |_| *counter.lock().unwrap() += 1);

        assert!(bus.unsubscribe(id));
        assert!(!bus.unsubscribe(id));
        bus.publish(GalleryEvent::NoMedia { folder: String::new() });
        assert_eq!(*hits.lock().unwrap(), 0);
        assert_eq!(bus.subscriber_count(), 0);
    }
}
