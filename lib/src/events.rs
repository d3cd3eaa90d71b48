//! Session-keyed publish/subscribe of store mutations.
//!
//! Front ends subscribe once per client session and receive every committed
//! change, e.g. a favicon written by the enrichment pool long after the request
//! that created the bookmark has returned.

use serde::Serialize;
use std::collections::HashMap;
use std::sync::mpsc::{sync_channel, Receiver, SyncSender, TrySendError};
use std::sync::{Mutex, MutexGuard};

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum StoreEvent {
    FolderCreated { id: usize, parent_id: Option<usize> },
    FolderRenamed { id: usize },
    FolderMoved { id: usize, from: Option<usize>, to: Option<usize> },
    FolderDeleted { id: usize },
    BookmarkCreated { id: usize, folder_id: Option<usize> },
    BookmarkUpdated { id: usize },
    BookmarkMoved { id: usize, from: Option<usize>, to: Option<usize> },
    BookmarkStarred { id: usize, starred: bool },
    BookmarkDeleted { id: usize },
    FaviconUpdated { id: usize },
}

/// A live subscription; events arrive on `events` until the session is dropped
pub struct Subscription {
    pub session_id: String,
    pub events: Receiver<StoreEvent>,
}

/// Events a session may leave unread before it is dropped
pub const DEFAULT_EVENT_BUFFER: usize = 1024;

pub struct EventBus {
    subscribers: Mutex<HashMap<String, SyncSender<StoreEvent>>>,
    buffer: usize,
}

impl Default for EventBus {
    fn default() -> Self {
        Self::with_buffer(DEFAULT_EVENT_BUFFER)
    }
}

impl EventBus {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_buffer(buffer: usize) -> Self {
        Self {
            subscribers: Mutex::new(HashMap::new()),
            buffer: buffer.max(1),
        }
    }

    fn subscribers(&self) -> MutexGuard<'_, HashMap<String, SyncSender<StoreEvent>>> {
        self.subscribers
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    /// Open a subscription under a freshly generated session id
    pub fn subscribe(&self) -> Subscription {
        let session_id = uuid::Uuid::new_v4().to_string();
        let events = self.subscribe_as(&session_id);
        Subscription { session_id, events }
    }

    /// Open (or replace) the subscription of a known session
    pub fn subscribe_as(&self, session_id: &str) -> Receiver<StoreEvent> {
        let (tx, rx) = sync_channel(self.buffer);
        if self
            .subscribers()
            .insert(session_id.to_string(), tx)
            .is_some()
        {
            log::debug!("Replaced event subscription for session {}", session_id);
        }
        rx
    }

    pub fn unsubscribe(&self, session_id: &str) -> bool {
        self.subscribers().remove(session_id).is_some()
    }

    pub fn subscriber_count(&self) -> usize {
        self.subscribers().len()
    }

    /// Deliver an event to every session without blocking. Sessions whose
    /// receiver is gone, or whose buffer is full, are forgotten.
    pub fn publish(&self, event: StoreEvent) {
        let mut subscribers = self.subscribers();
        if subscribers.is_empty() {
            return;
        }
        subscribers.retain(|session_id, tx| match tx.try_send(event.clone()) {
            Ok(()) => true,
            Err(TrySendError::Full(_)) => {
                log::warn!("Dropping session {}: {} events left unread", session_id, self.buffer);
                false
            }
            Err(TrySendError::Disconnected(_)) => {
                log::debug!("Dropping disconnected session {}", session_id);
                false
            }
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_publish_reaches_all_sessions() {
        let bus = EventBus::new();
        let a = bus.subscribe();
        let b = bus.subscribe();
        assert_ne!(a.session_id, b.session_id);

        bus.publish(StoreEvent::FolderCreated {
            id: 1,
            parent_id: None,
        });

        assert_eq!(
            a.events.try_recv().unwrap(),
            StoreEvent::FolderCreated {
                id: 1,
                parent_id: None
            }
        );
        assert!(b.events.try_recv().is_ok());
    }

    #[test]
    fn test_disconnected_session_is_dropped() {
        let bus = EventBus::new();
        let kept = bus.subscribe();
        {
            let _gone = bus.subscribe();
        }
        assert_eq!(bus.subscriber_count(), 2);

        bus.publish(StoreEvent::BookmarkDeleted { id: 4 });

        assert_eq!(bus.subscriber_count(), 1);
        assert_eq!(
            kept.events.try_recv().unwrap(),
            StoreEvent::BookmarkDeleted { id: 4 }
        );
    }

    #[test]
    fn test_session_that_never_reads_is_dropped() {
        let bus = EventBus::with_buffer(2);
        let idle = bus.subscribe();
        for id in 0..2 {
            bus.publish(StoreEvent::FolderDeleted { id });
        }
        assert_eq!(bus.subscriber_count(), 1);

        bus.publish(StoreEvent::FolderDeleted { id: 2 });

        assert_eq!(bus.subscriber_count(), 0);
        let received: Vec<StoreEvent> = idle.events.try_iter().collect();
        assert_eq!(
            received,
            vec![
                StoreEvent::FolderDeleted { id: 0 },
                StoreEvent::FolderDeleted { id: 1 },
            ]
        );
    }

    #[test]
    fn test_subscribe_as_replaces_previous_channel() {
        let bus = EventBus::new();
        let old = bus.subscribe_as("session-1");
        let new = bus.subscribe_as("session-1");
        assert_eq!(bus.subscriber_count(), 1);

        bus.publish(StoreEvent::FaviconUpdated { id: 2 });

        assert!(old.try_recv().is_err());
        assert_eq!(new.try_recv().unwrap(), StoreEvent::FaviconUpdated { id: 2 });
        assert!(bus.unsubscribe("session-1"));
        assert!(!bus.unsubscribe("session-1"));
    }

    #[test]
    fn test_event_serialization() {
        let json = serde_json::to_string(&StoreEvent::FolderMoved {
            id: 3,
            from: Some(1),
            to: None,
        })
        .unwrap();
        assert_eq!(json, r#"{"kind":"folder_moved","id":3,"from":1,"to":null}"#);
    }
}
