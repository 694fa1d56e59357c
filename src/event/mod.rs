//! Event system for async state updates.
//!
//! The client publishes connection changes and every decoded state update
//! through an [`EventDispatcher`]. Observers (dashboards, home automation
//! glue) subscribe and receive a copy of each event.

use std::sync::Arc;

use bytes::Bytes;
use tokio::sync::broadcast;

use crate::protocol::MessageKind;
use crate::types::BikeState;

/// Event types that can be dispatched.
#[derive(Debug, Clone)]
pub enum Event {
    /// Connection established and startup requests sent.
    Connected,
    /// Session torn down.
    Disconnected,
    /// Bike not reachable; the next poll will retry.
    ConnectionPending { reason: String },
    /// A frame arrived and was classified.
    FrameReceived { kind: MessageKind, data: Bytes },
    /// The bike state changed after a frame was decoded.
    StateUpdated(Box<BikeState>),
    /// VIN or protocol version became known or changed.
    Identified {
        vin: Option<String>,
        protocol_version: Option<String>,
    },
}

/// Discriminant of an [`Event`], used for filtering.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EventType {
    /// [`Event::Connected`].
    Connected,
    /// [`Event::Disconnected`].
    Disconnected,
    /// [`Event::ConnectionPending`].
    ConnectionPending,
    /// [`Event::FrameReceived`].
    FrameReceived,
    /// [`Event::StateUpdated`].
    StateUpdated,
    /// [`Event::Identified`].
    Identified,
}

impl Event {
    /// Returns the event's type.
    #[must_use]
    pub const fn event_type(&self) -> EventType {
        match self {
            Self::Connected => EventType::Connected,
            Self::Disconnected => EventType::Disconnected,
            Self::ConnectionPending { .. } => EventType::ConnectionPending,
            Self::FrameReceived { .. } => EventType::FrameReceived,
            Self::StateUpdated(_) => EventType::StateUpdated,
            Self::Identified { .. } => EventType::Identified,
        }
    }
}

/// A subscription to events.
pub struct Subscription {
    receiver: broadcast::Receiver<Event>,
}

impl Subscription {
    /// Receives the next event.
    ///
    /// Lagged events are skipped. Returns `None` once the dispatcher is gone.
    pub async fn recv(&mut self) -> Option<Event> {
        loop {
            match self.receiver.recv().await {
                Ok(event) => return Some(event),
                Err(broadcast::error::RecvError::Lagged(skipped)) => {
                    tracing::debug!("subscription lagged, skipped {skipped} events");
                }
                Err(broadcast::error::RecvError::Closed) => return None,
            }
        }
    }
}

/// Subscription filter for specific event types.
#[derive(Debug, Clone, Default)]
pub struct EventFilter {
    /// Filter by event types.
    pub event_types: Option<Vec<EventType>>,
    /// Filter received frames by message kind.
    pub message_kinds: Option<Vec<MessageKind>>,
}

impl EventFilter {
    /// Creates a filter for specific event types.
    #[must_use]
    pub const fn event_types(types: Vec<EventType>) -> Self {
        Self {
            event_types: Some(types),
            message_kinds: None,
        }
    }

    /// Creates a filter for received frames of the given kinds.
    #[must_use]
    pub fn frames(kinds: Vec<MessageKind>) -> Self {
        Self {
            event_types: Some(vec![EventType::FrameReceived]),
            message_kinds: Some(kinds),
        }
    }

    /// Checks if an event matches this filter.
    #[must_use]
    pub fn matches(&self, event: &Event) -> bool {
        if let Some(ref types) = self.event_types {
            if !types.contains(&event.event_type()) {
                return false;
            }
        }

        if let Some(ref kinds) = self.message_kinds {
            match event {
                Event::FrameReceived { kind, .. } if kinds.contains(kind) => {}
                _ => return false,
            }
        }

        true
    }
}

struct EventDispatcherInner {
    sender: broadcast::Sender<Event>,
}

/// Dispatches events to subscribers.
#[derive(Clone)]
pub struct EventDispatcher {
    inner: Arc<EventDispatcherInner>,
}

impl EventDispatcher {
    /// Creates a new event dispatcher.
    #[must_use]
    pub fn new(capacity: usize) -> Self {
        let (sender, _) = broadcast::channel(capacity);
        let inner = Arc::new(EventDispatcherInner { sender });
        Self { inner }
    }

    /// Dispatches an event to all subscribers.
    pub fn dispatch(&self, event: Event) {
        // No receivers is fine
        let _ = self.inner.sender.send(event);
    }

    /// Subscribes to all events.
    #[must_use]
    pub fn subscribe(&self) -> Subscription {
        let receiver = self.inner.sender.subscribe();
        Subscription { receiver }
    }

    /// Waits for an event matching the filter with timeout.
    ///
    /// Returns `None` if the timeout expires or the channel is closed.
    pub async fn wait_for(
        &self,
        filter: EventFilter,
        timeout: std::time::Duration,
    ) -> Option<Event> {
        let mut subscription = self.subscribe();

        tokio::select! {
            biased;
            result = async {
                loop {
                    if let Some(event) = subscription.recv().await {
                        if filter.matches(&event) {
                            return Some(event);
                        }
                    } else {
                        return None;
                    }
                }
            } => result,
            () = tokio::time::sleep(timeout) => None,
        }
    }
}
