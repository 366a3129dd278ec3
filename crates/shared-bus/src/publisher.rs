//! # Event Publisher
//!
//! Publishing side of the feed.

use crate::events::{DomainEvent, EventFilter};
use crate::recent::RecentEvents;
use crate::subscriber::{EventStream, EventSubscriber, Subscription};
use crate::{DEFAULT_CHANNEL_CAPACITY, DEFAULT_RECENT_CAPACITY};
use parking_lot::Mutex;
use tokio::sync::broadcast;
use tracing::debug;

/// Outcome of a publish.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Published {
    /// Sequence stamped on the event.
    pub sequence: u64,
    /// Live subscribers the event was handed to.
    pub receivers: usize,
}

/// Publishing interface used by the engine facade.
///
/// Publishing is synchronous: the facade calls it while still holding the
/// pool lock so sequence order matches commit order.
pub trait EventPublisher: Send + Sync {
    /// Stamp, record and fan out an event.
    fn publish(&self, event: DomainEvent) -> Published;

    /// Total events published so far.
    fn events_published(&self) -> u64;
}

struct FeedState {
    next_sequence: u64,
    recent: RecentEvents,
}

/// In-process event bus.
///
/// `tokio::sync::broadcast` gives multi-consumer fan-out; a small ring keeps
/// the latest entries for observers that poll instead of subscribing.
pub struct InMemoryEventBus {
    sender: broadcast::Sender<DomainEvent>,
    state: Mutex<FeedState>,
    capacity: usize,
}

impl InMemoryEventBus {
    #[must_use]
    pub fn new() -> Self {
        Self::with_capacity(DEFAULT_CHANNEL_CAPACITY, DEFAULT_RECENT_CAPACITY)
    }

    /// `channel_capacity` must be non-zero.
    #[must_use]
    pub fn with_capacity(channel_capacity: usize, recent_capacity: usize) -> Self {
        let (sender, _) = broadcast::channel(channel_capacity.max(1));
        Self {
            sender,
            state: Mutex::new(FeedState {
                next_sequence: 1,
                recent: RecentEvents::new(recent_capacity),
            }),
            capacity: channel_capacity.max(1),
        }
    }

    /// The latest events, newest first.
    pub fn recent(&self) -> Vec<DomainEvent> {
        self.state.lock().recent.snapshot()
    }

    #[must_use]
    pub fn subscriber_count(&self) -> usize {
        self.sender.receiver_count()
    }

    #[must_use]
    pub fn capacity(&self) -> usize {
        self.capacity
    }
}

impl Default for InMemoryEventBus {
    fn default() -> Self {
        Self::new()
    }
}

impl EventPublisher for InMemoryEventBus {
    fn publish(&self, mut event: DomainEvent) -> Published {
        let mut state = self.state.lock();
        event.sequence = state.next_sequence;
        state.next_sequence += 1;
        state.recent.push(event.clone());

        let sequence = event.sequence;
        let kind = event.kind;
        // Err only means nobody is listening; the ring still has it.
        let receivers = self.sender.send(event).unwrap_or(0);
        debug!(sequence, kind = %kind, receivers, "Event published");

        Published {
            sequence,
            receivers,
        }
    }

    fn events_published(&self) -> u64 {
        self.state.lock().next_sequence - 1
    }
}

impl EventSubscriber for InMemoryEventBus {
    fn subscribe(&self, filter: EventFilter) -> Subscription {
        debug!(kinds = ?filter.kinds, account = ?filter.account, "New subscription created");
        Subscription::new(self.sender.subscribe(), filter)
    }

    fn event_stream(&self, filter: EventFilter) -> EventStream {
        EventStream::new(self.sender.subscribe(), filter)
    }
}
