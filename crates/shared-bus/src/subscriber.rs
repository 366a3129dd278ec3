//! # Event Subscriber
//!
//! Subscription side of the feed: a pull handle and a `Stream` adapter.

use crate::events::{DomainEvent, EventFilter};
use std::pin::Pin;
use std::task::{Context, Poll};
use thiserror::Error;
use tokio::sync::broadcast;
use tokio_stream::wrappers::errors::BroadcastStreamRecvError;
use tokio_stream::wrappers::BroadcastStream;
use tokio_stream::Stream;
use tracing::warn;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum SubscriptionError {
    /// The event bus was dropped.
    #[error("Event bus closed")]
    Closed,
}

pub trait EventSubscriber: Send + Sync {
    /// Pull-style handle receiving events published from now on.
    fn subscribe(&self, filter: EventFilter) -> Subscription;

    /// Same as [`subscribe`](Self::subscribe) but as a `Stream`.
    fn event_stream(&self, filter: EventFilter) -> EventStream;
}

/// Receives filtered events. Dropping it unsubscribes.
pub struct Subscription {
    receiver: broadcast::Receiver<DomainEvent>,
    filter: EventFilter,
    skipped: u64,
}

impl Subscription {
    pub(crate) fn new(receiver: broadcast::Receiver<DomainEvent>, filter: EventFilter) -> Self {
        Self {
            receiver,
            filter,
            skipped: 0,
        }
    }

    /// Events dropped because this subscriber fell behind the channel.
    pub fn skipped(&self) -> u64 {
        self.skipped
    }

    /// Next matching event, or `None` once the bus is gone.
    pub async fn recv(&mut self) -> Option<DomainEvent> {
        loop {
            let event = match self.receiver.recv().await {
                Ok(e) => e,
                Err(broadcast::error::RecvError::Closed) => return None,
                Err(broadcast::error::RecvError::Lagged(skipped)) => {
                    warn!(skipped, "Subscriber lagged, events skipped");
                    self.skipped += skipped;
                    continue;
                }
            };
            if self.filter.matches(&event) {
                return Some(event);
            }
        }
    }

    /// Non-blocking variant; `Ok(None)` when nothing is queued.
    pub fn try_recv(&mut self) -> Result<Option<DomainEvent>, SubscriptionError> {
        loop {
            let event = match self.receiver.try_recv() {
                Ok(e) => e,
                Err(broadcast::error::TryRecvError::Empty) => return Ok(None),
                Err(broadcast::error::TryRecvError::Closed) => {
                    return Err(SubscriptionError::Closed)
                }
                Err(broadcast::error::TryRecvError::Lagged(skipped)) => {
                    warn!(skipped, "Subscriber lagged, events skipped");
                    self.skipped += skipped;
                    continue;
                }
            };
            if self.filter.matches(&event) {
                return Ok(Some(event));
            }
        }
    }

    #[must_use]
    pub fn filter(&self) -> &EventFilter {
        &self.filter
    }
}

/// Unbounded stream of matching events while the bus is alive.
pub struct EventStream {
    inner: BroadcastStream<DomainEvent>,
    filter: EventFilter,
}

impl EventStream {
    pub(crate) fn new(receiver: broadcast::Receiver<DomainEvent>, filter: EventFilter) -> Self {
        Self {
            inner: BroadcastStream::new(receiver),
            filter,
        }
    }

    #[must_use]
    pub fn filter(&self) -> &EventFilter {
        &self.filter
    }
}

impl Stream for EventStream {
    type Item = DomainEvent;

    fn poll_next(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
        loop {
            match Pin::new(&mut self.inner).poll_next(cx) {
                Poll::Ready(Some(Ok(event))) => {
                    if self.filter.matches(&event) {
                        return Poll::Ready(Some(event));
                    }
                }
                Poll::Ready(Some(Err(BroadcastStreamRecvError::Lagged(skipped)))) => {
                    warn!(skipped, "Event stream lagged, events skipped");
                }
                Poll::Ready(None) => return Poll::Ready(None),
                Poll::Pending => return Poll::Pending,
            }
        }
    }
}
