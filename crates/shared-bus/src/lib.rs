//! # Shared Bus - Lending Event Feed
//!
//! Best-effort notification feed for state-changing ledger operations.
//!
//! ## Flow
//!
//! ```text
//! ┌──────────────┐   publish()   ┌──────────────┐   subscribe()   ┌──────────────┐
//! │ Engine       │ ────────────→ │  Event Bus   │ ──────────────→ │  Observers   │
//! │ Facade       │               │              │                 │ (node, UI)   │
//! └──────────────┘               └──────┬───────┘                 └──────────────┘
//!                                       │ recent()
//!                                       ▼
//!                                ┌──────────────┐
//!                                │ Recent ring  │  newest first, bounded
//!                                └──────────────┘
//! ```
//!
//! ## Guarantees
//!
//! - Every published event gets a strictly increasing `sequence`.
//! - Subscribers only see events published after they subscribed. Nothing is replayed.
//! - A slow subscriber that falls behind the channel capacity skips the
//!   overwritten events and keeps going.
//! - The feed is not an audit log. The ledger store is the source of truth.

#![allow(clippy::missing_const_for_fn)]
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]
#![cfg_attr(test, allow(clippy::panic))]

pub mod events;
pub mod publisher;
pub mod recent;
pub mod subscriber;

pub use events::{DomainEvent, EventFilter, EventKind};
pub use publisher::{EventPublisher, InMemoryEventBus, Published};
pub use recent::RecentEvents;
pub use subscriber::{EventStream, EventSubscriber, Subscription, SubscriptionError};

/// Events buffered per subscriber before the slowest one starts lagging.
pub const DEFAULT_CHANNEL_CAPACITY: usize = 1024;

/// Entries kept in the recent-events ring.
pub const DEFAULT_RECENT_CAPACITY: usize = 10;
