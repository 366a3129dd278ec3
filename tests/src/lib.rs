//! # Pool-Lend Test Suite
//!
//! ## Structure
//!
//! ```text
//! tests/src/
//! ├── fixtures.rs       # Engines on a manual clock, named accounts
//! └── integration/
//!     ├── scenarios.rs    # Full loan lifecycles through the public API
//!     ├── concurrency.rs  # Many threads against one engine
//!     ├── persistence.rs  # Restart over the file store and the node container
//!     ├── event_feed.rs   # Subscriptions, filtering, recent events
//!     └── properties.rs   # proptest laws over random operation sequences
//! ```
//!
//! ## Running Tests
//!
//! ```bash
//! cargo test -p pl-tests
//! cargo test -p pl-tests integration::concurrency
//! cargo bench -p pl-tests
//! ```

pub mod fixtures;
pub mod integration;
