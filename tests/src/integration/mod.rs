//! Cross-crate tests through the public engine API.

pub mod concurrency;
pub mod event_feed;
pub mod persistence;
pub mod properties;
pub mod scenarios;
