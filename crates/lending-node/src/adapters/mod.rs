//! # Adapters
//!
//! Storage backends and the metrics bridge for the engine.

pub mod observer;
pub mod storage;

pub use observer::MetricsObserver;
pub use storage::open_store;
