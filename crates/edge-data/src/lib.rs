//! Data access layer with dependency tagging and timeouts.
//!
//! This crate provides:
//! - `StoreClient` - Document store access with a bounded timeout on every call
//! - `DependencyTag` - Semantic dependency categories
//! - `TimeoutConfig` - Per-dependency timeouts

mod client;
mod dependency;
mod timeout;

pub use client::*;
pub use dependency::*;
pub use timeout::*;
