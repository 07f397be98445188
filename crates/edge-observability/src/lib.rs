//! Observability infrastructure for the storefront services.
//!
//! This crate provides:
//! - `RequestId` - Unique request identifier for log correlation
//! - `StructuredLogger` / `LogBuilder` - Structured events with request
//!   context, emitted through `tracing`

mod logging;
mod request;

pub use logging::*;
pub use request::*;
