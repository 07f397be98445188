//! Request-scoped structured logging.
//!
//! A [`StructuredLogger`] stamps every event with its request id, route, and
//! the time since the request started, then hands it to `tracing`. Which
//! subscriber (if any) receives it is up to the host process.

use std::time::{Duration, Instant};

use serde_json::{Map, Value};

use crate::request::RequestId;

/// Severity of a log event.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum Severity {
    Debug,
    Info,
    Warn,
    Error,
}

/// Per-request logger. Cheap to clone into background tasks.
#[derive(Debug, Clone)]
pub struct StructuredLogger {
    request_id: RequestId,
    route: Option<String>,
    started: Instant,
}

impl StructuredLogger {
    pub fn new(request_id: RequestId) -> Self {
        Self {
            request_id,
            route: None,
            started: Instant::now(),
        }
    }

    /// Tag events with the operation being served.
    pub fn with_route(mut self, route: impl Into<String>) -> Self {
        self.route = Some(route.into());
        self
    }

    pub fn request_id(&self) -> &RequestId {
        &self.request_id
    }

    pub fn route(&self) -> Option<&str> {
        self.route.as_deref()
    }

    /// Emit a warning with no extra fields.
    pub fn warn(&self, message: &str) {
        self.warn_builder(message).emit();
    }

    pub fn debug_builder(&self, message: impl Into<String>) -> LogBuilder<'_> {
        LogBuilder::new(self, Severity::Debug, message)
    }

    pub fn info_builder(&self, message: impl Into<String>) -> LogBuilder<'_> {
        LogBuilder::new(self, Severity::Info, message)
    }

    pub fn warn_builder(&self, message: impl Into<String>) -> LogBuilder<'_> {
        LogBuilder::new(self, Severity::Warn, message)
    }

    pub fn error_builder(&self, message: impl Into<String>) -> LogBuilder<'_> {
        LogBuilder::new(self, Severity::Error, message)
    }

    fn elapsed_us(&self) -> u64 {
        u64::try_from(self.started.elapsed().as_micros()).unwrap_or(u64::MAX)
    }
}

/// One pending event. Nothing is logged until [`emit`](Self::emit).
#[must_use = "a log event does nothing until emitted"]
pub struct LogBuilder<'a> {
    logger: &'a StructuredLogger,
    severity: Severity,
    message: String,
    fields: Map<String, Value>,
}

macro_rules! dispatch {
    ($level:ident, $builder:expr, $fields:expr) => {
        tracing::$level!(
            request_id = %$builder.logger.request_id,
            route = $builder.logger.route().unwrap_or("-"),
            elapsed_us = $builder.logger.elapsed_us(),
            fields = %$fields,
            "{}",
            $builder.message
        )
    };
}

impl<'a> LogBuilder<'a> {
    fn new(logger: &'a StructuredLogger, severity: Severity, message: impl Into<String>) -> Self {
        Self {
            logger,
            severity,
            message: message.into(),
            fields: Map::new(),
        }
    }

    pub fn field(mut self, key: &str, value: impl Into<String>) -> Self {
        self.fields.insert(key.to_string(), Value::String(value.into()));
        self
    }

    pub fn field_i64(mut self, key: &str, value: i64) -> Self {
        self.fields.insert(key.to_string(), Value::from(value));
        self
    }

    pub fn field_bool(mut self, key: &str, value: bool) -> Self {
        self.fields.insert(key.to_string(), Value::Bool(value));
        self
    }

    /// Record a duration in whole milliseconds.
    pub fn duration_ms(self, key: &str, duration: Duration) -> Self {
        let millis = i64::try_from(duration.as_millis()).unwrap_or(i64::MAX);
        self.field_i64(key, millis)
    }

    pub fn severity(&self) -> Severity {
        self.severity
    }

    /// Fields collected so far, as a JSON object.
    pub fn fields(&self) -> &Map<String, Value> {
        &self.fields
    }

    pub fn emit(self) {
        let fields = Value::Object(self.fields.clone());
        match self.severity {
            Severity::Debug => dispatch!(debug, self, fields),
            Severity::Info => dispatch!(info, self, fields),
            Severity::Warn => dispatch!(warn, self, fields),
            Severity::Error => dispatch!(error, self, fields),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn logger() -> StructuredLogger {
        StructuredLogger::new(RequestId::from_string("req-42")).with_route("search")
    }

    #[test]
    fn test_builder_collects_typed_fields() {
        let logger = logger();
        let event = logger
            .info_builder("search completed")
            .field_i64("total", 3)
            .field("query", "shirt")
            .field_bool("text_scored", false)
            .duration_ms("duration_ms", Duration::from_micros(2_500));

        assert_eq!(event.severity(), Severity::Info);
        let fields = event.fields();
        assert_eq!(fields["total"], 3);
        assert_eq!(fields["query"], "shirt");
        assert_eq!(fields["text_scored"], false);
        assert_eq!(fields["duration_ms"], 2);
    }

    #[test]
    fn test_context_is_carried() {
        let logger = logger();
        assert_eq!(logger.request_id().as_str(), "req-42");
        assert_eq!(logger.route(), Some("search"));
        assert_eq!(logger.clone().route(), Some("search"));
    }

    #[test]
    fn test_later_field_overwrites_earlier() {
        let logger = logger();
        let event = logger.warn_builder("retry").field_i64("n", 1).field_i64("n", 2);
        assert_eq!(event.fields()["n"], 2);
        assert_eq!(event.fields().len(), 1);
    }

    #[test]
    fn test_emit_without_subscriber_is_harmless() {
        let logger = logger();
        logger.warn("analytics skipped");
        logger.debug_builder("normalized").emit();
        logger.error_builder("search failed").field("detail", "timeout").emit();
    }
}
