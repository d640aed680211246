mod ambient;
mod context;
mod correlator;
mod span;

pub use ambient::{AmbientContext, ContextChange, FlowBranch, FlowGuard};
pub use context::SpanContext;
pub use correlator::SpanCorrelator;
pub use span::{attr, Attribute, Event, Span, SpanHandle, SpanStatus, Timestamp};

use thiserror::Error;

/// Errors that can occur during tracing operations.
#[derive(Debug, Error)]
pub enum TraceError {
    /// An operation was attempted on a span that has already been closed.
    #[error("span has already been closed")]
    SpanAlreadyClosed,

    /// `end()` was called on a span that was already ended. Ending a span
    /// twice is a logic error in the underlying tracer, so callers that may
    /// race should use [`SpanHandle::end_if_live`] instead.
    #[error("span {span_id} has already been ended")]
    SpanAlreadyEnded { span_id: u64 },
}
