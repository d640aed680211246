pub mod config;
pub mod observer;
pub mod trace;

pub mod prelude {
    pub use crate::config::{self, ConfigError};
    pub use crate::observer::{
        DiagnosticDispatcher, DiagnosticEvent, DiagnosticObserver, DiagnosticPayload,
        IngressObserver, RequestFilter,
    };
    pub use crate::trace::{
        AmbientContext, ContextChange, FlowBranch, FlowGuard, Span, SpanContext, SpanCorrelator,
        SpanHandle, SpanStatus, TraceError,
    };
}
