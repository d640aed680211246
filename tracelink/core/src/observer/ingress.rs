use std::sync::Arc;

use tracelink_proto::prelude::{RequestStart, RequestStop, TracingOptions};

use super::filter::RequestFilter;
use super::{DiagnosticEvent, DiagnosticObserver, DiagnosticPayload};
use crate::config::ConfigError;
use crate::trace::{AmbientContext, Span, SpanContext, SpanCorrelator, SpanHandle};

pub const REQUEST_START_EVENT: &str = "ingress.request.start";
pub const REQUEST_STOP_EVENT: &str = "ingress.request.stop";
pub const CONTEXT_CHANGED_EVENT: &str = "ambient.context.changed";

/// Observer for HTTP ingress instrumentation.
///
/// Opens a root span when a non-ignored request starts, installs it as the
/// ambient context for the handling flow, ends it when the request stops,
/// and feeds externally-delivered ambient transitions to the correlator.
#[derive(Debug)]
pub struct IngressObserver {
    filter: RequestFilter,
}

impl IngressObserver {
    /// Builds the observer from tracing options. Fails fast on an invalid
    /// ignore pattern.
    pub fn new(options: &TracingOptions) -> Result<Self, ConfigError> {
        let filter = RequestFilter::new(&options.ingress_ignore_pattern)?;
        Ok(IngressObserver { filter })
    }

    fn on_request_start(&self, payload: &serde_json::Value) {
        let start: RequestStart = match serde_json::from_value(payload.clone()) {
            Ok(start) => start,
            Err(e) => {
                log::warn!("malformed {REQUEST_START_EVENT} payload, skipping: {e}");
                return;
            }
        };

        if self.filter.should_ignore(Some(&start.path)) {
            log::debug!("ignoring request {}", start.path);
            return;
        }

        let mut span = Span::new_root(format!("http {}", start.path), Some("server"));
        // add_attr only fails on an ended span.
        let _ = span.add_attr("http.path", start.path.as_str());
        if let Some(method) = &start.method {
            let _ = span.add_attr("http.method", method.as_str());
        }

        let handle = SpanHandle::new(span);
        let displaced_active = AmbientContext::get().and_then(|ctx| ctx.active().cloned());
        let context = Arc::new(SpanContext::new(Some(handle), displaced_active));
        AmbientContext::set(Some(context));
    }

    fn on_request_stop(&self, payload: &serde_json::Value) {
        let stop: RequestStop = match serde_json::from_value(payload.clone()) {
            Ok(stop) => stop,
            Err(e) => {
                log::warn!("malformed {REQUEST_STOP_EVENT} payload, skipping: {e}");
                return;
            }
        };

        let Some(context) = AmbientContext::get() else {
            log::debug!("request stop without an ambient context, nothing to end");
            return;
        };

        if let Some(active) = context.active() {
            if let Some(status) = stop.status {
                let _ = active.with_mut(|span| span.add_attr("http.status", status as i64));
            }
            if !active.end_if_live() {
                log::debug!(
                    "request span {} was already ended before the stop event",
                    active.span_id()
                );
            }
        }

        // Pop back to whatever was active before this request, if anything.
        let restored = context
            .previous()
            .map(|previous| Arc::new(SpanContext::with_active(previous.clone())));
        AmbientContext::set(restored);
    }

    fn on_ambient_change(&self, payload: &DiagnosticPayload) {
        match payload {
            DiagnosticPayload::ContextChanged(change) => {
                SpanCorrelator::on_context_changed(change);
            }
            DiagnosticPayload::Value(_) => {
                log::warn!("{CONTEXT_CHANGED_EVENT} carried a raw payload, skipping");
            }
        }
    }
}

impl DiagnosticObserver for IngressObserver {
    fn name(&self) -> &str {
        "ingress"
    }

    fn handles(&self, event_name: &str) -> bool {
        matches!(
            event_name,
            REQUEST_START_EVENT | REQUEST_STOP_EVENT | CONTEXT_CHANGED_EVENT
        )
    }

    fn on_event(&self, event: &DiagnosticEvent) {
        match (event.name.as_str(), &event.payload) {
            (REQUEST_START_EVENT, DiagnosticPayload::Value(payload)) => {
                self.on_request_start(payload)
            }
            (REQUEST_STOP_EVENT, DiagnosticPayload::Value(payload)) => {
                self.on_request_stop(payload)
            }
            (CONTEXT_CHANGED_EVENT, payload) => self.on_ambient_change(payload),
            (name, _) => log::debug!("unexpected event [{name}] routed to ingress observer"),
        }
    }
}
