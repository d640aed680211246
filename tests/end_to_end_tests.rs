// Full wiring test: init, dispatch instrumentation events, observe span
// lifecycle decisions.

use serde_json::json;
use tracelink::{
    AmbientContext, DiagnosticDispatcher, DiagnosticEvent, Span, SpanContext, SpanHandle,
};

#[test]
fn test_request_events_drive_span_lifecycle() {
    tracelink::init().unwrap();

    // Ambient state is flow-local; keep this scenario on its own thread so
    // other tests in this binary cannot see it.
    std::thread::spawn(|| {
        // Management endpoint: filtered out by the default ignore pattern.
        DiagnosticDispatcher::dispatch(&DiagnosticEvent::value(
            "ingress.request.start",
            json!({ "path": "/health" }),
        ));
        assert!(AmbientContext::get().is_none());

        // Business endpoint: traced.
        DiagnosticDispatcher::dispatch(&DiagnosticEvent::value(
            "ingress.request.start",
            json!({ "path": "/orders/42", "method": "GET" }),
        ));
        let span = AmbientContext::get()
            .expect("request start must install an ambient context")
            .active()
            .expect("context must carry the request span")
            .clone();
        assert!(!span.is_ended());

        DiagnosticDispatcher::dispatch(&DiagnosticEvent::value(
            "ingress.request.stop",
            json!({ "status": 200 }),
        ));
        assert!(span.is_ended());
        assert!(AmbientContext::get().is_none());
    })
    .join()
    .unwrap();
}

#[test]
fn test_abandoned_async_scope_is_closed_by_the_correlator() {
    tracelink::init().unwrap();

    let span = SpanHandle::new(Span::new_root("background_work", None));
    let span_for_flow = span.clone();

    std::thread::spawn(move || {
        let branch = AmbientContext::branch();
        let _guard = branch.enter();
        AmbientContext::set(Some(std::sync::Arc::new(SpanContext::with_active(
            span_for_flow,
        ))));
        // Scope exits without an explicit close.
    })
    .join()
    .unwrap();

    assert!(span.is_ended(), "Correlator must close the abandoned span");
    assert!(span.end().is_err(), "And it was closed exactly once");
}
