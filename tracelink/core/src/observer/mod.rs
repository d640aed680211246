mod filter;
mod ingress;

pub use filter::RequestFilter;
pub use ingress::{
    IngressObserver, CONTEXT_CHANGED_EVENT, REQUEST_START_EVENT, REQUEST_STOP_EVENT,
};

use std::sync::{Arc, RwLock};

use once_cell::sync::Lazy;
use serde_json::Value;

use crate::trace::ContextChange;

/// Global observer registry.
///
/// Observers are registered once at startup and consulted on every
/// dispatched event; the dispatcher fronts this registry the same way the
/// configuration store fronts its map.
pub static OBSERVERS: Lazy<RwLock<Vec<Arc<dyn DiagnosticObserver>>>> =
    Lazy::new(|| RwLock::new(Vec::new()));

/// Payload of a diagnostic event.
///
/// Instrumentation sources either hand over raw JSON (decoded by whichever
/// observer claims the event) or an already-materialized ambient transition,
/// which cannot round-trip through JSON because it carries live span
/// handles.
#[derive(Debug, Clone)]
pub enum DiagnosticPayload {
    ContextChanged(ContextChange),
    Value(Value),
}

/// A named event from an instrumentation source.
#[derive(Debug, Clone)]
pub struct DiagnosticEvent {
    pub name: String,
    pub payload: DiagnosticPayload,
}

impl DiagnosticEvent {
    pub fn value<N: Into<String>>(name: N, payload: Value) -> Self {
        DiagnosticEvent {
            name: name.into(),
            payload: DiagnosticPayload::Value(payload),
        }
    }

    pub fn context_changed(change: ContextChange) -> Self {
        DiagnosticEvent {
            name: CONTEXT_CHANGED_EVENT.to_string(),
            payload: DiagnosticPayload::ContextChanged(change),
        }
    }
}

/// Capability interface for diagnostic observers.
///
/// Observers declare which event names they understand and receive only
/// those; independent observers are composed via registration rather than
/// inheritance.
pub trait DiagnosticObserver: Send + Sync {
    /// Short name used in logs.
    fn name(&self) -> &str;

    /// Whether this observer wants events with the given name.
    fn handles(&self, event_name: &str) -> bool;

    /// Handle one event. Must not panic on malformed payloads; log and
    /// skip instead.
    fn on_event(&self, event: &DiagnosticEvent);
}

/// Fans diagnostic events out to every registered observer that claims them.
#[derive(Clone, Debug, Default)]
pub struct DiagnosticDispatcher;

impl DiagnosticDispatcher {
    /// Register an observer in the global registry.
    pub fn register(observer: Arc<dyn DiagnosticObserver>) {
        log::info!("registered diagnostic observer [{}]", observer.name());
        OBSERVERS.write().unwrap().push(observer);
    }

    /// Dispatch one event synchronously.
    pub fn dispatch(event: &DiagnosticEvent) {
        let observers: Vec<Arc<dyn DiagnosticObserver>> = OBSERVERS.read().unwrap().clone();
        for observer in observers {
            if observer.handles(&event.name) {
                log::debug!("dispatching [{}] to [{}]", event.name, observer.name());
                observer.on_event(event);
            }
        }
    }
}
