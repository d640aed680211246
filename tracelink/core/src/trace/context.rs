use super::span::SpanHandle;

/// Immutable snapshot of the ambient span state for one logical flow.
///
/// A new `SpanContext` is produced on every ambient switch and never mutated
/// afterwards; concurrent flows may each hold their own snapshot. `previous`
/// is the span that was active before `active` became current, kept so the
/// correlator can close it if the flow is left without an explicit end.
#[derive(Debug, Clone, Default)]
pub struct SpanContext {
    active: Option<SpanHandle>,
    previous: Option<SpanHandle>,
}

impl SpanContext {
    pub fn new(active: Option<SpanHandle>, previous: Option<SpanHandle>) -> Self {
        SpanContext { active, previous }
    }

    /// Context with an active span and no predecessor.
    pub fn with_active(active: SpanHandle) -> Self {
        SpanContext {
            active: Some(active),
            previous: None,
        }
    }

    pub fn active(&self) -> Option<&SpanHandle> {
        self.active.as_ref()
    }

    pub fn previous(&self) -> Option<&SpanHandle> {
        self.previous.as_ref()
    }
}
