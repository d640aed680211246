use std::sync::Once;

use super::ambient::{AmbientContext, ContextChange};
use super::context::SpanContext;

static INSTALL: Once = Once::new();

/// Decides whether an ambient transition must force-end a span.
///
/// A span auto-closes only when control returns out of the asynchronous
/// scope that owned it, and only if nobody already closed it. Same-flow
/// transitions and transitions into a new explicit context are left to the
/// application.
pub struct SpanCorrelator;

impl SpanCorrelator {
    /// Registers the correlator as an ambient change listener. Safe to call
    /// more than once; only the first call registers.
    pub fn install() {
        INSTALL.call_once(|| {
            AmbientContext::on_change(Self::on_context_changed);
        });
    }

    /// Listener entry point: unpacks a [`ContextChange`] notification.
    pub fn on_context_changed(change: &ContextChange) {
        Self::end_span_if_needed(
            change.previous.as_deref(),
            change.current.as_deref(),
            change.flow_changed,
        );
    }

    /// Core decision. See the module contract:
    ///
    /// 1. Same-flow change: the application manages span lifetime, no action.
    /// 2. No previous context: nothing to close.
    /// 3. Previous active span already ended: no action, no error.
    /// 4. Flow left without a replacement context and the previous active
    ///    span is live: end it, exactly once.
    /// 5. A new explicit context owns closing the old span: no action.
    pub fn end_span_if_needed(
        previous: Option<&SpanContext>,
        current: Option<&SpanContext>,
        flow_changed: bool,
    ) {
        if !flow_changed {
            return;
        }

        let Some(previous) = previous else {
            return;
        };

        let Some(active) = previous.active() else {
            return;
        };

        if current.is_some() {
            return;
        }

        // end_if_live folds the ended check and the end into one atomic
        // step, so a racing explicit end can never produce a double-end.
        if active.end_if_live() {
            log::debug!(
                "auto-ended span {} after its flow exited without a close",
                active.span_id()
            );
        }
    }
}
