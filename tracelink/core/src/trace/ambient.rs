use std::cell::RefCell;
use std::marker::PhantomData;
use std::sync::{Arc, RwLock};

use once_cell::sync::Lazy;

use super::context::SpanContext;

/// A single ambient-context transition, as seen by change listeners.
#[derive(Debug, Clone)]
pub struct ContextChange {
    pub previous: Option<Arc<SpanContext>>,
    pub current: Option<Arc<SpanContext>>,
    /// True when the transition crosses a flow boundary: the value became
    /// visible because a child flow entered (or left) an inherited scope,
    /// not because code in the same flow called `set`.
    pub flow_changed: bool,
}

type ChangeListener = Arc<dyn Fn(&ContextChange) + Send + Sync>;

/// Global registry of ambient-context change listeners.
///
/// Listeners are process-wide; the per-flow state they observe is not.
/// Within one flow notifications are strictly ordered because every
/// transition happens on the flow's own thread.
static LISTENERS: Lazy<RwLock<Vec<ChangeListener>>> = Lazy::new(|| RwLock::new(Vec::new()));

thread_local! {
    static CURRENT: RefCell<Option<Arc<SpanContext>>> = const { RefCell::new(None) };
}

/// Flow-local holder of the current [`SpanContext`].
///
/// Each logical flow (a thread, or an explicitly entered continuation scope
/// on a thread) owns its own slot. A child flow receives a copy of the
/// parent's value through [`AmbientContext::branch`]; whatever the child does
/// to its slot never writes back into the parent.
pub struct AmbientContext;

impl AmbientContext {
    /// Current context for the calling flow. `None` is the root default.
    pub fn get() -> Option<Arc<SpanContext>> {
        CURRENT.with(|slot| slot.borrow().clone())
    }

    /// Swaps the calling flow's context, returning the displaced value.
    ///
    /// This is a same-flow assignment: listeners are notified with
    /// `flow_changed = false`, so the correlator leaves span lifetimes to
    /// the application.
    pub fn set(context: Option<Arc<SpanContext>>) -> Option<Arc<SpanContext>> {
        let previous = CURRENT.with(|slot| slot.replace(context.clone()));
        Self::notify(&ContextChange {
            previous: previous.clone(),
            current: context,
            flow_changed: false,
        });
        previous
    }

    /// Captures the calling flow's context for propagation into a child flow.
    ///
    /// The returned branch can be moved across threads or into a spawned
    /// task; entering it installs the captured value there.
    pub fn branch() -> FlowBranch {
        FlowBranch {
            inherited: Self::get(),
        }
    }

    /// Registers a change listener. Listeners run synchronously on the flow
    /// performing the transition, in registration order.
    pub fn on_change(listener: impl Fn(&ContextChange) + Send + Sync + 'static) {
        LISTENERS.write().unwrap().push(Arc::new(listener));
    }

    fn notify(change: &ContextChange) {
        let listeners: Vec<ChangeListener> = LISTENERS.read().unwrap().clone();
        for listener in listeners {
            listener(change);
        }
    }
}

/// A captured ambient value ready to be entered by a child flow.
#[derive(Debug, Clone)]
pub struct FlowBranch {
    inherited: Option<Arc<SpanContext>>,
}

impl FlowBranch {
    /// The captured value, for callers that only need to inspect it.
    pub fn inherited(&self) -> Option<&Arc<SpanContext>> {
        self.inherited.as_ref()
    }

    /// Installs the captured context in the calling flow.
    ///
    /// Listeners see the installation with `flow_changed = true`. The guard
    /// restores the flow's prior slot on drop; the value the scope ended
    /// with is reported as `previous` in the exit notification, again with
    /// `flow_changed = true`. If the scope exits into an empty slot, that
    /// exit notification is what lets the correlator close a span the scope
    /// left open.
    pub fn enter(self) -> FlowGuard {
        let saved = CURRENT.with(|slot| slot.replace(self.inherited.clone()));
        AmbientContext::notify(&ContextChange {
            previous: saved.clone(),
            current: self.inherited,
            flow_changed: true,
        });
        FlowGuard {
            saved,
            _not_send: PhantomData,
        }
    }
}

/// Scope guard for an entered flow branch.
///
/// Must be dropped on the thread that entered the branch; the `PhantomData`
/// marker keeps the guard from crossing threads.
pub struct FlowGuard {
    saved: Option<Arc<SpanContext>>,
    _not_send: PhantomData<*const ()>,
}

impl Drop for FlowGuard {
    fn drop(&mut self) {
        let restored = self.saved.take();
        let at_exit = CURRENT.with(|slot| slot.replace(restored.clone()));
        AmbientContext::notify(&ContextChange {
            previous: at_exit,
            current: restored,
            flow_changed: true,
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::trace::{Span, SpanHandle};
    use std::sync::Mutex;

    fn context_with(name: &str) -> Arc<SpanContext> {
        let handle = SpanHandle::new(Span::new_root(name, None));
        Arc::new(SpanContext::with_active(handle))
    }

    fn same_context(a: &Option<Arc<SpanContext>>, b: &Arc<SpanContext>) -> bool {
        a.as_ref().is_some_and(|ctx| Arc::ptr_eq(ctx, b))
    }

    #[test]
    fn test_get_defaults_to_root() {
        // Fresh thread, nothing ever set there.
        std::thread::spawn(|| {
            assert!(AmbientContext::get().is_none());
        })
        .join()
        .unwrap();
    }

    #[test]
    fn test_set_swaps_and_returns_displaced_value() {
        std::thread::spawn(|| {
            let first = context_with("first");
            let second = context_with("second");

            assert!(AmbientContext::set(Some(first.clone())).is_none());
            let displaced = AmbientContext::set(Some(second.clone()));
            assert!(same_context(&displaced, &first));
            assert!(same_context(&AmbientContext::get(), &second));

            AmbientContext::set(None);
            assert!(AmbientContext::get().is_none());
        })
        .join()
        .unwrap();
    }

    #[test]
    fn test_child_flow_changes_do_not_leak_back() {
        std::thread::spawn(|| {
            let parent_ctx = context_with("parent");
            AmbientContext::set(Some(parent_ctx.clone()));

            let branch = AmbientContext::branch();
            std::thread::spawn(move || {
                let _guard = branch.enter();
                // Child sees the inherited value, then replaces it.
                assert!(same_context(&AmbientContext::get(), &parent_ctx));
                AmbientContext::set(Some(context_with("child")));
            })
            .join()
            .unwrap();

            // Parent slot is untouched by anything the child did.
            let current = AmbientContext::get().unwrap();
            assert!(current
                .active()
                .unwrap()
                .with(|span| span.name == "parent"));
        })
        .join()
        .unwrap();
    }

    #[test]
    fn test_guard_restores_pre_entry_slot() {
        std::thread::spawn(|| {
            let outer = context_with("outer");
            AmbientContext::set(Some(outer.clone()));

            let branch = AmbientContext::branch();
            {
                let _guard = branch.enter();
                AmbientContext::set(Some(context_with("inner")));
            }

            assert!(same_context(&AmbientContext::get(), &outer));
        })
        .join()
        .unwrap();
    }

    #[test]
    fn test_listeners_observe_flow_transitions_in_order() {
        let marker = context_with("flow_transition_marker");
        let seen: Arc<Mutex<Vec<(bool, bool)>>> = Arc::new(Mutex::new(Vec::new()));

        // Listeners are global and other tests fire notifications too, so
        // only record transitions involving our own context object.
        {
            let marker = marker.clone();
            let seen = seen.clone();
            AmbientContext::on_change(move |change| {
                let involved = same_context(&change.previous, &marker)
                    || same_context(&change.current, &marker);
                if involved {
                    seen.lock()
                        .unwrap()
                        .push((change.flow_changed, change.current.is_some()));
                }
            });
        }

        let handle = std::thread::spawn(move || {
            AmbientContext::set(Some(marker)); // same-flow set
            let branch = AmbientContext::branch();
            std::thread::spawn(move || {
                let _guard = branch.enter(); // flow entry + exit
            })
            .join()
            .unwrap();
        });
        handle.join().unwrap();

        let seen = seen.lock().unwrap();
        assert_eq!(
            seen.as_slice(),
            &[
                (false, true), // explicit set within the flow
                (true, true),  // child flow entered the inherited value
                (true, false), // child flow exited, slot went back to empty
            ]
        );
    }
}
