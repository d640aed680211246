use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex};
use std::time::{Duration, SystemTime};

use serde_json::Value;

use super::TraceError;

// Global atomic counters for generating unique IDs.
static NEXT_TRACE_ID: AtomicU64 = AtomicU64::new(1);
static NEXT_SPAN_ID: AtomicU64 = AtomicU64::new(1);

/// Obtain a numeric thread identifier using platform facilities where possible.
///
/// On macOS we use `pthread_self()` which is stable per thread lifetime.
/// On Linux we use the `gettid` syscall for the OS thread id.
/// On other platforms we hash the opaque `std::thread::ThreadId` debug output
/// to yield a reproducible u64 within process lifetime.
fn current_thread_id() -> u64 {
    #[cfg(target_os = "macos")]
    unsafe {
        return libc::pthread_self() as u64;
    }
    #[cfg(target_os = "linux")]
    unsafe {
        return libc::syscall(libc::SYS_gettid) as u64;
    }
    #[cfg(not(any(target_os = "macos", target_os = "linux")))]
    {
        use std::collections::hash_map::DefaultHasher;
        use std::hash::{Hash, Hasher};
        let tid = std::thread::current().id();
        let mut h = DefaultHasher::new();
        // ThreadId only implements Debug; convert to string and hash.
        format!("{:?}", tid).hash(&mut h);
        h.finish()
    }
}

// --- Timestamp ---
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub struct Timestamp(pub u128);

impl Timestamp {
    pub fn now() -> Self {
        SystemTime::now()
            .duration_since(SystemTime::UNIX_EPOCH)
            .map_or_else(
                |_| Timestamp(0), // Fallback for systems where time might be before UNIX_EPOCH
                |d| Timestamp(d.as_nanos()),
            )
    }

    pub fn duration_since(&self, earlier: Timestamp) -> Duration {
        if self.0 > earlier.0 {
            Duration::from_nanos((self.0 - earlier.0) as u64)
        } else {
            Duration::from_nanos(0) // Avoid panic if earlier is not actually earlier
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Attribute(pub String, pub Value);

pub fn attr<K: Into<String>, V: Into<Value>>(key: K, value: V) -> Attribute {
    Attribute(key.into(), value.into())
}

impl Attribute {
    pub fn key(&self) -> &str {
        &self.0
    }

    pub fn value(&self) -> &Value {
        &self.1
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Event {
    pub name: String,
    pub timestamp: Timestamp,
    pub attributes: Vec<Attribute>,
}

// --- Span Status ---
/// Represents the status of a span.
///
/// The status is determined by whether the span has been ended:
/// - `Active`: The span is still running (end_time is None)
/// - `Completed`: The span has been ended (end_time is Some)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SpanStatus {
    Active,    // The span is currently active (end_time is None).
    Completed, // The span has been completed (end_time is Some).
}

impl SpanStatus {
    /// Returns `Active` if end_time is None, `Completed` otherwise.
    pub fn from_end_time(end_time: Option<Timestamp>) -> Self {
        if end_time.is_some() {
            SpanStatus::Completed
        } else {
            SpanStatus::Active
        }
    }
}

#[derive(Debug, Clone)]
pub struct Span {
    pub trace_id: u64,
    pub span_id: u64,
    pub parent_id: Option<u64>,
    pub thread_id: u64, // stable numeric id for the originating thread

    pub name: String,
    pub kind: Option<String>,

    pub start: Timestamp,
    pub end: Option<Timestamp>,

    pub attrs: Vec<Attribute>,
    pub events: Vec<Event>,
}

impl Span {
    /// Creates a new root span (starts a new trace).
    pub fn new_root<N: Into<String>>(name: N, kind: Option<&str>) -> Self {
        let trace_id = NEXT_TRACE_ID.fetch_add(1, Ordering::Relaxed);
        let span_id = NEXT_SPAN_ID.fetch_add(1, Ordering::Relaxed);
        let thread_id = current_thread_id();

        Span {
            trace_id,
            span_id,
            parent_id: None,
            thread_id,
            name: name.into(),
            kind: kind.map(|k| k.to_string()),
            start: Timestamp::now(),
            end: None,
            attrs: vec![],
            events: vec![],
        }
    }

    /// Creates a new child span within an existing trace.
    pub fn new_child<N: Into<String>>(parent: &Span, name: N, kind: Option<&str>) -> Self {
        let span_id = NEXT_SPAN_ID.fetch_add(1, Ordering::Relaxed);
        let thread_id = current_thread_id(); // child bound to the current executing thread

        Span {
            trace_id: parent.trace_id,
            span_id,
            parent_id: Some(parent.span_id),
            thread_id,
            name: name.into(),
            kind: kind.map(|k| k.to_string()),
            start: Timestamp::now(),
            end: None,
            attrs: vec![],
            events: vec![],
        }
    }

    /// Adds an attribute to this span.
    ///
    /// Returns an error if the span has already been ended.
    pub fn add_attr<V: Into<Value>>(&mut self, key: &str, value: V) -> Result<(), TraceError> {
        if self.end.is_some() {
            return Err(TraceError::SpanAlreadyClosed);
        }
        self.attrs.push(attr(key, value));
        Ok(())
    }

    /// Adds an event to this span.
    ///
    /// Returns an error if the span has already been ended.
    pub fn add_event<S: Into<String>>(
        &mut self,
        name: S,
        attributes: Option<Vec<Attribute>>,
    ) -> Result<(), TraceError> {
        if self.end.is_some() {
            return Err(TraceError::SpanAlreadyClosed);
        }

        self.events.push(Event {
            name: name.into(),
            timestamp: Timestamp::now(),
            attributes: attributes.unwrap_or_default(),
        });

        Ok(())
    }

    /// Ends this span.
    ///
    /// Ending a span twice is a logic error in the underlying tracer, so a
    /// second call returns [`TraceError::SpanAlreadyEnded`] instead of
    /// silently updating the end time.
    pub fn end(&mut self) -> Result<(), TraceError> {
        if self.end.is_some() {
            return Err(TraceError::SpanAlreadyEnded {
                span_id: self.span_id,
            });
        }
        self.end = Some(Timestamp::now());
        Ok(())
    }

    /// Returns the status of this span.
    pub fn status(&self) -> SpanStatus {
        SpanStatus::from_end_time(self.end)
    }

    /// Returns the duration of this span if it has been ended.
    pub fn duration(&self) -> Option<Duration> {
        self.end.map(|et| et.duration_since(self.start))
    }

    /// Checks if this span has been ended.
    pub fn is_ended(&self) -> bool {
        self.end.is_some()
    }
}

/// Shared handle to a span.
///
/// A span may be visible to several holders at once: the application code
/// that opened it, the ambient context chain, and the lifecycle correlator.
/// The handle serializes access so that the ended check and the end itself
/// cannot be split by a concurrent holder.
#[derive(Debug, Clone)]
pub struct SpanHandle {
    inner: Arc<Mutex<Span>>,
}

impl SpanHandle {
    pub fn new(span: Span) -> Self {
        SpanHandle {
            inner: Arc::new(Mutex::new(span)),
        }
    }

    /// The process-unique id of the underlying span.
    pub fn span_id(&self) -> u64 {
        self.inner.lock().unwrap().span_id
    }

    /// Ends the span, failing if it was already ended.
    pub fn end(&self) -> Result<(), TraceError> {
        self.inner.lock().unwrap().end()
    }

    /// Ends the span only if it is still live.
    ///
    /// The check and the end happen under one lock acquisition, so two
    /// holders racing through this method cannot both end the span. Returns
    /// `true` for the holder that performed the end.
    pub fn end_if_live(&self) -> bool {
        let mut span = self.inner.lock().unwrap();
        if span.is_ended() {
            return false;
        }
        span.end().is_ok()
    }

    pub fn is_ended(&self) -> bool {
        self.inner.lock().unwrap().is_ended()
    }

    /// Read access to the underlying span.
    pub fn with<R>(&self, f: impl FnOnce(&Span) -> R) -> R {
        f(&self.inner.lock().unwrap())
    }

    /// Write access to the underlying span.
    pub fn with_mut<R>(&self, f: impl FnOnce(&mut Span) -> R) -> R {
        f(&mut self.inner.lock().unwrap())
    }

    /// Whether two handles refer to the same span object.
    pub fn same_span(&self, other: &SpanHandle) -> bool {
        Arc::ptr_eq(&self.inner, &other.inner)
    }
}
