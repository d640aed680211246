//! Top-level wiring for the Tracelink integration shims.
//!
//! The member crates stay independent: `tracelink-core` holds the span
//! correlation machinery, `tracelink-host` the hosting glue, and
//! `tracelink-proto` the shared payload types. This crate re-exports their
//! surfaces and provides one-call process initialization.

use std::sync::Arc;

use anyhow::Result;
use once_cell::sync::OnceCell;

pub use tracelink_core::config;
pub use tracelink_core::observer::{
    DiagnosticDispatcher, DiagnosticEvent, DiagnosticObserver, DiagnosticPayload, IngressObserver,
    RequestFilter,
};
pub use tracelink_core::trace::{
    AmbientContext, ContextChange, FlowBranch, FlowGuard, Span, SpanContext, SpanCorrelator,
    SpanHandle, SpanStatus, TraceError,
};
pub use tracelink_host::{
    BrokerHost, BrokerHostBuilder, Host, HostError, LifecycleParticipant, LifecycleProcessor,
    StandaloneHost,
};
pub use tracelink_proto::prelude::{BrokerOptions, RequestStart, RequestStop, TracingOptions};

const ENV_TRACELINK_LOGLEVEL: &str = "TRACELINK_LOGLEVEL";

static INITIALIZED: OnceCell<()> = OnceCell::new();

/// One-time process initialization.
///
/// Sets up logging from `TRACELINK_LOGLEVEL`, installs the span correlator
/// as an ambient-context listener, and registers the default ingress
/// observer built from the configured tracing options. Later calls are
/// no-ops. Fails if the configured ignore pattern does not compile.
pub fn init() -> Result<()> {
    INITIALIZED.get_or_try_init(|| {
        let env = env_logger::Env::new().filter(ENV_TRACELINK_LOGLEVEL);
        // Another logger may already be installed; that is not our problem
        // to fix, so a failed init is ignored.
        let _ = env_logger::Builder::from_env(env).try_init();

        SpanCorrelator::install();

        let options = config::tracing_options();
        let observer = IngressObserver::new(&options)?;
        DiagnosticDispatcher::register(Arc::new(observer));

        log::debug!("tracelink initialized");
        Ok::<(), anyhow::Error>(())
    })?;
    Ok(())
}
