use serde::{Deserialize, Serialize};

/// Payload emitted by ingress instrumentation when a request begins.
///
/// Only the path is mandatory; instrumentation sources differ in how much
/// metadata they attach to the start event.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct RequestStart {
    pub path: String,
    #[serde(default)]
    pub method: Option<String>,
}

/// Payload emitted by ingress instrumentation when a request completes.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct RequestStop {
    #[serde(default)]
    pub status: Option<u16>,
}
