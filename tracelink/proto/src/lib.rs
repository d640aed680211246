pub mod dto;

pub mod prelude {
    // --- Ingress instrumentation payloads ---
    pub use crate::dto::ingress::{RequestStart, RequestStop};

    // --- Option structures ---
    pub use crate::dto::options::{BrokerOptions, TracingOptions};
}
