use serde::{Deserialize, Serialize};

/// Default ignore pattern for ingress tracing.
///
/// Skips management endpoints and static assets that would otherwise flood
/// the tracer with uninteresting root spans.
pub const DEFAULT_INGRESS_IGNORE_PATTERN: &str =
    r"^/health$|^/info$|.*\.png$|.*\.css$|.*\.js$|.*\.html$|^/favicon\.ico$";

/// Connection settings for the message broker the host glue talks to.
///
/// The broker itself is an opaque collaborator; these values are bound from
/// configuration and handed through untouched.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct BrokerOptions {
    pub host: String,
    pub port: u16,
    pub username: String,
    pub password: String,
    pub virtual_host: String,
}

impl BrokerOptions {
    /// Configuration key prefix for broker settings.
    pub const PREFIX: &'static str = "broker";

    /// Broker address as `host:port`.
    pub fn address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

impl Default for BrokerOptions {
    fn default() -> Self {
        BrokerOptions {
            host: "127.0.0.1".to_string(),
            port: 5672,
            username: "guest".to_string(),
            password: "guest".to_string(),
            virtual_host: "/".to_string(),
        }
    }
}

/// Settings for the ingress tracing observer.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct TracingOptions {
    pub ingress_ignore_pattern: String,
}

impl TracingOptions {
    /// Configuration key prefix for tracing settings.
    pub const PREFIX: &'static str = "tracing";
}

impl Default for TracingOptions {
    fn default() -> Self {
        TracingOptions {
            ingress_ignore_pattern: DEFAULT_INGRESS_IGNORE_PATTERN.to_string(),
        }
    }
}
