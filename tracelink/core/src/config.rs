use std::collections::BTreeMap;
use std::sync::RwLock;

use once_cell::sync::Lazy;
use serde_json::Value;
use thiserror::Error;

use tracelink_proto::prelude::{BrokerOptions, TracingOptions};

/// Global configuration key-value store.
///
/// A simple ordered KV store for configuration values, shared by the host
/// glue and the tracing observers. Uses `RwLock` rather than `Mutex` because
/// configuration access is read-heavy after startup.
pub static CONFIG_STORE: Lazy<RwLock<BTreeMap<String, Value>>> =
    Lazy::new(|| RwLock::new(BTreeMap::new()));

/// Errors raised while binding or validating configuration.
///
/// These fail fast at construction time and are never retried: a bad value
/// is a deployment problem, not a runtime condition.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("invalid ignore pattern {pattern:?}: {source}")]
    InvalidIgnorePattern {
        pattern: String,
        #[source]
        source: regex::Error,
    },

    #[error("invalid value {value:?} for configuration key {key:?}")]
    InvalidValue { key: String, value: String },
}

/// Get a configuration value.
pub fn get(key: &str) -> Option<Value> {
    CONFIG_STORE.read().unwrap().get(key).cloned()
}

/// Set a configuration value.
pub fn set<T: Into<Value>>(key: &str, value: T) {
    CONFIG_STORE
        .write()
        .unwrap()
        .insert(key.to_string(), value.into());
}

/// Get a configuration value as string.
pub fn get_str(key: &str) -> Option<String> {
    get(key).map(|value| match value {
        Value::String(s) => s,
        other => other.to_string(),
    })
}

/// Remove a configuration value.
pub fn remove(key: &str) -> Option<Value> {
    CONFIG_STORE.write().unwrap().remove(key)
}

/// Check if a key exists.
pub fn contains_key(key: &str) -> bool {
    CONFIG_STORE.read().unwrap().contains_key(key)
}

/// Get all configuration keys.
pub fn keys() -> Vec<String> {
    CONFIG_STORE.read().unwrap().keys().cloned().collect()
}

/// Clear all configuration.
pub fn clear() {
    CONFIG_STORE.write().unwrap().clear();
}

/// Get the number of configuration entries.
pub fn len() -> usize {
    CONFIG_STORE.read().unwrap().len()
}

/// Check if the configuration store is empty.
pub fn is_empty() -> bool {
    CONFIG_STORE.read().unwrap().is_empty()
}

/// Bind [`BrokerOptions`] from `broker.*` keys, falling back to defaults
/// for anything unset. A malformed port fails the bind.
pub fn broker_options() -> Result<BrokerOptions, ConfigError> {
    let defaults = BrokerOptions::default();
    let prefix = BrokerOptions::PREFIX;

    let port = match get_str(&format!("{prefix}.port")) {
        Some(raw) => raw.parse::<u16>().map_err(|_| ConfigError::InvalidValue {
            key: format!("{prefix}.port"),
            value: raw,
        })?,
        None => defaults.port,
    };

    Ok(BrokerOptions {
        host: get_str(&format!("{prefix}.host")).unwrap_or(defaults.host),
        port,
        username: get_str(&format!("{prefix}.username")).unwrap_or(defaults.username),
        password: get_str(&format!("{prefix}.password")).unwrap_or(defaults.password),
        virtual_host: get_str(&format!("{prefix}.virtual_host")).unwrap_or(defaults.virtual_host),
    })
}

/// Bind [`TracingOptions`] from `tracing.*` keys.
///
/// The pattern string itself always binds; compiling it is the
/// [`RequestFilter`](crate::observer::RequestFilter) constructor's job, so a
/// bad pattern surfaces exactly once, at observer construction.
pub fn tracing_options() -> TracingOptions {
    let defaults = TracingOptions::default();
    let key = format!("{}.ingress_ignore_pattern", TracingOptions::PREFIX);
    TracingOptions {
        ingress_ignore_pattern: get_str(&key).unwrap_or(defaults.ingress_ignore_pattern),
    }
}
