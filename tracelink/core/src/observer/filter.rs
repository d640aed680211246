use regex::Regex;

use crate::config::ConfigError;

/// Decides whether a request path is excluded from tracing.
///
/// The ignore pattern is compiled once at construction and immutable
/// afterwards; an invalid pattern is a configuration error surfaced to the
/// caller, never a per-request failure.
#[derive(Debug, Clone)]
pub struct RequestFilter {
    matcher: Regex,
}

impl RequestFilter {
    pub fn new(pattern: &str) -> Result<Self, ConfigError> {
        let matcher = Regex::new(pattern).map_err(|source| ConfigError::InvalidIgnorePattern {
            pattern: pattern.to_string(),
            source,
        })?;
        Ok(RequestFilter { matcher })
    }

    /// True when the path matches the ignore pattern. A missing or empty
    /// path is never ignored.
    pub fn should_ignore(&self, path: Option<&str>) -> bool {
        match path {
            None | Some("") => false,
            Some(path) => self.matcher.is_match(path),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tracelink_proto::dto::options::DEFAULT_INGRESS_IGNORE_PATTERN;

    #[test]
    fn test_invalid_pattern_fails_construction() {
        let err = RequestFilter::new("(unclosed").unwrap_err();
        assert!(
            matches!(err, ConfigError::InvalidIgnorePattern { ref pattern, .. } if pattern == "(unclosed")
        );
    }

    #[test]
    fn test_empty_and_missing_paths_are_never_ignored() {
        let filter = RequestFilter::new(".*").unwrap();
        assert!(!filter.should_ignore(None));
        assert!(!filter.should_ignore(Some("")));
    }

    #[test]
    fn test_anchored_health_pattern() {
        let filter = RequestFilter::new("^/health$").unwrap();
        assert!(filter.should_ignore(Some("/health")));
        assert!(!filter.should_ignore(Some("/health/live")));
        assert!(!filter.should_ignore(Some("/orders")));
    }

    #[test]
    fn test_default_pattern_skips_management_and_assets() {
        let filter = RequestFilter::new(DEFAULT_INGRESS_IGNORE_PATTERN).unwrap();
        assert!(filter.should_ignore(Some("/health")));
        assert!(filter.should_ignore(Some("/info")));
        assert!(filter.should_ignore(Some("/favicon.ico")));
        assert!(filter.should_ignore(Some("/static/app.js")));
        assert!(!filter.should_ignore(Some("/orders/42")));
        assert!(!filter.should_ignore(Some("/healthcheck")));
    }
}
