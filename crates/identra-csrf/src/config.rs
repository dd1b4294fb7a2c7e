//! CSRF integration settings.

use std::time::Duration;

/// Default name of the hidden form field carrying the token.
pub const DEFAULT_FIELD_NAME: &str = "csrfToken";

/// Default name of the request header carrying the token.
pub const DEFAULT_HEADER_NAME: &str = "X-CSRF-Token";

/// Default token lifetime.
pub const DEFAULT_TTL: Duration = Duration::from_secs(3600);

/// How tokens are carried and how long they live.
///
/// Integrations differ on the carrier name (`csrfToken` in form posts,
/// `_csrf` in some frameworks), so both names are configurable.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CsrfConfig {
    /// Hidden form field name.
    pub field_name: String,
    /// Request header name.
    pub header_name: String,
    /// Token lifetime.
    pub ttl: Duration,
}

impl Default for CsrfConfig {
    fn default() -> Self {
        Self {
            field_name: DEFAULT_FIELD_NAME.to_string(),
            header_name: DEFAULT_HEADER_NAME.to_string(),
            ttl: DEFAULT_TTL,
        }
    }
}

impl CsrfConfig {
    /// Use a different form field name.
    pub fn with_field_name(mut self, name: impl Into<String>) -> Self {
        self.field_name = name.into();
        self
    }

    /// Use a different header name.
    pub fn with_header_name(mut self, name: impl Into<String>) -> Self {
        self.header_name = name.into();
        self
    }

    /// Use a different token lifetime.
    pub fn with_ttl(mut self, ttl: Duration) -> Self {
        self.ttl = ttl;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn defaults_match_the_documented_carrier_names() {
        let config = CsrfConfig::default();
        assert_eq!(config.field_name, "csrfToken");
        assert_eq!(config.header_name, "X-CSRF-Token");
        assert_eq!(config.ttl, Duration::from_secs(3600));
    }

    #[test]
    fn builder_overrides_apply() {
        let config = CsrfConfig::default()
            .with_field_name("_csrf")
            .with_ttl(Duration::from_secs(60));
        assert_eq!(config.field_name, "_csrf");
        assert_eq!(config.ttl, Duration::from_secs(60));
    }
}
