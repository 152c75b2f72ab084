//! Error types for hostway

/// Main error type for hostway operations
#[derive(Debug, thiserror::Error)]
pub enum HostwayError {
    #[error("Store error: {0}")]
    Store(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Invalid URL: {0}")]
    InvalidUrl(String),

    #[error("Invalid data: {0}")]
    InvalidData(String),

    #[error("I/O error: {0}")]
    Io(String),

    #[error("Parse error: {0}")]
    Parse(String),
}

impl HostwayError {
    /// Whether the pipeline should fail open on this error
    ///
    /// Lookup and data errors degrade to unmapped behavior; configuration
    /// errors are only raised at startup and are never seen per request.
    pub fn is_recoverable(&self) -> bool {
        !matches!(self, Self::Config(_))
    }
}

impl From<std::io::Error> for HostwayError {
    fn from(err: std::io::Error) -> Self {
        Self::Io(err.to_string())
    }
}

impl From<toml::de::Error> for HostwayError {
    fn from(err: toml::de::Error) -> Self {
        Self::Parse(format!("TOML error: {}", err))
    }
}

impl From<serde_json::Error> for HostwayError {
    fn from(err: serde_json::Error) -> Self {
        Self::Parse(format!("JSON error: {}", err))
    }
}

impl From<regex::Error> for HostwayError {
    fn from(err: regex::Error) -> Self {
        Self::Config(format!("invalid pattern: {}", err))
    }
}

impl From<url::ParseError> for HostwayError {
    fn from(err: url::ParseError) -> Self {
        Self::InvalidUrl(err.to_string())
    }
}

/// Result type alias for hostway operations
pub type Result<T> = std::result::Result<T, HostwayError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = HostwayError::Store("connection refused".into());
        assert_eq!(err.to_string(), "Store error: connection refused");
    }

    #[test]
    fn test_url_error_conversion() {
        let err: HostwayError = url::Url::parse("not a url").unwrap_err().into();
        assert!(matches!(err, HostwayError::InvalidUrl(_)));
        assert!(err.is_recoverable());
        assert!(!HostwayError::Config("x".into()).is_recoverable());
    }
}
