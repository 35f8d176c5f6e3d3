//! Error types for the compatibility layer

use thiserror::Error;

/// Which step of a load attempt failed verification
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoadStage {
    /// After the remote resource finished loading
    Remote,
    /// After the local fallback was applied
    Fallback,
}

impl LoadStage {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Remote => "remote",
            Self::Fallback => "fallback",
        }
    }
}

/// Main error type for compatibility operations
///
/// Every variant is `Clone` because outcomes are handed to all callers
/// awaiting the same shared load.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum CompatError {
    /// A capability probe failed internally and was treated as unsupported
    #[error("probe `{probe}` degraded: {reason}")]
    DetectionDegraded { probe: String, reason: String },

    /// The remote resource did not settle before the deadline
    #[error("loading {url} timed out after {timeout_ms}ms")]
    RemoteLoadTimeout { url: String, timeout_ms: u64 },

    /// The remote resource signalled an error
    #[error("loading {url} failed: {reason}")]
    RemoteLoadNetworkFailure { url: String, reason: String },

    /// Loaded code did not install the expected capability
    #[error("verification of `{feature}` failed after {} load", stage.as_str())]
    VerificationFailed { feature: String, stage: LoadStage },

    /// Remote load failed and no local remediation exists
    #[error("no local fallback registered for `{feature}`")]
    FallbackUnavailable { feature: String },

    /// The host refused to inject a resource
    #[error("resource injection failed: {0}")]
    Injection(String),

    /// Invalid configuration
    #[error("invalid configuration: {0}")]
    Config(String),

    /// A URL could not be parsed
    #[error("invalid URL: {0}")]
    InvalidUrl(String),

    /// Configuration JSON could not be decoded
    #[error("JSON error: {0}")]
    Json(String),

    /// Filesystem error while reading configuration
    #[error("I/O error: {0}")]
    Io(String),
}

impl From<std::io::Error> for CompatError {
    fn from(err: std::io::Error) -> Self {
        Self::Io(err.to_string())
    }
}

impl From<serde_json::Error> for CompatError {
    fn from(err: serde_json::Error) -> Self {
        Self::Json(err.to_string())
    }
}

impl From<url::ParseError> for CompatError {
    fn from(err: url::ParseError) -> Self {
        Self::InvalidUrl(err.to_string())
    }
}

/// Convenience Result type for compatibility operations
pub type Result<T> = std::result::Result<T, CompatError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = CompatError::RemoteLoadTimeout {
            url: "https://cdn.example.com/fetch.js".to_string(),
            timeout_ms: 10_000,
        };
        assert_eq!(
            err.to_string(),
            "loading https://cdn.example.com/fetch.js timed out after 10000ms"
        );

        let err = CompatError::VerificationFailed {
            feature: "fetch".to_string(),
            stage: LoadStage::Fallback,
        };
        assert_eq!(err.to_string(), "verification of `fetch` failed after fallback load");
    }

    #[test]
    fn test_io_conversion() {
        let io = std::io::Error::new(std::io::ErrorKind::NotFound, "missing");
        let err: CompatError = io.into();
        assert!(matches!(err, CompatError::Io(_)));
    }
}
