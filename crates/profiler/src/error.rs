//! Error types for the profiler.
//!
//! Recording and snapshot operations never fail. Errors only surface while
//! building a profiler from configuration or exporting a snapshot.

use thiserror::Error;

/// Errors that can occur while configuring the profiler or exporting data.
#[derive(Debug, Error)]
pub enum ProfilerError {
    /// A ring buffer was configured with no slots
    #[error("{buffer} buffer capacity must be greater than zero")]
    ZeroCapacity {
        /// Which buffer was misconfigured ("section" or "frame")
        buffer: &'static str,
    },

    /// The category rollup limit was zero
    #[error("category limit must be greater than zero")]
    ZeroCategoryLimit,

    /// Failed to parse a JSON configuration
    #[error("Configuration error: {0}")]
    Config(#[from] serde_json::Error),

    /// Failed to serialize a snapshot
    #[error("Export error: {0}")]
    Export(#[source] serde_json::Error),
}

/// Result type for profiler operations.
pub type ProfilerResult<T> = Result<T, ProfilerError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = ProfilerError::ZeroCapacity { buffer: "frame" };
        assert_eq!(err.to_string(), "frame buffer capacity must be greater than zero");

        let err = ProfilerError::ZeroCategoryLimit;
        assert_eq!(err.to_string(), "category limit must be greater than zero");
    }

    #[test]
    fn test_config_error_conversion() {
        let json_err = serde_json::from_str::<u32>("not json").unwrap_err();
        let err: ProfilerError = json_err.into();
        assert!(matches!(err, ProfilerError::Config(_)));
        assert!(err.to_string().starts_with("Configuration error:"));
    }
}
