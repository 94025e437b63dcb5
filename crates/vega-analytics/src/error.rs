use thiserror::Error;

/// Errors from the analytics engine.
///
/// The analytic path itself never fails: detectors degrade to neutral
/// results. These variants cover caller misuse and lock poisoning only.
#[derive(Debug, Error)]
pub enum AnalyticsError {
    #[error("invalid configuration: {field} -- {detail}")]
    InvalidConfig { field: String, detail: String },

    #[error("invalid argument: {0}")]
    InvalidArgument(String),

    #[error("lock acquisition failed")]
    LockError,
}

impl AnalyticsError {
    pub(crate) fn config(field: &str, detail: impl Into<String>) -> Self {
        AnalyticsError::InvalidConfig {
            field: field.to_string(),
            detail: detail.into(),
        }
    }
}

/// Convenience type alias for analytics results.
pub type AnalyticsResult<T> = Result<T, AnalyticsError>;
