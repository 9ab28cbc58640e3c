// src/errors.rs
use thiserror::Error;

/// Errors arising while compiling a report.
///
/// The two variants have very different severities. `InvalidInput` is always
/// recovered locally: the offending value is replaced by a default, the error
/// is logged at `warn` level, and compilation continues. It never escapes
/// `compile`. `InternalInconsistency` signals a violated engine invariant and
/// aborts compilation immediately.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ReportError {
    #[error("invalid report input in {field}: {detail} (default substituted)")]
    InvalidInput { field: String, detail: String },

    #[error("internal consistency error: {0}")]
    InternalInconsistency(String),
}

impl ReportError {
    pub fn invalid(field: &str, detail: impl Into<String>) -> Self {
        ReportError::InvalidInput {
            field: field.to_string(),
            detail: detail.into(),
        }
    }

    pub fn internal(detail: impl Into<String>) -> Self {
        ReportError::InternalInconsistency(detail.into())
    }

    /// True for errors that must abort compilation rather than be logged away.
    pub fn is_fatal(&self) -> bool {
        matches!(self, ReportError::InternalInconsistency(_))
    }
}
