//! Error types for Vary operations
//!
//! Every error variant carries a stable error code (e.g., `SUBJECT_NOT_FOUND`)
//! and a category, so callers can switch on codes or group errors without
//! string-matching messages.
//!
//! # Example
//!
//! ```rust
//! use vary_core::error::{VaryError, ErrorCategory};
//!
//! fn handle_error(err: VaryError) {
//!     match err.category() {
//!         ErrorCategory::NotFound => println!("Subject missing"),
//!         ErrorCategory::Validation => println!("Bad registration"),
//!         ErrorCategory::Internal => println!("Engine bug"),
//!     }
//! }
//! ```

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Result type alias for Vary operations
pub type Result<T> = std::result::Result<T, VaryError>;

/// Error category for grouping related errors
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorCategory {
    /// Subject or variant doesn't exist
    NotFound,
    /// Registration input was rejected before mutating state
    Validation,
    /// Engine-internal failure
    Internal,
}

/// Errors that can occur in Vary operations
///
/// Note the taxonomy deliberately has no "no trigger matched" error: falling
/// through to the default variant is the expected common path, not a failure.
#[derive(Error, Debug)]
pub enum VaryError {
    /// No entry registered for the requested subject
    #[error("Subject not found: '{subject_id}'. Register it with register_subject() first.")]
    SubjectNotFound { subject_id: String },

    /// Subject was registered with an empty variant set and cannot resolve
    #[error("Subject '{subject_id}' has no variants to select from.")]
    SubjectEmpty { subject_id: String },

    /// The designated default variant is absent from the variant set
    #[error("Default variant '{variant}' not found among variants of subject '{subject_id}'.")]
    DefaultVariantMissing { subject_id: String, variant: String },

    /// Two variants in one registration share a name
    #[error("Duplicate variant name '{variant}' in registration for subject '{subject_id}'.")]
    DuplicateVariant { subject_id: String, variant: String },

    /// Subject manifest is malformed or missing required fields
    #[error("Invalid subject manifest: {reason}")]
    InvalidManifest { reason: String },

    /// Registry lock is poisoned (panic occurred while holding the write lock)
    #[error("Registry lock poisoned. This is a bug; please report it.")]
    RegistryLocked,

    /// JSON serialization or deserialization failed
    #[error("JSON error: {0}")]
    JsonError(#[from] serde_json::Error),
}

impl VaryError {
    /// Returns true if this error might succeed on retry
    pub fn is_recoverable(&self) -> bool {
        matches!(self, VaryError::RegistryLocked)
    }

    /// Returns the error category for grouping
    pub fn category(&self) -> ErrorCategory {
        match self {
            VaryError::SubjectNotFound { .. } | VaryError::SubjectEmpty { .. } => {
                ErrorCategory::NotFound
            }

            VaryError::DefaultVariantMissing { .. }
            | VaryError::DuplicateVariant { .. }
            | VaryError::InvalidManifest { .. }
            | VaryError::JsonError(_) => ErrorCategory::Validation,

            VaryError::RegistryLocked => ErrorCategory::Internal,
        }
    }

    /// Returns the stable error code for this error
    ///
    /// Codes are uppercase, underscore-separated identifiers that remain
    /// stable across versions; use them for client handling and alerting.
    pub fn error_code(&self) -> &'static str {
        match self {
            VaryError::SubjectNotFound { .. } => "SUBJECT_NOT_FOUND",
            VaryError::SubjectEmpty { .. } => "SUBJECT_EMPTY",
            VaryError::DefaultVariantMissing { .. } => "DEFAULT_VARIANT_MISSING",
            VaryError::DuplicateVariant { .. } => "DUPLICATE_VARIANT",
            VaryError::InvalidManifest { .. } => "INVALID_MANIFEST",
            VaryError::RegistryLocked => "REGISTRY_LOCKED",
            VaryError::JsonError(_) => "JSON_ERROR",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_codes() {
        assert_eq!(
            VaryError::SubjectNotFound {
                subject_id: "card".to_string()
            }
            .error_code(),
            "SUBJECT_NOT_FOUND"
        );
        assert_eq!(
            VaryError::DefaultVariantMissing {
                subject_id: "card".to_string(),
                variant: "compact".to_string()
            }
            .error_code(),
            "DEFAULT_VARIANT_MISSING"
        );
    }

    #[test]
    fn test_error_categories() {
        assert_eq!(
            VaryError::SubjectNotFound {
                subject_id: "card".to_string()
            }
            .category(),
            ErrorCategory::NotFound
        );
        assert_eq!(
            VaryError::DuplicateVariant {
                subject_id: "card".to_string(),
                variant: "compact".to_string()
            }
            .category(),
            ErrorCategory::Validation
        );
        assert_eq!(VaryError::RegistryLocked.category(), ErrorCategory::Internal);
    }

    #[test]
    fn test_error_is_recoverable() {
        assert!(VaryError::RegistryLocked.is_recoverable());
        assert!(!VaryError::SubjectNotFound {
            subject_id: "card".to_string()
        }
        .is_recoverable());
    }

    #[test]
    fn test_error_messages_are_helpful() {
        let err = VaryError::SubjectNotFound {
            subject_id: "card-123".to_string(),
        };
        let msg = err.to_string();
        assert!(msg.contains("card-123"));
        assert!(msg.contains("register_subject"));
    }
}
