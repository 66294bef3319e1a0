//! Claims domain errors
//!
//! Every operation of the workflow surfaces one of these variants. Adapter
//! failures arrive as [`PortError`] and are folded into the same taxonomy so
//! callers never see a backend-specific error.

use thiserror::Error;

use core_kernel::{CoreError, MoneyError, PortError, TemporalError};

/// Errors that can occur in the claims domain
#[derive(Debug, Error)]
pub enum ClaimError {
    /// Bad input shape or values; the caller must fix and resubmit
    #[error("Validation failed: {0}")]
    Validation(String),

    #[error("{entity} not found: {id}")]
    NotFound { entity: String, id: String },

    #[error("Permission denied: {role} may not {action}")]
    PermissionDenied { role: String, action: String },

    #[error("Invalid status transition from {from} to {to}")]
    InvalidTransition { from: String, to: String },

    /// The record changed since the caller last read it
    #[error("Concurrent modification: {0}")]
    Conflict(String),

    #[error("File rejected: {file_name}: {reason}")]
    FileRejected { file_name: String, reason: String },

    /// Backing store or blob store failure
    #[error("Service unavailable: {0}")]
    Unavailable(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl ClaimError {
    pub fn validation(message: impl Into<String>) -> Self {
        ClaimError::Validation(message.into())
    }

    pub fn not_found(entity: impl Into<String>, id: impl std::fmt::Display) -> Self {
        ClaimError::NotFound {
            entity: entity.into(),
            id: id.to_string(),
        }
    }

    pub fn permission_denied(role: impl std::fmt::Display, action: impl Into<String>) -> Self {
        ClaimError::PermissionDenied {
            role: role.to_string(),
            action: action.into(),
        }
    }

    pub fn file_rejected(file_name: impl Into<String>, reason: impl Into<String>) -> Self {
        ClaimError::FileRejected {
            file_name: file_name.into(),
            reason: reason.into(),
        }
    }

    /// Stable machine-readable code for the variant
    pub fn code(&self) -> &'static str {
        match self {
            ClaimError::Validation(_) => "validation_error",
            ClaimError::NotFound { .. } => "not_found",
            ClaimError::PermissionDenied { .. } => "permission_denied",
            ClaimError::InvalidTransition { .. } => "invalid_transition",
            ClaimError::Conflict(_) => "conflict",
            ClaimError::FileRejected { .. } => "file_rejected",
            ClaimError::Unavailable(_) => "unavailable",
            ClaimError::Internal(_) => "internal_error",
        }
    }

    /// Message suitable for showing to the person who made the request
    pub fn user_message(&self) -> String {
        match self {
            ClaimError::Validation(msg) => format!("Please correct the claim: {}", msg),
            ClaimError::NotFound { entity, .. } => format!("{} not found.", entity),
            ClaimError::PermissionDenied { .. } => {
                "You don't have permission to perform this action.".to_string()
            }
            ClaimError::InvalidTransition { from, .. } => {
                format!("Claim is already {} and cannot be changed this way.", from)
            }
            ClaimError::Conflict(_) => {
                "Another user updated this claim. Refresh and try again.".to_string()
            }
            ClaimError::FileRejected { file_name, reason } => {
                format!("File {} was rejected: {}.", file_name, reason)
            }
            ClaimError::Unavailable(_) => {
                "The claim service is temporarily unavailable. Please try again.".to_string()
            }
            ClaimError::Internal(_) => {
                "An unexpected error occurred. Please contact support.".to_string()
            }
        }
    }

    pub fn is_conflict(&self) -> bool {
        matches!(self, ClaimError::Conflict(_))
    }
}

impl From<PortError> for ClaimError {
    fn from(error: PortError) -> Self {
        match error {
            PortError::NotFound { entity_type, id } => ClaimError::NotFound { entity: entity_type, id },
            PortError::Validation { message, field: Some(field) } => {
                ClaimError::Validation(format!("{}: {}", field, message))
            }
            PortError::Validation { message, field: None } => ClaimError::Validation(message),
            PortError::Conflict { message } => ClaimError::Conflict(message),
            other => ClaimError::Unavailable(other.to_string()),
        }
    }
}

impl From<CoreError> for ClaimError {
    fn from(error: CoreError) -> Self {
        ClaimError::Validation(error.to_string())
    }
}

impl From<MoneyError> for ClaimError {
    fn from(error: MoneyError) -> Self {
        ClaimError::Validation(error.to_string())
    }
}

impl From<TemporalError> for ClaimError {
    fn from(error: TemporalError) -> Self {
        ClaimError::Validation(error.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_port_errors_map_onto_taxonomy() {
        let not_found: ClaimError = PortError::not_found("Claim", "CLM-000009").into();
        assert_eq!(not_found.code(), "not_found");

        let conflict: ClaimError = PortError::conflict("stale version").into();
        assert!(conflict.is_conflict());

        let field: ClaimError = PortError::validation_field("must be positive", "hours_worked").into();
        assert_eq!(field.to_string(), "Validation failed: hours_worked: must be positive");

        let down: ClaimError = PortError::connection("refused").into();
        assert_eq!(down.code(), "unavailable");
    }

    #[test]
    fn test_user_messages_do_not_leak_internals() {
        let err = ClaimError::Unavailable("pool timed out on 10.0.0.4".to_string());
        assert!(!err.user_message().contains("10.0.0.4"));
    }
}
