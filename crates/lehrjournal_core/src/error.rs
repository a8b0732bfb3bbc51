//! crates/lehrjournal_core/src/error.rs
//!
//! The error type of the workflow layer. Its variants are the failure kinds
//! the callable operations report to clients.

use crate::ports::PortError;

#[derive(Debug, thiserror::Error)]
pub enum ServiceError {
    #[error("{0}")]
    Unauthenticated(String),
    #[error("{0}")]
    PermissionDenied(String),
    #[error("{0}")]
    InvalidArgument(String),
    #[error("{0}")]
    NotFound(String),
    #[error("{0}")]
    Internal(String),
}

pub type ServiceResult<T> = Result<T, ServiceError>;

impl ServiceError {
    /// The wire name of the failure kind.
    pub fn code(&self) -> &'static str {
        match self {
            ServiceError::Unauthenticated(_) => "unauthenticated",
            ServiceError::PermissionDenied(_) => "permission-denied",
            ServiceError::InvalidArgument(_) => "invalid-argument",
            ServiceError::NotFound(_) => "not-found",
            ServiceError::Internal(_) => "internal",
        }
    }

    pub fn invalid(msg: impl Into<String>) -> Self {
        ServiceError::InvalidArgument(msg.into())
    }

    pub fn denied(msg: impl Into<String>) -> Self {
        ServiceError::PermissionDenied(msg.into())
    }
}

impl From<PortError> for ServiceError {
    fn from(err: PortError) -> Self {
        match err {
            PortError::NotFound(msg) => ServiceError::NotFound(msg),
            PortError::Unauthorized => {
                ServiceError::Unauthenticated("Not signed in".to_string())
            }
            other => ServiceError::Internal(other.to_string()),
        }
    }
}

/// Fails with `invalid-argument` when a required text field is blank.
pub fn require_field(value: &str, field: &str) -> ServiceResult<()> {
    if value.trim().is_empty() {
        return Err(ServiceError::invalid(format!("Missing required field: {}", field)));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn port_errors_map_to_kinds() {
        let e: ServiceError = PortError::NotFound("entry".into()).into();
        assert_eq!(e.code(), "not-found");
        let e: ServiceError = PortError::InvalidCredential.into();
        assert_eq!(e.code(), "internal");
        let e: ServiceError = PortError::Unauthorized.into();
        assert_eq!(e.code(), "unauthenticated");
    }

    #[test]
    fn blank_fields_are_rejected() {
        assert!(require_field("Anna", "name").is_ok());
        let err = require_field("   ", "name").unwrap_err();
        assert_eq!(err.code(), "invalid-argument");
        assert!(err.to_string().contains("name"));
    }
}
