//! Unified error handling
//!
//! Structured error type with context shared by the server and the client

use crate::validation::FormErrors;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{error, warn};

pub type DihadiResult<T> = Result<T, DihadiError>;

/// Error context carried by most error variants for log correlation
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorContext {
    /// Unique error ID for tracking
    pub error_id: String,
    /// Timestamp when error occurred
    pub timestamp: DateTime<Utc>,
    /// Component where error originated
    pub component: String,
    /// Operation being performed when error occurred
    pub operation: Option<String>,
    /// Additional metadata
    pub metadata: std::collections::HashMap<String, String>,
}

impl ErrorContext {
    pub fn new(component: &str) -> Self {
        Self {
            error_id: uuid::Uuid::new_v4().to_string(),
            timestamp: Utc::now(),
            component: component.to_string(),
            operation: None,
            metadata: std::collections::HashMap::new(),
        }
    }

    pub fn with_operation(mut self, operation: &str) -> Self {
        self.operation = Some(operation.to_string());
        self
    }

    pub fn with_metadata(mut self, key: &str, value: &str) -> Self {
        self.metadata.insert(key.to_string(), value.to_string());
        self
    }
}

/// Main error type for the marketplace
#[derive(Error, Debug)]
pub enum DihadiError {
    #[error("Validation failed: {errors}")]
    Validation {
        errors: FormErrors,
        context: ErrorContext,
    },

    #[error("Resource not found: {resource}")]
    NotFound {
        resource: String,
        context: ErrorContext,
    },

    #[error("Conflict: {message}")]
    Conflict {
        message: String,
        context: ErrorContext,
    },

    #[error("Forbidden: {message}")]
    Forbidden {
        message: String,
        context: ErrorContext,
    },

    #[error("Authentication error: {message}")]
    Authentication {
        message: String,
        context: ErrorContext,
    },

    #[error("Storage error: {message}")]
    Storage {
        message: String,
        #[source]
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
        context: ErrorContext,
    },

    #[error("Configuration error: {message}")]
    Config {
        message: String,
        context: ErrorContext,
    },

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl DihadiError {
    pub fn validation(errors: FormErrors, component: &str) -> Self {
        DihadiError::Validation {
            errors,
            context: ErrorContext::new(component),
        }
    }

    pub fn not_found(resource: impl Into<String>, component: &str) -> Self {
        DihadiError::NotFound {
            resource: resource.into(),
            context: ErrorContext::new(component),
        }
    }

    pub fn conflict(message: impl Into<String>, component: &str) -> Self {
        DihadiError::Conflict {
            message: message.into(),
            context: ErrorContext::new(component),
        }
    }

    pub fn forbidden(message: impl Into<String>, component: &str) -> Self {
        DihadiError::Forbidden {
            message: message.into(),
            context: ErrorContext::new(component),
        }
    }

    pub fn storage<E>(message: impl Into<String>, component: &str, source: E) -> Self
    where
        E: std::error::Error + Send + Sync + 'static,
    {
        DihadiError::Storage {
            message: message.into(),
            source: Some(Box::new(source)),
            context: ErrorContext::new(component),
        }
    }

    /// Get the error context
    pub fn context(&self) -> Option<&ErrorContext> {
        match self {
            DihadiError::Validation { context, .. } => Some(context),
            DihadiError::NotFound { context, .. } => Some(context),
            DihadiError::Conflict { context, .. } => Some(context),
            DihadiError::Forbidden { context, .. } => Some(context),
            DihadiError::Authentication { context, .. } => Some(context),
            DihadiError::Storage { context, .. } => Some(context),
            DihadiError::Config { context, .. } => Some(context),
            _ => None,
        }
    }

    /// Field errors for validation failures
    pub fn field_errors(&self) -> Option<&FormErrors> {
        match self {
            DihadiError::Validation { errors, .. } => Some(errors),
            _ => None,
        }
    }

    /// Whether the error was caused by the caller rather than the system
    pub fn is_client_error(&self) -> bool {
        matches!(
            self,
            DihadiError::Validation { .. }
                | DihadiError::NotFound { .. }
                | DihadiError::Conflict { .. }
                | DihadiError::Forbidden { .. }
                | DihadiError::Authentication { .. }
        )
    }

    /// Log the error with appropriate level
    pub fn log(&self) {
        if self.is_client_error() {
            warn!(
                error_id = ?self.context().map(|c| &c.error_id),
                error = %self,
                "Request rejected"
            );
        } else {
            error!(
                error_id = ?self.context().map(|c| &c.error_id),
                error = %self,
                "Error occurred"
            );
        }
    }
}

/// Build a storage error for the given component
#[macro_export]
macro_rules! storage_error {
    ($msg:expr, $component:expr) => {
        $crate::DihadiError::Storage {
            message: $msg.to_string(),
            source: None,
            context: $crate::ErrorContext::new($component),
        }
    };
    ($msg:expr, $component:expr, $source:expr) => {
        $crate::DihadiError::Storage {
            message: $msg.to_string(),
            source: Some(Box::new($source)),
            context: $crate::ErrorContext::new($component),
        }
    };
}

#[macro_export]
macro_rules! config_error {
    ($msg:expr, $component:expr) => {
        $crate::DihadiError::Config {
            message: $msg.to_string(),
            context: $crate::ErrorContext::new($component),
        }
    };
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_context_builder() {
        let context = ErrorContext::new("jobs")
            .with_operation("apply")
            .with_metadata("job_id", "42");

        assert_eq!(context.component, "jobs");
        assert_eq!(context.operation.as_deref(), Some("apply"));
        assert_eq!(context.metadata.get("job_id").map(String::as_str), Some("42"));
        assert!(!context.error_id.is_empty());
    }

    #[test]
    fn test_client_error_classification() {
        assert!(DihadiError::not_found("job 1", "jobs").is_client_error());
        assert!(DihadiError::conflict("Already applied", "jobs").is_client_error());
        assert!(!storage_error!("disk full", "jobs").is_client_error());
    }

    #[test]
    fn test_validation_error_exposes_fields() {
        let mut errors = FormErrors::new();
        errors.set("title", "Title is required");
        let err = DihadiError::validation(errors, "jobs");

        let fields = err.field_errors().unwrap();
        assert_eq!(fields.get("title"), Some("Title is required"));
        assert!(err.context().is_some());
    }
}
