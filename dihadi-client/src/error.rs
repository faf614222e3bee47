//! Client error type

use dihadi_core::{DihadiError, FormErrors};
use thiserror::Error;

pub type ClientResult<T> = Result<T, ClientError>;

#[derive(Error, Debug)]
pub enum ClientError {
    #[error("Request failed: {0}")]
    Http(#[from] reqwest::Error),

    /// The server answered with an error body
    #[error("{message}")]
    Api {
        status: u16,
        code: String,
        message: String,
        field_errors: Option<FormErrors>,
    },

    /// The server rejected the token; the session has been ended
    #[error("Session expired. Please log in again.")]
    Unauthorized,

    #[error("Not logged in")]
    NotAuthenticated,

    /// Rejected locally before any request was sent
    #[error("Invalid input: {0}")]
    Validation(FormErrors),

    #[error(transparent)]
    Core(#[from] DihadiError),
}

impl ClientError {
    /// Field-scoped messages, whether found locally or reported by the server
    pub fn field_errors(&self) -> Option<&FormErrors> {
        match self {
            ClientError::Validation(errors) => Some(errors),
            ClientError::Api { field_errors, .. } => field_errors.as_ref(),
            ClientError::Core(e) => e.field_errors(),
            _ => None,
        }
    }

    pub fn status(&self) -> Option<u16> {
        match self {
            ClientError::Api { status, .. } => Some(*status),
            ClientError::Unauthorized => Some(401),
            ClientError::Http(e) => e.status().map(|s| s.as_u16()),
            _ => None,
        }
    }
}
