//! Dihadi core
//!
//! Domain model, request payloads, validation, session windows and the shared
//! error and logging setup used by the API server and the client.

pub mod config;
pub mod error;
pub mod logging;
pub mod requests;
pub mod types;
pub mod validation;

pub use config::*;
pub use error::*;
pub use logging::*;
pub use requests::*;
pub use types::*;
pub use validation::*;
