//! Dihadi client
//!
//! Session lifecycle management for a logged-in user: sliding expiry, the
//! expiry warning and countdown, forced logout, and a REST client that keeps
//! the session in step with the server.
//!
//! ```no_run
//! use dihadi_client::{ApiClient, AuthContext, SessionManager, SessionMonitor};
//! use dihadi_client::session::{FileTokenStore, SystemClock};
//! use dihadi_core::SessionWindows;
//! use std::sync::Arc;
//!
//! # async fn run() -> Result<(), Box<dyn std::error::Error>> {
//! let windows = SessionWindows::default();
//! let store = FileTokenStore::new(FileTokenStore::default_path())?;
//! let manager = SessionManager::new(windows.clone(), Arc::new(SystemClock), Box::new(store));
//! let auth = Arc::new(AuthContext::new(manager));
//! auth.restore().await;
//!
//! let monitor = SessionMonitor::spawn(auth.clone(), &windows);
//! let api = ApiClient::new("http://localhost:5000", auth)?;
//! let jobs = api.list_jobs(&Default::default()).await?;
//! println!("{} open jobs", jobs.len());
//! monitor.shutdown().await;
//! # Ok(())
//! # }
//! ```

pub mod api;
pub mod auth_context;
pub mod error;
pub mod session;

pub use api::{ApiClient, HealthStatus};
pub use auth_context::{
    format_countdown, ActivityKind, AuthContext, LogoutReason, Notice, NoticeLevel, PollOutcome,
    Route, SessionEvent,
};
pub use error::{ClientError, ClientResult};
pub use session::{ActivityOutcome, MonitorHandle, SessionManager, SessionMonitor};
