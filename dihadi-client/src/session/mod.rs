//! Client-side session lifecycle

pub mod clock;
pub mod manager;
pub mod monitor;
pub mod store;

pub use clock::{Clock, ManualClock, SystemClock};
pub use manager::{ActivityOutcome, SessionManager};
pub use monitor::{MonitorHandle, SessionMonitor};
pub use store::{FileTokenStore, MemoryTokenStore, StoredSession, TokenStore};
