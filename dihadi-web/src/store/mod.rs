//! Job and wage benchmark storage
//!
//! Each store is an enum over an in-memory backend and, with the `sqlite`
//! feature, a SQLite backend. Handlers only see the enum.

#[cfg(feature = "sqlite")]
pub mod database;
pub mod jobs;
pub mod wages;

pub use jobs::JobStore;
pub use wages::WageStore;
