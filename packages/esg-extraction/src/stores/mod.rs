//! Result store implementations.
//!
//! Available backends:
//! - `MemoryResultStore` - In-memory storage (always available)
//! - `SqliteResultStore` - SQLite storage (requires `sqlite` feature)

pub mod memory;

#[cfg(feature = "sqlite")]
pub mod sqlite;

pub use memory::MemoryResultStore;

#[cfg(feature = "sqlite")]
pub use sqlite::SqliteResultStore;
