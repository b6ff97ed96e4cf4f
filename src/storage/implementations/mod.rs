//! Storage implementations
//!
//! ## Available Implementations
//!
//! - `sqlite` - SQLite-based storage (requires `sqlite` feature)
//! - `memory` - In-memory storage for testing
//! - `fs` - Filesystem-based storage

#[cfg(feature = "sqlite")]
pub mod sqlite;

pub mod fs;
pub mod memory;
