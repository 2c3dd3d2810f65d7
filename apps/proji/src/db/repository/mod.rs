//! Repository pattern implementations for database operations
//!
//! Free functions work on a borrowed connection or transaction; the
//! `Database` methods defined alongside them take the connection lock.

pub mod class_repo;
pub mod project_repo;

pub use class_repo::*;
pub use project_repo::*;
