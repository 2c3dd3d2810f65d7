//! Data models for proji
//!
//! This module contains the value types persisted by the class store and
//! the project tracker.

mod class;
mod project;

pub use class::*;
pub use project::*;
