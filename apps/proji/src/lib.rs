//! proji keeps reusable project templates ("classes") in a local SQLite
//! store, tracks the projects created from them, and imports class layouts
//! from GitHub or GitLab repository trees.

pub mod config;
pub mod db;
pub mod error;
pub mod logging;
pub mod repo;

pub use config::Config;
pub use db::models::{Class, Project, ProjectStatus, Script};
pub use db::Database;
pub use error::{ProjiError, Result};
pub use repo::{importer_for, importer_from_url, EntryType, Importer, RepoSource, RepoTree};
