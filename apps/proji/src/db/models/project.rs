//! Project-related models

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Status assigned to newly tracked projects
pub const DEFAULT_PROJECT_STATUS_ID: i64 = 1;

/// One instantiation of a class at a filesystem path
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Project {
    pub id: Option<i64>,
    pub name: String,
    pub class_id: i64,
    pub install_path: String,
    /// Set by the store when the project is tracked
    pub install_date: Option<DateTime<Utc>>,
    pub status_id: i64,
}

impl Project {
    pub fn new(name: impl Into<String>, class_id: i64, install_path: impl Into<String>) -> Self {
        Self {
            id: None,
            name: name.into(),
            class_id,
            install_path: install_path.into(),
            install_date: None,
            status_id: DEFAULT_PROJECT_STATUS_ID,
        }
    }
}

/// Lifecycle status a project can be in
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProjectStatus {
    pub id: i64,
    pub title: String,
    pub is_default: bool,
    pub comment: Option<String>,
}
