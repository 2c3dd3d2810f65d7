//! Repository for project-related database operations

use chrono::{DateTime, Utc};
use rusqlite::types::Type;
use rusqlite::{params, Connection, OptionalExtension, Row};

use crate::db::models::{Project, ProjectStatus, DEFAULT_PROJECT_STATUS_ID};
use crate::db::Database;
use crate::error::{is_unique_violation, ProjiError, Result};

impl Database {
    /// Record that a project was created from a class
    ///
    /// Sets `id`, `install_date` and `status_id` on the given project. Fails
    /// with `AlreadyExists` when a project is already tracked at the same
    /// install path.
    pub fn track_project(&self, project: &mut Project) -> Result<()> {
        let conn = self.lock()?;
        track_project(&conn, project)
    }

    pub fn load_project(&self, install_path: &str) -> Result<Project> {
        let conn = self.lock()?;
        load_project(&conn, install_path)
    }

    pub fn load_all_projects(&self) -> Result<Vec<Project>> {
        let conn = self.lock()?;
        load_all_projects(&conn)
    }

    pub fn load_project_statuses(&self) -> Result<Vec<ProjectStatus>> {
        let conn = self.lock()?;
        load_project_statuses(&conn)
    }
}

pub fn track_project(conn: &Connection, project: &mut Project) -> Result<()> {
    let now = Utc::now();

    conn.execute(
        r#"
        INSERT INTO project (name, class_id, install_path, install_date, project_status_id)
        VALUES (?1, ?2, ?3, ?4, ?5)
        "#,
        params![
            project.name,
            project.class_id,
            project.install_path,
            now.to_rfc3339(),
            DEFAULT_PROJECT_STATUS_ID,
        ],
    )
    .map_err(|e| {
        if is_unique_violation(&e) {
            ProjiError::already_exists("Project", project.install_path.clone())
        } else {
            ProjiError::Database(e)
        }
    })?;

    project.id = Some(conn.last_insert_rowid());
    project.install_date = Some(now);
    project.status_id = DEFAULT_PROJECT_STATUS_ID;

    tracing::info!(
        project_id = conn.last_insert_rowid(),
        class_id = project.class_id,
        path = %project.install_path,
        "Tracked project"
    );
    Ok(())
}

fn map_project(row: &Row<'_>) -> rusqlite::Result<Project> {
    Ok(Project {
        id: row.get(0)?,
        name: row.get(1)?,
        class_id: row.get(2)?,
        install_path: row.get(3)?,
        install_date: Some(
            row.get::<_, String>(4)?
                .parse::<DateTime<Utc>>()
                .map_err(|e| rusqlite::Error::FromSqlConversionFailure(4, Type::Text, Box::new(e)))?,
        ),
        status_id: row.get(5)?,
    })
}

pub fn load_project(conn: &Connection, install_path: &str) -> Result<Project> {
    conn.query_row(
        r#"
        SELECT project_id, name, class_id, install_path, install_date, project_status_id
        FROM project
        WHERE install_path = ?1
        "#,
        [install_path],
        map_project,
    )
    .optional()?
    .ok_or_else(|| ProjiError::not_found("Project", install_path))
}

/// Load every tracked project, oldest first
pub fn load_all_projects(conn: &Connection) -> Result<Vec<Project>> {
    let mut stmt = conn.prepare(
        r#"
        SELECT project_id, name, class_id, install_path, install_date, project_status_id
        FROM project
        ORDER BY install_date ASC, name ASC
        "#,
    )?;

    let projects = stmt
        .query_map([], map_project)?
        .collect::<std::result::Result<Vec<_>, rusqlite::Error>>()?;

    Ok(projects)
}

pub fn load_project_statuses(conn: &Connection) -> Result<Vec<ProjectStatus>> {
    let mut stmt = conn.prepare(
        r#"
        SELECT project_status_id, title, is_default, comment
        FROM project_status
        ORDER BY project_status_id
        "#,
    )?;

    let statuses = stmt
        .query_map([], |row| {
            Ok(ProjectStatus {
                id: row.get(0)?,
                title: row.get(1)?,
                is_default: row.get(2)?,
                comment: row.get(3)?,
            })
        })?
        .collect::<std::result::Result<Vec<_>, rusqlite::Error>>()?;

    Ok(statuses)
}
