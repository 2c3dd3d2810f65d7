//! Repository for class-related database operations
//!
//! A class lives in five tables: its name row in `class` plus the label,
//! folder, file and script child rows keyed by `class_id`. Saving inserts the
//! name row first to obtain the id, then writes every child row inside one
//! transaction. Any failure after the name insert rolls the transaction back
//! and deletes the name row again, so a class is either fully stored or not
//! at all.

use rusqlite::{params, Connection, OptionalExtension, Transaction};
use std::collections::BTreeMap;

use crate::db::models::{canonical_key, Class, Script};
use crate::db::Database;
use crate::error::{is_foreign_key_violation, is_unique_violation, ProjiError, Result};

impl Database {
    /// Persist a class and all of its child rows
    ///
    /// On success `class.id` holds the id assigned by the store. Fails with
    /// `AlreadyExists` if a class with the same (case-insensitive) name is
    /// already stored, and with `Validation` if the class already carries an
    /// id.
    pub fn save_class(&self, class: &mut Class) -> Result<()> {
        let _span = crate::operation_span!("save_class", name = %class.name).entered();
        let mut conn = self.lock()?;
        save_class(&mut conn, class)
    }

    pub fn load_class_by_name(&self, name: &str) -> Result<Class> {
        let conn = self.lock()?;
        let class_id = load_class_id(&conn, name)?;
        load_class(&conn, class_id, canonical_key(name))
    }

    pub fn load_class_by_id(&self, class_id: i64) -> Result<Class> {
        let conn = self.lock()?;
        let name = load_class_name(&conn, class_id)?;
        load_class(&conn, class_id, name)
    }

    /// Load every class ordered by name
    pub fn load_all_classes(&self) -> Result<Vec<Class>> {
        let conn = self.lock()?;
        load_all_classes(&conn)
    }

    /// Resolve a class name to its id
    pub fn load_class_id(&self, name: &str) -> Result<i64> {
        let conn = self.lock()?;
        load_class_id(&conn, name)
    }

    pub fn class_exists(&self, name: &str) -> Result<bool> {
        match self.load_class_id(name) {
            Ok(_) => Ok(true),
            Err(err) if err.is_not_found() => Ok(false),
            Err(err) => Err(err),
        }
    }

    /// Remove a class together with all of its child rows
    pub fn remove_class(&self, name: &str) -> Result<()> {
        let _span = crate::operation_span!("remove_class", name = %name).entered();
        let mut conn = self.lock()?;
        remove_class(&mut conn, name)
    }

    /// Return the id of a class carrying `label`
    ///
    /// Labels may be shared between classes; the lowest class id wins.
    pub fn does_label_exist(&self, label: &str) -> Result<i64> {
        let conn = self.lock()?;
        does_label_exist(&conn, label)
    }
}

/// Save a class: name row first, then all child rows in one transaction
pub fn save_class(conn: &mut Connection, class: &mut Class) -> Result<()> {
    if let Some(class_id) = class.id {
        return Err(ProjiError::validation(format!(
            "Class {class_id} is already saved and cannot be saved again"
        )));
    }

    let name = canonical_key(&class.name);
    if name.is_empty() {
        return Err(ProjiError::validation("Class name cannot be empty"));
    }

    insert_class_name(conn, &name)?;

    // The name row exists from here on and must be removed on any failure
    let class_id = match load_class_id(conn, &name) {
        Ok(id) => id,
        Err(err) => return Err(cancel_save(conn, &name, err)),
    };

    if let Err(err) = save_children(conn, class_id, class) {
        return Err(cancel_save(conn, &name, err));
    }

    class.id = Some(class_id);
    tracing::info!(class_id, name = %name, "Saved class");
    Ok(())
}

fn insert_class_name(conn: &Connection, name: &str) -> Result<()> {
    conn.execute("INSERT INTO class (name) VALUES (?1)", [name])
        .map_err(|e| {
            if is_unique_violation(&e) {
                ProjiError::already_exists("Class", name)
            } else {
                ProjiError::Database(e)
            }
        })?;
    Ok(())
}

fn save_children(conn: &mut Connection, class_id: i64, class: &Class) -> Result<()> {
    let tx = conn.transaction()?;

    if let Err(err) = save_children_tx(&tx, class_id, class) {
        if let Err(rollback_err) = tx.rollback() {
            return Err(ProjiError::Transaction(format!(
                "{err}; rollback failed: {rollback_err}"
            )));
        }
        return Err(err);
    }

    tx.commit()
        .map_err(|e| ProjiError::Transaction(format!("commit failed: {e}")))
}

fn save_children_tx(tx: &Transaction<'_>, class_id: i64, class: &Class) -> Result<()> {
    save_labels_tx(tx, class_id, &class.labels)?;
    save_targets_tx(tx, "class_folder", class_id, &class.folders)?;
    save_targets_tx(tx, "class_file", class_id, &class.files)?;
    save_scripts_tx(tx, class_id, &class.scripts)?;
    Ok(())
}

/// Undo a partially saved class by deleting its name row
///
/// Returns the error the caller should surface: the original one, or a
/// transaction error when the cleanup itself failed.
fn cancel_save(conn: &Connection, name: &str, err: ProjiError) -> ProjiError {
    tracing::warn!(name = %name, error = %err, "Saving class failed, removing partial rows");

    match conn.execute("DELETE FROM class WHERE name = ?1", [name]) {
        Ok(_) => err,
        Err(cleanup_err) => {
            tracing::error!(name = %name, error = %cleanup_err, "Failed to remove partial class");
            ProjiError::Transaction(format!("{err}; cleanup failed: {cleanup_err}"))
        }
    }
}

fn save_labels_tx(tx: &Transaction<'_>, class_id: i64, labels: &[String]) -> Result<()> {
    let mut stmt = tx.prepare("INSERT INTO class_label (class_id, label) VALUES (?1, ?2)")?;

    for label in labels {
        stmt.execute(params![class_id, canonical_key(label)])?;
    }
    Ok(())
}

/// Insert folder or file targets; `table` is one of the two fixed target tables
fn save_targets_tx(
    tx: &Transaction<'_>,
    table: &'static str,
    class_id: i64,
    targets: &BTreeMap<String, Option<String>>,
) -> Result<()> {
    let sql = format!("INSERT INTO {table} (class_id, target, template) VALUES (?1, ?2, ?3)");
    let mut stmt = tx.prepare(&sql)?;

    for (target, template) in targets {
        let template = template.as_deref().filter(|t| !t.is_empty());
        stmt.execute(params![class_id, target, template])?;
    }
    Ok(())
}

fn save_scripts_tx(tx: &Transaction<'_>, class_id: i64, scripts: &[Script]) -> Result<()> {
    let mut stmt =
        tx.prepare("INSERT INTO class_script (class_id, name, run_as_sudo) VALUES (?1, ?2, ?3)")?;

    for script in scripts {
        stmt.execute(params![class_id, script.name, script.run_as_sudo])?;
    }
    Ok(())
}

/// Find a class id by name
pub fn load_class_id(conn: &Connection, name: &str) -> Result<i64> {
    let name = canonical_key(name);
    conn.query_row(
        "SELECT class_id FROM class WHERE name = ?1",
        [&name],
        |row| row.get(0),
    )
    .optional()?
    .ok_or_else(|| ProjiError::not_found("Class", name))
}

fn load_class_name(conn: &Connection, class_id: i64) -> Result<String> {
    conn.query_row(
        "SELECT name FROM class WHERE class_id = ?1",
        [class_id],
        |row| row.get(0),
    )
    .optional()?
    .ok_or_else(|| ProjiError::not_found("Class", class_id.to_string()))
}

/// Hydrate a class whose id and name are already known
fn load_class(conn: &Connection, class_id: i64, name: String) -> Result<Class> {
    Ok(Class {
        id: Some(class_id),
        name,
        labels: load_labels(conn, class_id)?,
        folders: load_targets(conn, "class_folder", class_id)?,
        files: load_targets(conn, "class_file", class_id)?,
        scripts: load_scripts(conn, class_id)?,
    })
}

pub fn load_all_classes(conn: &Connection) -> Result<Vec<Class>> {
    let mut stmt = conn.prepare("SELECT class_id, name FROM class ORDER BY name")?;

    let rows = stmt
        .query_map([], |row| Ok((row.get::<_, i64>(0)?, row.get::<_, String>(1)?)))?
        .collect::<std::result::Result<Vec<_>, rusqlite::Error>>()?;

    rows.into_iter()
        .map(|(class_id, name)| load_class(conn, class_id, name))
        .collect()
}

fn load_labels(conn: &Connection, class_id: i64) -> Result<Vec<String>> {
    let mut stmt =
        conn.prepare("SELECT label FROM class_label WHERE class_id = ?1 ORDER BY label")?;

    let labels = stmt
        .query_map([class_id], |row| row.get(0))?
        .collect::<std::result::Result<Vec<String>, rusqlite::Error>>()?;

    Ok(labels)
}

fn load_targets(
    conn: &Connection,
    table: &'static str,
    class_id: i64,
) -> Result<BTreeMap<String, Option<String>>> {
    let sql = format!("SELECT target, template FROM {table} WHERE class_id = ?1 ORDER BY target");
    let mut stmt = conn.prepare(&sql)?;

    let targets = stmt
        .query_map([class_id], |row| {
            Ok((row.get::<_, String>(0)?, row.get::<_, Option<String>>(1)?))
        })?
        .collect::<std::result::Result<BTreeMap<String, Option<String>>, rusqlite::Error>>()?;

    Ok(targets)
}

fn load_scripts(conn: &Connection, class_id: i64) -> Result<Vec<Script>> {
    let mut stmt = conn.prepare(
        "SELECT name, run_as_sudo FROM class_script WHERE class_id = ?1 ORDER BY run_as_sudo, name",
    )?;

    let scripts = stmt
        .query_map([class_id], |row| {
            Ok(Script {
                name: row.get(0)?,
                run_as_sudo: row.get(1)?,
            })
        })?
        .collect::<std::result::Result<Vec<_>, rusqlite::Error>>()?;

    Ok(scripts)
}

/// Delete a class and all of its child rows in one transaction
pub fn remove_class(conn: &mut Connection, name: &str) -> Result<()> {
    let class_id = load_class_id(conn, name)?;
    let tx = conn.transaction()?;

    if let Err(err) = remove_class_tx(&tx, class_id) {
        tracing::warn!(class_id, error = %err, "Removing class failed, rolling back");
        if let Err(rollback_err) = tx.rollback() {
            return Err(ProjiError::Transaction(format!(
                "{err}; rollback failed: {rollback_err}"
            )));
        }
        return Err(err);
    }

    tx.commit()
        .map_err(|e| ProjiError::Transaction(format!("commit failed: {e}")))?;

    tracing::info!(class_id, name = %name, "Removed class");
    Ok(())
}

fn remove_class_tx(tx: &Transaction<'_>, class_id: i64) -> Result<()> {
    for table in ["class_label", "class_folder", "class_file", "class_script"] {
        let removed = tx.execute(
            &format!("DELETE FROM {table} WHERE class_id = ?1"),
            [class_id],
        )?;
        tracing::debug!(class_id, table, removed, "Removed class rows");
    }

    tx.execute("DELETE FROM class WHERE class_id = ?1", [class_id])
        .map_err(|e| {
            if is_foreign_key_violation(&e) {
                ProjiError::validation(format!(
                    "Class {class_id} is still referenced by tracked projects"
                ))
            } else {
                ProjiError::Database(e)
            }
        })?;
    Ok(())
}

/// Find the id of a class carrying `label`
pub fn does_label_exist(conn: &Connection, label: &str) -> Result<i64> {
    let label = canonical_key(label);
    conn.query_row(
        "SELECT class_id FROM class_label WHERE label = ?1 ORDER BY class_id LIMIT 1",
        [&label],
        |row| row.get(0),
    )
    .optional()?
    .ok_or_else(|| ProjiError::not_found("Label", label))
}
