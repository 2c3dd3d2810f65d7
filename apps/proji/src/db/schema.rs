use rusqlite::{Connection, Result};

pub fn init_database(conn: &Connection) -> Result<()> {
    conn.execute_batch(
        r#"
        -- Classes
        CREATE TABLE IF NOT EXISTS class (
            class_id INTEGER PRIMARY KEY AUTOINCREMENT,
            name TEXT NOT NULL UNIQUE
        );

        -- Class Labels
        CREATE TABLE IF NOT EXISTS class_label (
            class_id INTEGER NOT NULL REFERENCES class(class_id) ON DELETE CASCADE,
            label TEXT NOT NULL,
            UNIQUE(class_id, label)
        );

        -- Class Folders
        CREATE TABLE IF NOT EXISTS class_folder (
            class_id INTEGER NOT NULL REFERENCES class(class_id) ON DELETE CASCADE,
            target TEXT NOT NULL,
            template TEXT,
            UNIQUE(class_id, target)
        );

        -- Class Files
        CREATE TABLE IF NOT EXISTS class_file (
            class_id INTEGER NOT NULL REFERENCES class(class_id) ON DELETE CASCADE,
            target TEXT NOT NULL,
            template TEXT,
            UNIQUE(class_id, target)
        );

        -- Class Scripts
        CREATE TABLE IF NOT EXISTS class_script (
            class_id INTEGER NOT NULL REFERENCES class(class_id) ON DELETE CASCADE,
            name TEXT NOT NULL,
            run_as_sudo INTEGER NOT NULL DEFAULT 0,
            UNIQUE(class_id, name)
        );

        -- Project Statuses
        CREATE TABLE IF NOT EXISTS project_status (
            project_status_id INTEGER PRIMARY KEY,
            title TEXT NOT NULL UNIQUE,
            is_default INTEGER NOT NULL DEFAULT 0,
            comment TEXT
        );

        -- Projects
        CREATE TABLE IF NOT EXISTS project (
            project_id INTEGER PRIMARY KEY AUTOINCREMENT,
            name TEXT NOT NULL,
            class_id INTEGER NOT NULL REFERENCES class(class_id),
            install_path TEXT NOT NULL UNIQUE,
            install_date TEXT NOT NULL,
            project_status_id INTEGER NOT NULL DEFAULT 1
                REFERENCES project_status(project_status_id)
        );

        -- Indexes
        CREATE INDEX IF NOT EXISTS idx_class_label_class ON class_label(class_id);
        CREATE INDEX IF NOT EXISTS idx_class_label_label ON class_label(label);
        CREATE INDEX IF NOT EXISTS idx_class_folder_class ON class_folder(class_id);
        CREATE INDEX IF NOT EXISTS idx_class_file_class ON class_file(class_id);
        CREATE INDEX IF NOT EXISTS idx_class_script_class ON class_script(class_id);
        CREATE INDEX IF NOT EXISTS idx_project_class ON project(class_id);
        "#,
    )?;

    // Insert default statuses if not exists
    conn.execute(
        r#"
        INSERT OR IGNORE INTO project_status (project_status_id, title, is_default, comment) VALUES
            (1, 'active', 1, 'Actively worked on'),
            (2, 'inactive', 1, 'Not actively worked on'),
            (3, 'done', 1, 'No further work planned'),
            (4, 'dead', 1, 'Abandoned')
        "#,
        [],
    )?;

    Ok(())
}
