use chrono::Utc;
use rusqlite::{Connection, OptionalExtension};
use serde::Serialize;
use std::path::Path;
use uuid::Uuid;

pub const STORE_FILE: &str = "quizbank.sqlite3";

pub fn open_store(workspace: &Path) -> anyhow::Result<Connection> {
    std::fs::create_dir_all(workspace)?;
    let db_path = workspace.join(STORE_FILE);
    let conn = Connection::open(db_path)?;

    // String-keyed documents, written wholesale. This mirrors the browser
    // origin of the data model: one JSON value per key.
    conn.execute(
        "CREATE TABLE IF NOT EXISTS store(
            key TEXT PRIMARY KEY,
            value TEXT NOT NULL,
            updated_at TEXT
        )",
        [],
    )?;

    // Early builds created the store table without updated_at. Add if needed.
    ensure_store_updated_at(&conn)?;

    conn.execute(
        "CREATE TABLE IF NOT EXISTS activity_log(
            id TEXT PRIMARY KEY,
            at TEXT NOT NULL,
            action TEXT NOT NULL,
            details TEXT NOT NULL
        )",
        [],
    )?;
    conn.execute(
        "CREATE INDEX IF NOT EXISTS idx_activity_log_at ON activity_log(at)",
        [],
    )?;

    Ok(conn)
}

pub fn store_get_json(conn: &Connection, key: &str) -> anyhow::Result<Option<serde_json::Value>> {
    let raw: Option<String> = conn
        .query_row("SELECT value FROM store WHERE key = ?", [key], |row| {
            row.get(0)
        })
        .optional()?;
    match raw {
        Some(text) => Ok(Some(serde_json::from_str(&text)?)),
        None => Ok(None),
    }
}

pub fn store_set_json(
    conn: &Connection,
    key: &str,
    value: &serde_json::Value,
) -> anyhow::Result<()> {
    let text = serde_json::to_string(value)?;
    conn.execute(
        "INSERT INTO store(key, value, updated_at) VALUES(?, ?, ?)
         ON CONFLICT(key) DO UPDATE SET value = excluded.value, updated_at = excluded.updated_at",
        (key, text, Utc::now().to_rfc3339()),
    )?;
    Ok(())
}

pub fn store_remove(conn: &Connection, key: &str) -> anyhow::Result<()> {
    conn.execute("DELETE FROM store WHERE key = ?", [key])?;
    Ok(())
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ActivityEntry {
    pub id: String,
    pub at: String,
    pub action: String,
    pub details: String,
}

pub fn record_activity(conn: &Connection, action: &str, details: &str) -> anyhow::Result<()> {
    conn.execute(
        "INSERT INTO activity_log(id, at, action, details) VALUES(?, ?, ?, ?)",
        (
            Uuid::new_v4().to_string(),
            Utc::now().to_rfc3339(),
            action,
            details,
        ),
    )?;
    Ok(())
}

pub fn list_activity(conn: &Connection, limit: usize) -> anyhow::Result<Vec<ActivityEntry>> {
    let mut stmt = conn.prepare(
        "SELECT id, at, action, details FROM activity_log
         ORDER BY at DESC, id DESC LIMIT ?",
    )?;
    let rows = stmt
        .query_map([limit as i64], |row| {
            Ok(ActivityEntry {
                id: row.get(0)?,
                at: row.get(1)?,
                action: row.get(2)?,
                details: row.get(3)?,
            })
        })?
        .collect::<Result<Vec<_>, _>>()?;
    Ok(rows)
}

fn ensure_store_updated_at(conn: &Connection) -> anyhow::Result<()> {
    if table_has_column(conn, "store", "updated_at")? {
        return Ok(());
    }
    conn.execute("ALTER TABLE store ADD COLUMN updated_at TEXT", [])?;
    Ok(())
}

fn table_has_column(conn: &Connection, table: &str, column: &str) -> anyhow::Result<bool> {
    let sql = format!("PRAGMA table_info({})", table);
    let mut stmt = conn.prepare(&sql)?;
    let mut rows = stmt.query([])?;
    while let Some(row) = rows.next()? {
        let name: String = row.get(1)?;
        if name == column {
            return Ok(true);
        }
    }
    Ok(false)
}
