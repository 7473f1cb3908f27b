use rusqlite::{Connection, OptionalExtension};
use serde::Serialize;
use serde_json::Value;
use std::path::Path;
use thiserror::Error;
use uuid::Uuid;

use crate::stats::{RawStudentRecord, RawSubjectScore};

pub const DB_FILE: &str = "roster.sqlite3";

/// Where an aggregation run gets its snapshot from. The stats engine never
/// talks to a store directly; handlers fetch through this and pass plain data.
pub trait SnapshotSource {
    fn snapshot(&self) -> anyhow::Result<Vec<RawStudentRecord>>;
}

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("student not found: {0}")]
    NotFound(String),
    #[error("database error: {0}")]
    Db(#[from] rusqlite::Error),
    #[error("invalid subjects document: {0}")]
    Json(#[from] serde_json::Error),
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StudentDoc {
    pub id: String,
    pub name: String,
    pub photo_ref: Option<String>,
    /// Stored as received; scores are not coerced here.
    pub subjects: Value,
    pub sort_order: i64,
    pub created_at: Option<String>,
    pub updated_at: Option<String>,
}

pub fn open_db(workspace: &Path) -> anyhow::Result<Connection> {
    std::fs::create_dir_all(workspace)?;
    let db_path = workspace.join(DB_FILE);
    let conn = Connection::open(db_path)?;
    init_schema(&conn)?;
    Ok(conn)
}

fn init_schema(conn: &Connection) -> anyhow::Result<()> {
    conn.execute(
        "CREATE TABLE IF NOT EXISTS students(
            id TEXT PRIMARY KEY,
            name TEXT NOT NULL,
            photo_ref TEXT,
            subjects_json TEXT,
            sort_order INTEGER NOT NULL,
            created_at TEXT,
            updated_at TEXT
        )",
        [],
    )?;
    conn.execute(
        "CREATE INDEX IF NOT EXISTS idx_students_sort ON students(sort_order)",
        [],
    )?;
    conn.execute(
        "CREATE TABLE IF NOT EXISTS settings(
            key TEXT PRIMARY KEY,
            value_json TEXT NOT NULL
        )",
        [],
    )?;
    Ok(())
}

pub fn settings_get_json(conn: &Connection, key: &str) -> anyhow::Result<Option<Value>> {
    let raw: Option<String> = conn
        .query_row(
            "SELECT value_json FROM settings WHERE key = ?",
            [key],
            |r| r.get(0),
        )
        .optional()?;
    match raw {
        Some(s) => Ok(Some(serde_json::from_str(&s)?)),
        None => Ok(None),
    }
}

pub fn settings_set_json(conn: &Connection, key: &str, value: &Value) -> anyhow::Result<()> {
    conn.execute(
        "INSERT INTO settings(key, value_json) VALUES(?, ?)
         ON CONFLICT(key) DO UPDATE SET value_json = excluded.value_json",
        (key, serde_json::to_string(value)?),
    )?;
    Ok(())
}

/// Enrollment-number style id: `<unix millis>-<3 digits>`.
fn new_student_id() -> String {
    let millis = chrono::Utc::now().timestamp_millis();
    let suffix = Uuid::new_v4().as_u128() % 1000;
    format!("{}-{:03}", millis, suffix)
}

fn student_exists(conn: &Connection, id: &str) -> Result<bool, StoreError> {
    let hit: Option<i64> = conn
        .query_row("SELECT 1 FROM students WHERE id = ?", [id], |r| r.get(0))
        .optional()?;
    Ok(hit.is_some())
}

fn row_to_doc(row: &rusqlite::Row<'_>) -> rusqlite::Result<StudentDoc> {
    let subjects_json: Option<String> = row.get(3)?;
    Ok(StudentDoc {
        id: row.get(0)?,
        name: row.get(1)?,
        photo_ref: row.get(2)?,
        subjects: subjects_json
            .and_then(|s| serde_json::from_str(&s).ok())
            .unwrap_or(Value::Null),
        sort_order: row.get(4)?,
        created_at: row.get(5)?,
        updated_at: row.get(6)?,
    })
}

pub fn list_students(conn: &Connection) -> Result<Vec<StudentDoc>, StoreError> {
    let mut stmt = conn.prepare(
        "SELECT id, name, photo_ref, subjects_json, sort_order, created_at, updated_at
         FROM students
         ORDER BY sort_order, rowid",
    )?;
    let docs = stmt
        .query_map([], row_to_doc)?
        .collect::<Result<Vec<_>, _>>()?;
    Ok(docs)
}

pub fn get_student(conn: &Connection, id: &str) -> Result<StudentDoc, StoreError> {
    conn.query_row(
        "SELECT id, name, photo_ref, subjects_json, sort_order, created_at, updated_at
         FROM students WHERE id = ?",
        [id],
        row_to_doc,
    )
    .optional()?
    .ok_or_else(|| StoreError::NotFound(id.to_string()))
}

pub fn create_student(
    conn: &Connection,
    name: &str,
    photo_ref: Option<&str>,
    subjects: &Value,
) -> Result<StudentDoc, StoreError> {
    // Two creates in the same millisecond can draw the same suffix.
    let mut id = new_student_id();
    for _ in 0..8 {
        if !student_exists(conn, &id)? {
            break;
        }
        id = new_student_id();
    }

    let sort_order: i64 = conn.query_row(
        "SELECT COALESCE(MAX(sort_order), -1) + 1 FROM students",
        [],
        |r| r.get(0),
    )?;
    conn.execute(
        "INSERT INTO students(id, name, photo_ref, subjects_json, sort_order, created_at, updated_at)
         VALUES(?, ?, ?, ?, ?,
                strftime('%Y-%m-%dT%H:%M:%SZ','now'),
                strftime('%Y-%m-%dT%H:%M:%SZ','now'))",
        (
            &id,
            name,
            photo_ref,
            serde_json::to_string(subjects)?,
            sort_order,
        ),
    )?;
    get_student(conn, &id)
}

pub fn update_student(
    conn: &Connection,
    id: &str,
    name: &str,
    photo_ref: Option<&str>,
    subjects: &Value,
) -> Result<(), StoreError> {
    let changed = conn.execute(
        "UPDATE students
         SET name = ?, photo_ref = ?, subjects_json = ?,
             updated_at = strftime('%Y-%m-%dT%H:%M:%SZ','now')
         WHERE id = ?",
        (name, photo_ref, serde_json::to_string(subjects)?, id),
    )?;
    if changed == 0 {
        return Err(StoreError::NotFound(id.to_string()));
    }
    Ok(())
}

pub fn delete_student(conn: &Connection, id: &str) -> Result<(), StoreError> {
    let changed = conn.execute("DELETE FROM students WHERE id = ?", [id])?;
    if changed == 0 {
        return Err(StoreError::NotFound(id.to_string()));
    }
    Ok(())
}

/// Decodes a stored subject list leniently. Entries that are not objects are
/// skipped; an unreadable document counts as absent. Wrong-typed fields
/// inside an entry are left for the normalizer to coerce.
fn parse_subjects(student_id: &str, text: &str) -> Option<Vec<RawSubjectScore>> {
    let items = match serde_json::from_str::<Value>(text) {
        Ok(Value::Array(items)) => items,
        Ok(_) | Err(_) => {
            tracing::warn!(student_id, "subjects document is not a JSON array; treating as absent");
            return None;
        }
    };
    Some(
        items
            .into_iter()
            .enumerate()
            .filter_map(|(i, item)| {
                if !item.is_object() {
                    tracing::warn!(student_id, index = i, "skipping subject entry that is not an object");
                    return None;
                }
                match serde_json::from_value::<RawSubjectScore>(item) {
                    Ok(s) => Some(s),
                    Err(e) => {
                        tracing::warn!(student_id, index = i, error = %e, "skipping unreadable subject entry");
                        None
                    }
                }
            })
            .collect(),
    )
}

impl SnapshotSource for Connection {
    fn snapshot(&self) -> anyhow::Result<Vec<RawStudentRecord>> {
        let mut stmt = self.prepare(
            "SELECT id, name, photo_ref, subjects_json
             FROM students
             ORDER BY sort_order, rowid",
        )?;
        let rows = stmt
            .query_map([], |row| {
                Ok((
                    row.get::<_, String>(0)?,
                    row.get::<_, String>(1)?,
                    row.get::<_, Option<String>>(2)?,
                    row.get::<_, Option<String>>(3)?,
                ))
            })?
            .collect::<Result<Vec<_>, _>>()?;

        Ok(rows
            .into_iter()
            .map(|(id, name, photo_ref, subjects_json)| {
                let subjects = subjects_json.and_then(|s| parse_subjects(&id, &s));
                RawStudentRecord {
                    id,
                    name,
                    photo_ref,
                    subjects,
                }
            })
            .collect())
    }
}
