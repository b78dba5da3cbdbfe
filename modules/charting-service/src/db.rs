//! SQLite repository for visit entries.
//!
//! `Db` holds only the database path; every operation opens its own
//! short-lived connection. There is no pooling and no long-lived transaction
//! spanning a request — the single local client makes that unnecessary.

use crate::error::{ChartingError, ChartingResult};
use crate::search;
use charting_types::{Entry, EntryDraft, EntryRecord, EntryStats};
use rusqlite::Connection;
use std::path::{Path, PathBuf};

pub(crate) const INSERT_ENTRY_SQL: &str = "INSERT INTO entries (
        visit_date,
        subjective,
        treatment_details,
        client_feedback,
        home_care,
        recommended_treatment_plan,
        created_at
    )
    VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)";

const SELECT_COLUMNS: &str = "id, visit_date, subjective, treatment_details,
        client_feedback, home_care, recommended_treatment_plan, created_at";

pub struct Db {
    path: PathBuf,
}

impl Db {
    /// Open the store at `path`, creating the parent directory and the
    /// schema if absent. Idempotent; call once at process start.
    pub fn open(path: impl AsRef<Path>) -> ChartingResult<Self> {
        let path = path.as_ref().to_path_buf();
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)?;
            }
        }
        let conn = Connection::open(&path)?;
        ensure_schema(&conn)?;
        Ok(Self { path })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn connect(&self) -> ChartingResult<Connection> {
        Ok(Connection::open(&self.path)?)
    }

    /// Validate and insert a new entry, stamping `created_at` with the
    /// current local time at second precision. Returns the new row id.
    pub fn insert_entry(&self, draft: &EntryDraft) -> ChartingResult<i64> {
        let draft = draft.trimmed();
        if draft.subjective.is_empty() || draft.treatment_details.is_empty() {
            return Err(ChartingError::Validation(
                "Subjective and Treatment Details are required.".to_string(),
            ));
        }
        let created_at = chrono::Local::now().format("%Y-%m-%dT%H:%M:%S").to_string();
        self.insert_record(&draft.with_created_at(created_at))
    }

    /// Insert a fully-specified record (importer and test path). No
    /// validation or timestamp stamping.
    pub fn insert_record(&self, rec: &EntryRecord) -> ChartingResult<i64> {
        let conn = self.connect()?;
        insert_record_with(&conn, rec).map_err(ChartingError::from)
    }

    /// List entries matching the optional date fragments and text query,
    /// most recently inserted first (`created_at DESC, id DESC`).
    ///
    /// Both filters present: visit_date must match the pattern AND any of
    /// the five text fields must contain the query (LIKE is
    /// case-insensitive for ASCII). One filter: that one alone. Neither:
    /// all entries.
    pub fn list_entries(
        &self,
        year: &str,
        month: &str,
        day: &str,
        text_query: &str,
    ) -> ChartingResult<Vec<Entry>> {
        let text_query = text_query.trim();
        let date_pattern = search::build_visit_date_pattern(year, month, day);
        let like = format!("%{text_query}%");

        let text_clause = "(
                subjective LIKE ?
                OR treatment_details LIKE ?
                OR client_feedback LIKE ?
                OR home_care LIKE ?
                OR recommended_treatment_plan LIKE ?
            )";
        let order = "ORDER BY created_at DESC, id DESC";

        let (where_clause, params): (String, Vec<&dyn rusqlite::ToSql>) =
            if !date_pattern.is_empty() && !text_query.is_empty() {
                (
                    format!("WHERE visit_date LIKE ? AND {text_clause}"),
                    vec![&date_pattern, &like, &like, &like, &like, &like],
                )
            } else if !date_pattern.is_empty() {
                ("WHERE visit_date LIKE ?".to_string(), vec![&date_pattern])
            } else if !text_query.is_empty() {
                (
                    format!("WHERE {text_clause}"),
                    vec![&like, &like, &like, &like, &like],
                )
            } else {
                (String::new(), Vec::new())
            };

        let sql = format!("SELECT {SELECT_COLUMNS} FROM entries {where_clause} {order}");
        let conn = self.connect()?;
        let mut stmt = conn.prepare(&sql)?;
        let rows = stmt.query_map(params.as_slice(), row_to_entry)?;

        let mut entries = Vec::new();
        for row in rows {
            entries.push(row?);
        }
        Ok(entries)
    }

    /// Delete the entry with the given id. `NotFound` when no row matched;
    /// the caller turns that into a non-fatal notice.
    pub fn delete_entry(&self, id: i64) -> ChartingResult<()> {
        let conn = self.connect()?;
        let affected = conn.execute("DELETE FROM entries WHERE id = ?1", [id])?;
        if affected == 0 {
            return Err(ChartingError::NotFound(format!("entry {id}")));
        }
        Ok(())
    }

    pub fn stats(&self) -> ChartingResult<EntryStats> {
        let conn = self.connect()?;
        let stats = conn.query_row(
            "SELECT COUNT(*),
                    COALESCE(MIN(visit_date), ''),
                    COALESCE(MAX(visit_date), '')
             FROM entries",
            [],
            |row| {
                Ok(EntryStats {
                    total_entries: row.get(0)?,
                    earliest_visit_date: row.get(1)?,
                    latest_visit_date: row.get(2)?,
                })
            },
        )?;
        Ok(stats)
    }
}

/// Create the entries table if it does not exist. Shared with the importer,
/// which opens its own connection for the batch transaction.
pub fn ensure_schema(conn: &Connection) -> rusqlite::Result<()> {
    conn.execute(
        "CREATE TABLE IF NOT EXISTS entries (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            visit_date TEXT NOT NULL,
            subjective TEXT NOT NULL,
            treatment_details TEXT NOT NULL,
            client_feedback TEXT NOT NULL,
            home_care TEXT NOT NULL,
            recommended_treatment_plan TEXT NOT NULL,
            created_at TEXT NOT NULL
        )",
        [],
    )?;
    Ok(())
}

pub(crate) fn insert_record_with(conn: &Connection, rec: &EntryRecord) -> rusqlite::Result<i64> {
    conn.execute(
        INSERT_ENTRY_SQL,
        rusqlite::params![
            rec.visit_date,
            rec.subjective,
            rec.treatment_details,
            rec.client_feedback,
            rec.home_care,
            rec.recommended_treatment_plan,
            rec.created_at,
        ],
    )?;
    Ok(conn.last_insert_rowid())
}

fn row_to_entry(row: &rusqlite::Row) -> rusqlite::Result<Entry> {
    let created_at: String = row.get(7)?;
    Ok(Entry {
        id: row.get(0)?,
        visit_date: row.get(1)?,
        subjective: row.get(2)?,
        treatment_details: row.get(3)?,
        client_feedback: row.get(4)?,
        home_care: row.get(5)?,
        recommended_treatment_plan: row.get(6)?,
        created_at_display: search::format_saved_timestamp(&created_at),
        created_at,
    })
}
