//! One-shot legacy CSV importer.
//!
//! Reads `charts_YYYYMMDD.csv` exports from the old charting app,
//! normalizes timestamps and field names, deduplicates against rows already
//! in the store, and inserts the survivors in a single transaction. Safe to
//! re-run: a second pass over the same files inserts nothing.

use crate::db;
use crate::search;
use charting_types::{EntryRecord, ImportSummary};
use rusqlite::Connection;
use std::collections::{HashMap, HashSet};
use std::path::{Path, PathBuf};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ImportError {
    #[error("No legacy directory found. Use --legacy-dir to specify one.")]
    NoLegacyDir,
    #[error("No charts_*.csv files found in: {0}")]
    NoFiles(String),
    #[error("csv error: {0}")]
    Csv(#[from] csv::Error),
    #[error("bad glob pattern: {0}")]
    Pattern(#[from] glob::PatternError),
    #[error("storage error: {0}")]
    Storage(#[from] rusqlite::Error),
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

/// Accepted legacy column names per target field, first non-empty wins.
pub const SUBJECTIVE_ALIASES: &[&str] = &["clinical_impression", "subjective"];
pub const TREATMENT_DETAILS_ALIASES: &[&str] = &["treatment_details", "treatment"];
pub const CLIENT_FEEDBACK_ALIASES: &[&str] = &["client_feedback", "feedback"];
pub const HOME_CARE_ALIASES: &[&str] = &["home_care", "homecare", "home_care_plan"];
pub const TREATMENT_PLAN_ALIASES: &[&str] =
    &["recommended_treatment_plan", "treatment_plan", "recommendation"];
pub const TIMESTAMP_ALIASES: &[&str] = &["timestamp", "created_at", "time"];

/// Directories probed when no explicit `--legacy-dir` is given.
const LEGACY_DIR_CANDIDATES: &[&str] = &[
    "data/entry_data",
    "/Applications/Charting_App_2.0/dist/ChartingApp/entry_data",
];

/// Import all legacy files into the database at `db_path`.
///
/// `legacy_dir` overrides the candidate-directory probe when given; the
/// directory itself is not checked for existence in that case (an empty
/// glob surfaces as `NoFiles`).
pub fn run_import(db_path: &str, legacy_dir: Option<&str>) -> Result<ImportSummary, ImportError> {
    let legacy_dir = resolve_legacy_dir(legacy_dir).ok_or(ImportError::NoLegacyDir)?;

    let pattern = legacy_dir.join("charts_*.csv");
    let mut files: Vec<PathBuf> = glob::glob(&pattern.to_string_lossy())?
        .filter_map(|entry| entry.ok())
        .collect();
    // Ascending filename order, hence ascending embedded date.
    files.sort();
    if files.is_empty() {
        return Err(ImportError::NoFiles(legacy_dir.display().to_string()));
    }

    let db_path = expand_home(db_path);
    if let Some(parent) = db_path.parent() {
        if !parent.as_os_str().is_empty() {
            std::fs::create_dir_all(parent)?;
        }
    }
    let mut conn = Connection::open(&db_path)?;
    db::ensure_schema(&conn)?;

    let mut summary = ImportSummary {
        legacy_dir: legacy_dir.display().to_string(),
        db_path: db_path.display().to_string(),
        inserted: 0,
        skipped_existing: 0,
        skipped_empty: 0,
    };

    // All inserts commit atomically: an interrupted run leaves no partial
    // batch in the store.
    let tx = conn.transaction()?;
    let mut existing = load_existing_keys(&tx)?;

    for file in &files {
        log::info!("Reading {}", file.display());
        for row in read_legacy_rows(file)? {
            let record = normalize_row(&row, file);

            if record.subjective.is_empty() && record.treatment_details.is_empty() {
                summary.skipped_empty += 1;
                continue;
            }
            if existing.contains(&record) {
                summary.skipped_existing += 1;
                continue;
            }

            db::insert_record_with(&tx, &record)?;
            existing.insert(record);
            summary.inserted += 1;
        }
    }

    tx.commit()?;
    Ok(summary)
}

/// Resolve one legacy row into a canonical record, applying the column
/// aliases and timestamp fallbacks.
fn normalize_row(row: &HashMap<String, String>, file: &Path) -> EntryRecord {
    let timestamp = row_value(row, TIMESTAMP_ALIASES);
    let visit_date = normalize_visit_date(&timestamp, file);
    let created_at = normalize_created_at(&timestamp, &visit_date);
    EntryRecord {
        visit_date,
        subjective: row_value(row, SUBJECTIVE_ALIASES),
        treatment_details: row_value(row, TREATMENT_DETAILS_ALIASES),
        client_feedback: row_value(row, CLIENT_FEEDBACK_ALIASES),
        home_care: row_value(row, HOME_CARE_ALIASES),
        recommended_treatment_plan: row_value(row, TREATMENT_PLAN_ALIASES),
        created_at,
    }
}

/// First non-empty value among the accepted column names, trimmed.
pub fn row_value(row: &HashMap<String, String>, aliases: &[&str]) -> String {
    for key in aliases {
        if let Some(value) = row.get(*key) {
            let value = value.trim();
            if !value.is_empty() {
                return value.to_string();
            }
        }
    }
    String::new()
}

fn resolve_legacy_dir(explicit: Option<&str>) -> Option<PathBuf> {
    if let Some(dir) = explicit {
        let dir = dir.trim();
        if !dir.is_empty() {
            return Some(expand_home(dir));
        }
    }
    LEGACY_DIR_CANDIDATES
        .iter()
        .map(|candidate| expand_home(candidate))
        .find(|path| path.is_dir())
}

fn expand_home(path: &str) -> PathBuf {
    if let Some(rest) = path.strip_prefix("~/") {
        if let Ok(home) = std::env::var("HOME") {
            return Path::new(&home).join(rest);
        }
    }
    PathBuf::from(path)
}

/// Derive the visit date from the row timestamp, falling back to the date
/// embedded in the filename, then to today.
fn normalize_visit_date(timestamp: &str, file: &Path) -> String {
    let ts = timestamp.trim();
    if !ts.is_empty() {
        if let Some(dt) = search::parse_flexible_datetime(ts) {
            return dt.date().format("%Y-%m-%d").to_string();
        }
        if ts.len() >= 10 {
            if let Some(prefix) = ts.get(..10) {
                return prefix.to_string();
            }
        }
    }
    if let Some(date) = filename_date(file) {
        return date;
    }
    chrono::Local::now().format("%Y-%m-%d").to_string()
}

fn normalize_created_at(timestamp: &str, visit_date: &str) -> String {
    let ts = timestamp.trim();
    if ts.is_empty() {
        return format!("{visit_date}T00:00:00");
    }
    if let Some(dt) = search::parse_flexible_datetime(ts) {
        return dt.format("%Y-%m-%dT%H:%M:%S").to_string();
    }
    if ts.len() >= 19 {
        if let Some(prefix) = ts.get(..19) {
            return prefix.to_string();
        }
    }
    format!("{visit_date}T00:00:00")
}

/// `charts_YYYYMMDD.csv` → `YYYY-MM-DD`. None when the name is too short
/// or a slice boundary would split a multibyte character.
fn filename_date(file: &Path) -> Option<String> {
    let base = file.file_name()?.to_str()?;
    let raw = base.strip_prefix("charts_")?;
    Some(format!(
        "{}-{}-{}",
        raw.get(..4)?,
        raw.get(4..6)?,
        raw.get(6..8)?
    ))
}

fn load_existing_keys(conn: &Connection) -> Result<HashSet<EntryRecord>, ImportError> {
    let mut stmt = conn.prepare(
        "SELECT visit_date, subjective, treatment_details, client_feedback,
                home_care, recommended_treatment_plan, created_at
         FROM entries",
    )?;
    let rows = stmt.query_map([], |row| {
        Ok(EntryRecord {
            visit_date: row.get(0)?,
            subjective: row.get(1)?,
            treatment_details: row.get(2)?,
            client_feedback: row.get(3)?,
            home_care: row.get(4)?,
            recommended_treatment_plan: row.get(5)?,
            created_at: row.get(6)?,
        })
    })?;

    let mut existing = HashSet::new();
    for row in rows {
        existing.insert(row?);
    }
    Ok(existing)
}

/// Read one legacy file into header-keyed rows, tolerating a leading UTF-8
/// byte-order mark and short rows.
fn read_legacy_rows(file: &Path) -> Result<Vec<HashMap<String, String>>, ImportError> {
    let text = std::fs::read_to_string(file)?;
    let text = text.strip_prefix('\u{feff}').unwrap_or(&text);
    let mut reader = csv::ReaderBuilder::new()
        .flexible(true)
        .from_reader(text.as_bytes());

    let mut rows = Vec::new();
    for result in reader.deserialize::<HashMap<String, String>>() {
        rows.push(result?);
    }
    Ok(rows)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::Db;

    fn write_file(dir: &Path, name: &str, contents: &str) {
        std::fs::write(dir.join(name), contents).expect("write legacy file");
    }

    fn setup() -> (tempfile::TempDir, String, PathBuf) {
        let dir = tempfile::tempdir().expect("tempdir");
        let db_path = dir.path().join("charting.db").display().to_string();
        let legacy = dir.path().join("legacy");
        std::fs::create_dir(&legacy).expect("legacy dir");
        (dir, db_path, legacy)
    }

    #[test]
    fn import_is_idempotent() {
        let (_dir, db_path, legacy) = setup();
        write_file(
            &legacy,
            "charts_20240101.csv",
            "subjective,treatment_details,timestamp\n\
             neck stiffness,mobilization,2024-01-01T10:30:00\n\
             lower back pain,massage,2024-01-01T11:00:00\n",
        );

        let first = run_import(&db_path, Some(legacy.to_str().unwrap())).unwrap();
        assert_eq!(first.inserted, 2);
        assert_eq!(first.skipped_existing, 0);
        assert_eq!(first.skipped_empty, 0);

        let second = run_import(&db_path, Some(legacy.to_str().unwrap())).unwrap();
        assert_eq!(second.inserted, 0);
        assert_eq!(second.skipped_existing, first.inserted);
    }

    #[test]
    fn alias_fallback_maps_clinical_impression_to_subjective() {
        let (_dir, db_path, legacy) = setup();
        write_file(
            &legacy,
            "charts_20240215.csv",
            "clinical_impression,treatment,timestamp\n\
             acute strain,heat therapy,2024-02-15T09:00:00\n",
        );

        let summary = run_import(&db_path, Some(legacy.to_str().unwrap())).unwrap();
        assert_eq!(summary.inserted, 1);

        let db = Db::open(&db_path).unwrap();
        let entries = db.list_entries("", "", "", "").unwrap();
        assert_eq!(entries[0].subjective, "acute strain");
        assert_eq!(entries[0].treatment_details, "heat therapy");
    }

    #[test]
    fn rows_with_both_required_fields_empty_are_skipped() {
        let (_dir, db_path, legacy) = setup();
        write_file(
            &legacy,
            "charts_20240301.csv",
            "subjective,treatment_details,client_feedback,timestamp\n\
             ,,felt fine,2024-03-01T08:00:00\n\
             follow-up,stretching,,2024-03-01T08:30:00\n",
        );

        let summary = run_import(&db_path, Some(legacy.to_str().unwrap())).unwrap();
        assert_eq!(summary.inserted, 1);
        assert_eq!(summary.skipped_empty, 1);
    }

    #[test]
    fn duplicates_across_files_within_one_run_are_caught() {
        let (_dir, db_path, legacy) = setup();
        let row = "subjective,treatment_details,timestamp\n\
                   repeat visit,ultrasound,2024-04-01T14:00:00\n";
        write_file(&legacy, "charts_20240401.csv", row);
        write_file(&legacy, "charts_20240402.csv", row);

        let summary = run_import(&db_path, Some(legacy.to_str().unwrap())).unwrap();
        assert_eq!(summary.inserted, 1);
        assert_eq!(summary.skipped_existing, 1);
    }

    #[test]
    fn leading_bom_is_tolerated() {
        let (_dir, db_path, legacy) = setup();
        write_file(
            &legacy,
            "charts_20240510.csv",
            "\u{feff}subjective,treatment_details,timestamp\n\
             wrist pain,taping,2024-05-10T16:00:00\n",
        );

        let summary = run_import(&db_path, Some(legacy.to_str().unwrap())).unwrap();
        assert_eq!(summary.inserted, 1);

        let db = Db::open(&db_path).unwrap();
        let entries = db.list_entries("", "", "", "").unwrap();
        assert_eq!(entries[0].subjective, "wrist pain");
    }

    #[test]
    fn missing_timestamp_falls_back_to_filename_date() {
        let (_dir, db_path, legacy) = setup();
        write_file(
            &legacy,
            "charts_20240620.csv",
            "subjective,treatment_details\n\
             hip tightness,dry needling\n",
        );

        run_import(&db_path, Some(legacy.to_str().unwrap())).unwrap();

        let db = Db::open(&db_path).unwrap();
        let entries = db.list_entries("", "", "", "").unwrap();
        assert_eq!(entries[0].visit_date, "2024-06-20");
        assert_eq!(entries[0].created_at, "2024-06-20T00:00:00");
    }

    #[test]
    fn unparseable_long_timestamp_is_truncated_literally() {
        let (_dir, db_path, legacy) = setup();
        write_file(
            &legacy,
            "charts_20240701.csv",
            "subjective,treatment_details,timestamp\n\
             ankle sprain,rest and ice,2024/07/01 10:00:00 extra\n",
        );

        run_import(&db_path, Some(legacy.to_str().unwrap())).unwrap();

        let db = Db::open(&db_path).unwrap();
        let entries = db.list_entries("", "", "", "").unwrap();
        // First 10 chars as the date literal, first 19 as created_at.
        assert_eq!(entries[0].visit_date, "2024/07/01");
        assert_eq!(entries[0].created_at, "2024/07/01 10:00:00");
    }

    #[test]
    fn offset_timestamps_keep_wall_time() {
        let (_dir, db_path, legacy) = setup();
        write_file(
            &legacy,
            "charts_20240501.csv",
            "subjective,treatment_details,timestamp\n\
             morning visit,traction,2024-05-01T10:30:00+02:00\n",
        );

        run_import(&db_path, Some(legacy.to_str().unwrap())).unwrap();

        let db = Db::open(&db_path).unwrap();
        let entries = db.list_entries("", "", "", "").unwrap();
        // The offset is parsed, not truncated into the literal text.
        assert_eq!(entries[0].visit_date, "2024-05-01");
        assert_eq!(entries[0].created_at, "2024-05-01T10:30:00");
    }

    #[test]
    fn timestamp_aliases_resolve_in_priority_order() {
        let row: HashMap<String, String> = [
            ("created_at".to_string(), "2024-01-02T00:00:00".to_string()),
            ("timestamp".to_string(), "2024-01-01T00:00:00".to_string()),
        ]
        .into_iter()
        .collect();
        assert_eq!(row_value(&row, TIMESTAMP_ALIASES), "2024-01-01T00:00:00");

        let blank_first: HashMap<String, String> = [
            ("timestamp".to_string(), "   ".to_string()),
            ("time".to_string(), "2024-01-03T00:00:00".to_string()),
        ]
        .into_iter()
        .collect();
        assert_eq!(
            row_value(&blank_first, TIMESTAMP_ALIASES),
            "2024-01-03T00:00:00"
        );
    }

    #[test]
    fn filename_date_handles_odd_names_without_panicking() {
        assert_eq!(
            filename_date(Path::new("charts_20240901.csv")),
            Some("2024-09-01".to_string())
        );
        // Multibyte characters in the date position must not split a char.
        assert_eq!(filename_date(Path::new("charts_2024年09月.csv")), None);
        assert_eq!(filename_date(Path::new("charts_09.csv")), None);
        assert_eq!(filename_date(Path::new("notes_20240901.csv")), None);
    }

    #[test]
    fn missing_directory_and_empty_glob_are_fatal() {
        let (_dir, db_path, legacy) = setup();

        // Candidate probe finds nothing when no explicit dir is given and
        // the cwd has no data/entry_data.
        let missing = run_import(&db_path, Some(""));
        assert!(matches!(
            missing,
            Err(ImportError::NoLegacyDir) | Err(ImportError::NoFiles(_))
        ));

        // An existing but empty directory fails with NoFiles.
        let empty = run_import(&db_path, Some(legacy.to_str().unwrap()));
        assert!(matches!(empty, Err(ImportError::NoFiles(_))));
    }

    #[test]
    fn files_are_processed_in_filename_order() {
        let (_dir, db_path, legacy) = setup();
        write_file(
            &legacy,
            "charts_20240902.csv",
            "subjective,treatment_details\nsecond day,exercise\n",
        );
        write_file(
            &legacy,
            "charts_20240901.csv",
            "subjective,treatment_details\nfirst day,exercise\n",
        );

        run_import(&db_path, Some(legacy.to_str().unwrap())).unwrap();

        let db = Db::open(&db_path).unwrap();
        // Both rows took their created_at from the filename date, so the
        // later file lists first.
        let entries = db.list_entries("", "", "", "").unwrap();
        assert_eq!(entries.len(), 2);
        assert_eq!(entries[0].visit_date, "2024-09-02");
        assert_eq!(entries[1].visit_date, "2024-09-01");
    }
}
