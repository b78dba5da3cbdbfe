//! Shared plain-data types for the patient charting service.

use serde::{Deserialize, Serialize};

/// User-supplied fields for a new entry, before the repository stamps
/// `created_at`. Required fields are validated at insert time.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct EntryDraft {
    pub visit_date: String,
    pub subjective: String,
    pub treatment_details: String,
    pub client_feedback: String,
    pub home_care: String,
    pub recommended_treatment_plan: String,
}

impl EntryDraft {
    /// Copy with every field whitespace-trimmed.
    pub fn trimmed(&self) -> Self {
        Self {
            visit_date: self.visit_date.trim().to_string(),
            subjective: self.subjective.trim().to_string(),
            treatment_details: self.treatment_details.trim().to_string(),
            client_feedback: self.client_feedback.trim().to_string(),
            home_care: self.home_care.trim().to_string(),
            recommended_treatment_plan: self.recommended_treatment_plan.trim().to_string(),
        }
    }

    pub fn with_created_at(self, created_at: String) -> EntryRecord {
        EntryRecord {
            visit_date: self.visit_date,
            subjective: self.subjective,
            treatment_details: self.treatment_details,
            client_feedback: self.client_feedback,
            home_care: self.home_care,
            recommended_treatment_plan: self.recommended_treatment_plan,
            created_at,
        }
    }
}

/// The seven persisted fields of an entry, minus the surrogate id.
///
/// Also serves as the importer's deduplication key: two rows are "the same"
/// exactly when all seven fields match.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct EntryRecord {
    pub visit_date: String,
    pub subjective: String,
    pub treatment_details: String,
    pub client_feedback: String,
    pub home_care: String,
    pub recommended_treatment_plan: String,
    pub created_at: String,
}

/// A stored entry as returned by list queries.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Entry {
    pub id: i64,
    pub visit_date: String,
    pub subjective: String,
    pub treatment_details: String,
    pub client_feedback: String,
    pub home_care: String,
    pub recommended_treatment_plan: String,
    pub created_at: String,
    /// Human-readable rendering of `created_at` for the UI.
    pub created_at_display: String,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct EntryStats {
    pub total_entries: i64,
    /// Empty string when no entries exist.
    pub earliest_visit_date: String,
    pub latest_visit_date: String,
}

/// Result of one legacy import run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ImportSummary {
    pub legacy_dir: String,
    pub db_path: String,
    pub inserted: usize,
    pub skipped_existing: usize,
    pub skipped_empty: usize,
}
