//! Axum handlers for form submissions and the heartbeat signal.
//!
//! The dashboard (GET /) lives in `dashboard.rs`; this module owns the POST
//! side: saving entries, deleting them, and resetting the liveness timer.
//! Outcomes travel back to the view as one-shot `msg`/`err` query params on
//! the redirect.

use crate::db::Db;
use crate::error::ChartingError;
use crate::search;
use crate::watchdog::Heartbeat;
use axum::extract::{Form, State};
use axum::http::StatusCode;
use axum::response::Redirect;
use charting_types::EntryDraft;
use serde::Deserialize;
use std::sync::Arc;
use std::time::Instant;

pub struct AppState {
    pub db: Db,
    pub heartbeat: Arc<Heartbeat>,
    pub start_time: Instant,
}

/// Filter state carried in the query string across requests and redirects.
#[derive(Debug, Default, Deserialize)]
pub struct SearchParams {
    #[serde(default)]
    pub sy: String,
    #[serde(default)]
    pub sm: String,
    #[serde(default)]
    pub sd: String,
    #[serde(default)]
    pub t: String,
    #[serde(default)]
    pub msg: String,
    #[serde(default)]
    pub err: String,
}

#[derive(Debug, Default, Deserialize)]
pub struct EntryForm {
    #[serde(default)]
    pub action: String,
    #[serde(default)]
    pub entry_id: String,
    #[serde(default)]
    pub sy: String,
    #[serde(default)]
    pub sm: String,
    #[serde(default)]
    pub sd: String,
    #[serde(default)]
    pub t: String,
    #[serde(default)]
    pub visit_year: String,
    #[serde(default)]
    pub visit_month: String,
    #[serde(default)]
    pub visit_day: String,
    #[serde(default)]
    pub visit_date: String,
    #[serde(default)]
    pub subjective: String,
    #[serde(default)]
    pub treatment_details: String,
    #[serde(default)]
    pub client_feedback: String,
    #[serde(default)]
    pub home_care: String,
    #[serde(default)]
    pub recommended_treatment_plan: String,
}

// POST /
pub async fn submit(State(state): State<Arc<AppState>>, Form(form): Form<EntryForm>) -> Redirect {
    if form.action == "delete" {
        handle_delete(&state, &form)
    } else {
        handle_save(&state, &form)
    }
}

// POST /heartbeat
pub async fn heartbeat(State(state): State<Arc<AppState>>) -> StatusCode {
    state.heartbeat.beat();
    StatusCode::NO_CONTENT
}

fn handle_delete(state: &AppState, form: &EntryForm) -> Redirect {
    let filters = filter_query(&form.sy, &form.sm, &form.sd, &form.t);
    let id = match form.entry_id.trim().parse::<i64>() {
        Ok(id) if id > 0 => id,
        _ => return redirect_with(&filters, "err", "Could not delete entry."),
    };
    match state.db.delete_entry(id) {
        Ok(()) => redirect_with(&filters, "msg", "Entry deleted."),
        Err(ChartingError::NotFound(_)) => {
            redirect_with(&filters, "err", "Could not delete entry.")
        }
        Err(e) => {
            log::error!("Delete of entry {id} failed: {e}");
            redirect_with(&filters, "err", "Could not delete entry.")
        }
    }
}

fn handle_save(state: &AppState, form: &EntryForm) -> Redirect {
    let draft = EntryDraft {
        visit_date: resolve_visit_date(
            &form.visit_date,
            &form.visit_year,
            &form.visit_month,
            &form.visit_day,
        ),
        subjective: form.subjective.clone(),
        treatment_details: form.treatment_details.clone(),
        client_feedback: form.client_feedback.clone(),
        home_care: form.home_care.clone(),
        recommended_treatment_plan: form.recommended_treatment_plan.clone(),
    };

    match state.db.insert_entry(&draft) {
        Ok(_) => redirect_with("", "msg", "Entry saved."),
        Err(ChartingError::Validation(reason)) => redirect_with("", "err", &reason),
        Err(e) => {
            log::error!("Save failed: {e}");
            redirect_with("", "err", "Could not save entry.")
        }
    }
}

/// Assembled year/month/day selects win over the literal `visit_date`
/// field when all three are valid; an empty result defaults to today.
pub fn resolve_visit_date(visit_date: &str, year: &str, month: &str, day: &str) -> String {
    let y = search::normalize_date_part(year, 4);
    let m = search::normalize_date_part(month, 2);
    let d = search::normalize_date_part(day, 2);
    if !y.is_empty() && !m.is_empty() && !d.is_empty() {
        return format!("{y}-{m}-{d}");
    }
    let literal = visit_date.trim();
    if literal.is_empty() {
        chrono::Local::now().format("%Y-%m-%d").to_string()
    } else {
        literal.to_string()
    }
}

/// Encode the non-empty filter params for a redirect query string.
pub fn filter_query(sy: &str, sm: &str, sd: &str, t: &str) -> String {
    let mut parts = Vec::new();
    for (key, value) in [("sy", sy), ("sm", sm), ("sd", sd), ("t", t)] {
        let value = value.trim();
        if !value.is_empty() {
            parts.push(format!("{key}={}", urlencoding::encode(value)));
        }
    }
    parts.join("&")
}

fn redirect_with(filters: &str, kind: &str, message: &str) -> Redirect {
    let mut query = String::from(filters);
    if !query.is_empty() {
        query.push('&');
    }
    query.push_str(kind);
    query.push('=');
    query.push_str(&urlencoding::encode(message));
    Redirect::to(&format!("/?{query}"))
}
