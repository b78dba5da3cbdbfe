//! Dashboard HTML page handler.
//!
//! Serves a self-contained page with inline CSS/JS: search form, new entry
//! form, the filtered entry table with delete buttons, stats, and the
//! heartbeat poller that keeps the watchdog fed while a tab is open.

use crate::routes::{AppState, SearchParams};
use crate::search;
use axum::extract::{Query, State};
use axum::http::header;
use axum::response::IntoResponse;
use charting_types::EntryStats;
use chrono::{Datelike, NaiveDate};
use std::sync::Arc;

pub async fn dashboard(
    State(state): State<Arc<AppState>>,
    Query(params): Query<SearchParams>,
) -> impl IntoResponse {
    let today = chrono::Local::now().date_naive();
    let (sy, sm, sd, text_query) = effective_filters(&params, today);

    let entries = state
        .db
        .list_entries(&sy, &sm, &sd, &text_query)
        .unwrap_or_else(|e| {
            log::error!("Listing entries failed: {e}");
            Vec::new()
        });
    let stats = state.db.stats().unwrap_or_else(|e| {
        log::error!("Loading stats failed: {e}");
        EntryStats::default()
    });

    let mut start_year = today.year() - 5;
    if let Some(prefix) = stats.earliest_visit_date.get(..4) {
        if let Ok(year) = prefix.parse::<i32>() {
            start_year = start_year.min(year);
        }
    }

    let banner = banner_html(&params.msg, &params.err);
    let search_year_options = year_options(today.year() + 1, start_year, &sy);
    let search_month_options = number_options(1, 12, &sm);
    let search_day_options = number_options(1, 31, &sd);
    let visit_year_options = year_options(
        today.year() + 1,
        start_year,
        &format!("{:04}", today.year()),
    );
    let visit_month_options = number_options(1, 12, &format!("{:02}", today.month()));
    let visit_day_options = number_options(1, 31, &format!("{:02}", today.day()));

    let mut entry_rows = String::new();
    for entry in &entries {
        entry_rows.push_str(&format!(
            r#"<tr>
  <td class="mono">{visit_date}</td>
  <td>{subjective}</td>
  <td>{treatment_details}</td>
  <td>{client_feedback}</td>
  <td>{home_care}</td>
  <td>{plan}</td>
  <td class="mono">{saved}</td>
  <td>
    <form method="post" action="/" onsubmit="return confirm('Delete this entry?');">
      <input type="hidden" name="action" value="delete">
      <input type="hidden" name="entry_id" value="{id}">
      <input type="hidden" name="sy" value="{sy}">
      <input type="hidden" name="sm" value="{sm}">
      <input type="hidden" name="sd" value="{sd}">
      <input type="hidden" name="t" value="{t}">
      <button type="submit" class="danger">Delete</button>
    </form>
  </td>
</tr>
"#,
            visit_date = html_escape(&entry.visit_date),
            subjective = html_escape(&entry.subjective),
            treatment_details = html_escape(&entry.treatment_details),
            client_feedback = html_escape(&entry.client_feedback),
            home_care = html_escape(&entry.home_care),
            plan = html_escape(&entry.recommended_treatment_plan),
            saved = html_escape(&entry.created_at_display),
            id = entry.id,
            sy = html_escape(&sy),
            sm = html_escape(&sm),
            sd = html_escape(&sd),
            t = html_escape(&text_query),
        ));
    }
    if entry_rows.is_empty() {
        entry_rows = "<tr><td colspan=\"8\">No entries match.</td></tr>".to_string();
    }

    let html = format!(
        r#"<!DOCTYPE html>
<html lang="en">
<head>
<meta charset="utf-8">
<meta name="viewport" content="width=device-width, initial-scale=1">
<title>Patient Charting</title>
<style>
  * {{ margin: 0; padding: 0; box-sizing: border-box; }}
  body {{ font-family: -apple-system, BlinkMacSystemFont, 'Segoe UI', Roboto, sans-serif; background: #f5f6f8; color: #1f2328; padding: 20px; }}
  h1 {{ color: #1a5fb4; margin-bottom: 8px; }}
  h2 {{ color: #3d4248; margin-bottom: 12px; font-size: 1.1em; }}
  .meta {{ color: #6b7280; font-size: 0.85em; margin-bottom: 20px; }}
  .banner {{ border-radius: 6px; padding: 10px 14px; margin-bottom: 16px; }}
  .banner.success {{ background: #e6f6e6; border: 1px solid #8bc98b; color: #1a5c1a; }}
  .banner.error {{ background: #fdeaea; border: 1px solid #e3a0a0; color: #8c1c1c; }}
  .panel {{ background: #ffffff; border: 1px solid #d8dde3; border-radius: 8px; padding: 16px; margin-bottom: 24px; }}
  .row {{ display: flex; gap: 12px; flex-wrap: wrap; align-items: flex-end; }}
  label {{ display: block; font-size: 0.8em; color: #6b7280; margin-bottom: 4px; }}
  select, input[type=text] {{ padding: 6px 8px; border: 1px solid #c4cad1; border-radius: 4px; }}
  textarea {{ width: 100%; min-height: 56px; padding: 6px 8px; border: 1px solid #c4cad1; border-radius: 4px; margin-bottom: 10px; }}
  button {{ padding: 7px 14px; border: none; border-radius: 4px; background: #1a5fb4; color: #fff; cursor: pointer; }}
  button:hover {{ background: #134a8e; }}
  button.danger {{ background: #b42318; }}
  button.danger:hover {{ background: #8c1c1c; }}
  table {{ width: 100%; border-collapse: collapse; }}
  th {{ background: #eef1f4; color: #4b5157; text-align: left; padding: 8px 10px; font-size: 0.8em; text-transform: uppercase; border-bottom: 1px solid #d8dde3; }}
  td {{ padding: 8px 10px; border-bottom: 1px solid #e7eaee; font-size: 0.9em; vertical-align: top; }}
  tr:hover {{ background: #f7f9fb; }}
  .mono {{ font-family: 'SF Mono', 'Consolas', monospace; font-size: 0.85em; white-space: nowrap; }}
</style>
</head>
<body>
  <h1>Patient Charting</h1>
  <p class="meta">Showing {shown} of {total} entries &middot; Earliest visit: {earliest} &middot; Latest visit: {latest} &middot; Uptime: {uptime}s</p>

  {banner}

  <div class="panel">
    <h2>Search</h2>
    <form method="get" action="/">
      <div class="row">
        <div><label>Year</label><select name="sy"><option value="">Any</option>{search_year_options}</select></div>
        <div><label>Month</label><select name="sm"><option value="">Any</option>{search_month_options}</select></div>
        <div><label>Day</label><select name="sd"><option value="">Any</option>{search_day_options}</select></div>
        <div><label>Text</label><input type="text" name="t" value="{text_query}" placeholder="Search all note fields"></div>
        <button type="submit">Search</button>
      </div>
    </form>
  </div>

  <div class="panel">
    <h2>New Entry</h2>
    <form method="post" action="/">
      <input type="hidden" name="action" value="save">
      <div class="row" style="margin-bottom: 12px;">
        <div><label>Visit year</label><select name="visit_year">{visit_year_options}</select></div>
        <div><label>Visit month</label><select name="visit_month">{visit_month_options}</select></div>
        <div><label>Visit day</label><select name="visit_day">{visit_day_options}</select></div>
      </div>
      <label>Subjective (required)</label>
      <textarea name="subjective"></textarea>
      <label>Treatment details (required)</label>
      <textarea name="treatment_details"></textarea>
      <label>Client feedback</label>
      <textarea name="client_feedback"></textarea>
      <label>Home care</label>
      <textarea name="home_care"></textarea>
      <label>Recommended treatment plan</label>
      <textarea name="recommended_treatment_plan"></textarea>
      <button type="submit">Save entry</button>
    </form>
  </div>

  <div class="panel">
    <h2>Entries</h2>
    <table>
      <thead><tr><th>Visit</th><th>Subjective</th><th>Treatment</th><th>Feedback</th><th>Home Care</th><th>Plan</th><th>Saved</th><th></th></tr></thead>
      <tbody>{entry_rows}</tbody>
    </table>
  </div>

  <p class="meta">Database: <span class="mono">{db_path}</span></p>

  <script>
    // Keep the server's liveness timer fed while this tab is open.
    setInterval(() => fetch('/heartbeat', {{ method: 'POST' }}), 2000);
  </script>
</body>
</html>"#,
        shown = entries.len(),
        total = stats.total_entries,
        earliest = html_escape(&stats.earliest_visit_date),
        latest = html_escape(&stats.latest_visit_date),
        uptime = state.start_time.elapsed().as_secs(),
        banner = banner,
        search_year_options = search_year_options,
        search_month_options = search_month_options,
        search_day_options = search_day_options,
        text_query = html_escape(&text_query),
        visit_year_options = visit_year_options,
        visit_month_options = visit_month_options,
        visit_day_options = visit_day_options,
        entry_rows = entry_rows,
        db_path = html_escape(&state.db.path().display().to_string()),
    );

    ([(header::CONTENT_TYPE, "text/html; charset=utf-8")], html)
}

/// Normalize the filter params; with no filter state at all, default the
/// view to today's visits.
fn effective_filters(params: &SearchParams, today: NaiveDate) -> (String, String, String, String) {
    let sy = search::normalize_date_part(&params.sy, 4);
    let sm = search::normalize_date_part(&params.sm, 2);
    let sd = search::normalize_date_part(&params.sd, 2);
    let text_query = params.t.trim().to_string();
    if sy.is_empty() && sm.is_empty() && sd.is_empty() && text_query.is_empty() {
        return (
            format!("{:04}", today.year()),
            format!("{:02}", today.month()),
            format!("{:02}", today.day()),
            text_query,
        );
    }
    (sy, sm, sd, text_query)
}

fn banner_html(msg: &str, err: &str) -> String {
    if !err.trim().is_empty() {
        format!(r#"<div class="banner error">{}</div>"#, html_escape(err))
    } else if !msg.trim().is_empty() {
        format!(r#"<div class="banner success">{}</div>"#, html_escape(msg))
    } else {
        String::new()
    }
}

/// `<option>` list from `from` down to `to` inclusive, 4-digit values.
fn year_options(from: i32, to: i32, selected: &str) -> String {
    let mut out = String::new();
    let mut year = from;
    while year >= to {
        let value = format!("{year:04}");
        let flag = if value == selected { " selected" } else { "" };
        out.push_str(&format!(r#"<option value="{value}"{flag}>{value}</option>"#));
        year -= 1;
    }
    out
}

/// `<option>` list for zero-padded month/day numbers.
fn number_options(from: u32, to: u32, selected: &str) -> String {
    let mut out = String::new();
    for n in from..=to {
        let value = format!("{n:02}");
        let flag = if value == selected { " selected" } else { "" };
        out.push_str(&format!(r#"<option value="{value}"{flag}>{value}</option>"#));
    }
    out
}

fn html_escape(value: &str) -> String {
    value
        .replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
}
