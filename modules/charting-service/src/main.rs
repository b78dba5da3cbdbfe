//! Patient Charting Service — desktop-launched local web server for
//! recording and searching patient visit notes.
//!
//! Single user, single process, SQLite on local disk.
//! Default: http://127.0.0.1:5000/

use charting_service::routes::{self, AppState};
use charting_service::{dashboard, db, watchdog};
use std::sync::Arc;
use std::time::Instant;

#[tokio::main]
async fn main() {
    dotenv::dotenv().ok();
    env_logger::init();

    let port: u16 = std::env::var("CHARTING_PORT")
        .ok()
        .and_then(|s| s.parse().ok())
        .unwrap_or(5000);

    let db_path =
        std::env::var("CHARTING_DB_PATH").unwrap_or_else(|_| "data/charting.db".to_string());

    log::info!("Opening database at: {}", db_path);
    let database = db::Db::open(&db_path).expect("Failed to open database");

    let heartbeat = Arc::new(watchdog::Heartbeat::new());

    let state = Arc::new(AppState {
        db: database,
        heartbeat: heartbeat.clone(),
        start_time: Instant::now(),
    });

    // The packaged desktop launch sets CHARTING_WATCHDOG=1 so the server
    // exits when the browser tab goes away; development runs leave it off.
    let watchdog_enabled = std::env::var("CHARTING_WATCHDOG")
        .map(|v| v == "1")
        .unwrap_or(false);
    if watchdog_enabled {
        let hb = heartbeat.clone();
        tokio::spawn(async move {
            watchdog::run_watchdog(hb, watchdog::HEARTBEAT_TIMEOUT).await;
        });
        log::info!(
            "Heartbeat watchdog enabled (timeout: {:?})",
            watchdog::HEARTBEAT_TIMEOUT
        );
    }

    let cors = tower_http::cors::CorsLayer::permissive();

    let app = axum::Router::new()
        .route(
            "/",
            axum::routing::get(dashboard::dashboard).post(routes::submit),
        )
        .route("/heartbeat", axum::routing::post(routes::heartbeat))
        .with_state(state)
        .layer(cors);

    let addr = format!("127.0.0.1:{}", port);
    log::info!("Patient Charting Service listening on http://{}", addr);

    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .expect("Failed to bind");

    axum::serve(listener, app).await.expect("Server error");
}
