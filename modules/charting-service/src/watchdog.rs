//! Liveness watchdog for the desktop-launched server.
//!
//! The dashboard page posts to `/heartbeat` every couple of seconds while a
//! tab is open. When the watchdog is enabled and no beat arrives for the
//! timeout window, the process exits cleanly — a dead-man's switch, not a
//! scheduler.

use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};

pub const HEARTBEAT_TIMEOUT: Duration = Duration::from_secs(5);
const CHECK_INTERVAL: Duration = Duration::from_secs(1);

/// Shared timestamp of the last received heartbeat. Written by the
/// `/heartbeat` handler, read by the single watchdog task.
pub struct Heartbeat {
    last: Mutex<Instant>,
}

impl Heartbeat {
    pub fn new() -> Self {
        Self {
            last: Mutex::new(Instant::now()),
        }
    }

    pub fn beat(&self) {
        *self.last.lock().unwrap() = Instant::now();
    }

    pub fn idle(&self) -> Duration {
        self.last.lock().unwrap().elapsed()
    }
}

impl Default for Heartbeat {
    fn default() -> Self {
        Self::new()
    }
}

/// Check once a second; exit the process when the heartbeat goes stale.
pub async fn run_watchdog(heartbeat: Arc<Heartbeat>, timeout: Duration) {
    loop {
        tokio::time::sleep(CHECK_INTERVAL).await;
        let idle = heartbeat.idle();
        if idle >= timeout {
            log::info!("No heartbeat for {idle:?} — browser closed, shutting down");
            std::process::exit(0);
        }
    }
}
