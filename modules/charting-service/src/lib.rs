//! Patient charting service library.
//!
//! SQLite-backed entry repository, date-fragment search, legacy CSV import,
//! and the local dashboard UI served by the `charting-service` binary.

pub mod dashboard;
pub mod db;
pub mod error;
pub mod import;
pub mod routes;
pub mod search;
pub mod watchdog;
