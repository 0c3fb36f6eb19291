//! RustyLog is a process-wide structured logger.
//!
//! A single [`Logger`](log::logger::Logger) filters calls against an atomic
//! severity threshold, renders each admitted call as one tab-separated line
//! and fans it out to its destinations: standard output and, optionally, a
//! size- and age-bounded rotating file under `logs/`.
//!
//! ```rust,no_run
//! use rustylog::{log::logger_handle, log_infof, log_warn};
//!
//! logger_handle::init_sink("debug", true).ok();
//! log_infof!("user %s logged in", "alice");
//! log_warn!("disk usage at ", 91, "%");
//! ```

/// Handles configuration loading.
pub mod config;
/// Severity model, encoder, writers and the logger itself.
pub mod log;
