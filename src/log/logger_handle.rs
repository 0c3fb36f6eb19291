//! Process-wide logger.
//!
//! [`init`] installs the logger exactly once; the free functions below
//! forward to it. Calling them before `init` is a programming error and
//! panics with [`LogError::NotInitialized`]. Code that wants to handle that
//! case uses [`try_global`] instead.

use std::{fmt::Display, sync::OnceLock};

use crate::log::{
    log_error::LogError,
    log_level::LogLevel,
    logger::{Logger, new_sink},
};

static GLOBAL: OnceLock<Logger> = OnceLock::new();

/// Installs `logger` as the process-wide logger.
///
/// # Errors
/// [`LogError::AlreadyInitialized`] if a logger is already installed; the
/// installed one is left untouched.
pub fn init(logger: Logger) -> Result<&'static Logger, LogError> {
    GLOBAL
        .set(logger)
        .map_err(|_| LogError::AlreadyInitialized)?;
    try_global()
}

/// Builds the logger from a level name and file flag, then installs it.
///
/// # Errors
/// Same as [`init`].
pub fn init_sink(level_name: &str, log_to_file: bool) -> Result<&'static Logger, LogError> {
    init(new_sink(level_name, log_to_file))
}

/// The process-wide logger, if [`init`] has run.
///
/// # Errors
/// [`LogError::NotInitialized`] before [`init`].
pub fn try_global() -> Result<&'static Logger, LogError> {
    GLOBAL.get().ok_or(LogError::NotInitialized)
}

/// The process-wide logger.
///
/// # Panics
/// If [`init`] has not been called.
#[must_use]
pub fn global() -> &'static Logger {
    match GLOBAL.get() {
        Some(logger) => logger,
        None => panic!("{}", LogError::NotInitialized),
    }
}

/// Adjusts the process-wide threshold.
#[track_caller]
pub fn set_level(level: LogLevel) {
    global().set_level(level);
}

/// `Info`-level concatenation, for `println`-style call sites.
#[track_caller]
pub fn println(args: &[&dyn Display]) {
    global().info(args);
}

/// `Info`-level template, for `printf`-style call sites.
#[track_caller]
pub fn printf(template: &str, args: &[&dyn Display]) {
    global().infof(template, args);
}

#[track_caller]
pub fn debug(args: &[&dyn Display]) {
    global().debug(args);
}

#[track_caller]
pub fn debugf(template: &str, args: &[&dyn Display]) {
    global().debugf(template, args);
}

#[track_caller]
pub fn info(args: &[&dyn Display]) {
    global().info(args);
}

#[track_caller]
pub fn infof(template: &str, args: &[&dyn Display]) {
    global().infof(template, args);
}

#[track_caller]
pub fn warn(args: &[&dyn Display]) {
    global().warn(args);
}

#[track_caller]
pub fn warnf(template: &str, args: &[&dyn Display]) {
    global().warnf(template, args);
}

#[track_caller]
pub fn error(args: &[&dyn Display]) {
    global().error(args);
}

#[track_caller]
pub fn errorf(template: &str, args: &[&dyn Display]) {
    global().errorf(template, args);
}

#[track_caller]
pub fn dpanic(args: &[&dyn Display]) {
    global().dpanic(args);
}

#[track_caller]
pub fn dpanicf(template: &str, args: &[&dyn Display]) {
    global().dpanicf(template, args);
}

#[track_caller]
pub fn panic(args: &[&dyn Display]) -> ! {
    global().panic(args)
}

#[track_caller]
pub fn panicf(template: &str, args: &[&dyn Display]) -> ! {
    global().panicf(template, args)
}

#[track_caller]
pub fn fatal(args: &[&dyn Display]) -> ! {
    global().fatal(args)
}

#[track_caller]
pub fn fatalf(template: &str, args: &[&dyn Display]) -> ! {
    global().fatalf(template, args)
}
