//! Bridge from the `log` crate's macros to a [`Logger`].

use crate::log::{
    log_error::LogError,
    log_level::LogLevel,
    log_msg::{CallSite, LogMsg},
    logger::Logger,
    printf::format_string,
};

impl log::Log for Logger {
    fn enabled(&self, metadata: &log::Metadata<'_>) -> bool {
        Logger::enabled(self, metadata.level().into())
    }

    /// The record's target becomes the last segment of the logger name.
    fn log(&self, record: &log::Record<'_>) {
        let level = LogLevel::from(record.level());
        if !Logger::enabled(self, level) {
            return;
        }
        let caller = match (self.captures_caller(), record.file(), record.line()) {
            (true, Some(file), Some(line)) => Some(CallSite::new(file, line)),
            _ => None,
        };
        let msg = LogMsg::new(level, format_string(*record.args()))
            .with_logger_name(self.named(record.target()).name().map(str::to_owned))
            .with_caller(caller);
        self.write_msg(msg);
    }

    fn flush(&self) {
        let _ = self.sync();
    }
}

/// Routes the `log` crate's macros to `logger`.
///
/// `log::max_level` is set from the logger's current threshold; later
/// `set_level` calls still filter, but records below the initial level are
/// discarded by the `log` macros before reaching the logger.
pub fn install_facade(logger: &'static Logger) -> Result<(), LogError> {
    log::set_logger(logger).map_err(|_| LogError::FacadeInstalled)?;
    log::set_max_level(match logger.level() {
        LogLevel::Debug => log::LevelFilter::Trace,
        LogLevel::Info => log::LevelFilter::Info,
        LogLevel::Warn => log::LevelFilter::Warn,
        _ => log::LevelFilter::Error,
    });
    Ok(())
}
