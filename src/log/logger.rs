use std::{
    backtrace::Backtrace,
    fmt::{self, Display},
    io::{self, Write as _},
    panic::Location,
    path::PathBuf,
    sync::Arc,
};

use chrono::Local;

use crate::{
    config::LogConfig,
    log::{
        atomic_level::AtomicLevel,
        encoder::{ConsoleEncoder, PresentationMode},
        field::Field,
        log_error::MultiWriteError,
        log_level::LogLevel,
        log_msg::{CallSite, LogMsg},
        multi_writer::{Destination, MultiWriter},
        printf::{concat, format_string, sprintf},
        rotating_file::RotatingFileWriter,
    },
};

/// Called by [`Logger::fatal`] once the record has been written and flushed.
pub type ExitHook = fn(i32) -> !;

fn process_exit(code: i32) -> ! {
    std::process::exit(code)
}

/// Immutable part of a logger, shared by all of its named children.
struct Core {
    encoder: ConsoleEncoder,
    writer: MultiWriter,
    add_caller: bool,
    development: bool,
    stacktrace_level: Option<LogLevel>,
    exit_hook: ExitHook,
}

/// Level-filtered, multi-destination logger.
///
/// Cloning is cheap; clones and [`named`](Self::named) children share the
/// threshold and the destinations.
///
/// Every logging call is fire-and-forget: encoding cannot fail and write
/// errors are dropped. The only calls with control-flow effects are
/// [`panic`](Self::panic), [`fatal`](Self::fatal) and, when the logger is in
/// development mode, [`dpanic`](Self::dpanic). Those terminate even when
/// their record is below the threshold.
#[derive(Clone)]
pub struct Logger {
    level: AtomicLevel,
    name: Option<String>,
    core: Arc<Core>,
}

impl fmt::Debug for Logger {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Logger")
            .field("level", &self.level.level())
            .field("name", &self.name)
            .field("mode", &self.core.encoder.mode())
            .field("destinations", &self.core.writer)
            .field("add_caller", &self.core.add_caller)
            .field("development", &self.core.development)
            .finish()
    }
}

/// Builds a logger from its level name and whether to also log to
/// `<cwd>/logs/<YYYYMMDD>.log`.
///
/// `debug` enables call-site capture. With file logging on, both
/// destinations get plain level names; console-only output is colorized.
#[must_use]
pub fn new_sink(level_name: &str, log_to_file: bool) -> Logger {
    Logger::from_config(&LogConfig::new(level_name, log_to_file))
}

/// `<cwd>/logs/<YYYYMMDD>.log`, with `.` standing in for an unresolvable
/// working directory.
#[must_use]
pub fn default_log_file() -> PathBuf {
    let cwd = std::env::current_dir().unwrap_or_else(|_| PathBuf::from("."));
    log_file_in(&cwd.join("logs"))
}

fn log_file_in(dir: &std::path::Path) -> PathBuf {
    dir.join(format!("{}.log", Local::now().format("%Y%m%d")))
}

impl Logger {
    #[must_use]
    pub fn builder() -> LoggerBuilder {
        LoggerBuilder::default()
    }

    /// Console logger plus, when `config.log_to_file` is set, a rotating file.
    #[must_use]
    pub fn from_config(config: &LogConfig) -> Self {
        let level = config.level();
        let mut builder = Logger::builder()
            .level(level)
            .add_caller(level == LogLevel::Debug)
            .development(config.development)
            .destination(Destination::stdout());
        if let Some(name) = &config.name {
            builder = builder.name(name.clone());
        }
        if let Some(stack) = config.stacktrace_level() {
            builder = builder.stacktrace_level(stack);
        }

        let file = config.log_to_file.then(|| {
            config
                .log_dir
                .as_deref()
                .map_or_else(default_log_file, log_file_in)
        });
        let logger = match &file {
            Some(path) => builder
                .presentation(PresentationMode::Plain)
                .destination(Destination::new(
                    path.display().to_string(),
                    RotatingFileWriter::new(path, config.rotation.policy()),
                ))
                .build(),
            None => builder.presentation(PresentationMode::Colorized).build(),
        };

        // Plain stdout line, independent of the threshold and the file.
        if let Some(path) = file {
            let _ = writeln!(io::stdout(), "current log file: {}", path.display());
        }
        logger
    }

    /// Current threshold.
    #[must_use]
    pub fn level(&self) -> LogLevel {
        self.level.level()
    }

    /// Adjusts the threshold for this logger and everything sharing it.
    pub fn set_level(&self, level: LogLevel) {
        self.level.set_level(level);
    }

    #[must_use]
    pub fn atomic_level(&self) -> &AtomicLevel {
        &self.level
    }

    /// Whether a non-terminating record at `level` would be written.
    #[must_use]
    pub fn enabled(&self, level: LogLevel) -> bool {
        self.level.enabled(level)
    }

    #[must_use]
    pub fn name(&self) -> Option<&str> {
        self.name.as_deref()
    }

    /// Child logger whose name is appended to this one's with a `.`.
    #[must_use]
    pub fn named(&self, name: &str) -> Logger {
        let name = match (&self.name, name.is_empty()) {
            (_, true) => self.name.clone(),
            (None, false) => Some(name.to_owned()),
            (Some(parent), false) => Some(format!("{parent}.{name}")),
        };
        Logger {
            level: self.level.clone(),
            name,
            core: Arc::clone(&self.core),
        }
    }

    /// Flushes every destination.
    ///
    /// # Errors
    /// Lists each destination whose flush failed; the others are still
    /// flushed.
    pub fn sync(&self) -> Result<(), MultiWriteError> {
        self.core.writer.flush()
    }

    /// Logs the concatenation of `args` at `level`.
    #[track_caller]
    pub fn log(&self, level: LogLevel, args: &[&dyn Display]) {
        let caller = Location::caller();
        self.dispatch(level, || concat(args), &[], caller);
    }

    /// Logs `template` with printf-style substitution of `args` at `level`.
    #[track_caller]
    pub fn logf(&self, level: LogLevel, template: &str, args: &[&dyn Display]) {
        let caller = Location::caller();
        self.dispatch(level, || sprintf(template, args), &[], caller);
    }

    /// Logs pre-built `format_args!` output; used by the `logger_*!` macros.
    #[track_caller]
    pub fn log_fmt(&self, level: LogLevel, args: fmt::Arguments<'_>) {
        let caller = Location::caller();
        self.dispatch(level, || format_string(args), &[], caller);
    }

    /// Logs `msg` with structured key/value fields.
    #[track_caller]
    pub fn log_fields(&self, level: LogLevel, msg: &str, fields: &[Field]) {
        let caller = Location::caller();
        self.dispatch(level, || msg.to_owned(), fields, caller);
    }

    /// Logs the concatenation of `args` at `Debug`.
    #[track_caller]
    pub fn debug(&self, args: &[&dyn Display]) {
        self.log(LogLevel::Debug, args);
    }

    /// Logs `template` with `args` substituted at `Debug`.
    #[track_caller]
    pub fn debugf(&self, template: &str, args: &[&dyn Display]) {
        self.logf(LogLevel::Debug, template, args);
    }

    /// Logs the concatenation of `args` at `Info`.
    #[track_caller]
    pub fn info(&self, args: &[&dyn Display]) {
        self.log(LogLevel::Info, args);
    }

    /// Logs `template` with `args` substituted at `Info`.
    #[track_caller]
    pub fn infof(&self, template: &str, args: &[&dyn Display]) {
        self.logf(LogLevel::Info, template, args);
    }

    /// Logs the concatenation of `args` at `Warn`.
    #[track_caller]
    pub fn warn(&self, args: &[&dyn Display]) {
        self.log(LogLevel::Warn, args);
    }

    /// Logs `template` with `args` substituted at `Warn`.
    #[track_caller]
    pub fn warnf(&self, template: &str, args: &[&dyn Display]) {
        self.logf(LogLevel::Warn, template, args);
    }

    /// Logs the concatenation of `args` at `Error`.
    #[track_caller]
    pub fn error(&self, args: &[&dyn Display]) {
        self.log(LogLevel::Error, args);
    }

    /// Logs `template` with `args` substituted at `Error`.
    #[track_caller]
    pub fn errorf(&self, template: &str, args: &[&dyn Display]) {
        self.logf(LogLevel::Error, template, args);
    }

    /// Logs at `DPanic`; panics afterwards only in development mode.
    #[track_caller]
    pub fn dpanic(&self, args: &[&dyn Display]) {
        self.log(LogLevel::DPanic, args);
    }

    /// Template form of [`dpanic`](Self::dpanic).
    #[track_caller]
    pub fn dpanicf(&self, template: &str, args: &[&dyn Display]) {
        self.logf(LogLevel::DPanic, template, args);
    }

    /// Logs at `Panic`, then panics with the message.
    #[track_caller]
    pub fn panic(&self, args: &[&dyn Display]) -> ! {
        let caller = Location::caller();
        self.terminate(LogLevel::Panic, concat(args), &[], caller)
    }

    /// Template form of [`panic`](Self::panic).
    ///
    /// # Panics
    /// Always, with the formatted message as a `String` payload.
    #[track_caller]
    pub fn panicf(&self, template: &str, args: &[&dyn Display]) -> ! {
        let caller = Location::caller();
        self.terminate(LogLevel::Panic, sprintf(template, args), &[], caller)
    }

    /// Logs at `Fatal`, flushes, then exits the process with status 1.
    #[track_caller]
    pub fn fatal(&self, args: &[&dyn Display]) -> ! {
        let caller = Location::caller();
        self.terminate(LogLevel::Fatal, concat(args), &[], caller)
    }

    /// Template form of [`fatal`](Self::fatal).
    #[track_caller]
    pub fn fatalf(&self, template: &str, args: &[&dyn Display]) -> ! {
        let caller = Location::caller();
        self.terminate(LogLevel::Fatal, sprintf(template, args), &[], caller)
    }

    pub(crate) fn captures_caller(&self) -> bool {
        self.core.add_caller
    }

    /// Writes an already-built record, bypassing call-site capture. Used to
    /// bridge records from other logging front ends.
    pub(crate) fn write_msg(&self, msg: LogMsg) {
        if !self.level.enabled(msg.level) {
            return;
        }
        let stack = self.stack_for(msg.level);
        let msg = msg.with_stack(stack);
        let bytes = self.core.encoder.encode(&msg);
        let _ = self.core.writer.write(&bytes);
    }

    fn terminates(&self, level: LogLevel) -> bool {
        match level {
            LogLevel::Panic | LogLevel::Fatal => true,
            LogLevel::DPanic => self.core.development,
            _ => false,
        }
    }

    fn dispatch(
        &self,
        level: LogLevel,
        text: impl FnOnce() -> String,
        fields: &[Field],
        caller: &'static Location<'static>,
    ) {
        let terminates = self.terminates(level);
        if !terminates && !self.level.enabled(level) {
            return;
        }
        let text = text();
        if terminates {
            self.terminate(level, text, fields, caller);
        }
        self.emit(level, text, fields, caller);
    }

    fn terminate(
        &self,
        level: LogLevel,
        text: String,
        fields: &[Field],
        caller: &'static Location<'static>,
    ) -> ! {
        if self.level.enabled(level) {
            self.emit(level, text.clone(), fields, caller);
        }
        if level == LogLevel::Fatal {
            let _ = self.sync();
            (self.core.exit_hook)(1)
        }
        let _ = self.sync();
        std::panic::panic_any(text)
    }

    fn emit(
        &self,
        level: LogLevel,
        text: String,
        fields: &[Field],
        caller: &'static Location<'static>,
    ) {
        let msg = LogMsg::new(level, text)
            .with_logger_name(self.name.clone())
            .with_caller(self.core.add_caller.then(|| CallSite::from(caller)))
            .with_fields(fields.to_vec())
            .with_stack(self.stack_for(level));
        let bytes = self.core.encoder.encode(&msg);
        let _ = self.core.writer.write(&bytes);
    }

    fn stack_for(&self, level: LogLevel) -> Option<String> {
        self.core
            .stacktrace_level
            .filter(|min| level >= *min)
            .map(|_| Backtrace::force_capture().to_string())
    }
}

/// Step-by-step construction of a [`Logger`].
pub struct LoggerBuilder {
    level: LogLevel,
    mode: PresentationMode,
    destinations: Vec<Destination>,
    name: Option<String>,
    add_caller: bool,
    development: bool,
    stacktrace_level: Option<LogLevel>,
    exit_hook: ExitHook,
}

impl Default for LoggerBuilder {
    fn default() -> Self {
        Self {
            level: LogLevel::Info,
            mode: PresentationMode::Plain,
            destinations: Vec::new(),
            name: None,
            add_caller: false,
            development: false,
            stacktrace_level: None,
            exit_hook: process_exit,
        }
    }
}

impl LoggerBuilder {
    #[must_use]
    pub fn level(mut self, level: LogLevel) -> Self {
        self.level = level;
        self
    }

    #[must_use]
    pub fn presentation(mut self, mode: PresentationMode) -> Self {
        self.mode = mode;
        self
    }

    #[must_use]
    pub fn destination(mut self, destination: Destination) -> Self {
        self.destinations.push(destination);
        self
    }

    #[must_use]
    pub fn name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    /// Record the file and line of each logging call.
    #[must_use]
    pub fn add_caller(mut self, enabled: bool) -> Self {
        self.add_caller = enabled;
        self
    }

    /// Make `dpanic` calls panic after logging.
    #[must_use]
    pub fn development(mut self, enabled: bool) -> Self {
        self.development = enabled;
        self
    }

    /// Attach a backtrace to records at or above `level`.
    #[must_use]
    pub fn stacktrace_level(mut self, level: LogLevel) -> Self {
        self.stacktrace_level = Some(level);
        self
    }

    /// Replaces `std::process::exit` as the final step of `fatal`.
    #[must_use]
    pub fn exit_hook(mut self, hook: ExitHook) -> Self {
        self.exit_hook = hook;
        self
    }

    #[must_use]
    pub fn build(self) -> Logger {
        Logger {
            level: AtomicLevel::new(self.level),
            name: self.name,
            core: Arc::new(Core {
                encoder: ConsoleEncoder::new(self.mode),
                writer: MultiWriter::new(self.destinations),
                add_caller: self.add_caller,
                development: self.development,
                stacktrace_level: self.stacktrace_level,
                exit_hook: self.exit_hook,
            }),
        }
    }
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used, clippy::expect_used)]
    use super::*;
    use crate::log::multi_writer::test_util::{FailingWriter, SharedBuffer};
    use std::{
        panic::{AssertUnwindSafe, catch_unwind},
        time::Duration,
    };

    /// Runs `f`, which must unwind, and returns the panic payload.
    fn unwind_payload(f: impl FnOnce()) -> Box<dyn std::any::Any + Send> {
        catch_unwind(AssertUnwindSafe(f)).expect_err("expected a panic")
    }

    fn capture(level: LogLevel) -> (Logger, SharedBuffer) {
        let buf = SharedBuffer::default();
        let logger = Logger::builder()
            .level(level)
            .destination(Destination::new("buf", buf.clone()))
            .build();
        (logger, buf)
    }

    /// Fields after the timestamp column.
    fn columns(line: &str) -> Vec<&str> {
        line.split('\t').skip(1).collect()
    }

    #[test]
    fn emits_iff_level_not_below_threshold() {
        let non_terminal = [
            LogLevel::Debug,
            LogLevel::Info,
            LogLevel::Warn,
            LogLevel::Error,
            LogLevel::DPanic,
        ];
        for threshold in LogLevel::ALL {
            let (logger, buf) = capture(threshold);
            for level in non_terminal {
                logger.log(level, &[&"x"]);
            }
            let expected = non_terminal.iter().filter(|l| **l >= threshold).count();
            assert_eq!(buf.contents().lines().count(), expected, "threshold {threshold}");
        }
    }

    #[test]
    fn template_and_concatenation_forms() {
        let (logger, buf) = capture(LogLevel::Debug);
        logger.infof("user %s logged in", &[&"alice"]);
        logger.info(&[&"user ", &"alice", &" logged in"]);

        let out = buf.contents();
        let lines: Vec<&str> = out.lines().collect();
        assert_eq!(columns(lines[0]), vec!["INFO", "user alice logged in"]);
        assert_eq!(columns(lines[1]), vec!["INFO", "user alice logged in"]);
    }

    #[test]
    fn caller_is_the_logging_call_site() {
        let buf = SharedBuffer::default();
        let logger = Logger::builder()
            .level(LogLevel::Debug)
            .add_caller(true)
            .destination(Destination::new("buf", buf.clone()))
            .build();

        let line = line!() + 1;
        logger.debug(&[&"here"]);

        let out = buf.contents();
        assert_eq!(
            columns(out.trim_end()),
            vec!["DEBUG".to_owned(), format!("logger.rs:{line}"), "here".to_owned()]
        );
    }

    #[test]
    fn named_children_share_threshold_and_join_names() {
        let (root, buf) = capture(LogLevel::Info);
        let child = root.named("http").named("client");
        assert_eq!(child.name(), Some("http.client"));

        child.warn(&[&"slow"]);
        root.set_level(LogLevel::Error);
        child.warn(&[&"dropped"]);

        let out = buf.contents();
        assert_eq!(out.lines().count(), 1);
        assert_eq!(columns(out.trim_end()), vec!["WARN", "http.client", "slow"]);
    }

    #[test]
    fn structured_fields_follow_the_message() {
        let (logger, buf) = capture(LogLevel::Info);
        logger.log_fields(
            LogLevel::Info,
            "request done",
            &[Field::uint("status", 200), Field::duration("took", Duration::from_micros(1500))],
        );
        assert!(
            buf.contents()
                .ends_with("\trequest done\t{\"status\":200,\"took\":0.0015}\n")
        );
    }

    #[test]
    fn broken_destination_does_not_reach_the_caller() {
        let buf = SharedBuffer::default();
        let logger = Logger::builder()
            .destination(Destination::new("broken", FailingWriter))
            .destination(Destination::new("buf", buf.clone()))
            .build();

        logger.error(&[&"still delivered"]);
        assert!(buf.contents().contains("ERROR\tstill delivered"));
        assert!(logger.sync().is_err());
    }

    #[test]
    fn panic_logs_then_unwinds_with_the_message() {
        let (logger, buf) = capture(LogLevel::Info);
        let err = unwind_payload(|| logger.panicf("bad state %d", &[&7]));
        assert_eq!(err.downcast_ref::<String>().unwrap(), "bad state 7");
        assert!(buf.contents().contains("PANIC\tbad state 7"));
    }

    #[test]
    fn panic_unwinds_even_when_filtered() {
        let (logger, buf) = capture(LogLevel::Fatal);
        unwind_payload(|| logger.panic(&[&"quiet"]));
        assert!(buf.contents().is_empty());
    }

    #[test]
    fn dpanic_only_panics_in_development() {
        let (prod, prod_buf) = capture(LogLevel::Info);
        prod.dpanic(&[&"tolerated"]);
        assert!(prod_buf.contents().contains("DPANIC\ttolerated"));

        let dev_buf = SharedBuffer::default();
        let dev = Logger::builder()
            .development(true)
            .destination(Destination::new("buf", dev_buf.clone()))
            .build();
        unwind_payload(|| dev.dpanicf("%s", &[&"fatal in dev"]));
        assert!(dev_buf.contents().contains("DPANIC\tfatal in dev"));
    }

    fn exit_by_panicking(code: i32) -> ! {
        std::panic::panic_any(code)
    }

    #[test]
    fn fatal_emits_before_exiting() {
        let buf = SharedBuffer::default();
        let logger = Logger::builder()
            .destination(Destination::new("buf", buf.clone()))
            .exit_hook(exit_by_panicking)
            .build();

        let err = unwind_payload(|| logger.fatalf("cannot bind %s", &[&":80"]));
        assert_eq!(err.downcast_ref::<i32>(), Some(&1));
        assert!(buf.contents().contains("FATAL\tcannot bind :80"));
    }

    #[test]
    fn stacktrace_is_attached_at_configured_level() {
        let buf = SharedBuffer::default();
        let logger = Logger::builder()
            .stacktrace_level(LogLevel::Error)
            .destination(Destination::new("buf", buf.clone()))
            .build();

        logger.warn(&[&"no trace"]);
        logger.error(&[&"with trace"]);

        let out = buf.contents();
        let mut lines = out.lines();
        assert!(lines.next().unwrap().ends_with("WARN\tno trace"));
        assert!(lines.next().unwrap().ends_with("ERROR\twith trace"));
        assert!(lines.next().is_some(), "expected backtrace lines");
    }

    #[test]
    fn failing_display_does_not_unwind_the_caller() {
        struct Broken;
        impl Display for Broken {
            fn fmt(&self, _: &mut fmt::Formatter<'_>) -> fmt::Result {
                Err(fmt::Error)
            }
        }

        let (logger, buf) = capture(LogLevel::Debug);
        let res = catch_unwind(AssertUnwindSafe(|| {
            logger.infof("value %s", &[&Broken]);
            logger.info(&[&"value ", &Broken]);
            logger.log_fmt(LogLevel::Warn, format_args!("value {}", Broken));
        }));
        assert!(res.is_ok());

        let out = buf.contents();
        let lines: Vec<&str> = out.lines().collect();
        assert_eq!(columns(lines[0]), vec!["INFO", "value %!s(BADDISPLAY)"]);
        assert_eq!(columns(lines[1]), vec!["INFO", "value %!v(BADDISPLAY)"]);
        assert_eq!(columns(lines[2]), vec!["WARN", "value %!v(BADDISPLAY)"]);
    }

    #[test]
    fn threshold_changes_race_cleanly_with_logging() {
        let (logger, buf) = capture(LogLevel::Debug);
        std::thread::scope(|s| {
            let setter = logger.clone();
            s.spawn(move || {
                for n in 0..2_000usize {
                    setter.set_level(LogLevel::ALL[n % 4]);
                }
            });
            for _ in 0..4 {
                let logger = logger.clone();
                s.spawn(move || {
                    for i in 0..500 {
                        logger.warnf("tick %d", &[&i]);
                    }
                });
            }
        });
        for line in buf.contents().lines() {
            assert!(line.contains("\tWARN\ttick "), "{line}");
        }
    }

    #[test]
    fn from_config_writes_console_and_file() {
        let tmp = tempfile::tempdir().unwrap();
        let mut config = LogConfig::new("warn", true);
        config.log_dir = Some(tmp.path().to_path_buf());

        let logger = Logger::from_config(&config);
        logger.warn(&[&"to disk"]);
        logger.sync().unwrap();

        let path = log_file_in(tmp.path());
        let text = std::fs::read_to_string(path).unwrap();
        assert!(text.contains("\tWARN\tto disk\n"));
        assert!(!text.contains('\x1b'));
        assert!(!text.contains("current log file"));
    }

    #[test]
    fn startup_notice_stays_out_of_the_file() {
        let tmp = tempfile::tempdir().unwrap();
        let mut config = LogConfig::new("debug", true);
        config.log_dir = Some(tmp.path().to_path_buf());

        let logger = Logger::from_config(&config);
        logger.sync().unwrap();

        let path = log_file_in(tmp.path());
        let text = std::fs::read_to_string(path).unwrap_or_default();
        assert!(!text.contains("current log file"));
    }

    #[test]
    fn new_sink_enables_caller_only_for_debug() {
        assert!(new_sink("debug", false).core.add_caller);
        assert!(!new_sink("info", false).core.add_caller);
        assert!(!new_sink("nonsense", false).core.add_caller);
        assert_eq!(new_sink("nonsense", false).level(), LogLevel::Info);
        assert_eq!(
            new_sink("error", false).core.encoder.mode(),
            PresentationMode::Colorized
        );
    }
}
