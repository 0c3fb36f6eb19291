use std::panic::Location;

use chrono::{DateTime, Local};

use crate::log::{field::Field, log_level::LogLevel};

/// Source location of a logging call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CallSite {
    pub file: String,
    pub line: u32,
}

impl CallSite {
    pub fn new(file: impl Into<String>, line: u32) -> Self {
        Self {
            file: file.into(),
            line,
        }
    }

    /// Short form: final path segment plus line number, e.g. `logger.rs:42`.
    #[must_use]
    pub fn short(&self) -> String {
        let name = self
            .file
            .rsplit(['/', '\\'])
            .next()
            .unwrap_or(self.file.as_str());
        format!("{name}:{}", self.line)
    }
}

impl From<&Location<'_>> for CallSite {
    fn from(loc: &Location<'_>) -> Self {
        Self::new(loc.file(), loc.line())
    }
}

/// Represents a single log event between the logging call and the encoder.
#[derive(Debug, Clone)]
pub struct LogMsg {
    /// The severity level of the log.
    pub level: LogLevel,
    /// Capture time; encoded with millisecond precision.
    pub ts: DateTime<Local>,
    /// Fully qualified logger name, if the logger was named.
    pub logger_name: Option<String>,
    /// Populated only when call-site capture is enabled.
    pub caller: Option<CallSite>,
    /// The message after template substitution or concatenation.
    pub text: String,
    pub fields: Vec<Field>,
    /// Rendered backtrace, when the level is at or above the stacktrace level.
    pub stack: Option<String>,
}

impl LogMsg {
    /// Creates a new `LogMsg` stamped with the current local time.
    ///
    /// # Example
    ///
    /// ```rust,ignore
    /// use rustylog::log::{log_level::LogLevel, log_msg::LogMsg};
    ///
    /// let msg = LogMsg::new(LogLevel::Info, "Connection established");
    /// ```
    pub fn new(level: LogLevel, text: impl Into<String>) -> Self {
        Self {
            level,
            ts: Local::now(),
            logger_name: None,
            caller: None,
            text: text.into(),
            fields: Vec::new(),
            stack: None,
        }
    }

    #[must_use]
    pub fn with_logger_name(mut self, name: Option<String>) -> Self {
        self.logger_name = name;
        self
    }

    #[must_use]
    pub fn with_caller(mut self, caller: Option<CallSite>) -> Self {
        self.caller = caller;
        self
    }

    #[must_use]
    pub fn with_fields(mut self, fields: Vec<Field>) -> Self {
        self.fields = fields;
        self
    }

    #[must_use]
    pub fn with_stack(mut self, stack: Option<String>) -> Self {
        self.stack = stack;
        self
    }
}
