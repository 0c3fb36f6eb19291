use std::fmt::Write;

use bytes::Bytes;

use crate::log::{log_level::LogLevel, log_msg::LogMsg};

/// Timestamp layout: `2024-01-31 13:45:07.123`.
pub const TIME_LAYOUT: &str = "%Y-%m-%d %H:%M:%S%.3f";

/// How the level name is presented. Fixed for the lifetime of an encoder.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Default)]
pub enum PresentationMode {
    /// Uppercase level name, no escape sequences.
    #[default]
    Plain,
    /// Uppercase level name wrapped in an ANSI color.
    Colorized,
}

/// Renders a [`LogMsg`] as one tab-separated line, optionally followed by a
/// multi-line stack trace.
///
/// Column order is `time  LEVEL  logger  caller  message  {fields}`; columns
/// that are absent for a record are skipped rather than left empty.
#[derive(Clone, Copy, Debug, Default)]
pub struct ConsoleEncoder {
    mode: PresentationMode,
}

impl ConsoleEncoder {
    #[must_use]
    pub const fn new(mode: PresentationMode) -> Self {
        Self { mode }
    }

    #[must_use]
    pub const fn mode(&self) -> PresentationMode {
        self.mode
    }

    /// Encodes `msg`. Never fails.
    #[must_use]
    pub fn encode(&self, msg: &LogMsg) -> Bytes {
        let mut line = String::with_capacity(96 + msg.text.len());
        let _ = write!(line, "{}", msg.ts.format(TIME_LAYOUT));

        line.push('\t');
        match self.mode {
            PresentationMode::Plain => line.push_str(msg.level.as_str()),
            PresentationMode::Colorized => {
                let _ = write!(
                    line,
                    "\x1b[{}m{}\x1b[0m",
                    color_code(msg.level),
                    msg.level.as_str()
                );
            }
        }

        if let Some(name) = msg.logger_name.as_deref().filter(|n| !n.is_empty()) {
            line.push('\t');
            line.push_str(name);
        }
        if let Some(caller) = &msg.caller {
            line.push('\t');
            line.push_str(&caller.short());
        }

        line.push('\t');
        line.push_str(&msg.text);

        if !msg.fields.is_empty() {
            line.push('\t');
            line.push('{');
            for (i, field) in msg.fields.iter().enumerate() {
                if i > 0 {
                    line.push(',');
                }
                let key = serde_json::to_string(&field.key)
                    .unwrap_or_else(|_| format!("\"{}\"", field.key));
                let value = serde_json::to_string(&field.value.to_json())
                    .unwrap_or_else(|_| "null".to_owned());
                let _ = write!(line, "{key}:{value}");
            }
            line.push('}');
        }

        line.push('\n');
        if let Some(stack) = msg.stack.as_deref().filter(|s| !s.is_empty()) {
            line.push_str(stack.trim_end_matches('\n'));
            line.push('\n');
        }
        Bytes::from(line)
    }
}

const fn color_code(level: LogLevel) -> u8 {
    match level {
        LogLevel::Debug => 35,
        LogLevel::Info => 34,
        LogLevel::Warn => 33,
        LogLevel::Error | LogLevel::DPanic | LogLevel::Panic | LogLevel::Fatal => 31,
    }
}
