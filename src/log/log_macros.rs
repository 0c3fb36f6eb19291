//! Leveled logging macros.
//!
//! Two families:
//! - `log_info!(a, b, ..)` / `log_infof!("tmpl %s", a, ..)` forward to the
//!   process-wide logger (see [`logger_handle`](crate::log::logger_handle)).
//!   The plain form concatenates its arguments with no separator; the `f`
//!   form applies printf-style substitution.
//! - `logger_info!(logger, "x = {}", x)` logs to an explicit [`Logger`]
//!   using Rust format syntax.
//!
//! Every argument only needs to implement `Display`.
//!
//! [`Logger`]: crate::log::logger::Logger

// ============================================================================
// 1. GENERIC INTERNAL MACROS
// ============================================================================

#[doc(hidden)]
#[macro_export]
macro_rules! __log_args {
    ($($arg:expr),* $(,)?) => {
        &[$(&$arg as &dyn ::std::fmt::Display),*]
    };
}

#[macro_export]
macro_rules! logger_log {
    ($logger:expr, $lvl:expr, $($arg:tt)*) => {{
        $logger.log_fmt($lvl, format_args!($($arg)*));
    }};
}

// ============================================================================
// 2. PROCESS-WIDE SHIMS
// ============================================================================

#[macro_export]
macro_rules! log_println { ($($arg:expr),* $(,)?) => { $crate::log::logger_handle::println($crate::__log_args!($($arg),*)) } }
#[macro_export]
macro_rules! log_printf  { ($tmpl:expr $(, $arg:expr)* $(,)?) => { $crate::log::logger_handle::printf($tmpl, $crate::__log_args!($($arg),*)) } }

#[macro_export]
macro_rules! log_debug   { ($($arg:expr),* $(,)?) => { $crate::log::logger_handle::debug($crate::__log_args!($($arg),*)) } }
#[macro_export]
macro_rules! log_debugf  { ($tmpl:expr $(, $arg:expr)* $(,)?) => { $crate::log::logger_handle::debugf($tmpl, $crate::__log_args!($($arg),*)) } }

#[macro_export]
macro_rules! log_info    { ($($arg:expr),* $(,)?) => { $crate::log::logger_handle::info($crate::__log_args!($($arg),*)) } }
#[macro_export]
macro_rules! log_infof   { ($tmpl:expr $(, $arg:expr)* $(,)?) => { $crate::log::logger_handle::infof($tmpl, $crate::__log_args!($($arg),*)) } }

#[macro_export]
macro_rules! log_warn    { ($($arg:expr),* $(,)?) => { $crate::log::logger_handle::warn($crate::__log_args!($($arg),*)) } }
#[macro_export]
macro_rules! log_warnf   { ($tmpl:expr $(, $arg:expr)* $(,)?) => { $crate::log::logger_handle::warnf($tmpl, $crate::__log_args!($($arg),*)) } }

#[macro_export]
macro_rules! log_error   { ($($arg:expr),* $(,)?) => { $crate::log::logger_handle::error($crate::__log_args!($($arg),*)) } }
#[macro_export]
macro_rules! log_errorf  { ($tmpl:expr $(, $arg:expr)* $(,)?) => { $crate::log::logger_handle::errorf($tmpl, $crate::__log_args!($($arg),*)) } }

#[macro_export]
macro_rules! log_dpanic  { ($($arg:expr),* $(,)?) => { $crate::log::logger_handle::dpanic($crate::__log_args!($($arg),*)) } }
#[macro_export]
macro_rules! log_dpanicf { ($tmpl:expr $(, $arg:expr)* $(,)?) => { $crate::log::logger_handle::dpanicf($tmpl, $crate::__log_args!($($arg),*)) } }

#[macro_export]
macro_rules! log_panic   { ($($arg:expr),* $(,)?) => { $crate::log::logger_handle::panic($crate::__log_args!($($arg),*)) } }
#[macro_export]
macro_rules! log_panicf  { ($tmpl:expr $(, $arg:expr)* $(,)?) => { $crate::log::logger_handle::panicf($tmpl, $crate::__log_args!($($arg),*)) } }

#[macro_export]
macro_rules! log_fatal   { ($($arg:expr),* $(,)?) => { $crate::log::logger_handle::fatal($crate::__log_args!($($arg),*)) } }
#[macro_export]
macro_rules! log_fatalf  { ($tmpl:expr $(, $arg:expr)* $(,)?) => { $crate::log::logger_handle::fatalf($tmpl, $crate::__log_args!($($arg),*)) } }

// ============================================================================
// 3. EXPLICIT-LOGGER MACROS
// ============================================================================

#[macro_export]
macro_rules! logger_debug { ($logger:expr, $($arg:tt)*) => { $crate::logger_log!($logger, $crate::log::log_level::LogLevel::Debug, $($arg)*) } }
#[macro_export]
macro_rules! logger_info  { ($logger:expr, $($arg:tt)*) => { $crate::logger_log!($logger, $crate::log::log_level::LogLevel::Info, $($arg)*) } }
#[macro_export]
macro_rules! logger_warn  { ($logger:expr, $($arg:tt)*) => { $crate::logger_log!($logger, $crate::log::log_level::LogLevel::Warn, $($arg)*) } }
#[macro_export]
macro_rules! logger_error { ($logger:expr, $($arg:tt)*) => { $crate::logger_log!($logger, $crate::log::log_level::LogLevel::Error, $($arg)*) } }
