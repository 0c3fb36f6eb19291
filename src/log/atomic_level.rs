use std::sync::{
    Arc,
    atomic::{AtomicU8, Ordering},
};

use crate::log::log_level::LogLevel;

/// Shared, lock-free minimum severity.
///
/// Clones point at the same cell, so a logger and all of its named children
/// observe a `set_level` immediately. The level is stored as a single byte,
/// which makes torn reads impossible.
#[derive(Clone, Debug)]
pub struct AtomicLevel {
    inner: Arc<AtomicU8>,
}

impl AtomicLevel {
    /// Creates a fresh cell, not shared with any other logger.
    #[must_use]
    pub fn new(level: LogLevel) -> Self {
        Self {
            inner: Arc::new(AtomicU8::new(level as u8)),
        }
    }

    /// Current threshold.
    #[must_use]
    pub fn level(&self) -> LogLevel {
        LogLevel::from_u8(self.inner.load(Ordering::Acquire))
    }

    /// Changes the threshold for every clone of this cell.
    pub fn set_level(&self, level: LogLevel) {
        self.inner.store(level as u8, Ordering::Release);
    }

    /// Returns `true` when a record at `level` passes the threshold.
    #[inline]
    #[must_use]
    pub fn enabled(&self, level: LogLevel) -> bool {
        level >= self.level()
    }
}

impl Default for AtomicLevel {
    fn default() -> Self {
        Self::new(LogLevel::Info)
    }
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used, clippy::expect_used)]
    use super::*;

    #[test]
    fn enabled_iff_not_below_threshold() {
        for threshold in LogLevel::ALL {
            let lvl = AtomicLevel::new(threshold);
            for level in LogLevel::ALL {
                assert_eq!(lvl.enabled(level), level >= threshold);
            }
        }
    }

    #[test]
    fn clones_share_the_same_threshold() {
        let a = AtomicLevel::new(LogLevel::Debug);
        let b = a.clone();
        b.set_level(LogLevel::Error);
        assert_eq!(a.level(), LogLevel::Error);
        assert!(!a.enabled(LogLevel::Warn));
    }

    #[test]
    fn concurrent_set_and_read_only_observe_valid_levels() {
        let lvl = AtomicLevel::new(LogLevel::Debug);
        std::thread::scope(|s| {
            for i in 0..4 {
                let lvl = lvl.clone();
                s.spawn(move || {
                    for n in 0..10_000usize {
                        lvl.set_level(LogLevel::ALL[(n + i) % LogLevel::ALL.len()]);
                    }
                });
            }
            for _ in 0..4 {
                let lvl = lvl.clone();
                s.spawn(move || {
                    for _ in 0..10_000 {
                        assert!(LogLevel::ALL.contains(&lvl.level()));
                    }
                });
            }
        });
    }
}
