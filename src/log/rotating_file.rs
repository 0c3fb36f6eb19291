//! Size- and age-bounded append-only log file.
//!
//! Backups live next to the active file and are named
//! `<stem>-<YYYY-MM-DDTHH-MM-SS.mmm><ext>` (plus `.gz` once compressed), so
//! `logs/20240309.log` rotates into `logs/20240309-2024-03-09T17-02-11.481.log`.
//! Pruning runs after each rotation: the newest `max_backups` backups are
//! kept and anything older than `max_age` is removed.

use std::{
    collections::HashSet,
    fs::{self, File, OpenOptions},
    io::{self, Write},
    path::{Path, PathBuf},
    time::Duration,
};

use chrono::{Local, NaiveDateTime, TimeDelta, Utc};
use flate2::{Compression, write::GzEncoder};

use crate::log::log_error::LogError;

const BACKUP_TIME_FORMAT: &str = "%Y-%m-%dT%H-%M-%S%.3f";
const COMPRESS_SUFFIX: &str = ".gz";
const MEGABYTE: u64 = 1024 * 1024;

/// Rotation and retention limits. Zero disables the corresponding limit,
/// except `max_size`, which must be positive.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RotationPolicy {
    /// Maximum size of the active file in bytes.
    pub max_size: u64,
    /// Maximum number of backups to retain.
    pub max_backups: usize,
    /// Maximum age of the active file and of retained backups.
    pub max_age: Duration,
    /// Gzip backups after rotation.
    pub compress: bool,
    /// Stamp backup names with local time instead of UTC.
    pub local_time: bool,
}

impl RotationPolicy {
    #[must_use]
    pub fn new(max_size_mb: u64, max_backups: usize, max_age_days: u64, compress: bool) -> Self {
        Self {
            max_size: max_size_mb.saturating_mul(MEGABYTE),
            max_backups,
            max_age: Duration::from_secs(max_age_days.saturating_mul(24 * 60 * 60)),
            compress,
            local_time: true,
        }
    }
}

impl Default for RotationPolicy {
    fn default() -> Self {
        Self::new(128, 30, 7, true)
    }
}

/// Bookkeeping for the active file.
#[derive(Debug, Clone)]
pub struct RotationState {
    pub path: PathBuf,
    pub size: u64,
    pub opened_at: NaiveDateTime,
    pub backups: usize,
}

#[derive(Debug)]
struct Backup {
    path: PathBuf,
    /// File name without the compression suffix; a backup and its
    /// compressed twin share it.
    base: String,
    stamp: NaiveDateTime,
    compressed: bool,
}

/// Write destination that rotates its file transparently.
///
/// The file is opened lazily on the first write. The writer is not
/// internally synchronized; wrap it in a [`MultiWriter`] destination (or
/// any mutex) when sharing it across threads.
///
/// [`MultiWriter`]: crate::log::multi_writer::MultiWriter
#[derive(Debug)]
pub struct RotatingFileWriter {
    policy: RotationPolicy,
    state: RotationState,
    file: Option<File>,
    last_stamp: Option<NaiveDateTime>,
}

impl RotatingFileWriter {
    pub fn new(path: impl Into<PathBuf>, policy: RotationPolicy) -> Self {
        let state = RotationState {
            path: path.into(),
            size: 0,
            opened_at: now(policy.local_time),
            backups: 0,
        };
        Self {
            policy,
            state,
            file: None,
            last_stamp: None,
        }
    }

    #[must_use]
    pub fn path(&self) -> &Path {
        &self.state.path
    }

    #[must_use]
    pub fn policy(&self) -> &RotationPolicy {
        &self.policy
    }

    #[must_use]
    pub fn state(&self) -> &RotationState {
        &self.state
    }

    /// Closes the active file, archives it and starts a fresh one.
    ///
    /// Pruning failures are ignored; only failing to reopen the active file
    /// is reported.
    pub fn rotate(&mut self) -> io::Result<()> {
        self.file = None;
        self.open_new()?;
        let _ = self.prune();
        Ok(())
    }

    /// Applies the retention policy to existing backups.
    ///
    /// Every removal and compression is attempted; the first failure is
    /// returned.
    pub fn prune(&mut self) -> io::Result<()> {
        let backups = self.backups()?;
        let mut first_err: Option<io::Error> = None;
        let mut record = |res: io::Result<()>| {
            if let Err(e) = res {
                first_err.get_or_insert(e);
            }
        };

        let mut preserved: HashSet<String> = HashSet::new();
        let mut kept: Vec<Backup> = Vec::new();
        for backup in backups {
            let keep = self.policy.max_backups == 0
                || preserved.contains(&backup.base)
                || preserved.len() < self.policy.max_backups;
            if keep {
                preserved.insert(backup.base.clone());
                kept.push(backup);
            } else {
                record(fs::remove_file(&backup.path));
            }
        }

        if let Some(cutoff) = self.age_cutoff() {
            kept.retain(|backup| {
                if backup.stamp < cutoff {
                    record(fs::remove_file(&backup.path));
                    false
                } else {
                    true
                }
            });
        }

        if self.policy.compress {
            for backup in kept.iter().filter(|b| !b.compressed) {
                let mut dst = backup.path.clone().into_os_string();
                dst.push(COMPRESS_SUFFIX);
                record(compress_file(&backup.path, Path::new(&dst)));
            }
        }

        self.state.backups = kept
            .iter()
            .map(|b| b.base.as_str())
            .collect::<HashSet<_>>()
            .len();

        match first_err {
            Some(e) => Err(e),
            None => Ok(()),
        }
    }

    /// Opens the active file for appending if it exists and has room for
    /// `write_len` more bytes; otherwise rotates.
    fn open_existing_or_new(&mut self, write_len: u64) -> io::Result<()> {
        let meta = match fs::metadata(&self.state.path) {
            Ok(meta) => meta,
            Err(e) if e.kind() == io::ErrorKind::NotFound => return self.open_new(),
            Err(e) => return Err(e),
        };
        if meta.len().saturating_add(write_len) >= self.policy.max_size {
            return self.rotate();
        }
        match OpenOptions::new().append(true).open(&self.state.path) {
            Ok(file) => {
                self.file = Some(file);
                self.state.size = meta.len();
                self.state.opened_at = now(self.policy.local_time);
                Ok(())
            }
            // Unreadable leftovers are replaced rather than appended to.
            Err(_) => self.open_new(),
        }
    }

    /// Moves any existing active file to a backup name and creates a new one.
    fn open_new(&mut self) -> io::Result<()> {
        if let Some(dir) = self.state.path.parent().filter(|d| !d.as_os_str().is_empty()) {
            fs::create_dir_all(dir)?;
        }
        if self.state.path.exists() {
            let (backup, stamp) = self.free_backup_name();
            fs::rename(&self.state.path, backup)?;
            self.last_stamp = Some(stamp);
        }
        let file = OpenOptions::new()
            .create(true)
            .write(true)
            .truncate(true)
            .open(&self.state.path)?;
        self.file = Some(file);
        self.state.size = 0;
        self.state.opened_at = now(self.policy.local_time);
        Ok(())
    }

    /// Backup name for the current time. Stamps never go backwards within a
    /// writer and are advanced a millisecond at a time past anything already
    /// on disk, so name order always matches rotation order.
    fn free_backup_name(&self) -> (PathBuf, NaiveDateTime) {
        let mut stamp = now(self.policy.local_time);
        if let Some(last) = self.last_stamp {
            stamp = stamp.max(last + TimeDelta::milliseconds(1));
        }
        loop {
            let candidate = self.backup_name(stamp);
            let mut gz = candidate.clone().into_os_string();
            gz.push(COMPRESS_SUFFIX);
            if !candidate.exists() && !Path::new(&gz).exists() {
                return (candidate, stamp);
            }
            stamp += TimeDelta::milliseconds(1);
        }
    }

    fn backup_name(&self, stamp: NaiveDateTime) -> PathBuf {
        let (stem, ext) = self.stem_and_ext();
        let name = format!("{stem}-{}{ext}", stamp.format(BACKUP_TIME_FORMAT));
        self.dir().join(name)
    }

    fn dir(&self) -> PathBuf {
        self.state
            .path
            .parent()
            .filter(|d| !d.as_os_str().is_empty())
            .map_or_else(|| PathBuf::from("."), Path::to_path_buf)
    }

    fn stem_and_ext(&self) -> (String, String) {
        let stem = self
            .state
            .path
            .file_stem()
            .map(|s| s.to_string_lossy().into_owned())
            .unwrap_or_default();
        let ext = self
            .state
            .path
            .extension()
            .map(|e| format!(".{}", e.to_string_lossy()))
            .unwrap_or_default();
        (stem, ext)
    }

    /// Backups of this file, newest first.
    fn backups(&self) -> io::Result<Vec<Backup>> {
        let (stem, ext) = self.stem_and_ext();
        let prefix = format!("{stem}-");
        let mut out = Vec::new();

        for entry in fs::read_dir(self.dir())? {
            let entry = entry?;
            if !entry.file_type()?.is_file() {
                continue;
            }
            let name = entry.file_name().to_string_lossy().into_owned();
            let (base, compressed) = match name.strip_suffix(COMPRESS_SUFFIX) {
                Some(base) => (base.to_owned(), true),
                None => (name.clone(), false),
            };
            let Some(stamp) = base
                .strip_prefix(&prefix)
                .and_then(|rest| rest.strip_suffix(&ext))
                .and_then(|ts| NaiveDateTime::parse_from_str(ts, BACKUP_TIME_FORMAT).ok())
            else {
                continue;
            };
            out.push(Backup {
                path: entry.path(),
                base,
                stamp,
                compressed,
            });
        }

        out.sort_by(|a, b| b.stamp.cmp(&a.stamp));
        Ok(out)
    }

    /// Backups stamped before this instant are expired.
    fn age_cutoff(&self) -> Option<NaiveDateTime> {
        let delta = max_age_delta(self.policy.max_age)?;
        now(self.policy.local_time).checked_sub_signed(delta)
    }

    fn age_exceeded(&self) -> bool {
        max_age_delta(self.policy.max_age)
            .and_then(|delta| self.state.opened_at.checked_add_signed(delta))
            .is_some_and(|deadline| now(self.policy.local_time) >= deadline)
    }
}

impl Write for RotatingFileWriter {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        let len = buf.len() as u64;
        if len > self.policy.max_size {
            return Err(io::Error::other(LogError::WriteTooLarge {
                len,
                max: self.policy.max_size,
            }));
        }

        if self.file.is_none() {
            self.open_existing_or_new(len)?;
        }
        if self.state.size.saturating_add(len) > self.policy.max_size || self.age_exceeded() {
            self.rotate()?;
        }

        let file = match self.file.as_mut() {
            Some(file) => file,
            None => return Err(io::Error::other("log file is not open")),
        };
        // A record is never split across a rotation boundary.
        file.write_all(buf)?;
        self.state.size += len;
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        match self.file.as_mut() {
            Some(file) => file.flush(),
            None => Ok(()),
        }
    }
}

fn now(local_time: bool) -> NaiveDateTime {
    if local_time {
        Local::now().naive_local()
    } else {
        Utc::now().naive_utc()
    }
}

/// `None` when age limits are disabled or out of range.
fn max_age_delta(max_age: Duration) -> Option<TimeDelta> {
    if max_age.is_zero() {
        return None;
    }
    TimeDelta::from_std(max_age).ok()
}

fn compress_file(src: &Path, dst: &Path) -> io::Result<()> {
    let mut input = File::open(src)?;
    let output = File::create(dst)?;
    let mut encoder = GzEncoder::new(output, Compression::default());
    io::copy(&mut input, &mut encoder)?;
    encoder.finish()?.sync_all()?;
    fs::remove_file(src)
}
