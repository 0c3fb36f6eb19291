use std::{
    fmt,
    io::{self, Write},
    sync::{Mutex, PoisonError},
};

use crate::log::log_error::MultiWriteError;

/// A named writer guarded by its own lock.
///
/// Each record is written with a single `write_all` under the lock, so
/// concurrent records never interleave within one destination.
pub struct Destination {
    name: String,
    writer: Mutex<Box<dyn Write + Send>>,
}

impl Destination {
    pub fn new(name: impl Into<String>, writer: impl Write + Send + 'static) -> Self {
        Self {
            name: name.into(),
            writer: Mutex::new(Box::new(writer)),
        }
    }

    /// Standard output.
    #[must_use]
    pub fn stdout() -> Self {
        Self::new("stdout", io::stdout())
    }

    /// Standard error.
    #[must_use]
    pub fn stderr() -> Self {
        Self::new("stderr", io::stderr())
    }

    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// A poisoned lock is taken over: the panicking writer finished or
    /// abandoned its record, and later records must still get through.
    pub fn write_all(&self, buf: &[u8]) -> io::Result<()> {
        let mut w = self.writer.lock().unwrap_or_else(PoisonError::into_inner);
        w.write_all(buf)
    }

    pub fn flush(&self) -> io::Result<()> {
        let mut w = self.writer.lock().unwrap_or_else(PoisonError::into_inner);
        w.flush()
    }
}

impl fmt::Debug for Destination {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Destination").field("name", &self.name).finish()
    }
}

/// Replicates every write to all of its destinations.
///
/// A failing destination neither stops the others nor is retried; the
/// failure is reported once in the returned [`MultiWriteError`].
#[derive(Debug, Default)]
pub struct MultiWriter {
    destinations: Vec<Destination>,
}

impl MultiWriter {
    #[must_use]
    pub fn new(destinations: Vec<Destination>) -> Self {
        Self { destinations }
    }

    pub fn push(&mut self, destination: Destination) {
        self.destinations.push(destination);
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.destinations.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.destinations.is_empty()
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.destinations.iter().map(Destination::name)
    }

    /// Writes `buf` to every destination and returns its length when all succeed.
    pub fn write(&self, buf: &[u8]) -> Result<usize, MultiWriteError> {
        self.for_each(|d| d.write_all(buf))?;
        Ok(buf.len())
    }

    /// Flushes every destination.
    pub fn flush(&self) -> Result<(), MultiWriteError> {
        self.for_each(Destination::flush)
    }

    fn for_each(
        &self,
        mut op: impl FnMut(&Destination) -> io::Result<()>,
    ) -> Result<(), MultiWriteError> {
        let failures: Vec<(String, io::Error)> = self
            .destinations
            .iter()
            .filter_map(|d| op(d).err().map(|e| (d.name.clone(), e)))
            .collect();
        if failures.is_empty() {
            Ok(())
        } else {
            Err(MultiWriteError { failures })
        }
    }
}

/// Lets a shared `MultiWriter` be used wherever an `io::Write` is expected.
impl Write for &MultiWriter {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        MultiWriter::write(self, buf).map_err(io::Error::from)
    }

    fn flush(&mut self) -> io::Result<()> {
        MultiWriter::flush(self).map_err(io::Error::from)
    }
}


#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used, clippy::expect_used)]
    use super::test_util::{FailingWriter, SharedBuffer};
    use super::*;

    #[test]
    fn every_destination_receives_the_record() {
        let a = SharedBuffer::default();
        let b = SharedBuffer::default();
        let mw = MultiWriter::new(vec![
            Destination::new("a", a.clone()),
            Destination::new("b", b.clone()),
        ]);

        assert_eq!(mw.write(b"line\n").unwrap(), 5);
        assert_eq!(a.contents(), "line\n");
        assert_eq!(b.contents(), "line\n");
    }

    #[test]
    fn failing_destination_does_not_suppress_the_others() {
        let b = SharedBuffer::default();
        let mw = MultiWriter::new(vec![
            Destination::new("broken", FailingWriter),
            Destination::new("b", b.clone()),
        ]);

        let err = mw.write(b"full record\n").unwrap_err();
        assert_eq!(err.failures.len(), 1);
        assert_eq!(err.failures[0].0, "broken");
        assert!(err.to_string().contains("broken (disk full)"));
        assert_eq!(b.contents(), "full record\n");
    }

    #[test]
    fn usable_as_io_write() {
        let a = SharedBuffer::default();
        let mw = MultiWriter::new(vec![Destination::new("a", a.clone())]);
        let mut w = &mw;
        writeln!(w, "x={}", 1).unwrap();
        assert_eq!(a.contents(), "x=1\n");
        assert_eq!(mw.names().collect::<Vec<_>>(), vec!["a"]);
    }

    #[test]
    fn concurrent_records_do_not_interleave() {
        let a = SharedBuffer::default();
        let mw = MultiWriter::new(vec![Destination::new("a", a.clone())]);
        std::thread::scope(|s| {
            for t in 0..8 {
                let mw = &mw;
                s.spawn(move || {
                    for _ in 0..200 {
                        let line = format!("{}\n", t.to_string().repeat(64));
                        mw.write(line.as_bytes()).unwrap();
                    }
                });
            }
        });
        let out = a.contents();
        assert_eq!(out.lines().count(), 8 * 200);
        for line in out.lines() {
            let first = line.chars().next().unwrap();
            assert!(line.len() == 64 && line.chars().all(|c| c == first), "{line}");
        }
    }
}
