use std::{fmt, io};

use thiserror::Error;

/// Errors surfaced by configuration, construction and writers.
///
/// Logging calls themselves never return these; they are swallowed inside
/// [`Logger`](crate::log::logger::Logger).
#[derive(Debug, Error)]
pub enum LogError {
    #[error("logger has not been initialized")]
    NotInitialized,
    #[error("logger has already been initialized")]
    AlreadyInitialized,
    #[error("a `log` crate backend is already installed")]
    FacadeInstalled,
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),
    #[error("write length {len} exceeds maximum file size {max}")]
    WriteTooLarge { len: u64, max: u64 },
    #[error(transparent)]
    MultiWrite(#[from] MultiWriteError),
    #[error("config parse error: {0}")]
    ConfigParse(#[from] toml::de::Error),
    #[error("invalid config: {0}")]
    InvalidConfig(String),
}

/// One or more destinations of a [`MultiWriter`] failed.
///
/// [`MultiWriter`]: crate::log::multi_writer::MultiWriter
#[derive(Debug)]
pub struct MultiWriteError {
    pub failures: Vec<(String, io::Error)>,
}

impl fmt::Display for MultiWriteError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "write failed on ")?;
        for (i, (name, err)) in self.failures.iter().enumerate() {
            if i > 0 {
                write!(f, ", ")?;
            }
            write!(f, "{name} ({err})")?;
        }
        Ok(())
    }
}

impl std::error::Error for MultiWriteError {}

impl From<MultiWriteError> for io::Error {
    fn from(err: MultiWriteError) -> Self {
        io::Error::other(err)
    }
}
