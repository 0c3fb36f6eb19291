pub mod atomic_level;
pub mod encoder;
pub mod facade;
pub mod field;
pub mod log_error;
pub mod log_level;
pub mod log_macros;
pub mod log_msg;
pub mod logger;
pub mod logger_handle;
pub mod multi_writer;
pub mod printf;
pub mod rotating_file;

pub use atomic_level::AtomicLevel;
pub use encoder::{ConsoleEncoder, PresentationMode};
pub use facade::install_facade;
pub use field::{Field, FieldValue};
pub use log_error::{LogError, MultiWriteError};
pub use log_level::LogLevel;
pub use log_msg::{CallSite, LogMsg};
pub use logger::{Logger, LoggerBuilder, new_sink};
pub use multi_writer::{Destination, MultiWriter};
pub use rotating_file::{RotatingFileWriter, RotationPolicy};
