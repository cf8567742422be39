//! Async file access built on the blocking bridge.
//!
//! Every operation runs the corresponding [`std::fs`] call on the bridge's
//! worker thread and resumes the calling task once it returns. These
//! functions must be called from inside a runtime context.
pub use file::{File, Lines};
pub use open_options::OpenOptions;
pub use read::{read, read_to_string, remove_file, write};

mod file;
mod open_options;
mod read;
