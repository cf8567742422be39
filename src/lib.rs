//! Call blocking file APIs from async code without blocking the scheduler.
//!
//! The core of the crate is the [`Bridge`]: a FIFO queue drained by one
//! dedicated worker thread. Async callers submit a blocking closure along
//! with a [`Schedule`] handle for their own scheduler; the worker runs the
//! closure and delivers the outcome back through that handle, so the waiting
//! task is always resumed on its own thread.
//!
//! The crate ships a small single threaded [`runtime`] whose [`Handle`](runtime::Handle)
//! implements [`Schedule`], and an async [`fs`] layer routing every file call
//! through the bridge.
//!
//! ```no_run
//! use asyncfile::fs::File;
//!
//! #[asyncfile::main]
//! async fn main() -> std::io::Result<()> {
//!     let mut file = File::with_mode("notes.txt", "r").await?;
//!     let first = file.read_line().await?;
//!     println!("{first}");
//!     file.close().await
//! }
//! ```
#![warn(clippy::pedantic)]
#![allow(clippy::needless_pass_by_value)]
#![allow(clippy::module_name_repetitions)]

pub mod bridge;
pub mod error;
pub mod fs;
pub mod runtime;
pub mod schedule;
pub mod task;

pub use bridge::Bridge;
pub use error::{Error, ScheduleError};
pub use runtime::block_on;
pub use schedule::{Schedule, SchedulerHandle};
pub use task::{detach, spawn, spawn_blocking};

#[cfg(feature = "macros")]
pub use asyncfile_macros::{main, test};
