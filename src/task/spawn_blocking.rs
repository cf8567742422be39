use crate::bridge::{self, Pending};
use crate::runtime::current_unwrap;

/// Runs the provided closure on the blocking worker thread.
///
/// In general, issuing a blocking call or performing a lot of compute in a
/// future without yielding is problematic, as it may prevent the runtime from
/// driving other futures forward. This function hands the closure to the
/// process-wide [`Bridge`](crate::Bridge), which runs it on its dedicated
/// worker thread and resumes the awaiting task on the current runtime once
/// it is done.
///
/// Calls are run one at a time, in submission order. The first call starts
/// the worker using the bridge configuration of the current runtime's
/// [`Config`](crate::runtime::Config).
///
/// Closures cannot be interrupted once the worker has started running them.
/// Dropping the returned [`Pending`] before that point cancels the call.
///
/// # Examples
///
/// Pass an input value and receive result of computation:
///
/// ```
/// use asyncfile::task;
///
/// # asyncfile::block_on(async {
/// // Initial input
/// let mut v = "Hello, ".to_string();
/// let res = task::spawn_blocking(move || {
///     // Stand-in for compute-heavy work or using synchronous APIs
///     v.push_str("world");
///     // Pass ownership of the value back to the asynchronous context
///     v
/// }).await;
///
/// assert_eq!(res.unwrap(), "Hello, world");
/// # });
/// ```
///
/// # Panics
/// Panics if called from the outside of a runtime context, or if the worker
/// thread could not be spawned.
#[track_caller]
pub fn spawn_blocking<F, T>(f: F) -> Pending<T>
where
    F: FnOnce() -> T + Send + 'static,
    T: Send + 'static,
{
    let rt = current_unwrap("spawn_blocking");
    bridge::global_or_init(|| rt.config.bridge.clone()).submit(f, rt.handle())
}
