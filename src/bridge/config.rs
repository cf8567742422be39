/// Configuration for a [`Bridge`](super::Bridge) and its worker thread.
#[derive(Clone, Debug)]
#[non_exhaustive]
pub struct BridgeConfig {
    /// Maximum number of jobs waiting in the queue. `None` means the queue is
    /// unbounded, which is the default. When the queue is full, async callers
    /// stay suspended until the worker frees a slot, and [`Bridge::detach`]
    /// blocks the calling thread. Jobs are never discarded.
    ///
    /// A capacity of `0` is treated as `1`.
    ///
    /// [`Bridge::detach`]: super::Bridge::detach
    pub(crate) queue_capacity: Option<usize>,
    /// Name given to the worker thread. Defaults to `asyncfile-worker`.
    pub(crate) thread_name: String,
    /// Stack size for the worker thread, in bytes. Uses the platform default
    /// when unset.
    pub(crate) stack_size: Option<usize>,
    /// Pins the worker thread to the given core id, if set.
    pub(crate) core: Option<usize>,
}

impl BridgeConfig {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn queue_capacity(mut self, capacity: Option<usize>) -> Self {
        self.queue_capacity = capacity;
        self
    }

    #[must_use]
    pub fn thread_name(mut self, name: impl Into<String>) -> Self {
        self.thread_name = name.into();
        self
    }

    #[must_use]
    pub fn stack_size(mut self, size: usize) -> Self {
        self.stack_size = Some(size);
        self
    }

    #[must_use]
    pub fn core(mut self, core: usize) -> Self {
        self.core = Some(core);
        self
    }
}

impl Default for BridgeConfig {
    fn default() -> Self {
        BridgeConfig {
            queue_capacity: None,
            thread_name: String::from("asyncfile-worker"),
            stack_size: None,
            core: None,
        }
    }
}
