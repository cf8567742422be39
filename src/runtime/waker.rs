use std::sync::Arc;
use std::task::{Wake, Waker};

use super::Handle;

/// Wakers post the task id back to the owning runtime, so they can be woken
/// from any thread.
struct TaskWaker {
    id: u64,
    handle: Handle,
}

impl Wake for TaskWaker {
    fn wake(self: Arc<Self>) {
        self.wake_by_ref();
    }

    fn wake_by_ref(self: &Arc<Self>) {
        self.handle.wake(self.id);
    }
}

pub(crate) fn waker(id: u64, handle: &Handle) -> Waker {
    let handle = handle.clone();
    Waker::from(Arc::new(TaskWaker { id, handle }))
}
