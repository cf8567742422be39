use std::future::poll_fn;
use std::task::Poll;

/// Yields execution back to the runtime, letting other woken tasks and
/// pending callbacks run before the current task is polled again.
pub async fn yield_now() {
    let mut yielded = false;
    poll_fn(|cx| {
        if yielded {
            return Poll::Ready(());
        }
        yielded = true;
        cx.waker().wake_by_ref();
        Poll::Pending
    })
    .await;
}
