use asyncfile::bridge::{Bridge, BridgeConfig};
use asyncfile::runtime::{Handle, Runtime};
use asyncfile::{Error, Schedule, ScheduleError};
use futures::future::join_all;
use futures::FutureExt;
use std::collections::{HashSet, VecDeque};
use std::hint::black_box;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{mpsc, Arc, Mutex};
use std::thread;
use std::time::Duration;

fn install() {
    dotenv::dotenv().ok();
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_test_writer()
        .try_init()
        .ok();
}

/// Forwards to a runtime handle, checking every callback runs on the
/// runtime's own thread.
struct OnThread {
    handle: Handle,
    delivered: Arc<AtomicUsize>,
}

impl Schedule for OnThread {
    fn schedule(&self, callback: asyncfile::schedule::Callback) -> Result<(), ScheduleError> {
        let handle = self.handle.clone();
        let delivered = self.delivered.clone();
        self.handle.schedule(Box::new(move || {
            assert!(handle.is_current_thread(), "delivered on a foreign thread");
            delivered.fetch_add(1, Ordering::SeqCst);
            callback();
        }))
    }
}

/// Collects callbacks so the test decides when they run.
#[derive(Default)]
struct Manual {
    callbacks: Mutex<VecDeque<asyncfile::schedule::Callback>>,
}

impl Manual {
    fn len(&self) -> usize {
        self.callbacks.lock().unwrap().len()
    }

    fn run_one(&self) -> bool {
        let callback = self.callbacks.lock().unwrap().pop_front();
        callback.map(|callback| callback()).is_some()
    }
}

impl Schedule for Manual {
    fn schedule(&self, callback: asyncfile::schedule::Callback) -> Result<(), ScheduleError> {
        self.callbacks.lock().unwrap().push_back(callback);
        Ok(())
    }
}

/// Blocks the worker until the returned sender is used or dropped.
fn gate(bridge: &Bridge) -> mpsc::Sender<()> {
    let (open, wait) = mpsc::channel::<()>();
    let (started, running) = mpsc::channel();
    drop(bridge.detach(move || {
        started.send(()).unwrap();
        wait.recv().ok();
    }));
    running.recv().unwrap();
    open
}

#[test]
fn returns_the_value() {
    install();
    let bridge = Bridge::new().unwrap();
    let rt = Runtime::new();
    let value = rt.block_on(bridge.submit(|| 42, rt.handle()));
    assert_eq!(value.unwrap(), 42);
}

#[test]
fn returns_opaque_values_unchanged() {
    install();
    let bridge = Bridge::new().unwrap();
    let rt = Runtime::new();
    let resource = Arc::new(String::from("resource"));
    let sent = resource.clone();
    let received = rt.block_on(bridge.submit(move || sent, rt.handle())).unwrap();
    assert!(Arc::ptr_eq(&resource, &received));
}

#[test]
fn errors_returned_by_the_callable_pass_through() {
    #[derive(Debug, PartialEq)]
    enum MathError {
        DivideByZero,
    }
    fn divide(a: i32, b: i32) -> Result<i32, MathError> {
        a.checked_div(b).ok_or(MathError::DivideByZero)
    }

    install();
    let bridge = Bridge::new().unwrap();
    let rt = Runtime::new();
    let result = rt.block_on(bridge.submit(|| divide(1, 0), rt.handle()));
    assert_eq!(result.unwrap(), divide(1, 0));
    assert_eq!(divide(1, 0), Err(MathError::DivideByZero));
}

#[test]
fn panics_resolve_as_errors() {
    install();
    let bridge = Bridge::new().unwrap();
    let rt = Runtime::new();
    let zero = black_box(0);
    let error = rt
        .block_on(bridge.submit(move || 10 / zero, rt.handle()))
        .unwrap_err();
    assert!(error.is_panic());
    assert!(error.panic_message().unwrap().contains("divide by zero"));

    // the worker survives
    let value = rt.block_on(bridge.submit(|| 1, rt.handle()));
    assert_eq!(value.unwrap(), 1);
}

#[test]
fn resolves_in_submission_order() {
    install();
    let bridge = Bridge::new().unwrap();
    let scheduler = Arc::new(Manual::default());
    let mut pending: Vec<_> = (0..50)
        .map(|i| bridge.submit(move || i, scheduler.clone()))
        .collect();

    while scheduler.len() < pending.len() {
        thread::sleep(Duration::from_millis(1));
    }
    for i in 0..pending.len() {
        assert!((&mut pending[i]).now_or_never().is_none());
        assert!(scheduler.run_one());
        let value = (&mut pending[i]).now_or_never().unwrap().unwrap();
        assert_eq!(value, i);
        if let Some(next) = pending.get_mut(i + 1) {
            assert!(next.now_or_never().is_none());
        }
    }
    assert!(!scheduler.run_one());
}

#[test]
fn delivers_only_to_the_submitting_scheduler() {
    install();
    let bridge = Bridge::new().unwrap();
    let threads: Vec<_> = (0..2)
        .map(|_| {
            let bridge = bridge.clone();
            thread::spawn(move || {
                let rt = Runtime::new();
                let delivered = Arc::new(AtomicUsize::new(0));
                let results = rt.block_on(async {
                    let calls = (0..100).map(|i| {
                        let scheduler = OnThread {
                            handle: rt.handle(),
                            delivered: delivered.clone(),
                        };
                        bridge.submit(move || i * 2, scheduler)
                    });
                    join_all(calls).await
                });
                for (i, result) in results.into_iter().enumerate() {
                    assert_eq!(result.unwrap(), i * 2);
                }
                delivered.load(Ordering::SeqCst)
            })
        })
        .collect();
    for thread in threads {
        assert_eq!(thread.join().unwrap(), 100);
    }
}

#[test]
fn every_call_resolves_exactly_once() {
    install();
    let bridge = Bridge::new().unwrap();
    let executed = Arc::new(Mutex::new(HashSet::new()));
    thread::scope(|s| {
        for caller in 0..10 {
            let bridge = bridge.clone();
            let executed = executed.clone();
            s.spawn(move || {
                let rt = Runtime::new();
                let delivered = Arc::new(AtomicUsize::new(0));
                let calls = (0..100).map(|i| {
                    let executed = executed.clone();
                    let slow = fastrand::u8(..4) == 0;
                    let scheduler = OnThread {
                        handle: rt.handle(),
                        delivered: delivered.clone(),
                    };
                    bridge.submit(
                        move || {
                            if slow {
                                thread::sleep(Duration::from_micros(200));
                            }
                            assert!(executed.lock().unwrap().insert((caller, i)));
                            (caller, i)
                        },
                        scheduler,
                    )
                });
                let calls: Vec<_> = calls.collect();
                let results = rt.block_on(join_all(calls));
                for (i, result) in results.into_iter().enumerate() {
                    assert_eq!(result.unwrap(), (caller, i));
                }
                assert_eq!(delivered.load(Ordering::SeqCst), 100);
            });
        }
    });
    assert_eq!(executed.lock().unwrap().len(), 1000);
}

#[test]
fn detached_calls_all_complete() {
    install();
    let bridge = Bridge::new().unwrap();
    let seen = Arc::new(Mutex::new(HashSet::new()));
    let count = Arc::new(AtomicUsize::new(0));
    thread::scope(|s| {
        for caller in 0..10 {
            let bridge = bridge.clone();
            let seen = seen.clone();
            let count = count.clone();
            s.spawn(move || {
                let done: Vec<_> = (0..100)
                    .map(|i| {
                        let seen = seen.clone();
                        let count = count.clone();
                        bridge.detach(move || {
                            assert!(seen.lock().unwrap().insert((caller, i)));
                            count.fetch_add(1, Ordering::SeqCst);
                        })
                    })
                    .collect();
                for done in done {
                    done.wait().unwrap();
                }
            });
        }
    });
    assert_eq!(count.load(Ordering::SeqCst), 1000);
    assert_eq!(seen.lock().unwrap().len(), 1000);
}

#[test]
fn done_reports_progress() {
    install();
    let bridge = Bridge::new().unwrap();
    let open = gate(&bridge);
    let mut done = bridge.detach(|| {});
    assert!(!done.is_done());
    assert!(!done.wait_timeout(Duration::from_millis(10)));
    drop(open);
    assert!(done.wait_timeout(Duration::from_secs(5)));
    assert!(done.is_done());
    done.wait().unwrap();

    let done = bridge.detach(|| panic!("detached boom"));
    assert_eq!(done.wait().unwrap_err().panic_message(), Some("detached boom"));
}

#[test]
fn submissions_after_shutdown_fail_immediately() {
    install();
    let bridge = Bridge::new().unwrap();
    let rt = Runtime::new();
    bridge.shutdown();
    assert!(bridge.is_shutdown());
    let result = rt.block_on(bridge.submit(|| 1, rt.handle()));
    assert!(matches!(result, Err(Error::ShutdownInProgress)));
    let done = bridge.detach(|| {});
    assert!(done.wait().unwrap_err().is_shutdown());
    // idempotent
    bridge.shutdown();
}

#[test]
fn shutdown_drains_queued_calls() {
    install();
    let bridge = Bridge::new().unwrap();
    let count = Arc::new(AtomicUsize::new(0));
    let open = gate(&bridge);
    for _ in 0..10 {
        let count = count.clone();
        drop(bridge.detach(move || {
            count.fetch_add(1, Ordering::SeqCst);
        }));
    }
    assert_eq!(bridge.queued(), 10);
    let opener = thread::spawn(move || {
        thread::sleep(Duration::from_millis(20));
        drop(open);
    });
    bridge.shutdown();
    opener.join().unwrap();
    assert_eq!(count.load(Ordering::SeqCst), 10);
}

#[test]
fn shutdown_from_inside_a_blocking_call() {
    install();
    let bridge = Bridge::new().unwrap();
    let rt = Runtime::new();
    let inner = bridge.clone();
    let on_worker = rt.block_on(bridge.submit(
        move || {
            inner.shutdown();
            inner.is_worker_thread()
        },
        rt.handle(),
    ));
    assert!(on_worker.unwrap());
    assert!(bridge.is_shutdown());
    // joins the worker, which exits once the queue is drained
    bridge.shutdown();
    let result = rt.block_on(bridge.submit(|| 1, rt.handle()));
    assert!(matches!(result, Err(Error::ShutdownInProgress)));
}

#[test]
fn cancel_before_the_worker_starts() {
    install();
    let bridge = Bridge::new().unwrap();
    let rt = Runtime::new();
    let ran = Arc::new(AtomicBool::new(false));
    let open = gate(&bridge);

    let flag = ran.clone();
    let mut pending = bridge.submit(move || flag.store(true, Ordering::SeqCst), rt.handle());
    assert!(pending.cancel());
    assert!(!pending.cancel());
    drop(open);

    let result = rt.block_on(pending);
    assert!(matches!(result, Err(Error::Cancelled)));
    bridge.detach(|| {}).wait().unwrap();
    assert!(!ran.load(Ordering::SeqCst));
}

#[test]
fn dropping_a_queued_call_cancels_it() {
    install();
    let bridge = Bridge::new().unwrap();
    let rt = Runtime::new();
    let ran = Arc::new(AtomicBool::new(false));
    let open = gate(&bridge);

    let flag = ran.clone();
    drop(bridge.submit(move || flag.store(true, Ordering::SeqCst), rt.handle()));
    drop(open);

    bridge.detach(|| {}).wait().unwrap();
    assert!(!ran.load(Ordering::SeqCst));
}

#[test]
fn cancel_after_start_is_a_no_op() {
    install();
    let bridge = Bridge::new().unwrap();
    let rt = Runtime::new();
    let (started, running) = mpsc::channel();
    let (open, wait) = mpsc::channel::<()>();

    let mut pending = bridge.submit(
        move || {
            started.send(()).unwrap();
            wait.recv().ok();
            7
        },
        rt.handle(),
    );
    running.recv().unwrap();
    assert!(!pending.cancel());
    drop(open);
    assert_eq!(rt.block_on(pending).unwrap(), 7);
}

#[test]
fn full_queue_applies_backpressure() {
    install();
    let config = BridgeConfig::new().queue_capacity(Some(1));
    let bridge = Bridge::with_config(config).unwrap();
    let rt = Runtime::new();
    let open = gate(&bridge);

    let first = bridge.submit(|| 1, rt.handle());
    let second = bridge.submit(|| 2, rt.handle());
    assert!(!first.is_held());
    assert!(second.is_held());

    let opener = thread::spawn(move || {
        thread::sleep(Duration::from_millis(20));
        drop(open);
    });
    let (first, second) = rt.block_on(async { (first.await, second.await) });
    opener.join().unwrap();
    assert_eq!(first.unwrap(), 1);
    assert_eq!(second.unwrap(), 2);
}

#[test]
fn zero_capacity_queues_still_resolve() {
    install();
    let config = BridgeConfig::new().queue_capacity(Some(0));
    let bridge = Bridge::with_config(config).unwrap();
    drop(bridge.detach(|| thread::sleep(Duration::from_millis(50))));

    let (tx, rx) = mpsc::channel();
    let caller = {
        let bridge = bridge.clone();
        thread::spawn(move || {
            let rt = Runtime::new();
            tx.send(rt.block_on(bridge.submit(|| 2, rt.handle()))).unwrap();
        })
    };
    let value = rx
        .recv_timeout(Duration::from_secs(5))
        .expect("the held call never resolved");
    caller.join().unwrap();
    assert_eq!(value.unwrap(), 2);
}

#[test]
fn held_calls_fail_when_the_bridge_shuts_down() {
    install();
    let config = BridgeConfig::new().queue_capacity(Some(1));
    let bridge = Bridge::with_config(config).unwrap();
    let rt = Runtime::new();
    let open = gate(&bridge);

    let first = bridge.submit(|| 1, rt.handle());
    let second = bridge.submit(|| 2, rt.handle());
    assert!(second.is_held());

    let closer = {
        let bridge = bridge.clone();
        thread::spawn(move || bridge.shutdown())
    };
    // the first call was queued before the shutdown and still runs
    while !bridge.is_shutdown() {
        thread::sleep(Duration::from_millis(1));
    }
    drop(open);
    let (first, second) = rt.block_on(async { (first.await, second.await) });
    closer.join().unwrap();
    assert_eq!(first.unwrap(), 1);
    assert!(second.unwrap_err().is_shutdown());
}

#[test]
fn expired_handles_do_not_kill_the_worker() {
    install();
    let bridge = Bridge::new().unwrap();
    let open = gate(&bridge);

    let stale = Runtime::new();
    let handle = stale.handle();
    drop(stale);
    assert_eq!(
        handle.call_soon_threadsafe(|| {}),
        Err(ScheduleError::HandleExpired)
    );

    let orphan = bridge.submit(|| 1, handle);
    drop(open);
    bridge.detach(|| {}).wait().unwrap();
    drop(orphan);

    let rt = Runtime::new();
    assert_eq!(rt.block_on(bridge.submit(|| 2, rt.handle())).unwrap(), 2);
}

#[test]
fn independent_bridges_use_independent_workers() {
    install();
    let a = Bridge::with_config(BridgeConfig::new().thread_name("worker-a")).unwrap();
    let b = Bridge::with_config(BridgeConfig::new().thread_name("worker-b")).unwrap();
    let rt = Runtime::new();
    let name = || thread::current().name().map(String::from);
    let (on_a, on_b) = rt.block_on(async {
        (
            a.submit(name, rt.handle()).await.unwrap(),
            b.submit(name, rt.handle()).await.unwrap(),
        )
    });
    assert_eq!(on_a.as_deref(), Some("worker-a"));
    assert_eq!(on_b.as_deref(), Some("worker-b"));

    let a2 = a.clone();
    let inside = rt.block_on(a.submit(move || a2.is_worker_thread(), rt.handle()));
    assert!(inside.unwrap());
    assert!(!a.is_worker_thread());
}
