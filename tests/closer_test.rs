//! Background closer behavior tests.
//!
//! Uses an instrumented `Close` implementation to count closes, stall
//! workers, and inject failures.

use std::io;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::thread;
use std::time::Duration;

use crossbeam_channel::{Receiver, Sender};
use unzipr::{BackgroundCloser, Close, Error, WORKER_COUNT};

/// Close counter plus optional stall gate and failure injection.
struct TestHandle {
    closed: Arc<AtomicUsize>,
    /// When present, `close` blocks until the matching sender is dropped.
    gate: Option<Receiver<()>>,
    fail: bool,
}

impl TestHandle {
    fn ok(closed: &Arc<AtomicUsize>) -> Self {
        Self {
            closed: Arc::clone(closed),
            gate: None,
            fail: false,
        }
    }

    fn failing(closed: &Arc<AtomicUsize>) -> Self {
        Self {
            closed: Arc::clone(closed),
            gate: None,
            fail: true,
        }
    }

    fn gated(closed: &Arc<AtomicUsize>, gate: &Receiver<()>) -> Self {
        Self {
            closed: Arc::clone(closed),
            gate: Some(gate.clone()),
            fail: false,
        }
    }
}

impl Close for TestHandle {
    fn close(self) -> io::Result<()> {
        if let Some(gate) = &self.gate {
            // Blocks until the test drops the sender.
            let _ = gate.recv();
        }
        self.closed.fetch_add(1, Ordering::SeqCst);
        if self.fail {
            Err(io::Error::new(io::ErrorKind::Other, "injected close failure"))
        } else {
            Ok(())
        }
    }
}

#[test]
fn finish_waits_for_every_scheduled_handle() {
    let closed = Arc::new(AtomicUsize::new(0));
    let closer: BackgroundCloser<TestHandle> = BackgroundCloser::new();

    for _ in 0..100 {
        closer.schedule(TestHandle::ok(&closed)).unwrap();
    }
    closer.finish().unwrap();

    // finish returns only after the queue is fully drained.
    assert_eq!(closed.load(Ordering::SeqCst), 100);
}

#[test]
fn full_queue_blocks_the_producer() {
    const CAPACITY: usize = 8;
    const TOTAL: usize = 100;

    let closed = Arc::new(AtomicUsize::new(0));
    let accepted = Arc::new(AtomicUsize::new(0));
    let (gate_tx, gate_rx): (Sender<()>, Receiver<()>) = crossbeam_channel::unbounded();

    let closer: BackgroundCloser<TestHandle> = BackgroundCloser::with_capacity(CAPACITY);

    let producer = {
        let closed = Arc::clone(&closed);
        let accepted = Arc::clone(&accepted);
        let gate_rx = gate_rx.clone();
        thread::spawn(move || {
            for _ in 0..TOTAL {
                closer.schedule(TestHandle::gated(&closed, &gate_rx)).unwrap();
                accepted.fetch_add(1, Ordering::SeqCst);
            }
            closer.finish().unwrap();
        })
    };

    // With all workers stalled in close, the producer can get at most the
    // queue capacity plus one in-flight handle per worker past schedule.
    thread::sleep(Duration::from_millis(300));
    let in_flight = accepted.load(Ordering::SeqCst);
    assert!(
        in_flight <= CAPACITY + WORKER_COUNT,
        "producer ran ahead of the bound: {} accepted",
        in_flight
    );
    assert!(
        in_flight >= CAPACITY,
        "queue never filled: {} accepted",
        in_flight
    );

    // Open the gate; everything drains and the producer completes.
    drop(gate_tx);
    drop(gate_rx);
    producer.join().unwrap();
    assert_eq!(closed.load(Ordering::SeqCst), TOTAL);
}

#[test]
fn close_failure_surfaces_on_a_later_schedule() {
    let closed = Arc::new(AtomicUsize::new(0));
    let closer: BackgroundCloser<TestHandle> = BackgroundCloser::new();

    closer.schedule(TestHandle::failing(&closed)).unwrap();

    // The failure lands in the error slot asynchronously; keep scheduling
    // until it is surfaced. The error belongs to the earlier handle, not
    // the one being scheduled.
    let mut observed = None;
    for _ in 0..500 {
        match closer.schedule(TestHandle::ok(&closed)) {
            Err(e) => {
                observed = Some(e);
                break;
            }
            Ok(()) => thread::sleep(Duration::from_millis(2)),
        }
    }

    match observed {
        Some(Error::Close(e)) => {
            assert_eq!(e.to_string(), "injected close failure");
        }
        other => panic!("expected Close error, got {:?}", other),
    }

    // The slot is take-and-clear: once observed, later schedules succeed
    // and finish has nothing left to report.
    closer.schedule(TestHandle::ok(&closed)).unwrap();
    closer.finish().unwrap();
}

#[test]
fn handle_is_still_closed_when_schedule_reports_an_old_failure() {
    let closed = Arc::new(AtomicUsize::new(0));
    let closer: BackgroundCloser<TestHandle> = BackgroundCloser::new();

    closer.schedule(TestHandle::failing(&closed)).unwrap();

    let mut scheduled = 1usize;
    let mut surfaced = false;
    for _ in 0..1000 {
        match closer.schedule(TestHandle::ok(&closed)) {
            Err(_) => {
                surfaced = true;
                break;
            }
            Ok(()) => {
                scheduled += 1;
                thread::sleep(Duration::from_millis(2));
            }
        }
    }
    assert!(surfaced, "close failure never surfaced");
    // The handle passed to the failing schedule call was closed on the
    // caller's thread rather than leaked.
    let _ = closer.finish();
    assert_eq!(closed.load(Ordering::SeqCst), scheduled + 1);
}

#[test]
fn drain_time_failure_is_returned_by_finish() {
    let closed = Arc::new(AtomicUsize::new(0));
    let closer: BackgroundCloser<TestHandle> = BackgroundCloser::new();

    closer.schedule(TestHandle::failing(&closed)).unwrap();

    // No further schedule call: the failure must come out of finish.
    match closer.finish() {
        Err(Error::Close(e)) => {
            assert_eq!(e.to_string(), "injected close failure");
        }
        other => panic!("expected Close error from finish, got {:?}", other),
    }
    assert_eq!(closed.load(Ordering::SeqCst), 1);
}

#[test]
fn drop_drains_without_reporting() {
    let closed = Arc::new(AtomicUsize::new(0));
    {
        let closer: BackgroundCloser<TestHandle> = BackgroundCloser::new();
        for _ in 0..20 {
            closer.schedule(TestHandle::ok(&closed)).unwrap();
        }
        // Dropped without finish, e.g. while unwinding from an earlier
        // extraction error.
    }
    assert_eq!(closed.load(Ordering::SeqCst), 20);
}
