//! Bounded background file closer.
//!
//! Closing an output file can incur a flush cost, and serializing thousands
//! of closes on the extraction thread stalls decompression. The closer
//! accepts freshly written handles and closes them on a small worker pool,
//! so the extraction loop only ever pays the cost of a queue push. The
//! queue is bounded: when closes fall behind, the producer blocks instead
//! of accumulating open descriptors without limit.

use std::fs::File;
use std::io::{self, BufWriter, Write};
use std::sync::Arc;
use std::thread::{self, JoinHandle};

use crossbeam_channel::{bounded, Sender};
use parking_lot::Mutex;

use crate::error::Error;

/// Default bound on handles that are open but not yet closed.
///
/// Windows defaults to 512 open file descriptors per process; 400 leaves
/// headroom for the archive itself, stdio and whatever else the process
/// holds open.
pub const QUEUE_CAPACITY: usize = 400;

/// Number of worker threads draining the queue.
pub const WORKER_COUNT: usize = 4;

/// A handle the closer knows how to close.
///
/// The seam exists so tests can count closes and inject failures; the one
/// production implementation is [`BufWriter<File>`].
pub trait Close: Send + 'static {
    /// Consume the handle, releasing its resources.
    fn close(self) -> io::Result<()>;
}

impl Close for BufWriter<File> {
    fn close(mut self) -> io::Result<()> {
        // Flush surfaces write-back errors; the OS close happens on drop.
        self.flush()
    }
}

/// Closes handles asynchronously on a fixed worker pool.
///
/// Construction starts the pool and the closer is immediately ready to
/// accept handles. [`finish`](Self::finish) (or `Drop`) stops the pool and
/// returns only after every scheduled handle has been closed, so the
/// closer behaves as a scoped resource: nothing outlives it.
///
/// No ordering is guaranteed on *when* a given handle is closed relative
/// to others. That is fine for extraction: all writes complete before a
/// handle is handed off, so content never depends on close order.
///
/// A worker's close failure is parked in a single-slot mailbox and raised
/// on the producer's next [`schedule`](Self::schedule) call or by
/// [`finish`](Self::finish). At most one unobserved failure is retained;
/// a later failure overwrites an earlier one that nobody has read yet.
pub struct BackgroundCloser<C: Close = BufWriter<File>> {
    /// `None` once draining has begun.
    tx: Option<Sender<C>>,
    first_error: Arc<Mutex<Option<io::Error>>>,
    workers: Vec<JoinHandle<()>>,
}

impl<C: Close> BackgroundCloser<C> {
    /// Start a closer with the default queue capacity.
    pub fn new() -> Self {
        Self::with_capacity(QUEUE_CAPACITY)
    }

    /// Start a closer whose queue holds at most `capacity` pending handles.
    pub fn with_capacity(capacity: usize) -> Self {
        let (tx, rx) = bounded::<C>(capacity);
        let first_error = Arc::new(Mutex::new(None));

        let workers = (0..WORKER_COUNT)
            .map(|_| {
                let rx = rx.clone();
                let slot = Arc::clone(&first_error);
                thread::spawn(move || {
                    // Runs until the sender is dropped and the queue is
                    // drained; disconnect is the shutdown signal.
                    for handle in rx.iter() {
                        if let Err(e) = handle.close() {
                            *slot.lock() = Some(e);
                        }
                    }
                })
            })
            .collect();

        Self {
            tx: Some(tx),
            first_error,
            workers,
        }
    }

    /// Hand a fully written handle to the worker pool for closing.
    ///
    /// Blocks while the queue is at capacity; that backpressure is what
    /// bounds the number of open-but-unclosed descriptors.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Close`] if an earlier deferred close failed. The
    /// slot is cleared on read, and the failure may have nothing to do
    /// with the handle passed in here — callers must not attribute it to
    /// the current handle. The current handle is still closed (on this
    /// thread) when that happens.
    ///
    /// Returns [`Error::NotActive`] if draining has already begun.
    pub fn schedule(&self, handle: C) -> Result<(), Error> {
        let Some(tx) = self.tx.as_ref() else {
            return Err(Error::NotActive);
        };

        if let Some(e) = self.first_error.lock().take() {
            // Don't leak the handle while reporting someone else's failure.
            let _ = handle.close();
            return Err(Error::Close(e));
        }

        match tx.send(handle) {
            Ok(()) => Ok(()),
            // Workers already gone (shutdown race): close synchronously on
            // this thread. Slower, but no handle is ever dropped unclosed.
            Err(e) => e.into_inner().close().map_err(Error::Close),
        }
    }

    /// Stop accepting handles and wait for every worker to finish.
    ///
    /// Returns only after the queue has fully drained and all workers have
    /// joined, i.e. every scheduled handle has been closed.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Close`] if a deferred close failure is still
    /// unobserved at this point, including failures from the final drain.
    pub fn finish(mut self) -> Result<(), Error> {
        match self.drain() {
            Some(e) => Err(Error::Close(e)),
            None => Ok(()),
        }
    }

    /// Drop the sender, join all workers, and take any pending error.
    ///
    /// Idempotent so it can back both `finish` and `Drop`.
    fn drain(&mut self) -> Option<io::Error> {
        let tx = self.tx.take()?;
        drop(tx);
        for worker in self.workers.drain(..) {
            // A worker panic would mean a bug in a `Close` impl; joining
            // the rest still matters more than propagating it here.
            let _ = worker.join();
        }
        self.first_error.lock().take()
    }
}

impl<C: Close> Default for BackgroundCloser<C> {
    fn default() -> Self {
        Self::new()
    }
}

impl<C: Close> Drop for BackgroundCloser<C> {
    /// Drains exactly like [`finish`](Self::finish) but has nowhere to
    /// report a failure from the final closes; call `finish` when that
    /// error matters.
    fn drop(&mut self) {
        let _ = self.drain();
    }
}
