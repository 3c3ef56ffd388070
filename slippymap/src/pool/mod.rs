//! Fixed-size background worker pool.
//!
//! A set of worker threads drains a single shared FIFO queue. [`WorkerPool::submit`]
//! never blocks the caller; the render thread hands off download tasks and
//! moves on. Shutdown is a graceful drain: no more work is accepted, queued
//! and in-flight tasks run to completion, then the workers are joined.
//!
//! The queue is not priority-ordered; tiles may complete in any order and
//! the render loop tolerates any subset of its visible tiles still being
//! placeholders on a given frame.

use std::collections::VecDeque;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread::JoinHandle;

use parking_lot::{Condvar, Mutex};
use tracing::{debug, warn};

/// Default number of background download workers.
pub const DEFAULT_WORKERS: usize = 5;

struct PoolShared<T> {
    queue: Mutex<VecDeque<T>>,
    available: Condvar,
    shutdown: AtomicBool,
}

/// Fixed set of worker threads running one handler over queued tasks.
pub struct WorkerPool<T: Send + 'static> {
    shared: Arc<PoolShared<T>>,
    workers: Mutex<Vec<JoinHandle<()>>>,
}

impl<T: Send + 'static> WorkerPool<T> {
    /// Starts `workers` threads, each invoking `handler` on tasks popped
    /// from the shared queue.
    pub fn new<F>(workers: usize, handler: F) -> Self
    where
        F: Fn(T) + Send + Sync + 'static,
    {
        let shared = Arc::new(PoolShared {
            queue: Mutex::new(VecDeque::new()),
            available: Condvar::new(),
            shutdown: AtomicBool::new(false),
        });
        let handler = Arc::new(handler);

        let handles = (0..workers.max(1))
            .map(|n| {
                let shared = shared.clone();
                let handler = handler.clone();
                std::thread::Builder::new()
                    .name(format!("tile-worker-{n}"))
                    .spawn(move || worker_loop(shared, handler))
                    .expect("failed to spawn worker thread")
            })
            .collect();

        Self {
            shared,
            workers: Mutex::new(handles),
        }
    }

    /// Enqueues a task without blocking.
    ///
    /// Tasks submitted after shutdown began are dropped with a warning.
    pub fn submit(&self, task: T) {
        if self.shared.shutdown.load(Ordering::Acquire) {
            warn!("task submitted after shutdown, dropping");
            return;
        }
        self.shared.queue.lock().push_back(task);
        self.shared.available.notify_one();
    }

    /// Number of tasks waiting in the queue (not counting in-flight work).
    pub fn queue_len(&self) -> usize {
        self.shared.queue.lock().len()
    }

    /// Signals no-more-work, drains the queue and joins all workers.
    ///
    /// Idempotent; also invoked by `Drop`.
    pub fn shutdown(&self) {
        self.shared.shutdown.store(true, Ordering::Release);
        self.shared.available.notify_all();
        let handles: Vec<_> = self.workers.lock().drain(..).collect();
        for handle in handles {
            if handle.join().is_err() {
                warn!("worker thread panicked during shutdown");
            }
        }
    }
}

impl<T: Send + 'static> Drop for WorkerPool<T> {
    fn drop(&mut self) {
        self.shutdown();
    }
}

fn worker_loop<T, F>(shared: Arc<PoolShared<T>>, handler: Arc<F>)
where
    F: Fn(T),
{
    debug!("worker started");
    loop {
        let task = {
            let mut queue = shared.queue.lock();
            loop {
                if let Some(task) = queue.pop_front() {
                    break task;
                }
                if shared.shutdown.load(Ordering::Acquire) {
                    debug!("worker draining complete, exiting");
                    return;
                }
                shared.available.wait(&mut queue);
            }
        };
        handler(task);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::AtomicUsize;
    use std::time::Duration;

    #[test]
    fn test_all_submitted_tasks_run() {
        let counter = Arc::new(AtomicUsize::new(0));
        let seen = counter.clone();
        let pool = WorkerPool::new(3, move |n: usize| {
            seen.fetch_add(n, Ordering::SeqCst);
        });

        for i in 1..=10 {
            pool.submit(i);
        }
        pool.shutdown();

        assert_eq!(counter.load(Ordering::SeqCst), 55);
    }

    #[test]
    fn test_shutdown_drains_queue() {
        let counter = Arc::new(AtomicUsize::new(0));
        let seen = counter.clone();
        // Single slow worker so tasks pile up in the queue.
        let pool = WorkerPool::new(1, move |_: u32| {
            std::thread::sleep(Duration::from_millis(5));
            seen.fetch_add(1, Ordering::SeqCst);
        });

        for i in 0..20 {
            pool.submit(i);
        }
        pool.shutdown();

        assert_eq!(counter.load(Ordering::SeqCst), 20);
    }

    #[test]
    fn test_submit_after_shutdown_is_dropped() {
        let counter = Arc::new(AtomicUsize::new(0));
        let seen = counter.clone();
        let pool = WorkerPool::new(2, move |_: u32| {
            seen.fetch_add(1, Ordering::SeqCst);
        });

        pool.submit(1);
        pool.shutdown();
        pool.submit(2);

        assert_eq!(counter.load(Ordering::SeqCst), 1);
        assert_eq!(pool.queue_len(), 0);
    }

    #[test]
    fn test_shutdown_is_idempotent() {
        let pool = WorkerPool::new(2, |_: u32| {});
        pool.shutdown();
        pool.shutdown();
    }

    #[test]
    fn test_tasks_fifo_with_single_worker() {
        let order = Arc::new(Mutex::new(Vec::new()));
        let seen = order.clone();
        let pool = WorkerPool::new(1, move |n: u32| {
            seen.lock().push(n);
        });

        for i in 0..5 {
            pool.submit(i);
        }
        pool.shutdown();

        assert_eq!(*order.lock(), vec![0, 1, 2, 3, 4]);
    }
}
