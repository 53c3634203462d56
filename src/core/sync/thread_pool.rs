use std::sync::mpsc::{self, Receiver, Sender};
use std::sync::{Arc, Mutex};
use std::thread::{self, JoinHandle};

type Job = Box<dyn FnOnce() + Send + 'static>;

/// A fixed-size pool of worker threads draining a single shared FIFO of
/// opaque work items. `queue` is non-blocking; on drop the queue is closed
/// and all workers are joined. Exposes no futures and no priorities.
pub struct ThreadPool {
    sender: Option<Sender<Job>>,
    workers: Vec<JoinHandle<()>>,
}

impl ThreadPool {
    /// `size` is clamped to at least 1 — a pool with zero workers can never
    /// make progress.
    #[must_use]
    pub fn new(size: usize) -> Self {
        let size = size.max(1);
        let (sender, receiver) = mpsc::channel::<Job>();
        let receiver = Arc::new(Mutex::new(receiver));

        let workers = (0..size)
            .map(|_| {
                let receiver = Arc::clone(&receiver);
                thread::spawn(move || worker_loop(&receiver))
            })
            .collect();

        Self {
            sender: Some(sender),
            workers,
        }
    }

    /// Target configuration for the shared worker pool: `logical_cores - 1`,
    /// leaving one core for the HTTP I/O thread.
    #[must_use]
    pub fn new_with_default_size() -> Self {
        let logical_cores = thread::available_parallelism()
            .map(std::num::NonZeroUsize::get)
            .unwrap_or(1);
        Self::new(logical_cores.saturating_sub(1).max(1))
    }

    /// Non-blocking submission of a single closure with no return value.
    pub fn queue<F>(&self, job: F)
    where
        F: FnOnce() + Send + 'static,
    {
        if let Some(sender) = &self.sender {
            // The receiver side is only dropped once every worker has
            // exited, which only happens after `Drop` takes `sender`. A
            // send error here would mean a worker panicked and poisoned
            // the channel, which we treat as an internal invariant
            // violation rather than something callers should handle.
            let _ = sender.send(Box::new(job));
        }
    }
}

fn worker_loop(receiver: &Arc<Mutex<Receiver<Job>>>) {
    loop {
        let job = {
            let receiver = receiver.lock().expect("thread pool receiver poisoned");
            receiver.recv()
        };
        match job {
            Ok(job) => job(),
            Err(_) => return,
        }
    }
}

impl Drop for ThreadPool {
    fn drop(&mut self) {
        // Dropping the sender closes the channel; every worker's blocking
        // `recv` then returns `Err` and exits its loop.
        self.sender.take();
        for worker in self.workers.drain(..) {
            let _ = worker.join();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::mpsc::channel;

    #[test]
    fn test_queue_runs_submitted_work() {
        let pool = ThreadPool::new(2);
        let (tx, rx) = channel();

        pool.queue(move || {
            tx.send(42).unwrap();
        });

        assert_eq!(rx.recv().unwrap(), 42);
    }

    #[test]
    fn test_all_submitted_jobs_eventually_run() {
        let pool = ThreadPool::new(4);
        let counter = Arc::new(AtomicUsize::new(0));

        for _ in 0..100 {
            let counter = Arc::clone(&counter);
            pool.queue(move || {
                counter.fetch_add(1, Ordering::SeqCst);
            });
        }

        drop(pool); // joins all workers, which only exit once drained
        assert_eq!(counter.load(Ordering::SeqCst), 100);
    }

    #[test]
    fn test_new_clamps_zero_size_to_one() {
        let pool = ThreadPool::new(0);
        assert_eq!(pool.workers.len(), 1);
    }

    #[test]
    fn test_default_size_is_at_least_one() {
        let pool = ThreadPool::new_with_default_size();
        assert!(!pool.workers.is_empty());
    }
}
