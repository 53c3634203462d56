use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Condvar, Mutex};

use crate::core::sync::thread_pool::ThreadPool;

struct Inner {
    outstanding: AtomicU64,
    done: Mutex<()>,
    condvar: Condvar,
}

/// A fan-out/join barrier over a [`ThreadPool`] for one cohort of tasks.
/// `add` atomically increments the outstanding counter, submits a wrapper
/// that runs the closure then decrements, and — on reaching zero — notifies
/// `wait_until_done`. Single-use: once drained, a group is not meant to be
/// reused for a later cohort.
pub struct TaskGroup<'pool> {
    pool: &'pool ThreadPool,
    inner: Arc<Inner>,
}

impl<'pool> TaskGroup<'pool> {
    #[must_use]
    pub fn new(pool: &'pool ThreadPool) -> Self {
        Self {
            pool,
            inner: Arc::new(Inner {
                outstanding: AtomicU64::new(0),
                done: Mutex::new(()),
                condvar: Condvar::new(),
            }),
        }
    }

    pub fn add<F>(&self, job: F)
    where
        F: FnOnce() + Send + 'static,
    {
        self.inner.outstanding.fetch_add(1, Ordering::SeqCst);
        let inner = Arc::clone(&self.inner);
        self.pool.queue(move || {
            job();
            if inner.outstanding.fetch_sub(1, Ordering::SeqCst) == 1 {
                // We were the last outstanding task.
                let _guard = inner.done.lock().expect("task group mutex poisoned");
                inner.condvar.notify_all();
            }
        });
    }

    /// Blocks until every task added to this group has completed.
    pub fn wait_until_done(&self) {
        let mut guard = self.inner.done.lock().expect("task group mutex poisoned");
        while self.inner.outstanding.load(Ordering::SeqCst) != 0 {
            guard = self
                .inner
                .condvar
                .wait(guard)
                .expect("task group mutex poisoned");
        }
    }
}
