use std::sync::{Arc, Condvar, Mutex};
use std::time::Duration;

/// Outcome of a non-blocking [`VersionedSlot::get`].
#[derive(Debug)]
pub enum SlotRead<T, V> {
    /// The slot has been killed; no further values will ever appear.
    Dead,
    /// The slot is alive but nothing has been `Set` yet.
    Empty,
    Alive { value: Arc<T>, version: V },
}

/// Outcome of a blocking read ([`VersionedSlot::get_above_version`]).
#[derive(Debug)]
pub enum BlockingRead<T, V> {
    Dead,
    Alive { value: Arc<T>, version: V },
}

/// Outcome of a bounded-wait read ([`VersionedSlot::get_at_version_with_timeout`]).
#[derive(Debug)]
pub enum TimedRead<T, V> {
    Dead,
    TimedOut,
    Alive { value: Arc<T>, version: V },
}

struct State<T, V> {
    value: Option<(Arc<T>, V)>,
    alive: bool,
}

/// Single-slot, monotonically-versioned, wait/notify resource with "kill".
///
/// This is the crux of "newest-wins" supersession: producers overwrite via
/// [`Self::set`], consumers never queue stale work because a blocking read
/// only ever returns a version strictly greater than the watermark it was
/// given.
pub struct VersionedSlot<T, V> {
    state: Mutex<State<T, V>>,
    condvar: Condvar,
}

impl<T, V> VersionedSlot<T, V>
where
    V: Copy + PartialOrd,
{
    #[must_use]
    pub fn new() -> Self {
        Self {
            state: Mutex::new(State {
                value: None,
                alive: true,
            }),
            condvar: Condvar::new(),
        }
    }

    /// Writes only if alive and `version >= current.version`. Returns
    /// whether the write took effect. Wakes all waiters regardless, since a
    /// waiter blocked on a lower watermark than this write may now be
    /// satisfied even if this particular write was a no-op relative to some
    /// other slot state.
    pub fn set(&self, value: T, version: V) -> bool {
        let mut state = self.state.lock().expect("versioned slot mutex poisoned");
        if !state.alive {
            return false;
        }
        if let Some((_, current_version)) = &state.value {
            if version < *current_version {
                return false;
            }
        }
        state.value = Some((Arc::new(value), version));
        self.condvar.notify_all();
        true
    }

    /// Non-blocking snapshot.
    pub fn get(&self) -> SlotRead<T, V> {
        let state = self.state.lock().expect("versioned slot mutex poisoned");
        if !state.alive {
            return SlotRead::Dead;
        }
        match &state.value {
            None => SlotRead::Empty,
            Some((value, version)) => SlotRead::Alive {
                value: Arc::clone(value),
                version: *version,
            },
        }
    }

    /// Blocks until either dead, or a value with version strictly greater
    /// than `v` is available.
    pub fn get_above_version(&self, v: V) -> BlockingRead<T, V> {
        let mut state = self.state.lock().expect("versioned slot mutex poisoned");
        loop {
            if !state.alive {
                return BlockingRead::Dead;
            }
            if let Some((value, version)) = &state.value {
                if *version > v {
                    return BlockingRead::Alive {
                        value: Arc::clone(value),
                        version: *version,
                    };
                }
            }
            state = self
                .condvar
                .wait(state)
                .expect("versioned slot mutex poisoned");
        }
    }

    /// Blocks up to `timeout` for a value with version `>= v`.
    pub fn get_at_version_with_timeout(&self, v: V, timeout: Duration) -> TimedRead<T, V> {
        let mut state = self.state.lock().expect("versioned slot mutex poisoned");
        let deadline = std::time::Instant::now() + timeout;

        loop {
            if !state.alive {
                return TimedRead::Dead;
            }
            if let Some((value, version)) = &state.value {
                if *version >= v {
                    return TimedRead::Alive {
                        value: Arc::clone(value),
                        version: *version,
                    };
                }
            }

            let now = std::time::Instant::now();
            if now >= deadline {
                return TimedRead::TimedOut;
            }

            let (new_state, timeout_result) = self
                .condvar
                .wait_timeout(state, deadline - now)
                .expect("versioned slot mutex poisoned");
            state = new_state;
            if timeout_result.timed_out() {
                // Re-check state once more before declaring a timeout: the
                // notification and the timeout can race.
                if !state.alive {
                    return TimedRead::Dead;
                }
                if let Some((value, version)) = &state.value {
                    if *version >= v {
                        return TimedRead::Alive {
                            value: Arc::clone(value),
                            version: *version,
                        };
                    }
                }
                return TimedRead::TimedOut;
            }
        }
    }

    /// Marks the slot dead and wakes all waiters; all subsequent blocking
    /// calls return `Dead`.
    pub fn kill(&self) {
        let mut state = self.state.lock().expect("versioned slot mutex poisoned");
        state.alive = false;
        self.condvar.notify_all();
    }

    /// Clears the value and restores `alive`. Waiters that already exited
    /// on a prior `kill` do not reappear; this only affects future calls.
    pub fn reset(&self) {
        let mut state = self.state.lock().expect("versioned slot mutex poisoned");
        state.value = None;
        state.alive = true;
    }
}

impl<T, V> Default for VersionedSlot<T, V>
where
    V: Copy + PartialOrd,
{
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc as StdArc;
    use std::thread;

    #[test]
    fn test_get_on_fresh_slot_is_empty() {
        let slot: VersionedSlot<i32, u64> = VersionedSlot::new();
        assert!(matches!(slot.get(), SlotRead::Empty));
    }

    #[test]
    fn test_set_then_get_returns_value() {
        let slot: VersionedSlot<i32, u64> = VersionedSlot::new();
        assert!(slot.set(42, 1));
        match slot.get() {
            SlotRead::Alive { value, version } => {
                assert_eq!(*value, 42);
                assert_eq!(version, 1);
            }
            _ => panic!("expected Alive"),
        }
    }

    #[test]
    fn test_set_with_lower_version_is_noop() {
        let slot: VersionedSlot<i32, u64> = VersionedSlot::new();
        assert!(slot.set(1, 5));
        assert!(!slot.set(2, 3));
        match slot.get() {
            SlotRead::Alive { value, version } => {
                assert_eq!(*value, 1);
                assert_eq!(version, 5);
            }
            _ => panic!("expected Alive at version 5"),
        }
    }

    #[test]
    fn test_set_with_equal_version_is_accepted() {
        let slot: VersionedSlot<i32, u64> = VersionedSlot::new();
        assert!(slot.set(1, 5));
        assert!(slot.set(2, 5));
        match slot.get() {
            SlotRead::Alive { value, .. } => assert_eq!(*value, 2),
            _ => panic!("expected Alive"),
        }
    }

    #[test]
    fn test_get_above_version_blocks_until_satisfied() {
        let slot: StdArc<VersionedSlot<i32, u64>> = StdArc::new(VersionedSlot::new());
        let reader_slot = StdArc::clone(&slot);

        let reader = thread::spawn(move || reader_slot.get_above_version(0));

        thread::sleep(std::time::Duration::from_millis(20));
        slot.set(99, 1);

        match reader.join().unwrap() {
            BlockingRead::Alive { value, version } => {
                assert_eq!(*value, 99);
                assert_eq!(version, 1);
            }
            BlockingRead::Dead => panic!("expected Alive"),
        }
    }

    #[test]
    fn test_kill_wakes_blocked_readers_as_dead() {
        let slot: StdArc<VersionedSlot<i32, u64>> = StdArc::new(VersionedSlot::new());
        let reader_slot = StdArc::clone(&slot);

        let reader = thread::spawn(move || reader_slot.get_above_version(0));

        thread::sleep(std::time::Duration::from_millis(20));
        slot.kill();

        assert!(matches!(reader.join().unwrap(), BlockingRead::Dead));
    }

    #[test]
    fn test_reset_after_kill_returns_to_empty_alive() {
        let slot: VersionedSlot<i32, u64> = VersionedSlot::new();
        slot.set(1, 1);
        slot.kill();
        slot.reset();

        assert!(matches!(slot.get(), SlotRead::Empty));
        assert!(slot.set(2, 1));
    }

    #[test]
    fn test_get_at_version_with_timeout_times_out() {
        let slot: VersionedSlot<i32, u64> = VersionedSlot::new();
        let result = slot.get_at_version_with_timeout(1, Duration::from_millis(10));
        assert!(matches!(result, TimedRead::TimedOut));
    }

    #[test]
    fn test_get_at_version_with_timeout_succeeds_before_deadline() {
        let slot: StdArc<VersionedSlot<i32, u64>> = StdArc::new(VersionedSlot::new());
        let writer_slot = StdArc::clone(&slot);

        let writer = thread::spawn(move || {
            thread::sleep(std::time::Duration::from_millis(10));
            writer_slot.set(7, 1);
        });

        let result = slot.get_at_version_with_timeout(1, Duration::from_millis(200));
        writer.join().unwrap();

        match result {
            TimedRead::Alive { value, .. } => assert_eq!(*value, 7),
            other => panic!("expected Alive, got {:?}", other),
        }
    }

    #[test]
    fn test_dead_slot_rejects_set() {
        let slot: VersionedSlot<i32, u64> = VersionedSlot::new();
        slot.kill();
        assert!(!slot.set(1, 1));
    }

    proptest::proptest! {
        /// After replaying any sequence of `Set((value, version))` calls in
        /// order, `get()` reports the version that was the maximum among
        /// all versions applied so far (later lower/equal versions besides
        /// the maximum are no-ops, never regressions).
        #[test]
        fn prop_set_sequence_converges_to_max_version(versions in proptest::collection::vec(0u64..1000, 1..50)) {
            let slot: VersionedSlot<u64, u64> = VersionedSlot::new();
            let mut max_seen = 0u64;
            for version in versions {
                slot.set(version, version);
                max_seen = max_seen.max(version);

                match slot.get() {
                    SlotRead::Alive { version: observed, .. } => {
                        proptest::prop_assert_eq!(observed, max_seen);
                    }
                    other => proptest::prop_assert!(false, "expected Alive, got {:?}", other),
                }
            }
        }
    }
}
