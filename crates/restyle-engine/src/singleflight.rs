use std::collections::HashMap;
use std::sync::{Arc, Condvar, Mutex, PoisonError};
use std::time::Duration;

struct Slot<T> {
    result: Mutex<Option<T>>,
    ready: Condvar,
}

impl<T> Slot<T> {
    fn new() -> Self {
        Self {
            result: Mutex::new(None),
            ready: Condvar::new(),
        }
    }
}

enum Role<T> {
    Leader(Arc<Slot<T>>),
    Follower(Arc<Slot<T>>),
}

/// Keyed request coalescing: the first caller for a key becomes the leader
/// and runs the computation; concurrent callers for the same key block until
/// the leader publishes its value and receive a clone of it. The
/// check-and-insert happens under a single lock hold, so at most one
/// computation per key is ever in flight.
pub struct SingleFlight<T> {
    slots: Mutex<HashMap<String, Arc<Slot<T>>>>,
}

impl<T: Clone> SingleFlight<T> {
    pub fn new() -> Self {
        Self {
            slots: Mutex::new(HashMap::new()),
        }
    }

    /// Run `compute` for `key`, or join an in-flight run of it. Returns
    /// `None` only for a follower whose wait exceeded `wait` (the leader is
    /// never interrupted and always receives its own value).
    pub fn run<F>(&self, key: &str, wait: Duration, compute: F) -> Option<T>
    where
        F: FnOnce() -> T,
    {
        let role = {
            let mut slots = self.lock_slots();
            match slots.get(key) {
                Some(slot) => Role::Follower(slot.clone()),
                None => {
                    let slot = Arc::new(Slot::new());
                    slots.insert(key.to_string(), slot.clone());
                    Role::Leader(slot)
                }
            }
        };

        match role {
            Role::Leader(slot) => {
                let value = compute();
                *slot
                    .result
                    .lock()
                    .unwrap_or_else(PoisonError::into_inner) = Some(value.clone());
                slot.ready.notify_all();
                self.lock_slots().remove(key);
                Some(value)
            }
            Role::Follower(slot) => {
                let guard = slot.result.lock().unwrap_or_else(PoisonError::into_inner);
                let (guard, _timeout) = slot
                    .ready
                    .wait_timeout_while(guard, wait, |result| result.is_none())
                    .unwrap_or_else(PoisonError::into_inner);
                guard.clone()
            }
        }
    }

    /// Number of computations currently in flight.
    pub fn in_flight(&self) -> usize {
        self.lock_slots().len()
    }

    fn lock_slots(&self) -> std::sync::MutexGuard<'_, HashMap<String, Arc<Slot<T>>>> {
        self.slots.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl<T: Clone> Default for SingleFlight<T> {
    fn default() -> Self {
        Self::new()
    }
}
