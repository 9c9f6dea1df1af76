//! Duplicate suppression for concurrent singleton construction.
//!
//! The first caller for a key installs a pending cell and runs the work; callers
//! arriving while it runs block on the same cell and receive a clone of its
//! result. The cell is dropped from the map once the work has finished, so the
//! result must be published somewhere durable (the singleton cache) by the work
//! itself.

use once_cell::sync::OnceCell;
use parking_lot::Mutex;
use std::collections::HashMap;
use std::sync::Arc;

pub(crate) struct Flights<T> {
    pending: Mutex<HashMap<String, Arc<OnceCell<T>>>>,
}

impl<T> Default for Flights<T> {
    fn default() -> Self {
        Self {
            pending: Mutex::default(),
        }
    }
}

impl<T: Clone> Flights<T> {
    /// Runs `work` unless another caller is already running it for `key`, in
    /// which case this call blocks and returns that caller's result.
    ///
    /// If the running `work` panics the cell stays empty and one of the blocked
    /// callers runs its own `work` instead.
    pub(crate) fn work<F>(&self, key: &str, work: F) -> T
    where
        F: FnOnce() -> T,
    {
        let cell = Arc::clone(
            self.pending
                .lock()
                .entry(key.to_owned())
                .or_insert_with(|| Arc::new(OnceCell::new())),
        );

        let result = cell.get_or_init(work).clone();

        let mut pending = self.pending.lock();
        if pending
            .get(key)
            .map_or(false, |current| Arc::ptr_eq(current, &cell))
        {
            pending.remove(key);
        }
        result
    }
}
