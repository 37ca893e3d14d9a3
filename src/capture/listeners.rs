// SPDX-License-Identifier: GPL-3.0-only

//! Listener bookkeeping
//!
//! Kept behind its own lock so count queries never wait on a pipeline
//! being built or torn down.

use std::sync::{Mutex, PoisonError};
use tracing::warn;

/// Concurrency-safe count of active sample consumers
#[derive(Debug, Default)]
pub struct ListenerCounter {
    count: Mutex<usize>,
}

impl ListenerCounter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a listener, returning the new count
    pub fn add(&self) -> usize {
        let mut count = self.count.lock().unwrap_or_else(PoisonError::into_inner);
        *count += 1;
        *count
    }

    /// Unregister a listener, returning the new count
    ///
    /// Saturates at zero.
    pub fn remove(&self) -> usize {
        let mut count = self.count.lock().unwrap_or_else(PoisonError::into_inner);
        if *count == 0 {
            warn!("Listener removed while none were registered");
            return 0;
        }
        *count -= 1;
        *count
    }

    pub fn count(&self) -> usize {
        *self.count.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// True while at least one listener is registered
    pub fn started(&self) -> bool {
        self.count() > 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use std::thread;

    #[test]
    fn test_add_remove() {
        let counter = ListenerCounter::new();
        assert!(!counter.started());
        assert_eq!(counter.add(), 1);
        assert_eq!(counter.add(), 2);
        assert!(counter.started());
        assert_eq!(counter.remove(), 1);
        assert_eq!(counter.remove(), 0);
        assert!(!counter.started());
    }

    #[test]
    fn test_remove_at_zero_saturates() {
        let counter = ListenerCounter::new();
        assert_eq!(counter.remove(), 0);
        assert_eq!(counter.count(), 0);
    }

    #[test]
    fn test_concurrent_adds() {
        let counter = Arc::new(ListenerCounter::new());
        let handles: Vec<_> = (0..8)
            .map(|_| {
                let counter = Arc::clone(&counter);
                thread::spawn(move || {
                    for _ in 0..100 {
                        counter.add();
                    }
                })
            })
            .collect();
        for handle in handles {
            handle.join().unwrap();
        }
        assert_eq!(counter.count(), 800);
    }
}
