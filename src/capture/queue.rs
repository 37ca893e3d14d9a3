// SPDX-License-Identifier: GPL-3.0-only

//! Bounded sample queue handed to external consumers

use crate::sample::Sample;
use crossbeam_channel::{Receiver, Sender};
use std::time::Duration;

/// Create a queue with the given capacity
pub(crate) fn sample_queue(capacity: usize) -> (QueueWriter, SampleQueue) {
    let (tx, rx) = crossbeam_channel::bounded(capacity);
    (QueueWriter { tx }, SampleQueue { rx })
}

/// Writing end, owned by the manager and cloned into relay threads
#[derive(Clone)]
pub(crate) struct QueueWriter {
    tx: Sender<Sample>,
}

impl QueueWriter {
    /// Blocking send; waits for room instead of dropping
    pub(crate) fn send(&self, sample: Sample) -> bool {
        self.tx.send(sample).is_ok()
    }
}

/// Read end of a stream sink's samples
///
/// Clones share the same underlying queue: each sample is delivered to
/// exactly one reader.
#[derive(Debug, Clone)]
pub struct SampleQueue {
    rx: Receiver<Sample>,
}

impl SampleQueue {
    /// Block until a sample arrives
    ///
    /// Returns `None` only once the owning manager has been dropped and the
    /// queue is drained.
    pub fn recv(&self) -> Option<Sample> {
        self.rx.recv().ok()
    }

    /// Wait up to `timeout` for a sample
    pub fn recv_timeout(&self, timeout: Duration) -> Option<Sample> {
        self.rx.recv_timeout(timeout).ok()
    }

    pub fn try_recv(&self) -> Option<Sample> {
        self.rx.try_recv().ok()
    }

    /// Samples currently waiting
    pub fn len(&self) -> usize {
        self.rx.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rx.is_empty()
    }

    pub fn capacity(&self) -> usize {
        self.rx.capacity().unwrap_or(0)
    }

    /// True if both handles read from the same queue
    pub fn same_queue(&self, other: &SampleQueue) -> bool {
        self.rx.same_channel(&other.rx)
    }
}
