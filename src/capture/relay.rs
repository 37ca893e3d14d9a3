// SPDX-License-Identifier: GPL-3.0-only

//! Background relay from a pipeline's sample stream to the consumer queue
//!
//! One relay thread runs per pipeline instance. Its only wake condition is
//! the pipeline stream: it exits when the stream closes, which happens when
//! the pipeline is destroyed. Forwarding blocks on a full queue, so a slow
//! consumer stalls the relay and, through the stream, the pipeline.

use super::queue::QueueWriter;
use crate::pipeline::SampleStream;
use std::io;
use std::thread::{self, JoinHandle};
use tracing::{debug, warn};

/// Handle to a running relay thread
pub struct RelayTask {
    thread_handle: Option<JoinHandle<u64>>,
    name: String,
}

impl RelayTask {
    /// Spawn a relay reading `stream` into `queue`
    ///
    /// The thread inherits the caller's tracing span.
    pub(crate) fn spawn(name: &str, stream: SampleStream, queue: QueueWriter) -> io::Result<Self> {
        let span = tracing::Span::current();
        let thread_name = name.to_string();

        let thread_handle = thread::Builder::new()
            .name(name.to_string())
            .spawn(move || {
                let _entered = span.enter();
                debug!(relay = %thread_name, "started emitting samples");

                let mut relayed = 0u64;
                for sample in stream.iter() {
                    if !queue.send(sample) {
                        warn!(relay = %thread_name, "sample queue closed");
                        break;
                    }
                    relayed += 1;
                }

                debug!(relay = %thread_name, relayed, "stopped emitting samples");
                relayed
            })?;

        Ok(Self {
            thread_handle: Some(thread_handle),
            name: name.to_string(),
        })
    }

    /// Check if the thread is still running
    pub fn is_running(&self) -> bool {
        self.thread_handle
            .as_ref()
            .map(|h| !h.is_finished())
            .unwrap_or(false)
    }

    /// Wait for the thread to exit, returning how many samples it relayed
    pub fn join(&mut self) -> u64 {
        let Some(handle) = self.thread_handle.take() else {
            return 0;
        };

        debug!(relay = %self.name, "Waiting for relay thread to finish");
        match handle.join() {
            Ok(relayed) => relayed,
            Err(e) => {
                warn!(relay = %self.name, "Relay thread panicked: {:?}", e);
                0
            }
        }
    }
}
