// SPDX-License-Identifier: GPL-3.0-only

//! Closable bounded sample stream
//!
//! The pipeline side pushes samples through a [`StreamWriter`]; the relay
//! reads them from the [`SampleStream`]. Closing the writer drops the shared
//! sender, so the stream reports disconnection as soon as every in-flight push
//! has returned. That disconnection is the relay's only stop signal.

use crate::constants::timing;
use crate::sample::Sample;
use crossbeam_channel::{SendTimeoutError, Sender};
use std::sync::{Arc, Mutex, PoisonError};
use std::time::Duration;

/// Receiving end of a pipeline's sample output
pub type SampleStream = crossbeam_channel::Receiver<Sample>;

/// Producing end of a pipeline's sample output
#[derive(Clone)]
pub struct StreamWriter {
    sender: Arc<Mutex<Option<Sender<Sample>>>>,
}

impl StreamWriter {
    /// Create a bounded stream
    pub fn channel(capacity: usize) -> (Self, SampleStream) {
        let (tx, rx) = crossbeam_channel::bounded(capacity);
        let writer = Self {
            sender: Arc::new(Mutex::new(Some(tx))),
        };
        (writer, rx)
    }

    /// Push a sample, blocking while the stream is full
    ///
    /// Returns `false` if the stream was closed before the sample went in.
    pub fn push(&self, sample: Sample) -> bool {
        let Some(sender) = self.current_sender() else {
            return false;
        };

        let poll = Duration::from_millis(timing::STREAM_SEND_POLL_MS);
        let mut pending = sample;
        loop {
            match sender.send_timeout(pending, poll) {
                Ok(()) => return true,
                Err(SendTimeoutError::Timeout(sample)) => {
                    if self.is_closed() {
                        return false;
                    }
                    pending = sample;
                }
                Err(SendTimeoutError::Disconnected(_)) => return false,
            }
        }
    }

    /// Close the stream; later pushes are rejected
    pub fn close(&self) {
        self.sender
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .take();
    }

    pub fn is_closed(&self) -> bool {
        self.sender
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .is_none()
    }

    fn current_sender(&self) -> Option<Sender<Sample>> {
        self.sender
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::thread;

    fn sample(byte: u8) -> Sample {
        Sample::new(vec![byte], Duration::from_millis(33))
    }

    #[test]
    fn test_close_disconnects_reader() {
        let (writer, stream) = StreamWriter::channel(4);
        assert!(writer.push(sample(1)));
        writer.close();

        assert_eq!(stream.recv().unwrap().data[0], 1);
        assert!(stream.recv().is_err());
    }

    #[test]
    fn test_push_after_close_is_rejected() {
        let (writer, _stream) = StreamWriter::channel(4);
        writer.close();
        assert!(!writer.push(sample(1)));
    }

    #[test]
    fn test_blocked_push_returns_on_close() {
        let (writer, _stream) = StreamWriter::channel(1);
        assert!(writer.push(sample(1)));

        let blocked = writer.clone();
        let handle = thread::spawn(move || blocked.push(sample(2)));

        thread::sleep(Duration::from_millis(20));
        writer.close();
        assert!(!handle.join().unwrap());
    }
}
