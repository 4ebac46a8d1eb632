// Copyright (C) 2026 Michael Wilson <mike@mdwn.dev>
//
// This program is free software: you can redistribute it and/or modify it under
// the terms of the GNU General Public License as published by the Free Software
// Foundation, version 3.
//
// This program is distributed in the hope that it will be useful, but WITHOUT
// ANY WARRANTY; without even the implied warranty of MERCHANTABILITY or FITNESS
// FOR A PARTICULAR PURPOSE. See the GNU General Public License for more details.
//
// You should have received a copy of the GNU General Public License along with
// this program. If not, see <https://www.gnu.org/licenses/>.
//

//! Bounded FIFOs between the engine threads.
//!
//! The sample queue connects the synthesis thread to the transmission thread and never
//! blocks either side. The control queue connects ingestion to the interpreter; its sender
//! waits a bounded amount of time for space before giving up on a byte.

use std::time::Duration;

use crossbeam_channel::{
    bounded, Receiver, RecvTimeoutError, SendTimeoutError, Sender, TryRecvError, TrySendError,
};

use crate::synth::Sample;

/// Returned when the other side of a queue has gone away.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
#[error("queue is closed")]
pub struct QueueClosed;

/// Creates a sample queue that holds up to `capacity` samples.
pub fn sample_queue(capacity: usize) -> (SampleProducer, SampleConsumer) {
    let (tx, rx) = bounded(capacity.max(1));
    (SampleProducer { tx }, SampleConsumer { rx })
}

/// The single writer of a sample queue.
pub struct SampleProducer {
    tx: Sender<Sample>,
}

impl SampleProducer {
    /// Enqueues without blocking. When there is no room the sample is handed back so the
    /// caller can hold on to it and retry.
    pub fn try_push(&self, sample: Sample) -> Result<(), Sample> {
        match self.tx.try_send(sample) {
            Ok(()) => Ok(()),
            Err(TrySendError::Full(sample)) | Err(TrySendError::Disconnected(sample)) => {
                Err(sample)
            }
        }
    }

    pub fn len(&self) -> usize {
        self.tx.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tx.is_empty()
    }

    pub fn capacity(&self) -> usize {
        self.tx.capacity().unwrap_or_default()
    }
}

/// The single reader of a sample queue.
pub struct SampleConsumer {
    rx: Receiver<Sample>,
}

impl SampleConsumer {
    /// Dequeues without blocking.
    pub fn try_pop(&self) -> Option<Sample> {
        self.rx.try_recv().ok()
    }

    pub fn len(&self) -> usize {
        self.rx.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rx.is_empty()
    }
}

/// Creates a control queue that holds up to `capacity` raw bytes. The sender waits at most
/// `send_timeout` for space before dropping a byte.
pub fn control_queue(capacity: usize, send_timeout: Duration) -> (ControlSender, ControlReceiver) {
    let (tx, rx) = bounded(capacity.max(1));
    (ControlSender { tx, send_timeout }, ControlReceiver { rx })
}

/// The ingestion side of the control queue.
pub struct ControlSender {
    tx: Sender<u8>,
    send_timeout: Duration,
}

impl ControlSender {
    /// Enqueues a byte, waiting up to the configured timeout for room. Returns false if the
    /// byte was dropped.
    pub fn send(&self, byte: u8) -> bool {
        match self.tx.send_timeout(byte, self.send_timeout) {
            Ok(()) => true,
            Err(SendTimeoutError::Timeout(_)) | Err(SendTimeoutError::Disconnected(_)) => false,
        }
    }

    pub fn len(&self) -> usize {
        self.tx.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tx.is_empty()
    }
}

/// The interpreter side of the control queue.
pub struct ControlReceiver {
    rx: Receiver<u8>,
}

impl ControlReceiver {
    /// Dequeues without blocking.
    pub fn try_recv(&self) -> Result<Option<u8>, QueueClosed> {
        match self.rx.try_recv() {
            Ok(byte) => Ok(Some(byte)),
            Err(TryRecvError::Empty) => Ok(None),
            Err(TryRecvError::Disconnected) => Err(QueueClosed),
        }
    }

    /// Waits up to `timeout` for a byte. `Ok(None)` means nothing arrived in time.
    pub fn recv_timeout(&self, timeout: Duration) -> Result<Option<u8>, QueueClosed> {
        match self.rx.recv_timeout(timeout) {
            Ok(byte) => Ok(Some(byte)),
            Err(RecvTimeoutError::Timeout) => Ok(None),
            Err(RecvTimeoutError::Disconnected) => Err(QueueClosed),
        }
    }

    pub fn len(&self) -> usize {
        self.rx.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rx.is_empty()
    }
}
