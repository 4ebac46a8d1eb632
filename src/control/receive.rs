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
use std::collections::VecDeque;
use std::sync::atomic::{AtomicU64, Ordering};

use parking_lot::Mutex;
use tracing::warn;

use crate::sync::WakeSignal;

/// A bounded receive FIFO standing in for the serial port's hardware buffer.
///
/// `receive` is the interrupt side: it stores what fits and raises the wake signal. Bytes that
/// arrive while the buffer is full are overrun and lost.
pub struct RxBuffer {
    bytes: Mutex<VecDeque<u8>>,
    capacity: usize,
    signal: WakeSignal,
    overruns: AtomicU64,
}

impl RxBuffer {
    pub fn new(capacity: usize) -> RxBuffer {
        let capacity = capacity.max(1);
        RxBuffer {
            bytes: Mutex::new(VecDeque::with_capacity(capacity)),
            capacity,
            signal: WakeSignal::new(),
            overruns: AtomicU64::new(0),
        }
    }

    /// Stores a burst of received bytes and signals the ingestor. Returns how many bytes were
    /// stored.
    pub fn receive(&self, burst: &[u8]) -> usize {
        let stored = {
            let mut bytes = self.bytes.lock();
            let room = self.capacity - bytes.len();
            let stored = burst.len().min(room);
            bytes.extend(&burst[..stored]);
            stored
        };

        let overrun = burst.len() - stored;
        if overrun > 0 {
            self.overruns.fetch_add(overrun as u64, Ordering::Relaxed);
            warn!(
                overrun,
                capacity = self.capacity,
                "Receive buffer overrun, bytes lost."
            );
        }

        self.signal.give();
        stored
    }

    /// Reads the oldest byte, if any.
    pub fn read(&self) -> Option<u8> {
        self.bytes.lock().pop_front()
    }

    /// Blocks until the buffer has been signalled.
    pub fn wait(&self) {
        self.signal.take();
    }

    /// Raises the signal without storing anything. Used to release a waiting ingestor.
    pub fn wake(&self) {
        self.signal.give();
    }

    pub fn len(&self) -> usize {
        self.bytes.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.bytes.lock().is_empty()
    }

    /// Returns the total number of bytes lost to overruns.
    pub fn overruns(&self) -> u64 {
        self.overruns.load(Ordering::Relaxed)
    }
}
