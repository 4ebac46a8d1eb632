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
use std::sync::{
    atomic::{AtomicU64, Ordering},
    Arc,
};

use tracing::{debug, info, span, trace, Level};

use super::receive::RxBuffer;
use crate::queue::ControlSender;
use crate::sync::CancelHandle;

/// Moves bytes from the receive buffer into the control queue each time the buffer signals.
pub struct Ingestor {
    rx_buffer: Arc<RxBuffer>,
    queue: ControlSender,
    dropped: Arc<AtomicU64>,
}

impl Ingestor {
    /// Creates a new ingestor. `dropped` counts bytes that did not fit in the control queue.
    pub fn new(rx_buffer: Arc<RxBuffer>, queue: ControlSender, dropped: Arc<AtomicU64>) -> Self {
        Self {
            rx_buffer,
            queue,
            dropped,
        }
    }

    /// Drains every byte currently in the receive buffer. Bytes that still don't fit after
    /// the queue's bounded wait are dropped. Returns the number of bytes queued.
    pub fn drain(&self) -> usize {
        let mut queued = 0;
        let mut dropped = 0;
        while let Some(byte) = self.rx_buffer.read() {
            if self.queue.send(byte) {
                queued += 1;
            } else {
                dropped += 1;
            }
        }

        if dropped > 0 {
            self.dropped.fetch_add(dropped, Ordering::Relaxed);
            debug!(queued, dropped, "Control queue full, dropped bytes.");
        } else {
            trace!(queued, "Drained receive buffer.");
        }
        queued
    }

    /// Waits for the receive signal and drains the buffer until cancelled.
    pub fn run(self, cancel_handle: CancelHandle) {
        let span = span!(Level::INFO, "ingest");
        let _enter = span.enter();
        info!("Waiting for control bytes.");

        loop {
            self.rx_buffer.wait();
            if cancel_handle.is_cancelled() {
                info!("Ingestion stopped.");
                return;
            }
            self.drain();
        }
    }
}
