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

use tracing::{info, span, trace, warn, Level};

use super::clock::Ticker;
use super::thread_priority::configure_tick_thread_priority;
use crate::dac::{transmit, Transport};
use crate::queue::SampleConsumer;
use crate::synth::Sample;
use crate::sync::CancelHandle;

/// Moves samples from the sample queue to the DAC, one per tick.
pub struct TransmissionScheduler<T: Transport> {
    queue: SampleConsumer,
    transport: T,
    samples_sent: Arc<AtomicU64>,
}

impl<T: Transport> TransmissionScheduler<T> {
    pub fn new(
        queue: SampleConsumer,
        transport: T,
        samples_sent: Arc<AtomicU64>,
    ) -> TransmissionScheduler<T> {
        TransmissionScheduler {
            queue,
            transport,
            samples_sent,
        }
    }

    /// Sends the oldest queued sample. An empty queue leaves a gap and a transport error skips
    /// the cycle; neither is retried. Returns the sample that reached the DAC.
    pub fn tick(&mut self) -> Option<Sample> {
        let sample = match self.queue.try_pop() {
            Some(sample) => sample,
            None => {
                trace!("Sample queue empty, skipping transmission.");
                return None;
            }
        };

        match transmit(&mut self.transport, sample) {
            Ok(()) => {
                self.samples_sent.fetch_add(1, Ordering::Relaxed);
                Some(sample)
            }
            Err(e) => {
                warn!(err = %e, sample = sample.value(), "Error sending sample to DAC.");
                None
            }
        }
    }

    /// Returns the transport.
    pub fn into_transport(self) -> T {
        self.transport
    }

    /// Ticks at the ticker's rate until cancelled.
    pub fn run(mut self, mut ticker: Ticker, cancel_handle: CancelHandle) {
        let span = span!(Level::INFO, "transmission");
        let _enter = span.enter();

        configure_tick_thread_priority("transmission");
        info!(period = ?ticker.period(), "Transmitting.");

        while !cancel_handle.is_cancelled() {
            ticker.wait();
            self.tick();
        }

        info!(
            samples_sent = self.samples_sent.load(Ordering::Relaxed),
            "Transmission stopped."
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dac::mock;
    use crate::queue::sample_queue;

    #[test]
    fn test_sends_in_queue_order() {
        let (producer, consumer) = sample_queue(8);
        let transport = mock::Transport::new();
        let sent = Arc::new(AtomicU64::new(0));
        let mut scheduler = TransmissionScheduler::new(consumer, transport.clone(), sent.clone());

        producer.try_push(Sample::new(1)).unwrap();
        producer.try_push(Sample::new(0x0FFF)).unwrap();

        assert_eq!(scheduler.tick(), Some(Sample::new(1)));
        assert_eq!(scheduler.tick(), Some(Sample::new(0x0FFF)));
        assert_eq!(scheduler.tick(), None);

        assert_eq!(transport.words(), vec![0x3001, 0x3FFF]);
        assert_eq!(sent.load(Ordering::Relaxed), 2);
    }

    #[test]
    fn test_transport_error_skips_cycle() {
        let (producer, consumer) = sample_queue(8);
        let transport = mock::Transport::new();
        let sent = Arc::new(AtomicU64::new(0));
        let mut scheduler = TransmissionScheduler::new(consumer, transport.clone(), sent.clone());

        producer.try_push(Sample::new(7)).unwrap();
        producer.try_push(Sample::new(8)).unwrap();

        transport.fail_writes(true);
        assert_eq!(scheduler.tick(), None);
        transport.fail_writes(false);
        assert_eq!(scheduler.tick(), Some(Sample::new(8)));

        assert_eq!(transport.words(), vec![0x3008]);
        assert_eq!(sent.load(Ordering::Relaxed), 1);
        assert_eq!(
            transport.select_edges(),
            vec![true, false, true, false]
        );
    }
}
