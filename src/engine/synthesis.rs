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

use crossbeam_channel::Receiver;
use tracing::{debug, info, span, trace, warn, Level};

use super::clock::Ticker;
use super::thread_priority::configure_tick_thread_priority;
use crate::queue::SampleProducer;
use crate::synth::{mixdown, Sample, VoiceBank, VoiceCommand};
use crate::sync::CancelHandle;

/// What happened during one synthesis tick.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TickOutcome {
    /// A freshly computed sample was queued.
    Queued(Sample),
    /// The queue was full. The sample is held and retried on the next tick.
    Stalled(Sample),
    /// A held sample finally made it into the queue. Nothing new was computed.
    Flushed(Sample),
}

/// Owns the voice bank and produces one sample per tick.
///
/// A sample that can't be queued is never dropped and never replaced. While one is held,
/// ticks only retry it; voices don't advance until it is delivered.
pub struct SynthesisScheduler {
    bank: VoiceBank,
    commands: Receiver<VoiceCommand>,
    queue: SampleProducer,
    pending: Option<Sample>,
    stalls: Arc<AtomicU64>,
}

impl SynthesisScheduler {
    pub fn new(
        bank: VoiceBank,
        commands: Receiver<VoiceCommand>,
        queue: SampleProducer,
        stalls: Arc<AtomicU64>,
    ) -> SynthesisScheduler {
        SynthesisScheduler {
            bank,
            commands,
            queue,
            pending: None,
            stalls,
        }
    }

    /// Returns the voice bank.
    pub fn bank(&self) -> &VoiceBank {
        &self.bank
    }

    /// Returns the sample waiting to be retried, if any.
    pub fn pending(&self) -> Option<Sample> {
        self.pending
    }

    /// Applies every voice command that has arrived so far.
    pub fn apply(&mut self) {
        for command in self.commands.try_iter() {
            if !command.apply(&mut self.bank) {
                warn!(?command, "Voice command names a slot that doesn't exist.");
            }
        }
    }

    /// Runs one synthesis tick.
    pub fn tick(&mut self) -> TickOutcome {
        self.apply();

        if let Some(stale) = self.pending.take() {
            return match self.queue.try_push(stale) {
                Ok(()) => {
                    debug!(sample = stale.value(), "Sample queue drained, stall cleared.");
                    TickOutcome::Flushed(stale)
                }
                Err(stale) => {
                    self.stall(stale);
                    TickOutcome::Stalled(stale)
                }
            };
        }

        let sample = mixdown(&mut self.bank);
        match self.queue.try_push(sample) {
            Ok(()) => {
                trace!(sample = sample.value(), "Queued sample.");
                TickOutcome::Queued(sample)
            }
            Err(sample) => {
                debug!(
                    sample = sample.value(),
                    queued = self.queue.len(),
                    "Sample queue full, holding sample."
                );
                self.stall(sample);
                TickOutcome::Stalled(sample)
            }
        }
    }

    fn stall(&mut self, sample: Sample) {
        self.pending = Some(sample);
        self.stalls.fetch_add(1, Ordering::Relaxed);
    }

    /// Ticks at the ticker's rate until cancelled.
    pub fn run(mut self, mut ticker: Ticker, cancel_handle: CancelHandle) {
        let span = span!(Level::INFO, "synthesis");
        let _enter = span.enter();

        configure_tick_thread_priority("synthesis");
        info!(
            voices = self.bank.len(),
            period = ?ticker.period(),
            "Synthesizing."
        );

        while !cancel_handle.is_cancelled() {
            ticker.wait();
            self.tick();
        }

        info!(
            stalls = self.stalls.load(Ordering::Relaxed),
            "Synthesis stopped."
        );
    }
}
