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

//! Wires the control path and the sample path together and runs them.
//!
//! Four threads make up a running engine:
//!
//! - ingestion: wakes on the receive signal and moves bytes into the control queue.
//! - interpreter: turns control bytes into voice commands.
//! - synthesis: owns the voice bank and queues one sample per synthesis tick.
//! - transmission: sends one queued sample to the DAC per transmission tick.

use std::{
    error::Error,
    sync::{
        atomic::{AtomicU64, Ordering},
        Arc,
    },
    thread::{self, JoinHandle},
};

use crossbeam_channel::Sender;
use tracing::{error, info, warn};

use crate::config;
use crate::control::{Ingestor, Interpreter, RxBuffer};
use crate::dac::Transport;
use crate::midi;
use crate::queue::{control_queue, sample_queue, ControlReceiver};
use crate::synth::{Tuning, VoiceBank, VoiceCommand};
use crate::sync::CancelHandle;

mod clock;
mod render;
mod synthesis;
mod thread_priority;
mod transmission;

pub use self::clock::Ticker;
pub use self::render::{midi_file_events, render, TimedBytes};
pub use self::synthesis::{SynthesisScheduler, TickOutcome};
pub use self::transmission::TransmissionScheduler;

/// Counters shared with the engine threads.
#[derive(Clone, Default, Debug)]
pub struct EngineStats {
    samples_sent: Arc<AtomicU64>,
    stalls: Arc<AtomicU64>,
    dropped_control_bytes: Arc<AtomicU64>,
}

impl EngineStats {
    /// Samples that reached the DAC.
    pub fn samples_sent(&self) -> u64 {
        self.samples_sent.load(Ordering::Relaxed)
    }

    /// Synthesis ticks that ended with a sample held back by a full queue.
    pub fn stalls(&self) -> u64 {
        self.stalls.load(Ordering::Relaxed)
    }

    /// Control bytes dropped because the control queue stayed full.
    pub fn dropped_control_bytes(&self) -> u64 {
        self.dropped_control_bytes.load(Ordering::Relaxed)
    }
}

/// The parts of the engine that don't depend on threads. Shared with offline rendering.
struct Parts<T: Transport> {
    rx_buffer: Arc<RxBuffer>,
    ingestor: Ingestor,
    interpreter: Interpreter,
    control: ControlReceiver,
    synthesis: SynthesisScheduler,
    transmission: TransmissionScheduler<T>,
    commands: Sender<VoiceCommand>,
    stats: EngineStats,
}

impl<T: Transport> Parts<T> {
    fn build(config: &config::Engine, transport: T) -> Result<Parts<T>, Box<dyn Error>> {
        let stats = EngineStats::default();
        let rx_buffer = Arc::new(RxBuffer::new(config.rx_buffer_len()));
        let (control_tx, control_rx) = control_queue(
            config.control_queue_capacity(),
            config.control_enqueue_timeout()?,
        );
        let (producer, consumer) = sample_queue(config.sample_queue_capacity());
        let (commands, command_rx) = crossbeam_channel::unbounded();

        let mut bank = VoiceBank::new(config.voices());
        if let Some(test_tone) = config.test_tone() {
            test_tone.command().apply(&mut bank);
            info!(
                waveform = %test_tone.waveform(),
                period = test_tone.period().get(),
                "Test tone on slot 0."
            );
        }

        let channel = config.midi().and_then(|midi| midi.channel());
        Ok(Parts {
            ingestor: Ingestor::new(
                rx_buffer.clone(),
                control_tx,
                stats.dropped_control_bytes.clone(),
            ),
            interpreter: Interpreter::new(
                config.voices(),
                Tuning::new(config.sample_rate()),
                config.program(),
                channel,
                commands.clone(),
            ),
            control: control_rx,
            synthesis: SynthesisScheduler::new(bank, command_rx, producer, stats.stalls.clone()),
            transmission: TransmissionScheduler::new(
                consumer,
                transport,
                stats.samples_sent.clone(),
            ),
            rx_buffer,
            commands,
            stats,
        })
    }
}

/// A running engine. Dropping it stops every thread.
pub struct Engine {
    cancel_handle: CancelHandle,
    rx_buffer: Arc<RxBuffer>,
    midi_device: Option<Arc<dyn midi::Device>>,
    commands: Sender<VoiceCommand>,
    stats: EngineStats,
    threads: Vec<JoinHandle<()>>,
}

impl Engine {
    /// Starts the engine. Bytes from the MIDI device, if any, drive the voices; every sample
    /// goes out through the transport.
    pub fn start<T: Transport + Send + 'static>(
        config: &config::Engine,
        midi_device: Option<Arc<dyn midi::Device>>,
        transport: T,
    ) -> Result<Engine, Box<dyn Error>> {
        config.validate()?;
        let parts = Parts::build(config, transport)?;

        info!(
            sample_rate = config.sample_rate(),
            transmit_rate = config.transmit_rate(),
            voices = config.voices(),
            midi = ?midi_device.as_ref().map(|device| device.name()),
            "Starting engine."
        );

        let mut engine = Engine {
            cancel_handle: CancelHandle::new(),
            rx_buffer: parts.rx_buffer,
            midi_device: None,
            commands: parts.commands,
            stats: parts.stats,
            threads: Vec::with_capacity(4),
        };

        // If anything below fails, dropping the engine stops whatever was already spawned.
        let cancel_handle = engine.cancel_handle.clone();
        let ingestor = parts.ingestor;
        engine.spawn("ingest", move || ingestor.run(cancel_handle))?;

        let cancel_handle = engine.cancel_handle.clone();
        let interpreter = parts.interpreter;
        let control = parts.control;
        engine.spawn("interpreter", move || interpreter.run(control, cancel_handle))?;

        let cancel_handle = engine.cancel_handle.clone();
        let synthesis = parts.synthesis;
        let ticker = Ticker::new(config.sample_rate());
        engine.spawn("synthesis", move || synthesis.run(ticker, cancel_handle))?;

        let cancel_handle = engine.cancel_handle.clone();
        let transmission = parts.transmission;
        let ticker = Ticker::new(config.transmit_rate());
        engine.spawn("transmission", move || {
            transmission.run(ticker, cancel_handle)
        })?;

        if let Some(device) = midi_device {
            device.watch_events(engine.rx_buffer.clone())?;
            engine.midi_device = Some(device);
        }

        Ok(engine)
    }

    fn spawn<F>(&mut self, name: &str, f: F) -> Result<(), Box<dyn Error>>
    where
        F: FnOnce() + Send + 'static,
    {
        let handle = thread::Builder::new()
            .name(format!("dacsynth-{}", name))
            .spawn(f)?;
        self.threads.push(handle);
        Ok(())
    }

    /// Returns the receive buffer. Bytes written here are treated as if they arrived from the
    /// MIDI device.
    pub fn rx_buffer(&self) -> Arc<RxBuffer> {
        self.rx_buffer.clone()
    }

    /// Returns the engine counters.
    pub fn stats(&self) -> &EngineStats {
        &self.stats
    }

    /// Stops every voice at once, bypassing the control path.
    pub fn silence(&self) {
        if self.commands.send(VoiceCommand::Silence).is_err() {
            warn!("Synthesis is not running, cannot silence voices.");
        }
    }

    /// Returns true while the engine threads are running.
    pub fn is_running(&self) -> bool {
        !self.threads.is_empty()
    }

    /// Stops the engine and waits for every thread to exit. Calling it again does nothing.
    pub fn stop(&mut self) {
        if self.threads.is_empty() {
            return;
        }

        if let Some(device) = self.midi_device.take() {
            device.stop_watch_events();
        }
        self.cancel_handle.cancel();
        // Ingestion sleeps on the receive signal and won't see the cancel until it wakes.
        self.rx_buffer.wake();

        for handle in self.threads.drain(..) {
            let name = handle.thread().name().unwrap_or("unnamed").to_string();
            if handle.join().is_err() {
                error!(thread = name, "Engine thread panicked.");
            }
        }

        info!(
            samples_sent = self.stats.samples_sent(),
            stalls = self.stats.stalls(),
            dropped_control_bytes = self.stats.dropped_control_bytes(),
            overruns = self.rx_buffer.overruns(),
            "Engine stopped."
        );
    }
}

impl Drop for Engine {
    fn drop(&mut self) {
        self.stop();
    }
}
