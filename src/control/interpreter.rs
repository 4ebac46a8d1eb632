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

//! Turns control bytes into voice commands.

use std::time::Duration;

use crossbeam_channel::Sender;
use tracing::{debug, info, span, warn, Level};

use super::allocator::VoiceAllocator;
use super::framer::{ControlEvent, MidiFramer};
use crate::queue::ControlReceiver;
use crate::synth::{SynthError, Tuning, VoiceCommand, Waveform};
use crate::sync::CancelHandle;

/// How long the interpreter waits for a byte before checking for cancellation.
const RECEIVE_TIMEOUT: Duration = Duration::from_millis(10);

/// The number of MIDI channels.
const CHANNELS: usize = 16;

/// Consumes control bytes in arrival order and decides what the voices should do. It never
/// touches the voice bank directly; every change is sent to the synthesis thread as a
/// [VoiceCommand].
pub struct Interpreter {
    framer: MidiFramer,
    allocator: VoiceAllocator,
    tuning: Tuning,
    /// The waveform each channel will use for its next note.
    programs: [Waveform; CHANNELS],
    /// Zero-based channel to listen on. Listens on every channel when unset.
    channel: Option<u8>,
    commands: Sender<VoiceCommand>,
}

impl Interpreter {
    /// Creates a new interpreter.
    pub fn new(
        voices: usize,
        tuning: Tuning,
        program: Waveform,
        channel: Option<u8>,
        commands: Sender<VoiceCommand>,
    ) -> Self {
        Self {
            framer: MidiFramer::new(),
            allocator: VoiceAllocator::new(voices),
            tuning,
            programs: [program; CHANNELS],
            channel,
            commands,
        }
    }

    /// Feeds one raw control byte.
    pub fn handle_byte(&mut self, byte: u8) {
        if let Some(event) = self.framer.push(byte) {
            self.handle_event(event);
        }
    }

    /// Applies a decoded event.
    pub fn handle_event(&mut self, event: ControlEvent) {
        if self.channel.is_some_and(|channel| channel != event.channel()) {
            return;
        }

        match event {
            ControlEvent::NoteOn {
                channel,
                pitch,
                velocity,
            } => {
                if let Err(e) = self.note_on(channel, pitch, velocity) {
                    warn!(err = %e, "Rejecting note.");
                }
            }
            ControlEvent::NoteOff { channel, pitch } => {
                if let Some(slot) = self.allocator.release(channel, pitch) {
                    debug!(slot, channel, pitch, "Note off.");
                    self.send(VoiceCommand::Stop { slot });
                }
            }
            ControlEvent::ProgramChange { channel, program } => {
                let waveform = Waveform::from_program(program);
                debug!(channel, program, %waveform, "Program change.");
                self.programs[usize::from(channel) % CHANNELS] = waveform;
            }
            ControlEvent::AllNotesOff { channel } => {
                for slot in self.allocator.release_channel(channel) {
                    self.send(VoiceCommand::Stop { slot });
                }
            }
        }
    }

    /// Returns the waveform the channel's next note will use.
    pub fn program(&self, channel: u8) -> Waveform {
        self.programs[usize::from(channel) % CHANNELS]
    }

    fn note_on(&mut self, channel: u8, pitch: u8, velocity: u8) -> Result<(), SynthError> {
        // The period is checked before a slot is touched so a rejected note changes nothing.
        let period = self.tuning.period(pitch)?;
        let slot = self.allocator.allocate(channel, pitch);
        let waveform = self.program(channel);
        debug!(
            slot,
            channel,
            pitch,
            velocity,
            period = period.get(),
            %waveform,
            "Note on."
        );
        self.send(VoiceCommand::Start {
            slot,
            waveform,
            period,
        });
        Ok(())
    }

    fn send(&self, command: VoiceCommand) {
        if self.commands.send(command).is_err() {
            debug!(?command, "Voice bank owner is gone, dropping command.");
        }
    }

    /// Receives control bytes until cancelled or until the queue closes.
    pub fn run(mut self, queue: ControlReceiver, cancel_handle: CancelHandle) {
        let span = span!(Level::INFO, "interpreter");
        let _enter = span.enter();
        info!(channel = ?self.channel.map(|c| c + 1), "Interpreting control bytes.");

        while !cancel_handle.is_cancelled() {
            match queue.recv_timeout(RECEIVE_TIMEOUT) {
                Ok(Some(byte)) => self.handle_byte(byte),
                Ok(None) => {}
                Err(_) => break,
            }
        }

        info!("Interpreter stopped.");
    }
}

#[cfg(test)]
mod tests {
    use std::num::NonZeroU32;

    use crossbeam_channel::{unbounded, Receiver};

    use super::*;

    fn interpreter(voices: usize, channel: Option<u8>) -> (Interpreter, Receiver<VoiceCommand>) {
        let (tx, rx) = unbounded();
        (
            Interpreter::new(voices, Tuning::new(44_000), Waveform::Square, channel, tx),
            rx,
        )
    }

    fn feed(interpreter: &mut Interpreter, bytes: &[u8]) {
        bytes.iter().for_each(|byte| interpreter.handle_byte(*byte));
    }

    fn period(ticks: u32) -> NonZeroU32 {
        NonZeroU32::new(ticks).unwrap()
    }

    #[test]
    fn test_note_on_starts_voice() {
        let (mut interpreter, rx) = interpreter(4, None);
        feed(&mut interpreter, &[0x90, 69, 100]);

        assert_eq!(
            rx.try_recv(),
            Ok(VoiceCommand::Start {
                slot: 0,
                waveform: Waveform::Square,
                period: period(100)
            })
        );
        assert!(rx.try_recv().is_err());
    }

    #[test]
    fn test_note_off_stops_matching_voice() {
        let (mut interpreter, rx) = interpreter(4, None);
        feed(&mut interpreter, &[0x90, 69, 100, 72, 100, 0x80, 72, 0]);

        let commands: Vec<VoiceCommand> = rx.try_iter().collect();
        assert_eq!(commands.len(), 3);
        assert_eq!(commands[2], VoiceCommand::Stop { slot: 1 });
    }

    #[test]
    fn test_unmatched_note_off_is_noop() {
        let (mut interpreter, rx) = interpreter(4, None);
        feed(&mut interpreter, &[0x80, 60, 0, 0x90, 61, 0]);
        assert!(rx.try_recv().is_err());
    }

    #[test]
    fn test_program_change_applies_to_later_notes_only() {
        let (mut interpreter, rx) = interpreter(4, None);
        feed(&mut interpreter, &[0x90, 69, 100, 0xC0, 2, 0x90, 57, 100]);

        let commands: Vec<VoiceCommand> = rx.try_iter().collect();
        assert_eq!(
            commands,
            vec![
                VoiceCommand::Start {
                    slot: 0,
                    waveform: Waveform::Square,
                    period: period(100)
                },
                VoiceCommand::Start {
                    slot: 1,
                    waveform: Waveform::Triangle,
                    period: period(200)
                },
            ]
        );
        assert_eq!(interpreter.program(0), Waveform::Triangle);
        assert_eq!(interpreter.program(1), Waveform::Square);
    }

    #[test]
    fn test_zero_period_note_is_rejected() {
        let (tx, rx) = unbounded();
        let mut interpreter =
            Interpreter::new(2, Tuning::new(1_000), Waveform::Saw, None, tx);
        feed(&mut interpreter, &[0x90, 127, 100, 0x90, 60, 100]);

        // The rejected note must not have claimed a slot.
        assert_eq!(
            rx.try_iter().collect::<Vec<_>>(),
            vec![VoiceCommand::Start {
                slot: 0,
                waveform: Waveform::Saw,
                period: period(4)
            }]
        );
    }

    #[test]
    fn test_channel_filter() {
        let (mut interpreter, rx) = interpreter(4, Some(9));
        feed(&mut interpreter, &[0x90, 60, 100, 0x99, 60, 100]);

        let commands: Vec<VoiceCommand> = rx.try_iter().collect();
        assert_eq!(commands.len(), 1);
        assert!(matches!(commands[0], VoiceCommand::Start { slot: 0, .. }));
    }

    #[test]
    fn test_all_notes_off() {
        let (mut interpreter, rx) = interpreter(4, None);
        feed(&mut interpreter, &[0x90, 60, 100, 62, 100, 0x91, 64, 100, 0xB0, 123, 0]);

        let stops: Vec<VoiceCommand> = rx
            .try_iter()
            .filter(|command| matches!(command, VoiceCommand::Stop { .. }))
            .collect();
        assert_eq!(
            stops,
            vec![VoiceCommand::Stop { slot: 0 }, VoiceCommand::Stop { slot: 1 }]
        );
    }

    #[test]
    fn test_voice_stealing_reuses_oldest_slot() {
        let (mut interpreter, rx) = interpreter(2, None);
        feed(&mut interpreter, &[0x90, 60, 100, 62, 100, 64, 100, 0x80, 60, 0]);

        let commands: Vec<VoiceCommand> = rx.try_iter().collect();
        assert!(matches!(commands[2], VoiceCommand::Start { slot: 0, .. }));
        // Note 60 was stolen, so its note off finds nothing.
        assert_eq!(commands.len(), 3);
    }
}
