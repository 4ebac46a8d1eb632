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

//! Reassembles the raw control byte stream into synthesizer events.
//!
//! Only channel voice messages are framed. Running status is honored, realtime bytes pass
//! through without disturbing a message in progress, and SysEx and system common messages are
//! skipped.

use midly::live::LiveEvent;
use midly::MidiMessage;
use tracing::trace;

/// Controller number for All Notes Off.
const ALL_NOTES_OFF: u8 = 123;

/// A decoded control event. Channels are zero-based.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ControlEvent {
    NoteOn { channel: u8, pitch: u8, velocity: u8 },
    NoteOff { channel: u8, pitch: u8 },
    ProgramChange { channel: u8, program: u8 },
    AllNotesOff { channel: u8 },
}

impl ControlEvent {
    /// Returns the zero-based channel the event was sent on.
    pub fn channel(&self) -> u8 {
        match *self {
            ControlEvent::NoteOn { channel, .. }
            | ControlEvent::NoteOff { channel, .. }
            | ControlEvent::ProgramChange { channel, .. }
            | ControlEvent::AllNotesOff { channel } => channel,
        }
    }
}

/// Frames one byte at a time into complete messages.
#[derive(Debug, Default)]
pub struct MidiFramer {
    message: [u8; 3],
    len: usize,
    running_status: Option<u8>,
    in_sysex: bool,
}

impl MidiFramer {
    pub fn new() -> MidiFramer {
        MidiFramer::default()
    }

    /// Feeds one byte. Returns an event when the byte completes a message the synthesizer
    /// understands.
    pub fn push(&mut self, byte: u8) -> Option<ControlEvent> {
        // Realtime bytes may appear anywhere, even between data bytes.
        if byte >= 0xF8 {
            return None;
        }

        if byte & 0x80 != 0 {
            self.len = 0;
            match byte {
                0xF0 => {
                    self.in_sysex = true;
                    self.running_status = None;
                }
                0xF1..=0xF7 => {
                    self.in_sysex = false;
                    self.running_status = None;
                }
                _ => {
                    self.in_sysex = false;
                    self.running_status = Some(byte);
                }
            }
            return None;
        }

        if self.in_sysex {
            return None;
        }

        let status = self.running_status?;
        if self.len == 0 {
            self.message[0] = status;
            self.len = 1;
        }
        self.message[self.len] = byte;
        self.len += 1;

        if self.len < 1 + data_len(status) {
            return None;
        }

        let event = decode(&self.message[..self.len]);
        self.len = 0;
        event
    }
}

/// Returns the number of data bytes that follow a channel status byte.
fn data_len(status: u8) -> usize {
    match status & 0xF0 {
        0xC0 | 0xD0 => 1,
        _ => 2,
    }
}

fn decode(message: &[u8]) -> Option<ControlEvent> {
    let event = match LiveEvent::parse(message) {
        Ok(event) => event,
        Err(e) => {
            trace!(err = format!("{:?}", e), "Unable to decode control message.");
            return None;
        }
    };

    let LiveEvent::Midi { channel, message } = event else {
        return None;
    };
    let channel = channel.as_int();

    match message {
        MidiMessage::NoteOn { key, vel } if vel.as_int() == 0 => Some(ControlEvent::NoteOff {
            channel,
            pitch: key.as_int(),
        }),
        MidiMessage::NoteOn { key, vel } => Some(ControlEvent::NoteOn {
            channel,
            pitch: key.as_int(),
            velocity: vel.as_int(),
        }),
        MidiMessage::NoteOff { key, .. } => Some(ControlEvent::NoteOff {
            channel,
            pitch: key.as_int(),
        }),
        MidiMessage::ProgramChange { program } => Some(ControlEvent::ProgramChange {
            channel,
            program: program.as_int(),
        }),
        MidiMessage::Controller { controller, .. } if controller.as_int() == ALL_NOTES_OFF => {
            Some(ControlEvent::AllNotesOff { channel })
        }
        _ => None,
    }
}
