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

//! The control path, from received MIDI bytes to voice commands.
//!
//! Bytes land in the receive buffer, which raises a wake signal. The ingestor drains the
//! buffer into the control queue, and the interpreter frames the bytes into events and turns
//! them into voice commands for the synthesis thread.

mod allocator;
mod framer;
mod ingest;
mod interpreter;
mod receive;

pub use allocator::VoiceAllocator;
pub use framer::{ControlEvent, MidiFramer};
pub use ingest::Ingestor;
pub use interpreter::Interpreter;
pub use receive::RxBuffer;
