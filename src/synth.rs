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

//! Voice state and per-tick waveform synthesis.
//!
//! This module provides:
//! - The voice bank that the synthesis thread owns exclusively
//! - The square/saw/triangle generators with their truncating full-scale ratio
//! - The commands other threads use to change voices
//! - Pitch to period tuning

mod command;
mod error;
mod tuning;
mod voice;
mod waveform;

pub use command::VoiceCommand;
pub use error::SynthError;
pub use tuning::Tuning;
pub use voice::{Voice, VoiceBank, Waveform, MAX_VOICES};
pub use waveform::{level, mixdown, ratio_of_full_scale, synthesize, Sample, FULL_SCALE, HIGH};
