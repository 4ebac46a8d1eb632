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

//! A note-driven synthesizer core. MIDI bytes come in, up to four voices of square, saw or
//! triangle waves are mixed, and 12-bit samples go out to a SPI DAC at a fixed rate.

pub mod config;
pub mod control;
pub mod dac;
pub mod engine;
pub mod midi;
pub mod queue;
pub mod synth;
pub mod sync;
#[cfg(test)]
mod testutil;
