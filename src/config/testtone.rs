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
use std::num::NonZeroU32;

use serde::Deserialize;

use crate::synth::{VoiceCommand, Waveform};

/// A tone that sounds on slot 0 from the moment the engine starts, until a note claims it.
#[derive(Deserialize, Clone, Copy, Debug, PartialEq, Eq)]
pub struct TestTone {
    /// Defaults to square.
    #[serde(default)]
    waveform: Waveform,

    /// The period in synthesis ticks. Zero is rejected while parsing.
    period: NonZeroU32,
}

impl TestTone {
    pub fn new(waveform: Waveform, period: NonZeroU32) -> TestTone {
        TestTone { waveform, period }
    }

    pub fn waveform(&self) -> Waveform {
        self.waveform
    }

    pub fn period(&self) -> NonZeroU32 {
        self.period
    }

    /// The command that starts this tone.
    pub fn command(&self) -> VoiceCommand {
        VoiceCommand::Start {
            slot: 0,
            waveform: self.waveform,
            period: self.period,
        }
    }
}
