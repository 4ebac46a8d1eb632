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
use std::fmt;
use std::num::NonZeroU32;

use serde::Deserialize;

/// The number of voice slots the bank can hold. Each voice peaks at a quarter of
/// full scale, so four voices can never overflow the DAC range.
pub const MAX_VOICES: usize = 4;

/// The shape a voice generates.
#[derive(Deserialize, Clone, Copy, Debug, Default, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum Waveform {
    #[default]
    Square,
    Saw,
    Triangle,
}

impl Waveform {
    /// Maps a MIDI program number onto a waveform. Programs wrap every three numbers.
    pub fn from_program(program: u8) -> Waveform {
        match program % 3 {
            0 => Waveform::Square,
            1 => Waveform::Saw,
            _ => Waveform::Triangle,
        }
    }
}

impl fmt::Display for Waveform {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Waveform::Square => "square",
            Waveform::Saw => "saw",
            Waveform::Triangle => "triangle",
        };
        write!(f, "{}", name)
    }
}

/// One synthesis channel.
///
/// While enabled, `phase` always satisfies `phase < period` between ticks. The period is
/// non-zero by construction, so a voice can never be started with an undefined pitch.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Voice {
    enabled: bool,
    waveform: Waveform,
    phase: u32,
    period: NonZeroU32,
}

impl Voice {
    /// Creates a disabled voice.
    pub const fn silent() -> Voice {
        Voice {
            enabled: false,
            waveform: Waveform::Square,
            phase: 0,
            period: NonZeroU32::MIN,
        }
    }

    /// Starts the voice from the beginning of its cycle.
    pub fn start(&mut self, waveform: Waveform, period: NonZeroU32) {
        self.enabled = true;
        self.waveform = waveform;
        self.period = period;
        self.phase = 0;
    }

    /// Stops the voice. Its phase is left where it was.
    pub fn stop(&mut self) {
        self.enabled = false;
    }

    pub fn is_enabled(&self) -> bool {
        self.enabled
    }

    pub fn waveform(&self) -> Waveform {
        self.waveform
    }

    pub fn phase(&self) -> u32 {
        self.phase
    }

    pub fn period(&self) -> NonZeroU32 {
        self.period
    }

    /// Moves the voice one tick forward, wrapping to zero when the period is reached.
    pub(crate) fn advance(&mut self) {
        if !self.enabled {
            return;
        }
        self.phase += 1;
        if self.phase >= self.period.get() {
            self.phase = 0;
        }
    }
}

impl Default for Voice {
    fn default() -> Self {
        Voice::silent()
    }
}

/// An ordered, fixed-capacity set of voice slots.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct VoiceBank {
    voices: Vec<Voice>,
}

impl VoiceBank {
    /// Creates a bank with the given number of silent voices, limited to 1..=MAX_VOICES.
    pub fn new(voices: usize) -> VoiceBank {
        VoiceBank {
            voices: vec![Voice::silent(); voices.clamp(1, MAX_VOICES)],
        }
    }

    pub fn len(&self) -> usize {
        self.voices.len()
    }

    pub fn is_empty(&self) -> bool {
        self.voices.is_empty()
    }

    pub fn get(&self, slot: usize) -> Option<&Voice> {
        self.voices.get(slot)
    }

    pub fn get_mut(&mut self, slot: usize) -> Option<&mut Voice> {
        self.voices.get_mut(slot)
    }

    pub fn iter(&self) -> impl Iterator<Item = &Voice> {
        self.voices.iter()
    }

    pub fn iter_mut(&mut self) -> impl Iterator<Item = &mut Voice> {
        self.voices.iter_mut()
    }

    /// Returns the number of voices currently sounding.
    pub fn enabled_count(&self) -> usize {
        self.voices.iter().filter(|voice| voice.is_enabled()).count()
    }
}
