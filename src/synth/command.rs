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

use super::voice::{VoiceBank, Waveform};

/// A change to the voice bank, sent by the interpreter to the thread that owns the bank.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VoiceCommand {
    /// Starts the voice in the given slot from phase zero.
    Start {
        slot: usize,
        waveform: Waveform,
        period: NonZeroU32,
    },
    /// Stops the voice in the given slot.
    Stop { slot: usize },
    /// Stops every voice.
    Silence,
}

impl VoiceCommand {
    /// Applies the command to the bank. Returns false if the slot does not exist.
    pub fn apply(self, bank: &mut VoiceBank) -> bool {
        match self {
            VoiceCommand::Start {
                slot,
                waveform,
                period,
            } => match bank.get_mut(slot) {
                Some(voice) => {
                    voice.start(waveform, period);
                    true
                }
                None => false,
            },
            VoiceCommand::Stop { slot } => match bank.get_mut(slot) {
                Some(voice) => {
                    voice.stop();
                    true
                }
                None => false,
            },
            VoiceCommand::Silence => {
                bank.iter_mut().for_each(|voice| voice.stop());
                true
            }
        }
    }
}
