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

use super::error::SynthError;

/// Equal temperament tuning with A4 (note 69) at 440 Hz.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Tuning {
    sample_rate: u32,
}

impl Tuning {
    pub fn new(sample_rate: u32) -> Tuning {
        Tuning { sample_rate }
    }

    /// Converts a MIDI note number to its frequency in Hz.
    pub fn frequency(pitch: u8) -> f64 {
        440.0 * 2.0_f64.powf((f64::from(pitch) - 69.0) / 12.0)
    }

    /// Returns the number of ticks per cycle for the given note. Notes too high for the
    /// sample rate round to a zero period and are rejected.
    pub fn period(&self, pitch: u8) -> Result<NonZeroU32, SynthError> {
        let ticks = (f64::from(self.sample_rate) / Tuning::frequency(pitch)).round();
        NonZeroU32::new(ticks as u32).ok_or(SynthError::InvalidPeriod {
            pitch,
            sample_rate: self.sample_rate,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_a440() {
        let tuning = Tuning::new(44_000);
        assert_eq!(tuning.period(69).unwrap().get(), 100);
        assert_eq!(tuning.period(57).unwrap().get(), 200);
    }

    #[test]
    fn test_period_never_increases_with_pitch() {
        let tuning = Tuning::new(20_000);
        let periods: Vec<u32> = (0..=127)
            .map(|pitch| tuning.period(pitch).unwrap().get())
            .collect();
        assert!(periods.windows(2).all(|pair| pair[0] >= pair[1]));
        assert!(periods[0] > periods[127]);
    }

    #[test]
    fn test_zero_period_rejected() {
        let tuning = Tuning::new(1_000);
        assert_eq!(
            tuning.period(127),
            Err(SynthError::InvalidPeriod {
                pitch: 127,
                sample_rate: 1_000
            })
        );
        assert!(tuning.period(60).is_ok());
    }
}
