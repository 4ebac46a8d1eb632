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

use super::voice::{Voice, VoiceBank, Waveform};

/// The largest magnitude the 12-bit DAC accepts.
pub const FULL_SCALE: u16 = 0x0FFF;

/// Peak output of a single voice: a quarter of full scale.
pub const HIGH: u16 = FULL_SCALE >> 2;

/// A 12-bit unsigned sample ready for the DAC.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Sample(u16);

impl Sample {
    pub const SILENCE: Sample = Sample(0);

    /// Creates a sample, saturating anything above full scale.
    pub fn new(value: u16) -> Sample {
        Sample(value.min(FULL_SCALE))
    }

    pub fn value(self) -> u16 {
        self.0
    }
}

impl From<Sample> for u16 {
    fn from(sample: Sample) -> u16 {
        sample.0
    }
}

/// Returns `num / den` of full scale. The multiplication is done in single precision and the
/// result truncated toward zero, never rounded.
pub fn ratio_of_full_scale(num: u32, den: NonZeroU32) -> u16 {
    let ratio = num as f32 / den.get() as f32;
    (f32::from(FULL_SCALE) * ratio) as u16
}

/// Returns the output of a waveform at the given phase, before any mixing.
///
/// Both the square and the triangle treat `phase == period / 2` as part of the first half.
pub fn level(waveform: Waveform, phase: u32, period: NonZeroU32) -> u16 {
    let half = period.get() / 2;
    match waveform {
        Waveform::Square => {
            if phase <= half {
                HIGH
            } else {
                0
            }
        }
        Waveform::Saw => ratio_of_full_scale(phase, period) >> 2,
        Waveform::Triangle => {
            if phase <= half {
                ratio_of_full_scale(phase * 2, period) >> 2
            } else {
                ratio_of_full_scale((period.get() - phase) * 2, period) >> 2
            }
        }
    }
}

/// Produces the voice's output for the current tick and advances it. Disabled voices are
/// silent and stay where they are.
pub fn synthesize(voice: &mut Voice) -> u16 {
    if !voice.is_enabled() {
        return 0;
    }
    let output = level(voice.waveform(), voice.phase(), voice.period());
    voice.advance();
    output
}

/// Sums every voice in the bank into one sample, saturating at full scale.
pub fn mixdown(bank: &mut VoiceBank) -> Sample {
    let sum: u32 = bank
        .iter_mut()
        .map(|voice| u32::from(synthesize(voice)))
        .sum();
    Sample::new(sum.min(u32::from(FULL_SCALE)) as u16)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn period(ticks: u32) -> NonZeroU32 {
        NonZeroU32::new(ticks).unwrap()
    }

    fn cycle(waveform: Waveform, ticks: u32) -> Vec<u16> {
        (0..ticks)
            .map(|phase| level(waveform, phase, period(ticks)))
            .collect()
    }

    #[test]
    fn test_ratio_truncates() {
        assert_eq!(ratio_of_full_scale(45, period(45)), 0xFFF);
        assert_eq!(ratio_of_full_scale(1, period(2)), 2047);
        assert_eq!(ratio_of_full_scale(2, period(3)), 2730);
        for den in 1..200 {
            assert_eq!(ratio_of_full_scale(0, period(den)), 0);
        }
    }

    #[test]
    fn test_square_includes_midpoint() {
        let square = cycle(Waveform::Square, 10);
        assert_eq!(&square[..6], &[HIGH; 6]);
        assert_eq!(&square[6..], &[0; 4]);

        let square = cycle(Waveform::Square, 5);
        assert_eq!(square, vec![HIGH, HIGH, HIGH, 0, 0]);
    }

    #[test]
    fn test_saw_ramps_and_resets() {
        for ticks in [2, 7, 10, 45, 100] {
            let saw = cycle(Waveform::Saw, ticks);
            assert_eq!(saw[0], 0);
            assert!(saw.windows(2).all(|pair| pair[0] <= pair[1]));
            assert!(saw[ticks as usize - 1] <= HIGH);
        }

        let saw = cycle(Waveform::Saw, 100);
        assert!(saw[99] >= HIGH - 11, "saw peaked at {}", saw[99]);
    }

    #[test]
    fn test_triangle_rises_then_falls() {
        for ticks in [4, 5, 10, 45, 101] {
            let triangle = cycle(Waveform::Triangle, ticks);
            let half = (ticks / 2) as usize;
            assert_eq!(triangle[0], 0);
            assert!(triangle[..=half].windows(2).all(|pair| pair[0] <= pair[1]));
            assert!(triangle[half + 1..].windows(2).all(|pair| pair[0] >= pair[1]));
        }

        // Even periods reach the peak exactly, long odd periods come close.
        assert_eq!(cycle(Waveform::Triangle, 10)[5], HIGH);
        assert_eq!(cycle(Waveform::Triangle, 5)[2], 819);
        assert!(cycle(Waveform::Triangle, 101)[50] >= HIGH - 11);
    }

    #[test]
    fn test_triangle_period_four() {
        // Raw ratios 0, 1/2, 1, 1/2; the midpoint is on the rising edge and hits the peak.
        assert_eq!(cycle(Waveform::Triangle, 4), vec![0, 511, HIGH, 511]);
    }

    #[test]
    fn test_synthesize_advances_enabled_voice_only() {
        let mut voice = Voice::silent();
        assert_eq!(synthesize(&mut voice), 0);
        assert_eq!(voice.phase(), 0);

        voice.start(Waveform::Triangle, period(4));
        let outputs: Vec<u16> = (0..5).map(|_| synthesize(&mut voice)).collect();
        assert_eq!(outputs, vec![0, 511, HIGH, 511, 0]);
        assert_eq!(voice.phase(), 1);
    }

    #[test]
    fn test_mixdown_sums_enabled_voices() {
        let mut bank = VoiceBank::new(4);
        bank.get_mut(0).unwrap().start(Waveform::Square, period(10));
        bank.get_mut(2).unwrap().start(Waveform::Square, period(10));
        assert_eq!(mixdown(&mut bank), Sample::new(HIGH * 2));

        for voice in bank.iter_mut() {
            voice.start(Waveform::Square, period(10));
        }
        let full = mixdown(&mut bank);
        assert_eq!(full.value(), HIGH * 4);
        assert!(full.value() <= FULL_SCALE);
    }

    #[test]
    fn test_sample_saturates() {
        assert_eq!(Sample::new(5000).value(), FULL_SCALE);
        assert_eq!(u16::from(Sample::new(12)), 12);
    }
}
