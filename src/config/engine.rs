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
use std::{path::Path, time::Duration};

use config::{Config, File, FileFormat};
use duration_string::DurationString;
use serde::Deserialize;

use super::{ConfigError, Dac, Midi, TestTone};
use crate::synth::{Waveform, MAX_VOICES};

const DEFAULT_SAMPLE_RATE: u32 = 20_000;
const DEFAULT_TRANSMIT_RATE: u32 = 20_000;
const DEFAULT_SAMPLE_QUEUE_CAPACITY: usize = 100;
const DEFAULT_CONTROL_QUEUE_CAPACITY: usize = 100;
const DEFAULT_CONTROL_ENQUEUE_TIMEOUT: Duration = Duration::from_micros(50);
const DEFAULT_RX_BUFFER_LEN: usize = 10;

/// A YAML representation of the engine configuration.
#[derive(Deserialize, Clone, Debug, Default)]
pub struct Engine {
    /// Synthesis ticks per second (default: 20000).
    sample_rate: Option<u32>,

    /// Transmission ticks per second. Must not exceed the sample rate (default: 20000).
    transmit_rate: Option<u32>,

    /// Number of voice slots, 1-4 (default: 4).
    voices: Option<usize>,

    /// Samples the synthesis thread may run ahead of transmission (default: 100).
    sample_queue_capacity: Option<usize>,

    /// Control bytes waiting for the interpreter (default: 100).
    control_queue_capacity: Option<usize>,

    /// How long ingestion waits for control queue space before dropping a byte (default: 50us).
    control_enqueue_timeout: Option<String>,

    /// Length of the receive buffer in bytes (default: 10).
    rx_buffer_len: Option<usize>,

    /// Program every channel starts on (default: 0, square).
    program: Option<u8>,

    /// MIDI input. The engine only runs its test tone when unset.
    midi: Option<Midi>,

    /// DAC output.
    dac: Option<Dac>,

    /// Tone preloaded on slot 0.
    test_tone: Option<TestTone>,
}

impl Engine {
    /// Loads and validates the configuration at the given path.
    pub fn deserialize(path: &Path) -> Result<Engine, ConfigError> {
        let engine: Engine = Config::builder()
            .add_source(File::from(path))
            .build()?
            .try_deserialize()?;
        engine.validate()?;
        Ok(engine)
    }

    /// Parses and validates a YAML document.
    pub fn from_yaml(yaml: &str) -> Result<Engine, ConfigError> {
        let engine: Engine = Config::builder()
            .add_source(File::from_str(yaml, FileFormat::Yaml))
            .build()?
            .try_deserialize()?;
        engine.validate()?;
        Ok(engine)
    }

    /// Checks every value against the limits the engine can run with.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.sample_rate() == 0 || self.transmit_rate() == 0 {
            return Err(ConfigError::Invalid(
                "sample_rate and transmit_rate must be non-zero".to_string(),
            ));
        }
        if self.transmit_rate() > self.sample_rate() {
            return Err(ConfigError::Invalid(format!(
                "transmit_rate ({}) must not exceed sample_rate ({})",
                self.transmit_rate(),
                self.sample_rate()
            )));
        }
        if !(1..=MAX_VOICES).contains(&self.voices()) {
            return Err(ConfigError::Invalid(format!(
                "voices must be between 1 and {}, got {}",
                MAX_VOICES,
                self.voices()
            )));
        }
        if self.sample_queue_capacity() == 0
            || self.control_queue_capacity() == 0
            || self.rx_buffer_len() == 0
        {
            return Err(ConfigError::Invalid(
                "queue capacities and rx_buffer_len must be non-zero".to_string(),
            ));
        }
        self.control_enqueue_timeout()?;
        if let Some(midi) = &self.midi {
            midi.validate()?;
        }
        Ok(())
    }

    pub fn sample_rate(&self) -> u32 {
        self.sample_rate.unwrap_or(DEFAULT_SAMPLE_RATE)
    }

    pub fn transmit_rate(&self) -> u32 {
        self.transmit_rate.unwrap_or(DEFAULT_TRANSMIT_RATE)
    }

    pub fn voices(&self) -> usize {
        self.voices.unwrap_or(MAX_VOICES)
    }

    pub fn sample_queue_capacity(&self) -> usize {
        self.sample_queue_capacity
            .unwrap_or(DEFAULT_SAMPLE_QUEUE_CAPACITY)
    }

    pub fn control_queue_capacity(&self) -> usize {
        self.control_queue_capacity
            .unwrap_or(DEFAULT_CONTROL_QUEUE_CAPACITY)
    }

    /// Returns the control enqueue timeout (default: 50us).
    pub fn control_enqueue_timeout(&self) -> Result<Duration, ConfigError> {
        match &self.control_enqueue_timeout {
            Some(timeout) => DurationString::from_string(timeout.clone())
                .map(Duration::from)
                .map_err(|e| {
                    ConfigError::Invalid(format!(
                        "control_enqueue_timeout {:?} is not a duration: {}",
                        timeout, e
                    ))
                }),
            None => Ok(DEFAULT_CONTROL_ENQUEUE_TIMEOUT),
        }
    }

    pub fn rx_buffer_len(&self) -> usize {
        self.rx_buffer_len.unwrap_or(DEFAULT_RX_BUFFER_LEN)
    }

    /// Returns the waveform every channel starts with.
    pub fn program(&self) -> Waveform {
        Waveform::from_program(self.program.unwrap_or_default())
    }

    pub fn midi(&self) -> Option<&Midi> {
        self.midi.as_ref()
    }

    /// Returns the DAC output path, if any.
    pub fn dac_output(&self) -> Option<&Path> {
        self.dac.as_ref().and_then(|dac| dac.output())
    }

    pub fn test_tone(&self) -> Option<&TestTone> {
        self.test_tone.as_ref()
    }
}

#[cfg(test)]
mod tests {
    use std::io::Write;
    use std::num::NonZeroU32;

    use super::*;

    #[test]
    fn test_defaults() {
        let engine = Engine::from_yaml("{}").unwrap();
        assert_eq!(engine.sample_rate(), 20_000);
        assert_eq!(engine.transmit_rate(), 20_000);
        assert_eq!(engine.voices(), 4);
        assert_eq!(engine.sample_queue_capacity(), 100);
        assert_eq!(engine.control_queue_capacity(), 100);
        assert_eq!(
            engine.control_enqueue_timeout().unwrap(),
            Duration::from_micros(50)
        );
        assert_eq!(engine.rx_buffer_len(), 10);
        assert_eq!(engine.program(), Waveform::Square);
        assert!(engine.midi().is_none());
        assert!(engine.dac_output().is_none());
        assert!(engine.test_tone().is_none());
    }

    #[test]
    fn test_full_config() {
        let yaml = r#"
            sample_rate: 44000
            transmit_rate: 22000
            voices: 3
            sample_queue_capacity: 32
            control_queue_capacity: 16
            control_enqueue_timeout: 1ms
            rx_buffer_len: 64
            program: 5
            midi:
              device: mock-keys
              channel: 10
            dac:
              output: /tmp/dac.raw
            test_tone:
              waveform: triangle
              period: 4
        "#;

        let engine = Engine::from_yaml(yaml).unwrap();
        assert_eq!(engine.sample_rate(), 44_000);
        assert_eq!(engine.transmit_rate(), 22_000);
        assert_eq!(engine.voices(), 3);
        assert_eq!(engine.sample_queue_capacity(), 32);
        assert_eq!(engine.control_queue_capacity(), 16);
        assert_eq!(
            engine.control_enqueue_timeout().unwrap(),
            Duration::from_millis(1)
        );
        assert_eq!(engine.rx_buffer_len(), 64);
        assert_eq!(engine.program(), Waveform::Triangle);

        let midi = engine.midi().unwrap();
        assert_eq!(midi.device(), "mock-keys");
        assert_eq!(midi.channel(), Some(9));

        assert_eq!(engine.dac_output(), Some(Path::new("/tmp/dac.raw")));
        assert_eq!(
            engine.test_tone(),
            Some(&TestTone::new(
                Waveform::Triangle,
                NonZeroU32::new(4).unwrap()
            ))
        );
    }

    #[test]
    fn test_transmit_rate_above_sample_rate_is_rejected() {
        let result = Engine::from_yaml("sample_rate: 1000\ntransmit_rate: 2000\n");
        assert!(matches!(result, Err(ConfigError::Invalid(_))));
    }

    #[test]
    fn test_voice_count_is_bounded() {
        assert!(matches!(
            Engine::from_yaml("voices: 0\n"),
            Err(ConfigError::Invalid(_))
        ));
        assert!(matches!(
            Engine::from_yaml("voices: 5\n"),
            Err(ConfigError::Invalid(_))
        ));
        assert!(Engine::from_yaml("voices: 1\n").is_ok());
    }

    #[test]
    fn test_bad_midi_channel_is_rejected() {
        let yaml = "midi:\n  device: mock\n  channel: 17\n";
        assert!(matches!(
            Engine::from_yaml(yaml),
            Err(ConfigError::Invalid(_))
        ));
    }

    #[test]
    fn test_bad_duration_is_rejected() {
        assert!(matches!(
            Engine::from_yaml("control_enqueue_timeout: soon\n"),
            Err(ConfigError::Invalid(_))
        ));
    }

    #[test]
    fn test_zero_test_tone_period_fails_to_parse() {
        let yaml = "test_tone:\n  period: 0\n";
        assert!(matches!(Engine::from_yaml(yaml), Err(ConfigError::Load(_))));
    }

    #[test]
    fn test_deserialize_from_file() {
        let mut file = tempfile::Builder::new().suffix(".yaml").tempfile().unwrap();
        writeln!(file, "sample_rate: 8000\ntransmit_rate: 8000\nvoices: 2").unwrap();

        let engine = Engine::deserialize(file.path()).unwrap();
        assert_eq!(engine.sample_rate(), 8000);
        assert_eq!(engine.voices(), 2);
    }

    #[test]
    fn test_missing_file_is_load_error() {
        let dir = tempfile::tempdir().unwrap();
        let result = Engine::deserialize(&dir.path().join("missing.yaml"));
        assert!(matches!(result, Err(ConfigError::Load(_))));
    }
}
