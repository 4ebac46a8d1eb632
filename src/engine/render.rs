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
use std::{error::Error, fs, path::Path};

use midly::{live::LiveEvent, MetaMessage, Smf, Timing, TrackEventKind};
use tracing::{info, span, Level};

use super::{EngineStats, Parts};
use crate::config;
use crate::dac::Transport;

/// Microseconds per quarter note until a tempo event says otherwise (120 BPM).
const DEFAULT_TEMPO: u32 = 500_000;

/// Raw control bytes that arrive just before the given synthesis tick.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TimedBytes {
    pub tick: u64,
    pub bytes: Vec<u8>,
}

impl TimedBytes {
    pub fn new(tick: u64, bytes: &[u8]) -> TimedBytes {
        TimedBytes {
            tick,
            bytes: bytes.to_vec(),
        }
    }
}

/// Runs the engine for `ticks` synthesis ticks on the calling thread, as fast as possible.
///
/// Every component runs exactly as it does in a live engine, but in lockstep: control bytes
/// due at a tick are received, ingested and interpreted, then the synthesis tick runs, then
/// the transmission ticks that fall on it. Transmission ticks are spread over synthesis ticks
/// by the ratio of the two rates.
pub fn render<T: Transport>(
    config: &config::Engine,
    events: &[TimedBytes],
    ticks: u64,
    transport: T,
) -> Result<(EngineStats, T), Box<dyn Error>> {
    let span = span!(Level::INFO, "render");
    let _enter = span.enter();

    config.validate()?;
    let mut parts = Parts::build(config, transport)?;

    let mut events: Vec<&TimedBytes> = events.iter().collect();
    events.sort_by_key(|event| event.tick);
    let mut events = events.into_iter().peekable();

    let sample_rate = u64::from(config.sample_rate());
    let transmit_rate = u64::from(config.transmit_rate());
    let mut transmit_error = 0u64;

    for tick in 0..ticks {
        while let Some(event) = events.next_if(|event| event.tick <= tick) {
            parts.rx_buffer.receive(&event.bytes);
            parts.ingestor.drain();
            while let Ok(Some(byte)) = parts.control.try_recv() {
                parts.interpreter.handle_byte(byte);
            }
        }

        parts.synthesis.tick();

        transmit_error += transmit_rate;
        if transmit_error >= sample_rate {
            transmit_error -= sample_rate;
            parts.transmission.tick();
        }
    }

    info!(
        ticks,
        samples_sent = parts.stats.samples_sent(),
        stalls = parts.stats.stalls(),
        "Rendered."
    );
    Ok((parts.stats, parts.transmission.into_transport()))
}

/// Reads a standard MIDI file and schedules its channel messages in synthesis ticks. Tracks
/// are merged, tempo changes are honored and meta or SysEx events are skipped.
pub fn midi_file_events(path: &Path, sample_rate: u32) -> Result<Vec<TimedBytes>, Box<dyn Error>> {
    let data = fs::read(path)?;
    let smf = Smf::parse(&data)?;

    let mut merged = Vec::new();
    for track in smf.tracks.iter() {
        let mut midi_tick = 0u64;
        for event in track.iter() {
            midi_tick += u64::from(event.delta.as_int());
            merged.push((midi_tick, event.kind));
        }
    }
    // Stable, so simultaneous events keep their track order.
    merged.sort_by_key(|(midi_tick, _)| *midi_tick);

    let micros_per_midi_tick = |tempo: u32| -> f64 {
        match smf.header.timing {
            Timing::Metrical(ticks_per_beat) => {
                f64::from(tempo) / f64::from(ticks_per_beat.as_int().max(1))
            }
            Timing::Timecode(fps, subframes) => {
                1_000_000.0 / (f64::from(fps.as_f32()) * f64::from(subframes.max(1)))
            }
        }
    };

    let mut tempo = DEFAULT_TEMPO;
    let mut last_midi_tick = 0u64;
    let mut elapsed_micros = 0f64;
    let mut events = Vec::new();
    for (midi_tick, kind) in merged {
        elapsed_micros += (midi_tick - last_midi_tick) as f64 * micros_per_midi_tick(tempo);
        last_midi_tick = midi_tick;

        match kind {
            TrackEventKind::Meta(MetaMessage::Tempo(new_tempo)) => tempo = new_tempo.as_int(),
            TrackEventKind::Midi { channel, message } => {
                let mut bytes = Vec::with_capacity(3);
                LiveEvent::Midi { channel, message }.write(&mut bytes)?;
                let tick = (elapsed_micros * f64::from(sample_rate) / 1_000_000.0).round() as u64;
                events.push(TimedBytes { tick, bytes });
            }
            _ => {}
        }
    }

    Ok(events)
}

#[cfg(test)]
mod tests {
    use midly::{
        num::{u15, u24, u28, u4, u7},
        Format, Header, MidiMessage, Track, TrackEvent,
    };

    use super::*;
    use crate::dac::mock;
    use crate::synth::HIGH;

    fn words(values: &[u16]) -> Vec<u16> {
        values.iter().map(|value| 0x3000 | value).collect()
    }

    #[test]
    fn test_render_triangle_test_tone() {
        let config = config::Engine::from_yaml(
            r#"
            voices: 1
            test_tone:
              waveform: triangle
              period: 4
        "#,
        )
        .unwrap();

        let (stats, transport) = render(&config, &[], 5, mock::Transport::new()).unwrap();
        assert_eq!(transport.words(), words(&[0, 511, HIGH, 511, 0]));
        assert_eq!(stats.samples_sent(), 5);
        assert_eq!(stats.stalls(), 0);
    }

    #[test]
    fn test_render_plays_timed_notes() {
        let config = config::Engine::from_yaml("sample_rate: 44000\ntransmit_rate: 44000\n").unwrap();
        let events = vec![
            TimedBytes::new(2, &[0x90, 69, 100]),
            TimedBytes::new(5, &[0x80, 69, 0]),
        ];

        let (_, transport) = render(&config, &events, 7, mock::Transport::new()).unwrap();
        // Period 100 square: high for the first half of the cycle.
        assert_eq!(
            transport.words(),
            words(&[0, 0, HIGH, HIGH, HIGH, 0, 0])
        );
    }

    #[test]
    fn test_render_slow_transmission_backs_up() {
        let config = config::Engine::from_yaml(
            r#"
            sample_rate: 1000
            transmit_rate: 500
            sample_queue_capacity: 2
        "#,
        )
        .unwrap();

        let (stats, transport) = render(&config, &[], 10, mock::Transport::new()).unwrap();
        assert_eq!(transport.words().len(), 5);
        assert_eq!(stats.samples_sent(), 5);
        assert!(stats.stalls() > 0);
    }

    #[test]
    fn test_midi_file_events() {
        let header = Header::new(Format::SingleTrack, Timing::Metrical(u15::new(100)));
        let mut track: Track = Vec::new();
        track.push(TrackEvent {
            delta: u28::new(0),
            kind: TrackEventKind::Meta(MetaMessage::Tempo(u24::new(1_000_000))),
        });
        track.push(TrackEvent {
            delta: u28::new(50),
            kind: TrackEventKind::Midi {
                channel: u4::new(0),
                message: MidiMessage::NoteOn {
                    key: u7::new(69),
                    vel: u7::new(100),
                },
            },
        });
        track.push(TrackEvent {
            delta: u28::new(100),
            kind: TrackEventKind::Midi {
                channel: u4::new(0),
                message: MidiMessage::NoteOff {
                    key: u7::new(69),
                    vel: u7::new(0),
                },
            },
        });
        track.push(TrackEvent {
            delta: u28::new(0),
            kind: TrackEventKind::Meta(MetaMessage::EndOfTrack),
        });

        let smf = Smf {
            header,
            tracks: vec![track],
        };
        let file = tempfile::Builder::new().suffix(".mid").tempfile().unwrap();
        smf.save(file.path()).unwrap();

        // One second per beat, 100 MIDI ticks per beat, 1000 synthesis ticks per second.
        let events = midi_file_events(file.path(), 1000).unwrap();
        assert_eq!(
            events,
            vec![
                TimedBytes::new(500, &[0x90, 69, 100]),
                TimedBytes::new(1500, &[0x80, 69, 0]),
            ]
        );
    }
}
