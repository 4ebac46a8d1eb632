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
use std::fs::File;
use std::io::{self, BufWriter};
use std::path::Path;

use crate::synth::{Sample, FULL_SCALE};

pub mod mock;
mod writer;

pub use writer::WriterTransport;

/// Command bits OR'd over every outgoing sample: channel A, unbuffered, 1x gain, active.
pub const DAC_COMMAND: u16 = 0x3000;

/// Errors produced while talking to the DAC.
#[derive(Debug, thiserror::Error)]
pub enum TransportError {
    #[error("DAC transport I/O error: {0}")]
    Io(#[from] io::Error),
    #[error("write attempted without slave select asserted")]
    NotSelected,
}

/// A synchronous, framed serial link to the DAC.
pub trait Transport {
    /// Asserts (`true`) or releases (`false`) the slave select line.
    fn select(&mut self, asserted: bool) -> Result<(), TransportError>;

    /// Shifts the given bytes out in order.
    fn write(&mut self, bytes: &[u8]) -> Result<(), TransportError>;

    /// Pushes out anything the transport buffered.
    fn flush(&mut self) -> Result<(), TransportError> {
        Ok(())
    }
}

impl<T: Transport + ?Sized> Transport for Box<T> {
    fn select(&mut self, asserted: bool) -> Result<(), TransportError> {
        (**self).select(asserted)
    }

    fn write(&mut self, bytes: &[u8]) -> Result<(), TransportError> {
        (**self).write(bytes)
    }

    fn flush(&mut self) -> Result<(), TransportError> {
        (**self).flush()
    }
}

/// Packs a sample into the DAC's 16-bit command word, most significant byte first.
pub fn pack(sample: Sample) -> [u8; 2] {
    (DAC_COMMAND | (sample.value() & FULL_SCALE)).to_be_bytes()
}

/// Sends one sample as a single framed two-byte transfer. Slave select is always released,
/// even if the write fails.
pub fn transmit<T: Transport + ?Sized>(
    transport: &mut T,
    sample: Sample,
) -> Result<(), TransportError> {
    let word = pack(sample);
    transport.select(true)?;
    let written = transport.write(&word);
    transport.select(false)?;
    written
}

/// Opens a transport that writes packed words to the given file, or discards them when no
/// output is configured.
pub fn get_transport(output: Option<&Path>) -> Result<Box<dyn Transport + Send>, TransportError> {
    Ok(match output {
        Some(path) => Box::new(WriterTransport::new(BufWriter::new(File::create(path)?))),
        None => Box::new(WriterTransport::new(io::sink())),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_pack_is_big_endian_with_command_bits() {
        assert_eq!(pack(Sample::new(0)), [0x30, 0x00]);
        assert_eq!(pack(Sample::new(0x0FFF)), [0x3F, 0xFF]);
        assert_eq!(pack(Sample::new(0x0123)), [0x31, 0x23]);
        assert_eq!(pack(Sample::new(1023)), [0x33, 0xFF]);
    }

    #[test]
    fn test_transmit_brackets_each_word() {
        let mut transport = mock::Transport::new();
        transmit(&mut transport, Sample::new(0x0ABC)).unwrap();
        transmit(&mut transport, Sample::new(1)).unwrap();

        assert_eq!(transport.words(), vec![0x3ABC, 0x3001]);
        assert_eq!(transport.select_edges(), vec![true, false, true, false]);
    }

    #[test]
    fn test_transmit_releases_select_on_failure() {
        let mut transport = mock::Transport::new();
        transport.fail_writes(true);
        assert!(transmit(&mut transport, Sample::new(5)).is_err());
        assert_eq!(transport.select_edges(), vec![true, false]);
        assert!(transport.words().is_empty());
    }
}
