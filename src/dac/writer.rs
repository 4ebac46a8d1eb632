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
use std::io::Write;

use super::TransportError;

/// Writes every transferred byte to an [std::io::Write], e.g. a capture file.
pub struct WriterTransport<W: Write> {
    writer: W,
    selected: bool,
}

impl<W: Write> WriterTransport<W> {
    pub fn new(writer: W) -> Self {
        Self {
            writer,
            selected: false,
        }
    }

    /// Returns the underlying writer.
    pub fn into_inner(self) -> W {
        self.writer
    }
}

impl<W: Write> super::Transport for WriterTransport<W> {
    fn select(&mut self, asserted: bool) -> Result<(), TransportError> {
        self.selected = asserted;
        Ok(())
    }

    fn write(&mut self, bytes: &[u8]) -> Result<(), TransportError> {
        if !self.selected {
            return Err(TransportError::NotSelected);
        }
        self.writer.write_all(bytes)?;
        Ok(())
    }

    fn flush(&mut self) -> Result<(), TransportError> {
        self.writer.flush()?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dac::{transmit, Transport};
    use crate::synth::Sample;

    #[test]
    fn test_writes_packed_words() {
        let mut transport = WriterTransport::new(Vec::new());
        transmit(&mut transport, Sample::new(0x0800)).unwrap();
        transmit(&mut transport, Sample::new(0x0001)).unwrap();
        assert_eq!(transport.into_inner(), vec![0x38, 0x00, 0x30, 0x01]);
    }

    #[test]
    fn test_file_output() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("dac.raw");

        let mut transport = crate::dac::get_transport(Some(path.as_path())).unwrap();
        transmit(&mut transport, Sample::new(0x0123)).unwrap();
        transport.flush().unwrap();

        assert_eq!(std::fs::read(&path).unwrap(), vec![0x31, 0x23]);
    }

    #[test]
    fn test_write_requires_select() {
        let mut transport = WriterTransport::new(Vec::new());
        assert!(matches!(
            transport.write(&[1, 2]),
            Err(TransportError::NotSelected)
        ));
    }
}
