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
use std::io;
use std::sync::Arc;

use parking_lot::Mutex;

use super::TransportError;

#[derive(Default)]
struct Recording {
    selected: bool,
    fail_writes: bool,
    select_edges: Vec<bool>,
    frames: Vec<Vec<u8>>,
}

/// A mock transport. Records every framed transfer instead of driving a bus. Clones share the
/// same recording, so a clone can be inspected after the transport moves to another thread.
#[derive(Clone, Default)]
pub struct Transport {
    recording: Arc<Mutex<Recording>>,
}

impl Transport {
    pub fn new() -> Transport {
        Transport::default()
    }

    /// Makes every following write fail with an I/O error.
    pub fn fail_writes(&self, fail: bool) {
        self.recording.lock().fail_writes = fail;
    }

    /// Returns the bytes of each completed transfer.
    pub fn frames(&self) -> Vec<Vec<u8>> {
        self.recording.lock().frames.clone()
    }

    /// Returns each transfer reassembled as a big-endian 16-bit word.
    pub fn words(&self) -> Vec<u16> {
        self.recording
            .lock()
            .frames
            .iter()
            .filter(|frame| frame.len() == 2)
            .map(|frame| u16::from_be_bytes([frame[0], frame[1]]))
            .collect()
    }

    /// Returns the slave select transitions in the order they happened.
    pub fn select_edges(&self) -> Vec<bool> {
        self.recording.lock().select_edges.clone()
    }
}

impl super::Transport for Transport {
    fn select(&mut self, asserted: bool) -> Result<(), TransportError> {
        let mut recording = self.recording.lock();
        recording.selected = asserted;
        recording.select_edges.push(asserted);
        Ok(())
    }

    fn write(&mut self, bytes: &[u8]) -> Result<(), TransportError> {
        let mut recording = self.recording.lock();
        if !recording.selected {
            return Err(TransportError::NotSelected);
        }
        if recording.fail_writes {
            return Err(io::Error::new(io::ErrorKind::BrokenPipe, "mock write failure").into());
        }
        recording.frames.push(bytes.to_vec());
        Ok(())
    }
}
