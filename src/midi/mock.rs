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
use std::{error::Error, fmt, sync::Arc};

use parking_lot::Mutex;
use tracing::{debug, info};

use crate::control::RxBuffer;

/// A mock device. Bytes handed to [Device::mock_event] arrive as if they came off the wire.
#[derive(Clone)]
pub struct Device {
    name: String,
    rx_buffer: Arc<Mutex<Option<Arc<RxBuffer>>>>,
}

impl Device {
    /// Gets the given mock device.
    pub fn get(name: &str) -> Device {
        Device {
            name: name.to_string(),
            rx_buffer: Arc::new(Mutex::new(None)),
        }
    }

    /// Delivers the bytes to the watcher. Returns how many bytes the receive buffer accepted,
    /// or zero when nothing is watching.
    pub fn mock_event(&self, bytes: &[u8]) -> usize {
        match self.rx_buffer.lock().as_ref() {
            Some(rx_buffer) => rx_buffer.receive(bytes),
            None => {
                debug!(device = self.name, "Not watching, dropping mock event.");
                0
            }
        }
    }

    /// Returns true while events are being watched.
    pub fn is_watching(&self) -> bool {
        self.rx_buffer.lock().is_some()
    }
}

impl super::Device for Device {
    fn name(&self) -> String {
        self.name.clone()
    }

    /// Watches MIDI input for events and sends them to the receive buffer.
    fn watch_events(&self, rx_buffer: Arc<RxBuffer>) -> Result<(), Box<dyn Error>> {
        let mut watcher = self.rx_buffer.lock();
        if watcher.is_some() {
            return Err("Already watching events.".into());
        }
        info!(device = self.name, "Watching mock MIDI events.");
        *watcher = Some(rx_buffer);
        Ok(())
    }

    /// Stops watching events.
    fn stop_watch_events(&self) {
        self.rx_buffer.lock().take();
    }
}

impl fmt::Display for Device {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} (Mock)", self.name,)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::midi::Device as _;

    #[test]
    fn test_mock_event_reaches_rx_buffer() {
        let device = Device::get("mock-keys");
        let rx_buffer = Arc::new(RxBuffer::new(10));

        assert_eq!(device.mock_event(&[0x90, 60, 100]), 0);

        device.watch_events(rx_buffer.clone()).unwrap();
        assert!(device.is_watching());
        assert!(device.watch_events(rx_buffer.clone()).is_err());

        assert_eq!(device.mock_event(&[0x90, 60, 100]), 3);
        assert_eq!(rx_buffer.len(), 3);

        device.stop_watch_events();
        assert!(!device.is_watching());
        assert_eq!(device.mock_event(&[0x80, 60, 0]), 0);
        assert_eq!(rx_buffer.len(), 3);
    }

    #[test]
    fn test_get_device_returns_mock() {
        let device = crate::midi::get_device("mock-device").unwrap();
        assert_eq!(device.name(), "mock-device");
        assert_eq!(device.to_string(), "mock-device (Mock)");
    }
}
