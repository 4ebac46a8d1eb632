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

//! Voice slot allocation.
//!
//! Handles slot assignment, stealing, and note-off matching. The allocator only tracks which
//! note owns which slot; the voices themselves live on the synthesis thread.

use tracing::{debug, warn};

/// The note that currently owns a slot.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct Assignment {
    /// The zero-based MIDI channel that triggered the note.
    channel: u8,
    /// The MIDI note number.
    pitch: u8,
    /// Trigger order, larger is more recent.
    triggered: u64,
}

impl Assignment {
    fn matches(&self, channel: u8, pitch: u8) -> bool {
        self.channel == channel && self.pitch == pitch
    }
}

/// Assigns notes to a fixed number of voice slots.
pub struct VoiceAllocator {
    slots: Vec<Option<Assignment>>,
    triggers: u64,
}

impl VoiceAllocator {
    /// Creates an allocator for the given number of slots.
    pub fn new(voices: usize) -> VoiceAllocator {
        VoiceAllocator {
            slots: vec![None; voices.max(1)],
            triggers: 0,
        }
    }

    /// Picks the slot for a new note. A slot already playing the same note is retriggered,
    /// otherwise the lowest free slot is used, otherwise the least recently triggered slot is
    /// stolen.
    pub fn allocate(&mut self, channel: u8, pitch: u8) -> usize {
        self.triggers += 1;

        let slot = if let Some(slot) = self.find(channel, pitch) {
            debug!(slot, pitch, "Retriggering voice");
            slot
        } else if let Some(slot) = self.slots.iter().position(Option::is_none) {
            slot
        } else {
            let slot = self
                .slots
                .iter()
                .enumerate()
                .filter_map(|(slot, assignment)| assignment.map(|a| (slot, a.triggered)))
                .min_by_key(|(_, triggered)| *triggered)
                .map_or(0, |(slot, _)| slot);
            warn!(
                slot,
                stolen = ?self.slots[slot],
                pitch,
                "All voices busy, stealing least recently triggered"
            );
            slot
        };

        self.slots[slot] = Some(Assignment {
            channel,
            pitch,
            triggered: self.triggers,
        });
        slot
    }

    /// Releases the slot holding the given note, if any.
    pub fn release(&mut self, channel: u8, pitch: u8) -> Option<usize> {
        let slot = self.find(channel, pitch)?;
        self.slots[slot] = None;
        Some(slot)
    }

    /// Releases every slot owned by the given channel and returns them.
    pub fn release_channel(&mut self, channel: u8) -> Vec<usize> {
        let mut released = Vec::new();
        for (slot, assignment) in self.slots.iter_mut().enumerate() {
            if assignment.is_some_and(|a| a.channel == channel) {
                *assignment = None;
                released.push(slot);
            }
        }
        released
    }

    /// Returns the number of slots currently holding a note.
    pub fn active_count(&self) -> usize {
        self.slots.iter().filter(|slot| slot.is_some()).count()
    }

    fn find(&self, channel: u8, pitch: u8) -> Option<usize> {
        self.slots
            .iter()
            .position(|slot| slot.is_some_and(|a| a.matches(channel, pitch)))
    }
}

impl std::fmt::Debug for VoiceAllocator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("VoiceAllocator")
            .field("active_voices", &self.active_count())
            .field("max_voices", &self.slots.len())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_lowest_free_slot_first() {
        let mut allocator = VoiceAllocator::new(4);
        assert_eq!(allocator.allocate(0, 60), 0);
        assert_eq!(allocator.allocate(0, 62), 1);
        assert_eq!(allocator.allocate(0, 64), 2);

        assert_eq!(allocator.release(0, 62), Some(1));
        assert_eq!(allocator.allocate(0, 67), 1);
        assert_eq!(allocator.active_count(), 3);
    }

    #[test]
    fn test_same_note_retriggers_slot() {
        let mut allocator = VoiceAllocator::new(4);
        assert_eq!(allocator.allocate(0, 60), 0);
        assert_eq!(allocator.allocate(0, 62), 1);
        assert_eq!(allocator.allocate(0, 60), 0);
        assert_eq!(allocator.active_count(), 2);

        // Same pitch on another channel is a different note.
        assert_eq!(allocator.allocate(1, 60), 2);
    }

    #[test]
    fn test_steals_least_recently_triggered() {
        let mut allocator = VoiceAllocator::new(3);
        for pitch in [60, 62, 64] {
            allocator.allocate(0, pitch);
        }
        // Retrigger slot 0 so slot 1 becomes the oldest.
        assert_eq!(allocator.allocate(0, 60), 0);

        assert_eq!(allocator.allocate(0, 65), 1);
        assert_eq!(allocator.release(0, 62), None);
        assert_eq!(allocator.release(0, 65), Some(1));
    }

    #[test]
    fn test_release_unknown_note_is_noop() {
        let mut allocator = VoiceAllocator::new(2);
        allocator.allocate(0, 60);
        assert_eq!(allocator.release(0, 61), None);
        assert_eq!(allocator.release(1, 60), None);
        assert_eq!(allocator.active_count(), 1);
    }

    #[test]
    fn test_release_channel() {
        let mut allocator = VoiceAllocator::new(4);
        allocator.allocate(0, 60);
        allocator.allocate(1, 60);
        allocator.allocate(0, 64);

        assert_eq!(allocator.release_channel(0), vec![0, 2]);
        assert_eq!(allocator.active_count(), 1);
        assert!(allocator.release_channel(5).is_empty());
    }
}
