//! Owned `SMF` container.

use crate::read::{self, Reader};
use crate::{MidiEvent, Result};
use core::ops::Index;

/// Channel message with its delta time in pulses since the previous one in the track.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TrackEvent {
    pub delta: u32,
    pub event: MidiEvent,
}

/// `MTrk` chunk.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Track {
    events: Vec<TrackEvent>,
}

impl Track {
    pub fn new(events: Vec<TrackEvent>) -> Self {
        Track { events }
    }

    pub fn len(&self) -> usize {
        self.events.len()
    }

    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }

    pub fn get(&self, index: usize) -> Option<&TrackEvent> {
        self.events.get(index)
    }

    pub fn iter(&self) -> core::slice::Iter<'_, TrackEvent> {
        self.events.iter()
    }

    /// Total length in pulses.
    pub fn duration(&self) -> u64 {
        self.events.iter().map(|pair| pair.delta as u64).sum()
    }
}

impl Index<usize> for Track {
    type Output = TrackEvent;

    fn index(&self, index: usize) -> &TrackEvent {
        &self.events[index]
    }
}

impl<'a> IntoIterator for &'a Track {
    type Item = &'a TrackEvent;
    type IntoIter = core::slice::Iter<'a, TrackEvent>;

    fn into_iter(self) -> Self::IntoIter {
        self.events.iter()
    }
}

/// Standard Midi File.
#[derive(Debug, Clone, PartialEq)]
pub struct Smf {
    pub format: u16,
    pub tracks: Vec<Track>,
    /// Pulses per quarter note.
    pub division: u16,
}

impl Smf {
    /// Parses a whole file. Nothing is returned unless every chunk decodes.
    pub fn read_bytes(data: &[u8]) -> Result<Self> {
        let mut reader = Reader::new(data);
        let header = read::read_header(&mut reader)?;
        let mut tracks = Vec::with_capacity(header.tracks as usize);
        for _ in 0..header.tracks {
            tracks.push(read::read_track(&mut reader)?);
        }

        let smf = Smf {
            format: header.format,
            tracks,
            division: header.division,
        };

        Ok(smf)
    }

    pub fn track(&self, index: usize) -> Option<&Track> {
        self.tracks.get(index)
    }
}
