//! Snapshot of every curve at one point in time.

use crate::clip::CHANNELS;

/// Values an animated MIDI component exposes, as sampled by [`CurveSet::sample`].
///
/// [`CurveSet::sample`]: ../clip/struct.CurveSet.html#method.sample
#[derive(Debug, Clone, PartialEq)]
pub struct MidiState {
    pub beat_count: f32,
    pub beat_clock: f32,
    pub bar_count: f32,
    pub bar_clock: f32,
    pub note: [f32; CHANNELS],
    pub cc: [f32; CHANNELS],
}

impl Default for MidiState {
    fn default() -> Self {
        MidiState {
            beat_count: 0.0,
            beat_clock: 0.0,
            bar_count: 0.0,
            bar_clock: 0.0,
            note: [0.0; CHANNELS],
            cc: [0.0; CHANNELS],
        }
    }
}

impl MidiState {
    /// Notes currently above zero.
    pub fn active_notes(&self) -> impl Iterator<Item = u8> + '_ {
        self.note
            .iter()
            .enumerate()
            .filter(|(_, value)| **value > 0.0)
            .map(|(index, _)| index as u8)
    }
}
