//! Pull-based playback of a single track.

use crate::smf::Track;
use crate::MidiEvent;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum State {
    NotStarted,
    Playing,
    Finished,
}

/// Converts elapsed seconds into elapsed pulses and yields the events crossed on the way.
///
/// Both [`start`] and [`advance`] return events. Every event whose position is crossed by a
/// call is returned by that call, so coarse time steps never split or drop a batch.
///
/// [`start`]: #method.start
/// [`advance`]: #method.advance
#[derive(Debug, Clone)]
pub struct Sequencer<'a> {
    track: &'a Track,
    cursor: usize,
    pulses_per_second: f64,
    pulse_counter: f64,
    pulse_to_next: f64,
    state: State,
}

impl<'a> Sequencer<'a> {
    /// `division` is the file's pulses per quarter note.
    pub fn new(track: &'a Track, division: u16, bpm: f32) -> Self {
        Sequencer {
            track,
            cursor: 0,
            pulses_per_second: bpm as f64 / 60.0 * division as f64,
            pulse_counter: 0.0,
            pulse_to_next: 0.0,
            state: State::NotStarted,
        }
    }

    pub fn pulses_per_second(&self) -> f64 {
        self.pulses_per_second
    }

    pub fn is_playing(&self) -> bool {
        self.state == State::Playing
    }

    pub fn is_finished(&self) -> bool {
        self.state == State::Finished
    }

    /// Starts playback and returns the events found within `offset` seconds of the beginning.
    ///
    /// An empty track finishes immediately. Calling this twice returns nothing the second time.
    pub fn start(&mut self, offset: f64) -> Vec<MidiEvent> {
        if self.state != State::NotStarted {
            return Vec::new();
        }

        match self.track.get(0) {
            Some(first) => {
                self.pulse_to_next = first.delta as f64;
                self.state = State::Playing;
                self.advance(offset)
            }
            None => {
                self.state = State::Finished;
                Vec::new()
            }
        }
    }

    /// Moves the position forward by `delta_time` seconds.
    ///
    /// Does nothing unless playing.
    pub fn advance(&mut self, delta_time: f64) -> Vec<MidiEvent> {
        self.advance_pulses(self.pulses_per_second * delta_time)
    }

    /// Moves the position forward by a number of pulses.
    ///
    /// Whole pulse counts stay exact, so stepping one pulse at a time never falls behind the
    /// event positions.
    pub fn advance_pulses(&mut self, pulses: f64) -> Vec<MidiEvent> {
        let mut events = Vec::new();
        if self.state != State::Playing {
            return events;
        }

        self.pulse_counter += pulses;

        while self.pulse_counter >= self.pulse_to_next {
            events.push(self.track[self.cursor].event);
            self.cursor += 1;

            let next = match self.track.get(self.cursor) {
                Some(next) => next,
                None => {
                    self.state = State::Finished;
                    break;
                }
            };

            self.pulse_counter -= self.pulse_to_next;
            self.pulse_to_next = next.delta as f64;
        }

        events
    }
}
