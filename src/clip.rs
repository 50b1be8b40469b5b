//! Curve building from sequencer output.

use crate::curve::{Curve, TangentMode};
use crate::easing::Envelope;
use crate::state::MidiState;
use crate::{MidiEvent, MidiEventKind};
use core::fmt;
use serde::ser::{Serialize, SerializeMap, Serializer};

/// Number of note and controller slots.
pub const CHANNELS: usize = 128;

/// Name of one output curve.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CurveName {
    BeatCount,
    BeatClock,
    BarCount,
    BarClock,
    Note(u8),
    Cc(u8),
}

impl fmt::Display for CurveName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CurveName::BeatCount => f.write_str("BeatCount"),
            CurveName::BeatClock => f.write_str("BeatClock"),
            CurveName::BarCount => f.write_str("BarCount"),
            CurveName::BarClock => f.write_str("BarClock"),
            CurveName::Note(index) => write!(f, "Note[{}]", index),
            CurveName::Cc(index) => write!(f, "CC[{}]", index),
        }
    }
}

fn empty_slots() -> Box<[Option<Curve>; CHANNELS]> {
    Box::new(core::array::from_fn(|_| None))
}

/// Counts hold their value until the next key.
fn count_tangents(_: f32) -> (TangentMode, TangentMode) {
    (TangentMode::Constant, TangentMode::Constant)
}

/// Clocks ramp up towards a high key, then drop back to zero.
fn clock_tangents(value: f32) -> (TangentMode, TangentMode) {
    if value < 0.5 {
        (TangentMode::Constant, TangentMode::Linear)
    } else {
        (TangentMode::Linear, TangentMode::Constant)
    }
}

/// Notes jump up on a high key, then ramp towards the following release.
fn note_tangents(value: f32) -> (TangentMode, TangentMode) {
    if value < 0.5 {
        (TangentMode::Linear, TangentMode::Constant)
    } else {
        (TangentMode::Constant, TangentMode::Linear)
    }
}

fn cc_tangents(_: f32) -> (TangentMode, TangentMode) {
    (TangentMode::Linear, TangentMode::Linear)
}

/// Accumulates beat, bar, note and controller keys during playback.
///
/// `step` is the time step the caller drives playback with. Note releases are written one step
/// early and controller keys are kept at least one step apart.
#[derive(Debug, Clone)]
pub struct ClipBuilder {
    bpm: f32,
    step: f32,
    beat: Option<i64>,
    beat_count: Curve,
    beat_clock: Curve,
    bar_count: Curve,
    bar_clock: Curve,
    notes: Box<[Option<Curve>; CHANNELS]>,
    cc: Box<[Option<Curve>; CHANNELS]>,
}

impl ClipBuilder {
    pub fn new(bpm: f32, step: f32) -> Self {
        ClipBuilder {
            bpm,
            step,
            beat: None,
            beat_count: Curve::new(),
            beat_clock: Curve::new(),
            bar_count: Curve::new(),
            bar_clock: Curve::new(),
            notes: empty_slots(),
            cc: empty_slots(),
        }
    }

    /// Records the beat position at `time`, adding keys when a new beat has begun.
    pub fn write_beat(&mut self, time: f32) {
        let beat = (self.bpm * time / 60.0).floor() as i64;
        if self.beat == Some(beat) {
            return;
        }
        self.beat = Some(beat);

        self.beat_count.add_key(time, beat as f32);
        if beat > 0 {
            self.beat_clock.add_key(time - self.step, 1.0);
        }
        self.beat_clock.add_key(time, 0.0);

        if beat % 4 == 0 {
            self.bar_count.add_key(time, (beat / 4) as f32);
            if beat > 0 {
                self.bar_clock.add_key(time - self.step, 1.0);
            }
            self.bar_clock.add_key(time, 0.0);
        }
    }

    /// Writes a batch of events that occurred at `time`.
    pub fn write_events(&mut self, time: f32, events: &[MidiEvent]) {
        for event in events {
            match event.kind() {
                MidiEventKind::NoteOn { key, velocity } => {
                    self.set_note_key(key, time, velocity as f32 / 127.0)
                }
                MidiEventKind::NoteOff { key } => self.set_note_key(key, time - self.step, 0.0),
                MidiEventKind::ControllerChange { number, value } => {
                    self.set_cc_key(number, time, value as f32 / 127.0)
                }
                MidiEventKind::Other => {}
            }
        }
    }

    fn set_note_key(&mut self, index: u8, mut time: f32, value: f32) {
        // data bytes above 0x7f come from malformed files
        let slot = match self.notes.get_mut(index as usize) {
            Some(slot) => slot,
            None => return,
        };
        let curve = slot.get_or_insert_with(|| {
            let mut curve = Curve::new();
            curve.add_key(0.0, 0.0);
            curve
        });

        // time 0 belongs to the zeroing key
        if time <= 0.0 {
            if value == 0.0 {
                return;
            }
            time = self.step;
        }
        curve.add_key(time, value);
    }

    fn set_cc_key(&mut self, index: u8, time: f32, value: f32) {
        let step = self.step;
        let curve = match self.cc.get_mut(index as usize) {
            Some(slot) => slot.get_or_insert_with(Curve::new),
            None => return,
        };
        let time = match curve.last() {
            Some(last) => time.max(last.time + step),
            None => time,
        };
        curve.add_key(time, value);
    }

    /// Finalizes tangents and emits the curve set.
    ///
    /// With an envelope, note curves are rebuilt by [`Envelope::apply`] instead of getting
    /// threshold tangents.
    ///
    /// [`Envelope::apply`]: ../easing/struct.Envelope.html#method.apply
    pub fn finish(self, envelope: Option<&Envelope>) -> CurveSet {
        let ClipBuilder {
            mut beat_count,
            mut beat_clock,
            mut bar_count,
            mut bar_clock,
            mut notes,
            mut cc,
            ..
        } = self;

        beat_count.set_tangents(count_tangents);
        beat_clock.set_tangents(clock_tangents);
        bar_count.set_tangents(count_tangents);
        bar_clock.set_tangents(clock_tangents);

        for curve in notes.iter_mut().flatten() {
            match envelope {
                Some(envelope) => *curve = envelope.apply(curve),
                None => curve.set_tangents(note_tangents),
            }
        }
        for curve in cc.iter_mut().flatten() {
            curve.set_tangents(cc_tangents);
        }

        CurveSet { beat_count, beat_clock, bar_count, bar_clock, notes, cc }
    }
}

/// Finished curves of one conversion.
#[derive(Debug, Clone, PartialEq)]
pub struct CurveSet {
    pub beat_count: Curve,
    pub beat_clock: Curve,
    pub bar_count: Curve,
    pub bar_clock: Curve,
    notes: Box<[Option<Curve>; CHANNELS]>,
    cc: Box<[Option<Curve>; CHANNELS]>,
}

impl CurveSet {
    /// Curve of a note number, present only if the note was ever played.
    pub fn note(&self, index: u8) -> Option<&Curve> {
        self.notes.get(index as usize)?.as_ref()
    }

    /// Curve of a controller number, present only if the controller ever changed.
    pub fn cc(&self, index: u8) -> Option<&Curve> {
        self.cc.get(index as usize)?.as_ref()
    }

    pub fn get(&self, name: CurveName) -> Option<&Curve> {
        match name {
            CurveName::BeatCount => Some(&self.beat_count),
            CurveName::BeatClock => Some(&self.beat_clock),
            CurveName::BarCount => Some(&self.bar_count),
            CurveName::BarClock => Some(&self.bar_clock),
            CurveName::Note(index) => self.note(index),
            CurveName::Cc(index) => self.cc(index),
        }
    }

    /// Every present curve, beat and bar curves first, then notes, then controllers.
    pub fn iter(&self) -> impl Iterator<Item = (CurveName, &Curve)> + '_ {
        let fixed = [
            (CurveName::BeatCount, &self.beat_count),
            (CurveName::BeatClock, &self.beat_clock),
            (CurveName::BarCount, &self.bar_count),
            (CurveName::BarClock, &self.bar_clock),
        ];
        let notes = self.notes.iter().enumerate().filter_map(|(index, curve)| {
            curve.as_ref().map(|curve| (CurveName::Note(index as u8), curve))
        });
        let cc = self.cc.iter().enumerate().filter_map(|(index, curve)| {
            curve.as_ref().map(|curve| (CurveName::Cc(index as u8), curve))
        });
        fixed.into_iter().chain(notes).chain(cc)
    }

    /// Latest key time over all curves.
    pub fn duration(&self) -> f32 {
        self.iter().map(|(_, curve)| curve.duration()).fold(0.0, f32::max)
    }

    /// Evaluates every curve at `time`. Missing notes and controllers read as zero.
    pub fn sample(&self, time: f32) -> MidiState {
        let mut state = MidiState {
            beat_count: self.beat_count.evaluate(time),
            beat_clock: self.beat_clock.evaluate(time),
            bar_count: self.bar_count.evaluate(time),
            bar_clock: self.bar_clock.evaluate(time),
            ..MidiState::default()
        };
        for (slot, curve) in state.note.iter_mut().zip(self.notes.iter()) {
            if let Some(curve) = curve {
                *slot = curve.evaluate(time);
            }
        }
        for (slot, curve) in state.cc.iter_mut().zip(self.cc.iter()) {
            if let Some(curve) = curve {
                *slot = curve.evaluate(time);
            }
        }
        state
    }
}

/// Serialized as a map from curve name to keys.
impl Serialize for CurveSet {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(None)?;
        for (name, curve) in self.iter() {
            map.serialize_entry(&name.to_string(), curve)?;
        }
        map.end()
    }
}

#[cfg(test)]
mod tests {
    use super::{ClipBuilder, CurveName};
    use crate::curve::TangentMode;
    use crate::easing::Envelope;
    use crate::MidiEvent;

    const STEP: f32 = 1.0 / 60.0;

    fn note_on(key: u8, velocity: u8) -> MidiEvent {
        MidiEvent::new(0x90, key, velocity)
    }

    fn note_off(key: u8) -> MidiEvent {
        MidiEvent::new(0x80, key, 0)
    }

    fn cc(number: u8, value: u8) -> MidiEvent {
        MidiEvent::new(0xb0, number, value)
    }

    #[test]
    fn test_beats_and_bars() {
        let mut clip = ClipBuilder::new(120.0, STEP);
        for frame in 0..120 {
            clip.write_beat(frame as f32 / 60.0);
        }
        let curves = clip.finish(None);

        let beats: Vec<f32> = curves.beat_count.iter().map(|k| k.value).collect();
        assert_eq!(beats, vec![0.0, 1.0, 2.0, 3.0]);
        assert_eq!(curves.bar_count.len(), 1);
        assert_eq!(curves.bar_count.keys()[0].value, 0.0);
        // one reset key for beat 0, a high/reset pair for the others
        assert_eq!(curves.beat_clock.len(), 7);
        assert_eq!(curves.bar_clock.len(), 1);

        assert!(curves
            .beat_count
            .iter()
            .all(|k| k.left_tangent == TangentMode::Constant && k.right_tangent == TangentMode::Constant));
        let high = curves.beat_clock.iter().find(|k| k.value == 1.0).unwrap();
        assert_eq!((high.left_tangent, high.right_tangent), (TangentMode::Linear, TangentMode::Constant));
        let low = curves.beat_clock.keys()[0];
        assert_eq!((low.left_tangent, low.right_tangent), (TangentMode::Constant, TangentMode::Linear));
    }

    #[test]
    fn test_second_bar() {
        let mut clip = ClipBuilder::new(120.0, STEP);
        for frame in 0..=120 {
            clip.write_beat(frame as f32 / 60.0);
        }
        let curves = clip.finish(None);
        let bars: Vec<f32> = curves.bar_count.iter().map(|k| k.value).collect();
        assert_eq!(bars, vec![0.0, 1.0]);
        assert_eq!(curves.bar_clock.len(), 3);
    }

    #[test]
    fn test_note_zeroing_key() {
        let mut clip = ClipBuilder::new(120.0, STEP);
        clip.write_events(0.0, &[note_on(60, 127)]);
        clip.write_events(1.0, &[note_off(60), note_on(62, 64)]);
        let curves = clip.finish(None);

        let note = curves.note(60).unwrap();
        let keys: Vec<(f32, f32)> = note.iter().map(|k| (k.time, k.value)).collect();
        assert_eq!(keys, vec![(0.0, 0.0), (STEP, 1.0), (1.0 - STEP, 0.0)]);

        let other = curves.note(62).unwrap();
        assert_eq!(other.keys()[0].time, 0.0);
        assert_eq!(other.keys()[0].value, 0.0);
        assert_eq!(other.keys()[1].time, 1.0);
        assert!(curves.note(61).is_none());
    }

    #[test]
    fn test_note_tangents() {
        let mut clip = ClipBuilder::new(120.0, STEP);
        clip.write_events(0.5, &[note_on(60, 100)]);
        clip.write_events(1.0, &[note_off(60)]);
        let curves = clip.finish(None);
        let keys = curves.note(60).unwrap().keys();
        assert_eq!((keys[1].left_tangent, keys[1].right_tangent), (TangentMode::Constant, TangentMode::Linear));
        assert_eq!((keys[2].left_tangent, keys[2].right_tangent), (TangentMode::Linear, TangentMode::Constant));
    }

    #[test]
    fn test_early_release_is_dropped() {
        let mut clip = ClipBuilder::new(120.0, STEP);
        clip.write_events(0.0, &[note_off(60), note_on(60, 127)]);
        let curves = clip.finish(None);
        let keys: Vec<(f32, f32)> = curves.note(60).unwrap().iter().map(|k| (k.time, k.value)).collect();
        assert_eq!(keys, vec![(0.0, 0.0), (STEP, 1.0)]);
    }

    #[test]
    fn test_cc_times_increase() {
        let mut clip = ClipBuilder::new(120.0, STEP);
        clip.write_events(0.5, &[cc(1, 0), cc(1, 64), cc(1, 127)]);
        clip.write_events(0.5, &[cc(1, 10)]);
        clip.write_events(2.0, &[cc(1, 20)]);
        let curves = clip.finish(None);

        let curve = curves.cc(1).unwrap();
        assert_eq!(curve.len(), 5);
        let times: Vec<f32> = curve.iter().map(|k| k.time).collect();
        assert!(times.windows(2).all(|pair| pair[0] < pair[1]), "{:?}", times);
        assert_eq!(times[0], 0.5);
        assert_eq!(times[4], 2.0);
        assert!(curve
            .iter()
            .all(|k| k.left_tangent == TangentMode::Linear && k.right_tangent == TangentMode::Linear));
    }

    #[test]
    fn test_envelope_applies_to_notes_only() {
        let mut clip = ClipBuilder::new(120.0, STEP);
        clip.write_beat(0.0);
        clip.write_events(0.5, &[note_on(60, 127), cc(7, 127)]);
        clip.write_events(1.5, &[note_off(60)]);
        let curves = clip.finish(Some(&Envelope::new(0.1, 0.3)));

        let note = curves.note(60).unwrap();
        assert!(note.iter().all(|k| k.left_tangent == TangentMode::Flat));
        assert_eq!(note.len(), 5);
        assert_eq!(curves.cc(7).unwrap().keys()[0].left_tangent, TangentMode::Linear);
        assert_eq!(curves.beat_clock.keys()[0].right_tangent, TangentMode::Linear);
    }

    #[test]
    fn test_iter_names() {
        let mut clip = ClipBuilder::new(120.0, STEP);
        clip.write_beat(0.0);
        clip.write_events(0.5, &[note_on(60, 127), cc(7, 127)]);
        let curves = clip.finish(None);
        let names: Vec<String> = curves.iter().map(|(name, _)| name.to_string()).collect();
        assert_eq!(names, vec!["BeatCount", "BeatClock", "BarCount", "BarClock", "Note[60]", "CC[7]"]);
        assert!(curves.get(CurveName::Note(60)).is_some());
        assert!(curves.get(CurveName::Cc(8)).is_none());
        assert_eq!(curves.duration(), 0.5);
    }

    #[test]
    fn test_sample() {
        let mut clip = ClipBuilder::new(120.0, STEP);
        clip.write_beat(0.0);
        clip.write_events(0.5, &[note_on(60, 127), cc(7, 127)]);
        let curves = clip.finish(None);

        let state = curves.sample(0.5);
        assert_eq!(state.note[60], 1.0);
        assert_eq!(state.cc[7], 1.0);
        assert_eq!(state.note[61], 0.0);
        assert_eq!(curves.sample(0.25).note[60], 0.0);
    }

    #[test]
    fn test_out_of_range_data_bytes_dropped() {
        let mut clip = ClipBuilder::new(120.0, STEP);
        clip.write_events(0.5, &[note_on(0x80 | 60, 127), cc(0x80 | 7, 127), note_off(0xff)]);
        let curves = clip.finish(None);
        assert!(curves.note(60).is_none());
        assert!(curves.cc(7).is_none());
        assert_eq!(curves.iter().count(), 4);
    }
}
