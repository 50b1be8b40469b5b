//! Attack/release shaping of note curves.

use crate::curve::{Curve, Keyframe, TangentMode};
use serde::{Deserialize, Serialize};

/// Gap kept between a ramp's end and the following key.
pub const EPSILON: f32 = 1e-3;

/// Attack and release times, in seconds for a full-scale (0 to 1) transition.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Envelope {
    pub attack: f32,
    pub release: f32,
}

fn flat(time: f32, value: f32) -> Keyframe {
    Keyframe::new(time, value).with_tangents(TangentMode::Flat, TangentMode::Flat)
}

impl Envelope {
    pub fn new(attack: f32, release: f32) -> Self {
        Envelope { attack, release }
    }

    /// Length of the ramp between two values.
    pub fn transition(&self, from: f32, to: f32) -> f32 {
        let delta = to - from;
        let rate = if delta > 0.0 { self.attack } else { self.release };
        rate * delta.abs()
    }

    /// Rebuilds a raw note curve with a ramp at every value change.
    ///
    /// A ramp starts at the original key time holding the previous value and reaches the new
    /// value after [`transition`], cut short so it ends at least [`EPSILON`] before the next raw
    /// key. A curve that does not end at zero gets one more key decaying to zero at the release
    /// rate. Every key is flat.
    ///
    /// [`transition`]: #method.transition
    /// [`EPSILON`]: constant.EPSILON.html
    pub fn apply(&self, raw: &Curve) -> Curve {
        let keys = raw.keys();
        let first = match keys.first() {
            Some(first) => first,
            None => return Curve::new(),
        };

        let mut eased = Vec::with_capacity(keys.len() * 2 + 1);
        eased.push(flat(first.time, first.value));

        for (index, pair) in keys.windows(2).enumerate() {
            let (prev, key) = (pair[0], pair[1]);
            if key.value == prev.value {
                eased.push(flat(key.time, key.value));
                continue;
            }

            let mut delay = self.transition(prev.value, key.value);
            if let Some(next) = keys.get(index + 2) {
                delay = delay.min(next.time - key.time - EPSILON).max(0.0);
            }

            if delay > 0.0 {
                eased.push(flat(key.time, prev.value));
                eased.push(flat(key.time + delay, key.value));
            } else {
                eased.push(flat(key.time, key.value));
            }
        }

        if let Some(last) = eased.last().copied() {
            if last.value > 0.0 {
                eased.push(flat(last.time + last.value * self.release, 0.0));
            }
        }

        eased.into_iter().collect()
    }
}
