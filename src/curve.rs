//! Keyframe curves.

use serde::{Deserialize, Serialize};

/// Interpolation hint on one side of a key.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum TangentMode {
    /// Step: the segment holds the value of its first key.
    Constant,
    /// Straight ramp towards the neighbouring key.
    #[default]
    Linear,
    /// Zero slope, giving a smooth ease in or out.
    Flat,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Keyframe {
    /// Seconds.
    pub time: f32,
    pub value: f32,
    pub left_tangent: TangentMode,
    pub right_tangent: TangentMode,
}

impl Keyframe {
    pub fn new(time: f32, value: f32) -> Self {
        Keyframe {
            time,
            value,
            left_tangent: TangentMode::default(),
            right_tangent: TangentMode::default(),
        }
    }

    pub fn with_tangents(mut self, left: TangentMode, right: TangentMode) -> Self {
        self.left_tangent = left;
        self.right_tangent = right;
        self
    }
}

/// Keys ordered by time, no two sharing a time.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Curve {
    keys: Vec<Keyframe>,
}

impl Curve {
    pub fn new() -> Self {
        Curve::default()
    }

    /// Inserts a key in time order.
    ///
    /// Returns `false` and leaves the curve untouched when a key already sits at `time`.
    pub fn add_key(&mut self, time: f32, value: f32) -> bool {
        self.insert(Keyframe::new(time, value))
    }

    pub fn insert(&mut self, key: Keyframe) -> bool {
        let index = self.keys.partition_point(|k| k.time < key.time);
        if self.keys.get(index).map_or(false, |k| k.time == key.time) {
            return false;
        }
        self.keys.insert(index, key);
        true
    }

    pub fn keys(&self) -> &[Keyframe] {
        &self.keys
    }

    pub fn len(&self) -> usize {
        self.keys.len()
    }

    pub fn is_empty(&self) -> bool {
        self.keys.is_empty()
    }

    pub fn first(&self) -> Option<&Keyframe> {
        self.keys.first()
    }

    pub fn last(&self) -> Option<&Keyframe> {
        self.keys.last()
    }

    pub fn iter(&self) -> core::slice::Iter<'_, Keyframe> {
        self.keys.iter()
    }

    /// Time of the last key, 0 for an empty curve.
    pub fn duration(&self) -> f32 {
        self.keys.last().map_or(0.0, |k| k.time)
    }

    /// Assigns both tangent modes of every key from its value.
    pub fn set_tangents<F>(&mut self, mut modes: F)
    where
        F: FnMut(f32) -> (TangentMode, TangentMode),
    {
        for key in &mut self.keys {
            let (left, right) = modes(key.value);
            key.left_tangent = left;
            key.right_tangent = right;
        }
    }

    /// Samples the curve. Outside its key range the nearest end value is held.
    pub fn evaluate(&self, time: f32) -> f32 {
        let index = self.keys.partition_point(|k| k.time <= time);
        let (a, b) = match (index.checked_sub(1), self.keys.get(index)) {
            (Some(prev), Some(next)) => (&self.keys[prev], next),
            (Some(prev), None) => return self.keys[prev].value,
            (None, Some(next)) => return next.value,
            (None, None) => return 0.0,
        };

        if a.right_tangent == TangentMode::Constant || b.left_tangent == TangentMode::Constant {
            return a.value;
        }

        let span = b.time - a.time;
        let u = (time - a.time) / span;
        if a.right_tangent == TangentMode::Linear && b.left_tangent == TangentMode::Linear {
            return a.value + (b.value - a.value) * u;
        }

        // cubic hermite, slopes scaled by the segment length
        let chord = b.value - a.value;
        let m0 = if a.right_tangent == TangentMode::Linear { chord } else { 0.0 };
        let m1 = if b.left_tangent == TangentMode::Linear { chord } else { 0.0 };
        let u2 = u * u;
        let u3 = u2 * u;
        (2.0 * u3 - 3.0 * u2 + 1.0) * a.value
            + (u3 - 2.0 * u2 + u) * m0
            + (-2.0 * u3 + 3.0 * u2) * b.value
            + (u3 - u2) * m1
    }
}

impl<'a> IntoIterator for &'a Curve {
    type Item = &'a Keyframe;
    type IntoIter = core::slice::Iter<'a, Keyframe>;

    fn into_iter(self) -> Self::IntoIter {
        self.keys.iter()
    }
}

impl FromIterator<Keyframe> for Curve {
    /// Keys are inserted one by one, so duplicates are dropped and order is restored.
    fn from_iter<I: IntoIterator<Item = Keyframe>>(iter: I) -> Self {
        let mut curve = Curve::new();
        for key in iter {
            curve.insert(key);
        }
        curve
    }
}
