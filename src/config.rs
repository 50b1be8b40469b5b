//! Conversion settings.

use crate::easing::Envelope;
use crate::{Error, ErrorKind, Result};
use serde::{Deserialize, Serialize};

/// How far playback moves per iteration.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum TimeStep {
    /// Fixed number of seconds.
    Fixed(f32),
    /// Exactly one pulse: `60 / (division × bpm)` seconds.
    PulseAligned,
}

impl Default for TimeStep {
    fn default() -> Self {
        TimeStep::Fixed(1.0 / 60.0)
    }
}

impl TimeStep {
    /// Step length in seconds, computed in f64 so pulse-aligned steps stay precise.
    pub fn seconds(&self, division: u16, bpm: f32) -> f64 {
        match *self {
            TimeStep::Fixed(step) => step as f64,
            TimeStep::PulseAligned => 60.0 / (division as f64 * bpm as f64),
        }
    }
}

/// Options of one conversion, usually read from RON:
///
/// ```
/// let settings = midi_anim::Settings::from_ron("(bpm: 96.0, easing: true)").unwrap();
/// assert_eq!(settings.track_index, 0);
/// assert!(settings.envelope().is_some());
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    pub bpm: f32,
    pub track_index: usize,
    pub easing: bool,
    /// Seconds for a full-scale rise, used with `easing`.
    pub attack_time: f32,
    /// Seconds for a full-scale fall, used with `easing`.
    pub release_time: f32,
    pub time_step: TimeStep,
}

impl Default for Settings {
    fn default() -> Self {
        Settings {
            bpm: 120.0,
            track_index: 0,
            easing: false,
            attack_time: 0.1,
            release_time: 0.3,
            time_step: TimeStep::default(),
        }
    }
}

fn invalid(message: String) -> Error {
    Error::new("settings", ErrorKind::Config(message))
}

fn positive(name: &str, value: f32) -> Result<()> {
    if value.is_finite() && value > 0.0 {
        Ok(())
    } else {
        Err(invalid(format!("{} must be positive, got {}", name, value)))
    }
}

impl Settings {
    /// Parses and validates settings. Missing fields take their defaults.
    pub fn from_ron(text: &str) -> Result<Self> {
        let settings: Settings = ron::from_str(text).map_err(|err| invalid(err.to_string()))?;
        settings.validate()?;
        Ok(settings)
    }

    pub fn to_ron(&self) -> Result<String> {
        ron::ser::to_string_pretty(self, ron::ser::PrettyConfig::default())
            .map_err(|err| invalid(err.to_string()))
    }

    pub fn validate(&self) -> Result<()> {
        positive("bpm", self.bpm)?;
        if let TimeStep::Fixed(step) = self.time_step {
            positive("time_step", step)?;
        }
        if self.easing {
            positive("attack_time", self.attack_time)?;
            positive("release_time", self.release_time)?;
        }
        Ok(())
    }

    /// Attack/release envelope, if easing is enabled.
    pub fn envelope(&self) -> Option<Envelope> {
        if self.easing {
            Some(Envelope::new(self.attack_time, self.release_time))
        } else {
            None
        }
    }
}
