//! Standard Midi File (SMF) to animation curve converter.
//!
//! The pipeline runs strictly one way: raw bytes are parsed into an [`Smf`], one of its tracks is
//! played back by a [`Sequencer`] at a caller-chosen tempo, and the resulting event batches are
//! written into a [`ClipBuilder`] which finally emits a [`CurveSet`].
//!
//! # Example
//!
//! ```
//! # fn convert(bytes: &[u8]) -> Result<(), midi_anim::Error> {
//! let settings = midi_anim::Settings::default();
//! let curves = midi_anim::convert(bytes, &settings)?;
//! for (name, curve) in curves.iter() {
//!     println!("{}: {} keys", name, curve.len());
//! }
//! # Ok(())
//! # }
//! ```
//!
//! # Standard documentation:
//!
//! - [`csie`]
//! - [`midi.org`]
//! - [`somascape.org`]
//!
//! [`Smf`]: smf/struct.Smf.html
//! [`Sequencer`]: sequencer/struct.Sequencer.html
//! [`ClipBuilder`]: clip/struct.ClipBuilder.html
//! [`CurveSet`]: clip/struct.CurveSet.html
//! [`csie`]: https://www.csie.ntu.edu.tw/~r92092/ref/midi/
//! [`midi.org`]: https://www.midi.org/specifications/item/table-1-summary-of-midi-message
//! [`somascape.org`]: http://www.somascape.org/midi/tech/mfile.html

pub mod clip;
pub mod config;
mod convert;
pub mod curve;
pub mod easing;
mod features;
pub mod read;
pub mod sequencer;
pub mod smf;
pub mod state;

pub use clip::{ClipBuilder, CurveName, CurveSet};
pub use config::{Settings, TimeStep};
pub use convert::{convert, convert_track};
pub use curve::{Curve, Keyframe, TangentMode};
pub use features::*;
pub use sequencer::Sequencer;
pub use smf::{Smf, Track, TrackEvent};
pub use state::MidiState;

/// Conversion result.
pub type Result<T> = core::result::Result<T, Error>;

/// Conversion error.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
#[error("{context}: {kind}")]
pub struct Error {
    /// Error context description.
    pub context: &'static str,
    /// Type of error.
    pub kind: ErrorKind,
}

impl Error {
    pub(crate) fn new(context: &'static str, kind: ErrorKind) -> Self {
        Error { context, kind }
    }

    pub(crate) fn format(context: &'static str, format: FormatError) -> Self {
        Error::new(context, ErrorKind::Format(format))
    }
}

/// [`Error`] type.
///
/// [`Error`]: struct.Error.html
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ErrorKind {
    /// The byte buffer ended before a read completed.
    #[error("unexpected end of data")]
    OutOfData,
    /// Structural violation of the SMF grammar.
    #[error("malformed file: {0}")]
    Format(FormatError),
    /// Requested track is not present in the file.
    #[error("track {index} requested, file has {tracks}")]
    InvalidTrackIndex { index: usize, tracks: usize },
    /// Reading the underlying stream failed.
    #[error("i/o error: {0:?}")]
    Io(std::io::ErrorKind),
    /// Settings could not be parsed or are out of range.
    #[error("invalid settings: {0}")]
    Config(String),
}

/// [`ErrorKind::Format`] variants.
///
/// [`ErrorKind::Format`]: enum.ErrorKind.html#variant.Format
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum FormatError {
    #[error("can't find header chunk")]
    MissingHeaderChunk,
    #[error("length of header chunk must be 6")]
    BadHeaderLength,
    #[error("can't find track chunk")]
    MissingTrackChunk,
    #[error("SMPTE time code is not supported")]
    SmpteUnsupported,
    #[error("division must be at least one pulse per quarter note")]
    ZeroDivision,
    /// First event of a track omits its status byte.
    #[error("running status used before any status byte")]
    MissingRunningStatus,
}

/// Status class of a channel message (`status & 0xf0`).
pub mod status {
    pub const NOTE_OFF: u8 = 0x80;
    pub const NOTE_ON: u8 = 0x90;
    pub const CONTROLLER_CHANGE: u8 = 0xb0;
    pub const PROGRAM_CHANGE: u8 = 0xc0;
    pub const SYSEX: u8 = 0xf0;
    pub const SYSEX_END: u8 = 0xf7;
    pub const META: u8 = 0xff;
}

/// Channel message as stored in a track.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct MidiEvent {
    pub status: u8,
    pub data1: u8,
    pub data2: u8,
}

/// Classified view of a [`MidiEvent`], covering the messages that produce curves.
///
/// [`MidiEvent`]: struct.MidiEvent.html
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MidiEventKind {
    NoteOn { key: u8, velocity: u8 },
    NoteOff { key: u8 },
    ControllerChange { number: u8, value: u8 },
    Other,
}

impl MidiEvent {
    pub fn new(status: u8, data1: u8, data2: u8) -> Self {
        MidiEvent { status, data1, data2 }
    }

    /// Message class with the channel bits cleared.
    pub fn message(&self) -> u8 {
        self.status & 0xf0
    }

    pub fn channel(&self) -> u8 {
        self.status & 0x0f
    }

    /// Note-on with velocity 0 stays a note-on; it writes a zero value like any other velocity.
    pub fn kind(&self) -> MidiEventKind {
        match self.message() {
            status::NOTE_ON => MidiEventKind::NoteOn { key: self.data1, velocity: self.data2 },
            status::NOTE_OFF => MidiEventKind::NoteOff { key: self.data1 },
            status::CONTROLLER_CHANGE => MidiEventKind::ControllerChange {
                number: self.data1,
                value: self.data2,
            },
            _ => MidiEventKind::Other,
        }
    }

    /// Program change and channel pressure carry a single data byte.
    pub fn has_single_data_byte(status: u8) -> bool {
        status & 0xe0 == status::PROGRAM_CHANGE
    }
}

impl core::fmt::Display for MidiEvent {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        write!(f, "[{:X},{},{}]", self.status, self.data1, self.data2)
    }
}
