use crate::clip::{ClipBuilder, CurveSet};
use crate::config::{Settings, TimeStep};
use crate::sequencer::Sequencer;
use crate::smf::Smf;
use crate::{Error, ErrorKind, Result};
use tracing::{debug, info_span};

/// Parses `bytes` and converts the track selected by `settings`.
pub fn convert(bytes: &[u8], settings: &Settings) -> Result<CurveSet> {
    settings.validate()?;
    let smf = Smf::read_bytes(bytes)?;
    convert_track(&smf, settings)
}

/// Plays one track of a parsed file through a [`ClipBuilder`].
///
/// Beat keys and events at time 0 are written first, then playback advances one time step at a
/// time until the sequencer runs out of events.
///
/// [`ClipBuilder`]: clip/struct.ClipBuilder.html
pub fn convert_track(smf: &Smf, settings: &Settings) -> Result<CurveSet> {
    settings.validate()?;
    let span = info_span!("convert", track = settings.track_index, bpm = settings.bpm);
    let _enter = span.enter();

    let track = smf.track(settings.track_index).ok_or_else(|| {
        Error::new(
            "track selection",
            ErrorKind::InvalidTrackIndex { index: settings.track_index, tracks: smf.tracks.len() },
        )
    })?;

    let step = settings.time_step.seconds(smf.division, settings.bpm);
    let mut sequencer = Sequencer::new(track, smf.division, settings.bpm);
    let pulses = match settings.time_step {
        TimeStep::PulseAligned => 1.0,
        TimeStep::Fixed(_) => sequencer.pulses_per_second() * step,
    };
    let mut clip = ClipBuilder::new(settings.bpm, step as f32);

    clip.write_beat(0.0);
    clip.write_events(0.0, &sequencer.start(0.0));

    let mut steps: u64 = 0;
    while sequencer.is_playing() {
        steps += 1;
        // multiplied rather than accumulated to keep late keys on the step grid
        let time = (steps as f64 * step) as f32;
        clip.write_beat(time);
        clip.write_events(time, &sequencer.advance_pulses(pulses));
    }

    let envelope = settings.envelope();
    let curves = clip.finish(envelope.as_ref());
    debug!(steps, step, curves = curves.iter().count(), duration = curves.duration(), "converted track");
    Ok(curves)
}
