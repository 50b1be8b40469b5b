use midi_anim::{convert, CurveName, ErrorKind, Settings, TangentMode, TimeStep};

const ARPEGGIO: &[u8] = include_bytes!("res/arpeggio.mid");
const STEP: f32 = 1.0 / 60.0;

fn init_logging() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}

fn settings() -> Settings {
    Settings { track_index: 1, ..Settings::default() }
}

fn assert_close(actual: f32, expected: f32) {
    assert!((actual - expected).abs() < 1e-4, "{} != {}", actual, expected);
}

#[test]
fn test_beat_and_bar_curves() {
    init_logging();
    let curves = convert(ARPEGGIO, &settings()).unwrap();

    // playback stops on the last event at 2.5s, the start of beat 5
    let beats: Vec<f32> = curves.beat_count.iter().map(|k| k.value).collect();
    assert_eq!(beats, vec![0.0, 1.0, 2.0, 3.0, 4.0, 5.0]);
    let bars: Vec<f32> = curves.bar_count.iter().map(|k| k.value).collect();
    assert_eq!(bars, vec![0.0, 1.0]);
    assert_close(curves.bar_count.keys()[1].time, 2.0);

    let clock = &curves.beat_clock;
    assert_eq!(clock.len(), 11);
    assert_close(clock.keys()[1].time, 0.5 - STEP);
    assert_eq!(clock.keys()[1].value, 1.0);
}

#[test]
fn test_note_curves() {
    init_logging();
    let curves = convert(ARPEGGIO, &settings()).unwrap();

    for index in [60, 64, 67] {
        let curve = curves.note(index).unwrap();
        let first = curve.first().unwrap();
        assert_eq!((first.time, first.value), (0.0, 0.0), "note {}", index);
        assert_eq!(curve.len(), 3, "note {}", index);
    }
    assert!(curves.note(62).is_none());

    let c = curves.note(60).unwrap().keys();
    assert_close(c[1].time, STEP);
    assert_eq!(c[1].value, 100.0 / 127.0);
    assert_close(c[2].time, 1.0 - STEP);
    assert_eq!(c[2].value, 0.0);

    let g = curves.note(67).unwrap().keys();
    // the marker's delta is dropped with it, so the note starts at 1.5s
    assert_close(g[1].time, 1.5);
    assert_close(g[2].time, 2.5 - STEP);
    assert_eq!((g[1].left_tangent, g[1].right_tangent), (TangentMode::Constant, TangentMode::Linear));
}

#[test]
fn test_cc_curve() {
    init_logging();
    let curves = convert(ARPEGGIO, &settings()).unwrap();
    let cc = curves.get(CurveName::Cc(1)).unwrap();
    assert_eq!(cc.len(), 2);
    assert_close(cc.keys()[0].time, 0.5);
    assert_close(cc.keys()[1].time, 0.5 + STEP);
    assert!(cc.keys()[0].time < cc.keys()[1].time);
    assert_eq!(cc.keys()[1].value, 1.0);
}

#[test]
fn test_sampled_state() {
    init_logging();
    let curves = convert(ARPEGGIO, &settings()).unwrap();

    let state = curves.sample(0.6);
    assert!(state.note[60] > 0.0 && state.note[60] < 100.0 / 127.0);
    assert!(state.note[64] > 0.0);
    assert_eq!(state.cc[1], 1.0);
    assert_eq!(state.beat_count, 1.0);
    assert_eq!(state.active_notes().collect::<Vec<_>>(), vec![60, 64]);

    let state = curves.sample(1.2);
    assert_eq!(state.active_notes().count(), 0);
    assert_eq!(state.beat_count, 2.0);
    assert_eq!(state.bar_count, 0.0);

    let state = curves.sample(1.55);
    assert_eq!(state.active_notes().collect::<Vec<_>>(), vec![67]);
    assert_eq!(state.beat_count, 3.0);
}

#[test]
fn test_easing() {
    init_logging();
    let settings = Settings { easing: true, ..settings() };
    let plain = convert(ARPEGGIO, &self::settings()).unwrap();
    let curves = convert(ARPEGGIO, &settings).unwrap();

    let g = curves.note(67).unwrap();
    let values: Vec<f32> = g.iter().map(|k| k.value).collect();
    assert_eq!(values, vec![0.0, 0.0, 1.0, 1.0, 0.0]);
    assert_close(g.keys()[2].time, 1.6);
    assert_close(g.keys()[4].time, 2.5 - STEP + 0.3);
    assert!(g.iter().all(|k| k.left_tangent == TangentMode::Flat && k.right_tangent == TangentMode::Flat));

    // ramps never run into the following raw key
    for index in [60, 64, 67] {
        let raw = plain.note(index).unwrap();
        let eased = curves.note(index).unwrap();
        for pair in raw.keys().windows(2) {
            let (start, end) = (pair[0].time, pair[1].time);
            for key in eased.iter().filter(|k| k.time > start && k.time < end) {
                assert!(key.time <= end - 1e-3 + 1e-5, "note {}: {} overruns {}", index, key.time, end);
            }
        }
    }

    // everything but notes is untouched
    assert_eq!(curves.beat_clock, plain.beat_clock);
    assert_eq!(curves.cc(1), plain.cc(1));
}

#[test]
fn test_pulse_aligned_matches_fixed() {
    init_logging();
    let fixed = convert(ARPEGGIO, &settings()).unwrap();
    let settings = Settings { time_step: TimeStep::PulseAligned, ..settings() };
    let aligned = convert(ARPEGGIO, &settings).unwrap();

    let names = |curves: &midi_anim::CurveSet| curves.iter().map(|(name, _)| name).collect::<Vec<_>>();
    assert_eq!(names(&fixed), names(&aligned));
    let on = aligned.note(67).unwrap().keys()[1];
    assert_close(on.time, 1.5);
    assert_eq!(aligned.beat_count.len(), fixed.beat_count.len());
}

#[test]
fn test_invalid_track_index() {
    let settings = Settings { track_index: 2, ..Settings::default() };
    let err = convert(ARPEGGIO, &settings).unwrap_err();
    assert_eq!(err.kind, ErrorKind::InvalidTrackIndex { index: 2, tracks: 2 });
}

#[test]
fn test_invalid_settings() {
    let settings = Settings { bpm: -1.0, ..Settings::default() };
    assert!(matches!(convert(ARPEGGIO, &settings).unwrap_err().kind, ErrorKind::Config(_)));
}

#[test]
fn test_tempo_track_has_only_clock_curves() {
    let curves = convert(ARPEGGIO, &Settings::default()).unwrap();
    assert_eq!(curves.iter().count(), 4);
    assert_eq!(curves.beat_count.len(), 1);
}
