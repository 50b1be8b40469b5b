//! Converts one track of a MIDI file and prints a summary of the resulting curves.
//!
//! Usage: `cargo run --example convert -- song.mid [settings.ron]`

use std::{env, fs};

fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .init();

    let mut args = env::args().skip(1);
    let path = args.next().ok_or("usage: convert <file.mid> [settings.ron]")?;
    let settings = match args.next() {
        Some(settings_path) => midi_anim::Settings::from_ron(&fs::read_to_string(settings_path)?)?,
        None => midi_anim::Settings::default(),
    };

    let bytes = fs::read(&path)?;
    let curves = midi_anim::convert(&bytes, &settings)?;

    println!("{}: {:.3}s at {} bpm", path, curves.duration(), settings.bpm);
    for (name, curve) in curves.iter() {
        println!("{:>10}  {:>5} keys", name.to_string(), curve.len());
    }

    Ok(())
}
