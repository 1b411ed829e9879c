use std::path::PathBuf;
use std::time::Instant;

use tts_studio::{
    engines::tone::ToneEngine,
    options::{ModelChoice, SynthesisOptionsBuilder},
    studio::{Session, Studio},
    SynthesisEngine, WavEncoding,
};

fn main() -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
    env_logger::init();

    let text = "Welcome to AI Text-to-Speech application with voice cloning capabilities. \
                This demo shows how advanced TTS models can generate natural sounding speech.";

    let mut studio = Studio::with_espeak(Default::default());
    println!(
        "Backend: {} (available: {})",
        studio.backend_name().unwrap_or("none"),
        studio.backend_available()
    );

    let options = SynthesisOptionsBuilder::default().speed(1.2).build()?;

    let synth_start = Instant::now();
    let mut session = Session::default();
    let generation = session.record(studio.generate(text, &options)?);
    let synth_dur = synth_start.elapsed();

    let audio_duration = generation.result.duration_secs();
    println!(
        "Synthesized {:.2}s audio with {} in {:.2?} ({:.1}x real-time)",
        audio_duration,
        generation.source,
        synth_dur,
        audio_duration / synth_dur.as_secs_f64()
    );
    for notice in &generation.notices {
        println!("note: {notice}");
    }

    let path = generation.save_to_dir(&PathBuf::from("."), WavEncoding::Pcm16)?;
    println!("Saved to {}", path.display());

    // Sample Mode skips the backend entirely.
    let sample = SynthesisOptionsBuilder::default()
        .model(ModelChoice::SampleMode)
        .build()?;
    ToneEngine::new().synthesize_to_file(
        "Sample mode tone",
        &PathBuf::from("sample.wav"),
        &sample,
        WavEncoding::Float32,
    )?;
    println!("Saved to sample.wav");

    Ok(())
}
