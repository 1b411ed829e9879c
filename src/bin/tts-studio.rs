use std::io::{self, BufRead, Write};
use std::path::{Path, PathBuf};

use anyhow::{bail, Context, Result};
use clap::Parser;

use tts_studio::options::{
    Choice, CloningMethod, Emotion, Language, ModelChoice, PretrainedVoice, StudioConfig,
    SynthesisOptions, VoiceGender,
};
use tts_studio::studio::{Generation, Session, Studio};
use tts_studio::WavEncoding;

const DEFAULT_TEXT: &str = "Welcome to AI Text-to-Speech application with voice cloning \
                            capabilities. This demo shows how advanced TTS models can \
                            generate natural sounding speech.";

#[derive(Debug, Parser)]
#[command(name = "tts-studio")]
#[command(about = "Generate speech with espeak-ng, falling back to a sample tone")]
#[command(version)]
struct Cli {
    /// Text to synthesize. Defaults to a short welcome message.
    text: Option<String>,
    /// Read the text from a file instead.
    #[arg(long, conflicts_with = "text")]
    text_file: Option<PathBuf>,
    /// JSON studio config; flags below override its values.
    #[arg(long)]
    config: Option<PathBuf>,

    #[arg(long, value_enum, ignore_case = true)]
    model: Option<ModelChoice>,
    #[arg(long, value_enum, ignore_case = true)]
    language: Option<Language>,
    /// Speech speed, 0.5–2.0.
    #[arg(long)]
    speed: Option<f32>,
    /// Pitch, 0.5–2.0.
    #[arg(long)]
    pitch: Option<f32>,
    /// Energy, 0.5–2.0.
    #[arg(long)]
    energy: Option<f32>,
    #[arg(long, value_enum, ignore_case = true)]
    gender: Option<VoiceGender>,
    #[arg(long, value_enum, ignore_case = true)]
    emotion: Option<Emotion>,

    /// Enable voice cloning from a reference recording (.wav, .mp3, .ogg).
    #[arg(long)]
    clone_reference: Option<PathBuf>,
    /// Enable voice cloning with a pretrained voice.
    #[arg(long, value_enum, ignore_case = true, conflicts_with = "clone_reference")]
    clone_voice: Option<PretrainedVoice>,
    /// Enable voice cloning by recording (not available in this build).
    #[arg(long, conflicts_with_all = ["clone_reference", "clone_voice"])]
    clone_record: bool,

    /// pcm16 or float32.
    #[arg(long)]
    encoding: Option<WavEncoding>,
    /// Directory for timestamped output files.
    #[arg(long)]
    output_dir: Option<PathBuf>,
    /// Exact output path, overriding the timestamped name.
    #[arg(long, short)]
    output: Option<PathBuf>,

    #[arg(long)]
    espeak_bin: Option<PathBuf>,
    #[arg(long)]
    espeak_data: Option<PathBuf>,

    /// Print the model catalogue and exit.
    #[arg(long)]
    list_models: bool,
    /// Read one text per line from stdin; `:save` writes the latest clip.
    #[arg(long, conflicts_with_all = ["text", "text_file", "output"])]
    interactive: bool,
}

impl Cli {
    fn load_config(&self) -> Result<StudioConfig> {
        let mut config = match &self.config {
            Some(path) => StudioConfig::from_json_file(path)
                .with_context(|| format!("failed loading config {}", path.display()))?,
            None => StudioConfig::default(),
        };

        let options = &mut config.options;
        if let Some(model) = self.model {
            options.model = model;
        }
        if let Some(language) = self.language {
            options.language = language;
        }
        if let Some(speed) = self.speed {
            options.speed = speed;
        }
        if let Some(pitch) = self.pitch {
            options.pitch = pitch;
        }
        if let Some(energy) = self.energy {
            options.energy = energy;
        }
        if let Some(gender) = self.gender {
            options.voice_gender = gender;
        }
        if let Some(emotion) = self.emotion {
            options.emotion = emotion;
        }
        if let Some(path) = &self.clone_reference {
            options.cloning = Some(CloningMethod::UploadReference { path: path.clone() });
        } else if let Some(voice) = self.clone_voice {
            options.cloning = Some(CloningMethod::Pretrained { voice });
        } else if self.clone_record {
            options.cloning = Some(CloningMethod::Record);
        }
        options.validate().context("invalid synthesis options")?;

        if let Some(encoding) = self.encoding {
            config.encoding = encoding;
        }
        if self.output_dir.is_some() {
            config.output_dir = self.output_dir.clone();
        }
        if self.espeak_bin.is_some() {
            config.espeak.bin_path = self.espeak_bin.clone();
        }
        if self.espeak_data.is_some() {
            config.espeak.data_path = self.espeak_data.clone();
        }
        Ok(config)
    }

    fn text(&self) -> Result<String> {
        if let Some(path) = &self.text_file {
            return std::fs::read_to_string(path)
                .with_context(|| format!("failed reading text file {}", path.display()));
        }
        Ok(self.text.clone().unwrap_or_else(|| DEFAULT_TEXT.to_string()))
    }
}

fn report(generation: &Generation) {
    for notice in &generation.notices {
        eprintln!("note: {notice}");
    }
    println!(
        "Generated {:.2}s of audio ({} samples @ {}Hz) with {} for {}",
        generation.result.duration_secs(),
        generation.result.samples.len(),
        generation.result.sample_rate,
        generation.source,
        generation.model
    );
}

fn run_interactive(
    studio: &mut Studio,
    options: &SynthesisOptions,
    output_dir: &Path,
    encoding: WavEncoding,
) -> Result<()> {
    let mut session = Session::default();
    let stdin = io::stdin();
    let mut stdout = io::stdout();

    loop {
        print!("> ");
        stdout.flush()?;

        let mut line = String::new();
        if stdin.lock().read_line(&mut line)? == 0 {
            break;
        }
        let line = line.trim();

        match line {
            "" => continue,
            ":quit" | ":q" => break,
            ":save" => match session.last() {
                Some(generation) => {
                    let path = generation.save_to_dir(output_dir, encoding)?;
                    println!("Saved to {}", path.display());
                }
                None => eprintln!("note: nothing generated yet"),
            },
            text => match studio.generate(text, options) {
                Ok(generation) => report(session.record(generation)),
                Err(e) => eprintln!("error: {e}"),
            },
        }
    }
    Ok(())
}

fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let cli = Cli::parse();

    if cli.list_models {
        for model in ModelChoice::all() {
            print!("{}", model.card());
        }
        return Ok(());
    }

    let config = cli.load_config()?;
    let output_dir = config.output_dir.clone().unwrap_or_else(|| PathBuf::from("."));
    let mut studio = Studio::with_espeak(config.espeak.clone());

    if cli.interactive {
        return run_interactive(&mut studio, &config.options, &output_dir, config.encoding);
    }

    let text = cli.text()?;
    if text.is_empty() {
        bail!("no text to synthesize");
    }

    let generation = studio.generate(&text, &config.options)?;
    report(&generation);

    let path = match &cli.output {
        Some(path) => {
            generation
                .result
                .write_wav(path, config.encoding)
                .with_context(|| format!("failed writing {}", path.display()))?;
            path.clone()
        }
        None => generation.save_to_dir(&output_dir, config.encoding)?,
    };
    println!("Saved to {}", path.display());

    Ok(())
}
