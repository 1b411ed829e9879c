use std::borrow::Cow;
use std::io::{Cursor, Write};
use std::path::{Path, PathBuf};
use std::process::{Command, Stdio};

use serde::{Deserialize, Serialize};

use crate::options::{CloningMethod, Emotion, SynthesisOptions};
use crate::{SynthesisEngine, SynthesisResult};

/// espeak-ng speaking rate at speed 1.0, in words per minute.
pub const BASE_WPM: f32 = 175.0;

/// espeak-ng pitch at pitch 1.0 (espeak range 0–99).
pub const BASE_PITCH: f32 = 50.0;

/// espeak-ng amplitude at energy 1.0 (espeak range 0–200).
pub const BASE_AMPLITUDE: f32 = 100.0;

const DEFAULT_PROGRAM: &str = "espeak-ng";

#[derive(thiserror::Error, Debug)]
pub enum EspeakError {
    #[error(
        "espeak-ng not found at '{0}'. Install: Linux: `sudo apt-get install espeak-ng`, \
         macOS: `brew install espeak-ng`, Windows: https://espeak-ng.org/download"
    )]
    NotFound(String),
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
    #[error("espeak-ng exited with code {code:?}: {stderr}")]
    Failed { code: Option<i32>, stderr: String },
    #[error("Could not decode espeak-ng output as WAV: {0}")]
    Wav(#[from] hound::Error),
    #[error("espeak-ng produced no audio")]
    EmptyOutput,
}

/// Location of the espeak-ng program and its data directory.
///
/// Either path can be `None` to fall back to the system default.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct EspeakConfig {
    pub bin_path: Option<PathBuf>,
    pub data_path: Option<PathBuf>,
}

impl EspeakConfig {
    fn program(&self) -> &Path {
        self.bin_path
            .as_deref()
            .unwrap_or_else(|| Path::new(DEFAULT_PROGRAM))
    }
}

/// Speech backend driving the `espeak-ng` command-line program.
///
/// ```rust,no_run
/// use tts_studio::{SynthesisEngine, engines::espeak::EspeakEngine, options::SynthesisOptions};
/// use std::path::PathBuf;
///
/// // Point to a bundled espeak-ng binary and data directory
/// let mut engine = EspeakEngine::with_espeak(
///     Some(PathBuf::from("/app/resources/espeak-ng/espeak-ng")),
///     Some(PathBuf::from("/app/resources/espeak-ng-data")),
/// );
/// let result = engine.synthesize("Hello, world!", &SynthesisOptions::default())?;
/// # Ok::<(), Box<dyn std::error::Error + Send + Sync>>(())
/// ```
#[derive(Debug, Clone, Default)]
pub struct EspeakEngine {
    config: EspeakConfig,
}

impl EspeakEngine {
    /// Create a new engine that uses `espeak-ng` from PATH.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a new engine with explicit espeak-ng binary and data paths.
    pub fn with_espeak(bin_path: Option<PathBuf>, data_path: Option<PathBuf>) -> Self {
        Self::from_config(EspeakConfig {
            bin_path,
            data_path,
        })
    }

    pub fn from_config(config: EspeakConfig) -> Self {
        Self { config }
    }

    /// Run espeak-ng and decode the audio it writes to stdout.
    pub fn synthesize_text(
        &self,
        text: &str,
        options: &SynthesisOptions,
    ) -> Result<SynthesisResult, EspeakError> {
        if options.emotion != Emotion::Neutral {
            log::debug!("espeak-ng has no emotion control, ignoring {}", options.emotion);
        }

        let program = self.config.program();
        let args = build_args(options, self.config.data_path.as_deref());
        log::debug!("Running {} {}", program.display(), args.join(" "));

        let mut child = Command::new(program)
            .args(&args)
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .spawn()
            .map_err(|e| {
                if e.kind() == std::io::ErrorKind::NotFound {
                    EspeakError::NotFound(program.display().to_string())
                } else {
                    EspeakError::Io(e)
                }
            })?;

        // Feed stdin from a separate thread: espeak-ng starts writing audio
        // before it has read all input, and a full stdout pipe would block it.
        let payload = canonicalize_stdin_payload(text).into_owned();
        let feeder = child.stdin.take().map(|mut stdin| {
            std::thread::spawn(move || stdin.write_all(payload.as_bytes()))
        });

        let output = child.wait_with_output()?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(EspeakError::Failed {
                code: output.status.code(),
                stderr: stderr.trim().to_string(),
            });
        }

        if let Some(feeder) = feeder {
            feeder
                .join()
                .map_err(|_| std::io::Error::other("espeak-ng stdin writer panicked"))??;
        }

        decode_wav(&output.stdout)
    }
}

impl SynthesisEngine for EspeakEngine {
    fn name(&self) -> &str {
        DEFAULT_PROGRAM
    }

    fn is_available(&self) -> bool {
        Command::new(self.config.program())
            .arg("--version")
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .status()
            .is_ok_and(|status| status.success())
    }

    fn synthesize(
        &mut self,
        text: &str,
        options: &SynthesisOptions,
    ) -> Result<SynthesisResult, Box<dyn std::error::Error + Send + Sync>> {
        Ok(self.synthesize_text(text, options)?)
    }
}

/// espeak-ng voice name: language code plus an optional `+variant`.
///
/// A pretrained cloning voice wins over the plain gender choice.
pub fn voice_name(options: &SynthesisOptions) -> String {
    let variant = match &options.cloning {
        Some(CloningMethod::Pretrained { voice }) => Some(voice.espeak_variant()),
        _ => options.voice_gender.espeak_variant(),
    };
    let code = options.language.espeak_code();
    match variant {
        Some(variant) => format!("{code}+{variant}"),
        None => code.to_string(),
    }
}

fn build_args(options: &SynthesisOptions, data_path: Option<&Path>) -> Vec<String> {
    let wpm = (BASE_WPM * options.speed).round().max(1.0) as u32;
    let pitch = (BASE_PITCH * options.pitch).round().clamp(0.0, 99.0) as u32;
    let amplitude = (BASE_AMPLITUDE * options.energy).round().clamp(0.0, 200.0) as u32;

    let mut args = vec![
        "--stdout".to_string(),
        "--stdin".to_string(),
        "-v".to_string(),
        voice_name(options),
        "-s".to_string(),
        wpm.to_string(),
        "-p".to_string(),
        pitch.to_string(),
        "-a".to_string(),
        amplitude.to_string(),
    ];
    if let Some(data) = data_path {
        args.push("--path".to_string());
        args.push(data.display().to_string());
    }
    args
}

fn canonicalize_stdin_payload(input: &str) -> Cow<'_, str> {
    if input.ends_with('\n') {
        Cow::Borrowed(input)
    } else {
        Cow::Owned(format!("{input}\n"))
    }
}

/// Decode a WAV byte stream into mono f32 samples.
///
/// When writing to stdout espeak-ng cannot seek back to patch the header, so
/// the declared data length is a placeholder. Samples are read until the
/// stream runs out instead of trusting that length.
pub fn decode_wav(bytes: &[u8]) -> Result<SynthesisResult, EspeakError> {
    let mut reader = hound::WavReader::new(Cursor::new(bytes))?;
    let spec = reader.spec();

    let interleaved: Vec<f32> = match spec.sample_format {
        hound::SampleFormat::Float => reader
            .samples::<f32>()
            .map_while(Result::ok)
            .collect(),
        hound::SampleFormat::Int => {
            let full_scale = (1i64 << (spec.bits_per_sample - 1)) as f32;
            reader
                .samples::<i32>()
                .map_while(Result::ok)
                .map(|s| s as f32 / full_scale)
                .collect()
        }
    };

    let channels = spec.channels.max(1) as usize;
    let samples: Vec<f32> = if channels == 1 {
        interleaved
    } else {
        interleaved
            .chunks_exact(channels)
            .map(|frame| frame.iter().sum::<f32>() / channels as f32)
            .collect()
    };

    if samples.is_empty() {
        return Err(EspeakError::EmptyOutput);
    }

    log::debug!(
        "Decoded {} samples at {}Hz from espeak-ng",
        samples.len(),
        spec.sample_rate
    );

    Ok(SynthesisResult {
        samples,
        sample_rate: spec.sample_rate,
    })
}
