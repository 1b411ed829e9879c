//! Generation orchestration.
//!
//! [`Studio`] decides, per request, whether the configured backend or the
//! tone fallback produces the audio. The caller always receives audio for
//! valid input: backend absence, a `SampleMode` request or a backend failure
//! all route to [`engines::tone`](crate::engines::tone), and the returned
//! [`Generation`] records which path was taken.
//!
//! Results are not stored globally. A [`Session`] owned by the caller keeps
//! the most recent generation.

use std::fmt;
use std::path::{Path, PathBuf};

use chrono::{DateTime, Local, TimeZone};

use crate::engines::espeak::{EspeakConfig, EspeakEngine};
use crate::engines::tone::{self, ToneError};
use crate::options::{CloningMethod, ModelChoice, OptionsError, SynthesisOptions};
use crate::{SynthesisEngine, SynthesisResult, WavEncoding};

pub const FALLBACK_NOTICE: &str = "Sample audio generated (TTS models not available)";
pub const RECORD_NOTICE: &str = "Voice recording is only available in a local deployment";

#[derive(thiserror::Error, Debug)]
pub enum StudioError {
    #[error("No text to synthesize")]
    EmptyText,
    #[error("Invalid options: {0}")]
    Options(#[from] OptionsError),
    #[error("Fallback synthesis failed: {0}")]
    Tone(#[from] ToneError),
    #[error("Could not encode audio: {0}")]
    Wav(#[from] hound::Error),
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Which engine produced a [`Generation`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AudioSource {
    /// The named backend engine.
    Backend(String),
    /// The deterministic tone.
    Fallback,
}

impl fmt::Display for AudioSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AudioSource::Backend(name) => write!(f, "{name}"),
            AudioSource::Fallback => f.write_str("sample tone"),
        }
    }
}

/// One completed generation request.
#[derive(Debug, Clone)]
pub struct Generation {
    pub result: SynthesisResult,
    pub source: AudioSource,
    /// Model the user asked for, whatever actually produced the audio.
    pub model: ModelChoice,
    pub created_at: DateTime<Local>,
    /// Messages worth showing to the user, in the order they arose.
    pub notices: Vec<String>,
}

impl Generation {
    pub fn is_fallback(&self) -> bool {
        self.source == AudioSource::Fallback
    }

    /// Download name, e.g. `tts_audio_20240305_070809.wav`.
    pub fn file_name(&self) -> String {
        download_filename(&self.created_at)
    }

    pub fn wav_bytes(&self, encoding: WavEncoding) -> Result<Vec<u8>, hound::Error> {
        self.result.to_wav_bytes(encoding)
    }

    /// Write the clip into `dir` under [`Generation::file_name`], creating
    /// the directory if needed.
    pub fn save_to_dir(&self, dir: &Path, encoding: WavEncoding) -> Result<PathBuf, StudioError> {
        std::fs::create_dir_all(dir)?;
        let path = dir.join(self.file_name());
        self.result.write_wav(&path, encoding)?;
        log::info!(
            "Saved {:.2}s clip from {} to {}",
            self.result.duration_secs(),
            self.source,
            path.display()
        );
        Ok(path)
    }
}

/// `tts_audio_<YYYYMMDD_HHMMSS>.wav` for the given timestamp.
pub fn download_filename<Tz>(timestamp: &DateTime<Tz>) -> String
where
    Tz: TimeZone,
    Tz::Offset: fmt::Display,
{
    format!("tts_audio_{}.wav", timestamp.format("%Y%m%d_%H%M%S"))
}

/// Holds the most recent generation across requests.
#[derive(Debug, Default)]
pub struct Session {
    last: Option<Generation>,
}

impl Session {
    /// Replace the previous generation and return the stored one.
    pub fn record(&mut self, generation: Generation) -> &Generation {
        self.last.insert(generation)
    }

    pub fn last(&self) -> Option<&Generation> {
        self.last.as_ref()
    }

    pub fn take(&mut self) -> Option<Generation> {
        self.last.take()
    }

    pub fn clear(&mut self) {
        self.last = None;
    }
}

/// Backend-or-fallback orchestrator.
pub struct Studio {
    backend: Option<Box<dyn SynthesisEngine>>,
    backend_available: bool,
}

impl Default for Studio {
    fn default() -> Self {
        Self::new(None)
    }
}

impl fmt::Debug for Studio {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Studio")
            .field("backend", &self.backend_name())
            .field("backend_available", &self.backend_available)
            .finish()
    }
}

impl Studio {
    /// Create a studio around an optional backend.
    ///
    /// Availability is checked once here; call [`Studio::refresh_availability`]
    /// after installing the backend.
    pub fn new(backend: Option<Box<dyn SynthesisEngine>>) -> Self {
        let mut studio = Self {
            backend,
            backend_available: false,
        };
        studio.refresh_availability();
        studio
    }

    /// Studio backed by espeak-ng.
    pub fn with_espeak(config: EspeakConfig) -> Self {
        Self::new(Some(Box::new(EspeakEngine::from_config(config))))
    }

    pub fn backend_name(&self) -> Option<&str> {
        self.backend.as_deref().map(|b| b.name())
    }

    pub fn backend_available(&self) -> bool {
        self.backend_available
    }

    /// Re-run the backend's availability check.
    pub fn refresh_availability(&mut self) -> bool {
        self.backend_available = match self.backend.as_deref() {
            Some(backend) => {
                let available = backend.is_available();
                if !available {
                    log::warn!(
                        "{} is not available; sample audio will be generated instead",
                        backend.name()
                    );
                }
                available
            }
            None => {
                log::warn!("No synthesis backend configured; sample audio will be generated");
                false
            }
        };
        self.backend_available
    }

    /// Produce audio for `text`.
    ///
    /// Fails only for empty text, invalid options or a missing reference
    /// file; backend trouble degrades to the tone fallback.
    pub fn generate(
        &mut self,
        text: &str,
        options: &SynthesisOptions,
    ) -> Result<Generation, StudioError> {
        if text.is_empty() {
            return Err(StudioError::EmptyText);
        }
        options.validate()?;

        let mut notices = Vec::new();
        match &options.cloning {
            Some(CloningMethod::UploadReference { path }) => {
                if !path.is_file() {
                    return Err(OptionsError::ReferenceMissing(path.clone()).into());
                }
                log::info!("Reference audio accepted: {}", path.display());
                notices.push(format!("Reference audio uploaded: {}", path.display()));
            }
            Some(CloningMethod::Pretrained { voice }) => {
                log::info!("Using pretrained voice {voice}");
            }
            Some(CloningMethod::Record) => notices.push(RECORD_NOTICE.to_string()),
            None => {}
        }

        let attempt = match self.backend.as_deref_mut() {
            Some(backend) if options.model.uses_backend() && self.backend_available => {
                log::info!("Synthesizing with {} for {}", backend.name(), options.model);
                let name = backend.name().to_string();
                Some((name, backend.synthesize(text, options)))
            }
            _ => None,
        };

        let (result, source) = match attempt {
            Some((name, Ok(result))) if !result.samples.is_empty() => {
                (result, AudioSource::Backend(name))
            }
            Some((name, Ok(_))) => {
                log::error!("{name} returned no audio, falling back to sample tone");
                notices.push(format!("{name} returned no audio"));
                notices.push(FALLBACK_NOTICE.to_string());
                (fallback(text, options)?, AudioSource::Fallback)
            }
            Some((name, Err(e))) => {
                log::error!("{name} failed: {e}");
                notices.push(format!("Error in audio generation: {e}"));
                notices.push(FALLBACK_NOTICE.to_string());
                (fallback(text, options)?, AudioSource::Fallback)
            }
            None => {
                if options.model.uses_backend() {
                    log::warn!("{} requested but no backend is available", options.model);
                }
                notices.push(FALLBACK_NOTICE.to_string());
                (fallback(text, options)?, AudioSource::Fallback)
            }
        };

        Ok(Generation {
            result,
            source,
            model: options.model,
            created_at: Local::now(),
            notices,
        })
    }
}

fn fallback(text: &str, options: &SynthesisOptions) -> Result<SynthesisResult, ToneError> {
    tone::synthesize(text, options.speed)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::options::SynthesisOptionsBuilder;
    use chrono::Utc;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    /// Test backend with a scripted outcome and a shared call counter.
    struct ScriptedEngine {
        available: bool,
        outcome: Result<Vec<f32>, String>,
        calls: Arc<AtomicUsize>,
    }

    impl ScriptedEngine {
        fn boxed(
            available: bool,
            outcome: Result<Vec<f32>, String>,
        ) -> (Box<dyn SynthesisEngine>, Arc<AtomicUsize>) {
            let calls = Arc::new(AtomicUsize::new(0));
            let engine = Self {
                available,
                outcome,
                calls: calls.clone(),
            };
            (Box::new(engine), calls)
        }
    }

    impl SynthesisEngine for ScriptedEngine {
        fn name(&self) -> &str {
            "scripted"
        }

        fn is_available(&self) -> bool {
            self.available
        }

        fn synthesize(
            &mut self,
            _text: &str,
            _options: &SynthesisOptions,
        ) -> Result<SynthesisResult, Box<dyn std::error::Error + Send + Sync>> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            match &self.outcome {
                Ok(samples) => Ok(SynthesisResult {
                    samples: samples.clone(),
                    sample_rate: 22050,
                }),
                Err(msg) => Err(msg.clone().into()),
            }
        }
    }

    fn sample_mode() -> SynthesisOptions {
        SynthesisOptionsBuilder::default()
            .model(ModelChoice::SampleMode)
            .build()
            .unwrap()
    }

    #[test]
    fn backend_result_is_returned_unchanged() {
        let (backend, calls) = ScriptedEngine::boxed(true, Ok(vec![0.1, 0.2, 0.3]));
        let mut studio = Studio::new(Some(backend));
        assert!(studio.backend_available());

        let generation = studio.generate("Hello", &SynthesisOptions::default()).unwrap();
        assert_eq!(generation.source, AudioSource::Backend("scripted".to_string()));
        assert_eq!(generation.result.samples, vec![0.1, 0.2, 0.3]);
        assert!(generation.notices.is_empty());
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn sample_mode_never_calls_backend() {
        let (backend, calls) = ScriptedEngine::boxed(true, Ok(vec![0.5]));
        let mut studio = Studio::new(Some(backend));

        let generation = studio.generate("Hello", &sample_mode()).unwrap();
        assert!(generation.is_fallback());
        assert_eq!(generation.model, ModelChoice::SampleMode);
        assert_eq!(calls.load(Ordering::SeqCst), 0);
        assert_eq!(generation.notices, vec![FALLBACK_NOTICE.to_string()]);
    }

    #[test]
    fn failing_backend_falls_back_to_tone() {
        let (backend, calls) = ScriptedEngine::boxed(true, Err("model exploded".to_string()));
        let mut studio = Studio::new(Some(backend));

        let generation = studio.generate("Hello there", &SynthesisOptions::default()).unwrap();
        assert!(generation.is_fallback());
        assert_eq!(calls.load(Ordering::SeqCst), 1);
        assert_eq!(generation.result, tone::synthesize("Hello there", 1.0).unwrap());
        assert!(generation.notices[0].contains("model exploded"));
        assert_eq!(generation.notices[1], FALLBACK_NOTICE);
    }

    #[test]
    fn silent_backend_output_falls_back() {
        let (backend, _) = ScriptedEngine::boxed(true, Ok(vec![]));
        let mut studio = Studio::new(Some(backend));
        let generation = studio.generate("Hello", &SynthesisOptions::default()).unwrap();
        assert!(generation.is_fallback());
        assert!(!generation.result.samples.is_empty());
    }

    #[test]
    fn unavailable_backend_is_skipped() {
        let (backend, calls) = ScriptedEngine::boxed(false, Ok(vec![0.5]));
        let mut studio = Studio::new(Some(backend));
        assert!(!studio.backend_available());

        let generation = studio.generate("Hello", &SynthesisOptions::default()).unwrap();
        assert!(generation.is_fallback());
        assert_eq!(calls.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn no_backend_uses_fallback_at_requested_speed() {
        let mut studio = Studio::default();
        assert_eq!(studio.backend_name(), None);

        let options = SynthesisOptionsBuilder::default().speed(2.0).build().unwrap();
        let generation = studio.generate(&"a".repeat(150), &options).unwrap();
        assert_eq!(generation.source, AudioSource::Fallback);
        assert_eq!(generation.result.samples.len(), 110250);
    }

    #[test]
    fn rejects_empty_text() {
        let mut studio = Studio::default();
        assert!(matches!(
            studio.generate("", &SynthesisOptions::default()),
            Err(StudioError::EmptyText)
        ));
    }

    #[test]
    fn whitespace_only_text_still_generates() {
        let mut studio = Studio::default();
        let generation = studio.generate("   ", &SynthesisOptions::default()).unwrap();
        assert!(generation.is_fallback());
        assert_eq!(generation.result.samples.len(), 22050);
    }

    #[test]
    fn rejects_invalid_options() {
        let mut studio = Studio::default();
        let options = SynthesisOptions {
            speed: 0.0,
            ..Default::default()
        };
        assert!(matches!(
            studio.generate("Hello", &options),
            Err(StudioError::Options(OptionsError::OutOfRange { name: "speed", .. }))
        ));
    }

    #[test]
    fn record_cloning_adds_notice() {
        let mut studio = Studio::default();
        let options = SynthesisOptionsBuilder::default()
            .cloning(CloningMethod::Record)
            .build()
            .unwrap();
        let generation = studio.generate("Hello", &options).unwrap();
        assert_eq!(generation.notices[0], RECORD_NOTICE);
    }

    #[test]
    fn reference_audio_must_exist() {
        let dir = tempfile::tempdir().unwrap();
        let reference = dir.path().join("me.wav");
        let options = SynthesisOptionsBuilder::default()
            .cloning(CloningMethod::UploadReference {
                path: reference.clone(),
            })
            .build()
            .unwrap();

        let mut studio = Studio::default();
        assert!(matches!(
            studio.generate("Hello", &options),
            Err(StudioError::Options(OptionsError::ReferenceMissing(_)))
        ));

        std::fs::write(&reference, b"RIFF").unwrap();
        let generation = studio.generate("Hello", &options).unwrap();
        assert!(generation.notices[0].starts_with("Reference audio uploaded"));
    }

    #[test]
    fn download_name_uses_compact_timestamp() {
        let ts = Utc.with_ymd_and_hms(2024, 3, 5, 7, 8, 9).unwrap();
        assert_eq!(download_filename(&ts), "tts_audio_20240305_070809.wav");
    }

    #[test]
    fn session_keeps_only_latest_generation() {
        let mut studio = Studio::default();
        let mut session = Session::default();
        assert!(session.last().is_none());

        let first = studio.generate("short", &sample_mode()).unwrap();
        session.record(first);
        let second = studio.generate(&"b".repeat(30), &sample_mode()).unwrap();
        let stored = session.record(second);
        assert_eq!(stored.result.samples.len(), 44100);

        assert_eq!(session.last().unwrap().result.samples.len(), 44100);
        session.clear();
        assert!(session.take().is_none());
    }

    #[test]
    fn saves_clip_under_download_name() {
        let dir = tempfile::tempdir().unwrap();
        let out = dir.path().join("nested").join("out");
        let generation = Studio::default().generate("Hello", &sample_mode()).unwrap();

        let path = generation.save_to_dir(&out, WavEncoding::Pcm16).unwrap();
        assert_eq!(path, out.join(generation.file_name()));
        assert_eq!(
            std::fs::read(&path).unwrap(),
            generation.wav_bytes(WavEncoding::Pcm16).unwrap()
        );
    }

    #[test]
    fn studio_is_send() {
        fn assert_send<T: Send>() {}
        assert_send::<Studio>();
        assert_send::<Generation>();
    }
}
