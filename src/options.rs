//! Synthesis options and studio configuration.
//!
//! [`SynthesisOptions`] carries every setting a caller can choose for one
//! generation request. Options can be built programmatically through
//! [`SynthesisOptionsBuilder`] or loaded as part of a JSON [`StudioConfig`]:
//!
//! ```json
//! {
//!   "options": {
//!     "model": "xtts",
//!     "language": "french",
//!     "speed": 1.2,
//!     "voice_gender": "female",
//!     "cloning": { "method": "pretrained", "voice": "female-2" }
//!   },
//!   "espeak": { "bin_path": "/opt/espeak-ng/bin/espeak-ng" },
//!   "encoding": "pcm16",
//!   "output_dir": "out"
//! }
//! ```

use std::fmt;
use std::path::{Path, PathBuf};
use std::str::FromStr;

use derive_builder::{Builder, UninitializedFieldError};
use serde::{Deserialize, Serialize};

use crate::engines::espeak::EspeakConfig;
use crate::WavEncoding;

/// Lower bound for speed, pitch and energy factors.
pub const MIN_FACTOR: f32 = 0.5;
/// Upper bound for speed, pitch and energy factors.
pub const MAX_FACTOR: f32 = 2.0;

/// Reference audio formats accepted for voice cloning.
pub const REFERENCE_EXTENSIONS: &[&str] = &["wav", "mp3", "ogg"];

#[derive(thiserror::Error, Debug, Clone, PartialEq)]
pub enum OptionsError {
    #[error("{name} must be between 0.5 and 2.0, got {value}")]
    OutOfRange { name: &'static str, value: f32 },
    #[error("Unsupported reference audio '{}': expected a .wav, .mp3 or .ogg file", .0.display())]
    UnsupportedReference(PathBuf),
    #[error("Reference audio not found at {}", .0.display())]
    ReferenceMissing(PathBuf),
    #[error("Unknown {kind} '{value}'. Expected one of: {expected}")]
    UnknownValue {
        kind: &'static str,
        value: String,
        expected: String,
    },
    #[error("Option '{0}' was not set")]
    Uninitialized(&'static str),
}

impl From<UninitializedFieldError> for OptionsError {
    fn from(e: UninitializedFieldError) -> Self {
        OptionsError::Uninitialized(e.field_name())
    }
}

/// A closed set of user-facing choices with a stable key and a display label.
///
/// Library callers parse through `FromStr`, which also accepts labels. With
/// the `cli` feature the same enums derive `clap::ValueEnum` using the keys.
pub trait Choice: Copy + Sized + 'static {
    /// Name of the setting, used in error messages.
    const KIND: &'static str;

    fn all() -> &'static [Self];

    /// kebab-case identifier, identical to the serde representation.
    fn key(self) -> &'static str;

    /// Human-readable label.
    fn label(self) -> &'static str;
}

/// Parse a [`Choice`] from either its key or its label, ignoring case.
pub fn parse_choice<T: Choice>(input: &str) -> Result<T, OptionsError> {
    let needle = input.trim();
    T::all()
        .iter()
        .copied()
        .find(|c| c.key().eq_ignore_ascii_case(needle) || c.label().eq_ignore_ascii_case(needle))
        .ok_or_else(|| OptionsError::UnknownValue {
            kind: T::KIND,
            value: input.to_string(),
            expected: T::all().iter().map(|c| c.key()).collect::<Vec<_>>().join(", "),
        })
}

macro_rules! choice_traits {
    ($ty:ty) => {
        impl FromStr for $ty {
            type Err = OptionsError;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                parse_choice(s)
            }
        }

        impl fmt::Display for $ty {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(self.label())
            }
        }
    };
}

/// Synthesis model requested by the user.
///
/// Every model except [`ModelChoice::SampleMode`] is served by whichever
/// backend the studio was configured with; `SampleMode` always produces the
/// placeholder tone.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[cfg_attr(feature = "cli", derive(clap::ValueEnum))]
#[serde(rename_all = "kebab-case")]
pub enum ModelChoice {
    #[default]
    CoquiTts,
    FacebookMms,
    Xtts,
    TortoiseTts,
    SampleMode,
}

/// One line of a model card.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CardLine {
    pub text: &'static str,
    /// Drawback rather than strength.
    pub caveat: bool,
}

const fn pro(text: &'static str) -> CardLine {
    CardLine { text, caveat: false }
}

const fn con(text: &'static str) -> CardLine {
    CardLine { text, caveat: true }
}

/// Catalogue entry describing a model.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ModelCard {
    pub name: &'static str,
    pub lines: &'static [CardLine],
}

impl fmt::Display for ModelCard {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "{}", self.name)?;
        for line in self.lines {
            let mark = if line.caveat { "!" } else { "+" };
            writeln!(f, "  {mark} {}", line.text)?;
        }
        Ok(())
    }
}

impl ModelChoice {
    /// Whether this choice should be routed to the synthesis backend.
    pub fn uses_backend(self) -> bool {
        self != ModelChoice::SampleMode
    }

    pub fn card(self) -> ModelCard {
        let lines = match self {
            ModelChoice::CoquiTts => COQUI_CARD,
            ModelChoice::FacebookMms => MMS_CARD,
            ModelChoice::Xtts => XTTS_CARD,
            ModelChoice::TortoiseTts => TORTOISE_CARD,
            ModelChoice::SampleMode => SAMPLE_CARD,
        };
        ModelCard {
            name: self.label(),
            lines,
        }
    }
}

const COQUI_CARD: &[CardLine] = &[
    pro("High quality"),
    pro("Multiple languages"),
    pro("Voice cloning"),
];
const XTTS_CARD: &[CardLine] = &[pro("Cross-lingual"), pro("High fidelity"), pro("Real-time")];
const MMS_CARD: &[CardLine] = &[
    pro("1100+ languages"),
    pro("Research-grade"),
    con("Requires more RAM"),
];
const TORTOISE_CARD: &[CardLine] = &[pro("Expressive prosody"), con("Slow inference")];
const SAMPLE_CARD: &[CardLine] = &[pro("Works offline"), con("Placeholder tone, not speech")];

impl Choice for ModelChoice {
    const KIND: &'static str = "model";

    fn all() -> &'static [Self] {
        &[
            ModelChoice::CoquiTts,
            ModelChoice::FacebookMms,
            ModelChoice::Xtts,
            ModelChoice::TortoiseTts,
            ModelChoice::SampleMode,
        ]
    }

    fn key(self) -> &'static str {
        match self {
            ModelChoice::CoquiTts => "coqui-tts",
            ModelChoice::FacebookMms => "facebook-mms",
            ModelChoice::Xtts => "xtts",
            ModelChoice::TortoiseTts => "tortoise-tts",
            ModelChoice::SampleMode => "sample-mode",
        }
    }

    fn label(self) -> &'static str {
        match self {
            ModelChoice::CoquiTts => "Coqui TTS",
            ModelChoice::FacebookMms => "Facebook MMS",
            ModelChoice::Xtts => "XTTS",
            ModelChoice::TortoiseTts => "Tortoise TTS",
            ModelChoice::SampleMode => "Sample Mode",
        }
    }
}

choice_traits!(ModelChoice);

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[cfg_attr(feature = "cli", derive(clap::ValueEnum))]
#[serde(rename_all = "kebab-case")]
pub enum Language {
    #[default]
    English,
    Hindi,
    Spanish,
    French,
    German,
    Chinese,
    Japanese,
}

impl Language {
    /// espeak-ng voice code for this language.
    pub fn espeak_code(self) -> &'static str {
        match self {
            Language::English => "en",
            Language::Hindi => "hi",
            Language::Spanish => "es",
            Language::French => "fr",
            Language::German => "de",
            Language::Chinese => "cmn",
            Language::Japanese => "ja",
        }
    }
}

impl Choice for Language {
    const KIND: &'static str = "language";

    fn all() -> &'static [Self] {
        &[
            Language::English,
            Language::Hindi,
            Language::Spanish,
            Language::French,
            Language::German,
            Language::Chinese,
            Language::Japanese,
        ]
    }

    fn key(self) -> &'static str {
        match self {
            Language::English => "english",
            Language::Hindi => "hindi",
            Language::Spanish => "spanish",
            Language::French => "french",
            Language::German => "german",
            Language::Chinese => "chinese",
            Language::Japanese => "japanese",
        }
    }

    fn label(self) -> &'static str {
        match self {
            Language::English => "English",
            Language::Hindi => "Hindi",
            Language::Spanish => "Spanish",
            Language::French => "French",
            Language::German => "German",
            Language::Chinese => "Chinese",
            Language::Japanese => "Japanese",
        }
    }
}

choice_traits!(Language);

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[cfg_attr(feature = "cli", derive(clap::ValueEnum))]
#[serde(rename_all = "kebab-case")]
pub enum VoiceGender {
    #[default]
    Male,
    Female,
    Neutral,
}

impl VoiceGender {
    /// espeak-ng voice variant, `None` keeps the language's default voice.
    pub fn espeak_variant(self) -> Option<&'static str> {
        match self {
            VoiceGender::Male => Some("m3"),
            VoiceGender::Female => Some("f3"),
            VoiceGender::Neutral => None,
        }
    }
}

impl Choice for VoiceGender {
    const KIND: &'static str = "voice gender";

    fn all() -> &'static [Self] {
        &[VoiceGender::Male, VoiceGender::Female, VoiceGender::Neutral]
    }

    fn key(self) -> &'static str {
        match self {
            VoiceGender::Male => "male",
            VoiceGender::Female => "female",
            VoiceGender::Neutral => "neutral",
        }
    }

    fn label(self) -> &'static str {
        match self {
            VoiceGender::Male => "Male",
            VoiceGender::Female => "Female",
            VoiceGender::Neutral => "Neutral",
        }
    }
}

choice_traits!(VoiceGender);

/// Requested emotional colouring. No bundled engine renders emotion; the
/// value is carried for backends that can.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[cfg_attr(feature = "cli", derive(clap::ValueEnum))]
#[serde(rename_all = "kebab-case")]
pub enum Emotion {
    #[default]
    Neutral,
    Happy,
    Sad,
    Angry,
    Excited,
}

impl Choice for Emotion {
    const KIND: &'static str = "emotion";

    fn all() -> &'static [Self] {
        &[
            Emotion::Neutral,
            Emotion::Happy,
            Emotion::Sad,
            Emotion::Angry,
            Emotion::Excited,
        ]
    }

    fn key(self) -> &'static str {
        match self {
            Emotion::Neutral => "neutral",
            Emotion::Happy => "happy",
            Emotion::Sad => "sad",
            Emotion::Angry => "angry",
            Emotion::Excited => "excited",
        }
    }

    fn label(self) -> &'static str {
        match self {
            Emotion::Neutral => "Neutral",
            Emotion::Happy => "Happy",
            Emotion::Sad => "Sad",
            Emotion::Angry => "Angry",
            Emotion::Excited => "Excited",
        }
    }
}

choice_traits!(Emotion);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[cfg_attr(feature = "cli", derive(clap::ValueEnum))]
pub enum PretrainedVoice {
    #[serde(rename = "male-1")]
    #[cfg_attr(feature = "cli", value(name = "male-1"))]
    Male1,
    #[serde(rename = "female-1")]
    #[cfg_attr(feature = "cli", value(name = "female-1"))]
    Female1,
    #[serde(rename = "male-2")]
    #[cfg_attr(feature = "cli", value(name = "male-2"))]
    Male2,
    #[serde(rename = "female-2")]
    #[cfg_attr(feature = "cli", value(name = "female-2"))]
    Female2,
}

impl PretrainedVoice {
    pub fn espeak_variant(self) -> &'static str {
        match self {
            PretrainedVoice::Male1 => "m1",
            PretrainedVoice::Female1 => "f1",
            PretrainedVoice::Male2 => "m2",
            PretrainedVoice::Female2 => "f2",
        }
    }
}

impl Choice for PretrainedVoice {
    const KIND: &'static str = "pretrained voice";

    fn all() -> &'static [Self] {
        &[
            PretrainedVoice::Male1,
            PretrainedVoice::Female1,
            PretrainedVoice::Male2,
            PretrainedVoice::Female2,
        ]
    }

    fn key(self) -> &'static str {
        match self {
            PretrainedVoice::Male1 => "male-1",
            PretrainedVoice::Female1 => "female-1",
            PretrainedVoice::Male2 => "male-2",
            PretrainedVoice::Female2 => "female-2",
        }
    }

    fn label(self) -> &'static str {
        match self {
            PretrainedVoice::Male1 => "Male Voice 1",
            PretrainedVoice::Female1 => "Female Voice 1",
            PretrainedVoice::Male2 => "Male Voice 2",
            PretrainedVoice::Female2 => "Female Voice 2",
        }
    }
}

choice_traits!(PretrainedVoice);

/// How the voice should be cloned when cloning is enabled.
///
/// None of the bundled engines clone voices: a reference upload is only
/// validated, a pretrained voice selects an espeak-ng variant and recording
/// is reported as unavailable.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "method", rename_all = "kebab-case")]
pub enum CloningMethod {
    UploadReference { path: PathBuf },
    Pretrained { voice: PretrainedVoice },
    Record,
}

impl CloningMethod {
    /// Reject reference files whose extension is not a supported audio format.
    pub fn check_reference(&self) -> Result<(), OptionsError> {
        let CloningMethod::UploadReference { path } = self else {
            return Ok(());
        };
        if has_reference_extension(path) {
            Ok(())
        } else {
            Err(OptionsError::UnsupportedReference(path.clone()))
        }
    }
}

fn has_reference_extension(path: &Path) -> bool {
    path.extension()
        .and_then(|e| e.to_str())
        .is_some_and(|ext| {
            REFERENCE_EXTENSIONS
                .iter()
                .any(|known| known.eq_ignore_ascii_case(ext))
        })
}

fn check_factor(name: &'static str, value: f32) -> Result<(), OptionsError> {
    if value.is_finite() && (MIN_FACTOR..=MAX_FACTOR).contains(&value) {
        Ok(())
    } else {
        Err(OptionsError::OutOfRange { name, value })
    }
}

/// Settings for a single generation request.
#[derive(Debug, Clone, PartialEq, Builder, Serialize, Deserialize)]
#[builder(default, build_fn(validate = "Self::validate", error = "OptionsError"))]
#[serde(default, deny_unknown_fields)]
pub struct SynthesisOptions {
    pub model: ModelChoice,
    pub language: Language,
    /// Speech speed multiplier. Range: 0.5–2.0, default 1.0.
    pub speed: f32,
    /// Pitch multiplier. Range: 0.5–2.0, default 1.0.
    pub pitch: f32,
    /// Loudness multiplier. Range: 0.5–2.0, default 1.0.
    pub energy: f32,
    pub voice_gender: VoiceGender,
    pub emotion: Emotion,
    /// `None` disables voice cloning.
    #[builder(setter(strip_option))]
    pub cloning: Option<CloningMethod>,
}

impl Default for SynthesisOptions {
    fn default() -> Self {
        Self {
            model: ModelChoice::default(),
            language: Language::default(),
            speed: 1.0,
            pitch: 1.0,
            energy: 1.0,
            voice_gender: VoiceGender::default(),
            emotion: Emotion::default(),
            cloning: None,
        }
    }
}

impl SynthesisOptions {
    /// Check ranges and the reference file extension.
    ///
    /// Needed for options that did not come through the builder, e.g. ones
    /// deserialized from a config file.
    pub fn validate(&self) -> Result<(), OptionsError> {
        check_factor("speed", self.speed)?;
        check_factor("pitch", self.pitch)?;
        check_factor("energy", self.energy)?;
        if let Some(cloning) = &self.cloning {
            cloning.check_reference()?;
        }
        Ok(())
    }
}

impl SynthesisOptionsBuilder {
    fn validate(&self) -> Result<(), OptionsError> {
        for (name, value) in [
            ("speed", self.speed),
            ("pitch", self.pitch),
            ("energy", self.energy),
        ] {
            if let Some(value) = value {
                check_factor(name, value)?;
            }
        }
        if let Some(Some(cloning)) = &self.cloning {
            cloning.check_reference()?;
        }
        Ok(())
    }
}

#[derive(thiserror::Error, Debug)]
pub enum ConfigError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Invalid config JSON: {0}")]
    Parse(#[from] serde_json::Error),
    #[error("Invalid options in config: {0}")]
    Options(#[from] OptionsError),
}

/// File-level configuration for the studio and its front end.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct StudioConfig {
    pub options: SynthesisOptions,
    pub espeak: EspeakConfig,
    pub encoding: WavEncoding,
    /// Directory for generated files. `None` means the working directory.
    pub output_dir: Option<PathBuf>,
}

impl StudioConfig {
    pub fn from_json_str(json: &str) -> Result<Self, ConfigError> {
        let config: Self = serde_json::from_str(json)?;
        config.options.validate()?;
        Ok(config)
    }

    pub fn from_json_file(path: &Path) -> Result<Self, ConfigError> {
        log::info!("Loading studio config from {}", path.display());
        let content = std::fs::read_to_string(path)?;
        Self::from_json_str(&content)
    }
}
