use crate::options::SynthesisOptions;
use crate::{SynthesisEngine, SynthesisResult};

use super::generator::synthesize;

/// Deterministic placeholder engine.
///
/// Always available and never touches the filesystem. Of the options only
/// `speed` is honoured; the rest describe a real voice and have no meaning
/// for a harmonic tone.
#[derive(Debug, Clone, Copy, Default)]
pub struct ToneEngine;

impl ToneEngine {
    pub fn new() -> Self {
        Self
    }
}

impl SynthesisEngine for ToneEngine {
    fn name(&self) -> &str {
        "tone"
    }

    fn synthesize(
        &mut self,
        text: &str,
        options: &SynthesisOptions,
    ) -> Result<SynthesisResult, Box<dyn std::error::Error + Send + Sync>> {
        Ok(synthesize(text, options.speed)?)
    }
}
