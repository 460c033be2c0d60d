use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::error::SpeechError;

/// A synthesis voice offered by the platform.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Voice {
    pub name: String,
    pub lang: String,
}

impl Voice {
    pub fn new(name: impl Into<String>, lang: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            lang: lang.into(),
        }
    }
}

/// One request to read text aloud.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Utterance {
    pub text: String,
    pub lang: String,
    pub voice: Option<Voice>,
    pub rate: f32,
    pub pitch: f32,
    pub volume: f32,
}

/// Speech-to-text engine supplied by the host platform.
#[async_trait]
pub trait SpeechRecognizer: Send + Sync {
    fn is_available(&self) -> bool {
        true
    }

    /// Capture one utterance and return its transcript.
    ///
    /// # Arguments
    /// * `locale` - BCP-47 tag such as `en-US` or `ur-PK`
    async fn recognize(&self, locale: &str) -> Result<String, SpeechError>;

    /// Stop any capture in progress.
    fn stop(&self);
}

/// Text-to-speech engine supplied by the host platform.
///
/// `speak` starts playback and returns; the host reports completion back
/// through `ChatSession::playback_finished`.
pub trait SpeechSynthesizer: Send + Sync {
    fn is_available(&self) -> bool {
        true
    }

    fn voices(&self) -> Vec<Voice>;

    fn speak(&self, utterance: Utterance) -> Result<(), SpeechError>;

    /// Cancel whatever is being spoken.
    fn cancel(&self);
}

/// Stand-in used when the platform has no recognizer.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoopRecognizer;

#[async_trait]
impl SpeechRecognizer for NoopRecognizer {
    fn is_available(&self) -> bool {
        false
    }

    async fn recognize(&self, _locale: &str) -> Result<String, SpeechError> {
        Err(SpeechError::Unavailable)
    }

    fn stop(&self) {}
}

/// Stand-in used when the platform has no synthesizer.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoopSynthesizer;

impl SpeechSynthesizer for NoopSynthesizer {
    fn is_available(&self) -> bool {
        false
    }

    fn voices(&self) -> Vec<Voice> {
        Vec::new()
    }

    fn speak(&self, _utterance: Utterance) -> Result<(), SpeechError> {
        Err(SpeechError::Unavailable)
    }

    fn cancel(&self) {}
}
