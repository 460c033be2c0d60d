use super::interface::{Utterance, Voice};
use crate::i18n::Language;

const SPEECH_RATE: f32 = 0.8;

/// Pick the best available voice for the language.
///
/// Urdu falls back to Hindi voices, which most platforms ship and which
/// read Urdu text acceptably.
pub fn select_voice(voices: &[Voice], language: Language) -> Option<&Voice> {
    match language {
        Language::Ur => voices.iter().find(|voice| {
            let name = voice.name.to_lowercase();
            voice.lang.contains("ur")
                || voice.lang.contains("hi")
                || name.contains("urdu")
                || name.contains("hindi")
        }),
        Language::En => voices
            .iter()
            .find(|voice| voice.lang.contains("en-US"))
            .or_else(|| voices.iter().find(|voice| voice.lang.contains("en"))),
    }
}

impl Utterance {
    pub fn for_language(text: impl Into<String>, language: Language, voices: &[Voice]) -> Self {
        Self {
            text: text.into(),
            lang: language.locale().to_string(),
            voice: select_voice(voices, language).cloned(),
            rate: SPEECH_RATE,
            pitch: 1.0,
            volume: 1.0,
        }
    }
}
