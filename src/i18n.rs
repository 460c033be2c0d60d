use serde::{Deserialize, Serialize};
use std::fmt;

/// Language toggle shared by the chat UI, speech locale and canned replies.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Language {
    #[default]
    En,
    Ur,
}

impl Language {
    pub fn code(self) -> &'static str {
        match self {
            Language::En => "en",
            Language::Ur => "ur",
        }
    }

    /// BCP-47 locale used for recognition and synthesis.
    pub fn locale(self) -> &'static str {
        match self {
            Language::En => "en-US",
            Language::Ur => "ur-PK",
        }
    }

    pub fn toggled(self) -> Self {
        match self {
            Language::En => Language::Ur,
            Language::Ur => Language::En,
        }
    }

    /// Short label shown on the language toggle.
    pub fn label(self) -> &'static str {
        match self {
            Language::En => "EN",
            Language::Ur => "اردو",
        }
    }
}

impl fmt::Display for Language {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.code())
    }
}

/// Represents a string with translations in both supported languages
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MultiLingualString {
    pub en: &'static str,
    pub ur: &'static str,
}

impl MultiLingualString {
    pub const fn new(en: &'static str, ur: &'static str) -> Self {
        Self { en, ur }
    }

    pub fn get(&self, language: Language) -> &'static str {
        match language {
            Language::En => self.en,
            Language::Ur => self.ur,
        }
    }
}

pub const WELCOME: MultiLingualString = MultiLingualString::new(
    "Hello! I'm Smart Kissan, your AI farming companion. I can help you with crop diseases, fertilizer recommendations, weather advice, and more. You can type, speak, or upload images of your crops!",
    "السلام علیکم! میں Smart Kissan ہوں، آپ کا AI کاشتکاری ساتھی۔ میں آپ کی فصلوں کی بیماریوں، کھاد کی سفارشات، موسمی مشورے اور بہت کچھ میں مدد کر سکتا ہوں۔",
);

pub const INPUT_PLACEHOLDER: MultiLingualString = MultiLingualString::new(
    "Ask about your crops, diseases, fertilizers...",
    "فصلوں، بیماریوں، کھادوں کے بارے میں پوچھیں...",
);
