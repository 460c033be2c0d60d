//! Canned replies shown when the workflow cannot be reached.

use super::types::{Analysis, TranscriptMessage};
use crate::i18n::Language;
use crate::webhook::TurnInput;

const DISEASE_KEYWORDS: [&str; 2] = ["disease", "بیماری"];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CannedTopic {
    Disease,
    General,
}

impl CannedTopic {
    /// Disease advice for images or when a disease keyword is mentioned.
    pub fn classify(turn: &TurnInput) -> Self {
        let text = turn.text().to_lowercase();
        if turn.image().is_some() || DISEASE_KEYWORDS.iter().any(|k| text.contains(k)) {
            CannedTopic::Disease
        } else {
            CannedTopic::General
        }
    }
}

fn strings(items: &[&str]) -> Vec<String> {
    items.iter().map(|s| s.to_string()).collect()
}

pub fn canned_reply(turn: &TurnInput, language: Language) -> TranscriptMessage {
    let (content, analysis) = canned_content(CannedTopic::classify(turn), language);
    TranscriptMessage::assistant(content, Some(analysis))
}

pub fn canned_content(topic: CannedTopic, language: Language) -> (&'static str, Analysis) {
    match (language, topic) {
        (Language::En, CannedTopic::Disease) => (
            "Based on the image analysis, I've identified a potential leaf blight disease affecting your crop.",
            Analysis {
                disease: Some("Leaf Blight".to_string()),
                severity: Some(65),
                confidence: Some(87),
                recommendations: strings(&[
                    "Apply copper-based fungicide (2-3ml per liter)",
                    "Improve air circulation around plants",
                    "Remove affected leaves immediately",
                    "Avoid overhead watering",
                ]),
                weather: Some(
                    "Current humidity levels are high. Consider reducing irrigation frequency."
                        .to_string(),
                ),
                irrigation: Some(
                    "Water at soil level, avoid wetting leaves. Early morning watering recommended."
                        .to_string(),
                ),
            },
        ),
        (Language::En, CannedTopic::General) => (
            "I understand you're asking about crop management. Here are some general recommendations for healthy crop growth.",
            Analysis {
                recommendations: strings(&[
                    "Maintain proper soil pH (6.0-7.0)",
                    "Ensure adequate drainage",
                    "Apply balanced NPK fertilizer",
                    "Monitor for pest activity regularly",
                ]),
                weather: Some("Weather conditions are favorable for crop growth.".to_string()),
                irrigation: Some("Maintain consistent moisture levels in soil.".to_string()),
                ..Analysis::default()
            },
        ),
        (Language::Ur, CannedTopic::Disease) => (
            "تصویر کے تجزیے کی بنیاد پر، میں نے آپ کی فصل میں پتوں کی بیماری کی تشخیص کی ہے۔",
            Analysis {
                disease: Some("پتوں کا جھلساؤ".to_string()),
                severity: Some(65),
                confidence: Some(87),
                recommendations: strings(&[
                    "کاپر بیسڈ فنگی سائیڈ استعمال کریں (2-3ml فی لیٹر)",
                    "پودوں کے ارد گرد ہوا کی گردش بہتر بنائیں",
                    "متاثرہ پتے فوری طور پر ہٹا دیں",
                    "اوپر سے پانی دینے سے بچیں",
                ]),
                weather: Some(
                    "موجودہ نمی کی سطح زیادہ ہے۔ پانی دینے کی تعدد کم کرنے پر غور کریں۔".to_string(),
                ),
                irrigation: Some("مٹی کی سطح پر پانی دیں، پتوں کو گیلا کرنے سے بچیں۔".to_string()),
            },
        ),
        (Language::Ur, CannedTopic::General) => (
            "میں سمجھ گیا ہوں کہ آپ فصل کی دیکھ بھال کے بارے میں پوچھ رہے ہیں۔",
            Analysis {
                recommendations: strings(&[
                    "مٹی کا مناسب pH برقرار رکھیں (6.0-7.0)",
                    "مناسب نکاسی آب کو یقینی بنائیں",
                    "متوازن NPK کھاد استعمال کریں",
                    "کیڑوں کی باقاعدگی سے نگرانی کریں",
                ]),
                ..Analysis::default()
            },
        ),
    }
}
