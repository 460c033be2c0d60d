use chrono::{SecondsFormat, Utc};
use serde::{Deserialize, Serialize};

use crate::i18n::Language;

/// Which optional fields of an [`OutboundPayload`] are populated.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum PayloadType {
    #[serde(rename = "text")]
    Text,
    #[serde(rename = "speech")]
    Speech,
    #[serde(rename = "image+speech")]
    ImageSpeech,
}

impl PayloadType {
    pub fn as_str(self) -> &'static str {
        match self {
            PayloadType::Text => "text",
            PayloadType::Speech => "speech",
            PayloadType::ImageSpeech => "image+speech",
        }
    }
}

/// One user turn as captured by the chat client.
///
/// Only `ImageSpeech` carries an image, so a payload built from a turn can
/// never attach `image`/`speech_text` to a `text` or `speech` request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TurnInput {
    Text(String),
    Speech(String),
    ImageSpeech { caption: String, image: String },
}

impl TurnInput {
    pub fn payload_type(&self) -> PayloadType {
        match self {
            TurnInput::Text(_) => PayloadType::Text,
            TurnInput::Speech(_) => PayloadType::Speech,
            TurnInput::ImageSpeech { .. } => PayloadType::ImageSpeech,
        }
    }

    pub fn text(&self) -> &str {
        match self {
            TurnInput::Text(text) | TurnInput::Speech(text) => text,
            TurnInput::ImageSpeech { caption, .. } => caption,
        }
    }

    pub fn image(&self) -> Option<&str> {
        match self {
            TurnInput::ImageSpeech { image, .. } => Some(image),
            _ => None,
        }
    }

    /// A turn is sendable with non-blank text or an attached image. An image
    /// turn always needs the image itself.
    pub fn is_sendable(&self) -> bool {
        match self {
            TurnInput::Text(text) | TurnInput::Speech(text) => !text.trim().is_empty(),
            TurnInput::ImageSpeech { image, .. } => !image.is_empty(),
        }
    }
}

/// Free-text context sent along with every query.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FarmerContext {
    pub farmer_name: String,
    pub crop: String,
}

impl Default for FarmerContext {
    fn default() -> Self {
        Self {
            farmer_name: "Smart Kissan User".to_string(),
            crop: "General".to_string(),
        }
    }
}

/// Request body sent from the chat client through the relay to the webhook.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OutboundPayload {
    #[serde(rename = "type")]
    pub payload_type: PayloadType,
    pub content: String,
    pub language: Language,
    #[serde(rename = "farmerName", skip_serializing_if = "Option::is_none")]
    pub farmer_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub crop: Option<String>,
    /// Same as `content`; the workflow reads this field.
    pub query: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub image: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub speech_text: Option<String>,
}

impl OutboundPayload {
    pub fn from_turn(turn: &TurnInput, language: Language, context: &FarmerContext) -> Self {
        let text = turn.text().to_string();
        let (image, speech_text) = match turn {
            TurnInput::ImageSpeech { caption, image } => {
                (Some(image.clone()), Some(caption.clone()))
            }
            _ => (None, None),
        };

        Self {
            payload_type: turn.payload_type(),
            content: text.clone(),
            language,
            farmer_name: Some(context.farmer_name.clone()),
            crop: Some(context.crop.clone()),
            query: text,
            image,
            speech_text,
        }
    }
}

/// Normalized result of one relay round trip.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResponseEnvelope {
    pub success: bool,
    pub message: String,
    #[serde(rename = "n8nResponse", default, skip_serializing_if = "Option::is_none")]
    pub n8n_response: Option<String>,
    pub timestamp: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl ResponseEnvelope {
    pub fn success(message: impl Into<String>, n8n_response: impl Into<String>) -> Self {
        Self {
            success: true,
            message: message.into(),
            n8n_response: Some(n8n_response.into()),
            timestamp: iso_timestamp(),
            error: None,
        }
    }

    pub fn failure(message: impl Into<String>, error: impl Into<String>) -> Self {
        Self {
            success: false,
            message: message.into(),
            n8n_response: None,
            timestamp: iso_timestamp(),
            error: Some(error.into()),
        }
    }

    pub fn with_n8n_response(mut self, body: Option<String>) -> Self {
        self.n8n_response = body;
        self
    }

    /// Text to show the farmer: the workflow's reply, or the status message
    /// when the reply is missing or empty.
    pub fn display_text(&self) -> &str {
        match self.n8n_response.as_deref() {
            Some(body) if !body.is_empty() => body,
            _ => &self.message,
        }
    }
}

/// Body of `GET /health`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HealthStatus {
    pub status: String,
    pub timestamp: String,
    #[serde(rename = "webhookUrl")]
    pub webhook_url: String,
}

impl HealthStatus {
    pub fn healthy(webhook_url: &str) -> Self {
        Self {
            status: "healthy".to_string(),
            timestamp: iso_timestamp(),
            webhook_url: webhook_url.to_string(),
        }
    }
}

/// Current UTC time as RFC 3339 with millisecond precision.
pub fn iso_timestamp() -> String {
    Utc::now().to_rfc3339_opts(SecondsFormat::Millis, true)
}
