use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::i18n::{Language, WELCOME};
use crate::webhook::{PayloadType, ResponseEnvelope, TurnInput};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    User,
    Assistant,
}

/// Structured advice attached to an assistant reply.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Analysis {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub disease: Option<String>,
    /// 0..=100
    #[serde(skip_serializing_if = "Option::is_none")]
    pub severity: Option<u8>,
    /// 0..=100
    #[serde(skip_serializing_if = "Option::is_none")]
    pub confidence: Option<u8>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub recommendations: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub weather: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub irrigation: Option<String>,
}

impl Analysis {
    /// Block attached to every reply that came back through the workflow.
    pub fn pipeline_notice() -> Self {
        Self {
            recommendations: vec!["Response received from N8N webhook".to_string()],
            weather: Some("Data processed through Smart Kissan AI pipeline".to_string()),
            irrigation: Some("N8N webhook integration active".to_string()),
            ..Self::default()
        }
    }
}

/// One entry of the chat transcript. Immutable once appended.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TranscriptMessage {
    pub id: String,
    pub role: Role,
    pub content: String,
    pub timestamp: DateTime<Utc>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message_type: Option<PayloadType>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub image: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub analysis: Option<Analysis>,
}

impl TranscriptMessage {
    pub fn assistant(content: impl Into<String>, analysis: Option<Analysis>) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            role: Role::Assistant,
            content: content.into(),
            timestamp: Utc::now(),
            message_type: None,
            image: None,
            analysis,
        }
    }

    pub fn user(turn: &TurnInput) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            role: Role::User,
            content: turn.text().to_string(),
            timestamp: Utc::now(),
            message_type: Some(turn.payload_type()),
            image: turn.image().map(str::to_string),
            analysis: None,
        }
    }

    pub fn welcome(language: Language) -> Self {
        Self::assistant(WELCOME.get(language), None)
    }

    /// Reply built from a successful envelope.
    pub fn from_envelope(envelope: &ResponseEnvelope) -> Self {
        Self::assistant(envelope.display_text(), Some(Analysis::pipeline_notice()))
    }
}

/// Notifications for the host rendering the chat.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ChatEvent {
    /// A message was appended; hosts scroll to it.
    MessageAppended { id: String },
    /// Transcript replaced (language toggle or reset).
    TranscriptReset { language: Language },
    LoadingChanged(bool),
    RecordingChanged(bool),
    PlaybackChanged(Option<String>),
}

/// Result of asking the session to read a message aloud.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PlaybackOutcome {
    Playing,
    Stopped,
    Unsupported,
    UnknownMessage,
}
