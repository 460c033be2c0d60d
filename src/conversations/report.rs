use anyhow::Result;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

use super::types::{Analysis, Role, TranscriptMessage};
use crate::i18n::Language;
use crate::webhook::types::iso_timestamp;

/// Downloadable snapshot of a conversation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TranscriptReport {
    pub timestamp: String,
    pub language: Language,
    pub messages: Vec<ReportEntry>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReportEntry {
    pub role: Role,
    pub content: String,
    pub timestamp: DateTime<Utc>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub analysis: Option<Analysis>,
}

impl TranscriptReport {
    pub fn new(language: Language, messages: &[TranscriptMessage]) -> Self {
        Self {
            timestamp: iso_timestamp(),
            language,
            messages: messages
                .iter()
                .map(|msg| ReportEntry {
                    role: msg.role,
                    content: msg.content.clone(),
                    timestamp: msg.timestamp,
                    analysis: msg.analysis.clone(),
                })
                .collect(),
        }
    }

    /// Format: smart-kissan-report-YYYY-MM-DD.json
    pub fn file_name(&self) -> String {
        format!("smart-kissan-report-{}.json", Utc::now().format("%Y-%m-%d"))
    }

    /// Write the report pretty-printed into `dir`, returning the file path.
    pub fn write_to(&self, dir: impl AsRef<Path>) -> Result<PathBuf> {
        let dir = dir.as_ref();
        fs::create_dir_all(dir)?;
        let path = dir.join(self.file_name());
        fs::write(&path, serde_json::to_string_pretty(self)?)?;
        tracing::debug!("Wrote transcript report: {:?}", path);
        Ok(path)
    }
}
